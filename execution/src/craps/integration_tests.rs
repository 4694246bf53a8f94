use super::*;
use crate::{
    balance,
    mocks::{create_entropy_sources, create_genesis, execute_block, TEST_NOW},
    Memory, State,
};
use commonware_cryptography::ed25519::{PrivateKey, PublicKey};
use commonware_runtime::{deterministic::Runner, Runner as _};
use crapsvault_types::{
    craps::{BetType, EmergencyKind, EpochOutcome, Treasury, MIN_ENTROPY_SOURCES},
    execution::{Event, Instruction, Key, Output, Transaction, Value},
};

struct Session {
    state: Memory,
    events: Vec<Output>,
    authority: (PrivateKey, PublicKey, u64),
    players: Vec<(PrivateKey, PublicKey, u64)>,
    now: u64,
    slot: u64,
    seed: u64,
}

impl Session {
    async fn new(funds: u64, balances: &[u64]) -> Self {
        let genesis = create_genesis(funds, balances).await;
        let (authority, public) = genesis.authority;
        Self {
            state: genesis.state,
            events: Vec::new(),
            authority: (authority, public, 0),
            players: genesis
                .players
                .into_iter()
                .map(|(private, public)| (private, public, 0))
                .collect(),
            now: TEST_NOW,
            slot: 1,
            seed: 100,
        }
    }

    fn player(&self, i: usize) -> PublicKey {
        self.players[i].1.clone()
    }

    fn authority_key(&self) -> PublicKey {
        self.authority.1.clone()
    }

    fn authority_tx(&mut self, instruction: Instruction) -> Transaction {
        let (private, _, nonce) = &mut self.authority;
        let tx = Transaction::sign(private, *nonce, instruction);
        *nonce += 1;
        tx
    }

    fn player_tx(&mut self, i: usize, instruction: Instruction) -> Transaction {
        let (private, _, nonce) = &mut self.players[i];
        let tx = Transaction::sign(private, *nonce, instruction);
        *nonce += 1;
        tx
    }

    async fn block(&mut self, txs: Vec<Transaction>) -> Vec<Event> {
        self.now += 10;
        execute_block(&mut self.state, &mut self.events, self.now, txs)
            .await
            .into_iter()
            .filter_map(|output| match output {
                Output::Event(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    async fn authority(&mut self, instruction: Instruction) -> Vec<Event> {
        let tx = self.authority_tx(instruction);
        self.block(vec![tx]).await
    }

    async fn play(&mut self, i: usize, instruction: Instruction) -> Vec<Event> {
        let tx = self.player_tx(i, instruction);
        self.block(vec![tx]).await
    }

    async fn bet(&mut self, i: usize, bet: BetType, amount: u64) -> Vec<Event> {
        self.play(
            i,
            Instruction::PlaceBet {
                bet_type: bet as u8,
                amount,
            },
        )
        .await
    }

    /// Close betting, feed the minimum number of sources and finalize.
    async fn roll(&mut self) -> EpochOutcome {
        let mut txs = vec![self.authority_tx(Instruction::CloseBetting)];
        let count = MIN_ENTROPY_SOURCES as usize;
        for source in create_entropy_sources(self.seed, self.slot, count) {
            txs.push(self.authority_tx(Instruction::CollectEntropy(source)));
        }
        txs.push(self.authority_tx(Instruction::FinalizeRng {
            required: MIN_ENTROPY_SOURCES,
        }));
        self.seed += 1;
        self.slot += count as u64;

        let events = self.block(txs).await;
        match events.last() {
            Some(Event::RngFinalized { outcome }) => *outcome,
            other => panic!("expected a finalized roll, got {other:?}"),
        }
    }

    /// Open betting and roll straight away.
    async fn empty_epoch(&mut self) -> EpochOutcome {
        self.authority(Instruction::StartBettingPhase).await;
        self.roll().await
    }

    async fn treasury(&self) -> Treasury {
        match self.state.get(&Key::Treasury).await {
            Some(Value::Treasury(treasury)) => treasury,
            other => panic!("missing treasury: {other:?}"),
        }
    }
}

fn error_code(events: &[Event]) -> Option<u16> {
    match events {
        [Event::Error { code, .. }] => Some(*code),
        _ => None,
    }
}

#[test]
fn test_one_roll_wagers_settle_and_pay() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut session = Session::new(1_000_000, &[10_000, 10_000]).await;
        let (alice, bob) = (session.player(0), session.player(1));

        let events = session.authority(Instruction::StartBettingPhase).await;
        assert_eq!(
            events,
            vec![Event::BettingStarted {
                epoch: 1,
                started_at: session.now
            }]
        );
        let events = session.bet(0, BetType::Field, 50).await;
        assert_eq!(
            events,
            vec![Event::BetPlaced {
                player: alice.clone(),
                epoch: 1,
                slot: 0,
                bet_type: BetType::Field,
                amount: 50,
            }]
        );
        session.bet(1, BetType::Next7, 20).await;
        assert_eq!(balance(&session.state, &alice).await, 9_950);
        assert_eq!(session.treasury().await.total_wagered, 70);

        let outcome = session.roll().await;
        assert_eq!(outcome.epoch, 1);
        assert!((1..=6).contains(&outcome.die1) && (1..=6).contains(&outcome.die2));

        let roll = Roll::from(&outcome);
        let wagers = [
            (0, &alice, BetType::Field, 50),
            (1, &bob, BetType::Next7, 20),
        ];
        for (i, player, bet, amount) in wagers {
            let expected = match calculate_bet_payout(bet, amount, 0, &roll, &outcome.bonus) {
                Ok(Resolution::Win { winnings }) => amount + winnings,
                Ok(Resolution::Lose) => 0,
                other => panic!("one-roll wager did not resolve: {other:?}"),
            };
            let events = session.play(i, Instruction::SettleBets { epoch: 1 }).await;
            assert_eq!(
                events,
                vec![
                    Event::BetResolved {
                        player: player.clone(),
                        epoch: 1,
                        slot: 0,
                        won: expected > 0,
                        payout: expected,
                    },
                    Event::BetsSettled {
                        player: player.clone(),
                        epoch: 1,
                        through_epoch: 1,
                        open_bets: 0,
                    },
                ]
            );

            let before = balance(&session.state, player).await;
            let events = session.play(i, Instruction::ClaimPayout { epoch: 1, slot: 0 }).await;
            if expected > 0 {
                assert_eq!(
                    events,
                    vec![Event::PayoutClaimed {
                        player: player.clone(),
                        epoch: 1,
                        slot: 0,
                        amount: expected,
                    }]
                );
                assert_eq!(balance(&session.state, player).await, before + expected);
                // A second claim finds nothing
                let events = session.play(i, Instruction::ClaimPayout { epoch: 1, slot: 0 }).await;
                assert_eq!(error_code(&events), Some(803));
            } else {
                assert_eq!(error_code(&events), Some(803));
                assert_eq!(balance(&session.state, player).await, before);
            }
        }

        // Tokens are only moved, never created
        let held = session.treasury().await.balance().unwrap()
            + balance(&session.state, &alice).await
            + balance(&session.state, &bob).await;
        assert_eq!(held, 1_020_000);
    });
}

#[test]
fn test_settlement_waits_for_finalization() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut session = Session::new(1_000_000, &[1_000]).await;
        session.authority(Instruction::StartBettingPhase).await;
        session.bet(0, BetType::Pass, 100).await;

        let events = session.play(0, Instruction::SettleBets { epoch: 1 }).await;
        assert_eq!(error_code(&events), Some(204));
        let events = session.play(0, Instruction::SettleBets { epoch: 9 }).await;
        assert_eq!(error_code(&events), Some(801));

        // Nothing is claimable before resolution
        let events = session.play(0, Instruction::ClaimPayout { epoch: 1, slot: 0 }).await;
        assert_eq!(error_code(&events), Some(803));
        let events = session.play(0, Instruction::ClaimPayout { epoch: 1, slot: 4 }).await;
        assert_eq!(error_code(&events), Some(802));

        // Betting is closed once entropy collection starts
        session.roll().await;
        let events = session.bet(0, BetType::Field, 5).await;
        assert_eq!(error_code(&events), Some(202));
    });
}

#[test]
fn test_pass_line_rides_until_resolved() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut session = Session::new(1_000_000, &[1_000]).await;
        let player = session.player(0);
        session.authority(Instruction::StartBettingPhase).await;
        session.bet(0, BetType::Pass, 100).await;

        let mut resolved = None;
        for epoch in 1..=60u64 {
            if epoch > 1 {
                session.authority(Instruction::StartBettingPhase).await;
            }
            session.roll().await;
            let events = session.play(0, Instruction::SettleBets { epoch: 1 }).await;
            match &events[..] {
                [Event::BetsSettled {
                    through_epoch,
                    open_bets: 1,
                    ..
                }] => assert_eq!(*through_epoch, epoch),
                [Event::BetResolved { won, payout, .. }, Event::BetsSettled {
                    through_epoch,
                    open_bets: 0,
                    ..
                }] => {
                    assert_eq!(*through_epoch, epoch);
                    assert_eq!(*payout, if *won { 200 } else { 0 });
                    resolved = Some(*won);
                    break;
                }
                other => panic!("unexpected settlement: {other:?}"),
            }
        }
        let won = resolved.expect("pass line never resolved");

        match session.state.get(&Key::BetBatch(player, 1)).await {
            Some(Value::BetBatch(batch)) => {
                assert!(batch.is_resolved(0));
                assert_eq!(batch.is_realizable(0), won);
                assert!(batch.check_invariants());
            }
            other => panic!("missing batch: {other:?}"),
        }
    });
}

#[test]
fn test_placement_rules_and_capacity() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut session = Session::new(1_000_000, &[50_000]).await;
        let player = session.player(0);

        // No session yet
        let events = session.bet(0, BetType::Field, 10).await;
        assert_eq!(error_code(&events), Some(201));

        session.authority(Instruction::StartBettingPhase).await;
        let events = session.bet(0, BetType::Come, 10).await;
        assert_eq!(error_code(&events), Some(205));
        let events = session.bet(0, BetType::Field, 102).await;
        assert_eq!(error_code(&events), Some(101));
        let events = session
            .play(
                0,
                Instruction::PlaceBet {
                    bet_type: 64,
                    amount: 10,
                },
            )
            .await;
        assert_eq!(error_code(&events), Some(102));
        let events = session.bet(0, BetType::Field, 200_000).await;
        assert_eq!(error_code(&events), Some(101));
        let events = session.bet(0, BetType::Field, 60_000).await;
        assert_eq!(error_code(&events), Some(503));

        for slot in 0..16u8 {
            let events = session.bet(0, BetType::Field, 10).await;
            assert!(matches!(&events[..], [Event::BetPlaced { slot: s, .. }] if *s == slot));
        }
        let events = session.bet(0, BetType::Field, 10).await;
        assert_eq!(error_code(&events), Some(301));
        assert_eq!(balance(&session.state, &player).await, 50_000 - 160);
    });
}

#[test]
fn test_withdrawals_respect_the_circuit_breaker() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut session = Session::new(10_000, &[500]).await;
        let authority = session.authority_key();

        // Players cannot withdraw
        let events = session.play(0, Instruction::Withdraw { amount: 10 }).await;
        assert_eq!(error_code(&events), Some(601));

        // Over 80% of the balance
        let events = session.authority(Instruction::Withdraw { amount: 8_001 }).await;
        assert_eq!(error_code(&events), Some(704));

        let events = session.authority(Instruction::Withdraw { amount: 8_000 }).await;
        assert_eq!(
            events,
            vec![Event::Withdrawn {
                authority: authority.clone(),
                amount: 8_000
            }]
        );
        assert_eq!(balance(&session.state, &authority).await, 8_000);

        // Within the ratio but below the 20% reserve floor
        let events = session.authority(Instruction::Withdraw { amount: 1 }).await;
        assert_eq!(error_code(&events), Some(705));
        let treasury = session.treasury().await;
        assert_eq!(treasury.balance().unwrap(), 2_000);
        assert_eq!(treasury.window.disbursed(session.now), 8_000);

        // Deposits refill the treasury but the floor tracks the epoch start
        session.play(0, Instruction::Deposit { amount: 500 }).await;
        assert_eq!(session.treasury().await.balance().unwrap(), 2_500);
        let events = session.authority(Instruction::Withdraw { amount: 501 }).await;
        assert_eq!(error_code(&events), Some(705));
        let events = session.authority(Instruction::Withdraw { amount: 500 }).await;
        assert!(matches!(&events[..], [Event::Withdrawn { amount: 500, .. }]));
    });
}

#[test]
fn test_emergency_controls() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut session = Session::new(100_000, &[500]).await;
        let player = session.player(0);

        let events = session.play(0, Instruction::Emergency(EmergencyKind::Halt)).await;
        assert_eq!(error_code(&events), Some(601));

        let events = session.authority(Instruction::Emergency(EmergencyKind::Halt)).await;
        assert_eq!(
            events,
            vec![Event::EmergencyApplied {
                kind: EmergencyKind::Halt
            }]
        );
        let events = session.authority(Instruction::Withdraw { amount: 10 }).await;
        assert_eq!(error_code(&events), Some(701));

        session
            .authority(Instruction::Emergency(EmergencyKind::TransferAuthority(
                player.clone(),
            )))
            .await;
        let events = session.authority(Instruction::Emergency(EmergencyKind::Resume)).await;
        assert_eq!(error_code(&events), Some(601));
        session.play(0, Instruction::Emergency(EmergencyKind::Resume)).await;

        let treasury = session.treasury().await;
        assert!(!treasury.halted);
        assert!(treasury.is_authority(&player));
    });
}

#[test]
fn test_close_batch_after_retention() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut session = Session::new(1_000_000, &[1_000]).await;
        let player = session.player(0);
        session.authority(Instruction::StartBettingPhase).await;
        session.bet(0, BetType::Field, 10).await;
        session.roll().await;

        let events = session.play(0, Instruction::CloseBatch { epoch: 1 }).await;
        assert_eq!(error_code(&events), Some(206));

        let events = session.play(0, Instruction::SettleBets { epoch: 1 }).await;
        let won = matches!(events[0], Event::BetResolved { won: true, .. });
        if won {
            let events = session.play(0, Instruction::CloseBatch { epoch: 1 }).await;
            assert_eq!(error_code(&events), Some(206));
            session.play(0, Instruction::ClaimPayout { epoch: 1, slot: 0 }).await;
        }

        for _ in 0..9 {
            session.empty_epoch().await;
        }
        let events = session.play(0, Instruction::CloseBatch { epoch: 1 }).await;
        assert_eq!(error_code(&events), Some(206));

        session.empty_epoch().await;
        let events = session.play(0, Instruction::CloseBatch { epoch: 1 }).await;
        assert_eq!(
            events,
            vec![Event::BatchClosed {
                player: player.clone(),
                epoch: 1
            }]
        );
        assert!(session.state.get(&Key::BetBatch(player, 1)).await.is_none());
    });
}

#[test]
fn test_epoch_start_balance_tracks_new_epochs() {
    let executor = Runner::default();
    executor.start(|_| async move {
        let mut session = Session::new(50_000, &[2_000]).await;
        session.play(0, Instruction::Deposit { amount: 1_000 }).await;
        assert_eq!(session.treasury().await.epoch_start_balance, 50_000);

        session.empty_epoch().await;
        assert_eq!(session.treasury().await.epoch_start_balance, 51_000);

        session.authority(Instruction::StartBettingPhase).await;
        session.play(0, Instruction::Deposit { amount: 1_000 }).await;
        assert_eq!(session.treasury().await.balance().unwrap(), 52_000);

        // Restarting an unfinalized epoch keeps the snapshot
        session.authority(Instruction::StartBettingPhase).await;
        assert_eq!(session.treasury().await.epoch_start_balance, 51_000);
        match session.state.get(&Key::Rng).await {
            Some(Value::Rng(rng)) => assert_eq!(rng.epoch, 2),
            other => panic!("missing rng state: {other:?}"),
        }

        session.roll().await;
        session.authority(Instruction::StartBettingPhase).await;
        assert_eq!(session.treasury().await.epoch_start_balance, 52_000);
    });
}
