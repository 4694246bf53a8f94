use super::super::*;
use crate::craps::{disburse, placement_target, settle_batch, Disbursement};
use crapsvault_types::craps::{checked_add, standard_table, ArithmeticError, SlotOutcome};
use tracing::{debug, info};

impl<'a, S: State> Layer<'a, S> {
    // === Wager Handlers ===

    pub(in crate::layer) async fn handle_place_bet(
        &mut self,
        public: &PublicKey,
        bet_type: u8,
        amount: u64,
    ) -> Handled {
        let rng = self.current_rng().await?;
        if rng.phase != RngPhase::Betting {
            return Err(PhaseError::NotBetting(rng.phase).into());
        }
        let packed = standard_table().encode_bet(bet_type, amount)?;
        let bet = packed.bet_type()?;

        let table = self.table().await;
        let batch = self.batch(public, rng.epoch).await;
        let target = placement_target(bet, &table, batch.as_ref())?;

        let balance = self.balance(public).await;
        if balance < amount {
            return Err(ArithmeticError::InsufficientBalance {
                available: balance,
                required: amount,
            }
            .into());
        }
        let mut treasury = self.treasury().await?;
        treasury.total_wagered = checked_add(treasury.total_wagered, amount, "total_wagered")?;

        let mut batch =
            batch.unwrap_or_else(|| BetBatch::new(public.clone(), rng.epoch, self.now));
        let slot = batch.push(packed, amount, target)?;

        debug!(player = ?public, epoch = rng.epoch, slot, ?bet, amount, target, "placed wager");
        self.insert(
            Key::Balance(public.clone()),
            Value::Balance(balance - amount),
        );
        self.insert(Key::Treasury, Value::Treasury(treasury));
        self.insert(
            Key::BetBatch(public.clone(), rng.epoch),
            Value::BetBatch(batch),
        );
        Ok(vec![Event::BetPlaced {
            player: public.clone(),
            epoch: rng.epoch,
            slot,
            bet_type: bet,
            amount,
        }])
    }

    /// Resolve a batch against every finalized roll it has not yet seen.
    pub(in crate::layer) async fn handle_settle_bets(
        &mut self,
        public: &PublicKey,
        epoch: u64,
    ) -> Handled {
        let mut batch = self.existing_batch(public, epoch).await?;
        let through = match self.latest_finalized_epoch().await {
            Some(through) if through >= epoch => through,
            _ => return Err(PhaseError::NotFinalized(epoch).into()),
        };

        let mut events = Vec::new();
        let mut next = batch.last_settled_epoch() + 1;
        while next <= through && batch.open_slots().next().is_some() {
            let outcome = self
                .outcome(next)
                .await
                .ok_or(PhaseError::NotFinalized(next))?;
            for (slot, result) in settle_batch(&mut batch, &[outcome], standard_table())? {
                let (won, payout) = match result {
                    SlotOutcome::Lose => (false, 0),
                    SlotOutcome::Push { returned } => (false, returned),
                    SlotOutcome::Win { total_return } => (true, total_return),
                };
                events.push(Event::BetResolved {
                    player: public.clone(),
                    epoch,
                    slot,
                    won,
                    payout,
                });
            }
            next += 1;
        }

        let open_bets = batch.open_slots().count() as u8;
        debug!(
            player = ?public,
            epoch,
            through = batch.last_settled_epoch(),
            resolved = events.len(),
            open_bets,
            "settled batch"
        );
        events.push(Event::BetsSettled {
            player: public.clone(),
            epoch,
            through_epoch: batch.last_settled_epoch(),
            open_bets,
        });
        self.insert(
            Key::BetBatch(public.clone(), epoch),
            Value::BetBatch(batch),
        );
        Ok(events)
    }

    pub(in crate::layer) async fn handle_claim_payout(
        &mut self,
        public: &PublicKey,
        epoch: u64,
        slot: u8,
    ) -> Handled {
        let mut batch = self.existing_batch(public, epoch).await?;
        let amount = batch.claimable(slot)?;

        let mut treasury = self.treasury().await?;
        disburse(&mut treasury, amount, self.now, Disbursement::Payout)?;
        batch.mark_settled(slot)?;
        let balance = checked_add(self.balance(public).await, amount, "player balance")?;

        info!(player = ?public, epoch, slot, amount, "claimed payout");
        self.insert(Key::Treasury, Value::Treasury(treasury));
        self.insert(
            Key::BetBatch(public.clone(), epoch),
            Value::BetBatch(batch),
        );
        self.insert(Key::Balance(public.clone()), Value::Balance(balance));
        Ok(vec![Event::PayoutClaimed {
            player: public.clone(),
            epoch,
            slot,
            amount,
        }])
    }

    pub(in crate::layer) async fn handle_close_batch(
        &mut self,
        public: &PublicKey,
        epoch: u64,
    ) -> Handled {
        let batch = self.existing_batch(public, epoch).await?;
        if !batch.is_fully_settled() {
            return Err(PhaseError::BatchNotClosable {
                epoch,
                reason: "wagers are still open or unclaimed",
            }
            .into());
        }
        let current = self.current_rng().await?.epoch;
        if current.saturating_sub(epoch) < self.config.retention_epochs {
            return Err(PhaseError::BatchNotClosable {
                epoch,
                reason: "retention period has not elapsed",
            }
            .into());
        }

        debug!(player = ?public, epoch, "closed batch");
        self.remove(Key::BetBatch(public.clone(), epoch));
        Ok(vec![Event::BatchClosed {
            player: public.clone(),
            epoch,
        }])
    }
}
