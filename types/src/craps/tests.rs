use super::*;
use commonware_codec::{DecodeExt, Encode, FixedSize, ReadExt};
use commonware_cryptography::{ed25519::PrivateKey, PrivateKeyExt, Signer};

#[test]
fn test_record_sizes() {
    assert_eq!(BetBatch::SIZE, 296);
    assert_eq!(RngState::SIZE, 8 + 1 + 1 + 8 + 8 + 15 * 40 + 2);
    assert_eq!(BonusState::SIZE, 43);
    assert_eq!(Table::SIZE, 45);
    assert_eq!(EpochOutcome::SIZE, 65);
}

#[test]
fn test_rng_state_pads_sources() {
    let state = RngState {
        epoch: 9,
        phase: RngPhase::Collecting,
        phase_started_at: 1_700_000_000,
        slot_floor: 40,
        sources: vec![
            EntropySource::new(100, [1; 32]),
            EntropySource::new(101, [2; 32]),
        ],
        dice: [0, 0],
    };
    let encoded = state.encode();
    assert_eq!(encoded.len(), RngState::SIZE);

    let decoded = RngState::decode(encoded).unwrap();
    assert_eq!(decoded.hash_count(), 2);
    assert_eq!(decoded.last_slot(), Some(101));
    assert_eq!(decoded.final_dice(), None);
    assert_eq!(decoded, state);
}

#[test]
fn test_rng_state_rejects_oversized_count() {
    let mut encoded = RngState::default().encode().to_vec();
    encoded[9] = 16;
    assert!(RngState::decode(&encoded[..]).is_err());
}

#[test]
fn test_outcome_decoding() {
    let outcome = EpochOutcome {
        epoch: 4,
        die1: 3,
        die2: 4,
        phase: Phase::Point,
        point: 6,
        event: PhaseEvent::SevenOut,
        bonus: BonusState {
            hand: 2,
            rolls_in_hand: 12,
            made_points_mask: 0b101,
            points_made: 2,
            ..Default::default()
        },
        finalized_at: 55,
    };
    let decoded = EpochOutcome::decode(outcome.encode()).unwrap();
    assert_eq!(decoded, outcome);
    assert_eq!(decoded.total(), 7);

    let invalid = EpochOutcome {
        die1: 7,
        ..outcome
    };
    assert!(EpochOutcome::decode(invalid.encode()).is_err());
}

#[test]
fn test_phase_event_tags() {
    let mut buf = &[2u8, 8][..];
    assert_eq!(PhaseEvent::read(&mut buf).unwrap(), PhaseEvent::PointMade(8));
    let mut buf = &[9u8, 0][..];
    assert!(PhaseEvent::read(&mut buf).is_err());
}

#[test]
fn test_treasury_balance() {
    let authority = PrivateKey::from_seed(1).public_key();
    let mut treasury = Treasury::new(authority.clone(), [0; 32], [1; 32], TreasuryLimits::default());
    treasury.total_deposits = 10_000;
    treasury.total_wagered = 500;
    treasury.total_payouts = 2_000;
    treasury.total_withdrawals = 1_000;
    assert_eq!(treasury.balance(), Ok(7_500));
    assert!(treasury.is_authority(&authority));
    treasury.window.record(1_000, 700).unwrap();
    treasury.window.record(1_030, 300).unwrap();
    treasury.window.record(4_500, 50).unwrap();

    let encoded = treasury.encode();
    assert_eq!(encoded.len(), Treasury::SIZE);
    assert_eq!(Treasury::decode(encoded).unwrap(), treasury);

    treasury.total_payouts = 20_000;
    assert!(matches!(
        treasury.balance(),
        Err(CrapsError::Arithmetic(ArithmeticError::Underflow(_)))
    ));
}

#[test]
fn test_disbursement_window_rolls() {
    let mut window = DisbursementWindow::default();
    assert_eq!(window.disbursed(0), 0);
    window.record(59, 10).unwrap();
    window.record(120, 20).unwrap();
    window.record(3_599, 30).unwrap();
    assert_eq!(window.disbursed(3_599), 60);

    // minute 0 leaves the window first
    assert_eq!(window.disbursed(3_600), 50);
    assert_eq!(window.disbursed(3_780), 30);
    assert_eq!(window.disbursed(7_200), 0);

    // a recycled bucket drops its old minute
    window.record(3_600, 5).unwrap();
    assert_eq!(window.disbursed(3_600), 55);
    assert!(window.record(3_601, u64::MAX).is_err());
    assert_eq!(window.disbursed(3_601), 55);
}

#[test]
fn test_limits_validation() {
    assert!(TreasuryLimits::default().validate().is_ok());
    let limits = TreasuryLimits {
        max_payout_ratio_bps: 10_001,
        ..Default::default()
    };
    assert_eq!(limits.validate().unwrap_err().code(), 706);
    let limits = TreasuryLimits {
        max_single_disbursement: 10,
        max_hourly_disbursement: 5,
        ..Default::default()
    };
    assert!(limits.validate().is_err());
}

#[test]
fn test_emergency_kind_decoding() {
    let key = PrivateKey::from_seed(3).public_key();
    for kind in [
        EmergencyKind::Halt,
        EmergencyKind::Resume,
        EmergencyKind::UpdateLimits(TreasuryLimits::default()),
        EmergencyKind::TransferAuthority(key),
    ] {
        let encoded = kind.encode();
        assert_eq!(EmergencyKind::decode(encoded).unwrap(), kind);
    }
}

#[test]
fn test_engine_config_floor() {
    let config = EngineConfig::default();
    assert_eq!(config.required_sources(3), 10);
    assert_eq!(config.required_sources(12), 12);
    let strict = EngineConfig {
        min_entropy_sources: 14,
        ..Default::default()
    };
    assert_eq!(strict.required_sources(3), 14);
}
