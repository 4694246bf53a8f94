use super::rng::read_bytes;
use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};

/// Table phase.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    ComeOut = 0,
    Point = 1,
}

impl Write for Phase {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Phase {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::ComeOut),
            1 => Ok(Self::Point),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for Phase {
    const SIZE: usize = 1;
}

/// What a roll did to the table phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PhaseEvent {
    #[default]
    None,
    PointEstablished(u8),
    PointMade(u8),
    SevenOut,
}

impl Write for PhaseEvent {
    fn write(&self, writer: &mut impl BufMut) {
        let (tag, point) = match self {
            Self::None => (0u8, 0u8),
            Self::PointEstablished(p) => (1, *p),
            Self::PointMade(p) => (2, *p),
            Self::SevenOut => (3, 0),
        };
        tag.write(writer);
        point.write(writer);
    }
}

impl Read for PhaseEvent {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let tag = u8::read(reader)?;
        let point = u8::read(reader)?;
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::PointEstablished(point)),
            2 => Ok(Self::PointMade(point)),
            3 => Ok(Self::SevenOut),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for PhaseEvent {
    const SIZE: usize = 2;
}

/// Progress of the current shooter's hand, shared by every bonus bet at the table.
///
/// Hand-scoped counters reset on seven-out; seven-scoped counters
/// (`doubles_mask`, `repeater_counts`, `hard_counts`) reset on any seven.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BonusState {
    pub hand: u64,
    pub rolls_in_hand: u32,
    pub rolls_since_seven: u32,
    /// Fire progress: one bit per point number (4, 5, 6, 8, 9, 10).
    pub made_points_mask: u8,
    /// Points made in the hand, counting repeats.
    pub points_made: u8,
    pub point_made_counts: [u8; 6],
    pub pass_wins: u8,
    pub ats_mask: u16,
    /// One bit per double (1-1 through 6-6).
    pub doubles_mask: u8,
    /// Indexed by `total - 2`.
    pub repeater_counts: [u8; 11],
    /// Hard 4, 6, 8, 10.
    pub hard_counts: [u8; 4],
}

impl Write for BonusState {
    fn write(&self, writer: &mut impl BufMut) {
        self.hand.write(writer);
        self.rolls_in_hand.write(writer);
        self.rolls_since_seven.write(writer);
        self.made_points_mask.write(writer);
        self.points_made.write(writer);
        writer.put_slice(&self.point_made_counts);
        self.pass_wins.write(writer);
        self.ats_mask.write(writer);
        self.doubles_mask.write(writer);
        writer.put_slice(&self.repeater_counts);
        writer.put_slice(&self.hard_counts);
    }
}

impl Read for BonusState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            hand: u64::read(reader)?,
            rolls_in_hand: u32::read(reader)?,
            rolls_since_seven: u32::read(reader)?,
            made_points_mask: u8::read(reader)?,
            points_made: u8::read(reader)?,
            point_made_counts: read_bytes(reader)?,
            pass_wins: u8::read(reader)?,
            ats_mask: u16::read(reader)?,
            doubles_mask: u8::read(reader)?,
            repeater_counts: read_bytes(reader)?,
            hard_counts: read_bytes(reader)?,
        })
    }
}

impl FixedSize for BonusState {
    const SIZE: usize = u64::SIZE
        + u32::SIZE
        + u32::SIZE
        + u8::SIZE
        + u8::SIZE
        + 6
        + u8::SIZE
        + u16::SIZE
        + u8::SIZE
        + 11
        + 4;
}

/// Live game state threaded through every roll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub phase: Phase,
    /// 0 while on the come-out.
    pub point: u8,
    pub bonus: BonusState,
}

impl Write for Table {
    fn write(&self, writer: &mut impl BufMut) {
        self.phase.write(writer);
        self.point.write(writer);
        self.bonus.write(writer);
    }
}

impl Read for Table {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            phase: Phase::read(reader)?,
            point: u8::read(reader)?,
            bonus: BonusState::read(reader)?,
        })
    }
}

impl FixedSize for Table {
    const SIZE: usize = Phase::SIZE + u8::SIZE + BonusState::SIZE;
}

/// Immutable record of one finalized roll.
///
/// `phase` and `point` are the ones in force when the dice were thrown; `bonus`
/// includes this roll's progress but not the resets it triggered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EpochOutcome {
    pub epoch: u64,
    pub die1: u8,
    pub die2: u8,
    pub phase: Phase,
    pub point: u8,
    pub event: PhaseEvent,
    pub bonus: BonusState,
    pub finalized_at: u64,
}

impl EpochOutcome {
    pub fn total(&self) -> u8 {
        self.die1 + self.die2
    }
}

impl Write for EpochOutcome {
    fn write(&self, writer: &mut impl BufMut) {
        self.epoch.write(writer);
        self.die1.write(writer);
        self.die2.write(writer);
        self.phase.write(writer);
        self.point.write(writer);
        self.event.write(writer);
        self.bonus.write(writer);
        self.finalized_at.write(writer);
    }
}

impl Read for EpochOutcome {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let outcome = Self {
            epoch: u64::read(reader)?,
            die1: u8::read(reader)?,
            die2: u8::read(reader)?,
            phase: Phase::read(reader)?,
            point: u8::read(reader)?,
            event: PhaseEvent::read(reader)?,
            bonus: BonusState::read(reader)?,
            finalized_at: u64::read(reader)?,
        };
        if !(1..=6).contains(&outcome.die1) || !(1..=6).contains(&outcome.die2) {
            return Err(Error::Invalid("EpochOutcome", "die out of range"));
        }
        Ok(outcome)
    }
}

impl FixedSize for EpochOutcome {
    const SIZE: usize = u64::SIZE
        + u8::SIZE
        + u8::SIZE
        + Phase::SIZE
        + u8::SIZE
        + PhaseEvent::SIZE
        + BonusState::SIZE
        + u64::SIZE;
}
