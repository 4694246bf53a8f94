use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};

/// Every wager the table accepts, numbered by its 6-bit wire type.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BetType {
    // Line bets
    Pass = 0,
    DontPass = 1,
    Come = 2,
    DontCome = 3,

    Field = 4,

    // YES: number before 7
    Yes2 = 5,
    Yes3 = 6,
    Yes4 = 7,
    Yes5 = 8,
    Yes6 = 9,
    Yes8 = 10,
    Yes9 = 11,
    Yes10 = 12,
    Yes11 = 13,
    Yes12 = 14,

    // NO: 7 before number
    No2 = 15,
    No3 = 16,
    No4 = 17,
    No5 = 18,
    No6 = 19,
    No8 = 20,
    No9 = 21,
    No10 = 22,
    No11 = 23,
    No12 = 24,

    Hard4 = 25,
    Hard6 = 26,
    Hard8 = 27,
    Hard10 = 28,

    OddsPass = 29,
    OddsDontPass = 30,
    OddsCome = 31,
    OddsDontCome = 32,

    // Bonus bets tracked across the shooter's hand
    HotRoller = 33,
    Fire = 34,
    TwiceHard = 35,
    RideLine = 36,
    Muggsy = 37,
    AtsSmall = 38,
    AtsTall = 39,
    AtsAll = 40,
    Replay = 41,
    DifferentDoubles = 42,

    // NEXT: exact total on the next roll
    Next2 = 43,
    Next3 = 44,
    Next4 = 45,
    Next5 = 46,
    Next6 = 47,
    Next7 = 48,
    Next8 = 49,
    Next9 = 50,
    Next10 = 51,
    Next11 = 52,
    Next12 = 53,

    // Repeater: number rolled N times before 7
    Repeater2 = 54,
    Repeater3 = 55,
    Repeater4 = 56,
    Repeater5 = 57,
    Repeater6 = 58,
    Repeater8 = 59,
    Repeater9 = 60,
    Repeater10 = 61,
    Repeater11 = 62,
    Repeater12 = 63,
}

/// Totals a YES, NO or Repeater bet can name (everything but 7).
const NON_SEVEN_TOTALS: [u8; 10] = [2, 3, 4, 5, 6, 8, 9, 10, 11, 12];

/// How a bet type is evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BetCategory {
    Line,
    Field,
    Yes,
    No,
    Hardway,
    Odds,
    Bonus,
    Next,
    Repeater,
}

/// When a bonus bet may be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BonusScope {
    /// Progress runs for the whole shooter's hand.
    Hand,
    /// Progress resets on every seven.
    Seven,
}

impl BetType {
    pub const COUNT: usize = 64;

    pub const ALL: [BetType; 64] = [
        BetType::Pass,
        BetType::DontPass,
        BetType::Come,
        BetType::DontCome,
        BetType::Field,
        BetType::Yes2,
        BetType::Yes3,
        BetType::Yes4,
        BetType::Yes5,
        BetType::Yes6,
        BetType::Yes8,
        BetType::Yes9,
        BetType::Yes10,
        BetType::Yes11,
        BetType::Yes12,
        BetType::No2,
        BetType::No3,
        BetType::No4,
        BetType::No5,
        BetType::No6,
        BetType::No8,
        BetType::No9,
        BetType::No10,
        BetType::No11,
        BetType::No12,
        BetType::Hard4,
        BetType::Hard6,
        BetType::Hard8,
        BetType::Hard10,
        BetType::OddsPass,
        BetType::OddsDontPass,
        BetType::OddsCome,
        BetType::OddsDontCome,
        BetType::HotRoller,
        BetType::Fire,
        BetType::TwiceHard,
        BetType::RideLine,
        BetType::Muggsy,
        BetType::AtsSmall,
        BetType::AtsTall,
        BetType::AtsAll,
        BetType::Replay,
        BetType::DifferentDoubles,
        BetType::Next2,
        BetType::Next3,
        BetType::Next4,
        BetType::Next5,
        BetType::Next6,
        BetType::Next7,
        BetType::Next8,
        BetType::Next9,
        BetType::Next10,
        BetType::Next11,
        BetType::Next12,
        BetType::Repeater2,
        BetType::Repeater3,
        BetType::Repeater4,
        BetType::Repeater5,
        BetType::Repeater6,
        BetType::Repeater8,
        BetType::Repeater9,
        BetType::Repeater10,
        BetType::Repeater11,
        BetType::Repeater12,
    ];

    pub fn category(self) -> BetCategory {
        match self as u8 {
            0..=3 => BetCategory::Line,
            4 => BetCategory::Field,
            5..=14 => BetCategory::Yes,
            15..=24 => BetCategory::No,
            25..=28 => BetCategory::Hardway,
            29..=32 => BetCategory::Odds,
            33..=42 => BetCategory::Bonus,
            43..=53 => BetCategory::Next,
            _ => BetCategory::Repeater,
        }
    }

    /// The dice total this bet is about, for bets that name one.
    pub fn number(self) -> Option<u8> {
        let tag = self as u8;
        match self.category() {
            BetCategory::Yes => Some(NON_SEVEN_TOTALS[(tag - 5) as usize]),
            BetCategory::No => Some(NON_SEVEN_TOTALS[(tag - 15) as usize]),
            BetCategory::Hardway => Some(4 + (tag - 25) * 2),
            BetCategory::Next => Some(2 + (tag - 43)),
            BetCategory::Repeater => Some(NON_SEVEN_TOTALS[(tag - 54) as usize]),
            _ => None,
        }
    }

    /// Bets that resolve on the very next roll regardless of outcome.
    pub fn is_one_roll(self) -> bool {
        matches!(self.category(), BetCategory::Field | BetCategory::Next)
    }

    /// Progress scope for bonus and repeater bets.
    pub fn bonus_scope(self) -> Option<BonusScope> {
        match self {
            BetType::Fire
            | BetType::HotRoller
            | BetType::RideLine
            | BetType::Replay
            | BetType::AtsSmall
            | BetType::AtsTall
            | BetType::AtsAll => Some(BonusScope::Hand),
            BetType::TwiceHard | BetType::DifferentDoubles => Some(BonusScope::Seven),
            _ if self.category() == BetCategory::Repeater => Some(BonusScope::Seven),
            _ => None,
        }
    }
}

impl TryFrom<u8> for BetType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(value as usize).copied().ok_or(())
    }
}

impl Write for BetType {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for BetType {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        BetType::try_from(value).map_err(|_| Error::InvalidEnum(value))
    }
}

impl FixedSize for BetType {
    const SIZE: usize = 1;
}
