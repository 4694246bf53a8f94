use super::{ENTROPY_LEN, MAX_ENTROPY_SOURCES};
use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};

/// Randomness phase for the current epoch.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RngPhase {
    /// Wagers accepted; entropy rejected.
    #[default]
    Betting = 0,
    /// Entropy accepted; wagers rejected.
    Collecting = 1,
    /// Dice are fixed for the epoch.
    Finalized = 2,
}

impl Write for RngPhase {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for RngPhase {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::Betting),
            1 => Ok(Self::Collecting),
            2 => Ok(Self::Finalized),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for RngPhase {
    const SIZE: usize = 1;
}

pub(crate) fn read_bytes<const N: usize>(reader: &mut impl Buf) -> Result<[u8; N], Error> {
    if reader.remaining() < N {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = [0u8; N];
    reader.copy_to_slice(&mut bytes);
    Ok(bytes)
}

/// A 32-byte entropy value tagged with the slot it was observed at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EntropySource {
    pub slot: u64,
    pub value: [u8; ENTROPY_LEN],
}

impl EntropySource {
    pub fn new(slot: u64, value: [u8; ENTROPY_LEN]) -> Self {
        Self { slot, value }
    }

    /// All-zero values carry no entropy.
    pub fn is_predictable(&self) -> bool {
        self.value.iter().all(|b| *b == 0)
    }
}

impl Write for EntropySource {
    fn write(&self, writer: &mut impl BufMut) {
        self.slot.write(writer);
        writer.put_slice(&self.value);
    }
}

impl Read for EntropySource {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            slot: u64::read(reader)?,
            value: read_bytes(reader)?,
        })
    }
}

impl FixedSize for EntropySource {
    const SIZE: usize = u64::SIZE + ENTROPY_LEN;
}

/// Randomness state for one epoch.
///
/// `hash_count` is the number of collected sources. Unused source slots are
/// written as zeros so the record keeps a fixed size. `dice` is `[0, 0]` until
/// the epoch is finalized. `slot_floor` is the lowest slot a source may use
/// before any source is collected; a restarted epoch raises it past every slot
/// the abandoned collection consumed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RngState {
    pub epoch: u64,
    pub phase: RngPhase,
    pub phase_started_at: u64,
    pub slot_floor: u64,
    pub sources: Vec<EntropySource>,
    pub dice: [u8; 2],
}

impl RngState {
    pub fn hash_count(&self) -> u8 {
        self.sources.len() as u8
    }

    pub fn last_slot(&self) -> Option<u64> {
        self.sources.last().map(|s| s.slot)
    }

    /// Whether `slot` is past every slot consumed so far in this epoch.
    pub fn accepts_slot(&self, slot: u64) -> bool {
        match self.last_slot() {
            Some(last) => slot > last,
            None => slot >= self.slot_floor,
        }
    }

    pub fn final_dice(&self) -> Option<(u8, u8)> {
        match self.phase {
            RngPhase::Finalized => Some((self.dice[0], self.dice[1])),
            _ => None,
        }
    }
}

impl Write for RngState {
    fn write(&self, writer: &mut impl BufMut) {
        self.epoch.write(writer);
        self.phase.write(writer);
        self.hash_count().write(writer);
        self.phase_started_at.write(writer);
        self.slot_floor.write(writer);
        for i in 0..MAX_ENTROPY_SOURCES {
            self.sources
                .get(i)
                .copied()
                .unwrap_or_default()
                .write(writer);
        }
        writer.put_slice(&self.dice);
    }
}

impl Read for RngState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let epoch = u64::read(reader)?;
        let phase = RngPhase::read(reader)?;
        let hash_count = u8::read(reader)? as usize;
        if hash_count > MAX_ENTROPY_SOURCES {
            return Err(Error::Invalid("RngState", "too many entropy sources"));
        }
        let phase_started_at = u64::read(reader)?;
        let slot_floor = u64::read(reader)?;
        let mut sources = Vec::with_capacity(hash_count);
        for i in 0..MAX_ENTROPY_SOURCES {
            let source = EntropySource::read(reader)?;
            if i < hash_count {
                sources.push(source);
            }
        }
        let dice = read_bytes(reader)?;
        Ok(Self {
            epoch,
            phase,
            phase_started_at,
            slot_floor,
            sources,
            dice,
        })
    }
}

impl FixedSize for RngState {
    const SIZE: usize = u64::SIZE
        + RngPhase::SIZE
        + u8::SIZE
        + u64::SIZE
        + u64::SIZE
        + MAX_ENTROPY_SOURCES * EntropySource::SIZE
        + 2;
}
