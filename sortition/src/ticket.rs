//! Derive sortition tickets from beacon entropy and stake.
//!
//! A staker with weight `W` controls `W` virtual stakers (indexed `1..=W`). Each virtual staker
//! receives one [Ticket] whose value is:
//!
//! ```text
//! keccak256(entropy || staker || index)
//! ```
//!
//! where all three inputs are encoded as 32-byte big-endian words. Lower values are more
//! competitive. Because the entropy is not known before the round starts, a staker cannot choose
//! which of its virtual stakers will produce favorable tickets.

use bytes::{Buf, BufMut};
use commonware_codec::{Error as CodecError, FixedSize, Read, ReadExt, Write};
use commonware_utils::hex;
use sha3::{Digest as _, Keccak256};
use std::fmt::{Debug, Display};

/// Size of a [U256] in bytes.
const WORD_SIZE: usize = 32;

/// A 256-bit unsigned integer stored as big-endian bytes.
///
/// Byte-wise ordering of the big-endian representation matches integer ordering.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U256([u8; WORD_SIZE]);

impl U256 {
    /// The smallest value.
    pub const ZERO: Self = Self([0; WORD_SIZE]);

    /// The largest value.
    pub const MAX: Self = Self([u8::MAX; WORD_SIZE]);

    /// Creates a value from big-endian bytes.
    pub const fn new(bytes: [u8; WORD_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the big-endian bytes.
    pub const fn as_bytes(&self) -> &[u8; WORD_SIZE] {
        &self.0
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        let mut bytes = [0; WORD_SIZE];
        bytes[WORD_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl From<[u8; WORD_SIZE]> for U256 {
    fn from(bytes: [u8; WORD_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for U256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for U256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex(&self.0))
    }
}

impl Display for U256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex(&self.0))
    }
}

impl Write for U256 {
    fn write(&self, buf: &mut impl BufMut) {
        self.0.write(buf);
    }
}

impl Read for U256 {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        Ok(Self(<[u8; WORD_SIZE]>::read(buf)?))
    }
}

impl FixedSize for U256 {
    const SIZE: usize = WORD_SIZE;
}

/// A sortition entry held by one virtual staker.
///
/// Tickets order by value first, then by index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket {
    /// Pseudo-random value (lower is better).
    pub value: U256,

    /// Index of the virtual staker that holds this ticket (1-based).
    pub index: u64,
}

impl Ticket {
    /// Computes the ticket held by virtual staker `index` of `staker` for the given `entropy`.
    pub fn compute(entropy: &U256, staker: &U256, index: u64) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(entropy.as_bytes());
        hasher.update(staker.as_bytes());
        hasher.update(U256::from(index).as_bytes());
        let digest = hasher.finalize();

        let mut value = [0; WORD_SIZE];
        value.copy_from_slice(&digest);
        Self {
            value: U256(value),
            index,
        }
    }

    /// Returns true if this ticket was honestly derived from `entropy` and `staker`.
    pub fn verify(&self, entropy: &U256, staker: &U256) -> bool {
        self.index > 0 && Self::compute(entropy, staker, self.index).value == self.value
    }
}

impl Write for Ticket {
    fn write(&self, buf: &mut impl BufMut) {
        self.value.write(buf);
        self.index.write(buf);
    }
}

impl Read for Ticket {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let value = U256::read(buf)?;
        let index = u64::read(buf)?;
        if index == 0 {
            return Err(CodecError::Invalid("Ticket", "index must be positive"));
        }
        Ok(Self { value, index })
    }
}

impl FixedSize for Ticket {
    const SIZE: usize = U256::SIZE + u64::SIZE;
}

/// Generates the tickets of every virtual staker controlled by `staker`.
///
/// Returns exactly `weight` tickets, in index order (`1..=weight`).
pub fn generate(entropy: &U256, staker: &U256, weight: u64) -> Vec<Ticket> {
    (1..=weight)
        .map(|index| Ticket::compute(entropy, staker, index))
        .collect()
}

/// Returns the number of virtual stakers a `stake` controls.
///
/// A stake below `minimum_stake` controls no virtual stakers.
pub fn weight(stake: u64, minimum_stake: u64) -> u64 {
    stake.checked_div(minimum_stake).unwrap_or(0)
}

/// Returns the `n` most competitive tickets, in ascending order.
pub fn lowest(mut tickets: Vec<Ticket>, n: usize) -> Vec<Ticket> {
    tickets.sort_unstable();
    tickets.truncate(n);
    tickets
}
