//! Ordered collection of admitted groups.
//!
//! Groups are kept in admission order. Because admission heights never decrease, the front of the
//! pool is always the oldest group (and the first to expire).

use crate::{Error, Height};
use bytes::{Buf, BufMut, Bytes};
use commonware_codec::{EncodeSize, Error as CodecError, FixedSize, Read, ReadExt, Write};
use commonware_utils::hex;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// A group admitted into the [Pool].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Group {
    public_key: Bytes,
    hint: u64,
    height: Height,
    index: u64,
}

impl Group {
    /// Opaque public key of the group.
    pub fn public_key(&self) -> &Bytes {
        &self.public_key
    }

    /// Caller-supplied identifier provided at admission (not interpreted by the pool).
    pub fn hint(&self) -> u64 {
        self.hint
    }

    /// Height at which the group was admitted.
    pub fn height(&self) -> Height {
        self.height
    }

    /// Admission sequence number (strictly increasing, assigned by the pool).
    pub fn index(&self) -> u64 {
        self.index
    }
}

impl Write for Group {
    fn write(&self, buf: &mut impl BufMut) {
        self.public_key.write(buf);
        self.hint.write(buf);
        self.height.write(buf);
        self.index.write(buf);
    }
}

impl EncodeSize for Group {
    fn encode_size(&self) -> usize {
        self.public_key.encode_size() + 3 * u64::SIZE
    }
}

impl Read for Group {
    /// Maximum size of the public key.
    type Cfg = usize;

    fn read_cfg(buf: &mut impl Buf, max_public_key_size: &usize) -> Result<Self, CodecError> {
        let public_key = Bytes::read_cfg(buf, &(..=*max_public_key_size).into())?;
        let hint = u64::read(buf)?;
        let height = u64::read(buf)?;
        let index = u64::read(buf)?;
        Ok(Self {
            public_key,
            hint,
            height,
            index,
        })
    }
}

/// Groups admitted for beacon duty, oldest first.
#[derive(Clone, Debug, Default)]
pub struct Pool {
    groups: VecDeque<Group>,
    next: u64,
}

impl Pool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a group with the given `public_key` at `height`.
    ///
    /// Admission never fails because of the key itself (duplicate keys are accepted with a
    /// warning). It only fails if `height` is older than the most recent admission, which would
    /// break oldest-first ordering.
    pub fn submit(&mut self, public_key: Bytes, hint: u64, height: Height) -> Result<&Group, Error> {
        // Coordinator rejects stale heights first; this only fires for direct pool users
        if let Some(latest) = self.groups.back().map(Group::height) {
            if height < latest {
                return Err(Error::StaleSubmission { height, latest });
            }
        }
        if self.groups.iter().any(|g| g.public_key == public_key) {
            warn!(public_key = hex(&public_key), "admitting duplicate public key");
        }

        let index = self.next;
        self.next += 1;
        self.groups.push_back(Group {
            public_key,
            hint,
            height,
            index,
        });
        debug!(index, height, hint, groups = self.groups.len(), "admitted group");
        Ok(self.groups.back().expect("group just added"))
    }

    /// Number of groups currently admitted.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if no groups are admitted.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the group at `position` (0 is the oldest).
    pub fn get(&self, position: usize) -> Option<&Group> {
        self.groups.get(position)
    }

    /// Returns the oldest group.
    pub fn oldest(&self) -> Option<&Group> {
        self.groups.front()
    }

    /// Iterates over admitted groups, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    /// Sequence number that will be assigned to the next admitted group.
    pub fn next_index(&self) -> u64 {
        self.next
    }

    /// Removes and returns the oldest group.
    pub(crate) fn retire_oldest(&mut self) -> Option<Group> {
        self.groups.pop_front()
    }
}
