//! Track which members of a formed group are still operating.
//!
//! While a group runs its key generation, members that fail to participate in a phase are marked
//! inactive (IA) and members caught misbehaving are disqualified (DQ). Messages from either are
//! ignored for the rest of the protocol.

use crate::Error;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Index of a member within a group (1-based).
pub type MemberIndex = u32;

/// Decides whether a message from a group member should be processed.
pub trait MessageFilter {
    /// Returns true if messages from `sender` should be accepted.
    ///
    /// Only properly operating members (neither inactive nor disqualified) are accepted.
    fn is_sender_accepted(&self, sender: MemberIndex) -> bool;
}

/// Status of every member of a group of fixed size.
#[derive(Clone, Debug)]
pub struct Members {
    size: MemberIndex,
    inactive: BTreeSet<MemberIndex>,
    disqualified: BTreeSet<MemberIndex>,
}

impl Members {
    /// Creates a group of `size` members (`1..=size`), all operating.
    pub fn new(size: MemberIndex) -> Self {
        Self {
            size,
            inactive: BTreeSet::new(),
            disqualified: BTreeSet::new(),
        }
    }

    fn check(&self, member: MemberIndex) -> Result<(), Error> {
        if member == 0 || member > self.size {
            return Err(Error::UnknownMember(member));
        }
        Ok(())
    }

    /// Returns true if `member` is neither inactive nor disqualified.
    pub fn is_operating(&self, member: MemberIndex) -> bool {
        self.check(member).is_ok()
            && !self.inactive.contains(&member)
            && !self.disqualified.contains(&member)
    }

    /// Members still operating, in ascending order.
    pub fn operating(&self) -> Vec<MemberIndex> {
        (1..=self.size).filter(|m| self.is_operating(*m)).collect()
    }

    /// Members marked inactive, in ascending order.
    pub fn inactive(&self) -> Vec<MemberIndex> {
        self.inactive.iter().copied().collect()
    }

    /// Members marked disqualified, in ascending order.
    pub fn disqualified(&self) -> Vec<MemberIndex> {
        self.disqualified.iter().copied().collect()
    }

    /// Marks `member` as inactive.
    pub fn mark_inactive(&mut self, member: MemberIndex) -> Result<(), Error> {
        self.check(member)?;
        if self.inactive.insert(member) {
            debug!(member, "marked member inactive");
        }
        Ok(())
    }

    /// Marks `member` as disqualified.
    pub fn mark_disqualified(&mut self, member: MemberIndex) -> Result<(), Error> {
        self.check(member)?;
        if self.disqualified.insert(member) {
            debug!(member, "marked member disqualified");
        }
        Ok(())
    }
}

impl MessageFilter for Members {
    fn is_sender_accepted(&self, sender: MemberIndex) -> bool {
        self.is_operating(sender)
    }
}

/// Records which members were active during a phase and marks everyone else inactive.
pub struct InactiveMemberFilter<'a> {
    me: MemberIndex,
    members: &'a mut Members,
    active: HashSet<MemberIndex>,
}

impl<'a> InactiveMemberFilter<'a> {
    /// Creates a filter for a phase run by `me` (who is always considered active).
    pub fn new(me: MemberIndex, members: &'a mut Members) -> Self {
        Self {
            me,
            members,
            active: HashSet::new(),
        }
    }

    /// Marks `member` as active in this phase.
    pub fn mark_active(&mut self, member: MemberIndex) {
        self.active.insert(member);
    }

    /// Marks every operating member not seen during the phase as inactive.
    ///
    /// Returns the members newly marked inactive.
    pub fn flush_inactive_members(self) -> Vec<MemberIndex> {
        let mut flushed = Vec::new();
        for member in self.members.operating() {
            if member == self.me || self.active.contains(&member) {
                continue;
            }
            if self.members.mark_inactive(member).is_ok() {
                flushed.push(member);
            }
        }
        flushed
    }
}
