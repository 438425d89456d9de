//! Collect tickets for a forming group.
//!
//! A formation round starts at some height with fresh entropy. Stakers submit their most
//! competitive tickets while submissions are open ([Phase::Initial] and [Phase::Reactive]) and only
//! the `group_size` lowest claimed tickets are retained. Claimed values are not recomputed on
//! submission: during [Phase::Challenge] anyone may challenge a retained ticket, which is
//! recomputed from the round entropy and dropped if the claim was false.
//!
//! Once the round has enough tickets ([Formation::is_ready]), the retained tickets (in ascending
//! order) are the members of the new group.

use crate::{ticket::Ticket, Config, Error, Height, U256};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// Phase of a formation round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Tickets may be submitted.
    Initial,
    /// Tickets may still be submitted in response to those already seen.
    Reactive,
    /// Submissions are closed; retained tickets may be challenged.
    Challenge,
    /// The round is over.
    Closed,
}

/// A ticket claimed by a staker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Submission {
    /// Claimed ticket.
    pub ticket: Ticket,

    /// Staker value used to derive the ticket.
    pub staker: U256,
}

/// Tracks the tickets submitted during one formation round.
pub struct Formation {
    entropy: U256,
    start: Height,

    timeout_initial: Height,
    timeout_submission: Height,
    timeout_challenge: Height,
    group_size: usize,
    group_threshold: usize,

    retained: BTreeSet<Submission>,
    seen: HashSet<(U256, u64)>,
}

impl Formation {
    /// Starts a formation round at `start` using `entropy`.
    pub fn new(cfg: &Config, entropy: U256, start: Height) -> Self {
        Self {
            entropy,
            start,
            timeout_initial: cfg.timeout_initial,
            timeout_submission: cfg.timeout_submission,
            timeout_challenge: cfg.timeout_challenge,
            group_size: cfg.group_size as usize,
            group_threshold: cfg.group_threshold as usize,
            retained: BTreeSet::new(),
            seen: HashSet::new(),
        }
    }

    /// Entropy of the round.
    pub fn entropy(&self) -> &U256 {
        &self.entropy
    }

    /// Phase of the round at `height`.
    pub fn phase(&self, height: Height) -> Phase {
        let elapsed = height.saturating_sub(self.start);
        if elapsed < self.timeout_initial {
            Phase::Initial
        } else if elapsed < self.timeout_submission {
            Phase::Reactive
        } else if elapsed < self.timeout_challenge {
            Phase::Challenge
        } else {
            Phase::Closed
        }
    }

    /// Submits a ticket claimed by `staker` (who controls `weight` virtual stakers).
    ///
    /// Returns whether the ticket is currently retained (it may be outcompeted later).
    pub fn submit(
        &mut self,
        staker: U256,
        weight: u64,
        ticket: Ticket,
        height: Height,
    ) -> Result<bool, Error> {
        match self.phase(height) {
            Phase::Initial | Phase::Reactive => {}
            Phase::Challenge | Phase::Closed => return Err(Error::PhaseClosed),
        }
        if ticket.index == 0 || ticket.index > weight {
            return Err(Error::InvalidTicket);
        }
        if !self.seen.insert((staker, ticket.index)) {
            return Err(Error::DuplicateTicket);
        }

        let submission = Submission { ticket, staker };
        self.retained.insert(submission);
        if self.retained.len() > self.group_size {
            if let Some(evicted) = self.retained.pop_last() {
                if evicted == submission {
                    debug!(index = ticket.index, ?staker, "ticket not competitive");
                    return Ok(false);
                }
                debug!(index = evicted.ticket.index, staker = ?evicted.staker, "ticket evicted");
            }
        }
        Ok(true)
    }

    /// Challenges the ticket of virtual staker `index` of `staker`.
    ///
    /// Returns true if the ticket was retained and its claimed value was false (in which case it is
    /// dropped).
    pub fn challenge(&mut self, staker: U256, index: u64, height: Height) -> Result<bool, Error> {
        if self.phase(height) != Phase::Challenge {
            return Err(Error::PhaseClosed);
        }
        let Some(submission) = self
            .retained
            .iter()
            .find(|s| s.staker == staker && s.ticket.index == index)
            .copied()
        else {
            return Ok(false);
        };
        if submission.ticket.verify(&self.entropy, &staker) {
            return Ok(false);
        }
        warn!(index, ?staker, "dropping invalid ticket");
        self.retained.remove(&submission);
        Ok(true)
    }

    /// Returns true if enough tickets are retained to form a group.
    pub fn is_ready(&self) -> bool {
        self.retained.len() >= self.group_threshold
    }

    /// Retained submissions, most competitive first.
    ///
    /// The member index of a submission is its (1-based) position in this list.
    pub fn members(&self) -> Vec<Submission> {
        self.retained.iter().copied().collect()
    }
}
