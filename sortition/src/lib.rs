//! Form, admit, select, and retire stake-weighted groups with verifiable tickets.
//!
//! # Overview
//!
//! A pool of staked participants forms groups (each identified by an opaque public key) that
//! take turns producing beacon output. Participants compete for seats in a forming group with
//! [ticket::Ticket]s: each virtual staker derives a pseudo-random value from the round entropy and
//! the lowest values win. Once a group is formed, its public key is admitted into a
//! [pool::Pool]. Whenever a group is needed, the [coordinator::Coordinator] retires groups that
//! have aged past the expiration timeout (oldest first) and then picks one of the remaining groups
//! using the request seed.
//!
//! # Active-Group Floor
//!
//! Expiration never reduces the number of admitted groups below `active_groups_threshold`. If
//! retiring the next expired group would violate the floor, the sweep stops (this is not an error)
//! and the expired group stays in the pool until more groups are admitted. Selection prefers
//! active groups and only falls back to expired ones when no active group remains.
//!
//! # Single Writer
//!
//! The pool is meant to be owned by exactly one writer. [engine::Engine] is an actor that owns a
//! [coordinator::Coordinator] and serializes every admission and selection received over its
//! [engine::Mailbox]. The height used for each request is read from a [Ledger] when the request
//! is processed, so requests are totally ordered by the engine rather than by callers.
//!
//! # Status
//!
//! `commonware-sortition` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

#![doc(
    html_logo_url = "https://commonware.xyz/imgs/rustdoc_logo.svg",
    html_favicon_url = "https://commonware.xyz/favicon.ico"
)]

use thiserror::Error;

pub mod config;
pub use config::Config;
pub mod coordinator;
pub use coordinator::{Coordinator, Selection};
pub mod engine;
pub mod expiration;
pub mod formation;
pub mod members;
pub mod pool;
pub use pool::{Group, Pool};
pub mod ticket;
pub use ticket::{Ticket, U256};

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

/// Block height supplied by the external ledger.
pub type Height = u64;

/// Errors that can occur when forming, admitting, or selecting groups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("no groups available for selection")]
    EmptyPool,
    #[error("stale submission: height {height} is older than {latest}")]
    StaleSubmission { height: Height, latest: Height },
    #[error("stale selection: height {height} is older than {latest}")]
    StaleSelection { height: Height, latest: Height },
    #[error("invalid ticket")]
    InvalidTicket,
    #[error("phase closed")]
    PhaseClosed,
    #[error("duplicate ticket")]
    DuplicateTicket,
    #[error("unknown member: {0}")]
    UnknownMember(members::MemberIndex),
    #[error("mailbox closed")]
    MailboxClosed,
}

/// Source of the current block height.
///
/// Height must never decrease. The engine reads it once per request.
pub trait Ledger: Clone + Send + 'static {
    /// Returns the current block height.
    fn height(&self) -> Height;
}
