//! Admit groups and select one for each beacon request.
//!
//! Every selection first sweeps expired groups from the pool (see [crate::expiration]) and then
//! picks one of the remaining active groups by reducing the request seed modulo their count. Expired
//! groups kept by the active-group floor are only selected when no active group remains.

use crate::{
    expiration::{Policy, Sweep},
    pool::Pool,
    Config, Error, Group, Height, U256,
};
use bytes::Bytes;
use commonware_utils::modulo;
use tracing::{debug, info};

/// Result of a successful [Coordinator::select].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Group designated to serve the request.
    pub group: Group,

    /// Groups retired by the sweep that preceded the selection.
    pub retired: Vec<Group>,
}

/// Owns the [Pool] and applies the expiration [Policy] on every selection.
///
/// All methods take the current height explicitly. Heights passed to consecutive calls must not
/// decrease.
#[derive(Clone, Debug)]
pub struct Coordinator {
    pool: Pool,
    policy: Policy,
    latest: Height,
}

impl Coordinator {
    /// Creates a coordinator with an empty pool.
    pub fn new(cfg: &Config) -> Result<Self, Error> {
        cfg.validate()?;
        Ok(Self {
            pool: Pool::new(),
            policy: Policy::from_config(cfg),
            latest: 0,
        })
    }

    /// Admits a formed group.
    pub fn submit(&mut self, public_key: Bytes, hint: u64, height: Height) -> Result<&Group, Error> {
        if height < self.latest {
            return Err(Error::StaleSubmission {
                height,
                latest: self.latest,
            });
        }
        self.latest = height;
        self.pool.submit(public_key, hint, height)
    }

    /// Number of admitted groups.
    pub fn number_of_groups(&self) -> usize {
        self.pool.len()
    }

    /// Read-only view of the pool.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Expiration policy in use.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Retires expired groups and selects a group for `seed`.
    ///
    /// Fails with [Error::EmptyPool] if no group has been admitted.
    pub fn select(&mut self, seed: &U256, height: Height) -> Result<Selection, Error> {
        if height < self.latest {
            return Err(Error::StaleSelection {
                height,
                latest: self.latest,
            });
        }
        self.latest = height;
        if self.pool.is_empty() {
            return Err(Error::EmptyPool);
        }

        let Sweep { retired, halted } = self.policy.sweep(&mut self.pool, height);
        if !retired.is_empty() {
            info!(
                retired = retired.len(),
                remaining = self.pool.len(),
                halted,
                height,
                "retired expired groups"
            );
        }

        // Admission heights never decrease, so active groups form a suffix of the pool. If the
        // floor kept only expired groups, any of them may serve.
        let first_active = self
            .pool
            .iter()
            .position(|g| !self.policy.is_expired(g, height))
            .unwrap_or(0);
        let candidates = (self.pool.len() - first_active) as u64;
        let position = first_active + modulo(seed.as_ref(), candidates) as usize;
        let group = self.pool.get(position).cloned().ok_or(Error::EmptyPool)?;
        debug!(?seed, index = group.index(), position, height, "selected group");
        Ok(Selection { group, retired })
    }
}
