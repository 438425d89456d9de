//! Retire groups that have been active for too long.

use crate::{pool::Pool, Config, Group, Height};
use tracing::debug;

/// Outcome of a [Policy::sweep].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sweep {
    /// Groups removed from the pool, oldest first.
    pub retired: Vec<Group>,

    /// Whether the sweep stopped at an expired group to preserve the active-group floor.
    pub halted: bool,
}

/// Decides when groups expire and how many must remain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Policy {
    timeout: Height,
    floor: usize,
}

impl Policy {
    /// Creates a policy that expires groups `timeout` blocks after admission while keeping at
    /// least `floor` groups.
    pub fn new(timeout: Height, floor: usize) -> Self {
        Self { timeout, floor }
    }

    /// Creates a policy from protocol parameters.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.group_expiration_timeout,
            cfg.active_groups_threshold as usize,
        )
    }

    /// Returns true if `group` has been active for at least the expiration timeout at `height`.
    pub fn is_expired(&self, group: &Group, height: Height) -> bool {
        height.saturating_sub(group.height()) >= self.timeout
    }

    /// Minimum number of groups kept by [Policy::sweep].
    pub fn floor(&self) -> usize {
        self.floor
    }

    /// Retires expired groups from the front of `pool`.
    ///
    /// Stops at the first group that has not expired or when retiring another group would leave
    /// fewer than `floor` groups.
    pub fn sweep(&self, pool: &mut Pool, height: Height) -> Sweep {
        let mut sweep = Sweep::default();
        while let Some(oldest) = pool.oldest() {
            if !self.is_expired(oldest, height) {
                break;
            }
            if pool.len() <= self.floor {
                debug!(
                    index = oldest.index(),
                    height,
                    floor = self.floor,
                    "expired group kept to preserve floor"
                );
                sweep.halted = true;
                break;
            }
            let Some(group) = pool.retire_oldest() else {
                break;
            };
            debug!(
                index = group.index(),
                admitted = group.height(),
                height,
                "retired group"
            );
            sweep.retired.push(group);
        }
        sweep
    }
}
