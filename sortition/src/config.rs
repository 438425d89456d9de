use crate::{Error, Height};

/// Protocol parameters, fixed at initialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Stake required for one virtual staker.
    pub minimum_stake: u64,

    /// Minimum number of tickets required to form a group.
    pub group_threshold: u32,

    /// Maximum number of members in a group.
    pub group_size: u32,

    /// Blocks (from the start of formation) during which tickets may be submitted in the
    /// initial phase.
    pub timeout_initial: Height,

    /// Blocks (from the start of formation) after which no more tickets may be submitted.
    pub timeout_submission: Height,

    /// Blocks (from the start of formation) after which submitted tickets may no longer be
    /// challenged.
    pub timeout_challenge: Height,

    /// Blocks a group remains active before it becomes eligible for retirement.
    pub group_expiration_timeout: Height,

    /// Minimum number of groups that must remain admitted after any expiration sweep.
    pub active_groups_threshold: u32,

    /// Maximum size of a group public key (in bytes) accepted when decoding a [crate::Group].
    pub max_public_key_size: usize,
}

impl Config {
    /// Returns an error if any parameter is invalid.
    pub fn validate(&self) -> Result<(), Error> {
        if self.minimum_stake == 0 {
            return Err(Error::InvalidConfiguration(
                "minimum stake must be greater than zero",
            ));
        }
        if self.group_threshold == 0 {
            return Err(Error::InvalidConfiguration(
                "group threshold must be greater than zero",
            ));
        }
        if self.group_size == 0 {
            return Err(Error::InvalidConfiguration(
                "group size must be greater than zero",
            ));
        }
        if self.group_threshold > self.group_size {
            return Err(Error::InvalidConfiguration(
                "group threshold must be less than or equal to group size",
            ));
        }
        if self.timeout_initial == 0 {
            return Err(Error::InvalidConfiguration(
                "initial timeout must be greater than zero",
            ));
        }
        if self.timeout_submission <= self.timeout_initial {
            return Err(Error::InvalidConfiguration(
                "submission timeout must be greater than initial timeout",
            ));
        }
        if self.timeout_challenge <= self.timeout_submission {
            return Err(Error::InvalidConfiguration(
                "challenge timeout must be greater than submission timeout",
            ));
        }
        if self.group_expiration_timeout == 0 {
            return Err(Error::InvalidConfiguration(
                "group expiration timeout must be greater than zero",
            ));
        }
        if self.active_groups_threshold == 0 {
            return Err(Error::InvalidConfiguration(
                "active groups threshold must be greater than zero",
            ));
        }
        if self.active_groups_threshold > self.group_size {
            return Err(Error::InvalidConfiguration(
                "active groups threshold must be less than or equal to group size",
            ));
        }
        if self.max_public_key_size == 0 {
            return Err(Error::InvalidConfiguration(
                "max public key size must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use test_case::test_case;

    /// Parameters of the reference deployment (one block per transaction).
    pub(crate) fn config() -> Config {
        Config {
            minimum_stake: 200_000,
            group_threshold: 15,
            group_size: 20,
            timeout_initial: 20,
            timeout_submission: 50,
            timeout_challenge: 60,
            group_expiration_timeout: 1,
            active_groups_threshold: 1,
            max_public_key_size: 1024,
        }
    }

    #[test]
    fn test_valid() {
        assert_eq!(config().validate(), Ok(()));
    }

    #[test_case(|c: &mut Config| { c.minimum_stake = 0 }; "zero minimum stake")]
    #[test_case(|c: &mut Config| { c.group_threshold = 0 }; "zero group threshold")]
    #[test_case(|c: &mut Config| { c.group_size = 0 }; "zero group size")]
    #[test_case(|c: &mut Config| { c.group_threshold = 21 }; "threshold above size")]
    #[test_case(|c: &mut Config| { c.timeout_initial = 0 }; "zero initial timeout")]
    #[test_case(|c: &mut Config| { c.timeout_submission = 20 }; "submission not after initial")]
    #[test_case(|c: &mut Config| { c.timeout_challenge = 50 }; "challenge not after submission")]
    #[test_case(|c: &mut Config| { c.group_expiration_timeout = 0 }; "zero expiration timeout")]
    #[test_case(|c: &mut Config| { c.active_groups_threshold = 0 }; "zero active groups threshold")]
    #[test_case(|c: &mut Config| { c.active_groups_threshold = 21 }; "active groups above size")]
    #[test_case(|c: &mut Config| { c.max_public_key_size = 0 }; "zero max public key size")]
    fn test_invalid(mutate: fn(&mut Config)) {
        let mut cfg = config();
        mutate(&mut cfg);
        assert!(matches!(
            cfg.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_boundaries() {
        let mut cfg = config();
        cfg.group_threshold = cfg.group_size;
        cfg.active_groups_threshold = cfg.group_size;
        assert_eq!(cfg.validate(), Ok(()));
    }
}
