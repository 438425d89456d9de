//! Serialize admissions and selections through a single actor.
//!
//! # Overview
//!
//! The [Engine] owns the group pool. Callers interact with it exclusively through a [Mailbox]:
//! admissions, selections, and reads are queued and processed one at a time, so every request
//! observes the effects of all requests processed before it. The height of each request is read
//! from the configured [Ledger](crate::Ledger) when the engine processes it (not when the caller
//! sends it).
//!
//! # Metrics
//!
//! The engine tracks the number of admitted groups, admissions, selections, retired groups, and
//! rejected requests.

mod actor;
pub use actor::Engine;
mod ingress;
pub use ingress::{Mailbox, Message};
mod metrics;

/// Configuration for the [Engine].
pub struct Config<L: crate::Ledger> {
    /// Source of the current height.
    pub ledger: L,

    /// Protocol parameters.
    pub protocol: crate::Config,

    /// Maximum number of requests to buffer before blocking callers.
    pub mailbox_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::tests::config, mocks, Error, Group, Height, U256};
    use bytes::Bytes;
    use commonware_macros::test_traced;
    use commonware_runtime::{deterministic, Metrics, Runner, Spawner};
    use futures::future::join_all;
    use std::time::Duration;

    fn start(
        context: &deterministic::Context,
        ledger: &mocks::Ledger,
        protocol: crate::Config,
    ) -> Mailbox {
        let (engine, mailbox) = Engine::new(
            context.with_label("engine"),
            Config {
                ledger: ledger.clone(),
                protocol,
                mailbox_size: 16,
            },
        )
        .unwrap();
        engine.start();
        mailbox
    }

    /// Submits `count` groups, mining one block after each.
    async fn seed(mailbox: &mut Mailbox, ledger: &mocks::Ledger, count: u8) {
        for i in 1..=count {
            mailbox.submit(Bytes::from(vec![i]), i as u64).await.unwrap();
            ledger.advance(1);
        }
    }

    /// Mines enough blocks for every group admitted so far to expire.
    fn mine(ledger: &mocks::Ledger, timeout: Height) {
        ledger.advance(timeout + 1);
    }

    #[test_traced]
    fn test_groups_added() {
        let executor = deterministic::Runner::timed(Duration::from_secs(10));
        executor.start(|context| async move {
            let ledger = mocks::Ledger::new(1);
            let mut mailbox = start(&context, &ledger, config());
            seed(&mut mailbox, &ledger, 7).await;
            assert_eq!(mailbox.number_of_groups().await.unwrap(), 7);

            let groups = mailbox.groups().await.unwrap();
            assert!(groups.iter().map(Group::index).eq(0..7));
            assert!(groups.iter().map(Group::height).eq(1..8));
        });
    }

    #[test_traced]
    fn test_one_group_expires() {
        let executor = deterministic::Runner::timed(Duration::from_secs(10));
        executor.start(|context| async move {
            let cfg = config();
            let ledger = mocks::Ledger::new(1);
            let mut mailbox = start(&context, &ledger, cfg.clone());
            seed(&mut mailbox, &ledger, 7).await;

            mine(&ledger, cfg.group_expiration_timeout);
            let selection = mailbox.select(U256::from(1)).await.unwrap();
            assert!(!selection.retired.is_empty());
            assert_ne!(mailbox.number_of_groups().await.unwrap(), 7);
        });
    }

    #[test_traced]
    fn test_more_than_one_group_expires() {
        let executor = deterministic::Runner::timed(Duration::from_secs(10));
        executor.start(|context| async move {
            let cfg = config();
            let ledger = mocks::Ledger::new(1);
            let mut mailbox = start(&context, &ledger, cfg.clone());
            seed(&mut mailbox, &ledger, 7).await;

            for _ in 0..4 {
                mine(&ledger, cfg.group_expiration_timeout);
                mailbox.select(U256::from(1)).await.unwrap();
            }
            assert!(mailbox.number_of_groups().await.unwrap() < 7 - 1);
        });
    }

    #[test_traced]
    fn test_groups_never_below_floor() {
        let executor = deterministic::Runner::timed(Duration::from_secs(10));
        executor.start(|context| async move {
            let cfg = config();
            let floor = cfg.active_groups_threshold as usize;
            let ledger = mocks::Ledger::new(1);
            let mut mailbox = start(&context, &ledger, cfg.clone());
            seed(&mut mailbox, &ledger, 7).await;
            seed(&mut mailbox, &ledger, 10).await;
            assert_eq!(mailbox.number_of_groups().await.unwrap(), 17);

            for i in 1..=20 {
                mine(&ledger, cfg.group_expiration_timeout);
                mailbox.select(U256::from(i)).await.unwrap();
                assert!(mailbox.number_of_groups().await.unwrap() >= floor);
            }
            assert_eq!(mailbox.number_of_groups().await.unwrap(), floor);

            let metrics = context.encode();
            assert!(metrics.contains("engine_groups 1"));
            assert!(metrics.contains("engine_submitted_total 17"));
            assert!(metrics.contains("engine_expired_total 16"));
            assert!(metrics.contains("engine_selected_total 20"));
        });
    }

    #[test_traced]
    fn test_select_empty_pool() {
        let executor = deterministic::Runner::timed(Duration::from_secs(10));
        executor.start(|context| async move {
            let ledger = mocks::Ledger::new(1);
            let mut mailbox = start(&context, &ledger, config());
            assert_eq!(
                mailbox.select(U256::from(1)).await,
                Err(Error::EmptyPool)
            );

            // The engine keeps serving after a failed selection
            mailbox.submit(Bytes::from_static(b"key"), 0).await.unwrap();
            let selection = mailbox.select(U256::from(1)).await.unwrap();
            assert_eq!(selection.group.public_key(), &Bytes::from_static(b"key"));

            let metrics = context.encode();
            assert!(metrics.contains("engine_rejected_total 1"));
        });
    }

    #[test_traced]
    fn test_invalid_config() {
        let executor = deterministic::Runner::timed(Duration::from_secs(10));
        executor.start(|context| async move {
            let mut protocol = config();
            protocol.active_groups_threshold = protocol.group_size + 1;
            let result = Engine::new(
                context.with_label("engine"),
                Config {
                    ledger: mocks::Ledger::new(0),
                    protocol,
                    mailbox_size: 16,
                },
            );
            assert!(matches!(result, Err(Error::InvalidConfiguration(_))));

            let result = Engine::new(
                context.with_label("empty"),
                Config {
                    ledger: mocks::Ledger::new(0),
                    protocol: config(),
                    mailbox_size: 0,
                },
            );
            assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
        });
    }

    #[test_traced]
    fn test_concurrent_submitters() {
        let executor = deterministic::Runner::timed(Duration::from_secs(10));
        executor.start(|context| async move {
            let ledger = mocks::Ledger::new(1);
            let mut mailbox = start(&context, &ledger, config());

            let mut handles = Vec::new();
            for submitter in 0..3u8 {
                let mut mailbox = mailbox.clone();
                let ledger = ledger.clone();
                handles.push(context.with_label("submitter").spawn(move |_| async move {
                    let mut indices = Vec::new();
                    for i in 0..5u8 {
                        let group = mailbox
                            .submit(Bytes::from(vec![submitter, i]), submitter as u64)
                            .await
                            .unwrap();
                        indices.push(group.index());
                        ledger.advance(1);
                    }
                    indices
                }));
            }

            // Each submitter observes strictly increasing indices
            let mut all = Vec::new();
            for indices in join_all(handles).await {
                let indices = indices.unwrap();
                assert!(indices.windows(2).all(|w| w[0] < w[1]));
                all.extend(indices);
            }

            // Every admission received a unique index
            all.sort_unstable();
            assert!(all.into_iter().eq(0..15));

            // Admission heights never decrease in pool order
            let groups = mailbox.groups().await.unwrap();
            assert_eq!(groups.len(), 15);
            assert!(groups.windows(2).all(|w| w[0].height() <= w[1].height()));
        });
    }

    #[test_traced]
    fn test_mailbox_closed() {
        let executor = deterministic::Runner::timed(Duration::from_secs(10));
        executor.start(|context| async move {
            let (engine, mut mailbox) = Engine::new(
                context.with_label("engine"),
                Config {
                    ledger: mocks::Ledger::new(0),
                    protocol: config(),
                    mailbox_size: 16,
                },
            )
            .unwrap();

            // Engine is dropped without ever starting
            drop(engine);
            assert_eq!(
                mailbox.number_of_groups().await,
                Err(Error::MailboxClosed)
            );
        });
    }
}
