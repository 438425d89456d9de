use super::{
    ingress::{Mailbox, Message},
    metrics::Metrics,
    Config,
};
use crate::{Coordinator, Error, Ledger};
use commonware_runtime::{Handle, Metrics as RuntimeMetrics, Spawner};
use futures::{channel::mpsc, StreamExt};
use tracing::{debug, info, warn};

/// Single writer of the group pool.
///
/// It is responsible for:
/// - Admitting formed groups at the current ledger height
/// - Retiring expired groups and selecting a group for each request
/// - Serving consistent reads of the pool
pub struct Engine<E: Spawner + RuntimeMetrics, L: Ledger> {
    context: E,
    ledger: L,
    coordinator: Coordinator,
    mailbox: mpsc::Receiver<Message>,
    metrics: Metrics,
}

impl<E: Spawner + RuntimeMetrics, L: Ledger> Engine<E, L> {
    /// Creates a new engine with the given context and configuration.
    ///
    /// Returns the engine and a mailbox for sending requests to the engine.
    pub fn new(context: E, cfg: Config<L>) -> Result<(Self, Mailbox), Error> {
        if cfg.mailbox_size == 0 {
            return Err(Error::InvalidConfiguration(
                "mailbox size must be greater than zero",
            ));
        }
        let coordinator = Coordinator::new(&cfg.protocol)?;
        let (sender, mailbox) = mpsc::channel(cfg.mailbox_size);
        let metrics = Metrics::init(context.clone());

        Ok((
            Self {
                context,
                ledger: cfg.ledger,
                coordinator,
                mailbox,
                metrics,
            },
            Mailbox::new(sender),
        ))
    }

    /// Starts the engine.
    ///
    /// The engine runs until every [Mailbox] has been dropped.
    pub fn start(mut self) -> Handle<()> {
        self.context.spawn_ref()(self.run())
    }

    async fn run(mut self) {
        while let Some(message) = self.mailbox.next().await {
            let height = self.ledger.height();
            match message {
                Message::Submit {
                    public_key,
                    hint,
                    response,
                } => {
                    let result = self.coordinator.submit(public_key, hint, height).cloned();
                    match &result {
                        Ok(group) => {
                            self.metrics.submitted.inc();
                            info!(index = group.index(), hint, height, "admitted group");
                        }
                        Err(err) => {
                            self.metrics.rejected.inc();
                            warn!(?err, hint, height, "rejected group");
                        }
                    }
                    let _ = response.send(result);
                }
                Message::Select { seed, response } => {
                    let result = self.coordinator.select(&seed, height);
                    match &result {
                        Ok(selection) => {
                            self.metrics.selected.inc();
                            self.metrics
                                .expired
                                .inc_by(selection.retired.len() as u64);
                            debug!(
                                index = selection.group.index(),
                                retired = selection.retired.len(),
                                height,
                                "served selection"
                            );
                        }
                        Err(err) => {
                            self.metrics.rejected.inc();
                            warn!(?err, height, "failed to select group");
                        }
                    }
                    let _ = response.send(result);
                }
                Message::NumberOfGroups { response } => {
                    let _ = response.send(self.coordinator.number_of_groups());
                }
                Message::Groups { response } => {
                    let _ = response.send(self.coordinator.pool().iter().cloned().collect());
                }
            }
            self.metrics
                .groups
                .set(self.coordinator.number_of_groups() as i64);
        }
        debug!("mailbox closed, shutting down");
    }
}
