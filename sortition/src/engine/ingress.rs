use crate::{Error, Group, Selection, U256};
use bytes::Bytes;
use futures::{
    channel::{mpsc, oneshot},
    SinkExt,
};

/// Messages that can be sent to the [Engine](super::Engine).
pub enum Message {
    /// Admit a formed group.
    Submit {
        public_key: Bytes,
        hint: u64,
        response: oneshot::Sender<Result<Group, Error>>,
    },

    /// Retire expired groups and select a group for a request.
    Select {
        seed: U256,
        response: oneshot::Sender<Result<Selection, Error>>,
    },

    /// Count admitted groups.
    NumberOfGroups { response: oneshot::Sender<usize> },

    /// Snapshot admitted groups, oldest first.
    Groups {
        response: oneshot::Sender<Vec<Group>>,
    },
}

/// Ingress mailbox for the [Engine](super::Engine).
///
/// Clones share the same engine. Requests from all clones are processed one at a time, in the
/// order the engine receives them.
#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
}

impl Mailbox {
    pub(super) fn new(sender: mpsc::Sender<Message>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &mut self,
        message: impl FnOnce(oneshot::Sender<T>) -> Message,
    ) -> Result<T, Error> {
        let (response, receiver) = oneshot::channel();
        self.sender
            .send(message(response))
            .await
            .map_err(|_| Error::MailboxClosed)?;
        receiver.await.map_err(|_| Error::MailboxClosed)
    }

    /// Admits a group with `public_key` at the current ledger height.
    pub async fn submit(&mut self, public_key: Bytes, hint: u64) -> Result<Group, Error> {
        self.request(|response| Message::Submit {
            public_key,
            hint,
            response,
        })
        .await?
    }

    /// Retires expired groups and selects a group for `seed` at the current ledger height.
    pub async fn select(&mut self, seed: U256) -> Result<Selection, Error> {
        self.request(|response| Message::Select { seed, response })
            .await?
    }

    /// Returns the number of admitted groups.
    pub async fn number_of_groups(&mut self) -> Result<usize, Error> {
        self.request(|response| Message::NumberOfGroups { response })
            .await
    }

    /// Returns the admitted groups, oldest first.
    pub async fn groups(&mut self) -> Result<Vec<Group>, Error> {
        self.request(|response| Message::Groups { response }).await
    }
}
