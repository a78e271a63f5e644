//! Mock transfer channel for tests and the scenario runner.

use super::traits::{FundsTransfer, TransferError};
use crate::identity::Identity;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Records payouts in memory; can be told to refuse.
#[derive(Clone, Default)]
pub struct MockTransfer {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    received: HashMap<Identity, u64>,
    rejecting: HashSet<Identity>,
    offline: bool,
    attempts: usize,
}

impl MockTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make transfers to `recipient` fail with `Rejected`.
    pub fn reject_recipient(&self, recipient: Identity) {
        self.state.lock().unwrap().rejecting.insert(recipient);
    }

    /// Accept transfers to `recipient` again.
    pub fn accept_recipient(&self, recipient: &Identity) {
        self.state.lock().unwrap().rejecting.remove(recipient);
    }

    /// Make every transfer fail with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// Total successfully paid to `recipient`.
    pub fn received(&self, recipient: &Identity) -> u64 {
        self.state
            .lock()
            .unwrap()
            .received
            .get(recipient)
            .copied()
            .unwrap_or(0)
    }

    /// Number of transfer calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }
}

#[async_trait]
impl FundsTransfer for MockTransfer {
    async fn transfer(&self, recipient: &Identity, amount: u64) -> Result<(), TransferError> {
        let mut state = self.state.lock().unwrap();
        state.attempts += 1;

        if state.offline {
            return Err(TransferError::Unavailable("mock channel offline".to_string()));
        }
        if state.rejecting.contains(recipient) {
            return Err(TransferError::Rejected(*recipient));
        }

        *state.received.entry(*recipient).or_insert(0) += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_payouts() {
        let channel = MockTransfer::new();
        let bob = Identity::from_label("bob");

        channel.transfer(&bob, 3).await.unwrap();
        channel.transfer(&bob, 4).await.unwrap();

        assert_eq!(channel.received(&bob), 7);
        assert_eq!(channel.attempts(), 2);
    }

    #[tokio::test]
    async fn test_mock_rejects_recipient() {
        let channel = MockTransfer::new();
        let bob = Identity::from_label("bob");
        channel.reject_recipient(bob);

        let result = channel.transfer(&bob, 3).await;
        assert_eq!(result, Err(TransferError::Rejected(bob)));
        assert_eq!(channel.received(&bob), 0);

        channel.accept_recipient(&bob);
        channel.transfer(&bob, 3).await.unwrap();
        assert_eq!(channel.received(&bob), 3);
    }

    #[tokio::test]
    async fn test_mock_offline() {
        let channel = MockTransfer::new();
        let bob = Identity::from_label("bob");
        channel.set_offline(true);

        assert!(matches!(
            channel.transfer(&bob, 1).await,
            Err(TransferError::Unavailable(_))
        ));
        assert_eq!(channel.attempts(), 1);
    }
}
