//! Property-based tests for the proposal lifecycle
//!
//! - Quorum: execution is eligible only with `required_quorum` distinct approvals
//! - Approvals: repeated approvals never change the count
//! - Timelock: eligibility starts exactly at `created_at + timelock`
//! - Ids: strictly increasing, never reused

use super::params::GovernanceParams;
use super::proposal::{ProposalId, ProposalKind};
use super::store::ProposalStore;
use crate::error::{ErrorKind, VaultError};
use crate::identity::Identity;
use proptest::prelude::*;
use std::time::Duration;

fn member(i: usize) -> Identity {
    Identity::from_label(&format!("member-{}", i))
}

fn params(quorum: usize, timelock: u64, expiry: u64) -> GovernanceParams {
    GovernanceParams {
        required_quorum: quorum,
        timelock: Duration::from_secs(timelock),
        expiry_window: Duration::from_secs(expiry),
    }
}

proptest! {
    /// Property: one approval short of quorum never executes, one more does
    #[test]
    fn quorum_gates_execution(
        quorum in 1usize..8,
        created_at in 0u64..1_000_000,
        timelock in 0u64..100_000,
    ) {
        let params = params(quorum, timelock, timelock + 100_000);
        let mut store = ProposalStore::new();
        let id = store
            .create(member(0), ProposalKind::Withdraw { amount: 1 }, created_at)
            .unwrap();
        let ready_at = created_at + timelock;

        for i in 0..quorum - 1 {
            store.approve(id, member(i), created_at, &params).unwrap();
        }
        let err = store.check_executable(id, ready_at, &params).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::QuorumNotMet);

        store.approve(id, member(quorum - 1), created_at, &params).unwrap();
        prop_assert!(store.check_executable(id, ready_at, &params).is_ok());
    }

    /// Property: repeating an approval fails and leaves the count unchanged
    #[test]
    fn duplicate_approvals_rejected(
        approvers in prop::collection::vec(0usize..6, 1..30),
    ) {
        let params = GovernanceParams::default();
        let mut store = ProposalStore::new();
        let id = store
            .create(member(0), ProposalKind::Pause, 0)
            .unwrap();

        let mut seen = std::collections::BTreeSet::new();
        for i in approvers {
            let result = store.approve(id, member(i), 0, &params);
            if seen.insert(i) {
                prop_assert!(result.is_ok());
            } else {
                let is_duplicate = matches!(result, Err(VaultError::DuplicateApproval { .. }));
                prop_assert!(is_duplicate);
            }
            prop_assert_eq!(store.get(id).unwrap().approval_count(), seen.len());
        }
    }

    /// Property: the timelock boundary is inclusive
    #[test]
    fn timelock_boundary_inclusive(
        created_at in 0u64..1_000_000,
        timelock in 1u64..100_000,
    ) {
        let params = params(1, timelock, timelock * 2);
        let mut store = ProposalStore::new();
        let id = store.create(member(0), ProposalKind::Unpause, created_at).unwrap();
        store.approve(id, member(0), created_at, &params).unwrap();

        let early = store.check_executable(id, created_at + timelock - 1, &params);
        prop_assert_eq!(early.unwrap_err().kind(), ErrorKind::TimelockNotElapsed);
        prop_assert!(store.check_executable(id, created_at + timelock, &params).is_ok());
    }

    /// Property: ids strictly increase regardless of cancellations
    #[test]
    fn ids_strictly_increase(
        cancels in prop::collection::vec(any::<bool>(), 1..40),
    ) {
        let mut store = ProposalStore::new();
        let mut previous = ProposalId(0);

        for cancel in cancels {
            let id = store.create(member(0), ProposalKind::Pause, 0).unwrap();
            prop_assert!(id > previous);
            prop_assert_eq!(id.0, previous.0 + 1);
            if cancel {
                store.cancel(id, &member(0)).unwrap();
            }
            previous = id;
        }
    }
}
