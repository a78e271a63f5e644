//! Custodial ledger.
//!
//! Holds the pooled balance plus a per-depositor credit record. Withdrawals
//! draw from the pool, not from any depositor's credit, so the credits are
//! informational and their sum is allowed to drift from the pool.

pub mod mock;
pub mod traits;

pub use mock::MockTransfer;
pub use traits::{FundsTransfer, TransferError};

use crate::error::{VaultError, VaultResult};
use crate::identity::Identity;
use std::collections::HashMap;

/// Pooled funds and deposit credits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    pooled: u64,
    credits: HashMap<Identity, u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to the pool and to `depositor`'s record.
    pub fn deposit(&mut self, depositor: Identity, amount: u64) -> VaultResult<()> {
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }

        let pooled = self
            .pooled
            .checked_add(amount)
            .ok_or(VaultError::ArithmeticOverflow)?;
        let credit = self.credit_of(&depositor);
        let credit = credit
            .checked_add(amount)
            .ok_or(VaultError::ArithmeticOverflow)?;

        self.pooled = pooled;
        self.credits.insert(depositor, credit);
        Ok(())
    }

    /// Fail with `InsufficientFunds` unless the pool covers `amount`.
    pub fn ensure_covers(&self, amount: u64) -> VaultResult<()> {
        if amount > self.pooled {
            return Err(VaultError::InsufficientFunds {
                requested: amount,
                available: self.pooled,
            });
        }
        Ok(())
    }

    /// Remove `amount` from the pool. Credits are left untouched.
    pub(crate) fn debit(&mut self, amount: u64) -> VaultResult<()> {
        self.ensure_covers(amount)?;
        self.pooled -= amount;
        Ok(())
    }

    /// Undo a debit whose transfer failed.
    pub(crate) fn restore(&mut self, amount: u64) {
        self.pooled = self.pooled.saturating_add(amount);
    }

    pub fn pooled_balance(&self) -> u64 {
        self.pooled
    }

    pub fn credit_of(&self, depositor: &Identity) -> u64 {
        self.credits.get(depositor).copied().unwrap_or(0)
    }

    /// Sum of all deposit credits (not necessarily equal to the pool).
    pub fn total_credits(&self) -> u128 {
        self.credits.values().map(|c| *c as u128).sum()
    }
}
