//! Balance ledger with rejecting debits.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Cents;

/// Errors raised by ledger mutations.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Cents, requested: Cents },
    #[error("amount must not be negative (got {0})")]
    InvalidAmount(Cents),
}

/// Non-negative balance mutated only through [`Ledger::debit`] and [`Ledger::credit`].
///
/// Serialized as the bare balance; a stored negative balance fails to deserialize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Cents", into = "Cents")]
pub struct Ledger {
    balance: Cents,
}

impl Ledger {
    /// Open a ledger. Negative opening balances are clamped to zero.
    #[must_use]
    pub fn with_balance(balance: Cents) -> Self {
        Self {
            balance: balance.max(Cents::ZERO),
        }
    }

    #[must_use]
    pub const fn balance(&self) -> Cents {
        self.balance
    }

    #[must_use]
    pub fn can_afford(&self, amount: Cents) -> bool {
        !amount.is_negative() && self.balance >= amount
    }

    /// Remove `amount`. Fails, leaving the balance unchanged, when it exceeds the balance.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InsufficientFunds` when `amount > balance` and
    /// `LedgerError::InvalidAmount` for negative amounts.
    pub fn debit(&mut self, amount: Cents) -> Result<Cents, LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        match self.balance.checked_sub(amount) {
            Some(remaining) if !remaining.is_negative() => {
                self.balance = remaining;
                Ok(remaining)
            }
            _ => Err(LedgerError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            }),
        }
    }

    /// Add `amount` and return the new balance.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAmount` for negative amounts; any
    /// non-negative credit succeeds.
    pub fn credit(&mut self, amount: Cents) -> Result<Cents, LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.balance += amount;
        Ok(self.balance)
    }

    /// Credit `amount × multiplier` floored to whole units and return the amount credited.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAmount` when the scaled amount is negative.
    pub fn credit_scaled(&mut self, amount: Cents, multiplier: f64) -> Result<Cents, LedgerError> {
        let credited = amount.scale_floor_whole(multiplier);
        self.credit(credited)?;
        Ok(credited)
    }

    /// Reset to a fixed balance.
    pub fn reset(&mut self, balance: Cents) {
        *self = Self::with_balance(balance);
    }
}

impl TryFrom<Cents> for Ledger {
    type Error = LedgerError;

    fn try_from(balance: Cents) -> Result<Self, Self::Error> {
        if balance.is_negative() {
            return Err(LedgerError::InvalidAmount(balance));
        }
        Ok(Self { balance })
    }
}

impl From<Ledger> for Cents {
    fn from(ledger: Ledger) -> Self {
        ledger.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_beyond_balance_is_rejected() {
        let mut ledger = Ledger::with_balance(Cents::from_whole(100));
        let err = ledger.debit(Cents::from_whole(150)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                balance: Cents::from_whole(100),
                requested: Cents::from_whole(150),
            }
        );
        assert_eq!(ledger.balance(), Cents::from_whole(100));

        assert_eq!(ledger.debit(Cents::from_whole(40)), Ok(Cents::from_whole(60)));
        assert_eq!(ledger.balance(), Cents::from_whole(60));
    }

    #[test]
    fn debit_of_exact_balance_empties_ledger() {
        let mut ledger = Ledger::with_balance(Cents(1_234));
        assert!(ledger.can_afford(Cents(1_234)));
        assert_eq!(ledger.debit(Cents(1_234)), Ok(Cents::ZERO));
        assert!(!ledger.can_afford(Cents(1)));
        assert!(ledger.debit(Cents(1)).is_err());
    }

    #[test]
    fn credit_always_succeeds_for_non_negative_amounts() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.credit(Cents(250)), Ok(Cents(250)));
        assert_eq!(ledger.credit(Cents::ZERO), Ok(Cents(250)));
        assert_eq!(ledger.credit_scaled(Cents(250), 2.0), Ok(Cents(500)));
        assert_eq!(ledger.balance(), Cents(750));
    }

    #[test]
    fn scaled_credit_keeps_whole_units_only() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.credit_scaled(Cents(1_999), 1.5), Ok(Cents(2_900)));
        assert_eq!(ledger.credit_scaled(Cents(99), 1.0), Ok(Cents::ZERO));
        assert_eq!(ledger.balance(), Cents(2_900));
        assert_eq!(
            ledger.credit_scaled(Cents(-500), 1.0),
            Err(LedgerError::InvalidAmount(Cents(-500)))
        );
        assert_eq!(ledger.balance(), Cents(2_900));
    }

    #[test]
    fn negative_amounts_are_invalid() {
        let mut ledger = Ledger::with_balance(Cents(500));
        assert_eq!(
            ledger.debit(Cents(-1)),
            Err(LedgerError::InvalidAmount(Cents(-1)))
        );
        assert_eq!(
            ledger.credit(Cents(-1)),
            Err(LedgerError::InvalidAmount(Cents(-1)))
        );
        assert_eq!(ledger.balance(), Cents(500));
        assert_eq!(Ledger::with_balance(Cents(-20)).balance(), Cents::ZERO);
    }

    #[test]
    fn serializes_as_bare_balance() {
        let ledger = Ledger::with_balance(Cents(4_200));
        assert_eq!(serde_json::to_string(&ledger).unwrap(), "4200");
        let back: Ledger = serde_json::from_str("4200").unwrap();
        assert_eq!(back, ledger);
    }

    #[test]
    fn negative_stored_balance_is_rejected() {
        let err = serde_json::from_str::<Ledger>("-100").unwrap_err();
        assert!(err.to_string().contains("must not be negative"));
    }
}
