//! Mock token wallet wrapping the `GIFT` ledger.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::TOKEN_SYMBOL;
use crate::ledger::Ledger;
use crate::money::Cents;

const HEX_CHARS: &[u8] = b"abcdef0123456789";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub balance: Ledger,
}

impl WalletState {
    /// Connect with a fresh mock address and reset the balance to `grant`.
    pub fn connect<R: Rng + ?Sized>(&mut self, rng: &mut R, grant: Cents) -> &str {
        let address = mock_address(rng);
        log::debug!("wallet connected as {address}");
        self.connected = true;
        self.balance = Ledger::with_balance(grant);
        self.address.insert(address).as_str()
    }

    pub fn disconnect(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub const fn balance(&self) -> Cents {
        self.balance.balance()
    }

    #[must_use]
    pub fn format_balance(&self) -> String {
        format_tokens(self.balance())
    }
}

/// Render an amount as `"12.34 GIFT"`.
#[must_use]
pub fn format_tokens(amount: Cents) -> String {
    format!("{amount} {TOKEN_SYMBOL}")
}

fn mock_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut hex = |count: usize| -> String {
        (0..count)
            .map(|_| char::from(HEX_CHARS[rng.gen_range(0..HEX_CHARS.len())]))
            .collect()
    };
    let head = hex(8);
    let tail = hex(4);
    format!("0x{head}...{tail}")
}
