//! Flat account ledger with overdraft limits.
//!
//! This is the simple collaborator next to the UTXO core: accounts are
//! admitted only when their account number passes the format and checksum
//! rules, and transfers apply in submit-time order against per-account
//! overdraft limits.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Required prefix of every account number.
pub const ACCOUNT_PREFIX: &str = "CAT";
/// Length of the alphabetic identifier after prefix and checksum.
const ACCOUNT_ID_LEN: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub number: String,
    pub balance: i64,
    pub overdraft_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: i64,
    pub submitted_at: u64,
}

/// Checks an account number: `CAT` prefix, a two-digit checksum, then a
/// ten-letter identifier whose upper- and lowercase counts match for every
/// letter, verified against a mod-97 checksum over the identifier plus
/// `CAT00`.
pub fn validate_account_number(number: &str) -> bool {
    let Some(rest) = number.strip_prefix(ACCOUNT_PREFIX) else {
        warn!("invalid account number, does not start with {}: {}", ACCOUNT_PREFIX, number);
        return false;
    };

    if rest.len() != 2 + ACCOUNT_ID_LEN || !rest.is_ascii() {
        warn!("invalid account number, identifier is not {} characters: {}", ACCOUNT_ID_LEN, number);
        return false;
    }

    let Ok(checksum) = rest[..2].parse::<u32>() else {
        warn!("invalid account number, checksum is not numeric: {}", number);
        return false;
    };

    let id = &rest[2..];
    if !id.bytes().all(|b| b.is_ascii_alphabetic()) {
        warn!("invalid account number, identifier is not {} letters: {}", ACCOUNT_ID_LEN, number);
        return false;
    }

    for upper in b'A'..=b'Z' {
        let lower = upper + 32;
        let upper_count = id.bytes().filter(|&b| b == upper).count();
        let lower_count = id.bytes().filter(|&b| b == lower).count();
        if upper_count != lower_count {
            warn!("invalid account number, unmatched letter case counts: {}", number);
            return false;
        }
    }

    let sum: u32 = id
        .bytes()
        .chain(ACCOUNT_PREFIX.bytes())
        .chain("00".bytes())
        .map(u32::from)
        .sum();
    let calculated = 98 - sum % 97;
    if calculated != checksum {
        warn!(
            "invalid account number, calculated checksum {} does not match {}: {}",
            calculated, checksum, number
        );
        return false;
    }

    true
}

/// The account pool for one document. Accounts with invalid numbers are
/// dropped on construction and take no further part in processing.
#[derive(Debug, Clone, Default)]
pub struct AccountLedger {
    accounts: Vec<Account>,
}

impl AccountLedger {
    pub fn new(accounts: Vec<Account>) -> Self {
        let accounts = accounts
            .into_iter()
            .filter(|account| validate_account_number(&account.number))
            .collect();
        AccountLedger { accounts }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// The unique account holding `number`, if exactly one exists.
    fn position(&self, number: &str) -> Option<usize> {
        let mut matches = self
            .accounts
            .iter()
            .enumerate()
            .filter(|(_, account)| account.number == number);
        match (matches.next(), matches.next()) {
            (Some((position, _)), None) => Some(position),
            _ => None,
        }
    }

    /// Applies one transfer. Unknown or ambiguous account numbers skip the
    /// transfer silently; an overdraft-exceeding transfer is skipped with a
    /// warning and leaves both balances untouched.
    pub fn apply_transfer(&mut self, transfer: &Transfer) {
        let (Some(from), Some(to)) = (self.position(&transfer.from), self.position(&transfer.to))
        else {
            return;
        };

        let target = self.accounts[from].balance - transfer.amount;
        if target <= -self.accounts[from].overdraft_limit {
            warn!(
                "target balance {} exceeds overdraft limit {} for {}",
                target, self.accounts[from].overdraft_limit, transfer.from
            );
            return;
        }

        self.accounts[from].balance -= transfer.amount;
        self.accounts[to].balance += transfer.amount;
    }

    /// Applies transfers in ascending submit-time order.
    pub fn apply_transfers(&mut self, transfers: &[Transfer]) {
        let mut ordered: Vec<&Transfer> = transfers.iter().collect();
        ordered.sort_by_key(|transfer| transfer.submitted_at);
        for transfer in ordered {
            self.apply_transfer(transfer);
        }
    }
}
