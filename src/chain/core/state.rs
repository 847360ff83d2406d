use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;
use tracing::debug;

/// Pool of validated transactions for one document pass.
///
/// Admission order is preserved: parsed transactions are fed in ascending
/// timestamp order, and synthesized payments are appended as their requests
/// are applied. Only [`LedgerState::admit`] and the payment engine mutate
/// `consumed` and `valid` flags, always as an all-or-nothing commit.
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    pub transactions: Vec<Transaction>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates one transaction against the pool and commits it on success.
    ///
    /// Rejections leave the pool untouched: output claims gathered while
    /// matching are provisional and only applied once every input has
    /// resolved. Returns whether the transaction was accepted.
    pub fn admit(&mut self, mut tx: Transaction) -> bool {
        if let Err(err) = tx.validate_structure() {
            debug!(tx = %tx.id, "rejected: {}", err);
            return false;
        }

        let claims = match tx.resolve_inputs(&self.transactions) {
            Ok(claims) => claims,
            Err(err) => {
                debug!(tx = %tx.id, "rejected: {}", err);
                return false;
            }
        };

        for (pool_index, output_index) in claims {
            self.transactions[pool_index].outputs[output_index].consumed = true;
        }
        tx.valid = true;
        self.transactions.push(tx);
        true
    }

    /// Appends a transaction the payment engine synthesized already
    /// consistent; it is not re-run through input matching.
    pub fn append_valid(&mut self, mut tx: Transaction) {
        tx.valid = true;
        self.transactions.push(tx);
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.transactions.iter().position(|tx| tx.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    /// Conservation law: total currency in circulation equals total issued.
    ///
    /// A violation signals a logic or input-data defect and aborts the
    /// current document; it is not a rejection.
    pub fn check_conservation(&self) -> Result<()> {
        let issued: u64 = self.transactions.iter().map(|tx| tx.issued_total()).sum();
        let unspent: u64 = self.transactions.iter().map(|tx| tx.unspent_total()).sum();

        if issued != unspent {
            return Err(LedgerError::ConservationViolation(format!(
                "unspent outputs total {} but ORIGIN issued {}",
                unspent, issued
            )));
        }
        Ok(())
    }
}
