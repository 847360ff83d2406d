/// Validation logic for transactions separated from type definitions
use crate::error::LedgerError;
use crate::transaction::types::Transaction;
use std::collections::HashSet;

/// A provisional claim on an output of an already-valid transaction,
/// addressed as (pool index, output index).
pub type OutputClaim = (usize, usize);

impl Transaction {
    /// Stateless structural checks: exact value balance, unique output
    /// owners, strictly positive amounts.
    pub fn validate_structure(&self) -> Result<(), LedgerError> {
        if self.input_total() != self.output_total() {
            return Err(LedgerError::InvalidTransaction(format!(
                "input total {} does not equal output total {}",
                self.input_total(),
                self.output_total()
            )));
        }

        let mut owners = HashSet::new();
        for output in &self.outputs {
            if !owners.insert(&output.owner) {
                return Err(LedgerError::InvalidTransaction(format!(
                    "owner {} appears more than once among outputs",
                    output.owner
                )));
            }
        }

        if self.inputs.iter().any(|input| input.amount == 0) {
            return Err(LedgerError::InvalidTransaction(
                "input amounts must be strictly positive".to_string(),
            ));
        }
        if self.outputs.iter().any(|output| output.amount == 0) {
            return Err(LedgerError::InvalidTransaction(
                "output amounts must be strictly positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolves every non-ORIGIN input to a distinct unconsumed output of the
    /// already-valid pool. Matching is greedy and order-sensitive: the pool is
    /// scanned in the order supplied (ascending timestamp) and outputs in
    /// their original order; the first unconsumed, unclaimed match wins.
    ///
    /// Claims are provisional. Nothing is mutated here; if any input fails to
    /// match, the whole claim list is discarded by the caller.
    pub fn resolve_inputs(&self, pool: &[Transaction]) -> Result<Vec<OutputClaim>, LedgerError> {
        let mut claims: Vec<OutputClaim> = Vec::with_capacity(self.inputs.len());

        'inputs: for input in &self.inputs {
            if input.owner.is_origin() {
                continue;
            }

            for (pool_index, prior) in pool.iter().enumerate() {
                if prior.id != input.source {
                    continue;
                }
                for (output_index, output) in prior.outputs.iter().enumerate() {
                    if output.consumed
                        || claims.contains(&(pool_index, output_index))
                        || output.owner != input.owner
                        || output.amount != input.amount
                    {
                        continue;
                    }
                    claims.push((pool_index, output_index));
                    continue 'inputs;
                }
            }

            return Err(LedgerError::InvalidTransaction(format!(
                "input claiming {} of {} from {} has no matching unspent output",
                input.amount, input.owner, input.source
            )));
        }

        Ok(claims)
    }
}
