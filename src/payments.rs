//! Payment synthesis: turns payment requests into new transactions via
//! greedy coin selection over the payer's unspent outputs.

use crate::chain::LedgerState;
use crate::transaction::{
    Owner, Transaction, TransactionInput, TransactionOutput, TransactionRequest,
};
use tracing::debug;

/// Applies one request against the live pool. Returns whether a transaction
/// was synthesized.
///
/// A request of amount 0 is a no-op, and insufficient funds is not an error:
/// the request is skipped with no partial spend. On success the selected
/// outputs are consumed immediately and the synthesized transaction (already
/// consistent, so not re-run through the ledger validator) is appended to
/// the pool with the request's id and timestamp.
pub fn apply_request(request: &TransactionRequest, state: &mut LedgerState) -> bool {
    if request.amount == 0 {
        return false;
    }

    let payer = Owner::named(&request.from);

    // Candidate outputs: unconsumed, owned by the payer, from transactions
    // strictly older than the request. Ordered by ascending transaction
    // timestamp, ties broken by pool order.
    let mut candidates: Vec<(usize, usize)> = Vec::new();
    for (pool_index, tx) in state.transactions.iter().enumerate() {
        if tx.timestamp >= request.timestamp {
            continue;
        }
        for (output_index, output) in tx.outputs.iter().enumerate() {
            if !output.consumed && output.owner == payer {
                candidates.push((pool_index, output_index));
            }
        }
    }
    candidates.sort_by_key(|&(pool_index, _)| (state.transactions[pool_index].timestamp, pool_index));

    // Greedy accumulation: stop as soon as the target is reached.
    let mut selected: Vec<(usize, usize)> = Vec::new();
    let mut gathered: u64 = 0;
    for claim in candidates {
        if gathered >= request.amount {
            break;
        }
        let (pool_index, output_index) = claim;
        gathered += state.transactions[pool_index].outputs[output_index].amount;
        selected.push(claim);
    }

    if gathered < request.amount {
        debug!(
            request = %request.id,
            from = %request.from,
            amount = request.amount,
            available = gathered,
            "skipped: insufficient funds"
        );
        return false;
    }

    let inputs: Vec<TransactionInput> = selected
        .iter()
        .map(|&(pool_index, output_index)| {
            let tx = &state.transactions[pool_index];
            TransactionInput::new(&tx.id, payer.clone(), tx.outputs[output_index].amount)
        })
        .collect();

    for &(pool_index, output_index) in &selected {
        state.transactions[pool_index].outputs[output_index].consumed = true;
    }

    let mut outputs = vec![TransactionOutput::new(
        Owner::named(&request.to),
        request.amount,
    )];
    if gathered > request.amount {
        outputs.push(TransactionOutput::new(
            payer.clone(),
            gathered - request.amount,
        ));
    }

    state.append_valid(Transaction::new(
        request.id.clone(),
        inputs,
        outputs,
        request.timestamp,
    ));
    true
}

/// Applies requests in ascending timestamp order against the growing pool,
/// so a later request may spend change produced by an earlier one.
pub fn apply_requests(requests: &[TransactionRequest], state: &mut LedgerState) {
    let mut ordered: Vec<&TransactionRequest> = requests.iter().collect();
    ordered.sort_by_key(|request| request.timestamp);
    for request in ordered {
        apply_request(request, state);
    }
}
