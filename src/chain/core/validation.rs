use crate::chain::core::chain::{Block, BlockForest, ParentId, ValidatedBlock};
use crate::chain::core::state::LedgerState;
use crate::config::EngineConfig;
use crate::error::{LedgerError, Result};
use std::collections::HashSet;

/// Validates a block against the blocks accepted so far and the valid pool.
///
/// Blocks are handed in strictly ascending creation-time order; a block whose
/// parent has not validated by the time it is seen is rejected permanently
/// (single pass, no deferred retry).
pub fn validate_block(
    block: &Block,
    forest: &BlockForest,
    pool: &LedgerState,
    config: &EngineConfig,
) -> Result<ValidatedBlock> {
    let parent = match &block.parent {
        ParentId::Genesis => None,
        ParentId::Block(id) => Some(forest.position(id).ok_or_else(|| {
            LedgerError::InvalidBlock(format!("parent {} is not a validated block", id))
        })?),
    };

    if block.transactions.len() > config.max_block_transactions {
        return Err(LedgerError::InvalidBlock(format!(
            "references {} transactions (maximum {})",
            block.transactions.len(),
            config.max_block_transactions
        )));
    }

    let mut resolved = Vec::with_capacity(block.transactions.len());
    for tx_id in &block.transactions {
        let position = pool.position(tx_id).ok_or_else(|| {
            LedgerError::InvalidBlock(format!("transaction {} is not in the valid pool", tx_id))
        })?;

        if config.require_transactions_before_block
            && pool.transactions[position].timestamp > block.created_at
        {
            return Err(LedgerError::InvalidBlock(format!(
                "transaction {} postdates block creation time {}",
                tx_id, block.created_at
            )));
        }
        resolved.push(position);
    }

    // A transaction's spendable history must already be committed to the
    // chain before a descendant block may reference it, independent of the
    // earlier in-memory pool validation.
    let committed: HashSet<&str> = match parent {
        Some(parent_position) => forest.committed_transactions(parent_position, pool),
        None => HashSet::new(),
    };
    for &position in &resolved {
        for input in &pool.transactions[position].inputs {
            if input.owner.is_origin() {
                continue;
            }
            if !committed.contains(input.source.as_str()) {
                return Err(LedgerError::InvalidBlock(format!(
                    "transaction {} spends {} which is not committed in the ancestor chain",
                    pool.transactions[position].id, input.source
                )));
            }
        }
    }

    let depth = match parent {
        Some(parent_position) => forest.blocks[parent_position].depth + 1,
        None => 1,
    };

    Ok(ValidatedBlock {
        id: block.id.clone(),
        parent,
        transactions: resolved,
        created_at: block.created_at,
        depth,
    })
}
