//! Per-document orchestration of the ledger pipeline.
//!
//! One document is an atomic, bounded batch: transactions validate in
//! ascending timestamp order, the conservation check runs once (fatal on
//! violation), payment requests synthesize against the live pool, blocks
//! validate in ascending creation-time order, and the canonical chain is
//! selected last. Every validation decision is made exactly once; nothing
//! is retried.

use crate::accounts::AccountLedger;
use crate::chain::{validate_block, Block, BlockForest, LedgerState};
use crate::config::EngineConfig;
use crate::document::{
    format_accounts, format_blocks, format_transactions, parse_account_document,
    parse_ledger_document, Level, LedgerDocument,
};
use crate::error::Result;
use crate::payments::apply_requests;
use crate::transaction::Transaction;
use tracing::{debug, info};

/// Result of one ledger document pass, ready for formatting.
#[derive(Debug, Clone)]
pub struct LedgerOutcome {
    /// Surviving transactions in ascending timestamp order. When blocks are
    /// present these are the canonical chain's transactions only.
    pub transactions: Vec<Transaction>,
    /// Canonical chain, genesis first; `None` when the document carried no
    /// block section.
    pub blocks: Option<Vec<Block>>,
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine { config }
    }

    pub fn run(&self, document: LedgerDocument) -> Result<LedgerOutcome> {
        let mut state = LedgerState::new();

        let mut transactions = document.transactions;
        let submitted = transactions.len();
        transactions.sort_by_key(|tx| tx.timestamp);
        for tx in transactions {
            state.admit(tx);
        }
        info!(
            accepted = state.transactions.len(),
            submitted, "transaction validation complete"
        );

        state.check_conservation()?;

        apply_requests(&document.requests, &mut state);

        let blocks = match document.blocks {
            Some(blocks) => blocks,
            None => {
                let mut transactions = state.transactions;
                transactions.sort_by_key(|tx| tx.timestamp);
                return Ok(LedgerOutcome {
                    transactions,
                    blocks: None,
                });
            }
        };

        let mut forest = BlockForest::new();
        let mut ordered = blocks;
        ordered.sort_by_key(|block| block.created_at);
        for block in &ordered {
            match validate_block(block, &forest, &state, &self.config) {
                Ok(validated) => {
                    forest.insert(validated);
                }
                Err(err) => debug!(block = %block.id, "rejected: {}", err),
            }
        }

        let canonical = forest.canonical_chain();
        info!(
            validated = forest.blocks.len(),
            submitted = ordered.len(),
            chain_length = canonical.len(),
            "block validation complete"
        );

        let transactions = forest.canonical_transactions(&state);
        let blocks = canonical
            .into_iter()
            .map(|position| forest.to_record(position, &state))
            .collect();

        Ok(LedgerOutcome {
            transactions,
            blocks: Some(blocks),
        })
    }
}

/// Parses and processes one document of the given level, returning the
/// formatted result text.
pub fn process_document(level: Level, text: &str, config: &EngineConfig) -> Result<String> {
    let lines = match level {
        Level::Accounts => {
            let document = parse_account_document(text)?;
            let mut ledger = AccountLedger::new(document.accounts);
            ledger.apply_transfers(&document.transfers);
            format_accounts(ledger.accounts())
        }
        _ => {
            let document = parse_ledger_document(text, level)?;
            let outcome = Engine::new(config.clone()).run(document)?;
            let mut lines = format_transactions(&outcome.transactions);
            if let Some(blocks) = &outcome.blocks {
                lines.extend(format_blocks(blocks));
            }
            lines
        }
    };
    Ok(lines.join("\n"))
}
