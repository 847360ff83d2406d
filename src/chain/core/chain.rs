use crate::chain::core::state::LedgerState;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Text-format label of the sentinel parent id carried by root blocks.
pub const GENESIS_LABEL: &str = "GENESIS";

/// Parent reference of a raw block. Roots carry a distinct variant rather
/// than a magic string so the sentinel can never collide with a block id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentId {
    Genesis,
    Block(String),
}

impl ParentId {
    pub fn parse(label: &str) -> Self {
        if label == GENESIS_LABEL {
            ParentId::Genesis
        } else {
            ParentId::Block(label.to_string())
        }
    }
}

impl fmt::Display for ParentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParentId::Genesis => write!(f, "{}", GENESIS_LABEL),
            ParentId::Block(id) => write!(f, "{}", id),
        }
    }
}

/// A raw, unvalidated block as parsed from a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub parent: ParentId,
    /// Ids of the transactions this block commits, in order.
    pub transactions: Vec<String>,
    pub created_at: u64,
}

impl Block {
    pub fn new(id: String, parent: ParentId, transactions: Vec<String>, created_at: u64) -> Self {
        Block {
            id,
            parent,
            transactions,
            created_at,
        }
    }
}

/// A block accepted into the forest. Parent links and transaction references
/// are arena/pool indices, never owned references, so a common ancestor path
/// is shared safely across competing tips.
#[derive(Debug, Clone)]
pub struct ValidatedBlock {
    pub id: String,
    /// Arena index of the validated parent; `None` only for roots.
    pub parent: Option<usize>,
    /// Indices into the ledger pool, in block order.
    pub transactions: Vec<usize>,
    pub created_at: u64,
    /// 1 for roots, parent depth + 1 otherwise.
    pub depth: u32,
}

/// Arena of validated blocks indexed by id. Multiple blocks may claim the
/// same parent, so the structure is a parent-linked forest, not a list.
#[derive(Debug, Clone, Default)]
pub struct BlockForest {
    pub blocks: Vec<ValidatedBlock>,
    index: HashMap<String, usize>,
}

impl BlockForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn insert(&mut self, block: ValidatedBlock) -> usize {
        let position = self.blocks.len();
        self.index.insert(block.id.clone(), position);
        self.blocks.push(block);
        position
    }

    /// Ids of every transaction committed from genesis through `tip`,
    /// inclusive, gathered by walking parent indices.
    pub fn committed_transactions<'a>(
        &self,
        tip: usize,
        pool: &'a LedgerState,
    ) -> HashSet<&'a str> {
        let mut committed = HashSet::new();
        let mut cursor = Some(tip);
        while let Some(position) = cursor {
            let block = &self.blocks[position];
            for &tx_index in &block.transactions {
                committed.insert(pool.transactions[tx_index].id.as_str());
            }
            cursor = block.parent;
        }
        committed
    }

    /// The canonical tip: maximum depth, ties broken by latest creation time.
    pub fn canonical_tip(&self) -> Option<usize> {
        self.blocks
            .iter()
            .enumerate()
            .max_by_key(|(_, block)| (block.depth, block.created_at))
            .map(|(position, _)| position)
    }

    /// The canonical chain as arena indices, genesis first. Empty when no
    /// block validated.
    pub fn canonical_chain(&self) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut cursor = self.canonical_tip();
        while let Some(position) = cursor {
            chain.push(position);
            cursor = self.blocks[position].parent;
        }
        chain.reverse();
        chain
    }

    /// Flattens the canonical chain to its transactions, sorted by timestamp
    /// for output.
    pub fn canonical_transactions(&self, pool: &LedgerState) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = self
            .canonical_chain()
            .into_iter()
            .flat_map(|position| {
                self.blocks[position]
                    .transactions
                    .iter()
                    .map(|&tx_index| pool.transactions[tx_index].clone())
            })
            .collect();
        transactions.sort_by_key(|tx| tx.timestamp);
        transactions
    }

    /// Rebuilds the raw record of a validated block for output, with the
    /// parent rendered as the genesis sentinel when absent.
    pub fn to_record(&self, position: usize, pool: &LedgerState) -> Block {
        let block = &self.blocks[position];
        let parent = match block.parent {
            Some(parent_position) => ParentId::Block(self.blocks[parent_position].id.clone()),
            None => ParentId::Genesis,
        };
        let transactions = block
            .transactions
            .iter()
            .map(|&tx_index| pool.transactions[tx_index].id.clone())
            .collect();
        Block::new(block.id.clone(), parent, transactions, block.created_at)
    }
}
