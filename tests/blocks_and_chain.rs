//! Integration tests for block validation and canonical chain selection

use tallychain::chain::{validate_block, Block, BlockForest, LedgerState, ParentId};
use tallychain::config::EngineConfig;
use tallychain::document::LedgerDocument;
use tallychain::engine::Engine;
use tallychain::transaction::{Owner, Transaction, TransactionInput, TransactionOutput};

fn issuance(id: &str, owner: &str, amount: u64, timestamp: u64) -> Transaction {
    Transaction::new(
        id.to_string(),
        vec![TransactionInput::new(id, Owner::Origin, amount)],
        vec![TransactionOutput::new(Owner::named(owner), amount)],
        timestamp,
    )
}

fn transfer(id: &str, source: &str, from: &str, to: &str, amount: u64, timestamp: u64) -> Transaction {
    Transaction::new(
        id.to_string(),
        vec![TransactionInput::new(source, Owner::named(from), amount)],
        vec![TransactionOutput::new(Owner::named(to), amount)],
        timestamp,
    )
}

fn block(id: &str, parent: ParentId, tx_ids: &[&str], created_at: u64) -> Block {
    Block::new(
        id.to_string(),
        parent,
        tx_ids.iter().map(|s| s.to_string()).collect(),
        created_at,
    )
}

/// Pool with one issuance and one spend, both valid.
fn spend_pool() -> LedgerState {
    let mut state = LedgerState::new();
    assert!(state.admit(issuance("tx1", "A", 100, 1)));
    assert!(state.admit(transfer("tx2", "tx1", "A", "B", 100, 2)));
    state
}

#[test]
fn test_root_block_with_issuance_validates() {
    let state = spend_pool();
    let forest = BlockForest::new();
    let config = EngineConfig::default();

    let validated = validate_block(
        &block("b1", ParentId::Genesis, &["tx1"], 10),
        &forest,
        &state,
        &config,
    )
    .unwrap();
    assert_eq!(validated.depth, 1);
    assert!(validated.parent.is_none());
}

#[test]
fn test_unknown_parent_rejected() {
    let state = spend_pool();
    let forest = BlockForest::new();
    let config = EngineConfig::default();

    let result = validate_block(
        &block("b1", ParentId::Block("nope".to_string()), &["tx1"], 10),
        &forest,
        &state,
        &config,
    );
    assert!(result.is_err());
}

#[test]
fn test_unresolved_transaction_rejects_block() {
    let state = spend_pool();
    let forest = BlockForest::new();
    let config = EngineConfig::default();

    let result = validate_block(
        &block("b1", ParentId::Genesis, &["ghost"], 10),
        &forest,
        &state,
        &config,
    );
    assert!(result.is_err());
}

#[test]
fn test_block_transaction_cap() {
    let mut state = LedgerState::new();
    let ids: Vec<String> = (0..21).map(|i| format!("tx{}", i)).collect();
    for (i, id) in ids.iter().enumerate() {
        assert!(state.admit(issuance(id, "A", 10, i as u64 + 1)));
    }
    let forest = BlockForest::new();
    let config = EngineConfig::default();

    // 21 references exceed the cap regardless of individual validity.
    let refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
    assert!(validate_block(
        &block("b1", ParentId::Genesis, &refs, 100),
        &forest,
        &state,
        &config
    )
    .is_err());

    assert!(validate_block(
        &block("b2", ParentId::Genesis, &refs[..20], 100),
        &forest,
        &state,
        &config
    )
    .is_ok());
}

#[test]
fn test_transaction_postdating_block_rejected() {
    let state = spend_pool();
    let forest = BlockForest::new();
    let config = EngineConfig::default();

    // tx1 has timestamp 1; a block created at 0 cannot contain it.
    assert!(validate_block(
        &block("b1", ParentId::Genesis, &["tx1"], 0),
        &forest,
        &state,
        &config
    )
    .is_err());

    let relaxed = EngineConfig {
        require_transactions_before_block: false,
        ..EngineConfig::default()
    };
    assert!(validate_block(
        &block("b1", ParentId::Genesis, &["tx1"], 0),
        &forest,
        &state,
        &relaxed
    )
    .is_ok());
}

#[test]
fn test_spend_requires_committed_ancestor() {
    let state = spend_pool();
    let mut forest = BlockForest::new();
    let config = EngineConfig::default();

    // tx2 spends tx1, which no ancestor of a root block can have committed.
    assert!(validate_block(
        &block("b1", ParentId::Genesis, &["tx2"], 10),
        &forest,
        &state,
        &config
    )
    .is_err());

    // Once a parent commits tx1, a child may carry tx2.
    let root = validate_block(
        &block("b1", ParentId::Genesis, &["tx1"], 10),
        &forest,
        &state,
        &config,
    )
    .unwrap();
    forest.insert(root);
    let child = validate_block(
        &block("b2", ParentId::Block("b1".to_string()), &["tx2"], 20),
        &forest,
        &state,
        &config,
    )
    .unwrap();
    assert_eq!(child.depth, 2);
}

#[test]
fn test_deeper_chain_wins_over_later_tip() {
    let state = spend_pool();
    let mut forest = BlockForest::new();
    let config = EngineConfig::default();

    // Fork at genesis: a depth-3 chain and a depth-1 tip with a later
    // creation time.
    for raw in [
        block("a1", ParentId::Genesis, &[], 10),
        block("a2", ParentId::Block("a1".to_string()), &[], 20),
        block("a3", ParentId::Block("a2".to_string()), &[], 30),
        block("late", ParentId::Genesis, &[], 99),
    ] {
        let validated = validate_block(&raw, &forest, &state, &config).unwrap();
        forest.insert(validated);
    }

    let chain = forest.canonical_chain();
    let ids: Vec<&str> = chain
        .iter()
        .map(|&position| forest.blocks[position].id.as_str())
        .collect();
    assert_eq!(ids, vec!["a1", "a2", "a3"]);
}

#[test]
fn test_equal_depth_tie_breaks_on_creation_time() {
    let state = spend_pool();
    let mut forest = BlockForest::new();
    let config = EngineConfig::default();

    for raw in [
        block("early", ParentId::Genesis, &[], 10),
        block("late", ParentId::Genesis, &[], 50),
    ] {
        let validated = validate_block(&raw, &forest, &state, &config).unwrap();
        forest.insert(validated);
    }

    let tip = forest.canonical_tip().unwrap();
    assert_eq!(forest.blocks[tip].id, "late");
}

#[test]
fn test_empty_forest_yields_empty_chain() {
    let forest = BlockForest::new();
    assert!(forest.canonical_tip().is_none());
    assert!(forest.canonical_chain().is_empty());
}

#[test]
fn test_engine_single_pass_rejects_child_created_before_parent() -> Result<(), Box<dyn std::error::Error>> {
    // The child claims a parent that only validates later in creation-time
    // order; the rejection is permanent.
    let document = LedgerDocument {
        transactions: vec![issuance("tx1", "A", 100, 1)],
        requests: vec![],
        blocks: Some(vec![
            block("parent", ParentId::Genesis, &["tx1"], 20),
            block("child", ParentId::Block("parent".to_string()), &[], 10),
        ]),
    };

    let outcome = Engine::new(EngineConfig::default()).run(document)?;
    let blocks = outcome.blocks.unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].id, "parent");
    Ok(())
}

#[test]
fn test_engine_flattens_canonical_transactions_by_timestamp() -> Result<(), Box<dyn std::error::Error>> {
    let document = LedgerDocument {
        transactions: vec![
            issuance("tx2", "B", 50, 2),
            issuance("tx1", "A", 100, 1),
        ],
        requests: vec![],
        blocks: Some(vec![
            block("b1", ParentId::Genesis, &["tx2"], 10),
            block("b2", ParentId::Block("b1".to_string()), &["tx1"], 20),
        ]),
    };

    let outcome = Engine::new(EngineConfig::default()).run(document)?;
    let ids: Vec<&str> = outcome.transactions.iter().map(|tx| tx.id.as_str()).collect();
    assert_eq!(ids, vec!["tx1", "tx2"]);

    let blocks = outcome.blocks.unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].id, "b1");
    assert_eq!(blocks[0].parent, ParentId::Genesis);
    assert_eq!(blocks[1].parent, ParentId::Block("b1".to_string()));
    Ok(())
}

#[test]
fn test_engine_without_blocks_reports_valid_pool() -> Result<(), Box<dyn std::error::Error>> {
    let document = LedgerDocument {
        transactions: vec![
            issuance("tx1", "A", 100, 1),
            transfer("tx2", "tx1", "A", "B", 100, 2),
            // Double spend, dropped silently.
            transfer("tx3", "tx1", "A", "C", 100, 3),
        ],
        requests: vec![],
        blocks: None,
    };

    let outcome = Engine::new(EngineConfig::default()).run(document)?;
    assert!(outcome.blocks.is_none());
    let ids: Vec<&str> = outcome.transactions.iter().map(|tx| tx.id.as_str()).collect();
    assert_eq!(ids, vec!["tx1", "tx2"]);
    Ok(())
}
