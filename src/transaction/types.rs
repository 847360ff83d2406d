/// Transaction types for the tallychain ledger
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text-format label of the sentinel issuance identity.
pub const ORIGIN_LABEL: &str = "ORIGIN";

/// Owner of an output, or the party named by an input.
///
/// The issuance identity is a distinct variant rather than a magic string so
/// it can never collide with a real owner identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Origin,
    Named(String),
}

impl Owner {
    pub fn parse(label: &str) -> Self {
        if label == ORIGIN_LABEL {
            Owner::Origin
        } else {
            Owner::Named(label.to_string())
        }
    }

    pub fn named(name: &str) -> Self {
        Owner::Named(name.to_string())
    }

    pub fn is_origin(&self) -> bool {
        matches!(self, Owner::Origin)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Owner::Origin => write!(f, "{}", ORIGIN_LABEL),
            Owner::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A value record owned by exactly one transaction. `consumed` transitions
/// false to true exactly once, after the claiming transaction fully validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub owner: Owner,
    pub amount: u64,
    pub consumed: bool,
}

impl TransactionOutput {
    pub fn new(owner: Owner, amount: u64) -> Self {
        TransactionOutput {
            owner,
            amount,
            consumed: false,
        }
    }
}

/// A claim on an output of an earlier transaction. Inputs owned by
/// [`Owner::Origin`] require no prior output; they are how value enters
/// the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Id of the transaction whose output is being claimed.
    pub source: String,
    pub owner: Owner,
    pub amount: u64,
}

impl TransactionInput {
    pub fn new(source: &str, owner: Owner, amount: u64) -> Self {
        TransactionInput {
            source: source.to_string(),
            owner,
            amount,
        }
    }
}

/// A transaction as parsed from a document or synthesized from a payment
/// request. `valid` is set exactly once and never reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub timestamp: u64,
    pub valid: bool,
}

impl Transaction {
    pub fn new(
        id: String,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
        timestamp: u64,
    ) -> Self {
        Transaction {
            id,
            inputs,
            outputs,
            timestamp,
            valid: false,
        }
    }

    pub fn input_total(&self) -> u64 {
        self.inputs.iter().map(|input| input.amount).sum()
    }

    pub fn output_total(&self) -> u64 {
        self.outputs.iter().map(|output| output.amount).sum()
    }

    /// Value this transaction mints, i.e. the total over its ORIGIN inputs.
    pub fn issued_total(&self) -> u64 {
        self.inputs
            .iter()
            .filter(|input| input.owner.is_origin())
            .map(|input| input.amount)
            .sum()
    }

    /// Value still spendable from this transaction's outputs.
    pub fn unspent_total(&self) -> u64 {
        self.outputs
            .iter()
            .filter(|output| !output.consumed)
            .map(|output| output.amount)
            .sum()
    }
}

/// A payment request: synthesized into a transaction by the payment engine,
/// never persisted as an entity itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: u64,
    pub timestamp: u64,
}
