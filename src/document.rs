//! Count-prefixed text documents: level-aware parsing and result formatting.
//!
//! One record per line, space-separated fields, every section prefixed by a
//! count line. The level a file belongs to determines which sections it
//! carries.

use crate::accounts::{Account, Transfer};
use crate::chain::{Block, ParentId};
use crate::error::{LedgerError, Result};
use crate::transaction::{
    Owner, Transaction, TransactionInput, TransactionOutput, TransactionRequest,
};

/// Document shape, selected by the level prefix of the input file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Accounts plus overdraft-limited transfers.
    Accounts,
    /// UTXO transactions only.
    Transactions,
    /// Transactions plus payment requests.
    Payments,
    /// Transactions, payment requests and blocks.
    Blocks,
}

impl Level {
    pub fn from_name(name: &str) -> Option<Level> {
        match name {
            "level1" | "level2" => Some(Level::Accounts),
            "level3" => Some(Level::Transactions),
            "level4" => Some(Level::Payments),
            "level5" => Some(Level::Blocks),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountDocument {
    pub accounts: Vec<Account>,
    pub transfers: Vec<Transfer>,
}

#[derive(Debug, Clone, Default)]
pub struct LedgerDocument {
    pub transactions: Vec<Transaction>,
    pub requests: Vec<TransactionRequest>,
    pub blocks: Option<Vec<Block>>,
}

/// Line-oriented reader keeping the current line number for error reporting.
struct Records<'a> {
    lines: std::str::Lines<'a>,
    line: usize,
}

impl<'a> Records<'a> {
    fn new(text: &'a str) -> Self {
        Records {
            lines: text.lines(),
            line: 0,
        }
    }

    fn next_record(&mut self) -> Result<Fields<'a>> {
        self.line += 1;
        match self.lines.next() {
            Some(line) => Ok(Fields {
                parts: line.split_whitespace(),
                line: self.line,
            }),
            None => Err(LedgerError::ParseError(format!(
                "line {}: unexpected end of document",
                self.line
            ))),
        }
    }

    fn next_count(&mut self) -> Result<usize> {
        self.next_record()?.next_usize()
    }

    fn at_end(&mut self) -> bool {
        // Trailing blank lines do not count as content.
        self.lines.clone().all(|line| line.trim().is_empty())
    }
}

/// Field cursor over one record line.
struct Fields<'a> {
    parts: std::str::SplitWhitespace<'a>,
    line: usize,
}

impl<'a> Fields<'a> {
    fn next_str(&mut self) -> Result<&'a str> {
        self.parts.next().ok_or_else(|| {
            LedgerError::ParseError(format!("line {}: missing field", self.line))
        })
    }

    fn next_u64(&mut self) -> Result<u64> {
        let field = self.next_str()?;
        field.parse().map_err(|_| {
            LedgerError::ParseError(format!("line {}: expected integer, got {:?}", self.line, field))
        })
    }

    fn next_i64(&mut self) -> Result<i64> {
        let field = self.next_str()?;
        field.parse().map_err(|_| {
            LedgerError::ParseError(format!("line {}: expected integer, got {:?}", self.line, field))
        })
    }

    fn next_usize(&mut self) -> Result<usize> {
        let field = self.next_str()?;
        field.parse().map_err(|_| {
            LedgerError::ParseError(format!("line {}: expected count, got {:?}", self.line, field))
        })
    }
}

pub fn parse_account_document(text: &str) -> Result<AccountDocument> {
    let mut records = Records::new(text);

    let account_count = records.next_count()?;
    let mut accounts = Vec::with_capacity(account_count);
    for _ in 0..account_count {
        let mut fields = records.next_record()?;
        accounts.push(Account {
            name: fields.next_str()?.to_string(),
            number: fields.next_str()?.to_string(),
            balance: fields.next_i64()?,
            overdraft_limit: fields.next_i64()?,
        });
    }

    // level1 documents stop after the accounts section.
    let mut transfers = Vec::new();
    if !records.at_end() {
        let transfer_count = records.next_count()?;
        for _ in 0..transfer_count {
            let mut fields = records.next_record()?;
            transfers.push(Transfer {
                from: fields.next_str()?.to_string(),
                to: fields.next_str()?.to_string(),
                amount: fields.next_i64()?,
                submitted_at: fields.next_u64()?,
            });
        }
    }

    Ok(AccountDocument {
        accounts,
        transfers,
    })
}

pub fn parse_ledger_document(text: &str, level: Level) -> Result<LedgerDocument> {
    let mut records = Records::new(text);

    let transaction_count = records.next_count()?;
    let mut transactions = Vec::with_capacity(transaction_count);
    for _ in 0..transaction_count {
        transactions.push(parse_transaction(&mut records.next_record()?)?);
    }

    let mut requests = Vec::new();
    if matches!(level, Level::Payments | Level::Blocks) {
        let request_count = records.next_count()?;
        for _ in 0..request_count {
            let mut fields = records.next_record()?;
            requests.push(TransactionRequest {
                id: fields.next_str()?.to_string(),
                from: fields.next_str()?.to_string(),
                to: fields.next_str()?.to_string(),
                amount: fields.next_u64()?,
                timestamp: fields.next_u64()?,
            });
        }
    }

    let blocks = if level == Level::Blocks {
        let block_count = records.next_count()?;
        let mut blocks = Vec::with_capacity(block_count);
        for _ in 0..block_count {
            blocks.push(parse_block(&mut records.next_record()?)?);
        }
        Some(blocks)
    } else {
        None
    };

    Ok(LedgerDocument {
        transactions,
        requests,
        blocks,
    })
}

fn parse_transaction(fields: &mut Fields) -> Result<Transaction> {
    let id = fields.next_str()?.to_string();

    let input_count = fields.next_usize()?;
    let mut inputs = Vec::with_capacity(input_count);
    for _ in 0..input_count {
        let source = fields.next_str()?;
        let owner = Owner::parse(fields.next_str()?);
        let amount = fields.next_u64()?;
        inputs.push(TransactionInput::new(source, owner, amount));
    }

    let output_count = fields.next_usize()?;
    let mut outputs = Vec::with_capacity(output_count);
    for _ in 0..output_count {
        let owner = Owner::parse(fields.next_str()?);
        let amount = fields.next_u64()?;
        outputs.push(TransactionOutput::new(owner, amount));
    }

    let timestamp = fields.next_u64()?;
    Ok(Transaction::new(id, inputs, outputs, timestamp))
}

fn parse_block(fields: &mut Fields) -> Result<Block> {
    let id = fields.next_str()?.to_string();
    let parent = ParentId::parse(fields.next_str()?);

    let transaction_count = fields.next_usize()?;
    let mut transactions = Vec::with_capacity(transaction_count);
    for _ in 0..transaction_count {
        transactions.push(fields.next_str()?.to_string());
    }

    let created_at = fields.next_u64()?;
    Ok(Block::new(id, parent, transactions, created_at))
}

/// Renders transactions count-prefixed, in the same field order as input.
pub fn format_transactions(transactions: &[Transaction]) -> Vec<String> {
    let mut lines = vec![transactions.len().to_string()];
    for tx in transactions {
        let mut line = format!("{} {}", tx.id, tx.inputs.len());
        for input in &tx.inputs {
            line.push_str(&format!(" {} {} {}", input.source, input.owner, input.amount));
        }
        line.push_str(&format!(" {}", tx.outputs.len()));
        for output in &tx.outputs {
            line.push_str(&format!(" {} {}", output.owner, output.amount));
        }
        line.push_str(&format!(" {}", tx.timestamp));
        lines.push(line);
    }
    lines
}

/// Renders blocks count-prefixed, the parent of a root block as the genesis
/// sentinel.
pub fn format_blocks(blocks: &[Block]) -> Vec<String> {
    let mut lines = vec![blocks.len().to_string()];
    for block in blocks {
        let mut line = format!("{} {} {}", block.id, block.parent, block.transactions.len());
        for tx_id in &block.transactions {
            line.push_str(&format!(" {}", tx_id));
        }
        line.push_str(&format!(" {}", block.created_at));
        lines.push(line);
    }
    lines
}

/// Renders the account report: count, then `name balance` per account in
/// input order.
pub fn format_accounts(accounts: &[Account]) -> Vec<String> {
    let mut lines = vec![accounts.len().to_string()];
    for account in accounts {
        lines.push(format!("{} {}", account.name, account.balance));
    }
    lines
}
