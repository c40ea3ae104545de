use crate::error::{Result, StatementChatError};
use crate::source::SourceKind;
use serde::{Deserialize, Serialize};

/// One named column of a record schema and the position it occupies in a
/// row-shaped parser table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub column: usize,
}

const fn field(name: &'static str, column: usize) -> FieldSpec {
    FieldSpec { name, column }
}

/// Bank tables carry an unused reference column at index 2.
pub const BANK_STATEMENT_FIELDS: [FieldSpec; 6] = [
    field("transactionDate", 0),
    field("description", 1),
    field("valueDate", 3),
    field("debit", 4),
    field("credit", 5),
    field("balance", 6),
];

pub const MOBILE_MONEY_FIELDS: [FieldSpec; 10] = [
    field("date", 0),
    field("transaction", 1),
    field("details", 2),
    field("transaction_id", 3),
    field("from", 4),
    field("to", 5),
    field("amount", 6),
    field("fees", 7),
    field("taxes", 8),
    field("balance", 9),
];

impl SourceKind {
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::BankStatement => &BANK_STATEMENT_FIELDS,
            Self::MobileMoney => &MOBILE_MONEY_FIELDS,
        }
    }

    pub fn field_names(self) -> Vec<String> {
        self.fields().iter().map(|f| f.name.to_string()).collect()
    }
}

/// A flat statement row. Values line up with the columns of the
/// [`RecordSet`] that owns the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRecord {
    values: Vec<String>,
}

impl StatementRecord {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// A filler record: every field is an empty string.
    pub fn empty(width: usize) -> Self {
        Self {
            values: vec![String::new(); width],
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_filler(&self) -> bool {
        self.values.iter().all(|v| v.is_empty())
    }
}

/// Ordered records sharing one column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    columns: Vec<String>,
    records: Vec<StatementRecord>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn for_kind(kind: SourceKind) -> Self {
        Self::new(kind.field_names())
    }

    pub fn push(&mut self, record: StatementRecord) -> Result<()> {
        if record.values.len() != self.columns.len() {
            return Err(StatementChatError::Normalization(format!(
                "record has {} values but the schema has {} columns",
                record.values.len(),
                self.columns.len()
            )));
        }
        self.records.push(record);
        Ok(())
    }

    /// Appends `count` filler records.
    pub fn pad(&mut self, count: usize) {
        let width = self.columns.len();
        self.records
            .extend(std::iter::repeat_with(|| StatementRecord::empty(width)).take(count));
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[StatementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, row: usize, field: &str) -> Option<&str> {
        let column = self.columns.iter().position(|c| c == field)?;
        self.records
            .get(row)
            .and_then(|r| r.values.get(column))
            .map(String::as_str)
    }
}
