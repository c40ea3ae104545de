use crate::error::{Result, StatementChatError};
use crate::schema::{RecordSet, StatementRecord};
use crate::source::{BankProvider, DataSource};
use log::{debug, warn};
use serde_json::{Map, Value};

/// What a statement parser handed back, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawStatement {
    /// A table whose first row is a header.
    Rows(Vec<Vec<Value>>),
    /// Transactions that already carry named fields.
    Objects(Vec<Map<String, Value>>),
}

impl RawStatement {
    /// Interprets a bare JSON array as either a row table or an object list.
    pub fn from_value(value: &Value) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| {
            StatementChatError::Normalization(format!(
                "expected an array of rows or transactions, found {}",
                json_type_name(value)
            ))
        })?;

        if items.iter().all(Value::is_array) {
            let rows = items
                .iter()
                .filter_map(|row| row.as_array().cloned())
                .collect();
            return Ok(Self::Rows(rows));
        }

        if items.iter().all(Value::is_object) {
            let objects = items
                .iter()
                .filter_map(|obj| obj.as_object().cloned())
                .collect();
            return Ok(Self::Objects(objects));
        }

        Err(StatementChatError::Normalization(
            "array mixes rows, transactions or scalar values".to_string(),
        ))
    }

    /// Pulls the raw statement out of the parser service's response envelope.
    ///
    /// Eco Bank answers with `tables`, where index 1 is the transaction table.
    /// Other banks answer with `data`, mobile money with `transactions`.
    pub fn from_parser_response(source: DataSource, body: &Value) -> Result<Self> {
        if body.is_array() {
            return Self::from_value(body);
        }

        let payload = match source {
            DataSource::Bank(BankProvider::EcoBank) if body.get("tables").is_some() => body
                .get("tables")
                .and_then(|tables| tables.get(1))
                .ok_or_else(|| {
                    StatementChatError::Normalization(
                        "Eco Bank response has no transaction table".to_string(),
                    )
                })?,
            DataSource::Bank(_) => body.get("data").ok_or_else(|| {
                StatementChatError::Normalization("bank response has no 'data' field".to_string())
            })?,
            DataSource::MobileMoney(_) => body.get("transactions").ok_or_else(|| {
                StatementChatError::Normalization(
                    "mobile money response has no 'transactions' field".to_string(),
                )
            })?,
        };

        Self::from_value(payload)
    }
}

/// Converts a raw parse result into records with the fixed schema of the
/// source's kind.
pub fn normalize(source: DataSource, raw: &RawStatement) -> Result<RecordSet> {
    let fields = source.kind().fields();
    let mut records = RecordSet::for_kind(source.kind());

    match raw {
        RawStatement::Rows(rows) => {
            for row in rows.iter().skip(1) {
                let values = fields
                    .iter()
                    .map(|f| row.get(f.column).map(cell_text).unwrap_or_default())
                    .collect();
                records.push(StatementRecord::new(values))?;
            }
        }
        RawStatement::Objects(objects) => {
            let mut incomplete = 0usize;
            for object in objects {
                if fields.iter().any(|f| !object.contains_key(f.name)) {
                    incomplete += 1;
                }
                let values = fields
                    .iter()
                    .map(|f| object.get(f.name).map(cell_text).unwrap_or_default())
                    .collect();
                records.push(StatementRecord::new(values))?;
            }
            if incomplete > 0 {
                warn!(
                    "{}: {} of {} transactions are missing schema fields; kept with empty values",
                    source,
                    incomplete,
                    objects.len()
                );
            }
        }
    }

    debug!("{}: normalized {} records", source, records.len());
    Ok(records)
}

/// Convenience wrapper for a parser response body.
pub fn normalize_response(source: DataSource, body: &Value) -> Result<RecordSet> {
    let raw = RawStatement::from_parser_response(source, body)?;
    normalize(source, &raw)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MobileMoneyProvider;
    use serde_json::json;

    const ECO: DataSource = DataSource::Bank(BankProvider::EcoBank);
    const MTN: DataSource = DataSource::MobileMoney(MobileMoneyProvider::MtnMobileMoney);

    #[test]
    fn test_rows_skip_header_and_map_positionally() {
        let raw = RawStatement::from_value(&json!([
            ["Trans Date", "Narrative", "Ref", "Value Date", "Debit", "Credit", "Balance"],
            ["01/02/2024", "POS purchase", "R1", "02/02/2024", 15000, null, 85000.5],
        ]))
        .unwrap();

        let set = normalize(ECO, &raw).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0, "transactionDate"), Some("01/02/2024"));
        assert_eq!(set.get(0, "description"), Some("POS purchase"));
        assert_eq!(set.get(0, "valueDate"), Some("02/02/2024"));
        assert_eq!(set.get(0, "debit"), Some("15000"));
        assert_eq!(set.get(0, "credit"), Some(""));
        assert_eq!(set.get(0, "balance"), Some("85000.5"));
    }

    #[test]
    fn test_short_rows_yield_empty_fields() {
        let raw = RawStatement::Rows(vec![
            vec![json!("header")],
            vec![json!("01/02/2024"), json!("Opening balance")],
        ]);
        let set = normalize(ECO, &raw).unwrap();
        assert_eq!(set.get(0, "description"), Some("Opening balance"));
        assert_eq!(set.get(0, "balance"), Some(""));
    }

    #[test]
    fn test_objects_keep_incomplete_records() {
        let raw = RawStatement::from_value(&json!([
            {
                "date": "2024-03-01", "transaction": "Cash In", "details": "Agent",
                "transaction_id": "T1", "from": "Agent 7", "to": "Me",
                "amount": 50000, "fees": 0, "taxes": 0, "balance": 50000
            },
            { "date": "2024-03-02", "amount": 1000 }
        ]))
        .unwrap();

        let set = normalize(MTN, &raw).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0, "from"), Some("Agent 7"));
        assert_eq!(set.get(1, "amount"), Some("1000"));
        assert_eq!(set.get(1, "fees"), Some(""));
    }

    #[test]
    fn test_unrecognized_shapes_fail() {
        for value in [json!({"rows": []}), json!("csv text"), json!([1, 2]), json!([[1], {"a": 1}])] {
            assert!(matches!(
                RawStatement::from_value(&value),
                Err(StatementChatError::Normalization(_))
            ));
        }
    }

    #[test]
    fn test_parser_envelopes() {
        let eco = json!({ "tables": [[["summary"]], [["h"], ["d", "x"]]] });
        assert_eq!(normalize_response(ECO, &eco).unwrap().len(), 1);

        let stanbic = json!({ "data": [{ "transactionDate": "1", "balance": "2" }] });
        let set = normalize_response(DataSource::Bank(BankProvider::StanbicBank), &stanbic).unwrap();
        assert_eq!(set.get(0, "balance"), Some("2"));

        let mobile = json!({ "transactions": [] });
        assert!(normalize_response(MTN, &mobile).unwrap().is_empty());

        let missing = json!({ "message": "bad pdf" });
        assert!(normalize_response(MTN, &missing).is_err());
    }
}
