use crate::budget::estimate_tokens;
use crate::error::Result;
use crate::schema::{RecordSet, StatementRecord};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use std::io;

/// A statement rendered as CSV, together with its base64 transport form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvPayload {
    text: String,
    base64: String,
}

impl CsvPayload {
    fn from_text(text: String) -> Self {
        let base64 = STANDARD.encode(text.as_bytes());
        Self { text, base64 }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.text)
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Renders a header line plus one line per record, quoting values that
/// contain delimiters, quotes or line breaks.
pub fn serialize(records: &RecordSet) -> Result<CsvPayload> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(records.columns())?;
    for record in records.records() {
        writer.write_record(record.values())?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let text =
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(CsvPayload::from_text(text))
}

/// Parses CSV produced by [`serialize`] back into records. Every value comes
/// back as text.
pub fn deserialize(text: &str) -> Result<RecordSet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let columns = reader.headers()?.iter().map(str::to_string).collect();
    let mut records = RecordSet::new(columns);
    for row in reader.records() {
        let row = row?;
        records.push(StatementRecord::new(row.iter().map(str::to_string).collect()))?;
    }
    Ok(records)
}

pub fn decode_base64(encoded: &str) -> Result<String> {
    let bytes = STANDARD.decode(encoded)?;
    String::from_utf8(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}
