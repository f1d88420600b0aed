/// Batch source parsing for CSV-shaped tables.
///
/// The first row must be a header naming, case-insensitively and in any
/// column order, `Sample ID`, `Nil`, `TB1`, `TB2` and `Mitogen`; extra
/// columns are ignored. A missing required header fails the whole batch.
/// After that, every malformed data row becomes a row-level error, never an
/// abort: the rest of the table still parses.
use crate::config::types::{QftError, Reading, Result};
use std::collections::HashMap;
use std::path::Path;

/// One parsed data row, still in input order
#[derive(Debug)]
pub struct ParsedRow {
    /// 1-based line number in the source file
    pub line: usize,
    /// Sample id as written, when one was present (kept for error reports)
    pub sample_id: Option<String>,
    /// Validated reading, or the row-level failure
    pub reading: Result<Reading>,
}

const REQUIRED_HEADERS: [&str; 5] = ["sample id", "nil", "tb1", "tb2", "mitogen"];

/// Parse a whole batch file.
pub fn parse_file<P: AsRef<Path>>(
    path: P,
    operator_id: Option<&str>,
    run_id: Option<&str>,
) -> Result<Vec<ParsedRow>> {
    let content = std::fs::read_to_string(path.as_ref())
        .map_err(|e| QftError::BatchFormat(format!("failed to read batch file: {}", e)))?;
    parse_table(&content, operator_id, run_id)
}

/// Parse batch text. Batch-wide operator/run ids are applied to every row.
pub fn parse_table(
    content: &str,
    operator_id: Option<&str>,
    run_id: Option<&str>,
) -> Result<Vec<ParsedRow>> {
    let mut lines = content.lines().enumerate();
    let header_line = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => continue,
            Some((_, line)) => break line,
            None => return Err(QftError::BatchFormat("batch file is empty".to_string())),
        }
    };
    let header_map = parse_header(header_line)?;

    let mut rows = Vec::new();
    for (index, line) in lines {
        let fields = split_fields(line);
        if fields.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(parse_row(index + 1, &fields, &header_map, operator_id, run_id));
    }
    Ok(rows)
}

/// Map required column names to their indices.
fn parse_header(line: &str) -> Result<HashMap<&'static str, usize>> {
    let fields = split_fields(line);
    let mut map = HashMap::new();
    for (index, field) in fields.iter().enumerate() {
        let normalized = field.trim().to_lowercase().replace('_', " ");
        if let Some(required) = REQUIRED_HEADERS.iter().find(|h| **h == normalized) {
            map.entry(*required).or_insert(index);
        }
    }

    let mut missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .filter(|h| !map.contains_key(*h))
        .copied()
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(QftError::BatchFormat(format!(
            "missing required headers: {}",
            missing.join(", ")
        )));
    }
    Ok(map)
}

fn parse_row(
    line: usize,
    fields: &[String],
    header_map: &HashMap<&'static str, usize>,
    operator_id: Option<&str>,
    run_id: Option<&str>,
) -> ParsedRow {
    let field = |name: &str| -> Option<&str> {
        header_map
            .get(name)
            .and_then(|i| fields.get(*i))
            .map(|f| f.trim())
    };

    let sample_id = field("sample id").map(str::to_string).filter(|s| !s.is_empty());

    let reading = (|| -> Result<Reading> {
        let sample_id = sample_id.clone().ok_or_else(|| {
            QftError::InvalidReading(format!("row {}: missing sample id", line))
        })?;
        let mut values = [0.0f64; 4];
        for (slot, name) in values.iter_mut().zip(["nil", "tb1", "tb2", "mitogen"]) {
            let raw = field(name).ok_or_else(|| {
                QftError::InvalidReading(format!("row {}: too few columns", line))
            })?;
            *slot = raw.parse::<f64>().map_err(|_| {
                QftError::InvalidReading(format!(
                    "row {}: {} value '{}' is not numeric",
                    line, name, raw
                ))
            })?;
        }
        let [nil, tb1, tb2, mitogen] = values;
        let mut reading = Reading::new(sample_id, nil, tb1, tb2, mitogen).map_err(|e| match e {
            QftError::InvalidReading(msg) => {
                QftError::InvalidReading(format!("row {}: {}", line, msg))
            }
            other => other,
        })?;
        if let Some(op) = operator_id {
            reading = reading.with_operator(op);
        }
        if let Some(run) = run_id {
            reading = reading.with_run(run);
        }
        Ok(reading)
    })();

    ParsedRow {
        line,
        sample_id,
        reading,
    }
}

/// Split one CSV line into fields, honoring double-quoted fields with
/// embedded commas and doubled-quote escapes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
