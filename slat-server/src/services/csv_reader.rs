//! RFC 4180 CSV reader
//!
//! Minimal parser for uploaded sentence files: comma-separated fields,
//! double-quoted fields with `""` escapes, LF or CRLF record separators.
//! Input must be valid UTF-8.

use slat_common::{Error, Result};

/// Parse CSV bytes into records of fields.
///
/// The first record is the header row. A trailing newline does not produce
/// an empty final record, and fully empty lines are skipped.
pub fn parse(input: &[u8]) -> Result<Vec<Vec<String>>> {
    let text = std::str::from_utf8(input)
        .map_err(|_| Error::InvalidInput("CSV file is not valid UTF-8".to_string()))?;

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    // True once the current record has seen a comma or any field content;
    // distinguishes an empty line from a record ending in an empty field
    let mut record_started = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            // Quoting is only recognized at the start of a field
            '"' if field.is_empty() => {
                // Quoted field
                record_started = true;
                loop {
                    match chars.next() {
                        Some('"') => {
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                field.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(ch) => field.push(ch),
                        None => {
                            return Err(Error::InvalidInput(
                                "Unterminated quoted field in CSV".to_string(),
                            ))
                        }
                    }
                }
                // Next char must be a separator or end of input
                match chars.peek() {
                    Some(',') | Some('\r') | Some('\n') | None => {}
                    Some(other) => {
                        return Err(Error::InvalidInput(format!(
                            "Unexpected character '{}' after closing quote in CSV",
                            other
                        )))
                    }
                }
            }
            ',' => {
                record_started = true;
                record.push(std::mem::take(&mut field));
            }
            '\r' => {
                // Bare CR is treated like CRLF with the LF missing
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                end_record(&mut records, &mut record, &mut field, &mut record_started);
            }
            '\n' => {
                end_record(&mut records, &mut record, &mut field, &mut record_started);
            }
            other => {
                record_started = true;
                field.push(other);
            }
        }
    }

    end_record(&mut records, &mut record, &mut field, &mut record_started);

    Ok(records)
}

fn end_record(
    records: &mut Vec<Vec<String>>,
    record: &mut Vec<String>,
    field: &mut String,
    record_started: &mut bool,
) {
    if *record_started || !record.is_empty() {
        record.push(std::mem::take(field));
        records.push(std::mem::take(record));
    }
    field.clear();
    *record_started = false;
}
