use std::collections::BTreeMap;
use std::io::Read;

use crate::pool::normalizer::strip_invisible;

/// One data row keyed by header name.
pub type RawRow = BTreeMap<String, String>;

/// Split a comma-delimited table into header-keyed rows.
///
/// The first row names the fields. Each later row maps positionally onto them; missing
/// trailing fields become empty strings, surplus fields are dropped, and rows with nothing
/// but whitespace are skipped.
pub(crate) fn parse_table<R: Read>(reader: R) -> Result<Vec<RawRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = csv_reader.records();
    let headers: Vec<String> = match records.next() {
        Some(header) => header?
            .iter()
            .map(|field| strip_invisible(field).trim().to_string())
            .collect(),
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let row: RawRow = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.is_empty())
            .map(|(index, header)| {
                let value = record.get(index).unwrap_or_default().trim().to_string();
                (header.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok(rows)
}
