//! Bulk loader & extractor (C7): the `load` side of the text data format.
use crate::session::Session;
use crate::{err, errors::Error};
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Summary of one `load` run: how many lines were inserted, and the
/// malformed/duplicate lines that were skipped (1-indexed, with the reason).
#[derive(Debug, Default)]
pub struct LoadReport {
    pub inserted: usize,
    pub skipped: Vec<(usize, String)>,
}

/// Read `key,value` lines from `path` and insert each into `session`.
///
/// Per line: trim whitespace, skip if empty, split on the first comma, parse
/// both sides as `u32`. A malformed or duplicate line is recorded in the
/// report and the loader continues with the next line — one bad line never
/// aborts the load.
pub fn load_into(session: &mut Session, path: &Path) -> Result<LoadReport, Error> {
    if !path.exists() {
        return Err(Error::FileNotFound);
    }
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut report = LoadReport::default();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match parse_record(trimmed) {
            Some((key, value)) => match session.insert(key, value) {
                Ok(()) => report.inserted += 1,
                Err(Error::DuplicateKey(k)) => {
                    warn!(line = line_no, key = k, "skipping duplicate key during load");
                    report.skipped.push((line_no, format!("duplicate key {}", k)));
                }
                Err(e) => return Err(e),
            },
            None => {
                warn!(line = line_no, text = trimmed, "skipping malformed line during load");
                report.skipped.push((
                    line_no,
                    err!(MalformedInput, "{}", trimmed).to_string(),
                ));
            }
        }
    }
    Ok(report)
}

fn parse_record(line: &str) -> Option<(u32, u32)> {
    let (key, value) = line.split_once(',')?;
    let key = key.trim().parse::<u32>().ok()?;
    let value = value.trim().parse::<u32>().ok()?;
    Some((key, value))
}
