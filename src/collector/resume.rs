//! Resume reconciliation
//!
//! Before a resumed run, the existing output file is scanned once and the
//! record count per chapter is compared against the chapter's expected
//! verse count. A chapter with at least that many records is considered
//! complete and skipped; anything less is re-fetched whole. Lines that fail
//! to parse are counted and skipped, never fatal: a torn final line from an
//! interrupted run must not block resuming.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{Chapter, VerseKey};

/// Minimal view of an output line; every other field is ignored.
#[derive(Debug, Deserialize)]
struct ScanRecord {
    verse_id: VerseKey,
}

/// Tally of an existing output file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResumeScan {
    /// Parsed records per chapter
    pub per_chapter: HashMap<u32, u64>,
    /// Total parsed records
    pub records_seen: u64,
    /// Lines skipped because they failed to parse
    pub malformed_lines: u64,
}

impl ResumeScan {
    /// Chapters whose tally meets or exceeds the expected verse count.
    pub fn completed_chapters(&self, chapters: &[Chapter]) -> HashSet<u32> {
        chapters
            .iter()
            .filter(|chapter| {
                self.per_chapter
                    .get(&chapter.id)
                    .is_some_and(|&count| count >= chapter.verses_count as u64)
            })
            .map(|chapter| chapter.id)
            .collect()
    }
}

/// Scan an output file and tally records per chapter.
///
/// A missing file yields an empty scan; a fresh run and a resumed run over
/// nothing are the same case.
pub fn scan_output(path: &Path) -> io::Result<ResumeScan> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ResumeScan::default()),
        Err(e) => return Err(e),
    };

    let mut scan = ResumeScan::default();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ScanRecord>(&line) {
            Ok(record) => {
                *scan.per_chapter.entry(record.verse_id.chapter).or_insert(0) += 1;
                scan.records_seen += 1;
            }
            Err(_) => scan.malformed_lines += 1,
        }
    }

    if scan.malformed_lines > 0 {
        warn!(
            path = %path.display(),
            malformed = scan.malformed_lines,
            "Skipped unparseable lines during resume scan"
        );
    }
    debug!(
        path = %path.display(),
        records = scan.records_seen,
        chapters = scan.per_chapter.len(),
        "Resume scan complete"
    );

    Ok(scan)
}
