//! Listing text parser.
//!
//! Each supported format is one regular expression that captures
//! `(size, path, tape)` from a single line. Lines that don't match
//! (headers, directories, blank lines) are skipped.

use std::collections::HashSet;

use regex::Regex;
use tapestage_core::{ListingFormat, Workload};
use tracing::{debug, warn};

use crate::error::ListingResult;

/// `H  <perms> ... <size> <Mon> <DD> <HH:MM|YYYY> <path> ... L1-TAPE:<tape>:...`
const HPSS_LINE: &str =
    r"^H\s.+\s(\d+)\s\w{3}\s+\d{1,2}\s(?:\d{2}:\d{2}|\d{4})\s+(\S+).+L1-TAPE:([^:\s]+)";

/// `... <size> <Mon> <DD> <HH:MM|YYYY> ./<name>.tar ... L1-TAPE:<tape>:...`
const TAR_LONG_LINE: &str =
    r"(\d+)\s\w{3}\s+\d{1,2}\s(?:\d{2}:\d{2}|\d{4})\s+\./(\S+\.tar).+L1-TAPE:([^:\s]+)";

fn line_pattern(format: ListingFormat) -> ListingResult<Regex> {
    let pattern = match format {
        ListingFormat::Hpss => HPSS_LINE,
        ListingFormat::TarLong => TAR_LONG_LINE,
    };
    Ok(Regex::new(pattern)?)
}

/// Parse listing text into a workload grouped by tape.
///
/// A path listed more than once is counted once.
pub fn parse_listing(text: &str, format: ListingFormat) -> ListingResult<Workload> {
    let re = line_pattern(format)?;
    let mut workload = Workload::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for line in text.lines() {
        let Some(caps) = re.captures(line) else {
            continue;
        };
        let (Some(size), Some(path), Some(tape)) = (caps.get(1), caps.get(2), caps.get(3)) else {
            continue;
        };

        let size: u64 = match size.as_str().parse() {
            Ok(s) => s,
            Err(e) => {
                warn!(line, error = %e, "skipping listing line with unparseable size");
                continue;
            }
        };

        if !seen.insert(path.as_str()) {
            continue;
        }
        workload.add_file(tape.as_str(), path.as_str(), size)?;
    }

    debug!(
        ?format,
        tapes = workload.tape_count(),
        files = workload.file_count(),
        total_size = workload.total_size(),
        "parsed listing"
    );
    Ok(workload)
}
