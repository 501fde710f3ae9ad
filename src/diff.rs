//! Change detection between configuration exports.
//!
//! RouterOS prefixes every export with a header comment carrying the
//! export time and software version, so two byte-identical configurations
//! still differ on disk. Comparison therefore ignores comment lines:
//! `#`-prefixed lines are filtered from each file independently and the
//! remaining line sequences are compared.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::{debug, trace};

/// Compare two export files, ignoring comment lines.
///
/// Returns `Ok(true)` when the non-comment content of `current` and
/// `previous` is identical. A missing `previous` file reports `false`,
/// forcing a backup on the first run for a device; a missing `current`
/// file is an error, since the caller has just downloaded it.
///
/// Comparison short-circuits at the first differing non-comment line.
pub fn exports_identical(current: &Path, previous: &Path) -> io::Result<bool> {
    if !previous.exists() {
        debug!(previous = %previous.display(), "no previous export, treating as changed");
        return Ok(false);
    }

    let mut current_lines = non_comment_lines(current)?;
    let mut previous_lines = non_comment_lines(previous)?;

    loop {
        match (current_lines.next(), previous_lines.next()) {
            (None, None) => return Ok(true),
            (Some(a), Some(b)) => {
                let (a, b) = (a?, b?);
                if a != b {
                    trace!(current = %a, previous = %b, "line mismatch");
                    return Ok(false);
                }
            }
            // One file has non-comment lines left over.
            _ => return Ok(false),
        }
    }
}

/// Iterator over a file's lines with comment lines filtered out.
fn non_comment_lines(path: &Path) -> io::Result<impl Iterator<Item = io::Result<String>>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(reader
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.starts_with('#'))))
}
