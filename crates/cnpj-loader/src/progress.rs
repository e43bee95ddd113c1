//! Progress estimation and reporting
//!
//! The denominator comes from a fast newline count, not a parse, so quoted
//! fields with embedded newlines can make it drift from the true row count.
//! It is an estimate only; the tracker treats it as a soft ceiling.

use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Estimate a file's row count by counting newline bytes in one streaming
/// pass. A final line without a trailing newline still counts.
pub fn estimate_row_count(path: impl AsRef<Path>) -> Result<u64> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::with_capacity(1 << 20, file);
    let mut buf = [0u8; 64 * 1024];
    let mut count = 0u64;
    let mut last_byte = b'\n';

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        count += buf[..n].iter().filter(|&&b| b == b'\n').count() as u64;
        last_byte = buf[n - 1];
    }

    if last_byte != b'\n' {
        count += 1;
    }

    Ok(count)
}

/// Per-file progress indicator, updated once per chunk.
///
/// Positions are clamped to be monotonically non-decreasing and the length
/// grows if the estimate turns out to be short. Purely observational.
pub struct ProgressTracker {
    bar: ProgressBar,
    position: u64,
}

impl ProgressTracker {
    /// Create a tracker for one file. When `visible` is false the bar is a
    /// hidden no-op, which keeps logs clean in non-interactive runs.
    pub fn new(estimated_total: u64, label: &str, visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new(estimated_total);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} rows ({eta})",
                    )
                    .expect("Invalid progress bar template")
                    .progress_chars("#>-"),
            );
            bar.set_message(label.to_string());
            bar
        } else {
            ProgressBar::hidden()
        };

        Self { bar, position: 0 }
    }

    /// Record the absolute row offset after a chunk commit
    pub fn update(&mut self, rows_written: u64) {
        let position = rows_written.max(self.position);
        self.position = position;

        if self.bar.length().unwrap_or(0) < position {
            self.bar.set_length(position);
        }
        self.bar.set_position(position);
    }

    /// Current (clamped) position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Close out the bar at the final row count
    pub fn finish(&mut self, rows_written: u64) {
        self.update(rows_written);
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_estimate_counts_lines() {
        let file = fixture(b"a;1\nb;2\nc;3\n");
        assert_eq!(estimate_row_count(file.path()).unwrap(), 3);
    }

    #[test]
    fn test_estimate_counts_unterminated_last_line() {
        let file = fixture(b"a;1\nb;2");
        assert_eq!(estimate_row_count(file.path()).unwrap(), 2);
    }

    #[test]
    fn test_estimate_empty_file() {
        let file = fixture(b"");
        assert_eq!(estimate_row_count(file.path()).unwrap(), 0);
    }

    #[test]
    fn test_tracker_positions_never_decrease() {
        let mut tracker = ProgressTracker::new(100, "test", false);
        tracker.update(10);
        tracker.update(30);
        tracker.update(20); // stale update must not move the bar backwards
        assert_eq!(tracker.position(), 30);
    }

    #[test]
    fn test_tracker_tolerates_overrunning_the_estimate() {
        let mut tracker = ProgressTracker::new(5, "test", false);
        tracker.update(8);
        assert_eq!(tracker.position(), 8);
    }
}
