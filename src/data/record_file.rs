// ============================================================
// Layer 4 — Learner Record File
// ============================================================
// The persisted format shared by `prepare` (writer) and
// `train` / `evaluate` (reader). One learner = three lines:
//
//   70363                 ← learner id
//   10,10,10,31,31        ← skill ids, chronological
//   1,0,1,1,0             ← correctness bits, same length
//
// Records are simply concatenated: no header, no count, no
// separator beyond the fixed three-line cadence.
//
// Histories with fewer than 2 interactions are never written.
// Writing renders the whole file in memory first, so a failure
// while encoding never leaves a half-written file behind.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::error::KtError;
use crate::domain::interaction::LearnerHistory;
use crate::domain::traits::HistorySource;

/// Histories shorter than this are left out of the persisted file.
pub const MIN_PERSISTED_LEN: usize = 2;

/// A record file on disk.
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Parse every record in the file.
    pub fn read(&self) -> Result<Vec<LearnerHistory>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read record file '{}'", self.path.display()))?;

        parse(&text)
            .with_context(|| format!("Malformed record file '{}'", self.path.display()))
    }

    /// Overwrite the file with `histories`, returning how many were written.
    pub fn write(&self, histories: &[LearnerHistory]) -> Result<usize> {
        let (text, written) = render(histories);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, text)
            .with_context(|| format!("Cannot write record file '{}'", self.path.display()))?;

        tracing::debug!(
            "Wrote {} of {} learners to '{}'",
            written,
            histories.len(),
            self.path.display()
        );
        Ok(written)
    }
}

impl HistorySource for RecordFile {
    fn load_histories(&self) -> Result<Vec<LearnerHistory>> {
        self.read()
    }
}

/// Render histories into the three-line format.
/// Returns the text and the number of records it contains.
pub fn render(histories: &[LearnerHistory]) -> (String, usize) {
    let mut out     = String::new();
    let mut written = 0usize;

    for h in histories.iter().filter(|h| h.len() >= MIN_PERSISTED_LEN) {
        out.push_str(&h.learner_id().to_string());
        out.push('\n');
        out.push_str(&join(h.skills()));
        out.push('\n');
        out.push_str(&join(h.correctness()));
        out.push('\n');
        written += 1;
    }

    (out, written)
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse the three-line format back into histories.
///
/// Trailing blank lines are tolerated; anything else that breaks
/// the cadence is an `InvalidHistory` naming the line.
pub fn parse(text: &str) -> Result<Vec<LearnerHistory>, KtError> {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    if lines.len() % 3 != 0 {
        return Err(KtError::InvalidHistory(format!(
            "{} lines is not a whole number of 3-line records",
            lines.len()
        )));
    }

    lines
        .chunks(3)
        .enumerate()
        .map(|(i, rec)| {
            let first = i * 3 + 1;
            let learner_id = rec[0].trim().parse::<i64>().map_err(|_| {
                KtError::InvalidHistory(format!(
                    "line {first}: '{}' is not a learner id",
                    rec[0].trim()
                ))
            })?;
            let skills      = parse_list::<i64>(rec[1], first + 1)?;
            let correctness = parse_list::<u8>(rec[2], first + 2)?;

            LearnerHistory::new(learner_id, skills, correctness).map_err(|e| match e {
                KtError::InvalidHistory(msg) => {
                    KtError::InvalidHistory(format!("lines {first}-{}: {msg}", first + 2))
                }
                other => other,
            })
        })
        .collect()
}

fn parse_list<T: std::str::FromStr>(line: &str, line_no: usize) -> Result<Vec<T>, KtError> {
    line.trim()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim().parse::<T>().map_err(|_| {
                KtError::InvalidHistory(format!("line {line_no}: '{s}' is not an integer"))
            })
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn history(id: i64, skills: &[i64], correct: &[u8]) -> LearnerHistory {
        LearnerHistory::new(id, skills.to_vec(), correct.to_vec()).unwrap()
    }

    #[test]
    fn test_render_exact_bytes() {
        let (text, n) = render(&[history(70363, &[10, 10, 31], &[1, 0, 1])]);
        assert_eq!(n, 1);
        assert_eq!(text, "70363\n10,10,31\n1,0,1\n");
    }

    #[test]
    fn test_round_trip_drops_only_short_histories() {
        let originals = vec![
            history(1, &[3, 7, 3, 9], &[1, 0, 1, 1]),
            history(2, &[5], &[1]),
            history(3, &[8, 8], &[0, 1]),
        ];
        let (text, written) = render(&originals);
        let back = parse(&text).unwrap();

        assert_eq!(written, 2);
        assert_eq!(back, vec![originals[0].clone(), originals[2].clone()]);
    }

    #[test]
    fn test_trailing_blank_lines_ok() {
        let back = parse("4\n1,2\n0,1\n\n\n").unwrap();
        assert_eq!(back.len(), 1);
    }

    #[test]
    fn test_mismatched_lengths_are_invalid() {
        let err = parse("4\n1,2,3\n0,1\n").unwrap_err();
        assert!(matches!(err, KtError::InvalidHistory(msg) if msg.contains("lines 1-3")));
    }

    #[test]
    fn test_incomplete_record_is_invalid() {
        assert!(parse("4\n1,2\n0,1\n5\n").is_err());
    }

    #[test]
    fn test_garbage_id_is_invalid() {
        assert!(parse("abc\n1,2\n0,1\n").is_err());
    }

    #[test]
    fn test_file_write_then_read() {
        let dir  = tempfile::tempdir().unwrap();
        let file = RecordFile::new(dir.path().join("nested").join("train.csv"));
        let hs   = vec![history(11, &[1, 2, 3], &[0, 0, 1])];

        assert_eq!(file.write(&hs).unwrap(), 1);
        assert_eq!(file.read().unwrap(), hs);
    }
}
