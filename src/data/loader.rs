// ============================================================
// Layer 4 — Raw Interaction Log Loader
// ============================================================
// Reads the raw tabular interaction logs that public knowledge
// tracing datasets are distributed as, and turns every row into
// a RawRow with the handful of columns we care about.
//
// Each dataset names its columns differently:
//
//   assistments2009/2012/2015   user_id, skill_id, correct
//   riid                        timestamp, user_id, content_id,
//                               content_type_id, answered_correctly
//   xkl                         user_id, skill_id, correct
//
// Columns are located by header name, so extra columns (the
// ASSISTments exports have dozens) are simply ignored.
//
// Parsing goes through the csv crate, which handles quoted
// fields such as "Box and Whisker, Plots" in skill names.
//
// Cells can be empty (ASSISTments has rows with no skill) —
// those come through as None and the Preprocessor drops them.
//
// Reference: Rust Book §8 (Strings), §9 (Error Handling)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::File,
    io::{BufReader, Read},
    path::PathBuf,
    str::FromStr,
};

use crate::domain::error::KtError;

// ─── DatasetKind ──────────────────────────────────────────────────────────────
/// The raw log layouts the preprocessor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetKind {
    Assistments2009,
    Assistments2012,
    Assistments2015,
    Riid,
    Xkl,
}

impl DatasetKind {
    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::Assistments2009 => "assistments2009",
            DatasetKind::Assistments2012 => "assistments2012",
            DatasetKind::Assistments2015 => "assistments2015",
            DatasetKind::Riid            => "riid",
            DatasetKind::Xkl             => "xkl",
        }
    }

    /// Header names for (learner, skill, correct) in this layout.
    fn core_columns(self) -> [&'static str; 3] {
        match self {
            DatasetKind::Riid => ["user_id", "content_id", "answered_correctly"],
            _                 => ["user_id", "skill_id", "correct"],
        }
    }

    /// Only riid carries timestamps and lecture rows.
    pub fn has_timeline(self) -> bool {
        self == DatasetKind::Riid
    }
}

impl FromStr for DatasetKind {
    type Err = KtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "assistments2009" => Ok(DatasetKind::Assistments2009),
            "assistments2012" => Ok(DatasetKind::Assistments2012),
            "assistments2015" => Ok(DatasetKind::Assistments2015),
            "riid"            => Ok(DatasetKind::Riid),
            "xkl"             => Ok(DatasetKind::Xkl),
            _                 => Err(KtError::UnknownDataset(s.to_string())),
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── RawRow ───────────────────────────────────────────────────────────────────
/// One row of a raw log, reduced to the columns the pipeline uses.
/// A `None` means the cell was empty or NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawRow {
    pub learner_id:   Option<i64>,
    pub skill_id:     Option<i64>,
    pub correct:      Option<i64>,
    /// riid only
    pub timestamp:    Option<i64>,
    /// riid only: 0 = question, 1 = lecture
    pub content_type: Option<i64>,
}

// ─── RawLogLoader ─────────────────────────────────────────────────────────────
/// Loads a raw CSV interaction log of a given dataset kind.
pub struct RawLogLoader {
    path: PathBuf,
    kind: DatasetKind,
}

impl RawLogLoader {
    pub fn new(path: impl Into<PathBuf>, kind: DatasetKind) -> Self {
        Self { path: path.into(), kind }
    }

    /// Read and parse every data row of the log.
    pub fn load_rows(&self) -> Result<Vec<RawRow>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot read raw log '{}'", self.path.display()))?;

        let rows = parse_rows(BufReader::new(file), self.kind)
            .with_context(|| format!("Cannot parse raw log '{}'", self.path.display()))?;

        tracing::info!(
            "Read {} rows from '{}' ({})",
            rows.len(),
            self.path.display(),
            self.kind
        );
        Ok(rows)
    }
}

/// Parse a raw log (header line included) from any reader.
pub fn parse_rows<R: Read>(reader: R, kind: DatasetKind) -> Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header = rdr.headers()?.clone();
    if header.is_empty() {
        return Ok(Vec::new());
    }

    let find = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("{kind} log has no '{name}' column"))
    };

    let [learner_col, skill_col, correct_col] = kind.core_columns();
    let learner_idx = find(learner_col)?;
    let skill_idx   = find(skill_col)?;
    let correct_idx = find(correct_col)?;
    let (time_idx, type_idx) = if kind.has_timeline() {
        (Some(find("timestamp")?), Some(find("content_type_id")?))
    } else {
        (None, None)
    };

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record  = result?;
        let line_no = record.position().map_or(0, |p| p.line());
        let cell    = |idx: usize| -> Result<Option<i64>> {
            parse_cell(record.get(idx).unwrap_or(""))
                .with_context(|| format!("line {line_no}, column {}", idx + 1))
        };

        rows.push(RawRow {
            learner_id:   cell(learner_idx)?,
            skill_id:     cell(skill_idx)?,
            correct:      cell(correct_idx)?,
            timestamp:    time_idx.map(|i| cell(i)).transpose()?.flatten(),
            content_type: type_idx.map(|i| cell(i)).transpose()?.flatten(),
        });
    }

    Ok(rows)
}

/// Parse one numeric cell.
///
/// Integers may be written as floats ("12.0") and are truncated,
/// the way pandas hands back float columns once NaNs are present.
/// Booleans map to 0/1.
fn parse_cell(s: &str) -> Result<Option<i64>> {
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    if s.eq_ignore_ascii_case("true") {
        return Ok(Some(1));
    }
    if s.eq_ignore_ascii_case("false") {
        return Ok(Some(0));
    }
    if let Ok(v) = s.parse::<i64>() {
        return Ok(Some(v));
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v.trunc() as i64)),
        Ok(_)                  => Ok(None),
        Err(_)                 => bail!("'{s}' is not a number"),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_names_parse() {
        assert_eq!("assistments2009".parse::<DatasetKind>().unwrap(), DatasetKind::Assistments2009);
        assert_eq!("ASSISTments2012".parse::<DatasetKind>().unwrap(), DatasetKind::Assistments2012);
        assert_eq!("riid".parse::<DatasetKind>().unwrap(), DatasetKind::Riid);
    }

    #[test]
    fn test_unknown_dataset_fails_fast() {
        let err = "ednet".parse::<DatasetKind>().unwrap_err();
        assert_eq!(err, KtError::UnknownDataset("ednet".into()));
    }

    #[test]
    fn test_quoted_cells_do_not_shift_columns() {
        let text = "user_id,skill_name,skill_id,note,correct\n\
                    1,\"Addition, Subtraction\",7,\"say \"\"hi, there\"\"\",1\n";
        let rows = parse_rows(text.as_bytes(), DatasetKind::Xkl).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].skill_id, Some(7));
        assert_eq!(rows[0].correct,  Some(1));
    }

    #[test]
    fn test_short_rows_and_blank_lines() {
        let text = "user_id,skill_id,correct\r\n5, 3 ,1\r\n\r\n6,4\r\n";
        let rows = parse_rows(text.as_bytes(), DatasetKind::Xkl).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].skill_id, Some(3));
        assert_eq!(rows[1].correct,  None);
    }

    #[test]
    fn test_empty_input_has_no_rows() {
        assert!(parse_rows("".as_bytes(), DatasetKind::Riid).unwrap().is_empty());
    }

    #[test]
    fn test_load_rows_from_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        std::fs::write(&path, "user_id,skill_id,correct\n1,2,0\n").unwrap();

        let rows = RawLogLoader::new(&path, DatasetKind::Xkl).load_rows().unwrap();
        assert_eq!(rows, vec![RawRow { learner_id: Some(1), skill_id: Some(2), correct: Some(0), ..RawRow::default() }]);

        assert!(RawLogLoader::new(dir.path().join("nope.csv"), DatasetKind::Xkl).load_rows().is_err());
    }

    #[test]
    fn test_assistments_rows_by_header_name() {
        let text = "order_id,user_id,skill_id,skill_name,correct\n\
                    33,70363,10.0,\"Box and Whisker, Plots\",1\n\
                    34,70363,,Unknown,0\n";
        let rows = parse_rows(text.as_bytes(), DatasetKind::Assistments2009).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].learner_id, Some(70363));
        assert_eq!(rows[0].skill_id,   Some(10));
        assert_eq!(rows[0].correct,    Some(1));
        // Missing skill survives parsing as None
        assert_eq!(rows[1].skill_id, None);
    }

    #[test]
    fn test_riid_columns() {
        let text = "row_id,timestamp,user_id,content_id,content_type_id,task_container_id,user_answer,answered_correctly\n\
                    0,0,115,5692,0,1,3,1\n\
                    1,56943,115,3716,false,2,2,0\n";
        let rows = parse_rows(text.as_bytes(), DatasetKind::Riid).unwrap();

        assert_eq!(rows[1].timestamp,    Some(56943));
        assert_eq!(rows[1].skill_id,     Some(3716));
        assert_eq!(rows[1].content_type, Some(0));
        assert_eq!(rows[1].correct,      Some(0));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let text = "user_id,skill\n1,2\n";
        assert!(parse_rows(text.as_bytes(), DatasetKind::Xkl).is_err());
    }

    #[test]
    fn test_non_numeric_cell_is_an_error() {
        let text = "user_id,skill_id,correct\n1,abc,1\n";
        assert!(parse_rows(text.as_bytes(), DatasetKind::Xkl).is_err());
    }
}
