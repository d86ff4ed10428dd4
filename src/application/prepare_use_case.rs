// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Turns a raw interaction log into the files training reads:
//
//   Step 1: Resolve the dataset kind            (Layer 4 - data)
//   Step 2: Read the raw log                    (Layer 4 - data)
//   Step 3: Clean rows, group per learner       (Layer 4 - data)
//   Step 4: Learner-wise train/val split        (Layer 4 - data)
//   Step 5: Render all outputs in memory
//   Step 6: Write them to <root>/<dataset>/
//
//   skills.csv   header `skill_id`, sorted unique skill ids
//   users.csv    header `user_id`, ids in order of first appearance
//   train.csv    3-line record format
//   val.csv      3-line record format
//
// Nothing is written until every earlier step succeeded. Each file
// is written under a `.tmp` name first and only renamed into place
// once all four writes went through, so a failed run leaves no
// partial set of outputs behind.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

use crate::data::{
    loader::{DatasetKind, RawLogLoader},
    preprocessor::Preprocessor,
    record_file,
    splitter::split_train_val,
};
use crate::domain::error::KtError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    pub root:         String,
    pub dataset:      String,
    /// Raw CSV log to read
    pub input:        String,
    /// Share of learners held out for validation
    pub val_fraction: f64,
    pub seed:         Option<u64>,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            root:         "data".to_string(),
            dataset:      "assistments2009".to_string(),
            input:        "data/skill_builder_data.csv".to_string(),
            val_fraction: 0.3,
            seed:         None,
        }
    }
}

/// What a prepare run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareReport {
    pub out_dir:       PathBuf,
    pub interactions:  usize,
    pub skills:        usize,
    pub learners:      usize,
    pub train_written: usize,
    pub val_written:   usize,
}

pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<PrepareReport> {
        let cfg = &self.config;

        // ── Step 1: Resolve kind before touching the filesystem ───────────────
        let kind: DatasetKind = cfg.dataset.parse()?;
        if !(cfg.val_fraction > 0.0 && cfg.val_fraction < 1.0) {
            return Err(KtError::InvalidConfig(format!(
                "val_fraction must be in (0, 1), got {}",
                cfg.val_fraction
            ))
            .into());
        }

        // ── Step 2: Read the raw log ──────────────────────────────────────────
        let rows = RawLogLoader::new(&cfg.input, kind).load_rows()?;

        // ── Step 3: Clean and group ───────────────────────────────────────────
        let records = Preprocessor::new(kind).clean(rows)?;
        let skills  = Preprocessor::skill_ids(&records);
        let users   = Preprocessor::learner_ids(&records);
        let histories = Preprocessor::group(&records)?;
        tracing::info!(
            "{} interactions, {} skills, {} learners",
            records.len(),
            skills.len(),
            histories.len()
        );

        // ── Step 4: Split learners ────────────────────────────────────────────
        let (train, val) = split_train_val(histories, 1.0 - cfg.val_fraction, cfg.seed);

        // ── Step 5: Render everything ─────────────────────────────────────────
        let skills_csv = id_column("skill_id", &skills);
        let users_csv  = id_column("user_id", &users);
        let (train_csv, train_written) = record_file::render(&train);
        let (val_csv,   val_written)   = record_file::render(&val);

        // ── Step 6: Write ─────────────────────────────────────────────────────
        let out_dir = PathBuf::from(&cfg.root).join(kind.name());
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("Cannot create output dir '{}'", out_dir.display()))?;

        write_all_or_none(
            &out_dir,
            &[
                ("skills.csv", &skills_csv),
                ("users.csv",  &users_csv),
                ("train.csv",  &train_csv),
                ("val.csv",    &val_csv),
            ],
        )?;

        let skipped = train.len() + val.len() - train_written - val_written;
        if skipped > 0 {
            tracing::warn!("Skipped {} learners with fewer than {} interactions", skipped, record_file::MIN_PERSISTED_LEN);
        }
        tracing::info!(
            "Wrote {} train / {} val learners to '{}'",
            train_written,
            val_written,
            out_dir.display()
        );

        Ok(PrepareReport {
            out_dir,
            interactions: records.len(),
            skills:       skills.len(),
            learners:     users.len(),
            train_written,
            val_written,
        })
    }
}

/// Write every file under a temporary name, then rename them all into
/// place. On a failed write the temporaries already written are removed.
fn write_all_or_none(dir: &Path, files: &[(&str, &String)]) -> Result<()> {
    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());

    for &(name, text) in files {
        let tmp = dir.join(format!("{name}.tmp"));
        if let Err(e) = fs::write(&tmp, text) {
            for (written, _) in &staged {
                let _ = fs::remove_file(written);
            }
            return Err(e).with_context(|| format!("Cannot write '{}'", tmp.display()));
        }
        staged.push((tmp, dir.join(name)));
    }

    for (tmp, path) in &staged {
        fs::rename(tmp, path)
            .with_context(|| format!("Cannot move '{}' to '{}'", tmp.display(), path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
    }
    Ok(())
}

fn id_column<T: Display>(header: &str, ids: &[T]) -> String {
    let mut out = format!("{header}\n");
    for id in ids {
        out.push_str(&id.to_string());
        out.push('\n');
    }
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record_file::RecordFile;

    const RAW: &str = "\
order_id,user_id,skill_id,correct
1,30,5,1
2,30,2,0
3,10,5,0
4,30,,1
5,10,7,1
6,10,5,1
7,20,2,1
8,40,2,0
9,40,7,1
";

    fn config(root: &std::path::Path, input: &std::path::Path) -> PrepareConfig {
        PrepareConfig {
            root:         root.to_string_lossy().into_owned(),
            dataset:      "ASSISTments2009".to_string(),
            input:        input.to_string_lossy().into_owned(),
            val_fraction: 0.5,
            seed:         Some(3),
        }
    }

    #[test]
    fn test_writes_all_four_files() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        fs::write(&input, RAW).unwrap();

        let report = PrepareUseCase::new(config(dir.path(), &input)).execute().unwrap();
        let out    = dir.path().join("assistments2009");
        assert_eq!(report.out_dir, out);

        assert_eq!(fs::read_to_string(out.join("skills.csv")).unwrap(), "skill_id\n2\n5\n7\n");
        assert_eq!(fs::read_to_string(out.join("users.csv")).unwrap(),  "user_id\n30\n10\n20\n40\n");
        assert_eq!(report.interactions, 8);

        // Learner 20 has a single interaction and is not persisted
        assert_eq!(report.train_written + report.val_written, 3);

        let mut all = RecordFile::new(out.join("train.csv")).read().unwrap();
        all.extend(RecordFile::new(out.join("val.csv")).read().unwrap());
        all.sort_by_key(|h| h.learner_id());

        let ids: Vec<i64> = all.iter().map(|h| h.learner_id()).collect();
        assert_eq!(ids, vec![10, 30, 40]);
        assert_eq!(all[0].skills(),      &[5, 7, 5]);
        assert_eq!(all[0].correctness(), &[0, 1, 1]);
        assert_eq!(all[1].skills(),      &[5, 2]);
    }

    #[test]
    fn test_unknown_dataset_fails_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PrepareConfig {
            dataset: "ednet".to_string(),
            ..config(dir.path(), &dir.path().join("does-not-exist.csv"))
        };

        let err = PrepareUseCase::new(cfg).execute().unwrap_err();
        assert_eq!(
            err.downcast_ref::<KtError>(),
            Some(&KtError::UnknownDataset("ednet".to_string()))
        );
        assert!(!dir.path().join("ednet").exists());
    }

    #[test]
    fn test_bad_row_leaves_no_output() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        fs::write(&input, format!("{RAW}10,50,3,2\n")).unwrap();

        assert!(PrepareUseCase::new(config(dir.path(), &input)).execute().is_err());
        assert!(!dir.path().join("assistments2009").exists());
    }

    #[test]
    fn test_failed_write_leaves_no_partial_outputs() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        fs::write(&input, RAW).unwrap();

        // A directory squatting on the last temp name makes that write fail
        let out = dir.path().join("assistments2009");
        fs::create_dir_all(out.join("val.csv.tmp")).unwrap();

        assert!(PrepareUseCase::new(config(dir.path(), &input)).execute().is_err());
        for name in ["skills.csv", "users.csv", "train.csv", "val.csv"] {
            assert!(!out.join(name).exists(), "{name} was left behind");
        }
        for name in ["skills.csv.tmp", "users.csv.tmp", "train.csv.tmp"] {
            assert!(!out.join(name).exists(), "{name} was left behind");
        }
    }

    #[test]
    fn test_rerun_replaces_previous_outputs() {
        let dir   = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        fs::write(&input, RAW).unwrap();

        let out = dir.path().join("assistments2009");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("skills.csv"), "stale").unwrap();

        PrepareUseCase::new(config(dir.path(), &input)).execute().unwrap();
        assert_eq!(fs::read_to_string(out.join("skills.csv")).unwrap(), "skill_id
2
5
7
");
        assert!(!out.join("skills.csv.tmp").exists());
    }
}
