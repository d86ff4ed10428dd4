// ============================================================
// Layer 4 — Interaction Preprocessor
// ============================================================
// Turns parsed raw rows into clean, grouped learner histories.
//
// Cleaning steps (applied in order):
//   1. Drop rows missing a learner, skill or correctness value
//   2. riid only: drop lecture rows (content_type != 0)
//   3. riid only: stable sort by timestamp, oldest first
//   4. Reject correctness values other than 0/1
//
// Grouping:
//   Rows are bucketed per learner in ascending learner-id order.
//   Inside a bucket the row order is kept, so every history
//   stays chronological.
//
// Reference: Rust Book §8 (Collections), §13 (Iterators)

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::data::loader::{DatasetKind, RawRow};
use crate::domain::error::KtError;
use crate::domain::interaction::{InteractionRecord, LearnerHistory, LearnerId, SkillId};

pub struct Preprocessor {
    kind: DatasetKind,
}

impl Preprocessor {
    pub fn new(kind: DatasetKind) -> Self {
        Self { kind }
    }

    /// Apply the cleaning steps and return records in chronological order.
    pub fn clean(&self, mut rows: Vec<RawRow>) -> Result<Vec<InteractionRecord>, KtError> {
        let before = rows.len();

        if self.kind.has_timeline() {
            rows.retain(|r| r.content_type == Some(0));
            // sort_by_key is stable: rows sharing a timestamp keep file order
            rows.sort_by_key(|r| r.timestamp.unwrap_or(i64::MIN));
        }

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let (Some(learner_id), Some(skill_id), Some(correct)) =
                (row.learner_id, row.skill_id, row.correct)
            else {
                continue;
            };

            let correct = u8::try_from(correct)
                .ok()
                .filter(|&c| c <= 1)
                .ok_or_else(|| {
                    KtError::InvalidHistory(format!(
                        "learner {learner_id}: correctness value {correct} is not 0 or 1"
                    ))
                })?;

            records.push(InteractionRecord::new(learner_id, skill_id, correct));
        }

        if records.len() < before {
            tracing::debug!(
                "Dropped {} of {} rows during cleaning",
                before - records.len(),
                before
            );
        }
        Ok(records)
    }

    /// Bucket records per learner, ascending by learner id.
    pub fn group(records: &[InteractionRecord]) -> Result<Vec<LearnerHistory>, KtError> {
        let mut buckets: BTreeMap<LearnerId, (Vec<SkillId>, Vec<u8>)> = BTreeMap::new();

        for r in records {
            let (skills, correctness) = buckets.entry(r.learner_id).or_default();
            skills.push(r.skill_id);
            correctness.push(r.correct);
        }

        buckets
            .into_iter()
            .map(|(id, (skills, correctness))| LearnerHistory::new(id, skills, correctness))
            .collect()
    }

    /// Sorted unique skill ids.
    pub fn skill_ids(records: &[InteractionRecord]) -> Vec<SkillId> {
        records
            .iter()
            .map(|r| r.skill_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Unique learner ids in order of first appearance.
    pub fn learner_ids(records: &[InteractionRecord]) -> Vec<LearnerId> {
        let mut seen = HashSet::new();
        records
            .iter()
            .map(|r| r.learner_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}
