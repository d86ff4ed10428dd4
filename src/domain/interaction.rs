// ============================================================
// Layer 3 — Interaction Domain Types
// ============================================================
// An InteractionRecord is one answer given by one learner:
// which skill was exercised and whether the answer was right.
//
// A LearnerHistory is the chronological list of those answers
// for a single learner, stored column-wise (skills and
// correctness side by side) because that is the shape both the
// persisted record file and the sequence encoder work with.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

use crate::domain::error::KtError;

/// Skill identifiers are plain integers as they appear in the source logs.
pub type SkillId = i64;

/// Learner identifiers, same representation as in the source logs.
pub type LearnerId = i64;

/// One (learner, skill, correctness) tuple from a raw interaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub learner_id: LearnerId,
    pub skill_id:   SkillId,
    /// 1 = answered correctly, 0 = answered incorrectly
    pub correct:    u8,
}

impl InteractionRecord {
    pub fn new(learner_id: LearnerId, skill_id: SkillId, correct: u8) -> Self {
        Self { learner_id, skill_id, correct }
    }
}

/// The ordered interactions of a single learner.
///
/// Both columns always have the same, non-zero length; the
/// constructor is the only way in and enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerHistory {
    learner_id:  LearnerId,
    skills:      Vec<SkillId>,
    correctness: Vec<u8>,
}

impl LearnerHistory {
    /// Build a history from parallel skill / correctness columns.
    ///
    /// # Errors
    /// `KtError::InvalidHistory` if the columns differ in length, are
    /// empty, or a correctness value is anything other than 0 or 1.
    pub fn new(
        learner_id:  LearnerId,
        skills:      Vec<SkillId>,
        correctness: Vec<u8>,
    ) -> Result<Self, KtError> {
        if skills.len() != correctness.len() {
            return Err(KtError::InvalidHistory(format!(
                "learner {learner_id}: {} skills but {} correctness values",
                skills.len(),
                correctness.len()
            )));
        }
        if skills.is_empty() {
            return Err(KtError::InvalidHistory(format!(
                "learner {learner_id}: history is empty"
            )));
        }
        if let Some(bad) = correctness.iter().find(|&&c| c > 1) {
            return Err(KtError::InvalidHistory(format!(
                "learner {learner_id}: correctness value {bad} is not 0 or 1"
            )));
        }
        Ok(Self { learner_id, skills, correctness })
    }

    pub fn learner_id(&self) -> LearnerId {
        self.learner_id
    }

    pub fn skills(&self) -> &[SkillId] {
        &self.skills
    }

    pub fn correctness(&self) -> &[u8] {
        &self.correctness
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
