// ============================================================
// Layer 4 — Sequence Encoder
// ============================================================
// Converts ONE learner history into ONE fixed-length sample.
// There is no sliding window: a learner contributes exactly
// one window, made of their most recent interactions.
//
// Step 1 — Window (shared by every variant)
//   Two zeroed arrays q, qa of length max_seq. The history is
//   right-aligned into them:
//
//     L >= max_seq   keep only the last max_seq interactions
//     L <  max_seq   zeros on the left, history on the right
//
//   max_seq = 6, q_ = [3, 7, 9]  →  q = [0, 0, 0, 3, 7, 9]
//
// Step 2 — Fuse skill and correctness into one token
//
//     token = skill + n_skill   if the paired answer was correct
//     token = skill             otherwise
//
//   so "skill 7 right" and "skill 7 wrong" become different
//   input tokens and the vocabulary doubles to 2 * n_skill.
//
// Step 3 — Slice per model variant
//
//   NextStep (recurrent model)
//     target  = q[-1], label = qa[-1]
//     inputs  = fuse(q[i], qa[i]) for i in 0..max_seq-2
//     The position right before the target (max_seq-2) is not
//     part of the inputs; see DESIGN.md for why this is kept.
//
//   Shifted (self-attentive model)
//     inputs  = fuse(q[i], qa[i]) for i in 0..max_seq-1
//     targets = q[1..],  labels = qa[1..]
//     Every position predicts the interaction after it.
//
// The encoder is a pure function; the same history always
// produces the same sample.

use serde::{Deserialize, Serialize};

use crate::domain::error::KtError;
use crate::domain::interaction::{LearnerHistory, SkillId};

/// Which slicing rule turns a window into model input / targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncoderVariant {
    /// Predict only the final interaction of the window.
    NextStep,
    /// Predict every interaction from the one before it.
    Shifted,
}

/// A right-aligned, zero-padded window over one history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub skills:      Vec<SkillId>,
    pub correctness: Vec<u8>,
}

/// Fixed-length integer arrays ready for batching.
///
/// | variant  | inputs      | targets     | labels      |
/// |----------|-------------|-------------|-------------|
/// | NextStep | max_seq - 2 | 1           | 1           |
/// | Shifted  | max_seq - 1 | max_seq - 1 | max_seq - 1 |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSample {
    /// Fused skill/correctness tokens in [0, 2 * n_skill)
    pub inputs:  Vec<i64>,
    /// Skill id(s) being predicted
    pub targets: Vec<i64>,
    /// Ground-truth correctness aligned with `targets`
    pub labels:  Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceEncoder {
    n_skill: usize,
    max_seq: usize,
    variant: EncoderVariant,
}

impl SequenceEncoder {
    /// # Errors
    /// `KtError::InvalidConfig` unless `n_skill >= 1` and `max_seq >= 2`.
    pub fn new(n_skill: usize, max_seq: usize, variant: EncoderVariant) -> Result<Self, KtError> {
        if n_skill == 0 {
            return Err(KtError::InvalidConfig("n_skill must be positive".into()));
        }
        if max_seq < 2 {
            return Err(KtError::InvalidConfig(format!(
                "max_seq must be at least 2, got {max_seq}"
            )));
        }
        Ok(Self { n_skill, max_seq, variant })
    }

    pub fn n_skill(&self) -> usize {
        self.n_skill
    }

    pub fn max_seq(&self) -> usize {
        self.max_seq
    }

    pub fn variant(&self) -> EncoderVariant {
        self.variant
    }

    /// Length of `inputs` in every sample this encoder produces.
    pub fn input_len(&self) -> usize {
        match self.variant {
            EncoderVariant::NextStep => self.max_seq - 2,
            EncoderVariant::Shifted  => self.max_seq - 1,
        }
    }

    /// Right-align a raw history into a `max_seq` window.
    ///
    /// # Errors
    /// `KtError::InvalidHistory` if the two columns differ in length or a
    /// skill id falls outside `[0, n_skill)`.
    pub fn window(&self, skills: &[SkillId], correctness: &[u8]) -> Result<Window, KtError> {
        if skills.len() != correctness.len() {
            return Err(KtError::InvalidHistory(format!(
                "{} skills but {} correctness values",
                skills.len(),
                correctness.len()
            )));
        }
        if let Some(&bad) = skills.iter().find(|&&s| s < 0 || s >= self.n_skill as SkillId) {
            return Err(KtError::InvalidHistory(format!(
                "skill id {bad} outside [0, {})",
                self.n_skill
            )));
        }

        let mut q  = vec![0 as SkillId; self.max_seq];
        let mut qa = vec![0u8; self.max_seq];

        let len = skills.len();
        if len >= self.max_seq {
            q.copy_from_slice(&skills[len - self.max_seq..]);
            qa.copy_from_slice(&correctness[len - self.max_seq..]);
        } else {
            q[self.max_seq - len..].copy_from_slice(skills);
            qa[self.max_seq - len..].copy_from_slice(correctness);
        }

        Ok(Window { skills: q, correctness: qa })
    }

    /// Fused token for one (skill, correctness) pair.
    pub fn fuse(&self, skill: SkillId, correct: u8) -> i64 {
        if correct == 1 {
            skill + self.n_skill as i64
        } else {
            skill
        }
    }

    /// Encode raw parallel columns.
    pub fn encode_raw(&self, skills: &[SkillId], correctness: &[u8]) -> Result<EncodedSample, KtError> {
        let Window { skills: q, correctness: qa } = self.window(skills, correctness)?;
        let n_inputs = self.input_len();

        let inputs: Vec<i64> = q[..n_inputs]
            .iter()
            .zip(&qa[..n_inputs])
            .map(|(&s, &c)| self.fuse(s, c))
            .collect();

        let sample = match self.variant {
            EncoderVariant::NextStep => EncodedSample {
                inputs,
                targets: vec![q[self.max_seq - 1]],
                labels:  vec![qa[self.max_seq - 1]],
            },
            EncoderVariant::Shifted => EncodedSample {
                inputs,
                targets: q[1..].to_vec(),
                labels:  qa[1..].to_vec(),
            },
        };
        Ok(sample)
    }

    /// Encode a validated learner history.
    pub fn encode(&self, history: &LearnerHistory) -> Result<EncodedSample, KtError> {
        self.encode_raw(history.skills(), history.correctness())
    }
}
