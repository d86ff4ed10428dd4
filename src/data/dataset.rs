use anyhow::{Context, Result};
use burn::data::dataset::Dataset;

use crate::data::encoder::{EncodedSample, SequenceEncoder};
use crate::domain::interaction::LearnerHistory;
use crate::domain::traits::HistorySource;

/// Learners with this many interactions or fewer are too short to train on.
pub const MAX_EXCLUDED_LEN: usize = 2;

/// Encoded samples for one split, built eagerly at load time and
/// never mutated afterwards.
pub struct KtDataset {
    samples: Vec<EncodedSample>,
}

impl KtDataset {
    /// Filter out short histories and encode the rest.
    pub fn from_histories(histories: &[LearnerHistory], encoder: &SequenceEncoder) -> Result<Self> {
        let mut samples = Vec::with_capacity(histories.len());

        for h in histories.iter().filter(|h| h.len() > MAX_EXCLUDED_LEN) {
            let sample = encoder
                .encode(h)
                .with_context(|| format!("Cannot encode learner {}", h.learner_id()))?;
            samples.push(sample);
        }

        let skipped = histories.len() - samples.len();
        if skipped > 0 {
            tracing::debug!(
                "Skipped {} learners with <= {} interactions",
                skipped,
                MAX_EXCLUDED_LEN
            );
        }

        Ok(Self { samples })
    }

    /// Load from any history source (usually a RecordFile).
    pub fn load(source: &impl HistorySource, encoder: &SequenceEncoder) -> Result<Self> {
        let histories = source.load_histories()?;
        Self::from_histories(&histories, encoder)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Dataset<EncodedSample> for KtDataset {
    fn get(&self, index: usize) -> Option<EncodedSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::EncoderVariant;

    #[test]
    fn test_short_learners_excluded() {
        let histories = vec![
            LearnerHistory::new(1, vec![3, 7, 3, 9], vec![1, 0, 1, 1]).unwrap(),
            LearnerHistory::new(2, vec![5], vec![1]).unwrap(),
            LearnerHistory::new(3, vec![5, 6], vec![1, 0]).unwrap(),
            LearnerHistory::new(4, vec![5, 6, 7], vec![1, 0, 0]).unwrap(),
        ];
        let enc = SequenceEncoder::new(10, 4, EncoderVariant::NextStep).unwrap();
        let ds  = KtDataset::from_histories(&histories, &enc).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(0).unwrap().inputs, vec![13, 7]);
        // learner 4: window [0, 5, 6, 7]
        assert_eq!(ds.get(1).unwrap().inputs,  vec![0, 15]);
        assert_eq!(ds.get(1).unwrap().targets, vec![7]);
        assert!(ds.get(2).is_none());
    }

    #[test]
    fn test_out_of_range_skill_names_the_learner() {
        let histories = vec![
            LearnerHistory::new(1, vec![3, 7, 3, 9], vec![1, 0, 1, 1]).unwrap(),
            LearnerHistory::new(8, vec![3, 25, 4, 9], vec![1, 1, 0, 1]).unwrap(),
        ];
        let enc = SequenceEncoder::new(10, 4, EncoderVariant::NextStep).unwrap();
        let err = KtDataset::from_histories(&histories, &enc).err().unwrap();

        assert!(err.to_string().contains("learner 8"));
        assert!(matches!(
            err.downcast_ref::<crate::domain::error::KtError>(),
            Some(crate::domain::error::KtError::InvalidHistory(_))
        ));
    }
}
