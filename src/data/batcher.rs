// ============================================================
// Layer 4 — Knowledge Tracing Batcher
// ============================================================
// Implements Burn's Batcher trait to stack encoded samples into
// tensors on the target device.
//
//   Input:  Vec of N EncodedSamples (all the same lengths)
//   Output: KtBatch with
//             inputs   [N, input_len]    fused tokens
//             targets  [N, target_len]   skill ids to predict
//             labels   [N, target_len]   0/1 ground truth
//
// Samples are already fixed length, so batching is a flatten
// followed by a reshape — no dynamic padding happens here.
//
// Labels stay integral: Burn's binary cross-entropy takes Int
// targets, and the evaluation loop converts them when it
// pulls results back to the host.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::encoder::EncodedSample;

/// One batch of encoded learners.
#[derive(Debug, Clone)]
pub struct KtBatch<B: Backend> {
    pub inputs:  Tensor<B, 2, Int>,
    pub targets: Tensor<B, 2, Int>,
    pub labels:  Tensor<B, 2, Int>,
}

#[derive(Clone, Debug)]
pub struct KtBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> KtBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn stack<T: Copy>(&self, rows: Vec<&[T]>, to_int: impl Fn(T) -> i32) -> Tensor<B, 2, Int> {
        let n     = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let flat: Vec<i32> = rows
            .into_iter()
            .flat_map(|r| r.iter().copied().map(&to_int))
            .collect();

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device).reshape([n, width])
    }
}

impl<B: Backend> Batcher<EncodedSample, KtBatch<B>> for KtBatcher<B> {
    fn batch(&self, items: Vec<EncodedSample>) -> KtBatch<B> {
        let inputs  = self.stack(items.iter().map(|s| s.inputs.as_slice()).collect(),  |v| v as i32);
        let targets = self.stack(items.iter().map(|s| s.targets.as_slice()).collect(), |v| v as i32);
        let labels  = self.stack(items.iter().map(|s| s.labels.as_slice()).collect(),  i32::from);

        KtBatch { inputs, targets, labels }
    }
}
