// ============================================================
// Layer 5 — DKT Model
// ============================================================
// Deep Knowledge Tracing (Piech et al. 2015).
//
//   fused tokens [N, T]
//       │  Embedding (2 * n_skill + 1 → embed_dim)
//       ▼
//   [N, T, embed_dim]
//       │  LSTM
//       ▼
//   [N, T, hidden_dim] → keep the last step → [N, hidden_dim]
//       │  Dropout + Linear (hidden_dim → n_skill)
//       ▼
//   logits [N, n_skill]  — one score per skill
//
// The evaluation loop then gathers the column of the skill
// being asked about.

use burn::{
    nn::{
        lstm::{Lstm, LstmConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::ml::model::KnowledgeTracingModel;

#[derive(Config, Debug)]
pub struct DktConfig {
    pub n_skill: usize,
    #[config(default = 128)]
    pub embed_dim: usize,
    #[config(default = 128)]
    pub hidden_dim: usize,
    #[config(default = 0.2)]
    pub dropout: f64,
}

impl DktConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DktModel<B> {
        // Fused tokens live in [0, 2 * n_skill), plus one spare index
        let embedding = EmbeddingConfig::new(2 * self.n_skill + 1, self.embed_dim).init(device);
        let lstm      = LstmConfig::new(self.embed_dim, self.hidden_dim, true).init(device);
        let dropout   = DropoutConfig::new(self.dropout).init();
        let output    = LinearConfig::new(self.hidden_dim, self.n_skill).init(device);
        DktModel { embedding, lstm, dropout, output }
    }
}

#[derive(Module, Debug)]
pub struct DktModel<B: Backend> {
    pub embedding: Embedding<B>,
    pub lstm:      Lstm<B>,
    pub dropout:   Dropout,
    pub output:    Linear<B>,
}

impl<B: Backend> DktModel<B> {
    /// inputs: [batch, seq_len] → logits over skills: [batch, n_skill]
    pub fn forward(&self, inputs: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let x = self.embedding.forward(inputs);
        let (hidden, _) = self.lstm.forward(x, None);

        let [batch, seq_len, dim] = hidden.dims();
        let last = hidden
            .slice([0..batch, seq_len - 1..seq_len, 0..dim])
            .reshape([batch, dim]);

        self.output.forward(self.dropout.forward(last))
    }
}

impl<B: Backend> KnowledgeTracingModel<B> for DktModel<B> {
    fn forward_scores(&self, inputs: Tensor<B, 2, Int>, _targets: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        self.forward(inputs)
    }
}
