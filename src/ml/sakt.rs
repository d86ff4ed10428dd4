// ============================================================
// Layer 5 — SAKT Model
// ============================================================
// Self-Attentive Knowledge Tracing (Pandey & Karypis 2019).
//
//   keys/values = Embedding(fused token) + Embedding(position)
//   queries     = Embedding(target skill)
//
//   causal multi-head attention (step t only sees steps <= t)
//       → residual + LayerNorm
//       → feed-forward (ReLU) → residual + LayerNorm
//       → Linear(embed_dim → 1) → sigmoid
//
// Output: [N, T] probabilities, one per target position.

use burn::{
    nn::{
        attention::{generate_autoregressive_mask, MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::ml::model::KnowledgeTracingModel;

#[derive(Config, Debug)]
pub struct SaktConfig {
    pub n_skill: usize,
    /// Number of positions the model attends over (max_seq - 1)
    pub seq_len: usize,
    #[config(default = 128)]
    pub embed_dim: usize,
    #[config(default = 8)]
    pub num_heads: usize,
    #[config(default = 0.2)]
    pub dropout: f64,
}

impl SaktConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SaktModel<B> {
        let interaction_embedding = EmbeddingConfig::new(2 * self.n_skill + 1, self.embed_dim).init(device);
        let position_embedding    = EmbeddingConfig::new(self.seq_len, self.embed_dim).init(device);
        let question_embedding    = EmbeddingConfig::new(self.n_skill + 1, self.embed_dim).init(device);
        let attention = MultiHeadAttentionConfig::new(self.embed_dim, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        SaktModel {
            interaction_embedding,
            position_embedding,
            question_embedding,
            attention,
            norm1:   LayerNormConfig::new(self.embed_dim).init(device),
            norm2:   LayerNormConfig::new(self.embed_dim).init(device),
            ffn1:    LinearConfig::new(self.embed_dim, self.embed_dim).init(device),
            ffn2:    LinearConfig::new(self.embed_dim, self.embed_dim).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            output:  LinearConfig::new(self.embed_dim, 1).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct SaktModel<B: Backend> {
    pub interaction_embedding: Embedding<B>,
    pub position_embedding:    Embedding<B>,
    pub question_embedding:    Embedding<B>,
    pub attention:             MultiHeadAttention<B>,
    pub norm1:                 LayerNorm<B>,
    pub norm2:                 LayerNorm<B>,
    pub ffn1:                  Linear<B>,
    pub ffn2:                  Linear<B>,
    pub dropout:               Dropout,
    pub output:                Linear<B>,
}

impl<B: Backend> SaktModel<B> {
    /// inputs, questions: [batch, seq_len] → probabilities: [batch, seq_len]
    pub fn forward(&self, inputs: Tensor<B, 2, Int>, questions: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch, seq_len] = inputs.dims();
        let device = inputs.device();

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch, seq_len]);
        let memory = self.interaction_embedding.forward(inputs)
            + self.position_embedding.forward(positions);
        let query = self.question_embedding.forward(questions);

        let mask = generate_autoregressive_mask::<B>(batch, seq_len, &device);
        let attended = self
            .attention
            .forward(MhaInput::new(query.clone(), memory.clone(), memory).mask_attn(mask))
            .context;
        let x = self.norm1.forward(attended + query);

        let ffn = self.ffn2.forward(relu(self.ffn1.forward(x.clone())));
        let x   = self.norm2.forward(x + self.dropout.forward(ffn));

        sigmoid(self.output.forward(x).reshape([batch, seq_len]))
    }
}

impl<B: Backend> KnowledgeTracingModel<B> for SaktModel<B> {
    fn forward_scores(&self, inputs: Tensor<B, 2, Int>, targets: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        self.forward(inputs, targets)
    }
}
