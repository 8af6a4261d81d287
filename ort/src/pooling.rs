//! Pooling strategies for collapsing encoder outputs into one vector.

use ndarray::ArrayView3;

/// Strategy for pooling hidden states into a single embedding vector.
///
/// BGE models are trained with the `[CLS]` representation, sentence-transformers models such as
/// MiniLM with the attention-weighted mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PoolingStrategy {
    /// Use the first token's hidden state (the `[CLS]` token).
    #[default]
    Cls,

    /// Average all non-padding token hidden states.
    Mean,
}

impl PoolingStrategy {
    /// Apply the pooling strategy to hidden states of shape `[batch=1, seq_len, hidden_dim]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn apply(self, hidden_states: &ArrayView3<f32>, attention_mask: &[u32]) -> Vec<f32> {
        let hidden_dim = hidden_states.shape()[2];

        match self {
            Self::Cls => (0..hidden_dim).map(|d| hidden_states[[0, 0, d]]).collect(),
            Self::Mean => {
                let valid = attention_mask.iter().filter(|&&m| m != 0).count();
                if valid == 0 {
                    return vec![0.0; hidden_dim];
                }

                let mut pooled = vec![0.0; hidden_dim];
                for (seq_idx, _) in attention_mask.iter().enumerate().filter(|(_, m)| **m != 0) {
                    for (d, value) in pooled.iter_mut().enumerate() {
                        *value += hidden_states[[0, seq_idx, d]];
                    }
                }

                let count = valid as f32;
                pooled.iter_mut().for_each(|value| *value /= count);
                pooled
            }
        }
    }
}
