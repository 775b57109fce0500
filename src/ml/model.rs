// ============================================================
// Layer 5 — Language-ID Model
// ============================================================
// Transformer encoder with a sequence-classification head:
//
//   token ids [batch, seq]
//     → token + position embeddings
//     → N encoder blocks (self-attention + GELU FFN)
//     → final layer norm                [batch, seq, d_model]
//     → mask-aware mean pooling         [batch, d_model]
//     → linear classifier head          [batch, num_classes]
//
// The pooling averages only over real tokens (attention mask
// = 1), so the amount of padding in a batch does not tilt the
// pooled representation.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        attention::{MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct LangIdModelConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub dropout:     f64,
    pub num_classes: usize,
}

impl LangIdModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LangIdModel<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let classifier = LinearConfig::new(self.d_model, self.num_classes).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        LangIdModel {
            token_embedding, position_embedding, layers,
            final_norm, classifier, dropout,
            max_seq_len: self.max_seq_len,
            d_model:     self.d_model,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        use burn::nn::attention::MhaInput;
        let attn_output = self.self_attn.forward(MhaInput::self_attn(x.clone())).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct LangIdModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub classifier:         Linear<B>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
    pub d_model:            usize,
}

impl<B: Backend> LangIdModel<B> {
    /// input_ids, attention_mask: [batch, seq_len]
    /// → class logits: [batch, num_classes]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x);
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, d_model]

        // Mean pool over real tokens only: zero out padding
        // positions, sum, then divide by the real-token count.
        let mask = attention_mask.float(); // [batch, seq_len]
        let mask3 = mask
            .clone()
            .unsqueeze_dim::<3>(2)
            .expand([batch_size, seq_len, self.d_model]);

        let summed = (x * mask3).sum_dim(1).squeeze::<2>(1); // [batch, d_model]
        // clamp_min(1) keeps an all-padding row from dividing by zero
        let counts = mask.sum_dim(1).clamp_min(1.0); // [batch, 1]
        let pooled = summed / counts;

        self.classifier.forward(self.dropout.forward(pooled))
    }

    /// Forward pass plus cross-entropy loss against the
    /// integer-encoded targets. Training mode only.
    pub fn forward_loss(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        labels:         Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(input_ids, attention_mask);
        let ce = burn::nn::loss::CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(logits.clone(), labels);
        (loss, logits)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;

    fn tiny_config() -> LangIdModelConfig {
        LangIdModelConfig::new(64, 8, 16, 2, 1, 32, 0.0, 3)
    }

    #[test]
    fn test_forward_shape_is_batch_by_classes() {
        let device = NdArrayDevice::default();
        let model: LangIdModel<NdArray> = tiny_config().init(&device);

        let input_ids = Tensor::<NdArray, 1, Int>::from_ints(
            [5, 6, 7, 0, 0, 0, 0, 0, 9, 10, 0, 0, 0, 0, 0, 0].as_slice(),
            &device,
        )
        .reshape([2, 8]);
        let mask = Tensor::<NdArray, 1, Int>::from_ints(
            [1, 1, 1, 0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0].as_slice(),
            &device,
        )
        .reshape([2, 8]);

        let logits = model.forward(input_ids, mask);
        assert_eq!(logits.dims(), [2, 3]);
    }

    #[test]
    fn test_logits_are_finite() {
        let device = NdArrayDevice::default();
        let model: LangIdModel<NdArray> = tiny_config().init(&device);

        let input_ids = Tensor::<NdArray, 1, Int>::from_ints(
            [1, 2, 3, 4, 0, 0, 0, 0].as_slice(),
            &device,
        )
        .reshape([1, 8]);
        let mask = Tensor::<NdArray, 1, Int>::from_ints(
            [1, 1, 1, 1, 0, 0, 0, 0].as_slice(),
            &device,
        )
        .reshape([1, 8]);

        let values: Vec<f32> = model
            .forward(input_ids, mask)
            .into_data()
            .to_vec()
            .unwrap();
        assert!(values.iter().all(|v| v.is_finite()));
    }
}
