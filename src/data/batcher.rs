// ============================================================
// Layer 4 — Language-ID Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec of
// LangIdSamples into device-ready tensors.
//
// How batching works here:
//   Input:  Vec of N samples, each with sequences of length S
//   Output: LangIdBatch with tensors of shape [N, S]
//
//   We flatten all input_ids into one long Vec, then reshape:
//   [s1_t1, s1_t2, ..., s1_tS, s2_t1, ..., sN_tS] → [N, S]
//
// Why is this easy here?
//   Because all sequences are already padded to the same
//   length by encode_text. If they weren't, we'd need dynamic
//   padding here.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::sample::LangIdSample;

// ─── LangIdBatch ──────────────────────────────────────────────────────────────
/// A batch of language-ID samples ready for the forward pass.
/// All tensors have batch_size as their first dimension.
///
/// B is the Burn Backend (e.g. NdArray, Wgpu) — generic so the
/// same batcher works on any device.
#[derive(Debug, Clone)]
pub struct LangIdBatch<B: Backend> {
    /// Token ID sequences — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Attention masks — shape: [batch_size, seq_len]
    /// 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// Target class indices — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> LangIdBatch<B> {
    /// Number of samples in the batch.
    pub fn size(&self) -> usize {
        self.labels.dims()[0]
    }
}

// ─── LangIdBatcher ────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created in the
/// right place (CPU for ndarray, GPU index for wgpu).
#[derive(Clone, Debug)]
pub struct LangIdBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> LangIdBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<LangIdSample, LangIdBatch<B>> for LangIdBatcher<B> {
    /// Stack a Vec of samples into one batch of tensors.
    ///
    /// Steps:
    ///   1. Flatten all input_ids into one Vec<i32>
    ///   2. Create a 1D tensor and reshape to [batch, seq]
    ///   3. Repeat for attention_mask
    ///   4. Create a 1D tensor of target class indices
    fn batch(&self, items: Vec<LangIdSample>) -> LangIdBatch<B> {
        // An empty group is a caller bug — the batched pipeline
        // stage never yields one
        assert!(!items.is_empty(), "batch: received an empty sample group");
        let batch_size = items.len();
        // All sequences have the same length (pre-padded)
        let seq_len = items[0].input_ids.len();

        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i32))
            .collect();

        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(input_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(mask_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        LangIdBatch {
            input_ids,
            attention_mask,
            labels,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;

    fn sample(ids: Vec<u32>, label: usize) -> LangIdSample {
        let attention_mask = ids.iter().map(|&i| u32::from(i != 0)).collect();
        LangIdSample {
            input_ids: ids,
            attention_mask,
            label,
        }
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = LangIdBatcher::<NdArray>::new(NdArrayDevice::default());
        let batch = batcher.batch(vec![
            sample(vec![104, 105, 0, 0], 1),
            sample(vec![106, 0, 0, 0], 0),
        ]);

        assert_eq!(batch.input_ids.dims(), [2, 4]);
        assert_eq!(batch.attention_mask.dims(), [2, 4]);
        assert_eq!(batch.labels.dims(), [2]);
        assert_eq!(batch.size(), 2);
    }

    #[test]
    #[should_panic(expected = "empty sample group")]
    fn test_batch_rejects_an_empty_group() {
        let batcher = LangIdBatcher::<NdArray>::new(NdArrayDevice::default());
        let _ = batcher.batch(Vec::new());
    }

    #[test]
    fn test_batch_preserves_values() {
        let batcher = LangIdBatcher::<NdArray>::new(NdArrayDevice::default());
        let batch = batcher.batch(vec![sample(vec![7, 8], 3)]);

        // NdArray stores Int tensors as i64 — convert before reading
        let ids: Vec<i32> = batch.input_ids.into_data().convert::<i32>().to_vec().unwrap();
        assert_eq!(ids, vec![7, 8]);
        let labels: Vec<i32> = batch.labels.into_data().convert::<i32>().to_vec().unwrap();
        assert_eq!(labels, vec![3]);
    }
}
