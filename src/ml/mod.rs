// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code (plus
// the batcher in Layer 4, which implements a Burn trait).
//
// Why isolate Burn code here?
//   - If Burn's API changes, we only update this layer
//   - Other layers are testable without tensor machinery
//   - The model architecture is clearly separated from
//     data loading and application logic
//
// What's in this layer:
//
//   model.rs     — The transformer encoder architecture:
//                  • Token embeddings
//                  • Positional embeddings
//                  • Multi-head self-attention
//                  • Feed-forward networks (GELU activation)
//                  • Layer normalisation + residuals
//                  • Mask-aware mean pooling
//                  • Linear classification head
//
//   trainer.rs   — The training/evaluation loop
//                  Step caps, fractional epochs, forward,
//                  loss, backward, optimiser step, progress
//                  lines and per-epoch checkpointing
//
//   predictor.rs — The inference engine
//                  Loads a checkpoint, tokenises input,
//                  runs the model, inverts the label mapping
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Transformer encoder + classification head architecture
pub mod model;

/// Training/evaluation loop with step caps and checkpointing
pub mod trainer;

/// Inference engine — loads a checkpoint and predicts labels
pub mod predictor;
