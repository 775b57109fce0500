// ============================================================
// Layer 5 — Training / Evaluation Loop
// ============================================================
// Drives the data pipeline through the model for one pass at
// a time: forward, cross-entropy loss, backward + Adam step
// in training; loss + top-1 accuracy accumulation (no
// updates) in evaluation.
//
// Step caps:
//   - Every pass accepts an optional cap on the number of
//     batches. A cap of zero is a clean no-op; a cap below
//     the number of available batches truncates the pass
//     early without error.
//   - Fractional epochs reuse the cap machinery: 2.5 epochs
//     is two uncapped passes plus one pass capped at half the
//     steps of a full epoch.
//
// Key Burn insight:
//   - Training uses TrainBackend (Autodiff<NdArray>) for
//     gradients
//   - model.valid() returns the model on EvalBackend (NdArray)
//   - The evaluation batcher must also use EvalBackend
//   - argmax(1) returns [batch, 1] so we flatten before .equal()
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use std::time::Instant;

use burn::{
    data::dataloader::batcher::Batcher,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use tokenizers::Tokenizer;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    adapter::{FieldRead, RecordSetAdapter},
    batcher::LangIdBatcher,
    labels::LabelVocab,
    pipeline::PipelineExt,
    sample::{encode_record, LangIdSample},
};
use crate::domain::error::DataError;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{LangIdModel, LangIdModelConfig};
use crate::schema::reader::SchemaReader;

type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
type EvalBackend  = burn::backend::NdArray;

// ─── Pass accounting ──────────────────────────────────────────────────────────
/// What one capped pass over the batch stream produced.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub steps:    usize,
    pub samples:  usize,
    pub loss_sum: f64,
    pub correct:  usize,
}

impl PassReport {
    /// Mean loss over the executed steps. NaN when the pass
    /// executed zero steps, matching "no data, no number".
    pub fn mean_loss(&self) -> f64 {
        if self.steps > 0 {
            self.loss_sum / self.steps as f64
        } else {
            f64::NAN
        }
    }

    /// Top-1 accuracy over the processed samples.
    pub fn accuracy(&self) -> f64 {
        if self.samples > 0 {
            self.correct as f64 / self.samples as f64
        } else {
            0.0
        }
    }
}

// ─── Step planning ────────────────────────────────────────────────────────────
/// Translate a (possibly fractional) epoch count into a list
/// of per-pass step caps: None = full pass, Some(n) = capped.
///
/// epoch_plan(2.5, 10) → [None, None, Some(5)]
/// epoch_plan(0.0, 10) → []                  (clean no-op)
pub fn epoch_plan(epochs: f64, steps_per_epoch: usize) -> Vec<Option<usize>> {
    let mut plan = Vec::new();
    if epochs <= 0.0 || steps_per_epoch == 0 {
        return plan;
    }

    for _ in 0..epochs.trunc() as usize {
        plan.push(None);
    }

    let fract = epochs.fract();
    if fract > 0.0 {
        let steps = (fract * steps_per_epoch as f64).ceil() as usize;
        if steps > 0 {
            plan.push(Some(steps));
        }
    }
    plan
}

/// Batches needed for one full pass over `record_count`
/// records at the given batch size.
pub fn steps_for(record_count: usize, batch_size: usize) -> usize {
    (record_count + batch_size - 1) / batch_size
}

// ─── Entry point ──────────────────────────────────────────────────────────────
pub fn run_training(
    cfg:       &TrainConfig,
    reader:    &SchemaReader,
    vocab:     &LabelVocab,
    tokenizer: &Tokenizer,
    ckpt:      &CheckpointManager,
    metrics:   &MetricsLogger,
) -> Result<()> {
    let device = burn::backend::ndarray::NdArrayDevice::default();
    tracing::info!("Using ndarray device: {:?}", device);

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = LangIdModelConfig::new(
        cfg.vocab_size, cfg.max_seq_len, cfg.d_model,
        cfg.num_heads, cfg.num_layers, cfg.d_ff, cfg.dropout,
        vocab.len(),
    );
    let mut model: LangIdModel<TrainBackend> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} layers, d_model={}, {} classes",
        cfg.num_layers, cfg.d_model, vocab.len()
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Adapters (validated once, restarted every pass) ───────────────────────
    let decode_text = vec![(cfg.text_field.clone(), FieldRead::Utf8Text)];
    let train_adapter = RecordSetAdapter::new(reader, &cfg.train_record_set, decode_text.clone())?;
    let eval_adapter  = RecordSetAdapter::new(reader, &cfg.test_record_set, decode_text)?;

    let steps_per_epoch = steps_for(train_adapter.record_count()?, cfg.train_batch_size);
    let eval_steps      = steps_for(eval_adapter.record_count()?, cfg.test_batch_size);
    // Only run the configured fraction of the evaluation set
    let eval_cap = (cfg.eval_fraction * eval_steps as f64).ceil() as usize;

    let plan = epoch_plan(cfg.epochs, steps_per_epoch);
    tracing::info!(
        "Plan: {} passes ({} steps per full epoch, eval cap {} of {} batches)",
        plan.len(), steps_per_epoch, eval_cap, eval_steps
    );

    let train_batcher = LangIdBatcher::<TrainBackend>::new(device.clone());
    let eval_batcher  = LangIdBatcher::<EvalBackend>::new(device.clone());

    let encode = |record: Result<crate::domain::record::Record, DataError>| {
        record.and_then(|r| {
            encode_record(
                tokenizer, vocab, cfg.max_seq_len,
                &cfg.text_field, &cfg.label_field, &r,
            )
        })
    };

    // ── Pass loop ─────────────────────────────────────────────────────────────
    for (pass, cap) in plan.iter().enumerate() {
        let epoch = pass + 1;

        // Training pipeline: shuffle → shard-filter → map → batch.
        // A fresh seed per pass gives each epoch its own order;
        // the single-consumer shard is a pass-through kept for
        // symmetry with multi-worker loaders.
        let train_batches = train_adapter
            .records()?
            .shuffle_buffered(cfg.shuffle_buffer, cfg.seed.wrapping_add(pass as u64))
            .shard(0, 1)
            .map(encode)
            .batched(cfg.train_batch_size);

        let (trained, train_report) = train_pass(
            model, &mut optim, &train_batcher, train_batches,
            *cap, cfg.lr, cfg.log_every,
        )?;
        model = trained;

        // Evaluation pipeline: no shuffle, dropout disabled via
        // model.valid() on the inner backend
        let eval_batches = eval_adapter
            .records()?
            .shard(0, 1)
            .map(encode)
            .batched(cfg.test_batch_size);

        let eval_report = eval_pass(
            &model.valid(), &eval_batcher, eval_batches,
            Some(eval_cap), cfg.log_every,
        )?;

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | eval_loss={:.4} | acc={:.1}%",
            epoch, plan.len(),
            train_report.mean_loss(),
            eval_report.mean_loss(),
            eval_report.accuracy() * 100.0,
        );

        metrics.log(&EpochMetrics::new(
            epoch,
            train_report.mean_loss(),
            eval_report.mean_loss(),
            eval_report.accuracy(),
        ))?;

        ckpt.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok(())
}

// ─── Training pass ────────────────────────────────────────────────────────────
/// One capped pass with parameter updates. Takes the model by
/// value because the optimiser step consumes and returns it.
fn train_pass<B, O, I>(
    mut model: LangIdModel<B>,
    optim:     &mut O,
    batcher:   &LangIdBatcher<B>,
    batches:   I,
    cap:       Option<usize>,
    lr:        f64,
    log_every: usize,
) -> Result<(LangIdModel<B>, PassReport)>
where
    B: AutodiffBackend,
    O: Optimizer<LangIdModel<B>, B>,
    I: Iterator<Item = Vec<Result<LangIdSample, DataError>>>,
{
    let mut report  = PassReport::default();
    let started     = Instant::now();
    let cap         = cap.unwrap_or(usize::MAX);

    for chunk in batches.take(cap) {
        // The first bad record aborts the pass — no recovery
        let items: Vec<LangIdSample> = chunk.into_iter().collect::<Result<_, _>>()?;
        let batch = batcher.batch(items);
        let batch_size = batch.size();

        let (loss, _logits) =
            model.forward_loss(batch.input_ids, batch.attention_mask, batch.labels);

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
        report.loss_sum += loss_val;
        report.steps    += 1;
        report.samples  += batch_size;

        // Backward pass + Adam update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(lr, model, grads);

        // Cadence of >= 1 step guarantees the divisors below
        // are never zero
        if report.steps % log_every == 0 {
            let rate = report.samples as f64 / started.elapsed().as_secs_f64().max(1e-6);
            println!(
                "  train step {:>5} | loss={:.4} | {:.1} samples/s",
                report.steps,
                report.mean_loss(),
                rate,
            );
        }
    }

    Ok((model, report))
}

// ─── Evaluation pass ──────────────────────────────────────────────────────────
/// One capped pass without parameter updates: accumulates
/// loss and top-1 accuracy.
fn eval_pass<B, I>(
    model:     &LangIdModel<B>,
    batcher:   &LangIdBatcher<B>,
    batches:   I,
    cap:       Option<usize>,
    log_every: usize,
) -> Result<PassReport>
where
    B: Backend,
    I: Iterator<Item = Vec<Result<LangIdSample, DataError>>>,
{
    let mut report = PassReport::default();
    let started    = Instant::now();
    let cap        = cap.unwrap_or(usize::MAX);

    for chunk in batches.take(cap) {
        let items: Vec<LangIdSample> = chunk.into_iter().collect::<Result<_, _>>()?;
        let batch = batcher.batch(items);
        let batch_size = batch.size();

        let logits = model.forward(batch.input_ids, batch.attention_mask);

        let ce = burn::nn::loss::CrossEntropyLossConfig::new().init(&logits.device());
        let loss_val: f64 = ce
            .forward(logits.clone(), batch.labels.clone())
            .into_scalar()
            .elem::<f64>();

        // argmax(1) returns shape [batch, 1] — flatten to
        // [batch] before comparing with the targets
        let predicted = logits.argmax(1).flatten::<1>(0, 1);
        let correct: i64 = predicted
            .equal(batch.labels)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();

        report.loss_sum += loss_val;
        report.steps    += 1;
        report.samples  += batch_size;
        report.correct  += correct as usize;

        if report.steps % log_every == 0 {
            let rate = report.samples as f64 / started.elapsed().as_secs_f64().max(1e-6);
            println!(
                "  eval step  {:>5} | loss={:.4} | acc={:.1}% | {:.1} samples/s",
                report.steps,
                report.mean_loss(),
                report.accuracy() * 100.0,
                rate,
            );
        }
    }

    Ok(report)
}
