// ============================================================
// Layer 4 — Pipeline Stages
// ============================================================
// Iterator adaptors that compose the adapter's record stream
// into a training or evaluation pipeline. The composition
// order is fixed:
//
//   training:    shuffle → shard-filter → map → batched
//   evaluation:  shard-filter → map → batched   (no shuffle)
//
// The stages are generic over the item type, so the same
// machinery shuffles raw records, Results, or encoded samples.
// The map stage is plain Iterator::map — stateless, applied to
// each element independently.
//
// Why a bounded-buffer shuffle instead of collecting and
// shuffling the whole record set?
//   The record stream is lazy and may be far larger than
//   memory. The buffer bounds memory use at `capacity`
//   elements and approximates a full shuffle within that
//   sliding window.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            rand crate documentation (StdRng, gen_range)

use rand::{rngs::StdRng, Rng, SeedableRng};

// ─── ShuffleBuffer ────────────────────────────────────────────────────────────
/// Bounded-buffer shuffle: fill a buffer of `capacity`
/// elements, then repeatedly emit one pseudo-randomly chosen
/// buffered element while pulling one replacement, until the
/// source is exhausted and the buffer drains.
///
/// Seeded with StdRng, so the ordering is deterministic for a
/// given (seed, input) pair. Capacity 0 or 1 cannot reorder
/// anything and acts as a pass-through.
pub struct ShuffleBuffer<I: Iterator> {
    source:   I,
    buffer:   Vec<I::Item>,
    rng:      StdRng,
    capacity: usize,
    primed:   bool,
}

impl<I: Iterator> ShuffleBuffer<I> {
    fn new(source: I, capacity: usize, seed: u64) -> Self {
        Self {
            source,
            buffer: Vec::with_capacity(capacity.min(1024)),
            rng: StdRng::seed_from_u64(seed),
            capacity,
            primed: false,
        }
    }
}

impl<I: Iterator> Iterator for ShuffleBuffer<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        // Degenerate window — nothing to randomise over
        if self.capacity <= 1 {
            return self.source.next();
        }

        // First pull fills the window up to capacity
        if !self.primed {
            while self.buffer.len() < self.capacity {
                match self.source.next() {
                    Some(item) => self.buffer.push(item),
                    None => break,
                }
            }
            self.primed = true;
        }

        if self.buffer.is_empty() {
            return None;
        }

        // Emit a random buffered element, refill with the next
        // source element so the window stays full until the
        // source runs dry
        let idx  = self.rng.gen_range(0..self.buffer.len());
        let item = self.buffer.swap_remove(idx);
        if let Some(replacement) = self.source.next() {
            self.buffer.push(replacement);
        }
        Some(item)
    }
}

// ─── ShardFilter ──────────────────────────────────────────────────────────────
/// Deterministic positional partition across parallel
/// consumers: the element at position `i` belongs to worker
/// `i % workers`, so every element is routed to exactly one
/// worker and the union of all workers' outputs is the input.
///
/// With zero or one worker the stage is a pass-through.
pub struct ShardFilter<I> {
    source:   I,
    worker:   usize,
    workers:  usize,
    position: usize,
}

impl<I: Iterator> Iterator for ShardFilter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if self.workers <= 1 {
            return self.source.next();
        }
        loop {
            let item     = self.source.next()?;
            let position = self.position;
            self.position += 1;
            if position % self.workers == self.worker {
                return Some(item);
            }
        }
    }
}

// ─── Batched ──────────────────────────────────────────────────────────────────
/// Group the stream into fixed-size Vec batches. The final
/// batch may be smaller when the stream length is not a
/// multiple of the batch size.
pub struct Batched<I> {
    source: I,
    size:   usize,
}

impl<I: Iterator> Iterator for Batched<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Vec<I::Item>> {
        let mut batch = Vec::with_capacity(self.size);
        for _ in 0..self.size {
            match self.source.next() {
                Some(item) => batch.push(item),
                None => break,
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

// ─── PipelineExt ──────────────────────────────────────────────────────────────
/// Chainable constructors for the pipeline stages, so a
/// pipeline reads top-to-bottom at the call site:
///
/// ```text
/// adapter.records()?
///     .shuffle_buffered(1000, seed)
///     .shard(worker, workers)
///     .map(encode)
///     .batched(batch_size)
/// ```
pub trait PipelineExt: Iterator + Sized {
    /// Bounded-buffer shuffle with a fixed seed.
    fn shuffle_buffered(self, capacity: usize, seed: u64) -> ShuffleBuffer<Self> {
        ShuffleBuffer::new(self, capacity, seed)
    }

    /// Keep only the elements routed to `worker` out of
    /// `workers` parallel consumers. `worker` must be a valid
    /// index — that is a caller bug, not a data error.
    fn shard(self, worker: usize, workers: usize) -> ShardFilter<Self> {
        assert!(workers >= 1, "shard: workers must be >= 1");
        assert!(worker < workers, "shard: worker {worker} out of range for {workers} workers");
        ShardFilter {
            source: self,
            worker,
            workers,
            position: 0,
        }
    }

    /// Group into fixed-size batches.
    fn batched(self, size: usize) -> Batched<Self> {
        assert!(size >= 1, "batched: batch size must be >= 1");
        Batched { source: self, size }
    }
}

impl<I: Iterator> PipelineExt for I {}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shuffle_preserves_the_multiset() {
        let input: Vec<u32> = (0..100).collect();
        let mut shuffled: Vec<u32> = input
            .clone()
            .into_iter()
            .shuffle_buffered(16, 7)
            .collect();
        shuffled.sort_unstable();
        assert_eq!(shuffled, input);
    }

    #[test]
    fn test_shuffle_is_deterministic_per_seed() {
        let run = |seed: u64| -> Vec<u32> {
            (0..50).shuffle_buffered(8, seed).collect()
        };
        assert_eq!(run(42), run(42));
        // Different seed, different order (overwhelmingly likely
        // for 50 elements and an 8-wide window)
        assert_ne!(run(42), run(43));
    }

    #[test]
    fn test_shuffle_actually_reorders() {
        let input: Vec<u32> = (0..50).collect();
        let shuffled: Vec<u32> = input.clone().into_iter().shuffle_buffered(8, 42).collect();
        assert_ne!(shuffled, input);
    }

    #[test]
    fn test_shuffle_capacity_one_is_pass_through() {
        let input: Vec<u32> = (0..20).collect();
        let out: Vec<u32> = input.clone().into_iter().shuffle_buffered(1, 42).collect();
        assert_eq!(out, input);
    }

    #[test]
    fn test_shuffle_reorders_only_within_the_window() {
        // With a window of k, element i cannot be emitted
        // before more than k-1 later elements have been
        // buffered, so output position of i is >= i - (k-1).
        let k = 8usize;
        let out: Vec<usize> = (0..200).shuffle_buffered(k, 3).collect();
        for (pos, &value) in out.iter().enumerate() {
            assert!(
                pos + k > value,
                "element {value} emitted too early at position {pos}"
            );
        }
    }

    #[test]
    fn test_shard_partitions_every_element_exactly_once() {
        let input: Vec<u32> = (0..103).collect();
        let workers = 4;

        let mut union: Vec<u32> = Vec::new();
        for worker in 0..workers {
            let part: Vec<u32> = input.clone().into_iter().shard(worker, workers).collect();
            union.extend(part);
        }
        union.sort_unstable();
        assert_eq!(union, input);
    }

    #[test]
    fn test_shard_single_worker_is_a_no_op() {
        let input: Vec<u32> = (0..10).collect();
        let out: Vec<u32> = input.clone().into_iter().shard(0, 1).collect();
        assert_eq!(out, input);
    }

    #[test]
    fn test_shard_is_positional_round_robin() {
        let out: Vec<u32> = (0..10).shard(1, 3).collect();
        assert_eq!(out, vec![1, 4, 7]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_shard_rejects_invalid_worker_index() {
        let _ = (0..10).shard(3, 3);
    }

    #[test]
    fn test_batched_groups_with_partial_tail() {
        let batches: Vec<Vec<u32>> = (0..7).batched(3).collect();
        assert_eq!(batches, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
    }

    #[test]
    fn test_batched_empty_stream_yields_nothing() {
        let batches: Vec<Vec<u32>> = (0..0).batched(3).collect();
        assert!(batches.is_empty());
    }
}
