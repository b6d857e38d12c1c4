//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! Every draw is a pure function of (seed, counter). The cursor lives
//! inside the world state and is passed explicitly; two worlds never
//! share a stream, even in the same process.
//!
//! The draw at counter `n` is derived by seeding a fresh PCG stream from
//! `hash(seed) XOR n * golden`, which means:
//!   - A cursor restored from a save continues the exact same sequence.
//!   - Labels are audit metadata only and never feed the derivation.
//!   - The counter only moves forward; a value is never reused.

use rand::{RngCore, SeedableRng};
use std::collections::BTreeMap;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// Position in a world's random stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngCursor {
    pub seed: String,
    pub counter: u64,
}

impl RngCursor {
    pub fn new(seed: impl Into<String>) -> Self {
        Self { seed: seed.into(), counter: 0 }
    }

    /// The value the next draw will return. Does not advance.
    pub fn peek(&self) -> f64 {
        derive_unit(&self.seed, self.counter)
    }

    /// Draw a float in [0.0, 1.0) and return the advanced cursor.
    pub fn draw(&self, _label: &str) -> (f64, RngCursor) {
        let value = self.peek();
        (value, self.successor())
    }

    /// Draw a float in [lo, hi).
    pub fn draw_range(&self, lo: f64, hi: f64, label: &str) -> (f64, RngCursor) {
        let (u, next) = self.draw(label);
        (scale_range(u, lo, hi), next)
    }

    /// Draw an index with probability proportional to its weight.
    pub fn draw_weighted(&self, weights: &[f64], label: &str) -> (usize, RngCursor) {
        let (u, next) = self.draw(label);
        (weighted_index(u, weights), next)
    }

    fn successor(&self) -> RngCursor {
        RngCursor {
            seed: self.seed.clone(),
            counter: self.counter + 1,
        }
    }
}

/// FNV-1a over the seed bytes. Stable across processes and toolchains,
/// unlike `DefaultHasher`.
fn seed_hash(seed: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in seed.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// The value at `counter` in the stream named by `seed`.
pub fn derive_unit(seed: &str, counter: u64) -> f64 {
    let derived = seed_hash(seed) ^ counter.wrapping_mul(GOLDEN_GAMMA);
    let mut inner = Pcg64Mcg::seed_from_u64(derived);
    let bits = inner.next_u64();
    (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

fn scale_range(u: f64, lo: f64, hi: f64) -> f64 {
    lo + u * (hi - lo)
}

/// First index whose cumulative weight exceeds `u * total`.
fn weighted_index(u: f64, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    if weights.is_empty() || total <= 0.0 {
        return 0;
    }
    let target = u * total;
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w.max(0.0);
        if cumulative > target {
            return i;
        }
    }
    weights.len() - 1
}

/// What a single audited draw produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RollResult {
    Unit,
    Chance { passed: bool },
    Range { value: f64 },
    Index { index: usize },
}

/// One entry of an action's RNG audit trail. Never used to re-derive
/// outcomes; replay goes through the cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RngRoll {
    pub label: String,
    pub counter_value: u64,
    pub value: f64,
    pub probability: Option<f64>,
    pub result: RollResult,
}

/// A cursor checked out of the world for the duration of one action
/// step, recording every draw into the action's audit trail.
pub struct ActionRng<'a> {
    cursor: RngCursor,
    audit: &'a mut Vec<RngRoll>,
}

impl<'a> ActionRng<'a> {
    pub fn new(cursor: RngCursor, audit: &'a mut Vec<RngRoll>) -> Self {
        Self { cursor, audit }
    }

    /// Hand the advanced cursor back to the world.
    pub fn finish(self) -> RngCursor {
        self.cursor
    }

    pub fn counter(&self) -> u64 {
        self.cursor.counter
    }

    fn next_unit(&mut self, label: &str) -> (f64, u64) {
        let counter = self.cursor.counter;
        let (value, next) = self.cursor.draw(label);
        self.cursor = next;
        (value, counter)
    }

    fn record(&mut self, label: &str, counter: u64, value: f64, probability: Option<f64>, result: RollResult) {
        log::debug!("rng: #{counter} {label} = {value:.6}");
        self.audit.push(RngRoll {
            label: label.to_string(),
            counter_value: counter,
            value,
            probability,
            result,
        });
    }

    /// Roll a float in [0.0, 1.0).
    pub fn draw(&mut self, label: &str) -> f64 {
        let (value, counter) = self.next_unit(label);
        self.record(label, counter, value, None, RollResult::Unit);
        value
    }

    /// Roll a float in [lo, hi).
    pub fn draw_range(&mut self, lo: f64, hi: f64, label: &str) -> f64 {
        let (u, counter) = self.next_unit(label);
        let value = scale_range(u, lo, hi);
        self.record(label, counter, u, None, RollResult::Range { value });
        value
    }

    /// Weighted choice over `weights`.
    pub fn draw_weighted(&mut self, weights: &[f64], label: &str) -> usize {
        let (u, counter) = self.next_unit(label);
        let index = weighted_index(u, weights);
        self.record(label, counter, u, None, RollResult::Index { index });
        index
    }

    /// Bernoulli trial: true with probability `p`.
    pub fn chance(&mut self, p: f64, label: &str) -> bool {
        let (u, counter) = self.next_unit(label);
        let passed = u < p;
        self.record(label, counter, u, Some(p), RollResult::Chance { passed });
        passed
    }

    /// Uniform index in [0, len). `len` must be > 0.
    pub fn pick_index(&mut self, len: usize, label: &str) -> usize {
        assert!(len > 0, "pick_index on empty range");
        let (u, counter) = self.next_unit(label);
        let index = ((u * len as f64) as usize).min(len - 1);
        self.record(label, counter, u, None, RollResult::Index { index });
        index
    }

    /// `k` distinct indices from [0, len), in draw order. One draw per
    /// pick (partial Fisher-Yates). Only swapped slots are stored, so
    /// `len` may be far larger than `k`.
    pub fn sample_without_replacement(&mut self, len: usize, k: usize, label: &str) -> Vec<usize> {
        let k = k.min(len);
        let mut swapped: BTreeMap<usize, usize> = BTreeMap::new();
        let mut picks = Vec::with_capacity(k);
        for i in 0..k {
            let j = i + self.pick_index(len - i, label);
            let at_i = swapped.get(&i).copied().unwrap_or(i);
            let at_j = swapped.get(&j).copied().unwrap_or(j);
            swapped.insert(j, at_i);
            picks.push(at_j);
        }
        picks
    }
}
