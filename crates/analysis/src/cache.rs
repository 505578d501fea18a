// Memoization of `derive_analysis` keyed by input content.
//
// Re-parsing the same spreadsheet produces equal rows, hence an equal key and
// the same shared result. Derivation failures are not cached.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::derive::derive_analysis;
use crate::error::AnalysisError;
use crate::labels::LabelSet;
use crate::model::{AnalysisResult, CellInput, RawRow};

pub const DEFAULT_CACHE_CAPACITY: usize = 8;

/// Content digest of a row sequence and the label set used to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputKey([u8; 32]);

impl InputKey {
    pub fn of(rows: &[RawRow], labels: &LabelSet) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(rows.len() as u64).to_le_bytes());
        for row in rows {
            hash_str(&mut hasher, &row.label);
            hash_cell(&mut hasher, &row.prior);
            hash_cell(&mut hasher, &row.current);
        }
        for aliases in [&labels.total_assets, &labels.current_assets, &labels.current_liabilities] {
            hasher.update(&(aliases.len() as u64).to_le_bytes());
            for alias in aliases {
                hash_str(&mut hasher, alias);
            }
        }
        Self(*hasher.finalize().as_bytes())
    }
}

fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hash_cell(hasher: &mut blake3::Hasher, cell: &CellInput) {
    match cell {
        CellInput::Number(n) => {
            hasher.update(&[0]);
            hasher.update(&n.to_bits().to_le_bytes());
        }
        CellInput::Text(s) => {
            hasher.update(&[1]);
            hash_str(hasher, s);
        }
        CellInput::Empty => {
            hasher.update(&[2]);
        }
    }
}

/// Bounded FIFO memo of derivation results.
#[derive(Debug)]
pub struct DerivationCache {
    capacity: usize,
    entries: VecDeque<(InputKey, Arc<AnalysisResult>)>,
    hits: u64,
    misses: u64,
}

impl Default for DerivationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl DerivationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn derive(&mut self, rows: &[RawRow], labels: &LabelSet) -> Result<Arc<AnalysisResult>, AnalysisError> {
        let key = InputKey::of(rows, labels);
        if let Some((_, result)) = self.entries.iter().find(|(k, _)| *k == key) {
            self.hits += 1;
            log::debug!("derivation cache hit ({} rows)", rows.len());
            return Ok(Arc::clone(result));
        }

        self.misses += 1;
        let result = Arc::new(derive_analysis(rows, labels)?);
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, Arc::clone(&result)));
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
