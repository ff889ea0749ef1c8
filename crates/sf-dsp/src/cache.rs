//! Filter and Window Cache
//!
//! Explicit keyed memoization for window vectors, mel filterbanks, and DCT
//! bases. Keys are the full parameter tuples with float fields compared
//! bitwise. Entries live for the process lifetime; a new parameter set adds
//! an entry, nothing is invalidated. Racing computations of the same key
//! are idempotent, so insert-if-absent is all the coordination needed.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, LazyLock};

use ndarray::Array2;
use parking_lot::RwLock;

use sf_core::{Sample, SfResult};

use crate::mel::{self, MelFilterbank};
use crate::window::WindowKind;

// ============ Keys ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct WindowKey {
    kind: WindowKind,
    len: usize,
    periodic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MelKey {
    sample_rate: u32,
    n_fft: usize,
    n_mels: usize,
    fmin_bits: u64,
    fmax_bits: u64,
    htk: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DctKey {
    n_filters: usize,
    n_input: usize,
}

// ============ Cache ============

/// Process-wide cache for derived filter matrices and windows
#[derive(Default)]
pub struct FilterCache {
    windows: RwLock<HashMap<WindowKey, Arc<Vec<Sample>>>>,
    mel: RwLock<HashMap<MelKey, Arc<MelFilterbank>>>,
    dct: RwLock<HashMap<DctKey, Arc<Array2<Sample>>>>,
}

fn get_or_compute<K, V, F>(map: &RwLock<HashMap<K, Arc<V>>>, key: K, factory: F) -> Arc<V>
where
    K: Eq + Hash + Copy,
    F: FnOnce() -> V,
{
    if let Some(hit) = map.read().get(&key) {
        return Arc::clone(hit);
    }
    // Computed outside the lock; a concurrent miss recomputes the same
    // bits and the first insert wins.
    let value = Arc::new(factory());
    let mut guard = map.write();
    Arc::clone(guard.entry(key).or_insert(value))
}

impl FilterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached named window
    pub fn window(&self, kind: WindowKind, len: usize, periodic: bool) -> Arc<Vec<Sample>> {
        let key = WindowKey { kind, len, periodic };
        get_or_compute(&self.windows, key, || kind.generate(len, periodic))
    }

    /// Cached mel filterbank. Construction errors are returned, not cached.
    pub fn mel_filterbank(
        &self,
        sample_rate: u32,
        n_fft: usize,
        n_mels: usize,
        fmin: Sample,
        fmax: Sample,
        htk: bool,
    ) -> SfResult<Arc<MelFilterbank>> {
        let key = MelKey {
            sample_rate,
            n_fft,
            n_mels,
            fmin_bits: fmin.to_bits(),
            fmax_bits: fmax.to_bits(),
            htk,
        };
        if let Some(hit) = self.mel.read().get(&key) {
            return Ok(Arc::clone(hit));
        }
        let bank = Arc::new(MelFilterbank::new(
            sample_rate,
            n_fft,
            n_mels,
            fmin,
            fmax,
            htk,
        )?);
        let mut guard = self.mel.write();
        Ok(Arc::clone(guard.entry(key).or_insert(bank)))
    }

    /// Cached DCT basis
    pub fn dct_basis(&self, n_filters: usize, n_input: usize) -> SfResult<Arc<Array2<Sample>>> {
        let key = DctKey { n_filters, n_input };
        if let Some(hit) = self.dct.read().get(&key) {
            return Ok(Arc::clone(hit));
        }
        let basis = Arc::new(mel::dct_basis(n_filters, n_input)?);
        let mut guard = self.dct.write();
        Ok(Arc::clone(guard.entry(key).or_insert(basis)))
    }

    /// Number of cached entries across all maps
    pub fn len(&self) -> usize {
        self.windows.read().len() + self.mel.read().len() + self.dct.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static GLOBAL: LazyLock<FilterCache> = LazyLock::new(FilterCache::new);

/// The process-wide cache instance
pub fn global() -> &'static FilterCache {
    &GLOBAL
}
