/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Move, Score, SearchBounds, ZobristKey};

/// Number of bytes in a megabyte
const BYTES_IN_MB: usize = 1024 * 1024;

/// How a stored score relates to the true value of its position.
///
/// See [CPW](https://www.chessprogramming.org/Node_Types) for more.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Bound {
    /// The score is exact.
    Exact,

    /// The search failed low: the true score is at most this.
    Upper,

    /// The search failed high: the true score is at least this.
    Lower,
}

impl Bound {
    /// Classifies `score` against the window it was searched with:
    ///
    /// ```text
    /// if score <= alpha:
    ///     UPPERBOUND
    /// else if score >= beta:
    ///     LOWERBOUND
    /// else:
    ///     EXACT
    /// ```
    #[inline(always)]
    pub fn new(score: Score, bounds: SearchBounds) -> Self {
        if score <= bounds.alpha {
            Self::Upper
        } else if score >= bounds.beta {
            Self::Lower
        } else {
            Self::Exact
        }
    }
}

/// An entry into a hash table
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct TTableEntry {
    /// Key of the node this entry represents.
    pub key: ZobristKey,

    /// Remaining depth at which this node was searched.
    pub depth: u8,

    /// Best move found for this position.
    pub bestmove: Move,

    /// Score of this position. Mate scores are stored as distance from this node, not from the root.
    pub score: Score,

    pub bound: Bound,
}

impl TTableEntry {
    /// Creates a new [`TTableEntry`] from the provided parameters.
    ///
    /// This will classify the bound through [`Bound::new`] and
    /// will adjust `score` by `ply` if it was a mate score.
    #[inline(always)]
    pub fn new(
        key: ZobristKey,
        bestmove: Move,
        score: Score,
        bounds: SearchBounds,
        depth: u8,
        ply: i32,
    ) -> Self {
        // Classify first, while the score is still relative to the root
        let bound = Bound::new(score, bounds);

        Self {
            key,
            bestmove,
            score: score.relative(ply),
            depth,
            bound,
        }
    }

    /// The stored score, adjusted so mate scores are measured from the root again.
    #[inline(always)]
    pub fn score_at(&self, ply: i32) -> Score {
        self.score.absolute(ply)
    }
}

/// Transposition Table.
///
/// Used during a search to keep track of previous search results on positions,
/// avoiding unnecessary re-computations. Every store overwrites whatever shared its slot.
#[derive(Debug)]
pub struct TTable {
    /// Internal cache of the TTable. Its length is always a power of two.
    cache: Vec<Option<TTableEntry>>,

    /// Number of probes since last clearing.
    pub(crate) accesses: usize,

    /// Number of probes that found a matching key since last clearing.
    pub(crate) hits: usize,
}

impl TTable {
    /// Default size of the Transposition Table, in megabytes.
    pub const DEFAULT_SIZE: usize = 16;

    /// Minimum size of the Transposition Table, in megabytes.
    pub const MIN_SIZE: usize = 1;

    /// Maximum size of the Transposition Table, in megabytes.
    pub const MAX_SIZE: usize = 1_024;

    /// Create a new [`TTable`] that is at most `size` megabytes.
    ///
    /// The number of entries is rounded down to a power of two so keys can be masked into indices.
    #[inline(always)]
    pub fn new(size: usize) -> Self {
        let size = size.clamp(Self::MIN_SIZE, Self::MAX_SIZE);
        Self::from_capacity((size * BYTES_IN_MB) / size_of::<Option<TTableEntry>>())
    }

    /// Create a new [`TTable`] that can hold at most `capacity` entries, rounded down to a power of two.
    #[inline(always)]
    pub fn from_capacity(capacity: usize) -> Self {
        let capacity = match capacity.checked_next_power_of_two() {
            Some(pow) if pow == capacity => capacity,
            Some(pow) => pow / 2,
            None => 1,
        }
        .max(1);

        Self {
            cache: vec![None; capacity],
            accesses: 0,
            hits: 0,
        }
    }

    /// Clears the entries of this [`TTable`].
    #[inline(always)]
    pub fn clear(&mut self) {
        self.cache.iter_mut().for_each(|entry| *entry = None);
        self.accesses = 0;
        self.hits = 0;
    }

    /// Returns the number of entries that can fit within this [`TTable`]
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.cache.len()
    }

    /// Returns the size of this [`TTable`], in megabytes.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.cache.len() * size_of::<Option<TTableEntry>>() / BYTES_IN_MB
    }

    /// Returns the number of `Some` entries in this [`TTable`].
    #[inline(always)]
    pub fn num_entries(&self) -> usize {
        self.cache.iter().filter(|entry| entry.is_some()).count()
    }

    /// Map `key` to an index into this [`TTable`].
    #[inline(always)]
    pub fn index(&self, key: &ZobristKey) -> usize {
        key.inner() as usize & (self.capacity() - 1)
    }

    /// Get the entry if and only if it matches the provided key
    #[inline(always)]
    pub fn get(&mut self, key: &ZobristKey) -> Option<TTableEntry> {
        self.accesses += 1;
        let entry = self.cache[self.index(key)].filter(|e| &e.key == key);
        if entry.is_some() {
            self.hits += 1;
        }
        entry
    }

    /// Store `entry` in the table at `entry.key`, overriding and returning whatever was there.
    #[inline(always)]
    pub fn store(&mut self, entry: TTableEntry) -> Option<TTableEntry> {
        let index = self.index(&entry.key);
        self.cache[index].replace(entry)
    }
}

impl Default for TTable {
    #[inline(always)]
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}
