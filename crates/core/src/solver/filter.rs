//! Active-cell filter
//!
//! Restricts the transfer network to cells holding condensate or
//! ice-supersaturated cold vapor. The worklist is built by parallel stream
//! compaction: flag every cell, count flags per chunk, take an exclusive
//! prefix sum of the counts, and let each chunk scatter its indices into its
//! own disjoint slice of the output.
//!
//! Cells are traversed from the last level towards level 0, columns
//! ascending within each level.

use super::params::FilterThresholds;
use crate::core_types::{PrecipArray, Real, Species};
use crate::grid::AtmosphericState;
use crate::physics::qsat_ice_rho;
use rayon::prelude::*;
use std::ops::Range;

/// Flags per compaction chunk
const CHUNK_SIZE: usize = 4096;

/// Exclusive prefix sum of `counts`
///
/// Returns the offsets (`offsets[i] = counts[..i].sum()`) and the total.
#[must_use]
pub fn exclusive_prefix_sum(counts: &[usize]) -> (Vec<usize>, usize) {
    let mut total = 0;
    let offsets = counts
        .iter()
        .map(|&count| {
            let offset = total;
            total += count;
            offset
        })
        .collect();
    (offsets, total)
}

/// Indices in `0..len` for which `predicate` holds, in ascending order
///
/// Parallel stream compaction; the result equals the sequential
/// `(0..len).filter(predicate)`.
pub fn par_filter_indices<F>(len: usize, predicate: F) -> Vec<usize>
where
    F: Fn(usize) -> bool + Sync,
{
    let flags: Vec<bool> = (0..len).into_par_iter().map(&predicate).collect();
    let counts: Vec<usize> = flags
        .par_chunks(CHUNK_SIZE)
        .map(|chunk| chunk.iter().filter(|&&flag| flag).count())
        .collect();
    let (offsets, total) = exclusive_prefix_sum(&counts);

    let mut indices = vec![0; total];
    let mut slots: Vec<&mut [usize]> = Vec::with_capacity(counts.len());
    let mut rest = indices.as_mut_slice();
    for (chunk, &offset) in offsets.iter().enumerate() {
        let end = offsets.get(chunk + 1).copied().unwrap_or(total);
        let (slot, tail) = rest.split_at_mut(end - offset);
        slots.push(slot);
        rest = tail;
    }

    flags
        .par_chunks(CHUNK_SIZE)
        .zip(slots.into_par_iter())
        .enumerate()
        .for_each(|(chunk, (chunk_flags, slot))| {
            let base = chunk * CHUNK_SIZE;
            let mut cursor = 0;
            for (i, &flag) in chunk_flags.iter().enumerate() {
                if flag {
                    slot[cursor] = base + i;
                    cursor += 1;
                }
            }
        });

    indices
}

/// A `(level, column)` cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellIndex {
    /// Level index, 0 at the top
    pub level: usize,
    /// Column index
    pub column: usize,
}

/// Shallowest level holding each precipitating species, per column
///
/// `None` where the species is absent from the whole column.
#[derive(Debug, Clone, PartialEq)]
pub struct KminTable {
    columns: Range<usize>,
    entries: Vec<PrecipArray<Option<usize>>>,
}

impl KminTable {
    /// Scan every column of `columns` for the first level above `qmin`
    pub fn scan(state: &AtmosphericState, columns: Range<usize>, qmin: Real) -> Self {
        let shape = state.shape();
        let entries = columns
            .clone()
            .into_par_iter()
            .map(|column| {
                PrecipArray::from_fn(|species| {
                    let field = state.species(species).as_slice();
                    (0..shape.levels).find(|&level| field[shape.index(level, column)] > qmin)
                })
            })
            .collect();
        Self { columns, entries }
    }

    /// Column range covered by the table
    pub fn columns(&self) -> Range<usize> {
        self.columns.clone()
    }

    /// Entries of one column
    ///
    /// # Panics
    ///
    /// Panics if `column` lies outside the scanned range
    pub fn column(&self, column: usize) -> &PrecipArray<Option<usize>> {
        assert!(self.columns.contains(&column), "column {column} was not scanned");
        &self.entries[column - self.columns.start]
    }

    /// First level of `species` in `column`
    pub fn level(&self, column: usize, species: Species) -> Option<usize> {
        self.column(column)[species]
    }

    /// Shallowest level of any precipitating species in `column`
    pub fn threshold(&self, column: usize) -> Option<usize> {
        self.column(column).0.iter().flatten().copied().min()
    }
}

/// Worklist of active cells plus the per-column `kmin` table
#[derive(Debug, Clone)]
pub struct ActiveCells {
    cells: Vec<CellIndex>,
    kmin: KminTable,
}

impl ActiveCells {
    /// Run the filter over a column range of `state`
    pub fn scan(
        state: &AtmosphericState,
        columns: Range<usize>,
        thresholds: &FilterThresholds,
    ) -> Self {
        let shape = state.shape();
        let width = columns.len();
        let levels = shape.levels;
        let start = columns.start;

        // Traversal position -> cell: last level first, columns ascending
        let locate = |position: usize| CellIndex {
            level: levels - 1 - position / width,
            column: start + position % width,
        };

        let positions = par_filter_indices(levels * width, |position| {
            let cell = locate(position);
            is_active(state, shape.index(cell.level, cell.column), thresholds)
        });
        let cells = positions.into_iter().map(locate).collect();
        let kmin = KminTable::scan(state, columns, thresholds.qmin);

        Self { cells, kmin }
    }

    /// Active cells in traversal order
    pub fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    /// Number of active cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell is active
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Per-column shallowest levels of the precipitating species
    pub fn kmin(&self) -> &KminTable {
        &self.kmin
    }
}

/// Whether the cell at flat index `idx` needs microphysics
fn is_active(state: &AtmosphericState, idx: usize, thresholds: &FilterThresholds) -> bool {
    let q = state.species_at(idx);
    let condensate = [
        Species::Cloud,
        Species::Rain,
        Species::Snow,
        Species::Ice,
        Species::Graupel,
    ]
    .into_iter()
    .map(|species| q[species])
    .fold(Real::NEG_INFINITY, Real::max);
    if condensate > thresholds.qmin {
        return true;
    }

    let t = state.temperature.as_slice()[idx];
    let rho = state.density.as_slice()[idx];
    t < thresholds.t_het && q[Species::Vapor] > qsat_ice_rho(t, rho)
}
