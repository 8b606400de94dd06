//! Board engine: the packed 4x4 board, slide/merge ops with scoring, and
//! the cell-level edits (swap, erase) that power-ups are built from.
//!
//! - `Board` is the packed state with methods for every operation.
//! - Free functions mirror the methods (e.g., `shift`, `erase_value`).
//! - The precomputed line tables and hot ops live in private submodules.

mod ops;
pub mod state;
mod tables;

pub use state::{Board, Move};

pub use ops::{
    contains_value, count_empty, erase_value, highest_tile, is_game_over, shift, shift_scored,
    swap_cells, tile_value,
};

/// Force initialization of the precomputed line tables.
/// Safe to call more than once; later calls are no-ops.
pub fn new() {
    tables::init();
}
