use std::sync::OnceLock;

use super::state::{Move, Score};

/// Precomputed lookup tables for all possible 4-tile lines (16-bit packed).
///
/// A slide only ever looks at one row or column at a time, and a line packs
/// into 16 bits, so every outcome fits in a 65,536-entry table per
/// direction. Building the tables once keeps moves branch-light at runtime.
///
/// Layout:
/// - `shift_left/right[i]`: replacement 16-bit row after applying the move.
/// - `shift_up/down[i]`: replacement column, pre-spread so vertical moves
///   can OR entries straight into the untransposed board.
/// - `gain[i]`: score gained by the line's merges, which is the same from
///   either end of the line.
///
/// Access is via `stores()` which lazily initializes a single global `Stores`
/// on first use. The public `engine::new()` simply forces init early.
pub(crate) struct Stores {
    pub(crate) shift_left: Box<[u64]>,
    pub(crate) shift_right: Box<[u64]>,
    pub(crate) shift_up: Box<[u64]>,
    pub(crate) shift_down: Box<[u64]>,
    pub(crate) gain: Box<[Score]>,
}

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines

static STORES: OnceLock<Stores> = OnceLock::new();

/// Ensure lookup tables are initialized.
pub fn init() {
    let _ = STORES.get_or_init(create_stores);
}

#[inline(always)]
pub(crate) fn stores() -> &'static Stores {
    STORES
        .get()
        .expect("Engine stores not initialized; call engine::new() first")
}

fn create_stores() -> Stores {
    // Allocate on the heap to keep stack frames small during init.
    let mut shift_left = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_right = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_up = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_down = vec![0u64; LINE_TABLE_SIZE];
    let mut gain = vec![0u64; LINE_TABLE_SIZE];

    let mut val: usize = 0;
    while val < LINE_TABLE_SIZE {
        let line = val as u64;
        let (left, line_gain) = super::ops::slide_line(line, Move::Left);
        shift_left[val] = left;
        shift_right[val] = super::ops::slide_line(line, Move::Right).0;
        shift_up[val] = super::ops::slide_line(line, Move::Up).0;
        shift_down[val] = super::ops::slide_line(line, Move::Down).0;
        gain[val] = line_gain;
        val += 1;
    }

    Stores {
        shift_left: shift_left.into_boxed_slice(),
        shift_right: shift_right.into_boxed_slice(),
        shift_up: shift_up.into_boxed_slice(),
        shift_down: shift_down.into_boxed_slice(),
        gain: gain.into_boxed_slice(),
    }
}

#[inline(always)]
pub(crate) fn get_line_entry(table: &[u64], idx: u16) -> u64 {
    debug_assert!((idx as usize) < LINE_TABLE_SIZE);
    unsafe { *table.get_unchecked(idx as usize) }
}

#[inline(always)]
pub(crate) fn get_gain_entry(idx: u16) -> Score {
    debug_assert!((idx as usize) < LINE_TABLE_SIZE);
    let gain_table = &stores().gain;
    unsafe { *gain_table.get_unchecked(idx as usize) }
}
