use rand::Rng;

use super::state::{Board, BoardRaw, Line, Move, Score, Tile};
use super::tables::{get_gain_entry, get_line_entry, stores};

/// Largest storable exponent. A nibble tops out at 2^15 = 32768, so two
/// 32768 tiles never merge.
pub(crate) const MAX_EXPONENT: Tile = 15;

/// Slide/merge tiles in the given direction. No randomness, no scoring.
pub fn shift(board: Board, direction: Move) -> Board {
    shift_scored(board, direction).0
}

/// Slide/merge tiles and report the score gained: the sum of the values of
/// the tiles created by this slide's merges.
pub fn shift_scored(board: Board, direction: Move) -> (Board, Score) {
    match direction {
        Move::Left | Move::Right => shift_rows(board, direction),
        Move::Up | Move::Down => shift_cols(board, direction),
    }
}

// Credit to Nneonneo
pub(crate) fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

pub(crate) fn extract_line(board: BoardRaw, line_idx: u64) -> Line {
    (board >> ((3 - line_idx) * 16)) & 0xffff
}

/// Return the cell's actual value (0 if empty), e.g., 2, 4, 8, ...
///
/// Index runs 0..16 row-major.
pub fn tile_value(board: Board, idx: usize) -> u32 {
    match tile_exponent(board, idx) {
        0 => 0,
        exp => 1 << exp,
    }
}

/// True if the board is completely full and no move in any direction
/// changes it. A board with an empty cell is never over, whether or not a
/// slide would move anything.
pub fn is_game_over(board: Board) -> bool {
    if count_empty(board) != 0 {
        return false;
    }
    Move::ALL
        .into_iter()
        .all(|direction| shift(board, direction) == board)
}

// https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
/// Count the number of zero tiles.
pub fn count_empty(board: Board) -> u64 {
    16 - count_occupied(board)
}

pub(crate) fn random_spawn_exponent<R: Rng + ?Sized>(rng: &mut R) -> Tile {
    if rng.gen_range(0..10) < 9 { 1 } else { 2 }
}

fn shift_rows(board: Board, move_dir: Move) -> (Board, Score) {
    let s = stores();
    let table: &[u64] = match move_dir {
        Move::Left => &s.shift_left,
        Move::Right => &s.shift_right,
        _ => unreachable!("shift_rows only handles horizontal moves"),
    };
    let mut raw = 0;
    let mut gain = 0;
    for row_idx in 0..4 {
        let row_val = extract_line(board.0, row_idx) as u16;
        raw |= get_line_entry(table, row_val) << (48 - (16 * row_idx));
        gain += get_gain_entry(row_val);
    }
    (Board(raw), gain)
}

fn shift_cols(board: Board, move_dir: Move) -> (Board, Score) {
    let transpose_board = transpose(board.0);
    let s = stores();
    let table: &[u64] = match move_dir {
        Move::Up => &s.shift_up,
        Move::Down => &s.shift_down,
        _ => unreachable!("shift_cols only handles vertical moves"),
    };
    let mut raw = 0;
    let mut gain = 0;
    for col_idx in 0..4 {
        let col_val = extract_line(transpose_board, col_idx) as u16;
        raw |= get_line_entry(table, col_val) << (12 - (4 * col_idx));
        gain += get_gain_entry(col_val);
    }
    (Board(raw), gain)
}

/// Post-move image of one 16-bit line plus its merge gain. Only used to
/// build the lookup tables; runtime moves go through them.
pub(crate) fn slide_line(line: Line, direction: Move) -> (Line, Score) {
    let mut tiles = line_tiles(line);
    let gain = match direction {
        Move::Left | Move::Up => merge_line(&mut tiles),
        Move::Right | Move::Down => {
            tiles.reverse();
            let gain = merge_line(&mut tiles);
            tiles.reverse();
            gain
        }
    };
    let packed = match direction {
        Move::Left | Move::Right => pack_row(tiles),
        Move::Up | Move::Down => pack_col(tiles),
    };
    (packed, gain)
}

/// Tiles of a 16-bit line as exponents, leading cell first.
pub(crate) fn line_tiles(line: Line) -> [Tile; 4] {
    [
        (line >> 12) & 0xf,
        (line >> 8) & 0xf,
        (line >> 4) & 0xf,
        line & 0xf,
    ]
}

fn pack_row(tiles: [Tile; 4]) -> Line {
    tiles[0] << 12 | tiles[1] << 8 | tiles[2] << 4 | tiles[3]
}

fn pack_col(tiles: [Tile; 4]) -> Line {
    tiles[0] << 48 | tiles[1] << 32 | tiles[2] << 16 | tiles[3]
}

/// Compact `tiles` toward index 0 and merge adjacent equal pairs, scanning
/// from the leading edge. Each tile merges at most once per slide, and
/// pairs already at `MAX_EXPONENT` stay apart. Returns the score gained:
/// the sum of the merged tiles' new values.
fn merge_line(tiles: &mut [Tile; 4]) -> Score {
    let mut packed = [0; 4];
    let mut len = 0;
    for &tile in tiles.iter() {
        if tile != 0 {
            packed[len] = tile;
            len += 1;
        }
    }

    let mut out = [0; 4];
    let mut gain = 0;
    let mut read = 0;
    let mut write = 0;
    while read < len {
        if read + 1 < len && packed[read] == packed[read + 1] && packed[read] < MAX_EXPONENT {
            out[write] = packed[read] + 1;
            gain += 1 << (packed[read] + 1);
            read += 2;
        } else {
            out[write] = packed[read];
            read += 1;
        }
        write += 1;
    }
    *tiles = out;
    gain
}

/// Return the board with the cells at `a` and `b` exchanged. Positions are
/// (row, col) pairs and must be in bounds.
pub fn swap_cells(board: Board, a: (usize, usize), b: (usize, usize)) -> Board {
    let idx_a = a.0 * 4 + a.1;
    let idx_b = b.0 * 4 + b.1;
    let exp_a = tile_exponent(board, idx_a);
    let exp_b = tile_exponent(board, idx_b);
    let mut raw = board.0;
    raw &= !(0xf << nibble_shift(idx_a));
    raw &= !(0xf << nibble_shift(idx_b));
    raw |= exp_b << nibble_shift(idx_a);
    raw |= exp_a << nibble_shift(idx_b);
    Board(raw)
}

/// Zero every cell holding `value`. Returns the new board and how many
/// cells were cleared (0 when `value` is absent or not a representable
/// tile).
pub fn erase_value(board: Board, value: u32) -> (Board, u32) {
    let exp = match value_exponent(value) {
        Some(exp) => exp,
        None => return (board, 0),
    };
    let mut raw = board.0;
    let mut cleared = 0;
    for idx in 0..16 {
        if tile_exponent(board, idx) == exp {
            raw &= !(0xf << nibble_shift(idx));
            cleared += 1;
        }
    }
    (Board(raw), cleared)
}

/// True if any cell holds exactly `value`.
pub fn contains_value(board: Board, value: u32) -> bool {
    match value_exponent(value) {
        Some(exp) => (0..16).any(|idx| tile_exponent(board, idx) == exp),
        None => false,
    }
}

/// Highest tile value present on the board, 0 for an empty board.
pub fn highest_tile(board: Board) -> u32 {
    match (0..16).map(|idx| tile_exponent(board, idx)).max() {
        Some(0) | None => 0,
        Some(exp) => 1 << exp,
    }
}

/// Exponent stored for a representable tile value: a power of two in
/// `2..=32768`. Everything else (including 0 and 1) has no exponent.
pub(crate) fn value_exponent(value: u32) -> Option<Tile> {
    if value < 2 || !value.is_power_of_two() {
        return None;
    }
    let exp = value.trailing_zeros() as Tile;
    (exp <= MAX_EXPONENT).then_some(exp)
}

fn count_occupied(board: Board) -> u64 {
    let mut board_copy = board.0;
    board_copy |= board_copy >> 1;
    board_copy |= board_copy >> 2;
    board_copy &= 0x1111111111111111;
    board_copy.count_ones() as u64
}

fn tile_exponent(board: Board, idx: usize) -> Tile {
    (board.0 >> nibble_shift(idx)) & 0xf
}

fn nibble_shift(idx: usize) -> u64 {
    debug_assert!(idx < 16);
    60 - (4 * idx as u64)
}
