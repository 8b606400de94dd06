use rand::Rng;
use std::fmt;

use super::ops;
use serde::{Deserialize, Serialize};

// Internal type aliases for packed representation
pub(crate) type BoardRaw = u64;
pub(crate) type Line = u64;
pub(crate) type Tile = u64;
pub(crate) type Score = u64;

/// A direction to move/merge tiles.
///
/// Serializes as the lowercase token the JSON API speaks: `"up"`, `"down"`,
/// `"left"`, `"right"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Every direction, for exhaustive legality scans.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
}

/// Packed 4x4 2048 board as 16 4-bit nibbles in a `u64`.
///
/// Each nibble holds a tile exponent: nibble `e` is the tile `2^e`, 0 is an
/// empty cell. Cell (0,0) sits in the most significant nibble and cells run
/// row-major from there. Methods cover the safe operations; `from_raw` and
/// `raw` stay available for fixtures and debugging.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(pub(crate) BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self {
        Board(raw)
    }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw {
        self.0
    }

    /// Build a board from a matrix of tile values, row-major.
    ///
    /// Entries that are not representable tiles (a power of two in
    /// `2..=32768`) become empty cells.
    ///
    /// ```
    /// use twenty48_core::engine::{self as GameEngine, Board};
    /// GameEngine::new();
    /// let b = Board::from_values([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn from_values(values: [[u32; 4]; 4]) -> Self {
        let mut raw = 0;
        for (row, cells) in values.iter().enumerate() {
            for (col, &value) in cells.iter().enumerate() {
                if let Some(exp) = ops::value_exponent(value) {
                    raw |= exp << (60 - 4 * (row * 4 + col));
                }
            }
        }
        Board(raw)
    }

    /// The board as a matrix of tile values, row-major. Empty cells are 0.
    pub fn values(self) -> [[u32; 4]; 4] {
        let mut out = [[0u32; 4]; 4];
        for (row, cells) in out.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                *cell = self.tile_value(row * 4 + col);
            }
        }
        out
    }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// Example
    /// ```
    /// use twenty48_core::engine::{self as GameEngine, Board, Move};
    /// GameEngine::new();
    /// let b = Board::EMPTY;
    /// let _ = b.shift(Move::Left);
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Self {
        ops::shift(self, dir)
    }

    /// Like `shift`, but also reports the score gained by the merges the
    /// slide performed.
    #[inline]
    pub fn shift_scored(self, dir: Move) -> (Self, Score) {
        ops::shift_scored(self, dir)
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty slot, using the provided RNG.
    ///
    /// The caller must guarantee at least one empty cell.
    ///
    /// Deterministic example using a seeded RNG:
    /// ```
    /// use twenty48_core::engine::{self as GameEngine, Board};
    /// use rand::{SeedableRng, rngs::StdRng};
    /// GameEngine::new();
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    #[inline]
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let mut index = rng.gen_range(0..ops::count_empty(self));
        let mut tmp = self.0;
        let mut tile = ops::random_spawn_exponent(rng);
        loop {
            while (tmp & 0xf) != 0 {
                tmp >>= 4;
                tile <<= 4;
            }
            if index == 0 {
                break;
            }
            index -= 1;
            tmp >>= 4;
            tile <<= 4;
        }
        Board(self.0 | tile)
    }

    /// Return the board with the cells at `a` and `b` exchanged.
    ///
    /// Positions are (row, col) pairs; either cell may be empty.
    #[inline]
    pub fn swap_cells(self, a: (usize, usize), b: (usize, usize)) -> Self {
        ops::swap_cells(self, a, b)
    }

    /// Clear every cell holding `value`. Returns the new board and how many
    /// cells were cleared (0 when `value` is absent or not a representable
    /// tile).
    #[inline]
    pub fn erase_value(self, value: u32) -> (Self, u32) {
        ops::erase_value(self, value)
    }

    /// Return true if any cell holds exactly `value`.
    #[inline]
    pub fn contains_value(self, value: u32) -> bool {
        ops::contains_value(self, value)
    }

    /// Return true if the board is completely full and no direction changes it.
    ///
    /// ```
    /// use twenty48_core::engine::{self as GameEngine, Board};
    /// GameEngine::new();
    /// // An empty board has open cells, so the game is still on.
    /// assert!(!Board::EMPTY.is_game_over());
    /// ```
    #[inline]
    pub fn is_game_over(self) -> bool {
        ops::is_game_over(self)
    }

    /// Return the highest tile value (e.g., 2048) present on the board, 0 if empty.
    #[inline]
    pub fn highest_tile(self) -> u32 {
        ops::highest_tile(self)
    }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> u64 {
        ops::count_empty(self)
    }

    /// Get the actual value at index (2^exponent stored at nibble).
    ///
    /// Index runs 0..16 row-major.
    #[inline]
    pub fn tile_value(self, idx: usize) -> u32 {
        ops::tile_value(self, idx)
    }

    /// Iterate over tile exponents (nibbles) in row-major order.
    /// Returns 0 for empty, 1 for 2, 2 for 4, etc.
    #[inline]
    pub fn tiles(self) -> TilesIter {
        TilesIter {
            raw: self.0,
            idx: 0,
        }
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..4 {
            for col in 0..4 {
                match self.tile_value(row * 4 + col) {
                    0 => write!(f, "{:>6}", ".")?,
                    value => write!(f, "{value:>6}")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Iterator over board tiles (exponents) in row-major order.
pub struct TilesIter {
    raw: BoardRaw,
    idx: usize,
}

impl Iterator for TilesIter {
    type Item = u8;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= 16 {
            return None;
        }
        let n = ((self.raw >> (60 - (4 * self.idx))) & 0xf) as u8;
        self.idx += 1;
        Some(n)
    }
}

impl IntoIterator for Board {
    type Item = u8;
    type IntoIter = TilesIter;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.tiles()
    }
}
