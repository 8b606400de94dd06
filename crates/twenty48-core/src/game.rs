//! Game state machine: a board plus the score counter, the power-up
//! charges, and the single-slot undo history.
//!
//! The engine's `Board` is a pure value; everything stateful about a running
//! game lives here. All operations are synchronous transformations, and the
//! spawn RNG is owned per game and seeded at construction so whole games
//! replay deterministically.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{self, Board, Move};

/// Board side length. Positions are (row, col) pairs in `[0, GRID_SIZE)`.
pub const GRID_SIZE: usize = 4;
/// Tile value whose presence counts as a win for the caller. Reaching it
/// does not stop the game.
pub const WINNING_VALUE: u32 = 2048;
/// Charges granted per power-up at the start of a game.
pub const STARTING_CHARGES: u32 = 3;

/// Remaining charges for each power-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUps {
    pub undo: u32,
    pub swap: u32,
    pub delete: u32,
}

impl Default for PowerUps {
    fn default() -> Self {
        Self {
            undo: STARTING_CHARGES,
            swap: STARTING_CHARGES,
            delete: STARTING_CHARGES,
        }
    }
}

/// Serializable snapshot of everything a client sees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub board: [[u32; 4]; 4],
    pub score: u64,
    pub game_over: bool,
    pub power_ups: PowerUps,
}

/// Why a power-up application was refused. The game is left untouched.
/// Messages are returned to API clients verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("No undo power-ups left")]
    NoUndoCharges,
    #[error("No moves to undo")]
    NothingToUndo,
    #[error("No swap power-ups left")]
    NoSwapCharges,
    #[error("Invalid positions")]
    InvalidSwapPositions,
    #[error("No delete power-ups left")]
    NoDeleteCharges,
    #[error("No tiles with number {0} found")]
    ValueNotOnBoard(u32),
}

/// The state retained for undo, captured right before a board-changing move.
#[derive(Clone, Copy, Debug)]
struct Snapshot {
    board: Board,
    score: u64,
    power_ups: PowerUps,
}

/// A single 2048 game.
pub struct Game {
    board: Board,
    score: u64,
    power_ups: PowerUps,
    game_over: bool,
    snapshot: Option<Snapshot>,
    rng: StdRng,
}

impl Game {
    /// Start a fresh game: two spawned tiles, score 0, full charges.
    pub fn with_seed(seed: u64) -> Self {
        engine::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let board = Board::EMPTY
            .with_random_tile(&mut rng)
            .with_random_tile(&mut rng);
        Self {
            board,
            score: 0,
            power_ups: PowerUps::default(),
            game_over: false,
            snapshot: None,
            rng,
        }
    }

    /// Rebuild a game from a serialized state. No undo history is retained,
    /// and `game_over` is recomputed from the board rather than trusted.
    pub fn from_state(state: &GameState, seed: u64) -> Self {
        engine::new();
        let board = Board::from_values(state.board);
        Self {
            board,
            score: state.score,
            power_ups: state.power_ups,
            game_over: board.is_game_over(),
            snapshot: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Slide/merge in `direction`. Returns whether the board changed.
    ///
    /// A changing move snapshots the pre-move state (replacing any earlier
    /// snapshot), adds the merge gain to the score, and spawns one tile. A
    /// move that changes nothing is a complete no-op: no snapshot, no
    /// spawn, no score change.
    pub fn make_move(&mut self, direction: Move) -> bool {
        let (shifted, gain) = self.board.shift_scored(direction);
        if shifted == self.board {
            return false;
        }
        self.snapshot = Some(Snapshot {
            board: self.board,
            score: self.score,
            power_ups: self.power_ups,
        });
        self.score += gain;
        self.board = shifted.with_random_tile(&mut self.rng);
        self.game_over = self.board.is_game_over();
        true
    }

    /// Restore the snapshotted pre-move state at the cost of one undo
    /// charge. Consuming the snapshot rolls back everything that happened
    /// since the move it precedes, including swap and delete charges spent
    /// after that move. Each snapshot can be undone once.
    pub fn undo(&mut self) -> Result<(), GameError> {
        if self.power_ups.undo == 0 {
            return Err(GameError::NoUndoCharges);
        }
        let snapshot = self.snapshot.take().ok_or(GameError::NothingToUndo)?;
        self.board = snapshot.board;
        self.score = snapshot.score;
        // The snapshot's undo count equals the current one: only a
        // successful undo decrements it, and that consumes the snapshot.
        self.power_ups = snapshot.power_ups;
        self.power_ups.undo -= 1;
        self.game_over = self.board.is_game_over();
        Ok(())
    }

    /// Exchange two cells (either may be empty) at the cost of one swap
    /// charge. Positions must be in bounds and distinct. The score and the
    /// undo snapshot are untouched.
    pub fn swap_tiles(
        &mut self,
        pos1: (usize, usize),
        pos2: (usize, usize),
    ) -> Result<(), GameError> {
        if self.power_ups.swap == 0 {
            return Err(GameError::NoSwapCharges);
        }
        if !in_bounds(pos1) || !in_bounds(pos2) || pos1 == pos2 {
            return Err(GameError::InvalidSwapPositions);
        }
        self.board = self.board.swap_cells(pos1, pos2);
        self.power_ups.swap -= 1;
        self.game_over = self.board.is_game_over();
        Ok(())
    }

    /// Clear every cell holding `value` at the cost of one delete charge.
    /// Returns how many cells were cleared. The score and the undo snapshot
    /// are untouched.
    pub fn delete_value(&mut self, value: u32) -> Result<u32, GameError> {
        if self.power_ups.delete == 0 {
            return Err(GameError::NoDeleteCharges);
        }
        let (board, cleared) = self.board.erase_value(value);
        if cleared == 0 {
            return Err(GameError::ValueNotOnBoard(value));
        }
        self.board = board;
        self.power_ups.delete -= 1;
        self.game_over = self.board.is_game_over();
        Ok(cleared)
    }

    /// Read-only win probe: is a tile with `WINNING_VALUE` on the board?
    pub fn has_winning_tile(&self) -> bool {
        self.board.contains_value(WINNING_VALUE)
    }

    /// Snapshot of the client-visible state.
    pub fn state(&self) -> GameState {
        GameState {
            board: self.board.values(),
            score: self.score,
            game_over: self.game_over,
            power_ups: self.power_ups,
        }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn power_ups(&self) -> PowerUps {
        self.power_ups
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }
}

fn in_bounds((row, col): (usize, usize)) -> bool {
    row < GRID_SIZE && col < GRID_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // A full board with no adjacent equal tiles in any row or column.
    const STUCK: [[u32; 4]; 4] = [
        [2, 4, 2, 4],
        [4, 2, 4, 2],
        [2, 4, 2, 4],
        [4, 2, 4, 2],
    ];

    fn game_with_board(board: [[u32; 4]; 4]) -> Game {
        Game::from_state(
            &GameState {
                board,
                score: 0,
                game_over: false,
                power_ups: PowerUps::default(),
            },
            99,
        )
    }

    fn nonzero_cells(game: &Game) -> usize {
        game.board().tiles().filter(|&exp| exp != 0).count()
    }

    #[test]
    fn new_game_has_two_starting_tiles() {
        let game = Game::with_seed(42);
        assert_eq!(nonzero_cells(&game), 2);
        assert!(game.board().tiles().all(|exp| exp <= 2));
        assert_eq!(game.score(), 0);
        assert!(!game.is_game_over());
        assert_eq!(game.power_ups(), PowerUps { undo: 3, swap: 3, delete: 3 });
    }

    #[test]
    fn same_seed_replays_identically() {
        let mut a = Game::with_seed(1234);
        let mut b = Game::with_seed(1234);
        for direction in [Move::Left, Move::Up, Move::Right, Move::Down, Move::Left] {
            assert_eq!(a.make_move(direction), b.make_move(direction));
            assert_eq!(a.state(), b.state());
        }
    }

    #[test]
    fn move_merges_scores_and_spawns() {
        let mut game = game_with_board([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(game.make_move(Move::Left));
        let state = game.state();
        assert_eq!(state.board[0][0], 4);
        assert_eq!(state.score, 4);
        // The merged tile plus exactly one spawned tile.
        assert_eq!(nonzero_cells(&game), 2);
    }

    #[test]
    fn noop_move_changes_nothing() {
        let mut game = game_with_board([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let before = game.state();
        assert!(!game.make_move(Move::Left));
        assert!(!game.make_move(Move::Up));
        assert_eq!(game.state(), before);
        // No snapshot was captured either.
        assert_eq!(game.undo(), Err(GameError::NothingToUndo));
    }

    #[test]
    fn undo_restores_the_previous_state_once() {
        let mut game = game_with_board([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]);
        let before = game.state();
        assert!(game.make_move(Move::Left));
        assert_ne!(game.state(), before);

        assert_eq!(game.undo(), Ok(()));
        let restored = game.state();
        assert_eq!(restored.board, before.board);
        assert_eq!(restored.score, before.score);
        assert_eq!(restored.power_ups.undo, 2);
        assert_eq!(restored.power_ups.swap, 3);
        assert_eq!(restored.power_ups.delete, 3);

        // The snapshot is consumed; a second undo has nothing to restore.
        assert_eq!(game.undo(), Err(GameError::NothingToUndo));
    }

    #[test]
    fn undo_rolls_back_power_ups_spent_after_the_move() {
        let mut game = game_with_board([[2, 2, 0, 0], [0; 4], [0; 4], [8, 0, 0, 4]]);
        let before = game.state();
        assert!(game.make_move(Move::Left));
        game.swap_tiles((3, 0), (0, 3)).unwrap();
        game.delete_value(8).unwrap();
        assert_eq!(game.power_ups().swap, 2);
        assert_eq!(game.power_ups().delete, 2);

        assert_eq!(game.undo(), Ok(()));
        let restored = game.state();
        assert_eq!(restored.board, before.board);
        assert_eq!(restored.score, before.score);
        // Swap and delete charges spent after the move come back.
        assert_eq!(restored.power_ups, PowerUps { undo: 2, swap: 3, delete: 3 });
    }

    #[test]
    fn undo_requires_charges() {
        let mut game = Game::from_state(
            &GameState {
                board: [[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]],
                score: 0,
                game_over: false,
                power_ups: PowerUps { undo: 0, swap: 3, delete: 3 },
            },
            5,
        );
        assert!(game.make_move(Move::Left));
        assert_eq!(game.undo(), Err(GameError::NoUndoCharges));
    }

    #[test]
    fn swap_exchanges_cells_without_scoring() {
        let mut game = game_with_board([[2, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 4]]);
        game.swap_tiles((0, 0), (3, 3)).unwrap();
        let state = game.state();
        assert_eq!(state.board[0][0], 4);
        assert_eq!(state.board[3][3], 2);
        assert_eq!(state.score, 0);
        assert_eq!(state.power_ups.swap, 2);
    }

    #[test]
    fn swap_with_an_empty_cell_moves_the_tile() {
        let mut game = game_with_board([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        game.swap_tiles((0, 0), (2, 2)).unwrap();
        let state = game.state();
        assert_eq!(state.board[0][0], 0);
        assert_eq!(state.board[2][2], 2);
    }

    #[test]
    fn swap_rejects_bad_positions() {
        let mut game = game_with_board([[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert_eq!(
            game.swap_tiles((1, 1), (1, 1)),
            Err(GameError::InvalidSwapPositions)
        );
        assert_eq!(
            game.swap_tiles((0, 0), (0, 4)),
            Err(GameError::InvalidSwapPositions)
        );
        assert_eq!(
            game.swap_tiles((4, 0), (0, 0)),
            Err(GameError::InvalidSwapPositions)
        );
        // Failures cost nothing.
        assert_eq!(game.power_ups().swap, 3);
    }

    #[test]
    fn swap_requires_charges() {
        let mut game = Game::from_state(
            &GameState {
                board: [[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]],
                score: 0,
                game_over: false,
                power_ups: PowerUps { undo: 3, swap: 0, delete: 3 },
            },
            5,
        );
        assert_eq!(game.swap_tiles((0, 0), (0, 1)), Err(GameError::NoSwapCharges));
    }

    #[test]
    fn delete_clears_every_matching_tile() {
        let mut game = game_with_board([[4, 2, 4, 0], [0, 4, 0, 0], [0; 4], [0; 4]]);
        assert_eq!(game.delete_value(4), Ok(3));
        let state = game.state();
        assert_eq!(state.board[0], [0, 2, 0, 0]);
        assert_eq!(state.board[1], [0; 4]);
        assert_eq!(state.score, 0);
        assert_eq!(state.power_ups.delete, 2);
    }

    #[test]
    fn delete_of_absent_value_fails_without_cost() {
        let mut game = game_with_board([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let before = game.state();
        assert_eq!(game.delete_value(64), Err(GameError::ValueNotOnBoard(64)));
        assert_eq!(game.state(), before);
    }

    #[test]
    fn delete_requires_charges() {
        let mut game = Game::from_state(
            &GameState {
                board: [[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]],
                score: 0,
                game_over: false,
                power_ups: PowerUps { undo: 3, swap: 3, delete: 0 },
            },
            5,
        );
        assert_eq!(game.delete_value(2), Err(GameError::NoDeleteCharges));
    }

    #[test]
    fn delete_can_empty_the_board_without_ending_the_game() {
        let mut game = game_with_board([[2, 0, 0, 0], [0, 2, 0, 0], [0; 4], [0; 4]]);
        assert_eq!(game.delete_value(2), Ok(2));
        assert!(!game.is_game_over());
        assert_eq!(nonzero_cells(&game), 0);
        // With nothing to slide, every direction is a no-op.
        for direction in Move::ALL {
            assert!(!game.make_move(direction));
        }
    }

    #[test]
    fn stuck_board_is_game_over_until_a_power_up_frees_it() {
        let mut game = game_with_board(STUCK);
        assert!(game.is_game_over());

        // Swapping two tiles can line up a merge and revive the game.
        game.swap_tiles((0, 0), (0, 1)).unwrap();
        assert!(!game.is_game_over());
    }

    #[test]
    fn delete_revives_a_stuck_board() {
        let mut game = game_with_board(STUCK);
        assert!(game.is_game_over());
        assert_eq!(game.delete_value(2), Ok(8));
        assert!(!game.is_game_over());
    }

    #[test]
    fn win_probe_matches_exact_tile() {
        let game = game_with_board([[2048, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(game.has_winning_tile());
        let game = game_with_board([[4096, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(!game.has_winning_tile());
    }

    #[test]
    fn state_serializes_with_the_wire_field_names() {
        let game = game_with_board([[2, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 4]]);
        let value = serde_json::to_value(game.state()).unwrap();
        assert_eq!(
            value,
            json!({
                "board": [
                    [2, 0, 0, 0],
                    [0, 0, 0, 0],
                    [0, 0, 0, 0],
                    [0, 0, 0, 4],
                ],
                "score": 0,
                "game_over": false,
                "power_ups": { "undo": 3, "swap": 3, "delete": 3 },
            })
        );
    }

    #[test]
    fn moves_deserialize_from_lowercase_tokens() {
        for (token, want) in [
            ("\"up\"", Move::Up),
            ("\"down\"", Move::Down),
            ("\"left\"", Move::Left),
            ("\"right\"", Move::Right),
        ] {
            assert_eq!(serde_json::from_str::<Move>(token).unwrap(), want);
        }
        assert!(serde_json::from_str::<Move>("\"Up\"").is_err());
        assert!(serde_json::from_str::<Move>("\"north\"").is_err());
    }
}
