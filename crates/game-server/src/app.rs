use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use rand::Rng;
use tracing::info;

use twenty48_core::game::{Game, GameState};

/// Shared handle the route handlers clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<GameStore>,
}

impl AppState {
    pub fn new(max_games: usize) -> Self {
        Self {
            store: Arc::new(GameStore::new(max_games)),
        }
    }
}

/// One live session: the game plus its creation time for eviction.
struct Session {
    game: Arc<Mutex<Game>>,
    created_at: Instant,
}

/// In-memory session store keyed by 7-digit game id.
///
/// The map lock is only held to look up or insert sessions; each game's own
/// mutex serializes play on that game, so distinct games never contend. A
/// handler holding a session keeps it alive even if eviction unlinks the id
/// concurrently.
pub struct GameStore {
    games: RwLock<HashMap<String, Session>>,
    capacity: usize,
}

/// What `create` hands back: the id, the spawn seed (for log correlation),
/// and the initial state.
pub struct CreatedGame {
    pub game_id: String,
    pub seed: u64,
    pub state: GameState,
}

impl GameStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Create a new game under a fresh random id, evicting the oldest
    /// session when the store is full.
    pub fn create(&self) -> CreatedGame {
        let mut rng = rand::thread_rng();
        let seed: u64 = rng.gen();
        let game = Game::with_seed(seed);
        let state = game.state();

        let mut games = self.games.write();
        if games.len() >= self.capacity {
            let oldest = games
                .iter()
                .min_by_key(|(_, session)| session.created_at)
                .map(|(game_id, _)| game_id.clone());
            if let Some(game_id) = oldest {
                games.remove(&game_id);
                info!("evicted oldest session" = %game_id);
            }
        }

        let game_id = loop {
            let candidate = rng.gen_range(1_000_000u32..10_000_000).to_string();
            if !games.contains_key(&candidate) {
                break candidate;
            }
        };
        games.insert(
            game_id.clone(),
            Session {
                game: Arc::new(Mutex::new(game)),
                created_at: Instant::now(),
            },
        );
        CreatedGame {
            game_id,
            seed,
            state,
        }
    }

    /// Handle to one game; `None` when the id is unknown (or evicted).
    pub fn get(&self, game_id: &str) -> Option<Arc<Mutex<Game>>> {
        self.games
            .read()
            .get(game_id)
            .map(|session| session.game.clone())
    }

    /// Number of live sessions.
    pub fn active_games(&self) -> usize {
        self.games.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_seven_digit_ids() {
        let store = GameStore::new(32);
        for _ in 0..20 {
            let created = store.create();
            assert_eq!(created.game_id.len(), 7);
            assert!(created.game_id.chars().all(|c| c.is_ascii_digit()));
            assert!(!created.game_id.starts_with('0'));
        }
        assert_eq!(store.active_games(), 20);
    }

    #[test]
    fn created_games_start_fresh() {
        let store = GameStore::new(8);
        let created = store.create();
        assert_eq!(created.state.score, 0);
        assert!(!created.state.game_over);
        let tiles: usize = created
            .state
            .board
            .iter()
            .flatten()
            .filter(|&&cell| cell != 0)
            .count();
        assert_eq!(tiles, 2);
    }

    #[test]
    fn get_returns_the_stored_game() {
        let store = GameStore::new(8);
        let created = store.create();
        let game = store.get(&created.game_id).unwrap();
        assert_eq!(game.lock().state(), created.state);
        assert!(store.get("0000000").is_none());
    }

    #[test]
    fn capacity_evicts_the_oldest_session() {
        let store = GameStore::new(1);
        let first = store.create();
        let second = store.create();
        assert_eq!(store.active_games(), 1);
        assert!(store.get(&first.game_id).is_none());
        assert!(store.get(&second.game_id).is_some());
    }
}
