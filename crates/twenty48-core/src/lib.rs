//! Core 2048 rules: the packed board engine and the game state machine
//! (score, power-ups, undo) built on top of it.
//!
//! The `engine` module is pure board math; `game` owns everything a running
//! session needs. Callers embedding a game loop usually only touch
//! [`game::Game`] and [`engine::Move`].

pub mod engine;
pub mod game;
