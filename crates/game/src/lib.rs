//! memo-game – Spielbrett-Modell
//!
//! Das Brett kennt nur Kartenwerte, Zellenzustaende und die aufgedeckten
//! Positionen. Spieler, Zugreihenfolge und Punkte verwaltet der
//! Session-Manager in `memo-signaling`.

pub mod board;

pub use board::{Board, ZellenZustand};
