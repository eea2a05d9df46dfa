//! Inhalt der GAME_STATE-Nachricht
//!
//! Der Spielzustand wird als feste, getaggte Struktur mit serde_json
//! serialisiert. Clients muessen den Text nie per Muster zerlegen.
//!
//! ```json
//! {
//!   "board": {"0": "hidden", "1": "opened_7", "2": "matched", ...},
//!   "scores": {"Ann": 1, "Bo": 0},
//!   "players": ["Ann", "Bo"],
//!   "currentPlayer": "Ann",
//!   "gameStarted": true,
//!   "gameOver": false,
//!   "openedCards": [1],
//!   "minPlayers": 2,
//!   "maxPlayers": 4
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::message::Message;

// ---------------------------------------------------------------------------
// ZellenAnsicht
// ---------------------------------------------------------------------------

/// Sicht eines Clients auf eine einzelne Zelle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZellenAnsicht {
    /// Verdeckt
    Verdeckt,
    /// Paar bereits gefunden
    Gefunden,
    /// Aufgedeckt, aber noch nicht ausgewertet (mit Kartenwert)
    Offen(u8),
}

impl fmt::Display for ZellenAnsicht {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verdeckt => f.write_str("hidden"),
            Self::Gefunden => f.write_str("matched"),
            Self::Offen(wert) => write!(f, "opened_{wert}"),
        }
    }
}

impl FromStr for ZellenAnsicht {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hidden" => Ok(Self::Verdeckt),
            "matched" => Ok(Self::Gefunden),
            _ => s
                .strip_prefix("opened_")
                .and_then(|wert| wert.parse().ok())
                .map(Self::Offen)
                .ok_or_else(|| format!("Unbekannter Zellenzustand: {s}")),
        }
    }
}

impl Serialize for ZellenAnsicht {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ZellenAnsicht {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SpielZustand
// ---------------------------------------------------------------------------

/// Vollstaendiger Schnappschuss des Spielzustands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpielZustand {
    /// Zellenindex -> Sicht
    pub board: BTreeMap<usize, ZellenAnsicht>,
    /// Spielername -> Punkte
    pub scores: BTreeMap<String, u32>,
    /// Spielernamen in Beitrittsreihenfolge
    pub players: Vec<String>,
    /// Spieler am Zug (None vor dem Start und nach einem Reset)
    pub current_player: Option<String>,
    pub game_started: bool,
    pub game_over: bool,
    /// Aufgedeckte, noch nicht ausgewertete Positionen
    pub opened_cards: Vec<usize>,
    pub min_players: usize,
    pub max_players: usize,
}

impl SpielZustand {
    /// Serialisiert den Zustand als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert einen Zustand aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Verpackt den Zustand als GAME_STATE-Nachricht
    pub fn als_nachricht(&self) -> serde_json::Result<Message> {
        Ok(Message::game_state(self.to_json()?))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
