//! Gemeinsame Identifikationstypen und Spielkonstanten
//!
//! IDs verwenden das Newtype-Pattern um Verwechslungen zur Compilezeit
//! auszuschliessen. Die Spielkonstanten sind fest: 6x6-Brett, 2–4 Spieler.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Spielkonstanten
// ---------------------------------------------------------------------------

/// Kantenlaenge des quadratischen Spielbretts
pub const BRETT_GROESSE: usize = 6;

/// Anzahl der Zellen auf dem Brett (Index 0..36)
pub const ZELLEN_ANZAHL: usize = BRETT_GROESSE * BRETT_GROESSE;

/// Anzahl der Kartenpaare (Kartenwerte 1..=18)
pub const PAAR_ANZAHL: u8 = (ZELLEN_ANZAHL / 2) as u8;

/// Mindestanzahl Spieler fuer den Spielstart
pub const MIN_SPIELER: usize = 2;

/// Maximale Anzahl gleichzeitiger Spieler
pub const MAX_SPIELER: usize = 4;

/// Pause zwischen dem zweiten Aufdecken und der Auswertung des Paars
pub const AUFDECK_VERZOEGERUNG: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// ConnectionId
// ---------------------------------------------------------------------------

/// Eindeutige ID einer TCP-Verbindung
///
/// Wird vom Listener beim Accept vergeben. Registry und Broadcaster
/// referenzieren die Verbindung nur ueber diese ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}
