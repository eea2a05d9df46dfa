//! memo-core – Gemeinsame Typen, Konstanten und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Memo-Crates gemeinsam genutzt werden.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{MemoError, MemoResult};
pub use types::{
    ConnectionId, AUFDECK_VERZOEGERUNG, BRETT_GROESSE, MAX_SPIELER, MIN_SPIELER, PAAR_ANZAHL,
    ZELLEN_ANZAHL,
};
