//! Fehlertypen fuer den Memo-Server
//!
//! Jeder Fehler betrifft genau eine Verbindung bzw. eine Nachricht. Kein
//! Variant darf den Server als Ganzes beenden; einzig ein fehlgeschlagenes
//! Binden des Ports beim Start ist fatal (siehe `memo-server`).

use thiserror::Error;

/// Result-Alias fuer den Memo-Server
pub type MemoResult<T> = std::result::Result<T, MemoError>;

/// Alle moeglichen Fehler im Memo-System
#[derive(Debug, Error)]
pub enum MemoError {
    // --- Protokoll ---
    /// Zeile nicht dekodierbar (leer, unbekannter oder nicht-numerischer Typ)
    #[error("Protokoll nicht dekodierbar: {0}")]
    ProtokollDekodierung(String),

    /// Zahlenfeld (z.B. Kartenposition) nicht numerisch
    #[error("Ungueltiges Zahlenformat: {0}")]
    ZahlFormat(String),

    // --- Spiellogik ---
    /// Maximale Spieleranzahl erreicht
    #[error("Maximale Spieleranzahl erreicht ({max})")]
    KapazitaetErreicht { max: usize },

    /// Zug nicht erlaubt (falscher Spieler, Position, zwei Karten offen ...)
    #[error("{0}")]
    UngueltigerZug(String),

    // --- Verbindung ---
    /// Verbindung fehlerhaft oder vom Peer geschlossen
    #[error("Verbindungsfehler: {0}")]
    Verbindung(String),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

impl MemoError {
    /// Erstellt einen Zug-Fehler
    pub fn zug(msg: impl Into<String>) -> Self {
        Self::UngueltigerZug(msg.into())
    }

    /// Erstellt einen Dekodierfehler
    pub fn dekodierung(msg: impl Into<String>) -> Self {
        Self::ProtokollDekodierung(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler als ERROR-Nachricht an den
    /// Ausloeser gemeldet wird
    ///
    /// Dekodier- und Zahlenfehler werden nur geloggt und verworfen.
    pub fn an_client_melden(&self) -> bool {
        matches!(
            self,
            Self::KapazitaetErreicht { .. } | Self::UngueltigerZug(_)
        )
    }

    /// Gibt true zurueck wenn der Fehler die Verbindung beendet
    pub fn trennt_verbindung(&self) -> bool {
        matches!(
            self,
            Self::KapazitaetErreicht { .. } | Self::Verbindung(_) | Self::Io(_)
        )
    }
}
