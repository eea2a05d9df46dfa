//! Spieler-Registry – Wer spielt mit, in welcher Reihenfolge
//!
//! Zwei konsistente Sichten auf dieselben Daten:
//! - Name pro Verbindung (Standard `"Unknown"`)
//! - Verbindungen in Beitrittsreihenfolge (= Zugreihenfolge)
//!
//! Bei hoechstens vier Spielern sind lineare Suchen voellig ausreichend.
//!
//! Die Registry ist intern synchronisiert und wird per Clone geteilt: die
//! `GameSession` aendert sie unter ihrem Mutex, der Chat liest Namen und
//! Empfaenger direkt, ohne die Sitzung zu sperren.

use memo_core::ConnectionId;
use parking_lot::RwLock;
use std::sync::Arc;

/// Name fuer Verbindungen ohne registrierten Spieler
pub const UNBEKANNTER_NAME: &str = "Unknown";

/// Eintrag eines registrierten Spielers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpielerEintrag {
    pub verbindung: ConnectionId,
    pub name: String,
}

/// Registrierte Spieler in Beitrittsreihenfolge
///
/// Clone teilt die Eintraege.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    eintraege: Arc<RwLock<Vec<SpielerEintrag>>>,
}

impl PlayerRegistry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert einen Spieler
    ///
    /// Idempotent pro Verbindung: ein erneutes Hinzufuegen aktualisiert nur
    /// den Namen, die Position in der Reihenfolge bleibt erhalten.
    pub fn hinzufuegen(&self, verbindung: ConnectionId, name: impl Into<String>) {
        let name = name.into();
        let mut eintraege = self.eintraege.write();
        match eintraege.iter_mut().find(|e| e.verbindung == verbindung) {
            Some(eintrag) => eintrag.name = name,
            None => eintraege.push(SpielerEintrag { verbindung, name }),
        }
    }

    /// Entfernt einen Spieler aus beiden Sichten und gibt seinen Namen zurueck
    pub fn entfernen(&self, verbindung: &ConnectionId) -> Option<String> {
        let mut eintraege = self.eintraege.write();
        let index = eintraege.iter().position(|e| &e.verbindung == verbindung)?;
        Some(eintraege.remove(index).name)
    }

    /// Name eines Spielers, `"Unknown"` wenn nicht registriert
    pub fn name(&self, verbindung: &ConnectionId) -> String {
        self.eintraege
            .read()
            .iter()
            .find(|e| &e.verbindung == verbindung)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| UNBEKANNTER_NAME.to_string())
    }

    /// Prueft ob eine Verbindung als Spieler registriert ist
    pub fn enthaelt(&self, verbindung: &ConnectionId) -> bool {
        self.index_von(verbindung).is_some()
    }

    /// Position in der Beitrittsreihenfolge
    pub fn index_von(&self, verbindung: &ConnectionId) -> Option<usize> {
        self.eintraege
            .read()
            .iter()
            .position(|e| &e.verbindung == verbindung)
    }

    /// Eintrag an einer Position der Beitrittsreihenfolge
    pub fn eintrag_an(&self, index: usize) -> Option<SpielerEintrag> {
        self.eintraege.read().get(index).cloned()
    }

    /// Alle Verbindungen in Beitrittsreihenfolge
    pub fn verbindungen(&self) -> Vec<ConnectionId> {
        self.eintraege.read().iter().map(|e| e.verbindung).collect()
    }

    /// Alle Namen in Beitrittsreihenfolge
    pub fn namen(&self) -> Vec<String> {
        self.eintraege.read().iter().map(|e| e.name.clone()).collect()
    }

    /// Kopie aller Eintraege in Beitrittsreihenfolge
    pub fn eintraege(&self) -> Vec<SpielerEintrag> {
        self.eintraege.read().clone()
    }

    pub fn anzahl(&self) -> usize {
        self.eintraege.read().len()
    }

    pub fn ist_leer(&self) -> bool {
        self.eintraege.read().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
