//! Message-Dispatcher – Routet eingehende Zeilen an die Spielsitzung
//!
//! Der Dispatcher empfaengt die dekodierten Zeilen einer `ClientConnection`,
//! bestimmt den Nachrichtentyp und ruft den passenden Handler des
//! `SessionManager` auf. Chat laeuft an der Sitzung vorbei: Absendername
//! und Empfaenger kommen direkt aus der Registry.
//!
//! ## Fehlerbehandlung
//! - Unbekannte, fehlerhafte oder nur vom Server gesendete Typen werden
//!   geloggt und verworfen
//! - Spielregel-Verstoesse gehen als ERROR an den Ausloeser
//! - Kapazitaetsfehler trennen zusaetzlich die Verbindung

use std::sync::Arc;

use memo_core::{ConnectionId, MemoError, MemoResult};
use memo_protocol::{Message, MessageType};

use crate::server_state::SignalingState;

/// Wie die Verbindung nach einer Nachricht weitermacht
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steuerung {
    Weiter,
    Trennen,
}

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher {
    state: Arc<SignalingState>,
}

impl MessageDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Verarbeitet eine eingehende Zeile
    pub fn dispatch(&self, verbindung: ConnectionId, zeile: &str) -> Steuerung {
        let nachricht = match Message::parse(zeile) {
            Ok(nachricht) => nachricht,
            Err(e) => {
                tracing::warn!(verbindung = %verbindung, fehler = %e, "Nachricht verworfen");
                return Steuerung::Weiter;
            }
        };

        if !nachricht.typ.vom_client_erlaubt() {
            tracing::debug!(
                verbindung = %verbindung,
                typ = ?nachricht.typ,
                "Nachrichtentyp vom Client nicht erlaubt"
            );
            return Steuerung::Weiter;
        }

        match self.weiterleiten(verbindung, &nachricht) {
            Ok(()) => Steuerung::Weiter,
            Err(e) => self.fehler_behandeln(verbindung, e),
        }
    }

    fn weiterleiten(&self, verbindung: ConnectionId, nachricht: &Message) -> MemoResult<()> {
        let sessions = &self.state.sessions;

        match nachricht.typ {
            MessageType::Connect => match nachricht.feld(0) {
                Some(name) => sessions.spieler_beitreten(verbindung, name),
                None => Err(MemoError::dekodierung("CONNECT ohne Namen")),
            },
            MessageType::StartGame => sessions.spiel_starten(&verbindung),
            MessageType::CardOpen => match nachricht.feld(0) {
                Some(position) => sessions.karte_oeffnen(&verbindung, position),
                None => Err(MemoError::ZahlFormat("CARD_OPEN ohne Position".into())),
            },
            MessageType::Chat => match nachricht.feld(0) {
                Some(text) => {
                    self.chat_senden(&verbindung, text);
                    Ok(())
                }
                None => Err(MemoError::dekodierung("CHAT ohne Text")),
            },
            MessageType::GameReset => {
                sessions.reset_anfordern(&verbindung);
                Ok(())
            }
            andere => Err(MemoError::dekodierung(format!(
                "Typ {andere:?} wird nicht verarbeitet"
            ))),
        }
    }

    /// Stempelt den Absendernamen und verteilt an alle Spieler
    fn chat_senden(&self, verbindung: &ConnectionId, text: &str) {
        let registry = self.state.sessions.registry();
        let absender = registry.name(verbindung);
        tracing::debug!(verbindung = %verbindung, absender = %absender, "Chat-Nachricht");
        self.state
            .broadcaster
            .an_alle_senden(&registry.verbindungen(), &Message::chat(absender, text));
    }

    fn fehler_behandeln(&self, verbindung: ConnectionId, fehler: MemoError) -> Steuerung {
        if fehler.an_client_melden() {
            tracing::debug!(verbindung = %verbindung, fehler = %fehler, "Anfrage abgelehnt");
            self.state
                .broadcaster
                .an_verbindung_senden(&verbindung, Message::error(fehler.to_string()));
        } else {
            tracing::warn!(verbindung = %verbindung, fehler = %fehler, "Nachricht verworfen");
        }

        if fehler.trennt_verbindung() {
            Steuerung::Trennen
        } else {
            Steuerung::Weiter
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
