//! Event-Broadcaster – Sendet Nachrichten an einzelne oder alle Spieler
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller offenen
//! Verbindungen. Jede `ClientConnection` liest ihre Queue und schreibt auf
//! den Socket; Senden ist daher nie blockierend.
//!
//! ## Fehlerverhalten
//! Ist eine Queue voll oder geschlossen, wird der Sender entfernt und sein
//! Trenn-Signal ausgeloest. Die `ClientConnection` bricht daraufhin auch
//! einen haengenden Schreibvorgang ab und laeuft durch den normalen
//! Trennungs-Pfad. Andere Empfaenger sind nicht betroffen, der Aufrufer
//! bekommt keinen Fehler.

use dashmap::DashMap;
use memo_core::ConnectionId;
use memo_protocol::{Message, SpielZustand};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Standardgroesse der Send-Queue pro Verbindung
pub const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer Verbindung
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub verbindung: ConnectionId,
    pub tx: mpsc::Sender<Message>,
    /// Wird beim Entfernen ausgeloest und beendet den Verbindungs-Task
    pub trennen: CancellationToken,
}

/// Empfangsseite einer registrierten Verbindung
#[derive(Debug)]
pub struct SendeQueue {
    pub rx: mpsc::Receiver<Message>,
    pub trennen: CancellationToken,
}

impl ClientSender {
    /// Reiht eine Nachricht nicht-blockierend ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, nachricht: Message) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %self.verbindung, "Send-Queue voll – Verbindung wird getrennt");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.verbindung, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Broadcaster fuer alle offenen Verbindungen
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Sender aller offenen Verbindungen (auch noch nicht beigetretener)
    clients: DashMap<ConnectionId, ClientSender>,
    queue_groesse: usize,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster mit Standard-Queuegroesse
    pub fn neu() -> Self {
        Self::mit_queue_groesse(SEND_QUEUE_GROESSE)
    }

    /// Erstellt einen EventBroadcaster mit eigener Queuegroesse pro Verbindung
    pub fn mit_queue_groesse(queue_groesse: usize) -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                queue_groesse: queue_groesse.max(1),
            }),
        }
    }

    /// Registriert eine Verbindung und gibt Queue und Trenn-Signal zurueck
    ///
    /// Die `ClientConnection` liest aus der Queue, schreibt via TCP und
    /// beendet sich sobald das Trenn-Signal ausgeloest wird.
    pub fn verbindung_anmelden(&self, verbindung: ConnectionId) -> SendeQueue {
        let (tx, rx) = mpsc::channel(self.inner.queue_groesse);
        let trennen = CancellationToken::new();
        self.inner.clients.insert(
            verbindung,
            ClientSender {
                verbindung,
                tx,
                trennen: trennen.clone(),
            },
        );
        tracing::debug!(verbindung = %verbindung, "Verbindung im Broadcaster registriert");
        SendeQueue { rx, trennen }
    }

    /// Registriert eine Verbindung und gibt nur ihre Empfangs-Queue zurueck
    pub fn verbindung_registrieren(&self, verbindung: ConnectionId) -> mpsc::Receiver<Message> {
        self.verbindung_anmelden(verbindung).rx
    }

    /// Entfernt eine Verbindung, schliesst ihre Queue und loest ihr
    /// Trenn-Signal aus
    pub fn verbindung_entfernen(&self, verbindung: &ConnectionId) {
        if let Some((_, sender)) = self.inner.clients.remove(verbindung) {
            sender.trennen.cancel();
            tracing::debug!(verbindung = %verbindung, "Verbindung aus Broadcaster entfernt");
        }
    }

    /// Sendet eine Nachricht an eine einzelne Verbindung (best effort)
    ///
    /// Gibt `true` zurueck wenn die Nachricht eingereiht wurde.
    pub fn an_verbindung_senden(&self, verbindung: &ConnectionId, nachricht: Message) -> bool {
        let gesendet = match self.inner.clients.get(verbindung) {
            Some(sender) => sender.senden(nachricht),
            None => {
                tracing::debug!(verbindung = %verbindung, "Senden an unbekannte Verbindung");
                return false;
            }
        };
        if !gesendet {
            self.verbindung_entfernen(verbindung);
        }
        gesendet
    }

    /// Sendet eine Nachricht an alle uebergebenen Empfaenger
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck. Fehlgeschlagene
    /// Empfaenger werden erst nach der Iteration entfernt.
    pub fn an_alle_senden(&self, empfaenger: &[ConnectionId], nachricht: &Message) -> usize {
        let mut gesendet = 0;
        let mut fehlgeschlagen = Vec::new();

        for verbindung in empfaenger {
            match self.inner.clients.get(verbindung) {
                Some(sender) => {
                    if sender.senden(nachricht.clone()) {
                        gesendet += 1;
                    } else {
                        fehlgeschlagen.push(*verbindung);
                    }
                }
                None => {
                    tracing::debug!(verbindung = %verbindung, "Empfaenger ohne Send-Queue");
                }
            }
        }

        for verbindung in &fehlgeschlagen {
            self.verbindung_entfernen(verbindung);
        }
        gesendet
    }

    /// Serialisiert einen Spielzustand und sendet ihn als GAME_STATE an alle
    /// uebergebenen Empfaenger
    pub fn spielzustand_senden(&self, empfaenger: &[ConnectionId], zustand: &SpielZustand) -> usize {
        match zustand.als_nachricht() {
            Ok(nachricht) => self.an_alle_senden(empfaenger, &nachricht),
            Err(e) => {
                tracing::error!(fehler = %e, "Spielzustand nicht serialisierbar");
                0
            }
        }
    }

    /// Gibt die Anzahl der offenen Verbindungen zurueck
    pub fn verbindungs_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_registriert(&self, verbindung: &ConnectionId) -> bool {
        self.inner.clients.contains_key(verbindung)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
