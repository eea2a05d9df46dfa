//! Session-Manager – Geteilter Zugriff auf die Spielsitzung
//!
//! Verbindungs-Tasks und Aufdeck-Timer greifen auf dieselbe `GameSession`
//! zu. Jede Zustandsaenderung laeuft unter einem einzigen
//! `parking_lot::Mutex`, der nie ueber ein `.await` gehalten wird.
//!
//! Der Aufdeck-Timer ist ein eigener tokio-Task, der nach der
//! Verzoegerung die Sitzung sperrt und den Auftrag auswertet. Timer werden
//! nie abgebrochen; ein zwischenzeitlicher Reset macht den Auftrag ueber
//! die Epoche wirkungslos.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use memo_core::{ConnectionId, MemoResult, AUFDECK_VERZOEGERUNG};
use memo_protocol::SpielZustand;

use crate::broadcast::EventBroadcaster;
use crate::registry::PlayerRegistry;
use crate::session::{AufdeckAuftrag, BrettErzeuger, GameSession};

/// Thread-sicherer Zugriff auf die eine Spielsitzung des Servers
///
/// Clone teilt die Sitzung.
#[derive(Clone)]
pub struct SessionManager {
    session: Arc<Mutex<GameSession>>,
    /// Geteilte Registry der Sitzung, lesbar ohne den Sitzungs-Mutex
    registry: PlayerRegistry,
    aufdeck_verzoegerung: Duration,
}

impl SessionManager {
    /// Erstellt einen Manager mit zufaelligen Brettern und 2 s Verzoegerung
    pub fn neu(broadcaster: EventBroadcaster) -> Self {
        Self::mit_session(GameSession::neu(broadcaster), AUFDECK_VERZOEGERUNG)
    }

    /// Erstellt einen Manager mit eigenem Brett-Erzeuger und eigener Verzoegerung
    pub fn mit_optionen(
        broadcaster: EventBroadcaster,
        brett_erzeuger: BrettErzeuger,
        aufdeck_verzoegerung: Duration,
    ) -> Self {
        Self::mit_session(
            GameSession::mit_brett_erzeuger(broadcaster, brett_erzeuger),
            aufdeck_verzoegerung,
        )
    }

    fn mit_session(session: GameSession, aufdeck_verzoegerung: Duration) -> Self {
        Self {
            registry: session.registry().clone(),
            session: Arc::new(Mutex::new(session)),
            aufdeck_verzoegerung,
        }
    }

    pub fn spieler_beitreten(&self, verbindung: ConnectionId, name: &str) -> MemoResult<()> {
        self.session.lock().spieler_beitreten(verbindung, name)
    }

    pub fn spiel_starten(&self, verbindung: &ConnectionId) -> MemoResult<()> {
        self.session.lock().spiel_starten(verbindung)
    }

    /// Deckt eine Karte auf und plant bei vollstaendigem Paar die Auswertung
    ///
    /// Muss innerhalb einer tokio-Runtime aufgerufen werden.
    pub fn karte_oeffnen(&self, verbindung: &ConnectionId, position: &str) -> MemoResult<()> {
        let auftrag = self.session.lock().karte_oeffnen(verbindung, position)?;
        if let Some(auftrag) = auftrag {
            self.aufdeckung_planen(auftrag);
        }
        Ok(())
    }

    pub fn reset_anfordern(&self, verbindung: &ConnectionId) {
        self.session.lock().reset_anfordern(verbindung);
    }

    pub fn spieler_getrennt(&self, verbindung: &ConnectionId) {
        self.session.lock().spieler_getrennt(verbindung);
    }

    fn aufdeckung_planen(&self, auftrag: AufdeckAuftrag) {
        let session = Arc::clone(&self.session);
        let verzoegerung = self.aufdeck_verzoegerung;

        tracing::debug!(epoch = auftrag.epoch, ?verzoegerung, "Aufdeckung geplant");

        tokio::spawn(async move {
            tokio::time::sleep(verzoegerung).await;
            let ergebnis = session.lock().aufdeckung_auswerten(auftrag);
            tracing::trace!(?ergebnis, "Aufdeck-Timer abgelaufen");
        });
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    pub fn zustand(&self) -> SpielZustand {
        self.session.lock().zustand()
    }

    pub fn spieleranzahl(&self) -> usize {
        self.registry.anzahl()
    }

    /// Registrierte Spieler; Lesen sperrt die Sitzung nicht
    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn epoch(&self) -> u64 {
        self.session.lock().epoch()
    }

    #[cfg(test)]
    pub(crate) fn sitzung_sperren(&self) -> parking_lot::MutexGuard<'_, GameSession> {
        self.session.lock()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
