//! Gemeinsamer Server-Zustand fuer den Spiel-Service
//!
//! Haelt Broadcaster und Session-Manager, die sicher zwischen tokio-Tasks
//! geteilt werden koennen.

use std::sync::Arc;
use std::time::{Duration, Instant};

use memo_core::AUFDECK_VERZOEGERUNG;
use memo_game::Board;
use memo_protocol::wire::DEFAULT_MAX_ZEILEN_LAENGE;

use crate::broadcast::{EventBroadcaster, SEND_QUEUE_GROESSE};
use crate::manager::SessionManager;
use crate::session::BrettErzeuger;

/// Konfiguration fuer den Spiel-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Maximale Laenge einer eingehenden Zeile in Bytes
    pub max_zeilen_laenge: usize,
    /// Groesse der Send-Queue pro Verbindung
    pub send_queue_groesse: usize,
    /// Pause zwischen dem zweiten Aufdecken und der Auswertung
    pub aufdeck_verzoegerung: Duration,
    /// Erzeugt das Brett jeder neuen Partie
    pub brett_erzeuger: BrettErzeuger,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            server_name: "Memo Server".to_string(),
            max_zeilen_laenge: DEFAULT_MAX_ZEILEN_LAENGE,
            send_queue_groesse: SEND_QUEUE_GROESSE,
            aufdeck_verzoegerung: AUFDECK_VERZOEGERUNG,
            brett_erzeuger: Board::neu,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SignalingState {
    /// Server-Konfiguration
    pub config: Arc<SignalingConfig>,
    /// Send-Queues aller offenen Verbindungen
    pub broadcaster: EventBroadcaster,
    /// Die eine Spielsitzung des Servers
    pub sessions: SessionManager,
    /// Startzeitpunkt des Servers (fuer Uptime-Berechnung)
    pub start_time: Instant,
}

impl SignalingState {
    /// Erstellt einen neuen SignalingState
    pub fn neu(config: SignalingConfig) -> Arc<Self> {
        let broadcaster = EventBroadcaster::mit_queue_groesse(config.send_queue_groesse);
        let sessions = SessionManager::mit_optionen(
            broadcaster.clone(),
            config.brett_erzeuger,
            config.aufdeck_verzoegerung,
        );

        Arc::new(Self {
            config: Arc::new(config),
            broadcaster,
            sessions,
            start_time: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
