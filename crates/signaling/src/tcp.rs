//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `GameServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task mit einer
//! `ClientConnection`. Sind bereits alle Plaetze belegt, bekommt der Client
//! eine ERROR-Zeile und die Verbindung wird sofort geschlossen.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

use memo_core::{ConnectionId, MemoError, MemoResult, MAX_SPIELER};
use memo_protocol::{wire::write_zeile, Message};

use crate::connection::ClientConnection;
use crate::server_state::SignalingState;

/// TCP-Spielserver
pub struct GameServer {
    state: Arc<SignalingState>,
    listener: TcpListener,
}

impl GameServer {
    /// Bindet den Listener an `bind_addr`
    ///
    /// Port 0 waehlt einen freien Port, siehe [`GameServer::lokale_adresse`].
    pub async fn binden(state: Arc<SignalingState>, bind_addr: SocketAddr) -> MemoResult<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        Ok(Self { state, listener })
    }

    /// Tatsaechlich gebundene Adresse
    pub fn lokale_adresse(&self) -> MemoResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Akzeptiert Verbindungen bis `shutdown_rx` ein `true`-Signal empfaengt
    pub async fn starten(self, mut shutdown_rx: watch::Receiver<bool>) -> MemoResult<()> {
        tracing::info!(
            adresse = %self.lokale_adresse()?,
            server = %self.state.config.server_name,
            "TCP Spielserver gestartet"
        );

        loop {
            tokio::select! {
                // Neue eingehende Verbindung
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => self.verbindung_annehmen(stream, peer_addr, &shutdown_rx),
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Spielserver: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!(uptime_sek = self.state.uptime_sek(), "TCP Spielserver gestoppt");
        Ok(())
    }

    fn verbindung_annehmen(
        &self,
        mut stream: tokio::net::TcpStream,
        peer_addr: SocketAddr,
        shutdown_rx: &watch::Receiver<bool>,
    ) {
        // Spieler-Limit pruefen
        if self.state.sessions.spieleranzahl() >= MAX_SPIELER {
            tracing::warn!(
                peer = %peer_addr,
                max = MAX_SPIELER,
                "Server voll – Verbindung abgelehnt"
            );
            let absage = Message::error(MemoError::KapazitaetErreicht { max: MAX_SPIELER }.to_string());
            tokio::spawn(async move {
                if let Err(e) = write_zeile(&mut stream, &absage).await {
                    tracing::debug!(peer = %peer_addr, fehler = %e, "Absage nicht zustellbar");
                }
            });
            return;
        }

        let verbindung = ConnectionId::new();
        tracing::debug!(verbindung = %verbindung, peer = %peer_addr, "Verbindung akzeptiert");

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(peer = %peer_addr, fehler = %e, "TCP_NODELAY nicht gesetzt");
        }

        let queue = self.state.broadcaster.verbindung_anmelden(verbindung);
        let client = ClientConnection::neu(Arc::clone(&self.state), verbindung, peer_addr);
        let shutdown_rx = shutdown_rx.clone();

        tokio::spawn(async move {
            client.verarbeiten(stream, queue, shutdown_rx).await;
        });
    }
}
