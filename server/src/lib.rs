//! memo-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use anyhow::{Context, Result};
use config::ServerConfig;
use memo_signaling::{GameServer, SignalingState};
use std::net::SocketAddr;
use tokio::sync::watch;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bindet den TCP-Listener und laeuft bis zum Shutdown-Signal
    ///
    /// Ein nicht bindbarer Port ist der einzige fatale Fehler.
    pub async fn starten(self) -> Result<()> {
        let bind_adresse: SocketAddr = self
            .config
            .tcp_bind_adresse()
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse '{}'", self.config.tcp_bind_adresse()))?;

        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %bind_adresse,
            "Server startet"
        );

        let state = SignalingState::neu(self.config.signaling_config());
        let server = GameServer::binden(state, bind_adresse)
            .await
            .with_context(|| format!("TCP-Listener auf {bind_adresse} konnte nicht gebunden werden"))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server_task = tokio::spawn(server.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        let _ = shutdown_tx.send(true);
        server_task
            .await
            .context("Server-Task abgebrochen")?
            .context("Spielserver mit Fehler beendet")?;

        Ok(())
    }
}
