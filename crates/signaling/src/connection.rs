//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Der Task liest Zeilen ueber den `LineCodec`, reicht sie an
//! den `MessageDispatcher` weiter und schreibt alles, was der
//! `EventBroadcaster` in die Send-Queue der Verbindung legt.
//!
//! ## Verbindungsende
//! Die Schleife endet bei
//! - EOF oder Lesefehler (auch bei zu langer Zeile)
//! - Schreibfehler
//! - Trenn-Signal des Broadcasters (Queue voll, Client liest nicht mehr),
//!   auch mitten in einem haengenden Schreibvorgang
//! - `Steuerung::Trennen` vom Dispatcher
//! - Shutdown-Signal
//!
//! Danach wird der Spieler aus der Sitzung entfernt und die Send-Queue
//! abgemeldet.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;

use memo_core::{ConnectionId, MemoError, MemoResult};
use memo_protocol::{LineCodec, Message};

use crate::broadcast::SendeQueue;
use crate::dispatcher::{MessageDispatcher, Steuerung};
use crate::server_state::SignalingState;

type ZeilenFramed = Framed<TcpStream, LineCodec>;

/// Verarbeitet eine einzelne TCP-Verbindung
pub struct ClientConnection {
    state: Arc<SignalingState>,
    verbindung: ConnectionId,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<SignalingState>, verbindung: ConnectionId, peer_addr: SocketAddr) -> Self {
        Self {
            state,
            verbindung,
            peer_addr,
        }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// `queue` ist die beim Broadcaster angemeldete Send-Queue dieser
    /// Verbindung. Laeuft bis die Verbindung endet oder ein
    /// Shutdown-Signal eingeht.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        queue: SendeQueue,
        shutdown_rx: watch::Receiver<bool>,
    ) {
        let verbindung = self.verbindung;
        let peer_addr = self.peer_addr;

        let codec = LineCodec::with_max_laenge(self.state.config.max_zeilen_laenge);
        tracing::debug!(
            verbindung = %verbindung,
            peer = %peer_addr,
            max_zeile = codec.max_zeilen_laenge(),
            "Neue Verbindung"
        );
        let mut framed = Framed::new(stream, codec);

        match self.schleife(&mut framed, queue, shutdown_rx).await {
            Ok(()) => {
                tracing::debug!(verbindung = %verbindung, "Verbindung beendet");
            }
            Err(MemoError::Verbindung(grund)) => {
                tracing::info!(verbindung = %verbindung, grund = %grund, "Verbindung getrennt");
            }
            Err(e) => {
                tracing::warn!(verbindung = %verbindung, peer = %peer_addr, fehler = %e, "Verbindungsfehler");
            }
        }

        // Cleanup beim Verbindungsende
        self.state.sessions.spieler_getrennt(&verbindung);
        self.state.broadcaster.verbindung_entfernen(&verbindung);

        tracing::debug!(verbindung = %verbindung, peer = %peer_addr, "Verbindungs-Task beendet");
    }

    /// `Ok` bei regulaerem Ende (EOF, Shutdown), sonst der Trennungsgrund
    async fn schleife(
        &self,
        framed: &mut ZeilenFramed,
        mut queue: SendeQueue,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> MemoResult<()> {
        let verbindung = self.verbindung;
        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));
        let trennen = queue.trennen.clone();

        loop {
            // Ausgehendes vor Eingehendem: ein Client, der schneller sendet
            // als er liest, kann seine eigene Queue nicht ueberlaufen lassen
            tokio::select! {
                biased;

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!(verbindung = %verbindung, "Shutdown-Signal – Verbindung wird getrennt");
                        return Ok(());
                    }
                }

                _ = trennen.cancelled() => {
                    return Err(MemoError::Verbindung("vom Broadcaster getrennt".into()));
                }

                // Ausgehende Nachricht aus dem Broadcaster
                ausgehend = queue.rx.recv() => {
                    let Some(nachricht) = ausgehend else {
                        return Err(MemoError::Verbindung("Send-Queue geschlossen".into()));
                    };
                    // Ein Client, der nicht mehr liest, blockiert hier; das
                    // Trenn-Signal bricht den Schreibvorgang ab
                    tokio::select! {
                        ergebnis = framed.send(nachricht) => ergebnis?,
                        _ = trennen.cancelled() => {
                            return Err(MemoError::Verbindung(
                                "Client liest nicht, Send-Queue uebergelaufen".into(),
                            ));
                        }
                    }
                }

                // Eingehende Zeile vom Client
                zeile = framed.next() => {
                    match zeile {
                        Some(Ok(zeile)) => {
                            tracing::trace!(verbindung = %verbindung, zeile = %zeile, "Zeile empfangen");

                            if dispatcher.dispatch(verbindung, &zeile) == Steuerung::Trennen {
                                // Ausstehende Antworten (z.B. ERROR) noch zustellen
                                ausstehende_zustellen(framed, &mut queue.rx).await;
                                return Err(MemoError::Verbindung("vom Server getrennt".into()));
                            }
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => return Ok(()),
                    }
                }
            }
        }
    }
}

async fn ausstehende_zustellen(framed: &mut ZeilenFramed, sende_rx: &mut mpsc::Receiver<Message>) {
    while let Ok(ausgehend) = sende_rx.try_recv() {
        if framed.feed(ausgehend).await.is_err() {
            return;
        }
    }
    let _ = framed.flush().await;
}
