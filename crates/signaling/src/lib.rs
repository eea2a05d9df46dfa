//! memo-signaling – TCP-Spielserver fuer Memo
//!
//! Dieser Crate implementiert den Netzwerk- und Sitzungsteil des
//! Memo-Servers: TCP-Verbindungen, Nachrichten-Routing, Spielerverwaltung,
//! Broadcast und die Zustandsmaschine einer Partie.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (GameServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     v
//! SessionManager ──(Mutex)──> GameSession ──> Board
//!     |                           |
//!     +-- Aufdeck-Timer (Task) ---+
//!                                 |
//!                                 v
//!                         EventBroadcaster ──> Send-Queues aller Verbindungen
//! ```

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod manager;
pub mod registry;
pub mod server_state;
pub mod session;
pub mod tcp;

// Bequeme Re-Exporte
pub use broadcast::{EventBroadcaster, SendeQueue};
pub use connection::ClientConnection;
pub use dispatcher::{MessageDispatcher, Steuerung};
pub use manager::SessionManager;
pub use registry::PlayerRegistry;
pub use server_state::{SignalingConfig, SignalingState};
pub use session::{AufdeckAuftrag, Auswertung, BrettErzeuger, GameSession};
pub use tcp::GameServer;
