//! memo-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert die Nachrichtentypen des Memo-Protokolls, das
//! zeilenbasierte Wire-Format und den Inhalt der GAME_STATE-Nachricht.
//!
//! ```text
//! <typ>|<feld1>|<feld2>...\n
//! ```

pub mod message;
pub mod state;
pub mod wire;

pub use message::{Message, MessageType, SYSTEM_ABSENDER, TRENNZEICHEN};
pub use state::{SpielZustand, ZellenAnsicht};
pub use wire::LineCodec;
