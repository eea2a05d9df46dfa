//! Nachrichten des Memo-Protokolls
//!
//! Jede Nachricht ist eine Textzeile `<typ>|<feld1>|<feld2>...`. Der Typ ist
//! ein numerischer Tag aus [`MessageType`]. Das Trennzeichen `|` wird NICHT
//! escaped: Aufrufer duerfen es nicht in Freitext (z.B. Chat) einbetten.
//!
//! ## Nachrichtentypen
//! ```text
//! 0 SYSTEM      absender, text        Server -> Client
//! 1 CONNECT     name                  Client -> Server
//! 2 CARD_OPEN   position              Client -> Server
//! 3 CHAT        [absender,] text      beide Richtungen
//! 4 GAME_OVER   gewinner(;), punkte   Server -> Client
//! 5 ERROR       text                  Server -> Client
//! 6 GAME_STATE  json                  Server -> Client
//! 7 START_GAME  -                     Client -> Server
//! 8 PLAYER_TURN name                  Server -> Client
//! 9 GAME_RESET  -                     beide Richtungen
//! ```

use memo_core::{MemoError, MemoResult};
use std::fmt;
use std::str::FromStr;

/// Trennzeichen zwischen Typ und Feldern
pub const TRENNZEICHEN: char = '|';

/// Absendername fuer SYSTEM-Nachrichten
pub const SYSTEM_ABSENDER: &str = "System";

/// Trennzeichen zwischen mehreren Gewinnern in GAME_OVER
pub const GEWINNER_TRENNZEICHEN: char = ';';

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// Numerischer Typ-Tag einer Nachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    System = 0,
    Connect = 1,
    CardOpen = 2,
    Chat = 3,
    GameOver = 4,
    Error = 5,
    GameState = 6,
    StartGame = 7,
    PlayerTurn = 8,
    GameReset = 9,
}

impl MessageType {
    /// Gibt den numerischen Tag zurueck
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Ordnet einen numerischen Tag dem Nachrichtentyp zu
    pub fn aus_tag(tag: u8) -> Option<Self> {
        let typ = match tag {
            0 => Self::System,
            1 => Self::Connect,
            2 => Self::CardOpen,
            3 => Self::Chat,
            4 => Self::GameOver,
            5 => Self::Error,
            6 => Self::GameState,
            7 => Self::StartGame,
            8 => Self::PlayerTurn,
            9 => Self::GameReset,
            _ => return None,
        };
        Some(typ)
    }

    /// Gibt true zurueck wenn ein Client diesen Typ senden darf
    pub fn vom_client_erlaubt(self) -> bool {
        matches!(
            self,
            Self::Connect | Self::CardOpen | Self::Chat | Self::StartGame | Self::GameReset
        )
    }
}

impl FromStr for MessageType {
    type Err = MemoError;

    fn from_str(s: &str) -> MemoResult<Self> {
        let tag: u8 = s
            .trim()
            .parse()
            .map_err(|_| MemoError::ZahlFormat(format!("Typ-Tag '{s}'")))?;
        Self::aus_tag(tag).ok_or_else(|| MemoError::dekodierung(format!("Unbekannter Typ-Tag {tag}")))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// ---------------------------------------------------------------------------
// Freie Kodierfunktionen
// ---------------------------------------------------------------------------

/// Kodiert Typ und Felder als Protokollzeile (ohne Zeilenende)
pub fn encode(typ: MessageType, felder: &[&str]) -> String {
    let mut zeile = typ.tag().to_string();
    for feld in felder {
        zeile.push(TRENNZEICHEN);
        zeile.push_str(feld);
    }
    zeile
}

/// Zerlegt eine Protokollzeile am literalen Trennzeichen
///
/// Leere Felder bleiben erhalten; `felder[0]` ist immer der Typ-String.
pub fn decode(zeile: &str) -> Vec<String> {
    zeile.split(TRENNZEICHEN).map(str::to_owned).collect()
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Eine typisierte Protokollnachricht
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub typ: MessageType,
    /// Felder nach dem Typ-Tag, in Reihenfolge
    pub felder: Vec<String>,
}

impl Message {
    /// Erstellt eine neue Nachricht
    pub fn new(typ: MessageType, felder: Vec<String>) -> Self {
        Self { typ, felder }
    }

    /// Parst eine empfangene Zeile
    ///
    /// # Fehler
    /// - `ProtokollDekodierung` bei leerer Zeile oder unbekanntem Tag
    /// - `ZahlFormat` bei nicht-numerischem Tag
    pub fn parse(zeile: &str) -> MemoResult<Self> {
        if zeile.is_empty() {
            return Err(MemoError::dekodierung("Leere Zeile"));
        }
        let mut teile = decode(zeile).into_iter();
        let typ_str = teile.next().unwrap_or_default();
        let typ: MessageType = typ_str.parse()?;
        Ok(Self::new(typ, teile.collect()))
    }

    /// Kodiert die Nachricht als Protokollzeile (ohne Zeilenende)
    pub fn kodieren(&self) -> String {
        let felder: Vec<&str> = self.felder.iter().map(String::as_str).collect();
        encode(self.typ, &felder)
    }

    /// Gibt das Feld an Position `index` (nach dem Typ) zurueck
    pub fn feld(&self, index: usize) -> Option<&str> {
        self.felder.get(index).map(String::as_str)
    }

    // --- Server -> Client ---

    /// SYSTEM-Nachricht mit festem Absender
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageType::System, vec![SYSTEM_ABSENDER.into(), text.into()])
    }

    /// Gezielte Fehlermeldung
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageType::Error, vec![text.into()])
    }

    /// Chat-Nachricht mit Absender (vom Server gestempelt)
    pub fn chat(absender: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(MessageType::Chat, vec![absender.into(), text.into()])
    }

    /// Spielende mit allen Gewinnern und der Hoechstpunktzahl
    pub fn game_over(gewinner: &[String], max_punkte: u32) -> Self {
        let liste = gewinner.join(&GEWINNER_TRENNZEICHEN.to_string());
        Self::new(MessageType::GameOver, vec![liste, max_punkte.to_string()])
    }

    /// Vollstaendiger Spielzustand als serialisierter Payload
    pub fn game_state(payload: impl Into<String>) -> Self {
        Self::new(MessageType::GameState, vec![payload.into()])
    }

    /// Zugwechsel
    pub fn player_turn(name: impl Into<String>) -> Self {
        Self::new(MessageType::PlayerTurn, vec![name.into()])
    }

    /// Reset-Anfrage bzw. -Hinweis
    pub fn game_reset() -> Self {
        Self::new(MessageType::GameReset, Vec::new())
    }

    // --- Client -> Server ---

    /// Beitrittsanfrage
    pub fn connect(name: impl Into<String>) -> Self {
        Self::new(MessageType::Connect, vec![name.into()])
    }

    /// Karte an Position oeffnen
    pub fn card_open(position: usize) -> Self {
        Self::new(MessageType::CardOpen, vec![position.to_string()])
    }

    /// Chat-Nachricht ohne Absender (Client-Seite)
    pub fn chat_anfrage(text: impl Into<String>) -> Self {
        Self::new(MessageType::Chat, vec![text.into()])
    }

    /// Spielstart
    pub fn start_game() -> Self {
        Self::new(MessageType::StartGame, Vec::new())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.kodieren())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let zeile = encode(MessageType::Chat, &["Ann", "hallo welt"]);
        assert_eq!(zeile, "3|Ann|hallo welt");
        assert_eq!(decode(&zeile), vec!["3", "Ann", "hallo welt"]);
    }

    #[test]
    fn decode_behaelt_leere_felder() {
        assert_eq!(decode("1|"), vec!["1", ""]);
        assert_eq!(decode("3||x|"), vec!["3", "", "x", ""]);
        assert_eq!(decode("7"), vec!["7"]);
    }

    #[test]
    fn decode_trennt_literal_nicht_als_muster() {
        // '.' und '*' duerfen nicht als Regex interpretiert werden
        assert_eq!(decode("3|a.b|*"), vec!["3", "a.b", "*"]);
    }

    #[test]
    fn parse_typisierte_nachricht() {
        let msg = Message::parse("2|17").unwrap();
        assert_eq!(msg.typ, MessageType::CardOpen);
        assert_eq!(msg.feld(0), Some("17"));
        assert_eq!(msg.feld(1), None);

        let msg = Message::parse("7").unwrap();
        assert_eq!(msg.typ, MessageType::StartGame);
        assert!(msg.felder.is_empty());
    }

    #[test]
    fn parse_nicht_numerischer_typ_ist_zahlenfehler() {
        let err = Message::parse("abc|x").unwrap_err();
        assert!(matches!(err, MemoError::ZahlFormat(_)));
    }

    #[test]
    fn parse_unbekannter_typ_ist_dekodierfehler() {
        let err = Message::parse("42|x").unwrap_err();
        assert!(matches!(err, MemoError::ProtokollDekodierung(_)));

        let err = Message::parse("").unwrap_err();
        assert!(matches!(err, MemoError::ProtokollDekodierung(_)));
    }

    #[test]
    fn system_nachricht_traegt_festen_absender() {
        assert_eq!(Message::system("Ann left").kodieren(), "0|System|Ann left");
    }

    #[test]
    fn game_over_verbindet_gewinner_mit_semikolon() {
        let msg = Message::game_over(&["Ann".into(), "Bo".into()], 9);
        assert_eq!(msg.kodieren(), "4|Ann;Bo|9");

        let msg = Message::game_over(&["Ann".into()], 10);
        assert_eq!(msg.kodieren(), "4|Ann|10");
    }

    #[test]
    fn nachrichten_ohne_felder() {
        assert_eq!(Message::start_game().kodieren(), "7");
        assert_eq!(Message::game_reset().kodieren(), "9");
    }

    #[test]
    fn alle_tags_abbildbar() {
        for tag in 0..=9u8 {
            let typ = MessageType::aus_tag(tag).expect("Tag muss bekannt sein");
            assert_eq!(typ.tag(), tag);
        }
        assert!(MessageType::aus_tag(10).is_none());
    }

    #[test]
    fn client_erlaubte_typen() {
        assert!(MessageType::Connect.vom_client_erlaubt());
        assert!(MessageType::GameReset.vom_client_erlaubt());
        assert!(!MessageType::GameState.vom_client_erlaubt());
        assert!(!MessageType::GameOver.vom_client_erlaubt());
    }
}
