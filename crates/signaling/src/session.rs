//! Spielsitzung – Zustandsmaschine einer Memo-Partie
//!
//! ## Zustaende
//! ```text
//! WARTEND ──START_GAME (>= 2 Spieler)──> LAEUFT
//!    ^                                      │
//!    └── GAME_RESET | Trennung | Spielende ─┘
//! ```
//!
//! `GameSession` ist rein synchron und kennt keine Timer. Wird das zweite
//! Feld eines Paares aufgedeckt, liefert `karte_oeffnen` einen
//! [`AufdeckAuftrag`] mit der aktuellen Epoche zurueck. Der Aufrufer
//! (`SessionManager`) wertet ihn nach der Aufdeck-Verzoegerung ueber
//! `aufdeckung_auswerten` aus. Jeder Reset erhoeht die Epoche, veraltete
//! Auftraege veraendern dadurch nie den Zustand.
//!
//! Fehler, die der Client sehen soll, werden als `MemoError` zurueckgegeben;
//! das Melden uebernimmt der Dispatcher.

use std::collections::HashMap;

use memo_core::{ConnectionId, MemoError, MemoResult, MAX_SPIELER, MIN_SPIELER};
use memo_game::{Board, ZellenZustand};
use memo_protocol::{Message, SpielZustand};

use crate::broadcast::EventBroadcaster;
use crate::registry::PlayerRegistry;

/// Erzeugt das Brett fuer jede neue Partie
pub type BrettErzeuger = fn() -> Board;

/// Auswertung eines aufgedeckten Paares, faellig nach der Aufdeck-Verzoegerung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AufdeckAuftrag {
    /// Epoche der Sitzung beim Aufdecken der zweiten Karte
    pub epoch: u64,
}

/// Ergebnis einer Paar-Auswertung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auswertung {
    /// Auftrag gehoert zu einer frueheren Partie, nichts veraendert
    Veraltet,
    /// Paar gefunden, der Spieler bleibt am Zug
    Treffer,
    /// Kein Paar, der naechste Spieler ist am Zug
    Fehlgriff,
    /// Letztes Paar gefunden, Partie ausgewertet und zurueckgesetzt
    Spielende,
}

/// Eine Memo-Partie mit ihren Spielern
pub struct GameSession {
    brett: Board,
    registry: PlayerRegistry,
    punkte: HashMap<ConnectionId, u32>,
    aktueller_index: Option<usize>,
    gestartet: bool,
    epoch: u64,
    broadcaster: EventBroadcaster,
    brett_erzeuger: BrettErzeuger,
}

impl GameSession {
    /// Erstellt eine wartende Sitzung mit zufaellig gemischtem Brett
    pub fn neu(broadcaster: EventBroadcaster) -> Self {
        Self::mit_brett_erzeuger(broadcaster, Board::neu)
    }

    /// Erstellt eine wartende Sitzung mit eigenem Brett-Erzeuger
    pub fn mit_brett_erzeuger(broadcaster: EventBroadcaster, brett_erzeuger: BrettErzeuger) -> Self {
        Self {
            brett: brett_erzeuger(),
            registry: PlayerRegistry::neu(),
            punkte: HashMap::new(),
            aktueller_index: None,
            gestartet: false,
            epoch: 0,
            broadcaster,
            brett_erzeuger,
        }
    }

    // -----------------------------------------------------------------------
    // Spieler
    // -----------------------------------------------------------------------

    /// Nimmt einen Spieler in die wartende Partie auf
    ///
    /// Abgelehnt wenn die Partie laeuft, der Name leer ist oder bereits
    /// `MAX_SPIELER` Spieler registriert sind. Eine bereits registrierte
    /// Verbindung aendert nur ihren Namen.
    pub fn spieler_beitreten(&mut self, verbindung: ConnectionId, name: &str) -> MemoResult<()> {
        if self.gestartet {
            return Err(MemoError::zug("game already started"));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(MemoError::zug("name must not be empty"));
        }

        if !self.registry.enthaelt(&verbindung) && self.registry.anzahl() >= MAX_SPIELER {
            return Err(MemoError::KapazitaetErreicht { max: MAX_SPIELER });
        }

        self.registry.hinzufuegen(verbindung, name);
        self.punkte.entry(verbindung).or_insert(0);

        tracing::info!(
            verbindung = %verbindung,
            name = %name,
            spieler = self.registry.anzahl(),
            "Spieler beigetreten"
        );

        self.zustand_senden();
        Ok(())
    }

    /// Entfernt einen getrennten Spieler
    ///
    /// Laeuft die Partie noch, wird sie vollstaendig zurueckgesetzt. Fuer
    /// nicht registrierte Verbindungen ein No-Op.
    pub fn spieler_getrennt(&mut self, verbindung: &ConnectionId) {
        let Some(name) = self.registry.entfernen(verbindung) else {
            tracing::debug!(verbindung = %verbindung, "Trennung ohne registrierten Spieler");
            return;
        };
        self.punkte.remove(verbindung);

        tracing::info!(
            verbindung = %verbindung,
            name = %name,
            spieler = self.registry.anzahl(),
            "Spieler hat das Spiel verlassen"
        );
        self.an_alle_senden(&Message::system(format!("{name} left")));

        if self.gestartet && !self.brett.ist_beendet() {
            tracing::info!("Partie nach Trennung abgebrochen");
            self.zuruecksetzen();
        }

        self.zustand_senden();
    }

    // -----------------------------------------------------------------------
    // Spielablauf
    // -----------------------------------------------------------------------

    /// Startet die Partie; der zuerst beigetretene Spieler beginnt
    pub fn spiel_starten(&mut self, verbindung: &ConnectionId) -> MemoResult<()> {
        if self.gestartet {
            return Err(MemoError::zug("game already started"));
        }
        if self.registry.anzahl() < MIN_SPIELER {
            return Err(MemoError::zug(format!(
                "at least {MIN_SPIELER} players required"
            )));
        }

        self.gestartet = true;
        self.aktueller_index = Some(0);

        tracing::info!(
            verbindung = %verbindung,
            spieler = self.registry.anzahl(),
            epoch = self.epoch,
            "Partie gestartet"
        );

        self.zustand_senden();
        Ok(())
    }

    /// Deckt eine Karte fuer den Spieler am Zug auf
    ///
    /// Liefert einen [`AufdeckAuftrag`] sobald zwei Karten offen sind.
    /// Ausserhalb einer laufenden Partie wird die Anfrage ignoriert.
    pub fn karte_oeffnen(
        &mut self,
        verbindung: &ConnectionId,
        position: &str,
    ) -> MemoResult<Option<AufdeckAuftrag>> {
        if !self.gestartet || self.brett.ist_beendet() {
            tracing::debug!(verbindung = %verbindung, "Karte ausserhalb einer Partie ignoriert");
            return Ok(None);
        }

        if self.aktuelle_verbindung() != Some(*verbindung) {
            return Err(MemoError::zug("not your turn"));
        }

        let position: usize = position
            .trim()
            .parse()
            .map_err(|_| MemoError::ZahlFormat(format!("Ungueltige Kartenposition: {position:?}")))?;

        let verdeckt = self.brett.zustand(position) == Some(ZellenZustand::Verdeckt);
        let bereits_offen = self.brett.geoeffnete().contains(&position);
        if !verdeckt || bereits_offen || !self.brett.karte_oeffnen(position) {
            return Err(MemoError::zug("cannot open card"));
        }

        let (zeile, spalte) = Board::koordinaten(position);
        tracing::debug!(
            verbindung = %verbindung,
            position,
            zeile,
            spalte,
            "Karte aufgedeckt"
        );

        self.zustand_senden();

        if self.brett.geoeffnete().len() == 2 {
            Ok(Some(AufdeckAuftrag { epoch: self.epoch }))
        } else {
            Ok(None)
        }
    }

    /// Wertet ein aufgedecktes Paar aus
    ///
    /// Auftraege aus einer frueheren Epoche werden verworfen, ohne den
    /// Zustand zu beruehren.
    pub fn aufdeckung_auswerten(&mut self, auftrag: AufdeckAuftrag) -> Auswertung {
        if auftrag.epoch != self.epoch {
            tracing::debug!(
                auftrag_epoch = auftrag.epoch,
                epoch = self.epoch,
                "Veraltete Aufdeckung verworfen"
            );
            return Auswertung::Veraltet;
        }
        if self.brett.geoeffnete().len() != 2 {
            return Auswertung::Veraltet;
        }

        let treffer = self.brett.paar_pruefen();
        if treffer {
            if let Some(verbindung) = self.aktuelle_verbindung() {
                *self.punkte.entry(verbindung).or_insert(0) += 1;
            }
        } else {
            self.naechster_spieler();
            if let Some(name) = self.aktueller_spieler() {
                self.an_alle_senden(&Message::player_turn(name));
            }
        }

        tracing::debug!(treffer, epoch = self.epoch, "Paar ausgewertet");

        self.brett.geoeffnete_leeren();
        self.zustand_senden();

        if self.brett.vollstaendig_aufgedeckt() {
            self.spielende();
            return Auswertung::Spielende;
        }

        if treffer {
            Auswertung::Treffer
        } else {
            Auswertung::Fehlgriff
        }
    }

    /// Setzt die Sitzung auf eine neue, wartende Partie zurueck
    ///
    /// Neues Brett, Epoche + 1, alle Punkte auf 0. Registrierte Spieler
    /// bleiben erhalten. Mehrfaches Zuruecksetzen ist unbedenklich.
    pub fn zuruecksetzen(&mut self) {
        self.brett = (self.brett_erzeuger)();
        self.epoch += 1;
        self.gestartet = false;
        self.aktueller_index = None;
        for punkte in self.punkte.values_mut() {
            *punkte = 0;
        }
        tracing::info!(epoch = self.epoch, "Partie zurueckgesetzt");
    }

    /// Explizite GAME_RESET-Anfrage: Reset, Hinweis und neuer Zustand
    ///
    /// Eine wartende Partie ist bereits zurueckgesetzt; die Anfrage bleibt
    /// dann ohne Wirkung.
    pub fn reset_anfordern(&mut self, verbindung: &ConnectionId) {
        if !self.gestartet {
            tracing::debug!(verbindung = %verbindung, "Reset ignoriert, Partie wartet bereits");
            return;
        }
        tracing::info!(verbindung = %verbindung, "Reset angefordert");
        self.zuruecksetzen();
        self.an_alle_senden(&Message::game_reset());
        self.zustand_senden();
    }

    /// Gewinner ermitteln, GAME_OVER senden und zuruecksetzen
    fn spielende(&mut self) {
        let (gewinner, max_punkte) = self.gewinner();
        tracing::info!(gewinner = ?gewinner, punkte = max_punkte, "Partie beendet");

        self.an_alle_senden(&Message::game_over(&gewinner, max_punkte));
        self.zuruecksetzen();
        self.zustand_senden();
    }

    /// Alle Spieler mit der Hoechstpunktzahl in Beitrittsreihenfolge
    pub fn gewinner(&self) -> (Vec<String>, u32) {
        let max_punkte = self.punkte.values().copied().max().unwrap_or(0);
        let gewinner = self
            .registry
            .eintraege()
            .iter()
            .filter(|e| self.punkte.get(&e.verbindung).copied().unwrap_or(0) == max_punkte)
            .map(|e| e.name.clone())
            .collect();
        (gewinner, max_punkte)
    }

    fn naechster_spieler(&mut self) {
        let anzahl = self.registry.anzahl();
        self.aktueller_index = match (self.aktueller_index, anzahl) {
            (_, 0) => None,
            (Some(index), _) => Some((index + 1) % anzahl),
            (None, _) => Some(0),
        };
    }

    // -----------------------------------------------------------------------
    // Senden
    // -----------------------------------------------------------------------

    /// Sendet eine Nachricht an alle registrierten Spieler
    pub fn an_alle_senden(&self, nachricht: &Message) -> usize {
        self.broadcaster
            .an_alle_senden(&self.registry.verbindungen(), nachricht)
    }

    /// Sendet den aktuellen Spielzustand an alle registrierten Spieler
    pub fn zustand_senden(&self) {
        self.broadcaster
            .spielzustand_senden(&self.registry.verbindungen(), &self.zustand());
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    /// Schnappschuss fuer GAME_STATE
    pub fn zustand(&self) -> SpielZustand {
        let scores = self
            .registry
            .eintraege()
            .iter()
            .map(|e| {
                let punkte = self.punkte.get(&e.verbindung).copied().unwrap_or(0);
                (e.name.clone(), punkte)
            })
            .collect();

        SpielZustand {
            board: self.brett.ansicht(),
            scores,
            players: self.registry.namen(),
            current_player: self.aktueller_spieler(),
            game_started: self.gestartet,
            game_over: self.brett.ist_beendet(),
            opened_cards: self.brett.geoeffnete().to_vec(),
            min_players: MIN_SPIELER,
            max_players: MAX_SPIELER,
        }
    }

    /// Verbindung des Spielers am Zug
    pub fn aktuelle_verbindung(&self) -> Option<ConnectionId> {
        self.aktueller_index
            .and_then(|index| self.registry.eintrag_an(index))
            .map(|e| e.verbindung)
    }

    /// Name des Spielers am Zug
    pub fn aktueller_spieler(&self) -> Option<String> {
        self.aktueller_index
            .and_then(|index| self.registry.eintrag_an(index))
            .map(|e| e.name.clone())
    }

    pub fn punkte(&self, verbindung: &ConnectionId) -> Option<u32> {
        self.punkte.get(verbindung).copied()
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn brett(&self) -> &Board {
        &self.brett
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn ist_gestartet(&self) -> bool {
        self.gestartet
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use memo_core::ZELLEN_ANZAHL;
    use memo_protocol::{MessageType, ZellenAnsicht};
    use tokio::sync::mpsc;

    /// Belegung 1,1,2,2,...,18,18 – Paare liegen nebeneinander
    fn geordnetes_brett() -> Board {
        let mut werte = [0u8; ZELLEN_ANZAHL];
        for (i, wert) in werte.iter_mut().enumerate() {
            *wert = (i / 2) as u8 + 1;
        }
        Board::aus_werten(werte).expect("gueltige Belegung")
    }

    struct Aufbau {
        session: GameSession,
        broadcaster: EventBroadcaster,
    }

    impl Aufbau {
        fn neu() -> Self {
            let broadcaster = EventBroadcaster::neu();
            let session = GameSession::mit_brett_erzeuger(broadcaster.clone(), geordnetes_brett);
            Self { session, broadcaster }
        }

        fn spieler(&mut self, name: &str) -> (ConnectionId, mpsc::Receiver<Message>) {
            let id = ConnectionId::new();
            let rx = self.broadcaster.verbindung_registrieren(id);
            self.session.spieler_beitreten(id, name).unwrap();
            (id, rx)
        }
    }

    fn leeren(rx: &mut mpsc::Receiver<Message>) -> Vec<Message> {
        let mut nachrichten = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            nachrichten.push(msg);
        }
        nachrichten
    }

    fn typen(nachrichten: &[Message]) -> Vec<MessageType> {
        nachrichten.iter().map(|m| m.typ).collect()
    }

    /// Aufdecken und sofort auswerten
    fn paar(session: &mut GameSession, id: &ConnectionId, a: usize, b: usize) -> Auswertung {
        assert!(session.karte_oeffnen(id, &a.to_string()).unwrap().is_none());
        let auftrag = session
            .karte_oeffnen(id, &b.to_string())
            .unwrap()
            .expect("zweite Karte liefert Auftrag");
        session.aufdeckung_auswerten(auftrag)
    }

    #[test]
    fn beitreten_und_starten() {
        let mut aufbau = Aufbau::neu();
        let (ann, mut rx_ann) = aufbau.spieler("Ann");
        let (_bo, _) = aufbau.spieler("Bo");

        assert!(!aufbau.session.ist_gestartet());
        aufbau.session.spiel_starten(&ann).unwrap();

        assert!(aufbau.session.ist_gestartet());
        assert_eq!(aufbau.session.aktueller_spieler().as_deref(), Some("Ann"));

        // Ann sieht: State (Ann), State (Bo), State (Start)
        let nachrichten = leeren(&mut rx_ann);
        assert_eq!(typen(&nachrichten), vec![MessageType::GameState; 3]);
        let zustand = SpielZustand::from_json(nachrichten[2].feld(0).unwrap()).unwrap();
        assert!(zustand.game_started);
        assert_eq!(zustand.players, vec!["Ann", "Bo"]);
        assert_eq!(zustand.current_player.as_deref(), Some("Ann"));
    }

    #[test]
    fn start_mit_einem_spieler_wird_abgelehnt() {
        let mut aufbau = Aufbau::neu();
        let (ann, _) = aufbau.spieler("Ann");

        let fehler = aufbau.session.spiel_starten(&ann).unwrap_err();
        assert!(matches!(fehler, MemoError::UngueltigerZug(_)));
        assert!(!aufbau.session.ist_gestartet());
    }

    #[test]
    fn beitritt_nach_start_wird_abgelehnt() {
        let mut aufbau = Aufbau::neu();
        let (ann, _) = aufbau.spieler("Ann");
        aufbau.spieler("Bo");
        aufbau.session.spiel_starten(&ann).unwrap();

        let cy = ConnectionId::new();
        let _rx = aufbau.broadcaster.verbindung_registrieren(cy);
        let fehler = aufbau.session.spieler_beitreten(cy, "Cy").unwrap_err();

        assert!(fehler.an_client_melden());
        assert!(!fehler.trennt_verbindung());
        assert_eq!(aufbau.session.registry().anzahl(), 2);
    }

    #[test]
    fn fuenfter_spieler_erreicht_kapazitaet() {
        let mut aufbau = Aufbau::neu();
        for name in ["A", "B", "C", "D"] {
            aufbau.spieler(name);
        }

        let fehler = aufbau
            .session
            .spieler_beitreten(ConnectionId::new(), "E")
            .unwrap_err();
        assert!(matches!(fehler, MemoError::KapazitaetErreicht { max: 4 }));
        assert!(fehler.trennt_verbindung());
        assert_eq!(aufbau.session.registry().anzahl(), 4);
    }

    #[test]
    fn leerer_name_wird_abgelehnt() {
        let mut aufbau = Aufbau::neu();
        let fehler = aufbau
            .session
            .spieler_beitreten(ConnectionId::new(), "   ")
            .unwrap_err();
        assert!(matches!(fehler, MemoError::UngueltigerZug(_)));
        assert!(aufbau.session.registry().ist_leer());
    }

    #[test]
    fn treffer_behaelt_den_zug() {
        let mut aufbau = Aufbau::neu();
        let (ann, _) = aufbau.spieler("Ann");
        let (bo, _) = aufbau.spieler("Bo");
        aufbau.session.spiel_starten(&ann).unwrap();

        assert_eq!(paar(&mut aufbau.session, &ann, 2, 3), Auswertung::Treffer);

        assert_eq!(aufbau.session.punkte(&ann), Some(1));
        assert_eq!(aufbau.session.punkte(&bo), Some(0));
        assert_eq!(aufbau.session.aktueller_spieler().as_deref(), Some("Ann"));
        assert!(aufbau.session.brett().geoeffnete().is_empty());
        assert_eq!(aufbau.session.brett().zustand(2), Some(ZellenZustand::Gefunden));
    }

    #[test]
    fn fehlgriff_gibt_den_zug_weiter() {
        let mut aufbau = Aufbau::neu();
        let (ann, mut rx_ann) = aufbau.spieler("Ann");
        aufbau.spieler("Bo");
        aufbau.session.spiel_starten(&ann).unwrap();
        leeren(&mut rx_ann);

        assert_eq!(paar(&mut aufbau.session, &ann, 0, 2), Auswertung::Fehlgriff);

        assert_eq!(aufbau.session.aktueller_spieler().as_deref(), Some("Bo"));
        assert_eq!(aufbau.session.punkte(&ann), Some(0));

        let nachrichten = leeren(&mut rx_ann);
        assert_eq!(
            typen(&nachrichten),
            vec![
                MessageType::GameState,
                MessageType::GameState,
                MessageType::PlayerTurn,
                MessageType::GameState,
            ]
        );
        assert_eq!(nachrichten[2].feld(0), Some("Bo"));
    }

    #[test]
    fn offene_karte_zeigt_ihren_wert() {
        let mut aufbau = Aufbau::neu();
        let (ann, _) = aufbau.spieler("Ann");
        aufbau.spieler("Bo");
        aufbau.session.spiel_starten(&ann).unwrap();

        aufbau.session.karte_oeffnen(&ann, "7").unwrap();
        let zustand = aufbau.session.zustand();
        assert_eq!(zustand.board[&7], ZellenAnsicht::Offen(4));
        assert_eq!(zustand.board[&6], ZellenAnsicht::Verdeckt);
        assert_eq!(zustand.opened_cards, vec![7]);
    }

    #[test]
    fn zugreihenfolge_ist_reihum() {
        let mut aufbau = Aufbau::neu();
        let (a, _) = aufbau.spieler("A");
        let (b, _) = aufbau.spieler("B");
        let (c, _) = aufbau.spieler("C");
        aufbau.session.spiel_starten(&a).unwrap();

        paar(&mut aufbau.session, &a, 0, 2);
        assert_eq!(aufbau.session.aktuelle_verbindung(), Some(b));
        paar(&mut aufbau.session, &b, 0, 2);
        assert_eq!(aufbau.session.aktuelle_verbindung(), Some(c));
        paar(&mut aufbau.session, &c, 0, 2);
        assert_eq!(aufbau.session.aktuelle_verbindung(), Some(a));
    }

    #[test]
    fn falscher_spieler_und_ungueltige_karten() {
        let mut aufbau = Aufbau::neu();
        let (ann, _) = aufbau.spieler("Ann");
        let (bo, _) = aufbau.spieler("Bo");
        aufbau.session.spiel_starten(&ann).unwrap();

        let fehler = aufbau.session.karte_oeffnen(&bo, "0").unwrap_err();
        assert_eq!(fehler.to_string(), "not your turn");

        for position in ["36", "-1"] {
            let fehler = aufbau.session.karte_oeffnen(&ann, position).unwrap_err();
            assert!(
                matches!(fehler, MemoError::UngueltigerZug(_) | MemoError::ZahlFormat(_)),
                "{position}"
            );
        }

        let fehler = aufbau.session.karte_oeffnen(&ann, "abc").unwrap_err();
        assert!(matches!(fehler, MemoError::ZahlFormat(_)));
        assert!(!fehler.an_client_melden());

        aufbau.session.karte_oeffnen(&ann, "4").unwrap();
        let fehler = aufbau.session.karte_oeffnen(&ann, "4").unwrap_err();
        assert_eq!(fehler.to_string(), "cannot open card");
        assert_eq!(aufbau.session.brett().geoeffnete(), &[4]);
    }

    #[test]
    fn dritte_karte_vor_der_auswertung_wird_abgelehnt() {
        let mut aufbau = Aufbau::neu();
        let (ann, _) = aufbau.spieler("Ann");
        aufbau.spieler("Bo");
        aufbau.session.spiel_starten(&ann).unwrap();

        aufbau.session.karte_oeffnen(&ann, "0").unwrap();
        aufbau.session.karte_oeffnen(&ann, "2").unwrap();
        let fehler = aufbau.session.karte_oeffnen(&ann, "4").unwrap_err();

        assert_eq!(fehler.to_string(), "cannot open card");
        assert_eq!(aufbau.session.brett().geoeffnete(), &[0, 2]);
    }

    #[test]
    fn gefundene_karte_kann_nicht_geoeffnet_werden() {
        let mut aufbau = Aufbau::neu();
        let (ann, _) = aufbau.spieler("Ann");
        aufbau.spieler("Bo");
        aufbau.session.spiel_starten(&ann).unwrap();
        paar(&mut aufbau.session, &ann, 0, 1);

        let fehler = aufbau.session.karte_oeffnen(&ann, "0").unwrap_err();
        assert_eq!(fehler.to_string(), "cannot open card");
    }

    #[test]
    fn karte_vor_dem_start_wird_ignoriert() {
        let mut aufbau = Aufbau::neu();
        let (ann, _) = aufbau.spieler("Ann");
        assert_eq!(aufbau.session.karte_oeffnen(&ann, "0").unwrap(), None);
        assert!(aufbau.session.brett().geoeffnete().is_empty());
    }

    #[test]
    fn veralteter_auftrag_veraendert_nichts() {
        let mut aufbau = Aufbau::neu();
        let (ann, _) = aufbau.spieler("Ann");
        aufbau.spieler("Bo");
        aufbau.session.spiel_starten(&ann).unwrap();

        aufbau.session.karte_oeffnen(&ann, "0").unwrap();
        let auftrag = aufbau.session.karte_oeffnen(&ann, "1").unwrap().unwrap();

        aufbau.session.zuruecksetzen();
        aufbau.session.spiel_starten(&ann).unwrap();
        aufbau.session.karte_oeffnen(&ann, "2").unwrap();
        aufbau.session.karte_oeffnen(&ann, "3").unwrap();

        assert_eq!(aufbau.session.aufdeckung_auswerten(auftrag), Auswertung::Veraltet);
        assert_eq!(aufbau.session.brett().geoeffnete(), &[2, 3]);
        assert_eq!(aufbau.session.punkte(&ann), Some(0));
        assert_eq!(aufbau.session.brett().zustand(2), Some(ZellenZustand::Verdeckt));
    }

    #[test]
    fn volles_brett_beendet_und_setzt_zurueck() {
        let mut aufbau = Aufbau::neu();
        let (ann, mut rx_ann) = aufbau.spieler("Ann");
        let (bo, _) = aufbau.spieler("Bo");
        aufbau.session.spiel_starten(&ann).unwrap();

        // Ann: ein Fehlgriff, dann Bo: alle Paare
        paar(&mut aufbau.session, &ann, 0, 2);
        let epoch_vorher = aufbau.session.epoch();
        leeren(&mut rx_ann);

        for paar_index in 0..18 {
            let ergebnis = paar(&mut aufbau.session, &bo, paar_index * 2, paar_index * 2 + 1);
            let erwartet = if paar_index == 17 {
                Auswertung::Spielende
            } else {
                Auswertung::Treffer
            };
            assert_eq!(ergebnis, erwartet);
        }

        let nachrichten = leeren(&mut rx_ann);
        let n = nachrichten.len();
        assert_eq!(
            typen(&nachrichten[n - 3..]),
            vec![MessageType::GameState, MessageType::GameOver, MessageType::GameState]
        );

        let vor_ende = SpielZustand::from_json(nachrichten[n - 3].feld(0).unwrap()).unwrap();
        assert!(vor_ende.game_over);

        let game_over = &nachrichten[n - 2];
        assert_eq!(game_over.feld(0), Some("Bo"));
        assert_eq!(game_over.feld(1), Some("18"));

        let danach = SpielZustand::from_json(nachrichten[n - 1].feld(0).unwrap()).unwrap();
        assert!(!danach.game_started);
        assert!(!danach.game_over);
        assert!(danach.current_player.is_none());
        assert!(danach.scores.values().all(|&p| p == 0));
        assert!(danach.board.values().all(|z| *z == ZellenAnsicht::Verdeckt));
        assert_eq!(aufbau.session.epoch(), epoch_vorher + 1);
    }

    #[test]
    fn gleichstand_hat_mehrere_gewinner() {
        let mut aufbau = Aufbau::neu();
        let (ann, _) = aufbau.spieler("Ann");
        let (bo, _) = aufbau.spieler("Bo");
        aufbau.spieler("Cy");
        aufbau.session.spiel_starten(&ann).unwrap();

        paar(&mut aufbau.session, &ann, 0, 1);
        paar(&mut aufbau.session, &ann, 2, 4);
        paar(&mut aufbau.session, &bo, 2, 3);

        let (gewinner, max) = aufbau.session.gewinner();
        assert_eq!(gewinner, vec!["Ann", "Bo"]);
        assert_eq!(max, 1);

        paar(&mut aufbau.session, &bo, 4, 5);
        let (gewinner, max) = aufbau.session.gewinner();
        assert_eq!(gewinner, vec!["Bo"]);
        assert_eq!(max, 2);
    }

    #[test]
    fn trennung_waehrend_der_partie_setzt_zurueck() {
        let mut aufbau = Aufbau::neu();
        let (ann, mut rx_ann) = aufbau.spieler("Ann");
        let (bo, _) = aufbau.spieler("Bo");
        aufbau.session.spiel_starten(&ann).unwrap();
        paar(&mut aufbau.session, &ann, 0, 1);
        let epoch_vorher = aufbau.session.epoch();
        leeren(&mut rx_ann);

        aufbau.session.spieler_getrennt(&bo);

        assert!(!aufbau.session.ist_gestartet());
        assert_eq!(aufbau.session.epoch(), epoch_vorher + 1);
        assert_eq!(aufbau.session.punkte(&ann), Some(0));
        assert_eq!(aufbau.session.punkte(&bo), None);

        let nachrichten = leeren(&mut rx_ann);
        assert_eq!(
            typen(&nachrichten),
            vec![MessageType::System, MessageType::GameState]
        );
        assert_eq!(nachrichten[0].feld(0), Some("System"));
        assert_eq!(nachrichten[0].feld(1), Some("Bo left"));
    }

    #[test]
    fn trennung_ist_idempotent() {
        let mut aufbau = Aufbau::neu();
        let (ann, mut rx_ann) = aufbau.spieler("Ann");
        let (bo, _) = aufbau.spieler("Bo");
        aufbau.session.spieler_getrennt(&bo);
        let epoch = aufbau.session.epoch();
        leeren(&mut rx_ann);

        aufbau.session.spieler_getrennt(&bo);
        aufbau.session.spieler_getrennt(&ConnectionId::new());

        assert_eq!(aufbau.session.epoch(), epoch);
        assert!(leeren(&mut rx_ann).is_empty());
        assert_eq!(aufbau.session.registry().verbindungen(), vec![ann]);
    }

    #[test]
    fn expliziter_reset_sendet_hinweis_und_zustand() {
        let mut aufbau = Aufbau::neu();
        let (ann, mut rx_ann) = aufbau.spieler("Ann");
        aufbau.spieler("Bo");
        aufbau.session.spiel_starten(&ann).unwrap();
        aufbau.session.karte_oeffnen(&ann, "0").unwrap();
        let epoch = aufbau.session.epoch();
        leeren(&mut rx_ann);

        aufbau.session.reset_anfordern(&ann);

        assert!(!aufbau.session.ist_gestartet());
        assert!(aufbau.session.brett().geoeffnete().is_empty());
        assert_eq!(aufbau.session.epoch(), epoch + 1);
        assert_eq!(aufbau.session.registry().anzahl(), 2);
        assert_eq!(
            typen(&leeren(&mut rx_ann)),
            vec![MessageType::GameReset, MessageType::GameState]
        );
    }

    #[test]
    fn reset_einer_wartenden_partie_ist_ohne_wirkung() {
        let mut aufbau = Aufbau::neu();
        let (ann, mut rx_ann) = aufbau.spieler("Ann");
        let (bo, _) = aufbau.spieler("Bo");
        aufbau.session.spiel_starten(&ann).unwrap();
        aufbau.session.reset_anfordern(&bo);
        let epoch = aufbau.session.epoch();
        let brett_vorher = aufbau.session.brett().ansicht();
        leeren(&mut rx_ann);

        aufbau.session.reset_anfordern(&ann);
        aufbau.session.reset_anfordern(&bo);

        assert_eq!(aufbau.session.epoch(), epoch);
        assert_eq!(aufbau.session.brett().ansicht(), brett_vorher);
        assert!(leeren(&mut rx_ann).is_empty());
    }
}
