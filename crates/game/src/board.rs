//! Spielbrett – 6x6 Memory-Raster
//!
//! 36 Zellen (Index 0..36, Zeile = idx / 6, Spalte = idx % 6). Jeder
//! Kartenwert 1..=18 liegt genau zweimal auf dem Brett. Eine Zelle ist
//! entweder verdeckt oder gefunden; aufgedeckte Karten werden separat in
//! der Liste der geoeffneten Positionen (hoechstens zwei) gefuehrt.
//!
//! ## Ablauf eines Zugs
//! ```text
//! karte_oeffnen(a) -> karte_oeffnen(b) -> [Aufdeck-Pause]
//!     -> paar_pruefen() -> geoeffnete_leeren()
//! ```

use memo_core::{BRETT_GROESSE, PAAR_ANZAHL, ZELLEN_ANZAHL};
use memo_protocol::ZellenAnsicht;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// Maximal gleichzeitig geoeffnete Karten
const MAX_GEOEFFNET: usize = 2;

/// Zustand einer Zelle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZellenZustand {
    Verdeckt,
    Gefunden,
}

/// Das Spielbrett
#[derive(Debug, Clone)]
pub struct Board {
    werte: [u8; ZELLEN_ANZAHL],
    zustaende: [ZellenZustand; ZELLEN_ANZAHL],
    /// Aufgedeckte, noch nicht ausgewertete Positionen (in Reihenfolge)
    geoeffnet: Vec<usize>,
    /// Gesetzt sobald alle Paare gefunden sind
    beendet: bool,
}

impl Board {
    /// Erstellt ein frisch gemischtes Brett
    pub fn neu() -> Self {
        Self::mit_rng(&mut rand::thread_rng())
    }

    /// Erstellt ein gemischtes Brett mit dem uebergebenen Zufallsgenerator
    pub fn mit_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut werte: Vec<u8> = (1..=PAAR_ANZAHL).flat_map(|w| [w, w]).collect();
        werte.shuffle(rng);

        let mut feld = [0u8; ZELLEN_ANZAHL];
        feld.copy_from_slice(&werte);
        Self::aus_feld(feld)
    }

    /// Erstellt ein Brett mit fest vorgegebener Belegung
    ///
    /// Gibt `None` zurueck wenn nicht jeder Wert 1..=18 genau zweimal vorkommt.
    pub fn aus_werten(werte: [u8; ZELLEN_ANZAHL]) -> Option<Self> {
        let mut anzahl = [0u8; PAAR_ANZAHL as usize + 1];
        for &wert in &werte {
            if wert == 0 || wert > PAAR_ANZAHL {
                return None;
            }
            anzahl[wert as usize] += 1;
        }
        if anzahl[1..].iter().any(|&n| n != 2) {
            return None;
        }
        Some(Self::aus_feld(werte))
    }

    fn aus_feld(werte: [u8; ZELLEN_ANZAHL]) -> Self {
        Self {
            werte,
            zustaende: [ZellenZustand::Verdeckt; ZELLEN_ANZAHL],
            geoeffnet: Vec::with_capacity(MAX_GEOEFFNET),
            beendet: false,
        }
    }

    /// Kartenwert an einer Position
    pub fn wert(&self, position: usize) -> Option<u8> {
        self.werte.get(position).copied()
    }

    /// Zustand einer Zelle
    pub fn zustand(&self, position: usize) -> Option<ZellenZustand> {
        self.zustaende.get(position).copied()
    }

    /// Zeile und Spalte einer Position
    pub fn koordinaten(position: usize) -> (usize, usize) {
        (position / BRETT_GROESSE, position % BRETT_GROESSE)
    }

    /// Aufgedeckte, noch nicht ausgewertete Positionen
    pub fn geoeffnete(&self) -> &[usize] {
        &self.geoeffnet
    }

    /// Gibt true zurueck wenn alle Paare gefunden wurden
    pub fn ist_beendet(&self) -> bool {
        self.beendet
    }

    /// Deckt eine Karte auf
    ///
    /// Abgelehnt wenn bereits zwei Karten offen sind, das Spiel beendet ist
    /// oder die Position ausserhalb des Bretts liegt. Doppelte Positionen
    /// filtert der Aufrufer.
    pub fn karte_oeffnen(&mut self, position: usize) -> bool {
        if self.geoeffnet.len() >= MAX_GEOEFFNET || self.beendet || position >= ZELLEN_ANZAHL {
            return false;
        }
        self.geoeffnet.push(position);
        true
    }

    /// Vergleicht die zwei geoeffneten Karten
    ///
    /// Nur gueltig mit genau zwei offenen Karten, sonst `false`. Bei einem
    /// Treffer werden beide Zellen als gefunden markiert. Die Liste der
    /// geoeffneten Positionen bleibt unveraendert.
    pub fn paar_pruefen(&mut self) -> bool {
        let [a, b] = match self.geoeffnet.as_slice() {
            [a, b] => [*a, *b],
            _ => return false,
        };

        let treffer = a != b && self.werte[a] == self.werte[b];
        if treffer {
            self.zustaende[a] = ZellenZustand::Gefunden;
            self.zustaende[b] = ZellenZustand::Gefunden;
            self.beendet = self.vollstaendig_aufgedeckt();
        }
        treffer
    }

    /// Leert die Liste der geoeffneten Positionen
    pub fn geoeffnete_leeren(&mut self) {
        self.geoeffnet.clear();
    }

    /// Gibt true zurueck wenn jede Zelle gefunden ist
    pub fn vollstaendig_aufgedeckt(&self) -> bool {
        self.zustaende.iter().all(|z| *z == ZellenZustand::Gefunden)
    }

    /// Client-Sicht auf alle Zellen
    ///
    /// Geoeffnete, noch verdeckte Zellen werden mit ihrem Wert gezeigt.
    pub fn ansicht(&self) -> BTreeMap<usize, ZellenAnsicht> {
        (0..ZELLEN_ANZAHL)
            .map(|pos| {
                let ansicht = match self.zustaende[pos] {
                    ZellenZustand::Gefunden => ZellenAnsicht::Gefunden,
                    ZellenZustand::Verdeckt if self.geoeffnet.contains(&pos) => {
                        ZellenAnsicht::Offen(self.werte[pos])
                    }
                    ZellenZustand::Verdeckt => ZellenAnsicht::Verdeckt,
                };
                (pos, ansicht)
            })
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
