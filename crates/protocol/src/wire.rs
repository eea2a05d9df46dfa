//! Wire-Format fuer TCP-Verbindungen
//!
//! Zeilenbasiertes Protokoll: jede Nachricht endet mit `\n`. Ein
//! vorangestelltes `\r` wird toleriert und entfernt. Leere Zeilen werden
//! uebersprungen, eine unvollstaendige Zeile bleibt bis zum naechsten Lesen
//! im Buffer und wird nie weitergereicht.
//!
//! ```text
//! 1|Ann\n2|17\r\n7\n
//! ```

use bytes::{BufMut, BytesMut};
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

use crate::message::Message;

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Zeilenlaenge (8 KB)
pub const DEFAULT_MAX_ZEILEN_LAENGE: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// LineCodec
// ---------------------------------------------------------------------------

/// tokio-util Codec fuer zeilenbasierte TCP-Verbindungen
///
/// Der `BytesMut` des `Framed` ist der wachsende Puffer pro Verbindung.
/// `naechster_index` merkt sich, bis wohin bereits nach `\n` gesucht wurde,
/// damit Teilzeilen nicht bei jedem Lesen neu durchsucht werden.
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_zeilen_laenge: usize,
    naechster_index: usize,
}

impl LineCodec {
    /// Erstellt einen neuen `LineCodec` mit Standard-Limit
    pub fn new() -> Self {
        Self::with_max_laenge(DEFAULT_MAX_ZEILEN_LAENGE)
    }

    /// Erstellt einen `LineCodec` mit benutzerdefinierter maximaler Zeilenlaenge
    pub fn with_max_laenge(max_zeilen_laenge: usize) -> Self {
        Self {
            max_zeilen_laenge,
            naechster_index: 0,
        }
    }

    /// Gibt die konfigurierte maximale Zeilenlaenge zurueck
    pub fn max_zeilen_laenge(&self) -> usize {
        self.max_zeilen_laenge
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Entfernt abschliessende `\r`/`\n` und dekodiert UTF-8 verlustbehaftet
fn zeile_bereinigen(roh: &[u8]) -> String {
    let mut ende = roh.len();
    while ende > 0 && matches!(roh[ende - 1], b'\n' | b'\r') {
        ende -= 1;
    }
    String::from_utf8_lossy(&roh[..ende]).into_owned()
}

fn zu_lang(laenge: usize, max: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("Zeile zu lang: {laenge} Bytes (Maximum: {max} Bytes)"),
    )
}

// ---------------------------------------------------------------------------
// Decoder-Implementierung
// ---------------------------------------------------------------------------

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let gesucht = &src[self.naechster_index..];
            match gesucht.iter().position(|b| *b == b'\n') {
                Some(offset) => {
                    let zeilenende = self.naechster_index + offset;
                    self.naechster_index = 0;

                    let mut laenge = zeilenende;
                    if laenge > 0 && src[laenge - 1] == b'\r' {
                        laenge -= 1;
                    }
                    if laenge > self.max_zeilen_laenge {
                        return Err(zu_lang(laenge, self.max_zeilen_laenge));
                    }

                    let ende = zeilenende + 1;
                    let roh = src.split_to(ende);
                    let zeile = zeile_bereinigen(&roh);
                    if zeile.is_empty() {
                        continue;
                    }
                    return Ok(Some(zeile));
                }
                None => {
                    if src.len() > self.max_zeilen_laenge {
                        return Err(zu_lang(src.len(), self.max_zeilen_laenge));
                    }
                    self.naechster_index = src.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(zeile) => Ok(Some(zeile)),
            None => {
                // Teilzeile ohne Zeilenende beim Verbindungsende verwerfen
                src.clear();
                self.naechster_index = 0;
                Ok(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder-Implementierung
// ---------------------------------------------------------------------------

impl Encoder<Message> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let zeile = item.kodieren();
        dst.reserve(zeile.len() + 1);
        dst.put_slice(zeile.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Hilfsfunktionen fuer direktes async Schreiben
// ---------------------------------------------------------------------------

/// Schreibt eine einzelne Nachricht als Zeile in einen `AsyncWrite`
///
/// Wird fuer Verbindungen genutzt, die nie ein `Framed` bekommen (z.B.
/// abgelehnte Verbindungen bei vollem Server).
pub async fn write_zeile<W>(writer: &mut W, message: &Message) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut zeile = message.kodieren();
    zeile.push('\n');
    writer.write_all(zeile.as_bytes()).await?;
    writer.flush().await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;

    #[test]
    fn vollstaendige_zeilen_werden_dekodiert() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"1|Ann\n2|17\n"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("1|Ann"));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("2|17"));
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn teilzeile_bleibt_im_buffer() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"3|hal"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"3|hal");

        buf.extend_from_slice(b"lo\n7");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("3|hallo"));
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"7");
    }

    #[test]
    fn carriage_return_und_leerzeilen() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"\r\n\n7\r\n"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("7"));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn zu_lange_zeile_ist_fehler() {
        let mut codec = LineCodec::with_max_laenge(8);
        let mut buf = BytesMut::from(&b"3|0123456789"[..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn vollstaendige_zu_lange_zeile_ist_fehler() {
        let mut codec = LineCodec::with_max_laenge(8);
        assert_eq!(codec.max_zeilen_laenge(), 8);

        let mut buf = BytesMut::from(&b"3|0123456789abcdef\n"[..]);
        let fehler = codec.decode(&mut buf).unwrap_err();
        assert_eq!(fehler.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn zeile_genau_am_limit_ist_erlaubt() {
        let mut codec = LineCodec::with_max_laenge(8);
        let mut buf = BytesMut::from(&b"3|012345\r\n3|0123456\n"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("3|012345"));
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn teilzeile_bei_eof_wird_verworfen() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"9\n2|1"[..]);

        assert_eq!(codec.decode_eof(&mut buf).unwrap().as_deref(), Some("9"));
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn encoder_haengt_zeilenende_an() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Message::player_turn("Bo"), &mut buf).unwrap();
        assert_eq!(&buf[..], b"8|Bo\n");

        let zeile = codec.decode(&mut buf).unwrap().expect("Zeile erwartet");
        let msg = Message::parse(&zeile).unwrap();
        assert_eq!(msg.typ, MessageType::PlayerTurn);
    }

    #[tokio::test]
    async fn write_zeile_schreibt_eine_zeile() {
        let mut buffer: Vec<u8> = Vec::new();
        write_zeile(&mut buffer, &Message::error("voll")).await.unwrap();
        assert_eq!(buffer, b"5|voll\n");
    }
}
