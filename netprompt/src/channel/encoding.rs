//! Character decoding of shell output.

use serde::Deserialize;

/// Character encoding of device output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,

    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,

    #[serde(rename = "ascii")]
    Ascii,
}

impl Encoding {
    /// Create a streaming decoder for this encoding.
    pub fn decoder(self) -> Decoder {
        Decoder {
            encoding: self,
            carry: Vec::new(),
        }
    }

    /// Decode a complete byte string, replacing invalid input.
    pub fn decode(self, bytes: &[u8]) -> String {
        let mut decoder = self.decoder();
        let mut text = decoder.decode(bytes);
        text.push_str(&decoder.finish());
        text
    }
}

/// Streaming decoder that keeps incomplete multi-byte sequences between
/// chunks instead of mangling them.
#[derive(Debug)]
pub struct Decoder {
    encoding: Encoding,
    carry: Vec<u8>,
}

impl Decoder {
    /// Decode the next chunk.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        match self.encoding {
            Encoding::Utf8 => self.decode_utf8(bytes),
            Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Encoding::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
                .collect(),
        }
    }

    /// Flush a dangling partial sequence as a replacement character.
    pub fn finish(&mut self) -> String {
        if self.carry.is_empty() {
            String::new()
        } else {
            self.carry.clear();
            '\u{FFFD}'.to_string()
        }
    }

    fn decode_utf8(&mut self, bytes: &[u8]) -> String {
        let mut data = std::mem::take(&mut self.carry);
        data.extend_from_slice(bytes);

        let mut text = String::with_capacity(data.len());
        let mut rest = data.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(bad) => {
                            text.push('\u{FFFD}');
                            rest = &tail[bad..];
                        }
                        None => {
                            self.carry = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }
}
