//! Optional cleanup of raw shell output.
//!
//! Responses are always kept raw; these helpers produce a cleaned copy on
//! request.

use regex::Regex;
use vte::{Parser, Perform};

/// Remove ANSI/VT escape sequences and non-printing control bytes.
///
/// Backspaces erase the previous character, which is how many devices wipe a
/// `--More--` banner after the continuation key.
pub fn strip_control(text: &str) -> String {
    let mut printer = Printer::default();
    let mut parser = Parser::new();
    parser.advance(&mut printer, text.as_bytes());
    printer.out
}

/// Remove pagination banners and the whitespace that follows them.
pub fn strip_pagination(text: &str, markers: &[String]) -> String {
    if markers.is_empty() {
        return text.to_string();
    }
    let alternatives: Vec<String> = markers.iter().map(|m| regex::escape(m)).collect();
    match Regex::new(&format!(r"(?:{})\s*", alternatives.join("|"))) {
        Ok(re) => re.replace_all(text, "").into_owned(),
        Err(_) => text.to_string(),
    }
}

#[derive(Default)]
struct Printer {
    out: String,
}

impl Perform for Printer {
    fn print(&mut self, c: char) {
        self.out.push(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | b'\r' | b'\t' => self.out.push(byte as char),
            0x08 => {
                self.out.pop();
            }
            _ => {}
        }
    }
}
