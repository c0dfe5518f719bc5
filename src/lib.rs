//! # `lytkit` main library
//!
//! This library reads, writes, and converts the two stream formats used to
//! interchange IC layouts: GDSII Stream and OASIS.
//!
//! ## Architecture
//!
//! Each format is handled by a symmetric pair of objects:
//! * a *parser* that scans the file and announces what it finds through a
//!   builder trait (`gdsii::GdsBuilder` or `oasis::OasisBuilder`)
//! * a *creator* that implements the same builder trait and writes a file
//!
//! Because creators implement the builder traits, a parser for one format can
//! stream directly into a creator for the same format (a copy) or, through
//! the adapters in `conv`, into a creator for the other format (a
//! conversion).  Nothing ever holds more than one cell's worth of layout.
//!
//! ## Modules
//!
//! * `fio` opens the underlying files, hiding gzip compression
//! * `gdsii` contains the GDSII record scanner/writer and the parser/creator
//!   pair built on them
//! * `oasis` contains the OASIS codec: variable-length integers, reals,
//!   repetitions, name tables, modal variables, validation signatures
//! * `conv` contains the cross-format converters and the point grouper that
//!   folds scattered element positions into compact OASIS repetitions
//! * `commands` runs the CLI subcommands

pub mod fio;
pub mod gdsii;
pub mod oasis;
pub mod conv;
pub mod commands;

use std::fmt::Write;

type DYNERR = Box<dyn std::error::Error>;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Handler for minor deviations a parser chooses to tolerate.
/// Parsers call this with a formatted message; if no handler is
/// registered the message goes to the log instead.
pub type WarningHandler<'a> = &'a mut dyn FnMut(&str);

/// This takes any bytes and makes an ascii friendly string
/// by using hex escapes, e.g., `\xFF`.  Double quotes and backslashes
/// are escaped too so the result can be wrapped in quotes and read back.
pub fn escaped_ascii_from_bytes(bytes: &[u8]) -> String {
    let mut result = String::new();
    for b in bytes {
        match *b {
            0x22 => result += "\\\"",
            0x5c => result += "\\\\",
            x if x>=0x20 && x<=0x7e => result.push(x as char),
            x => {
                let mut temp = String::new();
                write!(&mut temp,"\\x{:02X}",x).expect("unreachable");
                result += &temp;
            }
        }
    }
    return result;
}

/// Interpret a quoted-string body as pure ascii and put into bytes,
/// undoing the escapes produced by `escaped_ascii_from_bytes`.
/// Unrecognized escapes and non-ascii characters are omitted.
pub fn parse_escaped_ascii(s: &str) -> Vec<u8> {
    let mut ans: Vec<u8> = Vec::new();
    let hex_patt = regex::Regex::new(r"^\\x[0-9A-Fa-f][0-9A-Fa-f]").expect("unreachable");
    let mut curs = 0;
    let bytes = s.as_bytes();
    while curs < bytes.len() {
        if bytes[curs]==0x5c {
            if let Some(hex) = hex_patt.find(&s[curs..]) {
                ans.append(&mut hex::decode(&s[curs+2..curs+4]).expect("unreachable"));
                curs += hex.end();
                continue;
            }
            if curs+1 < bytes.len() && (bytes[curs+1]==0x22 || bytes[curs+1]==0x5c) {
                ans.push(bytes[curs+1]);
                curs += 2;
                continue;
            }
        }
        if bytes[curs].is_ascii() {
            ans.push(bytes[curs]);
        }
        curs += 1;
    }
    return ans;
}

#[test]
fn test_escapes() {
    let raw: Vec<u8> = vec![0x41,0x42,0x00,0x22,0x5c,0x7f];
    let escaped = escaped_ascii_from_bytes(&raw);
    assert_eq!(escaped,"AB\\x00\\\"\\\\\\x7F");
    assert_eq!(parse_escaped_ascii(&escaped),raw);
}
