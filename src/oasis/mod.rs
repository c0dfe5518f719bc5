//! # OASIS Module
//!
//! OASIS files are sequences of variable-length records identified by a
//! one-byte id.  All integers use a 7-bits-per-byte little-endian encoding;
//! most record fields can be omitted, in which case the value comes from a
//! *modal variable* carried by the parser or creator.  Names (cells, text
//! strings, property names and strings, layer names, extension names) live
//! in per-kind tables and are referenced by small integers.
//!
//! The layering mirrors the GDSII side:
//!
//! * `scanner`/`writer` encode and decode the primitive field types
//! * `oreal`, `rep`, `names`, `modal`, `trapezoid` hold the value types
//! * `parser` resolves modal state and drives an `OasisBuilder`
//! * `creator` implements `OasisBuilder`, choosing compact encodings
//! * `validate` recomputes the END record's CRC or checksum
//! * `printer` is an `OasisBuilder` that renders every event as text

pub mod oreal;
pub mod rep;
pub mod names;
pub mod modal;
pub mod trapezoid;
pub mod scanner;
pub mod writer;
pub mod builder;
pub mod parser;
pub mod creator;
pub mod printer;
pub mod validate;

use num_derive::FromPrimitive;
use crate::DYNERR;

/// Enumerates OASIS errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("file '{0}', offset {1}: {2}")]
    Format(String,u64,String),
    #[error("file '{0}': {1}")]
    Create(String,String),
    #[error("validation failed for '{0}': {1}")]
    Validation(String,String),
    #[error("trapezoid delta_a {0}, delta_b {1} cross within span {2}")]
    BadTrapezoid(i64,i64,i64),
    #[error("arithmetic overflow: {0} {1} {2}")]
    Overflow(i64,&'static str,i64)
}

/// Every OASIS file starts with these bytes.
pub const MAGIC: &[u8;13] = b"%SEMI-OASIS\r\n";
/// The END record is padded to exactly this many bytes.
pub const END_RECORD_LENGTH: usize = 256;
pub const VERSION_STRING: &str = "1.0";

/// The 35 record ids.
#[derive(FromPrimitive,Clone,Copy,PartialEq,Eq,Debug)]
pub enum RecId {
    Pad = 0,
    Start = 1,
    End = 2,
    Cellname = 3,
    CellnameRef = 4,
    Textstring = 5,
    TextstringRef = 6,
    Propname = 7,
    PropnameRef = 8,
    Propstring = 9,
    PropstringRef = 10,
    LayernameGeometry = 11,
    LayernameText = 12,
    CellRef = 13,
    CellNamed = 14,
    XyAbsolute = 15,
    XyRelative = 16,
    Placement = 17,
    PlacementTransform = 18,
    Text = 19,
    Rectangle = 20,
    Polygon = 21,
    Path = 22,
    Trapezoid = 23,
    TrapezoidA = 24,
    TrapezoidB = 25,
    Ctrapezoid = 26,
    Circle = 27,
    Property = 28,
    PropertyRepeat = 29,
    Xname = 30,
    XnameRef = 31,
    Xelement = 32,
    Xgeometry = 33,
    Cblock = 34
}

pub fn checked_plus(x: i64,y: i64) -> Result<i64,DYNERR> {
    match x.checked_add(y) {
        Some(v) => Ok(v),
        None => Err(Box::new(Error::Overflow(x,"+",y)))
    }
}

pub fn checked_minus(x: i64,y: i64) -> Result<i64,DYNERR> {
    match x.checked_sub(y) {
        Some(v) => Ok(v),
        None => Err(Box::new(Error::Overflow(x,"-",y)))
    }
}

pub fn checked_mult(x: i64,y: i64) -> Result<i64,DYNERR> {
    match x.checked_mul(y) {
        Some(v) => Ok(v),
        None => Err(Box::new(Error::Overflow(x,"*",y)))
    }
}

pub use oreal::Oreal;
pub use rep::{Delta,Repetition,coord_in_reach,point_in_reach};
pub use names::{OasisName,NameTable,LayerName,Interval,Property,PropValue};
pub use builder::OasisBuilder;
pub use parser::{OasisParser,OasisParserOptions};
pub use creator::OasisCreator;
pub use validate::{Validation,ValScheme};
pub use trapezoid::Trapezoid;
