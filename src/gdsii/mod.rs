//! # GDSII Stream Module
//!
//! GDSII files are flat sequences of framed records.  Every record starts
//! with a 4-byte header: a big-endian length that includes the header, the
//! record type, and the data type.  The modules here are layered:
//!
//! * `rectypes` knows the fixed descriptor for each of the 70 record types
//! * `real` converts between the host `f64` and the 8-byte IBM-370 reals
//! * `scanner`/`writer` frame and unframe records over buffered file I/O
//! * `parser` walks the record grammar and announces structures, elements,
//!   and properties through the `GdsBuilder` trait
//! * `creator` implements `GdsBuilder` to write a conforming file, so a
//!   parser can stream straight into it
//! * `ascii` is a record-by-record text form used by the `gds2ascii` and
//!   `ascii2gds` subcommands
//!
//! The parser tolerates a number of common deviations from the published
//! spec (see `parser` docs); the creator always emits conforming records.

pub mod rectypes;
pub mod real;
pub mod scanner;
pub mod writer;
pub mod builder;
pub mod parser;
pub mod creator;
pub mod ascii;

/// Enumerates GDSII errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("file '{0}', offset {1}: {2}")]
    Format(String,u64,String),
    #[error("file '{0}': {1}")]
    Create(String,String),
    #[error("arithmetic overflow: {0} {1} {2}")]
    Overflow(i64,&'static str,i64),
    #[error("structure '{0}' not found")]
    StructureNotFound(String)
}

pub const RECORD_HEADER_LENGTH: usize = 4;
/// max bytes in a record, including the header
pub const MAX_RECORD_LENGTH: usize = 65534;

pub const MAX_AREF_ROWS: i16 = 32767;
pub const MAX_AREF_COLUMNS: i16 = 32767;
pub const MIN_BOUNDARY_POINTS: usize = 4;
pub const MAX_BOUNDARY_POINTS: usize = 8191;
pub const MIN_PATH_POINTS: usize = 2;
pub const MAX_PATH_POINTS: usize = 8191;
pub const MIN_NODE_POINTS: usize = 1;
pub const MAX_NODE_POINTS: usize = 8191;
pub const BOX_POINTS: usize = 5;
/// layer and the various type numbers must fit a 2-byte integer,
/// the spec's 0..255 range is deliberately not enforced
pub const MAX_LAYER: i16 = 32767;

/// A single point in database units.  GDSII coordinates are 32-bit.
#[derive(Clone,Copy,PartialEq,Eq,Hash,Debug)]
pub struct GdsPoint {
    pub x: i32,
    pub y: i32
}

impl GdsPoint {
    pub fn new(x: i32,y: i32) -> Self {
        Self { x, y }
    }
}

pub use builder::GdsBuilder;
pub use parser::{GdsParser,GdsGraphBuilder,FileIndex};
pub use creator::GdsCreator;
