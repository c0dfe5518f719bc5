//! # Conversion Module
//!
//! The cross-format pipeline: a parser for one format streams into a
//! creator for the other through a converting builder, never holding more
//! than one cell.
//!
//! * `ptgroup` recognizes regular patterns in element positions and packs
//!   them into compact repetitions
//! * `gds2oasis` buffers a cell's elements, merges identical ones, and
//!   writes them with grouped repetitions
//! * `oasis2gds` expands repetitions back out, one GDSII element per
//!   placement, except for matrix placements which become AREFs

pub mod ptgroup;
pub mod gds2oasis;
pub mod oasis2gds;

/// Enumerates conversion errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("cannot convert: {0}")]
    Unconvertible(String),
    #[error("coordinate {0} is outside the 32-bit range of GDSII")]
    CoordRange(i64),
    #[error("{0} value {1} is outside the GDSII range")]
    TypeRange(&'static str,u64)
}

/// XGEOMETRY records carrying this attribute hold a GDSII NODE element,
/// the one GDSII element with no OASIS counterpart.  The value is the
/// GDSII record type of NODE.
pub const NODE_XGEOMETRY_ATTRIBUTE: u64 = 21;

pub use ptgroup::PointGrouper;
pub use gds2oasis::{GdsToOasisOptions,convert_gds_to_oasis};
pub use oasis2gds::convert_oasis_to_gds;
