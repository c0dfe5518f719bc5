//! # GDSII record types
//!
//! Each record type has a fixed descriptor giving its data kind, item size,
//! and legal body lengths.  The scanner uses the table to sanity-check input
//! records, the writer to enforce data kinds at the call site, and the ASCII
//! converter to name records.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Record-type byte values.  Some of these are declared unused by the
/// spec; their descriptors are marked invalid and the scanner aborts
/// if one appears.
#[derive(FromPrimitive,Clone,Copy,PartialEq,Eq,Debug,Hash)]
pub enum RecType {
    Header = 0,
    BgnLib = 1,
    LibName = 2,
    Units = 3,
    EndLib = 4,
    BgnStr = 5,
    StrName = 6,
    EndStr = 7,
    Boundary = 8,
    Path = 9,
    Sref = 10,
    Aref = 11,
    Text = 12,
    Layer = 13,
    Datatype = 14,
    Width = 15,
    Xy = 16,
    EndEl = 17,
    Sname = 18,
    ColRow = 19,
    TextNode = 20,
    Node = 21,
    TextType = 22,
    Presentation = 23,
    Spacing = 24,
    String = 25,
    Strans = 26,
    Mag = 27,
    Angle = 28,
    Uinteger = 29,
    Ustring = 30,
    RefLibs = 31,
    Fonts = 32,
    PathType = 33,
    Generations = 34,
    AttrTable = 35,
    StypTable = 36,
    StrType = 37,
    ElFlags = 38,
    ElKey = 39,
    LinkType = 40,
    LinkKeys = 41,
    NodeType = 42,
    PropAttr = 43,
    PropValue = 44,
    Box = 45,
    BoxType = 46,
    Plex = 47,
    BgnExtn = 48,
    EndExtn = 49,
    TapeNum = 50,
    TapeCode = 51,
    StrClass = 52,
    Reserved = 53,
    Format = 54,
    Mask = 55,
    EndMasks = 56,
    LibDirSize = 57,
    SrfName = 58,
    LibSecur = 59,
    Border = 60,
    SoftFence = 61,
    HardFence = 62,
    SoftWire = 63,
    HardWire = 64,
    PathPort = 65,
    NodePort = 66,
    UserConstraint = 67,
    SpacerError = 68,
    Contact = 69
}

pub const MAX_REC_TYPE: u8 = 69;

/// Kind of data carried in a record body.  The GDSII 4-byte float
/// (data type 4) is defined but never used, so it is absent here.
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum DataKind {
    None,
    BitArray,
    Short,
    Int,
    Double,
    Str
}

impl DataKind {
    /// the data-type byte stored in the record header
    pub fn type_byte(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::BitArray => 1,
            Self::Short => 2,
            Self::Int => 3,
            Self::Double => 5,
            Self::Str => 6
        }
    }
}

/// Descriptor for one record type.  `item_size` is 0 for records with no
/// data or a single variable-length string; for records holding fixed
/// 44-byte strings it is 44.  Lengths bound the record *body*, header
/// excluded, and are always even.
pub struct RecTypeInfo {
    pub valid: bool,
    pub kind: DataKind,
    pub item_size: u16,
    pub min_len: u16,
    pub max_len: u16,
    pub name: &'static str
}

// REFLIBS may hold 2..17 library names of 44 bytes each.  The spec is not
// clear whether 15 or 2+15 are allowed, so the bounds here come from the
// wider reading.  LIBNAME's minimum should be 2 but empty LIBNAME records
// exist in the wild.
const RL_MIN: u16 = 44*2;
const RL_MAX: u16 = 44*17;

const REC_TYPE_INFO: [RecTypeInfo;70] = [
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 2,      max_len: 2,      name: "HEADER" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 24,     max_len: 24,     name: "BGNLIB" },
    RecTypeInfo { valid: true,  kind: DataKind::Str,      item_size: 0,  min_len: 0,      max_len: 65530,  name: "LIBNAME" },
    RecTypeInfo { valid: true,  kind: DataKind::Double,   item_size: 8,  min_len: 16,     max_len: 16,     name: "UNITS" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "ENDLIB" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 24,     max_len: 24,     name: "BGNSTR" },
    RecTypeInfo { valid: true,  kind: DataKind::Str,      item_size: 0,  min_len: 2,      max_len: 65530,  name: "STRNAME" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "ENDSTR" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "BOUNDARY" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "PATH" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "SREF" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "AREF" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "TEXT" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 2,      max_len: 2,      name: "LAYER" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 2,      max_len: 2,      name: "DATATYPE" },
    RecTypeInfo { valid: true,  kind: DataKind::Int,      item_size: 4,  min_len: 4,      max_len: 4,      name: "WIDTH" },
    RecTypeInfo { valid: true,  kind: DataKind::Int,      item_size: 4,  min_len: 8,      max_len: 65528,  name: "XY" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "ENDEL" },
    RecTypeInfo { valid: true,  kind: DataKind::Str,      item_size: 0,  min_len: 2,      max_len: 65530,  name: "SNAME" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 4,      max_len: 4,      name: "COLROW" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "TEXTNODE" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "NODE" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 2,      max_len: 2,      name: "TEXTTYPE" },
    RecTypeInfo { valid: true,  kind: DataKind::BitArray, item_size: 2,  min_len: 2,      max_len: 2,      name: "PRESENTATION" },
    RecTypeInfo { valid: false, kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "SPACING" },
    RecTypeInfo { valid: true,  kind: DataKind::Str,      item_size: 0,  min_len: 0,      max_len: 65530,  name: "STRING" },
    RecTypeInfo { valid: true,  kind: DataKind::BitArray, item_size: 2,  min_len: 2,      max_len: 2,      name: "STRANS" },
    RecTypeInfo { valid: true,  kind: DataKind::Double,   item_size: 8,  min_len: 8,      max_len: 8,      name: "MAG" },
    RecTypeInfo { valid: true,  kind: DataKind::Double,   item_size: 8,  min_len: 8,      max_len: 8,      name: "ANGLE" },
    RecTypeInfo { valid: false, kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "UINTEGER" },
    RecTypeInfo { valid: false, kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "USTRING" },
    RecTypeInfo { valid: true,  kind: DataKind::Str,      item_size: 44, min_len: RL_MIN, max_len: RL_MAX, name: "REFLIBS" },
    RecTypeInfo { valid: true,  kind: DataKind::Str,      item_size: 44, min_len: 176,    max_len: 176,    name: "FONTS" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 2,      max_len: 2,      name: "PATHTYPE" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 2,      max_len: 2,      name: "GENERATIONS" },
    RecTypeInfo { valid: true,  kind: DataKind::Str,      item_size: 0,  min_len: 0,      max_len: 65530,  name: "ATTRTABLE" },
    RecTypeInfo { valid: false, kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "STYPTABLE" },
    RecTypeInfo { valid: false, kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "STRTYPE" },
    RecTypeInfo { valid: true,  kind: DataKind::BitArray, item_size: 2,  min_len: 2,      max_len: 2,      name: "ELFLAGS" },
    RecTypeInfo { valid: false, kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "ELKEY" },
    RecTypeInfo { valid: false, kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "LINKTYPE" },
    RecTypeInfo { valid: false, kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "LINKKEYS" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 2,      max_len: 2,      name: "NODETYPE" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 2,      max_len: 2,      name: "PROPATTR" },
    RecTypeInfo { valid: true,  kind: DataKind::Str,      item_size: 0,  min_len: 0,      max_len: 65530,  name: "PROPVALUE" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "BOX" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 2,      max_len: 2,      name: "BOXTYPE" },
    RecTypeInfo { valid: true,  kind: DataKind::Int,      item_size: 4,  min_len: 4,      max_len: 4,      name: "PLEX" },
    RecTypeInfo { valid: true,  kind: DataKind::Int,      item_size: 4,  min_len: 4,      max_len: 4,      name: "BGNEXTN" },
    RecTypeInfo { valid: true,  kind: DataKind::Int,      item_size: 4,  min_len: 4,      max_len: 4,      name: "ENDEXTN" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 2,      max_len: 2,      name: "TAPENUM" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 12,     max_len: 12,     name: "TAPECODE" },
    RecTypeInfo { valid: true,  kind: DataKind::BitArray, item_size: 2,  min_len: 2,      max_len: 2,      name: "STRCLASS" },
    RecTypeInfo { valid: false, kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "RESERVED" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 2,      max_len: 2,      name: "FORMAT" },
    RecTypeInfo { valid: true,  kind: DataKind::Str,      item_size: 0,  min_len: 2,      max_len: 65530,  name: "MASK" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "ENDMASKS" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 2,      max_len: 2,      name: "LIBDIRSIZE" },
    RecTypeInfo { valid: true,  kind: DataKind::Str,      item_size: 0,  min_len: 2,      max_len: 65530,  name: "SRFNAME" },
    RecTypeInfo { valid: true,  kind: DataKind::Short,    item_size: 2,  min_len: 6,      max_len: 192,    name: "LIBSECUR" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "BORDER" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "SOFTFENCE" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "HARDFENCE" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "SOFTWIRE" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "HARDWIRE" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "PATHPORT" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "NODEPORT" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "USERCONSTRAINT" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "SPACER_ERROR" },
    RecTypeInfo { valid: true,  kind: DataKind::None,     item_size: 0,  min_len: 0,      max_len: 0,      name: "CONTACT" }
];

impl RecType {
    pub fn info(&self) -> &'static RecTypeInfo {
        &REC_TYPE_INFO[*self as usize]
    }
    pub fn name(&self) -> &'static str {
        self.info().name
    }
    pub fn data_kind(&self) -> DataKind {
        self.info().kind
    }
    /// true if the byte names a record type the spec actually uses
    pub fn is_valid(rec_type: u8) -> bool {
        rec_type <= MAX_REC_TYPE && REC_TYPE_INFO[rec_type as usize].valid
    }
    /// name for any record-type byte in range, valid or not, for diagnostics
    pub fn name_of(rec_type: u8) -> Option<&'static str> {
        match rec_type <= MAX_REC_TYPE {
            true => Some(REC_TYPE_INFO[rec_type as usize].name),
            false => None
        }
    }
    pub fn from_byte(rec_type: u8) -> Option<Self> {
        match Self::is_valid(rec_type) {
            true => FromPrimitive::from_u8(rec_type),
            false => None
        }
    }
    /// look up a record type from its ASCII name, case-insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.to_uppercase();
        for j in 0..REC_TYPE_INFO.len() {
            if REC_TYPE_INFO[j].valid && REC_TYPE_INFO[j].name==upper {
                return FromPrimitive::from_usize(j);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn descriptor_sanity() {
        // every descriptor length pair must be even and ordered
        for j in 0..REC_TYPE_INFO.len() {
            let rti = &REC_TYPE_INFO[j];
            assert_eq!(rti.min_len % 2,0,"{}",rti.name);
            assert_eq!(rti.max_len % 2,0,"{}",rti.name);
            assert!(rti.min_len <= rti.max_len,"{}",rti.name);
        }
    }
    #[test]
    fn invalid_types() {
        for t in [24u8,29,30,36,37,39,40,41,53] {
            assert!(!RecType::is_valid(t));
        }
        assert!(!RecType::is_valid(70));
        assert!(RecType::is_valid(16));
    }
    #[test]
    fn lookup() {
        assert_eq!(RecType::from_name("xy"),Some(RecType::Xy));
        assert_eq!(RecType::from_name("BGNLIB"),Some(RecType::BgnLib));
        assert_eq!(RecType::from_name("SPACING"),None);
        assert_eq!(RecType::from_byte(16),Some(RecType::Xy));
        assert_eq!(RecType::Xy.info().item_size,4);
    }
}
