//! # OASIS parser
//!
//! `OasisParser` walks the record stream and drives an `OasisBuilder`.
//! Modal variables are resolved here; the builder only ever sees absolute
//! coordinates and fully-specified attributes.
//!
//! Name handling is two-phase.  When every wanted name table is strict the
//! table offsets declared in the START (or END) record are followed
//! directly; otherwise a preliminary pass walks the whole file collecting
//! name records and the properties attached to them.  Either way, all
//! register callbacks fire before the first cell is announced.
//!
//! The `strict_conformance` option controls the checks that reject files
//! other tools emit in practice: out-of-range string characters, set
//! but unused info-byte bits, and bytes after the END record.

use std::rc::Rc;
use num_traits::FromPrimitive;
use crate::fio::FileType;
use crate::{DYNERR,STDRESULT};
use log::warn;
use super::scanner::OasisScanner;
use super::names::*;
use super::modal::{ModalVars,require};
use super::oreal::Oreal;
use super::rep::{Delta,Repetition};
use super::trapezoid::{Trapezoid,Orientation};
use super::validate::{self,Validation,ValScheme};
use super::builder::OasisBuilder;
use super::{checked_plus,Error,RecId,MAGIC,VERSION_STRING};

/// Parser behavior switches.  `strict_conformance` rejects deviations from
/// the spec; the `want_*` flags let an application skip record kinds it
/// does not care about, which can also skip the preliminary name pass.
#[derive(Clone,Copy)]
pub struct OasisParserOptions {
    pub strict_conformance: bool,
    pub want_validation: bool,
    pub want_text: bool,
    pub want_layer_name: bool,
    pub want_extensions: bool
}

impl Default for OasisParserOptions {
    fn default() -> Self {
        Self {
            strict_conformance: true,
            want_validation: true,
            want_text: true,
            want_layer_name: true,
            want_extensions: true
        }
    }
}

impl OasisParserOptions {
    pub fn reset_all(&mut self) {
        self.strict_conformance = false;
        self.want_validation = false;
        self.want_text = false;
        self.want_layer_name = false;
        self.want_extensions = false;
    }
}

/// (strict,offset) pairs from the START or END record, in table order.
#[derive(Clone,Copy,Default)]
struct TableOffsets {
    cellname: (bool,u64),
    textstring: (bool,u64),
    propname: (bool,u64),
    propstring: (bool,u64),
    layername: (bool,u64),
    xname: (bool,u64)
}

/// A property as it sits in the file, before name resolution.
enum RawPropName {
    Ref(u64),
    Str(Vec<u8>)
}

impl Clone for RawPropName {
    fn clone(&self) -> Self {
        match self {
            Self::Ref(r) => Self::Ref(*r),
            Self::Str(s) => Self::Str(s.clone())
        }
    }
}

#[derive(Clone)]
enum RawValue {
    Real(Oreal),
    Unsigned(u64),
    Signed(i64),
    AString(Vec<u8>),
    BString(Vec<u8>),
    NString(Vec<u8>),
    Ref(u8,u64)
}

struct RawProperty {
    is_standard: bool,
    name: Option<RawPropName>,
    values: Option<Vec<RawValue>>
}

/// Where a pending name-attached property lands after resolution.
enum PendTarget {
    Name(Rc<OasisName>),
    Layer(Rc<LayerName>),
    /// property belongs to the file, a cell, or an element; delivered in
    /// the main pass instead
    Stream
}

/// The raw fields of any element record; every field the record omitted
/// stays `None` for the resolve stage to fill from the modal state.
#[derive(Default)]
struct RawElem {
    info: u8,
    refnum: Option<u64>,
    name: Option<Vec<u8>>,
    layer: Option<u64>,
    datatype: Option<u64>,
    mag: Option<Oreal>,
    angle: Option<Oreal>,
    quarter_turns: u8,
    flip: bool,
    width: Option<i64>,
    height: Option<i64>,
    delta_a: Option<i64>,
    delta_b: Option<i64>,
    ctrap_type: Option<u64>,
    radius: Option<i64>,
    halfwidth: Option<i64>,
    start_extn: Option<ExtnField>,
    end_extn: Option<ExtnField>,
    points: Option<Vec<Delta>>,
    attribute: u64,
    data: Vec<u8>,
    x: Option<i64>,
    y: Option<i64>,
    rep: Option<Option<Repetition>>
}

#[derive(Clone,Copy)]
enum ExtnField {
    Flush,
    HalfWidth,
    Explicit(i64)
}

pub struct OasisParser {
    scanner: OasisScanner,
    options: OasisParserOptions,
    warn_handler: Option<Box<dyn FnMut(&str)>>,
    cellnames: NameTable,
    textstrings: NameTable,
    propnames: NameTable,
    propstrings: NameTable,
    xnames: NameTable,
    layernames: Vec<Rc<LayerName>>,
    modal: ModalVars,
    version: String,
    unit: Oreal,
    validation: Validation,
    table_offsets: TableOffsets,
    /// offset of the first record after START
    records_start: u64,
    /// offset of the END record, or MAX when it was not pre-read
    end_offset: u64,
    prepared: bool,
    pending_props: Vec<(PendTarget,RawProperty)>
}

impl OasisParser {
    pub fn open(fname: &str,warn_handler: Option<Box<dyn FnMut(&str)>>,
        options: &OasisParserOptions) -> Result<Self,DYNERR> {
        let scanner = OasisScanner::open(fname,FileType::Auto)?;
        Ok(Self {
            scanner,
            options: *options,
            warn_handler,
            cellnames: NameTable::new("CELLNAME"),
            textstrings: NameTable::new("TEXTSTRING"),
            propnames: NameTable::new("PROPNAME"),
            propstrings: NameTable::new("PROPSTRING"),
            xnames: NameTable::new("XNAME"),
            layernames: Vec::new(),
            modal: ModalVars::new(),
            version: String::new(),
            unit: Oreal::Integer(1),
            validation: Validation { scheme: ValScheme::None, signature: 0 },
            table_offsets: TableOffsets::default(),
            records_start: 0,
            end_offset: u64::MAX,
            prepared: false,
            pending_props: Vec::new()
        })
    }
    pub fn unit(&self) -> &Oreal {
        &self.unit
    }
    fn warn(&mut self,msg: String) {
        let full = format!("file '{}': {}",self.scanner.filename(),msg);
        match &mut self.warn_handler {
            Some(handler) => handler(&full),
            None => warn!("{}",full)
        }
    }
    /// Recompute and compare the validation signature.
    pub fn validate_file(&self) -> Result<Validation,DYNERR> {
        validate::validate_file(self.scanner.filename())
    }
    /// Read the validation trailer without checking it.
    pub fn parse_validation(&self) -> Result<Validation,DYNERR> {
        validate::parse_validation(self.scanner.filename())
    }

    //------------------------------------------------------------------
    // First stage: START, END, and the name tables

    /// Idempotent: parse START (and END when needed), then collect names.
    fn prepare(&mut self) -> STDRESULT {
        if self.prepared {
            return Ok(());
        }
        self.scanner.seek_to(0)?;
        let magic = self.scanner.read_bytes(MAGIC.len())?;
        if magic != MAGIC {
            return Err(self.scanner.abort("file does not begin with the OASIS magic string".to_string()));
        }
        let id = self.scanner.read_byte()?;
        if id != RecId::Start as u8 {
            return Err(self.scanner.abort("START record is missing".to_string()));
        }
        let version = self.scanner.read_string()?;
        if version != VERSION_STRING.as_bytes() {
            return Err(self.scanner.abort(format!("unsupported OASIS version '{}'",
                String::from_utf8_lossy(&version))));
        }
        self.version = String::from_utf8_lossy(&version).to_string();
        self.unit = self.scanner.read_real()?;
        if self.unit.to_f64() <= 0.0 {
            return Err(self.scanner.abort("unit must be positive".to_string()));
        }
        let offsets_in_end = match self.scanner.read_unsigned()? {
            0 => false,
            1 => true,
            bad => return Err(self.scanner.abort(format!("invalid offset-flag {}",bad)))
        };
        if !offsets_in_end {
            self.table_offsets = self.read_table_offsets()?;
        }
        self.records_start = self.scanner.curr_offset();
        // The END record is pre-read for its validation scheme and, when
        // START deferred them, the table offsets.
        if self.options.want_validation || offsets_in_end {
            let (len,tail) = validate::read_tail(self.scanner.filename())?;
            self.validation = validate::validation_from_tail(self.scanner.filename(),len,&tail,offsets_in_end)?;
            self.end_offset = len - super::END_RECORD_LENGTH as u64;
            if offsets_in_end {
                let mut end_scan = OasisScanner::from_bytes(tail,self.scanner.filename(),self.end_offset);
                end_scan.read_byte()?;
                self.table_offsets = Self::read_table_offsets_from(&mut end_scan)?;
            }
            if !self.options.want_validation {
                self.validation = Validation { scheme: ValScheme::None, signature: 0 };
            }
        }
        self.collect_names()?;
        self.resolve_pending_props()?;
        self.prepared = true;
        Ok(())
    }
    fn read_table_offsets(&mut self) -> Result<TableOffsets,DYNERR> {
        Self::read_table_offsets_from(&mut self.scanner)
    }
    fn read_table_offsets_from(scanner: &mut OasisScanner) -> Result<TableOffsets,DYNERR> {
        let mut pair = || -> Result<(bool,u64),DYNERR> {
            let strict = scanner.read_unsigned()? != 0;
            let offset = scanner.read_unsigned()?;
            Ok((strict,offset))
        };
        Ok(TableOffsets {
            cellname: pair()?,
            textstring: pair()?,
            propname: pair()?,
            propstring: pair()?,
            layername: pair()?,
            xname: pair()?
        })
    }
    /// Which name kinds the caller cares about.
    fn wanted(&self,id: RecId) -> bool {
        match id {
            RecId::Textstring | RecId::TextstringRef => self.options.want_text,
            RecId::LayernameGeometry | RecId::LayernameText => self.options.want_layer_name,
            RecId::Xname | RecId::XnameRef => self.options.want_extensions,
            _ => true
        }
    }
    fn collect_names(&mut self) -> STDRESULT {
        let offsets = self.table_offsets;
        let mut need_pass = !offsets.cellname.0 || !offsets.propname.0 || !offsets.propstring.0;
        need_pass |= self.options.want_text && !offsets.textstring.0;
        need_pass |= self.options.want_layer_name && !offsets.layername.0;
        need_pass |= self.options.want_extensions && !offsets.xname.0;
        if need_pass {
            return self.linear_name_scan();
        }
        let mut tables: Vec<(u64,bool,&[RecId])> = vec![
            (offsets.cellname.1,true,&[RecId::Cellname,RecId::CellnameRef]),
            (offsets.propname.1,true,&[RecId::Propname,RecId::PropnameRef]),
            (offsets.propstring.1,true,&[RecId::Propstring,RecId::PropstringRef]),
            (offsets.textstring.1,self.options.want_text,&[RecId::Textstring,RecId::TextstringRef]),
            (offsets.layername.1,self.options.want_layer_name,
                &[RecId::LayernameGeometry,RecId::LayernameText]),
            (offsets.xname.1,self.options.want_extensions,&[RecId::Xname,RecId::XnameRef])
        ];
        tables.retain(|(offset,want,_ids)| *offset > 0 && *want);
        for (offset,_want,ids) in tables {
            self.table_scan(offset,ids)?;
        }
        Ok(())
    }
    /// Walk every record between START and END, registering names and
    /// collecting the properties attached to them.
    fn linear_name_scan(&mut self) -> STDRESULT {
        self.scanner.seek_to(self.records_start)?;
        let mut last_name: Option<RawPropName> = None;
        let mut last_values: Option<Vec<RawValue>> = None;
        let mut last_standard = false;
        let mut target = PendTarget::Stream;
        loop {
            let id = self.read_record_id()?;
            match id {
                RecId::End => return Ok(()),
                RecId::Pad => {},
                RecId::Cblock => self.scanner.enter_cblock()?,
                RecId::XyAbsolute | RecId::XyRelative => target = PendTarget::Stream,
                RecId::CellRef => {
                    self.scanner.read_unsigned()?;
                    // modal reset clears the property chain
                    last_name = None;
                    last_values = None;
                    target = PendTarget::Stream;
                },
                RecId::CellNamed => {
                    let name = self.read_nstring()?;
                    self.cellnames.forge(&name);
                    last_name = None;
                    last_values = None;
                    target = PendTarget::Stream;
                },
                RecId::Property | RecId::PropertyRepeat => {
                    let raw = match id {
                        RecId::Property => self.read_property()?,
                        _ => RawProperty { is_standard: last_standard, name: None, values: None }
                    };
                    let name = raw.name.or_else(|| last_name.clone());
                    let values = raw.values.or_else(|| last_values.clone());
                    last_name = name.clone();
                    last_values = values.clone();
                    if id==RecId::Property {
                        last_standard = raw.is_standard;
                    }
                    match &target {
                        PendTarget::Stream => {},
                        _ => {
                            let prop = RawProperty { is_standard: raw.is_standard, name, values };
                            let pend = match &target {
                                PendTarget::Name(rc) => PendTarget::Name(rc.clone()),
                                PendTarget::Layer(rc) => PendTarget::Layer(rc.clone()),
                                PendTarget::Stream => PendTarget::Stream
                            };
                            self.pending_props.push((pend,prop));
                        }
                    }
                },
                _ if is_name_record(id) => target = self.read_name_record(id)?,
                _ => {
                    self.skip_element(id)?;
                    target = PendTarget::Stream;
                }
            }
        }
    }
    /// Parse one contiguous strict name table of the given record kinds;
    /// any other record ends the table.
    fn table_scan(&mut self,offset: u64,ids: &[RecId]) -> STDRESULT {
        self.scanner.seek_to(offset)?;
        let mut last_name: Option<RawPropName> = None;
        let mut last_values: Option<Vec<RawValue>> = None;
        let mut last_standard = false;
        let mut target = PendTarget::Stream;
        let mut started = false;
        loop {
            let id = match self.read_record_id() {
                Ok(id) => id,
                Err(_) if started => return Ok(()),
                Err(e) => return Err(e)
            };
            match id {
                RecId::Pad => {},
                RecId::Cblock => self.scanner.enter_cblock()?,
                RecId::Property | RecId::PropertyRepeat => {
                    let raw = match id {
                        RecId::Property => self.read_property()?,
                        _ => RawProperty { is_standard: last_standard, name: None, values: None }
                    };
                    let name = raw.name.or_else(|| last_name.clone());
                    let values = raw.values.or_else(|| last_values.clone());
                    last_name = name.clone();
                    last_values = values.clone();
                    if id==RecId::Property {
                        last_standard = raw.is_standard;
                    }
                    if let PendTarget::Name(rc) = &target {
                        self.pending_props.push((PendTarget::Name(rc.clone()),
                            RawProperty { is_standard: raw.is_standard, name, values }));
                    } else if let PendTarget::Layer(rc) = &target {
                        self.pending_props.push((PendTarget::Layer(rc.clone()),
                            RawProperty { is_standard: raw.is_standard, name, values }));
                    }
                },
                _ if ids.contains(&id) => {
                    started = true;
                    target = self.read_name_record(id)?;
                },
                _ => return Ok(())
            }
        }
    }
    fn read_record_id(&mut self) -> Result<RecId,DYNERR> {
        let byte = self.scanner.read_byte()?;
        match RecId::from_u8(byte) {
            Some(id) => Ok(id),
            None => Err(self.scanner.abort(format!("invalid record id {}",byte)))
        }
    }
    fn read_name_record(&mut self,id: RecId) -> Result<PendTarget,DYNERR> {
        let wanted = self.wanted(id);
        let table_err = |this: &Self,e: String| this.scanner.abort(e);
        match id {
            RecId::Cellname | RecId::CellnameRef => {
                let name = self.read_nstring()?;
                let obj = match id {
                    RecId::Cellname => self.cellnames.register_implicit(&name),
                    _ => {
                        let refnum = self.scanner.read_unsigned()?;
                        self.cellnames.register_explicit(&name,refnum)
                    }
                }.map_err(|e| table_err(self,e))?;
                Ok(PendTarget::Name(obj))
            },
            RecId::Textstring | RecId::TextstringRef => {
                let name = self.read_astring()?;
                let refnum = match id {
                    RecId::TextstringRef => Some(self.scanner.read_unsigned()?),
                    _ => None
                };
                if !wanted {
                    return Ok(PendTarget::Stream);
                }
                let obj = match refnum {
                    Some(r) => self.textstrings.register_explicit(&name,r),
                    None => self.textstrings.register_implicit(&name)
                }.map_err(|e| table_err(self,e))?;
                Ok(PendTarget::Name(obj))
            },
            RecId::Propname | RecId::PropnameRef => {
                let name = self.read_nstring()?;
                let obj = match id {
                    RecId::Propname => self.propnames.register_implicit(&name),
                    _ => {
                        let refnum = self.scanner.read_unsigned()?;
                        self.propnames.register_explicit(&name,refnum)
                    }
                }.map_err(|e| table_err(self,e))?;
                Ok(PendTarget::Name(obj))
            },
            RecId::Propstring | RecId::PropstringRef => {
                let name = self.read_bstring()?;
                let obj = match id {
                    RecId::Propstring => self.propstrings.register_implicit(&name),
                    _ => {
                        let refnum = self.scanner.read_unsigned()?;
                        self.propstrings.register_explicit(&name,refnum)
                    }
                }.map_err(|e| table_err(self,e))?;
                Ok(PendTarget::Name(obj))
            },
            RecId::LayernameGeometry | RecId::LayernameText => {
                let name = self.read_nstring()?;
                let layers = self.read_interval()?;
                let types = self.read_interval()?;
                if !wanted {
                    return Ok(PendTarget::Stream);
                }
                let obj = LayerName::new(&name,id==RecId::LayernameText,layers,types);
                self.layernames.push(obj.clone());
                Ok(PendTarget::Layer(obj))
            },
            RecId::Xname | RecId::XnameRef => {
                let attribute = self.scanner.read_unsigned()?;
                let name = self.read_bstring()?;
                let refnum = match id {
                    RecId::XnameRef => Some(self.scanner.read_unsigned()?),
                    _ => None
                };
                if !wanted {
                    return Ok(PendTarget::Stream);
                }
                let obj = match refnum {
                    Some(r) => self.xnames.register_explicit(&name,r),
                    None => self.xnames.register_implicit(&name)
                }.map_err(|e| table_err(self,e))?;
                obj.attribute.set(attribute);
                Ok(PendTarget::Name(obj))
            },
            _ => panic!("not a name record")
        }
    }
    fn read_interval(&mut self) -> Result<Interval,DYNERR> {
        match self.scanner.read_unsigned()? {
            0 => Ok(Interval::All),
            1 => Ok(Interval::UpTo(self.scanner.read_unsigned()?)),
            2 => Ok(Interval::AtLeast(self.scanner.read_unsigned()?)),
            3 => Ok(Interval::Exact(self.scanner.read_unsigned()?)),
            4 => {
                let a = self.scanner.read_unsigned()?;
                let b = self.scanner.read_unsigned()?;
                Ok(Interval::Range(a,b))
            },
            bad => Err(self.scanner.abort(format!("invalid interval type {}",bad)))
        }
    }
    fn resolve_pending_props(&mut self) -> STDRESULT {
        let pending = std::mem::take(&mut self.pending_props);
        for (target,raw) in pending {
            let prop = self.resolve_raw_property(raw)?;
            match target {
                PendTarget::Name(rc) => rc.add_property(prop),
                PendTarget::Layer(rc) => rc.add_property(prop),
                PendTarget::Stream => {}
            }
        }
        Ok(())
    }
    fn resolve_raw_property(&mut self,raw: RawProperty) -> Result<Property,DYNERR> {
        let name = match raw.name {
            Some(RawPropName::Ref(r)) => match self.propnames.by_refnum(r) {
                Some(rc) => rc,
                None => return Err(self.scanner.abort(format!("PROPNAME reference number {} undefined",r)))
            },
            Some(RawPropName::Str(s)) => {
                if self.options.strict_conformance {
                    match self.propnames.by_name(&s) {
                        Some(rc) => rc,
                        None => self.propnames.forge(&s)
                    }
                } else {
                    self.propnames.forge(&s)
                }
            },
            None => return Err(self.scanner.abort(
                "modal variable 'last-property-name' referenced before being set".to_string()))
        };
        let raw_values = match raw.values {
            Some(v) => v,
            None => return Err(self.scanner.abort(
                "modal variable 'last-value-list' referenced before being set".to_string()))
        };
        let mut values = Vec::with_capacity(raw_values.len());
        for rv in raw_values {
            values.push(match rv {
                RawValue::Real(r) => PropValue::Real(r),
                RawValue::Unsigned(v) => PropValue::Unsigned(v),
                RawValue::Signed(v) => PropValue::Signed(v),
                RawValue::AString(s) => PropValue::AString(s),
                RawValue::BString(s) => PropValue::BString(s),
                RawValue::NString(s) => PropValue::NString(s),
                RawValue::Ref(tag,r) => match self.propstrings.by_refnum(r) {
                    Some(rc) => PropValue::Ref(tag,rc),
                    None => return Err(self.scanner.abort(format!(
                        "PROPSTRING reference number {} undefined",r)))
                }
            });
        }
        Ok(Property { name, values, is_standard: raw.is_standard })
    }

    //------------------------------------------------------------------
    // String readers

    fn read_astring(&mut self) -> Result<Vec<u8>,DYNERR> {
        let s = self.scanner.read_string()?;
        let (lo,hi) = match self.options.strict_conformance {
            true => (0x20,0x7e),
            false => (0x01,0x7f)
        };
        for b in &s {
            if *b < lo || *b > hi {
                return Err(self.scanner.abort(format!("invalid character 0x{:02x} in a-string",b)));
            }
        }
        Ok(s)
    }
    fn read_nstring(&mut self) -> Result<Vec<u8>,DYNERR> {
        let s = self.scanner.read_string()?;
        if self.options.strict_conformance {
            if s.len()==0 {
                return Err(self.scanner.abort("empty n-string".to_string()));
            }
            for b in &s {
                if *b < 0x21 || *b > 0x7e {
                    return Err(self.scanner.abort(format!("invalid character 0x{:02x} in n-string",b)));
                }
            }
        }
        Ok(s)
    }
    fn read_bstring(&mut self) -> Result<Vec<u8>,DYNERR> {
        self.scanner.read_string()
    }

    //------------------------------------------------------------------
    // Field-group readers (no modal access)

    fn read_repetition(&mut self) -> Result<Option<Repetition>,DYNERR> {
        let rtype = self.scanner.read_unsigned()?;
        let dim2 = |this: &mut Self| -> Result<u64,DYNERR> {
            match this.scanner.read_unsigned()?.checked_add(2) {
                Some(v) => Ok(v),
                None => Err(this.scanner.abort("repetition dimension is out of range".to_string()))
            }
        };
        let space = |this: &mut Self| -> Result<i64,DYNERR> {
            let v = this.scanner.read_unsigned()?;
            match v <= i64::MAX as u64 {
                true => Ok(v as i64),
                false => Err(this.scanner.abort("repetition spacing is out of range".to_string()))
            }
        };
        match rtype {
            0 => Ok(None),
            1 => {
                let cols = dim2(self)?;
                let rows = dim2(self)?;
                let col_space = space(self)?;
                let row_space = space(self)?;
                Ok(Some(Repetition::Matrix { cols, rows, col_space, row_space }))
            },
            2 => Ok(Some(Repetition::UniformX { dim: dim2(self)?, space: space(self)? })),
            3 => Ok(Some(Repetition::UniformY { dim: dim2(self)?, space: space(self)? })),
            4 | 5 | 6 | 7 => {
                let dim = dim2(self)?;
                let grid = match rtype==5 || rtype==7 {
                    true => space(self)?,
                    false => 1
                };
                let mut offsets = vec![0];
                let mut pos: i64 = 0;
                for _i in 0..dim-1 {
                    pos = checked_plus(pos,space(self)?)?;
                    offsets.push(pos);
                }
                Ok(Some(match (rtype,grid) {
                    (4,_) => Repetition::VaryingX { offsets },
                    (5,g) => Repetition::GridVaryingX { grid: g, offsets },
                    (6,_) => Repetition::VaryingY { offsets },
                    (_,g) => Repetition::GridVaryingY { grid: g, offsets }
                }))
            },
            8 => {
                let ncount = dim2(self)?;
                let mcount = dim2(self)?;
                let ndelta = self.scanner.read_g_delta()?;
                let mdelta = self.scanner.read_g_delta()?;
                Ok(Some(Repetition::TiltedMatrix { ncount, mcount, ndelta, mdelta }))
            },
            9 => {
                let dim = dim2(self)?;
                let delta = self.scanner.read_g_delta()?;
                Ok(Some(Repetition::Diagonal { dim, delta }))
            },
            10 | 11 => {
                let dim = dim2(self)?;
                let grid = match rtype==11 {
                    true => space(self)?,
                    false => 1
                };
                let mut offsets = vec![Delta::new(0,0)];
                let mut pos = Delta::new(0,0);
                for _i in 0..dim-1 {
                    let d = self.scanner.read_g_delta()?;
                    pos = Delta::new(checked_plus(pos.x,d.x)?,checked_plus(pos.y,d.y)?);
                    offsets.push(pos);
                }
                Ok(Some(match rtype {
                    10 => Repetition::Arbitrary { offsets },
                    _ => Repetition::GridArbitrary { grid, offsets }
                }))
            },
            bad => Err(self.scanner.abort(format!("invalid repetition type {}",bad)))
        }
    }
    /// Point list: vertices relative to the element position, leading
    /// zero vertex included.
    fn read_point_list(&mut self) -> Result<Vec<Delta>,DYNERR> {
        let ptype = self.scanner.read_unsigned()?;
        let count = self.scanner.read_unsigned()? as usize;
        let mut ans = vec![Delta::new(0,0)];
        let mut pos = Delta::new(0,0);
        match ptype {
            0 | 1 => {
                let mut horizontal = ptype==0;
                for _i in 0..count {
                    let d = self.scanner.read_one_delta()?;
                    pos = match horizontal {
                        true => Delta::new(checked_plus(pos.x,d)?,pos.y),
                        false => Delta::new(pos.x,checked_plus(pos.y,d)?)
                    };
                    ans.push(pos);
                    horizontal = !horizontal;
                }
            },
            2 => {
                for _i in 0..count {
                    let d = self.scanner.read_two_delta()?;
                    pos = Delta::new(checked_plus(pos.x,d.x)?,checked_plus(pos.y,d.y)?);
                    ans.push(pos);
                }
            },
            3 => {
                for _i in 0..count {
                    let d = self.scanner.read_three_delta()?;
                    pos = Delta::new(checked_plus(pos.x,d.x)?,checked_plus(pos.y,d.y)?);
                    ans.push(pos);
                }
            },
            4 => {
                for _i in 0..count {
                    let d = self.scanner.read_g_delta()?;
                    pos = Delta::new(checked_plus(pos.x,d.x)?,checked_plus(pos.y,d.y)?);
                    ans.push(pos);
                }
            },
            5 => {
                let mut prev = Delta::new(0,0);
                for _i in 0..count {
                    let raw = self.scanner.read_g_delta()?;
                    let d = Delta::new(checked_plus(prev.x,raw.x)?,checked_plus(prev.y,raw.y)?);
                    pos = Delta::new(checked_plus(pos.x,d.x)?,checked_plus(pos.y,d.y)?);
                    ans.push(pos);
                    prev = d;
                }
            },
            bad => return Err(self.scanner.abort(format!("invalid point list type {}",bad)))
        }
        Ok(ans)
    }
    fn read_property(&mut self) -> Result<RawProperty,DYNERR> {
        let info = self.scanner.read_byte()?;
        let is_standard = info & 0x01 != 0;
        let name = match info & 0x04 != 0 {
            true => match info & 0x02 != 0 {
                true => Some(RawPropName::Ref(self.scanner.read_unsigned()?)),
                false => Some(RawPropName::Str(self.read_nstring()?))
            },
            false => None
        };
        let values = match info & 0x08 != 0 {
            true => None,
            false => {
                let count = match info >> 4 {
                    15 => self.scanner.read_unsigned()?,
                    n => n as u64
                };
                let mut list = Vec::with_capacity(count.min(1024) as usize);
                for _i in 0..count {
                    let tag = self.scanner.read_unsigned()?;
                    list.push(match tag {
                        0..=7 => RawValue::Real(self.scanner.read_real_body(tag)?),
                        8 => RawValue::Unsigned(self.scanner.read_unsigned()?),
                        9 => RawValue::Signed(self.scanner.read_signed()?),
                        10 => RawValue::AString(self.read_astring()?),
                        11 => RawValue::BString(self.read_bstring()?),
                        12 => RawValue::NString(self.read_nstring()?),
                        13 | 14 | 15 => RawValue::Ref(tag as u8,self.scanner.read_unsigned()?),
                        bad => return Err(self.scanner.abort(format!("invalid property value type {}",bad)))
                    });
                }
                Some(list)
            }
        };
        Ok(RawProperty { is_standard, name, values })
    }
    /// The shared tail of every element record: coordinates then
    /// repetition, presence given by the X, Y, and R info bits.
    fn read_xyr(&mut self,elem: &mut RawElem,xbit: u8,ybit: u8,rbit: u8) -> STDRESULT {
        if elem.info & xbit != 0 {
            elem.x = Some(self.scanner.read_signed()?);
        }
        if elem.info & ybit != 0 {
            elem.y = Some(self.scanner.read_signed()?);
        }
        if elem.info & rbit != 0 {
            elem.rep = Some(self.read_repetition()?);
        }
        Ok(())
    }
    fn read_layer_datatype(&mut self,elem: &mut RawElem) -> STDRESULT {
        if elem.info & 0x01 != 0 {
            elem.layer = Some(self.scanner.read_unsigned()?);
        }
        if elem.info & 0x02 != 0 {
            elem.datatype = Some(self.scanner.read_unsigned()?);
        }
        Ok(())
    }
    fn check_unused_bits(&mut self,id: RecId,info: u8,mask: u8) -> STDRESULT {
        if info & mask != 0 {
            let msg = format!("unused info-byte bits set in {:?} record",id);
            match self.options.strict_conformance {
                true => return Err(self.scanner.abort(msg)),
                false => self.warn(msg)
            }
        }
        Ok(())
    }
    /// Read all fields of an element record.  Nothing is resolved and no
    /// modal state is touched, so this also serves the skipping passes.
    fn read_element(&mut self,id: RecId) -> Result<RawElem,DYNERR> {
        let mut elem = RawElem::default();
        match id {
            RecId::Placement | RecId::PlacementTransform => {
                elem.info = self.scanner.read_byte()?;
                if elem.info & 0x80 != 0 {
                    match elem.info & 0x40 != 0 {
                        true => elem.refnum = Some(self.scanner.read_unsigned()?),
                        false => elem.name = Some(self.read_nstring()?)
                    }
                }
                if id==RecId::PlacementTransform {
                    if elem.info & 0x04 != 0 {
                        elem.mag = Some(self.scanner.read_real()?);
                    }
                    if elem.info & 0x02 != 0 {
                        elem.angle = Some(self.scanner.read_real()?);
                    }
                } else {
                    elem.quarter_turns = (elem.info & 0x06) >> 1;
                }
                elem.flip = elem.info & 0x01 != 0;
                self.read_xyr(&mut elem,0x20,0x10,0x08)?;
            },
            RecId::Text => {
                elem.info = self.scanner.read_byte()?;
                self.check_unused_bits(id,elem.info,0x80)?;
                if elem.info & 0x40 != 0 {
                    match elem.info & 0x20 != 0 {
                        true => elem.refnum = Some(self.scanner.read_unsigned()?),
                        false => elem.name = Some(self.read_astring()?)
                    }
                }
                if elem.info & 0x01 != 0 {
                    elem.layer = Some(self.scanner.read_unsigned()?);
                }
                if elem.info & 0x02 != 0 {
                    elem.datatype = Some(self.scanner.read_unsigned()?);
                }
                self.read_xyr(&mut elem,0x10,0x08,0x04)?;
            },
            RecId::Rectangle => {
                elem.info = self.scanner.read_byte()?;
                self.read_layer_datatype(&mut elem)?;
                if elem.info & 0x40 != 0 {
                    elem.width = Some(self.read_dimension()?);
                }
                if elem.info & 0x20 != 0 {
                    elem.height = Some(self.read_dimension()?);
                }
                self.read_xyr(&mut elem,0x10,0x08,0x04)?;
            },
            RecId::Polygon => {
                elem.info = self.scanner.read_byte()?;
                self.check_unused_bits(id,elem.info,0xc0)?;
                self.read_layer_datatype(&mut elem)?;
                if elem.info & 0x20 != 0 {
                    elem.points = Some(self.read_point_list()?);
                }
                self.read_xyr(&mut elem,0x10,0x08,0x04)?;
            },
            RecId::Path => {
                elem.info = self.scanner.read_byte()?;
                self.read_layer_datatype(&mut elem)?;
                if elem.info & 0x40 != 0 {
                    elem.halfwidth = Some(self.read_dimension()?);
                }
                if elem.info & 0x80 != 0 {
                    let scheme = self.scanner.read_unsigned()?;
                    elem.start_extn = self.read_extension((scheme >> 2) & 3)?;
                    elem.end_extn = self.read_extension(scheme & 3)?;
                }
                if elem.info & 0x20 != 0 {
                    elem.points = Some(self.read_point_list()?);
                }
                self.read_xyr(&mut elem,0x10,0x08,0x04)?;
            },
            RecId::Trapezoid | RecId::TrapezoidA | RecId::TrapezoidB => {
                elem.info = self.scanner.read_byte()?;
                self.read_layer_datatype(&mut elem)?;
                if elem.info & 0x40 != 0 {
                    elem.width = Some(self.read_dimension()?);
                }
                if elem.info & 0x20 != 0 {
                    elem.height = Some(self.read_dimension()?);
                }
                if id==RecId::Trapezoid || id==RecId::TrapezoidA {
                    elem.delta_a = Some(self.scanner.read_one_delta()?);
                }
                if id==RecId::Trapezoid || id==RecId::TrapezoidB {
                    elem.delta_b = Some(self.scanner.read_one_delta()?);
                }
                self.read_xyr(&mut elem,0x10,0x08,0x04)?;
            },
            RecId::Ctrapezoid => {
                elem.info = self.scanner.read_byte()?;
                self.read_layer_datatype(&mut elem)?;
                if elem.info & 0x80 != 0 {
                    let t = self.scanner.read_unsigned()?;
                    if !Trapezoid::ctrapezoid_type_is_valid(t) {
                        return Err(self.scanner.abort(format!("invalid ctrapezoid type {}",t)));
                    }
                    elem.ctrap_type = Some(t);
                }
                if elem.info & 0x40 != 0 {
                    elem.width = Some(self.read_dimension()?);
                }
                if elem.info & 0x20 != 0 {
                    elem.height = Some(self.read_dimension()?);
                }
                self.read_xyr(&mut elem,0x10,0x08,0x04)?;
            },
            RecId::Circle => {
                elem.info = self.scanner.read_byte()?;
                self.check_unused_bits(id,elem.info,0xc0)?;
                self.read_layer_datatype(&mut elem)?;
                if elem.info & 0x20 != 0 {
                    elem.radius = Some(self.read_dimension()?);
                }
                self.read_xyr(&mut elem,0x10,0x08,0x04)?;
            },
            RecId::Xelement => {
                elem.attribute = self.scanner.read_unsigned()?;
                elem.data = self.read_bstring()?;
            },
            RecId::Xgeometry => {
                elem.info = self.scanner.read_byte()?;
                self.check_unused_bits(id,elem.info,0xe0)?;
                elem.attribute = self.scanner.read_unsigned()?;
                self.read_layer_datatype(&mut elem)?;
                elem.data = self.read_bstring()?;
                self.read_xyr(&mut elem,0x10,0x08,0x04)?;
            },
            _ => panic!("not an element record")
        }
        Ok(elem)
    }
    fn read_dimension(&mut self) -> Result<i64,DYNERR> {
        let v = self.scanner.read_unsigned()?;
        match v <= i64::MAX as u64 {
            true => Ok(v as i64),
            false => Err(self.scanner.abort("dimension is out of range".to_string()))
        }
    }
    fn read_extension(&mut self,bits: u64) -> Result<Option<ExtnField>,DYNERR> {
        match bits {
            0 => Ok(None),
            1 => Ok(Some(ExtnField::Flush)),
            2 => Ok(Some(ExtnField::HalfWidth)),
            _ => Ok(Some(ExtnField::Explicit(self.scanner.read_signed()?)))
        }
    }
    fn skip_element(&mut self,id: RecId) -> STDRESULT {
        match id {
            RecId::Placement | RecId::PlacementTransform | RecId::Text | RecId::Rectangle
            | RecId::Polygon | RecId::Path | RecId::Trapezoid | RecId::TrapezoidA
            | RecId::TrapezoidB | RecId::Ctrapezoid | RecId::Circle | RecId::Xelement
            | RecId::Xgeometry => {
                self.read_element(id)?;
                Ok(())
            },
            RecId::Start => Err(self.scanner.abort("second START record".to_string())),
            _ => Err(self.scanner.abort(format!("unexpected record id {}",id as u8)))
        }
    }

    //------------------------------------------------------------------
    // Main pass: modal resolution and builder dispatch

    /// Parse the whole file.
    pub fn parse_file(&mut self,builder: &mut dyn OasisBuilder) -> STDRESULT {
        self.prepare()?;
        builder.begin_file(&self.version.clone(),&self.unit.clone(),self.validation.scheme)?;
        self.fire_register_callbacks(builder)?;
        self.main_pass(builder,None)?;
        builder.end_file()
    }
    /// Parse a single cell, firing the register callbacks and then the
    /// cell's own events.  Returns false if there is no such cell.
    pub fn parse_cell(&mut self,cellname: &str,builder: &mut dyn OasisBuilder) -> Result<bool,DYNERR> {
        self.prepare()?;
        if self.cellnames.by_name(cellname.as_bytes()).is_none() {
            return Ok(false);
        }
        self.fire_register_callbacks(builder)?;
        self.main_pass(builder,Some(cellname.as_bytes().to_vec()))?;
        Ok(true)
    }
    fn fire_register_callbacks(&mut self,builder: &mut dyn OasisBuilder) -> STDRESULT {
        for obj in self.cellnames.iter() {
            builder.register_cell_name(obj)?;
        }
        for obj in self.textstrings.iter() {
            builder.register_text_string(obj)?;
        }
        for obj in self.propnames.iter() {
            builder.register_prop_name(obj)?;
        }
        for obj in self.propstrings.iter() {
            builder.register_prop_string(obj)?;
        }
        for obj in &self.layernames {
            builder.register_layer_name(obj)?;
        }
        for obj in self.xnames.iter() {
            builder.register_xname(obj)?;
        }
        Ok(())
    }
    fn main_pass(&mut self,builder: &mut dyn OasisBuilder,cell_filter: Option<Vec<u8>>) -> STDRESULT {
        self.scanner.seek_to(self.records_start)?;
        self.modal.reset();
        // what the next PROPERTY record binds to
        #[derive(PartialEq,Clone,Copy)]
        enum Ctx { File, Cell, Element, Swallow }
        let mut ctx = Ctx::File;
        let mut in_cell = false;
        let mut in_element = false;
        let mut deliver = cell_filter.is_none();
        loop {
            let rec_offset = self.scanner.curr_offset();
            let id = self.read_record_id()?;
            // close an open element when anything but a property arrives
            if in_element && id != RecId::Property && id != RecId::PropertyRepeat {
                if deliver {
                    builder.end_element()?;
                }
                in_element = false;
                ctx = Ctx::Cell;
            }
            match id {
                RecId::Pad => {},
                RecId::Cblock => self.scanner.enter_cblock()?,
                RecId::End => {
                    if self.end_offset != u64::MAX && rec_offset != self.end_offset
                        && !self.scanner.in_cblock() {
                        let msg = format!("END record at offset {}, expected {}",rec_offset,self.end_offset);
                        if self.options.strict_conformance {
                            return Err(self.scanner.abort(msg));
                        }
                        self.warn(msg);
                    }
                    if in_cell && deliver {
                        builder.end_cell()?;
                    }
                    return Ok(());
                },
                RecId::XyAbsolute => self.modal.xy_relative = false,
                RecId::XyRelative => self.modal.xy_relative = true,
                RecId::CellRef | RecId::CellNamed => {
                    if in_cell && deliver {
                        builder.end_cell()?;
                    }
                    let cell = match id {
                        RecId::CellRef => {
                            let refnum = self.scanner.read_unsigned()?;
                            match self.cellnames.by_refnum(refnum) {
                                Some(rc) => rc,
                                None => return Err(self.scanner.abort(format!(
                                    "CELLNAME reference number {} undefined",refnum)))
                            }
                        },
                        _ => {
                            let name = self.read_nstring()?;
                            match self.cellnames.by_name(&name) {
                                Some(rc) => rc,
                                None => {
                                    let rc = self.cellnames.forge(&name);
                                    builder.register_cell_name(&rc)?;
                                    rc
                                }
                            }
                        }
                    };
                    self.modal.reset();
                    deliver = match &cell_filter {
                        Some(wanted) => cell.name()==&wanted[..],
                        None => true
                    };
                    in_cell = true;
                    ctx = Ctx::Cell;
                    if deliver {
                        builder.begin_cell(&cell)?;
                    }
                },
                RecId::Property | RecId::PropertyRepeat => {
                    let raw = match id {
                        RecId::Property => self.read_property()?,
                        _ => RawProperty { is_standard: self.modal.last_value_standard, name: None, values: None }
                    };
                    let prop = self.resolve_stream_property(raw,rec_offset)?;
                    if deliver {
                        match ctx {
                            Ctx::File => builder.add_file_property(&prop)?,
                            Ctx::Cell => builder.add_cell_property(&prop)?,
                            Ctx::Element => builder.add_element_property(&prop)?,
                            Ctx::Swallow => {}
                        }
                    }
                },
                _ if is_name_record(id) => {
                    // already registered during prepare(); skip the record
                    // and swallow its properties
                    self.read_name_record_skip(id)?;
                    ctx = Ctx::Swallow;
                },
                _ => {
                    let elem = self.read_element(id)?;
                    if !self.element_wanted(id) {
                        // unwanted kinds still update the shared modal
                        // slots, but no name lookups and no delivery
                        self.skip_unwanted(id,elem)?;
                        ctx = Ctx::Swallow;
                    } else if deliver {
                        self.resolve_element(id,elem,rec_offset,Some(&mut *builder))?;
                        in_element = true;
                        ctx = Ctx::Element;
                    } else {
                        // cell filtered out: resolve for the modal state only
                        self.resolve_element(id,elem,rec_offset,None)?;
                        ctx = Ctx::Swallow;
                    }
                }
            }
        }
    }
    /// Modal bookkeeping for TEXT and extension records the caller asked
    /// to skip.  Only present fields update the modal state; nothing is
    /// required, resolved against the name tables, or delivered.
    fn skip_unwanted(&mut self,id: RecId,elem: RawElem) -> STDRESULT {
        match id {
            RecId::Text => {
                if let Some(v) = elem.layer {
                    self.modal.textlayer = Some(v);
                }
                if let Some(v) = elem.datatype {
                    self.modal.texttype = Some(v);
                }
                if let Some(name) = &elem.name {
                    self.modal.text_string = Some(self.textstrings.forge(name));
                }
                if let Some(r) = elem.refnum {
                    if let Some(rc) = self.textstrings.by_refnum(r) {
                        self.modal.text_string = Some(rc);
                    }
                }
                if let Some(v) = elem.x {
                    self.modal.text_x = match self.modal.xy_relative {
                        true => checked_plus(self.modal.text_x,v)?,
                        false => v
                    };
                }
                if let Some(v) = elem.y {
                    self.modal.text_y = match self.modal.xy_relative {
                        true => checked_plus(self.modal.text_y,v)?,
                        false => v
                    };
                }
                if let Some(Some(rep)) = elem.rep {
                    self.modal.repetition = Some(rep);
                }
            },
            RecId::Xgeometry => {
                if let Some(v) = elem.layer {
                    self.modal.layer = Some(v);
                }
                if let Some(v) = elem.datatype {
                    self.modal.datatype = Some(v);
                }
                if let Some(v) = elem.x {
                    self.modal.geometry_x = match self.modal.xy_relative {
                        true => checked_plus(self.modal.geometry_x,v)?,
                        false => v
                    };
                }
                if let Some(v) = elem.y {
                    self.modal.geometry_y = match self.modal.xy_relative {
                        true => checked_plus(self.modal.geometry_y,v)?,
                        false => v
                    };
                }
                if let Some(Some(rep)) = elem.rep {
                    self.modal.repetition = Some(rep);
                }
            },
            _ => {}
        }
        Ok(())
    }
    fn element_wanted(&self,id: RecId) -> bool {
        match id {
            RecId::Text => self.options.want_text,
            RecId::Xelement | RecId::Xgeometry => self.options.want_extensions,
            _ => true
        }
    }
    /// Re-read a name record during the main pass without registering.
    fn read_name_record_skip(&mut self,id: RecId) -> STDRESULT {
        match id {
            RecId::Cellname | RecId::Propname => {
                self.read_nstring()?;
            },
            RecId::CellnameRef | RecId::PropnameRef => {
                self.read_nstring()?;
                self.scanner.read_unsigned()?;
            },
            RecId::Textstring => {
                self.read_astring()?;
            },
            RecId::TextstringRef => {
                self.read_astring()?;
                self.scanner.read_unsigned()?;
            },
            RecId::Propstring => {
                self.read_bstring()?;
            },
            RecId::PropstringRef => {
                self.read_bstring()?;
                self.scanner.read_unsigned()?;
            },
            RecId::LayernameGeometry | RecId::LayernameText => {
                self.read_nstring()?;
                self.read_interval()?;
                self.read_interval()?;
            },
            RecId::Xname => {
                self.scanner.read_unsigned()?;
                self.read_bstring()?;
            },
            RecId::XnameRef => {
                self.scanner.read_unsigned()?;
                self.read_bstring()?;
                self.scanner.read_unsigned()?;
            },
            _ => panic!("not a name record")
        }
        Ok(())
    }
    /// Resolve a property in stream context, updating the property modal
    /// variables.
    fn resolve_stream_property(&mut self,raw: RawProperty,offset: u64) -> Result<Property,DYNERR> {
        let fail = |this: &Self,msg: String| -> DYNERR {
            Box::new(Error::Format(this.scanner.filename().to_string(),offset,msg))
        };
        let name = match raw.name {
            Some(RawPropName::Ref(r)) => match self.propnames.by_refnum(r) {
                Some(rc) => rc,
                None => return Err(fail(self,format!("PROPNAME reference number {} undefined",r)))
            },
            Some(RawPropName::Str(s)) => self.propnames.forge(&s),
            None => require(&self.modal.last_prop_name,"last-property-name")
                .map_err(|e| fail(self,e))?.clone()
        };
        let values: Vec<PropValue> = match raw.values {
            Some(raw_values) => {
                let mut values = Vec::with_capacity(raw_values.len());
                for rv in raw_values {
                    values.push(match rv {
                        RawValue::Real(r) => PropValue::Real(r),
                        RawValue::Unsigned(v) => PropValue::Unsigned(v),
                        RawValue::Signed(v) => PropValue::Signed(v),
                        RawValue::AString(s) => PropValue::AString(s),
                        RawValue::BString(s) => PropValue::BString(s),
                        RawValue::NString(s) => PropValue::NString(s),
                        RawValue::Ref(tag,r) => match self.propstrings.by_refnum(r) {
                            Some(rc) => PropValue::Ref(tag,rc),
                            None => return Err(fail(self,format!(
                                "PROPSTRING reference number {} undefined",r)))
                        }
                    });
                }
                values
            },
            None => require(&self.modal.last_value_list,"last-value-list")
                .map_err(|e| fail(self,e))?.clone()
        };
        self.modal.last_prop_name = Some(name.clone());
        self.modal.last_value_list = Some(values.clone());
        self.modal.last_value_standard = raw.is_standard;
        Ok(Property { name, values, is_standard: raw.is_standard })
    }
    fn resolve_xy(&mut self,raw_x: Option<i64>,raw_y: Option<i64>,family: XyFamily,offset: u64) -> Result<(i64,i64),DYNERR> {
        let (mx,my) = match family {
            XyFamily::Placement => (self.modal.placement_x,self.modal.placement_y),
            XyFamily::Text => (self.modal.text_x,self.modal.text_y),
            XyFamily::Geometry => (self.modal.geometry_x,self.modal.geometry_y)
        };
        let fail = |this: &Self,e| -> DYNERR {
            Box::new(Error::Format(this.scanner.filename().to_string(),offset,format!("{}",e)))
        };
        let x = match raw_x {
            Some(v) => match self.modal.xy_relative {
                true => checked_plus(mx,v).map_err(|e| fail(self,e))?,
                false => v
            },
            None => mx
        };
        let y = match raw_y {
            Some(v) => match self.modal.xy_relative {
                true => checked_plus(my,v).map_err(|e| fail(self,e))?,
                false => v
            },
            None => my
        };
        match family {
            XyFamily::Placement => {
                self.modal.placement_x = x;
                self.modal.placement_y = y;
            },
            XyFamily::Text => {
                self.modal.text_x = x;
                self.modal.text_y = y;
            },
            XyFamily::Geometry => {
                self.modal.geometry_x = x;
                self.modal.geometry_y = y;
            }
        }
        Ok((x,y))
    }
    /// The repetition for this element: absent, explicit (updates modal),
    /// or a reuse of the modal value.
    fn resolve_rep(&mut self,raw: Option<Option<Repetition>>,offset: u64) -> Result<Option<Repetition>,DYNERR> {
        match raw {
            None => Ok(None),
            Some(Some(rep)) => {
                self.modal.repetition = Some(rep.clone());
                Ok(Some(rep))
            },
            Some(None) => {
                let rep = require(&self.modal.repetition,"repetition")
                    .map_err(|e| Box::new(Error::Format(self.scanner.filename().to_string(),offset,e)))?;
                Ok(Some(rep.clone()))
            }
        }
    }
    fn modal_fail(&self,offset: u64,e: String) -> DYNERR {
        Box::new(Error::Format(self.scanner.filename().to_string(),offset,e))
    }
    /// Apply modal state to a raw element and dispatch it.  When `builder`
    /// is None the modal updates still happen but nothing is delivered.
    fn resolve_element(&mut self,id: RecId,elem: RawElem,offset: u64,
        builder: Option<&mut dyn OasisBuilder>) -> STDRESULT {
        match id {
            RecId::Placement | RecId::PlacementTransform => {
                let cell = match (&elem.refnum,&elem.name) {
                    (Some(r),_) => match self.cellnames.by_refnum(*r) {
                        Some(rc) => rc,
                        None => return Err(self.modal_fail(offset,
                            format!("CELLNAME reference number {} undefined",r)))
                    },
                    (_,Some(n)) => self.cellnames.forge(n),
                    _ => require(&self.modal.placement_cell,"placement-cell")
                        .map_err(|e| self.modal_fail(offset,e))?.clone()
                };
                self.modal.placement_cell = Some(cell.clone());
                let (mag,angle) = match id {
                    RecId::Placement => (Oreal::Integer(1),Oreal::Integer(90 * elem.quarter_turns as i64)),
                    _ => {
                        let mag = match elem.mag {
                            Some(m) => {
                                self.modal.placement_mag = m;
                                m
                            },
                            None => self.modal.placement_mag
                        };
                        let angle = match elem.angle {
                            Some(a) => {
                                self.modal.placement_angle = a;
                                a
                            },
                            None => self.modal.placement_angle
                        };
                        (mag,angle)
                    }
                };
                let (x,y) = self.resolve_xy(elem.x,elem.y,XyFamily::Placement,offset)?;
                let rep = self.resolve_rep(elem.rep,offset)?;
                if let Some(b) = builder {
                    b.begin_placement(&cell,x,y,&mag,&angle,elem.flip,rep.as_ref())?;
                }
            },
            RecId::Text => {
                let text = match (&elem.refnum,&elem.name) {
                    (Some(r),_) => match self.textstrings.by_refnum(*r) {
                        Some(rc) => rc,
                        None => return Err(self.modal_fail(offset,
                            format!("TEXTSTRING reference number {} undefined",r)))
                    },
                    (_,Some(n)) => self.textstrings.forge(n),
                    _ => require(&self.modal.text_string,"text-string")
                        .map_err(|e| self.modal_fail(offset,e))?.clone()
                };
                self.modal.text_string = Some(text.clone());
                let textlayer = match elem.layer {
                    Some(v) => {
                        self.modal.textlayer = Some(v);
                        v
                    },
                    None => *require(&self.modal.textlayer,"textlayer")
                        .map_err(|e| self.modal_fail(offset,e))?
                };
                let texttype = match elem.datatype {
                    Some(v) => {
                        self.modal.texttype = Some(v);
                        v
                    },
                    None => *require(&self.modal.texttype,"texttype")
                        .map_err(|e| self.modal_fail(offset,e))?
                };
                let (x,y) = self.resolve_xy(elem.x,elem.y,XyFamily::Text,offset)?;
                let rep = self.resolve_rep(elem.rep,offset)?;
                if let Some(b) = builder {
                    b.begin_text(textlayer,texttype,x,y,&text,rep.as_ref())?;
                }
            },
            RecId::Rectangle => {
                let (layer,datatype) = self.resolve_layer_datatype(&elem,offset)?;
                let width = match elem.width {
                    Some(v) => {
                        self.modal.geometry_w = Some(v);
                        v
                    },
                    None => *require(&self.modal.geometry_w,"geometry-w")
                        .map_err(|e| self.modal_fail(offset,e))?
                };
                let height = match elem.info & 0x80 != 0 {
                    // the S bit makes the rectangle square
                    true => {
                        if elem.height.is_some() {
                            return Err(self.modal_fail(offset,
                                "square RECTANGLE must not carry a height".to_string()));
                        }
                        self.modal.geometry_h = Some(width);
                        width
                    },
                    false => match elem.height {
                        Some(v) => {
                            self.modal.geometry_h = Some(v);
                            v
                        },
                        None => *require(&self.modal.geometry_h,"geometry-h")
                            .map_err(|e| self.modal_fail(offset,e))?
                    }
                };
                let (x,y) = self.resolve_xy(elem.x,elem.y,XyFamily::Geometry,offset)?;
                let rep = self.resolve_rep(elem.rep,offset)?;
                if let Some(b) = builder {
                    b.begin_rectangle(layer,datatype,x,y,width,height,rep.as_ref())?;
                }
            },
            RecId::Polygon => {
                let (layer,datatype) = self.resolve_layer_datatype(&elem,offset)?;
                let points = match elem.points {
                    Some(p) => {
                        self.modal.polygon_points = Some(p.clone());
                        p
                    },
                    None => require(&self.modal.polygon_points,"polygon-point-list")
                        .map_err(|e| self.modal_fail(offset,e))?.clone()
                };
                if points.len() < 3 {
                    return Err(self.modal_fail(offset,format!(
                        "POLYGON has {} vertices; needs at least 3",points.len())));
                }
                let (x,y) = self.resolve_xy(elem.x,elem.y,XyFamily::Geometry,offset)?;
                let rep = self.resolve_rep(elem.rep,offset)?;
                if let Some(b) = builder {
                    b.begin_polygon(layer,datatype,x,y,&points,rep.as_ref())?;
                }
            },
            RecId::Path => {
                let (layer,datatype) = self.resolve_layer_datatype(&elem,offset)?;
                let halfwidth = match elem.halfwidth {
                    Some(v) => {
                        self.modal.path_halfwidth = Some(v);
                        v
                    },
                    None => *require(&self.modal.path_halfwidth,"path-halfwidth")
                        .map_err(|e| self.modal_fail(offset,e))?
                };
                let start_extn = self.resolve_extension(elem.info & 0x80 != 0,elem.start_extn,
                    halfwidth,true,offset)?;
                let end_extn = self.resolve_extension(elem.info & 0x80 != 0,elem.end_extn,
                    halfwidth,false,offset)?;
                let points = match elem.points {
                    Some(p) => {
                        self.modal.path_points = Some(p.clone());
                        p
                    },
                    None => require(&self.modal.path_points,"path-point-list")
                        .map_err(|e| self.modal_fail(offset,e))?.clone()
                };
                if points.len() < 2 {
                    return Err(self.modal_fail(offset,format!(
                        "PATH has {} vertices; needs at least 2",points.len())));
                }
                let (x,y) = self.resolve_xy(elem.x,elem.y,XyFamily::Geometry,offset)?;
                let rep = self.resolve_rep(elem.rep,offset)?;
                if let Some(b) = builder {
                    b.begin_path(layer,datatype,x,y,halfwidth,start_extn,end_extn,&points,rep.as_ref())?;
                }
            },
            RecId::Trapezoid | RecId::TrapezoidA | RecId::TrapezoidB => {
                let (layer,datatype) = self.resolve_layer_datatype(&elem,offset)?;
                let width = match elem.width {
                    Some(v) => {
                        self.modal.geometry_w = Some(v);
                        v
                    },
                    None => *require(&self.modal.geometry_w,"geometry-w")
                        .map_err(|e| self.modal_fail(offset,e))?
                };
                let height = match elem.height {
                    Some(v) => {
                        self.modal.geometry_h = Some(v);
                        v
                    },
                    None => *require(&self.modal.geometry_h,"geometry-h")
                        .map_err(|e| self.modal_fail(offset,e))?
                };
                let orient = match elem.info & 0x80 != 0 {
                    true => Orientation::Vertical,
                    false => Orientation::Horizontal
                };
                let trap = Trapezoid::new(orient,width,height,
                    elem.delta_a.unwrap_or(0),elem.delta_b.unwrap_or(0))
                    .map_err(|e| self.modal_fail(offset,e.to_string()))?;
                let (x,y) = self.resolve_xy(elem.x,elem.y,XyFamily::Geometry,offset)?;
                let rep = self.resolve_rep(elem.rep,offset)?;
                if let Some(b) = builder {
                    b.begin_trapezoid(layer,datatype,x,y,&trap,rep.as_ref())?;
                }
            },
            RecId::Ctrapezoid => {
                let (layer,datatype) = self.resolve_layer_datatype(&elem,offset)?;
                let ctrap_type = match elem.ctrap_type {
                    Some(t) => {
                        self.modal.ctrapezoid_type = Some(t);
                        t
                    },
                    None => *require(&self.modal.ctrapezoid_type,"ctrapezoid-type")
                        .map_err(|e| self.modal_fail(offset,e))?
                };
                let width = match elem.width {
                    Some(v) => v,
                    None => match Trapezoid::needs_width(ctrap_type) {
                        true => *require(&self.modal.geometry_w,"geometry-w")
                            .map_err(|e| self.modal_fail(offset,e))?,
                        false => 0
                    }
                };
                let height = match elem.height {
                    Some(v) => v,
                    None => match Trapezoid::needs_height(ctrap_type) {
                        true => *require(&self.modal.geometry_h,"geometry-h")
                            .map_err(|e| self.modal_fail(offset,e))?,
                        false => 0
                    }
                };
                let trap = Trapezoid::new_compressed(ctrap_type,width,height)
                    .map_err(|e| self.modal_fail(offset,e.to_string()))?;
                self.modal.geometry_w = Some(trap.width());
                self.modal.geometry_h = Some(trap.height());
                let (x,y) = self.resolve_xy(elem.x,elem.y,XyFamily::Geometry,offset)?;
                let rep = self.resolve_rep(elem.rep,offset)?;
                if let Some(b) = builder {
                    b.begin_trapezoid(layer,datatype,x,y,&trap,rep.as_ref())?;
                }
            },
            RecId::Circle => {
                let (layer,datatype) = self.resolve_layer_datatype(&elem,offset)?;
                let radius = match elem.radius {
                    Some(v) => {
                        self.modal.circle_radius = Some(v);
                        v
                    },
                    None => *require(&self.modal.circle_radius,"circle-radius")
                        .map_err(|e| self.modal_fail(offset,e))?
                };
                let (x,y) = self.resolve_xy(elem.x,elem.y,XyFamily::Geometry,offset)?;
                let rep = self.resolve_rep(elem.rep,offset)?;
                if let Some(b) = builder {
                    b.begin_circle(layer,datatype,x,y,radius,rep.as_ref())?;
                }
            },
            RecId::Xelement => {
                if let Some(b) = builder {
                    b.begin_xelement(elem.attribute,&elem.data)?;
                }
            },
            RecId::Xgeometry => {
                let (layer,datatype) = self.resolve_layer_datatype(&elem,offset)?;
                let (x,y) = self.resolve_xy(elem.x,elem.y,XyFamily::Geometry,offset)?;
                let rep = self.resolve_rep(elem.rep,offset)?;
                if let Some(b) = builder {
                    b.begin_xgeometry(layer,datatype,x,y,elem.attribute,&elem.data,rep.as_ref())?;
                }
            },
            _ => panic!("not an element record")
        }
        Ok(())
    }
    fn resolve_layer_datatype(&mut self,elem: &RawElem,offset: u64) -> Result<(u64,u64),DYNERR> {
        let layer = match elem.layer {
            Some(v) => {
                self.modal.layer = Some(v);
                v
            },
            None => *require(&self.modal.layer,"layer")
                .map_err(|e| self.modal_fail(offset,e))?
        };
        let datatype = match elem.datatype {
            Some(v) => {
                self.modal.datatype = Some(v);
                v
            },
            None => *require(&self.modal.datatype,"datatype")
                .map_err(|e| self.modal_fail(offset,e))?
        };
        Ok((layer,datatype))
    }
    fn resolve_extension(&mut self,scheme_present: bool,field: Option<ExtnField>,
        halfwidth: i64,is_start: bool,offset: u64) -> Result<i64,DYNERR> {
        let slot_name = match is_start {
            true => "path-start-extension",
            false => "path-end-extension"
        };
        let val = match (scheme_present,field) {
            (false,_) | (true,None) => {
                let slot = match is_start {
                    true => &self.modal.path_start_extn,
                    false => &self.modal.path_end_extn
                };
                *require(slot,slot_name).map_err(|e| self.modal_fail(offset,e))?
            },
            (true,Some(ExtnField::Flush)) => 0,
            (true,Some(ExtnField::HalfWidth)) => halfwidth,
            (true,Some(ExtnField::Explicit(v))) => v
        };
        match is_start {
            true => self.modal.path_start_extn = Some(val),
            false => self.modal.path_end_extn = Some(val)
        }
        Ok(val)
    }
}

#[derive(Clone,Copy)]
enum XyFamily {
    Placement,
    Text,
    Geometry
}

fn is_name_record(id: RecId) -> bool {
    matches!(id,RecId::Cellname | RecId::CellnameRef | RecId::Textstring | RecId::TextstringRef
        | RecId::Propname | RecId::PropnameRef | RecId::Propstring | RecId::PropstringRef
        | RecId::LayernameGeometry | RecId::LayernameText | RecId::Xname | RecId::XnameRef)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// magic + START with offsets in START, all tables strict and empty
    fn start_bytes(unit: u64) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.push(RecId::Start as u8);
        bytes.extend_from_slice(&[3,b'1',b'.',b'0']);
        bytes.push(0);
        bytes.push(unit as u8);
        bytes.push(0);
        for _i in 0..6 {
            bytes.extend_from_slice(&[1,0]);
        }
        bytes
    }
    fn write_temp(bytes: &[u8]) -> (tempfile::TempDir,String) {
        let dir = tempfile::tempdir().expect("no temp dir");
        let path = dir.path().join("t.oas").to_str().unwrap().to_string();
        let mut f = std::fs::File::create(&path).expect("create failed");
        f.write_all(bytes).expect("write failed");
        (dir,path)
    }
    struct NullBuilder {}
    impl OasisBuilder for NullBuilder {}

    #[test]
    fn unset_modal_is_fatal() {
        let mut bytes = start_bytes(100);
        bytes.push(RecId::CellNamed as u8);
        bytes.extend_from_slice(&[1,b'A']);
        // RECTANGLE with W,H,X,Y but no layer or datatype
        let rect_offset = bytes.len() as u64;
        bytes.push(RecId::Rectangle as u8);
        bytes.push(0x78);
        bytes.extend_from_slice(&[10,5,0,0]);
        bytes.push(RecId::End as u8);
        let (_d,path) = write_temp(&bytes);
        let mut options = OasisParserOptions::default();
        options.want_validation = false;
        let mut parser = OasisParser::open(&path,None,&options).expect("open failed");
        let mut sink = NullBuilder {};
        let err = parser.parse_file(&mut sink).err().expect("should fail");
        let msg = err.to_string();
        assert!(msg.contains("'layer'"),"{}",msg);
        assert!(msg.contains(&format!("offset {}",rect_offset)),"{}",msg);
    }
    #[test]
    fn modal_carries_between_records() {
        struct Count {
            rects: usize,
            last: (u64,u64,i64,i64,i64,i64)
        }
        impl OasisBuilder for Count {
            fn begin_rectangle(&mut self,layer: u64,datatype: u64,x: i64,y: i64,width: i64,height: i64,
                _rep: Option<&Repetition>) -> crate::STDRESULT {
                self.rects += 1;
                self.last = (layer,datatype,x,y,width,height);
                Ok(())
            }
        }
        let mut bytes = start_bytes(100);
        bytes.push(RecId::CellNamed as u8);
        bytes.extend_from_slice(&[1,b'A']);
        // full rectangle: layer 1 datatype 2 width 10 height 5 at (20,30)
        bytes.push(RecId::Rectangle as u8);
        bytes.push(0x7b);
        bytes.extend_from_slice(&[1,2,10,5,40,60]);
        // second rectangle: only a new x; everything else modal
        bytes.push(RecId::Rectangle as u8);
        bytes.push(0x10);
        bytes.extend_from_slice(&[100]);
        bytes.push(RecId::End as u8);
        let (_d,path) = write_temp(&bytes);
        let mut options = OasisParserOptions::default();
        options.want_validation = false;
        options.strict_conformance = false;
        let mut parser = OasisParser::open(&path,None,&options).expect("open failed");
        let mut sink = Count { rects: 0, last: (0,0,0,0,0,0) };
        parser.parse_file(&mut sink).expect("parse failed");
        assert_eq!(sink.rects,2);
        assert_eq!(sink.last,(1,2,50,30,10,5));
    }
}
