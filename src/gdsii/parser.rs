//! # GDSII parser
//!
//! `GdsParser` sits on the scanner and presents the file as a sequence of
//! structures, elements, and properties, announced through a `GdsBuilder`.
//!
//! The parser rejects the record types the spec declares unused, and also
//! TEXTNODE and the types past BORDER that never appear in the published
//! grammar.  It accepts these extensions, needed for files written by other
//! tools:
//!
//! * structure names may use any graphic ASCII character, up to 65530 bytes
//! * empty LIBNAME and ATTRTABLE records
//! * DATATYPE, TEXTTYPE, NODETYPE, and BOXTYPE may be omitted (read as 0)
//! * PATHTYPE values outside {0,1,2,4} are replaced by 0 with a warning
//! * a BGNEXTN or ENDEXTN record forces the path type to 4
//! * MAG and ANGLE may appear in either order
//! * GENERATIONS bounds are not enforced
//! * PROPATTR 0 and duplicate PROPATTR values are tolerated
//!
//! Each tolerated deviation is reported through the optional warning
//! handler; without one it goes to the log.

use std::collections::HashMap;
use log::warn;
use crate::fio::FileType;
use crate::{DYNERR,STDRESULT};
use super::scanner::GdsScanner;
use super::rectypes::{RecType,DataKind};
use super::builder::*;
use super::*;

/// Mapping from structure names to the file offset of their BGNSTR record,
/// in order of appearance.  Provides random access to structures.
pub struct FileIndex {
    map: HashMap<String,u64>,
    order: Vec<String>
}

impl FileIndex {
    fn new() -> Self {
        Self { map: HashMap::new(), order: Vec::new() }
    }
    fn insert(&mut self,name: &str,offset: u64) {
        if self.map.insert(name.to_string(),offset).is_none() {
            self.order.push(name.to_string());
        }
    }
    pub fn get(&self,name: &str) -> Option<u64> {
        self.map.get(name).copied()
    }
    /// structure names in order of appearance
    pub fn names(&self) -> &[String] {
        &self.order
    }
}

/// Builder for the DAG of structure references.  `build_structure_graph`
/// announces, for each structure, the structures it references through SREF
/// and AREF records.  Strings are only good for the duration of the call.
#[allow(unused_variables)]
pub trait GdsGraphBuilder {
    fn begin_library(&mut self,libname: &str) -> STDRESULT {
        Ok(())
    }
    fn enter_structure(&mut self,sname: &str) -> STDRESULT {
        Ok(())
    }
    fn add_sref(&mut self,sname: &str) -> STDRESULT {
        Ok(())
    }
    fn end_library(&mut self) -> STDRESULT {
        Ok(())
    }
}

/// A decoded record the parser can hold across scans.
enum RecData {
    None,
    Bits(u16),
    Shorts(Vec<i16>),
    Ints(Vec<i32>),
    Doubles(Vec<f64>),
    Bytes(Vec<u8>)
}

struct Rec {
    rtype: RecType,
    offset: u64,
    data: RecData
}

impl Rec {
    fn bits(&self) -> u16 {
        match &self.data {
            RecData::Bits(v) => *v,
            _ => panic!("record does not hold a bit array")
        }
    }
    fn shorts(&self) -> &[i16] {
        match &self.data {
            RecData::Shorts(v) => v,
            _ => panic!("record does not hold shorts")
        }
    }
    fn ints(&self) -> &[i32] {
        match &self.data {
            RecData::Ints(v) => v,
            _ => panic!("record does not hold ints")
        }
    }
    fn doubles(&self) -> &[f64] {
        match &self.data {
            RecData::Doubles(v) => v,
            _ => panic!("record does not hold doubles")
        }
    }
    fn bytes(&self) -> &[u8] {
        match &self.data {
            RecData::Bytes(v) => v,
            _ => panic!("record does not hold a string")
        }
    }
}

pub struct GdsParser {
    scanner: GdsScanner,
    warn_handler: Option<Box<dyn FnMut(&str)>>,
    index: Option<FileIndex>,
    curr_struct: Option<String>,
    units: Option<GdsUnits>
}

impl GdsParser {
    pub fn open(fname: &str,ftype: FileType,warn_handler: Option<Box<dyn FnMut(&str)>>) -> Result<Self,DYNERR> {
        let scanner = GdsScanner::open(fname,ftype)?;
        Ok(Self {
            scanner,
            warn_handler,
            index: None,
            curr_struct: None,
            units: None
        })
    }
    /// units from the last library header parsed, if any
    pub fn units(&self) -> Option<GdsUnits> {
        self.units
    }
    fn abort(&self,offset: u64,msg: String) -> DYNERR {
        let msg = match &self.curr_struct {
            Some(s) => format!("in structure '{}': {}",s,msg),
            None => msg
        };
        Box::new(Error::Format(self.scanner.filename().to_string(),offset,msg))
    }
    fn warn(&mut self,offset: u64,msg: String) {
        let full = format!("file '{}', offset {}: {}",self.scanner.filename(),offset,msg);
        match &mut self.warn_handler {
            Some(handler) => handler(&full),
            None => warn!("{}",full)
        }
    }
    /// Scan and decode the next record.
    fn next_rec(&mut self) -> Result<Rec,DYNERR> {
        let mut raw = self.scanner.get_next_record()?;
        let rtype = raw.rec_type();
        let offset = raw.offset();
        let data = match raw.data_kind() {
            DataKind::None => RecData::None,
            DataKind::BitArray => RecData::Bits(raw.next_bit_array()),
            DataKind::Short => {
                let mut v = Vec::with_capacity(raw.num_items());
                for _i in 0..raw.num_items() {
                    v.push(raw.next_short());
                }
                RecData::Shorts(v)
            },
            DataKind::Int => {
                let mut v = Vec::with_capacity(raw.num_items());
                for _i in 0..raw.num_items() {
                    v.push(raw.next_int());
                }
                RecData::Ints(v)
            },
            DataKind::Double => {
                let mut v = Vec::with_capacity(raw.num_items());
                for _i in 0..raw.num_items() {
                    v.push(raw.next_double());
                }
                RecData::Doubles(v)
            },
            DataKind::Str => RecData::Bytes(match raw.rec_type().info().item_size {
                0 => raw.var_string().to_vec(),
                _ => raw.raw_body().to_vec()
            })
        };
        Ok(Rec { rtype, offset, data })
    }
    fn expect(&mut self,rtype: RecType) -> Result<Rec,DYNERR> {
        let rec = self.next_rec()?;
        if rec.rtype != rtype {
            return Err(self.abort(rec.offset,format!("expected {} record, found {}",
                rtype.name(),rec.rtype.name())));
        }
        Ok(rec)
    }
    /// Decode a name record, insisting on graphic ASCII.
    fn name_from(&self,rec: &Rec) -> Result<String,DYNERR> {
        for b in rec.bytes() {
            if *b < 0x21 || *b > 0x7e {
                return Err(self.abort(rec.offset,format!(
                    "{} contains a character that is not graphic ASCII",rec.rtype.name())));
            }
        }
        Ok(String::from_utf8(rec.bytes().to_vec()).expect("unreachable"))
    }
    /// Decode an ASCII string record, allowing any ASCII byte.
    fn string_from(&self,rec: &Rec) -> Result<String,DYNERR> {
        for b in rec.bytes() {
            if *b > 0x7e {
                return Err(self.abort(rec.offset,format!(
                    "{} contains a non-ASCII character",rec.rtype.name())));
            }
        }
        Ok(String::from_utf8(rec.bytes().to_vec()).expect("unreachable"))
    }
    fn date_pair(&self,rec: &Rec) -> Result<(GdsDate,GdsDate),DYNERR> {
        let s = rec.shorts();
        if s.len() != 12 {
            return Err(self.abort(rec.offset,format!("{} must hold two timestamps",rec.rtype.name())));
        }
        let d1 = GdsDate { year: s[0], month: s[1], day: s[2], hour: s[3], minute: s[4], second: s[5] };
        let d2 = GdsDate { year: s[6], month: s[7], day: s[8], hour: s[9], minute: s[10], second: s[11] };
        Ok((d1,d2))
    }
    fn points_from(&self,rec: &Rec,min: usize,max: usize) -> Result<Vec<GdsPoint>,DYNERR> {
        let ints = rec.ints();
        let n = ints.len()/2;
        if n < min || n > max {
            return Err(self.abort(rec.offset,format!(
                "XY record has {} points; must have {} to {}",n,min,max)));
        }
        let mut ans = Vec::with_capacity(n);
        for i in 0..n {
            ans.push(GdsPoint::new(ints[2*i],ints[2*i+1]));
        }
        Ok(ans)
    }

    /// Parse the whole file, invoking the builder as each part is recognized.
    pub fn parse_file(&mut self,builder: &mut dyn GdsBuilder) -> STDRESULT {
        self.scanner.seek_to(0)?;
        self.curr_struct = None;
        self.parse_library_header(builder)?;
        loop {
            let rec = self.next_rec()?;
            match rec.rtype {
                RecType::BgnStr => self.parse_structure_body(rec,builder)?,
                RecType::EndLib => break,
                _ => return Err(self.abort(rec.offset,format!(
                    "expected BGNSTR or ENDLIB record, found {}",rec.rtype.name())))
            }
        }
        builder.end_library()
    }
    /// Parse the library header and exactly one structure.  The builder sees
    /// the usual begin/end library bracket around it.  Returns false if the
    /// file has no structure with this name.
    pub fn parse_structure(&mut self,sname: &str,builder: &mut dyn GdsBuilder) -> Result<bool,DYNERR> {
        self.make_index()?;
        let offset = match self.index.as_ref().expect("unreachable").get(sname) {
            Some(o) => o,
            None => return Ok(false)
        };
        self.scanner.seek_to(0)?;
        self.parse_library_header(builder)?;
        self.scanner.seek_to(offset)?;
        let rec = self.expect(RecType::BgnStr)?;
        self.parse_structure_body(rec,builder)?;
        builder.end_library()?;
        Ok(true)
    }
    /// Scan the file once to map structure names to offsets.
    pub fn make_index(&mut self) -> Result<&FileIndex,DYNERR> {
        if self.index.is_none() {
            let mut index = FileIndex::new();
            self.scanner.seek_to(0)?;
            let mut bgnstr_offset: Option<u64> = None;
            loop {
                let rec = self.next_rec()?;
                match rec.rtype {
                    RecType::BgnStr => bgnstr_offset = Some(rec.offset),
                    RecType::StrName => {
                        if let Some(offset) = bgnstr_offset.take() {
                            index.insert(&self.name_from(&rec)?,offset);
                        }
                    },
                    RecType::EndLib => break,
                    _ => {}
                }
            }
            self.index = Some(index);
        }
        Ok(self.index.as_ref().expect("unreachable"))
    }
    /// Reduced parse announcing only the structure reference graph.
    pub fn build_structure_graph(&mut self,gbuilder: &mut dyn GdsGraphBuilder) -> STDRESULT {
        self.scanner.seek_to(0)?;
        let mut in_ref = false;
        let mut expecting_struct = false;
        loop {
            let rec = self.next_rec()?;
            match rec.rtype {
                RecType::LibName => gbuilder.begin_library(&self.string_from(&rec)?)?,
                RecType::BgnStr => expecting_struct = true,
                RecType::StrName => {
                    if expecting_struct {
                        gbuilder.enter_structure(&self.name_from(&rec)?)?;
                        expecting_struct = false;
                    }
                },
                RecType::Sref | RecType::Aref => in_ref = true,
                RecType::Sname => {
                    if in_ref {
                        gbuilder.add_sref(&self.name_from(&rec)?)?;
                        in_ref = false;
                    }
                },
                RecType::EndLib => break,
                _ => {}
            }
        }
        gbuilder.end_library()
    }

    fn parse_library_header(&mut self,builder: &mut dyn GdsBuilder) -> STDRESULT {
        let rec = self.expect(RecType::Header)?;
        builder.gds_version(rec.shorts()[0])?;
        let rec = self.expect(RecType::BgnLib)?;
        let (mod_time,acc_time) = self.date_pair(&rec)?;
        let mut options = GdsLibraryOptions::default();
        let mut rec = self.next_rec()?;
        if rec.rtype==RecType::LibDirSize {
            options.libdirsize = Some(rec.shorts()[0]);
            rec = self.next_rec()?;
        }
        if rec.rtype==RecType::SrfName {
            options.srfname = Some(self.string_from(&rec)?);
            rec = self.next_rec()?;
        }
        if rec.rtype==RecType::LibSecur {
            let s = rec.shorts();
            let mut acls = Vec::new();
            for i in 0..s.len()/3 {
                acls.push(GdsAclEntry { groupid: s[3*i], userid: s[3*i+1], rights: s[3*i+2] });
            }
            options.acls = Some(acls);
            rec = self.next_rec()?;
        }
        if rec.rtype != RecType::LibName {
            return Err(self.abort(rec.offset,format!("expected LIBNAME record, found {}",rec.rtype.name())));
        }
        let libname = self.string_from(&rec)?;
        let mut rec = self.next_rec()?;
        if rec.rtype==RecType::RefLibs {
            options.reflibs = Some(self.fixed_strings(&rec));
            rec = self.next_rec()?;
        }
        if rec.rtype==RecType::Fonts {
            options.fonts = Some(self.fixed_strings(&rec));
            rec = self.next_rec()?;
        }
        if rec.rtype==RecType::AttrTable {
            options.attrtable = Some(self.string_from(&rec)?);
            rec = self.next_rec()?;
        }
        if rec.rtype==RecType::Generations {
            // bounds deliberately unchecked
            options.generations = Some(rec.shorts()[0]);
            rec = self.next_rec()?;
        }
        if rec.rtype==RecType::Format {
            options.format = match rec.shorts()[0] {
                0 => Some(GdsFormat::GdsiiArchive),
                1 => Some(GdsFormat::GdsiiFiltered),
                2 => Some(GdsFormat::EdsiiiArchive),
                3 => Some(GdsFormat::EdsiiiFiltered),
                bad => return Err(self.abort(rec.offset,format!("invalid FORMAT value {}",bad)))
            };
            rec = self.next_rec()?;
            if rec.rtype==RecType::Mask {
                while rec.rtype==RecType::Mask {
                    options.masks.push(self.string_from(&rec)?);
                    rec = self.next_rec()?;
                }
                if rec.rtype != RecType::EndMasks {
                    return Err(self.abort(rec.offset,format!("expected ENDMASKS record, found {}",rec.rtype.name())));
                }
                rec = self.next_rec()?;
            }
        }
        if rec.rtype != RecType::Units {
            return Err(self.abort(rec.offset,format!("expected UNITS record, found {}",rec.rtype.name())));
        }
        let d = rec.doubles();
        let units = GdsUnits { db_to_user: d[0], db_to_meter: d[1] };
        self.units = Some(units);
        builder.begin_library(&libname,&mod_time,&acc_time,&units,&options)
    }
    fn fixed_strings(&self,rec: &Rec) -> Vec<String> {
        // 44-byte NUL-padded blobs; trailing NULs are dropped
        let mut ans = Vec::new();
        let bytes = rec.bytes();
        for blob in bytes.chunks(44) {
            let end = blob.iter().position(|b| *b==0).unwrap_or(blob.len());
            ans.push(String::from_utf8_lossy(&blob[0..end]).to_string());
        }
        ans
    }

    fn parse_structure_body(&mut self,bgnstr: Rec,builder: &mut dyn GdsBuilder) -> STDRESULT {
        let (create_time,mod_time) = self.date_pair(&bgnstr)?;
        let rec = self.expect(RecType::StrName)?;
        let sname = self.name_from(&rec)?;
        self.curr_struct = Some(sname.clone());
        let mut options = GdsStructureOptions::default();
        let mut rec = self.next_rec()?;
        if rec.rtype==RecType::StrClass {
            options.strclass = Some(rec.bits());
            rec = self.next_rec()?;
        }
        builder.begin_structure(&sname,&create_time,&mod_time,&options)?;
        loop {
            match rec.rtype {
                RecType::Boundary => self.parse_boundary(builder)?,
                RecType::Path => self.parse_path(builder)?,
                RecType::Sref => self.parse_sref(builder)?,
                RecType::Aref => self.parse_aref(builder)?,
                RecType::Text => self.parse_text(builder)?,
                RecType::Node => self.parse_node(builder)?,
                RecType::Box => self.parse_box(builder)?,
                RecType::EndStr => break,
                _ => return Err(self.abort(rec.offset,format!(
                    "expected an element or ENDSTR record, found {}",rec.rtype.name())))
            }
            rec = self.next_rec()?;
        }
        self.curr_struct = None;
        builder.end_structure()
    }
    fn parse_element_options(&mut self) -> Result<(GdsElementOptions,Rec),DYNERR> {
        let mut options = GdsElementOptions::default();
        let mut rec = self.next_rec()?;
        if rec.rtype==RecType::ElFlags {
            options.elflags = Some(rec.bits());
            rec = self.next_rec()?;
        }
        if rec.rtype==RecType::Plex {
            options.plex = Some(rec.ints()[0]);
            rec = self.next_rec()?;
        }
        Ok((options,rec))
    }
    /// LAYER plus the companion type record, which may be absent (reads 0).
    fn parse_layer_and_type(&mut self,mut rec: Rec,type_rec: RecType) -> Result<(i16,i16,Rec),DYNERR> {
        if rec.rtype != RecType::Layer {
            return Err(self.abort(rec.offset,format!("expected LAYER record, found {}",rec.rtype.name())));
        }
        let layer = rec.shorts()[0];
        if layer < 0 {
            return Err(self.abort(rec.offset,format!("negative layer {}",layer)));
        }
        rec = self.next_rec()?;
        let dtype = match rec.rtype==type_rec {
            true => {
                let val = rec.shorts()[0];
                rec = self.next_rec()?;
                val
            },
            false => {
                self.warn(rec.offset,format!("missing {} record, using 0",type_rec.name()));
                0
            }
        };
        if dtype < 0 {
            return Err(self.abort(rec.offset,format!("negative {} {}",type_rec.name(),dtype)));
        }
        Ok((layer,dtype,rec))
    }
    fn parse_properties(&mut self,builder: &mut dyn GdsBuilder) -> STDRESULT {
        let mut seen: Vec<i16> = Vec::new();
        loop {
            let rec = self.next_rec()?;
            match rec.rtype {
                RecType::PropAttr => {
                    let attr = rec.shorts()[0];
                    if attr < 0 {
                        return Err(self.abort(rec.offset,format!("negative PROPATTR {}",attr)));
                    }
                    if seen.contains(&attr) {
                        self.warn(rec.offset,format!("duplicate PROPATTR {}",attr));
                    }
                    seen.push(attr);
                    let vrec = self.expect(RecType::PropValue)?;
                    let value = self.string_from(&vrec)?;
                    builder.add_property(attr,&value)?;
                },
                RecType::EndEl => break,
                _ => return Err(self.abort(rec.offset,format!(
                    "expected PROPATTR or ENDEL record, found {}",rec.rtype.name())))
            }
        }
        builder.end_element()
    }
    fn parse_boundary(&mut self,builder: &mut dyn GdsBuilder) -> STDRESULT {
        let (options,rec) = self.parse_element_options()?;
        let (layer,datatype,rec) = self.parse_layer_and_type(rec,RecType::Datatype)?;
        if rec.rtype != RecType::Xy {
            return Err(self.abort(rec.offset,format!("expected XY record, found {}",rec.rtype.name())));
        }
        let points = self.points_from(&rec,MIN_BOUNDARY_POINTS,MAX_BOUNDARY_POINTS)?;
        builder.begin_boundary(layer,datatype,&points,&options)?;
        self.parse_properties(builder)
    }
    fn parse_path(&mut self,builder: &mut dyn GdsBuilder) -> STDRESULT {
        let (eopts,rec) = self.parse_element_options()?;
        let (layer,datatype,mut rec) = self.parse_layer_and_type(rec,RecType::Datatype)?;
        let mut options = GdsPathOptions::default();
        options.elflags = eopts.elflags;
        options.plex = eopts.plex;
        if rec.rtype==RecType::PathType {
            let raw = rec.shorts()[0];
            options.pathtype = match GdsPathtype::from_short(raw) {
                Some(pt) => Some(pt),
                None => {
                    self.warn(rec.offset,format!("invalid PATHTYPE {} replaced with 0",raw));
                    Some(GdsPathtype::Flush)
                }
            };
            rec = self.next_rec()?;
        }
        if rec.rtype==RecType::Width {
            options.width = Some(rec.ints()[0]);
            rec = self.next_rec()?;
        }
        if rec.rtype==RecType::BgnExtn {
            options.bgnextn = Some(rec.ints()[0]);
            rec = self.next_rec()?;
        }
        if rec.rtype==RecType::EndExtn {
            options.endextn = Some(rec.ints()[0]);
            rec = self.next_rec()?;
        }
        if (options.bgnextn.is_some() || options.endextn.is_some())
            && options.pathtype != Some(GdsPathtype::Custom) {
            self.warn(rec.offset,"extension records force path type 4".to_string());
            options.pathtype = Some(GdsPathtype::Custom);
        }
        if rec.rtype != RecType::Xy {
            return Err(self.abort(rec.offset,format!("expected XY record, found {}",rec.rtype.name())));
        }
        let points = self.points_from(&rec,MIN_PATH_POINTS,MAX_PATH_POINTS)?;
        builder.begin_path(layer,datatype,&points,&options)?;
        self.parse_properties(builder)
    }
    fn parse_strans(&mut self,mut rec: Rec) -> Result<(Option<GdsTransform>,Rec),DYNERR> {
        if rec.rtype != RecType::Strans {
            return Ok((None,rec));
        }
        let bits = rec.bits();
        let mut strans = GdsTransform::default();
        strans.reflect = bits & 0x8000 != 0;
        strans.abs_mag = bits & 0x0004 != 0;
        strans.abs_angle = bits & 0x0002 != 0;
        // MAG and ANGLE accepted in either order
        rec = self.next_rec()?;
        for _i in 0..2 {
            if rec.rtype==RecType::Mag && strans.mag.is_none() {
                strans.mag = Some(rec.doubles()[0]);
                rec = self.next_rec()?;
            } else if rec.rtype==RecType::Angle && strans.angle.is_none() {
                strans.angle = Some(rec.doubles()[0]);
                rec = self.next_rec()?;
            }
        }
        Ok((Some(strans),rec))
    }
    fn parse_sref(&mut self,builder: &mut dyn GdsBuilder) -> STDRESULT {
        let (options,rec) = self.parse_element_options()?;
        if rec.rtype != RecType::Sname {
            return Err(self.abort(rec.offset,format!("expected SNAME record, found {}",rec.rtype.name())));
        }
        let sname = self.name_from(&rec)?;
        let rec = self.next_rec()?;
        let (strans,rec) = self.parse_strans(rec)?;
        if rec.rtype != RecType::Xy {
            return Err(self.abort(rec.offset,format!("expected XY record, found {}",rec.rtype.name())));
        }
        let points = self.points_from(&rec,1,1)?;
        builder.begin_sref(&sname,points[0].x,points[0].y,&strans,&options)?;
        self.parse_properties(builder)
    }
    fn parse_aref(&mut self,builder: &mut dyn GdsBuilder) -> STDRESULT {
        let (options,rec) = self.parse_element_options()?;
        if rec.rtype != RecType::Sname {
            return Err(self.abort(rec.offset,format!("expected SNAME record, found {}",rec.rtype.name())));
        }
        let sname = self.name_from(&rec)?;
        let rec = self.next_rec()?;
        let (strans,rec) = self.parse_strans(rec)?;
        if rec.rtype != RecType::ColRow {
            return Err(self.abort(rec.offset,format!("expected COLROW record, found {}",rec.rtype.name())));
        }
        let s = rec.shorts();
        let (cols,rows) = (s[0],s[1]);
        if cols < 1 || rows < 1 {
            return Err(self.abort(rec.offset,format!("invalid COLROW {} x {}",cols,rows)));
        }
        let rec = self.expect(RecType::Xy)?;
        let points = self.points_from(&rec,3,3)?;
        let corner = [points[0],points[1],points[2]];
        builder.begin_aref(&sname,cols,rows,&corner,&strans,&options)?;
        self.parse_properties(builder)
    }
    fn parse_text(&mut self,builder: &mut dyn GdsBuilder) -> STDRESULT {
        let (eopts,rec) = self.parse_element_options()?;
        let (layer,texttype,mut rec) = self.parse_layer_and_type(rec,RecType::TextType)?;
        let mut options = GdsTextOptions::default();
        options.elflags = eopts.elflags;
        options.plex = eopts.plex;
        if rec.rtype==RecType::Presentation {
            options.presentation = Some(rec.bits());
            rec = self.next_rec()?;
        }
        if rec.rtype==RecType::PathType {
            let raw = rec.shorts()[0];
            options.pathtype = match GdsPathtype::from_short(raw) {
                Some(pt) => Some(pt),
                None => {
                    self.warn(rec.offset,format!("invalid PATHTYPE {} replaced with 0",raw));
                    Some(GdsPathtype::Flush)
                }
            };
            rec = self.next_rec()?;
        }
        if rec.rtype==RecType::Width {
            options.width = Some(rec.ints()[0]);
            rec = self.next_rec()?;
        }
        let (strans,rec) = self.parse_strans(rec)?;
        if rec.rtype != RecType::Xy {
            return Err(self.abort(rec.offset,format!("expected XY record, found {}",rec.rtype.name())));
        }
        let points = self.points_from(&rec,1,1)?;
        let srec = self.expect(RecType::String)?;
        let text = self.string_from(&srec)?;
        builder.begin_text(layer,texttype,points[0].x,points[0].y,&text,&strans,&options)?;
        self.parse_properties(builder)
    }
    fn parse_node(&mut self,builder: &mut dyn GdsBuilder) -> STDRESULT {
        let (options,rec) = self.parse_element_options()?;
        let (layer,nodetype,rec) = self.parse_layer_and_type(rec,RecType::NodeType)?;
        if rec.rtype != RecType::Xy {
            return Err(self.abort(rec.offset,format!("expected XY record, found {}",rec.rtype.name())));
        }
        let points = self.points_from(&rec,MIN_NODE_POINTS,MAX_NODE_POINTS)?;
        builder.begin_node(layer,nodetype,&points,&options)?;
        self.parse_properties(builder)
    }
    fn parse_box(&mut self,builder: &mut dyn GdsBuilder) -> STDRESULT {
        let (options,rec) = self.parse_element_options()?;
        let (layer,boxtype,rec) = self.parse_layer_and_type(rec,RecType::BoxType)?;
        if rec.rtype != RecType::Xy {
            return Err(self.abort(rec.offset,format!("expected XY record, found {}",rec.rtype.name())));
        }
        let points = self.points_from(&rec,BOX_POINTS,BOX_POINTS)?;
        builder.begin_box(layer,boxtype,&points,&options)?;
        self.parse_properties(builder)
    }
}
