//! # OASIS creator
//!
//! `OasisCreator` implements `OasisBuilder` over the low-level writer, so a
//! parser for either format can stream into it.  It keeps its own modal
//! state and omits every field whose value the modal already carries, and
//! it picks the more compact record form where several exist: square
//! rectangles get the S bit, trapezoids that match a compressed type become
//! CTRAPEZOID records, repeated properties collapse to the one-byte
//! PROPERTY repeat record, and a repetition equal to the modal one is
//! encoded as a reuse.
//!
//! Name tables are written strict, each as one contiguous run of
//! explicit-reference-number records placed after the last cell; the END
//! record points at them through the table-offsets block.

use std::rc::Rc;
use crate::fio::FileType;
use crate::{DYNERR,STDRESULT};
use super::writer::{OasisWriter,unsigned_size};
use super::names::*;
use super::modal::ModalVars;
use super::oreal::Oreal;
use super::rep::{Delta,Repetition};
use super::trapezoid::{Trapezoid,Orientation};
use super::validate::ValScheme;
use super::builder::OasisBuilder;
use super::{RecId,MAGIC,VERSION_STRING,END_RECORD_LENGTH};

pub struct OasisCreator {
    writer: OasisWriter,
    modal: ModalVars,
    val_scheme: ValScheme,
    cellnames: NameTable,
    textstrings: NameTable,
    propnames: NameTable,
    propstrings: NameTable,
    xnames: NameTable,
    layernames: Vec<Rc<LayerName>>,
    in_cell: bool
}

impl OasisCreator {
    pub fn create(fname: &str,ftype: FileType,val_scheme: ValScheme) -> Result<Self,DYNERR> {
        let writer = OasisWriter::create(fname,ftype)?;
        Ok(Self {
            writer,
            modal: ModalVars::new(),
            val_scheme,
            cellnames: NameTable::new("CELLNAME"),
            textstrings: NameTable::new("TEXTSTRING"),
            propnames: NameTable::new("PROPNAME"),
            propstrings: NameTable::new("PROPSTRING"),
            xnames: NameTable::new("XNAME"),
            layernames: Vec::new(),
            in_cell: false
        })
    }
    fn id(&mut self,id: RecId) -> STDRESULT {
        self.writer.write_byte(id as u8)
    }

    //------------------------------------------------------------------
    // Repetitions

    fn write_repetition(&mut self,rep: &Repetition) -> STDRESULT {
        if self.modal.repetition.as_ref()==Some(rep) {
            return self.writer.write_unsigned(0);
        }
        let dim2 = |v: u64| -> Result<u64,DYNERR> {
            match v >= 2 {
                true => Ok(v - 2),
                false => Err(Box::new(super::Error::Create("repetition".to_string(),
                    format!("repetition dimension {} is below 2",v))))
            }
        };
        let varying = |w: &mut OasisWriter,offsets: &[i64]| -> STDRESULT {
            let mut prev = 0;
            for v in &offsets[1..] {
                if *v < prev {
                    return Err(w.err("varying repetition offsets must ascend".to_string()));
                }
                w.write_unsigned((*v - prev) as u64)?;
                prev = *v;
            }
            Ok(())
        };
        match rep {
            Repetition::Matrix { cols, rows, col_space, row_space } => {
                self.writer.write_unsigned(1)?;
                self.writer.write_unsigned(dim2(*cols)?)?;
                self.writer.write_unsigned(dim2(*rows)?)?;
                self.writer.write_unsigned(*col_space as u64)?;
                self.writer.write_unsigned(*row_space as u64)?;
            },
            Repetition::UniformX { dim, space } => {
                self.writer.write_unsigned(2)?;
                self.writer.write_unsigned(dim2(*dim)?)?;
                self.writer.write_unsigned(*space as u64)?;
            },
            Repetition::UniformY { dim, space } => {
                self.writer.write_unsigned(3)?;
                self.writer.write_unsigned(dim2(*dim)?)?;
                self.writer.write_unsigned(*space as u64)?;
            },
            Repetition::VaryingX { offsets } => {
                self.writer.write_unsigned(4)?;
                self.writer.write_unsigned(dim2(offsets.len() as u64)?)?;
                varying(&mut self.writer,offsets)?;
            },
            Repetition::GridVaryingX { grid, offsets } => {
                self.writer.write_unsigned(5)?;
                self.writer.write_unsigned(dim2(offsets.len() as u64)?)?;
                self.writer.write_unsigned(*grid as u64)?;
                varying(&mut self.writer,offsets)?;
            },
            Repetition::VaryingY { offsets } => {
                self.writer.write_unsigned(6)?;
                self.writer.write_unsigned(dim2(offsets.len() as u64)?)?;
                varying(&mut self.writer,offsets)?;
            },
            Repetition::GridVaryingY { grid, offsets } => {
                self.writer.write_unsigned(7)?;
                self.writer.write_unsigned(dim2(offsets.len() as u64)?)?;
                self.writer.write_unsigned(*grid as u64)?;
                varying(&mut self.writer,offsets)?;
            },
            Repetition::TiltedMatrix { ncount, mcount, ndelta, mdelta } => {
                self.writer.write_unsigned(8)?;
                self.writer.write_unsigned(dim2(*ncount)?)?;
                self.writer.write_unsigned(dim2(*mcount)?)?;
                self.writer.write_g_delta(*ndelta)?;
                self.writer.write_g_delta(*mdelta)?;
            },
            Repetition::Diagonal { dim, delta } => {
                self.writer.write_unsigned(9)?;
                self.writer.write_unsigned(dim2(*dim)?)?;
                self.writer.write_g_delta(*delta)?;
            },
            Repetition::Arbitrary { offsets } => {
                self.writer.write_unsigned(10)?;
                self.writer.write_unsigned(dim2(offsets.len() as u64)?)?;
                let mut prev = Delta::new(0,0);
                for d in &offsets[1..] {
                    self.writer.write_g_delta(*d - prev)?;
                    prev = *d;
                }
            },
            Repetition::GridArbitrary { grid, offsets } => {
                self.writer.write_unsigned(11)?;
                self.writer.write_unsigned(dim2(offsets.len() as u64)?)?;
                self.writer.write_unsigned(*grid as u64)?;
                let mut prev = Delta::new(0,0);
                for d in &offsets[1..] {
                    self.writer.write_g_delta(*d - prev)?;
                    prev = *d;
                }
            }
        }
        self.modal.repetition = Some(rep.clone());
        Ok(())
    }

    //------------------------------------------------------------------
    // Point lists

    /// Pick the most compact eligible encoding: alternating 1-deltas for
    /// paths, then 2-delta, 3-delta, or the general g-delta form.
    fn write_point_list(&mut self,points: &[Delta],is_path: bool) -> STDRESULT {
        let mut deltas = Vec::with_capacity(points.len()-1);
        let mut prev = points[0];
        for pt in &points[1..] {
            deltas.push(*pt - prev);
            prev = *pt;
        }
        if is_path && deltas.len() > 0 {
            if let Some(first_horizontal) = alternating(&deltas) {
                self.writer.write_unsigned(match first_horizontal { true => 0, false => 1 })?;
                self.writer.write_unsigned(deltas.len() as u64)?;
                let mut horizontal = first_horizontal;
                for d in &deltas {
                    self.writer.write_one_delta(match horizontal { true => d.x, false => d.y })?;
                    horizontal = !horizontal;
                }
                return Ok(());
            }
        }
        if deltas.iter().all(|d| d.x==0 || d.y==0) {
            self.writer.write_unsigned(2)?;
            self.writer.write_unsigned(deltas.len() as u64)?;
            for d in &deltas {
                let raw = match (d.x,d.y) {
                    (x,0) if x >= 0 => (x as u64) << 2,
                    (x,0) => (x.unsigned_abs() << 2) | 2,
                    (_,y) if y >= 0 => ((y as u64) << 2) | 1,
                    (_,y) => (y.unsigned_abs() << 2) | 3
                };
                self.writer.write_unsigned(raw)?;
            }
            return Ok(());
        }
        if deltas.iter().all(|d| d.x==0 || d.y==0 || d.x==d.y || d.x==-d.y) {
            self.writer.write_unsigned(3)?;
            self.writer.write_unsigned(deltas.len() as u64)?;
            for d in &deltas {
                let (dir,mag) = match (d.x,d.y) {
                    (x,0) if x >= 0 => (0,x as u64),
                    (x,0) => (2,x.unsigned_abs()),
                    (0,y) if y >= 0 => (1,y as u64),
                    (0,y) => (3,y.unsigned_abs()),
                    (x,y) if x > 0 && y > 0 => (4,x as u64),
                    (x,y) if x < 0 && y > 0 => (5,x.unsigned_abs()),
                    (x,_) if x < 0 => (6,x.unsigned_abs()),
                    (x,_) => (7,x as u64)
                };
                self.writer.write_unsigned((mag << 3) | dir)?;
            }
            return Ok(());
        }
        self.writer.write_unsigned(4)?;
        self.writer.write_unsigned(deltas.len() as u64)?;
        for d in &deltas {
            self.writer.write_g_delta(*d)?;
        }
        Ok(())
    }

    //------------------------------------------------------------------
    // Properties

    fn write_property(&mut self,prop: &Property) -> STDRESULT {
        let repeat = self.modal.last_prop_name.as_ref().is_some_and(|n| n.name()==prop.name.name())
            && self.modal.last_value_list.as_ref().is_some_and(|v| *v==prop.values)
            && self.modal.last_value_standard==prop.is_standard;
        if repeat {
            return self.id(RecId::PropertyRepeat);
        }
        self.id(RecId::Property)?;
        let count = prop.values.len() as u64;
        let uuuu: u8 = match count < 15 {
            true => count as u8,
            false => 15
        };
        let mut info: u8 = (uuuu << 4) | 0x04 | 0x02;
        if prop.is_standard {
            info |= 0x01;
        }
        self.writer.write_byte(info)?;
        let name = self.propnames.forge(prop.name.name());
        self.writer.write_unsigned(name.refnum())?;
        if uuuu==15 {
            self.writer.write_unsigned(count)?;
        }
        for value in &prop.values {
            self.write_prop_value(value)?;
        }
        self.modal.last_prop_name = Some(name);
        self.modal.last_value_list = Some(prop.values.clone());
        self.modal.last_value_standard = prop.is_standard;
        Ok(())
    }
    fn write_prop_value(&mut self,value: &PropValue) -> STDRESULT {
        match value {
            PropValue::Real(r) => self.writer.write_real(r),
            PropValue::Unsigned(v) => {
                self.writer.write_unsigned(8)?;
                self.writer.write_unsigned(*v)
            },
            PropValue::Signed(v) => {
                self.writer.write_unsigned(9)?;
                self.writer.write_signed(*v)
            },
            PropValue::AString(s) => {
                self.writer.write_unsigned(10)?;
                self.writer.write_string(s)
            },
            PropValue::BString(s) => {
                self.writer.write_unsigned(11)?;
                self.writer.write_string(s)
            },
            PropValue::NString(s) => {
                self.writer.write_unsigned(12)?;
                self.writer.write_string(s)
            },
            PropValue::Ref(tag,name) => {
                let obj = self.propstrings.forge(name.name());
                self.writer.write_unsigned(*tag as u64)?;
                self.writer.write_unsigned(obj.refnum())
            }
        }
    }

    //------------------------------------------------------------------
    // Name tables and the END record

    fn write_name_props(&mut self,obj: &Rc<OasisName>) -> STDRESULT {
        let props: Vec<Property> = obj.properties().clone();
        for prop in props {
            self.write_property(&prop)?;
        }
        Ok(())
    }
    /// Write one strict name table; returns its start offset, 0 if empty.
    fn write_table(&mut self,which: RecId) -> Result<u64,DYNERR> {
        let list: Vec<Rc<OasisName>> = match which {
            RecId::CellnameRef => self.cellnames.iter().cloned().collect(),
            RecId::TextstringRef => self.textstrings.iter().cloned().collect(),
            RecId::PropnameRef => self.propnames.iter().cloned().collect(),
            RecId::PropstringRef => self.propstrings.iter().cloned().collect(),
            _ => self.xnames.iter().cloned().collect()
        };
        if list.len()==0 {
            return Ok(0);
        }
        let offset = self.writer.offset();
        for obj in list {
            self.id(which)?;
            if which==RecId::XnameRef {
                self.writer.write_unsigned(obj.attribute.get())?;
            }
            self.writer.write_string(obj.name())?;
            self.writer.write_unsigned(obj.refnum())?;
            self.write_name_props(&obj)?;
        }
        Ok(offset)
    }
    fn write_layername_table(&mut self) -> Result<u64,DYNERR> {
        if self.layernames.len()==0 {
            return Ok(0);
        }
        let offset = self.writer.offset();
        let list = self.layernames.clone();
        for obj in list {
            self.id(match obj.is_text {
                true => RecId::LayernameText,
                false => RecId::LayernameGeometry
            })?;
            self.writer.write_string(&obj.name)?;
            self.write_interval(obj.layers)?;
            self.write_interval(obj.types)?;
            let props: Vec<Property> = obj.properties().clone();
            for prop in props {
                self.write_property(&prop)?;
            }
        }
        Ok(offset)
    }
    fn write_interval(&mut self,interval: Interval) -> STDRESULT {
        match interval {
            Interval::All => self.writer.write_unsigned(0),
            Interval::UpTo(b) => {
                self.writer.write_unsigned(1)?;
                self.writer.write_unsigned(b)
            },
            Interval::AtLeast(a) => {
                self.writer.write_unsigned(2)?;
                self.writer.write_unsigned(a)
            },
            Interval::Exact(a) => {
                self.writer.write_unsigned(3)?;
                self.writer.write_unsigned(a)
            },
            Interval::Range(a,b) => {
                self.writer.write_unsigned(4)?;
                self.writer.write_unsigned(a)?;
                self.writer.write_unsigned(b)
            }
        }
    }

    //------------------------------------------------------------------
    // Elements: field presence against the modal state

    /// info-byte staging: set `bit` and push a write closure only when the
    /// value differs from the modal slot
    fn xy_bits(&mut self,x: i64,y: i64,family: u8) -> (bool,bool) {
        let (mx,my) = match family {
            0 => (self.modal.placement_x,self.modal.placement_y),
            1 => (self.modal.text_x,self.modal.text_y),
            _ => (self.modal.geometry_x,self.modal.geometry_y)
        };
        let need_x = x != mx;
        let need_y = y != my;
        match family {
            0 => {
                self.modal.placement_x = x;
                self.modal.placement_y = y;
            },
            1 => {
                self.modal.text_x = x;
                self.modal.text_y = y;
            },
            _ => {
                self.modal.geometry_x = x;
                self.modal.geometry_y = y;
            }
        }
        (need_x,need_y)
    }
}

/// true = first delta horizontal, when deltas strictly alternate between
/// purely horizontal and purely vertical
fn alternating(deltas: &[Delta]) -> Option<bool> {
    let first_horizontal = match (deltas[0].x,deltas[0].y) {
        (_,0) => true,
        (0,_) => false,
        _ => return None
    };
    let mut horizontal = first_horizontal;
    for d in deltas {
        let ok = match horizontal {
            true => d.y==0,
            false => d.x==0
        };
        if !ok {
            return None;
        }
        horizontal = !horizontal;
    }
    Some(first_horizontal)
}

impl OasisBuilder for OasisCreator {
    fn begin_file(&mut self,_version: &str,unit: &Oreal,_val_scheme: ValScheme) -> STDRESULT {
        self.writer.write_bytes(MAGIC)?;
        self.id(RecId::Start)?;
        self.writer.write_string(VERSION_STRING.as_bytes())?;
        self.writer.write_real(unit)?;
        // table offsets go in the END record
        self.writer.write_unsigned(1)
    }
    fn end_file(&mut self) -> STDRESULT {
        if self.in_cell {
            self.in_cell = false;
        }
        // Properties attached to names can reference property names and
        // strings of their own; intern those before any table is written
        // so no table emits a reference number that a later forge mints.
        let mut props: Vec<Property> = Vec::new();
        for table in [&self.cellnames,&self.textstrings,&self.propnames,
            &self.propstrings,&self.xnames] {
            for obj in table.iter() {
                props.extend(obj.properties().iter().cloned());
            }
        }
        for obj in &self.layernames {
            props.extend(obj.properties().iter().cloned());
        }
        for prop in props {
            self.propnames.forge(prop.name.name());
            for value in &prop.values {
                if let PropValue::Ref(_tag,name) = value {
                    self.propstrings.forge(name.name());
                }
            }
        }
        let offsets = [
            self.write_table(RecId::CellnameRef)?,
            self.write_table(RecId::TextstringRef)?,
            self.write_table(RecId::PropnameRef)?,
            self.write_table(RecId::PropstringRef)?,
            self.write_layername_table()?,
            self.write_table(RecId::XnameRef)?
        ];
        let sig_len: u64 = match self.val_scheme {
            ValScheme::None => 0,
            _ => 4
        };
        // The END record must total exactly END_RECORD_LENGTH bytes, so
        // the padding string has to make up the difference precisely.  A
        // string of N bytes occupies N plus the size of its length field,
        // which leaves one total (129) unreachable with a minimal length;
        // that case stretches the length field to two bytes.
        let mut fixed = 1 + 1 + sig_len;
        for offset in offsets {
            fixed += 1 + unsigned_size(offset) as u64;
        }
        let pad_total = (END_RECORD_LENGTH as u64).checked_sub(fixed)
            .filter(|v| *v >= 1)
            .ok_or_else(|| self.writer.err("END record overflow".to_string()))?;
        self.id(RecId::End)?;
        for offset in offsets {
            self.writer.write_unsigned(1)?;
            self.writer.write_unsigned(offset)?;
        }
        if pad_total==129 {
            self.writer.write_bytes(&[0xff,0x00])?;
            self.writer.write_bytes(&vec![0;127])?;
        } else {
            let body = match pad_total <= 128 {
                true => pad_total - 1,
                false => pad_total - 2
            };
            self.writer.write_string(&vec![0;body as usize])?;
        }
        self.writer.write_unsigned(self.val_scheme as u64)?;
        if self.val_scheme != ValScheme::None {
            self.writer.write_signature(self.val_scheme==ValScheme::Crc32)?;
        }
        self.writer.end_file()
    }
    fn begin_cell(&mut self,cell: &Rc<OasisName>) -> STDRESULT {
        let obj = self.cellnames.forge(cell.name());
        self.id(RecId::CellRef)?;
        self.writer.write_unsigned(obj.refnum())?;
        self.modal.reset();
        self.in_cell = true;
        Ok(())
    }
    fn end_cell(&mut self) -> STDRESULT {
        self.in_cell = false;
        Ok(())
    }
    fn begin_placement(&mut self,cell: &Rc<OasisName>,x: i64,y: i64,mag: &Oreal,angle: &Oreal,
        flip: bool,rep: Option<&Repetition>) -> STDRESULT {
        let obj = self.cellnames.forge(cell.name());
        let mag_val = mag.to_f64();
        let angle_val = angle.to_f64();
        let simple_turns = match (mag_val,angle_val) {
            (m,a) if m==1.0 && a==0.0 => Some(0u8),
            (m,a) if m==1.0 && a==90.0 => Some(1),
            (m,a) if m==1.0 && a==180.0 => Some(2),
            (m,a) if m==1.0 && a==270.0 => Some(3),
            _ => None
        };
        let need_cell = self.modal.placement_cell.as_ref().map(|c| c.name().to_vec())
            != Some(obj.name().to_vec());
        let (need_x,need_y) = self.xy_bits(x,y,0);
        match simple_turns {
            Some(turns) => {
                self.id(RecId::Placement)?;
                let mut info: u8 = (turns << 1) & 0x06;
                if need_cell {
                    info |= 0x80 | 0x40;
                }
                if need_x {
                    info |= 0x20;
                }
                if need_y {
                    info |= 0x10;
                }
                if rep.is_some() {
                    info |= 0x08;
                }
                if flip {
                    info |= 0x01;
                }
                self.writer.write_byte(info)?;
                if need_cell {
                    self.writer.write_unsigned(obj.refnum())?;
                }
            },
            None => {
                self.id(RecId::PlacementTransform)?;
                let need_mag = self.modal.placement_mag != *mag;
                let need_angle = self.modal.placement_angle != *angle;
                let mut info: u8 = 0;
                if need_cell {
                    info |= 0x80 | 0x40;
                }
                if need_x {
                    info |= 0x20;
                }
                if need_y {
                    info |= 0x10;
                }
                if rep.is_some() {
                    info |= 0x08;
                }
                if need_mag {
                    info |= 0x04;
                }
                if need_angle {
                    info |= 0x02;
                }
                if flip {
                    info |= 0x01;
                }
                self.writer.write_byte(info)?;
                if need_cell {
                    self.writer.write_unsigned(obj.refnum())?;
                }
                if need_mag {
                    self.writer.write_real(mag)?;
                    self.modal.placement_mag = *mag;
                }
                if need_angle {
                    self.writer.write_real(angle)?;
                    self.modal.placement_angle = *angle;
                }
            }
        }
        self.modal.placement_cell = Some(obj);
        if need_x {
            self.writer.write_signed(x)?;
        }
        if need_y {
            self.writer.write_signed(y)?;
        }
        if let Some(r) = rep {
            self.write_repetition(r)?;
        }
        Ok(())
    }
    fn begin_text(&mut self,textlayer: u64,texttype: u64,x: i64,y: i64,text: &Rc<OasisName>,
        rep: Option<&Repetition>) -> STDRESULT {
        let obj = self.textstrings.forge(text.name());
        let need_text = self.modal.text_string.as_ref().map(|t| t.name().to_vec())
            != Some(obj.name().to_vec());
        let need_layer = self.modal.textlayer != Some(textlayer);
        let need_type = self.modal.texttype != Some(texttype);
        let (need_x,need_y) = self.xy_bits(x,y,1);
        self.id(RecId::Text)?;
        let mut info: u8 = 0;
        if need_text {
            info |= 0x40 | 0x20;
        }
        if need_x {
            info |= 0x10;
        }
        if need_y {
            info |= 0x08;
        }
        if rep.is_some() {
            info |= 0x04;
        }
        if need_type {
            info |= 0x02;
        }
        if need_layer {
            info |= 0x01;
        }
        self.writer.write_byte(info)?;
        if need_text {
            self.writer.write_unsigned(obj.refnum())?;
        }
        if need_layer {
            self.writer.write_unsigned(textlayer)?;
            self.modal.textlayer = Some(textlayer);
        }
        if need_type {
            self.writer.write_unsigned(texttype)?;
            self.modal.texttype = Some(texttype);
        }
        self.modal.text_string = Some(obj);
        if need_x {
            self.writer.write_signed(x)?;
        }
        if need_y {
            self.writer.write_signed(y)?;
        }
        if let Some(r) = rep {
            self.write_repetition(r)?;
        }
        Ok(())
    }
    fn begin_rectangle(&mut self,layer: u64,datatype: u64,x: i64,y: i64,width: i64,height: i64,
        rep: Option<&Repetition>) -> STDRESULT {
        let need_layer = self.modal.layer != Some(layer);
        let need_type = self.modal.datatype != Some(datatype);
        let square = width==height;
        let need_w = self.modal.geometry_w != Some(width);
        let need_h = !square && self.modal.geometry_h != Some(height);
        let (need_x,need_y) = self.xy_bits(x,y,2);
        self.id(RecId::Rectangle)?;
        let mut info: u8 = 0;
        if square {
            info |= 0x80;
        }
        if need_w {
            info |= 0x40;
        }
        if need_h {
            info |= 0x20;
        }
        if need_x {
            info |= 0x10;
        }
        if need_y {
            info |= 0x08;
        }
        if rep.is_some() {
            info |= 0x04;
        }
        if need_type {
            info |= 0x02;
        }
        if need_layer {
            info |= 0x01;
        }
        self.writer.write_byte(info)?;
        if need_layer {
            self.writer.write_unsigned(layer)?;
            self.modal.layer = Some(layer);
        }
        if need_type {
            self.writer.write_unsigned(datatype)?;
            self.modal.datatype = Some(datatype);
        }
        if need_w {
            self.writer.write_unsigned(width as u64)?;
        }
        if need_h {
            self.writer.write_unsigned(height as u64)?;
        }
        self.modal.geometry_w = Some(width);
        self.modal.geometry_h = Some(height);
        if need_x {
            self.writer.write_signed(x)?;
        }
        if need_y {
            self.writer.write_signed(y)?;
        }
        if let Some(r) = rep {
            self.write_repetition(r)?;
        }
        Ok(())
    }
    fn begin_polygon(&mut self,layer: u64,datatype: u64,x: i64,y: i64,points: &[Delta],
        rep: Option<&Repetition>) -> STDRESULT {
        let need_layer = self.modal.layer != Some(layer);
        let need_type = self.modal.datatype != Some(datatype);
        let need_points = self.modal.polygon_points.as_deref() != Some(points);
        let (need_x,need_y) = self.xy_bits(x,y,2);
        self.id(RecId::Polygon)?;
        let mut info: u8 = 0;
        if need_points {
            info |= 0x20;
        }
        if need_x {
            info |= 0x10;
        }
        if need_y {
            info |= 0x08;
        }
        if rep.is_some() {
            info |= 0x04;
        }
        if need_type {
            info |= 0x02;
        }
        if need_layer {
            info |= 0x01;
        }
        self.writer.write_byte(info)?;
        if need_layer {
            self.writer.write_unsigned(layer)?;
            self.modal.layer = Some(layer);
        }
        if need_type {
            self.writer.write_unsigned(datatype)?;
            self.modal.datatype = Some(datatype);
        }
        if need_points {
            self.write_point_list(points,false)?;
            self.modal.polygon_points = Some(points.to_vec());
        }
        if need_x {
            self.writer.write_signed(x)?;
        }
        if need_y {
            self.writer.write_signed(y)?;
        }
        if let Some(r) = rep {
            self.write_repetition(r)?;
        }
        Ok(())
    }
    fn begin_path(&mut self,layer: u64,datatype: u64,x: i64,y: i64,halfwidth: i64,
        start_extn: i64,end_extn: i64,points: &[Delta],rep: Option<&Repetition>) -> STDRESULT {
        let need_layer = self.modal.layer != Some(layer);
        let need_type = self.modal.datatype != Some(datatype);
        let need_hw = self.modal.path_halfwidth != Some(halfwidth);
        let need_start = self.modal.path_start_extn != Some(start_extn);
        let need_end = self.modal.path_end_extn != Some(end_extn);
        let need_points = self.modal.path_points.as_deref() != Some(points);
        let (need_x,need_y) = self.xy_bits(x,y,2);
        self.id(RecId::Path)?;
        let mut info: u8 = 0;
        if need_start || need_end {
            info |= 0x80;
        }
        if need_hw {
            info |= 0x40;
        }
        if need_points {
            info |= 0x20;
        }
        if need_x {
            info |= 0x10;
        }
        if need_y {
            info |= 0x08;
        }
        if rep.is_some() {
            info |= 0x04;
        }
        if need_type {
            info |= 0x02;
        }
        if need_layer {
            info |= 0x01;
        }
        self.writer.write_byte(info)?;
        if need_layer {
            self.writer.write_unsigned(layer)?;
            self.modal.layer = Some(layer);
        }
        if need_type {
            self.writer.write_unsigned(datatype)?;
            self.modal.datatype = Some(datatype);
        }
        if need_hw {
            self.writer.write_unsigned(halfwidth as u64)?;
            self.modal.path_halfwidth = Some(halfwidth);
        }
        if need_start || need_end {
            let extn_bits = |need: bool,val: i64| -> u64 {
                match (need,val) {
                    (false,_) => 0,
                    (true,0) => 1,
                    (true,v) if v==halfwidth => 2,
                    (true,_) => 3
                }
            };
            let ss = extn_bits(need_start,start_extn);
            let ee = extn_bits(need_end,end_extn);
            self.writer.write_unsigned((ss << 2) | ee)?;
            if ss==3 {
                self.writer.write_signed(start_extn)?;
            }
            if ee==3 {
                self.writer.write_signed(end_extn)?;
            }
            self.modal.path_start_extn = Some(start_extn);
            self.modal.path_end_extn = Some(end_extn);
        }
        if need_points {
            self.write_point_list(points,true)?;
            self.modal.path_points = Some(points.to_vec());
        }
        if need_x {
            self.writer.write_signed(x)?;
        }
        if need_y {
            self.writer.write_signed(y)?;
        }
        if let Some(r) = rep {
            self.write_repetition(r)?;
        }
        Ok(())
    }
    fn begin_trapezoid(&mut self,layer: u64,datatype: u64,x: i64,y: i64,trap: &Trapezoid,
        rep: Option<&Repetition>) -> STDRESULT {
        let mut trap = *trap;
        trap.try_compress();
        let need_layer = self.modal.layer != Some(layer);
        let need_type = self.modal.datatype != Some(datatype);
        let (need_x,need_y) = self.xy_bits(x,y,2);
        match trap.compress_type() {
            Some(ctrap_type) => {
                self.id(RecId::Ctrapezoid)?;
                let need_ctype = self.modal.ctrapezoid_type != Some(ctrap_type);
                let need_w = Trapezoid::needs_width(ctrap_type)
                    && self.modal.geometry_w != Some(trap.width());
                let need_h = Trapezoid::needs_height(ctrap_type)
                    && self.modal.geometry_h != Some(trap.height());
                let mut info: u8 = 0;
                if need_ctype {
                    info |= 0x80;
                }
                if need_w {
                    info |= 0x40;
                }
                if need_h {
                    info |= 0x20;
                }
                if need_x {
                    info |= 0x10;
                }
                if need_y {
                    info |= 0x08;
                }
                if rep.is_some() {
                    info |= 0x04;
                }
                if need_type {
                    info |= 0x02;
                }
                if need_layer {
                    info |= 0x01;
                }
                self.writer.write_byte(info)?;
                if need_layer {
                    self.writer.write_unsigned(layer)?;
                    self.modal.layer = Some(layer);
                }
                if need_type {
                    self.writer.write_unsigned(datatype)?;
                    self.modal.datatype = Some(datatype);
                }
                if need_ctype {
                    self.writer.write_unsigned(ctrap_type)?;
                    self.modal.ctrapezoid_type = Some(ctrap_type);
                }
                if need_w {
                    self.writer.write_unsigned(trap.width() as u64)?;
                }
                if need_h {
                    self.writer.write_unsigned(trap.height() as u64)?;
                }
            },
            None => {
                let id = match (trap.delta_a(),trap.delta_b()) {
                    (_,0) => RecId::TrapezoidA,
                    (0,_) => RecId::TrapezoidB,
                    _ => RecId::Trapezoid
                };
                self.id(id)?;
                let need_w = self.modal.geometry_w != Some(trap.width());
                let need_h = self.modal.geometry_h != Some(trap.height());
                let mut info: u8 = 0;
                if trap.orientation()==Orientation::Vertical {
                    info |= 0x80;
                }
                if need_w {
                    info |= 0x40;
                }
                if need_h {
                    info |= 0x20;
                }
                if need_x {
                    info |= 0x10;
                }
                if need_y {
                    info |= 0x08;
                }
                if rep.is_some() {
                    info |= 0x04;
                }
                if need_type {
                    info |= 0x02;
                }
                if need_layer {
                    info |= 0x01;
                }
                self.writer.write_byte(info)?;
                if need_layer {
                    self.writer.write_unsigned(layer)?;
                    self.modal.layer = Some(layer);
                }
                if need_type {
                    self.writer.write_unsigned(datatype)?;
                    self.modal.datatype = Some(datatype);
                }
                if need_w {
                    self.writer.write_unsigned(trap.width() as u64)?;
                }
                if need_h {
                    self.writer.write_unsigned(trap.height() as u64)?;
                }
                if id==RecId::Trapezoid || id==RecId::TrapezoidA {
                    self.writer.write_one_delta(trap.delta_a())?;
                }
                if id==RecId::Trapezoid || id==RecId::TrapezoidB {
                    self.writer.write_one_delta(trap.delta_b())?;
                }
            }
        }
        self.modal.geometry_w = Some(trap.width());
        self.modal.geometry_h = Some(trap.height());
        if need_x {
            self.writer.write_signed(x)?;
        }
        if need_y {
            self.writer.write_signed(y)?;
        }
        if let Some(r) = rep {
            self.write_repetition(r)?;
        }
        Ok(())
    }
    fn begin_circle(&mut self,layer: u64,datatype: u64,x: i64,y: i64,radius: i64,
        rep: Option<&Repetition>) -> STDRESULT {
        let need_layer = self.modal.layer != Some(layer);
        let need_type = self.modal.datatype != Some(datatype);
        let need_radius = self.modal.circle_radius != Some(radius);
        let (need_x,need_y) = self.xy_bits(x,y,2);
        self.id(RecId::Circle)?;
        let mut info: u8 = 0;
        if need_radius {
            info |= 0x20;
        }
        if need_x {
            info |= 0x10;
        }
        if need_y {
            info |= 0x08;
        }
        if rep.is_some() {
            info |= 0x04;
        }
        if need_type {
            info |= 0x02;
        }
        if need_layer {
            info |= 0x01;
        }
        self.writer.write_byte(info)?;
        if need_layer {
            self.writer.write_unsigned(layer)?;
            self.modal.layer = Some(layer);
        }
        if need_type {
            self.writer.write_unsigned(datatype)?;
            self.modal.datatype = Some(datatype);
        }
        if need_radius {
            self.writer.write_unsigned(radius as u64)?;
            self.modal.circle_radius = Some(radius);
        }
        if need_x {
            self.writer.write_signed(x)?;
        }
        if need_y {
            self.writer.write_signed(y)?;
        }
        if let Some(r) = rep {
            self.write_repetition(r)?;
        }
        Ok(())
    }
    fn begin_xelement(&mut self,attribute: u64,data: &[u8]) -> STDRESULT {
        self.id(RecId::Xelement)?;
        self.writer.write_unsigned(attribute)?;
        self.writer.write_string(data)
    }
    fn begin_xgeometry(&mut self,layer: u64,datatype: u64,x: i64,y: i64,attribute: u64,
        data: &[u8],rep: Option<&Repetition>) -> STDRESULT {
        let need_layer = self.modal.layer != Some(layer);
        let need_type = self.modal.datatype != Some(datatype);
        let (need_x,need_y) = self.xy_bits(x,y,2);
        self.id(RecId::Xgeometry)?;
        let mut info: u8 = 0;
        if need_x {
            info |= 0x10;
        }
        if need_y {
            info |= 0x08;
        }
        if rep.is_some() {
            info |= 0x04;
        }
        if need_type {
            info |= 0x02;
        }
        if need_layer {
            info |= 0x01;
        }
        self.writer.write_byte(info)?;
        self.writer.write_unsigned(attribute)?;
        if need_layer {
            self.writer.write_unsigned(layer)?;
            self.modal.layer = Some(layer);
        }
        if need_type {
            self.writer.write_unsigned(datatype)?;
            self.modal.datatype = Some(datatype);
        }
        self.writer.write_string(data)?;
        if need_x {
            self.writer.write_signed(x)?;
        }
        if need_y {
            self.writer.write_signed(y)?;
        }
        if let Some(r) = rep {
            self.write_repetition(r)?;
        }
        Ok(())
    }
    fn end_element(&mut self) -> STDRESULT {
        Ok(())
    }
    fn add_file_property(&mut self,prop: &Property) -> STDRESULT {
        self.write_property(prop)
    }
    fn add_cell_property(&mut self,prop: &Property) -> STDRESULT {
        self.write_property(prop)
    }
    fn add_element_property(&mut self,prop: &Property) -> STDRESULT {
        self.write_property(prop)
    }
    fn register_cell_name(&mut self,cell_name: &Rc<OasisName>) -> STDRESULT {
        let obj = self.cellnames.forge(cell_name.name());
        for prop in cell_name.properties().iter() {
            obj.add_property(prop.clone());
        }
        Ok(())
    }
    fn register_text_string(&mut self,text_string: &Rc<OasisName>) -> STDRESULT {
        let obj = self.textstrings.forge(text_string.name());
        for prop in text_string.properties().iter() {
            obj.add_property(prop.clone());
        }
        Ok(())
    }
    fn register_prop_name(&mut self,prop_name: &Rc<OasisName>) -> STDRESULT {
        let obj = self.propnames.forge(prop_name.name());
        for prop in prop_name.properties().iter() {
            obj.add_property(prop.clone());
        }
        Ok(())
    }
    fn register_prop_string(&mut self,prop_string: &Rc<OasisName>) -> STDRESULT {
        let obj = self.propstrings.forge(prop_string.name());
        for prop in prop_string.properties().iter() {
            obj.add_property(prop.clone());
        }
        Ok(())
    }
    fn register_layer_name(&mut self,layer_name: &Rc<LayerName>) -> STDRESULT {
        let obj = LayerName::new(&layer_name.name,layer_name.is_text,
            layer_name.layers,layer_name.types);
        for prop in layer_name.properties().iter() {
            obj.add_property(prop.clone());
        }
        self.layernames.push(obj);
        Ok(())
    }
    fn register_xname(&mut self,xname: &Rc<OasisName>) -> STDRESULT {
        let obj = self.xnames.forge(xname.name());
        obj.attribute.set(xname.attribute.get());
        for prop in xname.properties().iter() {
            obj.add_property(prop.clone());
        }
        Ok(())
    }
}
