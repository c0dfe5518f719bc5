//! # GDSII to OASIS conversion
//!
//! `GdsToOasisConverter` is a `GdsBuilder` that drives an `OasisCreator`.
//! Within each structure it merges elements that differ only in position
//! (same kind, layer, normalized geometry, transform, and properties) and
//! hands their position sets to the point grouper, so a field of identical
//! boundaries comes out as one POLYGON record with a matrix repetition.
//!
//! The element mapping: BOUNDARY becomes POLYGON, PATH becomes PATH with
//! computed halfwidth and extensions, BOX becomes RECTANGLE when its
//! outline is a rectangle, SREF becomes PLACEMENT, AREF becomes PLACEMENT
//! with a matrix repetition derived from COLROW and the three reference
//! points, TEXT becomes TEXT, and NODE becomes XGEOMETRY with the reserved
//! attribute.  GDSII properties become the standard S_GDS_PROPERTY.

use std::collections::HashMap;
use log::warn;
use crate::fio::FileType;
use crate::gdsii::builder::*;
use crate::gdsii::{GdsParser,GdsPoint};
use crate::oasis::names::{OasisName,Property,PropValue};
use crate::oasis::oreal::Oreal;
use crate::oasis::rep::{Delta,Repetition};
use crate::oasis::validate::ValScheme;
use crate::oasis::writer::OasisWriter;
use crate::oasis::{checked_mult,OasisBuilder,OasisCreator};
use crate::STDRESULT;
use super::ptgroup::PointGrouper;
use super::{Error,NODE_XGEOMETRY_ATTRIBUTE};

#[derive(Clone,Copy)]
pub struct GdsToOasisOptions {
    /// how hard the point grouper works, 0..=2
    pub opt_level: u8,
    /// drop coincident copies of an element
    pub delete_duplicates: bool,
    pub val_scheme: ValScheme
}

impl Default for GdsToOasisOptions {
    fn default() -> Self {
        Self {
            opt_level: 2,
            delete_duplicates: false,
            val_scheme: ValScheme::Crc32
        }
    }
}

/// Parse `infile` and write the converted layout to `outfile`.  `.gz`
/// suffixes select gzip on either side.
pub fn convert_gds_to_oasis(infile: &str,outfile: &str,options: &GdsToOasisOptions) -> STDRESULT {
    let mut parser = GdsParser::open(infile,FileType::Auto,None)?;
    let creator = OasisCreator::create(outfile,FileType::Auto,options.val_scheme)?;
    let mut converter = GdsToOasisConverter::new(creator,options);
    parser.parse_file(&mut converter)
}

/// The transform part of a merge key; reals keyed by their bits.
#[derive(Clone,PartialEq,Eq,Hash)]
struct TransKey {
    reflect: bool,
    mag_bits: u64,
    angle_bits: u64
}

impl TransKey {
    fn new(strans: &Option<GdsTransform>) -> Self {
        let strans = strans.unwrap_or_default();
        Self {
            reflect: strans.reflect,
            mag_bits: strans.mag.unwrap_or(1.0).to_bits(),
            angle_bits: strans.angle.unwrap_or(0.0).to_bits()
        }
    }
    fn mag(&self) -> f64 {
        f64::from_bits(self.mag_bits)
    }
    fn angle(&self) -> f64 {
        f64::from_bits(self.angle_bits)
    }
}

/// Identity of an element apart from its position.  Two elements with
/// equal keys (and equal properties) merge into one repetition.
#[derive(Clone,PartialEq,Eq,Hash)]
enum ElemKey {
    Polygon { layer: i16, datatype: i16, points: Vec<(i64,i64)> },
    Path { layer: i16, datatype: i16, halfwidth: i64, start_extn: i64, end_extn: i64,
        points: Vec<(i64,i64)> },
    Rect { layer: i16, datatype: i16, width: i64, height: i64 },
    Text { layer: i16, texttype: i16, text: String },
    Sref { sname: String, strans: TransKey },
    Node { layer: i16, nodetype: i16, points: Vec<(i64,i64)> }
}

#[derive(Clone,PartialEq,Eq,Hash)]
struct FullKey {
    elem: ElemKey,
    props: Vec<(i16,String)>
}

/// An AREF ready to emit; these do not merge with anything.
struct PendingAref {
    sname: String,
    strans: TransKey,
    x: i64,
    y: i64,
    rep: Repetition
}

enum Pending {
    Grouped(ElemKey,GdsPoint),
    Aref(PendingAref)
}

pub struct GdsToOasisConverter {
    creator: OasisCreator,
    options: GdsToOasisOptions,
    pending: Option<Pending>,
    pending_props: Vec<(i16,String)>,
    cell_elems: HashMap<FullKey,Vec<GdsPoint>>,
    cell_order: Vec<FullKey>,
    warned_strans_text: bool,
    warned_round_path: bool
}

impl GdsToOasisConverter {
    pub fn new(creator: OasisCreator,options: &GdsToOasisOptions) -> Self {
        Self {
            creator,
            options: *options,
            pending: None,
            pending_props: Vec::new(),
            cell_elems: HashMap::new(),
            cell_order: Vec::new(),
            warned_strans_text: false,
            warned_round_path: false
        }
    }
    fn stage(&mut self,key: ElemKey,position: GdsPoint) {
        debug_assert!(self.pending.is_none());
        self.pending = Some(Pending::Grouped(key,position));
    }
    fn gds_property(attr: i16,value: &str) -> Property {
        Property {
            name: OasisName::new(b"S_GDS_PROPERTY",0),
            values: vec![PropValue::Unsigned(attr as u64),PropValue::AString(value.as_bytes().to_vec())],
            is_standard: true
        }
    }
    /// Emit one merged element at every grouped position.
    fn flush_elem(&mut self,key: &FullKey,positions: Vec<GdsPoint>) -> STDRESULT {
        let mut pg = PointGrouper::new(positions,self.options.opt_level,self.options.delete_duplicates);
        while !pg.is_empty() {
            let (pos,rep) = pg.make_repetition();
            let (x,y) = (pos.x as i64,pos.y as i64);
            let rep = rep.as_ref();
            match &key.elem {
                ElemKey::Polygon { layer, datatype, points } => {
                    let deltas: Vec<Delta> = points.iter()
                        .map(|(px,py)| Delta::new(*px,*py)).collect();
                    self.creator.begin_polygon(*layer as u64,*datatype as u64,x,y,&deltas,rep)?;
                },
                ElemKey::Path { layer, datatype, halfwidth, start_extn, end_extn, points } => {
                    let deltas: Vec<Delta> = points.iter()
                        .map(|(px,py)| Delta::new(*px,*py)).collect();
                    self.creator.begin_path(*layer as u64,*datatype as u64,x,y,
                        *halfwidth,*start_extn,*end_extn,&deltas,rep)?;
                },
                ElemKey::Rect { layer, datatype, width, height } => {
                    self.creator.begin_rectangle(*layer as u64,*datatype as u64,x,y,
                        *width,*height,rep)?;
                },
                ElemKey::Text { layer, texttype, text } => {
                    let obj = OasisName::new(text.as_bytes(),0);
                    self.creator.begin_text(*layer as u64,*texttype as u64,x,y,&obj,rep)?;
                },
                ElemKey::Sref { sname, strans } => {
                    let obj = OasisName::new(sname.as_bytes(),0);
                    self.creator.begin_placement(&obj,x,y,
                        &Oreal::from_f64_compact(strans.mag()),
                        &Oreal::from_f64_compact(strans.angle()),
                        strans.reflect,rep)?;
                },
                ElemKey::Node { layer, nodetype, points } => {
                    let mut w = OasisWriter::memory();
                    w.write_unsigned(points.len() as u64)?;
                    for (px,py) in points {
                        w.write_signed(*px)?;
                        w.write_signed(*py)?;
                    }
                    self.creator.begin_xgeometry(*layer as u64,*nodetype as u64,x,y,
                        NODE_XGEOMETRY_ATTRIBUTE,&w.into_bytes(),rep)?;
                }
            }
            for (attr,value) in &key.props {
                self.creator.add_element_property(&Self::gds_property(*attr,value))?;
            }
            self.creator.end_element()?;
        }
        Ok(())
    }
    /// Normalize a point list to its first point; returns the anchor and
    /// the offsets, widened so coordinate spans cannot wrap.
    fn normalize(points: &[GdsPoint]) -> (GdsPoint,Vec<(i64,i64)>) {
        let anchor = points[0];
        let offsets = points.iter()
            .map(|p| (p.x as i64 - anchor.x as i64,p.y as i64 - anchor.y as i64)).collect();
        (anchor,offsets)
    }
}

impl GdsBuilder for GdsToOasisConverter {
    fn begin_library(&mut self,_libname: &str,_mod_time: &GdsDate,_acc_time: &GdsDate,
        units: &GdsUnits,_options: &GdsLibraryOptions) -> STDRESULT {
        // the OASIS unit counts grid steps per micron
        let unit = 1.0e-6 / units.db_to_meter;
        self.creator.begin_file("1.0",&Oreal::from_f64_compact(unit),ValScheme::None)
    }
    fn end_library(&mut self) -> STDRESULT {
        self.creator.end_file()
    }
    fn begin_structure(&mut self,sname: &str,_create_time: &GdsDate,_mod_time: &GdsDate,
        _options: &GdsStructureOptions) -> STDRESULT {
        let obj = OasisName::new(sname.as_bytes(),0);
        self.creator.begin_cell(&obj)
    }
    fn end_structure(&mut self) -> STDRESULT {
        let order = std::mem::take(&mut self.cell_order);
        for key in order {
            let positions = self.cell_elems.remove(&key).expect("unreachable");
            self.flush_elem(&key,positions)?;
        }
        self.cell_elems.clear();
        self.creator.end_cell()
    }
    fn begin_boundary(&mut self,layer: i16,datatype: i16,points: &[GdsPoint],
        _options: &GdsElementOptions) -> STDRESULT {
        // GDSII boundaries close themselves; OASIS polygons do not
        let outline = match points.first()==points.last() {
            true => &points[0..points.len()-1],
            false => points
        };
        let (anchor,offsets) = Self::normalize(outline);
        self.stage(ElemKey::Polygon { layer, datatype, points: offsets },anchor);
        Ok(())
    }
    fn begin_path(&mut self,layer: i16,datatype: i16,points: &[GdsPoint],
        options: &GdsPathOptions) -> STDRESULT {
        let width = options.width.unwrap_or(0);
        let width = match width < 0 {
            true => {
                warn!("absolute path width treated as plain width");
                -(width as i64)
            },
            false => width as i64
        };
        let halfwidth = width/2;
        if width % 2 != 0 {
            warn!("odd path width {} loses half a unit in conversion",width);
        }
        let pathtype = options.pathtype.unwrap_or(GdsPathtype::Flush);
        let (start_extn,end_extn) = match pathtype {
            GdsPathtype::Flush => (0,0),
            GdsPathtype::Round => {
                if !self.warned_round_path {
                    warn!("round path ends have no OASIS form; writing square extensions");
                    self.warned_round_path = true;
                }
                (halfwidth,halfwidth)
            },
            GdsPathtype::Extend => (halfwidth,halfwidth),
            GdsPathtype::Custom => (options.bgnextn.unwrap_or(0) as i64,
                options.endextn.unwrap_or(0) as i64)
        };
        let (anchor,offsets) = Self::normalize(points);
        self.stage(ElemKey::Path { layer, datatype, halfwidth, start_extn, end_extn,
            points: offsets },anchor);
        Ok(())
    }
    fn begin_sref(&mut self,sname: &str,x: i32,y: i32,strans: &Option<GdsTransform>,
        _options: &GdsElementOptions) -> STDRESULT {
        self.stage(ElemKey::Sref { sname: sname.to_string(), strans: TransKey::new(strans) },
            GdsPoint::new(x,y));
        Ok(())
    }
    fn begin_aref(&mut self,sname: &str,cols: i16,rows: i16,points: &[GdsPoint;3],
        strans: &Option<GdsTransform>,_options: &GdsElementOptions) -> STDRESULT {
        // the three points are the origin, the column end, and the row end
        let origin = points[0];
        if points[1].y != origin.y || points[2].x != origin.x {
            return Err(Box::new(Error::Unconvertible(format!(
                "AREF of '{}' is not axis-aligned: {:?}",sname,points))));
        }
        let col_span = points[1].x as i64 - origin.x as i64;
        let row_span = points[2].y as i64 - origin.y as i64;
        if col_span < 0 || row_span < 0 {
            return Err(Box::new(Error::Unconvertible(format!(
                "AREF of '{}' runs in a negative direction",sname))));
        }
        if col_span % cols as i64 != 0 || row_span % rows as i64 != 0 {
            return Err(Box::new(Error::Unconvertible(format!(
                "AREF of '{}' spans are not multiples of its counts",sname))));
        }
        let col_space = col_span / cols as i64;
        let row_space = row_span / rows as i64;
        // COLROW expansion is where overflow lives
        checked_mult(col_space,cols as i64)?;
        checked_mult(row_space,rows as i64)?;
        let rep = match (cols,rows) {
            (1,1) => None,
            _ => Some(Repetition::Matrix {
                cols: cols as u64,
                rows: rows as u64,
                col_space,
                row_space
            })
        };
        let strans = TransKey::new(strans);
        self.pending = Some(match rep {
            // a 1x1 array is just a placement and may merge with SREFs
            None => Pending::Grouped(ElemKey::Sref { sname: sname.to_string(), strans },origin),
            Some(rep) => Pending::Aref(PendingAref {
                sname: sname.to_string(),
                strans,
                x: origin.x as i64,
                y: origin.y as i64,
                rep
            })
        });
        Ok(())
    }
    fn begin_node(&mut self,layer: i16,nodetype: i16,points: &[GdsPoint],
        _options: &GdsElementOptions) -> STDRESULT {
        let (anchor,offsets) = Self::normalize(points);
        self.stage(ElemKey::Node { layer, nodetype, points: offsets },anchor);
        Ok(())
    }
    fn begin_box(&mut self,layer: i16,boxtype: i16,points: &[GdsPoint],
        _options: &GdsElementOptions) -> STDRESULT {
        // a BOX outline that traces a rectangle becomes a RECTANGLE;
        // anything else keeps its outline as a polygon
        let xs: Vec<i64> = points.iter().map(|p| p.x as i64).collect();
        let ys: Vec<i64> = points.iter().map(|p| p.y as i64).collect();
        let (x0,x1) = (*xs.iter().min().expect("unreachable"),*xs.iter().max().expect("unreachable"));
        let (y0,y1) = (*ys.iter().min().expect("unreachable"),*ys.iter().max().expect("unreachable"));
        let rectangular = points.len()==5 && points[0]==points[4]
            && points.iter().all(|p| (p.x as i64==x0 || p.x as i64==x1)
                && (p.y as i64==y0 || p.y as i64==y1));
        if rectangular {
            self.stage(ElemKey::Rect { layer, datatype: boxtype,
                width: x1-x0, height: y1-y0 },GdsPoint::new(x0 as i32,y0 as i32));
        } else {
            let outline = match points.first()==points.last() {
                true => &points[0..points.len()-1],
                false => points
            };
            let (anchor,offsets) = Self::normalize(outline);
            self.stage(ElemKey::Polygon { layer, datatype: boxtype, points: offsets },anchor);
        }
        Ok(())
    }
    fn begin_text(&mut self,layer: i16,texttype: i16,x: i32,y: i32,text: &str,
        strans: &Option<GdsTransform>,_options: &GdsTextOptions) -> STDRESULT {
        if strans.is_some() && !self.warned_strans_text {
            warn!("text transforms have no OASIS form and are dropped");
            self.warned_strans_text = true;
        }
        self.stage(ElemKey::Text { layer, texttype, text: text.to_string() },GdsPoint::new(x,y));
        Ok(())
    }
    fn add_property(&mut self,attr: i16,value: &str) -> STDRESULT {
        self.pending_props.push((attr,value.to_string()));
        Ok(())
    }
    fn end_element(&mut self) -> STDRESULT {
        let props = std::mem::take(&mut self.pending_props);
        match self.pending.take().expect("end_element without an element") {
            Pending::Grouped(elem,position) => {
                let key = FullKey { elem, props };
                match self.cell_elems.get_mut(&key) {
                    Some(positions) => positions.push(position),
                    None => {
                        self.cell_elems.insert(key.clone(),vec![position]);
                        self.cell_order.push(key);
                    }
                }
            },
            Pending::Aref(aref) => {
                let obj = OasisName::new(aref.sname.as_bytes(),0);
                self.creator.begin_placement(&obj,aref.x,aref.y,
                    &Oreal::from_f64_compact(aref.strans.mag()),
                    &Oreal::from_f64_compact(aref.strans.angle()),
                    aref.strans.reflect,Some(&aref.rep))?;
                for (attr,value) in &props {
                    self.creator.add_element_property(&Self::gds_property(*attr,value))?;
                }
                self.creator.end_element()?;
            }
        }
        Ok(())
    }
}
