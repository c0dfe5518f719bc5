//! # OASIS to GDSII conversion
//!
//! `OasisToGdsConverter` is an `OasisBuilder` that drives a `GdsCreator`.
//! GDSII has no repetitions outside of AREF, so a matrix placement becomes
//! one AREF and every other repetition is expanded, one element per
//! placement.  Rectangles, trapezoids, and compressed trapezoids all come
//! out as boundaries.  A circle has no GDSII form and is fatal; extension
//! elements are dropped with a warning, except for the XGEOMETRY records
//! that carry a GDSII NODE, which convert back to nodes.

use std::rc::Rc;
use log::warn;
use crate::fio::FileType;
use crate::gdsii::builder::*;
use crate::gdsii::{GdsCreator,GdsPoint,MAX_LAYER};
use crate::oasis::names::{OasisName,LayerName,Property,PropValue};
use crate::oasis::oreal::Oreal;
use crate::oasis::rep::{Delta,Repetition};
use crate::oasis::scanner::OasisScanner;
use crate::oasis::trapezoid::Trapezoid;
use crate::oasis::validate::ValScheme;
use crate::oasis::{checked_plus,checked_mult,OasisBuilder,OasisParser,OasisParserOptions};
use crate::{DYNERR,STDRESULT};
use super::{Error,NODE_XGEOMETRY_ATTRIBUTE};

/// Parse `infile` and write the converted layout to `outfile`.
pub fn convert_oasis_to_gds(infile: &str,outfile: &str) -> STDRESULT {
    let mut options = OasisParserOptions::default();
    options.strict_conformance = false;
    let mut parser = OasisParser::open(infile,None,&options)?;
    let creator = GdsCreator::create(outfile,FileType::Auto)?;
    let mut converter = OasisToGdsConverter::new(creator);
    parser.parse_file(&mut converter)
}

/// A fully resolved element waiting for its properties; GDSII wants the
/// properties inside each element record sequence, and repetitions fan
/// one OASIS element out into many GDSII elements.
enum PendingElem {
    Boundary { layer: i16, datatype: i16, outline: Vec<GdsPoint> },
    Path { layer: i16, datatype: i16, points: Vec<GdsPoint>, options: GdsPathOptions },
    Text { layer: i16, texttype: i16, x: i32, y: i32, text: String },
    Sref { sname: String, x: i32, y: i32, strans: Option<GdsTransform> },
    Aref { sname: String, cols: i16, rows: i16, points: [GdsPoint;3], strans: Option<GdsTransform> },
    Node { layer: i16, nodetype: i16, points: Vec<GdsPoint> }
}

pub struct OasisToGdsConverter {
    creator: GdsCreator,
    pending: Vec<PendingElem>,
    pending_props: Vec<(i16,String)>,
    warned_xelement: bool,
    warned_xgeometry: bool,
    warned_prop: bool
}

fn to_i32(v: i64) -> Result<i32,DYNERR> {
    match i32::try_from(v) {
        Ok(x) => Ok(x),
        Err(_) => Err(Box::new(Error::CoordRange(v)))
    }
}

fn to_type(kind: &'static str,v: u64) -> Result<i16,DYNERR> {
    match v <= MAX_LAYER as u64 {
        true => Ok(v as i16),
        false => Err(Box::new(Error::TypeRange(kind,v)))
    }
}

fn make_strans(mag: &Oreal,angle: &Oreal,flip: bool) -> Option<GdsTransform> {
    let mag = mag.to_f64();
    let angle = angle.to_f64();
    if mag==1.0 && angle==0.0 && !flip {
        return None;
    }
    Some(GdsTransform {
        reflect: flip,
        abs_mag: false,
        abs_angle: false,
        mag: match mag==1.0 { true => None, false => Some(mag) },
        angle: match angle==0.0 { true => None, false => Some(angle) }
    })
}

impl OasisToGdsConverter {
    pub fn new(creator: GdsCreator) -> Self {
        Self {
            creator,
            pending: Vec::new(),
            pending_props: Vec::new(),
            warned_xelement: false,
            warned_xgeometry: false,
            warned_prop: false
        }
    }
    /// The positions an element appears at: just its own, or one per
    /// repetition placement.
    fn positions(x: i64,y: i64,rep: Option<&Repetition>) -> Result<Vec<(i64,i64)>,DYNERR> {
        match rep {
            None => Ok(vec![(x,y)]),
            Some(rep) => {
                let mut ans = Vec::with_capacity(rep.dimension() as usize);
                for d in rep.points() {
                    ans.push((checked_plus(x,d.x)?,checked_plus(y,d.y)?));
                }
                Ok(ans)
            }
        }
    }
    fn absolute_points(x: i64,y: i64,deltas: &[Delta]) -> Result<Vec<GdsPoint>,DYNERR> {
        let mut ans = Vec::with_capacity(deltas.len());
        for d in deltas {
            ans.push(GdsPoint::new(to_i32(checked_plus(x,d.x)?)?,to_i32(checked_plus(y,d.y)?)?));
        }
        Ok(ans)
    }
    fn flush_pending(&mut self) -> STDRESULT {
        let items = std::mem::take(&mut self.pending);
        let props = std::mem::take(&mut self.pending_props);
        for item in items {
            match &item {
                PendingElem::Boundary { layer, datatype, outline } => {
                    self.creator.begin_boundary(*layer,*datatype,outline,
                        &GdsElementOptions::default())?;
                },
                PendingElem::Path { layer, datatype, points, options } => {
                    self.creator.begin_path(*layer,*datatype,points,options)?;
                },
                PendingElem::Text { layer, texttype, x, y, text } => {
                    self.creator.begin_text(*layer,*texttype,*x,*y,text,&None,
                        &GdsTextOptions::default())?;
                },
                PendingElem::Sref { sname, x, y, strans } => {
                    self.creator.begin_sref(sname,*x,*y,strans,
                        &GdsElementOptions::default())?;
                },
                PendingElem::Aref { sname, cols, rows, points, strans } => {
                    self.creator.begin_aref(sname,*cols,*rows,points,strans,
                        &GdsElementOptions::default())?;
                },
                PendingElem::Node { layer, nodetype, points } => {
                    self.creator.begin_node(*layer,*nodetype,points,
                        &GdsElementOptions::default())?;
                }
            }
            for (attr,value) in &props {
                self.creator.add_property(*attr,value)?;
            }
            self.creator.end_element()?;
        }
        Ok(())
    }
}

impl OasisBuilder for OasisToGdsConverter {
    fn begin_file(&mut self,_version: &str,unit: &Oreal,_val_scheme: ValScheme) -> STDRESULT {
        // unit counts grid steps per micron
        let grids_per_micron = unit.to_f64();
        let units = GdsUnits {
            db_to_user: 1.0/grids_per_micron,
            db_to_meter: 1.0e-6/grids_per_micron
        };
        let now = GdsDate::now();
        self.creator.gds_version(600)?;
        self.creator.begin_library("LIB",&now,&now,&units,&GdsLibraryOptions::default())
    }
    fn end_file(&mut self) -> STDRESULT {
        self.creator.end_library()
    }
    fn begin_cell(&mut self,cell: &Rc<OasisName>) -> STDRESULT {
        let now = GdsDate::now();
        self.creator.begin_structure(&cell.name_str(),&now,&now,&GdsStructureOptions::default())
    }
    fn end_cell(&mut self) -> STDRESULT {
        self.creator.end_structure()
    }
    fn begin_placement(&mut self,cell: &Rc<OasisName>,x: i64,y: i64,mag: &Oreal,angle: &Oreal,
        flip: bool,rep: Option<&Repetition>) -> STDRESULT {
        let strans = make_strans(mag,angle,flip);
        if let Some(Repetition::Matrix { cols, rows, col_space, row_space }) = rep {
            if *cols <= i16::MAX as u64 && *rows <= i16::MAX as u64 {
                let p0 = GdsPoint::new(to_i32(x)?,to_i32(y)?);
                let col_end = checked_plus(x,checked_mult(*col_space,*cols as i64)?)?;
                let row_end = checked_plus(y,checked_mult(*row_space,*rows as i64)?)?;
                self.pending.push(PendingElem::Aref {
                    sname: cell.name_str(),
                    cols: *cols as i16,
                    rows: *rows as i16,
                    points: [p0,GdsPoint::new(to_i32(col_end)?,p0.y),GdsPoint::new(p0.x,to_i32(row_end)?)],
                    strans
                });
                return Ok(());
            }
        }
        for (px,py) in Self::positions(x,y,rep)? {
            self.pending.push(PendingElem::Sref {
                sname: cell.name_str(),
                x: to_i32(px)?,
                y: to_i32(py)?,
                strans: strans.clone()
            });
        }
        Ok(())
    }
    fn begin_text(&mut self,textlayer: u64,texttype: u64,x: i64,y: i64,text: &Rc<OasisName>,
        rep: Option<&Repetition>) -> STDRESULT {
        let layer = to_type("textlayer",textlayer)?;
        let texttype = to_type("texttype",texttype)?;
        for (px,py) in Self::positions(x,y,rep)? {
            self.pending.push(PendingElem::Text {
                layer,
                texttype,
                x: to_i32(px)?,
                y: to_i32(py)?,
                text: text.name_str()
            });
        }
        Ok(())
    }
    fn begin_rectangle(&mut self,layer: u64,datatype: u64,x: i64,y: i64,width: i64,height: i64,
        rep: Option<&Repetition>) -> STDRESULT {
        let layer = to_type("layer",layer)?;
        let datatype = to_type("datatype",datatype)?;
        for (px,py) in Self::positions(x,y,rep)? {
            let x0 = to_i32(px)?;
            let y0 = to_i32(py)?;
            let x1 = to_i32(checked_plus(px,width)?)?;
            let y1 = to_i32(checked_plus(py,height)?)?;
            self.pending.push(PendingElem::Boundary {
                layer,
                datatype,
                outline: vec![GdsPoint::new(x0,y0),GdsPoint::new(x1,y0),GdsPoint::new(x1,y1),
                    GdsPoint::new(x0,y1),GdsPoint::new(x0,y0)]
            });
        }
        Ok(())
    }
    fn begin_polygon(&mut self,layer: u64,datatype: u64,x: i64,y: i64,points: &[Delta],
        rep: Option<&Repetition>) -> STDRESULT {
        let layer = to_type("layer",layer)?;
        let datatype = to_type("datatype",datatype)?;
        for (px,py) in Self::positions(x,y,rep)? {
            let mut outline = Self::absolute_points(px,py,points)?;
            outline.push(outline[0]);
            self.pending.push(PendingElem::Boundary { layer, datatype, outline });
        }
        Ok(())
    }
    fn begin_path(&mut self,layer: u64,datatype: u64,x: i64,y: i64,halfwidth: i64,
        start_extn: i64,end_extn: i64,points: &[Delta],rep: Option<&Repetition>) -> STDRESULT {
        let layer = to_type("layer",layer)?;
        let datatype = to_type("datatype",datatype)?;
        let width = to_i32(halfwidth*2)?;
        let mut options = GdsPathOptions::default();
        options.width = Some(width);
        if start_extn==0 && end_extn==0 {
            options.pathtype = Some(GdsPathtype::Flush);
        } else if start_extn==halfwidth && end_extn==halfwidth {
            options.pathtype = Some(GdsPathtype::Extend);
        } else {
            options.pathtype = Some(GdsPathtype::Custom);
            options.bgnextn = Some(to_i32(start_extn)?);
            options.endextn = Some(to_i32(end_extn)?);
        }
        for (px,py) in Self::positions(x,y,rep)? {
            self.pending.push(PendingElem::Path {
                layer,
                datatype,
                points: Self::absolute_points(px,py,points)?,
                options
            });
        }
        Ok(())
    }
    fn begin_trapezoid(&mut self,layer: u64,datatype: u64,x: i64,y: i64,trap: &Trapezoid,
        rep: Option<&Repetition>) -> STDRESULT {
        let layer = to_type("layer",layer)?;
        let datatype = to_type("datatype",datatype)?;
        let vertices = trap.vertices();
        for (px,py) in Self::positions(x,y,rep)? {
            let mut outline = Self::absolute_points(px,py,&vertices)?;
            outline.dedup();
            outline.push(outline[0]);
            // a degenerate trapezoid can shrink below a boundary's minimum
            while outline.len() < 4 {
                outline.insert(1,outline[0]);
            }
            self.pending.push(PendingElem::Boundary { layer, datatype, outline });
        }
        Ok(())
    }
    fn begin_circle(&mut self,_layer: u64,_datatype: u64,x: i64,y: i64,radius: i64,
        _rep: Option<&Repetition>) -> STDRESULT {
        Err(Box::new(Error::Unconvertible(format!(
            "CIRCLE at ({},{}) radius {}: GDSII cannot express circles",x,y,radius))))
    }
    fn begin_xelement(&mut self,attribute: u64,_data: &[u8]) -> STDRESULT {
        if !self.warned_xelement {
            warn!("XELEMENT (attribute {}) has no GDSII form; dropped",attribute);
            self.warned_xelement = true;
        }
        Ok(())
    }
    fn begin_xgeometry(&mut self,layer: u64,datatype: u64,x: i64,y: i64,attribute: u64,
        data: &[u8],rep: Option<&Repetition>) -> STDRESULT {
        if attribute != NODE_XGEOMETRY_ATTRIBUTE {
            if !self.warned_xgeometry {
                warn!("XGEOMETRY attribute {} has no GDSII form; dropped",attribute);
                self.warned_xgeometry = true;
            }
            return Ok(());
        }
        let layer = to_type("layer",layer)?;
        let nodetype = to_type("nodetype",datatype)?;
        // the payload holds the node's vertex offsets
        let mut scanner = OasisScanner::from_bytes(data.to_vec(),"XGEOMETRY data",0);
        let count = scanner.read_unsigned()? as usize;
        let mut deltas = Vec::with_capacity(count);
        for _i in 0..count {
            let dx = scanner.read_signed()?;
            let dy = scanner.read_signed()?;
            deltas.push(Delta::new(dx,dy));
        }
        for (px,py) in Self::positions(x,y,rep)? {
            self.pending.push(PendingElem::Node {
                layer,
                nodetype,
                points: Self::absolute_points(px,py,&deltas)?
            });
        }
        Ok(())
    }
    fn end_element(&mut self) -> STDRESULT {
        self.flush_pending()
    }
    fn add_element_property(&mut self,prop: &Property) -> STDRESULT {
        // the S_GDS_PROPERTY convention round-trips GDSII properties
        if prop.name.name()==b"S_GDS_PROPERTY" && prop.values.len()==2 {
            if let (PropValue::Unsigned(attr),PropValue::AString(value)) =
                (&prop.values[0],&prop.values[1]) {
                if *attr <= i16::MAX as u64 {
                    self.pending_props.push((*attr as i16,
                        String::from_utf8_lossy(value).to_string()));
                    return Ok(());
                }
            }
        }
        if !self.warned_prop {
            warn!("property '{}' has no GDSII form; dropped",prop.name.name_str());
            self.warned_prop = true;
        }
        Ok(())
    }
    fn add_file_property(&mut self,prop: &Property) -> STDRESULT {
        if !self.warned_prop {
            warn!("property '{}' has no GDSII form; dropped",prop.name.name_str());
            self.warned_prop = true;
        }
        Ok(())
    }
    fn add_cell_property(&mut self,prop: &Property) -> STDRESULT {
        self.add_file_property(prop)
    }
    fn register_layer_name(&mut self,layer_name: &Rc<LayerName>) -> STDRESULT {
        warn!("LAYERNAME '{}' has no GDSII form; dropped",layer_name.name_str());
        Ok(())
    }
}
