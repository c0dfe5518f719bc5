//! # OASIS builder interface
//!
//! `OasisParser::parse_file` invokes the methods of an `OasisBuilder` in
//! this order (`{ x }*` meaning zero or more):
//!
//! ```text
//! begin_file
//!     { register_<kind> }*
//!     { add_file_property }*
//!     { begin_cell { add_cell_property }*
//!         { begin_<element> { add_element_property }* end_element }*
//!       end_cell }*
//! end_file
//! ```
//!
//! The register callbacks fire for every name in the file, grouped by
//! kind, before anything else, so name references handed to the element
//! methods are always resolved.  Coordinates are always absolute and
//! modal-resolved by the time a builder sees them; XYABSOLUTE and
//! XYRELATIVE records are swallowed by the parser.
//!
//! All methods default to doing nothing.  A creator implements this trait,
//! so builders compose into parse-transform-write pipelines by explicit
//! forwarding.

use std::rc::Rc;
use crate::STDRESULT;
use super::names::{OasisName,LayerName,Property};
use super::oreal::Oreal;
use super::rep::{Delta,Repetition};
use super::trapezoid::Trapezoid;
use super::validate::ValScheme;

#[allow(unused_variables)]
pub trait OasisBuilder {
    /// `version` and `unit` come from the START record; `val_scheme` from
    /// the END record.
    fn begin_file(&mut self,version: &str,unit: &Oreal,val_scheme: ValScheme) -> STDRESULT {
        Ok(())
    }
    fn end_file(&mut self) -> STDRESULT {
        Ok(())
    }
    fn begin_cell(&mut self,cell: &Rc<OasisName>) -> STDRESULT {
        Ok(())
    }
    fn end_cell(&mut self) -> STDRESULT {
        Ok(())
    }
    fn begin_placement(&mut self,cell: &Rc<OasisName>,x: i64,y: i64,mag: &Oreal,angle: &Oreal,
        flip: bool,rep: Option<&Repetition>) -> STDRESULT {
        Ok(())
    }
    fn begin_text(&mut self,textlayer: u64,texttype: u64,x: i64,y: i64,text: &Rc<OasisName>,
        rep: Option<&Repetition>) -> STDRESULT {
        Ok(())
    }
    fn begin_rectangle(&mut self,layer: u64,datatype: u64,x: i64,y: i64,width: i64,height: i64,
        rep: Option<&Repetition>) -> STDRESULT {
        Ok(())
    }
    /// `points` are vertex offsets from (x,y), the leading zero vertex
    /// included, without the implicit closing vertex.
    fn begin_polygon(&mut self,layer: u64,datatype: u64,x: i64,y: i64,points: &[Delta],
        rep: Option<&Repetition>) -> STDRESULT {
        Ok(())
    }
    fn begin_path(&mut self,layer: u64,datatype: u64,x: i64,y: i64,halfwidth: i64,
        start_extn: i64,end_extn: i64,points: &[Delta],rep: Option<&Repetition>) -> STDRESULT {
        Ok(())
    }
    fn begin_trapezoid(&mut self,layer: u64,datatype: u64,x: i64,y: i64,trap: &Trapezoid,
        rep: Option<&Repetition>) -> STDRESULT {
        Ok(())
    }
    fn begin_circle(&mut self,layer: u64,datatype: u64,x: i64,y: i64,radius: i64,
        rep: Option<&Repetition>) -> STDRESULT {
        Ok(())
    }
    fn begin_xelement(&mut self,attribute: u64,data: &[u8]) -> STDRESULT {
        Ok(())
    }
    fn begin_xgeometry(&mut self,layer: u64,datatype: u64,x: i64,y: i64,attribute: u64,
        data: &[u8],rep: Option<&Repetition>) -> STDRESULT {
        Ok(())
    }
    fn end_element(&mut self) -> STDRESULT {
        Ok(())
    }
    fn add_file_property(&mut self,prop: &Property) -> STDRESULT {
        Ok(())
    }
    fn add_cell_property(&mut self,prop: &Property) -> STDRESULT {
        Ok(())
    }
    fn add_element_property(&mut self,prop: &Property) -> STDRESULT {
        Ok(())
    }
    fn register_cell_name(&mut self,cell_name: &Rc<OasisName>) -> STDRESULT {
        Ok(())
    }
    fn register_text_string(&mut self,text_string: &Rc<OasisName>) -> STDRESULT {
        Ok(())
    }
    fn register_prop_name(&mut self,prop_name: &Rc<OasisName>) -> STDRESULT {
        Ok(())
    }
    fn register_prop_string(&mut self,prop_string: &Rc<OasisName>) -> STDRESULT {
        Ok(())
    }
    fn register_layer_name(&mut self,layer_name: &Rc<LayerName>) -> STDRESULT {
        Ok(())
    }
    fn register_xname(&mut self,xname: &Rc<OasisName>) -> STDRESULT {
        Ok(())
    }
}
