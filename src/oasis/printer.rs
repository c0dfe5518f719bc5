//! # OASIS printer
//!
//! An `OasisBuilder` that renders every event as one line of text.  Backs
//! the `print` subcommand; also handy in tests, where the rendered stream
//! is easy to compare.

use std::io::Write;
use std::rc::Rc;
use crate::{escaped_ascii_from_bytes,STDRESULT};
use super::names::*;
use super::oreal::Oreal;
use super::rep::{Delta,Repetition};
use super::trapezoid::{Trapezoid,Orientation};
use super::validate::ValScheme;
use super::builder::OasisBuilder;

pub struct OasisPrinter<'a> {
    out: &'a mut dyn Write,
    indent: usize
}

impl<'a> OasisPrinter<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out, indent: 0 }
    }
    fn line(&mut self,text: String) -> STDRESULT {
        writeln!(self.out,"{:indent$}{}","",text,indent = self.indent)?;
        Ok(())
    }
    fn fmt_real(val: &Oreal) -> String {
        match val {
            Oreal::Integer(v) => format!("{}",v),
            Oreal::Reciprocal(v) => format!("1/{}",v),
            Oreal::Ratio(n,d) => format!("{}/{}",n,d),
            Oreal::Float32(v) => format!("{}",v),
            Oreal::Float64(v) => format!("{}",v)
        }
    }
    fn fmt_rep(rep: Option<&Repetition>) -> String {
        let rep = match rep {
            Some(r) => r,
            None => return String::new()
        };
        match rep {
            Repetition::Matrix { cols, rows, col_space, row_space } =>
                format!(" rep=matrix {}x{} step {},{}",cols,rows,col_space,row_space),
            Repetition::UniformX { dim, space } => format!(" rep=uniform-x {} step {}",dim,space),
            Repetition::UniformY { dim, space } => format!(" rep=uniform-y {} step {}",dim,space),
            Repetition::VaryingX { offsets } => format!(" rep=varying-x {:?}",offsets),
            Repetition::GridVaryingX { grid, offsets } =>
                format!(" rep=varying-x grid {} {:?}",grid,offsets),
            Repetition::VaryingY { offsets } => format!(" rep=varying-y {:?}",offsets),
            Repetition::GridVaryingY { grid, offsets } =>
                format!(" rep=varying-y grid {} {:?}",grid,offsets),
            Repetition::Arbitrary { offsets } =>
                format!(" rep=arbitrary {}",Self::fmt_points(offsets)),
            Repetition::GridArbitrary { grid, offsets } =>
                format!(" rep=arbitrary grid {} {}",grid,Self::fmt_points(offsets)),
            Repetition::Diagonal { dim, delta } =>
                format!(" rep=diagonal {} step ({},{})",dim,delta.x,delta.y),
            Repetition::TiltedMatrix { ncount, mcount, ndelta, mdelta } =>
                format!(" rep=tilted {}x{} n ({},{}) m ({},{})",
                    ncount,mcount,ndelta.x,ndelta.y,mdelta.x,mdelta.y)
        }
    }
    fn fmt_points(points: &[Delta]) -> String {
        let mut ans = String::new();
        for pt in points {
            ans += &format!("({},{}) ",pt.x,pt.y);
        }
        ans.trim_end().to_string()
    }
    fn fmt_value(value: &PropValue) -> String {
        match value {
            PropValue::Real(r) => Self::fmt_real(r),
            PropValue::Unsigned(v) => format!("{}",v),
            PropValue::Signed(v) => format!("{}",v),
            PropValue::AString(s) | PropValue::BString(s) | PropValue::NString(s) =>
                format!("\"{}\"",escaped_ascii_from_bytes(s)),
            PropValue::Ref(_tag,name) => format!("\"{}\"",escaped_ascii_from_bytes(name.name()))
        }
    }
    fn print_property(&mut self,kind: &str,prop: &Property) -> STDRESULT {
        let mut text = format!("{} \"{}\"",kind,escaped_ascii_from_bytes(prop.name.name()));
        if prop.is_standard {
            text += " standard";
        }
        for value in &prop.values {
            text += " ";
            text += &Self::fmt_value(value);
        }
        self.line(text)
    }
}

impl<'a> OasisBuilder for OasisPrinter<'a> {
    fn begin_file(&mut self,version: &str,unit: &Oreal,val_scheme: ValScheme) -> STDRESULT {
        self.line(format!("FILE version {} unit {} validation {}",
            version,Self::fmt_real(unit),val_scheme.name()))
    }
    fn end_file(&mut self) -> STDRESULT {
        self.line("END".to_string())
    }
    fn begin_cell(&mut self,cell: &Rc<OasisName>) -> STDRESULT {
        self.line(format!("CELL \"{}\"",escaped_ascii_from_bytes(cell.name())))?;
        self.indent = 2;
        Ok(())
    }
    fn end_cell(&mut self) -> STDRESULT {
        self.indent = 0;
        Ok(())
    }
    fn begin_placement(&mut self,cell: &Rc<OasisName>,x: i64,y: i64,mag: &Oreal,angle: &Oreal,
        flip: bool,rep: Option<&Repetition>) -> STDRESULT {
        let mut text = format!("PLACEMENT \"{}\" at ({},{}) mag {} angle {}",
            escaped_ascii_from_bytes(cell.name()),x,y,Self::fmt_real(mag),Self::fmt_real(angle));
        if flip {
            text += " flip";
        }
        text += &Self::fmt_rep(rep);
        self.line(text)?;
        self.indent += 2;
        Ok(())
    }
    fn begin_text(&mut self,textlayer: u64,texttype: u64,x: i64,y: i64,text: &Rc<OasisName>,
        rep: Option<&Repetition>) -> STDRESULT {
        self.line(format!("TEXT layer {} type {} at ({},{}) \"{}\"{}",
            textlayer,texttype,x,y,escaped_ascii_from_bytes(text.name()),Self::fmt_rep(rep)))?;
        self.indent += 2;
        Ok(())
    }
    fn begin_rectangle(&mut self,layer: u64,datatype: u64,x: i64,y: i64,width: i64,height: i64,
        rep: Option<&Repetition>) -> STDRESULT {
        self.line(format!("RECTANGLE layer {} datatype {} at ({},{}) {}x{}{}",
            layer,datatype,x,y,width,height,Self::fmt_rep(rep)))?;
        self.indent += 2;
        Ok(())
    }
    fn begin_polygon(&mut self,layer: u64,datatype: u64,x: i64,y: i64,points: &[Delta],
        rep: Option<&Repetition>) -> STDRESULT {
        self.line(format!("POLYGON layer {} datatype {} at ({},{}) points {}{}",
            layer,datatype,x,y,Self::fmt_points(points),Self::fmt_rep(rep)))?;
        self.indent += 2;
        Ok(())
    }
    fn begin_path(&mut self,layer: u64,datatype: u64,x: i64,y: i64,halfwidth: i64,
        start_extn: i64,end_extn: i64,points: &[Delta],rep: Option<&Repetition>) -> STDRESULT {
        self.line(format!("PATH layer {} datatype {} at ({},{}) halfwidth {} extn {},{} points {}{}",
            layer,datatype,x,y,halfwidth,start_extn,end_extn,
            Self::fmt_points(points),Self::fmt_rep(rep)))?;
        self.indent += 2;
        Ok(())
    }
    fn begin_trapezoid(&mut self,layer: u64,datatype: u64,x: i64,y: i64,trap: &Trapezoid,
        rep: Option<&Repetition>) -> STDRESULT {
        let orient = match trap.orientation() {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical"
        };
        self.line(format!("TRAPEZOID layer {} datatype {} at ({},{}) {} {}x{} delta_a {} delta_b {}{}",
            layer,datatype,x,y,orient,trap.width(),trap.height(),
            trap.delta_a(),trap.delta_b(),Self::fmt_rep(rep)))?;
        self.indent += 2;
        Ok(())
    }
    fn begin_circle(&mut self,layer: u64,datatype: u64,x: i64,y: i64,radius: i64,
        rep: Option<&Repetition>) -> STDRESULT {
        self.line(format!("CIRCLE layer {} datatype {} at ({},{}) radius {}{}",
            layer,datatype,x,y,radius,Self::fmt_rep(rep)))?;
        self.indent += 2;
        Ok(())
    }
    fn begin_xelement(&mut self,attribute: u64,data: &[u8]) -> STDRESULT {
        self.line(format!("XELEMENT attribute {} data {}",attribute,hex::encode(data)))?;
        self.indent += 2;
        Ok(())
    }
    fn begin_xgeometry(&mut self,layer: u64,datatype: u64,x: i64,y: i64,attribute: u64,
        data: &[u8],rep: Option<&Repetition>) -> STDRESULT {
        self.line(format!("XGEOMETRY layer {} datatype {} at ({},{}) attribute {} data {}{}",
            layer,datatype,x,y,attribute,hex::encode(data),Self::fmt_rep(rep)))?;
        self.indent += 2;
        Ok(())
    }
    fn end_element(&mut self) -> STDRESULT {
        self.indent -= 2;
        Ok(())
    }
    fn add_file_property(&mut self,prop: &Property) -> STDRESULT {
        self.print_property("FILE-PROPERTY",prop)
    }
    fn add_cell_property(&mut self,prop: &Property) -> STDRESULT {
        self.print_property("CELL-PROPERTY",prop)
    }
    fn add_element_property(&mut self,prop: &Property) -> STDRESULT {
        self.print_property("PROPERTY",prop)
    }
    fn register_cell_name(&mut self,cell_name: &Rc<OasisName>) -> STDRESULT {
        self.line(format!("CELLNAME {} \"{}\"",cell_name.refnum(),
            escaped_ascii_from_bytes(cell_name.name())))
    }
    fn register_text_string(&mut self,text_string: &Rc<OasisName>) -> STDRESULT {
        self.line(format!("TEXTSTRING {} \"{}\"",text_string.refnum(),
            escaped_ascii_from_bytes(text_string.name())))
    }
    fn register_prop_name(&mut self,prop_name: &Rc<OasisName>) -> STDRESULT {
        self.line(format!("PROPNAME {} \"{}\"",prop_name.refnum(),
            escaped_ascii_from_bytes(prop_name.name())))
    }
    fn register_prop_string(&mut self,prop_string: &Rc<OasisName>) -> STDRESULT {
        self.line(format!("PROPSTRING {} \"{}\"",prop_string.refnum(),
            escaped_ascii_from_bytes(prop_string.name())))
    }
    fn register_layer_name(&mut self,layer_name: &Rc<LayerName>) -> STDRESULT {
        let kind = match layer_name.is_text {
            true => "text",
            false => "geometry"
        };
        self.line(format!("LAYERNAME \"{}\" {} layers {:?} types {:?}",
            escaped_ascii_from_bytes(&layer_name.name),kind,layer_name.layers,layer_name.types))
    }
    fn register_xname(&mut self,xname: &Rc<OasisName>) -> STDRESULT {
        self.line(format!("XNAME {} attribute {} \"{}\"",xname.refnum(),
            xname.attribute.get(),escaped_ascii_from_bytes(xname.name())))
    }
}
