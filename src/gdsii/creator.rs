//! # GDSII creator
//!
//! `GdsCreator` is a `GdsBuilder` that writes a conforming GDSII file, so it
//! can be handed straight to `GdsParser::parse_file` to copy a file, or to a
//! cross-format converter.  Call the methods in the same order the parser
//! invokes them.

use crate::fio::FileType;
use crate::{DYNERR,STDRESULT};
use super::writer::GdsWriter;
use super::rectypes::RecType;
use super::builder::*;
use super::{Error,GdsPoint,MAX_BOUNDARY_POINTS,MAX_PATH_POINTS,MAX_NODE_POINTS};

pub struct GdsCreator {
    writer: GdsWriter,
    version: i16
}

impl GdsCreator {
    pub fn create(fname: &str,ftype: FileType) -> Result<Self,DYNERR> {
        let writer = GdsWriter::create(fname,ftype)?;
        Ok(Self { writer, version: 600 })
    }
    /// Flush the output and close the file.  Call after `end_library`.
    pub fn end_output(&mut self) -> STDRESULT {
        self.writer.end_file()
    }
    fn err(&self,msg: String) -> DYNERR {
        Box::new(Error::Create(self.writer.filename().to_string(),msg))
    }
    fn write_date_pair(&mut self,rec_type: RecType,d1: &GdsDate,d2: &GdsDate) -> STDRESULT {
        self.writer.begin_record(rec_type)?;
        for d in [d1,d2] {
            self.writer.write_short(d.year);
            self.writer.write_short(d.month);
            self.writer.write_short(d.day);
            self.writer.write_short(d.hour);
            self.writer.write_short(d.minute);
            self.writer.write_short(d.second);
        }
        self.writer.end_record();
        Ok(())
    }
    fn write_xy(&mut self,points: &[GdsPoint],max: usize) -> STDRESULT {
        if points.len() > max {
            return Err(self.err(format!("XY record cannot hold {} points",points.len())));
        }
        self.writer.begin_record(RecType::Xy)?;
        for pt in points {
            self.writer.write_int(pt.x);
            self.writer.write_int(pt.y);
        }
        self.writer.end_record();
        Ok(())
    }
    fn write_element_options(&mut self,options: &GdsElementOptions) -> STDRESULT {
        if let Some(elflags) = options.elflags {
            self.writer.write_bit_array_record(RecType::ElFlags,elflags)?;
        }
        if let Some(plex) = options.plex {
            self.writer.write_int_record(RecType::Plex,plex)?;
        }
        Ok(())
    }
    fn write_strans(&mut self,strans: &Option<GdsTransform>) -> STDRESULT {
        let strans = match strans {
            Some(s) => s,
            None => return Ok(())
        };
        let mut bits: u16 = 0;
        if strans.reflect {
            bits |= 0x8000;
        }
        if strans.abs_mag {
            bits |= 0x0004;
        }
        if strans.abs_angle {
            bits |= 0x0002;
        }
        self.writer.write_bit_array_record(RecType::Strans,bits)?;
        if let Some(mag) = strans.mag {
            self.writer.begin_record(RecType::Mag)?;
            self.writer.write_double(mag)?;
            self.writer.end_record();
        }
        if let Some(angle) = strans.angle {
            self.writer.begin_record(RecType::Angle)?;
            self.writer.write_double(angle)?;
            self.writer.end_record();
        }
        Ok(())
    }
    fn write_fixed_strings(&mut self,rec_type: RecType,strings: &[String]) -> STDRESULT {
        self.writer.begin_record(rec_type)?;
        for s in strings {
            self.writer.write_string(s.as_bytes());
        }
        self.writer.end_record();
        Ok(())
    }
}

impl GdsBuilder for GdsCreator {
    fn gds_version(&mut self,version: i16) -> STDRESULT {
        self.version = version;
        Ok(())
    }
    fn begin_library(&mut self,libname: &str,mod_time: &GdsDate,acc_time: &GdsDate,
        units: &GdsUnits,options: &GdsLibraryOptions) -> STDRESULT {
        self.writer.write_short_record(RecType::Header,self.version)?;
        self.write_date_pair(RecType::BgnLib,mod_time,acc_time)?;
        if let Some(libdirsize) = options.libdirsize {
            self.writer.write_short_record(RecType::LibDirSize,libdirsize)?;
        }
        if let Some(srfname) = &options.srfname {
            self.writer.write_string_record(RecType::SrfName,srfname.as_bytes())?;
        }
        if let Some(acls) = &options.acls {
            self.writer.begin_record(RecType::LibSecur)?;
            for acl in acls {
                self.writer.write_short(acl.groupid);
                self.writer.write_short(acl.userid);
                self.writer.write_short(acl.rights);
            }
            self.writer.end_record();
        }
        self.writer.write_string_record(RecType::LibName,libname.as_bytes())?;
        if let Some(reflibs) = &options.reflibs {
            self.write_fixed_strings(RecType::RefLibs,reflibs)?;
        }
        if let Some(fonts) = &options.fonts {
            self.write_fixed_strings(RecType::Fonts,fonts)?;
        }
        if let Some(attrtable) = &options.attrtable {
            self.writer.write_string_record(RecType::AttrTable,attrtable.as_bytes())?;
        }
        if let Some(generations) = options.generations {
            self.writer.write_short_record(RecType::Generations,generations)?;
        }
        if let Some(format) = options.format {
            self.writer.write_short_record(RecType::Format,format as i16)?;
            if options.masks.len() > 0 {
                for mask in &options.masks {
                    self.writer.write_string_record(RecType::Mask,mask.as_bytes())?;
                }
                self.writer.write_empty_record(RecType::EndMasks)?;
            }
        }
        self.writer.begin_record(RecType::Units)?;
        self.writer.write_double(units.db_to_user)?;
        self.writer.write_double(units.db_to_meter)?;
        self.writer.end_record();
        Ok(())
    }
    fn end_library(&mut self) -> STDRESULT {
        self.writer.write_empty_record(RecType::EndLib)?;
        self.writer.end_file()
    }
    fn begin_structure(&mut self,sname: &str,create_time: &GdsDate,mod_time: &GdsDate,
        options: &GdsStructureOptions) -> STDRESULT {
        self.write_date_pair(RecType::BgnStr,create_time,mod_time)?;
        self.writer.write_string_record(RecType::StrName,sname.as_bytes())?;
        if let Some(strclass) = options.strclass {
            self.writer.write_bit_array_record(RecType::StrClass,strclass)?;
        }
        Ok(())
    }
    fn end_structure(&mut self) -> STDRESULT {
        self.writer.write_empty_record(RecType::EndStr)
    }
    fn begin_boundary(&mut self,layer: i16,datatype: i16,points: &[GdsPoint],
        options: &GdsElementOptions) -> STDRESULT {
        self.writer.write_empty_record(RecType::Boundary)?;
        self.write_element_options(options)?;
        self.writer.write_short_record(RecType::Layer,layer)?;
        self.writer.write_short_record(RecType::Datatype,datatype)?;
        self.write_xy(points,MAX_BOUNDARY_POINTS)
    }
    fn begin_path(&mut self,layer: i16,datatype: i16,points: &[GdsPoint],
        options: &GdsPathOptions) -> STDRESULT {
        self.writer.write_empty_record(RecType::Path)?;
        self.write_element_options(&options.element_options())?;
        self.writer.write_short_record(RecType::Layer,layer)?;
        self.writer.write_short_record(RecType::Datatype,datatype)?;
        if let Some(pathtype) = options.pathtype {
            self.writer.write_short_record(RecType::PathType,pathtype as i16)?;
        }
        if let Some(width) = options.width {
            self.writer.write_int_record(RecType::Width,width)?;
        }
        if let Some(bgnextn) = options.bgnextn {
            self.writer.write_int_record(RecType::BgnExtn,bgnextn)?;
        }
        if let Some(endextn) = options.endextn {
            self.writer.write_int_record(RecType::EndExtn,endextn)?;
        }
        self.write_xy(points,MAX_PATH_POINTS)
    }
    fn begin_sref(&mut self,sname: &str,x: i32,y: i32,strans: &Option<GdsTransform>,
        options: &GdsElementOptions) -> STDRESULT {
        self.writer.write_empty_record(RecType::Sref)?;
        self.write_element_options(options)?;
        self.writer.write_string_record(RecType::Sname,sname.as_bytes())?;
        self.write_strans(strans)?;
        self.write_xy(&[GdsPoint::new(x,y)],1)
    }
    fn begin_aref(&mut self,sname: &str,cols: i16,rows: i16,points: &[GdsPoint;3],
        strans: &Option<GdsTransform>,options: &GdsElementOptions) -> STDRESULT {
        self.writer.write_empty_record(RecType::Aref)?;
        self.write_element_options(options)?;
        self.writer.write_string_record(RecType::Sname,sname.as_bytes())?;
        self.write_strans(strans)?;
        self.writer.begin_record(RecType::ColRow)?;
        self.writer.write_short(cols);
        self.writer.write_short(rows);
        self.writer.end_record();
        self.write_xy(points,3)
    }
    fn begin_node(&mut self,layer: i16,nodetype: i16,points: &[GdsPoint],
        options: &GdsElementOptions) -> STDRESULT {
        self.writer.write_empty_record(RecType::Node)?;
        self.write_element_options(options)?;
        self.writer.write_short_record(RecType::Layer,layer)?;
        self.writer.write_short_record(RecType::NodeType,nodetype)?;
        self.write_xy(points,MAX_NODE_POINTS)
    }
    fn begin_box(&mut self,layer: i16,boxtype: i16,points: &[GdsPoint],
        options: &GdsElementOptions) -> STDRESULT {
        self.writer.write_empty_record(RecType::Box)?;
        self.write_element_options(options)?;
        self.writer.write_short_record(RecType::Layer,layer)?;
        self.writer.write_short_record(RecType::BoxType,boxtype)?;
        self.write_xy(points,5)
    }
    fn begin_text(&mut self,layer: i16,texttype: i16,x: i32,y: i32,text: &str,
        strans: &Option<GdsTransform>,options: &GdsTextOptions) -> STDRESULT {
        self.writer.write_empty_record(RecType::Text)?;
        self.write_element_options(&options.element_options())?;
        self.writer.write_short_record(RecType::Layer,layer)?;
        self.writer.write_short_record(RecType::TextType,texttype)?;
        if let Some(presentation) = options.presentation {
            self.writer.write_bit_array_record(RecType::Presentation,presentation)?;
        }
        if let Some(pathtype) = options.pathtype {
            self.writer.write_short_record(RecType::PathType,pathtype as i16)?;
        }
        if let Some(width) = options.width {
            self.writer.write_int_record(RecType::Width,width)?;
        }
        self.write_strans(strans)?;
        self.write_xy(&[GdsPoint::new(x,y)],1)?;
        self.writer.write_string_record(RecType::String,text.as_bytes())
    }
    fn add_property(&mut self,attr: i16,value: &str) -> STDRESULT {
        self.writer.write_short_record(RecType::PropAttr,attr)?;
        self.writer.write_string_record(RecType::PropValue,value.as_bytes())
    }
    fn end_element(&mut self) -> STDRESULT {
        self.writer.write_empty_record(RecType::EndEl)
    }
}
