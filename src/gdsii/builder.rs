//! # GDSII builder interface
//!
//! `GdsParser` does not build a data structure.  As it recognizes each part
//! of the input it invokes the matching method of a `GdsBuilder`, so the
//! same parse can feed a printer, a statistics pass, or a creator for either
//! format.  All methods default to doing nothing; implement the ones you
//! care about.  Returning an error from any method unwinds the parse.
//!
//! The interface carries enough detail to reproduce a conforming input file
//! exactly, except that 8-byte reals lose their bottom three bits passing
//! through `f64`.
//!
//! `parse_file` invokes the methods in this order:
//!
//! ```text
//! gds_version begin_library
//!     { begin_structure
//!         { begin_<element> { add_property }* end_element }*
//!       end_structure }*
//! end_library
//! ```

use chrono::{Datelike,Timelike};
use crate::STDRESULT;
use super::GdsPoint;

/// Legal values of the PATHTYPE record.  The custom value is 4, not 3.
#[derive(Clone,Copy,PartialEq,Eq,Debug,Hash)]
pub enum GdsPathtype {
    /// square end flush with endpoint (default)
    Flush = 0,
    /// end is a semicircle centered at endpoint
    Round = 1,
    /// square end extending by half width
    Extend = 2,
    /// square ends with explicit BGNEXTN/ENDEXTN
    Custom = 4
}

impl GdsPathtype {
    /// Invalid path types decode as None; the parser downgrades them to
    /// `Flush` with a warning.
    pub fn from_short(val: i16) -> Option<Self> {
        match val {
            0 => Some(Self::Flush),
            1 => Some(Self::Round),
            2 => Some(Self::Extend),
            4 => Some(Self::Custom),
            _ => None
        }
    }
}

/// Timestamp in the form used by BGNLIB and BGNSTR.
#[derive(Clone,Copy,PartialEq,Eq,Debug,Default)]
pub struct GdsDate {
    pub year: i16,
    pub month: i16,
    pub day: i16,
    pub hour: i16,
    pub minute: i16,
    pub second: i16
}

impl GdsDate {
    /// The current local time, for creators whose source has no dates.
    pub fn now() -> Self {
        let t = chrono::Local::now();
        Self {
            year: t.year() as i16,
            month: t.month() as i16,
            day: t.day() as i16,
            hour: t.hour() as i16,
            minute: t.minute() as i16,
            second: t.second() as i16
        }
    }
}

/// Contents of the UNITS record.
#[derive(Clone,Copy,PartialEq,Debug)]
pub struct GdsUnits {
    /// size of database unit in user units
    pub db_to_user: f64,
    /// size of database unit in meters
    pub db_to_meter: f64
}

/// Contents of the FORMAT record.
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum GdsFormat {
    GdsiiArchive = 0,
    GdsiiFiltered = 1,
    EdsiiiArchive = 2,
    EdsiiiFiltered = 3
}

/// ACL entry in a LIBSECUR record.
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub struct GdsAclEntry {
    pub groupid: i16,
    pub userid: i16,
    pub rights: i16
}

/// The optional library header records.  A `None` means the record was
/// absent, so a builder can reproduce the input exactly.
#[derive(Clone,PartialEq,Debug,Default)]
pub struct GdsLibraryOptions {
    pub libdirsize: Option<i16>,
    pub srfname: Option<String>,
    pub acls: Option<Vec<GdsAclEntry>>,
    pub reflibs: Option<Vec<String>>,
    pub fonts: Option<Vec<String>>,
    pub attrtable: Option<String>,
    pub generations: Option<i16>,
    pub format: Option<GdsFormat>,
    pub masks: Vec<String>
}

/// The optional STRCLASS record of a structure.
#[derive(Clone,Copy,PartialEq,Debug,Default)]
pub struct GdsStructureOptions {
    pub strclass: Option<u16>
}

/// The optional ELFLAGS and PLEX records common to all elements.
#[derive(Clone,Copy,PartialEq,Eq,Hash,Debug,Default)]
pub struct GdsElementOptions {
    pub elflags: Option<u16>,
    pub plex: Option<i32>
}

/// Path-specific options on top of the common element options.
/// `pathtype` is `None` when the record was absent (reads as `Flush`).
#[derive(Clone,Copy,PartialEq,Eq,Hash,Debug,Default)]
pub struct GdsPathOptions {
    pub elflags: Option<u16>,
    pub plex: Option<i32>,
    pub pathtype: Option<GdsPathtype>,
    pub width: Option<i32>,
    pub bgnextn: Option<i32>,
    pub endextn: Option<i32>
}

impl GdsPathOptions {
    pub fn element_options(&self) -> GdsElementOptions {
        GdsElementOptions { elflags: self.elflags, plex: self.plex }
    }
}

/// Text-specific options: PRESENTATION, PATHTYPE, WIDTH.
#[derive(Clone,Copy,PartialEq,Eq,Hash,Debug,Default)]
pub struct GdsTextOptions {
    pub elflags: Option<u16>,
    pub plex: Option<i32>,
    pub presentation: Option<u16>,
    pub pathtype: Option<GdsPathtype>,
    pub width: Option<i32>
}

impl GdsTextOptions {
    pub fn element_options(&self) -> GdsElementOptions {
        GdsElementOptions { elflags: self.elflags, plex: self.plex }
    }
}

/// Contents of a STRANS record with its optional MAG and ANGLE.
/// An element with no STRANS record at all passes `None` for the whole
/// transform.
#[derive(Clone,Copy,PartialEq,Debug,Default)]
pub struct GdsTransform {
    /// reflect about the X axis before rotation
    pub reflect: bool,
    pub abs_mag: bool,
    pub abs_angle: bool,
    pub mag: Option<f64>,
    /// degrees counterclockwise
    pub angle: Option<f64>
}

/// Callbacks for `GdsParser`.  Every method has a no-op default.
#[allow(unused_variables)]
pub trait GdsBuilder {
    /// version from the HEADER record, e.g. 600 for release 6
    fn gds_version(&mut self,version: i16) -> STDRESULT {
        Ok(())
    }
    fn begin_library(&mut self,libname: &str,mod_time: &GdsDate,acc_time: &GdsDate,
        units: &GdsUnits,options: &GdsLibraryOptions) -> STDRESULT {
        Ok(())
    }
    fn end_library(&mut self) -> STDRESULT {
        Ok(())
    }
    fn begin_structure(&mut self,sname: &str,create_time: &GdsDate,mod_time: &GdsDate,
        options: &GdsStructureOptions) -> STDRESULT {
        Ok(())
    }
    fn end_structure(&mut self) -> STDRESULT {
        Ok(())
    }
    fn begin_boundary(&mut self,layer: i16,datatype: i16,points: &[GdsPoint],
        options: &GdsElementOptions) -> STDRESULT {
        Ok(())
    }
    fn begin_path(&mut self,layer: i16,datatype: i16,points: &[GdsPoint],
        options: &GdsPathOptions) -> STDRESULT {
        Ok(())
    }
    fn begin_sref(&mut self,sname: &str,x: i32,y: i32,strans: &Option<GdsTransform>,
        options: &GdsElementOptions) -> STDRESULT {
        Ok(())
    }
    /// `points` are the three AREF reference points: origin, the point
    /// displaced by `cols` column steps, and the point displaced by `rows`
    /// row steps.
    fn begin_aref(&mut self,sname: &str,cols: i16,rows: i16,points: &[GdsPoint;3],
        strans: &Option<GdsTransform>,options: &GdsElementOptions) -> STDRESULT {
        Ok(())
    }
    fn begin_node(&mut self,layer: i16,nodetype: i16,points: &[GdsPoint],
        options: &GdsElementOptions) -> STDRESULT {
        Ok(())
    }
    fn begin_box(&mut self,layer: i16,boxtype: i16,points: &[GdsPoint],
        options: &GdsElementOptions) -> STDRESULT {
        Ok(())
    }
    fn begin_text(&mut self,layer: i16,texttype: i16,x: i32,y: i32,text: &str,
        strans: &Option<GdsTransform>,options: &GdsTextOptions) -> STDRESULT {
        Ok(())
    }
    fn add_property(&mut self,attr: i16,value: &str) -> STDRESULT {
        Ok(())
    }
    fn end_element(&mut self) -> STDRESULT {
        Ok(())
    }
}
