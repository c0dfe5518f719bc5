//! # Modal variables
//!
//! A record that omits a field inherits the value from the matching modal
//! variable.  Each slot is unset, set, or defaulted: the reset that runs at
//! every cell start (and at the START record) defaults the coordinate slots
//! to zero and the transform slots to the identity, and clears everything
//! else.  Referring to an unset slot is a format error that names the slot.

use std::rc::Rc;
use super::names::{OasisName,Property,PropValue};
use super::oreal::Oreal;
use super::rep::{Delta,Repetition};

pub struct ModalVars {
    pub repetition: Option<Repetition>,
    pub placement_cell: Option<Rc<OasisName>>,
    pub placement_x: i64,
    pub placement_y: i64,
    /// magnification inherited by PLACEMENT records that omit it
    pub placement_mag: Oreal,
    pub placement_angle: Oreal,
    pub layer: Option<u64>,
    pub datatype: Option<u64>,
    pub textlayer: Option<u64>,
    pub texttype: Option<u64>,
    pub text_string: Option<Rc<OasisName>>,
    pub text_x: i64,
    pub text_y: i64,
    pub geometry_x: i64,
    pub geometry_y: i64,
    pub geometry_w: Option<i64>,
    pub geometry_h: Option<i64>,
    /// true after an XYRELATIVE record
    pub xy_relative: bool,
    pub polygon_points: Option<Vec<Delta>>,
    pub path_points: Option<Vec<Delta>>,
    pub path_halfwidth: Option<i64>,
    pub path_start_extn: Option<i64>,
    pub path_end_extn: Option<i64>,
    pub ctrapezoid_type: Option<u64>,
    pub circle_radius: Option<i64>,
    pub last_prop_name: Option<Rc<OasisName>>,
    pub last_value_list: Option<Vec<PropValue>>,
    pub last_value_standard: bool
}

impl ModalVars {
    pub fn new() -> Self {
        Self {
            repetition: None,
            placement_cell: None,
            placement_x: 0,
            placement_y: 0,
            placement_mag: Oreal::Integer(1),
            placement_angle: Oreal::Integer(0),
            layer: None,
            datatype: None,
            textlayer: None,
            texttype: None,
            text_string: None,
            text_x: 0,
            text_y: 0,
            geometry_x: 0,
            geometry_y: 0,
            geometry_w: None,
            geometry_h: None,
            xy_relative: false,
            polygon_points: None,
            path_points: None,
            path_halfwidth: None,
            path_start_extn: None,
            path_end_extn: None,
            ctrapezoid_type: None,
            circle_radius: None,
            last_prop_name: None,
            last_value_list: None,
            last_value_standard: false
        }
    }
    /// The implicit reset at a cell boundary.  Coordinates default to 0,
    /// the xy mode to absolute, the placement transform to identity;
    /// every other slot becomes unset.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
    /// Build a property from the modal name and value slots, as the
    /// PROPERTY repeat record does.
    pub fn last_property(&self) -> Result<Property,String> {
        let name = require(&self.last_prop_name,"last-property-name")?.clone();
        let values = require(&self.last_value_list,"last-value-list")?.clone();
        Ok(Property { name, values, is_standard: self.last_value_standard })
    }
}

/// Fetch a modal slot, failing with the slot's name if it was never set.
pub fn require<'a,T>(slot: &'a Option<T>,name: &'static str) -> Result<&'a T,String> {
    match slot {
        Some(v) => Ok(v),
        None => Err(format!("modal variable '{}' referenced before being set",name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn unset_reference() {
        let modal = ModalVars::new();
        let err = require(&modal.layer,"layer").err().expect("should fail");
        assert!(err.contains("'layer'"));
        assert!(err.contains("before being set"));
    }
    #[test]
    fn reset_defaults() {
        let mut modal = ModalVars::new();
        modal.layer = Some(5);
        modal.geometry_x = 100;
        modal.xy_relative = true;
        modal.reset();
        assert!(modal.layer.is_none());
        assert_eq!(modal.geometry_x,0);
        assert!(!modal.xy_relative);
        assert_eq!(modal.placement_mag.to_f64(),1.0);
    }
}
