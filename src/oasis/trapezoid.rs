//! # Trapezoids
//!
//! A trapezoid is a quadrilateral with two opposite sides parallel to an
//! axis.  It is stored as an orientation, the bounding-box width and
//! height, and two signed deltas: for horizontal trapezoids `delta_a` is
//! `NW.x - SW.x` and `delta_b` is `NE.x - SE.x`; for vertical trapezoids
//! `delta_a` is `SW.y - SE.y` and `delta_b` is `NW.y - NE.y`.
//!
//! Twenty-six common shapes have compressed forms whose deltas, and often
//! one dimension, are fixed functions of the width and/or height; those are
//! written as CTRAPEZOID records.

use crate::DYNERR;
use super::rep::Delta;
use super::{checked_minus,checked_plus,Error};

#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum Orientation {
    /// two sides parallel to the X axis
    Horizontal,
    /// two sides parallel to the Y axis
    Vertical
}

/// How a compressed type derives a value from width and height.
#[derive(Clone,Copy,PartialEq)]
enum CTrapFunc {
    Z,
    W,
    H,
    W2,
    H2,
    MW,
    MH
}

use CTrapFunc::*;

struct CTrapInfo {
    orient: Orientation,
    width: CTrapFunc,
    height: CTrapFunc,
    delta_a: CTrapFunc,
    delta_b: CTrapFunc
}

// Row numbers match the ctrapezoid types in the spec; 16-23 are triangles,
// 24 is a rectangle, 25 a square.  When the width column is not W the
// width comes from the height, and symmetrically for the height.
const CTRAP_INFO: [CTrapInfo;26] = [
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: H,  delta_a: Z,  delta_b: MH },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: H,  delta_a: Z,  delta_b: H  },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: H,  delta_a: H,  delta_b: Z  },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: H,  delta_a: MH, delta_b: Z  },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: H,  delta_a: H,  delta_b: MH },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: H,  delta_a: MH, delta_b: H  },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: H,  delta_a: H,  delta_b: H  },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: H,  delta_a: MH, delta_b: MH },
    CTrapInfo { orient: Orientation::Vertical,   width: W,  height: H,  delta_a: Z,  delta_b: W  },
    CTrapInfo { orient: Orientation::Vertical,   width: W,  height: H,  delta_a: Z,  delta_b: MW },
    CTrapInfo { orient: Orientation::Vertical,   width: W,  height: H,  delta_a: MW, delta_b: Z  },
    CTrapInfo { orient: Orientation::Vertical,   width: W,  height: H,  delta_a: W,  delta_b: Z  },
    CTrapInfo { orient: Orientation::Vertical,   width: W,  height: H,  delta_a: MW, delta_b: W  },
    CTrapInfo { orient: Orientation::Vertical,   width: W,  height: H,  delta_a: W,  delta_b: MW },
    CTrapInfo { orient: Orientation::Vertical,   width: W,  height: H,  delta_a: MW, delta_b: MW },
    CTrapInfo { orient: Orientation::Vertical,   width: W,  height: H,  delta_a: W,  delta_b: W  },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: W,  delta_a: Z,  delta_b: MW },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: W,  delta_a: Z,  delta_b: W  },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: W,  delta_a: W,  delta_b: Z  },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: W,  delta_a: MW, delta_b: Z  },
    CTrapInfo { orient: Orientation::Horizontal, width: H2, height: H,  delta_a: H,  delta_b: MH },
    CTrapInfo { orient: Orientation::Horizontal, width: H2, height: H,  delta_a: MH, delta_b: H  },
    CTrapInfo { orient: Orientation::Vertical,   width: W,  height: W2, delta_a: MW, delta_b: W  },
    CTrapInfo { orient: Orientation::Vertical,   width: W,  height: W2, delta_a: W,  delta_b: MW },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: H,  delta_a: Z,  delta_b: Z  },
    CTrapInfo { orient: Orientation::Horizontal, width: W,  height: W,  delta_a: Z,  delta_b: Z  }
];

fn eval_ctrap_func(func: CTrapFunc,width: i64,height: i64) -> Result<i64,DYNERR> {
    match func {
        Z => Ok(0),
        W => Ok(width),
        H => Ok(height),
        W2 => checked_plus(width,width),
        H2 => checked_plus(height,height),
        MW => Ok(-width),
        MH => Ok(-height)
    }
}

#[derive(Clone,Copy,PartialEq,Debug)]
pub struct Trapezoid {
    orient: Orientation,
    /// compressed type 0..=25, or None for the general form
    ctrap_type: Option<u64>,
    width: i64,
    height: i64,
    delta_a: i64,
    delta_b: i64
}

impl Trapezoid {
    /// General trapezoid.  Fails if the slanted edges cross, i.e. if
    /// either delta or their difference exceeds the span.
    pub fn new(orient: Orientation,width: i64,height: i64,delta_a: i64,delta_b: i64) -> Result<Self,DYNERR> {
        let ans = Self { orient, ctrap_type: None, width, height, delta_a, delta_b };
        ans.verify()?;
        Ok(ans)
    }
    /// Compressed trapezoid.  Depending on the type only one of width and
    /// height may be meaningful; the other is derived.
    pub fn new_compressed(ctrap_type: u64,width: i64,height: i64) -> Result<Self,DYNERR> {
        debug_assert!(ctrap_type <= 25);
        let info = &CTRAP_INFO[ctrap_type as usize];
        let width = eval_ctrap_func(info.width,width,height)?;
        let height = eval_ctrap_func(info.height,width,height)?;
        let ans = Self {
            orient: info.orient,
            ctrap_type: Some(ctrap_type),
            width,
            height,
            delta_a: eval_ctrap_func(info.delta_a,width,height)?,
            delta_b: eval_ctrap_func(info.delta_b,width,height)?
        };
        ans.verify()?;
        Ok(ans)
    }
    fn verify(&self) -> Result<(),DYNERR> {
        let span = match self.orient {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height
        };
        if checked_minus(self.delta_a,self.delta_b)?.abs() > span
            || self.delta_a.abs() > span
            || self.delta_b.abs() > span {
            return Err(Box::new(Error::BadTrapezoid(self.delta_a,self.delta_b,span)));
        }
        Ok(())
    }
    pub fn ctrapezoid_type_is_valid(t: u64) -> bool {
        t <= 25
    }
    /// For each compressed type, whether the record carries the width,
    /// the height, or both.
    pub fn needs_width(ctrap_type: u64) -> bool {
        CTRAP_INFO[ctrap_type as usize].width==W
    }
    pub fn needs_height(ctrap_type: u64) -> bool {
        CTRAP_INFO[ctrap_type as usize].height==H
    }
    pub fn orientation(&self) -> Orientation {
        self.orient
    }
    pub fn compress_type(&self) -> Option<u64> {
        self.ctrap_type
    }
    pub fn width(&self) -> i64 {
        self.width
    }
    pub fn height(&self) -> i64 {
        self.height
    }
    pub fn delta_a(&self) -> i64 {
        self.delta_a
    }
    pub fn delta_b(&self) -> i64 {
        self.delta_b
    }
    /// Find a compressed type matching this trapezoid, if any.  Later rows
    /// are preferred since they encode more compactly.  Shapes that read as
    /// vertical but match a horizontal-only row (squares, rectangles, and
    /// the axis triangles) need the special cases up front.
    pub fn try_compress(&mut self) -> bool {
        if self.ctrap_type.is_some() {
            return true;
        }
        if self.orient==Orientation::Vertical {
            if self.width==self.height
                && ((self.delta_a==0 && self.delta_b.abs()==self.width)
                    || (self.delta_b==0 && self.delta_a.abs()==self.width)) {
                self.ctrap_type = Some(match (self.delta_a,self.delta_b) {
                    (a,_) if a > 0 => 19,
                    (a,_) if a < 0 => 17,
                    (_,b) if b > 0 => 16,
                    (_,b) if b < 0 => 18,
                    _ => 25
                });
                return true;
            }
            if self.delta_a==0 && self.delta_b==0 {
                self.ctrap_type = Some(24);
                return true;
            }
        }
        for row in (0..CTRAP_INFO.len()).rev() {
            let info = &CTRAP_INFO[row];
            let matches = info.orient==self.orient
                && matches!(eval_ctrap_func(info.delta_a,self.width,self.height),Ok(v) if v==self.delta_a)
                && matches!(eval_ctrap_func(info.delta_b,self.width,self.height),Ok(v) if v==self.delta_b)
                && (info.width==W
                    || matches!(eval_ctrap_func(info.width,self.width,self.height),Ok(v) if v==self.width))
                && (info.height==H
                    || matches!(eval_ctrap_func(info.height,self.width,self.height),Ok(v) if v==self.height));
            if matches {
                self.ctrap_type = Some(row as u64);
                return true;
            }
        }
        false
    }
    /// The four vertices in positive order SW, SE, NE, NW, placed so the
    /// bounding box is (0,0) to (width,height).  Degenerate shapes repeat
    /// vertices.
    pub fn vertices(&self) -> [Delta;4] {
        let mut pt = [Delta::default();4];
        if self.orient==Orientation::Horizontal {
            pt[0].y = 0;
            pt[1].y = 0;
            pt[2].y = self.height;
            pt[3].y = self.height;
            if self.delta_a >= 0 {
                pt[0].x = 0;
                pt[3].x = self.delta_a;
            } else {
                pt[0].x = -self.delta_a;
                pt[3].x = 0;
            }
            if self.delta_b >= 0 {
                pt[1].x = self.width - self.delta_b;
                pt[2].x = self.width;
            } else {
                pt[1].x = self.width;
                pt[2].x = self.width + self.delta_b;
            }
        } else {
            pt[0].x = 0;
            pt[3].x = 0;
            pt[1].x = self.width;
            pt[2].x = self.width;
            if self.delta_a >= 0 {
                pt[0].y = self.delta_a;
                pt[1].y = 0;
            } else {
                pt[0].y = 0;
                pt[1].y = -self.delta_a;
            }
            if self.delta_b >= 0 {
                pt[2].y = self.height - self.delta_b;
                pt[3].y = self.height;
            } else {
                pt[2].y = self.height;
                pt[3].y = self.height + self.delta_b;
            }
        }
        pt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn crossing_edges_rejected() {
        // delta_a - delta_b exceeds the span
        assert!(Trapezoid::new(Orientation::Horizontal,10,5,8,-8).is_err());
        assert!(Trapezoid::new(Orientation::Horizontal,10,5,11,0).is_err());
        assert!(Trapezoid::new(Orientation::Vertical,5,10,0,-11).is_err());
        assert!(Trapezoid::new(Orientation::Horizontal,10,5,5,-5).is_ok());
    }
    #[test]
    fn rectangle_compresses() {
        let mut t = Trapezoid::new(Orientation::Horizontal,10,5,0,0).expect("bad trapezoid");
        assert!(t.try_compress());
        assert_eq!(t.compress_type(),Some(24));
        let mut sq = Trapezoid::new(Orientation::Horizontal,5,5,0,0).expect("bad trapezoid");
        assert!(sq.try_compress());
        assert_eq!(sq.compress_type(),Some(25));
        let mut vsq = Trapezoid::new(Orientation::Vertical,5,5,0,0).expect("bad trapezoid");
        assert!(vsq.try_compress());
        assert_eq!(vsq.compress_type(),Some(24));
    }
    #[test]
    fn type_20_derives_width() {
        // width = 2*height for type 20
        let t = Trapezoid::new_compressed(20,0,6).expect("bad trapezoid");
        assert_eq!(t.width(),12);
        assert_eq!(t.delta_a(),6);
        assert_eq!(t.delta_b(),-6);
        assert!(!Trapezoid::needs_width(20));
        assert!(Trapezoid::needs_height(20));
    }
    #[test]
    fn vertices_of_slanted() {
        let t = Trapezoid::new(Orientation::Horizontal,10,4,2,3).expect("bad trapezoid");
        let v = t.vertices();
        assert_eq!(v[0],Delta::new(0,0));
        assert_eq!(v[1],Delta::new(7,0));
        assert_eq!(v[2],Delta::new(10,4));
        assert_eq!(v[3],Delta::new(2,4));
    }
    #[test]
    fn triangle_vertices() {
        let t = Trapezoid::new_compressed(16,8,0).expect("bad trapezoid");
        // delta_a = 0, delta_b = -8: SW (0,0), SE (8,0), NE (0,8) NW (0,8)
        let v = t.vertices();
        assert_eq!(v[0],Delta::new(0,0));
        assert_eq!(v[1],Delta::new(8,0));
        assert_eq!(v[2],Delta::new(0,8));
        assert_eq!(v[3],Delta::new(0,8));
    }
}
