//! # Repetitions and deltas
//!
//! A repetition describes N placements of the same element with one record.
//! The variants mirror the eleven encodings in the file plus the diagonal
//! and tilted-matrix forms, which the point grouper never emits but the
//! codec must still carry.
//!
//! The varying and arbitrary variants store each placement's offset from
//! the *first* placement, leading zero included; the file stores the
//! point-to-point differences, and the codec converts.

use std::ops::{Add,Sub};

/// A signed 2-D offset.  OASIS coordinates are wider than GDSII's, so the
/// components are 64-bit.
#[derive(Clone,Copy,PartialEq,Eq,Hash,Debug,Default)]
pub struct Delta {
    pub x: i64,
    pub y: i64
}

impl Delta {
    pub fn new(x: i64,y: i64) -> Self {
        Self { x, y }
    }
}

impl Add for Delta {
    type Output = Delta;
    fn add(self,other: Delta) -> Delta {
        Delta::new(self.x + other.x,self.y + other.y)
    }
}

impl Sub for Delta {
    type Output = Delta;
    fn sub(self,other: Delta) -> Delta {
        Delta::new(self.x - other.x,self.y - other.y)
    }
}

/// True if the difference `to - from` is representable.  Used to decide
/// which points can share a repetition; a point out of reach starts a
/// fresh one.
pub fn coord_in_reach(from: i64,to: i64) -> bool {
    to.checked_sub(from).is_some()
}

pub fn point_in_reach(from: &Delta,to: &Delta) -> bool {
    coord_in_reach(from.x,to.x) && coord_in_reach(from.y,to.y)
}

#[derive(Clone,PartialEq,Debug)]
pub enum Repetition {
    /// cols x rows array; spacings are non-negative
    Matrix { cols: u64, rows: u64, col_space: i64, row_space: i64 },
    /// evenly spaced horizontal line
    UniformX { dim: u64, space: i64 },
    /// evenly spaced vertical line
    UniformY { dim: u64, space: i64 },
    /// horizontal line, arbitrary ascending offsets from the first point
    VaryingX { offsets: Vec<i64> },
    GridVaryingX { grid: i64, offsets: Vec<i64> },
    VaryingY { offsets: Vec<i64> },
    GridVaryingY { grid: i64, offsets: Vec<i64> },
    /// scattered offsets from the first point, leading zero included
    Arbitrary { offsets: Vec<Delta> },
    GridArbitrary { grid: i64, offsets: Vec<Delta> },
    /// evenly spaced along one displacement
    Diagonal { dim: u64, delta: Delta },
    TiltedMatrix { ncount: u64, mcount: u64, ndelta: Delta, mdelta: Delta }
}

impl Repetition {
    /// Number of placements the repetition describes.
    pub fn dimension(&self) -> u64 {
        match self {
            Self::Matrix { cols, rows, .. } => cols * rows,
            Self::UniformX { dim, .. } => *dim,
            Self::UniformY { dim, .. } => *dim,
            Self::VaryingX { offsets } => offsets.len() as u64,
            Self::GridVaryingX { offsets, .. } => offsets.len() as u64,
            Self::VaryingY { offsets } => offsets.len() as u64,
            Self::GridVaryingY { offsets, .. } => offsets.len() as u64,
            Self::Arbitrary { offsets } => offsets.len() as u64,
            Self::GridArbitrary { offsets, .. } => offsets.len() as u64,
            Self::Diagonal { dim, .. } => *dim,
            Self::TiltedMatrix { ncount, mcount, .. } => ncount * mcount
        }
    }
    /// The placement offsets relative to the element position, leading
    /// zero included.  Matrix variants expand row-major from the bottom.
    pub fn points(&self) -> Vec<Delta> {
        let mut ans = Vec::new();
        match self {
            Self::Matrix { cols, rows, col_space, row_space } => {
                for r in 0..*rows {
                    for c in 0..*cols {
                        ans.push(Delta::new(c as i64 * col_space,r as i64 * row_space));
                    }
                }
            },
            Self::UniformX { dim, space } => {
                for i in 0..*dim {
                    ans.push(Delta::new(i as i64 * space,0));
                }
            },
            Self::UniformY { dim, space } => {
                for i in 0..*dim {
                    ans.push(Delta::new(0,i as i64 * space));
                }
            },
            Self::VaryingX { offsets } => {
                for dx in offsets {
                    ans.push(Delta::new(*dx,0));
                }
            },
            Self::GridVaryingX { grid, offsets } => {
                for dx in offsets {
                    ans.push(Delta::new(*dx * grid,0));
                }
            },
            Self::VaryingY { offsets } => {
                for dy in offsets {
                    ans.push(Delta::new(0,*dy));
                }
            },
            Self::GridVaryingY { grid, offsets } => {
                for dy in offsets {
                    ans.push(Delta::new(0,*dy * grid));
                }
            },
            Self::Arbitrary { offsets } => ans = offsets.clone(),
            Self::GridArbitrary { grid, offsets } => {
                for d in offsets {
                    ans.push(Delta::new(d.x * grid,d.y * grid));
                }
            },
            Self::Diagonal { dim, delta } => {
                for i in 0..*dim {
                    ans.push(Delta::new(i as i64 * delta.x,i as i64 * delta.y));
                }
            },
            Self::TiltedMatrix { ncount, mcount, ndelta, mdelta } => {
                for m in 0..*mcount {
                    for n in 0..*ncount {
                        ans.push(Delta::new(n as i64 * ndelta.x + m as i64 * mdelta.x,
                            n as i64 * ndelta.y + m as i64 * mdelta.y));
                    }
                }
            }
        }
        ans
    }
}

impl Repetition {
    /// Bytes this repetition occupies on file, for weighing alternatives.
    pub fn encoded_size(&self) -> usize {
        use super::writer::{unsigned_size,g_delta_size};
        let varying = |offsets: &[i64]| -> usize {
            let mut n = unsigned_size(offsets.len() as u64 - 2);
            for i in 1..offsets.len() {
                n += unsigned_size((offsets[i] - offsets[i-1]) as u64);
            }
            n
        };
        let arbitrary = |offsets: &[Delta]| -> usize {
            let mut n = unsigned_size(offsets.len() as u64 - 2);
            for i in 1..offsets.len() {
                n += g_delta_size(offsets[i] - offsets[i-1]);
            }
            n
        };
        1 + match self {
            Self::Matrix { cols, rows, col_space, row_space } =>
                unsigned_size(cols - 2) + unsigned_size(rows - 2)
                + unsigned_size(*col_space as u64) + unsigned_size(*row_space as u64),
            Self::UniformX { dim, space } | Self::UniformY { dim, space } =>
                unsigned_size(dim - 2) + unsigned_size(*space as u64),
            Self::VaryingX { offsets } | Self::VaryingY { offsets } => varying(offsets),
            Self::GridVaryingX { grid, offsets } | Self::GridVaryingY { grid, offsets } =>
                unsigned_size(*grid as u64) + varying(offsets),
            Self::Arbitrary { offsets } => arbitrary(offsets),
            Self::GridArbitrary { grid, offsets } =>
                unsigned_size(*grid as u64) + arbitrary(offsets),
            Self::Diagonal { dim, delta } => unsigned_size(dim - 2) + g_delta_size(*delta),
            Self::TiltedMatrix { ncount, mcount, ndelta, mdelta } =>
                unsigned_size(ncount - 2) + unsigned_size(mcount - 2)
                + g_delta_size(*ndelta) + g_delta_size(*mdelta)
        }
    }
}

/// Gridded varying and arbitrary variants store offsets already divided by
/// the grid; these constructors do the division, panicking on misaligned
/// input, which the grouper's GCD computation rules out.
impl Repetition {
    pub fn make_grid_varying_x(grid: i64,offsets: &[i64]) -> Self {
        Self::GridVaryingX { grid, offsets: offsets.iter().map(|v| {
            debug_assert!(v % grid==0);
            v / grid
        }).collect() }
    }
    pub fn make_grid_varying_y(grid: i64,offsets: &[i64]) -> Self {
        Self::GridVaryingY { grid, offsets: offsets.iter().map(|v| {
            debug_assert!(v % grid==0);
            v / grid
        }).collect() }
    }
    pub fn make_grid_arbitrary(grid: i64,offsets: &[Delta]) -> Self {
        Self::GridArbitrary { grid, offsets: offsets.iter().map(|d| {
            debug_assert!(d.x % grid==0 && d.y % grid==0);
            Delta::new(d.x / grid,d.y / grid)
        }).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn reach() {
        assert!(coord_in_reach(0,i64::MAX));
        assert!(!coord_in_reach(-1,i64::MAX));
        assert!(!coord_in_reach(i64::MIN,1));
        assert!(coord_in_reach(i64::MIN,-2));
    }
    #[test]
    fn matrix_points() {
        let rep = Repetition::Matrix { cols: 3, rows: 2, col_space: 10, row_space: 20 };
        assert_eq!(rep.dimension(),6);
        let pts = rep.points();
        assert_eq!(pts[0],Delta::new(0,0));
        assert_eq!(pts[2],Delta::new(20,0));
        assert_eq!(pts[3],Delta::new(0,20));
        assert_eq!(pts[5],Delta::new(20,20));
    }
    #[test]
    fn gridded() {
        let rep = Repetition::make_grid_arbitrary(5,&[Delta::new(0,0),Delta::new(10,15)]);
        assert_eq!(rep.points(),vec![Delta::new(0,0),Delta::new(10,15)]);
        match rep {
            Repetition::GridArbitrary { grid, offsets } => {
                assert_eq!(grid,5);
                assert_eq!(offsets[1],Delta::new(2,3));
            },
            _ => panic!("wrong variant")
        }
    }
}
