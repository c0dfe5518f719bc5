//! # OASIS scanner
//!
//! The lexical layer: variable-length integers, deltas, strings, and reals,
//! pulled from a buffered file or from an in-memory slice.  CBLOCK records
//! inflate into a side buffer that is drained before the file resumes, so
//! the record layer never notices compression.
//!
//! All integers are little-endian base-128 with the high bit of each byte
//! as a continuation flag; signed variants keep the sign in the low bit of
//! the first byte.

use flate2::{Decompress,FlushDecompress};
use crate::fio::{FileHandle,FileType};
use crate::DYNERR;
use super::oreal::*;
use super::rep::Delta;
use super::Error;

const BUFFER_SIZE: usize = 128*1024;

enum Source {
    File(FileHandle),
    Memory
}

/// An inflated CBLOCK being drained.
struct Cblock {
    data: Vec<u8>,
    pos: usize,
    /// file offset of the CBLOCK record, used for error context
    offset: u64
}

pub struct OasisScanner {
    buf: Vec<u8>,
    lo: usize,
    hi: usize,
    file_offset: u64,
    source: Source,
    filename: String,
    cblock: Option<Cblock>
}

impl OasisScanner {
    pub fn open(fname: &str,ftype: FileType) -> Result<Self,DYNERR> {
        let fh = FileHandle::open_read(fname,ftype)?;
        Ok(Self {
            buf: vec![0;BUFFER_SIZE],
            lo: 0,
            hi: 0,
            file_offset: 0,
            source: Source::File(fh),
            filename: fname.to_string(),
            cblock: None
        })
    }
    /// Scan over a byte slice, e.g. the END record tail.  Offsets are
    /// reported relative to `base_offset`.
    pub fn from_bytes(data: Vec<u8>,name: &str,base_offset: u64) -> Self {
        let hi = data.len();
        Self {
            buf: data,
            lo: 0,
            hi,
            file_offset: base_offset,
            source: Source::Memory,
            filename: name.to_string(),
            cblock: None
        }
    }
    pub fn filename(&self) -> &str {
        &self.filename
    }
    /// Offset of the next byte.  Inside a CBLOCK this reports the offset
    /// of the CBLOCK record itself.
    pub fn curr_offset(&self) -> u64 {
        match &self.cblock {
            Some(cb) => cb.offset,
            None => self.file_offset + self.lo as u64
        }
    }
    pub fn abort(&self,msg: String) -> DYNERR {
        Box::new(Error::Format(self.filename.clone(),self.curr_offset(),msg))
    }
    /// True when an in-progress CBLOCK still has bytes.
    pub fn in_cblock(&self) -> bool {
        self.cblock.is_some()
    }
    fn fill_buffer(&mut self) -> Result<usize,DYNERR> {
        let nbytes = self.hi - self.lo;
        self.buf.copy_within(self.lo..self.hi,0);
        self.file_offset += self.lo as u64;
        self.lo = 0;
        self.hi = nbytes;
        match &mut self.source {
            Source::File(fh) => {
                while self.hi < BUFFER_SIZE {
                    let n = fh.read(&mut self.buf[self.hi..BUFFER_SIZE])?;
                    if n==0 {
                        break;
                    }
                    self.hi += n;
                }
            },
            Source::Memory => {}
        }
        Ok(self.hi - self.lo)
    }
    pub fn read_byte(&mut self) -> Result<u8,DYNERR> {
        if let Some(cb) = &mut self.cblock {
            let b = cb.data[cb.pos];
            cb.pos += 1;
            if cb.pos==cb.data.len() {
                self.cblock = None;
            }
            return Ok(b);
        }
        if self.lo==self.hi && self.fill_buffer()? == 0 {
            return Err(self.abort("unexpected EOF".to_string()));
        }
        let b = self.buf[self.lo];
        self.lo += 1;
        Ok(b)
    }
    pub fn read_bytes(&mut self,count: usize) -> Result<Vec<u8>,DYNERR> {
        let mut ans = Vec::with_capacity(count);
        if let Some(cb) = &mut self.cblock {
            let take = std::cmp::min(count,cb.data.len() - cb.pos);
            ans.extend_from_slice(&cb.data[cb.pos..cb.pos+take]);
            cb.pos += take;
            if cb.pos==cb.data.len() {
                self.cblock = None;
            }
            if ans.len() < count {
                return Err(self.abort("CBLOCK ended inside a field".to_string()));
            }
            return Ok(ans);
        }
        while ans.len() < count {
            if self.lo==self.hi && self.fill_buffer()? == 0 {
                return Err(self.abort("unexpected EOF".to_string()));
            }
            let take = std::cmp::min(count - ans.len(),self.hi - self.lo);
            ans.extend_from_slice(&self.buf[self.lo..self.lo+take]);
            self.lo += take;
        }
        Ok(ans)
    }
    /// Unsigned integer, 7 bits per byte, high bit is the continuation.
    pub fn read_unsigned(&mut self) -> Result<u64,DYNERR> {
        let mut ans: u64 = 0;
        let mut shift = 0;
        loop {
            let b = self.read_byte()?;
            let bits = (b & 0x7f) as u64;
            if shift >= 64 || (shift > 0 && bits >> (64 - shift) != 0) {
                return Err(self.abort("unsigned integer is too long".to_string()));
            }
            ans |= bits << shift;
            if b & 0x80 == 0 {
                return Ok(ans);
            }
            shift += 7;
        }
    }
    /// Signed integer: the low bit of the first byte is the sign.
    pub fn read_signed(&mut self) -> Result<i64,DYNERR> {
        let raw = self.read_unsigned()?;
        let negative = raw & 1 != 0;
        let magnitude = raw >> 1;
        match negative {
            true => match magnitude <= i64::MAX as u64 {
                // the format can say -0, the value cannot
                true => Ok(-(magnitude as i64)),
                false => Err(self.abort("signed integer is out of range".to_string()))
            },
            false => match magnitude <= i64::MAX as u64 {
                true => Ok(magnitude as i64),
                false => Err(self.abort("signed integer is out of range".to_string()))
            }
        }
    }
    /// String: unsigned length then raw bytes.
    pub fn read_string(&mut self) -> Result<Vec<u8>,DYNERR> {
        let len = self.read_unsigned()?;
        if len > (1u64 << 32) {
            return Err(self.abort(format!("string length {} is absurd",len)));
        }
        self.read_bytes(len as usize)
    }
    pub fn read_real(&mut self) -> Result<Oreal,DYNERR> {
        let rtype = self.read_unsigned()?;
        self.read_real_body(rtype)
    }
    /// Real with the tag already consumed, as in property value lists.
    pub fn read_real_body(&mut self,rtype: u64) -> Result<Oreal,DYNERR> {
        let unsigned_term = |scanner: &mut Self| -> Result<i64,DYNERR> {
            let v = scanner.read_unsigned()?;
            match v <= i64::MAX as u64 {
                true => Ok(v as i64),
                false => Err(scanner.abort("real term is out of range".to_string()))
            }
        };
        match rtype {
            REAL_POS_INT => Ok(Oreal::Integer(unsigned_term(self)?)),
            REAL_NEG_INT => Ok(Oreal::Integer(-unsigned_term(self)?)),
            REAL_POS_RECIP => Ok(Oreal::Reciprocal(unsigned_term(self)?)),
            REAL_NEG_RECIP => Ok(Oreal::Reciprocal(-unsigned_term(self)?)),
            REAL_POS_RATIO => {
                let n = unsigned_term(self)?;
                let d = unsigned_term(self)?;
                Ok(Oreal::Ratio(n,d))
            },
            REAL_NEG_RATIO => {
                let n = unsigned_term(self)?;
                let d = unsigned_term(self)?;
                Ok(Oreal::Ratio(-n,d))
            },
            REAL_F32 => {
                let bytes = self.read_bytes(4)?;
                Ok(Oreal::Float32(f32::from_le_bytes([bytes[0],bytes[1],bytes[2],bytes[3]])))
            },
            REAL_F64 => {
                let bytes = self.read_bytes(8)?;
                Ok(Oreal::Float64(f64::from_le_bytes([bytes[0],bytes[1],bytes[2],
                    bytes[3],bytes[4],bytes[5],bytes[6],bytes[7]])))
            },
            bad => Err(self.abort(format!("invalid real type {}",bad)))
        }
    }
    fn magnitude(&self,raw: u64,shift: u32) -> Result<i64,DYNERR> {
        let mag = raw >> shift;
        match mag <= i64::MAX as u64 {
            true => Ok(mag as i64),
            false => Err(self.abort("delta magnitude is out of range".to_string()))
        }
    }
    /// 1-delta: a signed integer along an axis the record implies.
    pub fn read_one_delta(&mut self) -> Result<i64,DYNERR> {
        self.read_signed()
    }
    /// 2-delta: two direction bits (E,N,W,S) and a magnitude.
    pub fn read_two_delta(&mut self) -> Result<Delta,DYNERR> {
        let raw = self.read_unsigned()?;
        let mag = self.magnitude(raw,2)?;
        Ok(match raw & 3 {
            0 => Delta::new(mag,0),
            1 => Delta::new(0,mag),
            2 => Delta::new(-mag,0),
            _ => Delta::new(0,-mag)
        })
    }
    /// 3-delta: three direction bits (the four axes then NE,NW,SW,SE).
    pub fn read_three_delta(&mut self) -> Result<Delta,DYNERR> {
        let raw = self.read_unsigned()?;
        let mag = self.magnitude(raw,3)?;
        Ok(octant_delta(raw & 7,mag))
    }
    /// g-delta: either a one-word octant form (low bit clear) or a
    /// two-word form holding both coordinates.
    pub fn read_g_delta(&mut self) -> Result<Delta,DYNERR> {
        let raw = self.read_unsigned()?;
        if raw & 1 == 0 {
            let mag = self.magnitude(raw,4)?;
            return Ok(octant_delta((raw >> 1) & 7,mag));
        }
        let x_mag = self.magnitude(raw,2)?;
        let x = match raw & 2 != 0 {
            true => -x_mag,
            false => x_mag
        };
        let y = self.read_signed()?;
        Ok(Delta::new(x,y))
    }
    /// Handle a CBLOCK record body: inflate it and serve subsequent bytes
    /// from the inflated buffer.  The record id has been consumed.
    pub fn enter_cblock(&mut self) -> Result<(),DYNERR> {
        let offset = self.curr_offset();
        if self.in_cblock() {
            return Err(self.abort("CBLOCK inside CBLOCK".to_string()));
        }
        let comp_type = self.read_unsigned()?;
        if comp_type != 0 {
            return Err(self.abort(format!("unknown CBLOCK compression type {}",comp_type)));
        }
        let uncomp_count = self.read_unsigned()? as usize;
        let comp_count = self.read_unsigned()? as usize;
        let comp = self.read_bytes(comp_count)?;
        let mut data = Vec::with_capacity(uncomp_count);
        // raw DEFLATE, no zlib header
        let mut inflater = Decompress::new(false);
        inflater.decompress_vec(&comp,&mut data,FlushDecompress::Finish)
            .map_err(|e| self.abort(format!("CBLOCK inflate failed: {}",e)))?;
        if data.len() != uncomp_count {
            return Err(self.abort(format!("CBLOCK inflated to {} bytes, expected {}",
                data.len(),uncomp_count)));
        }
        if data.len() > 0 {
            self.cblock = Some(Cblock { data, pos: 0, offset });
        }
        Ok(())
    }
    /// Restart scanning at an absolute offset.  Drops any CBLOCK in
    /// progress; an offset inside the current buffer just moves the cursor.
    pub fn seek_to(&mut self,offset: u64) -> Result<(),DYNERR> {
        self.cblock = None;
        if offset >= self.file_offset && offset <= self.file_offset + self.hi as u64 {
            self.lo = (offset - self.file_offset) as usize;
            return Ok(());
        }
        match &mut self.source {
            Source::File(fh) => {
                fh.seek(offset)?;
                self.lo = 0;
                self.hi = 0;
                self.file_offset = offset;
                Ok(())
            },
            Source::Memory => Err(self.abort(format!("seek to {} is outside the buffer",offset)))
        }
    }
    /// True at end of input; only meaningful for file sources outside a
    /// CBLOCK.
    pub fn at_eof(&mut self) -> Result<bool,DYNERR> {
        if self.cblock.is_some() {
            return Ok(false);
        }
        if self.lo < self.hi {
            return Ok(false);
        }
        Ok(self.fill_buffer()? == 0)
    }
}

fn octant_delta(dir: u64,mag: i64) -> Delta {
    match dir {
        0 => Delta::new(mag,0),
        1 => Delta::new(0,mag),
        2 => Delta::new(-mag,0),
        3 => Delta::new(0,-mag),
        4 => Delta::new(mag,mag),
        5 => Delta::new(-mag,mag),
        6 => Delta::new(-mag,-mag),
        _ => Delta::new(mag,-mag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn mem(bytes: &[u8]) -> OasisScanner {
        OasisScanner::from_bytes(bytes.to_vec(),"test",0)
    }
    #[test]
    fn unsigned() {
        let mut s = mem(&[0x00, 0x7f, 0x80,0x01, 0xff,0xff,0x03]);
        assert_eq!(s.read_unsigned().unwrap(),0);
        assert_eq!(s.read_unsigned().unwrap(),127);
        assert_eq!(s.read_unsigned().unwrap(),128);
        assert_eq!(s.read_unsigned().unwrap(),0xffff);
    }
    #[test]
    fn overlong_unsigned() {
        let mut s = mem(&[0x80,0x80,0x80,0x80,0x80,0x80,0x80,0x80,0x80,0x80,0x01]);
        assert!(s.read_unsigned().is_err());
    }
    #[test]
    fn signed() {
        let mut s = mem(&[0x00, 0x02, 0x03, 0x06,0x01]);
        assert_eq!(s.read_signed().unwrap(),0);
        assert_eq!(s.read_signed().unwrap(),1);
        assert_eq!(s.read_signed().unwrap(),-1);
        assert_eq!(s.read_signed().unwrap(),-67);
    }
    #[test]
    fn deltas() {
        // 2-delta: mag 5 west = 5<<2 | 2
        let mut s = mem(&[0x16]);
        assert_eq!(s.read_two_delta().unwrap(),Delta::new(-5,0));
        // 3-delta: mag 3 northwest = 3<<3 | 5
        let mut s = mem(&[0x1d]);
        assert_eq!(s.read_three_delta().unwrap(),Delta::new(-3,3));
        // g-delta single word: mag 2 northeast = 2<<4 | 4<<1
        let mut s = mem(&[0x28]);
        assert_eq!(s.read_g_delta().unwrap(),Delta::new(2,2));
        // g-delta two word: x = -3 (3<<2|1|2), y = +7 (7<<1)
        let mut s = mem(&[0x0f,0x0e]);
        assert_eq!(s.read_g_delta().unwrap(),Delta::new(-3,7));
    }
    #[test]
    fn reals() {
        let mut s = mem(&[0x00,0x05]);
        assert_eq!(s.read_real().unwrap(),Oreal::Integer(5));
        let mut s = mem(&[0x03,0x04]);
        assert_eq!(s.read_real().unwrap(),Oreal::Reciprocal(-4));
        let mut s = mem(&[0x04,0x03,0x08]);
        assert_eq!(s.read_real().unwrap(),Oreal::Ratio(3,8));
        let mut bytes = vec![0x07];
        bytes.extend_from_slice(&0.125f64.to_le_bytes());
        let mut s = mem(&bytes);
        assert_eq!(s.read_real().unwrap().to_f64(),0.125);
    }
    #[test]
    fn strings() {
        let mut s = mem(&[0x03,b'a',b'b',b'c']);
        assert_eq!(s.read_string().unwrap(),b"abc".to_vec());
    }
}
