//! # OASIS writer
//!
//! Encoders for the primitive field types, buffered over the file layer.
//! The writer keeps a running CRC-32 and byte sum of everything flushed so
//! the END record's validation signature costs nothing extra.  A writer can
//! also run purely in memory, which the repetition size accounting and the
//! tests use.

use crc32fast::Hasher;
use crate::fio::{FileHandle,FileType};
use crate::{DYNERR,STDRESULT};
use super::oreal::*;
use super::rep::Delta;
use super::Error;

const CHUNK_SIZE: usize = 8*1024;

pub struct OasisWriter {
    buf: Vec<u8>,
    fh: Option<FileHandle>,
    filename: String,
    flushed: u64,
    crc: Hasher,
    checksum: u32
}

impl OasisWriter {
    pub fn create(fname: &str,ftype: FileType) -> Result<Self,DYNERR> {
        let fh = FileHandle::create(fname,ftype)?;
        Ok(Self {
            buf: Vec::with_capacity(2*CHUNK_SIZE),
            fh: Some(fh),
            filename: fname.to_string(),
            flushed: 0,
            crc: Hasher::new(),
            checksum: 0
        })
    }
    /// A writer that only accumulates bytes in memory.
    pub fn memory() -> Self {
        Self {
            buf: Vec::new(),
            fh: None,
            filename: "memory".to_string(),
            flushed: 0,
            crc: Hasher::new(),
            checksum: 0
        }
    }
    pub fn filename(&self) -> &str {
        &self.filename
    }
    pub fn err(&self,msg: String) -> DYNERR {
        Box::new(Error::Create(self.filename.clone(),msg))
    }
    /// Offset of the next byte to be written.
    pub fn offset(&self) -> u64 {
        self.flushed + self.buf.len() as u64
    }
    /// Take the accumulated bytes from a memory writer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
    fn digest(&mut self,bytes: &[u8]) {
        self.crc.update(bytes);
        for b in bytes {
            self.checksum = self.checksum.wrapping_add(*b as u32);
        }
    }
    fn flush(&mut self) -> STDRESULT {
        if self.fh.is_none() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.buf);
        if pending.len() > 0 {
            self.digest(&pending);
            self.fh.as_mut().expect("unreachable").write_all(&pending)?;
            self.flushed += pending.len() as u64;
        }
        self.buf = pending;
        self.buf.clear();
        Ok(())
    }
    fn maybe_flush(&mut self) -> STDRESULT {
        if self.fh.is_some() && self.buf.len() >= CHUNK_SIZE {
            return self.flush();
        }
        Ok(())
    }
    pub fn write_byte(&mut self,b: u8) -> STDRESULT {
        self.buf.push(b);
        self.maybe_flush()
    }
    pub fn write_bytes(&mut self,bytes: &[u8]) -> STDRESULT {
        self.buf.extend_from_slice(bytes);
        self.maybe_flush()
    }
    pub fn write_unsigned(&mut self,mut val: u64) -> STDRESULT {
        loop {
            let low = (val & 0x7f) as u8;
            val >>= 7;
            match val {
                0 => {
                    self.buf.push(low);
                    break;
                },
                _ => self.buf.push(low | 0x80)
            }
        }
        self.maybe_flush()
    }
    pub fn write_signed(&mut self,val: i64) -> STDRESULT {
        let raw = match val < 0 {
            true => ((val.unsigned_abs()) << 1) | 1,
            false => (val as u64) << 1
        };
        self.write_unsigned(raw)
    }
    pub fn write_string(&mut self,s: &[u8]) -> STDRESULT {
        self.write_unsigned(s.len() as u64)?;
        self.write_bytes(s)
    }
    pub fn write_real(&mut self,val: &Oreal) -> STDRESULT {
        match val {
            Oreal::Integer(v) if *v >= 0 => {
                self.write_unsigned(REAL_POS_INT)?;
                self.write_unsigned(*v as u64)
            },
            Oreal::Integer(v) => {
                self.write_unsigned(REAL_NEG_INT)?;
                self.write_unsigned(v.unsigned_abs())
            },
            Oreal::Reciprocal(v) if *v >= 0 => {
                self.write_unsigned(REAL_POS_RECIP)?;
                self.write_unsigned(*v as u64)
            },
            Oreal::Reciprocal(v) => {
                self.write_unsigned(REAL_NEG_RECIP)?;
                self.write_unsigned(v.unsigned_abs())
            },
            Oreal::Ratio(n,d) if *n >= 0 => {
                self.write_unsigned(REAL_POS_RATIO)?;
                self.write_unsigned(*n as u64)?;
                self.write_unsigned(*d as u64)
            },
            Oreal::Ratio(n,d) => {
                self.write_unsigned(REAL_NEG_RATIO)?;
                self.write_unsigned(n.unsigned_abs())?;
                self.write_unsigned(*d as u64)
            },
            Oreal::Float32(v) => {
                self.write_unsigned(REAL_F32)?;
                self.write_bytes(&v.to_le_bytes())
            },
            Oreal::Float64(v) => {
                self.write_unsigned(REAL_F64)?;
                self.write_bytes(&v.to_le_bytes())
            }
        }
    }
    /// g-delta, using the one-word octant form when possible.
    pub fn write_g_delta(&mut self,d: Delta) -> STDRESULT {
        if let Some(dir) = octant_of(d) {
            let mag = d.x.unsigned_abs().max(d.y.unsigned_abs());
            if mag <= u64::MAX >> 4 {
                return self.write_unsigned((mag << 4) | (dir << 1));
            }
        }
        let x_raw = match d.x < 0 {
            true => (d.x.unsigned_abs() << 2) | 3,
            false => ((d.x as u64) << 2) | 1
        };
        self.write_unsigned(x_raw)?;
        self.write_signed(d.y)
    }
    /// 1-delta along an axis.
    pub fn write_one_delta(&mut self,val: i64) -> STDRESULT {
        self.write_signed(val)
    }
    /// Flush everything, then append the 4-byte validation signature
    /// computed over all bytes written so far.  Returns the signature.
    pub fn write_signature(&mut self,crc_scheme: bool) -> Result<u32,DYNERR> {
        self.flush()?;
        let sig = match crc_scheme {
            true => self.crc.clone().finalize(),
            false => self.checksum
        };
        self.buf.extend_from_slice(&sig.to_le_bytes());
        self.flush()?;
        Ok(sig)
    }
    pub fn end_file(&mut self) -> STDRESULT {
        self.flush()?;
        match &mut self.fh {
            Some(fh) => fh.finish(),
            None => Ok(())
        }
    }
}

/// Octant direction bits if the delta lies on an axis or diagonal.
fn octant_of(d: Delta) -> Option<u64> {
    if d.y==0 {
        return Some(match d.x >= 0 { true => 0, false => 2 });
    }
    if d.x==0 {
        return Some(match d.y >= 0 { true => 1, false => 3 });
    }
    if d.x==d.y {
        return Some(match d.x > 0 { true => 4, false => 6 });
    }
    if d.x==-d.y {
        return Some(match d.x > 0 { true => 7, false => 5 });
    }
    None
}

/// Encoded size helpers used to compare repetition encodings.
pub fn unsigned_size(mut val: u64) -> usize {
    let mut n = 1;
    while val >= 0x80 {
        val >>= 7;
        n += 1;
    }
    n
}

pub fn signed_size(val: i64) -> usize {
    unsigned_size(match val < 0 {
        true => (val.unsigned_abs() << 1) | 1,
        false => (val as u64) << 1
    })
}

pub fn g_delta_size(d: Delta) -> usize {
    if let Some(_dir) = octant_of(d) {
        let mag = d.x.unsigned_abs().max(d.y.unsigned_abs());
        if mag <= u64::MAX >> 4 {
            return unsigned_size(mag << 4);
        }
    }
    unsigned_size((d.x.unsigned_abs() << 2) | 1) + signed_size(d.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::scanner::OasisScanner;

    #[test]
    fn integers_round_trip() {
        let mut w = OasisWriter::memory();
        for v in [0u64,1,127,128,300,1u64 << 40,u64::MAX] {
            w.write_unsigned(v).unwrap();
        }
        for v in [0i64,1,-1,63,-64,1i64 << 40,i64::MAX,-i64::MAX] {
            w.write_signed(v).unwrap();
        }
        let mut s = OasisScanner::from_bytes(w.into_bytes(),"test",0);
        for v in [0u64,1,127,128,300,1u64 << 40,u64::MAX] {
            assert_eq!(s.read_unsigned().unwrap(),v);
        }
        for v in [0i64,1,-1,63,-64,1i64 << 40,i64::MAX,-i64::MAX] {
            assert_eq!(s.read_signed().unwrap(),v);
        }
    }
    #[test]
    fn g_deltas_round_trip() {
        let mut w = OasisWriter::memory();
        let cases = [Delta::new(0,0),Delta::new(5,0),Delta::new(0,-5),Delta::new(3,3),
            Delta::new(-3,3),Delta::new(7,-7),Delta::new(10,20),Delta::new(-10,-21)];
        for d in cases {
            w.write_g_delta(d).unwrap();
        }
        let mut s = OasisScanner::from_bytes(w.into_bytes(),"test",0);
        for d in cases {
            assert_eq!(s.read_g_delta().unwrap(),d);
        }
    }
    #[test]
    fn rationals_round_trip() {
        let mut w = OasisWriter::memory();
        w.write_real(&Oreal::Ratio(-3,7)).unwrap();
        w.write_real(&Oreal::Reciprocal(1000)).unwrap();
        let mut s = OasisScanner::from_bytes(w.into_bytes(),"test",0);
        // the ratio must come back as the same ratio, not a float
        match s.read_real().unwrap() {
            Oreal::Ratio(n,d) => assert_eq!((n,d),(-3,7)),
            _ => panic!("ratio collapsed")
        }
        match s.read_real().unwrap() {
            Oreal::Reciprocal(r) => assert_eq!(r,1000),
            _ => panic!("reciprocal collapsed")
        }
    }
    #[test]
    fn sizes() {
        assert_eq!(unsigned_size(0),1);
        assert_eq!(unsigned_size(127),1);
        assert_eq!(unsigned_size(128),2);
        assert_eq!(signed_size(-64),2);
        assert_eq!(g_delta_size(Delta::new(3,3)),1);
        assert_eq!(g_delta_size(Delta::new(10,20)),2);
    }
}
