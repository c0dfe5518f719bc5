//! # GDSII record scanner
//!
//! `GdsScanner` pulls one record at a time out of the file.  The record body
//! is handed out as a slice into the scan buffer, so nothing is copied on
//! the happy path; the slice is only good until the next scan.
//!
//! ```text
//! let mut scanner = GdsScanner::open("foo.gds",FileType::Auto)?;
//! loop {
//!     let mut rec = scanner.get_next_record()?;
//!     // pull data out of rec with the next_* methods
//!     if rec.rec_type()==RecType::EndLib {
//!         break;
//!     }
//! }
//! ```

use crate::fio::{FileHandle,FileType};
use crate::DYNERR;
use super::rectypes::{RecType,RecTypeInfo,DataKind};
use super::real::gds_real_to_f64;
use super::{Error,RECORD_HEADER_LENGTH};

/// Size of the scan buffer.  Must be at least `MAX_RECORD_LENGTH`.
const BUFFER_SIZE: usize = 128*1024;

/// One record pulled out of the stream.  The body lives in the scanner's
/// buffer; extract what you need before scanning again.
pub struct GdsRecord<'a> {
    rec_type: RecType,
    info: &'static RecTypeInfo,
    body: &'a [u8],
    offset: u64,
    pos: usize
}

impl<'a> GdsRecord<'a> {
    pub fn rec_type(&self) -> RecType {
        self.rec_type
    }
    pub fn name(&self) -> &'static str {
        self.info.name
    }
    pub fn data_kind(&self) -> DataKind {
        self.info.kind
    }
    pub fn len(&self) -> usize {
        self.body.len()
    }
    /// file offset of the record's first header byte
    pub fn offset(&self) -> u64 {
        self.offset
    }
    /// number of data items; only meaningful for fixed-size item kinds
    pub fn num_items(&self) -> usize {
        debug_assert!(self.info.item_size > 0);
        self.body.len() / self.info.item_size as usize
    }
    pub fn next_bit_array(&mut self) -> u16 {
        debug_assert!(self.data_kind()==DataKind::BitArray);
        u16::from_be_bytes([self.body[self.pos],self.body[self.pos+1]])
    }
    pub fn next_short(&mut self) -> i16 {
        debug_assert!(self.data_kind()==DataKind::Short);
        let val = i16::from_be_bytes([self.body[self.pos],self.body[self.pos+1]]);
        self.pos += 2;
        val
    }
    pub fn next_int(&mut self) -> i32 {
        debug_assert!(self.data_kind()==DataKind::Int);
        let val = i32::from_be_bytes([self.body[self.pos],self.body[self.pos+1],
            self.body[self.pos+2],self.body[self.pos+3]]);
        self.pos += 4;
        val
    }
    pub fn next_double(&mut self) -> f64 {
        debug_assert!(self.data_kind()==DataKind::Double);
        let val = gds_real_to_f64(&self.body[self.pos..self.pos+8]);
        self.pos += 8;
        val
    }
    /// For records holding fixed-length strings, the next 44-byte blob.
    pub fn next_fixed_string(&mut self) -> &'a [u8] {
        debug_assert!(self.data_kind()==DataKind::Str && self.info.item_size > 0);
        let size = self.info.item_size as usize;
        let val = &self.body[self.pos..self.pos+size];
        self.pos += size;
        val
    }
    /// For records holding a single variable-length string, the whole body
    /// with any single padding NUL stripped.
    pub fn var_string(&self) -> &'a [u8] {
        debug_assert!(self.data_kind()==DataKind::Str && self.info.item_size==0);
        match self.body.last() {
            Some(0) => &self.body[0..self.body.len()-1],
            _ => self.body
        }
    }
    /// The raw body, padding included.
    pub fn raw_body(&self) -> &'a [u8] {
        self.body
    }
}

/// Reads records from a GDSII Stream file through a fixed-size buffer.
/// For gzipped input all offsets refer to the uncompressed stream.
pub struct GdsScanner {
    buf: Vec<u8>,
    lo: usize,
    hi: usize,
    file_offset: u64,
    fh: FileHandle
}

impl GdsScanner {
    pub fn open(fname: &str,ftype: FileType) -> Result<Self,DYNERR> {
        let fh = FileHandle::open_read(fname,ftype)?;
        Ok(Self {
            buf: vec![0;BUFFER_SIZE],
            lo: 0,
            hi: 0,
            file_offset: 0,
            fh
        })
    }
    pub fn filename(&self) -> &str {
        self.fh.path()
    }
    /// file offset of the next byte to be scanned; after the ENDLIB
    /// record this is the effective size of the input
    pub fn curr_byte_offset(&self) -> u64 {
        self.file_offset + self.lo as u64
    }
    fn abort(&self,msg: String) -> DYNERR {
        Box::new(Error::Format(self.fh.path().to_string(),self.curr_byte_offset(),msg))
    }
    /// Move remaining bytes to the front of the buffer and refill from the file.
    fn fill_buffer(&mut self) -> Result<(),DYNERR> {
        let nbytes = self.hi - self.lo;
        self.buf.copy_within(self.lo..self.hi,0);
        self.file_offset += self.lo as u64;
        self.lo = 0;
        self.hi = nbytes;
        while self.hi < BUFFER_SIZE {
            let n = self.fh.read(&mut self.buf[self.hi..BUFFER_SIZE])?;
            if n==0 {
                break;
            }
            self.hi += n;
        }
        Ok(())
    }
    /// Scan the next record.  Fails on an invalid header, a body length
    /// violating the record type's descriptor, or EOF mid-record.
    pub fn get_next_record(&mut self) -> Result<GdsRecord,DYNERR> {
        if self.hi - self.lo < RECORD_HEADER_LENGTH {
            self.fill_buffer()?;
            if self.hi - self.lo < RECORD_HEADER_LENGTH {
                return Err(self.abort("unexpected EOF".to_string()));
            }
        }
        let rec_length = u16::from_be_bytes([self.buf[self.lo],self.buf[self.lo+1]]) as usize;
        if rec_length < RECORD_HEADER_LENGTH {
            return Err(self.abort(format!("invalid record length {}; must be at least {}",
                rec_length,RECORD_HEADER_LENGTH)));
        }
        if rec_length % 2 != 0 {
            return Err(self.abort(format!("invalid record length {}; must be even",rec_length)));
        }
        if self.hi - self.lo < rec_length {
            self.fill_buffer()?;
            if self.hi - self.lo < rec_length {
                return Err(self.abort("unexpected EOF".to_string()));
            }
        }
        let offset = self.curr_byte_offset();
        let rec_byte = self.buf[self.lo+2];
        let rec_type = match RecType::from_byte(rec_byte) {
            Some(rt) => rt,
            None => return Err(self.abort(format!("invalid record type {}",rec_byte)))
        };
        let info = rec_type.info();
        let body_length = rec_length - RECORD_HEADER_LENGTH;
        if body_length < info.min_len as usize {
            return Err(self.abort(format!("{} record body has invalid length {}; must be at least {}",
                info.name,body_length,info.min_len)));
        }
        if body_length > info.max_len as usize {
            return Err(self.abort(format!("{} record body has invalid length {}; may be at most {}",
                info.name,body_length,info.max_len)));
        }
        // The length must divide into items.  Strings with item_size 0 are
        // padded to even length.  XY holds pairs of 4-byte coordinates and
        // LIBSECUR holds triples of 2-byte integers, hence their multiples.
        let size_unit = match rec_type {
            RecType::Xy => 8,
            RecType::LibSecur => 6,
            _ if info.item_size==0 => 2,
            _ => info.item_size as usize
        };
        if body_length % size_unit != 0 {
            return Err(self.abort(format!("{} record body has invalid length {}: must be a multiple of {}",
                info.name,body_length,size_unit)));
        }
        let body_start = self.lo + RECORD_HEADER_LENGTH;
        self.lo += rec_length;
        Ok(GdsRecord {
            rec_type,
            info,
            body: &self.buf[body_start..body_start+body_length],
            offset,
            pos: 0
        })
    }
    /// Restart scanning at the given offset, which must be the start of a
    /// record.  An offset inside the current buffer only moves the cursor.
    pub fn seek_to(&mut self,offset: u64) -> Result<(),DYNERR> {
        // The upper bound uses <=, not <, so that seek_to(0) on a
        // freshly-opened scanner is a no-op and pipes still work.
        if offset >= self.file_offset && offset <= self.file_offset + self.hi as u64 {
            self.lo = (offset - self.file_offset) as usize;
        } else {
            self.fh.seek(offset)?;
            self.lo = 0;
            self.hi = 0;
            self.file_offset = offset;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> (tempfile::TempDir,String) {
        let dir = tempfile::tempdir().expect("no temp dir");
        let path = dir.path().join("t.gds").to_str().unwrap().to_string();
        let mut f = std::fs::File::create(&path).expect("create failed");
        f.write_all(bytes).expect("write failed");
        (dir,path)
    }
    #[test]
    fn scans_header() {
        let (_d,path) = write_temp(&[0,6,0,2,0,5, 0,4,4,0]);
        let mut scanner = GdsScanner::open(&path,FileType::Auto).expect("open failed");
        let mut rec = scanner.get_next_record().expect("scan failed");
        assert_eq!(rec.rec_type(),RecType::Header);
        assert_eq!(rec.next_short(),5);
        let rec = scanner.get_next_record().expect("scan failed");
        assert_eq!(rec.rec_type(),RecType::EndLib);
        assert_eq!(rec.offset(),6);
    }
    #[test]
    fn rejects_invalid_type() {
        let (_d,path) = write_temp(&[0,4,24,0]);
        let mut scanner = GdsScanner::open(&path,FileType::Auto).expect("open failed");
        let err = scanner.get_next_record().err().expect("should fail");
        assert!(err.to_string().contains("invalid record type 24"));
    }
    #[test]
    fn rejects_bad_xy_length() {
        // XY body of 12 bytes is not a multiple of 8
        let mut bytes = vec![0,16,16,3];
        bytes.extend_from_slice(&[0;12]);
        let (_d,path) = write_temp(&bytes);
        let mut scanner = GdsScanner::open(&path,FileType::Auto).expect("open failed");
        let err = scanner.get_next_record().err().expect("should fail");
        assert!(err.to_string().contains("multiple of 8"));
    }
    #[test]
    fn eof_mid_record() {
        let (_d,path) = write_temp(&[0,8,0,2,0,5]);
        let mut scanner = GdsScanner::open(&path,FileType::Auto).expect("open failed");
        let err = scanner.get_next_record().err().expect("should fail");
        assert!(err.to_string().contains("unexpected EOF"));
    }
}
