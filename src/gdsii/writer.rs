//! # GDSII record writer
//!
//! `GdsWriter` frames records on the way out.  The header's length field is
//! not known until the record is finished, so `begin_record` leaves a gap
//! and `end_record` patches it.  The buffer always has room for a complete
//! record, and flushes to disk happen in whole chunks.
//!
//! ```text
//! let mut writer = GdsWriter::create("file.gds",FileType::Auto)?;
//! writer.begin_record(RecType::Header)?;
//! writer.write_short(600);
//! writer.end_record();
//! // ... more records ...
//! writer.end_file()?;
//! ```

use crate::fio::{FileHandle,FileType};
use crate::DYNERR;
use super::rectypes::{RecType,RecTypeInfo,DataKind};
use super::real::f64_to_gds_real;
use super::{Error,RECORD_HEADER_LENGTH,MAX_RECORD_LENGTH};

/// On-disk writes happen in multiples of this.
const CHUNK_SIZE: usize = 8*1024;

pub struct GdsWriter {
    buf: Vec<u8>,
    fh: FileHandle,
    rec_start: usize,
    curr_type: Option<&'static RecTypeInfo>
}

impl GdsWriter {
    pub fn create(fname: &str,ftype: FileType) -> Result<Self,DYNERR> {
        let fh = FileHandle::create(fname,ftype)?;
        Ok(Self {
            buf: Vec::with_capacity(CHUNK_SIZE + MAX_RECORD_LENGTH),
            fh,
            rec_start: 0,
            curr_type: None
        })
    }
    pub fn filename(&self) -> &str {
        self.fh.path()
    }
    /// Flush whole chunks, keeping any partial tail buffered.  Never called
    /// in the middle of a record, so the length back-patch stays in memory.
    fn drain_chunks(&mut self) -> Result<(),DYNERR> {
        debug_assert!(self.curr_type.is_none());
        let whole = (self.buf.len() / CHUNK_SIZE) * CHUNK_SIZE;
        if whole > 0 {
            self.fh.write_all(&self.buf[0..whole])?;
            self.buf.copy_within(whole..,0);
            self.buf.truncate(self.buf.len() - whole);
        }
        Ok(())
    }
    /// Begin a record.  The two length bytes are reserved and patched by
    /// `end_record`.
    pub fn begin_record(&mut self,rec_type: RecType) -> Result<(),DYNERR> {
        self.drain_chunks()?;
        let info = rec_type.info();
        self.rec_start = self.buf.len();
        self.buf.extend_from_slice(&[0,0]);
        self.buf.push(rec_type as u8);
        self.buf.push(info.kind.type_byte());
        self.curr_type = Some(info);
        Ok(())
    }
    pub fn end_record(&mut self) {
        let info = self.curr_type.take().expect("end_record without begin_record");
        let length = self.buf.len() - self.rec_start;
        debug_assert!(length - RECORD_HEADER_LENGTH >= info.min_len as usize);
        debug_assert!(length - RECORD_HEADER_LENGTH <= info.max_len as usize);
        self.buf[self.rec_start] = (length >> 8) as u8;
        self.buf[self.rec_start+1] = length as u8;
    }
    pub fn write_bit_array(&mut self,val: u16) {
        debug_assert!(self.curr_type.is_some_and(|i| i.kind==DataKind::BitArray));
        self.buf.extend_from_slice(&val.to_be_bytes());
    }
    pub fn write_short(&mut self,val: i16) {
        debug_assert!(self.curr_type.is_some_and(|i| i.kind==DataKind::Short));
        self.buf.extend_from_slice(&val.to_be_bytes());
    }
    pub fn write_int(&mut self,val: i32) {
        debug_assert!(self.curr_type.is_some_and(|i| i.kind==DataKind::Int));
        self.buf.extend_from_slice(&val.to_be_bytes());
    }
    pub fn write_double(&mut self,val: f64) -> Result<(),DYNERR> {
        debug_assert!(self.curr_type.is_some_and(|i| i.kind==DataKind::Double));
        match f64_to_gds_real(val) {
            Some(bytes) => {
                self.buf.extend_from_slice(&bytes);
                Ok(())
            },
            None => Err(Box::new(Error::Create(self.fh.path().to_string(),
                format!("value {} is outside the GDSII representable range",val))))
        }
    }
    /// Write a string, NUL-padding fixed-length items to the item size and
    /// variable-length strings to an even length.
    pub fn write_string(&mut self,s: &[u8]) {
        let info = self.curr_type.expect("write outside record");
        debug_assert!(info.kind==DataKind::Str);
        debug_assert!(info.item_size==0 || s.len() <= info.item_size as usize);
        self.buf.extend_from_slice(s);
        let item_size = info.item_size as usize;
        if item_size > s.len() {
            self.buf.resize(self.buf.len() + item_size - s.len(),0);
        } else if item_size==0 && s.len() % 2 != 0 {
            self.buf.push(0);
        }
    }
    /// Copy a record body verbatim, for record-level filters.
    pub fn write_body(&mut self,body: &[u8]) {
        debug_assert!(self.curr_type.is_some());
        self.buf.extend_from_slice(body);
    }
    pub fn write_empty_record(&mut self,rec_type: RecType) -> Result<(),DYNERR> {
        self.begin_record(rec_type)?;
        self.end_record();
        Ok(())
    }
    pub fn write_bit_array_record(&mut self,rec_type: RecType,val: u16) -> Result<(),DYNERR> {
        self.begin_record(rec_type)?;
        self.write_bit_array(val);
        self.end_record();
        Ok(())
    }
    pub fn write_short_record(&mut self,rec_type: RecType,val: i16) -> Result<(),DYNERR> {
        self.begin_record(rec_type)?;
        self.write_short(val);
        self.end_record();
        Ok(())
    }
    pub fn write_int_record(&mut self,rec_type: RecType,val: i32) -> Result<(),DYNERR> {
        self.begin_record(rec_type)?;
        self.write_int(val);
        self.end_record();
        Ok(())
    }
    pub fn write_double_record(&mut self,rec_type: RecType,val: f64) -> Result<(),DYNERR> {
        self.begin_record(rec_type)?;
        self.write_double(val)?;
        self.end_record();
        Ok(())
    }
    pub fn write_string_record(&mut self,rec_type: RecType,s: &[u8]) -> Result<(),DYNERR> {
        self.begin_record(rec_type)?;
        self.write_string(s);
        self.end_record();
        Ok(())
    }
    /// Flush everything and close the file.
    pub fn end_file(&mut self) -> Result<(),DYNERR> {
        debug_assert!(self.curr_type.is_none());
        if self.buf.len() > 0 {
            let flushed = std::mem::take(&mut self.buf);
            self.fh.write_all(&flushed)?;
        }
        self.fh.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn frames_records() {
        let dir = tempfile::tempdir().expect("no temp dir");
        let path = dir.path().join("t.gds").to_str().unwrap().to_string();
        let mut writer = GdsWriter::create(&path,FileType::Auto).expect("create failed");
        writer.write_short_record(RecType::Header,600).expect("write failed");
        writer.write_string_record(RecType::LibName,b"LIB").expect("write failed");
        writer.write_empty_record(RecType::EndLib).expect("write failed");
        writer.end_file().expect("close failed");
        let bytes = std::fs::read(&path).expect("read failed");
        assert_eq!(bytes,vec![
            0,6,0,2,2,88,
            0,8,2,6,0x4c,0x49,0x42,0,
            0,4,4,0
        ]);
    }
}
