//! # File I/O Module
//!
//! The scanner and writer layers do not touch the operating system directly.
//! They go through `FileHandle`, which hides whether the file on disk is
//! gzip-compressed.  For compressed files every offset exposed by this module
//! is an offset in the *uncompressed* byte stream; the physical file offset
//! is never visible.
//!
//! Backward seeks while writing are refused for gzip output, and backward
//! seeks while reading a gzip file are honored by rewinding and re-inflating,
//! which is slow but correct.

use std::fs::File;
use std::io::{Read,Write,Seek,SeekFrom};
use std::path::Path;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use crate::DYNERR;

/// Enumerates file layer errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("cannot create '{0}': parent directory does not exist")]
    MissingParent(String),
    #[error("cannot open '{0}': {1}")]
    Open(String,std::io::Error),
    #[error("unexpected end of file in '{0}'")]
    UnexpectedEof(String),
    #[error("backward seek in write mode on '{0}'")]
    BackwardSeek(String),
    #[error("seek failed on '{0}': {1}")]
    Seek(String,std::io::Error)
}

/// How the bytes are stored on disk.  `Auto` decides from the file name:
/// the file is gzipped if and only if the name ends with `.gz`.
#[derive(Clone,Copy,PartialEq)]
pub enum FileType {
    Auto,
    Normal,
    Gzip
}

impl FileType {
    fn is_gzip(&self,path: &str) -> bool {
        match self {
            Self::Normal => false,
            Self::Gzip => true,
            Self::Auto => path.to_lowercase().ends_with(".gz")
        }
    }
}

enum Stream {
    PlainRead(File),
    PlainWrite(File),
    GzRead(Box<GzDecoder<File>>),
    GzWrite(Box<GzEncoder<File>>),
    Closed
}

/// Handle to a gzipped or uncompressed file.
/// The handle tracks the current offset in the uncompressed stream; for
/// uncompressed files that is simply the file offset.
pub struct FileHandle {
    path: String,
    gzip: bool,
    stream: Stream,
    offset: u64
}

impl FileHandle {
    /// Open an existing file for reading.
    pub fn open_read(path: &str,ftype: FileType) -> Result<Self,DYNERR> {
        let gzip = ftype.is_gzip(path);
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => return Err(Box::new(Error::Open(path.to_string(),e)))
        };
        debug!("open {} for reading, gzip={}",path,gzip);
        let stream = match gzip {
            true => Stream::GzRead(Box::new(GzDecoder::new(file))),
            false => Stream::PlainRead(file)
        };
        Ok(Self { path: path.to_string(), gzip, stream, offset: 0 })
    }
    /// Create a file for writing, truncating any existing file.
    /// A missing parent directory gets its own diagnostic; everything
    /// else bubbles up as the system error.
    pub fn create(path: &str,ftype: FileType) -> Result<Self,DYNERR> {
        let gzip = ftype.is_gzip(path);
        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                if e.kind()==std::io::ErrorKind::NotFound {
                    if let Some(parent) = Path::new(path).parent() {
                        if parent.as_os_str().len()>0 && !parent.is_dir() {
                            return Err(Box::new(Error::MissingParent(path.to_string())));
                        }
                    }
                }
                return Err(Box::new(Error::Open(path.to_string(),e)));
            }
        };
        debug!("create {} for writing, gzip={}",path,gzip);
        let stream = match gzip {
            true => Stream::GzWrite(Box::new(GzEncoder::new(file,Compression::default()))),
            false => Stream::PlainWrite(file)
        };
        Ok(Self { path: path.to_string(), gzip, stream, offset: 0 })
    }
    pub fn path(&self) -> &str {
        &self.path
    }
    pub fn is_gzip(&self) -> bool {
        self.gzip
    }
    /// Offset of the next byte in the uncompressed stream.
    pub fn offset(&self) -> u64 {
        self.offset
    }
    /// Read up to `buf.len()` bytes, retrying on signal interruption.
    /// Returns 0 only at end of file.
    pub fn read(&mut self,buf: &mut [u8]) -> Result<usize,DYNERR> {
        let n = loop {
            let attempt = match &mut self.stream {
                Stream::PlainRead(f) => f.read(buf),
                Stream::GzRead(f) => f.read(buf),
                _ => return Err(Box::new(Error::Open(self.path.clone(),
                    std::io::Error::new(std::io::ErrorKind::Other,"not open for reading"))))
            };
            match attempt {
                Ok(n) => break n,
                Err(e) if e.kind()==std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Box::new(e))
            }
        };
        self.offset += n as u64;
        Ok(n)
    }
    /// Read exactly `buf.len()` bytes or fail with `UnexpectedEof`.
    pub fn read_exact(&mut self,buf: &mut [u8]) -> Result<(),DYNERR> {
        let mut have = 0;
        while have < buf.len() {
            let n = self.read(&mut buf[have..])?;
            if n==0 {
                return Err(Box::new(Error::UnexpectedEof(self.path.clone())));
            }
            have += n;
        }
        Ok(())
    }
    pub fn write_all(&mut self,buf: &[u8]) -> Result<(),DYNERR> {
        match &mut self.stream {
            Stream::PlainWrite(f) => f.write_all(buf)?,
            Stream::GzWrite(f) => f.write_all(buf)?,
            _ => return Err(Box::new(Error::Open(self.path.clone(),
                std::io::Error::new(std::io::ErrorKind::Other,"not open for writing"))))
        }
        self.offset += buf.len() as u64;
        Ok(())
    }
    /// Seek to an absolute offset in the uncompressed stream.
    /// Reading a gzip file backward rewinds and re-inflates.
    pub fn seek(&mut self,offset: u64) -> Result<(),DYNERR> {
        if offset==self.offset {
            return Ok(());
        }
        match &mut self.stream {
            Stream::PlainRead(f) => {
                f.seek(SeekFrom::Start(offset)).map_err(|e| Error::Seek(self.path.clone(),e))?;
                self.offset = offset;
                Ok(())
            },
            Stream::PlainWrite(f) => {
                f.seek(SeekFrom::Start(offset)).map_err(|e| Error::Seek(self.path.clone(),e))?;
                self.offset = offset;
                Ok(())
            },
            Stream::GzRead(_) => {
                if offset < self.offset {
                    debug!("backward seek in gzip stream, rewinding {}",self.path);
                    let file = match File::open(&self.path) {
                        Ok(f) => f,
                        Err(e) => return Err(Box::new(Error::Open(self.path.clone(),e)))
                    };
                    self.stream = Stream::GzRead(Box::new(GzDecoder::new(file)));
                    self.offset = 0;
                }
                self.skip(offset - self.offset)
            },
            Stream::GzWrite(_) => Err(Box::new(Error::BackwardSeek(self.path.clone()))),
            Stream::Closed => Err(Box::new(Error::Seek(self.path.clone(),
                std::io::Error::new(std::io::ErrorKind::Other,"file is closed"))))
        }
    }
    fn skip(&mut self,mut count: u64) -> Result<(),DYNERR> {
        let mut sink = [0;8192];
        while count > 0 {
            let want = std::cmp::min(count as usize,sink.len());
            let n = self.read(&mut sink[0..want])?;
            if n==0 {
                return Err(Box::new(Error::UnexpectedEof(self.path.clone())));
            }
            count -= n as u64;
        }
        Ok(())
    }
    /// Flush and close.  For gzip output this writes the stream trailer,
    /// so skipping it leaves a truncated file.
    pub fn finish(&mut self) -> Result<(),DYNERR> {
        match std::mem::replace(&mut self.stream,Stream::Closed) {
            Stream::PlainWrite(mut f) => f.flush()?,
            Stream::GzWrite(f) => {
                f.finish()?.flush()?;
            },
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn plain_round_trip() {
        let dir = tempfile::tempdir().expect("no temp dir");
        let path = dir.path().join("t.bin").to_str().unwrap().to_string();
        let mut fh = FileHandle::create(&path,FileType::Auto).expect("create failed");
        assert!(!fh.is_gzip());
        fh.write_all(&[1,2,3,4,5]).expect("write failed");
        fh.finish().expect("close failed");
        let mut fh = FileHandle::open_read(&path,FileType::Auto).expect("open failed");
        let mut buf = [0;3];
        fh.seek(2).expect("seek failed");
        fh.read_exact(&mut buf).expect("read failed");
        assert_eq!(buf,[3,4,5]);
    }
    #[test]
    fn gzip_round_trip() {
        let dir = tempfile::tempdir().expect("no temp dir");
        let path = dir.path().join("t.bin.gz").to_str().unwrap().to_string();
        let mut fh = FileHandle::create(&path,FileType::Auto).expect("create failed");
        assert!(fh.is_gzip());
        fh.write_all(&[10,20,30,40]).expect("write failed");
        fh.finish().expect("close failed");
        let mut fh = FileHandle::open_read(&path,FileType::Auto).expect("open failed");
        let mut buf = [0;2];
        fh.seek(2).expect("seek failed");
        fh.read_exact(&mut buf).expect("read failed");
        assert_eq!(buf,[30,40]);
        // backward seek rewinds
        fh.seek(0).expect("rewind failed");
        fh.read_exact(&mut buf).expect("read failed");
        assert_eq!(buf,[10,20]);
    }
    #[test]
    fn missing_parent() {
        let res = FileHandle::create("no/such/dir/t.bin",FileType::Normal);
        assert!(res.is_err());
        assert!(res.err().unwrap().to_string().contains("parent directory does not exist"));
    }
}
