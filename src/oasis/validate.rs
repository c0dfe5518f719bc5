//! # Validation signatures
//!
//! The END record carries an optional signature: a CRC-32 or a 32-bit byte
//! sum, both computed over the file from the first magic byte up to but
//! excluding the signature field itself.  The validator reads the whole
//! file, computes both, and compares against the trailer.

use crate::fio::{FileHandle,FileType};
use crate::DYNERR;
use super::scanner::OasisScanner;
use super::{Error,RecId,MAGIC,END_RECORD_LENGTH};

#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum ValScheme {
    None = 0,
    Crc32 = 1,
    Checksum32 = 2
}

impl ValScheme {
    pub fn from_unsigned(v: u64) -> Option<Self> {
        match v {
            0 => Some(Self::None),
            1 => Some(Self::Crc32),
            2 => Some(Self::Checksum32),
            _ => None
        }
    }
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Crc32 => "crc32",
            Self::Checksum32 => "checksum32"
        }
    }
}

#[derive(Clone,Copy,PartialEq,Debug)]
pub struct Validation {
    pub scheme: ValScheme,
    pub signature: u32
}

/// Read the whole (uncompressed) byte stream into memory.
fn slurp(fname: &str) -> Result<Vec<u8>,DYNERR> {
    let mut fh = FileHandle::open_read(fname,FileType::Auto)?;
    let mut ans = Vec::new();
    let mut chunk = [0;65536];
    loop {
        let n = fh.read(&mut chunk)?;
        if n==0 {
            break;
        }
        ans.extend_from_slice(&chunk[0..n]);
    }
    Ok(ans)
}

/// Uncompressed length and the final END_RECORD_LENGTH bytes, without
/// keeping the whole file.  Used by the parser's END pre-read.
pub fn read_tail(fname: &str) -> Result<(u64,Vec<u8>),DYNERR> {
    let mut fh = FileHandle::open_read(fname,FileType::Auto)?;
    let mut len: u64 = 0;
    let mut tail: Vec<u8> = Vec::new();
    let mut chunk = [0;65536];
    loop {
        let n = fh.read(&mut chunk)?;
        if n==0 {
            break;
        }
        len += n as u64;
        tail.extend_from_slice(&chunk[0..n]);
        if tail.len() > END_RECORD_LENGTH {
            let excess = tail.len() - END_RECORD_LENGTH;
            tail.drain(0..excess);
        }
    }
    Ok((len,tail))
}

/// Extract the validation scheme and signature from the tail of the file.
/// `offsets_in_end` says whether the START record deferred its table
/// offsets to the END record.
pub fn validation_from_tail(fname: &str,len: u64,tail: &[u8],offsets_in_end: bool) -> Result<Validation,DYNERR> {
    if tail.len() < END_RECORD_LENGTH || len < (MAGIC.len() + END_RECORD_LENGTH) as u64 {
        return Err(Box::new(Error::Format(fname.to_string(),len,
            "file is too short to hold an END record".to_string())));
    }
    let end_offset = len - END_RECORD_LENGTH as u64;
    let mut scanner = OasisScanner::from_bytes(tail.to_vec(),fname,end_offset);
    let id = scanner.read_byte()?;
    if id != RecId::End as u8 {
        return Err(Box::new(Error::Format(fname.to_string(),end_offset,
            format!("END record not found {} bytes before EOF (record id {})",END_RECORD_LENGTH,id))));
    }
    if offsets_in_end {
        for _i in 0..12 {
            scanner.read_unsigned()?;
        }
    }
    let _padding = scanner.read_string()?;
    let scheme_raw = scanner.read_unsigned()?;
    let scheme = match ValScheme::from_unsigned(scheme_raw) {
        Some(s) => s,
        None => return Err(Box::new(Error::Format(fname.to_string(),end_offset,
            format!("invalid validation scheme {}",scheme_raw))))
    };
    let signature = match scheme {
        ValScheme::None => 0,
        _ => {
            let bytes = scanner.read_bytes(4)?;
            u32::from_le_bytes([bytes[0],bytes[1],bytes[2],bytes[3]])
        }
    };
    Ok(Validation { scheme, signature })
}

/// Whether the START record says its table offsets live in the END record.
fn offsets_in_end(fname: &str,bytes: &[u8]) -> Result<bool,DYNERR> {
    if bytes.len() < MAGIC.len() + 2 || &bytes[0..MAGIC.len()] != MAGIC {
        return Err(Box::new(Error::Format(fname.to_string(),0,
            "file does not begin with the OASIS magic string".to_string())));
    }
    let mut scanner = OasisScanner::from_bytes(bytes[MAGIC.len()..].to_vec(),fname,MAGIC.len() as u64);
    let id = scanner.read_byte()?;
    if id != RecId::Start as u8 {
        return Err(Box::new(Error::Format(fname.to_string(),MAGIC.len() as u64,
            "START record is missing".to_string())));
    }
    let _version = scanner.read_string()?;
    let _unit = scanner.read_real()?;
    Ok(scanner.read_unsigned()? != 0)
}

/// Parse the validation trailer without checking it.
pub fn parse_validation(fname: &str) -> Result<Validation,DYNERR> {
    let bytes = slurp(fname)?;
    let in_end = offsets_in_end(fname,&bytes)?;
    let len = bytes.len() as u64;
    let tail_start = bytes.len().saturating_sub(END_RECORD_LENGTH);
    validation_from_tail(fname,len,&bytes[tail_start..],in_end)
}

/// Recompute the file's signature and compare with the trailer.
/// A mismatch is an error carrying both values; `Ok` returns the trailer.
pub fn validate_file(fname: &str) -> Result<Validation,DYNERR> {
    let bytes = slurp(fname)?;
    let in_end = offsets_in_end(fname,&bytes)?;
    let len = bytes.len() as u64;
    let tail_start = bytes.len().saturating_sub(END_RECORD_LENGTH);
    let val = validation_from_tail(fname,len,&bytes[tail_start..],in_end)?;
    if val.scheme==ValScheme::None {
        return Ok(val);
    }
    let covered = &bytes[0..bytes.len()-4];
    let computed = match val.scheme {
        ValScheme::Crc32 => crc32fast::hash(covered),
        _ => {
            let mut sum: u32 = 0;
            for b in covered {
                sum = sum.wrapping_add(*b as u32);
            }
            sum
        }
    };
    if computed != val.signature {
        return Err(Box::new(Error::Validation(fname.to_string(),
            format!("{} signature is 0x{:08x}, computed 0x{:08x}",val.scheme.name(),val.signature,computed))));
    }
    Ok(val)
}
