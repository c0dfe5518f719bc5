//! # ASCII form of GDSII
//!
//! A record-by-record text rendering, one record per line: the lowercase
//! record name followed by its data items.  Strings are quoted with `\xNN`
//! escapes for bytes outside graphic ASCII, bit arrays print as hex, and
//! reals print in the shortest form that parses back to the same double.
//! The ingest direction accepts exactly what the dump direction emits, so
//! dump-then-ingest reproduces the original byte stream.
//!
//! Dumps made with offsets (`-a`), a structure filter (`-s`), or user-unit
//! coordinates (`-u`) cannot be converted back.

use std::io::Write;
use crate::fio::FileType;
use crate::{escaped_ascii_from_bytes,parse_escaped_ascii,DYNERR,STDRESULT};
use super::scanner::GdsScanner;
use super::writer::GdsWriter;
use super::rectypes::{RecType,DataKind};
use super::Error;

#[derive(Default)]
pub struct GdsToAsciiOptions {
    /// print the file offset of each record
    pub show_offsets: bool,
    /// print XY coordinates as floating-point user units
    pub convert_units: bool,
    /// dump only this structure
    pub structure: Option<String>
}

fn format_record(rec: &mut super::scanner::GdsRecord,db_to_user: &mut f64,convert_units: bool) -> String {
    let mut line = rec.name().to_lowercase();
    match rec.data_kind() {
        DataKind::None => {},
        DataKind::BitArray => line += &format!(" 0x{:04x}",rec.next_bit_array()),
        DataKind::Short => {
            for _i in 0..rec.num_items() {
                line += &format!(" {}",rec.next_short());
            }
        },
        DataKind::Int => {
            let convert = convert_units && rec.rec_type()==RecType::Xy;
            for _i in 0..rec.num_items() {
                let val = rec.next_int();
                match convert {
                    true => line += &format!(" {}",val as f64 * *db_to_user),
                    false => line += &format!(" {}",val)
                }
            }
        },
        DataKind::Double => {
            let is_units = rec.rec_type()==RecType::Units;
            for i in 0..rec.num_items() {
                let val = rec.next_double();
                if is_units && i==0 {
                    *db_to_user = val;
                }
                line += &format!(" {}",val);
            }
        },
        DataKind::Str => {
            match rec.rec_type().info().item_size {
                0 => line += &format!(" \"{}\"",escaped_ascii_from_bytes(rec.var_string())),
                _ => {
                    for _i in 0..rec.num_items() {
                        let blob = rec.next_fixed_string();
                        let end = blob.iter().position(|b| *b==0).unwrap_or(blob.len());
                        line += &format!(" \"{}\"",escaped_ascii_from_bytes(&blob[0..end]));
                    }
                }
            }
        }
    }
    line
}

/// Dump a GDSII file as text.  Stops after ENDLIB.
pub fn convert_gds_to_ascii(infile: &str,out: &mut dyn Write,options: &GdsToAsciiOptions) -> STDRESULT {
    let mut scanner = GdsScanner::open(infile,FileType::Auto)?;
    let mut db_to_user = 1.0;
    let filtering = options.structure.is_some();
    // while filtering, the BGNSTR line waits until STRNAME decides its fate
    let mut pending_bgnstr: Option<String> = None;
    let mut in_wanted = !filtering;
    let mut found = !filtering;
    loop {
        let mut rec = scanner.get_next_record()?;
        let rtype = rec.rec_type();
        let strname = match rtype {
            RecType::StrName => Some(String::from_utf8_lossy(rec.var_string()).to_string()),
            _ => None
        };
        let mut line = format_record(&mut rec,&mut db_to_user,options.convert_units);
        if options.show_offsets {
            line = format!("{:8}  {}",rec.offset(),line);
        }
        if filtering {
            match rtype {
                RecType::BgnStr => {
                    pending_bgnstr = Some(line);
                    continue;
                },
                RecType::StrName => {
                    if let Some(bgnstr_line) = pending_bgnstr.take() {
                        if strname.as_deref()==options.structure.as_deref() {
                            in_wanted = true;
                            found = true;
                            writeln!(out,"{}",bgnstr_line)?;
                        }
                    }
                },
                RecType::EndStr => {
                    if in_wanted {
                        writeln!(out,"{}",line)?;
                        in_wanted = false;
                    }
                    continue;
                },
                _ => {}
            }
        }
        if in_wanted {
            writeln!(out,"{}",line)?;
        }
        if rtype==RecType::EndLib {
            break;
        }
    }
    if !found {
        return Err(Box::new(Error::StructureNotFound(options.structure.clone().unwrap_or_default())));
    }
    Ok(())
}

/// Split one dump line into the record name and item tokens.
/// Quoted strings become single tokens with the quotes retained.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut curr = String::new();
    let mut in_quote = false;
    let mut escaped = false;
    for c in line.chars() {
        if in_quote {
            curr.push(c);
            if escaped {
                escaped = false;
            } else if c=='\\' {
                escaped = true;
            } else if c=='"' {
                in_quote = false;
                tokens.push(curr.clone());
                curr.clear();
            }
        } else if c=='"' {
            curr.push(c);
            in_quote = true;
        } else if c.is_whitespace() {
            if curr.len() > 0 {
                tokens.push(curr.clone());
                curr.clear();
            }
        } else {
            curr.push(c);
        }
    }
    if curr.len() > 0 {
        tokens.push(curr);
    }
    tokens
}

fn unquote(token: &str,line_num: usize) -> Result<Vec<u8>,DYNERR> {
    if token.len() < 2 || !token.starts_with('"') || !token.ends_with('"') {
        return Err(Box::new(Error::Create("ascii input".to_string(),
            format!("line {}: expected a quoted string, found {}",line_num,token))));
    }
    Ok(parse_escaped_ascii(&token[1..token.len()-1]))
}

/// Read the text form back into a GDSII stream file.
pub fn convert_ascii_to_gds(text: &str,outfile: &str) -> STDRESULT {
    let mut writer = GdsWriter::create(outfile,FileType::Auto)?;
    let bad = |line_num: usize,msg: String| -> DYNERR {
        Box::new(Error::Create("ascii input".to_string(),format!("line {}: {}",line_num,msg)))
    };
    let mut ended = false;
    for (idx,raw_line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let line = raw_line.trim();
        if line.len()==0 || line.starts_with('#') {
            continue;
        }
        if ended {
            return Err(bad(line_num,"content after endlib".to_string()));
        }
        let tokens = tokenize(line);
        let rtype = match RecType::from_name(&tokens[0]) {
            Some(rt) => rt,
            None => return Err(bad(line_num,format!("unknown record name '{}'",tokens[0])))
        };
        let items = &tokens[1..];
        writer.begin_record(rtype)?;
        match rtype.info().kind {
            DataKind::None => {
                if items.len() > 0 {
                    return Err(bad(line_num,format!("{} takes no data",tokens[0])));
                }
            },
            DataKind::BitArray => {
                if items.len() != 1 {
                    return Err(bad(line_num,format!("{} takes one bit array",tokens[0])));
                }
                let val = match items[0].strip_prefix("0x") {
                    Some(hex) => u16::from_str_radix(hex,16),
                    None => items[0].parse::<u16>()
                }.map_err(|_| bad(line_num,format!("bad bit array '{}'",items[0])))?;
                writer.write_bit_array(val);
            },
            DataKind::Short => {
                for item in items {
                    let val = item.parse::<i16>()
                        .map_err(|_| bad(line_num,format!("bad 2-byte integer '{}'",item)))?;
                    writer.write_short(val);
                }
            },
            DataKind::Int => {
                for item in items {
                    let val = item.parse::<i32>()
                        .map_err(|_| bad(line_num,format!("bad 4-byte integer '{}'",item)))?;
                    writer.write_int(val);
                }
            },
            DataKind::Double => {
                for item in items {
                    let val = item.parse::<f64>()
                        .map_err(|_| bad(line_num,format!("bad real '{}'",item)))?;
                    writer.write_double(val)?;
                }
            },
            DataKind::Str => {
                for item in items {
                    writer.write_string(&unquote(item,line_num)?);
                }
            }
        }
        writer.end_record();
        if rtype==RecType::EndLib {
            ended = true;
        }
    }
    if !ended {
        return Err(Box::new(Error::Create(outfile.to_string(),"input has no endlib".to_string())));
    }
    writer.end_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn tokens() {
        let toks = tokenize("strname \"a b\\\"c\"  extra");
        assert_eq!(toks,vec!["strname","\"a b\\\"c\"","extra"]);
    }
    #[test]
    fn text_round_trip() {
        let dir = tempfile::tempdir().expect("no temp dir");
        let gds1 = dir.path().join("a.gds").to_str().unwrap().to_string();
        let text = "header 600\n\
            bgnlib 2004 1 1 0 0 0 2004 1 1 0 0 0\n\
            libname \"LIB\"\n\
            units 0.001 0.000000001\n\
            bgnstr 2004 1 1 0 0 0 2004 1 1 0 0 0\n\
            strname \"TOP\"\n\
            boundary\n\
            layer 1\n\
            datatype 0\n\
            xy 0 0 1000 0 1000 1000 0 1000 0 0\n\
            endel\n\
            endstr\n\
            endlib\n";
        convert_ascii_to_gds(text,&gds1).expect("ingest failed");
        let mut dumped = Vec::new();
        convert_gds_to_ascii(&gds1,&mut dumped,&GdsToAsciiOptions::default()).expect("dump failed");
        let dumped = String::from_utf8(dumped).expect("bad utf8");
        assert_eq!(dumped.trim(),text.trim());
    }
}
