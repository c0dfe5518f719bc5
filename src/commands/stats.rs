use std::collections::HashSet;
use clap::ArgMatches;
use crate::fio::FileType;
use crate::gdsii::parser::{GdsParser,GdsGraphBuilder};
use crate::gdsii::rectypes::{RecType,MAX_REC_TYPE};
use crate::gdsii::scanner::GdsScanner;
use crate::gdsii::RECORD_HEADER_LENGTH as HEADER_LEN;
use crate::STDRESULT;

/// Print one structure name per line, in order of appearance.
pub fn cells(cmd: &ArgMatches) -> STDRESULT {
    let infile = cmd.get_one::<String>("infile").expect("infile is required");
    let mut parser = GdsParser::open(infile,FileType::Auto,None)?;
    let index = parser.make_index()?;
    for name in index.names() {
        println!("{}",name);
    }
    Ok(())
}

/// Emits one graph edge per referenced structure, each reference counted
/// once per referencing structure.
struct DotGraphBuilder {
    curr_cell: String,
    srefs: HashSet<String>
}

impl GdsGraphBuilder for DotGraphBuilder {
    fn begin_library(&mut self,libname: &str) -> STDRESULT {
        println!("digraph \"{}\" {{",libname);
        Ok(())
    }
    fn enter_structure(&mut self,sname: &str) -> STDRESULT {
        self.srefs.clear();
        println!("    \"{}\";",sname);
        self.curr_cell = sname.to_string();
        Ok(())
    }
    fn add_sref(&mut self,sname: &str) -> STDRESULT {
        if self.srefs.insert(sname.to_string()) {
            println!("    \"{}\" -> \"{}\";",self.curr_cell,sname);
        }
        Ok(())
    }
    fn end_library(&mut self) -> STDRESULT {
        println!("}}");
        Ok(())
    }
}

/// Print the structure reference DAG in graphviz `dot` form.
pub fn dot(cmd: &ArgMatches) -> STDRESULT {
    let infile = cmd.get_one::<String>("infile").expect("infile is required");
    let mut parser = GdsParser::open(infile,FileType::Auto,None)?;
    let mut builder = DotGraphBuilder { curr_cell: String::new(), srefs: HashSet::new() };
    parser.build_structure_graph(&mut builder)
}

/// Per-record-type count and byte totals for each file.
pub fn recstats(cmd: &ArgMatches) -> STDRESULT {
    let infiles: Vec<&String> = cmd.get_many::<String>("infile")
        .expect("infile is required").collect();
    for infile in infiles {
        let mut counts = [0u64;MAX_REC_TYPE as usize + 1];
        let mut bytes = [0u64;MAX_REC_TYPE as usize + 1];
        let mut scanner = GdsScanner::open(infile,FileType::Auto)?;
        loop {
            let rec = scanner.get_next_record()?;
            let rtype = rec.rec_type();
            counts[rtype as usize] += 1;
            bytes[rtype as usize] += (rec.len() + HEADER_LEN) as u64;
            if rtype==RecType::EndLib {
                break;
            }
        }
        println!("{}:",infile);
        println!("{:<16}{:>12}{:>14}","record","count","bytes");
        let mut total_count = 0;
        let mut total_bytes = 0;
        for t in 0..counts.len() {
            if counts[t] > 0 {
                println!("{:<16}{:>12}{:>14}",RecType::name_of(t as u8).expect("unreachable"),
                    counts[t],bytes[t]);
                total_count += counts[t];
                total_bytes += bytes[t];
            }
        }
        println!("{:<16}{:>12}{:>14}","total",total_count,total_bytes);
    }
    Ok(())
}
