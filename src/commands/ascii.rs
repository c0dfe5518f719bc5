use std::io::Write;
use clap::ArgMatches;
use crate::gdsii::ascii::{convert_gds_to_ascii,convert_ascii_to_gds,GdsToAsciiOptions};
use crate::STDRESULT;

pub fn gds2ascii(cmd: &ArgMatches) -> STDRESULT {
    let infile = cmd.get_one::<String>("infile").expect("infile is required");
    let options = GdsToAsciiOptions {
        show_offsets: cmd.get_flag("addresses"),
        convert_units: cmd.get_flag("units"),
        structure: cmd.get_one::<String>("structure").cloned()
    };
    match cmd.get_one::<String>("outfile") {
        Some(outfile) => {
            let mut out = std::io::BufWriter::new(std::fs::File::create(outfile)?);
            convert_gds_to_ascii(infile,&mut out,&options)?;
            out.flush()?;
            Ok(())
        },
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            convert_gds_to_ascii(infile,&mut out,&options)
        }
    }
}

pub fn ascii2gds(cmd: &ArgMatches) -> STDRESULT {
    let infile = cmd.get_one::<String>("infile").expect("infile is required");
    let outfile = cmd.get_one::<String>("outfile").expect("outfile is required");
    let text = std::fs::read_to_string(infile)?;
    convert_ascii_to_gds(&text,outfile)
}
