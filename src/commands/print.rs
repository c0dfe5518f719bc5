use clap::ArgMatches;
use crate::oasis::parser::{OasisParser,OasisParserOptions};
use crate::oasis::printer::OasisPrinter;
use crate::oasis::validate::ValScheme;
use crate::{DYNERR,STDRESULT};
use super::CommandError;

fn warner() -> Option<Box<dyn FnMut(&str)>> {
    Some(Box::new(|msg: &str| eprintln!("warning: {}",msg)))
}

pub fn print(cmd: &ArgMatches) -> STDRESULT {
    let infile = cmd.get_one::<String>("infile").expect("infile is required");
    let mut options = OasisParserOptions::default();
    options.strict_conformance = !cmd.get_flag("nonstrict");
    options.want_validation = !cmd.get_flag("novalidation");
    options.want_text = !cmd.get_flag("notext");
    options.want_layer_name = !cmd.get_flag("nolayernames");
    options.want_extensions = !cmd.get_flag("noextensions");
    let mut parser = OasisParser::open(infile,warner(),&options)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut printer = OasisPrinter::new(&mut out);
    match cmd.get_one::<String>("cell") {
        Some(cellname) => match parser.parse_cell(cellname,&mut printer)? {
            true => Ok(()),
            false => {
                eprintln!("file '{}' has no cell '{}'",infile,cellname);
                Err(Box::new(CommandError::InvalidCommand) as DYNERR)
            }
        },
        None => parser.parse_file(&mut printer)
    }
}

pub fn validate(cmd: &ArgMatches) -> STDRESULT {
    let infile = cmd.get_one::<String>("infile").expect("infile is required");
    let mut options = OasisParserOptions::default();
    options.strict_conformance = false;
    let parser = OasisParser::open(infile,warner(),&options)?;
    // validate_file fails if the stored signature does not match
    let val = parser.validate_file()?;
    match val.scheme {
        ValScheme::None => println!("the file has no validation signature"),
        _ => println!("{} 0x{:08x} validated",val.scheme.name(),val.signature)
    }
    Ok(())
}
