use clap::ArgMatches;
use crate::conv::{convert_gds_to_oasis,convert_oasis_to_gds,GdsToOasisOptions};
use crate::oasis::validate::ValScheme;
use crate::STDRESULT;

pub fn gds2oasis(cmd: &ArgMatches) -> STDRESULT {
    let infile = cmd.get_one::<String>("infile").expect("infile is required");
    let outfile = cmd.get_one::<String>("outfile").expect("outfile is required");
    let options = GdsToOasisOptions {
        opt_level: cmd.get_one::<String>("level").expect("level has a default")
            .parse::<u8>().expect("level values are vetted"),
        delete_duplicates: cmd.get_flag("dedup"),
        val_scheme: match cmd.get_one::<String>("validation").expect("validation has a default").as_str() {
            "none" => ValScheme::None,
            "checksum32" => ValScheme::Checksum32,
            _ => ValScheme::Crc32
        }
    };
    convert_gds_to_oasis(infile,outfile,&options)
}

pub fn oasis2gds(cmd: &ArgMatches) -> STDRESULT {
    let infile = cmd.get_one::<String>("infile").expect("infile is required");
    let outfile = cmd.get_one::<String>("outfile").expect("outfile is required");
    convert_oasis_to_gds(infile,outfile)
}
