use clap::ArgMatches;
use crate::fio::FileType;
use crate::gdsii::rectypes::RecType;
use crate::gdsii::scanner::GdsScanner;
use crate::gdsii::writer::GdsWriter;
use crate::STDRESULT;

/// Copy a GDSII file record by record.  The interesting use is changing
/// the compression: `.gz` on either name selects gzip for that side.
pub fn copy(cmd: &ArgMatches) -> STDRESULT {
    let infile = cmd.get_one::<String>("infile").expect("infile is required");
    let outfile = cmd.get_one::<String>("outfile").expect("outfile is required");
    let mut scanner = GdsScanner::open(infile,FileType::Auto)?;
    let mut writer = GdsWriter::create(outfile,FileType::Auto)?;
    loop {
        let rec = scanner.get_next_record()?;
        let rtype = rec.rec_type();
        let body = rec.raw_body().to_vec();
        writer.begin_record(rtype)?;
        writer.write_body(&body);
        writer.end_record();
        if rtype==RecType::EndLib {
            break;
        }
    }
    writer.end_file()
}
