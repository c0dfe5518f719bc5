use clap::{arg,crate_version,ArgAction,Command,ValueHint};

pub fn build_cli() -> Command {
    let long_help = "lytkit is always invoked with exactly one of several subcommands.
File arguments ending in `.gz` are read or written gzip-compressed.
Set RUST_LOG environment variable to control logging level.
  levels: trace,debug,info,warn,error

Examples:
---------
copy and compress:     `lytkit copy chip.gds chip.gds.gz`
list the cells:        `lytkit cells chip.gds`
reference graph:       `lytkit dot chip.gds | dot -Tpng > chip.png`
text form and back:    `lytkit gds2ascii chip.gds chip.txt`
                       `lytkit ascii2gds chip.txt chip.gds`
convert to OASIS:      `lytkit gds2oasis chip.gds chip.oas`
check a signature:     `lytkit validate chip.oas`";
    let mut main_cmd = Command::new("lytkit")
        .about("Reads, writes, and converts GDSII and OASIS layout files.")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(
        Command::new("copy")
            .arg(arg!(<infile> "GDSII file to read").value_hint(ValueHint::FilePath))
            .arg(arg!(<outfile> "GDSII file to write").value_hint(ValueHint::FilePath))
            .about("copy a GDSII file record by record"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("cells")
            .arg(arg!(<infile> "GDSII file to read").value_hint(ValueHint::FilePath))
            .about("print one structure name per line"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("dot")
            .arg(arg!(<infile> "GDSII file to read").value_hint(ValueHint::FilePath))
            .about("print the structure reference graph as a graphviz digraph"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("recstats")
            .arg(arg!(<infile>... "GDSII files to read").value_hint(ValueHint::FilePath))
            .about("count records and bytes by record type"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("gds2ascii")
            .arg(arg!(-a --addresses "print the file offset of each record").action(ArgAction::SetTrue))
            .arg(arg!(-s --structure <NAME> "dump only this structure").required(false))
            .arg(arg!(-u --units "print XY coordinates in user units").action(ArgAction::SetTrue))
            .arg(arg!(<infile> "GDSII file to read").value_hint(ValueHint::FilePath))
            .arg(arg!([outfile] "text file to write, stdout if omitted").value_hint(ValueHint::FilePath))
            .about("dump a GDSII file as text"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("ascii2gds")
            .arg(arg!(<infile> "text file to read").value_hint(ValueHint::FilePath))
            .arg(arg!(<outfile> "GDSII file to write").value_hint(ValueHint::FilePath))
            .about("rebuild a GDSII file from its text form"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("gds2oasis")
            .arg(arg!(<infile> "GDSII file to read").value_hint(ValueHint::FilePath))
            .arg(arg!(<outfile> "OASIS file to write").value_hint(ValueHint::FilePath))
            .arg(arg!(-l --level <LEVEL> "pattern-recognition effort")
                .value_parser(["0","1","2"]).default_value("2"))
            .arg(arg!(-d --dedup "drop coincident copies of an element").action(ArgAction::SetTrue))
            .arg(arg!(-v --validation <SCHEME> "signature for the END record")
                .value_parser(["none","crc32","checksum32"]).default_value("crc32"))
            .about("convert GDSII to OASIS"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("oasis2gds")
            .arg(arg!(<infile> "OASIS file to read").value_hint(ValueHint::FilePath))
            .arg(arg!(<outfile> "GDSII file to write").value_hint(ValueHint::FilePath))
            .about("convert OASIS to GDSII"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("print")
            .arg(arg!(-c --cell <NAME> "print only this cell").required(false))
            .arg(arg!(-l --nolayernames "ignore LAYERNAME records").action(ArgAction::SetTrue))
            .arg(arg!(-n --nonstrict "do not insist on strict conformance").action(ArgAction::SetTrue))
            .arg(arg!(-t --notext "ignore TEXT and TEXTSTRING records").action(ArgAction::SetTrue))
            .arg(arg!(-v --novalidation "ignore the validation signature").action(ArgAction::SetTrue))
            .arg(arg!(-x --noextensions "ignore XNAME, XELEMENT, and XGEOMETRY records").action(ArgAction::SetTrue))
            .arg(arg!(<infile> "OASIS file to read").value_hint(ValueHint::FilePath))
            .about("print the contents of an OASIS file"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("validate")
            .arg(arg!(<infile> "OASIS file to read").value_hint(ValueHint::FilePath))
            .about("verify the CRC or checksum of an OASIS file"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("completions")
            .arg(arg!(<shell> "shell to target").value_parser(["bash","elvish","fish","powershell","zsh"]))
            .about("write script for shell completions to stdout"),
    );
    main_cmd
}
