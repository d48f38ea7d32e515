//! `dump` subcommand: write a file's raw contents to stdout.
//! A hex display is substituted when stdout is a terminal.

use std::io::Write;
use clap::ArgMatches;
use crate::STDRESULT;

pub fn dump(cmd: &ArgMatches) -> STDRESULT {
    let (op,_order,_path) = super::open_from_matches(cmd)?;
    let name = cmd.get_one::<String>("file").expect("file argument is required");
    let file = op.get_file(name)?;
    if atty::is(atty::Stream::Stdout) {
        crate::display_block(file.start_address,&file.data);
    } else {
        std::io::stdout().write_all(&file.data)?;
    }
    Ok(())
}
