//! `applesoft decode` subcommand: detokenize a program to a LISTing.

use clap::ArgMatches;
use crate::lang;
use crate::lang::applesoft;
use crate::STDRESULT;

pub fn decode(cmd: &ArgMatches) -> STDRESULT {
    let file = cmd.get_one::<String>("file").expect("file argument is required");
    let location = super::parse_address(cmd.get_one::<String>("location").expect("location has a default"))?;
    let contents = super::file_contents_or_stdin(file)?;
    let listing = applesoft::decode(&contents,location)?;
    if cmd.get_flag("raw") {
        print!("{}",listing);
    } else {
        print!("{}",lang::chevron_control_codes(&listing.to_string()));
    }
    Ok(())
}
