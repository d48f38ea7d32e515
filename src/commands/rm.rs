//! `rm` subcommand: delete a file from a disk image.

use clap::ArgMatches;
use crate::{Error,STDRESULT};

pub fn rm(cmd: &ArgMatches) -> STDRESULT {
    let (mut op,order,path) = super::open_from_matches(cmd)?;
    let name = cmd.get_one::<String>("file").expect("file argument is required");
    let deleted = op.delete(name)?;
    if !deleted && !cmd.get_flag("missingok") {
        return Err(Box::new(Error::NotFound(format!("file \"{}\"",name))));
    }
    super::save_back(&path,op.as_ref(),order)
}
