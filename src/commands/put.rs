//! `put` subcommand: write a local file into a disk image.

use std::str::FromStr;
use clap::ArgMatches;
use log::info;
use crate::fs::{Descriptor,FileInfo,Filetype};
use crate::STDRESULT;

pub fn put(cmd: &ArgMatches) -> STDRESULT {
    let (mut op,order,path) = super::open_from_matches(cmd)?;
    let target = cmd.get_one::<String>("target").expect("target argument is required");
    let source = cmd.get_one::<String>("source").expect("source argument is required");
    let contents = super::file_contents_or_stdin(source)?;
    let file_type = Filetype::from_str(cmd.get_one::<String>("type").expect("type has a default"))?;
    let info = FileInfo {
        descriptor: Descriptor {
            name: target.to_string(),
            full_name: None,
            sectors: 0,
            blocks: 0,
            length: contents.len() as i64,
            locked: false,
            file_type
        },
        data: contents,
        start_address: 0
    };
    let existed = op.put_file(&info,cmd.get_flag("overwrite"))?;
    if existed {
        info!("replaced existing file \"{}\"",target);
    }
    super::save_back(&path,op.as_ref(),order)
}
