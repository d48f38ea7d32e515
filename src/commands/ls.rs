//! `ls` subcommand: catalog a disk or subdirectory.

use clap::ArgMatches;
use colored::*;
use crate::fs::{Descriptor,Filetype};
use crate::{Error,STDRESULT};

pub fn ls(cmd: &ArgMatches) -> STDRESULT {
    let (op,_order,_path) = super::open_from_matches(cmd)?;
    let subdir = cmd.get_one::<String>("subdir").map(|s| s.as_str()).unwrap_or("");
    if subdir.len() > 0 && !op.has_subdirs() {
        return Err(Box::new(Error::NotImplemented(format!(
            "subdirectories on {} disks",op.name()))));
    }
    let descs = op.catalog(subdir)?;
    for desc in &descs {
        if cmd.get_flag("long") {
            println!("{}",long_row(desc));
        } else {
            println!("{}",style_name(&desc.name,desc.file_type));
        }
    }
    Ok(())
}

fn style_name(name: &str, typ: Filetype) -> ColoredString {
    match typ {
        Filetype::DIRECTORY => name.blue().bold(),
        _ => name.normal()
    }
}

fn long_row(desc: &Descriptor) -> String {
    let lock = match desc.locked { true => "*", false => " " };
    let size = match desc.blocks {
        0 => desc.sectors,
        b => b
    };
    let length = match desc.length {
        l if l < 0 => "-".to_string(),
        l => l.to_string()
    };
    let name = match &desc.full_name {
        Some(full) => full.as_str(),
        None => desc.name.as_str()
    };
    format!("{}{:>4} {:>4} {:>8} {}",lock,desc.file_type.display(),size,length,
        style_name(name,desc.file_type))
}
