//! # Command Module
//!
//! One submodule per CLI subcommand, plus the file helpers they share.
//! The core never opens files; everything that touches a path or a standard
//! stream lives here.

pub mod ls;
pub mod dump;
pub mod put;
pub mod rm;
pub mod reorder;
pub mod filetypes;
pub mod mksd;
pub mod applesoft;
pub mod nakedos;

use std::io::{Read,Write};
use std::str::FromStr;
use clap::ArgMatches;
use crate::fs::{DiskOrder,Operator};
use crate::{DYNERR,Error,STDRESULT};

/// Contents of a file, or of stdin if the name is `-`.
pub fn file_contents_or_stdin(s: &str) -> Result<Vec<u8>,DYNERR> {
    if s == "-" {
        let mut contents = Vec::new();
        std::io::stdin().read_to_end(&mut contents)?;
        return Ok(contents);
    }
    Ok(std::fs::read(s)?)
}

/// Write contents to a file, or to stdout if the name is `-`.
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_output(filename: &str, contents: &[u8], force: bool) -> STDRESULT {
    if filename == "-" {
        std::io::stdout().write_all(contents)?;
        return Ok(());
    }
    if !force && std::path::Path::new(filename).exists() {
        return Err(Box::new(Error::AlreadyExists(format!(
            "cannot overwrite file \"{}\" without --force (-f)",filename))));
    }
    std::fs::write(filename,contents)?;
    Ok(())
}

/// Read the image named in the matches and run it through the dispatcher.
/// Returns the operator, the disk-file order it was found in, and the path.
pub fn open_from_matches(cmd: &ArgMatches) -> Result<(Box<dyn Operator>,DiskOrder,String),DYNERR> {
    let path = cmd.get_one::<String>("image").expect("image argument is required").to_string();
    let order = DiskOrder::from_str(cmd.get_one::<String>("order").map(|s| s.as_str()).unwrap_or("auto"))?;
    let system = cmd.get_one::<String>("system").map(|s| s.as_str()).unwrap_or("auto").to_string();
    let filebytes = file_contents_or_stdin(&path)?;
    let factories = crate::operator_factories();
    let (op,found_order) = crate::open_image(filebytes,&path,order,&system,&factories)?;
    Ok((op,found_order,path))
}

/// Swizzle an operator's buffer back to its disk-file order and write it
/// over the image it came from (stdout if the image came from stdin).
pub fn save_back(path: &str, op: &dyn Operator, disk_file_order: DiskOrder) -> STDRESULT {
    let diskbytes = crate::to_disk_order(op,disk_file_order)?;
    write_output(path,&diskbytes,true)
}

/// Parse a 16-bit address given in decimal, or in hex with an 0x or $ prefix.
pub fn parse_address(s: &str) -> Result<u16,DYNERR> {
    let parsed = match s {
        h if h.starts_with("0x") || h.starts_with("0X") => u16::from_str_radix(&h[2..],16),
        h if h.starts_with("$") => u16::from_str_radix(&h[1..],16),
        d => u16::from_str(d)
    };
    match parsed {
        Ok(addr) => Ok(addr),
        Err(_) => Err(Box::new(Error::OutOfRange(format!("address \"{}\"",s))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses() {
        assert_eq!(parse_address("0x6000").unwrap(),0x6000);
        assert_eq!(parse_address("$2000").unwrap(),0x2000);
        assert_eq!(parse_address("2049").unwrap(),0x801);
        assert!(parse_address("0x10000").is_err());
        assert!(parse_address("banana").is_err());
    }
}
