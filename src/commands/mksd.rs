//! `mksd` subcommand: build a "Standard Delivery" boot disk.
//!
//! The disk boots through a one-sector stage-1 loader that reads the payload
//! straight off the physical sectors and jumps to it.  See
//! <https://github.com/peterferrie/standard-delivery> for the scheme.

use clap::ArgMatches;
use log::info;
use crate::bios::skew;
use crate::fs::DiskOrder;
use crate::img;
use crate::{Error,STDRESULT};

/// stage-1 loader, followed by the start address and the payload's
/// per-sector address-high bytes
const LOADER: [u8;77] = [
    0x01, 0xa8, 0xee, 0x06, 0x08, 0xad, 0x4e, 0x08, 0xc9, 0xc0, 0xf0, 0x40, 0x85, 0x27, 0xc8,
    0xc0, 0x10, 0x90, 0x09, 0xf0, 0x05, 0x20, 0x2f, 0x08, 0xa8, 0x2c, 0xa0, 0x01, 0x84, 0x3d,
    0xc8, 0xa5, 0x27, 0xf0, 0xdf, 0x8a, 0x4a, 0x4a, 0x4a, 0x4a, 0x09, 0xc0, 0x48, 0xa9, 0x5b,
    0x48, 0x60, 0xe6, 0x41, 0x06, 0x40, 0x20, 0x37, 0x08, 0x18, 0x20, 0x3c, 0x08, 0xe6, 0x40,
    0xa5, 0x40, 0x29, 0x03, 0x2a, 0x05, 0x2b, 0xa8, 0xb9, 0x80, 0xc0, 0xa9, 0x30, 0x4c, 0xa8,
    0xfc, 0x4c
];

pub fn mksd(cmd: &ArgMatches) -> STDRESULT {
    let image = cmd.get_one::<String>("image").expect("image argument is required");
    let binary = cmd.get_one::<String>("binary").expect("binary argument is required");
    let address = super::parse_address(cmd.get_one::<String>("address").expect("address has a default"))?;
    let mut start = super::parse_address(cmd.get_one::<String>("start").expect("start has a default"))?;
    if start == 0xffff {
        start = address;
    }
    let mut contents = super::file_contents_or_stdin(binary)?;
    if address % 256 != 0 {
        return Err(Box::new(Error::OutOfRange(format!(
            "address {} ({:04X}) not on a page boundary",address,address))));
    }
    if start < address {
        return Err(Box::new(Error::OutOfRange(format!(
            "start address {:04X} < load address {:04X}",start,address))));
    }
    if start as usize >= address as usize + contents.len() {
        return Err(Box::new(Error::OutOfRange(format!(
            "start address {:04X} is beyond load address {:04X} + file length = {:04X}",
            start,address,address as usize + contents.len()))));
    }
    if start as usize + contents.len() > 0xc000 {
        return Err(Box::new(Error::OutOfRange(format!(
            "start address {:04X} + file length {:04X} = {:04X}, but we can't load past page 0xBF00",
            start,contents.len(),start as usize + contents.len()))));
    }
    let sectors = (contents.len() + 255) / 256;
    let mut loader = LOADER.to_vec();
    loader.push(start as u8);
    loader.push((start >> 8) as u8);
    if loader.len() + sectors + 1 > 256 {
        return Err(Box::new(Error::OutOfSpace(format!(
            "file \"{}\" is {} bytes long, max is {}",binary,contents.len(),(255-loader.len())*256))));
    }
    while contents.len() % 256 != 0 {
        contents.push(0);
    }
    let mut diskbytes = vec![0;img::FLOPPY_DISK_BYTES];
    // payload pages go on every other physical sector, folding back to the
    // odd sectors, so the drive can keep up without a full revolution
    let mut track: u8 = 0;
    let mut sector: u8 = 0;
    for i in (0..contents.len()).step_by(256) {
        sector += 2;
        if sector >= img::FLOPPY_SECTORS as u8 {
            sector = (img::FLOPPY_SECTORS as u8 + 1) - sector;
            if sector == 0 {
                track += 1;
                if track >= img::FLOPPY_TRACKS as u8 {
                    return Err(Box::new(Error::OutOfSpace("ran out of tracks".to_string())));
                }
            }
        }
        let page_addr = address as usize + i;
        loader.push((page_addr >> 8) as u8);
        img::write_sector(&mut diskbytes,track,sector,&contents[i..i+256])?;
    }
    loader.push(0xc0);
    loader.resize(256,0);
    img::write_sector(&mut diskbytes,0,0,&loader)?;
    let order = match parse_order(cmd.get_one::<String>("order").expect("order has a default")) {
        Some(order) => order,
        None => order_from_filename(image)
    };
    info!("writing {} sectors of payload in {} order",sectors,order);
    let rawbytes = img::swizzle(&diskbytes,skew::physical_to_logical(order))?;
    super::write_output(image,&rawbytes,true)
}

fn parse_order(s: &str) -> Option<DiskOrder> {
    match s {
        "do" => Some(DiskOrder::DOS),
        "po" => Some(DiskOrder::ProDOS),
        _ => None
    }
}

fn order_from_filename(filename: &str) -> DiskOrder {
    match crate::file_extension(filename).as_str() {
        ".po" => DiskOrder::ProDOS,
        _ => DiskOrder::DOS
    }
}
