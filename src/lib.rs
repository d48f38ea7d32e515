//! # `a2dsk` main library
//!
//! This library reads, inspects, and modifies Apple II disk images.
//! It understands the on-disk structures of three vintage file systems
//! and the sector orderings used to store images on modern hosts.
//!
//! ## Architecture
//!
//! Disk operations are built around two trait objects:
//! * `fs::Operator` imposes a file system on a byte buffer that is already
//!   in that file system's preferred logical sector order
//! * `fs::OperatorFactory` probes a buffer and constructs the matching operator
//!
//! The `open_image` dispatcher takes raw file bytes, tries candidate
//! (sector order, file system) pairs, and returns the first operator that
//! matches.  When an `Operator` is created it takes ownership of the buffer;
//! changes are not permanent until the caller swizzles the buffer back to
//! the disk-file order with `to_disk_order` and writes it out.
//!
//! ## File Systems
//!
//! As of this writing `a2dsk` supports
//! * DOS 3.3 (catalog and file reading)
//! * NakedOS/Super-Mon (full read/write, including the symbol table)
//! * ProDOS (catalog only, subdirectories included)
//!
//! ## Disk Images
//!
//! * DSK, DO, PO (143,360-byte floppies in DOS, ProDOS, or raw sector order)
//! * HDV (ProDOS block devices up to 32 MiB)
//! * WOZ version 1 (decoded by `img::woz`, independent of the file systems)

pub mod bios;
pub mod img;
pub mod marshal;
pub mod fs;
pub mod lang;
pub mod commands;

use fs::{DiskOrder,Operator,OperatorFactory};
use log::{debug,info,warn};

pub type DYNERR = Box<dyn std::error::Error>;
pub type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Size of a 13-sector disk image, which we recognize only to refuse it.
const FLOPPY_DISK_BYTES_13: usize = 35 * 13 * 256;
/// Largest ProDOS block device we will open, in blocks (32 MiB).
const MAX_HDV_BLOCKS: usize = 65536;

/// Enumerates everything that can go wrong while interpreting a disk image.
/// Callers that need to branch on the failure mode downcast to this type.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("not a WOZ file")]
    NotAWozFile,
    #[error("structure is damaged: {0}")]
    Corruption(String),
    #[error("checksum mismatch: declared {declared:#010X}, computed {computed:#010X}")]
    CrcMismatch { declared: u32, computed: u32 },
    #[error("address out of range: {0}")]
    OutOfRange(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("file already exists: {0}")]
    AlreadyExists(String),
    #[error("out of space: {0}")]
    OutOfSpace(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid sector order: {0}")]
    InvalidOrder(String),
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("symbol table is full")]
    SymbolTableFull,
    #[error("could not match any disk order and file system")]
    NoMatch,
    #[error("i/o error")]
    Io(#[from] std::io::Error),
}

/// Return the standard list of operator factories, in probing order.
pub fn operator_factories() -> Vec<Box<dyn OperatorFactory>> {
    vec![
        Box::new(fs::dos3::Factory::new()),
        Box::new(fs::nakedos::Factory::new()),
        Box::new(fs::prodos::Factory::new()),
    ]
}

/// Open a disk or device image, using the provided ordering and system type.
/// `filename` is used only for extension hints; pass an empty string if unknown.
/// On success returns the operator and the disk-file order the image was found in,
/// which is what `to_disk_order` needs at write-back time.
pub fn open_image(filebytes: Vec<u8>, filename: &str, order: DiskOrder, system: &str,
    factories: &[Box<dyn OperatorFactory>]) -> Result<(Box<dyn Operator>,DiskOrder),DYNERR> {
    let ext = file_extension(filename);
    let size = filebytes.len();
    if size == img::FLOPPY_DISK_BYTES {
        return open_do_or_po(filebytes, order, system, &ext, factories);
    }
    if size == FLOPPY_DISK_BYTES_13 {
        return Err(Box::new(Error::NotImplemented("13-sector disk images".to_string())));
    }
    if ext == ".hdv" {
        return open_hdv(filebytes, order, system, factories);
    }
    warn!("image size {} does not match any supported container",size);
    Err(Box::new(Error::NoMatch))
}

/// Open a ProDOS block device image (`.hdv`).
fn open_hdv(rawbytes: Vec<u8>, order: DiskOrder, system: &str,
    factories: &[Box<dyn OperatorFactory>]) -> Result<(Box<dyn Operator>,DiskOrder),DYNERR> {
    let size = rawbytes.len();
    if size % marshal::BLOCK_SIZE > 0 {
        return Err(Box::new(Error::OutOfRange(format!(
            "hdv images must be a multiple of 512 bytes: {} % 512 == {}",size,size%512))));
    }
    if size / marshal::BLOCK_SIZE > MAX_HDV_BLOCKS {
        return Err(Box::new(Error::OutOfRange(format!(
            "hdv images may have up to {} blocks; got {}",MAX_HDV_BLOCKS,size/512))));
    }
    if order != DiskOrder::Auto && order != DiskOrder::ProDOS {
        return Err(Box::new(Error::InvalidOrder(format!("cannot open hdv in `{}` order",order))));
    }
    if system != "auto" && system != "prodos" {
        return Err(Box::new(Error::NoMatch));
    }
    for factory in factories {
        if factory.name() == "prodos" {
            let op = factory.operator(rawbytes)?;
            return Ok((op,DiskOrder::ProDOS));
        }
    }
    Err(Box::new(Error::NoMatch))
}

/// Open a 143,360-byte floppy image, trying candidate orders and file systems.
fn open_do_or_po(rawbytes: Vec<u8>, order: DiskOrder, system: &str, ext: &str,
    factories: &[Box<dyn OperatorFactory>]) -> Result<(Box<dyn Operator>,DiskOrder),DYNERR> {
    let candidates: Vec<&Box<dyn OperatorFactory>> = factories.iter()
        .filter(|f| system=="auto" || system==f.name())
        .collect();
    if candidates.len() == 0 {
        warn!("no file system named `{}`",system);
        return Err(Box::new(Error::NoMatch));
    }
    let orders: Vec<DiskOrder> = match order {
        DiskOrder::DOS | DiskOrder::ProDOS | DiskOrder::Raw => vec![order],
        DiskOrder::Auto => match ext {
            ".po" => vec![DiskOrder::ProDOS],
            ".do" => vec![DiskOrder::DOS],
            ".dsk" | "" => vec![DiskOrder::DOS,DiskOrder::ProDOS],
            _ => {
                warn!("unknown disk image extension `{}`",ext);
                return Err(Box::new(Error::NoMatch));
            }
        }
    };
    let single = orders.len()==1 && system!="auto";
    for order in &orders {
        let physical = img::swizzle(&rawbytes, bios::skew::logical_to_physical(*order))?;
        for factory in &candidates {
            let diskbytes = img::swizzle(&physical, bios::skew::physical_to_logical(factory.disk_order()))?;
            if single {
                debug!("opening with order={}, system={}",order,factory.name());
                let op = factory.operator(diskbytes)?;
                return Ok((op,*order));
            }
            debug!("testing whether order={}, system={} seems to match",order,factory.name());
            if factory.seems_to_match(&diskbytes) {
                match factory.operator(diskbytes) {
                    Ok(op) => {
                        info!("identified {} file system in {} order",factory.name(),order);
                        return Ok((op,*order));
                    },
                    Err(e) => debug!("order={}, system={} matched but failed to open: {}",order,factory.name(),e)
                }
            }
        }
    }
    Err(Box::new(Error::NoMatch))
}

/// Take an operator's buffer from its logical order back to the given
/// disk-file order.  Buffers that are not floppy-sized pass through unchanged.
pub fn to_disk_order(op: &dyn Operator, disk_file_order: DiskOrder) -> Result<Vec<u8>,DYNERR> {
    let logical = op.get_bytes();
    if logical.len() != img::FLOPPY_DISK_BYTES {
        return Ok(logical.to_vec());
    }
    let physical = img::swizzle(logical, bios::skew::logical_to_physical(op.disk_order()))?;
    img::swizzle(&physical, bios::skew::physical_to_logical(disk_file_order))
}

/// Lower-case extension of a path, with the leading dot, or empty.
pub fn file_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem,ext)) if stem.len()>0 && !ext.contains('/') => format!(".{}",ext.to_lowercase()),
        _ => String::new()
    }
}

/// Display binary to stdout in columns of hex, +ascii, and -ascii
pub fn display_block(start_addr: u16, block: &[u8]) {
    let mut slice_start = 0;
    while slice_start < block.len() {
        let row_label = start_addr as usize + slice_start;
        let slice_end = usize::min(slice_start+16,block.len());
        let slice = &block[slice_start..slice_end];
        let txt: Vec<u8> = slice.iter().map(|c| match *c {
            x if x<32 => '.' as u8,
            x if x<127 => x,
            _ => '.' as u8
        }).collect();
        let neg_txt: Vec<u8> = slice.iter().map(|c| match *c {
            x if x>=160 && x<255 => x - 128,
            _ => '.' as u8
        }).collect();
        print!("{:04X} : ",row_label);
        for byte in slice {
            print!("{:02X} ",byte);
        }
        for _blank in slice_end..slice_start+16 {
            print!("   ");
        }
        print!("|+| {} ",String::from_utf8_lossy(&txt));
        for _blank in slice_end..slice_start+16 {
            print!(" ");
        }
        println!("|-| {}",String::from_utf8_lossy(&neg_txt));
        slice_start += 16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_parsing() {
        assert_eq!(file_extension("disk.dsk"),".dsk");
        assert_eq!(file_extension("DISK.PO"),".po");
        assert_eq!(file_extension("archive.tar.hdv"),".hdv");
        assert_eq!(file_extension("noext"),"");
        assert_eq!(file_extension(".hidden"),"");
    }
}
