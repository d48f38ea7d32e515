//! # Marshaling Module
//!
//! Typed encode/decode of fixed-layout records to and from sector and block
//! buffers.  Directory structures implement the `DiskStruct` trait, and the
//! helpers here take care of positioning the flattened bytes within the
//! underlying image buffer.

use thiserror::Error;
use crate::img;
use crate::{DYNERR,STDRESULT};

pub const SECTOR_SIZE: usize = 256;
pub const BLOCK_SIZE: usize = 512;

/// Enumerates errors in flattening or unflattening a record.
#[derive(Error,Debug)]
pub enum DiskStructError {
    #[error("unexpected size {got} for {record} (want {want})")]
    UnexpectedSize { record: &'static str, want: usize, got: usize },
    #[error("illegal value in {0}")]
    IllegalValue(&'static str)
}

/// Record with a fixed on-disk layout.  `to_bytes` must produce exactly
/// `Self::LEN` bytes and `from_bytes` must consume exactly that many, so
/// that records can be packed end to end within a sector or block.
pub trait DiskStruct {
    /// Length of the flattened record.
    const LEN: usize;
    /// Create the record from flattened bytes, typically read from disk.
    fn from_bytes(dat: &[u8]) -> Result<Self,DiskStructError> where Self: Sized;
    /// Return the flattened bytes, typically to be written to disk.
    fn to_bytes(&self) -> Vec<u8>;
}

/// Check the byte count handed to a record decoder.
pub fn verify_len(record: &'static str, dat: &[u8], want: usize) -> Result<(),DiskStructError> {
    if dat.len() != want {
        return Err(DiskStructError::UnexpectedSize { record, want, got: dat.len() });
    }
    Ok(())
}

/// Read a sector from a disk image and unflatten it into a record.
pub fn unmarshal_sector<T: DiskStruct>(diskbytes: &[u8], track: u8, sector: u8) -> Result<T,DYNERR> {
    let dat = img::read_sector(diskbytes, track, sector)?;
    Ok(T::from_bytes(&dat)?)
}

/// Flatten a record and write it to its sector on a disk image.
pub fn marshal_sector<T: DiskStruct>(diskbytes: &mut [u8], rec: &T, track: u8, sector: u8) -> STDRESULT {
    img::write_sector(diskbytes, track, sector, &rec.to_bytes())
}

/// Read a block from a block device and unflatten it into a record.
pub fn unmarshal_block<T: DiskStruct>(devicebytes: &[u8], index: u16) -> Result<T,DYNERR> {
    let dat = img::read_block(devicebytes, index)?;
    Ok(T::from_bytes(&dat)?)
}

/// Flatten a record and write it to its block on a block device.
pub fn marshal_block<T: DiskStruct>(devicebytes: &mut [u8], rec: &T, index: u16) -> STDRESULT {
    img::write_block(devicebytes, index, &rec.to_bytes())
}
