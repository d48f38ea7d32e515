//! # Disk Image Module
//!
//! Byte-level access to disk image buffers.  A floppy buffer is always
//! addressed track-major, 16 sectors of 256 bytes per track; whether those
//! sectors are in physical, DOS-logical, or ProDOS-logical order is the
//! caller's concern.  Block devices are addressed by 512-byte block index.
//!
//! `swizzle` moves a floppy buffer between sector orderings.  On a floppy
//! wrapped as a ProDOS block device, block `b` occupies logical sectors
//! `(b*2 % 16, b*2 % 16 + 1)` of track `b*2 / 16`; once the buffer is in
//! ProDOS logical order those two sectors are contiguous, so block access
//! reduces to flat 512-byte addressing.

pub mod woz;

use crate::Error;
use crate::marshal::{SECTOR_SIZE,BLOCK_SIZE};
use crate::{DYNERR,STDRESULT};

pub const FLOPPY_TRACKS: usize = 35;
/// Sectors per track
pub const FLOPPY_SECTORS: usize = 16;
/// Bytes per track
pub const FLOPPY_TRACK_BYTES: usize = FLOPPY_SECTORS * SECTOR_SIZE;
/// Number of bytes in a standard 16-sector floppy image
pub const FLOPPY_DISK_BYTES: usize = FLOPPY_TRACKS * FLOPPY_TRACK_BYTES;

/// A pair of track/sector bytes.
#[derive(PartialEq,Eq,Hash,Clone,Copy,Debug)]
pub struct TrackSector {
    pub track: u8,
    pub sector: u8
}

/// Read 256 bytes from the given track and sector.
pub fn read_sector(diskbytes: &[u8], track: u8, sector: u8) -> Result<Vec<u8>,DYNERR> {
    let start = track as usize * FLOPPY_TRACK_BYTES + sector as usize * SECTOR_SIZE;
    let end = start + SECTOR_SIZE;
    if diskbytes.len() < end {
        return Err(Box::new(Error::OutOfRange(format!(
            "cannot read track {} sector {} (bytes {}-{}) from image of length {}",
            track,sector,start,end,diskbytes.len()))));
    }
    Ok(diskbytes[start..end].to_vec())
}

/// Write 256 bytes to the given track and sector.
pub fn write_sector(diskbytes: &mut [u8], track: u8, sector: u8, dat: &[u8]) -> STDRESULT {
    if dat.len() != SECTOR_SIZE {
        return Err(Box::new(Error::OutOfRange(format!(
            "write_sector called with {} bytes; want {}",dat.len(),SECTOR_SIZE))));
    }
    let start = track as usize * FLOPPY_TRACK_BYTES + sector as usize * SECTOR_SIZE;
    let end = start + SECTOR_SIZE;
    if diskbytes.len() < end {
        return Err(Box::new(Error::OutOfRange(format!(
            "cannot write track {} sector {} (bytes {}-{}) to image of length {}",
            track,sector,start,end,diskbytes.len()))));
    }
    diskbytes[start..end].copy_from_slice(dat);
    Ok(())
}

/// Read 512 bytes from the given block of a block device.
pub fn read_block(devicebytes: &[u8], index: u16) -> Result<Vec<u8>,DYNERR> {
    let start = index as usize * BLOCK_SIZE;
    let end = start + BLOCK_SIZE;
    if devicebytes.len() < end {
        return Err(Box::new(Error::OutOfRange(format!(
            "device too small to read block {}",index))));
    }
    Ok(devicebytes[start..end].to_vec())
}

/// Write 512 bytes to the given block of a block device.
pub fn write_block(devicebytes: &mut [u8], index: u16, dat: &[u8]) -> STDRESULT {
    if dat.len() != BLOCK_SIZE {
        return Err(Box::new(Error::OutOfRange(format!(
            "write_block called with {} bytes; want {}",dat.len(),BLOCK_SIZE))));
    }
    let start = index as usize * BLOCK_SIZE;
    let end = start + BLOCK_SIZE;
    if devicebytes.len() < end {
        return Err(Box::new(Error::OutOfRange(format!(
            "device too small to write block {}",index))));
    }
    devicebytes[start..end].copy_from_slice(dat);
    Ok(())
}

/// Check that `order` maps [0,15] onto [0,15] without repeats.
fn validate_order(order: &[usize;16]) -> Result<(),DYNERR> {
    let mut seen = [false;FLOPPY_SECTORS];
    for (i,mapping) in order.iter().enumerate() {
        if *mapping > 15 {
            return Err(Box::new(Error::InvalidOrder(format!(
                "mapping {}:{} is not in [0,15]: {:?}",i,mapping,order))));
        }
        if seen[*mapping] {
            return Err(Box::new(Error::InvalidOrder(format!(
                "mapping {}:{} is a repeat: {:?}",i,mapping,order))));
        }
        seen[*mapping] = true;
    }
    Ok(())
}

/// Change the sector ordering of a floppy image.  The data of input sector
/// `i` lands in output sector `order[i]` of the same track.  A fresh buffer
/// is returned; the input is untouched.
pub fn swizzle(diskimage: &[u8], order: &[usize;16]) -> Result<Vec<u8>,DYNERR> {
    if diskimage.len() != FLOPPY_DISK_BYTES {
        return Err(Box::new(Error::OutOfRange(format!(
            "reordering only works on images of {} bytes; got {}",FLOPPY_DISK_BYTES,diskimage.len()))));
    }
    validate_order(order)?;
    let mut result = vec![0;FLOPPY_DISK_BYTES];
    for track in 0..FLOPPY_TRACKS {
        for sector in 0..FLOPPY_SECTORS {
            let dat = read_sector(diskimage, track as u8, sector as u8)?;
            write_sector(&mut result, track as u8, order[sector] as u8, &dat)?;
        }
    }
    Ok(result)
}

/// Apply the inverse of `order`, undoing a prior `swizzle` with the same table.
pub fn unswizzle(diskimage: &[u8], order: &[usize;16]) -> Result<Vec<u8>,DYNERR> {
    validate_order(order)?;
    let mut reverse = [0;FLOPPY_SECTORS];
    for (index,mapping) in order.iter().enumerate() {
        reverse[*mapping] = index;
    }
    swizzle(diskimage, &reverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bios::skew;

    /// deterministic junk filler for buffer tests
    pub fn pseudo_random_bytes(count: usize, seed: u32) -> Vec<u8> {
        let mut state = seed;
        let mut ans = Vec::new();
        for _i in 0..count {
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            ans.push((state >> 16) as u8);
        }
        ans
    }

    #[test]
    fn sector_addressing() {
        let mut buf = vec![0;FLOPPY_DISK_BYTES];
        let dat: Vec<u8> = (0..=255).collect();
        write_sector(&mut buf,17,0,&dat).expect("write failed");
        assert_eq!(read_sector(&buf,17,0).unwrap(),dat);
        assert_eq!(&buf[17*FLOPPY_TRACK_BYTES..17*FLOPPY_TRACK_BYTES+256],&dat[..]);
        assert!(read_sector(&buf,35,0).is_err());
        assert!(write_sector(&mut buf,34,16,&dat).is_err());
        assert!(write_sector(&mut buf,0,0,&dat[0..100]).is_err());
    }

    #[test]
    fn block_addressing() {
        let mut buf = vec![0;4*BLOCK_SIZE];
        let dat = pseudo_random_bytes(BLOCK_SIZE,13);
        write_block(&mut buf,3,&dat).expect("write failed");
        assert_eq!(read_block(&buf,3).unwrap(),dat);
        assert!(read_block(&buf,4).is_err());
    }

    #[test]
    fn swizzle_dos_order() {
        // bytes at logical sector (0,1) in DOS order live at physical sector 0x0D
        let mut buf = vec![0;FLOPPY_DISK_BYTES];
        let dat: Vec<u8> = (0..=255).collect();
        write_sector(&mut buf,0,1,&dat).expect("write failed");
        let physical = swizzle(&buf,&skew::DOS33_LSEC_TO_PSEC).expect("swizzle failed");
        assert_eq!(&physical[0x0d*256..0x0e*256],&dat[..]);
    }

    #[test]
    fn swizzle_involution() {
        let buf = pseudo_random_bytes(FLOPPY_DISK_BYTES,99);
        for order in [skew::DOS33_LSEC_TO_PSEC,skew::PRODOS_LSEC_TO_PSEC,skew::IDENTITY] {
            let fwd = swizzle(&buf,&order).expect("swizzle failed");
            let back = unswizzle(&fwd,&order).expect("unswizzle failed");
            assert_eq!(back,buf);
        }
    }

    #[test]
    fn bad_orders_are_rejected() {
        let buf = vec![0;FLOPPY_DISK_BYTES];
        let repeat = [0,0,2,3,4,5,6,7,8,9,10,11,12,13,14,15];
        let high = [0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,16];
        assert!(swizzle(&buf,&repeat).is_err());
        assert!(swizzle(&buf,&high).is_err());
        assert!(swizzle(&vec![0;512],&skew::IDENTITY).is_err());
    }
}
