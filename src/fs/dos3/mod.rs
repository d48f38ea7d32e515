//! # DOS 3.3 file system module
//!
//! Reads disk images containing one standard DOS 3.3 volume: VTOC, catalog
//! chain, track/sector list chains, and the files they index.  The operator
//! expects its buffer in DOS logical sector order.  Writing is not
//! implemented for this file system.

pub mod types;

use std::collections::HashSet;
use log::{debug,trace};
use types::*;
use crate::img;
use crate::img::TrackSector;
use crate::marshal::unmarshal_sector;
use crate::fs::{Descriptor,DiskOrder,FileInfo,Operator,OperatorFactory};
use crate::{DYNERR,Error};

/// track holding the VTOC on a standard disk
pub const VTOC_TRACK: u8 = 17;
pub const VTOC_SECTOR: u8 = 0;

const OPERATOR_NAME: &str = "dos3";

/// Read the raw catalog sectors, following the chain from the VTOC.
/// Fails on a revisited sector or a pointer outside the disk geometry.
fn read_catalog_sectors(diskbytes: &[u8]) -> Result<Vec<CatalogSector>,DYNERR> {
    let vtoc: VTOC = unmarshal_sector(diskbytes, VTOC_TRACK, VTOC_SECTOR)?;
    vtoc.validate()?;
    trace!("VTOC: volume {}, catalog chain starts at ({},{})",vtoc.volume,vtoc.catalog_track,vtoc.catalog_sector);
    let mut next_track = vtoc.catalog_track;
    let mut next_sector = vtoc.catalog_sector;
    let mut css: Vec<CatalogSector> = Vec::new();
    let mut seen: HashSet<TrackSector> = HashSet::new();
    while next_track != 0 || next_sector != 0 {
        let ts = TrackSector { track: next_track, sector: next_sector };
        if seen.contains(&ts) {
            return Err(Box::new(Error::Corruption(format!(
                "catalog tries to read track {} sector {} twice",next_track,next_sector))));
        }
        if next_track >= vtoc.num_tracks {
            return Err(Box::new(Error::Corruption(format!(
                "catalog sectors can't be in track {}: disk only has {} tracks",next_track,vtoc.num_tracks))));
        }
        if next_sector >= vtoc.num_sectors {
            return Err(Box::new(Error::Corruption(format!(
                "catalog sectors can't be in sector {}: disk only has {} sectors",next_sector,vtoc.num_sectors))));
        }
        seen.insert(ts);
        let cs: CatalogSector = unmarshal_sector(diskbytes, next_track, next_sector)?;
        next_track = cs.next_track;
        next_sector = cs.next_sector;
        css.push(cs);
    }
    Ok(css)
}

/// Read the catalog of a DOS 3.3 disk, returning (normal, deleted) entries.
pub fn read_catalog(diskbytes: &[u8]) -> Result<(Vec<FileDesc>,Vec<FileDesc>),DYNERR> {
    let css = read_catalog_sectors(diskbytes)?;
    let mut files: Vec<FileDesc> = Vec::new();
    let mut deleted: Vec<FileDesc> = Vec::new();
    for cs in &css {
        for fd in &cs.file_descs {
            match fd.status() {
                FileDescStatus::Unused => {},
                FileDescStatus::Deleted => deleted.push(*fd),
                FileDescStatus::Normal => files.push(*fd)
            }
        }
    }
    Ok((files,deleted))
}

/// Gather the on-disk contents of the file described by `fd`, following its
/// track/sector list chain.  A (0,0) pair stands for 256 zero bytes; trailing
/// (0,0) pairs on the final list are not part of the file.
fn file_contents(diskbytes: &[u8], fd: &FileDesc) -> Result<Vec<u8>,DYNERR> {
    let mut tsls: Vec<TrackSectorList> = Vec::new();
    let mut next_track = fd.tsl_track;
    let mut next_sector = fd.tsl_sector;
    let mut seen: HashSet<TrackSector> = HashSet::new();
    while next_track != 0 || next_sector != 0 {
        let ts = TrackSector { track: next_track, sector: next_sector };
        if seen.contains(&ts) {
            return Err(Box::new(Error::Corruption(format!(
                "file {} tries to read track {} sector {} twice",fd.name_string(),next_track,next_sector))));
        }
        seen.insert(ts);
        let tsl: TrackSectorList = unmarshal_sector(diskbytes, next_track, next_sector)?;
        next_track = tsl.next_track;
        next_sector = tsl.next_sector;
        tsls.push(tsl);
    }
    let mut data: Vec<u8> = Vec::new();
    for (i,tsl) in tsls.iter().enumerate() {
        let mut end: i32 = TrackSectorList::MAX_PAIRS as i32 - 1;
        if i == tsls.len()-1 {
            // the final list runs only to its last non-zero pair
            end = -1;
            for j in 0..TrackSectorList::MAX_PAIRS {
                if tsl.pair(j) != (0,0) {
                    end = j as i32;
                }
            }
        }
        for j in 0..=end {
            let (track,sector) = tsl.pair(j as usize);
            if (track,sector) == (0,0) {
                data.extend(std::iter::repeat(0).take(256));
            } else {
                data.extend(img::read_sector(diskbytes, track, sector)?);
            }
        }
    }
    Ok(data)
}

/// The operator for DOS 3.3 disks.
pub struct Disk {
    data: Vec<u8>
}

impl Disk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
    fn file_for_name(&self, name: &str) -> Result<FileDesc,DYNERR> {
        let (fds,_deleted) = read_catalog(&self.data)?;
        for fd in fds {
            if fd.name_string() == name {
                return Ok(fd);
            }
        }
        Err(Box::new(Error::NotFound(name.to_string())))
    }
}

impl Operator for Disk {
    fn name(&self) -> &str {
        OPERATOR_NAME
    }
    fn disk_order(&self) -> DiskOrder {
        DiskOrder::DOS
    }
    fn has_subdirs(&self) -> bool {
        false
    }
    fn catalog(&self, subdir: &str) -> Result<Vec<Descriptor>,DYNERR> {
        if subdir.len() > 0 {
            return Err(Box::new(Error::NotFound(format!("subdirectory `{}`",subdir))));
        }
        let (fds,_deleted) = read_catalog(&self.data)?;
        Ok(fds.iter().map(|fd| fd.descriptor()).collect())
    }
    fn get_file(&self, name: &str) -> Result<FileInfo,DYNERR> {
        let fd = self.file_for_name(name)?;
        let mut data = file_contents(&self.data, &fd)?;
        let mut ans = FileInfo {
            descriptor: fd.descriptor(),
            data: Vec::new(),
            start_address: 0
        };
        match fd.file_type & 0x7f {
            FILETYPE_TEXT => {
                while data.last() == Some(&0) {
                    data.pop();
                }
                ans.descriptor.length = data.len() as i64;
                ans.data = data;
                Ok(ans)
            },
            FILETYPE_APPLESOFT | FILETYPE_INTEGER | FILETYPE_BINARY => {
                if fd.file_type & 0x7f == FILETYPE_BINARY {
                    if data.len() < 2 {
                        return Err(Box::new(Error::Corruption(format!(
                            "binary file {} too short for its address header",fd.name_string()))));
                    }
                    ans.start_address = u16::from_le_bytes([data[0],data[1]]);
                    data.drain(0..2);
                } else if fd.file_type & 0x7f == FILETYPE_APPLESOFT {
                    ans.start_address = 0x801;
                }
                if data.len() < 2 {
                    return Err(Box::new(Error::Corruption(format!(
                        "file {} too short for its length header",fd.name_string()))));
                }
                let length = u16::from_le_bytes([data[0],data[1]]) as usize;
                if data.len() < length + 2 {
                    return Err(Box::new(Error::Corruption(format!(
                        "file {} claims {} bytes but only {} are on disk",fd.name_string(),length,data.len()-2))));
                }
                ans.descriptor.length = length as i64;
                ans.data = data[2..length+2].to_vec();
                Ok(ans)
            },
            _ => {
                debug!("filetype {:#04X} has no reader",fd.file_type);
                Err(Box::new(Error::NotImplemented(format!(
                    "{} reading filetype {}",OPERATOR_NAME,fd.descriptor().file_type.display()))))
            }
        }
    }
    fn delete(&mut self, _name: &str) -> Result<bool,DYNERR> {
        Err(Box::new(Error::NotImplemented(OPERATOR_NAME.to_string())))
    }
    fn put_file(&mut self, _info: &FileInfo, _overwrite: bool) -> Result<bool,DYNERR> {
        Err(Box::new(Error::NotImplemented(OPERATOR_NAME.to_string())))
    }
    fn get_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Factory probing for DOS 3.3 disks.
pub struct Factory {}

impl Factory {
    pub fn new() -> Self {
        Self {}
    }
}

impl OperatorFactory for Factory {
    fn name(&self) -> &str {
        OPERATOR_NAME
    }
    fn disk_order(&self) -> DiskOrder {
        DiskOrder::DOS
    }
    fn seems_to_match(&self, diskbytes: &[u8]) -> bool {
        read_catalog(diskbytes).is_ok()
    }
    fn operator(&self, diskbytes: Vec<u8>) -> Result<Box<dyn Operator>,DYNERR> {
        read_catalog(&diskbytes)?;
        Ok(Box::new(Disk::new(diskbytes)))
    }
}
