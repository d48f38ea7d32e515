//! # ProDOS file system module
//!
//! Reads the volume directory, volume bitmap, and subdirectory tree of a
//! ProDOS device.  The device may be a block image (`.hdv`) or a floppy
//! whose buffer is in ProDOS logical order, in which case block `b` simply
//! occupies bytes `b*512..(b+1)*512`.  This module is read-only: cataloging
//! works anywhere in the tree, file content is not yet interpreted.

pub mod directory;

use std::collections::{HashMap,HashSet};
use log::{debug,trace,warn};
use directory::*;
use crate::marshal::{unmarshal_block,BLOCK_SIZE};
use crate::fs::{Descriptor,DiskOrder,FileInfo,Operator,OperatorFactory};
use crate::{DYNERR,Error};

/// block holding the volume directory key block, by convention
pub const VOL_KEY_BLOCK: u16 = 2;
/// blocks a pathological parent chain is allowed before we give up
const MAX_PARENT_DEPTH: usize = 16;

const OPERATOR_NAME: &str = "prodos";

/// One bit per block over the whole device, MSB first within each byte.
/// A set bit means the block is free.
pub struct VolumeBitMap {
    pub start_block: u16,
    pub data: Vec<Vec<u8>>
}

impl VolumeBitMap {
    /// Read the bitmap blocks, enough of them to give every block its bit.
    pub fn read(devicebytes: &[u8], start_block: u16, total_blocks: u16) -> Result<Self,DYNERR> {
        let count = (total_blocks as usize + BLOCK_SIZE*8 - 1) / (BLOCK_SIZE*8);
        let mut data = Vec::new();
        for i in 0..count {
            data.push(crate::img::read_block(devicebytes, start_block + i as u16)?);
        }
        Ok(Self { start_block, data })
    }
    /// True if the given block is free.
    pub fn is_free(&self, block: u16) -> bool {
        let byte_index = (block >> 3) as usize;
        let bit = 1 << (7 - (block & 7));
        match self.data.get(byte_index / BLOCK_SIZE) {
            Some(chunk) => chunk[byte_index % BLOCK_SIZE] & bit > 0,
            None => false
        }
    }
    /// Number of free blocks among the first `total_blocks`.
    pub fn free_blocks(&self, total_blocks: u16) -> usize {
        (0..total_blocks).filter(|b| self.is_free(*b)).count()
    }
}

/// In-memory form of a single subdirectory: its key block and continuations,
/// tagged with the block numbers they came from.
pub struct Subdirectory {
    pub key_block_num: u16,
    pub key_block: SubdirectoryKeyBlock,
    pub blocks: Vec<(u16,SubdirectoryBlock)>
}

impl Subdirectory {
    /// All entries, deleted or not, in on-disk order.
    pub fn descriptors(&self) -> Vec<FileDescriptor> {
        let mut descs: Vec<FileDescriptor> = self.key_block.descriptors.to_vec();
        for (_num,block) in &self.blocks {
            descs.extend_from_slice(&block.descriptors);
        }
        descs
    }
    fn subdir_descriptors(&self) -> Vec<FileDescriptor> {
        self.descriptors().into_iter()
            .filter(|d| d.storage_type() == Some(StorageType::SubDirEntry))
            .collect()
    }
}

/// In-memory form of a device's whole directory tree.
pub struct Volume {
    pub key_block: VolumeDirectoryKeyBlock,
    pub blocks: Vec<(u16,VolumeDirectoryBlock)>,
    pub bitmap: VolumeBitMap,
    /// subdirectories keyed by their key block number
    pub subdirs_by_block: HashMap<u16,Subdirectory>,
    /// slash-joined full path to key block number
    pub subdirs_by_name: HashMap<String,u16>,
    /// continuation block to the key block heading its chain
    pub first_subdir_blocks: HashMap<u16,u16>,
    /// non-fatal validation complaints gathered while reading
    pub notes: Vec<String>
}

impl Volume {
    /// All top-level entries, deleted or not, in on-disk order.
    pub fn descriptors(&self) -> Vec<FileDescriptor> {
        let mut descs: Vec<FileDescriptor> = self.key_block.descriptors.to_vec();
        for (_num,block) in &self.blocks {
            descs.extend_from_slice(&block.descriptors);
        }
        descs
    }
    fn subdir_descriptors(&self) -> Vec<FileDescriptor> {
        self.descriptors().into_iter()
            .filter(|d| d.storage_type() == Some(StorageType::SubDirEntry))
            .collect()
    }
}

/// Read one subdirectory chain starting from its entry in the parent.
fn read_subdirectory(devicebytes: &[u8], fd: &FileDescriptor) -> Result<Subdirectory,DYNERR> {
    let key_block: SubdirectoryKeyBlock = unmarshal_block(devicebytes, fd.key_pointer)?;
    let mut sub = Subdirectory {
        key_block_num: fd.key_pointer,
        key_block,
        blocks: Vec::new()
    };
    let mut seen: HashSet<u16> = HashSet::new();
    let mut next = sub.key_block.next;
    while next != 0 {
        if !seen.insert(next) {
            return Err(Box::new(Error::Corruption(format!(
                "subdirectory \"{}\" tries to read block {} twice",fd.name(),next))));
        }
        let sdb: SubdirectoryBlock = unmarshal_block(devicebytes, next)?;
        sub.blocks.push((next,sdb));
        next = sdb.next;
    }
    Ok(sub)
}

/// Full path of the directory whose key block is `parent_block`, walking the
/// parent pointers back toward the volume directory.  The walk is capped so
/// that pathological input cannot hold us forever.
fn parent_dir_name(parent_block: u16, key_block: u16,
    subdirs: &HashMap<u16,Subdirectory>, firsts: &HashMap<u16,u16>) -> Result<String,DYNERR> {
    let mut names: Vec<String> = Vec::new();
    let mut block = parent_block;
    for _depth in 0..MAX_PARENT_DEPTH {
        if block == key_block || firsts.get(&block) == Some(&key_block) {
            names.reverse();
            return Ok(names.join("/"));
        }
        let sd = match subdirs.get(&block) {
            Some(sd) => Some(sd),
            None => firsts.get(&block).and_then(|first| subdirs.get(first))
        };
        match sd {
            Some(sd) => {
                names.push(sd.key_block.header.name());
                block = sd.key_block.header.parent_pointer;
            },
            None => return Err(Box::new(Error::Corruption(format!(
                "unable to find subdirectory for block {}",block))))
        }
    }
    Err(Box::new(Error::Corruption(format!(
        "directory parent chain from block {} exceeds depth {}",parent_block,MAX_PARENT_DEPTH))))
}

/// Read the entire volume and subdirectory tree from a device into memory.
pub fn read_volume(devicebytes: &[u8], key_block: u16) -> Result<Volume,DYNERR> {
    let vdkb: VolumeDirectoryKeyBlock = unmarshal_block(devicebytes, key_block)?;
    let bitmap = VolumeBitMap::read(devicebytes, vdkb.header.bit_map_pointer, vdkb.header.total_blocks)?;
    let mut vol = Volume {
        key_block: vdkb,
        blocks: Vec::new(),
        bitmap,
        subdirs_by_block: HashMap::new(),
        subdirs_by_name: HashMap::new(),
        first_subdir_blocks: HashMap::new(),
        notes: Vec::new()
    };
    vol.notes.extend(vol.key_block.validate());
    let mut seen: HashSet<u16> = HashSet::new();
    let mut next = vol.key_block.next;
    while next != 0 {
        if !seen.insert(next) {
            return Err(Box::new(Error::Corruption(format!(
                "volume directory tries to read block {} twice",next))));
        }
        let vdb: VolumeDirectoryBlock = unmarshal_block(devicebytes, next)?;
        vol.notes.extend(vdb.validate());
        vol.blocks.push((next,vdb));
        vol.first_subdir_blocks.insert(next,key_block);
        trace!("volume directory continues in block {}",next);
        next = vdb.next;
    }
    // breadth-first read of the subdirectory tree
    let mut worklist = vol.subdir_descriptors();
    let mut cursor = 0;
    while cursor < worklist.len() {
        let sdd = worklist[cursor];
        cursor += 1;
        if vol.subdirs_by_block.contains_key(&sdd.key_pointer) {
            return Err(Box::new(Error::Corruption(format!(
                "subdirectory key block {} is claimed twice",sdd.key_pointer))));
        }
        let sub = read_subdirectory(devicebytes, &sdd)?;
        vol.notes.extend(sub.key_block.validate());
        for (num,block) in &sub.blocks {
            vol.notes.extend(block.validate());
            vol.first_subdir_blocks.insert(*num,sdd.key_pointer);
        }
        worklist.extend(sub.subdir_descriptors());
        debug!("read subdirectory \"{}\" at block {}",sub.key_block.header.name(),sdd.key_pointer);
        vol.subdirs_by_block.insert(sdd.key_pointer,sub);
    }
    // resolve full paths
    let mut by_name: HashMap<String,u16> = HashMap::new();
    for (block,sd) in &vol.subdirs_by_block {
        let mut name = sd.key_block.header.name();
        let parent_name = parent_dir_name(
            sd.key_block.header.parent_pointer, key_block,
            &vol.subdirs_by_block, &vol.first_subdir_blocks)?;
        if parent_name.len() > 0 {
            name = format!("{}/{}",parent_name,name);
        }
        by_name.insert(name,*block);
    }
    vol.subdirs_by_name = by_name;
    for note in &vol.notes {
        warn!("{}",note);
    }
    Ok(vol)
}

/// The operator for ProDOS devices.
pub struct Disk {
    data: Vec<u8>
}

impl Disk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl Operator for Disk {
    fn name(&self) -> &str {
        OPERATOR_NAME
    }
    fn disk_order(&self) -> DiskOrder {
        DiskOrder::ProDOS
    }
    fn has_subdirs(&self) -> bool {
        true
    }
    fn catalog(&self, subdir: &str) -> Result<Vec<Descriptor>,DYNERR> {
        let vol = read_volume(&self.data, VOL_KEY_BLOCK)?;
        let descs = match subdir {
            "" => vol.descriptors(),
            path => match vol.subdirs_by_name.get(path) {
                Some(block) => vol.subdirs_by_block[block].descriptors(),
                None => return Err(Box::new(Error::NotFound(format!("subdirectory \"{}\"",path))))
            }
        };
        Ok(descs.iter()
            .filter(|fd| !fd.is_deleted())
            .map(|fd| fd.descriptor())
            .collect())
    }
    fn get_file(&self, _name: &str) -> Result<FileInfo,DYNERR> {
        Err(Box::new(Error::NotImplemented(OPERATOR_NAME.to_string())))
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

/// Factory probing for ProDOS devices.
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
        DiskOrder::ProDOS
    }
    fn seems_to_match(&self, diskbytes: &[u8]) -> bool {
        read_volume(diskbytes, VOL_KEY_BLOCK).is_ok()
    }
    fn operator(&self, diskbytes: Vec<u8>) -> Result<Box<dyn Operator>,DYNERR> {
        read_volume(&diskbytes, VOL_KEY_BLOCK)?;
        Ok(Box::new(Disk::new(diskbytes)))
    }
}
