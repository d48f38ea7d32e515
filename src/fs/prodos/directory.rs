//! ProDOS directory structures.
//!
//! Layouts follow Beneath Apple ProDOS, chapter 4.  Directory blocks keep
//! their trailing byte so that decoding and re-encoding is lossless.

use chrono;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use crate::marshal::{DiskStruct,DiskStructError,verify_len,BLOCK_SIZE};
use crate::fs::{Descriptor,Filetype};

/// length of headers and file descriptors
pub const ENTRY_LENGTH: usize = 0x27;
/// marker byte required after a subdirectory name
pub const SUBDIR_MARKER: u8 = 0x75;

#[derive(FromPrimitive,PartialEq,Eq,Clone,Copy,Debug)]
pub enum StorageType {
    Inactive = 0x00,
    Seedling = 0x01,
    Sapling = 0x02,
    Tree = 0x03,
    Pascal = 0x04,
    SubDirEntry = 0x0d,
    SubDirHeader = 0x0e,
    VolDirHeader = 0x0f
}

pub const ACCESS_READ: u8 = 0x01;
pub const ACCESS_WRITE: u8 = 0x02;
pub const ACCESS_BACKUP: u8 = 0x20;
pub const ACCESS_RENAME: u8 = 0x40;
pub const ACCESS_DESTROY: u8 = 0x80;

/// The 4-byte ProDOS timestamp: packed y/m/d then hour and minute.
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub struct DateTime {
    pub ymd: [u8;2],
    pub hm: [u8;2]
}

impl DateTime {
    pub fn from_bytes(dat: &[u8;4]) -> Self {
        Self { ymd: [dat[0],dat[1]], hm: [dat[2],dat[3]] }
    }
    pub fn to_bytes(&self) -> [u8;4] {
        [self.ymd[0],self.ymd[1],self.hm[0],self.hm[1]]
    }
    /// Sanity problems with the timestamp, described for the given field.
    pub fn validate(&self, field: &str) -> Vec<String> {
        let mut notes = Vec::new();
        if self.hm[0] >= 24 {
            notes.push(format!("{} expects hour<24; got {}",field,self.hm[0]));
        }
        if self.hm[1] >= 60 {
            notes.push(format!("{} expects minute<60; got {}",field,self.hm[1]));
        }
        notes
    }
    /// Unpack into a calendar date and time, if the fields form one.
    /// The century window starts at 1979, the year before SOS was released,
    /// which keeps this scheme working until 2079.
    pub fn unpack(&self) -> Option<chrono::NaiveDateTime> {
        let date = u16::from_le_bytes(self.ymd);
        let yearmod100 = date >> 9;
        let year = match yearmod100 < 79 {
            true => 2000 + yearmod100,
            false => 1900 + yearmod100
        };
        let month = (date >> 5) & 15;
        let day = date & 31;
        match chrono::NaiveDate::from_ymd_opt(year as i32,month as u32,day as u32) {
            Some(date) => date.and_hms_opt(self.hm[0] as u32,self.hm[1] as u32,0),
            None => None
        }
    }
}

/// The entry in a directory for a file or subdirectory, 39 bytes.
#[derive(Clone,Copy)]
pub struct FileDescriptor {
    /// storage type in the top four bits, name length in the lower four
    pub type_and_name_length: u8,
    pub file_name: [u8;15],
    /// ProDOS / SOS filetype
    pub file_type: u8,
    /// block number of the file's key block
    pub key_pointer: u16,
    /// total blocks used including index blocks; directory blocks for a subdirectory
    pub blocks_used: u16,
    /// 3-byte offset of EOF from first byte
    pub eof: [u8;3],
    pub creation: DateTime,
    pub version: u8,
    pub min_version: u8,
    pub access: u8,
    /// load address for BIN, record length for TXT, and so on
    pub aux_type: u16,
    pub last_mod: DateTime,
    /// block number of the key block of the directory holding this entry
    pub header_pointer: u16
}

impl FileDescriptor {
    pub fn name(&self) -> String {
        let len = (self.type_and_name_length & 0x0f) as usize;
        String::from_utf8_lossy(&self.file_name[0..len]).to_string()
    }
    pub fn storage_type(&self) -> Option<StorageType> {
        StorageType::from_u8(self.type_and_name_length >> 4)
    }
    pub fn is_deleted(&self) -> bool {
        self.type_and_name_length >> 4 == StorageType::Inactive as u8
    }
    pub fn eof(&self) -> usize {
        self.eof[0] as usize + ((self.eof[1] as usize) << 8) + ((self.eof[2] as usize) << 16)
    }
    pub fn descriptor(&self) -> Descriptor {
        Descriptor {
            name: self.name(),
            full_name: None,
            sectors: 0,
            blocks: self.blocks_used as usize,
            length: self.eof() as i64,
            locked: false,
            file_type: Filetype(self.file_type as u16)
        }
    }
    pub fn validate(&self) -> Vec<String> {
        let mut notes = Vec::new();
        notes.extend(self.creation.validate(&format!("creation date/time of \"{}\"",self.name())));
        notes.extend(self.last_mod.validate(&format!("last modification date/time of \"{}\"",self.name())));
        notes
    }
}

impl DiskStruct for FileDescriptor {
    const LEN: usize = ENTRY_LENGTH;
    fn from_bytes(dat: &[u8]) -> Result<Self,DiskStructError> {
        verify_len("FileDescriptor",dat,Self::LEN)?;
        Ok(Self {
            type_and_name_length: dat[0x00],
            file_name: dat[0x01..0x10].try_into().expect("length was checked"),
            file_type: dat[0x10],
            key_pointer: u16::from_le_bytes([dat[0x11],dat[0x12]]),
            blocks_used: u16::from_le_bytes([dat[0x13],dat[0x14]]),
            eof: [dat[0x15],dat[0x16],dat[0x17]],
            creation: DateTime::from_bytes(&dat[0x18..0x1c].try_into().expect("length was checked")),
            version: dat[0x1c],
            min_version: dat[0x1d],
            access: dat[0x1e],
            aux_type: u16::from_le_bytes([dat[0x1f],dat[0x20]]),
            last_mod: DateTime::from_bytes(&dat[0x21..0x25].try_into().expect("length was checked")),
            header_pointer: u16::from_le_bytes([dat[0x25],dat[0x26]])
        })
    }
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0;Self::LEN];
        buf[0x00] = self.type_and_name_length;
        buf[0x01..0x10].copy_from_slice(&self.file_name);
        buf[0x10] = self.file_type;
        buf[0x11..0x13].copy_from_slice(&u16::to_le_bytes(self.key_pointer));
        buf[0x13..0x15].copy_from_slice(&u16::to_le_bytes(self.blocks_used));
        buf[0x15..0x18].copy_from_slice(&self.eof);
        buf[0x18..0x1c].copy_from_slice(&self.creation.to_bytes());
        buf[0x1c] = self.version;
        buf[0x1d] = self.min_version;
        buf[0x1e] = self.access;
        buf[0x1f..0x21].copy_from_slice(&u16::to_le_bytes(self.aux_type));
        buf[0x21..0x25].copy_from_slice(&self.last_mod.to_bytes());
        buf[0x25..0x27].copy_from_slice(&u16::to_le_bytes(self.header_pointer));
        buf
    }
}

/// Header record of the volume directory's key block.
#[derive(Clone,Copy)]
pub struct VolumeDirectoryHeader {
    pub type_and_name_length: u8,
    pub volume_name: [u8;15],
    pub pad1: [u8;8],
    pub creation: DateTime,
    pub version: u8,
    pub min_version: u8,
    pub access: u8,
    /// usually 0x27
    pub entry_length: u8,
    /// usually 0x0d
    pub entries_per_block: u8,
    /// active entries, not counting this header
    pub file_count: u16,
    /// block number where the volume bitmap starts, usually 6
    pub bit_map_pointer: u16,
    /// total blocks on the device, 280 for a 35-track diskette
    pub total_blocks: u16
}

impl VolumeDirectoryHeader {
    pub fn name(&self) -> String {
        let len = (self.type_and_name_length & 0x0f) as usize;
        String::from_utf8_lossy(&self.volume_name[0..len]).to_string()
    }
    pub fn validate(&self) -> Vec<String> {
        self.creation.validate("creation date/time of volume directory header")
    }
}

impl DiskStruct for VolumeDirectoryHeader {
    const LEN: usize = ENTRY_LENGTH;
    fn from_bytes(dat: &[u8]) -> Result<Self,DiskStructError> {
        verify_len("VolumeDirectoryHeader",dat,Self::LEN)?;
        Ok(Self {
            type_and_name_length: dat[0x00],
            volume_name: dat[0x01..0x10].try_into().expect("length was checked"),
            pad1: dat[0x10..0x18].try_into().expect("length was checked"),
            creation: DateTime::from_bytes(&dat[0x18..0x1c].try_into().expect("length was checked")),
            version: dat[0x1c],
            min_version: dat[0x1d],
            access: dat[0x1e],
            entry_length: dat[0x1f],
            entries_per_block: dat[0x20],
            file_count: u16::from_le_bytes([dat[0x21],dat[0x22]]),
            bit_map_pointer: u16::from_le_bytes([dat[0x23],dat[0x24]]),
            total_blocks: u16::from_le_bytes([dat[0x25],dat[0x26]])
        })
    }
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0;Self::LEN];
        buf[0x00] = self.type_and_name_length;
        buf[0x01..0x10].copy_from_slice(&self.volume_name);
        buf[0x10..0x18].copy_from_slice(&self.pad1);
        buf[0x18..0x1c].copy_from_slice(&self.creation.to_bytes());
        buf[0x1c] = self.version;
        buf[0x1d] = self.min_version;
        buf[0x1e] = self.access;
        buf[0x1f] = self.entry_length;
        buf[0x20] = self.entries_per_block;
        buf[0x21..0x23].copy_from_slice(&u16::to_le_bytes(self.file_count));
        buf[0x23..0x25].copy_from_slice(&u16::to_le_bytes(self.bit_map_pointer));
        buf[0x25..0x27].copy_from_slice(&u16::to_le_bytes(self.total_blocks));
        buf
    }
}

/// Header record of a subdirectory's key block.
#[derive(Clone,Copy)]
pub struct SubdirectoryHeader {
    pub type_and_name_length: u8,
    pub subdirectory_name: [u8;15],
    /// must contain 0x75
    pub marker: u8,
    pub pad1: [u8;7],
    pub creation: DateTime,
    pub version: u8,
    pub min_version: u8,
    pub access: u8,
    pub entry_length: u8,
    pub entries_per_block: u8,
    pub file_count: u16,
    /// key block of the directory containing the entry for this subdirectory
    pub parent_pointer: u16,
    /// index of this subdirectory's entry in the parent directory
    pub parent_entry: u8,
    pub parent_entry_length: u8
}

impl SubdirectoryHeader {
    pub fn name(&self) -> String {
        let len = (self.type_and_name_length & 0x0f) as usize;
        String::from_utf8_lossy(&self.subdirectory_name[0..len]).to_string()
    }
    pub fn validate(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.marker != SUBDIR_MARKER {
            notes.push(format!(
                "byte after subdirectory name \"{}\" should be 0x75; got {:#04X}",self.name(),self.marker));
        }
        notes.extend(self.creation.validate(&format!(
            "subdirectory \"{}\" header creation date/time",self.name())));
        notes
    }
}

impl DiskStruct for SubdirectoryHeader {
    const LEN: usize = ENTRY_LENGTH;
    fn from_bytes(dat: &[u8]) -> Result<Self,DiskStructError> {
        verify_len("SubdirectoryHeader",dat,Self::LEN)?;
        Ok(Self {
            type_and_name_length: dat[0x00],
            subdirectory_name: dat[0x01..0x10].try_into().expect("length was checked"),
            marker: dat[0x10],
            pad1: dat[0x11..0x18].try_into().expect("length was checked"),
            creation: DateTime::from_bytes(&dat[0x18..0x1c].try_into().expect("length was checked")),
            version: dat[0x1c],
            min_version: dat[0x1d],
            access: dat[0x1e],
            entry_length: dat[0x1f],
            entries_per_block: dat[0x20],
            file_count: u16::from_le_bytes([dat[0x21],dat[0x22]]),
            parent_pointer: u16::from_le_bytes([dat[0x23],dat[0x24]]),
            parent_entry: dat[0x25],
            parent_entry_length: dat[0x26]
        })
    }
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0;Self::LEN];
        buf[0x00] = self.type_and_name_length;
        buf[0x01..0x10].copy_from_slice(&self.subdirectory_name);
        buf[0x10] = self.marker;
        buf[0x11..0x18].copy_from_slice(&self.pad1);
        buf[0x18..0x1c].copy_from_slice(&self.creation.to_bytes());
        buf[0x1c] = self.version;
        buf[0x1d] = self.min_version;
        buf[0x1e] = self.access;
        buf[0x1f] = self.entry_length;
        buf[0x20] = self.entries_per_block;
        buf[0x21..0x23].copy_from_slice(&u16::to_le_bytes(self.file_count));
        buf[0x23..0x25].copy_from_slice(&u16::to_le_bytes(self.parent_pointer));
        buf[0x25] = self.parent_entry;
        buf[0x26] = self.parent_entry_length;
        buf
    }
}

/// First block of the volume directory: links, header, 12 entries.
#[derive(Clone,Copy)]
pub struct VolumeDirectoryKeyBlock {
    /// always zero, the key block starts the chain
    pub prev: u16,
    pub next: u16,
    pub header: VolumeDirectoryHeader,
    pub descriptors: [FileDescriptor;12],
    /// trailing byte, retained so we don't lose it
    pub extra: u8
}

impl VolumeDirectoryKeyBlock {
    pub fn validate(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.prev != 0 {
            notes.push(format!(
                "volume directory key block should have a previous block of 0, got ${:04X}",self.prev));
        }
        notes.extend(self.header.validate());
        for desc in &self.descriptors {
            notes.extend(desc.validate());
        }
        if self.extra != 0 {
            notes.push(format!(
                "expected last byte of volume directory key block == 0x0; got {:#04X}",self.extra));
        }
        notes
    }
}

impl DiskStruct for VolumeDirectoryKeyBlock {
    const LEN: usize = BLOCK_SIZE;
    fn from_bytes(dat: &[u8]) -> Result<Self,DiskStructError> {
        verify_len("VolumeDirectoryKeyBlock",dat,Self::LEN)?;
        let mut descriptors = [FileDescriptor::from_bytes(&dat[0x2b..0x2b+ENTRY_LENGTH])?;12];
        for i in 1..12 {
            descriptors[i] = FileDescriptor::from_bytes(&dat[0x2b+i*ENTRY_LENGTH..0x2b+(i+1)*ENTRY_LENGTH])?;
        }
        Ok(Self {
            prev: u16::from_le_bytes([dat[0],dat[1]]),
            next: u16::from_le_bytes([dat[2],dat[3]]),
            header: VolumeDirectoryHeader::from_bytes(&dat[0x04..0x2b])?,
            descriptors,
            extra: dat[511]
        })
    }
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0;Self::LEN];
        buf[0..2].copy_from_slice(&u16::to_le_bytes(self.prev));
        buf[2..4].copy_from_slice(&u16::to_le_bytes(self.next));
        buf[0x04..0x2b].copy_from_slice(&self.header.to_bytes());
        for (i,desc) in self.descriptors.iter().enumerate() {
            buf[0x2b+i*ENTRY_LENGTH..0x2b+(i+1)*ENTRY_LENGTH].copy_from_slice(&desc.to_bytes());
        }
        buf[511] = self.extra;
        buf
    }
}

/// A continuation block of the volume directory: links and 13 entries.
#[derive(Clone,Copy)]
pub struct VolumeDirectoryBlock {
    pub prev: u16,
    pub next: u16,
    pub descriptors: [FileDescriptor;13],
    pub extra: u8
}

impl VolumeDirectoryBlock {
    pub fn validate(&self) -> Vec<String> {
        let mut notes = Vec::new();
        for desc in &self.descriptors {
            notes.extend(desc.validate());
        }
        if self.extra != 0 {
            notes.push(format!(
                "expected last byte of volume directory block == 0x0; got {:#04X}",self.extra));
        }
        notes
    }
}

impl DiskStruct for VolumeDirectoryBlock {
    const LEN: usize = BLOCK_SIZE;
    fn from_bytes(dat: &[u8]) -> Result<Self,DiskStructError> {
        verify_len("VolumeDirectoryBlock",dat,Self::LEN)?;
        let mut descriptors = [FileDescriptor::from_bytes(&dat[0x04..0x04+ENTRY_LENGTH])?;13];
        for i in 1..13 {
            descriptors[i] = FileDescriptor::from_bytes(&dat[0x04+i*ENTRY_LENGTH..0x04+(i+1)*ENTRY_LENGTH])?;
        }
        Ok(Self {
            prev: u16::from_le_bytes([dat[0],dat[1]]),
            next: u16::from_le_bytes([dat[2],dat[3]]),
            descriptors,
            extra: dat[511]
        })
    }
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0;Self::LEN];
        buf[0..2].copy_from_slice(&u16::to_le_bytes(self.prev));
        buf[2..4].copy_from_slice(&u16::to_le_bytes(self.next));
        for (i,desc) in self.descriptors.iter().enumerate() {
            buf[0x04+i*ENTRY_LENGTH..0x04+(i+1)*ENTRY_LENGTH].copy_from_slice(&desc.to_bytes());
        }
        buf[511] = self.extra;
        buf
    }
}

/// First block of a subdirectory: links, subdirectory header, 12 entries.
#[derive(Clone,Copy)]
pub struct SubdirectoryKeyBlock {
    pub prev: u16,
    pub next: u16,
    pub header: SubdirectoryHeader,
    pub descriptors: [FileDescriptor;12],
    pub extra: u8
}

impl SubdirectoryKeyBlock {
    pub fn validate(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.prev != 0 {
            notes.push(format!(
                "subdirectory key block should have a previous block of 0, got ${:04X}",self.prev));
        }
        notes.extend(self.header.validate());
        for desc in &self.descriptors {
            notes.extend(desc.validate());
        }
        if self.extra != 0 {
            notes.push(format!(
                "expected last byte of subdirectory key block == 0x0; got {:#04X}",self.extra));
        }
        notes
    }
}

impl DiskStruct for SubdirectoryKeyBlock {
    const LEN: usize = BLOCK_SIZE;
    fn from_bytes(dat: &[u8]) -> Result<Self,DiskStructError> {
        verify_len("SubdirectoryKeyBlock",dat,Self::LEN)?;
        let mut descriptors = [FileDescriptor::from_bytes(&dat[0x2b..0x2b+ENTRY_LENGTH])?;12];
        for i in 1..12 {
            descriptors[i] = FileDescriptor::from_bytes(&dat[0x2b+i*ENTRY_LENGTH..0x2b+(i+1)*ENTRY_LENGTH])?;
        }
        Ok(Self {
            prev: u16::from_le_bytes([dat[0],dat[1]]),
            next: u16::from_le_bytes([dat[2],dat[3]]),
            header: SubdirectoryHeader::from_bytes(&dat[0x04..0x2b])?,
            descriptors,
            extra: dat[511]
        })
    }
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0;Self::LEN];
        buf[0..2].copy_from_slice(&u16::to_le_bytes(self.prev));
        buf[2..4].copy_from_slice(&u16::to_le_bytes(self.next));
        buf[0x04..0x2b].copy_from_slice(&self.header.to_bytes());
        for (i,desc) in self.descriptors.iter().enumerate() {
            buf[0x2b+i*ENTRY_LENGTH..0x2b+(i+1)*ENTRY_LENGTH].copy_from_slice(&desc.to_bytes());
        }
        buf[511] = self.extra;
        buf
    }
}

/// A continuation block of a subdirectory: links and 13 entries.
#[derive(Clone,Copy)]
pub struct SubdirectoryBlock {
    pub prev: u16,
    pub next: u16,
    pub descriptors: [FileDescriptor;13],
    pub extra: u8
}

impl SubdirectoryBlock {
    pub fn validate(&self) -> Vec<String> {
        let mut notes = Vec::new();
        for desc in &self.descriptors {
            notes.extend(desc.validate());
        }
        if self.extra != 0 {
            notes.push(format!(
                "expected last byte of subdirectory block == 0x0; got {:#04X}",self.extra));
        }
        notes
    }
}

impl DiskStruct for SubdirectoryBlock {
    const LEN: usize = BLOCK_SIZE;
    fn from_bytes(dat: &[u8]) -> Result<Self,DiskStructError> {
        verify_len("SubdirectoryBlock",dat,Self::LEN)?;
        let mut descriptors = [FileDescriptor::from_bytes(&dat[0x04..0x04+ENTRY_LENGTH])?;13];
        for i in 1..13 {
            descriptors[i] = FileDescriptor::from_bytes(&dat[0x04+i*ENTRY_LENGTH..0x04+(i+1)*ENTRY_LENGTH])?;
        }
        Ok(Self {
            prev: u16::from_le_bytes([dat[0],dat[1]]),
            next: u16::from_le_bytes([dat[2],dat[3]]),
            descriptors,
            extra: dat[511]
        })
    }
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0;Self::LEN];
        buf[0..2].copy_from_slice(&u16::to_le_bytes(self.prev));
        buf[2..4].copy_from_slice(&u16::to_le_bytes(self.next));
        for (i,desc) in self.descriptors.iter().enumerate() {
            buf[0x04+i*ENTRY_LENGTH..0x04+(i+1)*ENTRY_LENGTH].copy_from_slice(&desc.to_bytes());
        }
        buf[511] = self.extra;
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn junk_block(seed: u32) -> Vec<u8> {
        let mut state = seed;
        let mut ans = Vec::new();
        for _i in 0..BLOCK_SIZE {
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            ans.push((state >> 16) as u8);
        }
        ans
    }

    #[test]
    fn key_block_roundtrip() {
        let buf = junk_block(4);
        let vdkb = VolumeDirectoryKeyBlock::from_bytes(&buf).expect("decode failed");
        assert_eq!(vdkb.to_bytes(),buf);
    }

    #[test]
    fn directory_block_roundtrip() {
        let buf = junk_block(5);
        let vdb = VolumeDirectoryBlock::from_bytes(&buf).expect("decode failed");
        assert_eq!(vdb.to_bytes(),buf);
    }

    #[test]
    fn subdir_key_block_roundtrip() {
        let buf = junk_block(6);
        let skb = SubdirectoryKeyBlock::from_bytes(&buf).expect("decode failed");
        assert_eq!(skb.to_bytes(),buf);
    }

    #[test]
    fn subdir_block_roundtrip() {
        let buf = junk_block(7);
        let sb = SubdirectoryBlock::from_bytes(&buf).expect("decode failed");
        assert_eq!(sb.to_bytes(),buf);
    }

    #[test]
    fn timestamps() {
        // 2019-06-22 17:30: date word is day + month<<5 + year<<9, then hour and minute bytes
        let packed = DateTime { ymd: u16::to_le_bytes(22 + (6<<5) + (19<<9)), hm: [17,30] };
        let dt = packed.unpack().expect("should unpack");
        assert_eq!(dt.to_string(),"2019-06-22 17:30:00");
        assert_eq!(packed.validate("test").len(),0);
        let bad = DateTime { ymd: [0,0], hm: [25,61] };
        assert_eq!(bad.validate("test").len(),2);
        assert_eq!(packed.to_bytes(),DateTime::from_bytes(&packed.to_bytes()).to_bytes());
    }

    #[test]
    fn descriptor_fields() {
        let mut fd = FileDescriptor::from_bytes(&vec![0;ENTRY_LENGTH]).expect("decode failed");
        fd.type_and_name_length = (StorageType::Seedling as u8) << 4 | 5;
        fd.file_name[0..5].copy_from_slice(b"HELLO");
        fd.eof = [0x10,0x02,0x01];
        assert_eq!(fd.name(),"HELLO");
        assert_eq!(fd.storage_type(),Some(StorageType::Seedling));
        assert_eq!(fd.eof(),0x010210);
        assert!(!fd.is_deleted());
    }
}
