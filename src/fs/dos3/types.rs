//! DOS 3.3 directory structures.
//!
//! Layouts follow Beneath Apple DOS, chapter 4.  Unused bytes are retained
//! by every record so that decoding and re-encoding a sector is lossless.

use crate::marshal::{DiskStruct,DiskStructError,verify_len,SECTOR_SIZE};
use crate::fs::{Descriptor,Filetype};

/// just setting the high bit on other file types
pub const FILETYPE_LOCKED: u8 = 0x80;
pub const FILETYPE_TEXT: u8 = 0x00;
pub const FILETYPE_INTEGER: u8 = 0x01;
pub const FILETYPE_APPLESOFT: u8 = 0x02;
pub const FILETYPE_BINARY: u8 = 0x04;
pub const FILETYPE_S: u8 = 0x08;
pub const FILETYPE_RELOCATABLE: u8 = 0x10;
pub const FILETYPE_A: u8 = 0x20;
pub const FILETYPE_B: u8 = 0x40;

/// Free sectors of a single track: bytes 0-1 hold a bit per sector,
/// bytes 2-3 must be zero.
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub struct TrackFreeSectors(pub [u8;4]);

impl TrackFreeSectors {
    /// True if the given sector is free (false for sector > 15).
    pub fn is_free(&self, sector: u8) -> bool {
        if sector >= 16 {
            return false;
        }
        let bits = 1 << (sector % 8);
        match sector < 8 {
            true => self.0[1] & bits > 0,
            false => self.0[0] & bits > 0
        }
    }
    /// True if the unused trailing bytes are zeroes, as they must be.
    pub fn unused_clear(&self) -> bool {
        self.0[2] == 0 && self.0[3] == 0
    }
}

/// The Volume Table Of Contents, track 17 sector 0.
#[derive(Clone)]
pub struct VTOC {
    pub pad1: u8,
    /// track of first catalog sector
    pub catalog_track: u8,
    /// sector of first catalog sector
    pub catalog_sector: u8,
    /// release number of DOS used to INIT this diskette
    pub dos_release: u8,
    pub pad2: [u8;2],
    /// diskette volume number (1-254)
    pub volume: u8,
    pub pad3: [u8;32],
    /// track/sector pairs per track/sector list sector (122 for 256 byte sectors)
    pub max_pairs: u8,
    pub pad4: [u8;8],
    /// last track where sectors were allocated
    pub last_track: u8,
    /// direction of track allocation, +1 or -1
    pub track_direction: i8,
    pub pad5: [u8;2],
    /// tracks per diskette, normally 35
    pub num_tracks: u8,
    /// sectors per track, 13 or 16
    pub num_sectors: u8,
    pub bytes_per_sector: u16,
    pub free_sectors: [TrackFreeSectors;50]
}

impl VTOC {
    /// Check the invariants of a healthy VTOC.
    pub fn validate(&self) -> Result<(),crate::Error> {
        if self.volume == 255 {
            return Err(crate::Error::Corruption("expected volume to be 0-254, but got 255".to_string()));
        }
        if self.dos_release != 3 {
            return Err(crate::Error::Corruption(format!(
                "expected DOS release number to be 3; got {}",self.dos_release)));
        }
        if self.track_direction != 1 && self.track_direction != -1 {
            return Err(crate::Error::Corruption(format!(
                "expected track direction to be 1 or -1; got {}",self.track_direction)));
        }
        if self.num_tracks != 35 {
            return Err(crate::Error::Corruption(format!(
                "expected number of tracks to be 35; got {}",self.num_tracks)));
        }
        if self.num_sectors != 13 && self.num_sectors != 16 {
            return Err(crate::Error::Corruption(format!(
                "expected 13 or 16 sectors per track; got {}",self.num_sectors)));
        }
        if self.bytes_per_sector != 256 {
            return Err(crate::Error::Corruption(format!(
                "expected 256 bytes per sector; got {}",self.bytes_per_sector)));
        }
        if self.max_pairs != 122 {
            return Err(crate::Error::Corruption(format!(
                "expected 122 track/sector pairs per list sector; got {}",self.max_pairs)));
        }
        for (i,tf) in self.free_sectors.iter().enumerate() {
            if !tf.unused_clear() {
                return Err(crate::Error::Corruption(format!(
                    "unused bytes of free-sector list for track {} are not zeroes",i)));
            }
        }
        Ok(())
    }
}

impl DiskStruct for VTOC {
    const LEN: usize = SECTOR_SIZE;
    fn from_bytes(dat: &[u8]) -> Result<Self,DiskStructError> {
        verify_len("VTOC",dat,Self::LEN)?;
        let mut free_sectors = [TrackFreeSectors([0;4]);50];
        for i in 0..50 {
            free_sectors[i] = TrackFreeSectors([dat[0x38+4*i],dat[0x39+4*i],dat[0x3a+4*i],dat[0x3b+4*i]]);
        }
        Ok(Self {
            pad1: dat[0x00],
            catalog_track: dat[0x01],
            catalog_sector: dat[0x02],
            dos_release: dat[0x03],
            pad2: [dat[0x04],dat[0x05]],
            volume: dat[0x06],
            pad3: dat[0x07..0x27].try_into().expect("length was checked"),
            max_pairs: dat[0x27],
            pad4: dat[0x28..0x30].try_into().expect("length was checked"),
            last_track: dat[0x30],
            track_direction: dat[0x31] as i8,
            pad5: [dat[0x32],dat[0x33]],
            num_tracks: dat[0x34],
            num_sectors: dat[0x35],
            bytes_per_sector: u16::from_le_bytes([dat[0x36],dat[0x37]]),
            free_sectors
        })
    }
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0;SECTOR_SIZE];
        buf[0x00] = self.pad1;
        buf[0x01] = self.catalog_track;
        buf[0x02] = self.catalog_sector;
        buf[0x03] = self.dos_release;
        buf[0x04..0x06].copy_from_slice(&self.pad2);
        buf[0x06] = self.volume;
        buf[0x07..0x27].copy_from_slice(&self.pad3);
        buf[0x27] = self.max_pairs;
        buf[0x28..0x30].copy_from_slice(&self.pad4);
        buf[0x30] = self.last_track;
        buf[0x31] = self.track_direction as u8;
        buf[0x32..0x34].copy_from_slice(&self.pad5);
        buf[0x34] = self.num_tracks;
        buf[0x35] = self.num_sectors;
        buf[0x36..0x38].copy_from_slice(&u16::to_le_bytes(self.bytes_per_sector));
        for (i,m) in self.free_sectors.iter().enumerate() {
            buf[0x38+4*i..0x3c+4*i].copy_from_slice(&m.0);
        }
        buf
    }
}

/// Status of a file descriptive entry, inferred from the first byte.
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum FileDescStatus {
    Normal,
    Deleted,
    Unused
}

/// A 35-byte file descriptive entry within a catalog sector.
#[derive(Clone,Copy,Debug)]
pub struct FileDesc {
    /// Track of first track/sector list sector.  0xFF marks a deleted file
    /// (the original track moves to the last byte of the name field); 0 marks
    /// an entry that was never used.
    pub tsl_track: u8,
    pub tsl_sector: u8,
    pub file_type: u8,
    /// negative ASCII, trailing-space padded
    pub file_name: [u8;30],
    pub sector_count: u16
}

impl FileDesc {
    pub fn status(&self) -> FileDescStatus {
        match self.tsl_track {
            0 => FileDescStatus::Unused,
            0xff => FileDescStatus::Deleted,
            _ => FileDescStatus::Normal
        }
    }
    /// The filename as a plain string, space padding removed.
    pub fn name_string(&self) -> String {
        let slice: &[u8] = match self.status() {
            FileDescStatus::Deleted => &self.file_name[0..29],
            _ => &self.file_name[..]
        };
        let positive: Vec<u8> = slice.iter().map(|b| b.wrapping_sub(0x80)).collect();
        String::from_utf8_lossy(&positive).trim_end_matches(' ').to_string()
    }
    /// Catalog descriptor.  The length is -1 because it cannot be known
    /// without reading the file itself.
    pub fn descriptor(&self) -> Descriptor {
        Descriptor {
            name: self.name_string(),
            full_name: None,
            sectors: self.sector_count as usize,
            blocks: 0,
            length: -1,
            locked: self.file_type & FILETYPE_LOCKED > 0,
            file_type: filetype(self.file_type)
        }
    }
}

/// Map the low 7 bits of a DOS filetype byte to the shared filetype code.
pub fn filetype(file_type: u8) -> Filetype {
    match file_type & 0x7f {
        FILETYPE_TEXT => Filetype::ASCII_TEXT,
        FILETYPE_INTEGER => Filetype::INTEGER_BASIC,
        FILETYPE_APPLESOFT => Filetype::APPLESOFT_BASIC,
        FILETYPE_BINARY => Filetype::BINARY,
        FILETYPE_S => Filetype::S,
        FILETYPE_RELOCATABLE => Filetype::RELOCATABLE,
        FILETYPE_A => Filetype::NEW_A,
        FILETYPE_B => Filetype::NEW_B,
        _ => Filetype::TYPELESS
    }
}

impl DiskStruct for FileDesc {
    const LEN: usize = 35;
    fn from_bytes(dat: &[u8]) -> Result<Self,DiskStructError> {
        verify_len("FileDesc",dat,Self::LEN)?;
        Ok(Self {
            tsl_track: dat[0x00],
            tsl_sector: dat[0x01],
            file_type: dat[0x02],
            file_name: dat[0x03..0x21].try_into().expect("length was checked"),
            sector_count: u16::from_le_bytes([dat[0x21],dat[0x22]])
        })
    }
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0;Self::LEN];
        buf[0x00] = self.tsl_track;
        buf[0x01] = self.tsl_sector;
        buf[0x02] = self.file_type;
        buf[0x03..0x21].copy_from_slice(&self.file_name);
        buf[0x21..0x23].copy_from_slice(&u16::to_le_bytes(self.sector_count));
        buf
    }
}

/// A catalog sector: linked-list pointer plus 7 file descriptive entries.
#[derive(Clone)]
pub struct CatalogSector {
    pub pad1: u8,
    /// track of next catalog sector, zero at the end of the chain
    pub next_track: u8,
    pub next_sector: u8,
    pub pad2: [u8;8],
    pub file_descs: [FileDesc;7]
}

impl DiskStruct for CatalogSector {
    const LEN: usize = SECTOR_SIZE;
    fn from_bytes(dat: &[u8]) -> Result<Self,DiskStructError> {
        verify_len("CatalogSector",dat,Self::LEN)?;
        let mut file_descs = [FileDesc::from_bytes(&dat[0x0b..0x0b+35])?;7];
        for i in 1..7 {
            file_descs[i] = FileDesc::from_bytes(&dat[0x0b+35*i..0x0b+35*(i+1)])?;
        }
        Ok(Self {
            pad1: dat[0x00],
            next_track: dat[0x01],
            next_sector: dat[0x02],
            pad2: dat[0x03..0x0b].try_into().expect("length was checked"),
            file_descs
        })
    }
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0;SECTOR_SIZE];
        buf[0x00] = self.pad1;
        buf[0x01] = self.next_track;
        buf[0x02] = self.next_sector;
        buf[0x03..0x0b].copy_from_slice(&self.pad2);
        for (i,fd) in self.file_descs.iter().enumerate() {
            buf[0x0b+35*i..0x0b+35*(i+1)].copy_from_slice(&fd.to_bytes());
        }
        buf
    }
}

/// A track/sector list sector: linked-list pointer, file-relative offset of
/// the first data sector it covers, and 122 track/sector pairs.
#[derive(Clone)]
pub struct TrackSectorList {
    pub pad1: u8,
    /// track of next list sector if one was needed, else zero
    pub next_track: u8,
    pub next_sector: u8,
    pub pad2: [u8;2],
    /// sector offset in file of the first sector described by this list
    pub sector_offset: u16,
    pub pad3: [u8;5],
    /// 122 track/sector pairs, packed in order
    pub pairs: [u8;244]
}

impl TrackSectorList {
    pub const MAX_PAIRS: usize = 122;
    pub fn pair(&self, idx: usize) -> (u8,u8) {
        (self.pairs[idx*2],self.pairs[idx*2+1])
    }
    pub fn set_pair(&mut self, idx: usize, track: u8, sector: u8) {
        self.pairs[idx*2] = track;
        self.pairs[idx*2+1] = sector;
    }
}

impl DiskStruct for TrackSectorList {
    const LEN: usize = SECTOR_SIZE;
    fn from_bytes(dat: &[u8]) -> Result<Self,DiskStructError> {
        verify_len("TrackSectorList",dat,Self::LEN)?;
        Ok(Self {
            pad1: dat[0x00],
            next_track: dat[0x01],
            next_sector: dat[0x02],
            pad2: [dat[0x03],dat[0x04]],
            sector_offset: u16::from_le_bytes([dat[0x05],dat[0x06]]),
            pad3: dat[0x07..0x0c].try_into().expect("length was checked"),
            pairs: dat[0x0c..0x100].try_into().expect("length was checked")
        })
    }
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0;SECTOR_SIZE];
        buf[0x00] = self.pad1;
        buf[0x01] = self.next_track;
        buf[0x02] = self.next_sector;
        buf[0x03..0x05].copy_from_slice(&self.pad2);
        buf[0x05..0x07].copy_from_slice(&u16::to_le_bytes(self.sector_offset));
        buf[0x07..0x0c].copy_from_slice(&self.pad3);
        buf[0x0c..0x100].copy_from_slice(&self.pairs);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn junk_sector(seed: u32) -> Vec<u8> {
        let mut state = seed;
        let mut ans = Vec::new();
        for _i in 0..SECTOR_SIZE {
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            ans.push((state >> 16) as u8);
        }
        ans
    }

    #[test]
    fn vtoc_roundtrip() {
        let buf = junk_sector(1);
        let vtoc = VTOC::from_bytes(&buf).expect("decode failed");
        assert_eq!(vtoc.to_bytes(),buf);
        let again = VTOC::from_bytes(&vtoc.to_bytes()).expect("decode failed");
        assert_eq!(again.to_bytes(),buf);
    }

    #[test]
    fn catalog_sector_roundtrip() {
        let buf = junk_sector(2);
        let cs = CatalogSector::from_bytes(&buf).expect("decode failed");
        assert_eq!(cs.to_bytes(),buf);
    }

    #[test]
    fn tslist_roundtrip() {
        let buf = junk_sector(3);
        let tsl = TrackSectorList::from_bytes(&buf).expect("decode failed");
        assert_eq!(tsl.to_bytes(),buf);
    }

    #[test]
    fn record_sizes() {
        assert!(VTOC::from_bytes(&[0;255]).is_err());
        assert!(CatalogSector::from_bytes(&[0;257]).is_err());
        assert!(FileDesc::from_bytes(&[0;34]).is_err());
    }

    #[test]
    fn free_sector_bits() {
        let tf = TrackFreeSectors([0b00000001,0b10000000,0,0]);
        assert!(tf.is_free(7));
        assert!(tf.is_free(8));
        assert!(!tf.is_free(0));
        assert!(!tf.is_free(15));
        assert!(!tf.is_free(16));
        assert!(tf.unused_clear());
        assert!(!TrackFreeSectors([0,0,1,0]).unused_clear());
    }

    #[test]
    fn deleted_name_uses_original_track_byte() {
        let mut fd = FileDesc::from_bytes(&vec![0;35]).expect("decode failed");
        fd.tsl_track = 0xff;
        fd.file_name = [0xa0;30];
        for (i,b) in "LOST".bytes().enumerate() {
            fd.file_name[i] = b + 0x80;
        }
        fd.file_name[29] = 0x11; // original track, not part of the name
        assert_eq!(fd.status(),FileDescStatus::Deleted);
        assert_eq!(fd.name_string(),"LOST");
    }
}
