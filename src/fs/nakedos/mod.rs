//! # NakedOS/Super-Mon file system module
//!
//! NakedOS has no directory in the DOS sense: a 560-byte sector map assigns
//! every sector of the disk to a file number, and Super-Mon's symbol table
//! (files 3 and 4) optionally gives the files names.  This is the one file
//! system in the crate with a full write path.  The operator expects its
//! buffer in raw (physical) sector order.

pub mod symbols;

use std::collections::BTreeMap;
use log::{debug,warn};
use symbols::{SymbolTable,encode_symbol,fullname_for_file,name_for_file,parse_address_filename};
use crate::img;
use crate::img::TrackSector;
use crate::fs::{Descriptor,DiskOrder,FileInfo,Filetype,Operator,OperatorFactory};
use crate::{DYNERR,Error,STDRESULT};

/// sector map value that is never allowed
pub const FILE_ILLEGAL: u8 = 0x00;
/// sector map value signifying unused space
pub const FILE_FREE: u8 = 0xff;
/// sector map value signifying space used by NakedOS itself
pub const FILE_RESERVED: u8 = 0xfe;

/// the sector map covers every sector of a 35 track disk
pub const SECTOR_MAP_BYTES: usize = 560;
/// boot file; NakedOS loads it at 0x1800
pub const HELLO_FILE: u8 = 0x01;
/// address half of the Super-Mon symbol table
pub const SYMTBL1_FILE: u8 = 0x03;
/// name half of the Super-Mon symbol table
pub const SYMTBL2_FILE: u8 = 0x04;

const OPERATOR_NAME: &str = "nakedos";

/// The list of sectors by file, indexed `[track*16 + sector]`.
/// It lives in the tail of track 0 sector 9 plus sectors 0xA and 0xB.
#[derive(Clone)]
pub struct SectorMap(Vec<u8>);

impl SectorMap {
    /// A map with nothing on the disk except NakedOS's own reservation.
    pub fn blank() -> Self {
        let mut map = vec![FILE_FREE;SECTOR_MAP_BYTES];
        for sector in 0..=0x0b {
            map[sector] = FILE_RESERVED;
        }
        Self(map)
    }
    /// Load the sector map from its three home sectors.
    pub fn load(diskbytes: &[u8]) -> Result<Self,DYNERR> {
        let sector09 = img::read_sector(diskbytes,0,9)?;
        let sector0a = img::read_sector(diskbytes,0,0x0a)?;
        let sector0b = img::read_sector(diskbytes,0,0x0b)?;
        let mut map = Vec::with_capacity(SECTOR_MAP_BYTES);
        map.extend_from_slice(&sector09[0xd0..]);
        map.extend_from_slice(&sector0a);
        map.extend_from_slice(&sector0b);
        Ok(Self(map))
    }
    /// Write the sector map back to its three home sectors.  Sector 9 is
    /// spliced so its leading 0xD0 bytes are untouched.
    pub fn persist(&self, diskbytes: &mut [u8]) -> STDRESULT {
        let mut sector09 = img::read_sector(diskbytes,0,9)?;
        sector09[0xd0..].copy_from_slice(&self.0[0..0x30]);
        img::write_sector(diskbytes,0,9,&sector09)?;
        img::write_sector(diskbytes,0,0x0a,&self.0[0x30..0x130])?;
        img::write_sector(diskbytes,0,0x0b,&self.0[0x130..0x230])
    }
    /// Check that we actually have a NakedOS disk: the OS sectors must be
    /// reserved and no cell may hold the illegal value.
    pub fn verify(&self) -> STDRESULT {
        for sector in 0..=0x0b {
            let file = self.file_for_sector(0,sector);
            if file != FILE_RESERVED {
                return Err(Box::new(Error::Corruption(format!(
                    "expected track 0, sectors 0-B to be reserved (0xFE), but got {:#04X} in sector {:X}",file,sector))));
            }
        }
        for track in 0..img::FLOPPY_TRACKS as u8 {
            for sector in 0..img::FLOPPY_SECTORS as u8 {
                if self.file_for_sector(track,sector) == FILE_ILLEGAL {
                    return Err(Box::new(Error::Corruption(format!(
                        "found illegal sector map value (00) in track {:X} sector {:X}",track,sector))));
                }
            }
        }
        Ok(())
    }
    /// The file that owns the given sector, or the illegal value if the
    /// track or sector is out of range.
    pub fn file_for_sector(&self, track: u8, sector: u8) -> u8 {
        if track as usize >= img::FLOPPY_TRACKS || sector as usize >= img::FLOPPY_SECTORS {
            return FILE_ILLEGAL;
        }
        self.0[track as usize * 16 + sector as usize]
    }
    /// Assign a sector to a user file.
    pub fn set_file_for_sector(&mut self, track: u8, sector: u8, file: u8) -> STDRESULT {
        if track as usize >= img::FLOPPY_TRACKS || sector as usize >= img::FLOPPY_SECTORS {
            return Err(Box::new(Error::OutOfRange(format!(
                "track {} sector {}",track,sector))));
        }
        if file == FILE_ILLEGAL || file == FILE_FREE || file == FILE_RESERVED {
            return Err(Box::new(Error::OutOfRange(format!(
                "illegal file number: {:#04X}",file))));
        }
        self.0[track as usize * 16 + sector as usize] = file;
        Ok(())
    }
    /// Sectors belonging to the given file, in track-then-sector order.
    pub fn sectors_for_file(&self, file: u8) -> Vec<TrackSector> {
        let mut result = Vec::new();
        for track in 0..img::FLOPPY_TRACKS as u8 {
            for sector in 0..img::FLOPPY_SECTORS as u8 {
                if file == self.file_for_sector(track,sector) {
                    result.push(TrackSector { track, sector });
                }
            }
        }
        result
    }
    /// Map of file number to owned sectors, ordered by file number.
    pub fn sectors_by_file(&self) -> BTreeMap<u8,Vec<TrackSector>> {
        let mut result = BTreeMap::new();
        for file in 1..FILE_RESERVED {
            let sectors = self.sectors_for_file(file);
            if sectors.len() > 0 {
                result.insert(file,sectors);
            }
        }
        result
    }
    /// Number of free sectors.
    pub fn free_sectors(&self) -> usize {
        self.0.iter().filter(|f| **f == FILE_FREE).count()
    }
    /// The first file number not already in use, or None if all are taken.
    pub fn first_free_file(&self) -> Option<u8> {
        for file in 1..FILE_RESERVED {
            if self.sectors_for_file(file).len() == 0 {
                return Some(file);
            }
        }
        None
    }
    /// Concatenated contents of all sectors owned by the file.
    pub fn read_file(&self, diskbytes: &[u8], file: u8) -> Result<Vec<u8>,DYNERR> {
        let mut result = Vec::new();
        for ts in self.sectors_for_file(file) {
            result.extend(img::read_sector(diskbytes,ts.track,ts.sector)?);
        }
        Ok(result)
    }
    /// Free every cell owned by the file.  Does not persist the change.
    pub fn delete(&mut self, file: u8) {
        for cell in self.0.iter_mut() {
            if *cell == file {
                *cell = FILE_FREE;
            }
        }
    }
    /// Write the contents of a file into free sectors in ascending order,
    /// claiming them in the map, and persist the map.  Returns true if the
    /// file already existed (in which case `overwrite` must be set).
    pub fn write_file(&mut self, diskbytes: &mut [u8], file: u8, contents: &[u8], overwrite: bool) -> Result<bool,DYNERR> {
        let sectors_needed = (contents.len() + 255) / 256;
        let mut cts = contents.to_vec();
        cts.resize(sectors_needed * 256, 0);
        let existing = self.sectors_for_file(file).len();
        let existed = existing > 0;
        let free = self.free_sectors() + existing;
        if free < sectors_needed {
            return Err(Box::new(Error::OutOfSpace(format!(
                "file {} requires {} sectors, but only {} are available",file,sectors_needed,free))));
        }
        if existed {
            if !overwrite {
                return Err(Box::new(Error::AlreadyExists(format!("file {}",file))));
            }
            self.delete(file);
        }
        let mut i = 0;
        'outer: for track in 0..img::FLOPPY_TRACKS as u8 {
            for sector in 0..img::FLOPPY_SECTORS as u8 {
                if self.file_for_sector(track,sector) == FILE_FREE {
                    img::write_sector(diskbytes,track,sector,&cts[i*256..(i+1)*256])?;
                    self.set_file_for_sector(track,sector,file)?;
                    i += 1;
                    if i == sectors_needed {
                        break 'outer;
                    }
                }
            }
        }
        self.persist(diskbytes)?;
        Ok(existed)
    }
    /// Read the Super-Mon symbol table out of files 3 and 4.
    pub fn read_symbol_table(&self, diskbytes: &[u8]) -> Result<SymbolTable,DYNERR> {
        let symtbl1 = self.read_file(diskbytes,SYMTBL1_FILE)?;
        let symtbl2 = self.read_file(diskbytes,SYMTBL2_FILE)?;
        SymbolTable::from_files(&symtbl1,&symtbl2)
    }
    /// Write the Super-Mon symbol table back into files 3 and 4.
    pub fn write_symbol_table(&mut self, diskbytes: &mut [u8], st: &SymbolTable) -> STDRESULT {
        let (symtbl1,symtbl2) = st.to_files()?;
        self.write_file(diskbytes,SYMTBL1_FILE,&symtbl1,true)?;
        self.write_file(diskbytes,SYMTBL2_FILE,&symtbl2,true)?;
        Ok(())
    }
}

/// The operator for NakedOS/Super-Mon disks.
pub struct Disk {
    data: Vec<u8>,
    map: SectorMap,
    symbols: Option<SymbolTable>
}

impl Disk {
    pub fn new(data: Vec<u8>, map: SectorMap, symbols: Option<SymbolTable>) -> Self {
        Self { data, map, symbols }
    }
    fn file_for_name(&self, filename: &str) -> Result<u8,DYNERR> {
        match &self.symbols {
            Some(st) => st.file_for_name(filename),
            None => match parse_address_filename(filename) {
                Some(file) => Ok(file),
                None => Err(Box::new(Error::NotFound(format!("filename \"{}\"",filename))))
            }
        }
    }
}

impl Operator for Disk {
    fn name(&self) -> &str {
        OPERATOR_NAME
    }
    fn disk_order(&self) -> DiskOrder {
        DiskOrder::Raw
    }
    fn has_subdirs(&self) -> bool {
        false
    }
    fn catalog(&self, subdir: &str) -> Result<Vec<Descriptor>,DYNERR> {
        if subdir.len() > 0 {
            return Err(Box::new(Error::NotFound(format!("subdirectory `{}`",subdir))));
        }
        let mut descs = Vec::new();
        for (file,sectors) in self.map.sectors_by_file() {
            descs.push(Descriptor {
                name: name_for_file(file,self.symbols.as_ref()),
                full_name: Some(fullname_for_file(file,self.symbols.as_ref())),
                sectors: sectors.len(),
                blocks: 0,
                length: sectors.len() as i64 * 256,
                locked: false,
                file_type: Filetype::BINARY
            });
        }
        Ok(descs)
    }
    fn get_file(&self, name: &str) -> Result<FileInfo,DYNERR> {
        let file = self.file_for_name(name)?;
        let data = self.map.read_file(&self.data,file)?;
        if data.len() == 0 {
            return Err(Box::new(Error::NotFound(format!("file DF{:02X}",file))));
        }
        Ok(FileInfo {
            descriptor: Descriptor {
                name: name_for_file(file,self.symbols.as_ref()),
                full_name: Some(fullname_for_file(file,self.symbols.as_ref())),
                sectors: data.len() / 256,
                blocks: 0,
                length: data.len() as i64,
                locked: false,
                file_type: Filetype::BINARY
            },
            start_address: match file {
                HELLO_FILE => 0x1800,
                _ => 0
            },
            data
        })
    }
    fn delete(&mut self, name: &str) -> Result<bool,DYNERR> {
        let file = self.file_for_name(name)?;
        let existed = self.map.sectors_for_file(file).len() > 0;
        self.map.delete(file);
        self.map.persist(&mut self.data)?;
        if let Some(st) = &mut self.symbols {
            if st.delete_symbol(name) {
                debug!("symbol \"{}\" removed with its file",name);
                let st = st.clone();
                self.map.write_symbol_table(&mut self.data,&st)?;
            }
        }
        Ok(existed)
    }
    fn put_file(&mut self, info: &FileInfo, overwrite: bool) -> Result<bool,DYNERR> {
        if info.descriptor.file_type != Filetype::BINARY {
            return Err(Box::new(Error::NotImplemented(format!(
                "{}: only binary files are supported",OPERATOR_NAME))));
        }
        if info.descriptor.length != info.data.len() as i64 {
            return Err(Box::new(Error::OutOfRange(format!(
                "mismatch between descriptor length ({}) and actual data length ({})",
                info.descriptor.length,info.data.len()))));
        }
        let (num_file,named_file,symbol) = match &self.symbols {
            Some(st) => st.files_for_compound_name(&info.descriptor.name)?,
            None => match parse_address_filename(&info.descriptor.name) {
                Some(file) => (file,0,String::new()),
                None => return Err(Box::new(Error::InvalidName(format!(
                    "cannot use symbolic names on disks without valid symbol tables in files 0x03 and 0x04"))))
            }
        };
        if symbol.len() > 0 {
            encode_symbol(&symbol)?;
        }
        let num_file = match num_file {
            0 => match self.map.first_free_file() {
                Some(file) => file,
                None => return Err(Box::new(Error::OutOfSpace("all file numbers already used".to_string())))
            },
            n => n
        };
        let existed = self.map.write_file(&mut self.data,num_file,&info.data,overwrite)?;
        if named_file != num_file && symbol.len() > 0 {
            if let Some(st) = &mut self.symbols {
                st.add_symbol(&symbol,0xdf00 + num_file as u16)?;
                let st = st.clone();
                self.map.write_symbol_table(&mut self.data,&st)?;
            }
        }
        Ok(existed)
    }
    fn get_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Factory probing for NakedOS disks.
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
        DiskOrder::Raw
    }
    fn seems_to_match(&self, diskbytes: &[u8]) -> bool {
        match SectorMap::load(diskbytes) {
            Ok(sm) => sm.verify().is_ok(),
            Err(_) => false
        }
    }
    fn operator(&self, diskbytes: Vec<u8>) -> Result<Box<dyn Operator>,DYNERR> {
        let sm = SectorMap::load(&diskbytes)?;
        sm.verify()?;
        let symbols = match sm.read_symbol_table(&diskbytes) {
            Ok(st) => Some(st),
            Err(e) => {
                warn!("continuing without symbols: {}",e);
                None
            }
        };
        Ok(Box::new(Disk::new(diskbytes,sm,symbols)))
    }
}
