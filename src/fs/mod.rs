//! # File System Module
//!
//! This is a container for file system modules.  Each file system exposes a
//! uniform facade through the `Operator` trait: catalog, get, put, delete.
//! Operators own their backing byte buffer, which must already be in the
//! file system's preferred logical sector order; the dispatcher in the crate
//! root takes care of swizzling before construction.
//!
//! File systems are represented by the `Operator` trait, and discovered
//! through the `OperatorFactory` trait.

pub mod dos3;
pub mod nakedos;
pub mod prodos;

use std::fmt;
use std::str::FromStr;
use crate::{DYNERR,Error};

/// Logical sector ordering of a floppy image buffer.
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum DiskOrder {
    /// DOS 3.3 logical ordering, `.do`/`.dsk`
    DOS,
    /// ProDOS logical ordering, `.po`
    ProDOS,
    /// physical ordering, no permutation
    Raw,
    /// ask the dispatcher to guess
    Auto
}

impl FromStr for DiskOrder {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "do" => Ok(Self::DOS),
            "po" => Ok(Self::ProDOS),
            "raw" => Ok(Self::Raw),
            "auto" => Ok(Self::Auto),
            _ => Err(Error::InvalidOrder(s.to_string()))
        }
    }
}

impl fmt::Display for DiskOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DOS => write!(f,"do"),
            Self::ProDOS => write!(f,"po"),
            Self::Raw => write!(f,"raw"),
            Self::Auto => write!(f,"auto")
        }
    }
}

/// Describes the type of a file.  Byte-compatible with the ProDOS/SOS
/// filetype byte in the range 0x00-0xFF; the DOS 3.3 letter types that have
/// no ProDOS equivalent are mapped above the byte range.
#[derive(PartialEq,Eq,Clone,Copy,Debug,Hash)]
pub struct Filetype(pub u16);

impl Filetype {
    pub const TYPELESS: Filetype = Filetype(0x00);
    pub const BAD_BLOCKS: Filetype = Filetype(0x01);
    pub const ASCII_TEXT: Filetype = Filetype(0x04);
    pub const BINARY: Filetype = Filetype(0x06);
    pub const DIRECTORY: Filetype = Filetype(0x0f);
    pub const APPLEWORKS_DATABASE: Filetype = Filetype(0x19);
    pub const APPLEWORKS_WORD_PROCESSOR: Filetype = Filetype(0x1a);
    pub const APPLEWORKS_SPREADSHEET: Filetype = Filetype(0x1b);
    pub const PASCAL_AREA: Filetype = Filetype(0xef);
    pub const COMMAND: Filetype = Filetype(0xf0);
    pub const INTEGER_BASIC: Filetype = Filetype(0xfa);
    pub const INTEGER_BASIC_VARS: Filetype = Filetype(0xfb);
    pub const APPLESOFT_BASIC: Filetype = Filetype(0xfc);
    pub const APPLESOFT_BASIC_VARS: Filetype = Filetype(0xfd);
    pub const RELOCATABLE: Filetype = Filetype(0xfe);
    pub const SYSTEM: Filetype = Filetype(0xff);
    /// DOS 3.3 type "S"
    pub const S: Filetype = Filetype(0x100);
    /// DOS 3.3 type "new A"
    pub const NEW_A: Filetype = Filetype(0x101);
    /// DOS 3.3 type "new B"
    pub const NEW_B: Filetype = Filetype(0x102);

    /// Three-letter ProDOS style abbreviation, or empty.
    pub fn three_letter(&self) -> &'static str {
        match filetype_info(*self) {
            Some(info) => info.three_letter,
            None => ""
        }
    }
    /// One-letter DOS 3.3 style abbreviation, or empty.
    pub fn one_letter(&self) -> &'static str {
        match filetype_info(*self) {
            Some(info) => info.one_letter,
            None => ""
        }
    }
    /// Short display string: three-letter name, one-letter name, or hex code.
    pub fn display(&self) -> String {
        if let Some(info) = filetype_info(*self) {
            if info.three_letter.len() > 0 {
                return info.three_letter.to_string();
            }
            if info.one_letter.len() > 0 {
                return info.one_letter.to_string();
            }
        }
        format!("${:02X}",self.0)
    }
}

/// Accepts a constant name ("Binary"), a three-letter name ("BIN"), a
/// one-letter name ("B"), or a numeric code, in any case.
impl FromStr for Filetype {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        for info in FILETYPE_INFOS {
            if s.eq_ignore_ascii_case(info.name) {
                return Ok(info.typ);
            }
            if info.three_letter.len()>0 && s.eq_ignore_ascii_case(info.three_letter) {
                return Ok(info.typ);
            }
            if info.one_letter.len()>0 && s.eq_ignore_ascii_case(info.one_letter) {
                return Ok(info.typ);
            }
        }
        if let Ok(num) = u16::from_str(s) {
            if num < 0x103 {
                return Ok(Filetype(num));
            }
        }
        Err(Error::NotFound(format!("filetype `{}`",s)))
    }
}

/// Name information for one filetype.
pub struct FiletypeInfo {
    pub typ: Filetype,
    /// Constant-style name, e.g. `Binary`
    pub name: &'static str,
    /// Three-letter ProDOS abbreviation, or empty
    pub three_letter: &'static str,
    /// One-letter DOS 3.3 abbreviation, or empty
    pub one_letter: &'static str,
    pub desc: &'static str
}

/// Named filetypes, in display order.  SOS-only and reserved codes are
/// generated on demand by `all_filetype_infos`.
pub const FILETYPE_INFOS: &[FiletypeInfo] = &[
    FiletypeInfo { typ: Filetype::TYPELESS, name: "Typeless", three_letter: "", one_letter: "", desc: "Typeless file" },
    FiletypeInfo { typ: Filetype::BAD_BLOCKS, name: "BadBlocks", three_letter: "", one_letter: "", desc: "Bad blocks file" },
    FiletypeInfo { typ: Filetype::ASCII_TEXT, name: "ASCIIText", three_letter: "TXT", one_letter: "T", desc: "ASCII text file" },
    FiletypeInfo { typ: Filetype::BINARY, name: "Binary", three_letter: "BIN", one_letter: "B", desc: "Binary file" },
    FiletypeInfo { typ: Filetype::DIRECTORY, name: "Directory", three_letter: "DIR", one_letter: "D", desc: "Directory file" },
    FiletypeInfo { typ: Filetype::APPLEWORKS_DATABASE, name: "AppleWorksDatabase", three_letter: "ADB", one_letter: "", desc: "AppleWorks data base file" },
    FiletypeInfo { typ: Filetype::APPLEWORKS_WORD_PROCESSOR, name: "AppleWorksWordProcessor", three_letter: "AWP", one_letter: "", desc: "AppleWorks word processing file" },
    FiletypeInfo { typ: Filetype::APPLEWORKS_SPREADSHEET, name: "AppleWorksSpreadsheet", three_letter: "ASP", one_letter: "", desc: "AppleWorks spreadsheet file" },
    FiletypeInfo { typ: Filetype::PASCAL_AREA, name: "Pascal", three_letter: "PAS", one_letter: "", desc: "ProDOS PASCAL file" },
    FiletypeInfo { typ: Filetype::COMMAND, name: "Command", three_letter: "CMD", one_letter: "", desc: "Added command file" },
    FiletypeInfo { typ: Filetype::INTEGER_BASIC, name: "IntegerBASIC", three_letter: "INT", one_letter: "I", desc: "Integer BASIC program file" },
    FiletypeInfo { typ: Filetype::INTEGER_BASIC_VARS, name: "IntegerBASICVariables", three_letter: "IVR", one_letter: "", desc: "Integer BASIC variables file" },
    FiletypeInfo { typ: Filetype::APPLESOFT_BASIC, name: "ApplesoftBASIC", three_letter: "BAS", one_letter: "A", desc: "Applesoft BASIC program file" },
    FiletypeInfo { typ: Filetype::APPLESOFT_BASIC_VARS, name: "ApplesoftBASICVariables", three_letter: "VAR", one_letter: "", desc: "Applesoft BASIC variables file" },
    FiletypeInfo { typ: Filetype::RELOCATABLE, name: "Relocatable", three_letter: "REL", one_letter: "R", desc: "EDASM relocatable object module file" },
    FiletypeInfo { typ: Filetype::SYSTEM, name: "System", three_letter: "SYS", one_letter: "", desc: "System file" },
    FiletypeInfo { typ: Filetype::S, name: "S", three_letter: "", one_letter: "S", desc: "DOS 3.3 type \"S\"" },
    FiletypeInfo { typ: Filetype::NEW_A, name: "NewA", three_letter: "", one_letter: "A", desc: "DOS 3.3 type \"new A\"" },
    FiletypeInfo { typ: Filetype::NEW_B, name: "NewB", three_letter: "", one_letter: "B", desc: "DOS 3.3 type \"new B\"" },
];

fn filetype_info(typ: Filetype) -> Option<&'static FiletypeInfo> {
    FILETYPE_INFOS.iter().find(|info| info.typ == typ)
}

/// Every filetype code, including SOS-only codes and the reserved ranges.
/// Used by the `filetypes --all` listing.
pub fn all_filetype_infos() -> Vec<(Filetype,String,String,String,String)> {
    let sos_named: &[(u16,&str,&str)] = &[
        (0x02,"SOSPascalCode","PASCAL code file"),
        (0x03,"SOSPascalText","PASCAL text file"),
        (0x05,"SOSPascalText2","PASCAL text file"),
        (0x07,"Font","Font file"),
        (0x08,"GraphicsScreen","Graphics screen file"),
        (0x09,"BusinessBASIC","Business BASIC program file"),
        (0x0a,"BusinessBASICData","Business BASIC data file"),
        (0x0b,"SOSWordProcessor","Word processor file"),
        (0x0c,"SOSSystem","SOS system file"),
        (0x10,"RPSData","RPS data file"),
        (0x11,"RPSIndex","RPS index file"),
    ];
    let mut ans = Vec::new();
    for code in 0u16..0x103 {
        let typ = Filetype(code);
        if let Some(info) = filetype_info(typ) {
            ans.push((typ,info.name.to_string(),info.three_letter.to_string(),
                info.one_letter.to_string(),info.desc.to_string()));
            continue;
        }
        if let Some((_,name,desc)) = sos_named.iter().find(|(c,_,_)| *c==code) {
            ans.push((typ,name.to_string(),String::new(),String::new(),desc.to_string()));
            continue;
        }
        let (name,desc) = match code {
            c if c < 0xc0 => (format!("SOSReserved{:02X}",c),format!("SOS reserved for future use {:02X}",c)),
            c if c < 0xef => (format!("ProDOSReserved{:02X}",c),format!("ProDOS reserved for future use {:02X}",c)),
            c => (format!("UserDefined{:02X}",c),format!("ProDOS user defined file type {:02X}",c))
        };
        ans.push((typ,name,String::new(),String::new(),desc));
    }
    ans
}

/// Describes a file's catalog characteristics, abstracted from any one
/// file system's layout.
#[derive(Clone,Debug)]
pub struct Descriptor {
    pub name: String,
    /// A more complete filename, where one exists (e.g. Super-Mon `DFxx:SYM`).
    pub full_name: Option<String>,
    pub sectors: usize,
    pub blocks: usize,
    /// Length in bytes, or -1 when it cannot be known without reading the file.
    pub length: i64,
    pub locked: bool,
    pub file_type: Filetype
}

/// A file descriptor plus the content.
#[derive(Clone,Debug)]
pub struct FileInfo {
    pub descriptor: Descriptor,
    pub data: Vec<u8>,
    /// Load address for binary files (0x801 for Applesoft, 0x1800 for the
    /// NakedOS boot file, the address prefix of DOS 3.3 binary files).
    pub start_address: u16
}

/// The uniform facade for operating on a mounted file system.
pub trait Operator {
    /// Keyword name of the file system: "dos3", "nakedos", or "prodos".
    fn name(&self) -> &str;
    /// The logical sector order this operator expects its buffer to be in.
    fn disk_order(&self) -> DiskOrder;
    /// True if the file system on the disk allows subdirectories.
    fn has_subdirs(&self) -> bool;
    /// List non-deleted entries.  `subdir` must be empty for file systems
    /// without subdirectories.
    fn catalog(&self, subdir: &str) -> Result<Vec<Descriptor>,DYNERR>;
    /// Retrieve a file by name.
    fn get_file(&self, name: &str) -> Result<FileInfo,DYNERR>;
    /// Delete a file by name.  Returns true if the file existed.
    fn delete(&mut self, name: &str) -> Result<bool,DYNERR>;
    /// Write a file.  Fails if the file exists and `overwrite` is false;
    /// otherwise returns true if an existing file was replaced.
    fn put_file(&mut self, info: &FileInfo, overwrite: bool) -> Result<bool,DYNERR>;
    /// The disk image bytes, in this operator's logical order.
    fn get_bytes(&self) -> &[u8];
}

/// Probes byte buffers and constructs operators.
pub trait OperatorFactory {
    /// Keyword name of the file system this factory understands.
    fn name(&self) -> &str;
    /// The logical order the constructed operator will expect.
    fn disk_order(&self) -> DiskOrder;
    /// Fast best-effort probe: does this buffer look like our file system?
    fn seems_to_match(&self, diskbytes: &[u8]) -> bool;
    /// Construct an operator owning `diskbytes`.
    fn operator(&self, diskbytes: Vec<u8>) -> Result<Box<dyn Operator>,DYNERR>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn filetype_names() {
        assert_eq!(Filetype::from_str("B").unwrap(),Filetype::BINARY);
        assert_eq!(Filetype::from_str("bin").unwrap(),Filetype::BINARY);
        assert_eq!(Filetype::from_str("SYS").unwrap(),Filetype::SYSTEM);
        assert_eq!(Filetype::from_str("Typeless").unwrap(),Filetype::TYPELESS);
        assert!(Filetype::from_str("nonsense").is_err());
        assert_eq!(Filetype::BINARY.display(),"BIN");
        assert_eq!(Filetype::S.display(),"S");
        assert_eq!(Filetype(0xf1).display(),"$F1");
    }

    #[test]
    fn disk_orders() {
        assert_eq!(DiskOrder::from_str("do").unwrap(),DiskOrder::DOS);
        assert_eq!(DiskOrder::from_str("po").unwrap(),DiskOrder::ProDOS);
        assert_eq!(DiskOrder::Raw.to_string(),"raw");
        assert!(DiskOrder::from_str("dos").is_err());
    }

    #[test]
    fn full_filetype_listing() {
        let all = all_filetype_infos();
        assert_eq!(all.len(),0x103);
        // one-letter B resolves to Binary, not DOS "new B"
        assert_eq!(Filetype::from_str("B").unwrap(),Filetype::BINARY);
    }
}
