//! Super-Mon symbol table.
//!
//! The monitor keeps its symbols in two parallel 4 KiB files: file 3 holds
//! 819 records of (address, link, extra-name-byte), file 4 holds the five
//! packed name bytes of each record.  Names are 3-9 uppercase alphanumerics
//! squeezed into a 48-bit word, 5 bits per letter and 6 per digit.  Records
//! with the same address hash are chained through their link fields.

use log::trace;
use crate::{DYNERR,Error,STDRESULT};

/// number of records in the symbol table
pub const TABLE_ENTRIES: usize = 819;
/// size of each of the two symbol table files
pub const TABLE_FILE_BYTES: usize = 0x1000;
/// memory address of the symbol table in Super-Mon, used to encode links
const TABLE_BASE_ADDR: usize = 0xd000;

/// A single Super-Mon symbol.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct Symbol {
    /// the memory address the symbol points to, or 0 for an empty entry
    pub address: u16,
    pub name: String,
    /// index of the next symbol sharing this address hash, if any
    pub link: Option<usize>
}

impl Symbol {
    fn empty() -> Self {
        Self { address: 0, name: String::new(), link: None }
    }
}

/// Hash an address into its chain bucket.
pub fn addr_hash(addr: u16) -> u8 {
    ((addr & 0xff) as u8 ^ (addr >> 8) as u8) & 0x7f
}

/// Unpack a symbol name from its five name bytes plus the extra byte
/// stored with the address record.
pub fn decode_symbol(five: &[u8;5], extra: u8) -> String {
    let mut result = String::new();
    let mut value = five[0] as u64
        + ((five[1] as u64) << 8)
        + ((five[2] as u64) << 16)
        + ((five[3] as u64) << 24)
        + ((five[4] as u64) << 32)
        + ((extra as u64) << 40);
    while value & 0x1f > 0 {
        if value & 0x1f < 27 {
            result.push((b'@' + (value & 0x1f) as u8) as char);
            value >>= 5;
            continue;
        }
        if value & 0x20 == 0 {
            result.push((b'0' + (value & 0x1f) as u8 - 0x1b) as char);
        } else {
            result.push((b'5' + (value & 0x1f) as u8 - 0x1b) as char);
        }
        value >>= 6;
    }
    result
}

/// Pack a symbol name into six bytes (five name bytes plus the extra byte).
/// The empty string packs to all zeroes; otherwise the name must be 3-9
/// characters of [A-Za-z0-9], small enough to fit in 48 bits.
pub fn encode_symbol(name: &str) -> Result<[u8;6],Error> {
    if name.is_empty() {
        return Ok([0;6]);
    }
    if name.len() > 9 {
        return Err(Error::InvalidName(format!("symbol \"{}\" is too long",name)));
    }
    if name.len() < 3 {
        return Err(Error::InvalidName(format!("symbol \"{}\" is too short",name)));
    }
    let mut value: u64 = 0;
    let mut bits = 0;
    for ch in name.to_uppercase().bytes().rev() {
        match ch {
            b'A'..=b'Z' => {
                value = (value << 5) + (ch - b'@') as u64;
                bits += 5;
            },
            b'0'..=b'4' => {
                value = (value << 6) + 0x1b + (ch - b'0') as u64;
                bits += 6;
            },
            b'5'..=b'9' => {
                value = (value << 6) + 0x3b + (ch - b'5') as u64;
                bits += 6;
            },
            _ => {
                return Err(Error::InvalidName(format!(
                    "symbol \"{}\" has illegal character `{}`",name,ch as char)));
            }
        }
        if bits > 48 {
            return Err(Error::InvalidName(format!("symbol \"{}\" is too long",name)));
        }
    }
    let eight = u64::to_le_bytes(value);
    Ok(eight[0..6].try_into().expect("slice is six bytes"))
}

/// An entire Super-Mon symbol table, blanks included.
#[derive(Clone)]
pub struct SymbolTable {
    pub symbols: Vec<Symbol>
}

impl SymbolTable {
    /// A table of nothing but empty entries.
    pub fn new() -> Self {
        Self { symbols: vec![Symbol::empty();TABLE_ENTRIES] }
    }
    /// Decode the table from the contents of its two files.  Fails if the
    /// link pointers are malformed, hash-inconsistent, or self-referential.
    pub fn from_files(symtbl1: &[u8], symtbl2: &[u8]) -> Result<Self,DYNERR> {
        if symtbl1.len() != TABLE_FILE_BYTES {
            return Err(Box::new(Error::Corruption(format!(
                "expected address half of symbol table to be {:#06X} bytes long; got {:#06X}",
                TABLE_FILE_BYTES,symtbl1.len()))));
        }
        if symtbl2.len() != TABLE_FILE_BYTES {
            return Err(Box::new(Error::Corruption(format!(
                "expected name half of symbol table to be {:#06X} bytes long; got {:#06X}",
                TABLE_FILE_BYTES,symtbl2.len()))));
        }
        let mut symbols: Vec<Symbol> = Vec::with_capacity(TABLE_ENTRIES);
        for i in (0..TABLE_ENTRIES*5).step_by(5) {
            let address = u16::from_le_bytes([symtbl1[i],symtbl1[i+1]]);
            if address == 0 {
                symbols.push(Symbol::empty());
                continue;
            }
            let link_addr = u16::from_le_bytes([symtbl1[i+2],symtbl1[i+3]]) as usize;
            let link = match link_addr {
                0 => None,
                a if a < TABLE_BASE_ADDR || a >= TABLE_BASE_ADDR + TABLE_ENTRIES*5 => {
                    return Err(Box::new(Error::Corruption(format!(
                        "expected symbol link address between 0xD000 and 0xDFFE; got {:#06X}",a))));
                },
                a if (a - TABLE_BASE_ADDR) % 5 != 0 => {
                    return Err(Box::new(Error::Corruption(format!(
                        "expected symbol link address of the form 0xD000+5k; got {:#06X}",a))));
                },
                a => Some((a - TABLE_BASE_ADDR) / 5)
            };
            let extra = symtbl1[i+4];
            let five: [u8;5] = symtbl2[i..i+5].try_into().expect("length was checked");
            symbols.push(Symbol {
                address,
                name: decode_symbol(&five,extra),
                link
            });
        }
        let table = Self { symbols };
        table.check_links()?;
        Ok(table)
    }
    /// Encode the table back into the contents of its two files.
    pub fn to_files(&self) -> Result<(Vec<u8>,Vec<u8>),DYNERR> {
        let mut symtbl1 = vec![0;TABLE_FILE_BYTES];
        let mut symtbl2 = vec![0;TABLE_FILE_BYTES];
        for (i,sym) in self.symbols.iter().enumerate() {
            let offset = i * 5;
            let six = encode_symbol(&sym.name)?;
            let link_addr = match sym.link {
                Some(k) => (k*5 + TABLE_BASE_ADDR) as u16,
                None => 0
            };
            symtbl1[offset..offset+2].copy_from_slice(&u16::to_le_bytes(sym.address));
            symtbl1[offset+2..offset+4].copy_from_slice(&u16::to_le_bytes(link_addr));
            symtbl1[offset+4] = six[5];
            symtbl2[offset..offset+5].copy_from_slice(&six[0..5]);
        }
        Ok((symtbl1,symtbl2))
    }
    /// Every linked entry must point at a live entry in the same hash
    /// bucket, and never at itself.
    pub fn check_links(&self) -> STDRESULT {
        for (i,sym) in self.symbols.iter().enumerate() {
            if sym.address != 0 {
                if let Some(link) = sym.link {
                    if link == i {
                        return Err(Box::new(Error::Corruption(format!(
                            "symbol \"{}\" ({:#06X}) links to itself",sym.name,sym.address))));
                    }
                    let link_sym = &self.symbols[link];
                    if addr_hash(sym.address) != addr_hash(link_sym.address) {
                        return Err(Box::new(Error::Corruption(format!(
                            "symbol \"{}\" ({:#06X}) with hash {:#04X} links to symbol \"{}\" ({:#06X}) with hash {:#04X}",
                            sym.name,sym.address,addr_hash(sym.address),
                            link_sym.name,link_sym.address,addr_hash(link_sym.address)))));
                    }
                }
            }
        }
        Ok(())
    }
    /// All symbols resolving to the given address.
    pub fn symbols_for_address(&self, address: u16) -> Vec<&Symbol> {
        self.symbols.iter().filter(|sym| sym.address == address).collect()
    }
    /// Address of the named symbol, or 0 if it is not in the table.
    pub fn by_name(&self, name: &str) -> u16 {
        for sym in &self.symbols {
            if name.eq_ignore_ascii_case(&sym.name) {
                return sym.address;
            }
        }
        0
    }
    /// Delete a symbol, unlinking it from its hash chain.  Returns true
    /// if the named symbol was found.
    pub fn delete_symbol(&mut self, name: &str) -> bool {
        for i in 0..self.symbols.len() {
            if name.eq_ignore_ascii_case(&self.symbols[i].name) {
                let old_link = self.symbols[i].link;
                self.symbols[i].name = String::new();
                self.symbols[i].address = 0;
                self.symbols[i].link = None;
                for j in 0..self.symbols.len() {
                    if j != i && self.symbols[j].link == Some(i) {
                        self.symbols[j].link = old_link;
                        break;
                    }
                }
                return true;
            }
        }
        false
    }
    /// Add a symbol.  If a symbol with the given name already exists in the
    /// same hash bucket its address is updated in place; if it exists in a
    /// different bucket it is deleted first.  The new entry is appended to
    /// the tail of its bucket's chain.
    pub fn add_symbol(&mut self, name: &str, address: u16) -> STDRESULT {
        if address == 0 {
            return Err(Box::new(Error::InvalidName(format!(
                "cannot set symbol \"{}\" to address 0",name))));
        }
        let hash = addr_hash(address);
        let mut pos: Option<usize> = None;
        for j in 0..self.symbols.len() {
            if name.eq_ignore_ascii_case(&self.symbols[j].name) {
                if addr_hash(self.symbols[j].address) == hash {
                    trace!("symbol \"{}\" updated in place",name);
                    self.symbols[j].address = address;
                    return Ok(());
                }
                self.delete_symbol(name);
                pos = Some(j);
                break;
            }
            if pos.is_none() && self.symbols[j].address == 0 {
                pos = Some(j);
            }
        }
        let pos = match pos {
            Some(p) => p,
            None => return Err(Box::new(Error::SymbolTableFull))
        };
        for j in 0..self.symbols.len() {
            if self.symbols[j].address != 0 && addr_hash(self.symbols[j].address) == hash
                && self.symbols[j].link.is_none() {
                self.symbols[j].link = Some(pos);
                break;
            }
        }
        self.symbols[pos].name = name.to_string();
        self.symbols[pos].address = address;
        self.symbols[pos].link = None;
        Ok(())
    }
    /// Resolve a filename of the form `DFxx`, `xx`, or a symbol name that
    /// points into the file-number address range.
    pub fn file_for_name(&self, filename: &str) -> Result<u8,DYNERR> {
        if let Some(file) = parse_address_filename(filename) {
            return Ok(file);
        }
        for sym in &self.symbols {
            if filename.eq_ignore_ascii_case(&sym.name) {
                if sym.address > 0xdf00 && sym.address < 0xdffe {
                    return Ok((sym.address - 0xdf00) as u8);
                }
                break;
            }
        }
        Err(Box::new(Error::NotFound(format!("filename \"{}\"",filename))))
    }
    /// Split a filename of the form `DFxx`, `NAME`, or `DFxx:NAME` into the
    /// explicit file number (0 if none), the file number the symbol resolves
    /// to (0 if none), and the symbol text (empty if none).
    pub fn files_for_compound_name(&self, filename: &str) -> Result<(u8,u8,String),DYNERR> {
        let parts: Vec<&str> = filename.split(':').collect();
        if parts.len() > 2 {
            return Err(Box::new(Error::InvalidName(format!(
                "more than one colon in compound filename: \"{}\"",filename))));
        }
        if parts.len() == 1 {
            if let Some(num_file) = parse_address_filename(filename) {
                return Ok((num_file,0,String::new()));
            }
            return match self.file_for_name(filename) {
                Ok(file) => Ok((file,file,filename.to_string())),
                Err(_) => Ok((0,0,filename.to_string()))
            };
        }
        let num_file = match parse_address_filename(parts[0]) {
            Some(file) => file,
            None => return Err(Box::new(Error::InvalidName(format!(
                "invalid file number: \"{}\"",parts[0]))))
        };
        if parse_address_filename(parts[1]).is_some() {
            return Err(Box::new(Error::InvalidName(format!(
                "cannot use valid file number (\"{}\") as a filename",parts[1]))));
        }
        match self.file_for_name(parts[1]) {
            Ok(named_file) => Ok((num_file,named_file,parts[1].to_string())),
            Err(_) => Ok((num_file,0,parts[1].to_string()))
        }
    }
}

/// Parse filenames of the forms `DFxx` and `xx` (both read as hex) into a
/// file number.  Out-of-range or non-hex filenames return None.
pub fn parse_address_filename(filename: &str) -> Option<u8> {
    if let Ok(addr) = u16::from_str_radix(filename,16) {
        if addr > 0xdf00 && addr < 0xdffe {
            return Some((addr - 0xdf00) as u8);
        }
        if addr > 0 && addr < 0xfe {
            return Some(addr as u8);
        }
    }
    None
}

/// User-visible name of a file: the first symbol pointing at it, else `DFxx`.
pub fn name_for_file(file: u8, st: Option<&SymbolTable>) -> String {
    if let Some(st) = st {
        let symbols = st.symbols_for_address(0xdf00 + file as u16);
        if symbols.len() > 0 {
            return symbols[0].name.clone();
        }
    }
    format!("DF{:02X}",file)
}

/// Full name of a file: `DFxx:SYM` when a symbol exists, else `DFxx`.
pub fn fullname_for_file(file: u8, st: Option<&SymbolTable>) -> String {
    if let Some(st) = st {
        let symbols = st.symbols_for_address(0xdf00 + file as u16);
        if symbols.len() > 0 {
            return format!("DF{:02X}:{}",file,symbols[0].name);
        }
    }
    format!("DF{:02X}",file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_roundtrip() {
        for name in ["FHELLO","FSYMTBL1","ABC","ABCDEFGHI","A1B2C3","ZZZZZZZZZ","F56789"] {
            let six = encode_symbol(name).expect("encode failed");
            let five: [u8;5] = six[0..5].try_into().unwrap();
            assert_eq!(decode_symbol(&five,six[5]),name);
        }
    }

    #[test]
    fn lowercase_folds_to_uppercase() {
        assert_eq!(encode_symbol("fhello").unwrap(),encode_symbol("FHELLO").unwrap());
    }

    #[test]
    fn bad_names_rejected() {
        assert!(matches!(encode_symbol("AB"),Err(Error::InvalidName(_))));
        assert!(matches!(encode_symbol("ABCDEFGHIJ"),Err(Error::InvalidName(_))));
        assert!(matches!(encode_symbol("AB-CD"),Err(Error::InvalidName(_))));
        // nine digits need 54 bits
        assert!(matches!(encode_symbol("123456789"),Err(Error::InvalidName(_))));
        assert_eq!(encode_symbol("").unwrap(),[0;6]);
    }

    #[test]
    fn address_filenames() {
        assert_eq!(parse_address_filename("DF05"),Some(5));
        assert_eq!(parse_address_filename("df1a"),Some(0x1a));
        assert_eq!(parse_address_filename("05"),Some(5));
        assert_eq!(parse_address_filename("FD"),Some(0xfd));
        assert_eq!(parse_address_filename("FE"),None);
        assert_eq!(parse_address_filename("0"),None);
        assert_eq!(parse_address_filename("DFFE"),None);
        assert_eq!(parse_address_filename("FHELLO"),None);
    }

    #[test]
    fn add_and_delete_preserve_chains() {
        let mut st = SymbolTable::new();
        // all of these share hash bucket: a ^ b over (0xDF00+k)
        st.add_symbol("AAA",0x1234).unwrap();
        st.add_symbol("BBB",0x3412).unwrap();
        assert_eq!(addr_hash(0x1234),addr_hash(0x3412));
        st.add_symbol("CCC",0x2143).unwrap();
        st.check_links().expect("links broken after add");
        assert_eq!(st.by_name("bbb"),0x3412);
        assert!(st.delete_symbol("BBB"));
        st.check_links().expect("links broken after delete");
        assert_eq!(st.by_name("BBB"),0);
        assert!(!st.delete_symbol("BBB"));
        // updating an address within the same bucket happens in place
        st.add_symbol("AAA",0x3412).unwrap();
        st.check_links().expect("links broken after update");
        assert_eq!(st.by_name("AAA"),0x3412);
        // moving to a different bucket deletes and re-adds
        st.add_symbol("AAA",0x1111).unwrap();
        st.check_links().expect("links broken after rehash");
        assert_eq!(st.by_name("AAA"),0x1111);
    }

    #[test]
    fn table_roundtrip() {
        let mut st = SymbolTable::new();
        st.add_symbol("FHELLO",0xdf01).unwrap();
        st.add_symbol("FSYMTBL1",0xdf03).unwrap();
        st.add_symbol("FSYMTBL2",0xdf04).unwrap();
        let (t1,t2) = st.to_files().expect("encode failed");
        assert_eq!(t1.len(),TABLE_FILE_BYTES);
        assert_eq!(t2.len(),TABLE_FILE_BYTES);
        let st2 = SymbolTable::from_files(&t1,&t2).expect("decode failed");
        assert_eq!(st2.by_name("FHELLO"),0xdf01);
        assert_eq!(st2.symbols_for_address(0xdf03).len(),1);
        assert_eq!(st2.symbols.len(),TABLE_ENTRIES);
    }

    #[test]
    fn full_table_is_an_error() {
        let mut st = SymbolTable::new();
        for i in 0..TABLE_ENTRIES {
            st.symbols[i].address = 0x1000 + i as u16;
            st.symbols[i].name = format!("SYM{:03}",i);
        }
        let e = st.add_symbol("EXTRA",0x9000).unwrap_err();
        assert!(matches!(e.downcast_ref::<Error>(),Some(Error::SymbolTableFull)));
    }

    #[test]
    fn self_link_is_corrupt() {
        let mut st = SymbolTable::new();
        st.symbols[0] = Symbol { address: 0x1234, name: "AAA".to_string(), link: Some(0) };
        assert!(st.check_links().is_err());
    }

    #[test]
    fn compound_names() {
        let mut st = SymbolTable::new();
        st.add_symbol("FTOBE",0xdf0a).unwrap();
        assert_eq!(st.files_for_compound_name("DF05").unwrap(),(5,0,String::new()));
        assert_eq!(st.files_for_compound_name("FTOBE").unwrap(),(0x0a,0x0a,"FTOBE".to_string()));
        assert_eq!(st.files_for_compound_name("FNEW").unwrap(),(0,0,"FNEW".to_string()));
        assert_eq!(st.files_for_compound_name("DF0B:FNEW").unwrap(),(0x0b,0,"FNEW".to_string()));
        assert!(st.files_for_compound_name("a:b:c").is_err());
        assert!(st.files_for_compound_name("DF0B:DF0C").is_err());
        assert!(st.files_for_compound_name("XYZ:FNEW").is_err());
    }
}
