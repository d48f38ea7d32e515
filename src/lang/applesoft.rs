//! ## Applesoft BASIC detokenizer
//!
//! Tokenized Applesoft programs are a chain of lines, each holding a pointer
//! to the next line's memory address, a line number, and token/character
//! bytes.  Decoding walks the chain, mapping token bytes through the fixed
//! table below and passing plain characters through.

use std::fmt;
use crate::{DYNERR,Error};

/// Token text by code, for codes 0x80 through 0xEA.
const TOKENS: [&str;0x6b] = [
    "END","FOR","NEXT","DATA","INPUT","DEL","DIM","READ",
    "GR","TEXT","PR #","IN #","CALL","PLOT","HLIN","VLIN",
    "HGR2","HGR","HCOLOR=","HPLOT","DRAW","XDRAW","HTAB","HOME",
    "ROT=","SCALE=","SHLOAD","TRACE","NOTRACE","NORMAL","INVERSE","FLASH",
    "COLOR=","POP","VTAB","HIMEM:","LOMEM:","ONERR","RESUME","RECALL",
    "STORE","SPEED=","LET","GOTO","RUN","IF","RESTORE","&",
    "GOSUB","RETURN","REM","STOP","ON","WAIT","LOAD","SAVE",
    "DEF FN","POKE","PRINT","CONT","LIST","CLEAR","GET","NEW",
    "TAB","TO","FN","SPC(","THEN","AT","NOT","STEP",
    "+","-","*","/",";","AND","OR",">",
    "=","<","SGN","INT","ABS","USR","FRE","SCRN (",
    "PDL","POS","SQR","RND","LOG","EXP","COS","SIN",
    "TAN","ATN","PEEK","LEN","STR$","VAL","ASC","CHR$",
    "LEFT$","RIGHT$","MID$"
];

/// Token text for a byte code, or None if the code is not a token.
pub fn token_for_code(code: u8) -> Option<&'static str> {
    match code {
        0x80..=0xea => Some(TOKENS[code as usize - 0x80]),
        _ => None
    }
}

/// A single BASIC line: line number and raw token/character bytes.
pub struct Line {
    pub num: u16,
    pub bytes: Vec<u8>
}

/// A listing of an entire BASIC program.
pub struct Listing(pub Vec<Line>);

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,"{} ",self.num)?;
        for ch in &self.bytes {
            if *ch < 0x80 {
                write!(f,"{}",*ch as char)?;
            } else {
                write!(f," {} ",token_for_code(*ch).unwrap_or("?"))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.0 {
            writeln!(f,"{}",line)?;
        }
        Ok(())
    }
}

/// Turn a raw binary file into a BASIC listing.  `location` is the
/// program's address in RAM (0x801 for in-ROM Applesoft).
pub fn decode(raw: &[u8], location: u16) -> Result<Listing,DYNERR> {
    // the first two bytes of Applesoft files on disk are the length;
    // be tolerant of getting either format
    let mut raw = raw;
    if raw.len() >= 2 {
        let size = raw[0] as usize + 256 * raw[1] as usize;
        if size == raw.len()-2 || size == raw.len()-3 {
            raw = &raw[2..];
        }
    }
    let bounds = format!("${:X} to ${:X}",location,location as usize + raw.len());
    let mut listing: Vec<Line> = Vec::new();
    let mut last: u16 = 0;
    let mut next = location as usize;
    while next != 0 {
        let ofs = next as i64 - location as i64;
        if ofs < 0 || ofs+1 >= raw.len() as i64 {
            return Err(Box::new(Error::Corruption(format!(
                "line {} has next line at ${:X}, which is outside the input range of {}",last,next,bounds))));
        }
        let mut ofs = ofs as usize;
        next = raw[ofs] as usize + 256 * raw[ofs+1] as usize;
        ofs += 2;
        if next == 0 {
            break;
        }
        if ofs+1 >= raw.len() {
            if listing.len() == 0 {
                return Err(Box::new(Error::Corruption(
                    "ran out of input trying to read the first line number".to_string())));
            }
            return Err(Box::new(Error::Corruption(format!(
                "ran out of input trying to read line number of line after {}",last))));
        }
        let mut line = Line { num: raw[ofs] as u16 + 256 * raw[ofs+1] as u16, bytes: Vec::new() };
        ofs += 2;
        loop {
            if ofs >= raw.len() {
                return Err(Box::new(Error::Corruption(format!(
                    "ran out of input at location ${:X} in line {}",ofs + location as usize,line.num))));
            }
            let ch = raw[ofs];
            if ch == 0 {
                break;
            }
            if ch >= 0x80 && token_for_code(ch).is_none() {
                return Err(Box::new(Error::Corruption(format!(
                    "unknown token ${:X} in line {}",ch,line.num))));
            }
            line.bytes.push(ch);
            ofs += 1;
        }
        last = line.num;
        listing.push(line);
    }
    Ok(Listing(listing))
}
