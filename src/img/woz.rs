//! ## Support for WOZ v1 disk images
//!
//! The WOZ container is a chunked binary format holding nibble-accurate
//! track bit streams.  This module decodes the container: the INFO, TMAP,
//! TRKS, and META chunks are parsed into typed structures, unknown chunks
//! are retained verbatim, and the whole stream is checked against the
//! declared CRC-32.  Interpreting the bit streams themselves is out of
//! scope; the file systems in this crate work on already-decoded sectors.

use std::collections::HashMap;
use log::{debug,info,warn};
use crate::Error;
use crate::DYNERR;

pub const WOZ_HEADER: [u8;8] = [0x57,0x4f,0x5a,0x31,0xff,0x0a,0x0d,0x0a];

pub const INFO_ID: u32 = 0x4f464e49;
pub const TMAP_ID: u32 = 0x50414d54;
pub const TRKS_ID: u32 = 0x534b5254;
pub const META_ID: u32 = 0x4154454d;

/// Per-track span within the TRKS chunk: bit stream plus trailer.
pub const TRACK_LENGTH: usize = 6656;
/// Bytes of bit stream at the head of each track span.
pub const BITSTREAM_LENGTH: usize = 6646;

const CRC32_TAB: [u32;256] = [
    0x00000000, 0x77073096, 0xee0e612c, 0x990951ba, 0x076dc419, 0x706af48f,
    0xe963a535, 0x9e6495a3, 0x0edb8832, 0x79dcb8a4, 0xe0d5e91e, 0x97d2d988,
    0x09b64c2b, 0x7eb17cbd, 0xe7b82d07, 0x90bf1d91, 0x1db71064, 0x6ab020f2,
    0xf3b97148, 0x84be41de, 0x1adad47d, 0x6ddde4eb, 0xf4d4b551, 0x83d385c7,
    0x136c9856, 0x646ba8c0, 0xfd62f97a, 0x8a65c9ec, 0x14015c4f, 0x63066cd9,
    0xfa0f3d63, 0x8d080df5, 0x3b6e20c8, 0x4c69105e, 0xd56041e4, 0xa2677172,
    0x3c03e4d1, 0x4b04d447, 0xd20d85fd, 0xa50ab56b, 0x35b5a8fa, 0x42b2986c,
    0xdbbbc9d6, 0xacbcf940, 0x32d86ce3, 0x45df5c75, 0xdcd60dcf, 0xabd13d59,
    0x26d930ac, 0x51de003a, 0xc8d75180, 0xbfd06116, 0x21b4f4b5, 0x56b3c423,
    0xcfba9599, 0xb8bda50f, 0x2802b89e, 0x5f058808, 0xc60cd9b2, 0xb10be924,
    0x2f6f7c87, 0x58684c11, 0xc1611dab, 0xb6662d3d, 0x76dc4190, 0x01db7106,
    0x98d220bc, 0xefd5102a, 0x71b18589, 0x06b6b51f, 0x9fbfe4a5, 0xe8b8d433,
    0x7807c9a2, 0x0f00f934, 0x9609a88e, 0xe10e9818, 0x7f6a0dbb, 0x086d3d2d,
    0x91646c97, 0xe6635c01, 0x6b6b51f4, 0x1c6c6162, 0x856530d8, 0xf262004e,
    0x6c0695ed, 0x1b01a57b, 0x8208f4c1, 0xf50fc457, 0x65b0d9c6, 0x12b7e950,
    0x8bbeb8ea, 0xfcb9887c, 0x62dd1ddf, 0x15da2d49, 0x8cd37cf3, 0xfbd44c65,
    0x4db26158, 0x3ab551ce, 0xa3bc0074, 0xd4bb30e2, 0x4adfa541, 0x3dd895d7,
    0xa4d1c46d, 0xd3d6f4fb, 0x4369e96a, 0x346ed9fc, 0xad678846, 0xda60b8d0,
    0x44042d73, 0x33031de5, 0xaa0a4c5f, 0xdd0d7cc9, 0x5005713c, 0x270241aa,
    0xbe0b1010, 0xc90c2086, 0x5768b525, 0x206f85b3, 0xb966d409, 0xce61e49f,
    0x5edef90e, 0x29d9c998, 0xb0d09822, 0xc7d7a8b4, 0x59b33d17, 0x2eb40d81,
    0xb7bd5c3b, 0xc0ba6cad, 0xedb88320, 0x9abfb3b6, 0x03b6e20c, 0x74b1d29a,
    0xead54739, 0x9dd277af, 0x04db2615, 0x73dc1683, 0xe3630b12, 0x94643b84,
    0x0d6d6a3e, 0x7a6a5aa8, 0xe40ecf0b, 0x9309ff9d, 0x0a00ae27, 0x7d079eb1,
    0xf00f9344, 0x8708a3d2, 0x1e01f268, 0x6906c2fe, 0xf762575d, 0x806567cb,
    0x196c3671, 0x6e6b06e7, 0xfed41b76, 0x89d32be0, 0x10da7a5a, 0x67dd4acc,
    0xf9b9df6f, 0x8ebeeff9, 0x17b7be43, 0x60b08ed5, 0xd6d6a3e8, 0xa1d1937e,
    0x38d8c2c4, 0x4fdff252, 0xd1bb67f1, 0xa6bc5767, 0x3fb506dd, 0x48b2364b,
    0xd80d2bda, 0xaf0a1b4c, 0x36034af6, 0x41047a60, 0xdf60efc3, 0xa867df55,
    0x316e8eef, 0x4669be79, 0xcb61b38c, 0xbc66831a, 0x256fd2a0, 0x5268e236,
    0xcc0c7795, 0xbb0b4703, 0x220216b9, 0x5505262f, 0xc5ba3bbe, 0xb2bd0b28,
    0x2bb45a92, 0x5cb36a04, 0xc2d7ffa7, 0xb5d0cf31, 0x2cd99e8b, 0x5bdeae1d,
    0x9b64c2b0, 0xec63f226, 0x756aa39c, 0x026d930a, 0x9c0906a9, 0xeb0e363f,
    0x72076785, 0x05005713, 0x95bf4a82, 0xe2b87a14, 0x7bb12bae, 0x0cb61b38,
    0x92d28e9b, 0xe5d5be0d, 0x7cdcefb7, 0x0bdbdf21, 0x86d3d2d4, 0xf1d4e242,
    0x68ddb3f8, 0x1fda836e, 0x81be16cd, 0xf6b9265b, 0x6fb077e1, 0x18b74777,
    0x88085ae6, 0xff0f6a70, 0x66063bca, 0x11010b5c, 0x8f659eff, 0xf862ae69,
    0x616bffd3, 0x166ccf45, 0xa00ae278, 0xd70dd2ee, 0x4e048354, 0x3903b3c2,
    0xa7672661, 0xd06016f7, 0x4969474d, 0x3e6e77db, 0xaed16a4a, 0xd9d65adc,
    0x40df0b66, 0x37d83bf0, 0xa9bcae53, 0xdebb9ec5, 0x47b2cf7f, 0x30b5ffe9,
    0xbdbdf21c, 0xcabac28a, 0x53b39330, 0x24b4a3a6, 0xbad03605, 0xcdd70693,
    0x54de5729, 0x23d967bf, 0xb3667a2e, 0xc4614ab8, 0x5d681b02, 0x2a6f2b94,
    0xb40bbe37, 0xc30c8ea1, 0x5a05df1b, 0x2d02ef8d
];

/// Calculate the IEEE CRC-32 of `buf`, continuing from `crc_seed`.
pub fn crc32(crc_seed: u32, buf: &[u8]) -> u32 {
    let mut crc = crc_seed ^ !(0 as u32);
    for p in buf {
        crc = CRC32_TAB[((crc ^ *p as u32) & 0xff) as usize] ^ (crc >> 8);
    }
    crc ^ !(0 as u32)
}

/// Contents of the INFO chunk.
pub struct Info {
    pub version: u8,
    /// 1 = 5.25 inch, 2 = 3.5 inch
    pub disk_type: u8,
    pub write_protected: bool,
    pub synchronized: bool,
    pub cleaned: bool,
    pub creator: String
}

/// One track's span of the TRKS chunk.
pub struct Trk {
    pub bitstream: Vec<u8>,
    pub bytes_used: u16,
    pub bit_count: u16,
    pub splice_point: u16,
    pub splice_nibble: u8,
    pub splice_bit_count: u8,
    pub reserved: u16
}

/// Contents of the META chunk: tab-separated key/value rows.
/// `keys` preserves the on-disk row order.
pub struct Metadata {
    pub keys: Vec<String>,
    pub raw_values: HashMap<String,String>
}

/// A chunk this decoder does not interpret, retained verbatim.
pub struct UnknownChunk {
    pub id: String,
    pub data: Vec<u8>
}

pub struct Woz {
    pub info: Info,
    pub tmap: [u8;160],
    pub trks: Vec<Trk>,
    pub meta: Metadata,
    pub unknowns: Vec<UnknownChunk>
}

impl Woz {
    fn new() -> Self {
        Self {
            info: Info {
                version: 0,
                disk_type: 0,
                write_protected: false,
                synchronized: false,
                cleaned: false,
                creator: String::new()
            },
            tmap: [0xff;160],
            trks: Vec::new(),
            meta: Metadata { keys: Vec::new(), raw_values: HashMap::new() },
            unknowns: Vec::new()
        }
    }
    /// Decode a WOZ byte stream.  Structural problems fail outright.
    /// A checksum mismatch is reported alongside the parsed structure,
    /// so the caller can still accept the image with a warning.
    pub fn from_bytes(buf: &[u8]) -> Result<(Self,Option<Error>),DYNERR> {
        if buf.len() < 12 || buf[0..8] != WOZ_HEADER {
            return Err(Box::new(Error::NotAWozFile));
        }
        let declared = u32::from_le_bytes([buf[8],buf[9],buf[10],buf[11]]);
        let mut ans = Woz::new();
        let mut crc: u32 = 0;
        let mut ptr: usize = 12;
        while ptr < buf.len() {
            if ptr + 8 > buf.len() {
                return Err(Box::new(Error::Corruption("truncated chunk header".to_string())));
            }
            let id = u32::from_le_bytes([buf[ptr],buf[ptr+1],buf[ptr+2],buf[ptr+3]]);
            let length = u32::from_le_bytes([buf[ptr+4],buf[ptr+5],buf[ptr+6],buf[ptr+7]]) as usize;
            if ptr + 8 + length > buf.len() {
                return Err(Box::new(Error::Corruption(format!(
                    "chunk {} runs past end of file",chunk_id_string(id)))));
            }
            crc = crc32(crc, &buf[ptr..ptr+8+length]);
            let payload = &buf[ptr+8..ptr+8+length];
            match id {
                INFO_ID => ans.parse_info(payload)?,
                TMAP_ID => ans.parse_tmap(payload)?,
                TRKS_ID => ans.parse_trks(payload)?,
                META_ID => ans.parse_meta(payload)?,
                _ => {
                    info!("unknown chunk type ({}): retaining verbatim",chunk_id_string(id));
                    ans.unknowns.push(UnknownChunk { id: chunk_id_string(id), data: payload.to_vec() });
                }
            }
            ptr += 8 + length;
        }
        if crc != declared {
            warn!("WOZ checksum mismatch: declared {:#010X}, computed {:#010X}",declared,crc);
            return Ok((ans,Some(Error::CrcMismatch { declared, computed: crc })));
        }
        debug!("WOZ checksum verified ({:#010X})",crc);
        Ok((ans,None))
    }
    fn parse_info(&mut self, payload: &[u8]) -> Result<(),DYNERR> {
        if payload.len() != 60 {
            warn!("expected INFO chunk length of 60; got {}",payload.len());
        }
        if payload.len() < 37 {
            return Err(Box::new(Error::Corruption("INFO chunk too short".to_string())));
        }
        self.info.version = payload[0];
        self.info.disk_type = payload[1];
        self.info.write_protected = payload[2] == 1;
        self.info.synchronized = payload[3] == 1;
        self.info.cleaned = payload[4] == 1;
        self.info.creator = String::from_utf8_lossy(&payload[5..37]).trim_end().to_string();
        Ok(())
    }
    fn parse_tmap(&mut self, payload: &[u8]) -> Result<(),DYNERR> {
        if payload.len() != 160 {
            warn!("expected TMAP chunk length of 160; got {}",payload.len());
        }
        if payload.len() < 160 {
            return Err(Box::new(Error::Corruption("TMAP chunk too short".to_string())));
        }
        self.tmap.copy_from_slice(&payload[0..160]);
        Ok(())
    }
    fn parse_trks(&mut self, payload: &[u8]) -> Result<(),DYNERR> {
        if payload.len() % TRACK_LENGTH != 0 {
            return Err(Box::new(Error::Corruption(format!(
                "expected TRKS chunk length to be a multiple of {}; got {}",TRACK_LENGTH,payload.len()))));
        }
        for span in payload.chunks_exact(TRACK_LENGTH) {
            self.trks.push(Trk {
                bitstream: span[0..BITSTREAM_LENGTH].to_vec(),
                bytes_used: u16::from_le_bytes([span[6646],span[6647]]),
                bit_count: u16::from_le_bytes([span[6648],span[6649]]),
                splice_point: u16::from_le_bytes([span[6650],span[6651]]),
                splice_nibble: span[6652],
                splice_bit_count: span[6653],
                reserved: u16::from_le_bytes([span[6654],span[6655]])
            });
        }
        Ok(())
    }
    fn parse_meta(&mut self, payload: &[u8]) -> Result<(),DYNERR> {
        let text = String::from_utf8_lossy(payload);
        for row in text.split('\n') {
            match row.split_once('\t') {
                Some((key,val)) => {
                    self.meta.keys.push(key.to_string());
                    self.meta.raw_values.insert(key.to_string(),val.to_string());
                },
                None if row.is_empty() => {
                    return Err(Box::new(Error::Corruption("empty metadata line".to_string())));
                },
                None => {
                    return Err(Box::new(Error::Corruption(format!(
                        "metadata line with no tab: {}",row))));
                }
            }
        }
        Ok(())
    }
}

fn chunk_id_string(id: u32) -> String {
    String::from_utf8_lossy(&u32::to_le_bytes(id)).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &[u8;4], payload: &[u8]) -> Vec<u8> {
        let mut ans = id.to_vec();
        ans.extend(u32::to_le_bytes(payload.len() as u32));
        ans.extend(payload);
        ans
    }
    /// assemble a minimal WOZ1 stream with a correct checksum
    fn sample_woz() -> Vec<u8> {
        let mut info = vec![1,1,0,1,0];
        let mut creator = vec![0x20;32];
        creator[0..5].copy_from_slice(b"a2dsk");
        info.extend(creator);
        info.extend(vec![0;23]);
        let mut body = chunk(b"INFO",&info);
        body.extend(chunk(b"TMAP",&[0xff;160]));
        let mut trks = vec![0xaa;TRACK_LENGTH];
        trks[6646..6648].copy_from_slice(&u16::to_le_bytes(6646));
        trks[6648..6650].copy_from_slice(&u16::to_le_bytes(50304));
        body.extend(chunk(b"TRKS",&trks));
        body.extend(chunk(b"META",b"language\tEnglish\ntitle\tTest"));
        let mut ans = WOZ_HEADER.to_vec();
        ans.extend(u32::to_le_bytes(crc32(0,&body)));
        ans.extend(body);
        ans
    }

    #[test]
    fn decode_good_image() {
        let buf = sample_woz();
        let (woz,crc_err) = Woz::from_bytes(&buf).expect("decode failed");
        assert!(crc_err.is_none());
        assert_eq!(woz.info.version,1);
        assert_eq!(woz.info.disk_type,1);
        assert_eq!(woz.info.synchronized,true);
        assert_eq!(woz.info.creator,"a2dsk");
        assert_eq!(woz.tmap.len(),160);
        assert_eq!(woz.trks.len(),1);
        assert_eq!(woz.trks[0].bytes_used,6646);
        assert_eq!(woz.unknowns.len(),0);
    }

    #[test]
    fn crc_mismatch_still_parses() {
        let mut buf = sample_woz();
        let last = buf.len()-1;
        buf[last] ^= 0xff;
        let (woz,crc_err) = Woz::from_bytes(&buf).expect("decode failed");
        assert!(matches!(crc_err,Some(Error::CrcMismatch{..})));
        assert_eq!(woz.trks.len(),1);
    }

    #[test]
    fn bad_magic() {
        let mut buf = sample_woz();
        buf[0] = b'X';
        match Woz::from_bytes(&buf) {
            Err(e) => assert!(matches!(e.downcast_ref::<Error>(),Some(Error::NotAWozFile))),
            Ok(_) => panic!("decoder accepted a bad header")
        }
    }

    #[test]
    fn unknown_chunks_are_retained() {
        let mut body = chunk(b"FLUX",&[1,2,3,4]);
        body.extend(chunk(b"TMAP",&[0;160]));
        let mut buf = WOZ_HEADER.to_vec();
        buf.extend(u32::to_le_bytes(crc32(0,&body)));
        buf.extend(body);
        let (woz,crc_err) = Woz::from_bytes(&buf).expect("decode failed");
        assert!(crc_err.is_none());
        assert_eq!(woz.unknowns.len(),1);
        assert_eq!(woz.unknowns[0].id,"FLUX");
        assert_eq!(woz.unknowns[0].data,vec![1,2,3,4]);
    }

    #[test]
    fn bad_trks_length() {
        let body = chunk(b"TRKS",&vec![0;100]);
        let mut buf = WOZ_HEADER.to_vec();
        buf.extend(u32::to_le_bytes(crc32(0,&body)));
        buf.extend(body);
        assert!(Woz::from_bytes(&buf).is_err());
    }

    #[test]
    fn meta_rows() {
        let body = chunk(b"META",b"language\tEnglish\nrequires_machine\t2e");
        let mut buf = WOZ_HEADER.to_vec();
        buf.extend(u32::to_le_bytes(crc32(0,&body)));
        buf.extend(body);
        let (woz,_) = Woz::from_bytes(&buf).expect("decode failed");
        assert_eq!(woz.meta.keys,vec!["language","requires_machine"]);
        assert_eq!(woz.meta.raw_values.get("requires_machine").unwrap(),"2e");
        // a row without a tab is an error
        let body = chunk(b"META",b"language English");
        let mut buf = WOZ_HEADER.to_vec();
        buf.extend(u32::to_le_bytes(crc32(0,&body)));
        buf.extend(body);
        assert!(Woz::from_bytes(&buf).is_err());
    }
}
