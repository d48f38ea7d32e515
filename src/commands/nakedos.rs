//! `nakedos mkhello` subcommand: write a DF01 greeting program.
//!
//! NakedOS boots by loading file DF01 at 0x1800 and jumping to it.  The
//! program we write clears the screen, prints a message through the
//! monitor's character output, and drops into the monitor.  If the named
//! image does not exist yet, a blank NakedOS disk is created around it.

use std::str::FromStr;
use clap::ArgMatches;
use log::info;
use crate::fs::{DiskOrder,Descriptor,FileInfo,Filetype,Operator};
use crate::fs::nakedos::{SectorMap,HELLO_FILE};
use crate::img;
use crate::{DYNERR,STDRESULT};

const DEFAULT_MESSAGE: &str = "HELLO, WORLD!";

/// Assemble the greeting program for load address 0x1800.
fn hello_program(message: &str) -> Vec<u8> {
    let msg: Vec<u8> = message.bytes().filter(|b| b.is_ascii() && *b != 0).collect();
    vec![
        0x20, 0x58, 0xfc,       // JSR $FC58 (HOME)
        0xa0, 0x00,             // LDY #$00
        0xb9, 0x15, 0x18,       // LDA $1815,Y
        0xf0, 0x08,             // BEQ done
        0x09, 0x80,             // ORA #$80
        0x20, 0xed, 0xfd,       // JSR $FDED (COUT)
        0xc8,                   // INY
        0xd0, 0xf3,             // BNE loop
        0x4c, 0x69, 0xff,       // done: JMP $FF69 (monitor)
    ].into_iter().chain(msg).chain([0]).collect()
}

/// Open an existing NakedOS image, or conjure a blank one.
fn open_or_create(path: &str, order: DiskOrder) -> Result<(Box<dyn Operator>,DiskOrder),DYNERR> {
    if path == "-" || std::path::Path::new(path).exists() {
        let filebytes = super::file_contents_or_stdin(path)?;
        let factories = crate::operator_factories();
        return crate::open_image(filebytes,path,order,"nakedos",&factories);
    }
    info!("image \"{}\" not found, creating a blank NakedOS disk",path);
    let mut diskbytes = vec![0;img::FLOPPY_DISK_BYTES];
    SectorMap::blank().persist(&mut diskbytes)?;
    let factories = crate::operator_factories();
    let factory = factories.iter().find(|f| f.name()=="nakedos").expect("nakedos factory is registered");
    let op = factory.operator(diskbytes)?;
    let disk_file_order = match order {
        DiskOrder::Auto => match crate::file_extension(path).as_str() {
            ".po" => DiskOrder::ProDOS,
            _ => DiskOrder::DOS
        },
        explicit => explicit
    };
    Ok((op,disk_file_order))
}

pub fn mkhello(cmd: &ArgMatches) -> STDRESULT {
    let path = cmd.get_one::<String>("image").expect("image argument is required");
    let order = DiskOrder::from_str(cmd.get_one::<String>("order").expect("order has a default"))?;
    let message = cmd.get_one::<String>("message").map(|s| s.as_str()).unwrap_or(DEFAULT_MESSAGE);
    let (mut op,disk_file_order) = open_or_create(path,order)?;
    let data = hello_program(message);
    let info = FileInfo {
        descriptor: Descriptor {
            name: format!("DF{:02X}",HELLO_FILE),
            full_name: None,
            sectors: 0,
            blocks: 0,
            length: data.len() as i64,
            locked: false,
            file_type: Filetype::BINARY
        },
        data,
        start_address: 0x1800
    };
    op.put_file(&info,true)?;
    super::save_back(path,op.as_ref(),disk_file_order)
}
