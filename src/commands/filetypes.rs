//! `filetypes` subcommand: print the filetype table.

use clap::ArgMatches;
use crate::fs::{all_filetype_infos,FILETYPE_INFOS};
use crate::STDRESULT;

pub fn filetypes(cmd: &ArgMatches) -> STDRESULT {
    let rows: Vec<(String,String,String,String)> = match cmd.get_flag("all") {
        true => all_filetype_infos().into_iter()
            .map(|(_typ,name,three,one,desc)| (desc,name,three,one))
            .collect(),
        false => FILETYPE_INFOS.iter()
            .map(|info| (info.desc.to_string(),info.name.to_string(),
                info.three_letter.to_string(),info.one_letter.to_string()))
            .collect()
    };
    let desc_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0);
    let name_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0);
    println!("{:desc_width$} {:name_width$} {:17} {}","Description","Name","Three-letter Name","One-letter Name");
    println!("{:desc_width$} {:name_width$} {:17} {}","-----------","----","-----------------","---------------");
    for (desc,name,three,one) in rows {
        println!("{:desc_width$} {:name_width$} {:17} {}",desc,name,three,one);
    }
    Ok(())
}
