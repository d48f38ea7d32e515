//! # Command Line Interface
//!
//! Argument definitions are in the `cli` module; each subcommand's logic
//! is in the matching file under `commands`.

use a2dsk::commands;

mod cli;

fn main() -> Result<(),Box<dyn std::error::Error>> {
    env_logger::init();
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).unwrap();

    let matches = cli::build_cli().get_matches();

    if let Some(cmd) = matches.subcommand_matches("ls") {
        return commands::ls::ls(cmd);
    }
    if let Some(cmd) = matches.subcommand_matches("dump") {
        return commands::dump::dump(cmd);
    }
    if let Some(cmd) = matches.subcommand_matches("put") {
        return commands::put::put(cmd);
    }
    if let Some(cmd) = matches.subcommand_matches("rm") {
        return commands::rm::rm(cmd);
    }
    if let Some(cmd) = matches.subcommand_matches("reorder") {
        return commands::reorder::reorder(cmd);
    }
    if let Some(cmd) = matches.subcommand_matches("filetypes") {
        return commands::filetypes::filetypes(cmd);
    }
    if let Some(cmd) = matches.subcommand_matches("mksd") {
        return commands::mksd::mksd(cmd);
    }
    if let Some(cmd) = matches.subcommand_matches("applesoft") {
        if let Some(sub) = cmd.subcommand_matches("decode") {
            return commands::applesoft::decode(sub);
        }
    }
    if let Some(cmd) = matches.subcommand_matches("nakedos") {
        if let Some(sub) = cmd.subcommand_matches("mkhello") {
            return commands::nakedos::mkhello(sub);
        }
    }
    unreachable!("clap requires a known subcommand");
}
