use clap::{crate_version,Arg,ArgAction,Command};

const ORDERS: [&str;4] = ["auto","do","po","raw"];
const REORDERS: [&str;3] = ["auto","do","po"];
const SYSTEMS: [&str;4] = ["auto","dos3","nakedos","prodos"];

fn order_arg() -> Arg {
    Arg::new("order")
        .long("order")
        .value_parser(ORDERS)
        .default_value("auto")
        .help("logical-to-physical sector order of the image file")
}

fn system_arg() -> Arg {
    Arg::new("system")
        .long("system")
        .value_parser(SYSTEMS)
        .default_value("auto")
        .help("operating system of the image")
}

fn image_arg() -> Arg {
    Arg::new("image")
        .required(true)
        .help("disk image file, or `-` for stdin")
}

pub fn build_cli() -> Command {
    let long_help = "a2dsk reads, inspects, and modifies Apple II disk images.
A filename of `-` denotes stdin or stdout.
Set RUST_LOG environment variable to control logging level.
  levels: trace,debug,info,warn,error

Examples:
---------
catalog a disk:          `a2dsk ls dos33master.dsk`
catalog a subdirectory:  `a2dsk ls game-disk.po SUBDIR`
dump a file:             `a2dsk dump chacha20.dsk FTOBE > tobe.txt`
write a file:            `a2dsk put chacha20.dsk DF0B:FNEWFILE newfile.bin`
change sector order:     `a2dsk reorder game.dsk game.po`
boot disk from binary:   `a2dsk mksd boot.dsk game.o --address 0x6000`";
    Command::new("a2dsk")
        .about("Manipulates Apple II disk images: DOS 3.3, ProDOS, NakedOS/Super-Mon.")
        .after_long_help(long_help)
        .version(crate_version!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("ls")
            .visible_aliases(["cat","catalog"])
            .arg(image_arg())
            .arg(Arg::new("subdir").required(false)
                .help("subdirectory to catalog (ProDOS only)"))
            .arg(Arg::new("long").short('l').long("long").action(ArgAction::SetTrue)
                .help("include type, size, and length columns"))
            .arg(order_arg())
            .arg(system_arg())
            .about("print a list of files"))
        .subcommand(Command::new("dump")
            .arg(image_arg())
            .arg(Arg::new("file").required(true)
                .help("name of the file inside the image"))
            .arg(order_arg())
            .arg(system_arg())
            .about("dump the raw contents of a file to stdout"))
        .subcommand(Command::new("put")
            .arg(image_arg())
            .arg(Arg::new("target").required(true)
                .help("filename to write inside the image"))
            .arg(Arg::new("source").required(true)
                .help("local file holding the contents, or `-` for stdin"))
            .arg(Arg::new("type").short('t').long("type").default_value("B")
                .help("type of file (`a2dsk filetypes` to list)"))
            .arg(Arg::new("overwrite").short('f').long("overwrite").action(ArgAction::SetTrue)
                .help("whether to overwrite an existing file"))
            .arg(order_arg())
            .arg(system_arg())
            .about("write the raw contents of a file"))
        .subcommand(Command::new("rm")
            .visible_alias("delete")
            .arg(image_arg())
            .arg(Arg::new("file").required(true)
                .help("name of the file inside the image"))
            .arg(Arg::new("missingok").long("missingok").action(ArgAction::SetTrue)
                .help("don't consider deleting a nonexistent file an error"))
            .arg(order_arg())
            .arg(system_arg())
            .about("delete a file"))
        .subcommand(Command::new("reorder")
            .arg(image_arg())
            .arg(Arg::new("new-image").required(false)
                .help("disk image to write, if different"))
            .arg(Arg::new("order").long("order")
                .value_parser(REORDERS).default_value("auto")
                .help("sector order of the input image"))
            .arg(Arg::new("new-order").long("new-order")
                .value_parser(REORDERS).default_value("auto")
                .help("sector order of the output image"))
            .arg(Arg::new("force").short('f').long("force").action(ArgAction::SetTrue)
                .help("overwrite an existing output file"))
            .about("rewrite an image in another sector order"))
        .subcommand(Command::new("filetypes")
            .arg(Arg::new("all").long("all").action(ArgAction::SetTrue)
                .help("display all types, including SOS types and reserved ranges"))
            .about("print a table of the known filetypes"))
        .subcommand(Command::new("mksd")
            .arg(image_arg())
            .arg(Arg::new("binary").required(true)
                .help("binary file to place on the disk, or `-` for stdin"))
            .arg(Arg::new("address").long("address").default_value("0x6000")
                .help("address to load the code at"))
            .arg(Arg::new("start").long("start").default_value("0xFFFF")
                .help("address to jump to; defaults to the load address"))
            .arg(Arg::new("order").long("order")
                .value_parser(REORDERS).default_value("auto")
                .help("sector order of the output image"))
            .about("make a Standard Delivery boot disk from a binary"))
        .subcommand(Command::new("applesoft")
            .subcommand_required(true)
            .subcommand(Command::new("decode")
                .arg(Arg::new("file").required(true)
                    .help("tokenized program file, or `-` for stdin"))
                .arg(Arg::new("location").short('l').long("location").default_value("0x801")
                    .help("starting program location in memory"))
                .arg(Arg::new("raw").short('r').long("raw").action(ArgAction::SetTrue)
                    .help("print raw control codes (no escaping)"))
                .about("convert a binary Applesoft program to a LISTing"))
            .about("work with Applesoft programs"))
        .subcommand(Command::new("nakedos")
            .visible_alias("supermon")
            .subcommand_required(true)
            .subcommand(Command::new("mkhello")
                .arg(image_arg())
                .arg(Arg::new("message").required(false)
                    .help("text for the greeting program to print"))
                .arg(order_arg())
                .about("write a DF01 greeting program, creating the disk if needed"))
            .about("work with NakedOS/Super-Mon disks"))
}
