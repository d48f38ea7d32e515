//! `reorder` subcommand: rewrite a floppy image in another sector order.
//!
//! When an order is left as `auto` it is inferred from the other order
//! (always the opposite) or from the file extensions.

use clap::ArgMatches;
use log::debug;
use crate::bios::skew;
use crate::fs::DiskOrder;
use crate::img;
use crate::{DYNERR,Error,STDRESULT};

pub fn reorder(cmd: &ArgMatches) -> STDRESULT {
    let image = cmd.get_one::<String>("image").expect("image argument is required");
    let new_image = cmd.get_one::<String>("new-image").map(|s| s.as_str()).unwrap_or("");
    let in_flag = parse_flag(cmd.get_one::<String>("order").expect("order has a default"));
    let out_flag = parse_flag(cmd.get_one::<String>("new-order").expect("new-order has a default"));
    let (from_order,to_order) = get_orders(image,in_flag,new_image,out_flag)?;
    debug!("reordering {} -> {}",from_order,to_order);
    let frombytes = super::file_contents_or_stdin(image)?;
    let rawbytes = img::swizzle(&frombytes,skew::logical_to_physical(from_order))?;
    let tobytes = img::swizzle(&rawbytes,skew::physical_to_logical(to_order))?;
    match new_image {
        // with no separate output, rewrite the input in place
        "" => super::write_output(image,&tobytes,true),
        path => super::write_output(path,&tobytes,cmd.get_flag("force"))
    }
}

fn parse_flag(s: &str) -> Option<DiskOrder> {
    match s {
        "do" => Some(DiskOrder::DOS),
        "po" => Some(DiskOrder::ProDOS),
        _ => None
    }
}

fn opposite(order: DiskOrder) -> DiskOrder {
    match order {
        DiskOrder::DOS => DiskOrder::ProDOS,
        _ => DiskOrder::DOS
    }
}

fn order_from_filename(filename: &str) -> Option<DiskOrder> {
    match crate::file_extension(filename).as_str() {
        ".dsk" | ".do" => Some(DiskOrder::DOS),
        ".po" => Some(DiskOrder::ProDOS),
        _ => None
    }
}

/// Resolve the input and output orders from the flags and filenames.
fn get_orders(in_filename: &str, in_order: Option<DiskOrder>,
    out_filename: &str, out_order: Option<DiskOrder>) -> Result<(DiskOrder,DiskOrder),DYNERR> {
    match (in_order,out_order) {
        (None,Some(out)) => return Ok((opposite(out),out)),
        (Some(into),None) => return Ok((into,opposite(into))),
        (Some(into),Some(out)) if into != out => return Ok((into,out)),
        (Some(_),Some(_)) => return Err(Box::new(Error::InvalidOrder(
            "identical order and new-order".to_string()))),
        (None,None) => {}
    };
    let in_guess = order_from_filename(in_filename);
    let out_guess = order_from_filename(out_filename);
    if in_guess == out_guess {
        return match in_guess {
            None => Err(Box::new(Error::InvalidOrder(
                "cannot determine input or output order from file extensions".to_string()))),
            Some(order) => Err(Box::new(Error::InvalidOrder(format!(
                "guessed order ({}) from file \"{}\" is the same as guessed order from file \"{}\"",
                order,in_filename,out_filename))))
        };
    }
    match (in_guess,out_guess) {
        (None,Some(out)) => Ok((opposite(out),out)),
        (Some(into),None) => Ok((into,opposite(into))),
        (Some(into),Some(out)) => Ok((into,out)),
        (None,None) => unreachable!("equal guesses were handled above")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_inference() {
        let (f,t) = get_orders("x.dsk",None,"x.po",None).unwrap();
        assert_eq!((f,t),(DiskOrder::DOS,DiskOrder::ProDOS));
        let (f,t) = get_orders("x.img",Some(DiskOrder::ProDOS),"y.img",None).unwrap();
        assert_eq!((f,t),(DiskOrder::ProDOS,DiskOrder::DOS));
        let (f,t) = get_orders("x.img",None,"y.do",None).unwrap();
        assert_eq!((f,t),(DiskOrder::ProDOS,DiskOrder::DOS));
        assert!(get_orders("x.dsk",None,"y.do",None).is_err());
        assert!(get_orders("x.img",None,"y.img",None).is_err());
        assert!(get_orders("x.img",Some(DiskOrder::DOS),"y.img",Some(DiskOrder::DOS)).is_err());
    }
}
