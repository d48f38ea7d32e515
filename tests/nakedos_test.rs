// tests of the NakedOS/Super-Mon file system module against a synthesized disk
use a2dsk::fs::nakedos::symbols::SymbolTable;
use a2dsk::fs::nakedos::{Factory,SectorMap};
use a2dsk::fs::{Descriptor,DiskOrder,FileInfo,Filetype,Operator,OperatorFactory};
use a2dsk::{img,Error};

// The extra newline pads us to 256 bytes.
const HAMLET: &str = "To be, or not to be, that is the question:
Whether 'tis Nobler in the mind to suffer
The Slings and Arrows of outrageous Fortune,
Or to take Arms against a Sea of troubles,
And by opposing end them: to die, to sleep
No more; and by a sleep, to say we end

";

fn binary_info(name: &str, data: Vec<u8>) -> FileInfo {
    FileInfo {
        descriptor: Descriptor {
            name: name.to_string(),
            full_name: None,
            sectors: 0,
            blocks: 0,
            length: data.len() as i64,
            locked: false,
            file_type: Filetype::BINARY
        },
        data,
        start_address: 0
    }
}

/// A NakedOS disk with an empty symbol table on board, ten named user files,
/// and the hamlet passage in DF0A:FTOBE.
fn build_disk() -> Box<dyn Operator> {
    let mut disk = vec![0;img::FLOPPY_DISK_BYTES];
    let mut sm = SectorMap::blank();
    sm.persist(&mut disk).expect("persist failed");
    sm.write_symbol_table(&mut disk,&SymbolTable::new()).expect("symbol table write failed");
    let mut op = Factory::new().operator(disk).expect("mount failed");
    let names = [
        (0x01,"DF01:FHELLO"),(0x02,"DF02:FSUPERMON"),(0x05,"DF05:FMONHELP"),
        (0x06,"DF06:FSHORTSUP"),(0x07,"DF07:FSHRTHELP"),(0x08,"DF08:FSHORT"),
        (0x09,"DF09:FCHACHA")
    ];
    for (file,name) in names {
        let existed = op.put_file(&binary_info(name,vec![file;300]),false).expect("put failed");
        assert!(!existed);
    }
    let existed = op.put_file(&binary_info("DF0A:FTOBE",HAMLET.as_bytes().to_vec()),false).expect("put failed");
    assert!(!existed);
    op
}

#[test]
fn catalog_names_and_sizes() {
    let op = build_disk();
    let descs = op.catalog("").expect("catalog failed");
    let full_names: Vec<String> = descs.iter().map(|d| d.full_name.clone().unwrap()).collect();
    assert_eq!(full_names,vec![
        "DF01:FHELLO","DF02:FSUPERMON","DF03","DF04","DF05:FMONHELP",
        "DF06:FSHORTSUP","DF07:FSHRTHELP","DF08:FSHORT","DF09:FCHACHA","DF0A:FTOBE"
    ]);
    assert_eq!(descs[0].name,"FHELLO");
    assert_eq!(descs[2].name,"DF03");
    // the symbol table halves are 16 sectors each
    assert_eq!(descs[2].sectors,16);
    assert_eq!(descs[2].length,4096);
    // the 300-byte files round up to two sectors
    assert_eq!(descs[0].sectors,2);
    assert_eq!(descs[9].sectors,1);
    for desc in &descs {
        assert_eq!(desc.file_type,Filetype::BINARY);
        assert!(!desc.locked);
    }
}

#[test]
fn get_file_by_symbol_and_number() {
    let op = build_disk();
    let file = op.get_file("FTOBE").expect("get failed");
    assert_eq!(file.data.len(),256);
    assert_eq!(&file.data[..],HAMLET.as_bytes());
    assert!(file.data.starts_with(b"To be, or not to be, that is the question:\nWhether 'tis Nobler in the mind to suffer\n"));
    // the same file under its number, in any case
    let by_number = op.get_file("DF0A").expect("get failed");
    assert_eq!(by_number.data,file.data);
    let by_bare_number = op.get_file("0A").expect("get failed");
    assert_eq!(by_bare_number.data,file.data);
    // the boot file loads at 0x1800
    assert_eq!(op.get_file("FHELLO").unwrap().start_address,0x1800);
    assert_eq!(file.start_address,0);
    let e = op.get_file("FNOPE").unwrap_err();
    assert!(matches!(e.downcast_ref::<Error>(),Some(Error::NotFound(_))));
}

#[test]
fn put_assigns_first_free_file() {
    let mut op = build_disk();
    let existed = op.put_file(&binary_info("FNEWFILE",vec![0x5a;579]),false).expect("put failed");
    assert!(!existed);
    let descs = op.catalog("").expect("catalog failed");
    let last = descs.last().unwrap();
    assert_eq!(last.full_name.as_deref(),Some("DF0B:FNEWFILE"));
    assert_eq!(last.sectors,3);
    // a second put without overwrite is refused
    let e = op.put_file(&binary_info("FNEWFILE",vec![1;10]),false).unwrap_err();
    assert!(matches!(e.downcast_ref::<Error>(),Some(Error::AlreadyExists(_))));
    // with overwrite the sectors are reclaimed
    let existed = op.put_file(&binary_info("FNEWFILE",vec![1;10]),true).expect("put failed");
    assert!(existed);
    let descs = op.catalog("").expect("catalog failed");
    assert_eq!(descs.last().unwrap().sectors,1);
}

#[test]
fn put_validates_its_input() {
    let mut op = build_disk();
    let mut info = binary_info("FBAD",vec![1,2,3]);
    info.descriptor.length = 99;
    assert!(op.put_file(&info,false).is_err());
    let mut info = binary_info("FTEXT",vec![1,2,3]);
    info.descriptor.file_type = Filetype::ASCII_TEXT;
    assert!(op.put_file(&info,false).is_err());
    // symbol names must be encodable
    assert!(op.put_file(&binary_info("DF20:BAD-NAME",vec![1]),false).is_err());
}

#[test]
fn delete_removes_file_and_symbol() {
    let mut op = build_disk();
    let deleted = op.delete("FCHACHA").expect("delete failed");
    assert!(deleted);
    let descs = op.catalog("").expect("catalog failed");
    assert!(!descs.iter().any(|d| d.name == "FCHACHA"));
    assert!(!descs.iter().any(|d| d.full_name.as_deref() == Some("DF09:FCHACHA")));
    // the symbol went with it
    let e = op.get_file("FCHACHA").unwrap_err();
    assert!(matches!(e.downcast_ref::<Error>(),Some(Error::NotFound(_))));
    // deleting a name that never existed is an error
    assert!(op.delete("FNOPE").is_err());
}

#[test]
fn out_of_space_is_reported() {
    let mut op = build_disk();
    // the disk has 560 sectors and a dozen reserved; this cannot fit
    let e = op.put_file(&binary_info("FAT",vec![0;600*256]),false).unwrap_err();
    assert!(matches!(e.downcast_ref::<Error>(),Some(Error::OutOfSpace(_))));
}

#[test]
fn changes_survive_remount() {
    let mut op = build_disk();
    op.put_file(&binary_info("FKEEPER",vec![7;100]),false).expect("put failed");
    let bytes = op.get_bytes().to_vec();
    let op2 = Factory::new().operator(bytes).expect("remount failed");
    let file = op2.get_file("FKEEPER").expect("get failed");
    assert_eq!(file.data[0..100],[7;100]);
}

#[test]
fn dispatcher_finds_nakedos() {
    let op = build_disk();
    // render the raw-order buffer as a DOS-ordered .dsk file
    let dsk = img::unswizzle(op.get_bytes(),
        a2dsk::bios::skew::logical_to_physical(DiskOrder::DOS)).expect("unswizzle failed");
    let factories = a2dsk::operator_factories();
    let (op2,order) = a2dsk::open_image(dsk,"chacha20.dsk",DiskOrder::Auto,"auto",&factories)
        .expect("open failed");
    assert_eq!(op2.name(),"nakedos");
    assert_eq!(order,DiskOrder::DOS);
    assert_eq!(op2.get_file("FTOBE").unwrap().data.len(),256);
}

#[test]
fn symbol_table_failure_is_not_fatal() {
    // a disk with a sector map but no symbol table still mounts
    let mut disk = vec![0;img::FLOPPY_DISK_BYTES];
    SectorMap::blank().persist(&mut disk).expect("persist failed");
    let mut op = Factory::new().operator(disk).expect("mount failed");
    assert_eq!(op.catalog("").unwrap().len(),0);
    // numeric names still work without symbols
    op.put_file(&binary_info("DF05",vec![1;10]),false).expect("put failed");
    assert_eq!(op.catalog("").unwrap()[0].full_name.as_deref(),Some("DF05"));
    // symbolic names do not
    assert!(op.put_file(&binary_info("FNAME",vec![1;10]),false).is_err());
}
