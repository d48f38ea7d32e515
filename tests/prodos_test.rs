// tests of the ProDOS file system module against a synthesized volume
use a2dsk::fs::prodos;
use a2dsk::fs::prodos::directory::*;
use a2dsk::fs::prodos::{read_volume,VolumeBitMap,VOL_KEY_BLOCK};
use a2dsk::fs::{DiskOrder,Filetype,Operator,OperatorFactory};
use a2dsk::marshal::{marshal_block,DiskStruct,BLOCK_SIZE};
use a2dsk::Error;

fn named_fd(name: &str, stype: StorageType, file_type: u8, key: u16, header: u16) -> FileDescriptor {
    let mut fd = FileDescriptor::from_bytes(&vec![0;ENTRY_LENGTH]).expect("zero entry should decode");
    fd.type_and_name_length = ((stype as u8) << 4) | name.len() as u8;
    fd.file_name[0..name.len()].copy_from_slice(name.as_bytes());
    fd.file_type = file_type;
    fd.key_pointer = key;
    fd.blocks_used = 1;
    fd.eof = [0,2,0];
    fd.access = ACCESS_READ | ACCESS_WRITE;
    fd.header_pointer = header;
    fd
}

fn subdir_key(name: &str, parent: u16, parent_entry: u8) -> SubdirectoryKeyBlock {
    let mut skb = SubdirectoryKeyBlock::from_bytes(&vec![0;BLOCK_SIZE]).expect("zero block should decode");
    skb.header.type_and_name_length = ((StorageType::SubDirHeader as u8) << 4) | name.len() as u8;
    skb.header.subdirectory_name[0..name.len()].copy_from_slice(name.as_bytes());
    skb.header.marker = SUBDIR_MARKER;
    skb.header.entry_length = ENTRY_LENGTH as u8;
    skb.header.entries_per_block = 13;
    skb.header.parent_pointer = parent;
    skb.header.parent_entry = parent_entry;
    skb.header.parent_entry_length = ENTRY_LENGTH as u8;
    skb
}

/// A device with a root catalog spanning two blocks, a subdirectory, and a
/// nested subdirectory inside it.
fn build_volume(total_blocks: u16) -> Vec<u8> {
    let mut dev = vec![0;total_blocks as usize * BLOCK_SIZE];
    let mut key = VolumeDirectoryKeyBlock::from_bytes(&vec![0;BLOCK_SIZE]).unwrap();
    key.next = 3;
    key.header.type_and_name_length = ((StorageType::VolDirHeader as u8) << 4) | 4;
    key.header.volume_name[0..4].copy_from_slice(b"DEMO");
    key.header.entry_length = ENTRY_LENGTH as u8;
    key.header.entries_per_block = 13;
    key.header.file_count = 4;
    key.header.bit_map_pointer = 6;
    key.header.total_blocks = total_blocks;
    key.descriptors[0] = named_fd("PRODOS",StorageType::Sapling,0xff,7,2);
    key.descriptors[1] = named_fd("BASIC.SYSTEM",StorageType::Sapling,0xff,9,2);
    key.descriptors[2] = named_fd("SUBDIR",StorageType::SubDirEntry,0x0f,10,2);
    marshal_block(&mut dev,&key,VOL_KEY_BLOCK).unwrap();

    let mut cont = VolumeDirectoryBlock::from_bytes(&vec![0;BLOCK_SIZE]).unwrap();
    cont.prev = 2;
    cont.descriptors[0] = named_fd("NOTES",StorageType::Seedling,0x04,11,2);
    let mut dead = named_fd("GONER",StorageType::Seedling,0x04,12,2);
    dead.type_and_name_length = 5; // inactive storage type, name length kept
    cont.descriptors[1] = dead;
    marshal_block(&mut dev,&cont,3).unwrap();

    // volume bitmap: everything beyond the directory region is free
    let mut bitmap = vec![0xff;BLOCK_SIZE];
    bitmap[0] = 0x00;
    bitmap[1] = 0x0f;
    marshal_raw_block(&mut dev,&bitmap,6);

    let mut subdir = subdir_key("SUBDIR",2,3);
    subdir.header.file_count = 2;
    subdir.descriptors[0] = named_fd("CHILD",StorageType::Seedling,0x06,13,10);
    subdir.descriptors[1] = named_fd("NESTED",StorageType::SubDirEntry,0x0f,14,10);
    marshal_block(&mut dev,&subdir,10).unwrap();

    let mut nested = subdir_key("NESTED",10,2);
    nested.header.file_count = 1;
    nested.descriptors[0] = named_fd("GRANDCHILD",StorageType::Seedling,0x04,15,14);
    marshal_block(&mut dev,&nested,14).unwrap();

    dev
}

fn marshal_raw_block(dev: &mut [u8], dat: &[u8], index: u16) {
    let start = index as usize * BLOCK_SIZE;
    dev[start..start+BLOCK_SIZE].copy_from_slice(dat);
}

#[test]
fn volume_tree() {
    let dev = build_volume(280);
    let vol = read_volume(&dev,VOL_KEY_BLOCK).expect("read failed");
    assert_eq!(vol.key_block.header.name(),"DEMO");
    assert_eq!(vol.blocks.len(),1);
    assert_eq!(vol.subdirs_by_block.len(),2);
    assert!(vol.subdirs_by_name.contains_key("SUBDIR"));
    assert!(vol.subdirs_by_name.contains_key("SUBDIR/NESTED"));
    assert_eq!(vol.notes.len(),0);
}

#[test]
fn root_catalog() {
    let op = prodos::Factory::new().operator(build_volume(280)).expect("mount failed");
    assert!(op.has_subdirs());
    let descs = op.catalog("").expect("catalog failed");
    let names: Vec<&str> = descs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names,vec!["PRODOS","BASIC.SYSTEM","SUBDIR","NOTES"]);
    assert_eq!(descs[0].file_type,Filetype::SYSTEM);
    assert_eq!(descs[0].blocks,1);
    assert_eq!(descs[0].length,0x200);
    assert_eq!(descs[2].file_type,Filetype::DIRECTORY);
}

#[test]
fn subdir_catalog() {
    let op = prodos::Factory::new().operator(build_volume(280)).expect("mount failed");
    let descs = op.catalog("SUBDIR").expect("catalog failed");
    let names: Vec<&str> = descs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names,vec!["CHILD","NESTED"]);
    let descs = op.catalog("SUBDIR/NESTED").expect("catalog failed");
    assert_eq!(descs.len(),1);
    assert_eq!(descs[0].name,"GRANDCHILD");
    let e = op.catalog("NOWHERE").unwrap_err();
    assert!(matches!(e.downcast_ref::<Error>(),Some(Error::NotFound(_))));
}

#[test]
fn validation_notes_are_non_fatal() {
    let mut dev = build_volume(280);
    // break the subdirectory marker and give a descriptor an absurd time
    dev[10*BLOCK_SIZE + 4 + 0x10] = 0x00;
    dev[VOL_KEY_BLOCK as usize*BLOCK_SIZE + 0x2b + 0x23] = 99; // hour byte of last_mod
    let vol = read_volume(&dev,VOL_KEY_BLOCK).expect("read should still succeed");
    assert!(vol.notes.iter().any(|n| n.contains("0x75")));
    assert!(vol.notes.iter().any(|n| n.contains("hour")));
}

#[test]
fn bitmap_sizing_and_bits() {
    let dev = build_volume(280);
    let vol = read_volume(&dev,VOL_KEY_BLOCK).expect("read failed");
    // 280 blocks need a single bitmap block
    assert_eq!(vol.bitmap.data.len(),1);
    assert!(!vol.bitmap.is_free(0));
    assert!(!vol.bitmap.is_free(11));
    assert!(vol.bitmap.is_free(12));
    assert!(vol.bitmap.is_free(279));
    assert_eq!(vol.bitmap.free_blocks(280),280-12);
    // one bit per block: 4097 blocks need two bitmap blocks
    let small = vec![0;10*BLOCK_SIZE];
    let bm = VolumeBitMap::read(&small,6,4097).expect("read failed");
    assert_eq!(bm.data.len(),2);
}

#[test]
fn reads_and_writes_are_not_implemented() {
    let mut op = prodos::Factory::new().operator(build_volume(280)).expect("mount failed");
    assert!(op.get_file("PRODOS").is_err());
    assert!(op.delete("PRODOS").is_err());
}

#[test]
fn dispatcher_finds_prodos() {
    let factories = a2dsk::operator_factories();
    // 280 blocks is exactly floppy-sized; treat it as a .po file
    let (op,order) = a2dsk::open_image(build_volume(280),"demo.po",DiskOrder::Auto,"auto",&factories)
        .expect("open failed");
    assert_eq!(op.name(),"prodos");
    assert_eq!(order,DiskOrder::ProDOS);
    // larger devices open through the hdv path
    let (op,order) = a2dsk::open_image(build_volume(320),"demo.hdv",DiskOrder::Auto,"auto",&factories)
        .expect("open failed");
    assert_eq!(op.name(),"prodos");
    assert_eq!(order,DiskOrder::ProDOS);
    assert_eq!(op.catalog("SUBDIR").unwrap().len(),2);
    // an hdv cannot be opened in DOS order
    assert!(a2dsk::open_image(build_volume(320),"demo.hdv",DiskOrder::DOS,"auto",&factories).is_err());
}
