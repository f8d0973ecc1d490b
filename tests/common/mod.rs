#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::Path;

use gcmtool::BuiltTable;

pub const FST_OFFSET: u32 = 0x3000;

/// ```text
/// opening.bnr   32 bytes
/// audio/
///   bgm.adp    100 bytes
///   se/
///     click.wav  3 bytes
/// empty/
/// zero.bin       0 bytes
/// .DS_Store      hidden
/// .git/config    hidden
/// ```
pub fn write_sample_tree(root: &Path) {
    fs::write(root.join("opening.bnr"), [0x42; 32]).expect("write opening.bnr");
    fs::create_dir_all(root.join("audio/se")).expect("create audio/se");
    fs::write(root.join("audio/bgm.adp"), [0x07; 100]).expect("write bgm.adp");
    fs::write(root.join("audio/se/click.wav"), b"clk").expect("write click.wav");
    fs::create_dir(root.join("empty")).expect("create empty");
    fs::write(root.join("zero.bin"), b"").expect("write zero.bin");
    fs::write(root.join(".DS_Store"), b"junk").expect("write .DS_Store");
    fs::create_dir(root.join(".git")).expect("create .git");
    fs::write(root.join(".git/config"), b"[core]").expect("write .git/config");
}

/// Paths and sizes of the sample tree in table order; directories have no size.
pub fn sample_tree_listing() -> Vec<(String, Option<u32>)> {
    vec![
        ("/audio".to_owned(), None),
        ("/audio/bgm.adp".to_owned(), Some(100)),
        ("/audio/se".to_owned(), None),
        ("/audio/se/click.wav".to_owned(), Some(3)),
        ("/empty".to_owned(), None),
        ("/opening.bnr".to_owned(), Some(32)),
        ("/zero.bin".to_owned(), Some(0)),
    ]
}

/// A minimal disc image: disk header pointing at the table, the table itself,
/// then every file's contents at its assigned offset.
pub fn assemble_image(built: &BuiltTable) -> Cursor<Vec<u8>> {
    let fst_size = built.fst.byte_len() as u32;

    let mut image = vec![0u8; FST_OFFSET as usize];
    image[..6].copy_from_slice(b"GTSE01");
    image[0x20..0x29].copy_from_slice(b"Test Disc");
    image[0x424..0x428].copy_from_slice(&FST_OFFSET.to_be_bytes());
    image[0x428..0x42c].copy_from_slice(&fst_size.to_be_bytes());
    image[0x42c..0x430].copy_from_slice(&fst_size.to_be_bytes());

    built.fst.write(&mut image).expect("write fst");

    for source in built.sources.iter() {
        let range = built
            .fst
            .entry(source.index)
            .expect("source entry")
            .data_range()
            .expect("source is a file");
        assert!(range.start as usize >= image.len());

        image.resize(range.start as usize, 0);
        image.extend_from_slice(&fs::read(&source.path).expect("read source file"));
    }

    Cursor::new(image)
}
