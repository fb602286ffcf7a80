//! Integration tests for the reference host

use ee_cop2_cli::commands::{build_listing, listing_row, parse_number, ListingRow};
use ee_cop2_cli::config::CliConfig;
use ee_cop2_cli::host::decode_host;
use ee_cop2_cli::image::Image;
use ee_cop2_core::{
    Cop2Processor, Cop2Result, EdgeKind, HostKind, MemoryReader, RenderOptions, TextRenderer,
};
use std::cell::Cell;
use indicatif::ProgressBar;
use std::collections::BTreeMap;

fn processor() -> Cop2Processor {
    Cop2Processor::activate("r5900l", RenderOptions::default())
        .unwrap()
        .unwrap()
}

fn image(words: &[u32], base: u32) -> Image {
    Image::from_raw(words.iter().flat_map(|word| word.to_le_bytes()).collect(), base)
}

fn host_line(word: u32) -> String {
    TextRenderer::default()
        .render_host(&decode_host(word, 0), None)
        .line(13)
}

#[test]
fn test_parse_number() {
    assert_eq!(parse_number("0x4A808000"), Ok(0x4A80_8000));
    assert_eq!(parse_number("0X10"), Ok(0x10));
    assert_eq!(parse_number("4096"), Ok(4096));
    assert_eq!(parse_number("0x0010_0000"), Ok(0x0010_0000));
    assert!(parse_number("0xZZ").is_err());
}

#[test]
fn test_host_cop2_moves() {
    // qmfc2.i $v0, vf5
    let word = (0x12 << 26) | (0x01 << 21) | (2 << 16) | (5 << 11) | 1;
    assert_eq!(decode_host(word, 0).kind, HostKind::Qmfc2);
    assert_eq!(host_line(word), "qmfc2.i      $v0, vf5");

    // ctc2 $t0, vi27 without interlock
    let word = (0x12 << 26) | (0x06 << 21) | (8 << 16) | (27 << 11);
    assert_eq!(host_line(word), "ctc2         $t0, CMSAR0, 0");

    // cfc2.i $a0, STATUS
    let word = (0x12 << 26) | (0x02 << 21) | (4 << 16) | (16 << 11) | 1;
    assert_eq!(host_line(word), "cfc2.i       $a0, STATUS");

    // qmtc2 $t1, vf12
    let word = (0x12 << 26) | (0x05 << 21) | (9 << 16) | (12 << 11);
    assert_eq!(host_line(word), "qmtc2        $t1, vf12, 0");
}

#[test]
fn test_host_quadword_memory() {
    // lqc2 vf7, 0x20($sp)
    let word = (0x36 << 26) | (29 << 21) | (7 << 16) | 0x20;
    assert_eq!(host_line(word), "lqc2         vf7, 0x20($sp)");

    // sqc2 vf1, -0x10($a0)
    let word = (0x3E << 26) | (4 << 21) | (1 << 16) | 0xFFF0;
    assert_eq!(host_line(word), "sqc2         vf1, -0x10($a0)");
}

#[test]
fn test_host_sync() {
    assert_eq!(host_line(0x0000_000F), "sync");
    assert_eq!(host_line(0x0000_040F), "sync.p");
    assert_eq!(decode_host(0x0000_040F, 0).operands[0].value, 0x10);
}

#[test]
fn test_host_other_words() {
    assert_eq!(host_line(0x2402_0001), ".word        0x24020001");
    // COP2 move with an unknown rs field
    let word = (0x12 << 26) | (0x03 << 21);
    assert_eq!(decode_host(word, 0).kind, HostKind::Other);
}

#[test]
fn test_listing_mixes_cop2_and_host() {
    let processor = processor();
    let qmfc2 = (0x12 << 26) | (0x01 << 21) | (2 << 16) | (5 << 11) | 1;
    let image = image(
        &[0x4BC3_1068, 0x4100_FFFE, 0xBC87_FFF0, qmfc2, 0x2402_0001],
        0x0010_0000,
    );
    let (rows, xrefs) =
        build_listing(&processor, &image, None, None, &ProgressBar::hidden()).unwrap();

    let texts: Vec<_> = rows.iter().map(|row| row.text.as_str()).collect();
    assert_eq!(
        texts,
        [
            "vadd.xyz     vf1, vf2, vf3",
            "bc0f         0x00100000",
            "cache        ixin, -0x10($a0)",
            "qmfc2.i      $v0, vf5",
            ".word        0x24020001",
        ]
    );
    assert_eq!(rows.iter().filter(|row| row.cop2).count(), 3);
    assert_eq!(xrefs.len(), 3);
    assert_eq!(rows[1].edges[1].kind, EdgeKind::TakenBranch);
    assert_eq!(
        rows[2].comment.as_deref(),
        Some("Invalidate specified icache index entry")
    );
}

#[test]
fn test_listing_window() {
    let processor = processor();
    let image = image(&[0x4BC3_1068, 0x4A00_0438, 0x4BC3_1068, 0x4BC3_1068], 0x1000);
    let (rows, _) =
        build_listing(&processor, &image, Some(0x1004), Some(2), &ProgressBar::hidden()).unwrap();
    let addresses: Vec<_> = rows.iter().map(|row| row.address).collect();
    assert_eq!(addresses, [0x1004, 0x1008]);
    assert_eq!(rows[0].text, "vcallms      0x10 # VU0 address: 0x80");
}

#[test]
fn test_listing_row_format_and_json() {
    let processor = processor();
    let image = image(&[0xBC87_0040], 0x2000);
    let mut comments: BTreeMap<u32, String> = BTreeMap::new();
    let mut xrefs = Vec::new();
    let row: ListingRow =
        listing_row(&processor, &image, 0x2000, &mut comments, &mut xrefs).unwrap();

    assert_eq!(
        row.format(true),
        "00002000:  BC870040  cache        ixin, 0x40($a0)  ; Invalidate specified icache index entry"
    );
    assert_eq!(
        row.format(false),
        "00002000:  cache        ixin, 0x40($a0)  ; Invalidate specified icache index entry"
    );

    let json = serde_json::to_value(&row).unwrap();
    assert_eq!(json["address"], 0x2000);
    assert_eq!(json["cop2"], true);
    assert!(json["edges"].as_array().unwrap().is_empty());
}

#[test]
fn test_unmapped_read_is_an_error() {
    let processor = processor();
    let image = image(&[0x4BC3_1068], 0x1000);
    let mut comments: BTreeMap<u32, String> = BTreeMap::new();
    let mut xrefs = Vec::new();
    assert!(listing_row(&processor, &image, 0x2000, &mut comments, &mut xrefs).is_err());
}

#[test]
fn test_activation_follows_config() {
    let config = CliConfig {
        processor: "mipsl".to_string(),
        ..CliConfig::default()
    };
    assert!(ee_cop2_cli::commands::activate(&config).is_err());
    assert!(ee_cop2_cli::commands::activate(&CliConfig::default()).is_ok());
}

struct CountingMemory {
    image: Image,
    reads: Cell<usize>,
}

impl MemoryReader for CountingMemory {
    fn read_word(&self, address: u32) -> Cop2Result<u32> {
        self.reads.set(self.reads.get() + 1);
        self.image.read_word(address)
    }
}

#[test]
fn test_listing_row_reads_each_word_once() {
    let processor = processor();
    let memory = CountingMemory {
        image: image(&[0x4BC3_1068, 0x2402_0001], 0x1000),
        reads: Cell::new(0),
    };
    let mut comments: BTreeMap<u32, String> = BTreeMap::new();
    let mut xrefs = Vec::new();

    listing_row(&processor, &memory, 0x1000, &mut comments, &mut xrefs).unwrap();
    assert_eq!(memory.reads.get(), 1);
    listing_row(&processor, &memory, 0x1004, &mut comments, &mut xrefs).unwrap();
    assert_eq!(memory.reads.get(), 2);
}

#[test]
fn test_stored_comment_is_distinct_from_inline_note() {
    let processor = processor();
    let image = image(&[0x4A00_0438], 0x3000);
    let mut comments: BTreeMap<u32, String> = BTreeMap::new();
    comments.insert(0x3000, "upload kernel".to_string());
    let mut xrefs = Vec::new();

    let row = listing_row(&processor, &image, 0x3000, &mut comments, &mut xrefs).unwrap();
    let line = row.format(false);
    assert_eq!(
        line,
        "00003000:  vcallms      0x10 # VU0 address: 0x80  ; upload kernel"
    );
    assert_eq!(line.matches('#').count(), 1);
}
