// CLI command handlers
use crate::config::CliConfig;
use crate::host::decode_host;
use crate::image::Image;
use anyhow::{Context, Result};
use ee_cop2_core::{
    CommentStore, ControlFlowEdge, Cop2Processor, DecodedInstruction, MemoryReader, OpcodeTable,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Listings longer than this get a progress bar.
const PROGRESS_THRESHOLD: usize = 0x4000;

/// Parse a decimal or `0x`-prefixed hexadecimal number.
pub fn parse_number(text: &str) -> Result<u32, std::num::ParseIntError> {
    let text = text.trim().replace('_', "");
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    }
}

/// One line of the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRow {
    pub address: u32,
    pub raw: u32,
    /// Decoded by the COP2 core rather than the fallback host decoder
    pub cop2: bool,
    pub text: String,
    pub comment: Option<String>,
    pub edges: Vec<ControlFlowEdge>,
}

impl ListingRow {
    pub fn format(&self, show_raw_words: bool) -> String {
        let mut line = if show_raw_words {
            format!("{:08X}:  {:08X}  {}", self.address, self.raw, self.text)
        } else {
            format!("{:08X}:  {}", self.address, self.text)
        };
        // `#` already starts inline operand notes (vcallms), stored comments use `;`
        if let Some(comment) = &self.comment {
            line.push_str("  ; ");
            line.push_str(comment);
        }
        line
    }
}

/// Activate the decoder for the configured processor.
pub fn activate(config: &CliConfig) -> Result<Cop2Processor> {
    Cop2Processor::activate(&config.processor, config.render.clone())
        .context("Failed to build COP2 tables")?
        .with_context(|| {
            format!(
                "Processor {:?} has no COP2 macro mode, set \"processor\" to \"r5900l\"",
                config.processor
            )
        })
}

/// Decode and render the word at `address`, falling back to the host decoder.
pub fn listing_row(
    processor: &Cop2Processor,
    memory: &dyn MemoryReader,
    address: u32,
    comments: &mut dyn CommentStore,
    xrefs: &mut Vec<ControlFlowEdge>,
) -> Result<ListingRow> {
    let raw = memory.read_word(address)?;
    Ok(word_row(processor, raw, address, comments, xrefs).0)
}

/// Row for an already fetched word, with the COP2 decode result when there is one.
fn word_row(
    processor: &Cop2Processor,
    raw: u32,
    address: u32,
    comments: &mut dyn CommentStore,
    xrefs: &mut Vec<ControlFlowEdge>,
) -> (ListingRow, Option<DecodedInstruction>) {
    let width = processor.renderer().options().mnemonic_width;

    match processor.decoder().decode(raw, address) {
        Some(insn) => {
            let first = xrefs.len();
            processor.emulate(&insn, xrefs);
            let rendered = processor.output(&insn, comments);
            let row = ListingRow {
                address,
                raw,
                cop2: true,
                text: rendered.line(width),
                comment: rendered.comment,
                edges: xrefs[first..].to_vec(),
            };
            (row, Some(insn))
        }
        None => {
            let host = decode_host(raw, address);
            let rendered = processor.output_host(&host, comments);
            let row = ListingRow {
                address,
                raw,
                cop2: false,
                text: rendered.line(width),
                comment: rendered.comment,
                edges: Vec::new(),
            };
            (row, None)
        }
    }
}

/// Listing of `count` words starting at `start`, or of the whole image.
pub fn build_listing(
    processor: &Cop2Processor,
    image: &Image,
    start: Option<u32>,
    count: Option<usize>,
    progress: &ProgressBar,
) -> Result<(Vec<ListingRow>, Vec<ControlFlowEdge>)> {
    let mut comments: BTreeMap<u32, String> = BTreeMap::new();
    let mut xrefs = Vec::new();
    let mut rows = Vec::new();

    let addresses = image
        .words()
        .map(|(address, _)| address)
        .skip_while(|&address| start.map_or(false, |start| address < start))
        .take(count.unwrap_or(usize::MAX));

    for address in addresses {
        rows.push(listing_row(
            processor,
            image,
            address,
            &mut comments,
            &mut xrefs,
        )?);
        progress.inc(1);
    }
    Ok((rows, xrefs))
}

fn listing_progress(total: usize) -> ProgressBar {
    if total < PROGRESS_THRESHOLD {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} words {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_message("Disassembling...");
    pb
}

pub fn decode_word(config: &CliConfig, word: u32, address: u32) -> Result<()> {
    let processor = activate(config)?;
    let mut comments: BTreeMap<u32, String> = BTreeMap::new();
    let mut xrefs = Vec::new();

    let (row, insn) = word_row(&processor, word, address, &mut comments, &mut xrefs);
    println!("{}", row.format(config.show_raw_words));

    match insn {
        Some(insn) => {
            if let Some(description) = processor.decoder().auto_comment(&insn) {
                println!("  {}", description);
            }
            for edge in &row.edges {
                println!("  {:?} -> 0x{:08X}", edge.kind, edge.target);
            }
        }
        None => println!("  not a COP2 instruction"),
    }
    Ok(())
}

pub fn disassemble(
    config: &CliConfig,
    file: &Path,
    elf: bool,
    base: Option<u32>,
    start: Option<u32>,
    count: Option<usize>,
    json: bool,
) -> Result<()> {
    let processor = activate(config)?;
    let image = Image::load(file, elf, base.unwrap_or(config.base_address))?;

    if !json {
        println!("Image: {}", file.display());
        for segment in image.segments() {
            println!(
                "  {:<12} 0x{:08X}-0x{:08X}",
                segment.name,
                segment.address,
                segment.end()
            );
        }
        if let Some(entry) = image.entry() {
            println!("  Entry point: 0x{:08X}", entry);
        }
        println!();
    }

    let total = count.unwrap_or_else(|| image.word_count()).min(image.word_count());
    let pb = listing_progress(total);
    let (rows, xrefs) = build_listing(&processor, &image, start, count, &pb)?;
    pb.finish_and_clear();

    if json {
        let output =
            serde_json::to_string_pretty(&rows).context("Failed to serialize listing")?;
        println!("{}", output);
        return Ok(());
    }

    for row in &rows {
        println!("{}", row.format(config.show_raw_words));
    }
    let decoded = rows.iter().filter(|row| row.cop2).count();
    println!();
    println!("{} words, {} COP2 instructions, {} edges", rows.len(), decoded, xrefs.len());
    Ok(())
}

pub fn print_table() -> Result<()> {
    let table = OpcodeTable::new().context("Failed to build opcode table")?;
    println!("{:<7} {:<10} {:>6} {:<5} {}", "OPCODE", "MNEMONIC", "FORMAT", "DEST", "DESCRIPTION");
    for definition in table.iter() {
        println!(
            "0x{:03X}   {:<10} {:>6} {:<5} {}",
            definition.opcode,
            definition.mnemonic,
            definition.format,
            if definition.has_dest { "yes" } else { "no" },
            definition.description
        );
    }
    println!("{} instructions", table.len());
    Ok(())
}
