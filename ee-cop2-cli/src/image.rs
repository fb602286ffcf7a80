//! Memory Images
//!
//! Loads the bytes the listing walks over: either a raw dump placed at a base address
//! or the executable sections of a little-endian ELF (the usual PS2 `.elf` layout).
//! Words are read little-endian.

use anyhow::{Context, Result};
use ee_cop2_core::{Cop2Error, Cop2Result, MemoryReader, INSTRUCTION_SIZE};
use goblin::elf::section_header::{SHF_EXECINSTR, SHT_PROGBITS};
use goblin::elf::Elf;
use std::path::Path;

/// Contiguous bytes mapped at `address`.
#[derive(Debug, Clone)]
pub struct Segment {
    pub name: String,
    pub address: u32,
    pub bytes: Vec<u8>,
}

impl Segment {
    pub fn end(&self) -> u32 {
        self.address.wrapping_add(self.bytes.len() as u32)
    }

    pub fn contains(&self, address: u32) -> bool {
        address >= self.address && u64::from(address) < u64::from(self.address) + self.bytes.len() as u64
    }

    /// `(address, word)` for every complete word of the segment.
    pub fn words(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.bytes
            .chunks_exact(INSTRUCTION_SIZE as usize)
            .enumerate()
            .map(move |(i, chunk)| {
                let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                (self.address.wrapping_add(i as u32 * INSTRUCTION_SIZE), word)
            })
    }
}

/// Loaded image.
#[derive(Debug, Clone, Default)]
pub struct Image {
    segments: Vec<Segment>,
    entry: Option<u32>,
}

impl Image {
    /// Raw dump loaded at `base`.
    pub fn from_raw(bytes: Vec<u8>, base: u32) -> Self {
        if bytes.len() % INSTRUCTION_SIZE as usize != 0 {
            log::warn!(
                "Image size {} is not a multiple of 4, trailing bytes ignored",
                bytes.len()
            );
        }
        Self {
            segments: vec![Segment {
                name: "raw".to_string(),
                address: base,
                bytes,
            }],
            entry: None,
        }
    }

    /// Executable `PROGBITS` sections of an ELF file.
    ///
    /// # Errors
    /// [`Cop2Error::InvalidImage`] when the file does not parse, is big-endian, or has no
    /// executable section.
    pub fn from_elf(bytes: &[u8]) -> Cop2Result<Self> {
        let elf = Elf::parse(bytes)
            .map_err(|e| Cop2Error::invalid_image(format!("ELF parse failed: {}", e)))?;
        if !elf.little_endian {
            return Err(Cop2Error::invalid_image("big-endian ELF, expected R5900 little-endian"));
        }

        let mut segments = Vec::new();
        for header in &elf.section_headers {
            if header.sh_type != SHT_PROGBITS
                || header.sh_flags & u64::from(SHF_EXECINSTR) == 0
                || header.sh_size == 0
            {
                continue;
            }
            let name = elf.shdr_strtab.get_at(header.sh_name).unwrap_or("?").to_string();
            let address = u32::try_from(header.sh_addr).map_err(|_| {
                Cop2Error::invalid_image(format!("section {} is above 4 GiB", name))
            })?;
            let data = usize::try_from(header.sh_offset)
                .ok()
                .zip(usize::try_from(header.sh_size).ok())
                .and_then(|(offset, size)| bytes.get(offset..offset.checked_add(size)?))
                .ok_or_else(|| {
                    Cop2Error::invalid_image(format!("section {} extends past end of file", name))
                })?;
            log::debug!(
                "Section {} at 0x{:08X}, {} bytes",
                name,
                address,
                data.len()
            );
            segments.push(Segment {
                name,
                address,
                bytes: data.to_vec(),
            });
        }

        if segments.is_empty() {
            return Err(Cop2Error::invalid_image("no executable sections"));
        }
        Ok(Self {
            segments,
            entry: u32::try_from(elf.entry).ok(),
        })
    }

    /// Read `path` as an ELF or a raw dump at `base`.
    pub fn load(path: &Path, elf: bool, base: u32) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image: {}", path.display()))?;
        if elf {
            Self::from_elf(&bytes).with_context(|| format!("Failed to load ELF: {}", path.display()))
        } else {
            Ok(Self::from_raw(bytes, base))
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn entry(&self) -> Option<u32> {
        self.entry
    }

    /// Lowest mapped address.
    pub fn start(&self) -> Option<u32> {
        self.segments.iter().map(|segment| segment.address).min()
    }

    pub fn word_count(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| segment.bytes.len() / INSTRUCTION_SIZE as usize)
            .sum()
    }

    /// Every word of every segment, in segment order.
    pub fn words(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.segments.iter().flat_map(Segment::words)
    }
}

impl MemoryReader for Image {
    fn read_word(&self, address: u32) -> Cop2Result<u32> {
        let segment = self
            .segments
            .iter()
            .find(|segment| segment.contains(address))
            .ok_or(Cop2Error::UnmappedAddress { address })?;
        let offset = (address - segment.address) as usize;
        segment
            .bytes
            .get(offset..offset + INSTRUCTION_SIZE as usize)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .ok_or(Cop2Error::UnmappedAddress { address })
    }
}
