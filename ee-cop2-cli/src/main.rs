// CLI application
use clap::{ArgAction, Parser};
use ee_cop2_cli::commands::{decode_word, disassemble, parse_number, print_table};
use ee_cop2_cli::config::CliConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eecop2")]
#[command(about = "Emotion Engine COP2 (VU0 macro mode) disassembler")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a JSON config file (default: <config dir>/ee-cop2/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write the effective configuration back to the config file
    #[arg(long, global = true)]
    save_config: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Decode a single instruction word
    Decode {
        /// Instruction word, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_number)]
        word: u32,

        /// Address of the word
        #[arg(short, long, value_parser = parse_number, default_value = "0")]
        address: u32,
    },
    /// Disassemble a memory image or ELF executable
    Disasm {
        /// Path to the image
        file: PathBuf,

        /// Treat the file as an ELF and walk its executable sections
        #[arg(long)]
        elf: bool,

        /// Load address of a raw image
        #[arg(long, value_parser = parse_number)]
        base: Option<u32>,

        /// First address to list
        #[arg(long, value_parser = parse_number)]
        start: Option<u32>,

        /// Number of words to list
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Emit the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the COP2 opcode table
    Table,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = CliConfig::load(cli.config.as_deref())?;
    if cli.save_config {
        let path = config.save(cli.config.as_deref())?;
        log::info!("Configuration written to {}", path.display());
    }

    match cli.command {
        Commands::Decode { word, address } => decode_word(&config, word, address)?,
        Commands::Disasm {
            file,
            elf,
            base,
            start,
            count,
            json,
        } => disassemble(&config, &file, elf, base, start, count, json)?,
        Commands::Table => print_table()?,
    }

    Ok(())
}
