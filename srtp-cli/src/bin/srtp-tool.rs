//! SRTP Tool - offline SRTP/SRTCP packet protection
//!
//! Reads base64-encoded packets, one per line, from a file or stdin and
//! writes the protected or unprotected packets to stdout in the same format.

use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand};
use srtp::crypto::KeyDerivation;
use srtp::{PacketTransformer, RawPacket};
use srtp_cli::{display_engine_stats, Config};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "srtp-tool")]
#[command(about = "SRTP/SRTCP packet protection tool", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the session keys derived from a configuration
    Derive {
        /// Keying configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Packet index to derive for
        #[arg(long, default_value = "0")]
        index: u64,
    },

    /// Protect RTP (or RTCP) packets
    Protect {
        #[command(flatten)]
        packets: PacketArgs,
    },

    /// Verify and decrypt SRTP (or SRTCP) packets, dropping rejected ones
    Unprotect {
        #[command(flatten)]
        packets: PacketArgs,
    },

    /// Print an example configuration
    ExampleConfig {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct PacketArgs {
    /// Keying configuration (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Input: file path or '-' for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Treat packets as RTCP
    #[arg(long)]
    rtcp: bool,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Protect,
    Unprotect,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout carries packets
    let log_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match args.command {
        Command::Derive { config, index } => derive(&config, index),
        Command::Protect { packets } => process(&packets, Direction::Protect),
        Command::Unprotect { packets } => process(&packets, Direction::Unprotect),
        Command::ExampleConfig { output } => example_config(output),
    }
}

fn derive(path: &Path, index: u64) -> anyhow::Result<()> {
    let config = Config::from_file(path)
        .with_context(|| format!("loading configuration {}", path.display()))?;

    let rtp_policy = config.rtp.policy()?;
    let rtp_master = config.rtp.master(&rtp_policy)?;
    let keys = KeyDerivation::new(&rtp_master, &rtp_policy)?.derive_srtp(&rtp_policy, index)?;
    println!("srtp.enc_key  = {}", hex::encode(&keys.enc_key));
    println!("srtp.auth_key = {}", hex::encode(&keys.auth_key));
    println!("srtp.salt_key = {}", hex::encode(&keys.salt_key));

    let rtcp = config.rtcp_keys();
    let rtcp_policy = rtcp.policy()?;
    let rtcp_master = rtcp.master(&rtcp_policy)?;
    let keys = KeyDerivation::new(&rtcp_master, &rtcp_policy)?.derive_srtcp(&rtcp_policy, 0)?;
    println!("srtcp.enc_key  = {}", hex::encode(&keys.enc_key));
    println!("srtcp.auth_key = {}", hex::encode(&keys.auth_key));
    println!("srtcp.salt_key = {}", hex::encode(&keys.salt_key));
    Ok(())
}

fn process(args: &PacketArgs, direction: Direction) -> anyhow::Result<()> {
    let config = Config::from_file(&args.config)
        .with_context(|| format!("loading configuration {}", args.config.display()))?;
    let engine = config.engine()?;
    let transformer: &dyn PacketTransformer = if args.rtcp {
        engine.rtcp_transformer()
    } else {
        engine.rtp_transformer()
    };

    let reader = open_input(&args.input)?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let bytes = STANDARD
            .decode(line)
            .with_context(|| format!("line {}: invalid base64", number + 1))?;
        let packet = RawPacket::from_slice(&bytes);

        let output = match direction {
            Direction::Protect => match transformer.transform(packet) {
                Ok(packet) => Some(packet),
                Err(err) => {
                    tracing::warn!(line = number + 1, %err, "packet not protected");
                    None
                }
            },
            Direction::Unprotect => transformer.reverse_transform(packet),
        };

        if let Some(packet) = output {
            writeln!(writer, "{}", STANDARD.encode(packet.as_bytes()))?;
        }
    }
    writer.flush()?;

    display_engine_stats(&engine.stats());
    engine.close();
    Ok(())
}

fn example_config(output: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::example();
    match output {
        Some(path) => {
            config.to_file(&path)?;
            tracing::info!("Wrote example configuration to {}", path.display());
        }
        None => print!("{}", toml::to_string_pretty(&config)?),
    }
    Ok(())
}

fn open_input(input: &str) -> anyhow::Result<Box<dyn BufRead>> {
    if input == "-" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        let file = File::open(input).with_context(|| format!("opening {}", input))?;
        Ok(Box::new(BufReader::new(file)))
    }
}
