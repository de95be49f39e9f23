//! Memory traffic generator CLI.
//!
//! Runs a stream set against the accelerator (or its software model),
//! prints the planned layout, checks simulation logs, or runs the host
//! stride baseline.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};

use mempress::common::{MempressError, Result};
use mempress::config::Config;
use mempress::sim::stride_walk::stride_walk;
use mempress::sim::Harness;
use mempress::soc::memory::build_controller;
use mempress::soc::{Device, SimDevice};
use mempress::stream::builder::PolicyKind;
use mempress::trace::{Axi4Checker, TagLedger};

const DEFAULT_CONFIG: &str = "configs/default.toml";

/// Command-line arguments for the traffic generator.
#[derive(Parser, Debug)]
#[command(author, version, about = "RoCC memory traffic generator")]
struct Cli {
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

/// Stream overrides shared by `run` and `plan`.
#[derive(Args, Debug)]
struct StreamArgs {
    #[arg(long, value_enum)]
    policy: Option<PolicyKind>,

    #[arg(long)]
    streams: Option<usize>,

    #[arg(long)]
    requests: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DeviceKind {
    Sim,
    Rocc,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the stream set and report bandwidth.
    Run {
        #[command(flatten)]
        streams: StreamArgs,

        #[arg(long, value_enum, default_value_t = DeviceKind::Sim)]
        device: DeviceKind,

        /// Skip locking pages resident.
        #[arg(long)]
        no_lock: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the layout and descriptor words without running.
    Plan {
        #[command(flatten)]
        streams: StreamArgs,
    },

    /// Replay a simulation log and list outstanding tags and addresses.
    Tags { log: PathBuf },

    /// Check AXI4 handshakes in a simulation log for reused transaction IDs.
    Axi4 { log: PathBuf },

    /// Sweep host memory at a fixed stride as a CPU baseline.
    StrideWalk {
        #[arg(long, default_value_t = 4 * 64 * 1024)]
        bytes: u64,

        #[arg(long, default_value_t = 64)]
        stride: u64,
    },
}

/// Configure the logger level and formatting string.
fn setup_logger(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::builder()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();
}

fn load_config(path: &Path, overrides: Option<&StreamArgs>) -> Result<Config> {
    let mut config = if !path.exists() && path == Path::new(DEFAULT_CONFIG) {
        info!("{} not found, using built-in defaults", path.display());
        Config::default()
    } else {
        Config::load(path)?
    };

    if let Some(args) = overrides {
        if let Some(policy) = args.policy {
            config.streams.policy = policy;
        }
        if let Some(count) = args.streams {
            config.streams.count = Some(count);
        }
        if let Some(requests) = args.requests {
            config.streams.request_count = requests;
        }
    }
    config.validate()?;
    Ok(config)
}

fn open_device(kind: DeviceKind, config: &Config) -> Result<Box<dyn Device>> {
    match kind {
        DeviceKind::Sim => Ok(Box::new(SimDevice::new(
            config.encoder()?,
            build_controller(&config.device),
            config.device.cache_line_bytes,
            config.run.seed,
        ))),
        #[cfg(target_arch = "riscv64")]
        DeviceKind::Rocc => Ok(Box::new(mempress::soc::rocc::RoccDevice)),
        #[cfg(not(target_arch = "riscv64"))]
        DeviceKind::Rocc => Err(MempressError::Device(
            "the rocc device is only available on riscv64 targets".to_string(),
        )),
    }
}

fn print_plan(harness: &Harness) -> Result<()> {
    let plan = harness.prepare()?;

    println!("Stream Layout");
    println!("--------------------");
    for row in plan.rows() {
        println!(
            "  [{:>2}] {:<10} stride: {:<6} reqs: {:<8} offset: {:#010x} span: {}",
            row.index, row.kind, row.stride_bytes, row.request_count, row.offset, row.span
        );
    }
    println!("  Total:              {} bytes", plan.layout.total_bytes());
    println!("  Pages:              {}", plan.layout.page_count());
    println!("  Prefault stride:    {}", plan.layout.prefault_stride());
    println!("Descriptors");
    println!("--------------------");
    for d in plan.program.descriptors() {
        println!(
            "  funct {}  word {}  operand {:#x}",
            d.command.funct(),
            d.word,
            d.operand
        );
    }
    Ok(())
}

/// Prints the ledger even when replay stopped early, then reports why.
fn print_tags(path: &Path) -> Result<()> {
    let mut ledger = TagLedger::new();
    let outcome = ledger.replay(BufReader::new(File::open(path)?));
    for (tag, count) in ledger.tags() {
        println!("{} -> {}", tag, count);
    }
    for (addr, count) in ledger.addresses() {
        println!("{:x} -> {}", addr, count);
    }
    outcome
}

fn print_axi4(path: &Path) -> Result<()> {
    let mut checker = Axi4Checker::new();
    let outcome = checker.replay(BufReader::new(File::open(path)?));
    for req in checker.queued_reads() {
        println!("queued  read  id {:#x} addr {:#x}", req.id, req.addr);
    }
    for (id, addr) in checker.sent_reads() {
        println!("backend read  id {:#x} addr {:#x}", id, addr);
    }
    for req in checker.queued_writes() {
        println!("queued  write id {:#x} addr {:#x}", req.id, req.addr);
    }
    for (id, addr) in checker.sent_writes() {
        println!("backend write id {:#x} addr {:#x}", id, addr);
    }
    if outcome.is_ok() {
        info!("no AXI4 ID conflicts");
    }
    outcome
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            streams,
            device,
            no_lock,
            json,
        } => {
            let mut config = load_config(&cli.config, Some(&streams))?;
            if no_lock {
                config.run.lock_pages = false;
            }
            let mut dev = open_device(device, &config)?;
            let report = Harness::new(config).run(dev.as_mut())?;
            if json {
                println!("{}", report.to_json()?);
            } else {
                report.print();
            }
        }
        Command::Plan { streams } => {
            let config = load_config(&cli.config, Some(&streams))?;
            print_plan(&Harness::new(config))?;
        }
        Command::Tags { log } => print_tags(&log)?,
        Command::Axi4 { log } => print_axi4(&log)?,
        Command::StrideWalk { bytes, stride } => {
            let config = load_config(&cli.config, None)?;
            let report = stride_walk(
                bytes,
                stride,
                config.device.page_bytes,
                config.run.prefault_fill,
            )?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

/// Main entry point.
///
/// Parses arguments, initialises logging, and dispatches the subcommand.
/// Any error aborts with a description of the violated invariant and exit
/// status 1.
fn main() {
    let cli = Cli::parse();
    setup_logger(cli.debug);

    if let Err(e) = run(cli) {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    }
}
