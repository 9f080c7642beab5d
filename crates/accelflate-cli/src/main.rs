//! accelflate command line
//!
//! Compresses and decompresses files with the tiered DEFLATE codec and
//! inspects the accelerator visible to the process.

mod container;
mod display;

use accelflate_codec::{codec_from_config, install_global_pool, JobPool};
use accelflate_config::{Config, ConfigLoader, LoggingConfig};
use accelflate_types::CodecMode;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Hardware-accelerated DEFLATE with software fallback
#[derive(Parser)]
#[command(name = "accelflate")]
#[command(about = "Hardware-accelerated DEFLATE with transparent software fallback")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into an accelflate container
    Compress {
        /// Input file
        input: PathBuf,
        /// Output container
        output: PathBuf,
        /// Uncompressed bytes per block
        #[arg(short, long, default_value_t = container::DEFAULT_BLOCK_SIZE)]
        block_size: usize,
    },
    /// Decompress an accelflate container
    Decompress {
        /// Input container
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Decompression mode, defaults to the configured one
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Show accelerator devices and the job pool
    Device {
        /// Root of the sysfs tree to probe
        #[arg(long, default_value = "/sys")]
        sysfs_root: PathBuf,
    },
    /// Print the effective configuration as YAML
    Config {
        /// Print built-in defaults instead of the loaded configuration
        #[arg(long)]
        default: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Sync,
    Async,
    Software,
}

impl From<ModeArg> for CodecMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sync => CodecMode::Synchronous,
            ModeArg::Async => CodecMode::Asynchronous,
            ModeArg::Software => CodecMode::SoftwareFallback,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&cli, &config.logging);

    let result = run(&cli, config).await;
    JobPool::shutdown_global();
    result
}

async fn run(cli: &Cli, config: Config) -> Result<()> {
    match &cli.command {
        Commands::Compress {
            input,
            output,
            block_size,
        } => compress_file(cli, config, input, output, *block_size).await,
        Commands::Decompress {
            input,
            output,
            mode,
        } => {
            let mode = (*mode).map_or(config.codec.decompress_mode, CodecMode::from);
            decompress_file(cli, config, input, output, mode).await
        }
        Commands::Device { sysfs_root } => show_devices(&config, sysfs_root),
        Commands::Config { default } => {
            let shown = if *default { Config::default() } else { config };
            print!("{}", serde_yaml::to_string(&shown)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ConfigLoader::load_default().context("Failed to load configuration")?,
    };
    Ok(config)
}

/// Initialize logging based on CLI flags and configuration
fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn compress_file(
    cli: &Cli,
    config: Config,
    input: &Path,
    output: &Path,
    block_size: usize,
) -> Result<()> {
    let data = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let original = data.len() as u64;
    debug!(input = %input.display(), bytes = original, block_size, "Compressing");

    let pool = install_global_pool(&config.accelerator);
    let progress = display::create_progress_bar(original, "Compressing", cli.quiet);
    let bar = progress.clone();
    let start = Instant::now();

    let (container, stats) = tokio::task::spawn_blocking(move || {
        let mut codec = codec_from_config(pool, &config);
        let container =
            container::compress_blocks(&mut codec, &data, block_size, |done| {
                bar.set_position(done as u64);
            })?;
        Ok::<_, anyhow::Error>((container, codec.stats()))
    })
    .await
    .context("Compression task panicked")??;
    progress.finish_and_clear();
    let elapsed = start.elapsed();

    tokio::fs::write(output, &container)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(output = %output.display(), bytes = container.len(), "Container written");

    if !cli.quiet {
        display::display_success(&format!(
            "Compressed {} to {} ({}) in {:.2?}, {}",
            display::format_bytes(original),
            display::format_bytes(container.len() as u64),
            display::format_ratio(original, container.len() as u64),
            elapsed,
            display::format_throughput(original, elapsed)
        ));
        if cli.verbose {
            display::display_codec_stats(&stats);
        }
    }
    Ok(())
}

async fn decompress_file(
    cli: &Cli,
    config: Config,
    input: &Path,
    output: &Path,
    mode: CodecMode,
) -> Result<()> {
    let data = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let blocks = container::parse_blocks(&data)?.len() as u64;
    debug!(input = %input.display(), blocks, %mode, "Decompressing");

    let pool = install_global_pool(&config.accelerator);
    let progress = display::create_progress_bar(blocks, "Decompressing", cli.quiet);
    let bar = progress.clone();
    let start = Instant::now();

    let (restored, stats) = tokio::task::spawn_blocking(move || {
        let mut codec = codec_from_config(pool, &config);
        let restored = container::decompress_blocks(&mut codec, &data, mode, |done| {
            bar.set_position(done as u64);
        })?;
        Ok::<_, anyhow::Error>((restored, codec.stats()))
    })
    .await
    .context("Decompression task panicked")??;
    progress.finish_and_clear();
    let elapsed = start.elapsed();

    tokio::fs::write(output, &restored)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if !cli.quiet {
        display::display_success(&format!(
            "Decompressed {} blocks to {} in {:.2?} ({} mode), {}",
            blocks,
            display::format_bytes(restored.len() as u64),
            elapsed,
            mode,
            display::format_throughput(restored.len() as u64, elapsed)
        ));
        if cli.verbose {
            display::display_codec_stats(&stats);
        }
    }
    Ok(())
}

fn show_devices(config: &Config, sysfs_root: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        let topology = accelflate_device::SysfsTopologyProbe::new(sysfs_root)
            .probe()
            .with_context(|| format!("Failed to probe {}", sysfs_root.display()))?;
        display::display_topology(&topology);
    }
    #[cfg(not(unix))]
    {
        let _ = sysfs_root;
        display::display_warning("Device discovery is only supported on Unix hosts");
    }

    let pool = install_global_pool(&config.accelerator);
    display::display_pool(pool.driver_name(), pool.is_ready(), &pool.stats());
    Ok(())
}
