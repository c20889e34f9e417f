use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Parser;
use log::{debug, info};
use simplelog::*;
use vector_timing_sim::config::SimulatorConfig;
use vector_timing_sim::extract_file::ExtractFile;
use vector_timing_sim::sim::Simulator;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the trace and configuration files
    #[arg(long, default_value = ".")]
    iodir: PathBuf,

    /// Path to the resolved instruction trace [default: <IODIR>/code.txt]
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Path to Configuration file [default: <IODIR>/Config.txt]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logger(program_path: &Path, verbose: bool) -> anyhow::Result<()> {
    // 从指令文件路径中提取程序名
    let program_name = program_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");

    // 生成容易读的时间戳格式: YYYYMMDD_HHMMSS
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    let log_dir = Path::new("log");
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    // 构造日志文件路径: log/sim_程序名_时间戳.log
    let log_filename = format!("log/sim_{}_{}.log", program_name, timestamp);
    let term_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    CombinedLogger::init(vec![
        TermLogger::new(term_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(LevelFilter::Debug, Config::default(), File::create(&log_filename)?),
    ])?;

    println!("Log file created: {}", log_filename);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let input = args.input.unwrap_or_else(|| args.iodir.join("code.txt"));
    let config_path = args.config.unwrap_or_else(|| args.iodir.join("Config.txt"));

    init_logger(&input, args.verbose)?;

    let config = SimulatorConfig::load_from_file(&config_path)?;
    info!("Config loaded from {}", config_path.display());
    debug!("Simulator config: {:?}", config);

    let code = ExtractFile::extract_code_from_file(&input)?;
    info!("Instructions loaded from {}", input.display());

    let mut simulator = Simulator::new(&config)?;
    simulator.load_instructions(code);
    let report = simulator.main_sim_loop()?;

    println!("{}", report);
    let stats = &report.stats;
    info!(
        "Fetched {} instructions ({} dropped), issued {} scalar / {} compute / {} memory",
        stats.fetched, stats.decode_failures, stats.issued_scalar, stats.issued_compute, stats.issued_memory
    );
    info!(
        "Fetch stalled {} cycles on vector length changes, {} bank conflict stall cycles",
        stats.fetch_stall_cycles, stats.bank_conflict_stalls
    );
    Ok(())
}
