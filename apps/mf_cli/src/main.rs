// apps/mf_cli/src/main.rs

//! macflow 命令行工具
//!
//! ```text
//! macflow <CONFIG> [--output DIR] [--log-level LEVEL] [--check]
//! ```
//!
//! 成功时在标准输出打印归档路径；失败时在标准错误打印一行
//! `error[<KIND>] at step <n> (t=<t>): <msg>`，并以失败类别对应的退出码退出。
//! 日志写到标准错误，标准输出只保留结果。

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use mf_foundation::FailureKind;
use mf_workflow::{check_case, run_case, RunOptions, WorkflowError};
use tracing::Level;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::FmtSubscriber;

/// macflow: 交错网格不可压缩流动求解器
#[derive(Parser, Debug)]
#[command(name = "macflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Incompressible Navier-Stokes solver on a staggered MAC grid")]
struct Cli {
    /// 输入文档 (JSON)
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// 输出目录
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    output: PathBuf,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// 只校验输入并构建算子，不推进时间
    #[arg(long)]
    check: bool,
}

fn parse_level(name: &str) -> Result<Level> {
    match name.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(anyhow!("未知日志级别: {other}")),
    }
}

fn init_logging(level: Level) -> Result<()> {
    // try_init 同时接管 log 门面，库 crate 的日志也会输出
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish()
        .try_init()
        .context("无法初始化日志")
}

fn check(config: &Path) -> Result<(), WorkflowError> {
    let summary = check_case(config)?;
    println!(
        "ok: {}x{}x{} cells, {} fluid, {} velocity unknowns, ppe {}, {} steps",
        summary.counts[0],
        summary.counts[1],
        summary.counts[2],
        summary.n_fluid,
        summary.n_velocity,
        if summary.ppe_singular { "singular" } else { "regular" },
        summary.planned_steps
    );
    Ok(())
}

fn run(cli: &Cli) -> Result<(), WorkflowError> {
    let options = RunOptions::new(&cli.output);
    let archive = run_case(&cli.config, &options)?;
    println!("{}", archive.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let setup = parse_level(&cli.log_level).and_then(init_logging);
    if let Err(err) = setup {
        eprintln!("error[{}] at step 0 (t=0): {err:#}", FailureKind::Internal.as_str());
        return ExitCode::from(FailureKind::Internal.exit_code() as u8);
    }

    tracing::info!("macflow v{}", env!("CARGO_PKG_VERSION"));
    let result = if cli.check { check(&cli.config) } else { run(&cli) };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(archive) = err.archive() {
                tracing::info!("失败记录已归档: {}", archive.display());
            }
            eprintln!("{}", err.terminal_line());
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
