mod checks;
mod render;
mod reports;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use checks::{SeedRun, run_seed};
use render::render_level;
use util::{load_config, parse_seeds, split_csv};

#[derive(Debug, Parser)]
#[command(name = "ledgeline-tester", version = "0.1.0")]
#[command(about = "Seeded QA runs for the ledgeline layout generator")]
struct Args {
    /// Seeds to run (comma-separated, decimal or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Columns to generate per seed (defaults to the sum of phase widths)
    #[arg(long)]
    width: Option<i32>,

    /// Level configuration JSON (defaults to the bundled preset)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json", "markdown", "ascii"])]
    report: String,

    /// Output file (defaults to stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print per-seed progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let start_time = Instant::now();
    let config = load_config(args.config.as_deref())?;
    let seeds = parse_seeds(&split_csv(&args.seeds))?;
    let width = args.width.unwrap_or_else(|| config.total_width());

    let runs: Vec<SeedRun> = seeds
        .iter()
        .map(|&seed| {
            let run = run_seed(&config, seed, width);
            if args.verbose {
                println!(
                    "  seed {seed}: {} chunks, width {}",
                    run.report.chunks, run.report.width
                );
            }
            run
        })
        .collect();

    write_reports(&args, &runs, width, start_time)?;

    if runs.iter().any(|run| !run.report.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🧗 Ledgeline Tester".bright_cyan().bold());
    println!("{}", "===================".cyan());
}

fn write_reports(args: &Args, runs: &[SeedRun], width: i32, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    let seed_reports: Vec<checks::SeedReport> = runs.iter().map(|run| run.report.clone()).collect();

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, &seed_reports)?,
        "markdown" => reports::generate_markdown_report(&mut output_target, &seed_reports)?,
        "ascii" => {
            for run in runs {
                writeln!(&mut output_target, "Seed {}", run.report.seed)?;
                match &run.level {
                    Some(level) => {
                        let map = render_level(level.provider(), level.pool().spawned(), width);
                        writeln!(&mut output_target, "{map}")?;
                    }
                    None => writeln!(&mut output_target, "(no level generated)")?,
                }
            }
        }
        _ => reports::generate_console_report(
            &mut output_target,
            &seed_reports,
            start_time.elapsed(),
        )?,
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
