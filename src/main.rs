use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;

#[derive(Parser)]
#[command(about = "Per-key min/avg/max over a <key>;<value> file")]
struct Cli {
    #[arg(help = "Path to the input file", default_value = "measurements.txt")]
    file: PathBuf,
    #[arg(short, long, help = "Worker count (defaults to the rayon pool width)")]
    threads: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = File::open(&cli.file)
        .with_context(|| format!("couldn't open {}", cli.file.display()))?;
    // SAFETY: the mapping is read-only and the file is assumed static for
    // the duration of the run.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("couldn't map {}", cli.file.display()))?;

    let workers = cli.threads.unwrap_or_else(rayon::current_num_threads);
    let result = rowstats::aggregate(&mmap, workers);
    println!("{}", rowstats::render(&result));

    Ok(())
}
