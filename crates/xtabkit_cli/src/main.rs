//! `xtabkit`: split a survey crosstab workbook into one sheet per question.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use xtabkit_crosstab::{SpecCrosstabLayout, split_excel};

#[derive(Parser, Debug)]
#[command(
    name = "xtabkit",
    about = "Split a survey crosstab workbook into one sheet per question",
    version
)]
struct Args {
    /// Crosstab workbook to split
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output workbook (default: `<stem>_output.xlsx` next to the input)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// TOML file overriding the layout defaults
    #[arg(short, long, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Drop question markers that repeat the previous question
    #[arg(long)]
    reject_similar: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    xtabkit_log::init_logging(args.verbose)?;

    let mut layout = match &args.config {
        Some(path) => SpecCrosstabLayout::from_toml_file(path)?,
        None => SpecCrosstabLayout::default(),
    };
    if args.reject_similar {
        layout.if_reject_similar_questions = true;
    }

    let report = split_excel(&args.input, args.output.as_deref(), &layout)
        .with_context(|| format!("failed to split {}", args.input.display()))?;

    if let Some(path) = &report.path_file_out {
        info!(path = %path.display(), "wrote workbook");
    }
    println!("{report}");
    Ok(())
}
