use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "content-moderator",
    version,
    about = "Classify web content for spam categories with an LLM and score it against human labels"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify every row of a content CSV and write JSONL results.
    Classify(ClassifyArgs),
    /// Re-run the schema audit over an existing results file.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// CSV with `uid` and `content` columns.
    #[arg(long, env = "CONTENT_CSV", default_value = "data/content.csv")]
    pub csv: PathBuf,

    /// Only process the first N rows.
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Score results against human annotations.
    #[arg(short, long)]
    pub validate: bool,

    /// Annotation CSV; defaults to the content CSV.
    #[arg(long)]
    pub annotations: Option<PathBuf>,

    /// Prompt template file containing a `{content}` placeholder.
    #[arg(long)]
    pub prompt: Option<PathBuf>,
}

impl ClassifyArgs {
    /// A limit of zero means no limit.
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|limit| *limit > 0)
    }
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// JSONL results file to audit.
    pub path: PathBuf,
}
