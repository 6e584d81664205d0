use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "rankfold",
    about = "Cross-validated BM25 ranking evaluation over line corpora"
)]
pub struct Cli {
    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Remap relevance judgments onto the documents of one fold
    Remap(RemapArgs),
    /// Split a corpus into cross-validation folds
    Split(SplitArgs),
    /// Rank a test corpus with BM25 and write per-query NDCG
    Evaluate(EvaluateArgs),
    /// Average the per-fold results under a fold directory
    Aggregate(AggregateArgs),
    /// Split, evaluate and average every set of an experiment
    Run(RunArgs),
}

// -- Remap --

#[derive(Debug, Parser)]
pub struct RemapArgs {
    /// Judgment file (`query_id doc_id gain` per line)
    pub qrels: PathBuf,

    /// Fold file holding one original document ID per line
    pub fold: PathBuf,

    /// Directory receiving the mapping and remapped judgments
    pub target_dir: PathBuf,
}

// -- Split --

#[derive(Debug, Parser)]
pub struct SplitArgs {
    /// Corpus config file
    pub config: PathBuf,

    /// Number of folds
    #[arg(short = 'k', long, default_value = "10")]
    pub folds: usize,

    /// Shuffle seed
    #[arg(long, default_value = "0")]
    pub seed: u64,
}

// -- Evaluate --

#[derive(Debug, Parser)]
pub struct EvaluateArgs {
    /// Corpus config of the test documents
    pub test_config: PathBuf,

    /// Corpus config of the training documents
    pub train_config: PathBuf,

    /// Where to write the per-query NDCG values
    #[arg(short, long)]
    pub result: PathBuf,

    /// BM25 term-frequency saturation
    #[arg(long, default_value = "1.0")]
    pub k: f64,

    /// BM25 length normalization
    #[arg(long, default_value = "0.5")]
    pub b: f64,

    /// NDCG cutoff rank
    #[arg(long, default_value = "10")]
    pub cutoff: usize,

    /// Print per-query results as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Aggregate --

#[derive(Debug, Parser)]
pub struct AggregateArgs {
    /// Directory holding one subdirectory per fold
    pub folds_dir: PathBuf,

    /// Output file (defaults to cv_result.txt inside the folds directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Fail unless exactly this many folds are present
    #[arg(long)]
    pub expect_folds: Option<usize>,

    /// Print the averaged vector as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Run --

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Experiment config file
    pub experiment: PathBuf,

    /// Override the number of folds
    #[arg(short = 'k', long)]
    pub folds: Option<usize>,

    /// Override the shuffle seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the NDCG cutoff rank
    #[arg(long)]
    pub cutoff: Option<usize>,

    /// Split every set into folds even if the config says not to
    #[arg(long)]
    pub make_folds: bool,

    /// Evaluate every fold even if the config says not to
    #[arg(long)]
    pub compute_evals: bool,

    /// Print per-set outcomes as JSON
    #[arg(long)]
    pub json: bool,
}
