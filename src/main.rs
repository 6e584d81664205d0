use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;

use cli::{
    AggregateArgs,
    Cli,
    Command,
    EvaluateArgs,
    RemapArgs,
    RunArgs,
    SplitArgs,
};
use rankfold::{
    bm25::Bm25Params,
    config::{CorpusConfig, ExperimentConfig},
    corpus_io,
    cv,
    error,
    eval::{self, EvalOptions},
    experiment,
    folds,
    remap,
};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("RANKFOLD_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Remap(args) => cmd_remap(&args)?,
        Command::Split(args) => cmd_split(&args)?,
        Command::Evaluate(args) => cmd_evaluate(&args)?,
        Command::Aggregate(args) => cmd_aggregate(&args)?,
        Command::Run(args) => cmd_run(&args)?,
    }

    Ok(())
}

fn cmd_remap(args: &RemapArgs) -> error::Result<()> {
    let fold: Vec<String> = corpus_io::read_corpus(&args.fold)?
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    let remapping = remap::remap_file(&args.qrels, &fold, &args.target_dir)?;
    println!(
        "Remapped {} judgment(s) onto {} document(s), dropped {}",
        remapping.judgments.value_count(),
        remapping.mapping.len(),
        remapping.dropped
    );
    println!(
        "Wrote {} and {}",
        args.target_dir.join(remap::MAPPING_FILE).display(),
        args.target_dir.join(remap::SAMPLED_QRELS_FILE).display()
    );
    Ok(())
}

fn cmd_split(args: &SplitArgs) -> error::Result<()> {
    let config = CorpusConfig::load(&args.config)?;
    let written = folds::split(&config, args.folds, args.seed)?;
    for fold in &written {
        println!("{}", fold.dir.display());
    }
    eprintln!(
        "Wrote {} fold(s) under {}",
        written.len(),
        config.fold_root().display()
    );
    Ok(())
}

fn cmd_evaluate(args: &EvaluateArgs) -> error::Result<()> {
    let options = EvalOptions {
        params: Bm25Params::new(args.k, args.b)?,
        cutoff: args.cutoff,
    };
    let results = eval::evaluate(
        &args.test_config,
        &args.train_config,
        &options,
        &args.result,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for r in &results {
            println!("{}\t{}\t{:.4}", r.query_id, r.retrieved, r.ndcg);
        }
        let values: Vec<f64> = results.iter().map(|r| r.ndcg).collect();
        println!("\nmean NDCG@{}: {:.4}", args.cutoff, eval::mean(&values));
    }
    Ok(())
}

fn cmd_aggregate(args: &AggregateArgs) -> error::Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.folds_dir.join(cv::CV_RESULT_FILE));
    let mean = cv::aggregate(&args.folds_dir, &output, args.expect_folds)?;

    if args.json {
        println!("{}", serde_json::to_string(&mean)?);
    } else {
        println!("Averaged {} value(s) into {}", mean.len(), output.display());
        println!("mean: {:.4}", eval::mean(&mean));
    }
    Ok(())
}

fn cmd_run(args: &RunArgs) -> error::Result<()> {
    let mut config = ExperimentConfig::load(&args.experiment)?;
    if let Some(folds) = args.folds {
        config.folds = folds;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(cutoff) = args.cutoff {
        config.cutoff = cutoff;
    }
    config.make_folds |= args.make_folds;
    config.compute_evals |= args.compute_evals;

    let outcomes = experiment::run(&config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else if outcomes.is_empty() {
        println!("No sets found under {}.", config.root.display());
    } else {
        for outcome in &outcomes {
            println!(
                "{}\t{:.4}\t{}",
                outcome.name,
                eval::mean(&outcome.mean),
                outcome.cv_result.display()
            );
        }
    }
    Ok(())
}
