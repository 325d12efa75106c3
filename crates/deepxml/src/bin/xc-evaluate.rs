// xc-evaluate - report metrics of k-NN / classifier score blends
//
//   xc-evaluate trn_X_Y.txt tst_X_Y.txt out/score 0.55 1.5 1 0.1 0.5 0.9
//   xc-evaluate trn_X_Y.txt tst_X_Y.txt out/score 0.55 1.5 0 -1

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use deepxml::evaluate::{self, EvaluateArgs, ScoreTransform};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Evaluate classifier and k-NN scores, alone and blended"
)]
struct Cli {
    /// Training labels (for propensity weights)
    train_file: PathBuf,

    /// Ground-truth labels of the evaluated instances
    targets_file: PathBuf,

    /// Prediction prefix; reads <prefix>_clf.npz and <prefix>_knn.npz, or <prefix>.npz
    predictions: PathBuf,

    /// Propensity parameter A
    #[arg(allow_negative_numbers = true)]
    a: f64,

    /// Propensity parameter B
    #[arg(allow_negative_numbers = true)]
    b: f64,

    /// Score rescaling: 0 none, 1 sigmoid, 2 exp then row-max normalize
    score_type: ScoreTransform,

    /// Blend weights of the classifier scores; a single -1 evaluates <prefix>.npz
    #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
    betas: Vec<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let args = EvaluateArgs {
        train_file: cli.train_file,
        targets_file: cli.targets_file,
        predictions: cli.predictions,
        a: cli.a,
        b: cli.b,
        transform: cli.score_type,
        betas: cli.betas,
    };
    let report = evaluate::run(&args)
        .with_context(|| format!("evaluating {}", args.predictions.display()))?;
    println!("{report}");
    Ok(())
}
