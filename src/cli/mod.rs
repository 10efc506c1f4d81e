// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, hands off to Layer 2 and prints the results.
//
//   1. `train`    — fit a network and save its best weights
//   2. `evaluate` — score a saved network on a test set
//   3. `predict`  — classify image files
//   4. `demo`     — the MNIST walk-through
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, DemoArgs, EvaluateArgs, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "ocr-cnn",
    version = "0.1.0",
    about = "Train a small CNN for character recognition, then classify images."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the use case; the CLI layer only routes and prints.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
            Commands::Demo(args)     => run_demo(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on dataset: {:?}", args.dataset);
    let history = TrainUseCase::new(args.into()).execute()?;

    let best = history
        .augmented
        .iter()
        .chain(&history.plain)
        .map(|m| m.val.accuracy)
        .fold(f64::NAN, f64::max);
    println!("Training complete. Best validation accuracy: {:.2}%", best * 100.0);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(&args.model_dir, &args.model_name)?;
    let score    = use_case.evaluate(&args.dataset, args.test_dir.as_ref(), args.limit, args.seed)?;

    // score, accuracy and error are already logged by the network
    println!("[loss, accuracy, precision, recall, mae] = {:.4?}", score.to_vec());
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(
        &args.model_dir,
        &args.model_name,
        args.classes_from.as_deref(),
    )?;
    for p in use_case.predict(&args.images)? {
        let class = p.class_name.unwrap_or_else(|| p.class.to_string());
        println!("{}: {} ({:.1}%)", p.path.display(), class, p.confidence * 100.0);
    }
    Ok(())
}

fn run_demo(args: DemoArgs) -> Result<()> {
    use crate::application::demo_use_case::DemoUseCase;

    let report = DemoUseCase::new(args.into()).execute()?;

    const SHOWN: usize = 10;
    println!("Predicted: {:?}", &report.predictions[..SHOWN.min(report.predictions.len())]);
    let labels: Vec<String> = report
        .labels
        .iter()
        .take(SHOWN)
        .map(|l| l.map_or_else(|| "?".to_string(), |l| l.to_string()))
        .collect();
    println!("Expected:  [{}]", labels.join(", "));
    println!("Correct:   {}/{}", report.correct(), report.predictions.len());
    println!("[loss, accuracy, precision, recall, mae] = {:.4?}", report.score.to_vec());
    for path in &report.plots {
        println!("Plot written: {}", path.display());
    }
    Ok(())
}
