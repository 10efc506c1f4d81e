// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands: `train`, `evaluate`, `predict`
// and `demo`, with all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    datasets::DatasetSource,
    demo_use_case::DemoConfig,
    train_use_case::TrainConfig,
};
use crate::ml::network::{FitOptions, NetworkConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the CNN on MNIST or a folder of labelled images
    Train(TrainArgs),

    /// Score a trained model on a labelled test set
    Evaluate(EvaluateArgs),

    /// Classify image files with a trained model
    Predict(PredictArgs),

    /// Train, predict, evaluate and plot on MNIST (2 epochs)
    Demo(DemoArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// `mnist`, or a directory with one sub-directory per class
    #[arg(long, default_value = "mnist")]
    pub dataset: DatasetSource,

    /// Test images (same class folders); default is a split of --dataset
    #[arg(long)]
    pub test_dir: Option<PathBuf>,

    /// Number of classes; default is derived from the dataset
    #[arg(long)]
    pub classes: Option<usize>,

    /// Total epochs over both phases
    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Directory for weights, config and metrics CSV
    #[arg(long, default_value = "checkpoints")]
    pub model_dir: String,

    #[arg(long, default_value = "no_name")]
    pub model_name: String,

    /// Final epochs trained without augmentation; random (10..50) if omitted
    #[arg(long)]
    pub window_size: Option<usize>,

    #[arg(long, default_value_t = 1337)]
    pub seed: u64,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Continue from an existing checkpoint instead of deleting it
    #[arg(long)]
    pub no_force_retrain: bool,

    /// Print a line per epoch
    #[arg(long)]
    pub verbose: bool,

    /// Where to write the history plots; skipped if omitted
    #[arg(long)]
    pub plot_dir: Option<PathBuf>,

    /// Keep only the first N images of each split
    #[arg(long)]
    pub limit: Option<usize>,

    /// Share of a folder dataset held out for testing when --test-dir is absent
    #[arg(long, default_value_t = 0.2)]
    pub val_fraction: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let network = NetworkConfig {
            epochs:        a.epochs,
            batch_size:    a.batch_size,
            model_dir:     a.model_dir,
            model_name:    a.model_name,
            learning_rate: a.lr,
            // replaced once the dataset is loaded
            ..NetworkConfig::new(a.classes.unwrap_or(0))
        };
        TrainConfig {
            dataset:      a.dataset,
            test_dir:     a.test_dir,
            classes:      a.classes,
            limit:        a.limit,
            val_fraction: a.val_fraction,
            network,
            fit: FitOptions {
                force_retrain: !a.no_force_retrain,
                verbose:       a.verbose,
                window_size:   a.window_size,
                seed:          a.seed,
            },
            plot_dir: a.plot_dir,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "mnist")]
    pub dataset: DatasetSource,

    /// Labelled test folder; overrides the test split of --dataset
    #[arg(long)]
    pub test_dir: Option<PathBuf>,

    #[arg(long, default_value = "checkpoints")]
    pub model_dir: String,

    #[arg(long, default_value = "no_name")]
    pub model_name: String,

    /// Keep a random N images of the test set
    #[arg(long)]
    pub limit: Option<usize>,

    /// Seeds the --limit subset
    #[arg(long, default_value_t = 1337)]
    pub seed: u64,
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Image files to classify
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    #[arg(long, default_value = "checkpoints")]
    pub model_dir: String,

    #[arg(long, default_value = "no_name")]
    pub model_name: String,

    /// Class folder used in training, to print class names
    #[arg(long)]
    pub classes_from: Option<PathBuf>,
}

/// All arguments for the `demo` command
#[derive(Args, Debug)]
pub struct DemoArgs {
    #[arg(long, default_value = "checkpoints")]
    pub model_dir: String,

    #[arg(long, default_value = "plots")]
    pub plot_dir: PathBuf,

    /// Keep only the first N images of each MNIST split
    #[arg(long)]
    pub limit: Option<usize>,
}

impl From<DemoArgs> for DemoConfig {
    fn from(a: DemoArgs) -> Self {
        DemoConfig { model_dir: a.model_dir, plot_dir: a.plot_dir, limit: a.limit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_train_defaults() {
        let cli = TestCli::parse_from(["ocr-cnn", "train"]);
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();

        assert_eq!(cfg.dataset, DatasetSource::Mnist);
        assert_eq!(cfg.network.epochs, 50);
        assert_eq!(cfg.network.batch_size, 128);
        assert_eq!(cfg.network.model_name, "no_name");
        assert!(cfg.fit.force_retrain);
        assert_eq!(cfg.fit.window_size, None);
        assert_eq!(cfg.fit.seed, 1337);
    }

    #[test]
    fn test_train_flags() {
        let cli = TestCli::parse_from([
            "ocr-cnn", "train", "--dataset", "data/letters", "--classes", "26",
            "--window-size", "3", "--no-force-retrain", "--model-name", "letters",
        ]);
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();

        assert_eq!(cfg.dataset, DatasetSource::Folder(PathBuf::from("data/letters")));
        assert_eq!(cfg.classes, Some(26));
        assert_eq!(cfg.fit.window_size, Some(3));
        assert!(!cfg.fit.force_retrain);
        assert_eq!(cfg.network.model_name, "letters");
    }

    #[test]
    fn test_predict_requires_images() {
        assert!(TestCli::try_parse_from(["ocr-cnn", "predict"]).is_err());
    }
}
