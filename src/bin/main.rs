//! ovosvm Command Line Interface
//!
//! Trains one-vs-one SVM classifiers on LibSVM format data, runs
//! cross-validation, and predicts test files.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info};
use ovosvm::core::{Problem, Result, SVMError};
use ovosvm::{api, LibSVMDataset, Model, SVM};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "ovosvm")]
#[command(about = "One-vs-one multi-class Support Vector Machine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and report its training accuracy
    Train(TrainArgs),
    /// Estimate accuracy by k-fold cross-validation
    Cv(CvArgs),
    /// Train on one file and predict the examples of another
    Predict(PredictArgs),
}

#[derive(Args, Clone, Debug)]
struct TrainingArgs {
    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Convergence tolerance
    #[arg(short, long, default_value = "0.001")]
    epsilon: f64,

    /// Kernel cache size in MB
    #[arg(long, default_value = "100")]
    cache_size: usize,

    /// Disable the shrinking heuristic
    #[arg(long)]
    no_shrinking: bool,

    /// Train probability estimates
    #[arg(short, long)]
    probability: bool,

    /// Class weight as LABEL:WEIGHT (multiplies C for that class), repeatable
    #[arg(short, long = "weight", value_parser = parse_class_weight)]
    weights: Vec<(i32, f64)>,

    /// Seed for the random shuffles
    #[arg(long)]
    seed: Option<u64>,
}

impl TrainingArgs {
    fn to_svm(&self) -> SVM {
        let mut svm = SVM::new()
            .with_c(self.c)
            .with_epsilon(self.epsilon)
            .with_cache_size(self.cache_size.saturating_mul(1024 * 1024)) // Convert MB to bytes
            .with_shrinking(!self.no_shrinking)
            .with_probability(self.probability);
        for &(label, weight) in &self.weights {
            svm = svm.with_class_weight(label, weight);
        }
        if let Some(seed) = self.seed {
            svm = svm.with_seed(seed);
        }
        svm
    }
}

fn parse_class_weight(s: &str) -> std::result::Result<(i32, f64), String> {
    let (label, weight) = s
        .split_once(':')
        .ok_or_else(|| format!("expected LABEL:WEIGHT, got '{s}'"))?;
    let label = label
        .parse::<i32>()
        .map_err(|_| format!("invalid class label '{label}'"))?;
    let weight = weight
        .parse::<f64>()
        .map_err(|_| format!("invalid weight '{weight}'"))?;
    Ok((label, weight))
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (LibSVM format)
    #[arg(long)]
    data: PathBuf,

    #[command(flatten)]
    training: TrainingArgs,
}

#[derive(Args)]
struct CvArgs {
    /// Data file (LibSVM format)
    #[arg(long)]
    data: PathBuf,

    /// Number of folds
    #[arg(short = 'k', long, default_value = "5")]
    folds: usize,

    #[command(flatten)]
    training: TrainingArgs,
}

#[derive(Args)]
struct PredictArgs {
    /// Training data file (LibSVM format)
    #[arg(long)]
    data: PathBuf,

    /// Test data file (LibSVM format)
    #[arg(long)]
    test: PathBuf,

    /// Output predictions file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    training: TrainingArgs,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Cv(args) => cv_command(args),
        Commands::Predict(args) => predict_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn load_problem(path: &Path) -> Result<Problem> {
    info!("Loading dataset from: {path:?}");
    let problem = LibSVMDataset::from_file(path)?.into_problem()?;
    info!(
        "Loaded {} samples with {} dimensions",
        problem.len(),
        problem.dim()
    );
    Ok(problem)
}

fn train_command(args: TrainArgs) -> Result<()> {
    let problem = load_problem(&args.data)?;
    let model = args.training.to_svm().train(&problem)?;
    info!("Training completed successfully");

    let accuracy = api::evaluate(&model, &problem)?;
    print_model_summary(&model);
    println!("Training accuracy: {:.2}%", accuracy * 100.0);
    Ok(())
}

fn print_model_summary(model: &Model) {
    println!("Classes: {}", model.nr_class());
    println!("Labels: {:?}", model.labels());
    println!("Support vectors per class: {:?}", model.n_sv());
    println!("Total support vectors: {}", model.n_support_vectors());
    println!("Probability model: {}", model.has_probability_model());
}

fn cv_command(args: CvArgs) -> Result<()> {
    let problem = load_problem(&args.data)?;
    info!("Running {}-fold cross-validation", args.folds);

    let predicted = args.training.to_svm().cross_validate(&problem, args.folds)?;
    let accuracy = api::accuracy(&predicted, problem.labels());
    let correct = (accuracy * problem.len() as f64).round() as usize;
    println!(
        "Cross Validation Accuracy = {:.4}% ({correct}/{})",
        accuracy * 100.0,
        problem.len()
    );
    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    let problem = load_problem(&args.data)?;
    let model = args.training.to_svm().train(&problem)?;
    info!(
        "Making predictions using model with {} support vectors",
        model.n_support_vectors()
    );

    let test = LibSVMDataset::from_file(&args.test)?;
    if test.dim() > problem.dim() {
        return Err(SVMError::DimensionMismatch {
            expected: problem.dim(),
            actual: test.dim(),
        });
    }
    let test = test.with_dim(problem.dim());
    let features = test.dense_features();

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    if model.has_probability_model() {
        let labels: Vec<String> = model.labels().iter().map(i32::to_string).collect();
        writeln!(out, "labels {}", labels.join(" "))?;
    }

    let mut predicted = Vec::with_capacity(features.len());
    for x in &features {
        let (label, estimates) = api::predict_probability(&model, x)?;
        match estimates {
            Some(estimates) => {
                let estimates: Vec<String> =
                    estimates.iter().map(|p| format!("{p:.6}")).collect();
                writeln!(out, "{label} {}", estimates.join(" "))?;
            }
            None => writeln!(out, "{label}")?,
        }
        predicted.push(label);
    }
    out.flush()?;

    if let Some(path) = &args.output {
        info!("Predictions saved to: {path:?}");
    }

    let accuracy = api::accuracy(&predicted, test.labels());
    info!("Accuracy = {:.4}%", accuracy * 100.0);
    Ok(())
}
