//! ChurnForge: customer churn prediction CLI
//!
//! This is the main entrypoint that orchestrates the offline training
//! pipeline, one-off predictions, and the HTTP prediction service.

use anyhow::{Context, Result};
use churnforge::evaluate::{classification_report, cross_validate, mean, roc_auc_score, std_dev};
use churnforge::{
    assemble, load_training_data, stratified_split, tuning, Cli, Commands, CustomerRecord,
    ChurnPipeline, FeatureRow, LogisticRegression, ModelArtifacts, PredictionService,
    TenureBucketizer, TrainingData,
};
use clap::Parser;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match cli.command {
        Commands::Train {
            input,
            artifacts,
            test_size,
            seed,
            folds,
            skip_tuning,
        } => run_train(
            &input,
            &artifacts,
            test_size,
            seed,
            folds,
            skip_tuning,
            cli.verbose,
        ),
        Commands::Predict { artifacts, input } => run_predict(&artifacts, input.as_deref()),
        Commands::Serve { artifacts, port } => run_serve(&artifacts, port),
    }
}

/// Run the one-shot offline batch job: any stage failure aborts the run and
/// no artifact bundle is written.
fn run_train(
    input: &str,
    artifacts_path: &str,
    test_size: f64,
    seed: u64,
    folds: usize,
    skip_tuning: bool,
    verbose: bool,
) -> Result<()> {
    println!("=== Training Pipeline ===\n");
    let start_time = Instant::now();

    // Step 1: load and clean the data
    if verbose {
        println!("Step 1: Loading and cleaning data");
        println!("  Input file: {input}");
    }
    let data = load_training_data(input)?;
    let positives = data.labels.iter().filter(|l| **l >= 0.5).count();
    println!(
        "✓ Data loaded: {} customers ({} churned)",
        data.len(),
        positives
    );

    // Step 2: stratified split, then the shared feature path
    let (train_idx, test_idx) = stratified_split(&data.labels, test_size, seed);
    let bucketizer = TenureBucketizer::new();
    let (train_rows, train_labels) = take_rows(&data, &train_idx, &bucketizer);
    let (test_rows, test_labels) = take_rows(&data, &test_idx, &bucketizer);
    if verbose {
        println!("\nStep 2: Stratified split");
        println!("  Train rows: {}", train_rows.len());
        println!("  Test rows:  {}", test_rows.len());
    }

    // Step 3: cross-validate the default configuration (observational)
    let config = LogisticRegression::default();
    let cv_start = Instant::now();
    let aucs = cross_validate(&train_rows, &train_labels, &config, folds, seed)?;
    println!(
        "\nROC-AUC CV: {:.3} ± {:.3} ({} folds, {:.2}s)",
        mean(&aucs),
        std_dev(&aucs),
        folds,
        cv_start.elapsed().as_secs_f64()
    );

    // Step 4: fit on the full training set, evaluate once on the test set
    let pipeline = ChurnPipeline::fit(&train_rows, &train_labels, &config)?;
    report_test_metrics("Baseline", &pipeline, &test_rows, &test_labels)?;

    // Step 5: hyperparameter search, re-scored by the same ranking metric
    let final_pipeline = if skip_tuning {
        pipeline
    } else {
        println!("\nTuning hyperparameters...");
        let tune_start = Instant::now();
        let outcome = tuning::tune(&train_rows, &train_labels, &config, folds, seed)?;
        println!(
            "Best params: C={}, penalty={} (CV ROC-AUC {:.4}, {:.2}s)",
            outcome.best.c,
            outcome.best.penalty,
            outcome.best_score,
            tune_start.elapsed().as_secs_f64()
        );

        // retrain the winning configuration on the full training set
        let tuned = ChurnPipeline::fit(&train_rows, &train_labels, &outcome.best)?;
        report_test_metrics("Tuned", &tuned, &test_rows, &test_labels)?;
        tuned
    };

    // Step 6: persist the bundle
    let bundle = ModelArtifacts {
        pipeline: final_pipeline,
        tenure_bucket: bucketizer,
    };
    bundle.save(Path::new(artifacts_path))?;
    println!("\n=== Pipeline Complete ===");
    println!("Artifact bundle saved to: {artifacts_path}");
    println!(
        "Total processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Score one customer from a JSON file or stdin.
fn run_predict(artifacts_path: &str, input: Option<&str>) -> Result<()> {
    let service = PredictionService::load(Path::new(artifacts_path))?;

    let payload = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read customer record from {path}"))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let record: CustomerRecord =
        serde_json::from_str(&payload).context("customer record is not valid JSON")?;

    let result = service.predict(&record)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Load the bundle, then serve; the listener only binds after the load
/// succeeded, so a bad bundle never reaches the serving state.
fn run_serve(artifacts_path: &str, port: u16) -> Result<()> {
    let service = Arc::new(PredictionService::load(Path::new(artifacts_path))?);

    println!("Prediction service starting on http://0.0.0.0:{port}");
    println!("Endpoints:");
    println!("  - Predict: POST http://localhost:{port}/predict");
    println!("  - Health:  GET  http://localhost:{port}/healthz");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(churnforge::serve::run(service, port));
    Ok(())
}

/// Assemble the feature rows and labels for a set of record indices.
fn take_rows(
    data: &TrainingData,
    indices: &[usize],
    bucketizer: &TenureBucketizer,
) -> (Vec<FeatureRow>, Vec<f64>) {
    let rows = indices
        .iter()
        .map(|&i| assemble(&data.records[i], bucketizer))
        .collect();
    let labels = indices.iter().map(|&i| data.labels[i]).collect();
    (rows, labels)
}

fn report_test_metrics(
    label: &str,
    pipeline: &ChurnPipeline,
    test_rows: &[FeatureRow],
    test_labels: &[f64],
) -> Result<()> {
    let scores = pipeline.predict_proba_batch(test_rows).to_vec();
    let auc = roc_auc_score(test_labels, &scores)?;
    let report = classification_report(test_labels, &scores);

    println!("\n{label} test ROC-AUC: {auc:.3}");
    println!("  accuracy: {:.3}", report.accuracy);
    println!(
        "  churn=No : precision {:.3}  recall {:.3}  f1 {:.3}  support {}",
        report.negative.precision,
        report.negative.recall,
        report.negative.f1,
        report.negative.support
    );
    println!(
        "  churn=Yes: precision {:.3}  recall {:.3}  f1 {:.3}  support {}",
        report.positive.precision,
        report.positive.recall,
        report.positive.f1,
        report.positive.support
    );
    Ok(())
}
