//! Training data loading, cleaning and splitting using Polars
//!
//! Cleaning follows the offline contract exactly: `TotalCharges` is coerced
//! to numeric with unparseable values becoming missing, zero-tenure rows are
//! dropped before anything else looks at the data, missing `TotalCharges`
//! are imputed with the mean over the retained rows, and the target string
//! is encoded to 0/1.

use crate::error::ChurnError;
use crate::record::CustomerRecord;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

/// Columns the training CSV must contain.
pub const REQUIRED_COLUMNS: [&str; 21] = [
    "customerID",
    "gender",
    "SeniorCitizen",
    "Partner",
    "Dependents",
    "tenure",
    "PhoneService",
    "MultipleLines",
    "InternetService",
    "OnlineSecurity",
    "OnlineBackup",
    "DeviceProtection",
    "TechSupport",
    "StreamingTV",
    "StreamingMovies",
    "Contract",
    "PaperlessBilling",
    "PaymentMethod",
    "MonthlyCharges",
    "TotalCharges",
    "Churn",
];

/// Cleaned training set: typed records plus 0/1 churn labels, row-aligned.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub records: Vec<CustomerRecord>,
    pub labels: Vec<f64>,
}

impl TrainingData {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load the churn CSV, clean it and extract typed records.
pub fn load_training_data(path: &str) -> crate::Result<TrainingData> {
    let raw = LazyCsvReader::new(path).finish()?.collect()?;

    let present = raw.get_column_names();
    for required in REQUIRED_COLUMNS {
        if !present.contains(&required) {
            return Err(ChurnError::DataQuality(format!(
                "training input is missing required column {required}"
            ))
            .into());
        }
    }
    let total_rows = raw.height();

    let df = raw
        .lazy()
        .with_columns([
            // invalid parses become missing, to be imputed below
            col("TotalCharges").cast(DataType::Float64),
            col("MonthlyCharges").cast(DataType::Float64),
            col("tenure").cast(DataType::Int64),
            col("SeniorCitizen").cast(DataType::Int64),
        ])
        // zero-tenure rows have not completed a billing cycle
        .filter(col("tenure").gt(0))
        .with_columns([
            col("TotalCharges").fill_null(col("TotalCharges").mean()),
            when(col("Churn").eq(lit("Yes")))
                .then(lit(1i64))
                .otherwise(lit(0i64))
                .alias("Churn"),
        ])
        .collect()?;

    if df.height() == 0 {
        return Err(ChurnError::DataQuality(
            "no rows remain after cleaning the training input".to_string(),
        )
        .into());
    }
    info!(
        kept = df.height(),
        dropped = total_rows - df.height(),
        "training input cleaned"
    );

    let gender = str_column(&df, "gender")?;
    let senior_citizen = i64_column(&df, "SeniorCitizen")?;
    let partner = str_column(&df, "Partner")?;
    let dependents = str_column(&df, "Dependents")?;
    let tenure = i64_column(&df, "tenure")?;
    let phone_service = str_column(&df, "PhoneService")?;
    let multiple_lines = str_column(&df, "MultipleLines")?;
    let internet_service = str_column(&df, "InternetService")?;
    let online_security = str_column(&df, "OnlineSecurity")?;
    let online_backup = str_column(&df, "OnlineBackup")?;
    let device_protection = str_column(&df, "DeviceProtection")?;
    let tech_support = str_column(&df, "TechSupport")?;
    let streaming_tv = str_column(&df, "StreamingTV")?;
    let streaming_movies = str_column(&df, "StreamingMovies")?;
    let contract = str_column(&df, "Contract")?;
    let paperless_billing = str_column(&df, "PaperlessBilling")?;
    let payment_method = str_column(&df, "PaymentMethod")?;
    let monthly_charges = f64_column(&df, "MonthlyCharges")?;
    let total_charges = f64_column(&df, "TotalCharges")?;
    let churn = i64_column(&df, "Churn")?;

    let mut records = Vec::with_capacity(df.height());
    let mut labels = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        records.push(CustomerRecord {
            gender: gender[i].clone(),
            senior_citizen: senior_citizen[i],
            partner: partner[i].clone(),
            dependents: dependents[i].clone(),
            tenure: tenure[i],
            phone_service: phone_service[i].clone(),
            multiple_lines: multiple_lines[i].clone(),
            internet_service: internet_service[i].clone(),
            online_security: online_security[i].clone(),
            online_backup: online_backup[i].clone(),
            device_protection: device_protection[i].clone(),
            tech_support: tech_support[i].clone(),
            streaming_tv: streaming_tv[i].clone(),
            streaming_movies: streaming_movies[i].clone(),
            contract: contract[i].clone(),
            paperless_billing: paperless_billing[i].clone(),
            payment_method: payment_method[i].clone(),
            monthly_charges: monthly_charges[i],
            total_charges: total_charges[i],
        });
        labels.push(churn[i] as f64);
    }

    Ok(TrainingData { records, labels })
}

/// Stratified train/test index split: each class keeps the requested test
/// fraction, shuffled with a fixed seed so the split is reproducible.
/// Returns `(train_indices, test_indices)`.
pub fn stratified_split(
    labels: &[f64],
    test_size: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [0.0, 1.0] {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();
        indices.shuffle(&mut rng);
        let n_test = (indices.len() as f64 * test_size).round() as usize;
        test.extend(indices.iter().take(n_test));
        train.extend(indices.iter().skip(n_test));
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

fn column_with_no_nulls<'a>(df: &'a DataFrame, name: &str) -> crate::Result<&'a Series> {
    let series = df.column(name)?;
    if series.null_count() > 0 {
        return Err(ChurnError::DataQuality(format!(
            "column {name} has missing values after cleaning"
        ))
        .into());
    }
    Ok(series)
}

fn str_column(df: &DataFrame, name: &str) -> crate::Result<Vec<String>> {
    Ok(column_with_no_nulls(df, name)?
        .utf8()?
        .into_no_null_iter()
        .map(str::to_string)
        .collect())
}

fn i64_column(df: &DataFrame, name: &str) -> crate::Result<Vec<i64>> {
    Ok(column_with_no_nulls(df, name)?
        .i64()?
        .into_no_null_iter()
        .collect())
}

fn f64_column(df: &DataFrame, name: &str) -> crate::Result<Vec<f64>> {
    Ok(column_with_no_nulls(df, name)?
        .f64()?
        .into_no_null_iter()
        .collect())
}
