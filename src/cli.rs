//! Command-line interface definitions and argument parsing

use clap::{Parser, Subcommand};

pub const DEFAULT_ARTIFACTS_PATH: &str = "outputs/churn_model_artifacts.bin";

/// Customer churn prediction: offline training pipeline and serving
#[derive(Parser, Debug)]
#[command(name = "churnforge", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full offline pipeline and persist the artifact bundle
    Train {
        /// Path to the training CSV
        #[arg(short, long, default_value = "data/telco-customer-churn.csv")]
        input: String,

        /// Output path for the artifact bundle
        #[arg(short, long, default_value = DEFAULT_ARTIFACTS_PATH)]
        artifacts: String,

        /// Held-out test fraction for the stratified split
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,

        /// Seed for every shuffled split
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Cross-validation fold count
        #[arg(long, default_value_t = 5)]
        folds: usize,

        /// Skip the hyperparameter search and keep the default configuration
        #[arg(long, default_value_t = false)]
        skip_tuning: bool,
    },

    /// Score one customer from a JSON record
    Predict {
        /// Path to the artifact bundle
        #[arg(short, long, default_value = DEFAULT_ARTIFACTS_PATH)]
        artifacts: String,

        /// Path to a JSON file with one customer record; stdin when omitted
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Load the artifact bundle and serve predictions over HTTP
    Serve {
        /// Path to the artifact bundle
        #[arg(short, long, default_value = DEFAULT_ARTIFACTS_PATH)]
        artifacts: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["churnforge", "train"]).unwrap();
        match cli.command {
            Commands::Train {
                input,
                artifacts,
                test_size,
                seed,
                folds,
                skip_tuning,
            } => {
                assert_eq!(input, "data/telco-customer-churn.csv");
                assert_eq!(artifacts, DEFAULT_ARTIFACTS_PATH);
                assert_eq!(test_size, 0.2);
                assert_eq!(seed, 42);
                assert_eq!(folds, 5);
                assert!(!skip_tuning);
            }
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn test_serve_port_override() {
        let cli = Cli::try_parse_from(["churnforge", "serve", "--port", "9001"]).unwrap();
        match cli.command {
            Commands::Serve { port, .. } => assert_eq!(port, 9001),
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn test_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["churnforge"]).is_err());
    }
}
