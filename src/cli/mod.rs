//! Command-line interface
//!
//! The pipeline takes no arguments; only `--help` and `--version` are accepted.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "sample-model")]
#[command(author, version, about = "Train and evaluate a random forest and a feed-forward network on data/sample_dataset.csv", long_about = None)]
pub struct Cli {}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_accepts_no_args() {
        Cli::command().debug_assert();
        assert!(Cli::try_parse_from(["sample-model"]).is_ok());
    }

    #[test]
    fn test_cli_rejects_unknown_args() {
        assert!(Cli::try_parse_from(["sample-model", "--epochs", "3"]).is_err());
        assert!(Cli::try_parse_from(["sample-model", "data.csv"]).is_err());
    }
}
