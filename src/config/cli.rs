use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cellar-enrich")]
#[command(about = "Price discovery and enrichment for a personal wine cellar")]
pub struct Cli {
    /// TOML configuration file; every section is optional.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a price: marketplace first, then a generative estimate.
    Price {
        #[arg(long)]
        producer: String,

        #[arg(long)]
        vintage: Option<i32>,

        #[arg(long)]
        region: Option<String>,

        #[arg(long, default_value = "standard")]
        bottle_size: String,

        /// Report the quota flag alongside the price.
        #[arg(long)]
        detailed: bool,
    },

    /// Propose additions for a wine record read from a JSON file.
    Enrich {
        #[arg(long)]
        record: PathBuf,

        /// Print the full report instead of only the update set.
        #[arg(long)]
        report: bool,
    },

    /// Read a label photo given as a base64 file.
    Label {
        #[arg(long)]
        image_base64_file: PathBuf,

        #[arg(long, default_value = "image/jpeg")]
        mime: String,

        /// Only producer, name, vintage and colour; no price lookup.
        #[arg(long)]
        quick: bool,

        #[arg(long, default_value = "standard")]
        bottle_size: String,
    },

    /// Suggest food pairings for a wine record read from a JSON file.
    Pairings {
        #[arg(long)]
        record: PathBuf,
    },

    /// Classify a drinking window such as "2024-2030" against the current year.
    DrinkingStatus {
        window: Option<String>,

        #[arg(long)]
        year: Option<i32>,
    },

    /// List the bottle-size catalog.
    Sizes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_price_command() {
        let cli = Cli::parse_from([
            "cellar-enrich",
            "--verbose",
            "price",
            "--producer",
            "Château Margaux",
            "--vintage",
            "2015",
            "--bottle-size",
            "magnum",
        ]);

        assert!(cli.verbose);
        match cli.command {
            Command::Price {
                producer,
                vintage,
                region,
                bottle_size,
                detailed,
            } => {
                assert_eq!(producer, "Château Margaux");
                assert_eq!(vintage, Some(2015));
                assert_eq!(region, None);
                assert_eq!(bottle_size, "magnum");
                assert!(!detailed);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from(["cellar-enrich", "sizes", "--config", "cellar.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("cellar.toml")));
        assert!(matches!(cli.command, Command::Sizes));
    }
}
