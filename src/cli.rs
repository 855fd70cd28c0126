//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Find, rank and download research papers on a topic, then analyze their sections.
///
/// Without a subcommand, paperscout searches Semantic Scholar for TOPIC,
/// selects the most relevant papers and downloads their open-access PDFs.
#[derive(Parser, Debug)]
#[command(name = "paperscout")]
#[command(author, version, about)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub retrieve: RetrieveArgs,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect and analyze sections of downloaded PDFs or page-marked text files
    Analyze(AnalyzeArgs),
}

/// Logging and config flags shared by every mode.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file (default: $XDG_CONFIG_HOME/paperscout/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments of the default search-select-download run.
#[derive(Args, Debug, Clone, Default)]
pub struct RetrieveArgs {
    /// Research topic to search for
    #[arg(value_name = "TOPIC")]
    pub topic: Option<String>,

    /// Number of papers to select (clamped to 1-20)
    #[arg(short = 'n', long)]
    pub max_papers: Option<usize>,

    /// Sample randomly from a relevance-ranked candidate pool
    #[arg(long)]
    pub randomize: bool,

    /// Fraction of extra candidates considered when randomizing (clamped to 0-1)
    #[arg(long, allow_negative_numbers = true)]
    pub diversity: Option<f64>,

    /// Seed for reproducible random selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of search results retrieved before selection (1-1000)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=1000))]
    pub search_limit: Option<u16>,

    /// Root directory for downloaded papers and reports
    #[arg(short = 'd', long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Maximum concurrent downloads (1-16)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub concurrency: Option<u8>,

    /// Maximum attempts per request for transient failures (0-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: Option<u8>,

    /// Minimum delay between requests in milliseconds (0 to disable, max 60000)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub rate_limit: Option<u64>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments of `paperscout analyze`.
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// PDF or .txt files to analyze
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Where section and analysis files are written (default: <data-dir>/section_analysis)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Data directory holding selected_papers.json
    #[arg(short = 'd', long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl Cli {
    /// Flags shared by both modes, from whichever mode was invoked.
    #[must_use]
    pub fn common(&self) -> &CommonArgs {
        match &self.command {
            Some(Command::Analyze(args)) => &args.common,
            None => &self.retrieve.common,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    // ==================== Retrieve Args Tests ====================

    #[test]
    fn test_cli_topic_only_parses_successfully() {
        let cli = Cli::try_parse_from(["paperscout", "protein folding"]).unwrap();
        assert!(cli.command.is_none());
        let args = &cli.retrieve;
        assert_eq!(args.topic.as_deref(), Some("protein folding"));
        assert!(args.max_papers.is_none());
        assert!(!args.randomize);
        assert!(args.seed.is_none());
        assert_eq!(args.common.verbose, 0);
        assert!(!args.common.quiet);
    }

    #[test]
    fn test_cli_no_topic_parses_to_none() {
        let cli = Cli::try_parse_from(["paperscout"]).unwrap();
        assert!(cli.retrieve.topic.is_none());
    }

    #[test]
    fn test_cli_selection_flags() {
        let cli = Cli::try_parse_from([
            "paperscout",
            "graph neural networks",
            "--max-papers",
            "7",
            "--randomize",
            "--diversity",
            "0.5",
            "--seed",
            "42",
            "--search-limit",
            "250",
        ])
        .unwrap();
        let args = cli.retrieve;
        assert_eq!(args.max_papers, Some(7));
        assert!(args.randomize);
        assert_eq!(args.diversity, Some(0.5));
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.search_limit, Some(250));
    }

    #[test]
    fn test_cli_out_of_range_max_papers_is_accepted_for_clamping() {
        let cli = Cli::try_parse_from(["paperscout", "topic", "-n", "50"]).unwrap();
        assert_eq!(cli.retrieve.max_papers, Some(50));
    }

    #[test]
    fn test_cli_negative_diversity_is_accepted_for_clamping() {
        let cli = Cli::try_parse_from(["paperscout", "topic", "--diversity", "-0.2"]).unwrap();
        assert_eq!(cli.retrieve.diversity, Some(-0.2));
    }

    #[test]
    fn test_cli_concurrency_out_of_range() {
        let result = Cli::try_parse_from(["paperscout", "topic", "-c", "0"]);
        assert!(result.is_err());
        let result = Cli::try_parse_from(["paperscout", "topic", "-c", "17"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rate_limit_and_retries() {
        let cli =
            Cli::try_parse_from(["paperscout", "topic", "-l", "0", "-r", "5"]).unwrap();
        assert_eq!(cli.retrieve.rate_limit, Some(0));
        assert_eq!(cli.retrieve.max_retries, Some(5));

        assert!(Cli::try_parse_from(["paperscout", "topic", "-l", "60001"]).is_err());
        assert!(Cli::try_parse_from(["paperscout", "topic", "-r", "11"]).is_err());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let cli = Cli::try_parse_from(["paperscout", "topic", "-vv"]).unwrap();
        assert_eq!(cli.common().verbose, 2);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["paperscout", "topic", "-q", "-v"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ArgumentConflict
        );
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Cli::try_parse_from(["paperscout", "--help"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }

    // ==================== Analyze Args Tests ====================

    #[test]
    fn test_cli_analyze_subcommand() {
        let cli = Cli::try_parse_from([
            "paperscout",
            "analyze",
            "a.pdf",
            "b.txt",
            "--output-dir",
            "out",
            "-q",
        ])
        .unwrap();
        let Some(Command::Analyze(args)) = &cli.command else {
            panic!("expected analyze subcommand");
        };
        assert_eq!(args.files, vec![PathBuf::from("a.pdf"), PathBuf::from("b.txt")]);
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert!(cli.common().quiet);
    }

    #[test]
    fn test_cli_analyze_requires_files() {
        let result = Cli::try_parse_from(["paperscout", "analyze"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }
}
