const EXAMPLES: &str = "\
Examples:
  $ marktguru login
  $ marktguru search raw \"kellys OR \\\"erdnuss snips\\\"\"
  $ marktguru search build --term kellys --phrase \"erdnuss snips\" --or manner --explain
  $ marktguru search syntax";

#[derive(clap::Parser, Debug)]
#[command(
    name = "marktguru",
    author,
    version,
    about = "CLI for Austrian Marktguru supermarket deals",
    long_about = None,
    after_help = EXAMPLES
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output JSON (for all commands)
    #[arg(short = 'j', long, global = true, default_value_t = false)]
    pub json: bool,

    /// Enable detailed debug logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Extract API key from marktguru.at via HTTP
    Login,

    /// Search for product deals using the Marktguru query syntax
    Search {
        #[command(subcommand)]
        command: Option<SearchCommand>,
    },

    /// Set default ZIP code for searches
    SetZip {
        /// ZIP code, e.g. 1010
        code: String,
    },

    /// Show current configuration
    Config,
}

#[derive(clap::Subcommand, Debug)]
pub enum SearchCommand {
    /// Search using a raw query string
    Raw {
        query: String,

        #[command(flatten)]
        filters: SearchArgs,
    },

    /// Build a query from structured flags
    Build {
        /// Add a term
        #[arg(long = "term", value_name = "VALUE")]
        terms: Vec<String>,

        /// Add an exact phrase
        #[arg(long = "phrase", value_name = "VALUE")]
        phrases: Vec<String>,

        /// Add a wildcard term (e.g., kell*)
        #[arg(long = "wildcard", value_name = "VALUE")]
        wildcards: Vec<String>,

        /// Add a term to the OR group
        #[arg(long = "or", value_name = "VALUE")]
        ors: Vec<String>,

        /// Add a raw group (wrapped in parentheses)
        #[arg(long = "group", value_name = "VALUE")]
        groups: Vec<String>,

        /// Print the built query to stderr
        #[arg(long, default_value_t = false)]
        explain: bool,

        #[command(flatten)]
        filters: SearchArgs,
    },

    /// Show supported query syntax
    Syntax,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// ZIP code for location-based results
    #[arg(short = 'z', long = "zip", value_name = "CODE")]
    pub zip: Option<String>,

    /// Number of results (default: 10)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: Option<u32>,

    /// Filter by retailer (e.g., SPAR, BILLA, HOFER)
    #[arg(short = 'r', long)]
    pub retailer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_flags_repeat() {
        let cli = Cli::try_parse_from([
            "marktguru", "search", "build", "--term", "kellys", "--or", "soja", "--or", "hafer",
            "-n", "5", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Some(Commands::Search {
                command: Some(SearchCommand::Build { terms, ors, filters, .. }),
            }) => {
                assert_eq!(terms, vec!["kellys"]);
                assert_eq!(ors, vec!["soja", "hafer"]);
                assert_eq!(filters.limit, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_limit_must_be_positive() {
        assert!(Cli::try_parse_from(["marktguru", "search", "raw", "milch", "-n", "0"]).is_err());
    }
}
