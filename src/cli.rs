use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for prefset
#[derive(Parser, Debug)]
#[command(name = "prefset", version)]
#[command(about = "Validate and normalize browser user.js preference files")]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a preference file against the known schema
    ///
    /// Exits 1 when any error-level finding is reported.
    Validate {
        /// Preference file to check
        path: PathBuf,

        /// TOML file describing additional keys
        #[arg(long, env = "PREFSET_SCHEMA")]
        schema: Option<PathBuf>,

        /// Treat warnings (unknown keys, overrides) as failures
        #[arg(long)]
        deny_warnings: bool,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        output: ReportFormat,
    },

    /// Rewrite a preference file with normalized spacing
    Format {
        /// Preference file to rewrite
        path: PathBuf,

        /// Order directives by key
        #[arg(long)]
        sort: bool,

        /// Exit 1 if the file is not already formatted; write nothing
        #[arg(long, conflicts_with = "stdout")]
        check: bool,

        /// Print the formatted file instead of rewriting it
        #[arg(long)]
        stdout: bool,
    },

    /// Print preferences whose keys match glob patterns
    Query {
        /// Preference file to read
        path: PathBuf,

        /// Glob patterns, e.g. "network.*" (any match is kept)
        #[arg(required = true)]
        patterns: Vec<String>,

        /// TOML file describing additional keys (used for explanations)
        #[arg(long, env = "PREFSET_SCHEMA")]
        schema: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputType::JsonObject)]
        output_type: OutputType,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    /// One line per finding plus a summary
    Text,
    /// Machine-readable JSON report
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputType {
    /// Object mapping keys to values
    JsonObject,
    /// Array of entries with explanations
    JsonArray,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_validate() {
        let cli = Cli::parse_from(["prefset", "validate", "user.js", "--deny-warnings"]);
        match cli.command {
            Commands::Validate {
                path,
                deny_warnings,
                output,
                ..
            } => {
                assert_eq!(path, PathBuf::from("user.js"));
                assert!(deny_warnings);
                assert_eq!(output, ReportFormat::Text);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_format_check_conflicts_with_stdout() {
        let result = Cli::try_parse_from(["prefset", "format", "user.js", "--check", "--stdout"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_query_requires_pattern() {
        assert!(Cli::try_parse_from(["prefset", "query", "user.js"]).is_err());
        let cli = Cli::parse_from([
            "prefset",
            "query",
            "user.js",
            "network.*",
            "--output-type",
            "json-array",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Query {
                output_type: OutputType::JsonArray,
                ..
            }
        ));
    }
}
