use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hotboard", about = "Hotboard — trending hot lists from many platforms in one place")]
pub struct Cli {
    /// Path to configuration file (defaults are used if it does not exist)
    #[arg(long, short, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the backend and serve the hot list over HTTP (default)
    Run,

    /// Fetch the hot list once and print it
    Fetch {
        /// Only show these platforms (repeatable)
        #[arg(long = "platform", short)]
        platforms: Vec<String>,

        /// Case-insensitive search over titles and platform names
        #[arg(long, short)]
        query: Option<String>,

        /// Maximum number of items to print
        #[arg(long, short)]
        limit: Option<usize>,

        /// Keep source order instead of sorting hottest first
        #[arg(long)]
        source_order: bool,

        /// Print the raw fetch result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_daemon() {
        let cli = Cli::try_parse_from(["hotboard"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("config.toml"));
    }

    #[test]
    fn fetch_flags_parse() {
        let cli = Cli::try_parse_from([
            "hotboard", "fetch", "-p", "zhihu", "--platform", "weibo", "-q", "rust", "--limit", "5", "--json", "-c",
            "other.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        match cli.command {
            Some(Commands::Fetch {
                platforms,
                query,
                limit,
                source_order,
                json,
            }) => {
                assert_eq!(platforms, vec!["zhihu", "weibo"]);
                assert_eq!(query.as_deref(), Some("rust"));
                assert_eq!(limit, Some(5));
                assert!(!source_order);
                assert!(json);
            }
            _ => panic!("expected fetch subcommand"),
        }
    }
}
