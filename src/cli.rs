use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}

/// Rinkside diagnostics
///
/// Runs one operation of the fantasy hockey data layer against the configured
/// providers and prints the result as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(styles = get_styles())]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Read configuration from this TOML file instead of the default location
    #[arg(long = "config", global = true, value_name = "PATH", help_heading = "Configuration")]
    pub config_path: Option<String>,

    /// Write logs to this file instead of the default log directory
    #[arg(long = "log-file", global = true, value_name = "PATH", help_heading = "Debug")]
    pub log_file: Option<String>,

    /// Also log to stderr, at debug level
    #[arg(long = "debug", global = true, help_heading = "Debug")]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Probe every provider and report status, latency and cache occupancy
    Health,
    /// List NHL teams, falling back to the static directory when the API is down
    Teams,
    /// Show current NHL standings
    Standings,
    /// Search NHL players by name
    Search {
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the merged news feed
    News {
        #[arg(long, default_value_t = 15)]
        limit: usize,
        /// Only items of this type (injury, return, contract, performance, milestone, general)
        #[arg(long = "type", value_name = "TYPE")]
        news_type: Option<String>,
        /// Only items about this team abbreviation
        #[arg(long)]
        team: Option<String>,
    },
    /// Print the fantasy provider authorization URL
    LoginUrl,
    /// Exchange an authorization code from the OAuth redirect
    Callback {
        code: String,
        /// `state` parameter from the redirect, checked against the pending login
        #[arg(long)]
        state: Option<String>,
    },
    /// Forget the stored fantasy session
    Logout,
    /// Show per-provider request budget usage
    RateLimits,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_defaults_limit() {
        let args = Args::try_parse_from(["rinkside", "search", "mcdavid"]).unwrap();
        assert_eq!(
            args.command,
            Command::Search {
                query: "mcdavid".to_string(),
                limit: 20
            }
        );
        assert!(!args.debug);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "rinkside",
            "news",
            "--type",
            "injury",
            "--debug",
            "--config",
            "/tmp/rinkside.toml",
        ])
        .unwrap();
        assert!(args.debug);
        assert_eq!(args.config_path.as_deref(), Some("/tmp/rinkside.toml"));
        assert!(matches!(
            args.command,
            Command::News { limit: 15, news_type: Some(ref t), team: None } if t == "injury"
        ));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Args::try_parse_from(["rinkside"]).is_err());
    }
}
