use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tasky",
    version,
    about = "Tasky: kanban board client for a remote task service",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "taskyrc", global = true)]
    pub taskyrc: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Reload, correct overdue tasks and print the three lanes.
    Board,
    /// Search titles, descriptions and categories.
    Search {
        query: String,
        /// Ask the service instead of filtering the full list locally.
        #[arg(long)]
        remote: bool,
    },
    Show {
        id: u64,
    },
    Add(TaskArgs),
    Edit {
        id: u64,
        #[command(flatten)]
        changes: EditArgs,
    },
    /// Move a task to another lane.
    Move {
        id: u64,
        lane: String,
    },
    Delete {
        id: u64,
    },
    /// Run one overdue correction pass and report what changed.
    Sync,
}

#[derive(Args, Debug, Clone)]
pub struct TaskArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// HI, ME or LO.
    #[arg(long, default_value = "ME")]
    pub priority: String,
    /// `YYYY-MM-DDTHH:MM` (UTC) or RFC 3339.
    #[arg(long)]
    pub due: String,
    #[arg(long, default_value = "")]
    pub category: String,
    /// IP, CO or OV.
    #[arg(long, default_value = "IP")]
    pub status: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` / `rc.key:value` overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_extracted() {
        let pre = preprocess_args(&args(&[
            "tasky",
            "rc.api.base_url=http://tasks.test/",
            "move",
            "rc.display.timezone:UTC",
            "4",
            "CO",
        ]))
        .expect("preprocess");

        assert_eq!(pre.cleaned_args, args(&["tasky", "move", "4", "CO"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.api.base_url".to_string(), "http://tasks.test/".to_string()),
                ("rc.display.timezone".to_string(), "UTC".to_string()),
            ]
        );
    }

    #[test]
    fn subcommands_parse_with_global_flags() {
        let cli = GlobalCli::try_parse_from(args(&[
            "tasky", "-v", "--rc", "filter.category=home", "search", "rent", "--remote",
        ]))
        .expect("parse");
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.rc_overrides.len(), 1);
        assert!(matches!(
            cli.command,
            Some(Command::Search { ref query, remote: true }) if query == "rent"
        ));
    }
}
