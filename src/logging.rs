use std::{env, fmt::Display};

use colored::Colorize;
use log::{Level, LevelFilter};

/// Which records pass, split between songvote's own crates and everything else
#[derive(Debug, PartialEq, Eq)]
struct LogLevels {
    local: LevelFilter,
    /// sqlx and hyper are chatty below warnings
    external: LevelFilter,
    /// Values that could not be parsed, reported once logging works
    rejected: Vec<(&'static str, String)>,
}

impl LogLevels {
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rejected = Vec::new();
        let mut level = |key: &'static str, default: LevelFilter| match lookup(key) {
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                rejected.push((key, value));
                default
            }),
            None => default,
        };

        let local = level("SONGVOTE_LOG", LevelFilter::Info);
        let external = level("SONGVOTE_LOG_EXTERNAL", LevelFilter::Warn);

        Self {
            local,
            external,
            rejected,
        }
    }

    fn allows(&self, target: &Target, level: Level) -> bool {
        let filter = if target.is_local() {
            self.local
        } else {
            self.external
        };

        level <= filter
    }
}

/// Logs warnings and errors to stderr, everything else to stdout.
/// Levels come from `SONGVOTE_LOG` and `SONGVOTE_LOG_EXTERNAL`.
pub fn init_logger() {
    let mut levels = LogLevels::from_lookup(|key| env::var(key).ok());
    let rejected = std::mem::take(&mut levels.rejected);

    let severe = fern::Dispatch::new()
        .filter(|meta| meta.level() <= Level::Warn)
        .chain(std::io::stderr());

    let regular = fern::Dispatch::new()
        .filter(|meta| meta.level() > Level::Warn)
        .chain(std::io::stdout());

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let target = Target::from_str(record.target());
            let now = chrono::Local::now();

            out.finish(format_args!(
                "{:^5} {} {:^8} {}",
                level_to_string(&record.level()),
                now.format("%H:%M:%S").to_string().bright_black(),
                target,
                message
            ))
        })
        .level(levels.local.max(levels.external))
        .filter(move |meta| levels.allows(&Target::from_str(meta.target()), meta.level()))
        .chain(severe)
        .chain(regular)
        .apply()
        .expect("logging is initialized");

    for (key, value) in rejected {
        log::warn!("Ignoring {}={:?}, expected a level like info or debug", key, value);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Target {
    External(String),
    /// The binary itself
    Main,
    Server,
    Collab,
    Core,
}

impl Target {
    fn from_str(str: &str) -> Self {
        match str.split("::").next().unwrap_or_default() {
            "songvote" => Self::Main,
            "songvote_core" => Self::Core,
            "songvote_server" => Self::Server,
            "songvote_collab" => Self::Collab,
            other => Target::External(other.to_string()),
        }
    }

    fn is_local(&self) -> bool {
        !matches!(self, Self::External(_))
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match self {
            Target::External(x) => x.as_str().clear(),
            Target::Main => "SONGVOTE".bright_white(),
            Target::Server => "SERVER".bright_green(),
            Target::Collab => "COLLAB".bright_purple(),
            Target::Core => "CORE".blue(),
        };

        Display::fmt(&result, f)
    }
}

fn level_to_string(level: &Level) -> String {
    match level {
        Level::Error => " ERR ".black().on_red().bold().to_string(),
        Level::Warn => " WRN ".black().on_yellow().bold().to_string(),
        Level::Info => " INF ".black().on_blue().bold().to_string(),
        Level::Debug => " DBG ".white().on_black().to_string(),
        Level::Trace => " TRC ".to_string(),
    }
}
