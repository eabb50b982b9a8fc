use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How much the shipper reports after each delivery attempt.
///
/// This is distinct from `app::LogLevel`, which filters the agent's own
/// tracing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Silent.
    None,
    /// Entry count only.
    Short,
    /// Entry count plus a dump of every entry.
    #[default]
    Verbose,
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::None => "none",
            Verbosity::Short => "short",
            Verbosity::Verbose => "verbose",
        }
    }
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
