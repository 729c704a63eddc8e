//! Error types for the Beyond Epic binary.
//!
//! [`GameError`] wraps every failure that can stop startup or the command
//! loop, so `main` can propagate with `?`.

/// Top-level error for the game binary.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: beyond_core::config::ConfigError,
    },

    /// The configured rarity table is invalid.
    #[error("rarity table error: {source}")]
    Table {
        /// The underlying table error.
        #[from]
        source: beyond_core::table::TableError,
    },

    /// A session operation failed.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: beyond_core::session::SessionError,
    },

    /// Reading or writing a save file, or the terminal, failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
