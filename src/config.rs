// src/config.rs

//! Configuration for the renderer binary and its display sinks.
//!
//! Every section derives `Deserialize` with `#[serde(default)]`, so a config
//! file only needs the keys it wants to change. The file is JSON and is named
//! by the `TERMGFX_CONFIG` environment variable; without it the defaults
//! below apply.
//!
//! ```json
//! {
//!   "display": { "backend": "headless", "repaint": "on_finish" },
//!   "colors": { "palette_size": 16 },
//!   "logging": { "default_filter": "debug", "file": "/tmp/termgfx.log" }
//! }
//! ```

use crate::color::Color;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV_VAR: &str = "TERMGFX_CONFIG";

/// Process-wide configuration, loaded on first use.
///
/// A missing variable yields the defaults. A file that cannot be read or
/// parsed is reported on stderr (logging is not up yet at that point) and
/// the defaults are used instead.
pub static CONFIG: Lazy<Config> = Lazy::new(|| match Config::from_env() {
    Ok(config) => config,
    Err(e) => {
        eprintln!("termgfx: ignoring configuration: {:#}", e);
        Config::default()
    }
});

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub colors: ColorConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Reads and parses a JSON configuration file.
    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], or the defaults if unset.
    pub fn from_env() -> Result<Config> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Config::load(Path::new(&path)),
            _ => Ok(Config::default()),
        }
    }
}

/// Which display sink the binary paints onto.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// The controlling terminal, in raw mode with ANSI escape output.
    #[default]
    Console,
    /// No device; the final frame is printed to stdout as plain text.
    Headless,
}

/// When the frame buffer is pushed to the sink.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RepaintPolicy {
    /// After every record that changed the frame.
    #[default]
    EveryCommand,
    /// Once, when the stream ends.
    OnFinish,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub backend: Backend,
    pub repaint: RepaintPolicy,
    /// Show `exit_prompt` and wait for a key before restoring the terminal.
    pub wait_for_key: bool,
    pub exit_prompt: String,
    /// Shown in place of glyph bytes that are not printable ASCII.
    pub placeholder: char,
    /// Bytes requested from the input per read.
    pub read_chunk_size: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            backend: Backend::Console,
            repaint: RepaintPolicy::EveryCommand,
            wait_for_key: true,
            exit_prompt: "Press any key to exit...".to_string(),
            placeholder: '?',
            read_chunk_size: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorConfig {
    /// Number of palette entries the terminal supports (at most 256).
    /// Color indices at or above this fall back to `default_foreground`.
    pub palette_size: u16,
    /// Color used for index 0 and for unsupported indices.
    pub default_foreground: Color,
}

impl Default for ColorConfig {
    fn default() -> Self {
        ColorConfig {
            palette_size: 256,
            default_foreground: Color::Default,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set. Kept quiet by default since
    /// log lines on stderr land on the same terminal the frame is drawn on.
    pub default_filter: String,
    /// Append log output to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            default_filter: "error".to_string(),
            file: None,
        }
    }
}
