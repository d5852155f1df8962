use std::path::PathBuf;

/// Command-line overrides, the highest-precedence configuration layer
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit config file; skips discovery when set
    pub config_path: Option<PathBuf>,
    pub provider: Option<String>,
    pub claude_binary: Option<String>,
    pub model: Option<String>,
    pub verbose: Option<bool>,
    pub log_format: Option<String>,
}
