use serde::Deserialize;

/// Optional settings read from `config.toml` at the base directory root.
/// Command-line flags override these.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Export format used when none is given or deducible.
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Editor command for prompts, tried before $VISUAL and $EDITOR.
    #[serde(default)]
    pub editor: Option<String>,
    /// Whether hook executables run at all.
    #[serde(default = "default_hooks")]
    pub hooks: bool,
    /// Whether a failing hook aborts the command.
    #[serde(default)]
    pub check_hooks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_format: default_format(),
            editor: None,
            hooks: default_hooks(),
            check_hooks: false,
        }
    }
}

fn default_format() -> String {
    "text".to_string()
}

fn default_hooks() -> bool {
    true
}
