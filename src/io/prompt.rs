use std::env;
use std::fs;
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::Command;

const COMMENT_CHAR: char = '#';

/// Error type for interactive prompts.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("cannot prompt while not running interactively")]
    NotInteractive,
    #[error("could not find the text editor to use")]
    NoEditor,
    #[error("`{0}` returned with non-zero code, aborting")]
    EditorFailed(String),
    #[error("could not read or write {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not read input: {0}")]
    Input(#[from] std::io::Error),
}

/// Pick the editor command, preferring the configured one, then
/// $VISUAL, then $EDITOR.
pub fn system_editor(configured: Option<&str>) -> Option<String> {
    if let Some(editor) = configured {
        if !editor.is_empty() {
            return Some(editor.to_string());
        }
    }
    env::var("VISUAL")
        .ok()
        .filter(|e| !e.is_empty())
        .or_else(|| env::var("EDITOR").ok().filter(|e| !e.is_empty()))
}

/// Ask the user for text, through the editor when one is available.
///
/// The editor buffer starts with the header as a comment line followed
/// by `initial`; comment lines are dropped from the result. Without an
/// editor a single line is read from stdin, which only works when no
/// initial text was given.
pub fn prompt(
    editor: Option<&str>,
    header: &str,
    initial: Option<&str>,
    extension: &str,
) -> Result<String, PromptError> {
    if !std::io::stdout().is_terminal() {
        return Err(PromptError::NotInteractive);
    }
    match editor {
        Some(editor) => prompt_with_editor(editor, header, initial, extension),
        None if initial.is_none() => {
            print!("{}: ", header);
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            Ok(line.trim().to_string())
        }
        None => Err(PromptError::NoEditor),
    }
}

fn prompt_with_editor(
    editor: &str,
    header: &str,
    initial: Option<&str>,
    extension: &str,
) -> Result<String, PromptError> {
    let dir = tmp_dir()?;
    let input_fp = dir.join(tmp_file_name(header, extension));

    let mut buffer = format!("{} {}\n", COMMENT_CHAR, header);
    if let Some(initial) = initial {
        buffer.push_str(initial);
    }
    fs::write(&input_fp, buffer).map_err(|e| PromptError::File {
        path: input_fp.clone(),
        source: e,
    })?;

    let status = Command::new(editor)
        .arg(&input_fp)
        .status()
        .map_err(|_| PromptError::EditorFailed(format!("{} {}", editor, input_fp.display())))?;
    if !status.success() {
        return Err(PromptError::EditorFailed(format!(
            "{} {}",
            editor,
            input_fp.display()
        )));
    }

    let text = fs::read_to_string(&input_fp).map_err(|e| PromptError::File {
        path: input_fp.clone(),
        source: e,
    })?;
    Ok(strip_comments(&text))
}

fn tmp_dir() -> Result<PathBuf, PromptError> {
    let user = env::var("USER").unwrap_or_else(|_| "anon".to_string());
    let dir = env::temp_dir().join(user).join("stint");
    fs::create_dir_all(&dir).map_err(|e| PromptError::File {
        path: dir.clone(),
        source: e,
    })?;
    Ok(dir)
}

fn tmp_file_name(header: &str, extension: &str) -> String {
    let mapped: String = header
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.{}", mapped.trim_matches('_'), extension)
}

fn strip_comments(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| !line.starts_with(COMMENT_CHAR))
        .collect();
    kept.join("\n").trim().to_string()
}
