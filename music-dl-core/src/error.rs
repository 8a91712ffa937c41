use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{command} failed ({}){}", exit_label(.code), stderr_suffix(.stderr))]
    ProcessFailure {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("no raw media file found in {}", .workspace.display())]
    NoRawMediaFound { workspace: PathBuf },

    #[error("no downloadable match found for \"{query}\"")]
    NoMatchFound { query: String },

    #[error("failed to fetch metadata: {0}")]
    MetadataFetchFailure(String),

    #[error("encoder failed ({})", exit_label(.code))]
    EncodeFailure { code: Option<i32> },

    #[error("resolution '{requested}' is not available; available: {}", join_or_none(.available))]
    ResolutionUnavailable {
        requested: String,
        available: Vec<String>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn process(command: impl Into<String>, code: Option<i32>) -> Self {
        CoreError::ProcessFailure {
            command: command.into(),
            code,
            stderr: String::new(),
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "no exit code".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

fn join_or_none(labels: &[String]) -> String {
    if labels.is_empty() {
        "none".to_string()
    } else {
        labels.join(", ")
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
