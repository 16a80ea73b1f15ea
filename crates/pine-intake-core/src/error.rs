use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("not initialized: run 'pine-intake init'")]
    NotInitialized,

    #[error("session is complete; no question is awaiting an answer")]
    InvalidSessionState,

    #[error("session is not complete: '{0}' is still awaiting an answer")]
    SessionNotComplete(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The message doubles as the re-prompt shown to the user.
    #[error("Please choose one of: {}", options.join(", "))]
    InvalidAnswer {
        question: String,
        input: String,
        options: Vec<String>,
    },

    #[error("question '{question}' has no branch leading to '{target}'")]
    UnreachableBranch { question: String, target: String },

    #[error("invalid question tree: {0}")]
    TreeInvalid(String),

    #[error("input is not valid UTF-8 text (byte offset {offset})")]
    InvalidEncoding { offset: usize },

    #[error("nothing to assemble: {0}")]
    NothingToAssemble(String),

    #[error("refinement limit reached after {0} attempts")]
    RefinementLimitReached(u32),

    #[error("question '{0}' was not answered in this session")]
    NotAnswered(String),

    #[error("unknown question id: {0}")]
    UnknownQuestion(String),

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, IntakeError>;
