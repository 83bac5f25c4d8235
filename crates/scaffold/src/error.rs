use thiserror::Error;

/// Result type for scaffold operations
pub type Result<T> = std::result::Result<T, ScaffoldError>;

/// Errors that can occur during scaffold extraction
#[derive(Error, Debug)]
pub enum ScaffoldError {
    /// Failed to parse the source code
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Scaffolding is not defined for this language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl ScaffoldError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }
}
