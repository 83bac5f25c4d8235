use std::path::PathBuf;

/// One unit of composable context before compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextCell {
    pub title: String,
    pub body: CellBody,
}

/// Closed union of cell payloads, dispatched exhaustively at compile time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellBody {
    /// Directory listing rooted at a path
    FileTree { root: PathBuf },

    /// A file's raw content, fenced
    FullFile { path: PathBuf },

    /// The exported surface of a file (dropped silently if unavailable)
    FileScaffold { path: PathBuf },

    /// Full contents of the `count` files nearest to a path
    NearbyFullFiles { path: PathBuf, count: usize },

    /// Scaffolds of the `count` files nearest to a path
    NearbyFileScaffolds { path: PathBuf, count: usize },

    /// Output of a command run against each of the `count` nearest files
    CommandFiles {
        path: PathBuf,
        command: String,
        count: usize,
    },

    /// Free text supplied by the caller
    UserRequest { text: String },

    /// A named prompt resolved through the external prompt loader
    IncludedPrompt { name: String },

    /// A heading plus description
    Section { title: String, description: String },
}
