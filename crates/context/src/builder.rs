use crate::cell::{CellBody, ContextCell};
use crate::error::Result;
use crate::prompt::PromptSource;
use crate::render;
use std::path::PathBuf;

/// Ordered, append-only sequence of context cells.
///
/// Cells compile in insertion order into one document; rendering a cell
/// never affects another.
#[derive(Debug, Default)]
pub struct ContextBuilder {
    cells: Vec<ContextCell>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_cell(mut self, title: impl Into<String>, body: CellBody) -> Self {
        self.cells.push(ContextCell {
            title: title.into(),
            body,
        });
        self
    }

    pub fn add_file_tree(self, root: impl Into<PathBuf>) -> Self {
        self.add_cell("File Tree", CellBody::FileTree { root: root.into() })
    }

    pub fn add_full_file(self, title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.add_cell(title, CellBody::FullFile { path: path.into() })
    }

    pub fn add_file_scaffold(self, title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.add_cell(title, CellBody::FileScaffold { path: path.into() })
    }

    pub fn add_nearby_full_files(
        self,
        title: impl Into<String>,
        path: impl Into<PathBuf>,
        count: usize,
    ) -> Self {
        self.add_cell(
            title,
            CellBody::NearbyFullFiles {
                path: path.into(),
                count,
            },
        )
    }

    pub fn add_nearby_file_scaffolds(
        self,
        title: impl Into<String>,
        path: impl Into<PathBuf>,
        count: usize,
    ) -> Self {
        self.add_cell(
            title,
            CellBody::NearbyFileScaffolds {
                path: path.into(),
                count,
            },
        )
    }

    pub fn add_command_files(
        self,
        path: impl Into<PathBuf>,
        command: impl Into<String>,
        count: usize,
    ) -> Self {
        self.add_cell(
            "Command Output",
            CellBody::CommandFiles {
                path: path.into(),
                command: command.into(),
                count,
            },
        )
    }

    pub fn add_user_request(self, text: impl Into<String>) -> Self {
        self.add_cell("User Request", CellBody::UserRequest { text: text.into() })
    }

    pub fn add_included_prompts<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self = self.add_cell(
                "Included Prompt",
                CellBody::IncludedPrompt { name: name.into() },
            );
        }
        self
    }

    pub fn add_section(self, title: impl Into<String>, description: impl Into<String>) -> Self {
        let title = title.into();
        self.add_cell(
            title.clone(),
            CellBody::Section {
                title,
                description: description.into(),
            },
        )
    }

    pub fn cells(&self) -> &[ContextCell] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Compile all cells into one document.
    ///
    /// Blocks are joined with a blank line; cells that render to nothing
    /// (e.g. a dropped scaffold) leave no trace in the output.
    pub async fn compile(&self, prompts: &dyn PromptSource) -> Result<String> {
        let mut blocks = Vec::new();

        for cell in &self.cells {
            let block = match &cell.body {
                CellBody::FileTree { root } => render::render_file_tree(root)?,
                CellBody::FullFile { path } => render::render_full_file(path).await?,
                CellBody::FileScaffold { path } => render::render_file_scaffold(path).await?,
                CellBody::NearbyFullFiles { path, count } => {
                    render::render_nearby_full_files(path, *count).await?
                }
                CellBody::NearbyFileScaffolds { path, count } => {
                    render::render_nearby_file_scaffolds(path, *count).await?
                }
                CellBody::CommandFiles {
                    path,
                    command,
                    count,
                } => render::render_command_files(path, command, *count).await?,
                CellBody::UserRequest { text } => render::render_user_request(text),
                CellBody::IncludedPrompt { name } => render::render_prompt(name, prompts),
                CellBody::Section { title, description } => {
                    render::render_section(title, description)
                }
            };

            if !block.trim().is_empty() {
                blocks.push(block);
            }
        }

        Ok(blocks.join("\n\n"))
    }
}
