use crate::error::{ContextError, Result};
use crate::prompt::PromptSource;
use crate::tree;
use carve_nearby::{FileDistance, NearestFileFinder, DEFAULT_MAX_DEPTH};
use carve_scaffold::scaffold_file;
use std::io::ErrorKind;
use std::path::Path;
use tokio::process::Command;

pub(crate) fn render_section(title: &str, description: &str) -> String {
    format!("# {title}\n\n{description}")
}

pub(crate) fn render_user_request(text: &str) -> String {
    format!("## User Request\n\n{text}")
}

pub(crate) fn render_prompt(name: &str, prompts: &dyn PromptSource) -> String {
    match prompts.load(name) {
        Some(text) => text,
        None => {
            log::warn!("Prompt \"{name}\" could not be resolved");
            format!("[Warning: prompt \"{name}\" could not be resolved and was omitted]")
        }
    }
}

pub(crate) fn render_file_tree(root: &Path) -> Result<String> {
    let listing = tree::render_tree(root)?;
    Ok(format!(
        "## Workspace File Tree\n\nThis is the file tree of the workspace centered around the root directory: `{}`\n```\n{listing}\n```",
        root.display()
    ))
}

pub(crate) async fn render_full_file(path: &Path) -> Result<String> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ContextError::FileNotFound(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    Ok(format!(
        "## File Content of: {}\n\n```\n{content}\n```",
        path.display()
    ))
}

/// Scaffold block, or an empty string when the file cannot be scaffolded.
///
/// Un-scaffoldable files are a soft failure: the cell is dropped and the
/// compile proceeds.
pub(crate) async fn render_file_scaffold(path: &Path) -> Result<String> {
    let scaffold = match scaffold_file(path) {
        Ok(Some(scaffold)) if !scaffold.is_empty() => scaffold,
        Ok(_) => {
            log::warn!("No scaffold available for {}, skipping", path.display());
            return Ok(String::new());
        }
        Err(err) => {
            log::warn!("Failed to scaffold {}, skipping: {err}", path.display());
            return Ok(String::new());
        }
    };

    Ok(format!(
        "## File Scaffold of: {}\n\nThis is a scaffold of the public API of the file. It is not a complete file, but it should give you a good idea of what the file is about.\n```\n{scaffold}\n```",
        path.display()
    ))
}

pub(crate) async fn render_nearby_full_files(path: &Path, count: usize) -> Result<String> {
    let mut blocks = Vec::new();
    for file in nearest(path, count)? {
        blocks.push(render_full_file(&file.path).await?);
    }
    Ok(blocks.join("\n\n"))
}

pub(crate) async fn render_nearby_file_scaffolds(path: &Path, count: usize) -> Result<String> {
    let mut blocks = Vec::new();
    for file in nearest(path, count)? {
        let block = render_file_scaffold(&file.path).await?;
        if !block.is_empty() {
            blocks.push(block);
        }
    }
    Ok(blocks.join("\n\n"))
}

pub(crate) async fn render_command_files(
    path: &Path,
    command: &str,
    count: usize,
) -> Result<String> {
    let mut blocks = Vec::new();
    for file in nearest(path, count)? {
        let output = match Command::new("sh")
            .arg("-c")
            .arg(command)
            .env("FILE_PATH", &file.path)
            .output()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                log::warn!(
                    "Failed to run `{command}` against {}, skipping: {err}",
                    file.path.display()
                );
                continue;
            }
        };

        if !output.status.success() {
            log::warn!(
                "`{command}` exited with {} for {}",
                output.status,
                file.path.display()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        blocks.push(format!(
            "## Ran Command to build context\nThe command `{command}` was run against file {}.\nThis should help you understand the file better.\n```\n{stdout}\n```",
            file.path.display()
        ));
    }
    Ok(blocks.join("\n\n"))
}

fn nearest(path: &Path, count: usize) -> Result<Vec<FileDistance>> {
    let finder = NearestFileFinder::for_target(path)?;
    Ok(finder.find(path, count, DEFAULT_MAX_DEPTH)?)
}
