use crate::error::{GatewayError, Result};
use crate::provider::{ToolParam, ToolSpec};
use serde_json::Value;
use std::path::Path;

/// Name of the built-in file-rewrite tool
pub const WRITE_FILE_TOOL_NAME: &str = "write-file";

/// Tool that lets a model rewrite a workspace file in full
pub fn write_file_tool() -> ToolSpec {
    ToolSpec {
        name: WRITE_FILE_TOOL_NAME.to_string(),
        description: "Rewrites the entire contents of a file to the workspace".to_string(),
        params: vec![
            ToolParam::string("path", "The path to the file to write"),
            ToolParam::string("content", "The new content to write to the file"),
        ],
    }
}

/// Apply a returned `write-file` call to the workspace.
pub async fn apply_write_file(workspace_root: &Path, args: &Value) -> Result<()> {
    let path = args
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::malformed("write-file call is missing `path`"))?;
    let content = args
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::malformed("write-file call is missing `content`"))?;

    let absolute = workspace_root.join(path);
    log::info!("Writing file {}", absolute.display());
    if let Some(parent) = absolute.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&absolute, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn write_file_tool_declares_both_params() {
        let tool = write_file_tool();
        assert_eq!(tool.name, WRITE_FILE_TOOL_NAME);
        assert_eq!(tool.required_names(), vec!["path", "content"]);
    }

    #[tokio::test]
    async fn applies_write_file_calls_relative_to_the_workspace() {
        let temp = tempdir().unwrap();
        let args = json!({"path": "out/result.txt", "content": "written"});

        apply_write_file(temp.path(), &args).await.unwrap();

        let written = std::fs::read_to_string(temp.path().join("out/result.txt")).unwrap();
        assert_eq!(written, "written");
    }

    #[tokio::test]
    async fn missing_fields_are_malformed() {
        let temp = tempdir().unwrap();
        let args = json!({"path": "out.txt"});

        let result = apply_write_file(temp.path(), &args).await;
        assert!(matches!(result, Err(GatewayError::MalformedResponse(_))));
    }
}
