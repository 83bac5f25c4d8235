use carve_context::PromptSource;
use std::path::PathBuf;

/// Prompt loader backed by a directory of `<name>.md` files.
pub struct DirPromptSource {
    dir: PathBuf,
}

impl DirPromptSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PromptSource for DirPromptSource {
    fn load(&self, name: &str) -> Option<String> {
        let path = self.dir.join(format!("{name}.md"));
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(err) => {
                log::warn!("Prompt \"{name}\" not found at {}: {err}", path.display());
                None
            }
        }
    }
}
