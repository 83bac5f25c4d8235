/// Seam to the external prompt loader.
///
/// Prompt files live outside this crate's scope; compilation only needs a
/// way to resolve a name to text. `None` means the name could not be
/// resolved, which degrades to a warning block in the compiled output.
pub trait PromptSource {
    fn load(&self, name: &str) -> Option<String>;
}

/// Prompt source that resolves nothing; for callers without prompts
pub struct NoPrompts;

impl PromptSource for NoPrompts {
    fn load(&self, _name: &str) -> Option<String> {
        None
    }
}
