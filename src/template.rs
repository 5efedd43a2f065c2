use crate::error::{Error, Result};
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Prompt templates read from a configured directory. Files are loaded at
/// request time so edits take effect without a restart.
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn load(&self, name: &str) -> Result<PromptTemplate> {
        let path = self.dir.join(format!("{}.txt", name));
        let source = fs::read_to_string(&path).map_err(|source| Error::Template {
            name: name.to_string(),
            source,
        })?;
        Ok(PromptTemplate {
            name: name.to_string(),
            source,
        })
    }
}

/// A loaded template with named placeholders. Rendering is strict: a
/// placeholder with no matching context field is an error rather than
/// silent emptiness.
#[derive(Debug)]
pub struct PromptTemplate {
    name: String,
    source: String,
}

impl PromptTemplate {
    pub fn render<S: Serialize>(&self, context: &S) -> Result<String> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.render_str(&self.source, context)
            .map_err(|e| Error::Render {
                name: self.name.clone(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn store_with(name: &str, content: &str) -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(format!("{}.txt", name)), content).unwrap();
        let store = TemplateStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn renders_named_placeholders() {
        let (_dir, store) = store_with("idea", "Genre: {{ genre }}\nNews: {{ news_text }}");
        let mut ctx = HashMap::new();
        ctx.insert("genre", "mystery");
        ctx.insert("news_text", "A jewel was stolen.");

        let rendered = store.load("idea").unwrap().render(&ctx).unwrap();
        assert_eq!(rendered, "Genre: mystery\nNews: A jewel was stolen.");
    }

    #[test]
    fn missing_template_is_a_template_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path());

        let err = store.load("idea").unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
        assert!(err.to_string().contains("idea"));
    }

    #[test]
    fn unknown_placeholder_is_a_render_error() {
        let (_dir, store) = store_with("outline", "{{ nonexistent_field }}");
        let ctx: HashMap<&str, &str> = HashMap::new();

        let err = store.load("outline").unwrap().render(&ctx).unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
    }
}
