//! Packing contract for renderers
//!
//! Architecture:
//! - CodegenContext: read-only view of a project that passed the consistency check
//! - Packer: turns the context plus selected namespaces into template data
//! - Renderer: handlebars templates with the naming helpers registered
//!
//! The key constraint: renderers never see an unchecked project. The only way
//! to obtain a [`CodegenContext`] is [`CodegenContext::build`].

pub mod helpers;
pub mod summary;

use std::fs;
use std::path::Path;

use handlebars::Handlebars;
use serde_json::Value;
use tracing::{debug, info};

use crate::checksum::Checksum;
use crate::error::{MfdError, Result};
use crate::graph::{Attribute, Entity, Namespace, Project, Search, VtEntity};

pub use summary::SummaryPacker;

// =============================================================================
// CodegenContext
// =============================================================================

/// Checked, linked project handed to packers
#[derive(Debug, Clone, Copy)]
pub struct CodegenContext<'p> {
    project: &'p Project,
}

impl<'p> CodegenContext<'p> {
    /// Check the project and wrap it.
    ///
    /// The project must already be linked; unresolved references fail here.
    pub fn build(project: &'p Project) -> Result<Self> {
        project.check_consistency()?;
        Ok(Self { project })
    }

    pub fn project(&self) -> &'p Project {
        self.project
    }

    /// Namespaces in document order, optionally restricted to `only`
    pub fn namespaces(&self, only: Option<&[String]>) -> Vec<&'p Namespace> {
        self.project
            .namespaces
            .iter()
            .filter(|ns| only.map_or(true, |names| names.contains(&ns.name)))
            .collect()
    }

    pub fn foreign_entity(&self, attribute: &Attribute) -> Option<&'p Entity> {
        self.project.foreign_entity(attribute)
    }

    /// Entity and attribute a search filters on
    pub fn search_target(&self, search: &Search) -> Option<(&'p Entity, &'p Attribute)> {
        let target = search.target?;
        Some((
            self.project.entity_at(target.entity)?,
            self.project.attribute_at(target)?,
        ))
    }

    pub fn vt_entity(&self, entity: &Entity) -> Option<&'p VtEntity> {
        self.project.vt_of(entity)
    }
}

// =============================================================================
// Packer
// =============================================================================

/// Builds template data from a checked project
pub trait Packer {
    fn pack(&self, ctx: &CodegenContext<'_>, namespaces: &[&Namespace]) -> Result<Value>;
}

impl<F> Packer for F
where
    F: Fn(&CodegenContext<'_>, &[&Namespace]) -> Result<Value>,
{
    fn pack(&self, ctx: &CodegenContext<'_>, namespaces: &[&Namespace]) -> Result<Value> {
        self(ctx, namespaces)
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Handlebars registry for generated sources (no HTML escaping)
pub struct Renderer {
    handlebars: Handlebars<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        helpers::register(&mut handlebars);
        Self { handlebars }
    }

    pub fn register_template(&mut self, name: &str, source: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, source)
            .map_err(|e| MfdError::Template {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    pub fn register_template_file(&mut self, name: &str, path: &Path) -> Result<()> {
        let source = fs::read_to_string(path).map_err(|e| MfdError::io(path, e))?;
        self.register_template(name, &source)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    pub fn render(&self, name: &str, data: &Value) -> Result<String> {
        self.handlebars.render(name, data).map_err(|e| MfdError::Template {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}

/// Pack, render and write one output file.
///
/// Returns whether the file was (re)written.
pub fn generate(
    ctx: &CodegenContext<'_>,
    packer: &dyn Packer,
    renderer: &Renderer,
    template: &str,
    only: Option<&[String]>,
    output: &Path,
) -> Result<bool> {
    let namespaces = ctx.namespaces(only);
    let data = packer.pack(ctx, &namespaces)?;
    let content = renderer.render(template, &data)?;

    let written = save_if_changed(&content, output)?;
    if written {
        info!(path = %output.display(), template, "generated");
    } else {
        debug!(path = %output.display(), "unchanged");
    }
    Ok(written)
}

/// Write `content` unless the file already holds exactly these bytes
pub fn save_if_changed(content: &str, path: &Path) -> Result<bool> {
    let current = Checksum::of_file(path).map_err(|e| MfdError::io(path, e))?;
    if current.is_some_and(|c| c.verify(content)) {
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| MfdError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| MfdError::io(path, e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn linked() -> Project {
        let mut project = Project::new("blog");
        let ns = project.ensure_namespace("blog");
        let mut post = Entity::new("Post", "blog", "blog.posts");
        post.attributes.push(Attribute::new("ID", "postId", "int4"));
        let mut author = Attribute::new("AuthorID", "authorId", "int4");
        author.foreign_key = "Author".to_string();
        post.attributes.push(author);
        project.namespaces[ns].entities.push(post);
        let mut author = Entity::new("Author", "blog", "blog.authors");
        author.attributes.push(Attribute::new("ID", "authorId", "int4"));
        project.namespaces[ns].entities.push(author);
        project.link();
        project
    }

    #[test]
    fn test_context_requires_consistent_project() {
        let mut project = linked();
        project.namespaces[0].entities[0].attributes[1].foreign_key = "Writer".to_string();
        project.link();
        assert!(CodegenContext::build(&project).is_err());

        let project = linked();
        let ctx = CodegenContext::build(&project).unwrap();
        let post = &ctx.namespaces(None)[0].entities[0];
        assert_eq!(ctx.foreign_entity(&post.attributes[1]).map(|e| e.name.as_str()), Some("Author"));
        assert!(ctx.namespaces(Some(&["other".to_string()][..])).is_empty());
    }

    #[test]
    fn test_function_packer_and_helpers() {
        let project = linked();
        let ctx = CodegenContext::build(&project).unwrap();
        fn names(_: &CodegenContext<'_>, namespaces: &[&Namespace]) -> Result<Value> {
            Ok(json!({ "names": namespaces.iter().flat_map(|ns| ns.entity_names()).collect::<Vec<_>>() }))
        }
        let packer: &dyn Packer = &names;

        let mut renderer = Renderer::new();
        renderer
            .register_template("list", "{{#each names}}{{plural (varName this)}} <{{urlName this}}>\n{{/each}}")
            .unwrap();

        let data = packer.pack(&ctx, &ctx.namespaces(None)).unwrap();
        assert_eq!(renderer.render("list", &data).unwrap(), "posts <post>\nauthors <author>\n");
    }

    #[test]
    fn test_save_if_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gen").join("model.txt");

        assert!(save_if_changed("one", &path).unwrap());
        assert!(!save_if_changed("one", &path).unwrap());
        assert!(save_if_changed("two", &path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn test_unknown_template_is_reported() {
        let renderer = Renderer::new();
        assert!(matches!(
            renderer.render("missing", &json!({})),
            Err(MfdError::Template { name, .. }) if name == "missing"
        ));
    }
}
