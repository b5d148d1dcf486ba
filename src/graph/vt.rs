//! View-template nodes: how an entity is presented and edited

use serde::{Deserialize, Serialize};

use super::{AttributeRef, EntityRef, SearchRef};

wire_enum! {
    /// Which screens are generated for an entity
    #[derive(Default)]
    pub enum Mode {
        #[default]
        Full => "Full",
        ReadOnlyWithTemplates => "ReadOnlyWithTemplates",
        ReadOnly => "ReadOnly",
        None => "None",
    }
}

impl Mode {
    /// No create/update screens
    pub fn is_read_only(&self) -> bool {
        !matches!(self, Mode::Full)
    }

    /// List/form templates are generated
    pub fn has_templates(&self) -> bool {
        matches!(self, Mode::Full | Mode::ReadOnlyWithTemplates)
    }
}

wire_enum! {
    /// Input control of a template field
    #[derive(Default)]
    pub enum InputKind {
        #[default]
        None => "HTML_NONE",
        Input => "HTML_INPUT",
        Text => "HTML_TEXT",
        Password => "HTML_PASSWORD",
        Editor => "HTML_EDITOR",
        Checkbox => "HTML_CHECKBOX",
        DateTime => "HTML_DATETIME",
        Date => "HTML_DATE",
        Time => "HTML_TIME",
        Select => "HTML_SELECT",
        File => "HTML_FILE",
        Image => "HTML_IMAGE",
    }
}

impl InputKind {
    pub fn is_none(&self) -> bool {
        matches!(self, InputKind::None)
    }
}

/// What a view-template search name resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchTarget {
    Search(SearchRef),
    Attribute(AttributeRef),
}

// =============================================================================
// VtAttribute
// =============================================================================

/// Editable or searchable field of a view-template entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtAttribute {
    pub name: String,
    /// Attribute of the entity this field edits
    #[serde(default)]
    pub attr_name: String,
    /// Search (or attribute) this field filters by
    #[serde(default)]
    pub search_name: String,
    #[serde(default)]
    pub summary: bool,
    #[serde(default)]
    pub search: bool,
    #[serde(default)]
    pub max: i64,
    #[serde(default)]
    pub min: i64,
    #[serde(default)]
    pub required: bool,
    /// Validation rule name
    #[serde(default)]
    pub validate: String,
    #[serde(skip)]
    pub attribute: Option<AttributeRef>,
    #[serde(skip)]
    pub search_target: Option<SearchTarget>,
}

impl VtAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Identity used when reconciling with a fresh scan
    pub fn identity(&self) -> (&str, &str) {
        (&self.attr_name, &self.search_name)
    }
}

// =============================================================================
// TmplAttribute
// =============================================================================

/// Presentation of a field in the list, form and search screens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TmplAttribute {
    pub name: String,
    /// Name of the [`VtAttribute`] this field presents
    pub attr_name: String,
    #[serde(default)]
    pub list: bool,
    /// Field of the related entity shown in selects
    #[serde(default)]
    pub fk_opts: String,
    #[serde(default)]
    pub form: InputKind,
    #[serde(default)]
    pub search: InputKind,
    #[serde(skip)]
    pub vt_attribute: Option<usize>,
}

impl TmplAttribute {
    pub fn new(name: impl Into<String>, attr_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attr_name: attr_name.into(),
            ..Self::default()
        }
    }

    /// Identity used when reconciling with a fresh scan
    pub fn identity(&self) -> (&str, &str) {
        (&self.attr_name, &self.name)
    }
}

// =============================================================================
// VtEntity
// =============================================================================

/// View description of an entity, matched to it by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VtEntity {
    pub name: String,
    #[serde(default)]
    pub mode: Mode,
    /// URL path of the entity screens
    #[serde(default)]
    pub terminal_path: String,
    #[serde(default)]
    pub attributes: Vec<VtAttribute>,
    #[serde(default)]
    pub templates: Vec<TmplAttribute>,
    #[serde(skip)]
    pub entity: Option<EntityRef>,
}

impl VtEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&VtAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn attribute_by_identity(&self, attr_name: &str, search_name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|a| a.identity() == (attr_name, search_name))
    }

    pub fn template_by_identity(&self, attr_name: &str, name: &str) -> Option<usize> {
        self.templates
            .iter()
            .position(|t| t.identity() == (attr_name, name))
    }

    /// Template fields shown in the list screen
    pub fn list_templates(&self) -> impl Iterator<Item = &TmplAttribute> {
        self.templates.iter().filter(|t| t.list)
    }

    /// Template fields shown in the form screen
    pub fn form_templates(&self) -> impl Iterator<Item = &TmplAttribute> {
        self.templates.iter().filter(|t| !t.form.is_none())
    }

    /// Template fields shown in the search panel
    pub fn search_templates(&self) -> impl Iterator<Item = &TmplAttribute> {
        self.templates.iter().filter(|t| !t.search.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_flags() {
        assert!(!Mode::Full.is_read_only());
        assert!(Mode::ReadOnlyWithTemplates.is_read_only());
        assert!(Mode::ReadOnlyWithTemplates.has_templates());
        assert!(!Mode::None.has_templates());
        assert_eq!(Mode::default(), Mode::Full);
        assert_eq!("ReadOnly".parse::<Mode>().unwrap(), Mode::ReadOnly);
    }

    #[test]
    fn test_input_kind_wire_names() {
        assert_eq!(InputKind::ALL.len(), 12);
        assert_eq!(InputKind::default().as_str(), "HTML_NONE");
        assert_eq!("HTML_IMAGE".parse::<InputKind>().unwrap(), InputKind::Image);
    }

    #[test]
    fn test_template_screens() {
        let mut vt = VtEntity::new("News");
        let mut title = TmplAttribute::new("Title", "Title");
        title.list = true;
        title.form = InputKind::Input;
        let mut category = TmplAttribute::new("Category", "CategoryID");
        category.search = InputKind::Select;
        vt.templates = vec![title, category];

        assert_eq!(vt.list_templates().count(), 1);
        assert_eq!(vt.form_templates().count(), 1);
        assert_eq!(vt.search_templates().next().map(|t| t.name.as_str()), Some("Category"));
        assert_eq!(vt.template_by_identity("CategoryID", "Category"), Some(1));
    }
}
