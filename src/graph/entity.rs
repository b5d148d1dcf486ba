//! Structural nodes: entities, attributes and searches

use serde::{Deserialize, Serialize};

use super::{AttributeRef, EntityRef, VtEntityRef};
use crate::naming;

/// Separator between a JSON column and the path inside it (`Params->lang`)
pub const JSON_PATH_SEPARATOR: &str = "->";

// =============================================================================
// Enumerations
// =============================================================================

wire_enum! {
    /// Nullability of a column
    #[derive(Default)]
    pub enum Nullable {
        Yes => "Yes",
        #[default]
        No => "No",
        /// Not null in storage, but an empty value is stored as null
        CheckEmpty => "CheckEmpty",
    }
}

wire_enum! {
    /// Filter operator of a search
    pub enum SearchType {
        Equals => "SEARCHTYPE_EQUALS",
        NotEquals => "SEARCHTYPE_NOT_EQUALS",
        Null => "SEARCHTYPE_NULL",
        NotNull => "SEARCHTYPE_NOT_NULL",
        Ge => "SEARCHTYPE_GE",
        Le => "SEARCHTYPE_LE",
        G => "SEARCHTYPE_G",
        L => "SEARCHTYPE_L",
        LeftLike => "SEARCHTYPE_LEFT_LIKE",
        LeftILike => "SEARCHTYPE_LEFT_ILIKE",
        RightLike => "SEARCHTYPE_RIGHT_LIKE",
        RightILike => "SEARCHTYPE_RIGHT_ILIKE",
        Like => "SEARCHTYPE_LIKE",
        ILike => "SEARCHTYPE_ILIKE",
        Array => "SEARCHTYPE_ARRAY",
        NotArray => "SEARCHTYPE_NOT_INARRAY",
        ArrayContains => "SEARCHTYPE_ARRAY_CONTAINS",
        ArrayNotContains => "SEARCHTYPE_ARRAY_NOT_CONTAINS",
        ArrayContained => "SEARCHTYPE_ARRAY_CONTAINED",
        ArrayIntersect => "SEARCHTYPE_ARRAY_INTERSECT",
        JsonPath => "SEARCHTYPE_JSONB_PATH",
    }
}

/// How a search kind maps onto a query filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterType {
    /// Filter function name
    pub name: &'static str,
    /// Negated filter
    pub exclude: bool,
    /// Filter value is a list
    pub is_array: bool,
}

impl SearchType {
    /// The filter value is a list of the attribute's values
    pub fn is_array_search(&self) -> bool {
        matches!(self, SearchType::Array | SearchType::NotArray)
    }

    pub fn filter(&self) -> FilterType {
        let (name, exclude, is_array) = match self {
            SearchType::Equals => ("SearchTypeEquals", false, false),
            SearchType::NotEquals => ("SearchTypeEquals", true, false),
            SearchType::Null => ("SearchTypeNull", false, false),
            SearchType::NotNull => ("SearchTypeNull", true, false),
            SearchType::Ge => ("SearchTypeGE", false, false),
            SearchType::Le => ("SearchTypeLE", false, false),
            SearchType::G => ("SearchTypeGreater", false, false),
            SearchType::L => ("SearchTypeLess", false, false),
            SearchType::LeftLike => ("SearchTypeLLike", false, false),
            SearchType::LeftILike => ("SearchTypeLILike", false, false),
            SearchType::RightLike => ("SearchTypeRLike", false, false),
            SearchType::RightILike => ("SearchTypeRILike", false, false),
            SearchType::Like => ("SearchTypeLike", false, false),
            SearchType::ILike => ("SearchTypeILike", false, false),
            SearchType::Array => ("SearchTypeArray", false, true),
            SearchType::NotArray => ("SearchTypeArray", true, true),
            SearchType::ArrayContains => ("SearchTypeArrayContains", false, false),
            SearchType::ArrayNotContains => ("SearchTypeArrayContains", true, false),
            SearchType::ArrayContained => ("SearchTypeArrayContained", false, true),
            SearchType::ArrayIntersect => ("SearchTypeArrayIntersect", false, true),
            SearchType::JsonPath => ("SearchTypeJsonbPath", false, false),
        };
        FilterType {
            name,
            exclude,
            is_array,
        }
    }

    /// Conventional search name for an attribute (`Title` + ILike → `TitleILike`)
    ///
    /// Kinds without a convention keep the attribute name.
    pub fn search_name(&self, attribute: &str) -> String {
        match self {
            SearchType::Equals => format!("{attribute}Eq"),
            SearchType::NotEquals => format!("Not{attribute}"),
            SearchType::Null => format!("{attribute}Null"),
            SearchType::NotNull => format!("{attribute}NotNull"),
            SearchType::Ge => format!("{attribute}GE"),
            SearchType::Le => format!("{attribute}LE"),
            SearchType::G => format!("{attribute}G"),
            SearchType::L => format!("{attribute}L"),
            SearchType::LeftLike => format!("{attribute}LLike"),
            SearchType::LeftILike => format!("{attribute}LILike"),
            SearchType::RightLike => format!("{attribute}RLike"),
            SearchType::RightILike => format!("{attribute}RILike"),
            SearchType::Like => format!("{attribute}Like"),
            SearchType::ILike => format!("{attribute}ILike"),
            SearchType::Array => naming::make_plural(attribute),
            SearchType::NotArray => format!("Not{}", naming::make_plural(attribute)),
            SearchType::ArrayContains
            | SearchType::ArrayNotContains
            | SearchType::ArrayContained
            | SearchType::ArrayIntersect
            | SearchType::JsonPath => attribute.to_string(),
        }
    }
}

// =============================================================================
// Attribute
// =============================================================================

/// One storage column of an entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    /// Display name, unique within the entity
    pub name: String,
    pub db_name: String,
    pub db_type: String,
    /// Renderer type name; empty means "derive from the storage type"
    #[serde(default)]
    pub code_type: String,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub disable_pointer: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// Name of the entity this column references
    #[serde(default)]
    pub foreign_key: String,
    #[serde(skip)]
    pub foreign_entity: Option<EntityRef>,
    #[serde(default)]
    pub nullable: Nullable,
    /// Unset means allowed
    #[serde(default)]
    pub addable: Option<bool>,
    /// Unset means allowed
    #[serde(default)]
    pub updatable: Option<bool>,
    #[serde(default)]
    pub min: i64,
    #[serde(default)]
    pub max: i64,
    #[serde(default)]
    pub default: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, db_name: impl Into<String>, db_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_name: db_name.into(),
            db_type: db_type.into(),
            ..Self::default()
        }
    }

    /// Storage identity used when reconciling with a fresh scan
    pub fn storage_key(&self) -> (&str, &str) {
        (&self.db_name, &self.db_type)
    }

    pub fn has_foreign_key(&self) -> bool {
        !self.foreign_key.is_empty()
    }

    pub fn is_addable(&self) -> bool {
        self.addable.unwrap_or(true)
    }

    pub fn is_updatable(&self) -> bool {
        self.updatable.unwrap_or(true)
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable != Nullable::No
    }

    /// Array of foreign keys, named `<Entity>IDs`
    pub fn is_ids_array(&self) -> bool {
        self.is_array && naming::strip_ids_suffix(&self.name).is_some()
    }

    /// Relation name derived from the display name (`CategoryID` → `Category`)
    pub fn relation_name(&self) -> String {
        naming::fk_name(&self.name)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.db_type.as_str(),
            "int2" | "int4" | "int8" | "smallint" | "integer" | "bigint" | "serial" | "bigserial"
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self.db_type.as_str(), "text" | "varchar" | "char" | "bpchar" | "uuid" | "citext")
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.db_type.as_str(), "bool" | "boolean")
    }

    pub fn is_datetime(&self) -> bool {
        matches!(
            self.db_type.as_str(),
            "timestamp" | "timestamptz" | "date" | "time" | "timetz" | "interval"
        )
    }

    pub fn is_json(&self) -> bool {
        matches!(self.db_type.as_str(), "json" | "jsonb")
    }
}

// =============================================================================
// Search
// =============================================================================

/// Named filter over an attribute, possibly through a relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Search {
    pub name: String,
    /// Local attribute name or `relation.field` path
    pub attr_name: String,
    pub search_type: SearchType,
    #[serde(skip)]
    pub target: Option<AttributeRef>,
}

impl Search {
    pub fn new(name: impl Into<String>, attr_name: impl Into<String>, search_type: SearchType) -> Self {
        Self {
            name: name.into(),
            attr_name: attr_name.into(),
            search_type,
            target: None,
        }
    }

    /// Search named by convention after its attribute path
    /// (`category.title` + ILike → `CategoryTitleILike`)
    pub fn conventional(attr_name: impl Into<String>, search_type: SearchType) -> Self {
        let attr_name = attr_name.into();
        let base: String = attr_name
            .split(['.', '-', '>'])
            .filter(|segment| !segment.is_empty())
            .map(naming::camel_case)
            .collect();
        Self::new(search_type.search_name(&base), attr_name, search_type)
    }

    /// Identity used when reconciling with a fresh scan
    pub fn identity(&self) -> (&str, SearchType) {
        (&self.attr_name, self.search_type)
    }

    /// `(relation, field)` for a search through a relation
    pub fn foreign_path(&self) -> Option<(&str, &str)> {
        if self.attr_name.contains(JSON_PATH_SEPARATOR) {
            return None;
        }
        self.attr_name.split_once('.')
    }

    /// Entity owning the searched attribute
    pub fn entity(&self) -> Option<EntityRef> {
        self.target.map(|t| t.entity)
    }
}

// =============================================================================
// Entity
// =============================================================================

/// One storage table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    pub namespace: String,
    /// Storage location, `schema.table`
    pub table: String,
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub searches: Vec<Search>,
    #[serde(skip)]
    pub vt: Option<VtEntityRef>,
}

impl Entity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            table: table.into(),
            ..Self::default()
        }
    }

    /// Attribute by display name; a JSON path suffix is ignored
    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.attribute_index(name).map(|i| &self.attributes[i])
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        let name = match name.split_once(JSON_PATH_SEPARATOR) {
            Some((column, _)) => column,
            None => name,
        };
        self.attributes.iter().position(|a| a.name == name)
    }

    /// Attribute by storage identity
    pub fn attribute_by_storage(&self, db_name: &str, db_type: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|a| a.storage_key() == (db_name, db_type))
    }

    pub fn search_by_name(&self, name: &str) -> Option<&Search> {
        self.search_index(name).map(|i| &self.searches[i])
    }

    pub fn search_index(&self, name: &str) -> Option<usize> {
        self.searches.iter().position(|s| s.name == name)
    }

    /// Search by identity (attribute name, kind)
    pub fn search_by_identity(&self, attr_name: &str, search_type: SearchType) -> Option<usize> {
        self.searches
            .iter()
            .position(|s| s.identity() == (attr_name, search_type))
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.primary_key)
    }

    pub fn has_multiple_pks(&self) -> bool {
        self.primary_keys().count() > 1
    }

    /// Human-facing attribute: `Title` or `Name` if present, else the first string
    pub fn title_attribute(&self) -> Option<&Attribute> {
        self.attribute_by_name("Title")
            .or_else(|| self.attribute_by_name("Name"))
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|a| a.is_string() && !a.is_array && !a.primary_key)
            })
    }
}
