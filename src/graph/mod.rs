//! Project model graph
//!
//! The in-memory form of an mfd project:
//!
//! ```text
//! Project
//! ├── Namespace            (one structural + one view-template document)
//! │   ├── Entity           (one storage table)
//! │   │   ├── Attribute    (one column, optional foreign key)
//! │   │   └── Search       (one filter operator on an attribute)
//! │   └── VtEntity         (view description of an entity)
//! │       ├── VtAttribute  (editable/searchable field)
//! │       └── TmplAttribute(how a field renders in list/form/search)
//! ```
//!
//! Nodes are owned by their parent vectors. Cross references between them
//! are index pairs ([`EntityRef`], [`AttributeRef`], ...) that are never
//! persisted; they are filled by [`Project::link`] and are only trustworthy
//! after [`Project::check_consistency`] passed.

/// Closed string enumeration as it appears in documents
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::UnknownVariant;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    _ => Err($crate::error::UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::error::UnknownVariant;

            fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod entity;
mod link;
pub mod merge;
mod validate;
pub mod vt;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::map::TextMap;

pub use entity::{Attribute, Entity, FilterType, Nullable, Search, SearchType};
pub use merge::{MergePolicy, MergeReport};
pub use vt::{InputKind, Mode, SearchTarget, TmplAttribute, VtAttribute, VtEntity};

// =============================================================================
// References
// =============================================================================

/// Position of an entity: namespace index, entity index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    pub namespace: usize,
    pub entity: usize,
}

/// Position of an attribute inside an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeRef {
    pub entity: EntityRef,
    pub attribute: usize,
}

/// Position of a search inside an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchRef {
    pub entity: EntityRef,
    pub search: usize,
}

/// Position of a view-template entity: namespace index, vt entity index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VtEntityRef {
    pub namespace: usize,
    pub entity: usize,
}

// =============================================================================
// Project
// =============================================================================

/// Mapping of a storage type to a renderer type outside the built-in set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomType {
    pub db_type: String,
    pub code_type: String,
    #[serde(default)]
    pub import: String,
}

/// Root of the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    /// Namespace names in manifest order
    pub namespace_names: Vec<String>,
    pub languages: Vec<String>,
    #[serde(default)]
    pub custom_types: Vec<CustomType>,
    /// Project-wide translation overrides
    #[serde(default)]
    pub dictionary: TextMap,
    pub namespaces: Vec<Namespace>,
}

/// One structural document and its view-template companion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub name: String,
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub vt_entities: Vec<VtEntity>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn entity_index(&self, name: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.name == name)
    }

    pub fn vt_entity(&self, name: &str) -> Option<&VtEntity> {
        self.vt_entities.iter().find(|e| e.name == name)
    }

    pub fn vt_entity_index(&self, name: &str) -> Option<usize> {
        self.vt_entities.iter().position(|e| e.name == name)
    }

    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }
}

impl Project {
    /// Empty project with the default language
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            languages: vec!["en".to_string()],
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------------
    // Namespaces
    // -------------------------------------------------------------------------

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    pub fn namespace_mut(&mut self, name: &str) -> Option<&mut Namespace> {
        self.namespaces.iter_mut().find(|ns| ns.name == name)
    }

    pub fn namespace_index(&self, name: &str) -> Option<usize> {
        self.namespaces.iter().position(|ns| ns.name == name)
    }

    /// Index of the namespace, creating it (and listing it) when missing
    pub fn ensure_namespace(&mut self, name: &str) -> usize {
        if !self.namespace_names.iter().any(|n| n == name) {
            self.namespace_names.push(name.to_string());
        }
        match self.namespace_index(name) {
            Some(i) => i,
            None => {
                self.namespaces.push(Namespace::new(name));
                self.namespaces.len() - 1
            }
        }
    }

    // -------------------------------------------------------------------------
    // Entity lookups
    // -------------------------------------------------------------------------

    /// Every entity with its position, in namespace order
    pub fn entities(&self) -> impl Iterator<Item = (EntityRef, &Entity)> {
        self.namespaces.iter().enumerate().flat_map(|(ni, ns)| {
            ns.entities.iter().enumerate().map(move |(ei, e)| {
                (
                    EntityRef {
                        namespace: ni,
                        entity: ei,
                    },
                    e,
                )
            })
        })
    }

    /// Every view-template entity with its position
    pub fn vt_entities(&self) -> impl Iterator<Item = (VtEntityRef, &VtEntity)> {
        self.namespaces.iter().enumerate().flat_map(|(ni, ns)| {
            ns.vt_entities.iter().enumerate().map(move |(ei, e)| {
                (
                    VtEntityRef {
                        namespace: ni,
                        entity: ei,
                    },
                    e,
                )
            })
        })
    }

    /// Global lookup by exact entity name
    pub fn find_entity(&self, name: &str) -> Option<EntityRef> {
        self.entities().find(|(_, e)| e.name == name).map(|(r, _)| r)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.find_entity(name).and_then(|r| self.entity_at(r))
    }

    /// Global lookup by storage location (`schema.table`)
    pub fn find_entity_by_table(&self, table: &str) -> Option<EntityRef> {
        self.entities().find(|(_, e)| e.table == table).map(|(r, _)| r)
    }

    pub fn find_vt_entity(&self, name: &str) -> Option<VtEntityRef> {
        self.vt_entities().find(|(_, e)| e.name == name).map(|(r, _)| r)
    }

    /// Name → position index; the first definition of a name wins
    pub(crate) fn entity_index(&self) -> HashMap<String, EntityRef> {
        let mut index = HashMap::new();
        for (r, e) in self.entities() {
            index.entry(e.name.clone()).or_insert(r);
        }
        index
    }

    pub fn entity_at(&self, r: EntityRef) -> Option<&Entity> {
        self.namespaces.get(r.namespace)?.entities.get(r.entity)
    }

    pub fn entity_at_mut(&mut self, r: EntityRef) -> Option<&mut Entity> {
        self.namespaces.get_mut(r.namespace)?.entities.get_mut(r.entity)
    }

    pub fn attribute_at(&self, r: AttributeRef) -> Option<&Attribute> {
        self.entity_at(r.entity)?.attributes.get(r.attribute)
    }

    pub fn search_at(&self, r: SearchRef) -> Option<&Search> {
        self.entity_at(r.entity)?.searches.get(r.search)
    }

    pub fn vt_entity_at(&self, r: VtEntityRef) -> Option<&VtEntity> {
        self.namespaces.get(r.namespace)?.vt_entities.get(r.entity)
    }

    /// Entity a linked foreign-key attribute points at
    pub fn foreign_entity(&self, attribute: &Attribute) -> Option<&Entity> {
        attribute.foreign_entity.and_then(|r| self.entity_at(r))
    }

    /// View-template counterpart of a linked entity
    pub fn vt_of(&self, entity: &Entity) -> Option<&VtEntity> {
        entity.vt.and_then(|r| self.vt_entity_at(r))
    }

    // -------------------------------------------------------------------------
    // Namespace mapping
    // -------------------------------------------------------------------------

    /// `(namespace, entity)` pairs in document order
    pub fn namespace_mapping(&self) -> Vec<(String, String)> {
        self.namespaces
            .iter()
            .flat_map(|ns| ns.entities.iter().map(move |e| (ns.name.clone(), e.name.clone())))
            .collect()
    }

    /// Move an entity (and its view template) into another namespace
    ///
    /// Positions shift, so the project has to be linked again afterwards.
    /// Returns `false` when the entity does not exist or already lives there.
    pub fn move_entity(&mut self, entity: &str, target: &str) -> bool {
        let Some(from) = self.find_entity(entity) else {
            return false;
        };
        if self.namespaces[from.namespace].name == target {
            return false;
        }

        let to = self.ensure_namespace(target);
        let mut moved = self.namespaces[from.namespace].entities.remove(from.entity);
        moved.namespace = target.to_string();
        self.namespaces[to].entities.push(moved);

        if let Some(vi) = self.namespaces[from.namespace].vt_entity_index(entity) {
            let vt = self.namespaces[from.namespace].vt_entities.remove(vi);
            self.namespaces[to].vt_entities.push(vt);
        }
        true
    }

    /// Apply a `(namespace, entity)` mapping, returning how many entities moved
    pub fn apply_namespace_mapping(&mut self, mapping: &[(String, String)]) -> usize {
        mapping
            .iter()
            .filter(|(namespace, entity)| self.move_entity(entity, namespace))
            .count()
    }

    // -------------------------------------------------------------------------
    // Custom types
    // -------------------------------------------------------------------------

    /// Merge custom type mappings keyed by storage type
    ///
    /// Known storage types are replaced in place; the newly added ones are
    /// returned in input order.
    pub fn add_custom_types(&mut self, types: impl IntoIterator<Item = CustomType>) -> Vec<CustomType> {
        let mut added = Vec::new();
        for custom in types {
            match self.custom_types.iter_mut().find(|t| t.db_type == custom.db_type) {
                Some(existing) => *existing = custom,
                None => {
                    self.custom_types.push(custom.clone());
                    added.push(custom);
                }
            }
        }
        added
    }

    /// Custom mapping for a storage type
    pub fn custom_type(&self, db_type: &str) -> Option<&CustomType> {
        self.custom_types.iter().find(|t| t.db_type == db_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Project {
        let mut project = Project::new("newsportal");
        let portal = project.ensure_namespace("portal");
        project.namespaces[portal]
            .entities
            .push(Entity::new("News", "portal", "portal.news"));
        project.namespaces[portal].vt_entities.push(VtEntity::new("News"));
        let common = project.ensure_namespace("common");
        project.namespaces[common]
            .entities
            .push(Entity::new("User", "common", "common.users"));
        project
    }

    #[test]
    fn test_lookups() {
        let project = sample();
        let news = project.find_entity("News").unwrap();
        assert_eq!(news, EntityRef { namespace: 0, entity: 0 });
        assert_eq!(project.find_entity_by_table("common.users").map(|r| r.namespace), Some(1));
        assert!(project.find_entity("news").is_none());
        assert_eq!(project.namespace_names, vec!["portal", "common"]);
    }

    #[test]
    fn test_ensure_namespace_is_idempotent() {
        let mut project = sample();
        assert_eq!(project.ensure_namespace("portal"), 0);
        assert_eq!(project.namespaces.len(), 2);
        assert_eq!(project.namespace_names.len(), 2);
    }

    #[test]
    fn test_move_entity_takes_view_template() {
        let mut project = sample();
        assert!(project.move_entity("News", "common"));
        assert!(!project.move_entity("News", "common"));
        assert!(!project.move_entity("Missing", "common"));

        let common = project.namespace("common").unwrap();
        assert_eq!(common.entity_names(), vec!["User", "News"]);
        assert_eq!(common.entity("News").unwrap().namespace, "common");
        assert!(common.vt_entity("News").is_some());
        assert!(project.namespace("portal").unwrap().vt_entities.is_empty());
    }

    #[test]
    fn test_namespace_mapping_round_trip() {
        let mut project = sample();
        let mapping = project.namespace_mapping();
        assert_eq!(mapping[0], ("portal".to_string(), "News".to_string()));

        let moved = project.apply_namespace_mapping(&[("common".to_string(), "News".to_string())]);
        assert_eq!(moved, 1);
        assert_eq!(project.find_entity("News").map(|r| r.namespace), Some(1));
    }

    #[test]
    fn test_add_custom_types() {
        let mut project = Project::new("p");
        let uuid = CustomType {
            db_type: "uuid".to_string(),
            code_type: "Uuid".to_string(),
            import: "uuid".to_string(),
        };
        assert_eq!(project.add_custom_types([uuid.clone()]).len(), 1);

        let replaced = CustomType {
            code_type: "String".to_string(),
            import: String::new(),
            ..uuid
        };
        assert!(project.add_custom_types([replaced]).is_empty());
        assert_eq!(project.custom_type("uuid").unwrap().code_type, "String");
    }
}
