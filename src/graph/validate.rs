//! Consistency check
//!
//! Gates every consumer of a linked project: loading, merging and rendering
//! all go through [`Project::check_consistency`]. The first violation aborts
//! with the namespace, entity and field it was found in.

use std::collections::HashMap;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use super::Project;
use crate::error::{MfdError, Result};
use crate::naming;

impl Project {
    /// Verify that every name-based reference resolved
    ///
    /// Checks, in order: every listed namespace is loaded, entity names are
    /// unique, every foreign key and search resolved, every view-template
    /// entity has an entity, and every view-template field resolves.
    /// Run after [`Project::link`].
    pub fn check_consistency(&self) -> Result<()> {
        for name in &self.namespace_names {
            if self.namespace(name).is_none() {
                return Err(MfdError::MissingNamespace {
                    namespace: name.clone(),
                });
            }
        }

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for ns in &self.namespaces {
            for entity in &ns.entities {
                if let Some(first) = seen.insert(&entity.name, &ns.name) {
                    return Err(MfdError::DuplicateEntity {
                        entity: entity.name.clone(),
                        first: first.to_string(),
                        second: ns.name.clone(),
                    });
                }
            }
        }

        for ns in &self.namespaces {
            for entity in &ns.entities {
                for attribute in &entity.attributes {
                    if attribute.has_foreign_key() && attribute.foreign_entity.is_none() {
                        return Err(MfdError::UnresolvedForeignKey {
                            namespace: ns.name.clone(),
                            entity: entity.name.clone(),
                            attribute: attribute.name.clone(),
                            target: attribute.foreign_key.clone(),
                            suggestion: self.closest_entity(&attribute.foreign_key),
                        });
                    }
                }

                for search in &entity.searches {
                    if search.target.is_none() {
                        return Err(MfdError::UnresolvedSearch {
                            namespace: ns.name.clone(),
                            entity: entity.name.clone(),
                            search: search.name.clone(),
                            target: search.attr_name.clone(),
                        });
                    }
                }
            }

            for vt in &ns.vt_entities {
                if vt.entity.is_none() {
                    return Err(MfdError::OrphanVtEntity {
                        namespace: ns.name.clone(),
                        entity: vt.name.clone(),
                    });
                }

                for field in &vt.attributes {
                    let context = |kind, reference: &str| MfdError::UnresolvedVtAttribute {
                        namespace: ns.name.clone(),
                        entity: vt.name.clone(),
                        attribute: field.name.clone(),
                        kind,
                        reference: reference.to_string(),
                    };

                    if field.attr_name.is_empty() && field.search_name.is_empty() {
                        return Err(MfdError::EmptyVtAttribute {
                            namespace: ns.name.clone(),
                            entity: vt.name.clone(),
                            attribute: field.name.clone(),
                        });
                    }
                    if !field.attr_name.is_empty() && field.attribute.is_none() {
                        return Err(context("attribute", &field.attr_name));
                    }
                    if !field.search_name.is_empty() && field.search_target.is_none() {
                        return Err(context("search", &field.search_name));
                    }
                }
            }
        }

        Ok(())
    }

    /// Reject names that would collide in generated code
    ///
    /// Unlike [`Project::check_consistency`] this collects every offending
    /// name before failing.
    pub fn validate_names(&self) -> Result<()> {
        let mut invalid = Vec::new();
        let clashes = |name: &str| {
            naming::is_reserved(name) || naming::is_reserved_by_generator(name) || !naming::is_identifier(name)
        };

        for ns in &self.namespaces {
            if clashes(&ns.name) {
                invalid.push(format!("namespace: {}", ns.name));
            }
            for entity in &ns.entities {
                if clashes(&entity.name) {
                    invalid.push(format!("entity: {}.{}", ns.name, entity.name));
                }
            }
            for vt in ns.vt_entities.iter().filter(|vt| !vt.mode.is_read_only()) {
                if clashes(&vt.name) {
                    invalid.push(format!("vt entity: {}.{}", ns.name, vt.name));
                }
            }
        }

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(MfdError::ReservedNames(invalid))
        }
    }

    /// Best fuzzy match among entity names
    fn closest_entity(&self, name: &str) -> Option<String> {
        let matcher = SkimMatcherV2::default();
        self.entities()
            .filter_map(|(_, e)| {
                let forward = matcher.fuzzy_match(&e.name, name);
                let backward = matcher.fuzzy_match(name, &e.name);
                forward.max(backward).map(|score| (score, &e.name))
            })
            .max_by_key(|(score, _)| *score)
            .map(|(_, name)| name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Attribute, Entity, Mode, Search, SearchType, VtAttribute, VtEntity};
    use super::*;

    fn project() -> Project {
        let mut project = Project::new("newsportal");
        let portal = project.ensure_namespace("portal");
        let mut news = Entity::new("News", "portal", "portal.news");
        news.attributes.push(Attribute::new("ID", "newsId", "int4"));
        news.attributes.push(Attribute::new("Title", "title", "varchar"));
        let mut category = Attribute::new("CategoryID", "categoryId", "int4");
        category.foreign_key = "Category".to_string();
        news.attributes.push(category);
        news.searches.push(Search::new("TitleILike", "Title", SearchType::ILike));
        project.namespaces[portal].entities.push(news);

        let mut category = Entity::new("Category", "portal", "portal.categories");
        category.attributes.push(Attribute::new("ID", "categoryId", "int4"));
        project.namespaces[portal].entities.push(category);

        let mut vt = VtEntity::new("News");
        let mut title = VtAttribute::new("Title");
        title.attr_name = "Title".to_string();
        title.search_name = "TitleILike".to_string();
        vt.attributes.push(title);
        project.namespaces[portal].vt_entities.push(vt);
        project
    }

    fn checked(mut project: Project) -> Result<()> {
        project.link();
        project.check_consistency()
    }

    #[test]
    fn test_consistent_project_passes() {
        assert!(checked(project()).is_ok());
    }

    #[test]
    fn test_dangling_foreign_key_is_reported() {
        let mut project = project();
        project.namespaces[0].entities[0].attributes[2].foreign_key = "Categry".to_string();

        match checked(project) {
            Err(MfdError::UnresolvedForeignKey {
                namespace,
                entity,
                attribute,
                target,
                suggestion,
            }) => {
                assert_eq!(namespace, "portal");
                assert_eq!(entity, "News");
                assert_eq!(attribute, "CategoryID");
                assert_eq!(target, "Categry");
                assert_eq!(suggestion.as_deref(), Some("Category"));
            }
            other => panic!("Expected UnresolvedForeignKey, got {:?}", other),
        }
    }

    #[test]
    fn test_dangling_search_is_reported() {
        let mut project = project();
        project.namespaces[0].entities[0].searches[0].attr_name = "Subtitle".to_string();
        let err = checked(project).unwrap_err();
        assert!(matches!(err, MfdError::UnresolvedSearch { ref search, .. } if search == "TitleILike"));
        assert!(err.is_consistency());
    }

    #[test]
    fn test_orphan_vt_entity_is_reported() {
        let mut project = project();
        project.namespaces[0].vt_entities.push(VtEntity::new("Ghost"));
        assert!(matches!(checked(project), Err(MfdError::OrphanVtEntity { entity, .. }) if entity == "Ghost"));
    }

    #[test]
    fn test_vt_attribute_checks() {
        let mut empty = project();
        empty.namespaces[0].vt_entities[0].attributes.push(VtAttribute::new("Nothing"));
        assert!(matches!(checked(empty), Err(MfdError::EmptyVtAttribute { .. })));

        let mut dangling = project();
        dangling.namespaces[0].vt_entities[0].attributes[0].search_name = "Missing".to_string();
        assert!(matches!(
            checked(dangling),
            Err(MfdError::UnresolvedVtAttribute { kind: "search", .. })
        ));
    }

    #[test]
    fn test_missing_namespace_and_duplicates() {
        let mut missing = project();
        missing.namespace_names.push("common".to_string());
        assert!(matches!(checked(missing), Err(MfdError::MissingNamespace { .. })));

        let mut duplicate = project();
        let common = duplicate.ensure_namespace("common");
        duplicate.namespaces[common]
            .entities
            .push(Entity::new("News", "common", "common.news"));
        assert!(matches!(checked(duplicate), Err(MfdError::DuplicateEntity { .. })));
    }

    #[test]
    fn test_validate_names() {
        let mut project = project();
        assert!(project.validate_names().is_ok());

        project.namespaces[0].entities.push(Entity::new("Columns", "portal", "portal.columns"));
        project.namespaces[0].entities.push(Entity::new("columns", "portal", "portal.columns2"));
        project.namespaces[0].entities.push(Entity::new("Map", "portal", "portal.maps"));
        project.namespaces[0].entities.push(Entity::new("Type", "portal", "portal.types"));
        let mut vt = VtEntity::new("Status");
        project.namespaces[0].vt_entities.push(vt.clone());
        vt.name = "func".to_string();
        vt.mode = Mode::ReadOnly;
        project.namespaces[0].vt_entities.push(vt);

        match project.validate_names() {
            Err(MfdError::ReservedNames(names)) => {
                assert_eq!(
                    names,
                    vec![
                        "entity: portal.Columns",
                        "entity: portal.Map",
                        "entity: portal.Type",
                        "vt entity: portal.Status",
                    ]
                );
            }
            other => panic!("Expected ReservedNames, got {:?}", other),
        }
    }
}
