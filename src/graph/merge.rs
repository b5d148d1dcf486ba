//! Reconciliation of hand-edited nodes with a fresh scan
//!
//! Every node kind has one reconcile function taking `(existing, fresh)` and
//! returning the reconciled node. Fields fall in three groups:
//!
//! | kind          | from fresh                                         | filled only when unset | never touched                 |
//! |---------------|----------------------------------------------------|------------------------|-------------------------------|
//! | Attribute     | name, db name/type, array flag, foreign key        | addable, updatable     | min, max, default, nullable   |
//! | Entity        | table; attributes by (db name, db type)            | searches by identity   | name, namespace               |
//! | VtAttribute   | search name                                        | validate, required     | everything else               |
//! | TmplAttribute |                                                    | fk opts                | everything else               |
//!
//! New attributes, searches and view-template fields are appended after the
//! existing ones. Nothing is ever removed. Resolved references are cleared,
//! the linker re-derives them once the merge is done.

use serde::Serialize;
use tracing::{debug, info};

use super::{Attribute, Entity, EntityRef, Namespace, Project, Search, TmplAttribute, VtAttribute, VtEntity};
use crate::error::Result;
use crate::naming::OrderedSet;

/// Knobs of a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    /// Replace a non-empty code type with the scanned one
    pub overwrite_code_type: bool,
    /// Run [`Project::infer_array_relations`] before linking
    pub infer_array_relations: bool,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            overwrite_code_type: false,
            infer_array_relations: true,
        }
    }
}

/// What a project merge changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub entities_added: usize,
    pub entities_updated: usize,
    pub attributes_added: usize,
    pub searches_added: usize,
    pub namespaces_added: Vec<String>,
}

// =============================================================================
// Node reconciliation
// =============================================================================

/// Reconcile one attribute
pub fn reconcile_attribute(existing: &Attribute, fresh: &Attribute, policy: MergePolicy) -> Attribute {
    let code_type = if policy.overwrite_code_type || existing.code_type.is_empty() {
        fresh.code_type.clone()
    } else {
        existing.code_type.clone()
    };

    Attribute {
        name: fresh.name.clone(),
        db_name: fresh.db_name.clone(),
        db_type: fresh.db_type.clone(),
        code_type,
        is_array: fresh.is_array,
        disable_pointer: existing.disable_pointer,
        primary_key: existing.primary_key,
        foreign_key: fresh.foreign_key.clone(),
        foreign_entity: None,
        nullable: existing.nullable,
        addable: existing.addable.or(fresh.addable),
        updatable: existing.updatable.or(fresh.updatable),
        min: existing.min,
        max: existing.max,
        default: existing.default.clone(),
    }
}

/// Reconcile one entity with its fresh scan
pub fn reconcile_entity(existing: &Entity, fresh: &Entity, policy: MergePolicy) -> Entity {
    let mut merged = Entity {
        name: existing.name.clone(),
        namespace: existing.namespace.clone(),
        table: fresh.table.clone(),
        attributes: existing.attributes.clone(),
        searches: existing.searches.clone(),
        vt: None,
    };
    for attribute in &mut merged.attributes {
        attribute.foreign_entity = None;
    }
    for search in &mut merged.searches {
        search.target = None;
    }

    for attribute in &fresh.attributes {
        match merged.attribute_by_storage(&attribute.db_name, &attribute.db_type) {
            Some(i) => merged.attributes[i] = reconcile_attribute(&merged.attributes[i], attribute, policy),
            None => merged.attributes.push(Attribute {
                foreign_entity: None,
                ..attribute.clone()
            }),
        }
    }

    for search in &fresh.searches {
        if merged.search_by_identity(&search.attr_name, search.search_type).is_none() {
            merged.searches.push(Search {
                target: None,
                ..search.clone()
            });
        }
    }

    merged
}

/// Reconcile one view-template field
pub fn reconcile_vt_attribute(existing: &VtAttribute, fresh: &VtAttribute) -> VtAttribute {
    VtAttribute {
        search_name: fresh.search_name.clone(),
        validate: if existing.validate.is_empty() {
            fresh.validate.clone()
        } else {
            existing.validate.clone()
        },
        required: existing.required || fresh.required,
        attribute: None,
        search_target: None,
        ..existing.clone()
    }
}

/// Reconcile one template field
pub fn reconcile_tmpl_attribute(existing: &TmplAttribute, fresh: &TmplAttribute) -> TmplAttribute {
    TmplAttribute {
        fk_opts: if existing.fk_opts.is_empty() {
            fresh.fk_opts.clone()
        } else {
            existing.fk_opts.clone()
        },
        vt_attribute: None,
        ..existing.clone()
    }
}

/// Reconcile one view-template entity
pub fn reconcile_vt_entity(existing: &VtEntity, fresh: &VtEntity) -> VtEntity {
    let mut merged = VtEntity {
        terminal_path: if existing.terminal_path.is_empty() {
            fresh.terminal_path.clone()
        } else {
            existing.terminal_path.clone()
        },
        entity: None,
        ..existing.clone()
    };

    for field in &fresh.attributes {
        match merged.attribute_by_identity(&field.attr_name, &field.search_name) {
            Some(i) => merged.attributes[i] = reconcile_vt_attribute(&merged.attributes[i], field),
            None => merged.attributes.push(VtAttribute {
                attribute: None,
                search_target: None,
                ..field.clone()
            }),
        }
    }

    for template in &fresh.templates {
        match merged.template_by_identity(&template.attr_name, &template.name) {
            Some(i) => merged.templates[i] = reconcile_tmpl_attribute(&merged.templates[i], template),
            None => merged.templates.push(TmplAttribute {
                vt_attribute: None,
                ..template.clone()
            }),
        }
    }

    merged
}

// =============================================================================
// Namespace and project merge
// =============================================================================

impl Namespace {
    /// Merge a fresh entity into the entity of the same name, or append it
    ///
    /// Returns the index of the node that now holds the merged entity.
    pub fn merge_entity(&mut self, fresh: Entity, policy: MergePolicy) -> usize {
        match self.entity_index(&fresh.name) {
            Some(i) => {
                self.entities[i] = reconcile_entity(&self.entities[i], &fresh, policy);
                i
            }
            None => {
                self.entities.push(Entity {
                    namespace: self.name.clone(),
                    ..fresh
                });
                self.entities.len() - 1
            }
        }
    }

    /// Merge a fresh view-template entity, or append it
    pub fn merge_vt_entity(&mut self, fresh: VtEntity) -> usize {
        match self.vt_entity_index(&fresh.name) {
            Some(i) => {
                self.vt_entities[i] = reconcile_vt_entity(&self.vt_entities[i], &fresh);
                i
            }
            None => {
                self.vt_entities.push(fresh);
                self.vt_entities.len() - 1
            }
        }
    }
}

impl Project {
    /// Add a fresh entity (and view template) to a namespace
    ///
    /// An entity of the same name in that namespace is reconciled in place:
    /// the view template first, then the entity. The namespace is created
    /// when missing. References are left for the next [`Project::link`].
    pub fn merge_entity(
        &mut self,
        namespace: &str,
        fresh: Entity,
        fresh_vt: Option<VtEntity>,
        policy: MergePolicy,
    ) -> EntityRef {
        let ni = self.ensure_namespace(namespace);
        let ns = &mut self.namespaces[ni];
        if let Some(vt) = fresh_vt {
            ns.merge_vt_entity(vt);
        }
        EntityRef {
            namespace: ni,
            entity: ns.merge_entity(fresh, policy),
        }
    }

    /// Fold a freshly scanned project into this one, then relink and check
    ///
    /// Entities already known keep their namespace, new ones land in the
    /// namespace they were scanned into.
    pub fn merge(&mut self, fresh: Project, policy: MergePolicy) -> Result<MergeReport> {
        let mut report = MergeReport::default();

        for mut fresh_ns in fresh.namespaces {
            for entity in std::mem::take(&mut fresh_ns.entities) {
                let vt = fresh_ns
                    .vt_entity_index(&entity.name)
                    .map(|i| fresh_ns.vt_entities.remove(i));

                let target = match self.find_entity(&entity.name) {
                    Some(at) => self.namespaces[at.namespace].name.clone(),
                    None => fresh_ns.name.clone(),
                };
                if self.namespace_index(&target).is_none() {
                    report.namespaces_added.push(target.clone());
                }

                let before = self.entity_by_name(&entity.name).map(|e| (e.attributes.len(), e.searches.len()));
                let at = self.merge_entity(&target, entity, vt, policy);
                let after = self.entity_at(at).map(|e| (e.attributes.len(), e.searches.len()));

                match (before, after) {
                    (Some((attributes, searches)), Some((now_attributes, now_searches))) => {
                        report.entities_updated += 1;
                        report.attributes_added += now_attributes - attributes;
                        report.searches_added += now_searches - searches;
                    }
                    (None, Some((attributes, searches))) => {
                        report.entities_added += 1;
                        report.attributes_added += attributes;
                        report.searches_added += searches;
                    }
                    _ => {}
                }
            }

            // view templates without a scanned entity
            if !fresh_ns.vt_entities.is_empty() {
                let ni = self.ensure_namespace(&fresh_ns.name);
                for vt in fresh_ns.vt_entities {
                    self.namespaces[ni].merge_vt_entity(vt);
                }
            }
        }

        let mut languages: OrderedSet = self.languages.iter().cloned().collect();
        languages.extend(fresh.languages);
        self.languages = languages.into_vec();
        self.add_custom_types(fresh.custom_types);
        self.dictionary.append_all(&fresh.dictionary);

        if policy.infer_array_relations {
            let inferred = self.infer_array_relations();
            debug!(inferred, "array relations after merge");
        }
        self.link();
        self.check_consistency()?;

        info!(
            project = %self.name,
            added = report.entities_added,
            updated = report.entities_updated,
            attributes = report.attributes_added,
            searches = report.searches_added,
            "merged fresh scan"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{InputKind, Nullable, SearchType};
    use super::*;

    fn attribute(name: &str, db_name: &str, db_type: &str) -> Attribute {
        Attribute::new(name, db_name, db_type)
    }

    fn existing_news() -> Entity {
        let mut news = Entity::new("News", "portal", "portal.news");
        news.attributes.push(attribute("ID", "newsId", "int4"));
        let mut title = attribute("Title", "title", "varchar");
        title.max = 255;
        title.min = 1;
        title.default = "untitled".to_string();
        title.nullable = Nullable::CheckEmpty;
        title.addable = Some(false);
        news.attributes.push(title);
        news.attributes.push(attribute("CategoryID", "categoryId", "int4"));
        news.searches.push(Search::new("TitleILike", "Title", SearchType::ILike));
        news
    }

    fn fresh_news() -> Entity {
        let mut news = Entity::new("News", "portal", "public.news");
        news.attributes.push(attribute("ID", "newsId", "int4"));
        let mut title = attribute("Title", "title", "varchar");
        title.max = 64;
        title.addable = Some(true);
        title.updatable = Some(true);
        news.attributes.push(title);
        let mut category = attribute("CategoryID", "categoryId", "int4");
        category.foreign_key = "Category".to_string();
        news.attributes.push(category);
        news.attributes.push(attribute("Views", "views", "int4"));
        news.searches.push(Search::new("TitleSearch", "Title", SearchType::ILike));
        news.searches.push(Search::new("Views", "Views", SearchType::Equals));
        news
    }

    #[test]
    fn test_sticky_fields_survive() {
        let merged = reconcile_entity(&existing_news(), &fresh_news(), MergePolicy::default());
        let title = merged.attribute_by_name("Title").unwrap();

        assert_eq!(title.max, 255);
        assert_eq!(title.min, 1);
        assert_eq!(title.default, "untitled");
        assert_eq!(title.nullable, Nullable::CheckEmpty);
        assert_eq!(title.addable, Some(false));
        // unset flags are filled from the scan
        assert_eq!(title.updatable, Some(true));

        let category = merged.attribute_by_name("CategoryID").unwrap();
        assert_eq!(category.foreign_key, "Category");
        assert_eq!(merged.table, "public.news");
    }

    #[test]
    fn test_new_attributes_are_appended() {
        let merged = reconcile_entity(&existing_news(), &fresh_news(), MergePolicy::default());
        let names: Vec<_> = merged.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "Title", "CategoryID", "Views"]);
    }

    #[test]
    fn test_storage_type_change_is_a_new_attribute() {
        let mut fresh = fresh_news();
        fresh.attributes[1].db_type = "text".to_string();
        let merged = reconcile_entity(&existing_news(), &fresh, MergePolicy::default());
        let titles: Vec<_> = merged.attributes.iter().filter(|a| a.db_name == "title").collect();
        assert_eq!(titles.len(), 2);
        assert_eq!(titles[0].max, 255);
        assert_eq!(titles[1].db_type, "text");
    }

    #[test]
    fn test_searches_added_by_identity_only() {
        let merged = reconcile_entity(&existing_news(), &fresh_news(), MergePolicy::default());
        let names: Vec<_> = merged.searches.iter().map(|s| s.name.as_str()).collect();
        // the renamed ILike search on Title keeps its hand-given name
        assert_eq!(names, vec!["TitleILike", "Views"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let policy = MergePolicy::default();
        let once = reconcile_entity(&existing_news(), &fresh_news(), policy);
        let twice = reconcile_entity(&once, &fresh_news(), policy);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_code_type_policy() {
        let mut existing = attribute("Params", "params", "jsonb");
        existing.code_type = "NewsParams".to_string();
        let mut fresh = attribute("Params", "params", "jsonb");
        fresh.code_type = "map[string]interface{}".to_string();

        let kept = reconcile_attribute(&existing, &fresh, MergePolicy::default());
        assert_eq!(kept.code_type, "NewsParams");

        let policy = MergePolicy {
            overwrite_code_type: true,
            ..MergePolicy::default()
        };
        assert_eq!(reconcile_attribute(&existing, &fresh, policy).code_type, fresh.code_type);
    }

    #[test]
    fn test_vt_entity_reconcile() {
        let mut existing = VtEntity::new("News");
        existing.terminal_path = "news".to_string();
        let mut title = VtAttribute::new("Title");
        title.attr_name = "Title".to_string();
        title.search_name = "TitleILike".to_string();
        title.validate = "notEmpty".to_string();
        existing.attributes.push(title);
        let mut tmpl = TmplAttribute::new("Category", "CategoryID");
        tmpl.fk_opts = "Name".to_string();
        existing.templates.push(tmpl);

        let mut fresh = VtEntity::new("News");
        fresh.terminal_path = "other".to_string();
        let mut title = VtAttribute::new("Headline");
        title.attr_name = "Title".to_string();
        title.search_name = "TitleILike".to_string();
        title.validate = "len".to_string();
        title.required = true;
        fresh.attributes.push(title);
        let mut views = VtAttribute::new("Views");
        views.attr_name = "Views".to_string();
        fresh.attributes.push(views);
        let mut tmpl = TmplAttribute::new("Category", "CategoryID");
        tmpl.fk_opts = "Title".to_string();
        tmpl.form = InputKind::Select;
        fresh.templates.push(tmpl);

        let merged = reconcile_vt_entity(&existing, &fresh);
        assert_eq!(merged.terminal_path, "news");
        assert_eq!(merged.attributes.len(), 2);
        assert_eq!(merged.attributes[0].name, "Title");
        assert_eq!(merged.attributes[0].validate, "notEmpty");
        assert!(merged.attributes[0].required);
        assert_eq!(merged.templates.len(), 1);
        assert_eq!(merged.templates[0].fk_opts, "Name");
        assert_eq!(merged.templates[0].form, InputKind::None);

        assert_eq!(reconcile_vt_entity(&merged, &fresh), merged);
    }

    #[test]
    fn test_namespace_merge_returns_existing_node() {
        let mut project = Project::new("newsportal");
        project.merge_entity("portal", Entity::new("Category", "portal", "portal.categories"), None, MergePolicy::default());
        let first = project.merge_entity("portal", existing_news(), Some(VtEntity::new("News")), MergePolicy::default());
        let again = project.merge_entity("portal", fresh_news(), Some(VtEntity::new("News")), MergePolicy::default());

        assert_eq!(first, again);
        assert_eq!(project.namespaces[0].entities.len(), 2);
        assert_eq!(project.namespaces[0].vt_entities.len(), 1);
        assert_eq!(project.entity_at(again).unwrap().attributes.len(), 4);
    }

    #[test]
    fn test_project_merge_keeps_namespace_and_relinks() {
        let mut existing = Project::new("newsportal");
        existing.merge_entity("portal", existing_news(), None, MergePolicy::default());
        let mut category = Entity::new("Category", "portal", "portal.categories");
        category.attributes.push(attribute("ID", "categoryId", "int4"));
        existing.merge_entity("portal", category.clone(), None, MergePolicy::default());

        let mut fresh = Project::new("scan");
        // the scan puts everything into one namespace
        fresh.merge_entity("public", fresh_news(), None, MergePolicy::default());
        fresh.merge_entity("public", category, None, MergePolicy::default());
        let mut tag = Entity::new("Tag", "public", "public.tags");
        tag.attributes.push(attribute("ID", "tagId", "int4"));
        fresh.merge_entity("public", tag, None, MergePolicy::default());
        fresh.languages.push("ru".to_string());

        let report = existing.merge(fresh, MergePolicy::default()).unwrap();
        assert_eq!(report.entities_added, 1);
        assert_eq!(report.entities_updated, 2);
        assert_eq!(report.attributes_added, 2);
        assert_eq!(report.namespaces_added, vec!["public"]);

        assert_eq!(existing.find_entity("News").unwrap().namespace, 0);
        assert_eq!(existing.namespace("public").unwrap().entity_names(), vec!["Tag"]);
        assert_eq!(existing.languages, vec!["en", "ru"]);

        let category_id = existing.entity_by_name("News").unwrap().attribute_by_name("CategoryID").unwrap();
        assert_eq!(existing.foreign_entity(category_id).unwrap().name, "Category");
    }
}
