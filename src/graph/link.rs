//! Reference linker
//!
//! Re-derives every non-persisted cross reference from names. Each pass
//! first computes its resolutions against an immutable view of the project
//! and then writes them, so a pass never observes its own partial output.
//! Missing targets leave the reference empty; reporting them is the job of
//! the consistency check.

use tracing::debug;

use super::{AttributeRef, EntityRef, Project, Search, SearchRef, SearchTarget, VtEntityRef};
use crate::naming;

impl Project {
    /// Resolve all references: foreign keys, searches, view templates
    ///
    /// Idempotent; run it again after any structural change.
    pub fn link(&mut self) {
        let foreign_keys = self.link_foreign_keys();
        let searches = self.link_searches();
        let views = self.link_views();
        debug!(
            project = %self.name,
            foreign_keys,
            searches,
            views,
            "linked project"
        );
    }

    /// Give array attributes named `<Entity>IDs` a foreign key to `<Entity>`
    ///
    /// Only attributes without a foreign key are touched. Returns how many
    /// relations were inferred.
    pub fn infer_array_relations(&mut self) -> usize {
        let index = self.entity_index();
        let mut inferred = 0;

        for ns in &mut self.namespaces {
            for entity in &mut ns.entities {
                for attribute in &mut entity.attributes {
                    if attribute.has_foreign_key() || !attribute.is_ids_array() {
                        continue;
                    }
                    let Some(stem) = naming::strip_ids_suffix(&attribute.name) else {
                        continue;
                    };
                    if let Some(target) = index.get(stem) {
                        debug!(entity = %entity.name, attribute = %attribute.name, target = stem, "inferred array relation");
                        attribute.foreign_key = stem.to_string();
                        attribute.foreign_entity = Some(*target);
                        inferred += 1;
                    }
                }
            }
        }

        inferred
    }

    fn link_foreign_keys(&mut self) -> usize {
        let index = self.entity_index();
        let mut linked = 0;

        for ns in &mut self.namespaces {
            for entity in &mut ns.entities {
                for attribute in &mut entity.attributes {
                    attribute.foreign_entity = if attribute.has_foreign_key() {
                        index.get(&attribute.foreign_key).copied()
                    } else {
                        None
                    };
                    linked += usize::from(attribute.foreign_entity.is_some());
                }
            }
        }

        linked
    }

    fn link_searches(&mut self) -> usize {
        let this: &Project = self;
        let resolved: Vec<(SearchRef, Option<AttributeRef>)> = this
            .entities()
            .flat_map(|(owner, entity)| {
                entity.searches.iter().enumerate().map(move |(si, search)| {
                    let at = SearchRef {
                        entity: owner,
                        search: si,
                    };
                    (at, this.resolve_search(owner, search))
                })
            })
            .collect();

        let mut linked = 0;
        for (at, target) in resolved {
            if let Some(search) = self
                .entity_at_mut(at.entity)
                .and_then(|e| e.searches.get_mut(at.search))
            {
                search.target = target;
                linked += usize::from(target.is_some());
            }
        }
        linked
    }

    /// Resolve the searched attribute relative to the owning entity
    ///
    /// `relation.field` goes through the local foreign-key attribute whose
    /// relation (or target entity) is `relation`, then looks `field` up on the
    /// related entity.
    fn resolve_search(&self, owner: EntityRef, search: &Search) -> Option<AttributeRef> {
        let entity = self.entity_at(owner)?;

        let Some((relation, field)) = search.foreign_path() else {
            return entity.attribute_index(&search.attr_name).map(|attribute| AttributeRef {
                entity: owner,
                attribute,
            });
        };

        let relation = naming::camel_case(relation);
        let via = entity.attributes.iter().find(|a| {
            a.has_foreign_key()
                && (a.relation_name().eq_ignore_ascii_case(&relation)
                    || a.foreign_key.eq_ignore_ascii_case(&relation))
        })?;

        let target = via.foreign_entity?;
        let related = self.entity_at(target)?;
        related
            .attribute_index(&naming::column_name(field))
            .or_else(|| related.attribute_index(field))
            .map(|attribute| AttributeRef {
                entity: target,
                attribute,
            })
    }

    fn link_views(&mut self) -> usize {
        let index = self.entity_index();

        // entity ↔ view template
        for ns in &mut self.namespaces {
            for entity in &mut ns.entities {
                entity.vt = None;
            }
        }
        let pairs: Vec<(VtEntityRef, Option<EntityRef>)> = self
            .vt_entities()
            .map(|(at, vt)| (at, index.get(&vt.name).copied()))
            .collect();

        let mut linked = 0;
        for (at, target) in &pairs {
            self.namespaces[at.namespace].vt_entities[at.entity].entity = *target;
            if let Some(entity) = target.and_then(|t| self.entity_at_mut(t)) {
                entity.vt.get_or_insert(*at);
                linked += 1;
            }
        }

        // fields
        for (at, target) in pairs {
            let resolutions: Vec<(Option<AttributeRef>, Option<SearchTarget>)> = {
                let vt = &self.namespaces[at.namespace].vt_entities[at.entity];
                let owner = target.and_then(|t| self.entity_at(t).map(|e| (t, e)));
                vt.attributes
                    .iter()
                    .map(|field| match owner {
                        Some((owner_ref, owner)) => {
                            let attribute = (!field.attr_name.is_empty())
                                .then(|| owner.attribute_index(&field.attr_name))
                                .flatten()
                                .map(|attribute| AttributeRef {
                                    entity: owner_ref,
                                    attribute,
                                });
                            let search = if field.search_name.is_empty() {
                                None
                            } else if let Some(search) = owner.search_index(&field.search_name) {
                                Some(SearchTarget::Search(SearchRef {
                                    entity: owner_ref,
                                    search,
                                }))
                            } else {
                                owner.attribute_index(&field.search_name).map(|attribute| {
                                    SearchTarget::Attribute(AttributeRef {
                                        entity: owner_ref,
                                        attribute,
                                    })
                                })
                            };
                            (attribute, search)
                        }
                        None => (None, None),
                    })
                    .collect()
            };

            let vt = &mut self.namespaces[at.namespace].vt_entities[at.entity];
            for (field, (attribute, search)) in vt.attributes.iter_mut().zip(resolutions) {
                field.attribute = attribute;
                field.search_target = search;
            }

            let positions: Vec<Option<usize>> = vt
                .templates
                .iter()
                .map(|t| vt.attribute_index(&t.attr_name))
                .collect();
            for (template, position) in vt.templates.iter_mut().zip(positions) {
                template.vt_attribute = position;
            }
        }

        linked
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Attribute, Entity, Search, SearchType, TmplAttribute, VtAttribute, VtEntity};
    use super::*;

    /// portal: News(CategoryID → Category, TagIDs[]), Category
    /// common: Tag, User
    fn project() -> Project {
        let mut project = Project::new("newsportal");

        let portal = project.ensure_namespace("portal");
        let mut news = Entity::new("News", "portal", "portal.news");
        news.attributes.push(Attribute::new("ID", "newsId", "int4"));
        news.attributes.push(Attribute::new("Title", "title", "varchar"));
        let mut category_id = Attribute::new("CategoryID", "categoryId", "int4");
        category_id.foreign_key = "Category".to_string();
        news.attributes.push(category_id);
        let mut author_id = Attribute::new("AuthorID", "authorId", "int4");
        author_id.foreign_key = "User".to_string();
        news.attributes.push(author_id);
        let mut tags = Attribute::new("TagIDs", "tagIds", "int4");
        tags.is_array = true;
        news.attributes.push(tags);
        news.searches.push(Search::new("TitleILike", "Title", SearchType::ILike));
        news.searches.push(Search::new("CategoryTitle", "category.title", SearchType::Equals));
        news.searches.push(Search::new("AuthorLogin", "author.login", SearchType::ILike));
        project.namespaces[portal].entities.push(news);

        let mut category = Entity::new("Category", "portal", "portal.categories");
        category.attributes.push(Attribute::new("ID", "categoryId", "int4"));
        category.attributes.push(Attribute::new("Title", "title", "varchar"));
        project.namespaces[portal].entities.push(category);

        let mut vt = VtEntity::new("News");
        let mut title = VtAttribute::new("Title");
        title.attr_name = "Title".to_string();
        title.search_name = "TitleILike".to_string();
        let mut tags = VtAttribute::new("TagIDs");
        tags.search_name = "TagIDs".to_string();
        vt.attributes = vec![title, tags];
        vt.templates.push(TmplAttribute::new("Title", "Title"));
        project.namespaces[portal].vt_entities.push(vt);

        let common = project.ensure_namespace("common");
        let mut tag = Entity::new("Tag", "common", "common.tags");
        tag.attributes.push(Attribute::new("ID", "tagId", "int4"));
        project.namespaces[common].entities.push(tag);
        let mut user = Entity::new("User", "common", "common.users");
        user.attributes.push(Attribute::new("ID", "userId", "int4"));
        user.attributes.push(Attribute::new("Login", "login", "varchar"));
        project.namespaces[common].entities.push(user);

        project
    }

    fn news(project: &Project) -> &Entity {
        project.entity_by_name("News").unwrap()
    }

    #[test]
    fn test_foreign_keys_resolve_across_namespaces() {
        let mut project = project();
        project.link();

        let author = news(&project).attribute_by_name("AuthorID").unwrap();
        let user = project.foreign_entity(author).unwrap();
        assert_eq!(user.name, "User");
        assert_eq!(user.namespace, "common");

        let category = news(&project).attribute_by_name("CategoryID").unwrap();
        assert_eq!(project.foreign_entity(category).unwrap().name, "Category");
    }

    #[test]
    fn test_unknown_foreign_key_stays_empty() {
        let mut project = project();
        project.namespaces[0].entities[0].attributes[2].foreign_key = "Missing".to_string();
        project.link();
        assert!(project.namespaces[0].entities[0].attributes[2].foreign_entity.is_none());
    }

    #[test]
    fn test_array_relation_inference() {
        let mut project = project();
        assert_eq!(project.infer_array_relations(), 1);

        let tags = news(&project).attribute_by_name("TagIDs").unwrap();
        assert_eq!(tags.foreign_key, "Tag");
        assert_eq!(project.foreign_entity(tags).unwrap().namespace, "common");

        // nothing left to infer
        assert_eq!(project.infer_array_relations(), 0);
    }

    #[test]
    fn test_array_inference_leaves_explicit_keys() {
        let mut project = project();
        project.namespaces[0].entities[0].attributes[4].foreign_key = "User".to_string();
        assert_eq!(project.infer_array_relations(), 0);
        assert_eq!(news(&project).attributes[4].foreign_key, "User");
    }

    #[test]
    fn test_dotted_search_resolves_through_relation() {
        let mut project = project();
        project.link();

        let news = news(&project);
        let search = news.search_by_name("CategoryTitle").unwrap();
        let target = search.target.unwrap();
        assert_eq!(project.entity_at(target.entity).unwrap().name, "Category");
        assert_eq!(project.attribute_at(target).unwrap().name, "Title");

        let login = news.search_by_name("AuthorLogin").unwrap();
        assert_eq!(project.attribute_at(login.target.unwrap()).unwrap().db_name, "login");

        let local = news.search_by_name("TitleILike").unwrap();
        assert_eq!(local.entity(), project.find_entity("News"));
    }

    #[test]
    fn test_view_links() {
        let mut project = project();
        project.link();

        let news_ref = project.find_entity("News").unwrap();
        let vt = project.vt_of(news(&project)).unwrap();
        assert_eq!(vt.entity, Some(news_ref));

        let title = &vt.attributes[0];
        assert_eq!(title.attribute.map(|a| a.attribute), Some(1));
        assert!(matches!(title.search_target, Some(SearchTarget::Search(_))));

        // search name falls back to an attribute of the same name
        let tags = &vt.attributes[1];
        assert!(matches!(
            tags.search_target,
            Some(SearchTarget::Attribute(AttributeRef { attribute: 4, .. }))
        ));
        assert_eq!(vt.templates[0].vt_attribute, Some(0));
    }

    #[test]
    fn test_link_is_idempotent() {
        let mut once = project();
        once.infer_array_relations();
        once.link();
        let mut twice = once.clone();
        twice.link();
        assert_eq!(once, twice);
    }
}
