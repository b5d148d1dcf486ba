//! Per-language UI translation documents
//!
//! One document per language holds the labels of every generated screen.
//! Regeneration only appends missing keys, so edited texts are kept.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::map::TextMap;
use super::xml::{wrapped, Element, XmlError};
use crate::graph::{Namespace, VtEntity};
use crate::naming;

pub const LANG_EN: &str = "en";
pub const LANG_RU: &str = "ru";

const RU_PRESETS: &[(&str, &str)] = &[
    ("add", "Добавить"),
    ("edit", "Редактировать"),
    ("delete", "Удалить"),
    ("user", "Пользователь"),
    ("users", "Пользователи"),
    ("category", "Категория"),
    ("categories", "Категории"),
    ("tag", "Тег"),
    ("tags", "Теги"),
    ("title", "Название"),
    ("description", "Описание"),
    ("foreword", "Краткое содержание"),
    ("content", "Содержание"),
    ("email", "Email"),
    ("login", "Логин"),
    ("password", "Пароль"),
    ("alias", "Алиас"),
    ("status", "Статус"),
    ("statusId", "Статус"),
    ("createdAt", "Создано"),
    ("modifiedAt", "Изменено"),
    ("deletedAt", "Удалено"),
    ("actions", "Действия"),
];

// =============================================================================
// Model
// =============================================================================

/// All labels of one language
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub language: String,
    pub namespaces: Vec<TranslationNamespace>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationNamespace {
    pub name: String,
    pub entities: Vec<TranslationEntity>,
}

/// Labels of one entity's screens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationEntity {
    pub name: String,
    /// Lower camel entity name used as the client-side key
    pub key: String,
    pub crumbs: TextMap,
    pub form: TextMap,
    pub list: TranslationList,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationList {
    pub title: String,
    pub filter: TextMap,
    pub headers: TextMap,
}

impl Translation {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            namespaces: Vec::new(),
        }
    }

    pub fn namespace(&self, name: &str) -> Option<&TranslationNamespace> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    pub fn entity(&self, namespace: &str, entity: &str) -> Option<&TranslationEntity> {
        self.namespace(namespace)?.entities.iter().find(|e| e.name == entity)
    }

    /// Bring the labels of a namespace in line with its view templates
    ///
    /// `only` restricts the entities considered. Missing labels are added
    /// with texts from `dictionary`, the built-in presets or (for English) a
    /// humanized key; existing labels are never changed. Entities whose
    /// screens are not generated lose their labels. Returns how many
    /// entities were filled.
    pub fn sync_namespace(&mut self, namespace: &Namespace, only: Option<&[String]>, dictionary: &TextMap) -> usize {
        let position = match self.namespaces.iter().position(|ns| ns.name == namespace.name) {
            Some(i) => i,
            None => {
                self.namespaces.push(TranslationNamespace {
                    name: namespace.name.clone(),
                    entities: Vec::new(),
                });
                self.namespaces.len() - 1
            }
        };

        let language = self.language.clone();
        let target = &mut self.namespaces[position];
        let mut filled = 0;

        let selected = namespace
            .vt_entities
            .iter()
            .filter(|vt| only.map_or(true, |names| names.iter().any(|n| n == &vt.name)));
        for vt in selected {
            let existing = target.entities.iter().position(|e| e.name == vt.name);

            if !vt.mode.has_templates() {
                if let Some(i) = existing {
                    target.entities.remove(i);
                }
                continue;
            }

            let entity = match existing {
                Some(i) => &mut target.entities[i],
                None => {
                    target.entities.push(TranslationEntity {
                        name: vt.name.clone(),
                        key: naming::var_name(&vt.name),
                        ..TranslationEntity::default()
                    });
                    let last = target.entities.len() - 1;
                    &mut target.entities[last]
                }
            };
            entity.fill(vt, &language, dictionary);
            filled += 1;
        }

        if target.entities.is_empty() {
            self.namespaces.remove(position);
        }
        filled
    }
}

impl TranslationEntity {
    /// Add labels for every screen element of the view template
    pub fn fill(&mut self, vt: &VtEntity, language: &str, dictionary: &TextMap) {
        let t = |key: &str| translate(language, key, dictionary);
        let key = self.key.clone();
        let plural = naming::make_plural(&key);

        self.crumbs.append(format!("{key}List"), t(&plural));
        self.crumbs.append(format!("{key}Add"), t("add"));
        self.crumbs.append(format!("{key}Edit"), t("edit"));
        if self.list.title.is_empty() {
            self.list.title = t(&plural);
        }

        for template in &vt.templates {
            let field = naming::var_name(&template.name);
            let text = if naming::is_status(&field) {
                t("status")
            } else {
                t(&field)
            };

            if !template.form.is_none() {
                self.form.append(field.clone(), text.clone());
            }
            if !template.search.is_none() {
                self.list.filter.append(field.clone(), text.clone());
            }
            if template.list {
                self.list.headers.append(field, text);
            }
        }

        if !self.list.headers.is_empty() {
            self.list.headers.append("actions", t("actions"));
        }
    }

    /// Client-side JSON shape: breadcrumbs plus form/list under the entity key
    pub fn to_json(&self) -> serde_json::Value {
        let mut root = serde_json::Map::new();
        root.insert("breadcrumbs".to_string(), json!(self.crumbs));
        root.insert(
            self.key.clone(),
            json!({
                "form": self.form,
                "list": {
                    "title": self.list.title,
                    "filter": self.list.filter,
                    "headers": self.list.headers,
                },
            }),
        );
        serde_json::Value::Object(root)
    }
}

// =============================================================================
// Texts
// =============================================================================

/// Label text for a key in a language
///
/// The project dictionary wins, then the built-in presets; English falls
/// back to a humanized key, other languages to an empty text.
pub fn translate(language: &str, key: &str, dictionary: &TextMap) -> String {
    if let Some(text) = dictionary.get(key) {
        return text.to_string();
    }
    match language {
        LANG_RU => RU_PRESETS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
            .unwrap_or_default(),
        LANG_EN => humanize(key),
        _ => String::new(),
    }
}

/// `tagIds` → `Tags`, `userId` → `User`, `notExists` → `Not Exists`
pub fn humanize(key: &str) -> String {
    let base = if let Some(stem) = key.strip_suffix("Ids") {
        naming::make_plural(stem)
    } else if let Some(stem) = key.strip_suffix("Id") {
        stem.to_string()
    } else {
        key.to_string()
    };

    let mut words: Vec<String> = Vec::new();
    for c in base.chars() {
        match words.last_mut() {
            Some(word) if !c.is_uppercase() => word.push(c),
            _ => words.push(c.to_string()),
        }
    }
    words
        .iter()
        .map(|w| naming::upper_first(w))
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Codec
// =============================================================================

pub fn decode_translation(element: &Element) -> Result<Translation, XmlError> {
    element.expect_root("Translation")?;

    let namespaces = element
        .list("Namespaces", "Namespace")
        .map(|ns| TranslationNamespace {
            name: ns.attr_str("Name"),
            entities: ns.list("Entities", "Entity").map(decode_entity).collect(),
        })
        .collect();

    Ok(Translation {
        language: element.child_text("Language").unwrap_or_default().to_string(),
        namespaces,
    })
}

fn decode_entity(element: &Element) -> TranslationEntity {
    let map = |parent: Option<&Element>, name: &str| {
        parent
            .and_then(|p| p.find(name))
            .map(TextMap::from_element)
            .unwrap_or_default()
    };
    let list = element.find("List");

    TranslationEntity {
        name: element.attr_str("Name"),
        key: element.attr_str("Key"),
        crumbs: map(Some(element), "Crumbs"),
        form: map(Some(element), "Form"),
        list: TranslationList {
            title: list
                .and_then(|l| l.child_text("Title"))
                .unwrap_or_default()
                .to_string(),
            filter: map(list, "Filter"),
            headers: map(list, "Headers"),
        },
    }
}

pub fn encode_translation(translation: &Translation) -> Element {
    Element::new("Translation")
        .with_attr("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance")
        .with_attr("xmlns:xsd", "http://www.w3.org/2001/XMLSchema")
        .with_child(Element::new("Language").with_text(translation.language.as_str()))
        .with_child(wrapped(
            "Namespaces",
            translation.namespaces.iter().map(|ns| {
                Element::new("Namespace")
                    .with_attr("Name", ns.name.as_str())
                    .with_child(wrapped("Entities", ns.entities.iter().map(encode_entity)))
            }),
        ))
}

fn encode_entity(entity: &TranslationEntity) -> Element {
    let mut list = Element::new("List");
    if !entity.list.title.is_empty() {
        list = list.with_child(Element::new("Title").with_text(entity.list.title.as_str()));
    }
    list = list
        .with_children(entity.list.filter.to_element("Filter"))
        .with_children(entity.list.headers.to_element("Headers"));

    Element::new("Entity")
        .with_attr("Name", entity.name.as_str())
        .with_attr("Key", entity.key.as_str())
        .with_children(entity.crumbs.to_element("Crumbs"))
        .with_children(entity.form.to_element("Form"))
        .with_child(list)
}

#[cfg(test)]
mod tests {
    use super::super::xml::{parse, write};
    use super::*;
    use crate::graph::{InputKind, Mode, TmplAttribute};

    fn portal() -> Namespace {
        let mut ns = Namespace::new("portal");
        let mut news = VtEntity::new("News");
        let mut title = TmplAttribute::new("Title", "Title");
        title.list = true;
        title.form = InputKind::Input;
        title.search = InputKind::Input;
        let mut tags = TmplAttribute::new("TagIDs", "TagIDs");
        tags.form = InputKind::Select;
        let mut status = TmplAttribute::new("StatusID", "StatusID");
        status.list = true;
        news.templates = vec![title, tags, status];
        ns.vt_entities.push(news);

        let mut log = VtEntity::new("AuditLog");
        log.mode = Mode::ReadOnly;
        ns.vt_entities.push(log);
        ns
    }

    #[test]
    fn test_translate_presets() {
        let dictionary = TextMap::new();
        assert_eq!(translate(LANG_EN, "userId", &dictionary), "User");
        assert_eq!(translate(LANG_EN, "tagIds", &dictionary), "Tags");
        assert_eq!(translate(LANG_EN, "notExists", &dictionary), "Not Exists");
        assert_eq!(translate(LANG_EN, "asd", &dictionary), "Asd");
        assert_eq!(translate(LANG_RU, "users", &dictionary), "Пользователи");
        assert_eq!(translate(LANG_RU, "", &dictionary), "");
        assert_eq!(translate("de", "users", &dictionary), "");

        let custom: TextMap = [("users", "Люди")].into_iter().collect();
        assert_eq!(translate(LANG_RU, "users", &custom), "Люди");
    }

    #[test]
    fn test_sync_fills_missing_labels() {
        let mut translation = Translation::new(LANG_EN);
        assert_eq!(translation.sync_namespace(&portal(), None, &TextMap::new()), 1);

        let news = translation.entity("portal", "News").unwrap();
        assert_eq!(news.key, "news");
        assert_eq!(news.crumbs.get("newsList"), Some("News"));
        assert_eq!(news.form.get("title"), Some("Title"));
        assert_eq!(news.form.get("tagIds"), Some("Tags"));
        assert_eq!(news.list.filter.keys().collect::<Vec<_>>(), vec!["title"]);
        assert_eq!(news.list.headers.keys().collect::<Vec<_>>(), vec!["title", "statusId", "actions"]);
        assert_eq!(news.list.headers.get("statusId"), Some("Status"));
        assert!(translation.entity("portal", "AuditLog").is_none());
    }

    #[test]
    fn test_sync_keeps_edited_labels_and_drops_read_only() {
        let mut translation = Translation::new(LANG_EN);
        translation.sync_namespace(&portal(), None, &TextMap::new());
        translation.namespaces[0].entities[0].form.set("title", "Headline");
        translation.namespaces[0].entities.push(TranslationEntity {
            name: "AuditLog".to_string(),
            key: "auditLog".to_string(),
            ..TranslationEntity::default()
        });

        translation.sync_namespace(&portal(), None, &TextMap::new());
        assert_eq!(translation.entity("portal", "News").unwrap().form.get("title"), Some("Headline"));
        assert!(translation.entity("portal", "AuditLog").is_none());
    }

    #[test]
    fn test_sync_respects_entity_filter() {
        let mut translation = Translation::new(LANG_EN);
        let filled = translation.sync_namespace(&portal(), Some(&["Other".to_string()][..]), &TextMap::new());
        assert_eq!(filled, 0);
        assert!(translation.namespaces.is_empty());
    }

    #[test]
    fn test_translation_document_round_trip() {
        let mut translation = Translation::new(LANG_RU);
        translation.sync_namespace(&portal(), None, &TextMap::new());

        let written = write(&encode_translation(&translation), 4).unwrap();
        let decoded = decode_translation(&parse(&written).unwrap()).unwrap();
        assert_eq!(decoded, translation);
        assert_eq!(write(&encode_translation(&decoded), 4).unwrap(), written);
    }

    #[test]
    fn test_entity_json_shape() {
        let mut translation = Translation::new(LANG_EN);
        translation.sync_namespace(&portal(), None, &TextMap::new());
        let json = translation.entity("portal", "News").unwrap().to_json();
        assert_eq!(json["breadcrumbs"]["newsAdd"], "Add");
        assert_eq!(json["news"]["list"]["title"], "News");
        assert_eq!(json["news"]["form"]["title"], "Title");
    }
}
