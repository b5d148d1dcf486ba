//! Ordered key/text map stored as `<key>text</key>` children

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::xml::Element;

/// Insertion-ordered string map
///
/// Appending never overwrites, so texts a human already edited survive a
/// regeneration that proposes new defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMap {
    entries: Vec<(String, String)>,
}

impl TextMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add when the key is absent; returns whether it was added
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, value.into()));
        true
    }

    /// Add or overwrite
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Add every entry of `other` whose key is absent here
    pub fn append_all(&mut self, other: &TextMap) {
        for (key, value) in other.iter() {
            self.append(key, value);
        }
    }

    /// `<name><key>value</key>...</name>`, or nothing when empty
    pub fn to_element(&self, name: &str) -> Option<Element> {
        if self.is_empty() {
            return None;
        }
        Some(
            Element::new(name).with_children(
                self.entries
                    .iter()
                    .map(|(k, v)| Element::new(k.as_str()).with_text(v.as_str())),
            ),
        )
    }

    pub fn from_element(element: &Element) -> Self {
        element
            .children
            .iter()
            .map(|c| (c.name.clone(), c.text.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TextMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.append(k, v);
        }
        map
    }
}

impl Serialize for TextMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TextMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TextMapVisitor;

        impl<'de> Visitor<'de> for TextMapVisitor {
            type Value = TextMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TextMap, A::Error> {
                let mut map = TextMap::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    map.append(k, v);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(TextMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_does_not_overwrite() {
        let mut map = TextMap::new();
        assert!(map.append("title", "Новости"));
        assert!(!map.append("title", "News"));
        assert_eq!(map.get("title"), Some("Новости"));

        map.set("title", "News");
        assert_eq!(map.get("title"), Some("News"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_insertion_order() {
        let map: TextMap = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"b":"2","a":"1"}"#);
    }

    #[test]
    fn test_element_round_trip() {
        let map: TextMap = [("newsList", "News"), ("newsAdd", "Add")].into_iter().collect();
        let element = map.to_element("Crumbs").unwrap();
        assert_eq!(TextMap::from_element(&element), map);
        assert!(TextMap::new().to_element("Crumbs").is_none());
    }
}
