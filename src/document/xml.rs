//! Minimal XML element tree over `quick-xml` events
//!
//! Documents are small, so they are read fully into an [`Element`] tree and
//! mapped to the model by hand. Writing goes the other way through a single
//! deterministic writer: attributes in insertion order, fixed indentation,
//! empty elements self-closed and a trailing newline.

use std::str::FromStr;

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

/// Errors raised while decoding or encoding a document
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("document has no root element")]
    Empty,

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot { expected: &'static str, found: String },

    #[error("invalid value {value:?} for {element}@{attribute}")]
    InvalidValue {
        element: String,
        attribute: String,
        value: String,
    },
}

/// One element: name, ordered attributes, text and child elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------------
    // Building
    // -------------------------------------------------------------------------

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Add the attribute only when `value` is not empty
    pub fn with_attr_nonempty(self, key: impl Into<String>, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.with_attr(key, value)
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    // -------------------------------------------------------------------------
    // Reading
    // -------------------------------------------------------------------------

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, empty when missing
    pub fn attr_str(&self, key: &str) -> String {
        self.attr(key).unwrap_or_default().to_string()
    }

    /// Parse an attribute, `None` when missing or empty
    pub fn attr_parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, XmlError> {
        match self.attr(key) {
            None | Some("") => Ok(None),
            Some(raw) => raw.trim().parse().map(Some).map_err(|_| self.invalid(key, raw)),
        }
    }

    /// Boolean attribute, `false` when missing
    pub fn attr_bool(&self, key: &str) -> Result<bool, XmlError> {
        Ok(self.attr_opt_bool(key)?.unwrap_or(false))
    }

    /// Tri-state boolean attribute
    pub fn attr_opt_bool(&self, key: &str) -> Result<Option<bool>, XmlError> {
        match self.attr(key).map(str::trim) {
            None | Some("") => Ok(None),
            Some("true") | Some("1") => Ok(Some(true)),
            Some("false") | Some("0") => Ok(Some(false)),
            Some(raw) => Err(self.invalid(key, raw)),
        }
    }

    /// Integer attribute, zero when missing
    pub fn attr_int(&self, key: &str) -> Result<i64, XmlError> {
        Ok(self.attr_parse(key)?.unwrap_or(0))
    }

    pub fn invalid(&self, key: &str, value: &str) -> XmlError {
        XmlError::InvalidValue {
            element: self.name.clone(),
            attribute: key.to_string(),
            value: value.to_string(),
        }
    }

    /// First child with the given name
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Items of a wrapped list such as `<Attributes><Attribute/>...</Attributes>`
    pub fn list<'a>(&'a self, wrapper: &'a str, item: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.find_all(wrapper).flat_map(move |w| w.find_all(item))
    }

    /// Text of the first child with the given name
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.find(name).map(|c| c.text.as_str())
    }

    /// Fail unless this element has the expected name
    pub fn expect_root(&self, expected: &'static str) -> Result<(), XmlError> {
        if self.name == expected {
            Ok(())
        } else {
            Err(XmlError::UnexpectedRoot {
                expected,
                found: self.name.clone(),
            })
        }
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }
}

/// Wrap a list of items: `<wrapper>items...</wrapper>`
pub fn wrapped(wrapper: &str, items: impl IntoIterator<Item = Element>) -> Element {
    Element::new(wrapper).with_children(items)
}

/// `<wrapper><string>v</string>...</wrapper>` list of plain strings
pub fn string_list(wrapper: &str, values: &[String]) -> Element {
    wrapped(
        wrapper,
        values.iter().map(|v| Element::new("string").with_text(v.as_str())),
    )
}

/// Read a `<wrapper><string>..</string></wrapper>` list back
pub fn read_string_list(parent: &Element, wrapper: &str) -> Vec<String> {
    parent
        .list(wrapper, "string")
        .map(|e| e.text.clone())
        .filter(|s| !s.is_empty())
        .collect()
}

// =============================================================================
// Codec
// =============================================================================

/// Parse a document into its root element
pub fn parse(input: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(input);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(mut element) = stack.pop() {
                    // indentation, not content
                    let blank = element.text.trim().is_empty();
                    if blank && (!element.children.is_empty() || element.text.contains('\n')) {
                        element.text.clear();
                    }
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }
    root.ok_or(XmlError::Empty)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Serialize a root element with an XML declaration
pub fn write(root: &Element, indent: usize) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', indent);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write_element(&mut writer, root)?;

    // JSON search paths stay readable
    let mut out = String::from_utf8_lossy(&writer.into_inner()).replace("-&gt;", "->");
    out.push('\n');
    Ok(out)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if !element.text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(&element.text)))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let doc = r#"<?xml version="1.0"?>
<Package>
    <Name>portal</Name>
    <Entities>
        <Entity Name="News" Table="portal.news"/>
        <Entity Name="Category"></Entity>
    </Entities>
</Package>"#;
        let root = parse(doc).unwrap();
        assert_eq!(root.name, "Package");
        assert_eq!(root.child_text("Name"), Some("portal"));
        let names: Vec<_> = root.list("Entities", "Entity").filter_map(|e| e.attr("Name")).collect();
        assert_eq!(names, vec!["News", "Category"]);
    }

    #[test]
    fn test_write_is_stable() {
        let root = Element::new("Package")
            .with_child(Element::new("Name").with_text("portal"))
            .with_child(wrapped(
                "Searches",
                [Element::new("Search").with_attr("AttrName", "Params->lang")],
            ))
            .with_child(Element::new("Empty"));

        let first = write(&root, 4).unwrap();
        assert!(first.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Package>"));
        assert!(first.contains("\n    <Name>portal</Name>\n"));
        assert!(first.contains(r#"<Search AttrName="Params->lang"/>"#));
        assert!(first.contains("<Empty/>"));
        assert!(first.ends_with("</Package>\n"));

        let second = write(&parse(&first).unwrap(), 4).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_escaped_values_round_trip() {
        let root = Element::new("Form").with_attr("Title", "a \"b\" & <c>").with_text("x < y");
        let parsed = parse(&write(&root, 4).unwrap()).unwrap();
        assert_eq!(parsed.attr("Title"), Some("a \"b\" & <c>"));
        assert_eq!(parsed.text, "x < y");
    }

    #[test]
    fn test_text_keeps_edge_spaces() {
        let root = Element::new("Dictionary")
            .with_child(Element::new("Entry").with_attr("Key", "suffix").with_text(" items"))
            .with_child(Element::new("Entry").with_attr("Key", "padded").with_text("  a b  "));
        let written = write(&root, 4).unwrap();
        let parsed = parse(&written).unwrap();

        assert_eq!(parsed.text, "");
        let texts: Vec<_> = parsed.children.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec![" items", "  a b  "]);
        assert_eq!(write(&parsed, 4).unwrap(), written);

        let indented = parse("<List>\n    <Headers>\n    </Headers>\n</List>").unwrap();
        assert_eq!(indented.children[0].text, "");
    }

    #[test]
    fn test_attribute_parsing() {
        let root = parse(r#"<Attribute PK="true" Addable="false" Max="10" Min="x"/>"#).unwrap();
        assert!(root.attr_bool("PK").unwrap());
        assert_eq!(root.attr_opt_bool("Addable").unwrap(), Some(false));
        assert_eq!(root.attr_opt_bool("Updatable").unwrap(), None);
        assert_eq!(root.attr_int("Max").unwrap(), 10);
        assert!(matches!(root.attr_int("Min"), Err(XmlError::InvalidValue { .. })));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(parse(""), Err(XmlError::Empty)));
        assert!(parse("<Package><Name>x</Package>").is_err());
        assert!(parse("<Package>").is_err());
    }
}
