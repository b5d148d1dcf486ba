//! Model ↔ element mapping for manifest, structural and view-template documents
//!
//! Attribute order on write is fixed; optional attributes are omitted when
//! empty so that hand-written documents stay small.

use super::map::TextMap;
use super::xml::{read_string_list, string_list, wrapped, Element, XmlError};
use crate::graph::{
    Attribute, CustomType, Entity, InputKind, Mode, Namespace, Nullable, Project, Search, SearchType, TmplAttribute,
    VtAttribute, VtEntity,
};

const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD: &str = "http://www.w3.org/2001/XMLSchema";

fn root(name: &str) -> Element {
    Element::new(name).with_attr("xmlns:xsi", XSI).with_attr("xmlns:xsd", XSD)
}

fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn required<T: std::str::FromStr + Default>(element: &Element, key: &str) -> Result<T, XmlError> {
    Ok(element.attr_parse(key)?.unwrap_or_default())
}

// =============================================================================
// Manifest
// =============================================================================

/// Manifest contents; namespaces are read from their own documents
pub fn decode_manifest(element: &Element) -> Result<Project, XmlError> {
    element.expect_root("Project")?;

    let mut languages = read_string_list(element, "Languages");
    if languages.is_empty() {
        languages.push("en".to_string());
    }

    let custom_types = element
        .list("CustomTypes", "CustomType")
        .map(|e| CustomType {
            db_type: e.attr_str("DBType"),
            code_type: e.attr_str("GoType"),
            import: e.attr_str("GoImport"),
        })
        .collect();

    Ok(Project {
        name: element.child_text("Name").unwrap_or_default().to_string(),
        namespace_names: read_string_list(element, "PackageNames"),
        languages,
        custom_types,
        dictionary: element.find("Dictionary").map(TextMap::from_element).unwrap_or_default(),
        namespaces: Vec::new(),
    })
}

pub fn encode_manifest(project: &Project) -> Element {
    let mut element = root("Project")
        .with_child(Element::new("Name").with_text(project.name.as_str()))
        .with_child(string_list("PackageNames", &project.namespace_names))
        .with_child(string_list("Languages", &project.languages));

    if !project.custom_types.is_empty() {
        element = element.with_child(wrapped(
            "CustomTypes",
            project.custom_types.iter().map(|t| {
                Element::new("CustomType")
                    .with_attr("DBType", t.db_type.as_str())
                    .with_attr("GoType", t.code_type.as_str())
                    .with_attr_nonempty("GoImport", &t.import)
            }),
        ));
    }
    if let Some(dictionary) = project.dictionary.to_element("Dictionary") {
        element = element.with_child(dictionary);
    }
    element
}

// =============================================================================
// Structural namespace
// =============================================================================

pub fn decode_namespace(element: &Element, fallback_name: &str) -> Result<Namespace, XmlError> {
    element.expect_root("Package")?;

    let name = match element.child_text("Name") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => fallback_name.to_string(),
    };

    let entities = element
        .list("Entities", "Entity")
        .map(|e| decode_entity(e, &name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Namespace {
        name,
        entities,
        vt_entities: Vec::new(),
    })
}

fn decode_entity(element: &Element, namespace: &str) -> Result<Entity, XmlError> {
    let attributes = element
        .list("Attributes", "Attribute")
        .map(decode_attribute)
        .collect::<Result<Vec<_>, _>>()?;
    let searches = element
        .list("Searches", "Search")
        .map(decode_search)
        .collect::<Result<Vec<_>, _>>()?;

    let mut entity = Entity::new(element.attr_str("Name"), element.attr_str("Namespace"), element.attr_str("Table"));
    if entity.namespace.is_empty() {
        entity.namespace = namespace.to_string();
    }
    entity.attributes = attributes;
    entity.searches = searches;
    Ok(entity)
}

fn decode_attribute(element: &Element) -> Result<Attribute, XmlError> {
    Ok(Attribute {
        name: element.attr_str("Name"),
        db_name: element.attr_str("DBName"),
        db_type: element.attr_str("DBType"),
        code_type: element.attr_str("GoType"),
        is_array: element.attr_bool("IsArray")?,
        disable_pointer: element.attr_bool("DisablePointer")?,
        primary_key: element.attr_bool("PK")?,
        foreign_key: element.attr_str("FK"),
        foreign_entity: None,
        nullable: required::<Nullable>(element, "Nullable")?,
        addable: element.attr_opt_bool("Addable")?,
        updatable: element.attr_opt_bool("Updatable")?,
        min: element.attr_int("Min")?,
        max: element.attr_int("Max")?,
        default: element.attr_str("Default"),
    })
}

fn decode_search(element: &Element) -> Result<Search, XmlError> {
    let raw = element.attr("SearchType").unwrap_or_default();
    let search_type: SearchType = raw.parse().map_err(|_| element.invalid("SearchType", raw))?;
    let name = element.attr_str("Name");
    if name.is_empty() {
        return Ok(Search::conventional(element.attr_str("AttrName"), search_type));
    }
    Ok(Search::new(name, element.attr_str("AttrName"), search_type))
}

pub fn encode_namespace(namespace: &Namespace) -> Element {
    root("Package")
        .with_child(Element::new("Name").with_text(namespace.name.as_str()))
        .with_child(wrapped("Entities", namespace.entities.iter().map(encode_entity)))
}

fn encode_entity(entity: &Entity) -> Element {
    let mut element = Element::new("Entity")
        .with_attr("Name", entity.name.as_str())
        .with_attr("Namespace", entity.namespace.as_str())
        .with_attr("Table", entity.table.as_str())
        .with_child(wrapped("Attributes", entity.attributes.iter().map(encode_attribute)));

    if !entity.searches.is_empty() {
        element = element.with_child(wrapped("Searches", entity.searches.iter().map(encode_search)));
    }
    element
}

fn encode_attribute(attribute: &Attribute) -> Element {
    let mut element = Element::new("Attribute")
        .with_attr("Name", attribute.name.as_str())
        .with_attr("DBName", attribute.db_name.as_str());
    if attribute.is_array {
        element = element.with_attr("IsArray", "true");
    }
    if attribute.disable_pointer {
        element = element.with_attr("DisablePointer", "true");
    }
    element = element
        .with_attr_nonempty("DBType", &attribute.db_type)
        .with_attr_nonempty("GoType", &attribute.code_type)
        .with_attr("PK", flag(attribute.primary_key))
        .with_attr_nonempty("FK", &attribute.foreign_key)
        .with_attr("Nullable", attribute.nullable.as_str());
    if let Some(addable) = attribute.addable {
        element = element.with_attr("Addable", flag(addable));
    }
    if let Some(updatable) = attribute.updatable {
        element = element.with_attr("Updatable", flag(updatable));
    }
    element
        .with_attr("Min", attribute.min.to_string())
        .with_attr("Max", attribute.max.to_string())
        .with_attr_nonempty("Default", &attribute.default)
}

fn encode_search(search: &Search) -> Element {
    Element::new("Search")
        .with_attr("Name", search.name.as_str())
        .with_attr("AttrName", search.attr_name.as_str())
        .with_attr("SearchType", search.search_type.as_str())
}

// =============================================================================
// View-template namespace
// =============================================================================

pub fn decode_vt_namespace(element: &Element) -> Result<Vec<VtEntity>, XmlError> {
    element.expect_root("VTNamespace")?;
    element
        .list("VTEntities", "Entity")
        .map(decode_vt_entity)
        .collect()
}

fn decode_vt_entity(element: &Element) -> Result<VtEntity, XmlError> {
    let mode = match element.attr("Mode") {
        Some(raw) if !raw.is_empty() => raw.parse::<Mode>().map_err(|_| element.invalid("Mode", raw))?,
        // documents older than display modes
        _ if element.attr_bool("NoTemplates")? => Mode::ReadOnly,
        _ => Mode::Full,
    };

    let attributes = element
        .list("Attributes", "Attribute")
        .map(decode_vt_attribute)
        .collect::<Result<Vec<_>, _>>()?;
    let templates = element
        .list("Template", "Attribute")
        .map(decode_tmpl_attribute)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VtEntity {
        name: element.attr_str("Name"),
        mode,
        terminal_path: element.child_text("TerminalPath").unwrap_or_default().to_string(),
        attributes,
        templates,
        entity: None,
    })
}

fn decode_vt_attribute(element: &Element) -> Result<VtAttribute, XmlError> {
    Ok(VtAttribute {
        name: element.attr_str("Name"),
        attr_name: element.attr_str("AttrName"),
        search_name: element.attr_str("SearchName"),
        summary: element.attr_bool("Summary")?,
        search: element.attr_bool("Search")?,
        max: element.attr_int("Max")?,
        min: element.attr_int("Min")?,
        required: element.attr_bool("Required")?,
        validate: element.attr_str("Validate"),
        attribute: None,
        search_target: None,
    })
}

fn decode_tmpl_attribute(element: &Element) -> Result<TmplAttribute, XmlError> {
    Ok(TmplAttribute {
        name: element.attr_str("Name"),
        attr_name: element.attr_str("VTAttrName"),
        list: element.attr_bool("List")?,
        fk_opts: element.attr_str("FKOpts"),
        form: required::<InputKind>(element, "Form")?,
        search: required::<InputKind>(element, "Search")?,
        vt_attribute: None,
    })
}

pub fn encode_vt_namespace(entities: &[VtEntity]) -> Element {
    root("VTNamespace").with_child(wrapped("VTEntities", entities.iter().map(encode_vt_entity)))
}

fn encode_vt_entity(vt: &VtEntity) -> Element {
    Element::new("Entity")
        .with_attr("Name", vt.name.as_str())
        .with_attr("Mode", vt.mode.as_str())
        .with_child(Element::new("TerminalPath").with_text(vt.terminal_path.as_str()))
        .with_child(wrapped(
            "Attributes",
            vt.attributes.iter().map(|a| {
                Element::new("Attribute")
                    .with_attr("Name", a.name.as_str())
                    .with_attr_nonempty("AttrName", &a.attr_name)
                    .with_attr_nonempty("SearchName", &a.search_name)
                    .with_attr("Summary", flag(a.summary))
                    .with_attr("Search", flag(a.search))
                    .with_attr("Max", a.max.to_string())
                    .with_attr("Min", a.min.to_string())
                    .with_attr("Required", flag(a.required))
                    .with_attr("Validate", a.validate.as_str())
            }),
        ))
        .with_child(wrapped(
            "Template",
            vt.templates.iter().map(|t| {
                Element::new("Attribute")
                    .with_attr("Name", t.name.as_str())
                    .with_attr("VTAttrName", t.attr_name.as_str())
                    .with_attr("List", flag(t.list))
                    .with_attr_nonempty("FKOpts", &t.fk_opts)
                    .with_attr("Form", t.form.as_str())
                    .with_attr("Search", t.search.as_str())
            }),
        ))
}
