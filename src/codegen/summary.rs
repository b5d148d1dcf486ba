//! General-purpose packer: the checked model as plain JSON
//!
//! Exposes namespaces, entities, attributes and searches with their relations
//! already resolved, plus precomputed naming variants, so ad-hoc templates do
//! not need a dedicated packer.

use serde_json::{json, Value};

use super::{CodegenContext, Packer};
use crate::error::Result;
use crate::graph::{Attribute, Entity, Namespace, Search, VtEntity};
use crate::naming;

#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryPacker;

impl Packer for SummaryPacker {
    fn pack(&self, ctx: &CodegenContext<'_>, namespaces: &[&Namespace]) -> Result<Value> {
        let project = ctx.project();
        Ok(json!({
            "project": project.name,
            "languages": project.languages,
            "namespaces": namespaces.iter().map(|ns| pack_namespace(ctx, ns)).collect::<Vec<_>>(),
        }))
    }
}

fn pack_namespace(ctx: &CodegenContext<'_>, namespace: &Namespace) -> Value {
    json!({
        "name": namespace.name,
        "var": naming::var_name(&namespace.name),
        "entities": namespace.entities.iter().map(|e| pack_entity(ctx, e)).collect::<Vec<_>>(),
    })
}

fn pack_entity(ctx: &CodegenContext<'_>, entity: &Entity) -> Value {
    let primary_keys: Vec<&str> = entity.primary_keys().map(|a| a.name.as_str()).collect();
    json!({
        "name": entity.name,
        "namespace": entity.namespace,
        "table": entity.table,
        "var": naming::var_name(&entity.name),
        "collection": naming::make_plural(&entity.name),
        "url": naming::url_name(&entity.name),
        "receiver": naming::short_var_name(&entity.name),
        "primaryKeys": primary_keys,
        "multiplePks": entity.has_multiple_pks(),
        "titleAttribute": entity.title_attribute().map(|a| a.name.as_str()),
        "attributes": entity.attributes.iter().map(|a| pack_attribute(ctx, a)).collect::<Vec<_>>(),
        "searches": entity.searches.iter().map(|s| pack_search(ctx, s)).collect::<Vec<_>>(),
        "vt": ctx.vt_entity(entity).map(pack_vt_entity),
    })
}

fn pack_attribute(ctx: &CodegenContext<'_>, attribute: &Attribute) -> Value {
    let foreign = ctx.foreign_entity(attribute).map(|e| {
        json!({
            "name": e.name,
            "namespace": e.namespace,
            "table": e.table,
        })
    });

    json!({
        "name": attribute.name,
        "var": naming::var_name(&attribute.name),
        "dbName": attribute.db_name,
        "dbType": attribute.db_type,
        "codeType": attribute.code_type,
        "kind": kind(attribute),
        "isArray": attribute.is_array,
        "isIdsArray": attribute.is_ids_array(),
        "primaryKey": attribute.primary_key,
        "nullable": attribute.nullable.as_str(),
        "isNullable": attribute.is_nullable(),
        "addable": attribute.is_addable(),
        "updatable": attribute.is_updatable(),
        "min": attribute.min,
        "max": attribute.max,
        "default": attribute.default,
        "foreignKey": attribute.foreign_key,
        "foreignEntity": foreign,
    })
}

/// Coarse storage kind, for templates that switch on it
fn kind(attribute: &Attribute) -> &'static str {
    if attribute.is_integer() {
        "integer"
    } else if attribute.is_string() {
        "string"
    } else if attribute.is_bool() {
        "bool"
    } else if attribute.is_datetime() {
        "datetime"
    } else if attribute.is_json() {
        "json"
    } else {
        "other"
    }
}

fn pack_search(ctx: &CodegenContext<'_>, search: &Search) -> Value {
    let filter = search.search_type.filter();
    let target = ctx.search_target(search).map(|(entity, attribute)| {
        json!({
            "entity": entity.name,
            "attribute": attribute.name,
            "dbName": attribute.db_name,
        })
    });

    json!({
        "name": search.name,
        "attrName": search.attr_name,
        "searchType": search.search_type.as_str(),
        "filter": {
            "name": filter.name,
            "exclude": filter.exclude,
            "isArray": filter.is_array,
        },
        "target": target,
    })
}

fn pack_vt_entity(vt: &VtEntity) -> Value {
    let names = |templates: Vec<&str>| templates.into_iter().map(naming::var_name).collect::<Vec<_>>();
    json!({
        "name": vt.name,
        "mode": vt.mode.as_str(),
        "terminalPath": vt.terminal_path,
        "list": names(vt.list_templates().map(|t| t.name.as_str()).collect()),
        "form": names(vt.form_templates().map(|t| t.name.as_str()).collect()),
        "search": names(vt.search_templates().map(|t| t.name.as_str()).collect()),
    })
}
