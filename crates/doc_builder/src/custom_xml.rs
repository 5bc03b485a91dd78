//! Custom XML data parts
//!
//! A custom XML part is identified by the `ds:itemID` of its properties
//! part. Content controls bind to it through `w:dataBinding/@w:storeItemID`.

use crate::context::BuildContext;
use crate::error::BuildResult;
use store::xml::fragment_descendants;
use store::{ns, relationship_types as rt, Element, Package, PartKind};

/// Item id in the form used for comparisons: no braces, lowercase
pub fn normalize_item_id(id: &str) -> String {
    id.trim().trim_matches(|c| c == '{' || c == '}').to_lowercase()
}

/// Item ids bound by content controls in `content`
pub fn bound_item_ids(content: &[Element]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in fragment_descendants(content)
        .filter(|e| e.is(ns::W, "dataBinding"))
        .filter_map(|e| e.attr(ns::W, "storeItemID"))
        .map(normalize_item_id)
    {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Custom XML parts of `src_main` as (part name, properties part name, item id)
fn custom_xml_items(src: &Package, src_main: &str) -> Vec<(String, String, String)> {
    src.related_parts_by_type(src_main, rt::CUSTOM_XML)
        .into_iter()
        .filter_map(|(_, item)| {
            let props = src.related_part_by_type(&item, rt::CUSTOM_XML_PROPS)?;
            let item_id = src.xml(&props)?.attr(ns::DS, "itemID")?.to_string();
            Some((item, props, item_id))
        })
        .collect()
}

/// Copy every custom XML part of `src` whose item id passes `wanted`.
/// Each item is copied at most once per build.
pub fn copy_custom_xml_parts(
    src: &Package,
    src_main: &str,
    out: &mut Package,
    out_main: &str,
    wanted: impl Fn(&str) -> bool,
    ctx: &mut BuildContext,
) -> BuildResult<usize> {
    let mut copied = 0;
    for (item, props, item_id) in custom_xml_items(src, src_main) {
        let normalized = normalize_item_id(&item_id);
        if !wanted(&normalized) || ctx.custom_xml_items.contains(&normalized) {
            continue;
        }
        let (Some(item_part), Some(props_part)) = (src.part(&item), src.part(&props)) else {
            continue;
        };
        let new_item = out.add_part(out_main, PartKind::CustomXml, item_part.content.clone())?;
        out.add_part(&new_item.name, PartKind::CustomXmlProperties, props_part.content.clone())?;
        tracing::debug!("Copied custom XML item {} to {}", item_id, new_item.name);
        ctx.custom_xml_items.insert(normalized);
        copied += 1;
    }
    Ok(copied)
}

/// Copy the custom XML parts that content controls in `content` bind to
pub fn copy_bound_custom_xml(
    src: &Package,
    src_main: &str,
    out: &mut Package,
    out_main: &str,
    content: &[Element],
    ctx: &mut BuildContext,
) -> BuildResult<usize> {
    let bound = bound_item_ids(content);
    if bound.is_empty() {
        return Ok(0);
    }
    copy_custom_xml_parts(src, src_main, out, out_main, |id| bound.iter().any(|b| b == id), ctx)
}
