//! Predicates and Terminal Steps
//!
//! Predicates are axes from a cursor to itself or nothing, so they slot into
//! any composition. Terminal steps extract text and yield `&str` instead of
//! cursors. None of them fail: a mismatch is an empty list.

use super::Cursor;
use crate::dom::{Element, Name};

/// Keep the cursor when `keep` holds
pub fn check<'a, F>(keep: F) -> impl Fn(&Cursor<'a>) -> Vec<Cursor<'a>> + Clone
where
    F: Fn(&Cursor<'a>) -> bool + Clone,
{
    move |c: &Cursor<'a>| if keep(c) { vec![c.clone()] } else { Vec::new() }
}

/// Keep element cursors whose element satisfies `keep`
pub fn check_element<'a, F>(keep: F) -> impl Fn(&Cursor<'a>) -> Vec<Cursor<'a>> + Clone
where
    F: Fn(&Element) -> bool + Clone,
{
    check(move |c: &Cursor<'a>| c.element().is_some_and(&keep))
}

/// Elements with exactly this name (local name and namespace)
pub fn element<'a>(name: impl Into<Name>) -> impl Fn(&Cursor<'a>) -> Vec<Cursor<'a>> + Clone {
    let name = name.into();
    check_element(move |e: &Element| e.name == name)
}

/// Elements whose local name matches ignoring ASCII case, in any namespace
pub fn lax_element<'a>(local: impl Into<String>) -> impl Fn(&Cursor<'a>) -> Vec<Cursor<'a>> + Clone {
    let local = local.into();
    check_element(move |e: &Element| e.name.local_name().eq_ignore_ascii_case(&local))
}

/// Any element node
pub fn any_element<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    match cursor.element() {
        Some(_) => vec![cursor.clone()],
        None => Vec::new(),
    }
}

/// Elements carrying the attribute with exactly this value
pub fn attribute_is<'a>(
    name: impl Into<Name>,
    value: impl Into<String>,
) -> impl Fn(&Cursor<'a>) -> Vec<Cursor<'a>> + Clone {
    let name = name.into();
    let value = value.into();
    check_element(move |e: &Element| e.attributes.get(&name) == Some(&value))
}

/// Elements carrying the attribute with any value
pub fn has_attribute<'a>(name: impl Into<Name>) -> impl Fn(&Cursor<'a>) -> Vec<Cursor<'a>> + Clone {
    let name = name.into();
    check_element(move |e: &Element| e.attributes.contains_key(&name))
}

/// Text of a content node; nothing for any other node
pub fn content<'a>(cursor: &Cursor<'a>) -> Vec<&'a str> {
    cursor.content().into_iter().collect()
}

/// Value of the named attribute on an element cursor
pub fn attribute<'a>(name: impl Into<Name>) -> impl Fn(&Cursor<'a>) -> Vec<&'a str> + Clone {
    let name = name.into();
    move |c: &Cursor<'a>| {
        c.element()
            .and_then(|e| e.attributes.get(&name))
            .map(String::as_str)
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{child, descendant, AxisExt};
    use crate::dom::Node;

    fn list() -> Element {
        Element::new("ul")
            .with_child(Element::new("li").with_attribute("class", "a").with_text("1"))
            .with_child(Node::comment("skip"))
            .with_child(Element::new("LI").with_attribute("class", "b").with_text("2"))
            .with_child(Element::new("{urn:x}li").with_attribute("id", "x"))
    }

    fn count<'a, A: crate::cursor::Axis<'a>>(cursor: &Cursor<'a>, axis: A) -> usize {
        cursor.select_children(&axis).len()
    }

    #[test]
    fn test_element_uses_name_equality() {
        let root = list();
        let cursor = Cursor::from_element(&root);
        assert_eq!(count(&cursor, element("li")), 1);
        assert_eq!(count(&cursor, element("{urn:x}li")), 1);
        assert_eq!(count(&cursor, element(Name::namespaced("li", "urn:x"))), 1);
    }

    #[test]
    fn test_lax_element() {
        let root = list();
        let cursor = Cursor::from_element(&root);
        assert_eq!(count(&cursor, lax_element("li")), 3);
    }

    #[test]
    fn test_non_element_yields_empty() {
        let text = Node::content("title");
        let cursor = Cursor::from_node(&text);
        assert!(cursor.select(&element("title")).is_empty());
        assert!(cursor.select(&any_element).is_empty());
        assert!(cursor.select(&attribute("class")).is_empty());
        assert_eq!(cursor.select(&content), vec!["title"]);
    }

    #[test]
    fn test_attribute_filters() {
        let root = list();
        let cursor = Cursor::from_element(&root);
        assert_eq!(count(&cursor, attribute_is("class", "b")), 1);
        assert_eq!(count(&cursor, attribute_is("class", "c")), 0);
        assert_eq!(count(&cursor, attribute_is("missing", "")), 0);
        assert_eq!(count(&cursor, has_attribute("class")), 2);
        assert_eq!(cursor.select_children(&attribute("class")), vec!["a", "b"]);
    }

    #[test]
    fn test_any_element_and_check() {
        let root = list();
        let cursor = Cursor::from_element(&root);
        assert_eq!(count(&cursor, any_element), 3);
        assert_eq!(count(&cursor, check(|c: &Cursor<'_>| c.position() > 1)), 2);
        assert_eq!(count(&cursor, check_element(|e: &Element| e.children.is_empty())), 1);
    }

    #[test]
    fn test_content_after_descendant() {
        let root = list();
        let cursor = Cursor::from_element(&root);
        let texts = cursor.select(&child.then(lax_element("li")).then(descendant).then(content));
        assert_eq!(texts.concat(), "12");
    }
}
