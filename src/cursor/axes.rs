//! Axes Implementation
//!
//! Every axis is a plain function `&Cursor -> Vec<Cursor>`:
//! - child, parent, self
//! - descendant, descendant-or-self
//! - ancestor, ancestor-or-self
//! - following, following-sibling
//! - preceding, preceding-sibling
//!
//! Results are in document order, except the reverse axes (ancestor,
//! preceding, preceding-sibling) which list the nearest node first.

use super::Cursor;

/// child axis - all child nodes
pub fn child<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    cursor.children()
}

/// parent axis - parent node (at most one)
pub fn parent<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    cursor.parent_cursor().cloned().into_iter().collect()
}

/// self axis - just the context node
pub fn self_axis<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    vec![cursor.clone()]
}

/// descendant axis - all descendants in pre-order
pub fn descendant<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    let mut result = Vec::new();
    collect_descendants(cursor, &mut result);
    result
}

fn collect_descendants<'a>(cursor: &Cursor<'a>, result: &mut Vec<Cursor<'a>>) {
    for c in cursor.children() {
        result.push(c.clone());
        collect_descendants(&c, result);
    }
}

/// descendant-or-self axis - context node plus all descendants
pub fn descendant_or_self<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    let mut result = vec![cursor.clone()];
    collect_descendants(cursor, &mut result);
    result
}

/// ancestor axis - parent, grandparent, ... up to the root
pub fn ancestor<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    let mut result = Vec::new();
    let mut current = cursor.parent_cursor();

    while let Some(parent) = current {
        result.push(parent.clone());
        current = parent.parent_cursor();
    }

    result
}

/// ancestor-or-self axis - context node plus all ancestors
pub fn ancestor_or_self<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    let mut result = vec![cursor.clone()];
    result.extend(ancestor(cursor));
    result
}

/// Siblings sharing the cursor's parent link
fn siblings<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    cursor.parent_arc().map(Cursor::children_of).unwrap_or_default()
}

/// following-sibling axis - all following siblings
pub fn following_sibling<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    let mut siblings = siblings(cursor);
    let start = (cursor.position() + 1).min(siblings.len());
    siblings.split_off(start)
}

/// preceding-sibling axis - all preceding siblings (reverse order)
pub fn preceding_sibling<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    let mut siblings = siblings(cursor);
    siblings.truncate(cursor.position());
    siblings.reverse();
    siblings
}

/// following axis - all nodes after in document order (not descendants)
pub fn following<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    let mut result = Vec::new();

    // Following siblings and their descendants, then the same for every ancestor
    for level in ancestor_or_self(cursor) {
        for sibling in following_sibling(&level) {
            result.push(sibling.clone());
            collect_descendants(&sibling, &mut result);
        }
    }

    result
}

/// preceding axis - all nodes before in reverse document order (not ancestors)
///
/// The nearest node comes first, as with `preceding_sibling` and `ancestor`.
/// Reverse the result for document order.
pub fn preceding<'a>(cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
    let mut result = Vec::new();

    for level in ancestor_or_self(cursor) {
        for sibling in preceding_sibling(&level) {
            let mut subtree = descendant_or_self(&sibling);
            subtree.reverse();
            result.extend(subtree);
        }
    }

    result
}
