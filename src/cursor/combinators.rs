//! Axis Composition
//!
//! An [`Axis`] maps one cursor to an ordered list. Composition is an explicit
//! flat-map: every result of the left axis feeds the right one and the
//! per-cursor lists are concatenated in order.
//!
//! | form            | meaning                                               |
//! |-----------------|-------------------------------------------------------|
//! | `a.then(b)`     | `b` applied to every result of `a`                    |
//! | `a.then_child(b)` | `b` applied to the children of every result of `a`  |
//! | `a.then_descendant(b)` | `b` applied to the descendants of every result |
//! | `or_self(a)`    | the cursor itself followed by the results of `a`      |

use super::axes::descendant;
use super::Cursor;

/// A query step from one cursor to an ordered list of results
///
/// Plain functions and closures of the shape `Fn(&Cursor<'a>) -> Vec<T>` are
/// axes; the composition types below are axes too.
pub trait Axis<'a> {
    type Item;

    fn apply(&self, cursor: &Cursor<'a>) -> Vec<Self::Item>;
}

impl<'a, F, T> Axis<'a> for F
where
    F: Fn(&Cursor<'a>) -> Vec<T>,
{
    type Item = T;

    #[inline]
    fn apply(&self, cursor: &Cursor<'a>) -> Vec<T> {
        self(cursor)
    }
}

#[inline]
fn flat_map<'a, A: Axis<'a>>(cursors: &[Cursor<'a>], axis: &A) -> Vec<A::Item> {
    let mut result = Vec::new();
    for cursor in cursors {
        result.extend(axis.apply(cursor));
    }
    result
}

/// `first` then `next` on each of its results
#[derive(Clone, Debug)]
pub struct Then<A, B> {
    first: A,
    next: B,
}

impl<'a, A, B> Axis<'a> for Then<A, B>
where
    A: Axis<'a, Item = Cursor<'a>>,
    B: Axis<'a>,
{
    type Item = B::Item;

    fn apply(&self, cursor: &Cursor<'a>) -> Vec<B::Item> {
        flat_map(&self.first.apply(cursor), &self.next)
    }
}

/// `first`, then `next` on the children of each result
#[derive(Clone, Debug)]
pub struct ThenChild<A, B> {
    first: A,
    next: B,
}

impl<'a, A, B> Axis<'a> for ThenChild<A, B>
where
    A: Axis<'a, Item = Cursor<'a>>,
    B: Axis<'a>,
{
    type Item = B::Item;

    fn apply(&self, cursor: &Cursor<'a>) -> Vec<B::Item> {
        let mut result = Vec::new();
        for found in self.first.apply(cursor) {
            result.extend(flat_map(&found.children(), &self.next));
        }
        result
    }
}

/// `first`, then `next` on the descendants of each result
#[derive(Clone, Debug)]
pub struct ThenDescendant<A, B> {
    first: A,
    next: B,
}

impl<'a, A, B> Axis<'a> for ThenDescendant<A, B>
where
    A: Axis<'a, Item = Cursor<'a>>,
    B: Axis<'a>,
{
    type Item = B::Item;

    fn apply(&self, cursor: &Cursor<'a>) -> Vec<B::Item> {
        let mut result = Vec::new();
        for found in self.first.apply(cursor) {
            result.extend(flat_map(&descendant(&found), &self.next));
        }
        result
    }
}

/// The context cursor followed by the results of `axis`
#[derive(Clone, Debug)]
pub struct OrSelf<A> {
    axis: A,
}

pub fn or_self<'a, A: Axis<'a, Item = Cursor<'a>>>(axis: A) -> OrSelf<A> {
    OrSelf { axis }
}

impl<'a, A> Axis<'a> for OrSelf<A>
where
    A: Axis<'a, Item = Cursor<'a>>,
{
    type Item = Cursor<'a>;

    fn apply(&self, cursor: &Cursor<'a>) -> Vec<Cursor<'a>> {
        let mut result = vec![cursor.clone()];
        result.extend(self.axis.apply(cursor));
        result
    }
}

/// Composition methods for axes that yield cursors
pub trait AxisExt<'a>: Axis<'a, Item = Cursor<'a>> + Sized {
    fn then<B: Axis<'a>>(self, next: B) -> Then<Self, B> {
        Then { first: self, next }
    }

    fn then_child<B: Axis<'a>>(self, next: B) -> ThenChild<Self, B> {
        ThenChild { first: self, next }
    }

    fn then_descendant<B: Axis<'a>>(self, next: B) -> ThenDescendant<Self, B> {
        ThenDescendant { first: self, next }
    }
}

impl<'a, A: Axis<'a, Item = Cursor<'a>>> AxisExt<'a> for A {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{child, content, descendant_or_self, element, parent};
    use crate::dom::Element;

    fn page() -> Element {
        Element::new("html")
            .with_child(Element::new("head").with_child(Element::new("title").with_text("T")))
            .with_child(
                Element::new("body")
                    .with_child(Element::new("p").with_text("one"))
                    .with_child(Element::new("div").with_child(Element::new("p").with_text("two"))),
            )
    }

    #[test]
    fn test_closure_is_axis() {
        let root = page();
        let cursor = Cursor::from_element(&root);
        let count = |c: &Cursor<'_>| vec![c.children().len()];
        assert_eq!(cursor.select(&count), vec![2]);
    }

    #[test]
    fn test_then_flattens_in_order() {
        let root = page();
        let cursor = Cursor::from_element(&root);
        let grandchildren = child.then(child);
        let names: Vec<_> = cursor
            .select(&grandchildren)
            .iter()
            .filter_map(|c| c.name().map(|n| n.local_name().to_string()))
            .collect();
        assert_eq!(names, ["title", "p", "div"]);
    }

    #[test]
    fn test_then_child_and_then_descendant() {
        let root = page();
        let cursor = Cursor::from_element(&root);

        let direct = child.then(element("body")).then_child(element("p")).then_child(content);
        assert_eq!(cursor.select(&direct), vec!["one"]);

        let nested = child.then(element("body")).then_descendant(element("p")).then_child(content);
        assert_eq!(cursor.select(&nested), vec!["one", "two"]);
    }

    #[test]
    fn test_or_self() {
        let root = page();
        let cursor = Cursor::from_element(&root);
        assert_eq!(cursor.select(&or_self(child)).len(), 3);
        assert_eq!(cursor.select(&or_self(parent)).len(), 1);
        assert_eq!(
            cursor.select(&or_self(descendant)).len(),
            descendant_or_self(&cursor).len()
        );
    }

    #[test]
    fn test_empty_left_side() {
        let root = page();
        let cursor = Cursor::from_element(&root);
        assert!(cursor.select(&parent.then(child)).is_empty());
        assert!(cursor.select(&child.then(element("missing")).then_child(content)).is_empty());
    }
}
