//! Parallel Axis Evaluation
//!
//! Uses Rayon to fan one axis out over many cursors or documents. The tree is
//! never mutated, so cursors are shared across worker threads as plain
//! borrows. Results are concatenated in input order.

use crate::cursor::{Axis, Cursor};
use crate::dom::Document;
use rayon::prelude::*;

/// Evaluate an axis from every cursor in parallel
pub fn select_parallel<'a, A>(cursors: &[Cursor<'a>], axis: &A) -> Vec<A::Item>
where
    A: Axis<'a> + Sync,
    A::Item: Send,
{
    let per_cursor: Vec<Vec<A::Item>> = cursors.par_iter().map(|c| axis.apply(c)).collect();
    per_cursor.into_iter().flatten().collect()
}

/// Evaluate an axis from the root element of every document in parallel
pub fn select_documents<'a, A>(docs: &'a [Document], axis: &A) -> Vec<A::Item>
where
    A: Axis<'a> + Sync,
    A::Item: Send,
{
    let per_doc: Vec<Vec<A::Item>> = docs
        .par_iter()
        .map(|doc| axis.apply(&Cursor::from_document(doc)))
        .collect();
    per_doc.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{child, content, descendant, element, AxisExt};
    use crate::dom::{Element, ParseSettings};

    #[test]
    fn test_select_parallel_preserves_order() {
        let mut root = Element::new("root");
        for i in 0..200 {
            root = root.with_child(Element::new("item").with_text(i.to_string()));
        }
        let cursor = Cursor::from_element(&root);
        let items = child(&cursor);

        let texts = select_parallel(&items, &child.then(content));
        let expected: Vec<String> = (0..200).map(|i| i.to_string()).collect();
        assert_eq!(texts, expected);
    }

    #[test]
    fn test_select_documents() {
        let docs: Vec<Document> = ["<a><b>1</b></a>", "<a/>", "<a><c><b>2</b></c><b>3</b></a>"]
            .iter()
            .map(|text| Document::parse_str(text, &ParseSettings::default()).unwrap())
            .collect();

        let query = descendant.then(element("b")).then_child(content);
        assert_eq!(select_documents(&docs, &query), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_empty_input() {
        let docs: Vec<Document> = Vec::new();
        assert!(select_documents(&docs, &descendant).is_empty());
        assert!(select_parallel(&[], &child).is_empty());
    }
}
