//! XML Serialization
//!
//! Rendering never fails. Namespace declarations are regenerated from the
//! names in the tree: an in-scope binding is reused when one fits, otherwise the
//! element declares what it needs, inventing `ns0`, `ns1`, ... for namespaced
//! attributes without a usable prefix. Attributes in the `xmlns` namespace are
//! not rendered.

use super::document::{Doctype, Document, ExternalId};
use super::name::Name;
use super::namespace::{ns, NamespaceResolver};
use super::node::{Element, Instruction, Miscellaneous, Node};
use super::settings::RenderSettings;
use crate::core::entities::{encode_attribute, encode_text};

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

pub(crate) fn render_document(doc: &Document, settings: &RenderSettings, out: &mut String) {
    let mut renderer = Renderer {
        settings,
        resolver: NamespaceResolver::new(),
        out,
    };
    renderer.document(doc);
}

/// Render a single element as a standalone fragment (no declaration)
pub fn render_element(element: &Element, settings: &RenderSettings) -> String {
    let mut out = String::new();
    let mut renderer = Renderer {
        settings,
        resolver: NamespaceResolver::new(),
        out: &mut out,
    };
    renderer.element(element, 0);
    out
}

struct Renderer<'s> {
    settings: &'s RenderSettings,
    resolver: NamespaceResolver,
    out: &'s mut String,
}

impl<'s> Renderer<'s> {
    fn document(&mut self, doc: &Document) {
        self.out.push_str(DECLARATION);

        for misc in &doc.prologue.before {
            self.top_level_break();
            self.misc(misc);
        }
        if let Some(doctype) = &doc.prologue.doctype {
            self.top_level_break();
            self.doctype(doctype);
        }
        for misc in &doc.prologue.after {
            self.top_level_break();
            self.misc(misc);
        }

        self.top_level_break();
        self.element(&doc.root, 0);

        for misc in &doc.epilogue {
            self.top_level_break();
            self.misc(misc);
        }
        self.top_level_break();
    }

    fn top_level_break(&mut self) {
        if self.settings.pretty {
            self.out.push('\n');
        }
    }

    fn newline_indent(&mut self, depth: usize) {
        self.out.push('\n');
        for _ in 0..depth * self.settings.indent {
            self.out.push(' ');
        }
    }

    fn misc(&mut self, misc: &Miscellaneous) {
        match misc {
            Miscellaneous::Comment(text) => self.comment(text),
            Miscellaneous::Instruction(pi) => self.instruction(pi),
        }
    }

    fn doctype(&mut self, doctype: &Doctype) {
        self.out.push_str("<!DOCTYPE ");
        self.out.push_str(&doctype.name);
        match &doctype.external_id {
            Some(ExternalId::System(system)) => {
                self.out.push_str(" SYSTEM ");
                self.literal(system);
            }
            Some(ExternalId::Public(public, system)) => {
                self.out.push_str(" PUBLIC ");
                self.literal(public);
                self.out.push(' ');
                self.literal(system);
            }
            None => {}
        }
        self.out.push('>');
    }

    /// Quote a DOCTYPE literal with whichever quote it does not contain
    fn literal(&mut self, text: &str) {
        let quote = if text.contains('"') { '\'' } else { '"' };
        self.out.push(quote);
        self.out.push_str(text);
        self.out.push(quote);
    }

    fn comment(&mut self, text: &str) {
        self.out.push_str("<!--");
        if text.contains("--") || text.ends_with('-') {
            let mut safe = text.to_string();
            while safe.contains("--") {
                safe = safe.replace("--", "- -");
            }
            self.out.push_str(&safe);
            if safe.ends_with('-') {
                self.out.push(' ');
            }
        } else {
            self.out.push_str(text);
        }
        self.out.push_str("-->");
    }

    fn instruction(&mut self, pi: &Instruction) {
        self.out.push_str("<?");
        self.out.push_str(&pi.target);
        if !pi.data.is_empty() {
            self.out.push(' ');
            self.out.push_str(&pi.data.replace("?>", "? >"));
        }
        self.out.push_str("?>");
    }

    fn node(&mut self, node: &Node, depth: usize) {
        match node {
            Node::Element(element) => self.element(element, depth),
            Node::Content(text) => self.out.push_str(&encode_text(text)),
            Node::Comment(text) => self.comment(text),
            Node::Instruction(pi) => self.instruction(pi),
        }
    }

    fn element(&mut self, element: &Element, depth: usize) {
        self.resolver.push_scope();
        let mut tag = StartTag::default();

        let qname = self.element_qname(&element.name, &mut tag);
        let attributes: Vec<(String, &str)> = element
            .attributes
            .iter()
            // Declarations are regenerated, never copied from attributes
            .filter(|(name, _)| name.namespace() != Some(ns::XMLNS))
            .map(|(name, value)| (self.attribute_qname(name, &mut tag), value.as_str()))
            .collect();

        self.out.push('<');
        self.out.push_str(&qname);
        for (prefix, uri) in &tag.declarations {
            self.out.push_str(" xmlns");
            if !prefix.is_empty() {
                self.out.push(':');
                self.out.push_str(prefix);
            }
            self.out.push_str("=\"");
            self.out.push_str(&encode_attribute(uri));
            self.out.push('"');
        }
        for (name, value) in attributes {
            self.out.push(' ');
            self.out.push_str(&name);
            self.out.push_str("=\"");
            self.out.push_str(&encode_attribute(value));
            self.out.push('"');
        }

        if element.children.is_empty() {
            self.out.push_str("/>");
            self.resolver.pop_scope();
            return;
        }
        self.out.push('>');

        // Mixed content renders inline; added whitespace would change it
        let indent = self.settings.pretty && !element.children.iter().any(|c| matches!(c, Node::Content(_)));
        for child in &element.children {
            if indent {
                self.newline_indent(depth + 1);
            }
            self.node(child, depth + 1);
        }
        if indent {
            self.newline_indent(depth);
        }

        self.out.push_str("</");
        self.out.push_str(&qname);
        self.out.push('>');
        self.resolver.pop_scope();
    }

    fn element_qname(&mut self, name: &Name, tag: &mut StartTag) -> String {
        let local = name.local_name();
        let uri = match name.namespace() {
            None | Some("") => {
                if self.resolver.resolve_default().is_some() {
                    self.bind(tag, "", "");
                }
                return local.to_string();
            }
            Some(uri) => uri,
        };

        if uri == ns::XML {
            tag.used.push(("xml".to_string(), uri.to_string()));
            return format!("xml:{}", local);
        }

        match name.prefix() {
            Some(prefix) if self.resolver.resolve(prefix) == Some(uri) => {
                tag.used.push((prefix.to_string(), uri.to_string()));
                format!("{}:{}", prefix, local)
            }
            Some(prefix) if is_declarable(prefix) => {
                self.bind(tag, prefix, uri);
                format!("{}:{}", prefix, local)
            }
            _ => {
                if self.resolver.resolve_default() != Some(uri) {
                    self.bind(tag, "", uri);
                }
                local.to_string()
            }
        }
    }

    /// Unprefixed attributes have no namespace, so a namespaced one always needs a prefix
    fn attribute_qname(&mut self, name: &Name, tag: &mut StartTag) -> String {
        let local = name.local_name();
        let uri = match name.namespace() {
            None | Some("") => return local.to_string(),
            Some(ns::XML) => return format!("xml:{}", local),
            Some(uri) => uri,
        };

        let preferred = name
            .prefix()
            .filter(|p| self.resolver.resolve(p) == Some(uri) && tag.allows(p, uri));
        let existing = preferred.or_else(|| {
            self.resolver
                .prefix_for(uri)
                .filter(|p| tag.allows(p, uri))
        });
        if let Some(prefix) = existing {
            let prefix = prefix.to_string();
            tag.used.push((prefix.clone(), uri.to_string()));
            return format!("{}:{}", prefix, local);
        }

        let prefix = match name.prefix() {
            Some(p) if is_declarable(p) && tag.allows(p, uri) => p.to_string(),
            _ => (0..)
                .map(|n| format!("ns{}", n))
                .find(|p| self.resolver.resolve(p).is_none() && tag.allows(p, uri))
                .unwrap_or_default(),
        };
        self.bind(tag, &prefix, uri);
        format!("{}:{}", prefix, local)
    }

    /// Declare a binding on the element being opened
    fn bind(&mut self, tag: &mut StartTag, prefix: &str, uri: &str) {
        // Rejections (reserved prefixes) were filtered out by the callers
        let _ = if prefix.is_empty() {
            self.resolver.declare_default(uri)
        } else {
            self.resolver.declare(prefix, uri)
        };
        tag.declarations.push((prefix.to_string(), uri.to_string()));
        tag.used.push((prefix.to_string(), uri.to_string()));
    }
}

/// Prefixes declared and used by one start tag
#[derive(Default)]
struct StartTag {
    declarations: Vec<(String, String)>,
    used: Vec<(String, String)>,
}

impl StartTag {
    /// A prefix may be (re)bound only if this tag does not already use it for another namespace
    fn allows(&self, prefix: &str, uri: &str) -> bool {
        self.used.iter().all(|(p, u)| p != prefix || u == uri)
    }
}

fn is_declarable(prefix: &str) -> bool {
    !prefix.is_empty() && prefix != "xml" && prefix != "xmlns"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::settings::ParseSettings;

    fn render(doc: &Document) -> String {
        doc.render_string(&RenderSettings::default())
    }

    fn body(doc: &Document) -> String {
        render(doc)[DECLARATION.len()..].to_string()
    }

    #[test]
    fn test_declaration_and_empty_element() {
        let doc = Document::new(Element::new("a"));
        assert_eq!(render(&doc), "<?xml version=\"1.0\" encoding=\"UTF-8\"?><a/>");
    }

    #[test]
    fn test_escaping() {
        let doc = Document::new(
            Element::new("a")
                .with_attribute("q", "\"<&>\t")
                .with_text("1 < 2 & 3 > 2\r"),
        );
        assert_eq!(body(&doc), "<a q=\"&quot;&lt;&amp;>&#9;\">1 &lt; 2 &amp; 3 &gt; 2&#13;</a>");
    }

    #[test]
    fn test_default_namespace_declared_once() {
        let doc = Document::new(
            Element::new("{urn:d}root").with_child(Element::new("{urn:d}child")),
        );
        assert_eq!(body(&doc), "<root xmlns=\"urn:d\"><child/></root>");
    }

    #[test]
    fn test_default_namespace_undeclared() {
        let doc = Document::new(Element::new("{urn:d}root").with_child(Element::new("plain")));
        assert_eq!(body(&doc), "<root xmlns=\"urn:d\"><plain xmlns=\"\"/></root>");
    }

    #[test]
    fn test_prefix_reused() {
        let doc = Document::new(
            Element::new(Name::namespaced("root", "urn:p").with_prefix("p"))
                .with_child(Element::new(Name::namespaced("child", "urn:p").with_prefix("p"))),
        );
        assert_eq!(body(&doc), "<p:root xmlns:p=\"urn:p\"><p:child/></p:root>");
    }

    #[test]
    fn test_invented_attribute_prefix() {
        let doc = Document::new(Element::new("a").with_attribute("{urn:x}k", "v"));
        assert_eq!(body(&doc), "<a xmlns:ns0=\"urn:x\" ns0:k=\"v\"/>");
    }

    #[test]
    fn test_attribute_reuses_element_prefix() {
        let doc = Document::new(
            Element::new(Name::namespaced("a", "urn:x").with_prefix("x")).with_attribute("{urn:x}k", "v"),
        );
        assert_eq!(body(&doc), "<x:a xmlns:x=\"urn:x\" x:k=\"v\"/>");
    }

    #[test]
    fn test_xml_namespace_attribute() {
        let doc = Document::new(Element::new("a").with_attribute(Name::namespaced("lang", ns::XML), "en"));
        assert_eq!(body(&doc), "<a xml:lang=\"en\"/>");
    }

    #[test]
    fn test_xmlns_namespace_attribute_skipped() {
        let doc = Document::new(
            Element::new("a")
                .with_attribute(Name::namespaced("p", ns::XMLNS), "urn:p")
                .with_attribute("k", "v"),
        );
        let text = render(&doc);
        assert_eq!(&text[DECLARATION.len()..], "<a k=\"v\"/>");
        assert!(Document::parse_str(&text, &ParseSettings::default()).is_ok());
    }

    #[test]
    fn test_conflicting_prefixes() {
        // Attribute asks for prefix `p` while the element already uses it for another namespace
        let doc = Document::new(
            Element::new(Name::namespaced("a", "urn:1").with_prefix("p"))
                .with_attribute(Name::namespaced("k", "urn:2").with_prefix("p"), "v"),
        );
        let text = render(&doc);
        let back = Document::parse_str(&text, &ParseSettings::default()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_comment_and_pi_are_made_safe() {
        let doc = Document::new(
            Element::new("a")
                .with_child(Node::comment("x--y-"))
                .with_child(Node::instruction("t", "a?>b")),
        );
        assert_eq!(body(&doc), "<a><!--x- -y- --><?t a? >b?></a>");
        assert!(Document::parse_str(&render(&doc), &ParseSettings::default()).is_ok());
    }

    #[test]
    fn test_doctype_and_misc() {
        let mut doc = Document::new(Element::new("html"));
        doc.prologue.before.push(Miscellaneous::Comment(" top ".into()));
        doc.prologue.doctype = Some(Doctype {
            name: "html".into(),
            external_id: Some(ExternalId::Public("-//W3C//DTD XHTML 1.0 Strict//EN".into(), "x.dtd".into())),
        });
        doc.epilogue.push(Miscellaneous::Instruction(Instruction::new("end", "")));

        assert_eq!(
            body(&doc),
            "<!-- top --><!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \"x.dtd\"><html/><?end?>"
        );
        let back = Document::parse_str(&render(&doc), &ParseSettings::default()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_pretty() {
        let doc = Document::new(
            Element::new("a")
                .with_child(Element::new("b").with_text("x ").with_child(Element::new("i").with_text("y")))
                .with_child(Element::new("c").with_child(Element::new("d"))),
        );
        let text = doc.render_string(&RenderSettings::pretty());
        assert_eq!(
            text,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a>\n  <b>x <i>y</i></b>\n  <c>\n    <d/>\n  </c>\n</a>\n"
        );

        let strip = ParseSettings::new().preserve_whitespace_in_misc(false);
        assert_eq!(Document::parse_str(&text, &strip).unwrap(), doc);
    }

    #[test]
    fn test_render_element_fragment() {
        let element = Element::new("{urn:x}a").with_text("t");
        assert_eq!(render_element(&element, &RenderSettings::default()), "<a xmlns=\"urn:x\">t</a>");
    }
}
