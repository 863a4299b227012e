//! Parse and render configuration

use crate::core::entities::{EntityTable, DEFAULT_EXPANSION_LIMIT};
use std::collections::HashMap;

/// Options for the parse entry points
#[derive(Clone, Debug)]
pub struct ParseSettings {
    /// Extra named entities, inserted verbatim where referenced
    pub entities: HashMap<String, String>,
    /// Keep whitespace-only content that sits between markup
    pub preserve_whitespace_in_misc: bool,
    /// Cap on the expanded size of one DTD-declared entity reference
    pub entity_expansion_limit: usize,
}

impl Default for ParseSettings {
    fn default() -> Self {
        ParseSettings {
            entities: HashMap::new(),
            preserve_whitespace_in_misc: true,
            entity_expansion_limit: DEFAULT_EXPANSION_LIMIT,
        }
    }
}

impl ParseSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, name: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.entities.insert(name.into(), replacement.into());
        self
    }

    pub fn preserve_whitespace_in_misc(mut self, preserve: bool) -> Self {
        self.preserve_whitespace_in_misc = preserve;
        self
    }

    pub fn entity_expansion_limit(mut self, limit: usize) -> Self {
        self.entity_expansion_limit = limit;
        self
    }

    pub(crate) fn entity_table(&self) -> EntityTable {
        EntityTable::with_entities(&self.entities).with_expansion_limit(self.entity_expansion_limit)
    }
}

/// Options for the render entry points
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    /// Indent element-only content
    pub pretty: bool,
    /// Spaces per level when pretty
    pub indent: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            pretty: false,
            indent: 2,
        }
    }
}

impl RenderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty output with the default indent
    pub fn pretty() -> Self {
        RenderSettings {
            pretty: true,
            ..Self::default()
        }
    }

    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let settings = ParseSettings::default();
        assert!(settings.entities.is_empty());
        assert!(settings.preserve_whitespace_in_misc);
    }

    #[test]
    fn test_parse_builder() {
        let settings = ParseSettings::new()
            .entity("nbsp", "\u{A0}")
            .preserve_whitespace_in_misc(false);
        assert_eq!(settings.entities.get("nbsp").map(String::as_str), Some("\u{A0}"));
        assert!(!settings.preserve_whitespace_in_misc);
        assert!(settings.entity_table().contains("nbsp"));
    }

    #[test]
    fn test_render_defaults() {
        assert_eq!(RenderSettings::default(), RenderSettings { pretty: false, indent: 2 });
        assert_eq!(RenderSettings::pretty().indent(4).indent, 4);
    }
}
