use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

const DATA_TYPES_TAG: &str = "dataTypes";

/// Server-reported kind of data a source holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Continuous sampled values (`[VALUES]`).
    Values,
    /// Discrete event counts (`[EVENTS]`).
    Events,
    /// Anything else, carrying the raw marker.
    Other(String),
}

impl Classification {
    pub const VALUES_MARKER: &'static str = "[VALUES]";
    pub const EVENTS_MARKER: &'static str = "[EVENTS]";

    /// Markers must match exactly; surrounding whitespace makes them `Other`.
    pub fn from_marker(marker: &str) -> Self {
        match marker {
            Self::VALUES_MARKER => Self::Values,
            Self::EVENTS_MARKER => Self::Events,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Text of the first `<dataTypes>` element's first child node.
pub fn data_types(xml: &str) -> Result<String, ProtocolError> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| ProtocolError::Xml(e.to_string()))?;
    doc.descendants()
        .find(|n| n.has_tag_name(DATA_TYPES_TAG))
        .and_then(|n| n.first_child())
        .and_then(|n| n.text())
        .map(str::to_string)
        .ok_or(ProtocolError::MissingElement(DATA_TYPES_TAG))
}

/// Look up `name` in a metadata document: the text of the first `<name>`
/// element, else an attribute `name` on the root element.
pub fn xml_field(xml: &str, name: &str) -> Option<String> {
    let doc = roxmltree::Document::parse(xml).ok()?;
    let element = doc
        .descendants()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string());
    element.or_else(|| doc.root_element().attribute(name).map(str::to_string))
}
