use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Display {
    Block,
    None,
}

impl Display {
    /// CSS `display` value.
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::None => "none",
        }
    }
}

/// A single page mutation requested by the core.
///
/// The core emits a `Vec<PanelEffect>` per reconciliation and the host
/// applies them in order against elements looked up by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PanelEffect {
    /// Mark a checkbox or radio input as checked.
    Check { element: String },
    /// Set an element's CSS display.
    SetDisplay { element: String, display: Display },
}

impl PanelEffect {
    pub fn check(element: &str) -> Self {
        Self::Check {
            element: element.to_string(),
        }
    }

    pub fn show(element: &str) -> Self {
        Self::SetDisplay {
            element: element.to_string(),
            display: Display::Block,
        }
    }

    pub fn hide(element: &str) -> Self {
        Self::SetDisplay {
            element: element.to_string(),
            display: Display::None,
        }
    }

    pub fn element(&self) -> &str {
        match self {
            Self::Check { element } | Self::SetDisplay { element, .. } => element,
        }
    }
}
