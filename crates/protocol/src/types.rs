use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Placement of one plot inside the rendered image, in pixels.
///
/// Mirrors the `x.N`, `y.N`, `w.N`, `h.N` parameters of a plot request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PlotBox {
    /// Box used for full-size plots in the main result area.
    pub const STANDARD: PlotBox = PlotBox::new(75, 19, 610, 140);

    /// Box used for inset (popup) plots anchored near a click.
    pub const INSET: PlotBox = PlotBox::new(60, 19, 300, 100);

    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// The element a click landed on.
///
/// `xml` is the metadata document the host bound to the rendered image
/// (the plot response that produced it), if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickTarget {
    pub xml: Option<String>,
}

impl ClickTarget {
    pub fn with_xml(xml: impl Into<String>) -> Self {
        Self {
            xml: Some(xml.into()),
        }
    }
}

/// A single click on a rendered plot image.
///
/// `screen` is page-space pixels, used to anchor popups. `graph` is the
/// click translated into plot axes; `graph.x` is a J2K timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub target: ClickTarget,
    pub screen: Point,
    pub graph: Point,
}

impl ClickEvent {
    pub fn new(target: ClickTarget, screen: Point, graph: Point) -> Self {
        Self {
            target,
            screen,
            graph,
        }
    }

    /// Time under the cursor, in J2K seconds.
    pub fn time(&self) -> f64 {
        self.graph.x
    }
}
