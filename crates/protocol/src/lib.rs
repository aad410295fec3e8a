pub mod classification;
pub mod effects;
pub mod error;
pub mod form;
pub mod request;
pub mod time;
pub mod types;

pub use classification::Classification;
pub use effects::{Display, PanelEffect};
pub use error::ProtocolError;
pub use form::{FieldValue, FormField, FormSnapshot, SelectOption};
pub use request::{PlotComponent, PlotRequest};
pub use time::TimeWindow;
pub use types::{ClickEvent, ClickTarget, PlotBox, Point};
