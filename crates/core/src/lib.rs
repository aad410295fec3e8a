//! Menu behavior for Valve data source forms.
//!
//! Menus are built from a host-supplied [`ports::BaseMenu`] plus the ports
//! the variant needs. All decisions (time windows, request construction,
//! panel visibility) are made by pure functions in this crate; ports only
//! carry the results to the page.

pub mod error;
pub mod ewrsam;
pub mod fetch;
pub mod menu;
pub mod ports;
pub mod range;
pub mod wave;

pub use error::MenuError;
pub use ewrsam::{EwRsamMenu, PanelIds, ReconcilerState};
pub use fetch::{CancelToken, FetchError, FetchResult, RequestId, RequestTracker};
pub use menu::{Menu, MenuConfig, MenuKind, configure_ewrsam_menu, configure_wave_menu};
pub use ports::{BaseMenu, Fetcher, FormSource, PanelSink, PopupRenderer};
pub use range::{RangeSelection, StandardMenu};
pub use wave::{
    ClickDecision, ClickMode, ClickOutcome, ControllerState, PopupFetch, PopupOutcome, PopupPlan,
    WaveMenu, decide_click,
};
