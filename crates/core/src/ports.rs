//! Boundaries between the menu logic and the page hosting it.
//!
//! Everything here runs on the page's single event loop, so ports take
//! `&self` and implementations use interior mutability where needed.

use std::rc::Rc;

use valve_menu_protocol::{ClickEvent, Display, FormSnapshot, PanelEffect, Point};

use crate::fetch::FetchResult;
use crate::menu::Menu;

pub type FetchCallback = Box<dyn FnOnce(FetchResult)>;

/// Issues GET requests. `on_complete` runs later on the event loop,
/// at most once; a request that never settles never calls it.
pub trait Fetcher {
    /// `label` names the request in diagnostics only.
    fn fetch(&self, label: &str, url: &str, on_complete: FetchCallback);
}

pub trait PopupRenderer {
    /// Show a floating plot for `xml`, anchored near `anchor` (page pixels).
    fn show_popup(&self, xml: &str, anchor: Point);
}

/// Page elements addressed by id.
pub trait PanelSink {
    fn set_checked(&self, element: &str);
    fn set_display(&self, element: &str, display: Display);

    fn apply(&self, effect: &PanelEffect) {
        match effect {
            PanelEffect::Check { element } => self.set_checked(element),
            PanelEffect::SetDisplay { element, display } => self.set_display(element, *display),
        }
    }
}

pub trait FormSource {
    fn snapshot(&self) -> FormSnapshot;
}

impl FormSource for FormSnapshot {
    fn snapshot(&self) -> FormSnapshot {
        self.clone()
    }
}

/// Behavior every menu inherits from the host menu framework. Menu
/// variants wrap an implementation and call through where they delegate.
pub trait BaseMenu {
    fn initialize(&self, menu: &Menu);
    fn accept_click(&self, menu: &Menu, click: &ClickEvent);
}

impl<T: BaseMenu + ?Sized> BaseMenu for Rc<T> {
    fn initialize(&self, menu: &Menu) {
        (**self).initialize(menu);
    }

    fn accept_click(&self, menu: &Menu, click: &ClickEvent) {
        (**self).accept_click(menu, click);
    }
}
