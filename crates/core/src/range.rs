use std::cell::Cell;

use valve_menu_protocol::{ClickEvent, TimeWindow};

use crate::menu::Menu;
use crate::ports::BaseMenu;

/// Two-click time range picking.
///
/// The first click stores a pending start; the second completes the range.
/// Clicks picked right-to-left still produce an ordered window.
#[derive(Debug, Default)]
pub struct RangeSelection {
    pending: Cell<Option<f64>>,
}

impl RangeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_start(&self) -> Option<f64> {
        self.pending.get()
    }

    pub fn accept(&self, time: f64) -> Option<TimeWindow> {
        match self.pending.take() {
            None => {
                self.pending.set(Some(time));
                None
            }
            Some(start) => Some(TimeWindow::spanning(start, time)),
        }
    }

    pub fn reset(&self) {
        self.pending.set(None);
    }
}

/// Default [`BaseMenu`]: range selection that reports completed windows.
pub struct StandardMenu {
    selection: RangeSelection,
    on_range: Box<dyn Fn(&Menu, TimeWindow)>,
}

impl StandardMenu {
    pub fn new(on_range: impl Fn(&Menu, TimeWindow) + 'static) -> Self {
        Self {
            selection: RangeSelection::new(),
            on_range: Box::new(on_range),
        }
    }

    pub fn selection(&self) -> &RangeSelection {
        &self.selection
    }
}

impl BaseMenu for StandardMenu {
    fn initialize(&self, menu: &Menu) {
        self.selection.reset();
        tracing::debug!(menu = %menu.id, "menu initialized");
    }

    fn accept_click(&self, menu: &Menu, click: &ClickEvent) {
        if let Some(window) = self.selection.accept(click.time()) {
            tracing::debug!(
                menu = %menu.id,
                start = window.start(),
                end = window.end(),
                "time range selected"
            );
            (self.on_range)(menu, window);
        }
    }
}
