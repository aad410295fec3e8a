use std::cell::RefCell;

use serde::Serialize;
use valve_menu_core::ports::FetchCallback;
use valve_menu_core::{FetchResult, Fetcher, PanelSink, PopupRenderer};
use valve_menu_protocol::{Display, PanelEffect, Point};

#[derive(Debug, Clone, Serialize)]
pub struct IssuedRequest {
    pub label: String,
    pub url: String,
}

/// Answers every request with the same canned result, or leaves requests
/// pending when there is none.
pub struct CannedFetcher {
    response: Option<FetchResult>,
    issued: RefCell<Vec<IssuedRequest>>,
}

impl CannedFetcher {
    pub fn new(response: Option<FetchResult>) -> Self {
        Self {
            response,
            issued: RefCell::new(Vec::new()),
        }
    }

    pub fn issued(&self) -> Vec<IssuedRequest> {
        self.issued.borrow().clone()
    }
}

impl Fetcher for CannedFetcher {
    fn fetch(&self, label: &str, url: &str, on_complete: FetchCallback) {
        self.issued.borrow_mut().push(IssuedRequest {
            label: label.to_string(),
            url: url.to_string(),
        });
        if let Some(response) = &self.response {
            on_complete(response.clone());
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Popup {
    pub anchor: Point,
    pub bytes: usize,
}

/// Collects popups and panel changes for the final report.
#[derive(Default)]
pub struct Recorder {
    popups: RefCell<Vec<Popup>>,
    effects: RefCell<Vec<PanelEffect>>,
}

impl Recorder {
    pub fn popups(&self) -> Vec<Popup> {
        self.popups.borrow().clone()
    }

    pub fn effects(&self) -> Vec<PanelEffect> {
        self.effects.borrow().clone()
    }
}

impl PopupRenderer for Recorder {
    fn show_popup(&self, xml: &str, anchor: Point) {
        self.popups.borrow_mut().push(Popup {
            anchor,
            bytes: xml.len(),
        });
    }
}

impl PanelSink for Recorder {
    fn set_checked(&self, element: &str) {
        self.effects.borrow_mut().push(PanelEffect::check(element));
    }

    fn set_display(&self, element: &str, display: Display) {
        self.effects.borrow_mut().push(PanelEffect::SetDisplay {
            element: element.to_string(),
            display,
        });
    }
}
