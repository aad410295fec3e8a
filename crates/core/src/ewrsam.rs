use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use valve_menu_protocol::classification::data_types;
use valve_menu_protocol::request::data_url;
use valve_menu_protocol::{Classification, PanelEffect};

use crate::fetch::FetchResult;
use crate::menu::{Menu, MenuConfig};
use crate::ports::{BaseMenu, Fetcher, PanelSink};

/// Data action returning an RSAM source's menu description.
pub const MENU_DESCRIPTION_ACTION: &str = "ewRsamMenu";

/// Page element ids owned by one RSAM menu, resolved from the menu id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelIds {
    pub values_checkbox: String,
    pub events_checkbox: String,
    pub values_options: String,
    pub events_options: String,
    pub output_type_box: String,
}

impl PanelIds {
    pub fn for_menu(id: &str) -> Self {
        Self {
            values_checkbox: format!("{id}_mv"),
            events_checkbox: format!("{id}_cnts"),
            values_options: format!("{id}_pane_options_0-"),
            events_options: format!("{id}_pane_options_1"),
            output_type_box: format!("{id}_outputTypeBox"),
        }
    }
}

/// Page changes that present the options matching `classification`.
///
/// Known classifications swap the values/events option panes; anything
/// else only reveals the output type selector.
pub fn reconcile(classification: &Classification, ids: &PanelIds) -> Vec<PanelEffect> {
    match classification {
        Classification::Values => vec![
            PanelEffect::check(&ids.values_checkbox),
            PanelEffect::show(&ids.values_options),
            PanelEffect::hide(&ids.events_options),
        ],
        Classification::Events => vec![
            PanelEffect::check(&ids.events_checkbox),
            PanelEffect::hide(&ids.values_options),
            PanelEffect::show(&ids.events_options),
        ],
        Classification::Other(_) => vec![PanelEffect::show(&ids.output_type_box)],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReconcilerState {
    Uninitialized,
    AwaitingClassification,
    Reconciled(Classification),
    /// The description request failed; default panels stay as they are.
    Unreachable,
}

/// Earthworm RSAM menu: shows the option panes matching the source's data type.
pub struct EwRsamMenu<B> {
    menu: Menu,
    panels: PanelIds,
    base: B,
    fetcher: Rc<dyn Fetcher>,
    sink: Rc<dyn PanelSink>,
    state: Rc<RefCell<ReconcilerState>>,
}

impl<B: BaseMenu> EwRsamMenu<B> {
    /// An RSAM menu with the built-in RSAM settings.
    pub fn new(menu: Menu, base: B, fetcher: Rc<dyn Fetcher>, sink: Rc<dyn PanelSink>) -> Self {
        Self::with_config(menu, &MenuConfig::ewrsam(), base, fetcher, sink)
    }

    /// An RSAM menu configured by `config` instead of the preset.
    pub fn with_config(
        mut menu: Menu,
        config: &MenuConfig,
        base: B,
        fetcher: Rc<dyn Fetcher>,
        sink: Rc<dyn PanelSink>,
    ) -> Self {
        config.apply(&mut menu);
        let panels = PanelIds::for_menu(&menu.id);
        Self {
            menu,
            panels,
            base,
            fetcher,
            sink,
            state: Rc::new(RefCell::new(ReconcilerState::Uninitialized)),
        }
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn panels(&self) -> &PanelIds {
        &self.panels
    }

    pub fn state(&self) -> ReconcilerState {
        self.state.borrow().clone()
    }

    /// Run base setup, then ask the server what kind of data this source
    /// holds. Only the first call fetches.
    pub fn initialize(&self) {
        self.base.initialize(&self.menu);

        if *self.state.borrow() != ReconcilerState::Uninitialized {
            tracing::debug!(menu = %self.menu.id, "menu already initialized");
            return;
        }
        *self.state.borrow_mut() = ReconcilerState::AwaitingClassification;

        let label = format!("{} generic menu description", self.menu.id);
        let url = data_url(MENU_DESCRIPTION_ACTION, &self.menu.id);
        tracing::debug!(%label, %url, "requesting menu description");

        let menu_id = self.menu.id.clone();
        let panels = self.panels.clone();
        let sink = Rc::clone(&self.sink);
        let state = Rc::clone(&self.state);
        let on_complete = Box::new(move |result: FetchResult| {
            let next = match result {
                Ok(xml) => {
                    let classification = classify(&menu_id, &xml);
                    for effect in reconcile(&classification, &panels) {
                        sink.apply(&effect);
                    }
                    ReconcilerState::Reconciled(classification)
                }
                Err(e) => {
                    tracing::warn!(menu = %menu_id, "menu description request failed: {e}");
                    ReconcilerState::Unreachable
                }
            };
            *state.borrow_mut() = next;
        });
        self.fetcher.fetch(&label, &url, on_complete);
    }
}

/// Classification reported by a menu description. Unreadable documents
/// classify as `Other`.
pub fn classify(menu_id: &str, xml: &str) -> Classification {
    match data_types(xml) {
        Ok(marker) => Classification::from_marker(&marker),
        Err(e) => {
            tracing::warn!(menu = %menu_id, "unreadable menu description: {e}");
            Classification::Other(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_ids_follow_menu_id() {
        let ids = PanelIds::for_menu("rsam1");
        assert_eq!(ids.values_checkbox, "rsam1_mv");
        assert_eq!(ids.events_checkbox, "rsam1_cnts");
        assert_eq!(ids.values_options, "rsam1_pane_options_0-");
        assert_eq!(ids.events_options, "rsam1_pane_options_1");
        assert_eq!(ids.output_type_box, "rsam1_outputTypeBox");
    }

    #[test]
    fn values_and_events_are_mirror_images() {
        let ids = PanelIds::for_menu("m");
        assert_eq!(
            reconcile(&Classification::Values, &ids),
            vec![
                PanelEffect::check("m_mv"),
                PanelEffect::show("m_pane_options_0-"),
                PanelEffect::hide("m_pane_options_1"),
            ]
        );
        assert_eq!(
            reconcile(&Classification::Events, &ids),
            vec![
                PanelEffect::check("m_cnts"),
                PanelEffect::hide("m_pane_options_0-"),
                PanelEffect::show("m_pane_options_1"),
            ]
        );
    }

    #[test]
    fn other_only_touches_output_type_box() {
        let ids = PanelIds::for_menu("m");
        let markers = [
            "unknown",
            "",
            "[values]",
            "[VALUES][EVENTS]",
            " [VALUES]\n",
            "[EVENTS] ",
        ];
        for marker in markers {
            let effects = reconcile(&Classification::from_marker(marker), &ids);
            assert_eq!(effects, vec![PanelEffect::show("m_outputTypeBox")]);
        }
    }

    #[test]
    fn classify_falls_back_on_bad_documents() {
        assert_eq!(classify("m", "<menu/>"), Classification::Other(String::new()));
        assert_eq!(
            classify("m", "<dataTypes>[EVENTS]</dataTypes>"),
            Classification::Events
        );
    }
}
