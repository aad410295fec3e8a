use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use valve_menu_protocol::classification::xml_field;
use valve_menu_protocol::{ClickEvent, FormSnapshot, PlotRequest, TimeWindow};

use crate::error::MenuError;
use crate::fetch::{FetchError, FetchResult, RequestId, RequestTracker};
use crate::menu::{Menu, MenuConfig};
use crate::ports::{BaseMenu, Fetcher, FormSource, PopupRenderer};

/// Radio group choosing what a click on the plot does.
pub const CLICK_ACTION_FIELD: &str = "skip:ca";
/// Select whose option text is the popup length in minutes.
pub const POPUP_DURATION_FIELD: &str = "skip:popupDuration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickMode {
    /// Clicks pick a time range (first option of the radio group).
    SetTime,
    /// Clicks open an inset plot around the clicked time.
    Popup,
}

impl ClickMode {
    pub fn from_form(form: &FormSnapshot) -> Result<Self, MenuError> {
        if form.field(CLICK_ACTION_FIELD).is_none() {
            return Err(MenuError::MissingField(CLICK_ACTION_FIELD));
        }
        Ok(match form.checked_index(CLICK_ACTION_FIELD) {
            Some(0) => Self::SetTime,
            _ => Self::Popup,
        })
    }
}

/// Popup length selected in the form, in minutes.
pub fn popup_duration(form: &FormSnapshot) -> Result<f64, MenuError> {
    let text = form
        .selected_text(POPUP_DURATION_FIELD)
        .ok_or(MenuError::MissingField(POPUP_DURATION_FIELD))?;
    match text.trim().parse::<f64>() {
        Ok(minutes) if minutes.is_finite() && minutes > 0.0 => Ok(minutes),
        _ => Err(MenuError::InvalidDuration(text.to_string())),
    }
}

/// Everything needed to request one inset plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupPlan {
    pub window: TimeWindow,
    pub channel: Option<String>,
    pub request: PlotRequest,
}

impl PopupPlan {
    pub fn url(&self) -> Result<String, MenuError> {
        Ok(self.request.to_url()?)
    }
}

/// Build the inset plot request for a popup click on `owner`'s plot.
///
/// The channel comes from the clicked image's metadata and takes precedence
/// over the channel selected in the form.
pub fn plan_popup(
    owner: &str,
    click: &ClickEvent,
    duration_minutes: f64,
    form: &FormSnapshot,
) -> Result<PopupPlan, MenuError> {
    let window = TimeWindow::centered(click.time(), duration_minutes)?;
    let channel = click.target.xml.as_deref().and_then(|xml| xml_field(xml, "ch"));

    let mut request = PlotRequest::new(true);
    let component = request.create_component(owner, &window)?;
    component.set_from_form(form);
    if let Some(ch) = &channel {
        component.set("ch", ch.as_str());
    }

    Ok(PopupPlan {
        window,
        channel,
        request,
    })
}

/// An inset plot request ready to hand to a fetcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupFetch {
    pub label: String,
    pub url: String,
    pub window: TimeWindow,
    pub channel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ClickDecision {
    /// Let the base menu handle the click.
    Delegate,
    Popup(PopupFetch),
}

/// Decide what a click on `menu`'s plot does, given the form as it is now.
pub fn decide_click(
    menu: &Menu,
    click: &ClickEvent,
    form: &FormSnapshot,
) -> Result<ClickDecision, MenuError> {
    match ClickMode::from_form(form)? {
        ClickMode::SetTime => Ok(ClickDecision::Delegate),
        ClickMode::Popup => {
            let minutes = popup_duration(form)?;
            let plan = plan_popup(&menu.id, click, minutes, form)?;
            if plan.channel.is_none() {
                tracing::debug!(menu = %menu.id, "clicked image has no channel metadata");
            }
            Ok(ClickDecision::Popup(PopupFetch {
                label: format!("{} inset plot", menu.id),
                url: plan.url()?,
                window: plan.window,
                channel: plan.channel,
            }))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClickOutcome {
    /// Handed to the base menu's range selection.
    Delegated,
    /// An inset plot request was issued.
    PopupRequested(RequestId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControllerState {
    Idle,
    AwaitingResponse(RequestId),
}

/// How the most recently settled popup request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PopupOutcome {
    Shown(RequestId),
    /// A newer click or an explicit cancel made the response unwanted.
    Superseded(RequestId),
    Failed(RequestId, FetchError),
}

/// Waveform menu: clicks either pick a time range or pop up an inset plot.
pub struct WaveMenu<B> {
    menu: Menu,
    base: B,
    form: Rc<dyn FormSource>,
    fetcher: Rc<dyn Fetcher>,
    popup: Rc<dyn PopupRenderer>,
    tracker: Rc<RequestTracker>,
    last_outcome: Rc<RefCell<Option<PopupOutcome>>>,
}

impl<B: BaseMenu> WaveMenu<B> {
    /// A waveform menu with the built-in waveform settings.
    pub fn new(
        menu: Menu,
        base: B,
        form: Rc<dyn FormSource>,
        fetcher: Rc<dyn Fetcher>,
        popup: Rc<dyn PopupRenderer>,
    ) -> Self {
        Self::with_config(menu, &MenuConfig::wave(), base, form, fetcher, popup)
    }

    /// A waveform menu configured by `config` instead of the preset.
    pub fn with_config(
        mut menu: Menu,
        config: &MenuConfig,
        base: B,
        form: Rc<dyn FormSource>,
        fetcher: Rc<dyn Fetcher>,
        popup: Rc<dyn PopupRenderer>,
    ) -> Self {
        config.apply(&mut menu);
        Self {
            menu,
            base,
            form,
            fetcher,
            popup,
            tracker: Rc::new(RequestTracker::new()),
            last_outcome: Rc::new(RefCell::new(None)),
        }
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    pub fn state(&self) -> ControllerState {
        match self.tracker.in_flight() {
            Some(id) => ControllerState::AwaitingResponse(id),
            None => ControllerState::Idle,
        }
    }

    /// `None` until the first popup request settles.
    pub fn last_outcome(&self) -> Option<PopupOutcome> {
        self.last_outcome.borrow().clone()
    }

    pub fn initialize(&self) {
        self.base.initialize(&self.menu);
    }

    /// Drop any pending popup so its response is ignored.
    pub fn cancel_popup(&self) {
        self.tracker.cancel();
    }

    pub fn accept_click(&self, click: &ClickEvent) -> Result<ClickOutcome, MenuError> {
        let form = self.form.snapshot();
        match decide_click(&self.menu, click, &form)? {
            ClickDecision::Delegate => {
                self.base.accept_click(&self.menu, click);
                Ok(ClickOutcome::Delegated)
            }
            ClickDecision::Popup(fetch) => {
                Ok(ClickOutcome::PopupRequested(self.issue(&fetch, click)))
            }
        }
    }

    fn issue(&self, fetch: &PopupFetch, click: &ClickEvent) -> RequestId {
        let (id, token) = self.tracker.begin();
        tracing::debug!(
            request = %id,
            label = %fetch.label,
            url = %fetch.url,
            "requesting inset plot"
        );

        let tracker = Rc::clone(&self.tracker);
        let popup = Rc::clone(&self.popup);
        let last_outcome = Rc::clone(&self.last_outcome);
        let anchor = click.screen;
        let on_complete = Box::new(move |result: FetchResult| {
            tracker.settle(id);
            let outcome = if token.is_cancelled() {
                tracing::debug!(request = %id, "dropping superseded inset plot");
                PopupOutcome::Superseded(id)
            } else {
                match result {
                    Ok(xml) => {
                        popup.show_popup(&xml, anchor);
                        PopupOutcome::Shown(id)
                    }
                    Err(e) => {
                        tracing::warn!(request = %id, "inset plot request failed: {e}");
                        PopupOutcome::Failed(id, e)
                    }
                }
            };
            *last_outcome.borrow_mut() = Some(outcome);
        });
        self.fetcher.fetch(&fetch.label, &fetch.url, on_complete);
        id
    }
}

#[cfg(test)]
mod tests {
    use valve_menu_protocol::{ClickTarget, Point, SelectOption};

    use super::*;

    fn form(mode: usize, duration: &str) -> FormSnapshot {
        FormSnapshot::new()
            .with_radio(CLICK_ACTION_FIELD, ["settime", "popup"], Some(mode))
            .with_select(
                POPUP_DURATION_FIELD,
                vec![SelectOption::new("0", duration)],
                Some(0),
            )
            .with_text("selector:ch", "FORM_CH")
    }

    #[test]
    fn click_mode_from_radio() {
        assert_eq!(ClickMode::from_form(&form(0, "2")).unwrap(), ClickMode::SetTime);
        assert_eq!(ClickMode::from_form(&form(1, "2")).unwrap(), ClickMode::Popup);
        let unchecked = FormSnapshot::new().with_radio(CLICK_ACTION_FIELD, ["a", "b"], None);
        assert_eq!(ClickMode::from_form(&unchecked).unwrap(), ClickMode::Popup);
        assert!(matches!(
            ClickMode::from_form(&FormSnapshot::new()),
            Err(MenuError::MissingField(CLICK_ACTION_FIELD))
        ));
    }

    #[test]
    fn duration_must_be_positive_minutes() {
        assert_eq!(popup_duration(&form(1, " 5 ")).unwrap(), 5.0);
        for bad in ["0", "-2", "two", "NaN"] {
            assert!(matches!(
                popup_duration(&form(1, bad)),
                Err(MenuError::InvalidDuration(_))
            ));
        }
    }

    #[test]
    fn plan_uses_target_channel() {
        let click = ClickEvent::new(
            ClickTarget::with_xml("<plot><ch>HVO_EHZ_HV</ch></plot>"),
            Point::new(10.0, 20.0),
            Point::new(1000.0, 0.0),
        );
        let plan = plan_popup("hvo_wave", &click, 2.0, &form(1, "2")).unwrap();
        assert_eq!(plan.window.start(), 940.0);
        assert_eq!(plan.window.end(), 1060.0);
        assert_eq!(plan.channel.as_deref(), Some("HVO_EHZ_HV"));

        let component = &plan.request.components()[0];
        assert!(plan.request.is_inset());
        assert_eq!(component.source(), "hvo_wave");
        assert_eq!(component.get("ch"), Some("HVO_EHZ_HV"));
        assert_eq!(component.start(), "20000101121540000");
        assert_eq!(component.end(), "20000101121740000");
    }

    #[test]
    fn plan_without_metadata_keeps_form_channel() {
        let click = ClickEvent::new(
            ClickTarget::default(),
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
        );
        let plan = plan_popup("w", &click, 1.0, &form(1, "1")).unwrap();
        assert_eq!(plan.channel, None);
        assert_eq!(plan.request.components()[0].get("ch"), Some("FORM_CH"));
    }

    #[test]
    fn decide_click_builds_labeled_fetch() {
        let menu = Menu::new("hvo_wave");
        let click = ClickEvent::new(
            ClickTarget::with_xml(r#"<plot ch="HVO"/>"#),
            Point::new(0.0, 0.0),
            Point::new(1000.0, 0.0),
        );
        assert_eq!(
            decide_click(&menu, &click, &form(0, "2")).unwrap(),
            ClickDecision::Delegate
        );

        let ClickDecision::Popup(fetch) = decide_click(&menu, &click, &form(1, "2")).unwrap()
        else {
            panic!("expected a popup");
        };
        assert_eq!(fetch.label, "hvo_wave inset plot");
        assert_eq!(fetch.window, TimeWindow::new(940.0, 1060.0).unwrap());
        assert_eq!(fetch.channel.as_deref(), Some("HVO"));
        assert!(fetch.url.contains("&ch.0=HVO"), "{}", fetch.url);

        assert!(matches!(
            decide_click(&menu, &click, &form(1, "-2")),
            Err(MenuError::InvalidDuration(_))
        ));
    }
}
