use std::cell::RefCell;

use serde::Serialize;
use valve_menu_core::ewrsam::{MENU_DESCRIPTION_ACTION, PanelIds, classify, reconcile};
use valve_menu_core::wave::{ClickDecision, PopupFetch, decide_click};
use valve_menu_core::{Menu, MenuError, MenuKind, RequestId, RequestTracker};
use valve_menu_protocol::request::data_url;
use valve_menu_protocol::{Classification, ClickEvent, FormSnapshot, PanelEffect, TimeWindow};
use wasm_bindgen::prelude::*;

struct Registered {
    menu: Menu,
    kind: MenuKind,
    popups: RequestTracker,
}

thread_local! {
    static MENUS: RefCell<Vec<Registered>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Serialize)]
struct FetchSpec {
    label: String,
    url: String,
}

/// What the page should do with a click.
#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum PageAction {
    /// Run the page's own range selection.
    Delegate,
    Popup {
        request_id: RequestId,
        fetch: FetchSpec,
        window: TimeWindow,
        channel: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct Reconciliation {
    classification: Classification,
    effects: Vec<PanelEffect>,
}

fn with_entry<T>(
    handle: usize,
    f: impl FnOnce(&mut Registered) -> Result<T, String>,
) -> Result<T, String> {
    MENUS.with_borrow_mut(|menus| {
        let entry = menus.get_mut(handle).ok_or("invalid menu handle")?;
        f(entry)
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn register(kind: &str, id: &str) -> Result<usize, String> {
    let kind: MenuKind = kind.parse().map_err(|e: MenuError| e.to_string())?;
    Ok(MENUS.with_borrow_mut(|menus| {
        menus.push(Registered {
            menu: kind.create(id),
            kind,
            popups: RequestTracker::new(),
        });
        menus.len() - 1
    }))
}

fn menu_json(handle: usize) -> Result<String, String> {
    with_entry(handle, |entry| to_json(&entry.menu))
}

fn decide(handle: usize, click_json: &str, form_json: &str) -> Result<String, String> {
    let click: ClickEvent = serde_json::from_str(click_json).map_err(|e| e.to_string())?;
    let form: FormSnapshot = serde_json::from_str(form_json).map_err(|e| e.to_string())?;

    with_entry(handle, |entry| {
        if entry.kind != MenuKind::Wave {
            return to_json(&PageAction::Delegate);
        }
        let action = match decide_click(&entry.menu, &click, &form).map_err(|e| e.to_string())? {
            ClickDecision::Delegate => PageAction::Delegate,
            ClickDecision::Popup(PopupFetch {
                label,
                url,
                window,
                channel,
            }) => {
                // Responses are filtered through `take_popup`; the token goes unused.
                let (request_id, _) = entry.popups.begin();
                PageAction::Popup {
                    request_id,
                    fetch: FetchSpec { label, url },
                    window,
                    channel,
                }
            }
        };
        to_json(&action)
    })
}

fn popup_current(handle: usize, request_id: u64) -> Result<bool, String> {
    with_entry(handle, |entry| Ok(entry.popups.settle(RequestId(request_id))))
}

fn description_fetch(handle: usize) -> Result<String, String> {
    with_entry(handle, |entry| {
        to_json(&FetchSpec {
            label: format!("{} generic menu description", entry.menu.id),
            url: data_url(MENU_DESCRIPTION_ACTION, &entry.menu.id),
        })
    })
}

fn reconcile_response(handle: usize, xml: &str) -> Result<String, String> {
    with_entry(handle, |entry| {
        let classification = classify(&entry.menu.id, xml);
        let effects = reconcile(&classification, &PanelIds::for_menu(&entry.menu.id));
        to_json(&Reconciliation {
            classification,
            effects,
        })
    })
}

/// Configure a menu of `kind` ("wave" or "ewrsam") for data source `id`.
/// Returns a handle for later calls.
#[wasm_bindgen]
pub fn create_menu(kind: &str, id: &str) -> Result<usize, JsError> {
    register(kind, id).map_err(|e| JsError::new(&e))
}

/// The configured menu fields as JSON.
#[wasm_bindgen]
pub fn get_menu(handle: usize) -> Result<String, JsError> {
    menu_json(handle).map_err(|e| JsError::new(&e))
}

/// Decide what a click on the menu's plot does. `click` is a JSON
/// `ClickEvent`, `form` a JSON `FormSnapshot`. The result tells the page
/// to delegate or which inset plot to fetch.
#[wasm_bindgen]
pub fn accept_click(handle: usize, click: &str, form: &str) -> Result<String, JsError> {
    decide(handle, click, form).map_err(|e| JsError::new(&e))
}

/// Whether an inset plot response should still be shown. Each request id
/// answers `true` at most once, and only if no newer popup was requested.
#[wasm_bindgen]
pub fn take_popup(handle: usize, request_id: u64) -> Result<bool, JsError> {
    popup_current(handle, request_id).map_err(|e| JsError::new(&e))
}

/// Label and URL of the menu description request issued at initialization.
#[wasm_bindgen]
pub fn describe_request(handle: usize) -> Result<String, JsError> {
    description_fetch(handle).map_err(|e| JsError::new(&e))
}

/// Panel changes for a menu description response, as JSON.
#[wasm_bindgen]
pub fn reconcile_description(handle: usize, xml: &str) -> Result<String, JsError> {
    reconcile_response(handle, xml).map_err(|e| JsError::new(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POPUP_FORM: &str = r#"{"fields":[
        {"name":"skip:ca","kind":"radio","options":["settime","popup"],"checked":1},
        {"name":"skip:popupDuration","kind":"select","options":[{"value":"2","text":"2"}],"selected":0}
    ]}"#;

    const CLICK: &str = r#"{"target":{"xml":"<plot ch=\"HVO\"/>"},
        "screen":{"x":5.0,"y":6.0},"graph":{"x":1000.0,"y":0.0}}"#;

    #[test]
    fn popup_decision_and_supersession() {
        let handle = register("wave", "wasm_wave").unwrap();
        let first: serde_json::Value =
            serde_json::from_str(&decide(handle, CLICK, POPUP_FORM).unwrap()).unwrap();
        assert_eq!(first["action"], "popup");
        assert_eq!(first["fetch"]["label"], "wasm_wave inset plot");
        assert_eq!(first["window"]["start"], 940.0);
        assert_eq!(first["channel"], "HVO");

        let second: serde_json::Value =
            serde_json::from_str(&decide(handle, CLICK, POPUP_FORM).unwrap()).unwrap();
        let first_id = first["request_id"].as_u64().unwrap();
        let second_id = second["request_id"].as_u64().unwrap();
        assert!(!popup_current(handle, first_id).unwrap());
        assert!(popup_current(handle, second_id).unwrap());
        assert!(!popup_current(handle, second_id).unwrap());
    }

    #[test]
    fn set_time_delegates() {
        let handle = register("wave", "wasm_wave2").unwrap();
        let form = POPUP_FORM.replace("\"checked\":1", "\"checked\":0");
        let decision = decide(handle, CLICK, &form).unwrap();
        assert_eq!(decision, r#"{"action":"delegate"}"#);
    }

    #[test]
    fn rsam_reconciliation() {
        let handle = register("ewrsam", "r").unwrap();
        let fetch: serde_json::Value =
            serde_json::from_str(&description_fetch(handle).unwrap()).unwrap();
        assert_eq!(fetch["url"], "valve3.jsp?a=data&da=ewRsamMenu&src=r");

        let out: serde_json::Value = serde_json::from_str(
            &reconcile_response(handle, "<dataTypes>[EVENTS]</dataTypes>").unwrap(),
        )
        .unwrap();
        assert_eq!(out["classification"], "Events");
        assert_eq!(out["effects"][0]["element"], "r_cnts");

        let menu: serde_json::Value = serde_json::from_str(&menu_json(handle).unwrap()).unwrap();
        assert_eq!(menu["form_name"], "ewrsamForm");
    }

    #[test]
    fn unknown_kind_and_handle() {
        assert!(register("tilt", "t").is_err());
        assert!(menu_json(usize::MAX).is_err());
    }
}
