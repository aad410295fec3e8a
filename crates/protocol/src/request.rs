use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::ProtocolError;
use crate::form::FormSnapshot;
use crate::time::TimeWindow;
use crate::types::PlotBox;

/// Servlet every menu request goes through.
pub const ENDPOINT: &str = "valve3.jsp";

/// Keys owned by the component itself; form snapshots never overwrite them.
const RESERVED_KEYS: &[&str] = &["src", "st", "et"];

/// One plot within a [`PlotRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotComponent {
    source: String,
    plot_box: PlotBox,
    params: IndexMap<String, String>,
}

impl PlotComponent {
    pub fn new(source: impl Into<String>, start: String, end: String, plot_box: PlotBox) -> Self {
        let mut params = IndexMap::new();
        params.insert("st".to_string(), start);
        params.insert("et".to_string(), end);
        Self {
            source: source.into(),
            plot_box,
            params,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn plot_box(&self) -> PlotBox {
        self.plot_box
    }

    pub fn start(&self) -> &str {
        self.get("st").unwrap_or_default()
    }

    pub fn end(&self) -> &str {
        self.get("et").unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Set a parameter, replacing any earlier value under the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Copy every submitted form value into this component.
    pub fn set_from_form(&mut self, form: &FormSnapshot) {
        for (key, value) in form.parameters() {
            if RESERVED_KEYS.contains(&key) {
                continue;
            }
            self.set(key, value);
        }
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A request for one rendered plot image made of one or more components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotRequest {
    inset: bool,
    components: Vec<PlotComponent>,
}

impl PlotRequest {
    /// `inset` requests are popups and get the small [`PlotBox::INSET`] layout.
    pub fn new(inset: bool) -> Self {
        Self {
            inset,
            components: Vec::new(),
        }
    }

    pub fn is_inset(&self) -> bool {
        self.inset
    }

    /// Add a component for `source` covering `window`, stacked below any
    /// existing components.
    pub fn create_component(
        &mut self,
        source: impl Into<String>,
        window: &TimeWindow,
    ) -> Result<&mut PlotComponent, ProtocolError> {
        let (start, end) = window.to_time_strings()?;
        let base = if self.inset {
            PlotBox::INSET
        } else {
            PlotBox::STANDARD
        };
        let row = self.components.len() as u32;
        let plot_box = PlotBox::new(base.x, base.y + row * (base.h + base.y), base.w, base.h);
        self.components
            .push(PlotComponent::new(source, start, end, plot_box));
        let idx = self.components.len() - 1;
        Ok(&mut self.components[idx])
    }

    pub fn components(&self) -> &[PlotComponent] {
        &self.components
    }

    /// Serialize as a plot URL relative to the servlet root.
    ///
    /// Component parameters are suffixed with the component index, e.g.
    /// `src.0`, `st.0`, `ch.0`.
    pub fn to_url(&self) -> Result<String, ProtocolError> {
        if self.components.is_empty() {
            return Err(ProtocolError::EmptyRequest);
        }
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("a", "plot")
            .append_pair("o", "xml")
            .append_pair("n", &self.components.len().to_string());
        for (i, c) in self.components.iter().enumerate() {
            let b = c.plot_box;
            query
                .append_pair(&format!("src.{i}"), &c.source)
                .append_pair(&format!("x.{i}"), &b.x.to_string())
                .append_pair(&format!("y.{i}"), &b.y.to_string())
                .append_pair(&format!("w.{i}"), &b.w.to_string())
                .append_pair(&format!("h.{i}"), &b.h.to_string());
            for (key, value) in c.params() {
                query.append_pair(&format!("{key}.{i}"), value);
            }
        }
        Ok(format!("{ENDPOINT}?{}", query.finish()))
    }
}

/// URL of a data action (`da`) against source `source`, e.g. a menu description.
pub fn data_url(action: &str, source: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("a", "data")
        .append_pair("da", action)
        .append_pair("src", source)
        .finish();
    format!("{ENDPOINT}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::SelectOption;

    #[test]
    fn inset_request_url() {
        let mut req = PlotRequest::new(true);
        let window = TimeWindow::centered(1000.0, 2.0).unwrap();
        let pc = req.create_component("hvo_wave", &window).unwrap();
        pc.set("ch", "HVO EHZ");
        let url = req.to_url().unwrap();
        assert_eq!(
            url,
            "valve3.jsp?a=plot&o=xml&n=1&src.0=hvo_wave&x.0=60&y.0=19&w.0=300&h.0=100\
             &st.0=20000101121540000&et.0=20000101121740000&ch.0=HVO+EHZ"
        );
    }

    #[test]
    fn form_values_do_not_override_window() {
        let mut req = PlotRequest::new(false);
        let window = TimeWindow::new(0.0, 60.0).unwrap();
        let pc = req.create_component("src", &window).unwrap();
        let form = FormSnapshot::new()
            .with_text("st", "-1h")
            .with_text("selector:ch", "A")
            .with_select("type", vec![SelectOption::new("wf", "Waveform")], Some(0));
        pc.set_from_form(&form);
        assert_eq!(pc.start(), "20000101120000000");
        assert_eq!(pc.get("ch"), Some("A"));
        assert_eq!(pc.get("type"), Some("wf"));

        pc.set("ch", "B");
        assert_eq!(pc.get("ch"), Some("B"));
        assert_eq!(pc.params().count(), 4);
    }

    #[test]
    fn components_stack_vertically() {
        let mut req = PlotRequest::new(false);
        let window = TimeWindow::new(0.0, 1.0).unwrap();
        req.create_component("a", &window).unwrap();
        req.create_component("b", &window).unwrap();
        assert_eq!(req.components()[0].plot_box().y, 19);
        assert_eq!(req.components()[1].plot_box().y, 19 + 140 + 19);
        assert!(req.to_url().unwrap().contains("&n=2&"));
    }

    #[test]
    fn empty_request_has_no_url() {
        assert_eq!(
            PlotRequest::new(true).to_url(),
            Err(ProtocolError::EmptyRequest)
        );
    }

    #[test]
    fn data_url_encodes_source() {
        assert_eq!(
            data_url("ewRsamMenu", "ew rsam"),
            "valve3.jsp?a=data&da=ewRsamMenu&src=ew+rsam"
        );
    }
}
