use serde::{Deserialize, Serialize};

/// Prefix marking form fields that only drive the page and are never sent.
pub const SKIP_PREFIX: &str = "skip:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

/// Current state of one form control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldValue {
    Text {
        value: String,
    },
    /// A radio group; `checked` indexes `options`.
    Radio {
        options: Vec<String>,
        checked: Option<usize>,
    },
    Select {
        options: Vec<SelectOption>,
        selected: Option<usize>,
    },
    Checkbox {
        value: String,
        checked: bool,
    },
}

impl FieldValue {
    /// The value the control submits, if it submits anything.
    pub fn submitted(&self) -> Option<&str> {
        match self {
            Self::Text { value } => Some(value.as_str()),
            Self::Radio { options, checked } => {
                checked.and_then(|i| options.get(i)).map(String::as_str)
            }
            Self::Select { options, selected } => selected
                .and_then(|i| options.get(i))
                .map(|o| o.value.as_str()),
            Self::Checkbox { value, checked } => checked.then_some(value.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(flatten)]
    pub value: FieldValue,
}

/// Point-in-time copy of every control in a menu's form.
///
/// Field names follow the page conventions: `skip:` fields stay on the
/// page, and `kind:name` fields (e.g. `selector:ch`) are submitted as
/// `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub fields: Vec<FormField>,
}

impl FormSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push(FormField {
            name: name.into(),
            value,
        });
    }

    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(
            name,
            FieldValue::Text {
                value: value.into(),
            },
        );
        self
    }

    pub fn with_radio<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        checked: Option<usize>,
    ) -> Self {
        self.push(
            name,
            FieldValue::Radio {
                options: options.into_iter().map(Into::into).collect(),
                checked,
            },
        );
        self
    }

    pub fn with_select(
        mut self,
        name: impl Into<String>,
        options: Vec<SelectOption>,
        selected: Option<usize>,
    ) -> Self {
        self.push(name, FieldValue::Select { options, selected });
        self
    }

    pub fn with_checkbox(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        checked: bool,
    ) -> Self {
        self.push(
            name,
            FieldValue::Checkbox {
                value: value.into(),
                checked,
            },
        );
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    /// Index of the checked radio button in group `name`.
    pub fn checked_index(&self, name: &str) -> Option<usize> {
        match self.field(name)? {
            FieldValue::Radio { checked, .. } => *checked,
            _ => None,
        }
    }

    /// Display text of the selected option of select `name`.
    pub fn selected_text(&self, name: &str) -> Option<&str> {
        match self.field(name)? {
            FieldValue::Select { options, selected } => {
                selected.and_then(|i| options.get(i)).map(|o| o.text.as_str())
            }
            _ => None,
        }
    }

    /// Request parameters this form submits, in field order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().filter_map(|f| {
            let key = parameter_name(&f.name)?;
            Some((key, f.value.submitted()?))
        })
    }
}

/// Request parameter a form field submits under, or `None` for page-only fields.
pub fn parameter_name(field: &str) -> Option<&str> {
    if field.starts_with(SKIP_PREFIX) {
        return None;
    }
    let key = match field.split_once(':') {
        Some((_, rest)) => rest,
        None => field,
    };
    (!key.is_empty()).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FormSnapshot {
        FormSnapshot::new()
            .with_radio("skip:ca", ["settime", "popup"], Some(1))
            .with_select(
                "skip:popupDuration",
                vec![SelectOption::new("a", "1"), SelectOption::new("b", "2")],
                Some(1),
            )
            .with_text("selector:ch", "HVO_EHZ_HV")
            .with_select(
                "type",
                vec![SelectOption::new("wf", "Waveform"), SelectOption::new("sp", "Spectra")],
                Some(0),
            )
            .with_checkbox("removeBias", "T", true)
            .with_checkbox("logPower", "T", false)
    }

    #[test]
    fn reads_radio_and_select() {
        let form = sample();
        assert_eq!(form.checked_index("skip:ca"), Some(1));
        assert_eq!(form.selected_text("skip:popupDuration"), Some("2"));
        assert_eq!(form.checked_index("type"), None);
        assert_eq!(form.selected_text("missing"), None);
    }

    #[test]
    fn parameters_skip_page_fields_and_strip_prefix() {
        let form = sample();
        let params: Vec<_> = form.parameters().collect();
        assert_eq!(
            params,
            vec![("ch", "HVO_EHZ_HV"), ("type", "wf"), ("removeBias", "T")]
        );
    }

    #[test]
    fn parameter_names() {
        assert_eq!(parameter_name("skip:ca"), None);
        assert_eq!(parameter_name("selector:ch"), Some("ch"));
        assert_eq!(parameter_name("plain"), Some("plain"));
        assert_eq!(parameter_name("selector:"), None);
    }

    #[test]
    fn snapshot_json_shape() {
        let json = r#"{"fields":[
            {"name":"skip:ca","kind":"radio","options":["a","b"],"checked":0},
            {"name":"st","kind":"text","value":"-1h"}
        ]}"#;
        let form: FormSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(form.checked_index("skip:ca"), Some(0));
        assert_eq!(form.parameters().collect::<Vec<_>>(), vec![("st", "-1h")]);
    }
}
