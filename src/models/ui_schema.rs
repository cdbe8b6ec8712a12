// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Presentation hints ("UI schema") layered over the data schema.
//!
//! The UI schema mirrors the shape of the data: object properties are keyed
//! by name, array items live under `items`, and `oneOf`/`anyOf` options get
//! one hint object per option. Hint keys carry a `ui:` prefix.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::warn;

/// Hints used when no UI schema file is configured.
const BUILTIN_UI_SCHEMA: &str = include_str!("../../assets/ui_schema.json");
/// Submit button label when the UI schema does not set one.
const DEFAULT_SUBMIT_TEXT: &str = "Submit";

/// Widget override requested through `ui:widget`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Widget {
    Radio,
    Textarea,
    Hidden,
}

/// Owned UI schema document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UiSchema {
    root: Value,
}

impl UiSchema {
    /// Parse a UI schema from JSON text. The document must be an object.
    pub fn from_json(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text).context("Failed to parse UI schema JSON")?;
        if !root.is_object() {
            bail!("UI schema must be a JSON object");
        }
        Ok(Self { root })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read UI schema {:?}", path))?;
        Self::from_json(&text).with_context(|| format!("Invalid UI schema {:?}", path))
    }

    /// Hints shipped with the application.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_UI_SCHEMA).unwrap_or_else(|err| {
            warn!(error = %err, "Built-in UI schema is invalid, rendering without hints");
            Self::default()
        })
    }

    pub fn root(&self) -> UiNode<'_> {
        UiNode(Some(&self.root))
    }

    /// Label for the submit button.
    pub fn submit_text(&self) -> &str {
        self.submit_options()
            .and_then(|o| o.get("submitText"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SUBMIT_TEXT)
    }

    /// Whether the submit button should be hidden.
    pub fn submit_hidden(&self) -> bool {
        self.submit_options()
            .and_then(|o| o.get("norender"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn submit_options(&self) -> Option<&Value> {
        self.root.get("ui:submitButtonOptions")
    }
}

/// Borrowed view of the hints for one field; missing hints behave like an empty object.
#[derive(Clone, Copy, Debug, Default)]
pub struct UiNode<'a>(Option<&'a Value>);

impl<'a> UiNode<'a> {
    /// Hints for an object property.
    pub fn field(self, name: &str) -> UiNode<'a> {
        UiNode(self.0.and_then(|v| v.get(name)))
    }

    /// Hints shared by every array item.
    pub fn items(self) -> UiNode<'a> {
        self.field("items")
    }

    /// Hints for one `oneOf`/`anyOf` option.
    pub fn option(self, keyword: &str, index: usize) -> UiNode<'a> {
        UiNode(
            self.0
                .and_then(|v| v.get(keyword))
                .and_then(|v| v.get(index)),
        )
    }

    fn str_hint(self, key: &str) -> Option<&'a str> {
        self.0.and_then(|v| v.get(key)).and_then(Value::as_str)
    }

    pub fn help(self) -> Option<&'a str> {
        self.str_hint("ui:help")
    }

    pub fn placeholder(self) -> Option<&'a str> {
        self.str_hint("ui:placeholder")
    }

    pub fn title(self) -> Option<&'a str> {
        self.str_hint("ui:title")
    }

    pub fn description(self) -> Option<&'a str> {
        self.str_hint("ui:description")
    }

    /// Recognised widget override; unknown names fall back to the default widget.
    pub fn widget(self) -> Option<Widget> {
        match self.str_hint("ui:widget")? {
            "radio" => Some(Widget::Radio),
            "textarea" => Some(Widget::Textarea),
            "hidden" => Some(Widget::Hidden),
            _ => None,
        }
    }

    /// Value stored when the input is cleared, instead of dropping the key.
    pub fn empty_value(self) -> Option<&'a Value> {
        self.0.and_then(|v| v.get("ui:emptyValue"))
    }

    /// Property order from `ui:order`.
    pub fn order(self) -> Option<Vec<&'a str>> {
        let list = self.0?.get("ui:order")?.as_array()?;
        Some(list.iter().filter_map(Value::as_str).collect())
    }
}

/// Arrange property names according to a `ui:order` list.
///
/// Listed names come first in listed order and `*` expands to every property
/// not listed explicitly, in schema order. Names missing from the schema are
/// ignored. Without `*`, unlisted properties are appended at the end.
pub fn order_properties<'a>(properties: &[&'a str], order: Option<&[&str]>) -> Vec<&'a str> {
    let Some(order) = order else {
        return properties.to_vec();
    };

    let listed = |name: &str| order.iter().any(|o| *o == name);
    let rest: Vec<&'a str> = properties.iter().copied().filter(|p| !listed(p)).collect();

    let mut out = Vec::with_capacity(properties.len());
    let mut wildcard_used = false;
    for entry in order {
        if *entry == "*" {
            if !wildcard_used {
                out.extend(rest.iter().copied());
                wildcard_used = true;
            }
        } else if let Some(name) = properties.iter().find(|p| ***p == **entry)
            && !out.contains(name)
        {
            out.push(*name);
        }
    }
    if !wildcard_used {
        out.extend(rest);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_hints_match_the_entry_form() {
        let ui = UiSchema::builtin();
        let root = ui.root();

        assert_eq!(ui.submit_text(), "Download");
        assert!(!ui.submit_hidden());
        assert_eq!(
            root.order().unwrap(),
            vec!["datasetId", "bibId", "datasetType", "experimentalConditionId", "*"]
        );
        assert_eq!(
            root.field("nuclide").field("mass").help(),
            Some("input 0 if the target is of natural abundance")
        );

        let item = root.field("observable").field("uncertainties").items();
        assert_eq!(item.field("description").placeholder(), Some("hoge"));
        let value = item.field("value");
        assert_eq!(value.option("oneOf", 1).placeholder(), Some("+3-5"));
        assert_eq!(value.option("oneOf", 3).widget(), Some(Widget::Radio));
        assert_eq!(value.option("oneOf", 4).empty_value(), Some(&json!(true)));
        assert!(value.option("oneOf", 9).widget().is_none());
    }

    #[test]
    fn missing_hints_are_empty() {
        let ui = UiSchema::default();
        let node = ui.root().field("nothing").items().option("oneOf", 0);
        assert!(node.help().is_none());
        assert!(node.order().is_none());
        assert_eq!(ui.submit_text(), "Submit");
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(UiSchema::from_json("[1, 2]").is_err());
        assert!(UiSchema::from_json("{").is_err());
    }

    #[test]
    fn unknown_widgets_are_ignored() {
        let ui = UiSchema::from_json(r#"{"x": {"ui:widget": "color"}}"#).unwrap();
        assert_eq!(ui.root().field("x").widget(), None);
    }

    #[test]
    fn wildcard_expands_to_remaining_properties() {
        let props = ["nuclide", "bibId", "observable", "datasetId", "datasetType"];
        let order = ["datasetId", "bibId", "datasetType", "experimentalConditionId", "*"];

        assert_eq!(
            order_properties(&props, Some(&order[..])),
            vec!["datasetId", "bibId", "datasetType", "nuclide", "observable"]
        );
    }

    #[test]
    fn unlisted_properties_are_appended_without_wildcard() {
        let props = ["a", "b", "c"];
        assert_eq!(order_properties(&props, Some(&["c"][..])), vec!["c", "a", "b"]);
        assert_eq!(order_properties(&props, None), vec!["a", "b", "c"]);
    }

    #[test]
    fn wildcard_in_the_middle() {
        let props = ["a", "b", "c", "d"];
        assert_eq!(
            order_properties(&props, Some(&["d", "*", "a"][..])),
            vec!["d", "b", "c", "a"]
        );
    }
}
