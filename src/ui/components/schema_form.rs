// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Schema-driven entry form: MVU model, update, and egui view.
//!
//! The view walks the dereferenced schema together with the UI schema hints
//! and emits messages keyed by JSON Pointer; `update` applies them to the
//! form data. Validation only runs on submit.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use eframe::egui;
use egui_extras::DatePickerButton;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::models::form_data::{
    self, composition_options, index_pointer, object_properties, populate_defaults,
    required_properties, schema_type,
};
use crate::models::ui_schema::{UiNode, UiSchema, Widget, order_properties};
use crate::models::validation::{FormError, FormValidator};

/// Date format used for `"format": "date"` strings.
const DATE_FORMAT: &str = "%Y-%m-%d";
/// Errors listed in the validation modal before eliding the rest.
const MAX_LISTED_ERRORS: usize = 5;

/// Form state for one loaded schema.
#[derive(Debug)]
pub struct SchemaFormModel {
    schema: Value,
    ui_schema: UiSchema,
    validator: FormValidator,
    data: Value,
    /// Selected `oneOf`/`anyOf` option per pointer.
    choices: BTreeMap<String, usize>,
    /// Raw text of numeric inputs while the user is typing.
    number_text: BTreeMap<String, String>,
    errors: Vec<FormError>,
    /// Field that should take keyboard focus on the next frame.
    focus: Option<String>,
}

impl SchemaFormModel {
    /// Compile the validator and hydrate the form with schema defaults.
    pub fn new(schema: Value, ui_schema: UiSchema) -> Result<Self> {
        let validator = FormValidator::new(&schema)?;
        let mut model = Self {
            schema,
            ui_schema,
            validator,
            data: Value::Null,
            choices: BTreeMap::new(),
            number_text: BTreeMap::new(),
            errors: Vec::new(),
            focus: None,
        };
        model.hydrate(None);
        Ok(model)
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn errors(&self) -> &[FormError] {
        &self.errors
    }

    pub fn ui_schema(&self) -> &UiSchema {
        &self.ui_schema
    }

    /// Title declared by the root schema, if any.
    pub fn title(&self) -> Option<&str> {
        self.schema.get("title").and_then(Value::as_str)
    }

    fn choice(&self, pointer: &str) -> usize {
        self.choices.get(pointer).copied().unwrap_or(0)
    }

    fn errors_at<'a>(&'a self, pointer: &'a str) -> impl Iterator<Item = &'a FormError> + 'a {
        self.errors.iter().filter(move |e| e.pointer == pointer)
    }

    /// Replace the form data, merging schema defaults into undefined fields.
    fn hydrate(&mut self, data: Option<Value>) {
        self.data = populate_defaults(&self.schema, data.as_ref())
            .unwrap_or_else(|| Value::Object(Map::new()));
        self.choices = form_data::infer_choices(&self.schema, &self.data);
        self.number_text.clear();
        self.errors.clear();
        self.focus = None;
    }

    fn clear_errors_under(&mut self, pointer: &str) {
        self.errors.retain(|e| !is_under(&e.pointer, pointer));
    }

    /// Re-key per-item state after array elements were removed or moved.
    fn remap_items(&mut self, array: &str, map_index: impl Fn(usize) -> Option<usize>) {
        self.choices = remap_keys(std::mem::take(&mut self.choices), array, &map_index);
        self.number_text = remap_keys(std::mem::take(&mut self.number_text), array, &map_index);
        self.clear_errors_under(array);
    }
}

/// Messages produced by the form view.
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaFormMsg {
    /// Store a value; `None` removes the key.
    Edit {
        pointer: String,
        value: Option<Value>,
    },
    /// Raw text from a numeric input; `empty` is stored when the text is cleared.
    EditNumber {
        pointer: String,
        text: String,
        empty: Option<Value>,
    },
    AddItem {
        pointer: String,
        item: Value,
    },
    RemoveItem {
        pointer: String,
        index: usize,
    },
    MoveItem {
        pointer: String,
        from: usize,
        to: usize,
    },
    /// Switch a `oneOf`/`anyOf` field to another option, replacing its value.
    SelectOption {
        pointer: String,
        index: usize,
        value: Option<Value>,
    },
    FocusHandled,
    Submit,
    Reset,
    DataLoaded {
        data: Value,
        source: PathBuf,
    },
}

/// Commands that require side effects.
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaFormCommand {
    /// Validated data ready to be written.
    Export(Value),
}

/// Feedback surfaced to the status bar/modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaFormEvent {
    pub message: String,
    pub is_error: bool,
}

/// Update the model based on a message.
pub fn update(
    model: &mut SchemaFormModel,
    msg: SchemaFormMsg,
    cmds: &mut Vec<SchemaFormCommand>,
) -> Option<SchemaFormEvent> {
    match msg {
        SchemaFormMsg::Edit { pointer, value } => {
            model.number_text.remove(&pointer);
            model.clear_errors_under(&pointer);
            model.focus = None;
            debug!(pointer = %pointer, value = ?value, "Field changed");
            store(&mut model.data, &pointer, value);
            None
        }
        SchemaFormMsg::EditNumber {
            pointer,
            text,
            empty,
        } => {
            model.clear_errors_under(&pointer);
            model.focus = None;
            let value = if text.trim().is_empty() {
                model.number_text.remove(&pointer);
                empty
            } else {
                let parsed = form_data::parse_number_input(&text);
                model.number_text.insert(pointer.clone(), text);
                Some(parsed)
            };
            debug!(pointer = %pointer, value = ?value, "Field changed");
            store(&mut model.data, &pointer, value);
            None
        }
        SchemaFormMsg::AddItem { pointer, item } => {
            model.clear_errors_under(&pointer);
            if form_data::push_item(&mut model.data, &pointer, item) {
                debug!(pointer = %pointer, "Item added");
            }
            None
        }
        SchemaFormMsg::RemoveItem { pointer, index } => {
            if form_data::remove_item(&mut model.data, &pointer, index) {
                model.remap_items(&pointer, |i| match i.cmp(&index) {
                    std::cmp::Ordering::Less => Some(i),
                    std::cmp::Ordering::Equal => None,
                    std::cmp::Ordering::Greater => Some(i - 1),
                });
                debug!(pointer = %pointer, index, "Item removed");
            }
            None
        }
        SchemaFormMsg::MoveItem { pointer, from, to } => {
            if form_data::move_item(&mut model.data, &pointer, from, to) {
                model.remap_items(&pointer, |i| Some(moved_index(i, from, to)));
                debug!(pointer = %pointer, from, to, "Item moved");
            }
            None
        }
        SchemaFormMsg::SelectOption {
            pointer,
            index,
            value,
        } => {
            model.choices.retain(|k, _| !is_under(k, &pointer));
            model.number_text.retain(|k, _| !is_under(k, &pointer));
            model.choices.insert(pointer.clone(), index);
            model.clear_errors_under(&pointer);
            debug!(pointer = %pointer, option = index, "Option selected");
            store(&mut model.data, &pointer, value);
            None
        }
        SchemaFormMsg::FocusHandled => {
            model.focus = None;
            None
        }
        SchemaFormMsg::Submit => {
            let errors = model.validator.validate(&model.data);
            if errors.is_empty() {
                info!(data = %model.data, "Entry submitted");
                model.errors.clear();
                cmds.push(SchemaFormCommand::Export(model.data.clone()));
                return None;
            }

            warn!(count = errors.len(), errors = ?errors, "Entry failed validation");
            model.focus = errors.first().map(|e| e.pointer.clone());
            let mut message = format!("Please fix {} problem(s) before exporting:\n", errors.len());
            for error in errors.iter().take(MAX_LISTED_ERRORS) {
                message.push_str(&format!("\n• {error}"));
            }
            if errors.len() > MAX_LISTED_ERRORS {
                message.push_str(&format!("\n… and {} more", errors.len() - MAX_LISTED_ERRORS));
            }
            model.errors = errors;
            Some(SchemaFormEvent {
                message,
                is_error: true,
            })
        }
        SchemaFormMsg::Reset => {
            model.hydrate(None);
            Some(SchemaFormEvent {
                message: "Form reset to defaults.".to_string(),
                is_error: false,
            })
        }
        SchemaFormMsg::DataLoaded { data, source } => {
            model.hydrate(Some(data));
            Some(SchemaFormEvent {
                message: format!("Loaded entry from {}", source.display()),
                is_error: false,
            })
        }
    }
}

fn store(data: &mut Value, pointer: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            if !form_data::set(data, pointer, value) {
                warn!(pointer = %pointer, "Cannot store value at pointer");
            }
        }
        None => {
            form_data::remove(data, pointer);
        }
    }
}

/// Whether `pointer` equals `prefix` or lies below it.
fn is_under(pointer: &str, prefix: &str) -> bool {
    pointer
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// New position of element `i` after moving `from` to `to`.
fn moved_index(i: usize, from: usize, to: usize) -> usize {
    if i == from {
        to
    } else if from < to && i > from && i <= to {
        i - 1
    } else if from > to && i >= to && i < from {
        i + 1
    } else {
        i
    }
}

fn remap_keys<T>(
    map: BTreeMap<String, T>,
    array: &str,
    map_index: &impl Fn(usize) -> Option<usize>,
) -> BTreeMap<String, T> {
    let prefix = format!("{array}/");
    map.into_iter()
        .filter_map(|(key, value)| {
            let Some(rest) = key.strip_prefix(&prefix) else {
                return Some((key, value));
            };
            let (index, tail) = rest.split_once('/').unwrap_or((rest, ""));
            let Ok(index) = index.parse::<usize>() else {
                return Some((key, value));
            };
            let new_index = map_index(index)?;
            let mut new_key = index_pointer(array, new_index);
            if !tail.is_empty() {
                new_key.push('/');
                new_key.push_str(tail);
            }
            Some((new_key, value))
        })
        .collect()
}

/// Render the form and return triggered messages.
pub fn view(ui: &mut egui::Ui, model: &SchemaFormModel) -> Vec<SchemaFormMsg> {
    let mut msgs = Vec::new();
    let mut form = FormView {
        model,
        msgs: &mut msgs,
    };

    form.render_error_list(ui);
    if let Some(description) = model.schema.get("description").and_then(Value::as_str) {
        ui.label(muted(description));
        ui.add_space(6.0);
    }
    let ui_schema = model.ui_schema();
    form.render_node(ui, &model.schema, ui_schema.root(), "", None, false);

    if !ui_schema.submit_hidden() {
        ui.add_space(12.0);
        let button = egui::Button::new(format!(
            "{} {}",
            egui_phosphor::regular::DOWNLOAD_SIMPLE,
            ui_schema.submit_text()
        ));
        if ui.add(button).clicked() {
            msgs.push(SchemaFormMsg::Submit);
        }
    }

    msgs
}

struct FormView<'m> {
    model: &'m SchemaFormModel,
    msgs: &'m mut Vec<SchemaFormMsg>,
}

impl<'m> FormView<'m> {
    fn value(&self, pointer: &str) -> Option<&'m Value> {
        let model = self.model;
        form_data::get(&model.data, pointer)
    }

    fn render_error_list(&mut self, ui: &mut egui::Ui) {
        let errors = self.model.errors();
        if errors.is_empty() {
            return;
        }
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(
                egui::RichText::new(format!("{} Errors", egui_phosphor::regular::WARNING))
                    .strong()
                    .color(ui.visuals().error_fg_color),
            );
            for error in errors {
                ui.label(egui::RichText::new(error.to_string()).color(ui.visuals().error_fg_color));
            }
        });
        ui.add_space(8.0);
    }

    fn render_node(
        &mut self,
        ui: &mut egui::Ui,
        schema: &'m Value,
        hints: UiNode<'m>,
        pointer: &str,
        label: Option<&str>,
        required: bool,
    ) {
        if hints.widget() == Some(Widget::Hidden) {
            return;
        }

        if let Some((keyword, options)) = composition_options(schema) {
            self.render_composition(ui, keyword, options, hints, pointer, label, required);
            return;
        }
        if let Some(options) = schema.get("enum").and_then(Value::as_array) {
            self.render_enum(ui, schema, options, hints, pointer, label, required);
            return;
        }

        match schema_type(schema) {
            Some("object") => self.render_object(ui, schema, hints, pointer, label, required),
            Some("array") => self.render_array(ui, schema, hints, pointer, label, required),
            Some("boolean") => self.render_boolean(ui, schema, hints, pointer, label, required),
            Some("number") | Some("integer") => {
                self.render_number(ui, schema, hints, pointer, label, required)
            }
            Some("string") => self.render_string(ui, schema, hints, pointer, label, required),
            _ => self.leaf(ui, schema, hints, pointer, label, required, |this, ui| {
                let shown = this
                    .value(pointer)
                    .map(Value::to_string)
                    .unwrap_or_else(|| "—".to_string());
                ui.label(egui::RichText::new(format!("Unsupported field: {shown}")).italics());
                None
            }),
        }
    }

    /// Common layout for single-value fields: label, description, widget, help, errors.
    #[allow(clippy::too_many_arguments)]
    fn leaf(
        &mut self,
        ui: &mut egui::Ui,
        schema: &'m Value,
        hints: UiNode<'m>,
        pointer: &str,
        label: Option<&str>,
        required: bool,
        widget: impl FnOnce(&mut Self, &mut egui::Ui) -> Option<egui::Response>,
    ) {
        if let Some(label) = label {
            ui.label(field_label(label, required));
        }
        if let Some(description) = description(schema, hints) {
            ui.label(muted(description));
        }

        let response = widget(self, ui);
        if self.has_focus(pointer) {
            match response {
                Some(response) => {
                    response.request_focus();
                    response.scroll_to_me(Some(egui::Align::Center));
                }
                None => ui.scroll_to_cursor(Some(egui::Align::Center)),
            }
            self.msgs.push(SchemaFormMsg::FocusHandled);
        }

        if let Some(help) = hints.help() {
            ui.label(muted(help));
        }
        self.render_field_errors(ui, pointer);
        ui.add_space(6.0);
    }

    fn has_focus(&self, pointer: &str) -> bool {
        self.model.focus.as_deref() == Some(pointer)
    }

    /// Scroll an object or array frame into view when it holds the first error.
    fn focus_group(&mut self, pointer: &str, response: &egui::Response) {
        if self.has_focus(pointer) {
            response.scroll_to_me(Some(egui::Align::Center));
            self.msgs.push(SchemaFormMsg::FocusHandled);
        }
    }

    fn render_field_errors(&self, ui: &mut egui::Ui, pointer: &str) {
        for error in self.model.errors_at(pointer) {
            ui.label(
                egui::RichText::new(&error.message)
                    .small()
                    .color(ui.visuals().error_fg_color),
            );
        }
    }

    fn render_string(
        &mut self,
        ui: &mut egui::Ui,
        schema: &'m Value,
        hints: UiNode<'m>,
        pointer: &str,
        label: Option<&str>,
        required: bool,
    ) {
        let is_date = schema.get("format").and_then(Value::as_str) == Some("date");
        self.leaf(ui, schema, hints, pointer, label, required, |this, ui| {
            let mut text = this.value(pointer).map(display_value).unwrap_or_default();
            let mut date = NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .unwrap_or_else(|_| Local::now().date_naive());
            let multiline = hints.widget() == Some(Widget::Textarea);
            let mut edit = if multiline {
                egui::TextEdit::multiline(&mut text).desired_rows(3)
            } else {
                egui::TextEdit::singleline(&mut text)
            };
            if let Some(placeholder) = hints.placeholder() {
                edit = edit.hint_text(placeholder);
            } else if is_date {
                edit = edit.hint_text("YYYY-MM-DD");
            }

            let response = if is_date {
                ui.horizontal(|ui| {
                    let response = ui.add(edit.desired_width(120.0));
                    ui.push_id(pointer, |ui| {
                        if ui
                            .add(DatePickerButton::new(&mut date).show_icon(true))
                            .changed()
                        {
                            this.msgs.push(SchemaFormMsg::Edit {
                                pointer: pointer.to_string(),
                                value: Some(Value::String(date.format(DATE_FORMAT).to_string())),
                            });
                        }
                    });
                    response
                })
                .inner
            } else {
                ui.add(edit.desired_width(f32::INFINITY))
            };

            if response.changed() {
                let value = if text.is_empty() {
                    hints.empty_value().cloned()
                } else {
                    Some(Value::String(text))
                };
                this.msgs.push(SchemaFormMsg::Edit {
                    pointer: pointer.to_string(),
                    value,
                });
            }
            Some(response)
        });
    }

    fn render_number(
        &mut self,
        ui: &mut egui::Ui,
        schema: &'m Value,
        hints: UiNode<'m>,
        pointer: &str,
        label: Option<&str>,
        required: bool,
    ) {
        self.leaf(ui, schema, hints, pointer, label, required, |this, ui| {
            let mut text = this
                .model
                .number_text
                .get(pointer)
                .cloned()
                .or_else(|| this.value(pointer).map(display_value))
                .unwrap_or_default();
            let mut edit = egui::TextEdit::singleline(&mut text).desired_width(160.0);
            if let Some(placeholder) = hints.placeholder() {
                edit = edit.hint_text(placeholder);
            }
            let response = ui.add(edit);
            if response.changed() {
                this.msgs.push(SchemaFormMsg::EditNumber {
                    pointer: pointer.to_string(),
                    text,
                    empty: hints.empty_value().cloned(),
                });
            }
            Some(response)
        });
    }

    fn render_boolean(
        &mut self,
        ui: &mut egui::Ui,
        schema: &'m Value,
        hints: UiNode<'m>,
        pointer: &str,
        label: Option<&str>,
        required: bool,
    ) {
        let current = self.value(pointer).and_then(Value::as_bool);

        if hints.widget() == Some(Widget::Radio) {
            self.leaf(ui, schema, hints, pointer, label, required, |this, ui| {
                let response = ui
                    .horizontal(|ui| {
                        let yes = ui.radio(current == Some(true), "Yes");
                        let no = ui.radio(current == Some(false), "No");
                        for (clicked, choice) in [(yes.clicked(), true), (no.clicked(), false)] {
                            if clicked && current != Some(choice) {
                                this.msgs.push(SchemaFormMsg::Edit {
                                    pointer: pointer.to_string(),
                                    value: Some(Value::Bool(choice)),
                                });
                            }
                        }
                        yes
                    })
                    .inner;
                Some(response)
            });
            return;
        }

        // Checkboxes carry their label inline.
        let text = label.map(|l| field_label(l, required)).unwrap_or_default();
        self.leaf(ui, schema, hints, pointer, None, false, |this, ui| {
            let mut checked = current.unwrap_or(false);
            let response = ui.checkbox(&mut checked, text);
            if response.changed() {
                this.msgs.push(SchemaFormMsg::Edit {
                    pointer: pointer.to_string(),
                    value: Some(Value::Bool(checked)),
                });
            }
            Some(response)
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn render_enum(
        &mut self,
        ui: &mut egui::Ui,
        schema: &'m Value,
        options: &'m [Value],
        hints: UiNode<'m>,
        pointer: &str,
        label: Option<&str>,
        required: bool,
    ) {
        let current = self.value(pointer);
        self.leaf(ui, schema, hints, pointer, label, required, |this, ui| {
            let mut picked: Option<Option<Value>> = None;
            let response = if hints.widget() == Some(Widget::Radio) {
                ui.horizontal_wrapped(|ui| {
                    let mut first: Option<egui::Response> = None;
                    for option in options {
                        let response = ui.radio(current == Some(option), display_value(option));
                        if response.clicked() {
                            picked = Some(Some(option.clone()));
                        }
                        first.get_or_insert(response);
                    }
                    first
                })
                .inner
            } else {
                let selected = current
                    .map(display_value)
                    .unwrap_or_else(|| "Select…".to_string());
                let combo = egui::ComboBox::from_id_salt(pointer)
                    .width(200.0)
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        if ui.selectable_label(current.is_none(), "—").clicked() {
                            picked = Some(None);
                        }
                        for option in options {
                            if ui
                                .selectable_label(current == Some(option), display_value(option))
                                .clicked()
                            {
                                picked = Some(Some(option.clone()));
                            }
                        }
                    });
                Some(combo.response)
            };

            if let Some(value) = picked
                && value.as_ref() != current
            {
                this.msgs.push(SchemaFormMsg::Edit {
                    pointer: pointer.to_string(),
                    value,
                });
            }
            response
        });
    }

    fn render_object(
        &mut self,
        ui: &mut egui::Ui,
        schema: &'m Value,
        hints: UiNode<'m>,
        pointer: &str,
        label: Option<&str>,
        required: bool,
    ) {
        let properties = object_properties(schema);
        let names: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();
        let order = hints.order();
        let ordered = order_properties(&names, order.as_deref());
        let required_names = required_properties(schema);

        let body = |this: &mut Self, ui: &mut egui::Ui| {
            for name in ordered {
                let Some((_, schemas)) = properties.iter().find(|(n, _)| *n == name) else {
                    continue;
                };
                let prop = schemas[0];
                let prop_hints = hints.field(name);
                let prop_label = prop_hints
                    .title()
                    .or_else(|| prop.get("title").and_then(Value::as_str))
                    .unwrap_or(name);
                let child = form_data::child_pointer(pointer, name);
                this.render_node(
                    ui,
                    prop,
                    prop_hints,
                    &child,
                    Some(prop_label),
                    required_names.contains(&name),
                );
            }
            this.render_field_errors(ui, pointer);
        };

        let response = match label {
            Some(label) => {
                let group = egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(field_label(label, required).strong());
                    if let Some(description) = description(schema, hints) {
                        ui.label(muted(description));
                    }
                    ui.add_space(4.0);
                    body(self, ui);
                });
                ui.add_space(6.0);
                group.response
            }
            None => ui.scope(|ui| body(self, ui)).response,
        };
        self.focus_group(pointer, &response);
    }

    fn render_array(
        &mut self,
        ui: &mut egui::Ui,
        schema: &'m Value,
        hints: UiNode<'m>,
        pointer: &str,
        label: Option<&str>,
        required: bool,
    ) {
        let Some(items) = schema.get("items").filter(|i| i.is_object()) else {
            self.leaf(ui, schema, hints, pointer, label, required, |_, ui| {
                ui.label(egui::RichText::new("Tuple arrays are not supported.").italics());
                None
            });
            return;
        };

        let len = self.value(pointer).and_then(Value::as_array).map_or(0, Vec::len);
        let min_items = schema.get("minItems").and_then(Value::as_u64).unwrap_or(0) as usize;
        let max_items = schema
            .get("maxItems")
            .and_then(Value::as_u64)
            .map_or(usize::MAX, |m| m as usize);
        let item_title = items.get("title").and_then(Value::as_str).unwrap_or("Item");

        let group = egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            if let Some(label) = label {
                ui.label(field_label(label, required).strong());
            }
            if let Some(description) = description(schema, hints) {
                ui.label(muted(description));
            }
            ui.add_space(4.0);

            for index in 0..len {
                let item_pointer = index_pointer(pointer, index);
                ui.push_id(&item_pointer, |ui| {
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new(format!("{item_title} {}", index + 1)).strong());
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                self.render_item_controls(ui, pointer, index, len, min_items);
                            });
                        });
                        self.render_node(ui, items, hints.items(), &item_pointer, None, false);
                    });
                });
                ui.add_space(4.0);
            }

            let add = egui::Button::new(format!("{} Add {item_title}", egui_phosphor::regular::PLUS));
            if ui
                .add_enabled(len < max_items, add)
                .on_disabled_hover_text(format!("At most {max_items} item(s) allowed"))
                .clicked()
            {
                self.msgs.push(SchemaFormMsg::AddItem {
                    pointer: pointer.to_string(),
                    item: populate_defaults(items, None).unwrap_or(Value::Null),
                });
            }
            self.render_field_errors(ui, pointer);
        });
        ui.add_space(6.0);
        self.focus_group(pointer, &group.response);
    }

    fn render_item_controls(
        &mut self,
        ui: &mut egui::Ui,
        pointer: &str,
        index: usize,
        len: usize,
        min_items: usize,
    ) {
        if ui
            .add_enabled(len > min_items, egui::Button::new(egui_phosphor::regular::TRASH))
            .on_hover_text("Remove")
            .clicked()
        {
            self.msgs.push(SchemaFormMsg::RemoveItem {
                pointer: pointer.to_string(),
                index,
            });
        }
        if ui
            .add_enabled(index + 1 < len, egui::Button::new(egui_phosphor::regular::ARROW_DOWN))
            .on_hover_text("Move down")
            .clicked()
        {
            self.msgs.push(SchemaFormMsg::MoveItem {
                pointer: pointer.to_string(),
                from: index,
                to: index + 1,
            });
        }
        if ui
            .add_enabled(index > 0, egui::Button::new(egui_phosphor::regular::ARROW_UP))
            .on_hover_text("Move up")
            .clicked()
        {
            self.msgs.push(SchemaFormMsg::MoveItem {
                pointer: pointer.to_string(),
                from: index,
                to: index - 1,
            });
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_composition(
        &mut self,
        ui: &mut egui::Ui,
        keyword: &'static str,
        options: &'m [Value],
        hints: UiNode<'m>,
        pointer: &str,
        label: Option<&str>,
        required: bool,
    ) {
        let selected = self.model.choice(pointer).min(options.len() - 1);

        if let Some(label) = label {
            ui.label(field_label(label, required));
        }
        let mut picked = None;
        egui::ComboBox::from_id_salt(format!("{pointer}#{keyword}"))
            .width(200.0)
            .selected_text(option_title(&options[selected], selected))
            .show_ui(ui, |ui| {
                for (index, option) in options.iter().enumerate() {
                    if ui
                        .selectable_label(index == selected, option_title(option, index))
                        .clicked()
                    {
                        picked = Some(index);
                    }
                }
            });

        if let Some(index) = picked
            && index != selected
        {
            let value = populate_defaults(&options[index], None)
                .or_else(|| hints.option(keyword, index).empty_value().cloned());
            self.msgs.push(SchemaFormMsg::SelectOption {
                pointer: pointer.to_string(),
                index,
                value,
            });
        }

        ui.add_space(2.0);
        self.render_node(
            ui,
            &options[selected],
            hints.option(keyword, selected),
            pointer,
            None,
            false,
        );
    }
}

fn field_label(label: &str, required: bool) -> egui::RichText {
    let mut text = label.to_string();
    if required {
        text.push_str(" *");
    }
    egui::RichText::new(text)
}

fn muted(text: &str) -> egui::RichText {
    egui::RichText::new(text)
        .small()
        .color(egui::Color32::from_gray(120))
}

fn description<'a>(schema: &'a Value, hints: UiNode<'a>) -> Option<&'a str> {
    hints
        .description()
        .or_else(|| schema.get("description").and_then(Value::as_str))
}

fn option_title(option: &Value, index: usize) -> String {
    option
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Option {}", index + 1))
}

/// Text shown for a value inside an input.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_schema() -> Value {
        json!({
            "type": "object",
            "required": ["datasetId"],
            "properties": {
                "datasetId": { "type": "string", "minLength": 1 },
                "datasetType": { "type": "string", "enum": ["cross-section", "yield"], "default": "cross-section" },
                "nuclide": {
                    "type": "object",
                    "required": ["mass"],
                    "properties": { "mass": { "type": "integer", "minimum": 0, "default": 0 } }
                },
                "uncertainties": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "required": ["value"],
                        "properties": {
                            "value": {
                                "oneOf": [
                                    { "type": "number", "minimum": 0 },
                                    { "type": "string", "pattern": "^[0-9.]+%$" },
                                    { "type": "boolean", "const": true }
                                ]
                            }
                        }
                    }
                }
            }
        })
    }

    fn ui_hints() -> UiSchema {
        UiSchema::from_json(
            r#"{"uncertainties": {"items": {"value": {"oneOf": [{}, {}, {"ui:widget": "radio", "ui:emptyValue": true}]}}}}"#,
        )
        .unwrap()
    }

    fn form() -> SchemaFormModel {
        SchemaFormModel::new(entry_schema(), ui_hints()).unwrap()
    }

    fn send(model: &mut SchemaFormModel, msg: SchemaFormMsg) -> (Option<SchemaFormEvent>, Vec<SchemaFormCommand>) {
        let mut cmds = Vec::new();
        let event = update(model, msg, &mut cmds);
        (event, cmds)
    }

    fn edit(pointer: &str, value: Option<Value>) -> SchemaFormMsg {
        SchemaFormMsg::Edit {
            pointer: pointer.into(),
            value,
        }
    }

    #[test]
    fn new_form_is_hydrated_with_defaults() {
        let model = form();
        assert_eq!(
            model.data(),
            &json!({
                "datasetType": "cross-section",
                "nuclide": { "mass": 0 },
                "uncertainties": [{}]
            })
        );
        assert!(model.errors().is_empty());
    }

    #[test]
    fn invalid_schema_is_rejected() {
        assert!(SchemaFormModel::new(json!({ "type": 5 }), UiSchema::default()).is_err());
    }

    #[test]
    fn edit_sets_and_clearing_removes() {
        let mut model = form();
        send(&mut model, edit("/datasetId", Some(json!("E1"))));
        assert_eq!(model.data()["datasetId"], "E1");

        send(&mut model, edit("/datasetId", None));
        assert!(model.data().get("datasetId").is_none());
    }

    #[test]
    fn number_text_is_kept_while_typing() {
        let mut model = form();
        let (event, cmds) = send(
            &mut model,
            SchemaFormMsg::EditNumber {
                pointer: "/nuclide/mass".into(),
                text: "5.".into(),
                empty: None,
            },
        );
        assert!(event.is_none() && cmds.is_empty());
        assert_eq!(model.data()["nuclide"]["mass"], json!(5.0));
        assert_eq!(model.number_text.get("/nuclide/mass").map(String::as_str), Some("5."));

        send(
            &mut model,
            SchemaFormMsg::EditNumber {
                pointer: "/nuclide/mass".into(),
                text: "".into(),
                empty: None,
            },
        );
        assert!(model.data()["nuclide"].get("mass").is_none());
        assert!(model.number_text.is_empty());
    }

    #[test]
    fn cleared_number_uses_empty_value() {
        let mut model = form();
        send(
            &mut model,
            SchemaFormMsg::EditNumber {
                pointer: "/nuclide/mass".into(),
                text: "  ".into(),
                empty: Some(json!(0)),
            },
        );
        assert_eq!(model.data()["nuclide"]["mass"], json!(0));
    }

    #[test]
    fn submit_with_errors_focuses_first_problem() {
        let mut model = form();
        let (event, cmds) = send(&mut model, SchemaFormMsg::Submit);

        let event = event.unwrap();
        assert!(event.is_error);
        assert!(event.message.contains("/datasetId"));
        assert!(cmds.is_empty());
        assert_eq!(
            model.focus.as_deref(),
            model.errors().first().map(|e| e.pointer.as_str())
        );
        let pointers: Vec<&str> = model.errors().iter().map(|e| e.pointer.as_str()).collect();
        assert!(pointers.contains(&"/datasetId"));
        assert!(pointers.contains(&"/uncertainties/0/value"));

        send(&mut model, SchemaFormMsg::FocusHandled);
        assert!(model.focus.is_none());
    }

    /// Render one frame headlessly and collect the emitted messages.
    fn render(model: &SchemaFormModel) -> Vec<SchemaFormMsg> {
        let ctx = egui::Context::default();
        let mut msgs = Vec::new();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                msgs = view(ui, model);
            });
        });
        msgs
    }

    fn focus_handled(msgs: &[SchemaFormMsg]) -> bool {
        msgs.iter().any(|m| matches!(m, SchemaFormMsg::FocusHandled))
    }

    #[test]
    fn focus_on_a_text_field_is_handled_when_rendered() {
        let mut model = form();
        send(&mut model, SchemaFormMsg::Submit);
        assert!(model.focus.is_some());

        assert!(focus_handled(&render(&model)));
    }

    #[test]
    fn focus_on_an_array_is_handled_when_rendered() {
        let schema = json!({
            "type": "object",
            "properties": {
                "tags": { "type": "array", "uniqueItems": true, "items": { "type": "string" } }
            }
        });
        let mut model = SchemaFormModel::new(schema, UiSchema::from_json("{}").unwrap()).unwrap();
        send(
            &mut model,
            SchemaFormMsg::DataLoaded {
                data: json!({ "tags": ["a", "a"] }),
                source: PathBuf::from("tags.json"),
            },
        );
        send(&mut model, SchemaFormMsg::Submit);
        assert_eq!(model.focus.as_deref(), Some("/tags"));

        assert!(focus_handled(&render(&model)));
    }

    #[test]
    fn focus_on_an_object_is_handled_when_rendered() {
        let schema = json!({
            "type": "object",
            "properties": {
                "range": {
                    "type": "object",
                    "properties": { "low": { "type": "integer" } },
                    "minProperties": 1
                }
            }
        });
        let mut model = SchemaFormModel::new(schema, UiSchema::from_json("{}").unwrap()).unwrap();
        send(
            &mut model,
            SchemaFormMsg::DataLoaded {
                data: json!({ "range": {} }),
                source: PathBuf::from("range.json"),
            },
        );
        send(&mut model, SchemaFormMsg::Submit);
        assert_eq!(model.focus.as_deref(), Some("/range"));

        assert!(focus_handled(&render(&model)));
    }

    #[test]
    fn nothing_is_focused_without_errors() {
        let model = form();
        assert!(!focus_handled(&render(&model)));
    }

    #[test]
    fn editing_clears_errors_for_that_field() {
        let mut model = form();
        send(&mut model, SchemaFormMsg::Submit);
        let before = model.errors().len();

        send(&mut model, edit("/datasetId", Some(json!("E1"))));
        assert_eq!(model.errors().len(), before - 1);
        assert!(model.errors().iter().all(|e| e.pointer != "/datasetId"));
    }

    #[test]
    fn valid_submit_emits_export() {
        let mut model = form();
        send(&mut model, edit("/datasetId", Some(json!("E1"))));
        send(&mut model, edit("/uncertainties/0/value", Some(json!("5%"))));

        let (event, cmds) = send(&mut model, SchemaFormMsg::Submit);
        assert!(event.is_none());
        assert_eq!(
            cmds,
            vec![SchemaFormCommand::Export(json!({
                "datasetType": "cross-section",
                "nuclide": { "mass": 0 },
                "uncertainties": [{ "value": "5%" }],
                "datasetId": "E1"
            }))]
        );
    }

    #[test]
    fn selecting_an_option_replaces_the_value() {
        let mut model = form();
        send(&mut model, edit("/uncertainties/0/value", Some(json!(3))));
        send(
            &mut model,
            SchemaFormMsg::SelectOption {
                pointer: "/uncertainties/0/value".into(),
                index: 2,
                value: Some(json!(true)),
            },
        );

        assert_eq!(model.choice("/uncertainties/0/value"), 2);
        assert_eq!(model.data()["uncertainties"][0]["value"], json!(true));

        send(
            &mut model,
            SchemaFormMsg::SelectOption {
                pointer: "/uncertainties/0/value".into(),
                index: 1,
                value: None,
            },
        );
        assert_eq!(model.choice("/uncertainties/0/value"), 1);
        assert!(model.data()["uncertainties"][0].get("value").is_none());
    }

    #[test]
    fn removing_items_shifts_per_item_state() {
        let mut model = form();
        for _ in 0..2 {
            send(
                &mut model,
                SchemaFormMsg::AddItem {
                    pointer: "/uncertainties".into(),
                    item: json!({}),
                },
            );
        }
        send(
            &mut model,
            SchemaFormMsg::SelectOption {
                pointer: "/uncertainties/2/value".into(),
                index: 1,
                value: None,
            },
        );
        send(
            &mut model,
            SchemaFormMsg::RemoveItem {
                pointer: "/uncertainties".into(),
                index: 0,
            },
        );

        assert_eq!(model.data()["uncertainties"].as_array().unwrap().len(), 2);
        assert_eq!(model.choice("/uncertainties/1/value"), 1);
        assert!(!model.choices.contains_key("/uncertainties/2/value"));
    }

    #[test]
    fn moving_items_moves_per_item_state() {
        let mut model = form();
        send(
            &mut model,
            SchemaFormMsg::AddItem {
                pointer: "/uncertainties".into(),
                item: json!({ "value": "5%" }),
            },
        );
        send(
            &mut model,
            SchemaFormMsg::SelectOption {
                pointer: "/uncertainties/1/value".into(),
                index: 1,
                value: Some(json!("5%")),
            },
        );
        send(
            &mut model,
            SchemaFormMsg::MoveItem {
                pointer: "/uncertainties".into(),
                from: 1,
                to: 0,
            },
        );

        assert_eq!(model.data()["uncertainties"][0]["value"], "5%");
        assert_eq!(model.choice("/uncertainties/0/value"), 1);
        assert_eq!(model.choice("/uncertainties/1/value"), 0);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut model = form();
        send(&mut model, edit("/datasetType", Some(json!("yield"))));
        send(&mut model, SchemaFormMsg::Submit);

        let (event, _) = send(&mut model, SchemaFormMsg::Reset);
        assert!(!event.unwrap().is_error);
        assert_eq!(model.data()["datasetType"], "cross-section");
        assert!(model.errors().is_empty());
    }

    #[test]
    fn loaded_data_keeps_user_values_and_fills_gaps() {
        let mut model = form();
        let (event, _) = send(
            &mut model,
            SchemaFormMsg::DataLoaded {
                data: json!({ "datasetId": "E9", "uncertainties": [{ "value": "2%" }] }),
                source: PathBuf::from("E9.json"),
            },
        );

        assert!(event.unwrap().message.contains("E9.json"));
        assert_eq!(model.data()["datasetId"], "E9");
        assert_eq!(model.data()["nuclide"]["mass"], 0);
        assert_eq!(model.choice("/uncertainties/0/value"), 1);
    }

    #[test]
    fn moved_index_permutation() {
        let moved: Vec<usize> = (0..4).map(|i| moved_index(i, 0, 2)).collect();
        assert_eq!(moved, vec![2, 0, 1, 3]);
        let moved: Vec<usize> = (0..4).map(|i| moved_index(i, 3, 1)).collect();
        assert_eq!(moved, vec![0, 2, 3, 1]);
    }

    #[test]
    fn is_under_respects_token_boundaries() {
        assert!(is_under("/a/b", "/a"));
        assert!(is_under("/a", "/a"));
        assert!(!is_under("/ab", "/a"));
        assert!(is_under("/anything", ""));
    }
}
