// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Form data helpers: JSON Pointer addressing, array edits, and default population.
//!
//! Form data is a plain `serde_json::Value`. A missing key means "undefined";
//! clearing an input removes its key instead of storing an empty string.

use std::collections::{BTreeMap, HashMap};
use std::ptr;

use serde_json::{Map, Number, Value};

use crate::models::validation::FormValidator;

/// Escape a property name for use as a JSON Pointer token (RFC 6901).
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Pointer to a named child of `parent`.
pub fn child_pointer(parent: &str, key: &str) -> String {
    format!("{parent}/{}", escape_token(key))
}

/// Pointer to an array element of `parent`.
pub fn index_pointer(parent: &str, index: usize) -> String {
    format!("{parent}/{index}")
}

fn tokens(pointer: &str) -> Vec<String> {
    pointer
        .strip_prefix('/')
        .map(|rest| rest.split('/').map(unescape_token).collect())
        .unwrap_or_default()
}

pub fn get<'a>(data: &'a Value, pointer: &str) -> Option<&'a Value> {
    data.pointer(pointer)
}

/// Store `value` at `pointer`, creating missing parent objects.
///
/// Array parents accept an existing index or the index one past the end
/// (append). Returns `false` when the path crosses a scalar or an
/// out-of-range index.
pub fn set(data: &mut Value, pointer: &str, value: Value) -> bool {
    let tokens = tokens(pointer);
    let Some((last, parents)) = tokens.split_last() else {
        *data = value;
        return true;
    };

    let mut current = data;
    for token in parents {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(token.clone())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => match token.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                Some(item) => item,
                None => return false,
            },
            _ => return false,
        };
    }

    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            true
        }
        Value::Array(items) => match last.parse::<usize>() {
            Ok(i) if i < items.len() => {
                items[i] = value;
                true
            }
            Ok(i) if i == items.len() => {
                items.push(value);
                true
            }
            _ => false,
        },
        _ => false,
    }
}

/// Remove the value at `pointer`, returning it. Array elements are removed (not nulled).
pub fn remove(data: &mut Value, pointer: &str) -> Option<Value> {
    let tokens = tokens(pointer);
    let (last, parents) = tokens.split_last()?;
    let parent_pointer: String = parents.iter().map(|t| format!("/{}", escape_token(t))).collect();

    match data.pointer_mut(&parent_pointer)? {
        Value::Object(map) => map.remove(last.as_str()),
        Value::Array(items) => {
            let index = last.parse::<usize>().ok().filter(|i| *i < items.len())?;
            Some(items.remove(index))
        }
        _ => None,
    }
}

/// Append `item` to the array at `pointer`, creating the array when undefined.
pub fn push_item(data: &mut Value, pointer: &str, item: Value) -> bool {
    match data.pointer_mut(pointer) {
        Some(Value::Array(items)) => {
            items.push(item);
            true
        }
        Some(Value::Null) | None => set(data, pointer, Value::Array(vec![item])),
        Some(_) => false,
    }
}

pub fn remove_item(data: &mut Value, pointer: &str, index: usize) -> bool {
    match data.pointer_mut(pointer) {
        Some(Value::Array(items)) if index < items.len() => {
            items.remove(index);
            true
        }
        _ => false,
    }
}

/// Move an array element from `from` to `to` (both must be in range).
pub fn move_item(data: &mut Value, pointer: &str, from: usize, to: usize) -> bool {
    match data.pointer_mut(pointer) {
        Some(Value::Array(items)) if from < items.len() && to < items.len() => {
            let item = items.remove(from);
            items.insert(to, item);
            true
        }
        _ => false,
    }
}

/// Interpret text typed into a numeric input.
///
/// Integers stay integers, other numbers become floats. Text that is not a
/// number is kept as a string so validation can report it.
pub fn parse_number_input(text: &str) -> Value {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(trimmed.to_string()))
}

/// Primary `type` of a schema, inferred from structural keywords when absent.
pub fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ if schema.get("properties").is_some() => Some("object"),
        _ if schema.get("items").is_some() => Some("array"),
        _ => None,
    }
}

/// `oneOf` or `anyOf` options of a schema, with the keyword name.
pub fn composition_options(schema: &Value) -> Option<(&'static str, &Vec<Value>)> {
    ["oneOf", "anyOf"].into_iter().find_map(|keyword| {
        schema
            .get(keyword)
            .and_then(Value::as_array)
            .filter(|options| !options.is_empty())
            .map(|options| (keyword, options))
    })
}

/// Properties of an object schema merged with those contributed by `allOf`.
///
/// Keys keep their first-seen order; a key may carry several schemas.
pub fn object_properties(schema: &Value) -> Vec<(&str, Vec<&Value>)> {
    let mut out: Vec<(&str, Vec<&Value>)> = Vec::new();
    collect_properties(schema, &mut out);
    out
}

fn collect_properties<'a>(schema: &'a Value, out: &mut Vec<(&'a str, Vec<&'a Value>)>) {
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for (name, prop) in props {
            match out.iter_mut().find(|(n, _)| *n == name.as_str()) {
                Some((_, schemas)) => schemas.push(prop),
                None => out.push((name.as_str(), vec![prop])),
            }
        }
    }
    if let Some(members) = schema.get("allOf").and_then(Value::as_array) {
        for member in members {
            collect_properties(member, out);
        }
    }
}

/// Required property names, including those required by `allOf` members.
pub fn required_properties(schema: &Value) -> Vec<&str> {
    let mut out: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if let Some(members) = schema.get("allOf").and_then(Value::as_array) {
        for member in members {
            for name in required_properties(member) {
                if !out.contains(&name) {
                    out.push(name);
                }
            }
        }
    }
    out
}

fn is_object_schema(schema: &Value) -> bool {
    schema_type(schema) == Some("object")
        || schema
            .get("allOf")
            .and_then(Value::as_array)
            .is_some_and(|members| members.iter().any(is_object_schema))
}

/// Picks `oneOf`/`anyOf` options, compiling each option schema at most once.
///
/// Entries are keyed by the address of the option inside a schema borrowed
/// for `'s`, so array items sharing one item schema share the validators.
#[derive(Default)]
pub struct OptionMatcher<'s> {
    compiled: HashMap<*const Value, Option<FormValidator>>,
    schema: std::marker::PhantomData<&'s Value>,
}

impl<'s> OptionMatcher<'s> {
    /// Index of the option matching `value`; the first option when nothing matches.
    pub fn matching_option(&mut self, options: &'s [Value], value: Option<&Value>) -> usize {
        let Some(value) = value else {
            return 0;
        };
        options
            .iter()
            .position(|option| self.matches(option, value))
            .unwrap_or(0)
    }

    /// Whether `value` satisfies `option`; an uncompilable option matches nothing.
    fn matches(&mut self, option: &'s Value, value: &Value) -> bool {
        self.compiled
            .entry(ptr::from_ref(option))
            .or_insert_with(|| FormValidator::new(option).ok())
            .as_ref()
            .is_some_and(|validator| validator.is_valid(value))
    }
}

/// Fill schema defaults into `existing` without overwriting user data.
///
/// - `default` applies only where the value is undefined;
/// - object properties recurse, `allOf` members contribute their defaults;
/// - `oneOf`/`anyOf` use the option matching the value (first option otherwise);
/// - arrays recurse into items and are padded up to `minItems`.
///
/// Returns `None` when the result stays undefined.
pub fn populate_defaults(schema: &Value, existing: Option<&Value>) -> Option<Value> {
    fill_defaults(schema, existing, &mut OptionMatcher::default())
}

fn fill_defaults<'s>(
    schema: &'s Value,
    existing: Option<&Value>,
    matcher: &mut OptionMatcher<'s>,
) -> Option<Value> {
    let mut result = existing.cloned().or_else(|| schema.get("default").cloned());

    if let Some((_, options)) = composition_options(schema) {
        let option = &options[matcher.matching_option(options, result.as_ref())];
        result = fill_defaults(option, result.as_ref(), matcher).or(result);
    }

    if is_object_schema(schema) {
        let mut map = match result {
            Some(Value::Object(map)) => map,
            None => Map::new(),
            Some(other) => return Some(other),
        };
        for (name, schemas) in object_properties(schema) {
            let mut value = map.get(name).cloned();
            for prop in schemas {
                value = fill_defaults(prop, value.as_ref(), matcher).or(value);
            }
            if let Some(value) = value {
                map.insert(name.to_string(), value);
            }
        }
        return Some(Value::Object(map));
    }

    if schema_type(schema) == Some("array")
        && let Some(items) = schema.get("items").filter(|i| i.is_object())
    {
        let min_items = schema.get("minItems").and_then(Value::as_u64).unwrap_or(0) as usize;
        let mut list = match result {
            Some(Value::Array(list)) => list,
            None if min_items > 0 => Vec::new(),
            other => return other,
        };
        for item in list.iter_mut() {
            if let Some(filled) = fill_defaults(items, Some(item), matcher) {
                *item = filled;
            }
        }
        while list.len() < min_items {
            list.push(fill_defaults(items, None, matcher).unwrap_or(Value::Null));
        }
        return Some(Value::Array(list));
    }

    result
}

/// Selected option per composition pointer, inferred from the current data.
pub fn infer_choices(schema: &Value, data: &Value) -> BTreeMap<String, usize> {
    let mut choices = BTreeMap::new();
    walk_choices(schema, Some(data), "", &mut choices, &mut OptionMatcher::default());
    choices
}

fn walk_choices<'s>(
    schema: &'s Value,
    value: Option<&Value>,
    pointer: &str,
    choices: &mut BTreeMap<String, usize>,
    matcher: &mut OptionMatcher<'s>,
) {
    if let Some((_, options)) = composition_options(schema) {
        let index = matcher.matching_option(options, value);
        choices.insert(pointer.to_string(), index);
        walk_choices(&options[index], value, pointer, choices, matcher);
    }

    match value {
        Some(Value::Object(map)) => {
            for (name, schemas) in object_properties(schema) {
                let child = map.get(name);
                if child.is_none() {
                    continue;
                }
                let child_ptr = child_pointer(pointer, name);
                for prop in schemas {
                    walk_choices(prop, child, &child_ptr, choices, matcher);
                }
            }
        }
        Some(Value::Array(list)) => {
            if let Some(items) = schema.get("items") {
                for (i, item) in list.iter().enumerate() {
                    walk_choices(
                        items,
                        Some(item),
                        &index_pointer(pointer, i),
                        choices,
                        matcher,
                    );
                }
            }
        }
        _ => {}
    }
}
