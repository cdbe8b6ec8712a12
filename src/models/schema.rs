// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! JSON Schema loading with `$ref` dereferencing.
//!
//! The form renderer and the default builder walk plain subschemas, so every
//! reference is inlined before the schema leaves this module:
//! - local fragments (`#/definitions/x`) and relative files
//!   (`nuclide.schema.json`, `common.json#/definitions/x`) are supported;
//! - relative references resolve against the file that contains them;
//! - only `file:` URLs are followed, anything else is rejected;
//! - sibling keywords next to `$ref` override the referenced schema;
//! - circular references are rejected because they cannot be inlined.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use tracing::{debug, info};
use url::Url;

/// Keywords holding instance data; their contents are never dereferenced.
const DATA_KEYWORDS: &[&str] = &["const", "enum", "default", "examples"];
/// Keywords holding a name → subschema map.
const SCHEMA_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "definitions",
    "$defs",
    "dependencies",
];

/// Load the schema at `path` and return it with all references inlined.
///
/// # Errors
///
/// Fails when a document cannot be read or parsed, a reference points to a
/// missing location or a non-file URL, or references form a cycle.
pub fn load_schema(path: &Path) -> Result<Value> {
    let absolute = std::fs::canonicalize(path)
        .with_context(|| format!("Schema file not found: {:?}", path))?;
    let base = Url::from_file_path(&absolute)
        .map_err(|_| anyhow!("Cannot build a file URL for {:?}", absolute))?;

    let mut deref = Dereferencer::default();
    let root = deref.document(&base)?.clone();
    let resolved = deref.resolve(&root, &base)?;

    info!(
        path = %absolute.display(),
        documents = deref.documents.len(),
        "Schema dereferenced"
    );
    Ok(resolved)
}

/// Reference resolver with a per-load document cache.
#[derive(Default)]
struct Dereferencer {
    documents: HashMap<Url, Value>,
    /// References currently being expanded, used for cycle detection.
    active: Vec<Url>,
}

impl Dereferencer {
    fn document(&mut self, url: &Url) -> Result<&Value> {
        if !self.documents.contains_key(url) {
            let path = url
                .to_file_path()
                .map_err(|_| anyhow!("Only local file references are supported: {url}"))?;
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read schema {:?}", path))?;
            let value: Value = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse schema {:?}", path))?;
            debug!(path = %path.display(), "Schema document loaded");
            self.documents.insert(url.clone(), value);
        }
        Ok(&self.documents[url])
    }

    fn resolve(&mut self, value: &Value, base: &Url) -> Result<Value> {
        match value {
            Value::Object(map) => match map.get("$ref").and_then(Value::as_str) {
                Some(reference) => self.resolve_reference(reference, map, base),
                None => self.resolve_members(map, base).map(Value::Object),
            },
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve(item, base))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    /// Resolve every keyword of a schema object except `$ref` itself.
    fn resolve_members(&mut self, map: &Map<String, Value>, base: &Url) -> Result<Map<String, Value>> {
        let mut out = Map::with_capacity(map.len());
        for (key, child) in map {
            if key == "$ref" {
                continue;
            }
            let resolved = if DATA_KEYWORDS.contains(&key.as_str()) {
                child.clone()
            } else if SCHEMA_MAP_KEYWORDS.contains(&key.as_str())
                && let Value::Object(entries) = child
            {
                let mut resolved = Map::with_capacity(entries.len());
                for (name, schema) in entries {
                    resolved.insert(name.clone(), self.resolve(schema, base)?);
                }
                Value::Object(resolved)
            } else {
                self.resolve(child, base)?
            };
            out.insert(key.clone(), resolved);
        }
        Ok(out)
    }

    fn resolve_reference(
        &mut self,
        reference: &str,
        siblings: &Map<String, Value>,
        base: &Url,
    ) -> Result<Value> {
        let target = base
            .join(reference)
            .with_context(|| format!("Invalid $ref {reference:?}"))?;
        if self.active.contains(&target) {
            bail!("Circular $ref {reference:?} cannot be inlined");
        }

        let mut document_url = target.clone();
        document_url.set_fragment(None);
        let pointer = percent_decode_str(target.fragment().unwrap_or(""))
            .decode_utf8()
            .with_context(|| format!("Invalid encoding in $ref {reference:?}"))?
            .into_owned();
        if !pointer.is_empty() && !pointer.starts_with('/') {
            bail!("Anchor references are not supported: {reference:?}");
        }

        let document = self
            .document(&document_url)
            .with_context(|| format!("Failed to resolve $ref {reference:?}"))?;
        let referenced = if pointer.is_empty() {
            Some(document)
        } else {
            document.pointer(&pointer)
        }
        .cloned()
        .ok_or_else(|| anyhow!("$ref {reference:?} does not point to an existing location"))?;

        self.active.push(target);
        let resolved = self.resolve(&referenced, &document_url);
        self.active.pop();
        let mut resolved = resolved?;

        if let Value::Object(obj) = &mut resolved {
            // An inlined document no longer has its own identity.
            obj.remove("$schema");
            obj.remove("$id");
            for (key, value) in self.resolve_members(siblings, base)? {
                obj.insert(key, value);
            }
        }
        Ok(resolved)
    }
}
