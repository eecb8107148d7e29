//! JSON-Schema sanitiser (§4.3): rewrites a tool's `input_schema` fragment
//! per vendor so it satisfies that vendor's function-calling quirks.
//!
//! Recursive traversal follows the same shape as
//! `provider/google/input.rs::strip_unsupported_schema_fields`: walk
//! `properties.*` and `items`, never recurse into `$ref`, and tolerate a
//! missing `properties` object or an `items` that is itself an array of
//! schemas (tuple validation).

use serde_json::Value;

/// Phrases in a property's description that mark it as effectively
/// optional even though the schema lists it under `required`. Case-folded
/// before matching.
const OPTIONAL_PHRASES: &[&str] = &[
    "optional",
    "(optional)",
    "if not specified",
    "defaults to",
    "set to true to",
    "set to false to",
    "if provided",
    "when provided",
    "can be omitted",
    "not required",
    "only provide if",
];

/// Which vendor-specific rewriter to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaTarget {
    Chat,
    Responses,
    Gemini,
    DeepSeek { v3_2: bool },
    Ollama,
}

/// Sanitises `schema` in place for `target`, consuming and returning the
/// rewritten value.
pub fn sanitize(schema: Value, target: SchemaTarget) -> Value {
    match target {
        SchemaTarget::Chat => chat_baseline(schema),
        SchemaTarget::Responses => {
            let schema = chat_baseline(schema);
            force_additional_properties_false(schema)
        }
        SchemaTarget::Gemini => gemini(schema),
        SchemaTarget::DeepSeek { v3_2 } => {
            let schema = chat_baseline(schema);
            if v3_2 { force_additional_properties_false(schema) } else { schema }
        }
        SchemaTarget::Ollama => ollama(schema),
    }
}

fn chat_baseline(schema: Value) -> Value {
    walk(schema, &|obj| {
        if obj.get("format").and_then(Value::as_str) == Some("uri") {
            obj.remove("format");
        }
        obj.remove("strict");
        prune_required(obj);
    })
}

fn gemini(schema: Value) -> Value {
    walk(schema, &|obj| {
        if matches!(obj.get("format").and_then(Value::as_str), Some("uri") | Some("uri-reference")) {
            obj.remove("format");
        }
        if obj.get("type").is_some() && obj.get("description").is_none() {
            if let Some(name) = obj.get("__property_name").and_then(Value::as_str).map(str::to_owned) {
                obj.insert("description".to_string(), Value::String(format!("The {name} parameter")));
            }
        }
    })
}

fn ollama(schema: Value) -> Value {
    walk(schema, &|obj| {
        for key in ["pattern", "minLength", "maxLength", "minimum", "maximum", "minItems", "maxItems", "format"] {
            obj.remove(key);
        }
        prune_required_exclude_booleans(obj);
    })
}

/// Sets `additionalProperties: false` on every object-typed schema
/// encountered during a second pass, per the Responses baseline.
fn force_additional_properties_false(schema: Value) -> Value {
    walk(schema, &|obj| {
        if obj.get("type").and_then(Value::as_str) == Some("object") {
            obj.insert("additionalProperties".to_string(), Value::Bool(false));
        }
    })
}

/// Walks `value` top-down, calling `visit` on every JSON-Schema object node
/// that is a plain object (not an array of schemas), before recursing into
/// its `properties.*` and `items`. Gemini's description-synthesis pass needs
/// to know a property's name, so each property value is tagged with a
/// transient `__property_name` field (stripped by the visitor) before the
/// recursive call.
fn walk(mut value: Value, visit: &dyn Fn(&mut serde_json::Map<String, Value>)) -> Value {
    if let Some(obj) = value.as_object_mut() {
        visit(obj);
        obj.remove("__property_name");

        if let Some(properties) = obj.get_mut("properties") {
            if let Some(props_obj) = properties.as_object_mut() {
                for (name, prop_value) in props_obj.iter_mut() {
                    if let Some(inner) = prop_value.as_object_mut() {
                        inner.insert("__property_name".to_string(), Value::String(name.clone()));
                    }
                    *prop_value = walk(prop_value.take(), visit);
                }
            }
        }

        if let Some(items) = obj.get_mut("items") {
            match items {
                Value::Array(schemas) => {
                    for schema in schemas.iter_mut() {
                        *schema = walk(schema.take(), visit);
                    }
                }
                _ if !items.is_null() => {
                    *items = walk(items.take(), visit);
                }
                _ => {}
            }
        }
    }

    value
}

/// Rewrites `required` to the "truly required" subset per §4.3: a listed
/// name is excluded if its schema has a `default`, is `nullable: true`, has
/// `type: "boolean"`, or its description contains one of [`OPTIONAL_PHRASES`].
/// Deletes `required` entirely if the pruned list is empty.
fn prune_required(obj: &mut serde_json::Map<String, Value>) {
    prune_required_with(obj, false);
}

fn prune_required_exclude_booleans(obj: &mut serde_json::Map<String, Value>) {
    prune_required_with(obj, true);
}

fn prune_required_with(obj: &mut serde_json::Map<String, Value>, always_exclude_booleans: bool) {
    let Some(required) = obj.get("required").and_then(Value::as_array).cloned() else {
        return;
    };
    let Some(properties) = obj.get("properties").and_then(Value::as_object).cloned() else {
        return;
    };

    let pruned: Vec<Value> = required
        .into_iter()
        .filter(|name| {
            let Some(name) = name.as_str() else { return true };
            let Some(prop) = properties.get(name) else { return true };
            !is_effectively_optional(prop, always_exclude_booleans)
        })
        .collect();

    if pruned.is_empty() {
        obj.remove("required");
    } else {
        obj.insert("required".to_string(), Value::Array(pruned));
    }
}

fn is_effectively_optional(prop: &Value, always_exclude_booleans: bool) -> bool {
    let Some(prop_obj) = prop.as_object() else { return false };

    if prop_obj.contains_key("default") {
        return true;
    }
    if prop_obj.get("nullable").and_then(Value::as_bool) == Some(true) {
        return true;
    }
    if always_exclude_booleans && prop_obj.get("type").and_then(Value::as_str) == Some("boolean") {
        return true;
    }
    if prop_obj.get("type").and_then(Value::as_str) == Some("boolean") {
        return true;
    }
    if let Some(description) = prop_obj.get("description").and_then(Value::as_str) {
        let lower = description.to_ascii_lowercase();
        if OPTIONAL_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
            return true;
        }
    }

    false
}
