/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template value and data context types.
//!
//! Values originate either from the caller's payload (typically JSON) or from
//! `set` directives executed while rendering. Directives always bind strings;
//! richer shapes (maps, lists, booleans) can only enter through the payload.

use std::collections::HashMap;

/// A value bound to a template variable.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    /// A string value.
    String(String),

    /// A boolean value.
    Bool(bool),

    /// A list of values.
    List(Vec<TemplateValue>),

    /// A map of string keys to values.
    Map(HashMap<String, TemplateValue>),

    /// A null/missing value.
    Null,
}

impl TemplateValue {
    /// Check if this value is "truthy" for conditional evaluation.
    ///
    /// Truthiness rules:
    /// - Any non-empty map is truthy
    /// - Any list containing at least one truthy value is truthy
    /// - Any non-empty string is truthy (even "false")
    /// - Boolean true is truthy
    /// - Everything else is falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Bool(b) => *b,
            TemplateValue::String(s) => !s.is_empty(),
            TemplateValue::List(items) => items.iter().any(|v| v.is_truthy()),
            TemplateValue::Map(m) => !m.is_empty(),
            TemplateValue::Null => false,
        }
    }

    /// Get a nested field by path.
    ///
    /// For example, `get_path(&["user", "name"])` on a Map containing
    /// `{"user": {"name": "ada"}}` returns the name value.
    pub fn get_path(&self, path: &[&str]) -> Option<&TemplateValue> {
        if path.is_empty() {
            return Some(self);
        }

        match self {
            TemplateValue::Map(m) => {
                let first = path[0];
                m.get(first).and_then(|v| v.get_path(&path[1..]))
            }
            _ => None,
        }
    }

    /// Render this value as a string for output.
    ///
    /// - String: returned as-is
    /// - Bool: "true" or "" (empty for false)
    /// - List: concatenation of rendered elements
    /// - Map: "true"
    /// - Null: ""
    pub fn render(&self) -> String {
        match self {
            TemplateValue::String(s) => s.clone(),
            TemplateValue::Bool(true) => "true".to_string(),
            TemplateValue::Bool(false) => String::new(),
            TemplateValue::List(items) => items.iter().map(|v| v.render()).collect(),
            TemplateValue::Map(_) => "true".to_string(),
            TemplateValue::Null => String::new(),
        }
    }
}

impl Default for TemplateValue {
    fn default() -> Self {
        TemplateValue::Null
    }
}

impl From<serde_json::Value> for TemplateValue {
    /// Convert a JSON value into a template value.
    ///
    /// Numbers become their string form, so payload entries like `{"port": 8080}`
    /// compare and echo as `"8080"`.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => TemplateValue::Null,
            serde_json::Value::Bool(b) => TemplateValue::Bool(b),
            serde_json::Value::Number(n) => TemplateValue::String(n.to_string()),
            serde_json::Value::String(s) => TemplateValue::String(s),
            serde_json::Value::Array(items) => {
                TemplateValue::List(items.into_iter().map(TemplateValue::from).collect())
            }
            serde_json::Value::Object(entries) => TemplateValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, TemplateValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        TemplateValue::String(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        TemplateValue::String(value)
    }
}

/// A set of variable bindings for template rendering.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Variable bindings at this level.
    variables: HashMap<String, TemplateValue>,

    /// Parent context for nested scopes (e.g., inside conditional branches).
    parent: Option<Box<TemplateContext>>,
}

impl TemplateContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object payload.
    ///
    /// Each top-level key becomes a binding. A non-object value yields an
    /// empty context.
    pub fn from_json(payload: serde_json::Value) -> Self {
        let mut context = Self::new();
        if let serde_json::Value::Object(entries) = payload {
            for (key, value) in entries {
                context.insert(key, TemplateValue::from(value));
            }
        }
        context
    }

    /// Insert a variable into the context.
    pub fn insert(&mut self, key: impl Into<String>, value: TemplateValue) {
        self.variables.insert(key.into(), value);
    }

    /// Get a variable from the context, checking parent scopes.
    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        self.variables
            .get(key)
            .or_else(|| self.parent.as_ref().and_then(|p| p.get(key)))
    }

    /// Get a variable by path (e.g., "user.name").
    pub fn get_path(&self, path: &[&str]) -> Option<&TemplateValue> {
        if path.is_empty() {
            return None;
        }

        self.get(path[0]).and_then(|v| v.get_path(&path[1..]))
    }

    /// Resolve a variable reference as a directive sees it.
    ///
    /// A binding under the literal name wins (so `set var="user.name"` shadows
    /// payload data); otherwise a dotted name is resolved as a path into
    /// nested maps.
    pub fn resolve(&self, name: &str) -> Option<&TemplateValue> {
        if let Some(value) = self.get(name) {
            return Some(value);
        }

        if name.contains('.') {
            let path: Vec<&str> = name.split('.').collect();
            return self.get_path(&path);
        }

        None
    }

    /// Create a child context for a nested scope.
    ///
    /// The child context inherits access to parent variables; bindings made in
    /// the child are dropped when it goes out of scope.
    pub fn child(&self) -> TemplateContext {
        TemplateContext {
            variables: HashMap::new(),
            parent: Some(Box::new(self.clone())),
        }
    }
}
