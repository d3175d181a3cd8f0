// /////////////////////////////////////////////////////////////////////////////
// Savedhi
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Marshalled Data Tree
//!
//! A schemaless JSON-shaped tree used as the intermediate representation
//! between user records and both wire shapes. Nodes are tagged variants
//! (null, bool, number, string, children); children keep insertion order,
//! which is observable in output serialization, and an object's keys
//! address its children by path.
//!
//! Numbers carry a display string alongside their value so that round trips
//! preserve the original formatting instead of whatever the shortest float
//! rendering would be.
//!
//! String payloads may hold secrets when a cleartext file passes through,
//! so they are wiped when a node is dropped or overwritten.

use zeroize::Zeroize;

/// Value of one tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Null,
    Bool(bool),
    Num { value: f64, display: String },
    Str(String),
    Children(Vec<MarshalledData>),
}

/// One node of the marshalled data tree.
///
/// A node under an object parent carries its `obj_key`; a node under an
/// array parent carries its `arr_index`. The two never mix within one
/// parent.
#[derive(Debug, Clone, PartialEq)]
pub struct MarshalledData {
    obj_key: Option<String>,
    arr_index: Option<usize>,
    value: DataValue,
}

impl MarshalledData {
    /// A fresh, null root.
    pub fn new() -> MarshalledData {
        MarshalledData {
            obj_key: None,
            arr_index: None,
            value: DataValue::Null,
        }
    }

    pub fn obj_key(&self) -> Option<&str> {
        self.obj_key.as_deref()
    }

    pub fn value(&self) -> &DataValue {
        &self.value
    }

    /// The node's children, empty for non-children values.
    pub fn children(&self) -> &[MarshalledData] {
        match &self.value {
            DataValue::Children(children) => children,
            _ => &[],
        }
    }

    /// Navigates to the node at `path`, creating intermediate object nodes
    /// as needed. A missing child is appended in object order.
    pub fn get(&mut self, path: &[&str]) -> &mut MarshalledData {
        let Some((key, rest)) = path.split_first() else {
            return self;
        };

        if !matches!(self.value, DataValue::Children(_)) {
            self.set_value(DataValue::Children(Vec::new()));
        }
        let DataValue::Children(children) = &mut self.value else {
            unreachable!("node was just made a children node");
        };

        let position = match children.iter().position(|c| c.obj_key.as_deref() == Some(*key)) {
            Some(position) => position,
            None => {
                children.push(MarshalledData {
                    obj_key: Some((*key).to_string()),
                    arr_index: None,
                    value: DataValue::Null,
                });
                children.len() - 1
            }
        };
        children[position].get(rest)
    }

    /// Navigates to the node at `path` without mutating the tree.
    pub fn find(&self, path: &[&str]) -> Option<&MarshalledData> {
        let mut node = self;
        for key in path {
            node = node
                .children()
                .iter()
                .find(|c| c.obj_key.as_deref() == Some(*key))?;
        }
        Some(node)
    }

    /// Whether the node at `path` is absent or null.
    pub fn is_null(&self, path: &[&str]) -> bool {
        match self.find(path) {
            None => true,
            Some(node) => matches!(node.value, DataValue::Null),
        }
    }

    pub fn set_null(&mut self, path: &[&str]) {
        self.get(path).set_value(DataValue::Null);
    }

    /// The boolean at `path`; absent or non-boolean reads as `false`.
    pub fn get_bool(&self, path: &[&str]) -> bool {
        matches!(
            self.find(path).map(|n| &n.value),
            Some(DataValue::Bool(true))
        )
    }

    pub fn set_bool(&mut self, value: bool, path: &[&str]) {
        self.get(path).set_value(DataValue::Bool(value));
    }

    /// The number at `path`. Absent reads as NaN; booleans read as 0 or 1.
    pub fn get_num(&self, path: &[&str]) -> f64 {
        match self.find(path).map(|n| &n.value) {
            Some(DataValue::Num { value, .. }) => *value,
            Some(DataValue::Bool(b)) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            _ => f64::NAN,
        }
    }

    /// Stores a number together with its `%g`-style display form.
    pub fn set_num(&mut self, value: f64, path: &[&str]) {
        self.get(path).set_value(DataValue::Num {
            value,
            display: format_g(value),
        });
    }

    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        match self.find(path).map(|n| &n.value) {
            Some(DataValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn set_str(&mut self, value: &str, path: &[&str]) {
        self.get(path).set_value(DataValue::Str(value.to_string()));
    }

    /// Retains only the children for which `pred` holds. Freed children
    /// wipe their string payloads on drop.
    pub fn filter(&mut self, pred: impl Fn(&MarshalledData) -> bool) {
        if let DataValue::Children(children) = &mut self.value {
            children.retain(|c| pred(c));
        }
    }

    /// Replaces the node's value, wiping the previous one.
    fn set_value(&mut self, value: DataValue) {
        self.value.wipe();
        self.value = value;
    }

    /// Builds a tree from parsed JSON. Object member order is preserved.
    pub(crate) fn from_json(value: &serde_json::Value) -> MarshalledData {
        let mut root = MarshalledData::new();
        root.value = DataValue::from_json(value);
        root
    }

    /// Emits the tree as pretty JSON, omitting keys whose value is null or
    /// an empty object.
    pub(crate) fn to_json_string(&self) -> String {
        let mut out = String::new();
        self.emit(&mut out, 0);
        out.push('\n');
        out
    }

    fn is_emittable(&self) -> bool {
        match &self.value {
            DataValue::Null => false,
            DataValue::Children(children) => {
                if self.is_array() {
                    true
                } else {
                    children.iter().any(|c| c.is_emittable())
                }
            }
            _ => true,
        }
    }

    fn is_array(&self) -> bool {
        self.children().first().map(|c| c.arr_index.is_some()).unwrap_or(false)
    }

    fn emit(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match &self.value {
            DataValue::Null => out.push_str("null"),
            DataValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            DataValue::Num { display, .. } => out.push_str(display),
            DataValue::Str(s) => {
                out.push_str(&serde_json::to_string(s).expect("string serialization is infallible"))
            }
            DataValue::Children(children) => {
                let (open, close) = if self.is_array() { ('[', ']') } else { ('{', '}') };
                let emittable: Vec<&MarshalledData> = children.iter().filter(|c| c.is_emittable()).collect();
                if emittable.is_empty() {
                    out.push(open);
                    out.push(close);
                    return;
                }

                out.push(open);
                out.push('\n');
                for (i, child) in emittable.iter().enumerate() {
                    out.push_str(&indent);
                    out.push_str("  ");
                    if let Some(key) = &child.obj_key {
                        out.push_str(&serde_json::to_string(key).expect("string serialization is infallible"));
                        out.push_str(": ");
                    }
                    child.emit(out, depth + 1);
                    if i + 1 < emittable.len() {
                        out.push(',');
                    }
                    out.push('\n');
                }
                out.push_str(&indent);
                out.push(close);
            }
        }
    }
}

impl Default for MarshalledData {
    fn default() -> Self {
        MarshalledData::new()
    }
}

impl Drop for MarshalledData {
    fn drop(&mut self) {
        self.value.wipe();
    }
}

impl DataValue {
    /// Wipes any string payload. Children wipe themselves on their own
    /// drops.
    fn wipe(&mut self) {
        match self {
            DataValue::Str(s) => s.zeroize(),
            DataValue::Num { display, .. } => display.zeroize(),
            _ => {}
        }
    }

    fn from_json(value: &serde_json::Value) -> DataValue {
        match value {
            serde_json::Value::Null => DataValue::Null,
            serde_json::Value::Bool(b) => DataValue::Bool(*b),
            serde_json::Value::Number(n) => {
                let value = n.as_f64().unwrap_or(f64::NAN);
                DataValue::Num {
                    value,
                    display: format_g(value),
                }
            }
            serde_json::Value::String(s) => DataValue::Str(s.clone()),
            serde_json::Value::Array(items) => DataValue::Children(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| MarshalledData {
                        obj_key: None,
                        arr_index: Some(i),
                        value: DataValue::from_json(item),
                    })
                    .collect(),
            ),
            serde_json::Value::Object(members) => DataValue::Children(
                members
                    .iter()
                    .map(|(key, member)| MarshalledData {
                        obj_key: Some(key.clone()),
                        arr_index: None,
                        value: DataValue::from_json(member),
                    })
                    .collect(),
            ),
        }
    }
}

/// Formats a number the way C's `%g` would: six significant digits,
/// trailing zeros stripped, exponential form outside `1e-4..1e6`.
pub(crate) fn format_g(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= 6 {
        let rendered = format!("{:.5e}", value);
        let (mantissa, exp) = rendered.split_once('e').expect("exponential form contains e");
        let mantissa = if mantissa.contains('.') {
            mantissa.trim_end_matches('0').trim_end_matches('.')
        } else {
            mantissa
        };
        let exp: i32 = exp.parse().expect("exponent is an integer");
        format!("{}e{}{:02}", mantissa, if exp < 0 { "-" } else { "+" }, exp.abs())
    } else {
        let precision = (5 - exponent).max(0) as usize;
        let rendered = format!("{:.*}", precision, value);
        if rendered.contains('.') {
            rendered.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            rendered
        }
    }
}
