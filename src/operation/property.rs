// ABOUTME: Typed, described value slots attached to operations.
// ABOUTME: Properties is the insertion-ordered bag operations read inputs from and write outputs to.

use crate::config::ScopedValues;
use bytes::Bytes;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PropertyError {
    #[error("unknown property: {0}")]
    Unknown(String),

    #[error("property {id} expects {expected}, got {actual}")]
    KindMismatch {
        id: String,
        expected: PropertyKind,
        actual: PropertyKind,
    },

    #[error("property {0} is read-only")]
    ReadOnly(String),

    #[error("property {0} is internal")]
    Internal(String),

    #[error("invalid value for property {id}: {reason}")]
    Parse { id: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Bool,
    Int,
    Bytes,
    StringList,
    StringMap,
    Duration,
    Yaml,
    ScopedValues,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyKind::String => "string",
            PropertyKind::Bool => "bool",
            PropertyKind::Int => "int",
            PropertyKind::Bytes => "bytes",
            PropertyKind::StringList => "string list",
            PropertyKind::StringMap => "string map",
            PropertyKind::Duration => "duration",
            PropertyKind::Yaml => "yaml",
            PropertyKind::ScopedValues => "scoped values",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Bool(bool),
    Int(i64),
    Bytes(Bytes),
    StringList(Vec<String>),
    StringMap(IndexMap<String, String>),
    Duration(Duration),
    Yaml(serde_yaml::Value),
    ScopedValues(ScopedValues),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Int(_) => PropertyKind::Int,
            PropertyValue::Bytes(_) => PropertyKind::Bytes,
            PropertyValue::StringList(_) => PropertyKind::StringList,
            PropertyValue::StringMap(_) => PropertyKind::StringMap,
            PropertyValue::Duration(_) => PropertyKind::Duration,
            PropertyValue::Yaml(_) => PropertyKind::Yaml,
            PropertyValue::ScopedValues(_) => PropertyKind::ScopedValues,
        }
    }

    /// Empty strings, lists and maps count as "no value" for required checks.
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::String(s) => s.is_empty(),
            PropertyValue::Bytes(b) => b.is_empty(),
            PropertyValue::StringList(l) => l.is_empty(),
            PropertyValue::StringMap(m) => m.is_empty(),
            PropertyValue::ScopedValues(v) => v.is_empty(),
            PropertyValue::Yaml(v) => v.is_null(),
            PropertyValue::Bool(_) | PropertyValue::Int(_) | PropertyValue::Duration(_) => false,
        }
    }

    /// Parse command-line text into a value of `kind`.
    pub fn parse(kind: PropertyKind, input: &str) -> Result<Self, String> {
        match kind {
            PropertyKind::String => Ok(PropertyValue::String(input.to_string())),
            PropertyKind::Bool => parse_bool(input).map(PropertyValue::Bool),
            PropertyKind::Int => input
                .trim()
                .parse()
                .map(PropertyValue::Int)
                .map_err(|e| format!("{e}")),
            PropertyKind::Bytes => Ok(PropertyValue::Bytes(Bytes::from(input.to_string()))),
            PropertyKind::StringList => Ok(PropertyValue::StringList(
                input
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            PropertyKind::StringMap => input
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|pair| {
                    pair.split_once('=')
                        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                        .ok_or_else(|| format!("expected key=value, got '{pair}'"))
                })
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(PropertyValue::StringMap),
            PropertyKind::Duration => humantime::parse_duration(input.trim())
                .map(PropertyValue::Duration)
                .map_err(|e| e.to_string()),
            PropertyKind::Yaml => serde_yaml::from_str(input)
                .map(PropertyValue::Yaml)
                .map_err(|e| e.to_string()),
            PropertyKind::ScopedValues => input
                .split_once('=')
                .map(|(scope, data)| {
                    let mut values = ScopedValues::new();
                    values.insert(scope.trim(), data.to_string().into_bytes());
                    PropertyValue::ScopedValues(values)
                })
                .ok_or_else(|| format!("expected scope=contents, got '{input}'")),
        }
    }
}

/// Seconds in `duration`, rounded up so a sub-second grace period never becomes zero.
pub fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

fn parse_bool(input: &str) -> Result<bool, String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got '{other}'")),
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => f.write_str(s),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            PropertyValue::StringList(l) => f.write_str(&l.join("\n")),
            PropertyValue::StringMap(m) => {
                let lines: Vec<String> = m.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                f.write_str(&lines.join("\n"))
            }
            PropertyValue::Duration(d) => write!(f, "{}", humantime::format_duration(*d)),
            PropertyValue::Yaml(v) => {
                let text = serde_yaml::to_string(v).map_err(|_| fmt::Error)?;
                f.write_str(text.trim_end())
            }
            PropertyValue::ScopedValues(values) => {
                for (i, (scope, data)) in values.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    writeln!(f, "# {scope}")?;
                    f.write_str(String::from_utf8_lossy(data).trim_end())?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyValue::String(s) => serializer.serialize_str(s),
            PropertyValue::Bool(b) => serializer.serialize_bool(*b),
            PropertyValue::Int(i) => serializer.serialize_i64(*i),
            PropertyValue::Bytes(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
            PropertyValue::StringList(l) => l.serialize(serializer),
            PropertyValue::StringMap(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            PropertyValue::Duration(d) => {
                serializer.serialize_str(&humantime::format_duration(*d).to_string())
            }
            PropertyValue::Yaml(v) => v.serialize(serializer),
            PropertyValue::ScopedValues(v) => v.serialize(serializer),
        }
    }
}

/// How callers may use a property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    /// Validation fails while a required property has no value.
    pub required: bool,
    /// Hidden from external callers such as the CLI.
    pub internal: bool,
    /// Written by the operation; external callers cannot set it.
    pub read_only: bool,
}

impl Usage {
    pub const fn optional() -> Self {
        Self {
            required: false,
            internal: false,
            read_only: false,
        }
    }

    pub const fn required() -> Self {
        Self {
            required: true,
            internal: false,
            read_only: false,
        }
    }

    pub const fn output() -> Self {
        Self {
            required: false,
            internal: false,
            read_only: true,
        }
    }

    pub const fn internal() -> Self {
        Self {
            required: false,
            internal: true,
            read_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    id: String,
    label: String,
    description: String,
    usage: Usage,
    kind: PropertyKind,
    value: Option<PropertyValue>,
}

impl Property {
    pub fn new(id: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            description: String::new(),
            usage: Usage::optional(),
            kind,
            value: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    /// Initial value. A value of the wrong kind is ignored.
    pub fn default_value(mut self, value: PropertyValue) -> Self {
        if value.kind() == self.kind {
            self.value = Some(value);
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn get_usage(&self) -> Usage {
        self.usage
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn get(&self) -> Option<&PropertyValue> {
        self.value.as_ref()
    }

    pub fn has_value(&self) -> bool {
        self.value.as_ref().is_some_and(|v| !v.is_empty())
    }

    pub fn set(&mut self, value: PropertyValue) -> Result<(), PropertyError> {
        if value.kind() != self.kind {
            return Err(PropertyError::KindMismatch {
                id: self.id.clone(),
                expected: self.kind,
                actual: value.kind(),
            });
        }
        self.value = Some(value);
        Ok(())
    }

    pub fn set_from_str(&mut self, input: &str) -> Result<(), PropertyError> {
        let value = PropertyValue::parse(self.kind, input).map_err(|reason| PropertyError::Parse {
            id: self.id.clone(),
            reason,
        })?;
        self.set(value)
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}

/// Insertion-ordered property bag keyed by property id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(IndexMap<String, Property>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `add`.
    pub fn with(mut self, property: Property) -> Self {
        self.add(property);
        self
    }

    /// Add a property, replacing one with the same id in place.
    pub fn add(&mut self, property: Property) {
        self.0.insert(property.id.clone(), property);
    }

    pub fn get(&self, id: &str) -> Option<&Property> {
        self.0.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Property> {
        self.0.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.0.values()
    }

    /// Properties visible to external callers.
    pub fn external(&self) -> impl Iterator<Item = &Property> {
        self.0.values().filter(|p| !p.usage.internal)
    }

    /// Read-only properties the last exec filled in.
    pub fn outputs(&self) -> impl Iterator<Item = &Property> {
        self.0
            .values()
            .filter(|p| p.usage.read_only && !p.usage.internal && p.has_value())
    }

    pub fn missing_required(&self) -> Vec<String> {
        self.0
            .values()
            .filter(|p| p.usage.required && !p.has_value())
            .map(|p| p.id.clone())
            .collect()
    }

    /// Set a value from inside an operation.
    pub fn set(&mut self, id: &str, value: PropertyValue) -> Result<(), PropertyError> {
        self.0
            .get_mut(id)
            .ok_or_else(|| PropertyError::Unknown(id.to_string()))?
            .set(value)
    }

    /// Set a value on behalf of an external caller from text.
    pub fn set_external(&mut self, id: &str, input: &str) -> Result<(), PropertyError> {
        let property = self
            .0
            .get_mut(id)
            .ok_or_else(|| PropertyError::Unknown(id.to_string()))?;
        if property.usage.internal {
            return Err(PropertyError::Internal(id.to_string()));
        }
        if property.usage.read_only {
            return Err(PropertyError::ReadOnly(id.to_string()));
        }
        property.set_from_str(input)
    }

    pub fn value(&self, id: &str) -> Option<&PropertyValue> {
        self.0.get(id).and_then(Property::get)
    }

    pub fn string(&self, id: &str) -> Option<&str> {
        match self.value(id) {
            Some(PropertyValue::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn bool(&self, id: &str) -> Option<bool> {
        match self.value(id) {
            Some(PropertyValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn int(&self, id: &str) -> Option<i64> {
        match self.value(id) {
            Some(PropertyValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn bytes(&self, id: &str) -> Option<&Bytes> {
        match self.value(id) {
            Some(PropertyValue::Bytes(b)) => Some(b),
            _ => None,
        }
    }

    pub fn string_list(&self, id: &str) -> &[String] {
        match self.value(id) {
            Some(PropertyValue::StringList(l)) => l,
            _ => &[],
        }
    }

    pub fn string_map(&self, id: &str) -> Option<&IndexMap<String, String>> {
        match self.value(id) {
            Some(PropertyValue::StringMap(m)) => Some(m),
            _ => None,
        }
    }

    pub fn duration(&self, id: &str) -> Option<Duration> {
        match self.value(id) {
            Some(PropertyValue::Duration(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn yaml(&self, id: &str) -> Option<&serde_yaml::Value> {
        match self.value(id) {
            Some(PropertyValue::Yaml(v)) => Some(v),
            _ => None,
        }
    }

    pub fn scoped_values(&self, id: &str) -> Option<&ScopedValues> {
        match self.value(id) {
            Some(PropertyValue::ScopedValues(v)) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag() -> Properties {
        Properties::new()
            .with(Property::new("app.name", PropertyKind::String).usage(Usage::required()))
            .with(Property::new("app.replicas", PropertyKind::Int))
            .with(Property::new("app.labels", PropertyKind::StringMap))
            .with(Property::new("app.token", PropertyKind::String).usage(Usage::internal()))
            .with(Property::new("app.status", PropertyKind::String).usage(Usage::output()))
    }

    #[test]
    fn parses_text_by_kind() {
        assert_eq!(
            PropertyValue::parse(PropertyKind::Bool, " Yes ").unwrap(),
            PropertyValue::Bool(true)
        );
        assert_eq!(
            PropertyValue::parse(PropertyKind::StringList, "web, ,worker").unwrap(),
            PropertyValue::StringList(vec!["web".into(), "worker".into()])
        );
        assert_eq!(
            PropertyValue::parse(PropertyKind::Duration, "1m 30s").unwrap(),
            PropertyValue::Duration(Duration::from_secs(90))
        );
        assert!(PropertyValue::parse(PropertyKind::Int, "many").is_err());
        assert!(PropertyValue::parse(PropertyKind::StringMap, "a=1,b").is_err());
    }

    #[test]
    fn required_properties_need_a_non_empty_value() {
        let mut props = bag();
        assert_eq!(props.missing_required(), ["app.name"]);

        props.set_external("app.name", "").unwrap();
        assert_eq!(props.missing_required(), ["app.name"]);

        props.set_external("app.name", "shop").unwrap();
        assert!(props.missing_required().is_empty());
    }

    #[test]
    fn external_callers_cannot_touch_internal_or_output_properties() {
        let mut props = bag();

        assert!(matches!(
            props.set_external("app.token", "secret"),
            Err(PropertyError::Internal(_))
        ));
        assert!(matches!(
            props.set_external("app.status", "running"),
            Err(PropertyError::ReadOnly(_))
        ));
        assert!(matches!(
            props.set_external("app.missing", "x"),
            Err(PropertyError::Unknown(_))
        ));

        props
            .set("app.status", PropertyValue::String("running".into()))
            .unwrap();
        assert_eq!(props.string("app.status"), Some("running"));
        assert!(props.external().all(|p| p.id() != "app.token"));
        assert_eq!(props.outputs().count(), 1);
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut props = bag();
        let err = props
            .set("app.replicas", PropertyValue::String("3".into()))
            .unwrap_err();
        assert!(matches!(err, PropertyError::KindMismatch { .. }));

        props.set_external("app.replicas", "3").unwrap();
        assert_eq!(props.int("app.replicas"), Some(3));
    }

    #[test]
    fn whole_seconds_rounds_up() {
        assert_eq!(whole_seconds(Duration::from_secs(30)), 30);
        assert_eq!(whole_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(whole_seconds(Duration::from_millis(500)), 1);
        assert_eq!(whole_seconds(Duration::ZERO), 0);
    }

    #[test]
    fn maps_keep_insertion_order() {
        let mut props = bag();
        props.set_external("app.labels", "tier=web, team=ops").unwrap();
        let labels: Vec<_> = props.string_map("app.labels").unwrap().keys().cloned().collect();
        assert_eq!(labels, ["tier", "team"]);
    }
}
