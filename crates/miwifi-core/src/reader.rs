// ── Field extraction ──
//
// Pulls a single displayable value out of an endpoint payload using a
// dotted key path and an optional trailing key or index.

use std::fmt;

use serde::Serialize;
use serde_json::{Number, Value};
use tracing::{debug, warn};

/// Final step applied after the dotted key path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataPath<'a> {
    /// Sub-key of a mapping, or projected across a sequence of mappings.
    Key(&'a str),
    /// Position in a sequence.
    Index(usize),
}

impl fmt::Display for DataPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// A displayable leaf value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl Scalar {
    /// Convert a JSON leaf. Null, mappings and sequences are not scalars.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value; numeric strings are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Extract one value from `payload`.
///
/// `key_path` is walked one mapping level per `.`-separated segment. The
/// optional `data_path` then selects a sub-key or position. The result is
/// `None` whenever the value is missing, null, or a mapping.
pub fn extract(
    payload: &Value,
    key_path: &str,
    data_path: Option<DataPath<'_>>,
) -> Option<Scalar> {
    let value = walk(payload, key_path)?;

    match data_path {
        None => display(value),
        Some(DataPath::Index(index)) => {
            let Value::Array(items) = value else {
                debug!(key_path, index, "index applied to a non-sequence");
                return None;
            };
            items.get(index).and_then(display)
        }
        Some(DataPath::Key(key)) => match value {
            Value::Object(map) => map.get(key).and_then(display),
            Value::Array(items) => project(items, key),
            _ => {
                debug!(key_path, key, "key applied to a scalar");
                None
            }
        },
    }
}

/// Length of the sequence at `key_path`.
pub fn count(payload: &Value, key_path: &str) -> Option<usize> {
    walk(payload, key_path)?.as_array().map(Vec::len)
}

fn walk<'v>(payload: &'v Value, key_path: &str) -> Option<&'v Value> {
    if key_path.is_empty() {
        return Some(payload);
    }

    let mut current = payload;
    for segment in key_path.split('.') {
        let Some(next) = current.as_object().and_then(|map| map.get(segment)) else {
            warn!(key_path, segment, "field not found in response");
            return None;
        };
        current = next;
    }
    Some(current)
}

/// Turn a final value into a scalar.
fn display(value: &Value) -> Option<Scalar> {
    let Value::Array(items) = value else {
        return Scalar::from_json(value);
    };

    // A lone mapping wrapped in a sequence is still a mapping.
    if matches!(items.as_slice(), [Value::Object(_)]) {
        return None;
    }

    let mut scalars = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Null => {}
            Value::Array(_) | Value::Object(_) => return None,
            leaf => scalars.extend(Scalar::from_json(leaf)),
        }
    }
    join(scalars)
}

fn project(items: &[Value], key: &str) -> Option<Scalar> {
    let found = items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|map| map.get(key))
        .filter_map(Scalar::from_json)
        .collect();
    join(found)
}

fn join(mut values: Vec<Scalar>) -> Option<Scalar> {
    match values.len() {
        0 => None,
        1 => values.pop(),
        _ => Some(Scalar::Text(
            values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn text(s: &str) -> Option<Scalar> {
        Some(Scalar::Text(s.into()))
    }

    #[test]
    fn nested_key_path() {
        let payload = json!({ "net": { "info": { "cell_band": "B3" } } });
        assert_eq!(extract(&payload, "net.info.cell_band", None), text("B3"));
    }

    #[test]
    fn index_into_sequence() {
        let payload = json!({ "net": { "ipv4info": { "dns": ["8.8.8.8", "8.8.4.4"] } } });

        assert_eq!(
            extract(&payload, "net.ipv4info.dns", Some(DataPath::Index(0))),
            text("8.8.8.8")
        );
        assert_eq!(
            extract(&payload, "net.ipv4info.dns", Some(DataPath::Index(1))),
            text("8.8.4.4")
        );
        assert_eq!(
            extract(&payload, "net.ipv4info.dns", Some(DataPath::Index(2))),
            None
        );
    }

    #[test]
    fn missing_branch_is_absent() {
        let payload = json!({ "net": { "info": {} } });
        assert_eq!(extract(&payload, "net.info.cell_band", None), None);
        assert_eq!(extract(&payload, "net.ipv4info.ip", None), None);
        assert_eq!(extract(&json!({}), "anything", None), None);
    }

    #[test]
    fn scalar_intermediate_is_absent() {
        let payload = json!({ "net": "offline" });
        assert_eq!(extract(&payload, "net.info.cell_band", None), None);
    }

    #[test]
    fn null_is_absent() {
        let payload = json!({ "sim": { "iccid": null } });
        assert_eq!(extract(&payload, "sim.iccid", None), None);
    }

    #[test]
    fn numbers_and_bools_keep_their_type() {
        let payload = json!({ "net": { "info": { "rsrp": -95, "roaming": false } } });
        assert_eq!(
            extract(&payload, "net.info.rsrp", None),
            Some(Scalar::Number((-95).into()))
        );
        assert_eq!(
            extract(&payload, "net.info.roaming", None),
            Some(Scalar::Bool(false))
        );
    }

    #[test]
    fn key_on_mapping_is_a_sub_key_lookup() {
        let payload = json!({ "info": { "ssid": "home", "channel": 6 } });
        assert_eq!(
            extract(&payload, "info", Some(DataPath::Key("ssid"))),
            text("home")
        );
        assert_eq!(extract(&payload, "info", Some(DataPath::Key("bssid"))), None);
    }

    #[test]
    fn key_on_sequence_projects_and_joins() {
        let payload = json!({
            "info": [
                { "ssid": "home-2g", "band": "2g" },
                { "ssid": "home-5g", "band": "5g" },
                { "band": "guest" },
                { "ssid": null }
            ]
        });
        assert_eq!(
            extract(&payload, "info", Some(DataPath::Key("ssid"))),
            text("home-2g, home-5g")
        );
        assert_eq!(extract(&payload, "info", Some(DataPath::Key("bssid"))), None);
    }

    #[test]
    fn single_projection_keeps_the_scalar() {
        let payload = json!({ "apn": [{ "name": "cmnet", "auth": 0 }] });
        assert_eq!(
            extract(&payload, "apn", Some(DataPath::Key("name"))),
            text("cmnet")
        );
        assert_eq!(
            extract(&payload, "apn", Some(DataPath::Key("auth"))),
            Some(Scalar::Number(0.into()))
        );
    }

    #[test]
    fn mappings_are_never_displayable() {
        let payload = json!({
            "wrapped": [{ "ssid": "home" }],
            "plain": { "ssid": "home" }
        });
        assert_eq!(extract(&payload, "wrapped", None), None);
        assert_eq!(extract(&payload, "plain", None), None);
    }

    #[test]
    fn scalar_sequence_without_data_path_is_joined() {
        let payload = json!({ "dns": ["8.8.8.8", null, "1.1.1.1"], "empty": [] });
        assert_eq!(extract(&payload, "dns", None), text("8.8.8.8, 1.1.1.1"));
        assert_eq!(extract(&payload, "empty", None), None);
    }

    #[test]
    fn count_sequence_length() {
        let payload = json!({ "list": [{ "mac": "a" }, { "mac": "b" }], "code": 0 });
        assert_eq!(count(&payload, "list"), Some(2));
        assert_eq!(count(&payload, "code"), None);
        assert_eq!(count(&payload, "missing"), None);
    }

    #[test]
    fn scalar_numeric_view() {
        assert_eq!(Scalar::Text(" 2048 ".into()).as_f64(), Some(2048.0));
        assert_eq!(Scalar::Text("n/a".into()).as_f64(), None);
        assert_eq!(Scalar::Bool(true).as_f64(), None);
        assert_eq!(Scalar::Number(12.into()).to_string(), "12");
    }
}
