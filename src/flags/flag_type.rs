//! Flag types: the catalogued kinds of flag.
//!
//! Each type owns the codec for its own instances, so the registry can
//! read and write a zone's flag map without knowing what the flags are.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::core::ids::{FlagTypeId, GroupKeyId};
use crate::error::{FlagError, FlagResult};
use crate::price::{Decimal, Price};

use super::flag::{Capabilities, Flag};
use super::value::FlagValue;

/// A kind of flag.
pub trait FlagType: fmt::Debug {
    /// Stable, unique id.
    fn id(&self) -> &FlagTypeId;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Capabilities every instance of this type satisfies.
    fn capabilities(&self) -> Capabilities;

    /// Derived types never get a standalone default.
    fn is_tagged(&self) -> bool {
        false
    }

    /// A fresh copy of the built-in default, if the type has one.
    fn default_flag(&self) -> Option<Flag>;

    /// Encode an instance.
    fn serialize(&self, flag: &Flag) -> FlagResult<Value>;

    /// Decode an instance.
    fn deserialize(&self, payload: &Value) -> FlagResult<Flag>;
}

/// Shape of the `value` field of a standard flag payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// No value field.
    Unit,
    /// JSON boolean.
    Bool,
    /// JSON integer.
    Int,
    /// JSON string.
    Text,
    /// A serialized `Price`.
    Price,
    /// Currency id to amount.
    Balance,
}

/// Table-driven flag type covering every built-in kind.
///
/// Payloads are JSON objects:
///
/// ```json
/// { "enabled": true, "key": "block_break", "value": ... }
/// ```
///
/// `enabled` is written only when explicitly overridden, `key` only for
/// group-keyed types, `value` only for non-unit payloads.
#[derive(Clone, Debug)]
pub struct StandardFlagType {
    id: FlagTypeId,
    name: String,
    payload: PayloadKind,
    enabled_default: Option<bool>,
    required_key: Option<GroupKeyId>,
    default_value: Option<FlagValue>,
    tagged: bool,
}

impl StandardFlagType {
    /// Create a serializable type with no capabilities and no default.
    pub fn new(id: impl Into<FlagTypeId>, name: impl Into<String>, payload: PayloadKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            payload,
            enabled_default: None,
            required_key: None,
            default_value: None,
            tagged: false,
        }
    }

    /// Add the enabled capability.
    #[must_use]
    pub fn enabled(mut self, default: bool) -> Self {
        self.enabled_default = Some(default);
        self
    }

    /// Add the group-keyed capability.
    #[must_use]
    pub fn keyed(mut self, key: impl Into<GroupKeyId>) -> Self {
        self.required_key = Some(key.into());
        self
    }

    /// Give the type a built-in default value.
    #[must_use]
    pub fn with_default(mut self, value: FlagValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Mark the type as derived.
    #[must_use]
    pub fn tagged(mut self) -> Self {
        self.tagged = true;
        self
    }

    /// The payload shape.
    #[must_use]
    pub fn payload(&self) -> PayloadKind {
        self.payload
    }

    fn codec_error(&self, reason: impl Into<String>) -> FlagError {
        FlagError::Codec {
            type_id: self.id.clone(),
            reason: reason.into(),
        }
    }

    fn instance(&self, value: FlagValue) -> Flag {
        let mut flag = Flag::new(self.id.clone(), value);
        if let Some(default) = self.enabled_default {
            flag = flag.with_enabled(default);
        }
        if let Some(key) = &self.required_key {
            flag = flag.with_required_key(key.clone());
        }
        flag
    }

    fn encode_value(&self, value: &FlagValue) -> FlagResult<Option<Value>> {
        let encoded = match (self.payload, value) {
            (PayloadKind::Unit, FlagValue::Unit) => None,
            (PayloadKind::Bool, FlagValue::Bool(b)) => Some(Value::Bool(*b)),
            (PayloadKind::Int, FlagValue::Int(n)) => Some(Value::from(*n)),
            (PayloadKind::Text, FlagValue::Text(s)) => Some(Value::String(s.clone())),
            (PayloadKind::Price, FlagValue::Price(p)) => Some(
                serde_json::to_value(p).map_err(|e| self.codec_error(e.to_string()))?,
            ),
            (PayloadKind::Balance, FlagValue::Balance(b)) => Some(
                serde_json::to_value(b).map_err(|e| self.codec_error(e.to_string()))?,
            ),
            (kind, other) => {
                return Err(self.codec_error(format!("expected {kind:?} value, found {other:?}")))
            }
        };
        Ok(encoded)
    }

    fn decode_value(&self, raw: Option<&Value>) -> FlagResult<FlagValue> {
        let missing = || self.codec_error("missing value");
        let value = match self.payload {
            PayloadKind::Unit => FlagValue::Unit,
            PayloadKind::Bool => FlagValue::Bool(
                raw.ok_or_else(missing)?
                    .as_bool()
                    .ok_or_else(|| self.codec_error("value is not a boolean"))?,
            ),
            PayloadKind::Int => FlagValue::Int(
                raw.ok_or_else(missing)?
                    .as_i64()
                    .ok_or_else(|| self.codec_error("value is not an integer"))?,
            ),
            PayloadKind::Text => FlagValue::Text(
                raw.ok_or_else(missing)?
                    .as_str()
                    .ok_or_else(|| self.codec_error("value is not a string"))?
                    .to_string(),
            ),
            PayloadKind::Price => {
                let price: Price = serde_json::from_value(raw.ok_or_else(missing)?.clone())
                    .map_err(|e| self.codec_error(e.to_string()))?;
                FlagValue::Price(price)
            }
            PayloadKind::Balance => {
                let map: BTreeMap<String, Decimal> =
                    serde_json::from_value(raw.ok_or_else(missing)?.clone())
                        .map_err(|e| self.codec_error(e.to_string()))?;
                FlagValue::Balance(map)
            }
        };
        Ok(value)
    }
}

impl FlagType for StandardFlagType {
    fn id(&self) -> &FlagTypeId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::SERIALIZABLE;
        caps.set(Capabilities::ENABLED, self.enabled_default.is_some());
        caps.set(Capabilities::GROUP_KEYED, self.required_key.is_some());
        caps
    }

    fn is_tagged(&self) -> bool {
        self.tagged
    }

    fn default_flag(&self) -> Option<Flag> {
        self.default_value.clone().map(|value| self.instance(value))
    }

    fn serialize(&self, flag: &Flag) -> FlagResult<Value> {
        if flag.type_id() != &self.id {
            return Err(self.codec_error(format!("cannot encode a {} flag", flag.type_id())));
        }
        let mut object = Map::new();
        if let Some(explicit) = flag.as_enabled().and_then(|e| e.enabled_override()) {
            object.insert("enabled".to_string(), Value::Bool(explicit));
        }
        if let Some(keyed) = flag.as_group_keyed() {
            object.insert(
                "key".to_string(),
                Value::String(keyed.required_key().as_str().to_string()),
            );
        }
        if let Some(value) = self.encode_value(flag.value())? {
            object.insert("value".to_string(), value);
        }
        Ok(Value::Object(object))
    }

    fn deserialize(&self, payload: &Value) -> FlagResult<Flag> {
        let object = payload
            .as_object()
            .ok_or_else(|| self.codec_error("payload is not an object"))?;

        let mut flag = self.instance(self.decode_value(object.get("value"))?);

        if let Some(raw) = object.get("key") {
            if self.required_key.is_none() {
                return Err(self.codec_error("type is not group-keyed"));
            }
            let key = raw
                .as_str()
                .ok_or_else(|| self.codec_error("key is not a string"))?;
            flag = flag.with_required_key(key);
        }

        if let Some(raw) = object.get("enabled") {
            let explicit = match raw {
                Value::Null => None,
                Value::Bool(b) => Some(*b),
                _ => return Err(self.codec_error("enabled is not a boolean")),
            };
            let enabled = flag
                .as_enabled_mut()
                .ok_or_else(|| self.codec_error("type has no enabled state"))?;
            enabled.set_enabled(explicit);
        }
        Ok(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block_break() -> StandardFlagType {
        StandardFlagType::new("block_break", "Block Break", PayloadKind::Unit)
            .enabled(true)
            .keyed("block_break")
            .with_default(FlagValue::Unit)
    }

    #[test]
    fn test_capabilities() {
        let ty = block_break();
        assert!(ty.capabilities().contains(Capabilities::SERIALIZABLE));
        assert!(ty.capabilities().contains(Capabilities::ENABLED | Capabilities::GROUP_KEYED));

        let text = StandardFlagType::new("greetings", "Greetings", PayloadKind::Text);
        assert_eq!(text.capabilities(), Capabilities::SERIALIZABLE);
        assert!(text.default_flag().is_none());
    }

    #[test]
    fn test_encode_explicit_override() {
        let ty = block_break();
        let mut flag = ty.default_flag().unwrap();
        assert_eq!(ty.serialize(&flag).unwrap(), json!({ "key": "block_break" }));

        flag.as_enabled_mut().unwrap().set_enabled(Some(false));
        let encoded = ty.serialize(&flag).unwrap();
        assert_eq!(encoded, json!({ "enabled": false, "key": "block_break" }));
        assert_eq!(ty.deserialize(&encoded).unwrap(), flag);
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        let ty = StandardFlagType::new("greetings", "Greetings", PayloadKind::Text);
        assert!(ty.deserialize(&json!("hello")).is_err());
        assert!(ty.deserialize(&json!({})).is_err());
        assert!(ty.deserialize(&json!({ "value": 3 })).is_err());
        assert!(ty.deserialize(&json!({ "value": "hi", "enabled": true })).is_err());
        assert_eq!(
            ty.deserialize(&json!({ "value": "hi" })).unwrap().value(),
            &FlagValue::Text("hi".into())
        );
    }

    #[test]
    fn test_encode_rejects_foreign_flag() {
        let ty = block_break();
        let other = Flag::new("block_place", FlagValue::Unit);
        assert!(matches!(ty.serialize(&other), Err(FlagError::Codec { .. })));
    }

    #[test]
    fn test_balance_payload_keeps_precision() {
        let ty = StandardFlagType::new("balance", "Balance", PayloadKind::Balance);
        let flag = ty
            .deserialize(&json!({ "value": { "dollar": "0.00001", "gold": 0.00004 } }))
            .unwrap();
        let balance = flag.value().as_balance().unwrap();
        assert_eq!(balance["dollar"], Decimal::new(1, 5));
        assert_eq!(balance["gold"], Decimal::new(4, 5));
        assert_eq!(ty.deserialize(&ty.serialize(&flag).unwrap()).unwrap(), flag);
    }

    #[test]
    fn test_balance_payload() {
        let ty = StandardFlagType::new("balance", "Balance", PayloadKind::Balance);
        let flag = ty
            .deserialize(&json!({ "value": { "dollar": "12.50", "gold": 3 } }))
            .unwrap();
        let balance = flag.value().as_balance().unwrap();
        assert_eq!(balance["dollar"], Decimal::new(125, 1));
        assert_eq!(balance["gold"], Decimal::from(3));
        assert_eq!(ty.deserialize(&ty.serialize(&flag).unwrap()).unwrap(), flag);
    }
}
