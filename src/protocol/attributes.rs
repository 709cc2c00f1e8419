//! Insertion-ordered attribute map
//!
//! Attribute order is part of the encoding: the size pass and the write pass
//! both walk [`Attributes::iter`], so the map keeps entries in a `Vec` rather
//! than a hash map. Attribute sets are small (a handful of keys), so lookups
//! are linear.

use super::{AttributeError, FromValue, Jid, Value};

/// Ordered mapping from attribute names to scalar values
///
/// A key is never stored without a value: `put_opt` with `None` is a no-op,
/// which lets call sites build conditional attributes inline.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Vec<(String, Value)>,
}

impl Attributes {
    /// Create an empty map
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an empty map with room for `capacity` entries
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or overwrite. Overwriting keeps the key's original position.
    ///
    /// Keys are not validated here; the encoder rejects an empty key.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Insert when `value` is present, otherwise do nothing
    pub fn put_opt<V: Into<Value>>(&mut self, key: impl Into<String>, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.put(key, value);
        }
        self
    }

    /// Insert only when `condition` holds
    pub fn put_if(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
        condition: bool,
    ) -> &mut Self {
        if condition {
            self.put(key, value);
        }
        self
    }

    /// Builder form of [`put`](Self::put)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put(key, value);
        self
    }

    /// Builder form of [`put_opt`](Self::put_opt)
    #[must_use]
    pub fn with_opt<V: Into<Value>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.put_opt(key, value);
        self
    }

    /// Remove a key, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Raw stored value
    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Check if a key is present
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    /// Value coerced to `T`; `Ok(None)` when absent
    pub fn get<T: FromValue>(&self, key: &str) -> Result<Option<T>, AttributeError> {
        let Some(value) = self.get_value(key) else {
            return Ok(None);
        };

        T::from_value(value)
            .map(Some)
            .ok_or_else(|| AttributeError::TypeMismatch {
                key: key.to_owned(),
                expected: T::EXPECTED,
                found: value.kind(),
            })
    }

    /// Value coerced to `T`, failing when absent
    pub fn get_required<T: FromValue>(&self, key: &str) -> Result<T, AttributeError> {
        self.get(key)?.ok_or_else(|| AttributeError::Missing {
            key: key.to_owned(),
        })
    }

    /// Value coerced to `T`, or `default` when absent
    pub fn get_or<T: FromValue>(&self, key: &str, default: T) -> Result<T, AttributeError> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// String shorthand
    pub fn get_string(&self, key: &str) -> Result<Option<String>, AttributeError> {
        self.get(key)
    }

    /// Required string shorthand
    pub fn get_required_string(&self, key: &str) -> Result<String, AttributeError> {
        self.get_required(key)
    }

    /// Integer shorthand
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>, AttributeError> {
        self.get(key)
    }

    /// Boolean shorthand; absent reads as `false`
    pub fn get_bool(&self, key: &str) -> Result<bool, AttributeError> {
        self.get_or(key, false)
    }

    /// Identifier shorthand
    pub fn get_jid(&self, key: &str) -> Result<Option<Jid>, AttributeError> {
        self.get(key)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

/// Same keys with equal values, regardless of order
impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get_value(key) == Some(value))
    }
}

impl Eq for Attributes {}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        attributes.extend(iter);
        attributes
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Attributes {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Attributes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let attributes = Attributes::new()
            .with("to", "s.whatsapp.net")
            .with("id", "1-abc")
            .with("type", "get");
        let keys: Vec<_> = attributes.keys().collect();
        assert_eq!(keys, ["to", "id", "type"]);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut attributes = Attributes::new().with("a", 1).with("b", 2);
        attributes.put("a", 3);
        let entries: Vec<_> = attributes.iter().map(|(k, v)| (k, v.clone())).collect();
        assert_eq!(entries, [("a", Value::Int(3)), ("b", Value::Int(2))]);
    }

    #[test]
    fn test_empty_and_token_keys_are_stored() {
        let mut attributes: Attributes = [("", "x")].into_iter().collect();
        attributes.put("id", "1");
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes.get_string("").unwrap().as_deref(), Some("x"));
        assert_eq!(attributes.keys().collect::<Vec<_>>(), ["", "id"]);
    }

    #[test]
    fn test_absent_values_are_not_stored() {
        let mut attributes = Attributes::new();
        attributes
            .put_opt("participant", None::<Jid>)
            .put_opt("t", Some(1_700_000_000u32))
            .put_if("edit", "7", false);
        assert_eq!(attributes.len(), 1);
        assert!(!attributes.contains_key("participant"));
        assert!(!attributes.contains_key("edit"));
    }

    #[test]
    fn test_typed_access() {
        let attributes = Attributes::new()
            .with("t", "1700000000")
            .with("offline", true)
            .with("from", Jid::new("12", "g.us"))
            .with("participant", "34:2@s.whatsapp.net");

        assert_eq!(attributes.get::<u64>("t").unwrap(), Some(1_700_000_000));
        assert!(attributes.get_bool("offline").unwrap());
        assert!(!attributes.get_bool("missing").unwrap());
        assert_eq!(
            attributes.get_jid("from").unwrap(),
            Some(Jid::new("12", "g.us"))
        );
        assert_eq!(
            attributes.get_jid("participant").unwrap(),
            Some(Jid::companion("34", 0, 2))
        );
        assert_eq!(attributes.get_or("count", 5i32).unwrap(), 5);
    }

    #[test]
    fn test_type_mismatch() {
        let attributes = Attributes::new().with("t", "soon");
        let error = attributes.get::<i64>("t").unwrap_err();
        assert_eq!(
            error,
            AttributeError::TypeMismatch {
                key: "t".into(),
                expected: "i64",
                found: "text",
            }
        );
    }

    #[test]
    fn test_missing_required() {
        let attributes = Attributes::new();
        assert_eq!(
            attributes.get_required_string("id"),
            Err(AttributeError::Missing { key: "id".into() })
        );
    }

    #[test]
    fn test_equality_ignores_order() {
        let left = Attributes::new().with("a", "1").with("b", vec![1u8, 2]);
        let right = Attributes::new().with("b", vec![1u8, 2]).with("a", 1);
        assert_eq!(left, right);
        assert_ne!(left, Attributes::new().with("a", "1"));
    }

    #[test]
    fn test_remove() {
        let mut attributes: Attributes = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(attributes.remove("a"), Some(Value::from("1")));
        assert_eq!(attributes.remove("a"), None);
        assert_eq!(attributes.len(), 1);
    }
}
