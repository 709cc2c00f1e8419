//! Scalar values carried by attributes and node content

use std::borrow::Cow;
use std::fmt;

use super::Jid;

/// Enum-like protocol constants that travel as a fixed string.
pub trait WireSymbol {
    /// String written on the wire
    fn wire_name(&self) -> &'static str;
}

/// Scalar attribute or content value
///
/// Equality compares the wire-observable form: text-like scalars (text,
/// integers, booleans, symbols) compare by their canonical string, and text
/// equals a byte sequence holding the same UTF-8. A decoded node therefore
/// compares equal to the node it was encoded from.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum Value {
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Integer, written as its decimal string
    Int(i64),
    /// Boolean, written as `true` / `false`
    Bool(bool),
    /// Enum-like constant
    Symbol(&'static str),
    /// Compound identifier
    Jid(Jid),
}

impl Value {
    /// Wrap an enum-like constant
    pub fn symbol<S: WireSymbol>(symbol: &S) -> Self {
        Self::Symbol(symbol.wire_name())
    }

    /// Short name of the variant, used in error messages
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Int(_) => "integer",
            Self::Bool(_) => "boolean",
            Self::Symbol(_) => "symbol",
            Self::Jid(_) => "jid",
        }
    }

    /// Canonical string form, if the value is text-like or valid UTF-8 bytes
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(text) => Some(Cow::Borrowed(text)),
            Self::Bytes(bytes) => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            Self::Int(number) => Some(Cow::Owned(number.to_string())),
            Self::Bool(true) => Some(Cow::Borrowed("true")),
            Self::Bool(false) => Some(Cow::Borrowed("false")),
            Self::Symbol(name) => Some(Cow::Borrowed(name)),
            Self::Jid(_) => None,
        }
    }

    /// Borrow raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Text(text) => Some(text.as_bytes()),
            _ => None,
        }
    }

    /// Borrow the identifier
    #[must_use]
    pub const fn as_jid(&self) -> Option<&Jid> {
        match self {
            Self::Jid(jid) => Some(jid),
            _ => None,
        }
    }

    fn wire_bytes(&self) -> Option<Cow<'_, [u8]>> {
        match self {
            Self::Bytes(bytes) => Some(Cow::Borrowed(bytes)),
            Self::Jid(_) => None,
            _ => self.as_text().map(|text| match text {
                Cow::Borrowed(text) => Cow::Borrowed(text.as_bytes()),
                Cow::Owned(text) => Cow::Owned(text.into_bytes()),
            }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Jid(left), Self::Jid(right)) => left == right,
            (Self::Jid(_), _) | (_, Self::Jid(_)) => false,
            _ => self.wire_bytes() == other.wire_bytes(),
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jid(jid) => write!(f, "{jid}"),
            Self::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => write!(f, "{text}"),
                Err(_) => write!(f, "<{} bytes>", bytes.len()),
            },
            _ => match self.as_text() {
                Some(text) => write!(f, "{text}"),
                None => Ok(()),
            },
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Jid> for Value {
    fn from(value: Jid) -> Self {
        Self::Jid(value)
    }
}

impl From<&Jid> for Value {
    fn from(value: &Jid) -> Self {
        Self::Jid(value.clone())
    }
}

macro_rules! value_from_small_int {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::Int(i64::from(value))
            }
        }
    )*};
}

value_from_small_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! value_from_wide_int {
    ($($ty:ty),*) => {$(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                match i64::try_from(value) {
                    Ok(number) => Self::Int(number),
                    Err(_) => Self::Text(value.to_string()),
                }
            }
        }
    )*};
}

value_from_wide_int!(u64, usize);

/// Types a stored [`Value`] can be coerced into
pub trait FromValue: Sized {
    /// Name used in type mismatch errors
    const EXPECTED: &'static str;

    /// Coerce, or `None` when the value has an incompatible shape
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Jid(jid) => Some(jid.to_string()),
            _ => value.as_text().map(Cow::into_owned),
        }
    }
}

impl FromValue for Vec<u8> {
    const EXPECTED: &'static str = "bytes";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(*flag),
            Value::Text(_) | Value::Bytes(_) | Value::Symbol(_) => {
                match &*value.as_text()? {
                    "true" => Some(true),
                    "false" => Some(false),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl FromValue for Jid {
    const EXPECTED: &'static str = "jid";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Jid(jid) => Some(jid.clone()),
            Value::Text(_) | Value::Bytes(_) => value.as_text()?.parse().ok(),
            _ => None,
        }
    }
}

macro_rules! int_from_value {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            const EXPECTED: &'static str = stringify!($ty);

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Int(number) => <$ty>::try_from(*number).ok(),
                    Value::Text(_) | Value::Bytes(_) => value.as_text()?.parse().ok(),
                    _ => None,
                }
            }
        }
    )*};
}

int_from_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize);
