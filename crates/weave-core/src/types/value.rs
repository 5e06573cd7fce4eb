//! Plain values, channel names and stored continuations
//!
//! These are the shapes the engine observes when it reads a tuple space:
//! data published on channels and continuations waiting on them. Evaluation
//! semantics belong to the interpreter; the engine only inspects results.

use super::deploy::Term;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plain data published on a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    /// The empty process
    Nil,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// UTF-8 string
    Str(String),
    /// Byte string (public keys, addresses)
    Bytes(Vec<u8>),
    /// Unforgeable name drawn from a deploy's seeded generator
    Unforgeable([u8; 32]),
    /// Ordered list
    List(Vec<Value>),
    /// Association list, kept in insertion order
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Integer payload, if this is an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Byte payload, if this is a byte string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Unforgeable(id) => write!(f, "Unforgeable(0x{})", hex::encode(id)),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A channel name. Any value can be quoted into a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Channel(pub Value);

impl Channel {
    /// Public channel named by a string. Anyone who knows the string can
    /// read or write it.
    pub fn public(name: impl Into<String>) -> Self {
        Self(Value::Str(name.into()))
    }

    /// Unforgeable channel
    pub fn unforgeable(id: [u8; 32]) -> Self {
        Self(Value::Unforgeable(id))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A value stored on a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Datum {
    /// Published value
    pub value: Value,
    /// Persistent data survives being matched
    pub persist: bool,
}

impl Datum {
    /// Non-persistent datum
    pub fn once(value: Value) -> Self {
        Self {
            value,
            persist: false,
        }
    }

    /// Persistent datum
    pub fn persistent(value: Value) -> Self {
        Self {
            value,
            persist: true,
        }
    }
}

/// Receive pattern of a waiting continuation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
    /// Matches anything without binding
    Wildcard,
    /// Matches anything and binds it under a name
    Bind(String),
    /// Matches only an equal value
    Literal(Value),
}

impl Pattern {
    /// Whether `value` satisfies this pattern
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Pattern::Wildcard | Pattern::Bind(_) => true,
            Pattern::Literal(expected) => expected == value,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Wildcard => write!(f, "_"),
            Pattern::Bind(name) => write!(f, "{name}"),
            Pattern::Literal(v) => write!(f, "{v}"),
        }
    }
}

/// Body of a stored continuation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaggedContinuation {
    /// A program body representable as a plain term
    Program(Term),
    /// A reference to a native (host-implemented) handler
    Native(u64),
}

/// A continuation waiting for data on one or more channels
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaitingContinuation {
    /// One pattern per channel, in channel order
    pub patterns: Vec<Pattern>,
    /// Body to run on match
    pub continuation: TaggedContinuation,
    /// Persistent continuations survive firing
    pub persist: bool,
}

/// One entry of the active validator bonds table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bond {
    /// Validator identity (public key bytes)
    pub validator: Vec<u8>,
    /// Bonded stake
    pub stake: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        let v = Value::Map(vec![
            (Value::Bytes(vec![0xab]), Value::Int(10)),
            (Value::Str("k".into()), Value::List(vec![Value::Bool(true), Value::Nil])),
        ]);
        assert_eq!(v.to_string(), r#"{0xab: 10, "k": [true, Nil]}"#);
    }

    #[test]
    fn test_pattern_matching() {
        assert!(Pattern::Wildcard.matches(&Value::Int(1)));
        assert!(Pattern::Bind("x".into()).matches(&Value::Nil));
        assert!(Pattern::Literal(Value::Int(1)).matches(&Value::Int(1)));
        assert!(!Pattern::Literal(Value::Int(1)).matches(&Value::Int(2)));
    }

    #[test]
    fn test_public_channel_display() {
        assert_eq!(Channel::public("__SCALA__").to_string(), r#"@"__SCALA__""#);
    }
}
