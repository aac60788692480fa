//! Domain types shared by the board and action registries.
//!
//! Runtime values are `serde_json::Value`s; keyword mappings keep insertion order
//! (`serde_json` is built with `preserve_order`), so the declared order of an
//! action's variables is the order positional arguments bind in.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered keyword mapping used for parameters, variables and bound arguments.
pub type Mapping = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for an action, ramp or program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionName(pub String);

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ActionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ActionName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Borrow<str> for ActionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A strongly-typed name for a board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoardName(pub String);

impl fmt::Display for BoardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BoardName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BoardName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Borrow<str> for BoardName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which registry an entry lives in, decided once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Action,
    Ramp,
    Program,
}

impl ActionKind {
    /// Ramps and programs run as sub-programs; plain actions do not.
    pub fn is_subprogram(self) -> bool {
        !matches!(self, ActionKind::Action)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Action => write!(f, "action"),
            ActionKind::Ramp => write!(f, "ramp"),
            ActionKind::Program => write!(f, "program"),
        }
    }
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// Runtime arguments handed to a registry entry: positional values plus keywords.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    pub args: Vec<Value>,
    pub kwargs: Mapping,
}

impl Invocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocation carrying only positional values.
    pub fn positional<I, V>(args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            kwargs: Mapping::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(ActionName::from("heat").to_string(), "heat");
        assert_eq!(BoardName::from("b1").to_string(), "b1");
    }

    #[test]
    fn newtype_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(ActionName::from("heat"), 1);
        assert_eq!(map.get("heat"), Some(&1));
    }

    #[test]
    fn kind_display_and_subprogram_flag() {
        assert_eq!(ActionKind::Ramp.to_string(), "ramp");
        assert!(!ActionKind::Action.is_subprogram());
        assert!(ActionKind::Ramp.is_subprogram());
        assert!(ActionKind::Program.is_subprogram());
    }

    #[test]
    fn invocation_builder_keeps_order() {
        let inv = Invocation::new()
            .arg("50")
            .arg(3)
            .kwarg("b", 2)
            .kwarg("a", 1);
        assert_eq!(inv.args, vec![json!("50"), json!(3)]);
        let keys: Vec<_> = inv.kwargs.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
