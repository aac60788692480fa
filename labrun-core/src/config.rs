//! Setup file: declarative boards and actions registered at startup.
//!
//! # Storage layout
//!
//! ```text
//! ~/.labrun/
//!   setup.yaml
//! ```
//!
//! ```yaml
//! boards:
//!   - name: b1
//!     type: dds
//!     address: 7
//!     parameters: { clock_mhz: 1000 }
//! actions:
//!   - name: heat
//!     type: heater
//!     board: b1
//!     variables: { temp: "target, C", duration: "seconds" }
//!     var_formats: { temp: float }
//!     categories: [thermal]
//! ```
//!
//! The file is only ever read. Registry state is not written back.
//!
//! # API pattern
//!
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::types::{ActionName, BoardName, Mapping};

/// A board to register, with its type named by catalog key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDecl {
    pub name: BoardName,
    #[serde(rename = "type")]
    pub board_type: String,
    pub address: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Mapping>,
    #[serde(default)]
    pub comment: String,
}

/// An action or ramp to register, with its type named by catalog key.
///
/// `parameters` and `variables` are kept as raw values so a malformed entry
/// reaches the registry, which reports it and falls back to an empty mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDecl {
    pub name: ActionName,
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<BoardName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    #[serde(default)]
    pub var_formats: IndexMap<String, String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub comment: String,
}

/// Root of `setup.yaml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetupFile {
    #[serde(default)]
    pub boards: Vec<BoardDecl>,
    #[serde(default)]
    pub actions: Vec<ActionDecl>,
}

impl SetupFile {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// `<home>/.labrun/setup.yaml`, pure, no I/O.
pub fn setup_path_at(home: &Path) -> PathBuf {
    home.join(".labrun").join("setup.yaml")
}

/// `setup_path_at` convenience wrapper.
pub fn setup_path() -> Result<PathBuf, ConfigError> {
    Ok(setup_path_at(&home()?))
}

/// Load `<home>/.labrun/setup.yaml`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with path)
/// if malformed.
pub fn load_setup_at(home: &Path) -> Result<SetupFile, ConfigError> {
    let path = setup_path_at(home);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    let setup: SetupFile = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.clone(),
        source: e,
    })?;
    tracing::debug!(
        path = %path.display(),
        boards = setup.boards.len(),
        actions = setup.actions.len(),
        "loaded setup file"
    );
    Ok(setup)
}

/// `load_setup_at` convenience wrapper.
pub fn load_setup() -> Result<SetupFile, ConfigError> {
    load_setup_at(&home()?)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn write_setup(home: &TempDir, contents: &str) {
        let path = setup_path_at(home.path());
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, contents).expect("write");
    }

    #[test]
    fn setup_path_is_correct() {
        let home = TempDir::new().expect("tempdir");
        assert!(setup_path_at(home.path()).ends_with(".labrun/setup.yaml"));
    }

    #[test]
    fn load_missing_setup_returns_not_found() {
        let home = TempDir::new().expect("tempdir");
        let err = load_setup_at(home.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    }

    #[test]
    fn load_full_setup() {
        let home = TempDir::new().expect("tempdir");
        write_setup(
            &home,
            r#"
boards:
  - name: b1
    type: dds
    address: 7
    parameters: { clock_mhz: 1000 }
actions:
  - name: heat
    type: heater
    board: b1
    variables: { temp: "target", duration: "seconds" }
    var_formats: { temp: float }
    categories: [thermal]
"#,
        );
        let setup = load_setup_at(home.path()).expect("load");
        assert_eq!(setup.boards.len(), 1);
        assert_eq!(setup.boards[0].address, 7);
        assert_eq!(
            setup.boards[0].parameters.as_ref().and_then(|p| p.get("clock_mhz")),
            Some(&json!(1000))
        );
        let heat = &setup.actions[0];
        assert_eq!(heat.board, Some(BoardName::from("b1")));
        assert_eq!(heat.var_formats.get("temp").map(String::as_str), Some("float"));
        let vars: Vec<_> = heat
            .variables
            .as_ref()
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        assert_eq!(vars, vec!["temp", "duration"]);
    }

    #[test]
    fn malformed_variables_still_parse() {
        let setup = SetupFile::from_yaml_str(
            "actions:\n  - name: x\n    type: heater\n    variables: [a, b]\n",
        )
        .expect("parse");
        assert_eq!(setup.actions[0].variables, Some(json!(["a", "b"])));
    }

    #[test]
    fn corrupt_setup_returns_parse_error_with_path() {
        let home = TempDir::new().expect("tempdir");
        write_setup(&home, "boards: [unclosed\n");
        let err = load_setup_at(home.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains("setup.yaml"));
    }
}
