//! Apply a [`SetupFile`] to the registries.
//!
//! Types are named in the file by string key and resolved through a
//! [`TypeCatalog`] the host fills in. Boards go first so actions can refer to
//! them. A bad entry is recorded in the report and the rest still applies.

use std::collections::HashMap;
use std::sync::Arc;

use labrun_core::config::SetupFile;
use labrun_core::{ActionType, BoardType, RegistryError};

use crate::action::{ActionList, Registration};
use crate::board::BoardList;

#[derive(Default)]
pub struct TypeCatalog {
    boards: HashMap<String, Arc<dyn BoardType>>,
    actions: HashMap<String, Arc<dyn ActionType>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_board_type(
        mut self,
        key: impl Into<String>,
        board_type: Arc<dyn BoardType>,
    ) -> Self {
        self.register_board_type(key, board_type);
        self
    }

    pub fn with_action_type(
        mut self,
        key: impl Into<String>,
        action_type: Arc<dyn ActionType>,
    ) -> Self {
        self.register_action_type(key, action_type);
        self
    }

    pub fn register_board_type(&mut self, key: impl Into<String>, board_type: Arc<dyn BoardType>) {
        self.boards.insert(key.into(), board_type);
    }

    pub fn register_action_type(
        &mut self,
        key: impl Into<String>,
        action_type: Arc<dyn ActionType>,
    ) {
        self.actions.insert(key.into(), action_type);
    }

    pub fn board_type(&self, key: &str) -> Result<Arc<dyn BoardType>, RegistryError> {
        self.boards.get(key).cloned().ok_or_else(|| unknown(key))
    }

    pub fn action_type(&self, key: &str) -> Result<Arc<dyn ActionType>, RegistryError> {
        self.actions.get(key).cloned().ok_or_else(|| unknown(key))
    }
}

fn unknown(key: &str) -> RegistryError {
    RegistryError::UnknownType {
        type_name: key.to_owned(),
    }
}

/// What happened to each declaration, keyed by board or action name.
#[derive(Debug, Default)]
pub struct SetupReport {
    pub registered: Vec<String>,
    pub rejected: Vec<(String, RegistryError)>,
    pub warnings: Vec<(String, RegistryError)>,
}

impl SetupReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.warnings.is_empty()
    }
}

pub fn apply_setup(
    setup: &SetupFile,
    catalog: &TypeCatalog,
    boards: &mut BoardList,
    actions: &mut ActionList,
) -> SetupReport {
    let mut report = SetupReport::default();

    for decl in &setup.boards {
        let name = decl.name.to_string();
        let added = catalog.board_type(&decl.board_type).and_then(|board_type| {
            boards.add(
                &name,
                board_type.as_ref(),
                decl.address,
                decl.parameters.clone(),
                decl.comment.clone(),
            )
        });
        match added {
            Ok(warnings) => {
                report
                    .warnings
                    .extend(warnings.into_iter().map(|w| (name.clone(), w)));
                report.registered.push(name);
            }
            Err(err) => report.rejected.push((name, err)),
        }
    }

    let boards = &*boards;
    for decl in &setup.actions {
        let name = decl.name.to_string();
        let added = catalog.action_type(&decl.action_type).and_then(|action_type| {
            let mut registration = Registration::new(&name, action_type)
                .var_formats(decl.var_formats.clone())
                .categories(decl.categories.clone())
                .comment(decl.comment.clone());
            if let Some(board) = &decl.board {
                registration = registration.board(board.clone());
            }
            if let Some(parameters) = &decl.parameters {
                registration = registration.parameters(parameters.clone());
            }
            if let Some(variables) = &decl.variables {
                registration = registration.variables(variables.clone());
            }
            actions.add(boards, registration)
        });
        match added {
            Ok(registered) => {
                report
                    .warnings
                    .extend(registered.warnings.into_iter().map(|w| (name.clone(), w)));
                report.registered.push(name);
            }
            Err(err) => report.rejected.push((name, err)),
        }
    }

    tracing::info!(
        registered = report.registered.len(),
        rejected = report.rejected.len(),
        warnings = report.warnings.len(),
        "applied setup file"
    );
    report
}
