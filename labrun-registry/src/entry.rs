//! Registry entries and the views handed out to callers.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use labrun_core::{
    ActionKind, ActionName, Invocation, Mapping, Operation, Program, RegistryError, SharedBoard,
    SharedQueue,
};

/// Transform expression every variable starts with.
pub const IDENTITY_FUNCTION: &str = "x";

/// Implicit variable every entry carries a transform for.
pub const TIME_VARIABLE: &str = "time";

pub type ActionHandler =
    Arc<dyn Fn(Invocation) -> Result<Box<dyn Operation>, RegistryError> + Send + Sync>;

pub type ProgramHandler = Arc<
    dyn Fn(Program, SharedQueue, Invocation) -> Result<Box<dyn Operation>, RegistryError>
        + Send
        + Sync,
>;

/// Produces a program's command description from the system's queue.
pub type CommandGenerator = Arc<dyn Fn(&SharedQueue) -> Value + Send + Sync>;

/// Invocation adapter stored with an entry.
#[derive(Clone)]
pub enum Handler {
    /// Turns runtime arguments into an action or ramp instance.
    Action(ActionHandler),
    /// Receives a fresh program and the command queue ahead of the arguments.
    Program(ProgramHandler),
}

impl Handler {
    pub fn action<F>(f: F) -> Self
    where
        F: Fn(Invocation) -> Result<Box<dyn Operation>, RegistryError> + Send + Sync + 'static,
    {
        Handler::Action(Arc::new(f))
    }

    pub fn program<F>(f: F) -> Self
    where
        F: Fn(Program, SharedQueue, Invocation) -> Result<Box<dyn Operation>, RegistryError>
            + Send
            + Sync
            + 'static,
    {
        Handler::Program(Arc::new(f))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Action(_) => f.write_str("Handler::Action(..)"),
            Handler::Program(_) => f.write_str("Handler::Program(..)"),
        }
    }
}

/// Execution-time bookkeeping owned by schedulers. The only part of an entry
/// that changes after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub time: Option<f64>,
    pub time_rel: Option<f64>,
    pub enable: bool,
    pub funct_enable: bool,
    /// Variable name (plus `"time"`) to transform expression.
    pub functions: IndexMap<String, String>,
}

impl Schedule {
    pub(crate) fn for_variables(variables: &Mapping) -> Self {
        let functions = variables
            .keys()
            .map(String::as_str)
            .chain(std::iter::once(TIME_VARIABLE))
            .map(|var| (var.to_owned(), IDENTITY_FUNCTION.to_owned()))
            .collect();
        Self {
            time: None,
            time_rel: None,
            enable: true,
            funct_enable: true,
            functions,
        }
    }
}

/// One registered action, ramp or program.
pub struct RegistryEntry {
    pub(crate) name: ActionName,
    pub(crate) kind: ActionKind,
    pub(crate) handler: Handler,
    pub(crate) vars: Mapping,
    pub(crate) var_formats: IndexMap<String, String>,
    pub(crate) pars: Mapping,
    pub(crate) board: Option<SharedBoard>,
    pub(crate) comment: String,
    pub(crate) categories: Vec<String>,
    pub(crate) cmd: Option<CommandGenerator>,
    pub(crate) schedule: Schedule,
}

impl RegistryEntry {
    pub fn name(&self) -> &ActionName {
        &self.name
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn is_subprg(&self) -> bool {
        self.kind.is_subprogram()
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn vars(&self) -> &Mapping {
        &self.vars
    }

    pub fn var_formats(&self) -> &IndexMap<String, String> {
        &self.var_formats
    }

    pub fn pars(&self) -> &Mapping {
        &self.pars
    }

    pub fn board(&self) -> Option<&SharedBoard> {
        self.board.as_ref()
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn cmd(&self) -> Option<&CommandGenerator> {
        self.cmd.as_ref()
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Owned copy of the metadata with the handler left out and the board
    /// reduced to its name (`""` when unset).
    pub fn view(&self) -> EntryView {
        EntryView {
            name: self.name.clone(),
            kind: self.kind,
            vars: self.vars.clone(),
            var_formats: self.var_formats.clone(),
            pars: self.pars.clone(),
            board: self
                .board
                .as_ref()
                .map(|b| b.name().to_owned())
                .unwrap_or_default(),
            comment: self.comment.clone(),
            time: self.schedule.time,
            time_rel: self.schedule.time_rel,
            is_subprg: self.is_subprg(),
            enable: self.schedule.enable,
            categories: self.categories.clone(),
            functions: self.schedule.functions.clone(),
            funct_enable: self.schedule.funct_enable,
            has_cmd: self.cmd.is_some(),
        }
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("vars", &self.vars)
            .field("pars", &self.pars)
            .field("board", &self.board.as_ref().map(|b| b.name().to_owned()))
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

/// Externally visible metadata of an entry. Owns all of its data, so editing
/// it never reaches back into the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryView {
    pub name: ActionName,
    pub kind: ActionKind,
    pub vars: Mapping,
    pub var_formats: IndexMap<String, String>,
    pub pars: Mapping,
    pub board: String,
    pub comment: String,
    pub time: Option<f64>,
    pub time_rel: Option<f64>,
    pub is_subprg: bool,
    pub enable: bool,
    pub categories: Vec<String>,
    pub functions: IndexMap<String, String>,
    pub funct_enable: bool,
    pub has_cmd: bool,
}
