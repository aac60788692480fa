//! Action registry: actions, ramps and programs keyed by name.
//!
//! # Namespaces
//!
//! Registration refuses a name already used by an action or a program, whatever
//! the kind being registered. Ramps are not part of that check, so an action or
//! program may still be added under a ramp's name. Lookups go through the merged
//! view (actions, then programs, then ramps, later ones shadowing earlier ones),
//! so the earlier ramp wins.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use labrun_core::{
    ActionKind, ActionName, ActionType, BoardName, Invocation, Mapping, Operation, Program,
    RegistryError, SharedBoard, SharedQueue, SystemHandle,
};

use crate::board::BoardList;
use crate::entry::{CommandGenerator, EntryView, Handler, RegistryEntry, Schedule};
use crate::handler::DefaultHandler;

/// Everything `ActionList::add` needs to register one entry.
pub struct Registration {
    name: ActionName,
    action_type: Arc<dyn ActionType>,
    board: Option<BoardName>,
    parameters: Option<Value>,
    variables: Option<Value>,
    var_formats: IndexMap<String, String>,
    handler: Option<Handler>,
    categories: Vec<String>,
    commands: Option<CommandGenerator>,
    comment: String,
}

impl Registration {
    pub fn new(name: impl ToString, action_type: Arc<dyn ActionType>) -> Self {
        Self {
            name: ActionName::from(name.to_string()),
            action_type,
            board: None,
            parameters: None,
            variables: None,
            var_formats: IndexMap::new(),
            handler: None,
            categories: Vec::new(),
            commands: None,
            comment: String::new(),
        }
    }

    pub fn board(mut self, board: impl Into<BoardName>) -> Self {
        self.board = Some(board.into());
        self
    }

    /// Fixed parameters merged into every invocation. Expected to be a JSON
    /// object; anything else is reported and replaced by an empty mapping.
    pub fn parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Variable name to default/description, in positional order. Same shape
    /// rule as [`Registration::parameters`].
    pub fn variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn var_format(mut self, variable: impl Into<String>, format: impl Into<String>) -> Self {
        self.var_formats.insert(variable.into(), format.into());
        self
    }

    pub fn var_formats<I, K, V>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.var_formats
            .extend(formats.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn commands<F>(mut self, commands: F) -> Self
    where
        F: Fn(&SharedQueue) -> Value + Send + Sync + 'static,
    {
        self.commands = Some(Arc::new(commands));
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Outcome of a successful registration.
#[derive(Debug)]
pub struct Registered {
    pub name: ActionName,
    pub kind: ActionKind,
    /// Tolerated problems found on the way (see [`RegistryError::is_tolerated`]).
    pub warnings: Vec<RegistryError>,
}

#[derive(Debug)]
pub struct ActionList {
    actions: HashMap<ActionName, RegistryEntry>,
    ramps: HashMap<ActionName, RegistryEntry>,
    programs: HashMap<ActionName, RegistryEntry>,
    system: SystemHandle,
}

impl ActionList {
    /// A detached handle is accepted; anything needing the system later fails
    /// with `RegistryError::SystemUnavailable`.
    pub fn new(system: SystemHandle) -> Self {
        if !system.is_attached() {
            tracing::warn!("action list created without an owning system");
        }
        Self {
            actions: HashMap::new(),
            ramps: HashMap::new(),
            programs: HashMap::new(),
            system,
        }
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    pub fn add(
        &mut self,
        boards: &BoardList,
        registration: Registration,
    ) -> Result<Registered, RegistryError> {
        let Registration {
            name,
            action_type,
            board,
            parameters,
            variables,
            var_formats,
            handler,
            categories,
            commands,
            comment,
        } = registration;

        if self.actions.contains_key(&name) || self.programs.contains_key(&name) {
            return Err(rejected(RegistryError::DuplicateName { name: name.0 }));
        }

        let mut warnings = Vec::new();
        let board = match board {
            Some(board_name) => match boards.get(&board_name.0) {
                Ok(board) => Some(board),
                Err(err) => {
                    warnings.push(err);
                    None
                }
            },
            None => None,
        };
        let parameters = mapping_or_empty(&name, "parameters", parameters, &mut warnings);
        let variables = mapping_or_empty(&name, "variables", variables, &mut warnings);

        let Some(kind) = action_type.capabilities().classify() else {
            return Err(rejected(RegistryError::UnrecognizedCapability {
                action: name.0,
                type_name: action_type.type_name().to_owned(),
            }));
        };

        let handler = match (kind, handler) {
            (ActionKind::Program, Some(handler @ Handler::Program(_)))
            | (ActionKind::Action | ActionKind::Ramp, Some(handler @ Handler::Action(_))) => {
                handler
            }
            (ActionKind::Program, None) => {
                return Err(rejected(RegistryError::MissingHandler { action: name.0 }));
            }
            (ActionKind::Action | ActionKind::Ramp, None) => Handler::Action(
                DefaultHandler {
                    name: name.clone(),
                    action_type,
                    variables: variables.clone(),
                    var_formats: var_formats.clone(),
                    parameters: parameters.clone(),
                    board: board.clone(),
                    system: self.system.clone(),
                }
                .into_handler(),
            ),
            (kind, Some(_)) => {
                return Err(rejected(RegistryError::HandlerMismatch {
                    action: name.0,
                    kind,
                }));
            }
        };

        let entry = RegistryEntry {
            name: name.clone(),
            kind,
            handler,
            schedule: Schedule::for_variables(&variables),
            vars: variables,
            var_formats,
            pars: parameters,
            board,
            comment,
            categories,
            cmd: commands,
        };
        self.registry_mut(kind).insert(name.clone(), entry);
        tracing::debug!(action = %name, %kind, warnings = warnings.len(), "registered");

        Ok(Registered {
            name,
            kind,
            warnings,
        })
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Invoke the entry registered under `name`.
    ///
    /// Actions and ramps get the invocation as is. Programs get a fresh
    /// [`Program`] bound to the system and the system's command queue first.
    pub fn get(
        &self,
        name: &str,
        invocation: Invocation,
    ) -> Result<Box<dyn Operation>, RegistryError> {
        let entry = self.lookup(name)?;
        let result = match entry.handler() {
            Handler::Action(call) => call(invocation),
            Handler::Program(call) => {
                let system = self.system.upgrade()?;
                let queue = system.command_queue();
                let program = Program::new(system, entry.name().clone());
                call(program, queue, invocation)
            }
        };
        result.map_err(|err| {
            tracing::warn!(action = %name, error = %err, "dispatch failed");
            err
        })
    }

    /// Command description of a program.
    ///
    /// `Ok(None)` for anything that is not a program with a command generator,
    /// unknown names included.
    pub fn get_cmd(&self, name: &str) -> Result<Option<Value>, RegistryError> {
        let Some(cmd) = self.programs.get(name).and_then(RegistryEntry::cmd) else {
            return Ok(None);
        };
        let queue = self.system.upgrade()?.command_queue();
        Ok(Some(cmd(&queue)))
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn is_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn is_program(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn is_ramp(&self, name: &str) -> bool {
        self.ramps.contains_key(name)
    }

    /// Merged read-only view of all three registries.
    pub fn tot_list(&self) -> BTreeMap<&str, &RegistryEntry> {
        self.actions
            .iter()
            .chain(&self.programs)
            .chain(&self.ramps)
            .map(|(name, entry)| (name.0.as_str(), entry))
            .collect()
    }

    /// Every registered name, sorted, each listed once.
    pub fn names(&self) -> Vec<&str> {
        self.tot_list().into_keys().collect()
    }

    pub fn get_vars(&self, name: &str) -> Result<&Mapping, RegistryError> {
        self.lookup(name).map(RegistryEntry::vars)
    }

    pub fn get_pars(&self, name: &str) -> Result<&Mapping, RegistryError> {
        self.lookup(name).map(RegistryEntry::pars)
    }

    /// Owned copy of an entry's metadata, safe to edit.
    pub fn get_dict(&self, name: &str) -> Result<EntryView, RegistryError> {
        self.lookup(name).map(RegistryEntry::view)
    }

    pub fn board_of(&self, name: &str) -> Result<Option<&SharedBoard>, RegistryError> {
        self.lookup(name).map(RegistryEntry::board)
    }

    pub fn schedule(&self, name: &str) -> Option<&Schedule> {
        self.lookup(name).ok().map(RegistryEntry::schedule)
    }

    /// Scheduler access to the bookkeeping of an entry. Identity fields stay
    /// out of reach.
    pub fn schedule_mut(&mut self, name: &str) -> Option<&mut Schedule> {
        let kind = self.resolve(name)?;
        self.registry_mut(kind)
            .get_mut(name)
            .map(|entry| &mut entry.schedule)
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Registry the merged view takes `name` from.
    fn resolve(&self, name: &str) -> Option<ActionKind> {
        if self.ramps.contains_key(name) {
            Some(ActionKind::Ramp)
        } else if self.programs.contains_key(name) {
            Some(ActionKind::Program)
        } else if self.actions.contains_key(name) {
            Some(ActionKind::Action)
        } else {
            None
        }
    }

    fn registry(&self, kind: ActionKind) -> &HashMap<ActionName, RegistryEntry> {
        match kind {
            ActionKind::Action => &self.actions,
            ActionKind::Ramp => &self.ramps,
            ActionKind::Program => &self.programs,
        }
    }

    fn registry_mut(&mut self, kind: ActionKind) -> &mut HashMap<ActionName, RegistryEntry> {
        match kind {
            ActionKind::Action => &mut self.actions,
            ActionKind::Ramp => &mut self.ramps,
            ActionKind::Program => &mut self.programs,
        }
    }

    fn lookup(&self, name: &str) -> Result<&RegistryEntry, RegistryError> {
        self.resolve(name)
            .and_then(|kind| self.registry(kind).get(name))
            .ok_or_else(|| {
                let err = RegistryError::ActionNotFound {
                    name: name.to_owned(),
                };
                tracing::error!(error = %err, "lookup failed");
                err
            })
    }
}

fn rejected(err: RegistryError) -> RegistryError {
    tracing::error!(error = %err, "registration rejected");
    err
}

/// Absent or null becomes an empty mapping; a non-mapping is reported and
/// replaced by an empty mapping.
fn mapping_or_empty(
    action: &ActionName,
    field: &'static str,
    value: Option<Value>,
    warnings: &mut Vec<RegistryError>,
) -> Mapping {
    match value {
        None | Some(Value::Null) => Mapping::new(),
        Some(Value::Object(mapping)) => mapping,
        Some(_) => {
            let err = RegistryError::InvalidParameterShape {
                action: action.to_string(),
                field,
            };
            tracing::warn!(error = %err, "ignoring malformed definition");
            warnings.push(err);
            Mapping::new()
        }
    }
}
