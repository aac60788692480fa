//! Default invocation adapter for actions and ramps registered without a handler.
//!
//! Binding is an explicit, ordered merge:
//!
//! 1. keyword arguments
//! 2. positional arguments zipped onto the declared variables, when their count
//!    matches the declaration exactly
//! 3. fixed parameters, which override anything bound above
//!
//! `name` and `board` are never loose values; they travel as dedicated fields of
//! [`ActionArgs`], and caller keywords under those names are discarded. Formats
//! are applied after the merge.

use std::sync::Arc;

use indexmap::IndexMap;

use labrun_core::{
    ActionArgs, ActionName, ActionType, FormatParser, Invocation, Mapping, Operation,
    RegistryError, SharedBoard, SystemHandle,
};

use crate::entry::ActionHandler;

/// Keys carried by dedicated [`ActionArgs`] fields.
const RESERVED_KEYS: [&str; 2] = ["name", "board"];

/// Declared shape an invocation binds against.
#[derive(Debug, Clone, Copy)]
pub struct Schema<'a> {
    pub name: &'a ActionName,
    pub variables: &'a Mapping,
    pub parameters: &'a Mapping,
    pub board: Option<&'a SharedBoard>,
}

/// Result of binding: the argument record, plus a count mismatch if one was
/// detected. A mismatch does not stop the binding.
#[derive(Debug)]
pub struct Bound {
    pub args: ActionArgs,
    pub mismatch: Option<RegistryError>,
}

pub fn bind_arguments(schema: &Schema<'_>, invocation: Invocation) -> Bound {
    let Invocation { args, kwargs } = invocation;
    let positional = args.len();
    let expected = schema.variables.len();

    let mut values = kwargs;
    for key in RESERVED_KEYS {
        if values.remove(key).is_some() {
            tracing::warn!(action = %schema.name, key, "ignoring reserved keyword argument");
        }
    }
    let keyword = values.len();

    let mut mismatch = None;
    if positional == expected {
        for (variable, value) in schema.variables.keys().zip(args) {
            values.insert(variable.clone(), value);
        }
    } else if keyword != expected {
        mismatch = Some(RegistryError::ArgumentCountMismatch {
            action: schema.name.to_string(),
            expected: schema.variables.keys().cloned().collect(),
            positional,
            keyword,
        });
    }

    for (key, value) in schema.parameters {
        values.insert(key.clone(), value.clone());
    }

    Bound {
        args: ActionArgs {
            name: schema.name.clone(),
            board: schema.board.cloned(),
            values,
        },
        mismatch,
    }
}

/// Replace every formatted variable in `values` with its coerced value.
pub fn apply_formats(
    action: &ActionName,
    values: &mut Mapping,
    formats: &IndexMap<String, String>,
    parser: &dyn FormatParser,
) -> Result<(), RegistryError> {
    for (variable, format) in formats {
        let coerce = parser.fmt_to_type(format)?;
        let value = values
            .get_mut(variable)
            .ok_or_else(|| RegistryError::UnboundVariable {
                action: action.to_string(),
                variable: variable.clone(),
            })?;
        let converted = coerce(value).map_err(|source| RegistryError::Coercion {
            variable: variable.clone(),
            format: format.clone(),
            source,
        })?;
        *value = converted;
    }
    Ok(())
}

/// Everything the synthesized adapter closes over.
pub(crate) struct DefaultHandler {
    pub name: ActionName,
    pub action_type: Arc<dyn ActionType>,
    pub variables: Mapping,
    pub var_formats: IndexMap<String, String>,
    pub parameters: Mapping,
    pub board: Option<SharedBoard>,
    pub system: SystemHandle,
}

impl DefaultHandler {
    fn call(&self, invocation: Invocation) -> Result<Box<dyn Operation>, RegistryError> {
        let system = self.system.upgrade()?;
        let schema = Schema {
            name: &self.name,
            variables: &self.variables,
            parameters: &self.parameters,
            board: self.board.as_ref(),
        };
        let Bound { mut args, mismatch } = bind_arguments(&schema, invocation);
        if let Some(err) = mismatch {
            tracing::warn!(action = %self.name, error = %err, "argument count mismatch");
        }
        apply_formats(&self.name, &mut args.values, &self.var_formats, system.parser())?;
        self.action_type.instantiate(system, args)
    }

    pub fn into_handler(self) -> ActionHandler {
        Arc::new(move |invocation| self.call(invocation))
    }
}
