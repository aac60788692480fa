//! labrun core library: names, runtime values, collaborator traits, errors.
//!
//! - [`types`]: newtypes, [`Invocation`], [`ActionKind`]
//! - [`capability`]: traits the registries consume ([`System`], [`BoardType`], [`ActionType`], ...)
//! - [`format`]: format string to coercion lookup
//! - [`program`]: the program instance handed to program handlers
//! - [`config`]: setup file loading
//! - [`error`]: [`RegistryError`], [`ConfigError`]

pub mod capability;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod program;
pub mod types;

pub use capability::{
    ActionArgs, ActionType, Board, BoardParams, BoardType, Capabilities, CommandQueue, Operation,
    SharedBoard, SharedQueue, System, SystemHandle,
};
pub use error::{CoerceError, ConfigError, RegistryError};
pub use format::{Coercion, FormatParser, StandardParser};
pub use program::Program;
pub use types::{ActionKind, ActionName, BoardName, Invocation, Mapping};
