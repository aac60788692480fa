//! # labrun-registry
//!
//! Name-based registries for boards and for actions, ramps and programs, plus
//! dispatch by name.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use labrun_core::{ActionType, Invocation, RegistryError, System, SystemHandle};
//! use labrun_registry::{ActionList, BoardList, Registration};
//!
//! fn run(system: &Arc<dyn System>, heater: Arc<dyn ActionType>) -> Result<(), RegistryError> {
//!     let boards = BoardList::new();
//!     let mut actions = ActionList::new(SystemHandle::attach(system));
//!     actions.add(
//!         &boards,
//!         Registration::new("heat", heater)
//!             .variables(serde_json::json!({ "temp": "C", "duration": "s" }))
//!             .var_format("temp", "float"),
//!     )?;
//!     let op = actions.get("heat", Invocation::positional(["50", "3"]))?;
//!     println!("built {}", op.name());
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod board;
pub mod entry;
pub mod handler;
pub mod setup;

pub use action::{ActionList, Registered, Registration};
pub use board::BoardList;
pub use entry::{
    ActionHandler, CommandGenerator, EntryView, Handler, ProgramHandler, RegistryEntry, Schedule,
};
pub use setup::{apply_setup, SetupReport, TypeCatalog};
