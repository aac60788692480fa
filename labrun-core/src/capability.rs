//! Collaborator interfaces the registries consume.
//!
//! The registries never name concrete system, board or action types. They see
//! trait objects that advertise a [`Capabilities`] set, and classify them once
//! at registration time.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;

use crate::error::RegistryError;
use crate::format::FormatParser;
use crate::types::{ActionKind, ActionName, BoardName, Mapping};

bitflags::bitflags! {
    /// What a registrable type can be used as.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// An addressed hardware device.
        const BOARD = 1 << 0;
        /// An atomic, immediately invocable operation.
        const ACTION = 1 << 1;
        /// A parameterized sweep, dispatched like an action.
        const RAMP = 1 << 2;
        /// A composite sequence built by a handler.
        const PROGRAM = 1 << 3;
    }
}

impl Capabilities {
    /// Registry kind for an action type, or `None` if it is none of the three.
    ///
    /// Ramp wins over action, and both win over program.
    pub fn classify(self) -> Option<ActionKind> {
        if self.contains(Capabilities::RAMP) {
            Some(ActionKind::Ramp)
        } else if self.contains(Capabilities::ACTION) {
            Some(ActionKind::Action)
        } else if self.contains(Capabilities::PROGRAM) {
            Some(ActionKind::Program)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Execution channel owned by the system. Program handlers and command
/// generators receive a shared handle to it.
pub trait CommandQueue: Send + Sync {
    fn submit(&self, command: Value);
}

pub type SharedQueue = Arc<dyn CommandQueue>;

/// The owning context of an action registry.
pub trait System: Send + Sync {
    fn command_queue(&self) -> SharedQueue;
    fn parser(&self) -> &dyn FormatParser;
}

/// Non-owning link from a registry back to its system.
///
/// Held as a `Weak` so a system may own its registry without a reference
/// cycle. Whether the link is live is only checked when something needs it.
#[derive(Clone, Default)]
pub struct SystemHandle(Option<Weak<dyn System>>);

impl SystemHandle {
    pub fn detached() -> Self {
        Self(None)
    }

    pub fn attach(system: &Arc<dyn System>) -> Self {
        Self(Some(Arc::downgrade(system)))
    }

    /// For owners built with `Arc::new_cyclic`.
    pub fn from_weak(system: Weak<dyn System>) -> Self {
        Self(Some(system))
    }

    pub fn is_attached(&self) -> bool {
        self.0.is_some()
    }

    pub fn upgrade(&self) -> Result<Arc<dyn System>, RegistryError> {
        self.0
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(RegistryError::SystemUnavailable)
    }
}

impl fmt::Debug for SystemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.0 {
            None => "detached",
            Some(weak) if weak.strong_count() > 0 => "live",
            Some(_) => "dropped",
        };
        f.debug_tuple("SystemHandle").field(&state).finish()
    }
}

// ---------------------------------------------------------------------------
// Boards
// ---------------------------------------------------------------------------

pub trait Board: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    fn address(&self) -> i64;
    fn comment(&self) -> &str;
}

pub type SharedBoard = Arc<dyn Board>;

/// Constructor arguments for a board instance.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardParams {
    pub name: BoardName,
    pub address: i64,
    pub comment: String,
    /// Type-specific parameters.
    pub extra: Mapping,
}

/// A board type that the board registry can instantiate.
pub trait BoardType: Send + Sync {
    fn type_name(&self) -> &str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::BOARD
    }

    fn instantiate(&self, params: BoardParams) -> Result<SharedBoard, RegistryError>;
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// An instantiated action, ramp or program.
pub trait Operation: fmt::Debug + Send {
    fn name(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

/// Keyword arguments an action type is constructed from.
#[derive(Debug, Clone)]
pub struct ActionArgs {
    pub name: ActionName,
    pub board: Option<SharedBoard>,
    /// Bound variables and fixed parameters.
    pub values: Mapping,
}

impl ActionArgs {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn board_name(&self) -> Option<&str> {
        self.board.as_deref().map(Board::name)
    }
}

/// A type that can be registered in the action registry.
pub trait ActionType: Send + Sync {
    fn type_name(&self) -> &str;
    fn capabilities(&self) -> Capabilities;
    fn instantiate(
        &self,
        system: Arc<dyn System>,
        args: ActionArgs,
    ) -> Result<Box<dyn Operation>, RegistryError>;
}
