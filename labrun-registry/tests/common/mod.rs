//! Shared fixtures: a recording system, a board type and configurable action types.

#![allow(dead_code)]

use std::any::Any;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use labrun_core::{
    ActionArgs, ActionType, Board, BoardParams, BoardType, Capabilities, CommandQueue,
    FormatParser, Operation, RegistryError, SharedBoard, SharedQueue, StandardParser, System,
    SystemHandle,
};
use labrun_registry::{ActionList, BoardList};

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingQueue {
    pub submitted: Mutex<Vec<Value>>,
}

impl CommandQueue for RecordingQueue {
    fn submit(&self, command: Value) {
        self.submitted.lock().expect("queue lock").push(command);
    }
}

#[derive(Default)]
pub struct TestSystem {
    pub queue: Arc<RecordingQueue>,
    parser: StandardParser,
}

impl System for TestSystem {
    fn command_queue(&self) -> SharedQueue {
        self.queue.clone()
    }

    fn parser(&self) -> &dyn FormatParser {
        &self.parser
    }
}

/// A live system plus its concrete handle for inspecting the queue.
pub fn system() -> (Arc<TestSystem>, Arc<dyn System>) {
    let concrete = Arc::new(TestSystem::default());
    let system: Arc<dyn System> = concrete.clone();
    (concrete, system)
}

pub fn registries(system: &Arc<dyn System>) -> (BoardList, ActionList) {
    labrun_core::logging::init_tracing();
    (BoardList::new(), ActionList::new(SystemHandle::attach(system)))
}

// ---------------------------------------------------------------------------
// Boards
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct TestBoard(pub BoardParams);

impl Board for TestBoard {
    fn name(&self) -> &str {
        &self.0.name.0
    }

    fn address(&self) -> i64 {
        self.0.address
    }

    fn comment(&self) -> &str {
        &self.0.comment
    }
}

pub struct TestBoardType;

impl BoardType for TestBoardType {
    fn type_name(&self) -> &str {
        "test-board"
    }

    fn instantiate(&self, params: BoardParams) -> Result<SharedBoard, RegistryError> {
        Ok(Arc::new(TestBoard(params)))
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// What a [`TestActionType`] builds: the arguments it was constructed with.
#[derive(Debug)]
pub struct Built {
    pub type_name: &'static str,
    pub args: ActionArgs,
}

impl Operation for Built {
    fn name(&self) -> &str {
        &self.args.name.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct TestActionType {
    pub type_name: &'static str,
    pub capabilities: Capabilities,
}

impl ActionType for TestActionType {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn instantiate(
        &self,
        _system: Arc<dyn System>,
        args: ActionArgs,
    ) -> Result<Box<dyn Operation>, RegistryError> {
        Ok(Box::new(Built {
            type_name: self.type_name,
            args,
        }))
    }
}

fn action_type_with(type_name: &'static str, capabilities: Capabilities) -> Arc<dyn ActionType> {
    Arc::new(TestActionType {
        type_name,
        capabilities,
    })
}

pub fn action_type() -> Arc<dyn ActionType> {
    action_type_with("heater", Capabilities::ACTION)
}

pub fn ramp_type() -> Arc<dyn ActionType> {
    action_type_with("sweep", Capabilities::RAMP)
}

pub fn program_type() -> Arc<dyn ActionType> {
    action_type_with("sequence", Capabilities::PROGRAM)
}

pub fn unrecognized_type() -> Arc<dyn ActionType> {
    action_type_with("detector", Capabilities::BOARD)
}

pub fn built(op: &dyn Operation) -> &Built {
    op.as_any()
        .downcast_ref::<Built>()
        .expect("operation built by TestActionType")
}
