//! The program instance handed to a program handler at dispatch time.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::capability::{Operation, System};
use crate::types::ActionName;

/// A fresh, empty program bound to its system. Program handlers receive one of
/// these per dispatch and build the program's steps on it.
pub struct Program {
    name: ActionName,
    system: Arc<dyn System>,
}

impl Program {
    pub fn new(system: Arc<dyn System>, name: impl Into<ActionName>) -> Self {
        Self {
            name: name.into(),
            system,
        }
    }

    pub fn system(&self) -> &Arc<dyn System> {
        &self.system
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Operation for Program {
    fn name(&self) -> &str {
        &self.name.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
