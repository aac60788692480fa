//! Board registry: board name to instantiated board.

use std::collections::BTreeMap;

use labrun_core::{
    BoardName, BoardParams, BoardType, Capabilities, Mapping, RegistryError, SharedBoard,
};

/// Boards are added once and never replaced or removed.
#[derive(Debug, Default)]
pub struct BoardList {
    boards: BTreeMap<BoardName, SharedBoard>,
}

impl BoardList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate `board_type` and store it under `board_name`.
    ///
    /// Returns `RegistryError::DuplicateBoard` (nothing stored) if the name is
    /// taken. A type that does not advertise the board capability is still
    /// instantiated; the returned warnings carry `RegistryError::WrongBoardType`.
    pub fn add(
        &mut self,
        board_name: impl ToString,
        board_type: &dyn BoardType,
        address: i64,
        parameters: Option<Mapping>,
        comment: impl Into<String>,
    ) -> Result<Vec<RegistryError>, RegistryError> {
        let name = BoardName::from(board_name.to_string());
        if self.boards.contains_key(&name) {
            let err = RegistryError::DuplicateBoard { name: name.0 };
            tracing::error!(error = %err, "board registration rejected");
            return Err(err);
        }

        let mut warnings = Vec::new();
        if !board_type.capabilities().contains(Capabilities::BOARD) {
            let err = RegistryError::WrongBoardType {
                board: name.to_string(),
                type_name: board_type.type_name().to_owned(),
            };
            tracing::warn!(error = %err, "board type check failed");
            warnings.push(err);
        }

        let board = board_type.instantiate(BoardParams {
            name: name.clone(),
            address,
            comment: comment.into(),
            extra: parameters.unwrap_or_default(),
        })?;
        tracing::debug!(board = %name, address, "registered board");
        self.boards.insert(name, board);
        Ok(warnings)
    }

    pub fn get(&self, board_name: &str) -> Result<SharedBoard, RegistryError> {
        self.boards.get(board_name).cloned().ok_or_else(|| {
            let err = RegistryError::BoardNotFound {
                name: board_name.to_owned(),
            };
            tracing::error!(error = %err, "board lookup failed");
            err
        })
    }

    pub fn contains(&self, board_name: &str) -> bool {
        self.boards.contains_key(board_name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&BoardName> {
        self.boards.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use labrun_core::Board;

    use super::*;

    #[derive(Debug)]
    struct Dds(BoardParams);

    impl Board for Dds {
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

    struct DdsType(Capabilities);

    impl BoardType for DdsType {
        fn type_name(&self) -> &str {
            "dds"
        }
        fn capabilities(&self) -> Capabilities {
            self.0
        }
        fn instantiate(&self, params: BoardParams) -> Result<SharedBoard, RegistryError> {
            Ok(Arc::new(Dds(params)))
        }
    }

    const DDS: DdsType = DdsType(Capabilities::BOARD);

    #[test]
    fn add_then_get() {
        let mut boards = BoardList::new();
        let params = json!({ "clock_mhz": 1000 }).as_object().cloned();
        let warnings = boards.add("b1", &DDS, 7, params, "main dds").expect("add");
        assert!(warnings.is_empty());

        let board = boards.get("b1").expect("get");
        assert_eq!(board.name(), "b1");
        assert_eq!(board.address(), 7);
        assert_eq!(board.comment(), "main dds");
        assert_eq!(boards.len(), 1);
    }

    /// Keeps the constructor arguments of the last board it built.
    #[derive(Default)]
    struct Recording(Mutex<Option<BoardParams>>);

    impl BoardType for Recording {
        fn type_name(&self) -> &str {
            "recording"
        }
        fn instantiate(&self, params: BoardParams) -> Result<SharedBoard, RegistryError> {
            *self.0.lock().expect("lock") = Some(params.clone());
            Ok(Arc::new(Dds(params)))
        }
    }

    #[test]
    fn constructor_receives_name_address_comment_and_parameters() {
        let recording = Recording::default();
        let mut boards = BoardList::new();
        let params = json!({ "clock_mhz": 1000, "channels": 4 }).as_object().cloned();
        boards.add(5, &recording, 12, params, "spare").expect("add");

        let seen = recording.0.lock().expect("lock").clone().expect("instantiated");
        assert_eq!(seen.name, BoardName::from("5"));
        assert_eq!(seen.address, 12);
        assert_eq!(seen.comment, "spare");
        assert_eq!(seen.extra.get("clock_mhz"), Some(&json!(1000)));
        assert_eq!(seen.extra.get("channels"), Some(&json!(4)));
    }

    #[test]
    fn absent_parameters_become_empty_mapping() {
        let recording = Recording::default();
        let mut boards = BoardList::new();
        boards.add("b1", &recording, 1, None, "").expect("add");
        let seen = recording.0.lock().expect("lock").clone().expect("instantiated");
        assert!(seen.extra.is_empty());
    }

    #[test]
    fn numeric_names_are_stringified() {
        let mut boards = BoardList::new();
        boards.add(3, &DDS, 1, None, "").expect("add");
        assert!(boards.contains("3"));
    }

    #[test]
    fn duplicate_board_is_rejected_without_mutation() {
        let mut boards = BoardList::new();
        boards.add("b1", &DDS, 7, None, "first").expect("add");
        let err = boards.add("b1", &DDS, 9, None, "second").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateBoard { .. }), "got: {err}");
        assert_eq!(boards.get("b1").expect("get").address(), 7);
    }

    #[test]
    fn wrong_board_type_warns_but_registers() {
        let mut boards = BoardList::new();
        let warnings = boards
            .add("b2", &DdsType(Capabilities::ACTION), 2, None, "")
            .expect("add");
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], RegistryError::WrongBoardType { .. }));
        assert!(boards.contains("b2"));
    }

    #[test]
    fn missing_board_is_an_error_value() {
        let boards = BoardList::new();
        let err = boards.get("nonexistent").unwrap_err();
        assert!(matches!(err, RegistryError::BoardNotFound { .. }));
        assert!(boards.is_empty());
    }
}
