//! Session state and its transitions
//!
//! [`AppState`] is only changed through [`AppState::apply`], which takes the
//! old state and an [`Action`] and returns the new state.

use crate::file::{FileId, NewFile, SelectedFile};
use crate::output::MergeResult;
use serde::Serialize;

#[derive(Debug)]
pub enum Action {
    /// Append files in the given order; clears the error banner
    AddFiles(Vec<NewFile>),
    /// Remove one entry by identity; unknown ids are ignored
    RemoveFile(FileId),
    /// Store a finished merge
    MergeSucceeded {
        result: MergeResult,
        clear_files: bool,
    },
    /// Show a message in the error channel
    Failed(String),
    ClearError,
    /// Back to an empty session
    Reset,
}

#[derive(Debug, Default)]
pub struct AppState {
    files: Vec<SelectedFile>,
    result: Option<MergeResult>,
    error: Option<String>,
    next_id: u32,
}

/// Display data for one list entry
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileEntry {
    pub id: u32,
    pub name: String,
    pub media_type: String,
    pub size_bytes: usize,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    pub fn result(&self) -> Option<&MergeResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Ids the next `count` added files will receive
    pub fn upcoming_ids(&self, count: usize) -> Vec<FileId> {
        (self.next_id..).take(count).map(FileId).collect()
    }

    pub fn entries(&self) -> Vec<FileEntry> {
        self.files
            .iter()
            .map(|f| FileEntry {
                id: f.id().0,
                name: f.name().to_string(),
                media_type: f.media_type().to_string(),
                size_bytes: f.bytes().len(),
            })
            .collect()
    }

    pub fn apply(mut self, action: Action) -> Self {
        match action {
            Action::AddFiles(new_files) => {
                for file in new_files {
                    let id = FileId(self.next_id);
                    self.next_id += 1;
                    self.files.push(SelectedFile::new(id, file));
                }
                self.error = None;
            }
            Action::RemoveFile(id) => {
                self.files.retain(|f| f.id() != id);
            }
            Action::MergeSucceeded {
                result,
                clear_files,
            } => {
                self.result = Some(result);
                self.error = None;
                if clear_files {
                    self.files.clear();
                }
            }
            Action::Failed(message) => {
                self.error = Some(message);
            }
            Action::ClearError => {
                self.error = None;
            }
            Action::Reset => {
                // Ids keep counting so stale handles never match a new file
                return Self {
                    next_id: self.next_id,
                    ..Self::default()
                };
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergedBytes;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn new_file(name: &str) -> NewFile {
        NewFile::new(name, "application/pdf", name.as_bytes().to_vec())
    }

    fn names(state: &AppState) -> Vec<String> {
        state.files().iter().map(|f| f.name().to_string()).collect()
    }

    fn result() -> MergeResult {
        MergeResult::new(
            "merged.pdf".into(),
            MergedBytes {
                bytes: b"%PDF-1.7".to_vec(),
                page_count: 1,
            },
        )
    }

    #[test]
    fn test_add_appends_in_order_and_allows_duplicates() {
        let state = AppState::new()
            .apply(Action::AddFiles(vec![new_file("a.pdf"), new_file("b.pdf")]))
            .apply(Action::AddFiles(vec![new_file("a.pdf")]));

        assert_eq!(names(&state), vec!["a.pdf", "b.pdf", "a.pdf"]);
        let ids: Vec<u32> = state.files().iter().map(|f| f.id().0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_add_clears_error() {
        let state = AppState::new()
            .apply(Action::Failed("Select at least 1 file".into()))
            .apply(Action::AddFiles(vec![new_file("a.pdf")]));
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_remove_by_identity_keeps_duplicate() {
        let state = AppState::new().apply(Action::AddFiles(vec![
            new_file("a.pdf"),
            new_file("a.pdf"),
            new_file("b.pdf"),
        ]));
        let first = state.files()[0].id();

        let state = state.apply(Action::RemoveFile(first));
        assert_eq!(names(&state), vec!["a.pdf", "b.pdf"]);
        assert_ne!(state.files()[0].id(), first);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let state = AppState::new()
            .apply(Action::AddFiles(vec![new_file("a.pdf")]))
            .apply(Action::RemoveFile(FileId(99)));
        assert_eq!(names(&state), vec!["a.pdf"]);
    }

    #[test]
    fn test_merge_success_keeps_files_by_default() {
        let state = AppState::new()
            .apply(Action::AddFiles(vec![new_file("a.pdf")]))
            .apply(Action::Failed("old".into()))
            .apply(Action::MergeSucceeded {
                result: result(),
                clear_files: false,
            });
        assert_eq!(state.files().len(), 1);
        assert!(state.result().is_some());
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_merge_success_can_clear_files() {
        let state = AppState::new()
            .apply(Action::AddFiles(vec![new_file("a.pdf")]))
            .apply(Action::MergeSucceeded {
                result: result(),
                clear_files: true,
            });
        assert!(state.files().is_empty());
        assert!(state.result().is_some());
    }

    #[test]
    fn test_reset_keeps_id_counter() {
        let state = AppState::new()
            .apply(Action::AddFiles(vec![new_file("a.pdf"), new_file("b.pdf")]))
            .apply(Action::Reset)
            .apply(Action::AddFiles(vec![new_file("c.pdf")]));
        assert_eq!(state.files()[0].id(), FileId(2));
        assert!(state.result().is_none());
    }

    #[test]
    fn test_upcoming_ids_match_assignment() {
        let state = AppState::new().apply(Action::AddFiles(vec![new_file("a.pdf")]));
        let expected = state.upcoming_ids(2);
        let state = state.apply(Action::AddFiles(vec![new_file("b.pdf"), new_file("c.pdf")]));
        let assigned: Vec<FileId> = state.files()[1..].iter().map(|f| f.id()).collect();
        assert_eq!(assigned, expected);
    }

    proptest! {
        /// Removing one entry leaves every other entry in place and in order
        #[test]
        fn removal_preserves_others(count in 1usize..12, pick in any::<prop::sample::Index>()) {
            let files = (0..count).map(|i| new_file(&format!("{}.pdf", i))).collect();
            let state = AppState::new().apply(Action::AddFiles(files));
            let before: Vec<FileId> = state.files().iter().map(|f| f.id()).collect();
            let target = before[pick.index(count)];

            let state = state.apply(Action::RemoveFile(target));
            let after: Vec<FileId> = state.files().iter().map(|f| f.id()).collect();
            let expected: Vec<FileId> = before.iter().copied().filter(|&id| id != target).collect();
            prop_assert_eq!(&after, &expected);

            // Removing again changes nothing
            let state = state.apply(Action::RemoveFile(target));
            let again: Vec<FileId> = state.files().iter().map(|f| f.id()).collect();
            prop_assert_eq!(again, expected);
        }
    }
}
