use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::app::Editor;
use crate::error::{EditorError, ProjectError};
use crate::io;

/// Single open board.
#[derive(Debug)]
pub struct Project {
    pub id: Uuid,
    pub editor: Editor,
    /// `None` for unsaved/untitled boards.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,

    /// Display name (derived from path or "Untitled-X")
    pub name: String,
}

impl Project {
    pub fn new_untitled(untitled_counter: usize, width: u32, height: u32) -> Result<Self, EditorError> {
        Ok(Self {
            id: Uuid::new_v4(),
            editor: Editor::new(width, height)?,
            path: None,
            is_dirty: false,
            name: format!("Untitled-{}", untitled_counter),
        })
    }

    pub fn from_editor(path: PathBuf, editor: Editor) -> Self {
        let mut project = Self {
            id: Uuid::new_v4(),
            editor,
            path: Some(path),
            is_dirty: false,
            name: String::new(),
        };
        project.update_name_from_path();
        project
    }

    /// Open a `.dbp` or `.json` project.
    pub fn open(path: &Path) -> Result<Self, ProjectError> {
        let editor = io::load_project(path)?;
        Ok(Self::from_editor(path.to_path_buf(), editor))
    }

    /// Save to the current path. Untitled projects need [`Project::save_as`].
    pub fn save(&mut self) -> Result<(), ProjectError> {
        let Some(path) = self.path.clone() else {
            return Err(ProjectError::InvalidFormat("Project has no file path".into()));
        };
        io::save_project(&self.editor, &path)?;
        self.mark_clean();
        Ok(())
    }

    pub fn save_as(&mut self, path: PathBuf) -> Result<(), ProjectError> {
        io::save_project(&self.editor, &path)?;
        self.path = Some(path);
        self.update_name_from_path();
        self.mark_clean();
        Ok(())
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn update_name_from_path(&mut self) {
        if let Some(path) = &self.path {
            self.name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
        }
    }

    /// Name with a trailing `*` when there are unsaved changes.
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::colors::Color;

    #[test]
    fn untitled_naming_and_dirty_marker() {
        let mut project = Project::new_untitled(3, 10, 5).unwrap();
        assert_eq!(project.display_title(), "Untitled-3");
        project.mark_dirty();
        assert_eq!(project.display_title(), "Untitled-3*");
        assert!(project.save().is_err());
    }

    #[test]
    fn save_as_then_open() {
        let path = std::env::temp_dir().join(format!("dotboard_{}.json", Uuid::new_v4()));
        let mut project = Project::new_untitled(1, 6, 6).unwrap();
        project.editor.select_color(Color::Lime);
        project.editor.begin_stroke(2, 3);
        project.mark_dirty();

        project.save_as(path.clone()).unwrap();
        assert!(!project.is_dirty);
        assert!(project.name.ends_with(".json"));

        let reopened = Project::open(&path).unwrap();
        assert_eq!(reopened.editor.artboard(), project.editor.artboard());
        assert_ne!(reopened.id, project.id);
        let _ = std::fs::remove_file(&path);
    }
}
