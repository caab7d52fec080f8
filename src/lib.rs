//! Sparse dot-grid pixel-art editor core.
//!
//! The artboard is an unbounded sparse map of palette colors viewed through a
//! fixed-size, pannable viewport. [`app::Editor`] owns one board together with
//! its undo history, tool selection and background-preview state; the
//! [`io`] module persists boards and renders them, and [`cli`] drives the
//! whole pipeline headlessly.

#[macro_use]
pub mod logger;
pub mod app;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod error;
pub mod io;
pub mod ops;
pub mod project;
pub mod settings;

pub use app::Editor;
pub use canvas::{Artboard, CanvasState, Coord, DenseGrid, Viewport};
pub use components::colors::{Color, PALETTE};
pub use error::{EditorError, ProjectError};
pub use project::Project;
