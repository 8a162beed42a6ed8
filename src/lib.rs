//! Desktop viewer for batch academic-performance predictions.
//!
//! The data layer (`data`, `recommend`) is pure and UI-independent; `state`
//! holds the application state machine; `ui` and `app` are thin egui glue.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod recommend;
pub mod scorer;
pub mod state;
pub mod ui;
