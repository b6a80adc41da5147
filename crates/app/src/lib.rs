#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod editor;
pub mod log;
pub mod service;
pub mod settings;

pub use editor::{EditorError, PerformanceEditor, State};
pub use service::Service;
pub use settings::{Settings, SettingsRepository, SettingsService, WeightUnit};
