//! Support services: image I/O, output formats, naming, progress reporting

pub mod format;
pub mod io;
pub mod naming;
pub mod progress;

pub use format::OutputFormatHandler;
pub use io::{ImageIoService, SourceInfo};
pub use naming::{apply_pattern, auto_save_name, resolve_collision};
pub use progress::{
    blend_overall, ConsoleProgressReporter, NoOpProgressReporter, ProgressReporter, ProgressUpdate,
};
