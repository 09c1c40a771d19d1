//! Working directory access: filename rules, change detection, and the
//! allow-listed command runner that produces files.

mod files;
mod path;
mod runner;

pub use files::WorkspaceSnapshot;
pub use path::{secure_path, validate_file_type, PathError, ALLOWED_EXTENSIONS};
pub use runner::{CommandError, CommandOutput, CommandRunner};
