//! Script sources and sinks outside the core: loading script directories,
//! reading snapshots, and running scripts.

mod connector;
mod script_loader;

pub use connector::{split_batches, SchemaSource, ScriptDirectorySource, ScriptExecutor};
pub use script_loader::{
    find_script_files, load_scripts, load_scripts_excluding, read_script_file,
    script_type_for_directory,
};
