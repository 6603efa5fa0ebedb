mod capability_forms;
mod functions;
mod namespace;
mod record_functions;
mod special_forms;
mod type_forms;

pub use namespace::builtins;
