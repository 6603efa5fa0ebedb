pub mod callables;
pub mod coercions;
pub mod compounds;
pub mod errors;
pub mod expressions;
pub mod records;
pub mod types;
pub mod values;
pub mod variables;

pub use callables::*;
pub use compounds::*;
pub use errors::*;
pub use expressions::*;
pub use records::*;
pub use types::*;
pub use values::*;
pub use variables::*;
