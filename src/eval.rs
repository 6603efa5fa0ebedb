mod closures;
mod dispatch;
mod eval_exprs;

pub use closures::*;
pub use dispatch::*;
pub use eval_exprs::*;
