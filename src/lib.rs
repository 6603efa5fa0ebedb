pub mod ast;
mod builtins;
pub mod capabilities;
mod eval;
pub mod parser;
pub mod repl;
mod scope;

use std::sync::Once;

pub use ast::errors::*;
pub use builtins::*;
pub use eval::*;
pub use scope::*;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber, filtered by `RUST_LOG`.
/// Does nothing unless `RUST_LOG` is set, and only ever runs once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
