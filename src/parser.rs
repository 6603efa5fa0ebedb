mod expr_builder;
mod token_handlers;
mod tokenizer;

pub use expr_builder::{parse_program, parse_text};
