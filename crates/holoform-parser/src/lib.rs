pub mod ast;
pub mod description;
pub mod driver;
pub mod file_collect;
pub mod formatter;
pub mod language;
pub mod lower;
pub mod node_utils;
pub mod visitor;

#[cfg(test)]
mod tests;

pub use driver::*;
pub use file_collect::*;
pub use formatter::format_expr;
pub use language::*;
pub use visitor::*;
