pub mod config_manager;
pub mod error;
pub mod render;
pub mod schema;
pub mod traits;
pub mod types;

pub use config_manager::*;
pub use error::*;
pub use render::render_text;
pub use traits::*;
pub use types::*;
