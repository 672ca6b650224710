pub mod engine;
pub mod features;
pub mod reader;
pub mod service;

pub use engine::*;
pub use features::*;
pub use reader::*;
pub use service::*;
