pub mod error;
pub mod paginate;
pub mod pipeline_builder;
pub mod query_compiler;

pub use error::*;
pub use paginate::*;
pub use pipeline_builder::*;
pub use query_compiler::*;
