pub mod documents;
pub mod filter;
pub mod join;
pub mod pagination;
pub mod raw_query;
pub mod stage;
pub mod user_context;

pub use documents::*;
pub use filter::*;
pub use join::*;
pub use pagination::*;
pub use raw_query::*;
pub use stage::*;
pub use user_context::*;
