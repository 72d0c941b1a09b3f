pub mod aggregate;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::*;
pub use postgres::*;
pub use traits::*;
