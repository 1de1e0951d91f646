//! Access control: durable role/operator grants, cached lookups, and
//! effective level resolution.

pub mod backend;
pub mod error;
pub mod level;
pub mod memory;
pub mod models;
pub mod pg;
pub mod resolver;
pub mod store;

pub use backend::GrantStore;
pub use error::AccessError;
pub use level::AccessLevel;
pub use memory::MemoryGrantStore;
pub use models::{OperatorGrant, RoleGrant};
pub use pg::PgGrantStore;
pub use resolver::{effective_level, resolve_member_level};
pub use store::AccessStore;
