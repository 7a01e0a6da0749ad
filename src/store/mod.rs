//! Persistence for members, posts, comments, likes and todos.

pub mod memory;
pub mod models;
pub mod traits;

pub use memory::MemoryStore;
pub use models::*;
pub use traits::{BoardStore, MemberStore, StoreError};
