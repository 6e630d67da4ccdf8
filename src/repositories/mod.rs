//! Repository layer for data access operations.
//!
//! The account service talks to storage through [`UserStore`]; the
//! diesel-backed [`UserRepository`] is the production implementation.

pub mod pagination;
mod user_repo;
mod user_store;

pub use pagination::{DEFAULT_PAGE_SIZE, Edge, MAX_PAGE_SIZE, Page, PageInfo, PageRequest};
pub use user_repo::UserRepository;
pub use user_store::{UserQuery, UserStore, UsernameCursor};
