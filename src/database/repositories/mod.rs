//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod category;
pub mod event;
pub mod request;
pub mod user;

// Re-export repositories
pub use category::CategoryRepository;
pub use event::EventRepository;
pub use request::RequestRepository;
pub use user::UserRepository;
