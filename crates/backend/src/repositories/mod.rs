//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&BackendClient` as the first argument. Filters use the
//! backend's query operators (`eq.`, `is.null`, `gt.`, `or=(...)`).

pub mod chat_repo;
pub mod lut_token_repo;
pub mod member_repo;
pub mod message_repo;
pub mod space_repo;
pub mod training_log_repo;
pub mod user_memory_repo;

pub use chat_repo::ChatRepo;
pub use lut_token_repo::LutTokenRepo;
pub use member_repo::{MemberRepo, PendingInvitation};
pub use message_repo::MessageRepo;
pub use space_repo::SpaceRepo;
pub use training_log_repo::TrainingLogRepo;
pub use user_memory_repo::UserMemoryRepo;
