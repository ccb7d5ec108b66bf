//! Row structs and create DTOs, one module per backend table.

pub mod chat;
pub mod lut_token;
pub mod member;
pub mod message;
pub mod space;
pub mod training_log;
pub mod user_memory;

pub use chat::Chat;
pub use lut_token::LutToken;
pub use member::{MemberRole, MemberStatus, SpaceMember};
pub use message::{Message, MessageRole};
pub use space::{CreateSpace, Space, SpaceType};
pub use training_log::{CreateTrainingLog, SpaceTrainingLog};
pub use user_memory::UserMemory;
