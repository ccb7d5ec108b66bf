//! Orchestration flows on top of the service clients.
//!
//! Each module owns one user-facing flow as an explicit state machine:
//!
//! - [`chat`] — the send/generate/clean conversation loop.
//! - [`teaching`] — extract, review, and sequentially train Q&A pairs.
//! - [`spaces`] — space lifecycle, membership, and license tokens.
//!
//! Orchestrators take the signed-in identity as a [`SessionUser`] snapshot
//! from the session context; they never talk to the auth routes
//! themselves.
//!
//! [`SessionUser`]: lutspace_backend::SessionUser

pub mod chat;
pub mod spaces;
pub mod teaching;

pub use chat::{ChatOrchestrator, ChatTarget, ChatTurn};
pub use spaces::{SpaceError, SpaceService};
pub use teaching::{ReviewPair, TeachingError, TeachingOrchestrator, TrainingProgress};
