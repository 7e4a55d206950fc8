//! Domain models with validation at construction
//!
//! Entity records decode straight from rows. Input and patch payloads are
//! validated before they reach the database; invalid input returns
//! ValidationError, not panic.

pub mod validation;
pub mod filter;
pub mod pagination;
pub mod user;
pub mod forum;
pub mod thread;
pub mod post;
pub mod vote;

pub use validation::ValidationError;
pub use filter::{Constraint, Filter, FilterError, FilterParams};
pub use pagination::{Metadata, Page};
pub use user::{User, UserInput, UserPatch};
pub use forum::{Forum, ForumInput, ForumPatch};
pub use thread::{Thread, ThreadInput, ThreadPatch};
pub use post::{Post, PostInput, PostPatch};
pub use vote::{PostVote, ThreadVote, VoteInput, VoteSummary};
