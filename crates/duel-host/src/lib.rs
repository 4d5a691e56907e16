//! Duel host
//!
//! Glue between the pure duel engine and the app's external collaborators:
//! the profile document store and the friend-challenge invite channel.

mod error;
mod invite;
mod session;
mod store;

pub use error::{HostError, Result};
pub use invite::{InMemoryInviteChannel, InviteChannel, InviteId, InviteStatus};
pub use session::{DuelSession, RewardState};
pub use store::{InMemoryProfileStore, ProfileStore};
