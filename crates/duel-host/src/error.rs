//! Host error codes

use thiserror::Error;
use duel_engine::{ActionError, DuelError, RewardError};
use crate::invite::InviteId;

pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("profile {0} not found")]
    ProfileNotFound(String),

    #[error("profile store failure: {0}")]
    Store(String),

    #[error("invite {0} not found")]
    InviteNotFound(InviteId),

    #[error("invite {0} was already answered")]
    InviteClosed(InviteId),

    #[error("challenge was declined")]
    InviteRejected,

    #[error("challenge was cancelled")]
    InviteCancelled,

    #[error("challenge not answered in time")]
    InviteTimeout,

    #[error("turn rejected: {0}")]
    TurnRejected(ActionError),

    #[error(transparent)]
    Duel(DuelError),

    #[error(transparent)]
    Reward(#[from] RewardError),

    #[error("reward persistence is pending; retry it instead of re-claiming")]
    RewardPending,

    #[error("reward already applied")]
    RewardAlreadyApplied,

    #[error("no reward persistence to retry")]
    NothingToRetry,
}

impl From<DuelError> for HostError {
    fn from(e: DuelError) -> Self {
        match e {
            DuelError::Rejected { error, .. } => HostError::TurnRejected(error),
            other => HostError::Duel(other),
        }
    }
}
