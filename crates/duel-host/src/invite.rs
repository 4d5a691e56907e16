//! Match-invitation channel port
//!
//! Negotiates only whether a friend duel starts. No turn data travels over
//! it: once accepted, the challenger's device plays the friend's profile
//! with the bot heuristic.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{HostError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InviteId(pub u64);

impl fmt::Display for InviteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Invite state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
    /// Withdrawn by the challenger (or timed out)
    Cancelled,
}

impl InviteStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, InviteStatus::Pending)
    }
}

#[async_trait]
pub trait InviteChannel: Send + Sync {
    async fn create_invite(&self, from: &str, to: &str) -> Result<InviteId>;

    /// Stream of status updates, starting with the current status
    async fn watch_invite(&self, id: InviteId) -> Result<watch::Receiver<InviteStatus>>;

    async fn cancel_invite(&self, id: InviteId) -> Result<()>;
}

struct Invite {
    from: String,
    to: String,
    status: watch::Sender<InviteStatus>,
}

/// In-memory invite channel backed by `tokio::sync::watch`
///
/// Answered invites stay queryable until the next [`create_invite`] call
/// prunes them.
///
/// [`create_invite`]: InviteChannel::create_invite
#[derive(Clone, Default)]
pub struct InMemoryInviteChannel {
    invites: Arc<Mutex<HashMap<InviteId, Invite>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryInviteChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer an invite as the invitee
    pub fn respond(&self, id: InviteId, accept: bool) -> Result<()> {
        let status = if accept { InviteStatus::Accepted } else { InviteStatus::Rejected };
        self.settle(id, status)
    }

    /// Participants of an invite as (from, to)
    pub fn participants(&self, id: InviteId) -> Option<(String, String)> {
        self.lock()
            .get(&id)
            .map(|invite| (invite.from.clone(), invite.to.clone()))
    }

    /// Forget every answered invite, returning how many were dropped
    ///
    /// Existing receivers keep the final status they saw.
    pub fn prune_settled(&self) -> usize {
        let mut invites = self.lock();
        let before = invites.len();
        invites.retain(|_, invite| !invite.status.borrow().is_settled());
        before - invites.len()
    }

    fn settle(&self, id: InviteId, status: InviteStatus) -> Result<()> {
        let invites = self.lock();
        let invite = invites.get(&id).ok_or(HostError::InviteNotFound(id))?;
        if invite.status.borrow().is_settled() {
            return Err(HostError::InviteClosed(id));
        }
        invite.status.send_replace(status);
        tracing::debug!(%id, from = %invite.from, to = %invite.to, ?status, "invite settled");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<InviteId, Invite>> {
        self.invites.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl InviteChannel for InMemoryInviteChannel {
    async fn create_invite(&self, from: &str, to: &str) -> Result<InviteId> {
        let id = InviteId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let pruned = self.prune_settled();
        if pruned > 0 {
            tracing::debug!(pruned, "dropped answered invites");
        }
        let (status, _) = watch::channel(InviteStatus::Pending);
        self.lock().insert(
            id,
            Invite { from: from.to_string(), to: to.to_string(), status },
        );
        Ok(id)
    }

    async fn watch_invite(&self, id: InviteId) -> Result<watch::Receiver<InviteStatus>> {
        self.lock()
            .get(&id)
            .map(|invite| invite.status.subscribe())
            .ok_or(HostError::InviteNotFound(id))
    }

    async fn cancel_invite(&self, id: InviteId) -> Result<()> {
        self.settle(id, InviteStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invite_lifecycle() {
        let channel = InMemoryInviteChannel::new();
        let id = channel.create_invite("ana", "bo").await.unwrap();
        let mut rx = channel.watch_invite(id).await.unwrap();
        assert_eq!(*rx.borrow(), InviteStatus::Pending);
        assert_eq!(channel.participants(id), Some(("ana".into(), "bo".into())));

        channel.respond(id, true).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), InviteStatus::Accepted);
    }

    #[tokio::test]
    async fn test_settled_invite_cannot_change() {
        let channel = InMemoryInviteChannel::new();
        let id = channel.create_invite("ana", "bo").await.unwrap();
        channel.respond(id, false).unwrap();
        assert!(matches!(channel.respond(id, true), Err(HostError::InviteClosed(_))));
        assert!(matches!(channel.cancel_invite(id).await, Err(HostError::InviteClosed(_))));

        let rx = channel.watch_invite(id).await.unwrap();
        assert_eq!(*rx.borrow(), InviteStatus::Rejected);
    }

    #[tokio::test]
    async fn test_unknown_invite() {
        let channel = InMemoryInviteChannel::new();
        assert!(matches!(
            channel.watch_invite(InviteId(99)).await,
            Err(HostError::InviteNotFound(InviteId(99)))
        ));
    }

    #[tokio::test]
    async fn test_answered_invites_pruned_on_create() {
        let channel = InMemoryInviteChannel::new();
        let answered = channel.create_invite("ana", "bo").await.unwrap();
        let open = channel.create_invite("ana", "cy").await.unwrap();
        let rx = channel.watch_invite(answered).await.unwrap();
        channel.respond(answered, false).unwrap();

        let next = channel.create_invite("ana", "di").await.unwrap();
        assert!(channel.participants(answered).is_none());
        assert!(channel.participants(open).is_some());
        assert!(channel.participants(next).is_some());
        assert_eq!(*rx.borrow(), InviteStatus::Rejected);
        assert_eq!(channel.prune_settled(), 0);
    }

    #[tokio::test]
    async fn test_settle_logs_structured_fields() {
        #[derive(Clone, Default)]
        struct Capture(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for Capture {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let channel = InMemoryInviteChannel::new();
        let id = channel.create_invite("ana", "bo").await.unwrap();

        let out = Capture::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || channel.respond(id, true).unwrap());

        let logged = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("invite settled"), "{}", logged);
        assert!(logged.contains("id=#1"), "{}", logged);
        assert!(logged.contains("from=ana"), "{}", logged);
        assert!(logged.contains("status=Accepted"), "{}", logged);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let channel = InMemoryInviteChannel::new();
        let a = channel.create_invite("ana", "bo").await.unwrap();
        let b = channel.create_invite("ana", "cy").await.unwrap();
        assert_ne!(a, b);
    }
}
