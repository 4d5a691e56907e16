//! Duel session handlers
//!
//! A session owns one [`MatchState`] from challenge to reward. The engine
//! stays pure; every store or invite call happens here.

use std::time::Duration;

use duel_engine::{
    allocate_reward, create_match_with, submit_turn, Action, CombatProfile, MatchSetup,
    MatchState, OpponentKind, PointsToAssign, ProfileDelta, RewardAllocation,
};
use tracing::{info, warn};

use crate::error::{HostError, Result};
use crate::invite::{InviteChannel, InviteStatus};
use crate::store::ProfileStore;

/// Where the session's reward stands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardState {
    Unclaimed,
    /// Computed, but the store write has not succeeded yet
    Pending(ProfileDelta),
    Applied(ProfileDelta),
}

#[derive(Clone, Debug)]
pub struct DuelSession {
    player_id: String,
    /// Profile id of the challenged friend, if any
    opponent_id: Option<String>,
    state: MatchState,
    reward: RewardState,
}

impl DuelSession {
    /// Start a duel against a scripted bot profile
    pub async fn start_bot_duel(
        store: &dyn ProfileStore,
        player_id: &str,
        bot: &CombatProfile,
        setup: MatchSetup,
    ) -> Result<Self> {
        let player = store.get_profile(player_id).await?;
        let state = create_match_with(&player, bot, OpponentKind::Bot, setup);

        info!(player = player_id, "bot duel started");

        Ok(Self {
            player_id: player_id.to_string(),
            opponent_id: None,
            state,
            reward: RewardState::Unclaimed,
        })
    }

    /// Challenge a friend and start once they accept
    ///
    /// Waits at most `timeout` for an answer; an unanswered invite is
    /// cancelled before returning [`HostError::InviteTimeout`].
    pub async fn start_friend_duel(
        store: &dyn ProfileStore,
        invites: &dyn InviteChannel,
        player_id: &str,
        friend_id: &str,
        setup: MatchSetup,
        timeout: Duration,
    ) -> Result<Self> {
        // Fail before bothering the friend if either profile is missing
        let player = store.get_profile(player_id).await?;
        let friend = store.get_profile(friend_id).await?;

        let invite = invites.create_invite(player_id, friend_id).await?;
        let mut status = invites.watch_invite(invite).await?;

        let settled = tokio::time::timeout(timeout, async {
            loop {
                let current = *status.borrow_and_update();
                if current.is_settled() {
                    return current;
                }
                if status.changed().await.is_err() {
                    // Channel closed without an answer
                    return InviteStatus::Cancelled;
                }
            }
        })
        .await;

        let answer = match settled {
            Ok(answer) => answer,
            Err(_) => {
                warn!(%invite, player = player_id, friend = friend_id, "invite timed out");
                if let Err(e) = invites.cancel_invite(invite).await {
                    warn!(%invite, error = %e, "could not cancel invite");
                }
                return Err(HostError::InviteTimeout);
            }
        };

        match answer {
            InviteStatus::Accepted => {}
            InviteStatus::Rejected => return Err(HostError::InviteRejected),
            InviteStatus::Cancelled | InviteStatus::Pending => {
                return Err(HostError::InviteCancelled)
            }
        }

        let state = create_match_with(&player, &friend, OpponentKind::Human, setup);

        info!(player = player_id, friend = friend_id, "friend duel started");

        Ok(Self {
            player_id: player_id.to_string(),
            opponent_id: Some(friend_id.to_string()),
            state,
            reward: RewardState::Unclaimed,
        })
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn opponent_id(&self) -> Option<&str> {
        self.opponent_id.as_deref()
    }

    pub fn reward(&self) -> RewardState {
        self.reward
    }

    /// Resolve one turn
    ///
    /// A rejected action keeps the combat state but adopts the log line
    /// explaining the rejection, then surfaces the reason.
    pub fn play_turn(&mut self, action: Action) -> Result<&MatchState> {
        match submit_turn(&self.state, action) {
            Ok(next) => {
                self.state = next;
                Ok(&self.state)
            }
            Err(duel_engine::DuelError::Rejected { error, state }) => {
                self.state = *state;
                Err(HostError::TurnRejected(error))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fresh one-point-at-a-time allocator for the reward screen
    pub fn reward_allocation(&self) -> Result<RewardAllocation> {
        Ok(RewardAllocation::for_match(&self.state)?)
    }

    /// Compute the reward and persist it on the player's profile
    ///
    /// On a store failure the delta stays [`RewardState::Pending`]; call
    /// [`retry_persist`](Self::retry_persist) to send the same delta again.
    pub async fn claim_reward(
        &mut self,
        store: &dyn ProfileStore,
        points: PointsToAssign,
    ) -> Result<ProfileDelta> {
        match self.reward {
            RewardState::Applied(_) => return Err(HostError::RewardAlreadyApplied),
            RewardState::Pending(_) => return Err(HostError::RewardPending),
            RewardState::Unclaimed => {}
        }

        let delta = allocate_reward(&self.state, points)?;
        if delta.is_empty() {
            self.reward = RewardState::Applied(delta);
            return Ok(delta);
        }

        self.reward = RewardState::Pending(delta);
        self.persist(store, delta).await
    }

    /// Re-send a reward whose persistence failed
    pub async fn retry_persist(&mut self, store: &dyn ProfileStore) -> Result<ProfileDelta> {
        match self.reward {
            RewardState::Pending(delta) => self.persist(store, delta).await,
            RewardState::Applied(_) => Err(HostError::RewardAlreadyApplied),
            RewardState::Unclaimed => Err(HostError::NothingToRetry),
        }
    }

    async fn persist(
        &mut self,
        store: &dyn ProfileStore,
        delta: ProfileDelta,
    ) -> Result<ProfileDelta> {
        match store.apply_profile_delta(&self.player_id, &delta).await {
            Ok(()) => {
                self.reward = RewardState::Applied(delta);
                info!(
                    player = %self.player_id,
                    strength = delta.strength,
                    defense = delta.defense,
                    "reward applied"
                );
                Ok(delta)
            }
            Err(e) => {
                warn!(player = %self.player_id, error = %e, "reward not persisted");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invite::InMemoryInviteChannel;
    use crate::store::InMemoryProfileStore;
    use duel_engine::{BotPolicy, BotStyle, SeededRng, StyledBot, Winner};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn seeded_store() -> InMemoryProfileStore {
        let store = InMemoryProfileStore::new();
        store.insert("ana", CombatProfile::new(10, 10, 10, 10));
        store.insert("bo", CombatProfile::new(8, 6, 4, 12));
        store
    }

    /// Plays the session to completion with a bot standing in for the player
    fn play_out(session: &mut DuelSession) {
        let driver = StyledBot::new(BotStyle::Aggressive);
        while !session.state().is_finished() {
            let s = session.state();
            let mut rng = SeededRng::new(&[11u8; 32], 0).for_turn(s.turn_number);
            let action = driver.decide(&s.player, &s.opponent, s.turn_number, &s.rules, &mut rng);
            session.play_turn(action).unwrap();
        }
    }

    /// Bot duel that the player has already won
    async fn won_bot_duel(store: &InMemoryProfileStore) -> DuelSession {
        let bot = CombatProfile::new(1, 0, 0, 0);
        let mut session =
            DuelSession::start_bot_duel(store, "ana", &bot, MatchSetup::new([3u8; 32]))
                .await
                .unwrap();
        // Shortcut to the end: the bot is one hit from defeat
        session.state.opponent.hp = 1;
        session.state.opponent.is_stunned = true;
        session.play_turn(Action::Attack(10)).unwrap();
        assert_eq!(session.state().winner(), Some(Winner::Player));
        session
    }

    #[tokio::test]
    async fn test_bot_duel_plays_to_result() {
        init_tracing();
        let store = seeded_store();
        let bot = CombatProfile::new(5, 3, 3, 3);
        let mut session =
            DuelSession::start_bot_duel(&store, "ana", &bot, MatchSetup::new([1u8; 32]))
                .await
                .unwrap();
        assert_eq!(session.state().opponent_kind, OpponentKind::Bot);
        assert_eq!(session.opponent_id(), None);

        play_out(&mut session);
        assert!(session.state().outcome.is_some());
    }

    #[tokio::test]
    async fn test_unknown_player() {
        let store = seeded_store();
        let err = DuelSession::start_bot_duel(
            &store,
            "ghost",
            &CombatProfile::default(),
            MatchSetup::new([0u8; 32]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HostError::ProfileNotFound(_)));
    }

    #[tokio::test]
    async fn test_rejected_turn_keeps_state_and_logs() {
        let store = seeded_store();
        let mut session = DuelSession::start_bot_duel(
            &store,
            "ana",
            &CombatProfile::default(),
            MatchSetup::new([0u8; 32]),
        )
        .await
        .unwrap();
        let before = session.state().clone();

        let err = session.play_turn(Action::Defend(10_000)).unwrap_err();
        assert!(matches!(err, HostError::TurnRejected(_)));
        assert_eq!(session.state().player, before.player);
        assert_eq!(session.state().turn_number, before.turn_number);
        assert_eq!(session.state().log.len(), before.log.len() + 1);
    }

    #[tokio::test]
    async fn test_reward_applied_once() {
        let store = seeded_store();
        let mut session = won_bot_duel(&store).await;

        let delta = session
            .claim_reward(&store, PointsToAssign { strength: 1, defense: 0 })
            .await
            .unwrap();
        assert_eq!(delta, ProfileDelta { strength: 1, defense: 0 });
        assert_eq!(store.profile("ana").unwrap().attributes.strength, 11);
        assert_eq!(session.reward(), RewardState::Applied(delta));

        let again = session
            .claim_reward(&store, PointsToAssign { strength: 1, defense: 0 })
            .await;
        assert!(matches!(again, Err(HostError::RewardAlreadyApplied)));
        assert_eq!(store.profile("ana").unwrap().attributes.strength, 11);
    }

    #[tokio::test]
    async fn test_failed_persistence_retries_same_delta() {
        let store = seeded_store();
        let mut session = won_bot_duel(&store).await;
        store.fail_next_writes(1);

        let err = session
            .claim_reward(&store, PointsToAssign { strength: 0, defense: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::Store(_)));
        let pending = ProfileDelta { strength: 0, defense: 1 };
        assert_eq!(session.reward(), RewardState::Pending(pending));
        assert_eq!(store.profile("ana").unwrap().attributes.defense, 10);

        // Re-claiming is refused so a different split can't sneak in
        assert!(matches!(
            session.claim_reward(&store, PointsToAssign { strength: 1, defense: 0 }).await,
            Err(HostError::RewardPending)
        ));

        session.retry_persist(&store).await.unwrap();
        assert_eq!(store.profile("ana").unwrap().attributes.defense, 11);
        assert!(matches!(
            session.retry_persist(&store).await,
            Err(HostError::RewardAlreadyApplied)
        ));
    }

    #[tokio::test]
    async fn test_overspend_is_refused_before_store() {
        let store = seeded_store();
        let mut session = won_bot_duel(&store).await;
        let err = session
            .claim_reward(&store, PointsToAssign { strength: 1, defense: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::Reward(_)));
        assert_eq!(session.reward(), RewardState::Unclaimed);
        assert!(matches!(session.retry_persist(&store).await, Err(HostError::NothingToRetry)));
    }

    #[tokio::test]
    async fn test_reward_allocation_helper() {
        let store = seeded_store();
        let session = won_bot_duel(&store).await;
        assert_eq!(session.reward_allocation().unwrap().remaining(), 1);
    }

    #[tokio::test]
    async fn test_friend_duel_accepted() {
        init_tracing();
        let store = seeded_store();
        let invites = InMemoryInviteChannel::new();

        let responder = invites.clone();
        let answer = tokio::spawn(async move {
            tokio::task::yield_now().await;
            // First invite created by this channel
            responder.respond(crate::invite::InviteId(1), true).unwrap();
        });

        let mut session = DuelSession::start_friend_duel(
            &store,
            &invites,
            "ana",
            "bo",
            MatchSetup::new([4u8; 32]),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        answer.await.unwrap();

        assert_eq!(session.state().opponent_kind, OpponentKind::Human);
        assert_eq!(session.opponent_id(), Some("bo"));
        assert_eq!(session.state().opponent.max_hp, 150 + 8 * 15);

        play_out(&mut session);
        if session.state().winner() == Some(Winner::Player) {
            assert_eq!(session.reward_allocation().unwrap().remaining(), 2);
        }
    }

    #[tokio::test]
    async fn test_friend_duel_rejected() {
        let store = seeded_store();
        let invites = InMemoryInviteChannel::new();
        let responder = invites.clone();
        let answer = tokio::spawn(async move {
            tokio::task::yield_now().await;
            responder.respond(crate::invite::InviteId(1), false).unwrap();
        });

        let err = DuelSession::start_friend_duel(
            &store,
            &invites,
            "ana",
            "bo",
            MatchSetup::new([4u8; 32]),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        answer.await.unwrap();
        assert!(matches!(err, HostError::InviteRejected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_friend_duel_times_out_and_cancels() {
        let store = seeded_store();
        let invites = InMemoryInviteChannel::new();

        let err = DuelSession::start_friend_duel(
            &store,
            &invites,
            "ana",
            "bo",
            MatchSetup::new([4u8; 32]),
            Duration::from_secs(30),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HostError::InviteTimeout));

        let rx = invites.watch_invite(crate::invite::InviteId(1)).await.unwrap();
        assert_eq!(*rx.borrow(), InviteStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_friend_missing_profile_sends_no_invite() {
        let store = seeded_store();
        let invites = InMemoryInviteChannel::new();
        let err = DuelSession::start_friend_duel(
            &store,
            &invites,
            "ana",
            "nobody",
            MatchSetup::new([4u8; 32]),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HostError::ProfileNotFound(_)));
        assert!(invites.participants(crate::invite::InviteId(1)).is_none());
    }
}
