//! Stake voting engine operations

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lib_community::CommunityRegistry;
use lib_content::{ContentStatus, ContentStore};
use lib_identity::IdentityLedger;
use lib_types::constants::{MAX_VOTING_AGE, STAKE_LOCK_PERIOD, STAKE_SLASH_PERCENTAGE};
use lib_types::events::KarmaReason;
use lib_types::{
    Amount, ContentRef, Event, EventLog, LedgerError, LedgerResult, SystemCap, Timestamp, Wallet,
};

use crate::vote::{Vote, VoteTally, VoteType};

/// Stake-gated voting over content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StakeVotingEngine {
    /// content → voter → active vote record
    votes: HashMap<ContentRef, HashMap<Wallet, Vote>>,
    /// content → up/down counters
    tallies: HashMap<ContentRef, VoteTally>,
    /// Cumulative stake removed by slashing; no withdrawal path exists
    slashed_pool: Amount,
}

impl StakeVotingEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------ reads

    /// A voter's active vote on a content item, if any
    pub fn vote_record(&self, content: ContentRef, voter: Wallet) -> Option<&Vote> {
        self.votes.get(&content)?.get(&voter)
    }

    /// Up/down counters for a content item
    pub fn tally(&self, content: ContentRef) -> VoteTally {
        self.tallies.get(&content).copied().unwrap_or_default()
    }

    /// Total stake forfeited to slashing so far
    pub fn slashed_pool(&self) -> Amount {
        self.slashed_pool
    }

    // ----------------------------------------------------------------- voting

    /// Cast or change a vote on a content item.
    ///
    /// First vote: locks `stake`, moves the score by ±1 and the author's
    /// karma by the per-kind constant. Vote change (an active record with
    /// the other direction exists): the new stake adds to the locked stake
    /// (nothing is refunded), the lock restarts from `now`, the score moves
    /// by ±2 and the author's karma by the difference of the two effects.
    /// Re-casting the same direction is a conflict.
    #[allow(clippy::too_many_arguments)]
    pub fn vote(
        &mut self,
        cap: &SystemCap,
        identity: &mut IdentityLedger,
        communities: &CommunityRegistry,
        content_store: &mut ContentStore,
        voter: Wallet,
        content: ContentRef,
        vote_type: VoteType,
        stake: Amount,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        let meta = content_store.content_meta(content)?;
        if meta.author == voter {
            return Err(LedgerError::SelfAction(content));
        }
        if meta.status == ContentStatus::Hidden {
            return Err(LedgerError::ContentNotVisible(content));
        }
        let age = now.saturating_sub(meta.created_at);
        if age > MAX_VOTING_AGE {
            return Err(LedgerError::ContentTooOld {
                content,
                age,
                max: MAX_VOTING_AGE,
            });
        }
        communities.can_user_vote(identity, voter, meta.community_id)?;
        if stake < vote_type.min_stake() {
            return Err(LedgerError::InsufficientStake {
                required: vote_type.min_stake(),
                provided: stake,
            });
        }

        let existing = self
            .votes
            .get(&content)
            .and_then(|per_voter| per_voter.get(&voter));
        match existing {
            None => {
                self.votes.entry(content).or_default().insert(
                    voter,
                    Vote {
                        vote_type,
                        stake,
                        timestamp: now,
                        withdrawn: false,
                        slashed: false,
                    },
                );
                self.bump_tally(content, vote_type, 1);
                self.apply_score(cap, content_store, content, vote_type.score_delta(), events)?;
                let reason = karma_reason(meta.is_post);
                identity.update_karma(
                    cap,
                    meta.author,
                    vote_type.karma_delta(meta.is_post),
                    reason,
                    now,
                    events,
                )?;
                debug!(%content, %voter, ?vote_type, stake, "vote cast");
                events.emit(Event::VoteCast {
                    content,
                    voter,
                    upvote: vote_type == VoteType::Up,
                    stake,
                });
            }
            Some(vote) => {
                if vote.withdrawn {
                    return Err(LedgerError::StakeAlreadyWithdrawn { content, voter });
                }
                if vote.slashed {
                    return Err(LedgerError::StakeSlashed { content, voter });
                }
                if vote.vote_type == vote_type {
                    return Err(LedgerError::AlreadyVoted { content, voter });
                }
                let old_type = vote.vote_type;

                // reverse the old effect, apply the new one
                let score_delta = vote_type.score_delta() - old_type.score_delta();
                let karma_delta =
                    vote_type.karma_delta(meta.is_post) - old_type.karma_delta(meta.is_post);

                let total_stake = {
                    let record = self
                        .votes
                        .get_mut(&content)
                        .and_then(|per_voter| per_voter.get_mut(&voter))
                        .ok_or(LedgerError::VoteNotFound { content, voter })?;
                    record.vote_type = vote_type;
                    record.stake += stake;
                    record.timestamp = now;
                    record.stake
                };
                self.bump_tally(content, old_type, -1);
                self.bump_tally(content, vote_type, 1);
                self.apply_score(cap, content_store, content, score_delta, events)?;
                identity.update_karma(
                    cap,
                    meta.author,
                    karma_delta,
                    karma_reason(meta.is_post),
                    now,
                    events,
                )?;
                debug!(%content, %voter, ?vote_type, added = stake, total = total_stake, "vote changed");
                events.emit(Event::VoteChanged {
                    content,
                    voter,
                    upvote: vote_type == VoteType::Up,
                    added_stake: stake,
                    total_stake,
                });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------ withdrawal

    /// Reclaim the stake of a vote once its lock period has passed.
    /// One-shot: a withdrawn record can never be withdrawn again.
    pub fn withdraw_stake(
        &mut self,
        voter: Wallet,
        content: ContentRef,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<Amount> {
        let vote = self
            .votes
            .get_mut(&content)
            .and_then(|per_voter| per_voter.get_mut(&voter))
            .ok_or(LedgerError::VoteNotFound { content, voter })?;
        if vote.slashed {
            return Err(LedgerError::StakeSlashed { content, voter });
        }
        if vote.withdrawn {
            return Err(LedgerError::StakeAlreadyWithdrawn { content, voter });
        }
        let unlock_at = vote.timestamp.saturating_add(STAKE_LOCK_PERIOD);
        if now < unlock_at {
            return Err(LedgerError::StakeLocked { unlock_at, now });
        }
        vote.withdrawn = true;
        let amount = vote.stake;
        info!(%content, %voter, amount, "stake withdrawn");
        events.emit(Event::StakeWithdrawn {
            content,
            voter,
            amount,
        });
        Ok(amount)
    }

    /// Withdraw every eligible stake among `contents`, silently skipping
    /// locked, missing, slashed or already-withdrawn entries. Returns the
    /// total reclaimed and the refs actually withdrawn.
    pub fn batch_withdraw_stakes(
        &mut self,
        voter: Wallet,
        contents: &[ContentRef],
        now: Timestamp,
        events: &mut EventLog,
    ) -> (Amount, Vec<ContentRef>) {
        let mut total = 0;
        let mut withdrawn = Vec::new();
        for &content in contents {
            if let Ok(amount) = self.withdraw_stake(voter, content, now, events) {
                total += amount;
                withdrawn.push(content);
            }
        }
        (total, withdrawn)
    }

    // --------------------------------------------------------------- slashing

    /// Slash a vote's stake. Privileged (moderation only).
    ///
    /// Removes [`STAKE_SLASH_PERCENTAGE`] percent of the remaining stake
    /// into the slashed pool and marks the record terminally slashed. The
    /// remainder stays locked in the record; there is deliberately no
    /// withdrawal path for it (see DESIGN.md). Returns the amount slashed.
    pub fn slash_stake(
        &mut self,
        _cap: &SystemCap,
        content: ContentRef,
        voter: Wallet,
        events: &mut EventLog,
    ) -> LedgerResult<Amount> {
        let vote = self
            .votes
            .get_mut(&content)
            .and_then(|per_voter| per_voter.get_mut(&voter))
            .ok_or(LedgerError::VoteNotFound { content, voter })?;
        if vote.withdrawn {
            return Err(LedgerError::StakeAlreadyWithdrawn { content, voter });
        }
        if vote.slashed {
            return Err(LedgerError::StakeSlashed { content, voter });
        }
        let slashed = vote.stake * STAKE_SLASH_PERCENTAGE / 100;
        vote.stake -= slashed;
        vote.slashed = true;
        self.slashed_pool += slashed;
        let remaining = vote.stake;
        info!(%content, %voter, slashed, remaining, "stake slashed");
        events.emit(Event::StakeSlashed {
            content,
            voter,
            slashed,
            remaining,
        });
        Ok(slashed)
    }

    fn bump_tally(&mut self, content: ContentRef, vote_type: VoteType, delta: i64) {
        let tally = self.tallies.entry(content).or_default();
        let counter = match vote_type {
            VoteType::Up => &mut tally.upvotes,
            VoteType::Down => &mut tally.downvotes,
        };
        *counter = counter.wrapping_add_signed(delta);
    }

    fn apply_score(
        &self,
        cap: &SystemCap,
        content_store: &mut ContentStore,
        content: ContentRef,
        delta: i64,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        match content {
            ContentRef::Post(id) => content_store.adjust_post_score(cap, id, delta, events)?,
            ContentRef::Comment(id) => content_store.adjust_comment_score(cap, id, delta, events)?,
        };
        Ok(())
    }
}

fn karma_reason(is_post: bool) -> KarmaReason {
    if is_post {
        KarmaReason::PostVote
    } else {
        KarmaReason::CommentVote
    }
}
