//! The identity ledger itself

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lib_types::constants::{
    BAN_THRESHOLD, INITIAL_KARMA, MAX_DAILY_KARMA_GAIN, MAX_USERNAME_LENGTH, SECONDS_PER_DAY,
};
use lib_types::events::KarmaReason;
use lib_types::{Event, EventLog, Karma, LedgerError, LedgerResult, SystemCap, Timestamp, Wallet};

use crate::profile::UserProfile;

/// Wallet → profile registry with karma accounting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityLedger {
    profiles: HashMap<Wallet, UserProfile>,
    /// username → wallet; maintains the bijection
    usernames: HashMap<String, Wallet>,
}

impl IdentityLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------ reads

    /// Look up a profile
    pub fn profile(&self, wallet: Wallet) -> LedgerResult<&UserProfile> {
        self.profiles
            .get(&wallet)
            .ok_or(LedgerError::UserNotFound(wallet))
    }

    /// Look up a profile, additionally requiring it not be banned
    pub fn require_active(&self, wallet: Wallet) -> LedgerResult<&UserProfile> {
        let profile = self.profile(wallet)?;
        if profile.is_banned {
            return Err(LedgerError::Banned(wallet));
        }
        Ok(profile)
    }

    /// Wallet that owns a username, if any
    pub fn username_owner(&self, username: &str) -> Option<Wallet> {
        self.usernames.get(username).copied()
    }

    /// Number of registered profiles
    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    // ----------------------------------------------------------- registration

    /// Register a wallet under a unique username.
    ///
    /// One registration per wallet, ever; wallet and username are immutable
    /// afterwards. The new profile starts with [`INITIAL_KARMA`].
    pub fn register(
        &mut self,
        wallet: Wallet,
        username: &str,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        if wallet.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if self.profiles.contains_key(&wallet) {
            return Err(LedgerError::AlreadyRegistered(wallet));
        }
        validate_username(username)?;
        if self.usernames.contains_key(username) {
            return Err(LedgerError::UsernameTaken(username.to_string()));
        }

        self.usernames.insert(username.to_string(), wallet);
        self.profiles.insert(
            wallet,
            UserProfile {
                wallet,
                username: username.to_string(),
                karma: INITIAL_KARMA,
                created_at: now,
                last_post_at: 0,
                last_comment_at: 0,
                total_posts: 0,
                total_comments: 0,
                is_banned: false,
                gain_day: 0,
                gained_today: 0,
            },
        );

        info!(%wallet, username, "registered user");
        events.emit(Event::UserRegistered {
            wallet,
            username: username.to_string(),
            at: now,
        });
        Ok(())
    }

    // ------------------------------------------------------------------ karma

    /// Apply a karma delta to a wallet. Privileged.
    ///
    /// Positive deltas are clamped to the remaining daily headroom (a clamp
    /// to zero is a no-op on the balance, not an error); negative deltas
    /// always apply in full. Returns the delta actually applied.
    ///
    /// A negative delta that leaves karma at or below [`BAN_THRESHOLD`] bans
    /// the wallet. The check runs only on negative deltas so that an
    /// administrative unban holds until reputation moves down again.
    pub fn update_karma(
        &mut self,
        _cap: &SystemCap,
        wallet: Wallet,
        delta: Karma,
        reason: KarmaReason,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<Karma> {
        let profile = self
            .profiles
            .get_mut(&wallet)
            .ok_or(LedgerError::UserNotFound(wallet))?;

        let applied = if delta > 0 {
            let day = now / SECONDS_PER_DAY;
            if profile.gain_day != day {
                profile.gain_day = day;
                profile.gained_today = 0;
            }
            let headroom = (MAX_DAILY_KARMA_GAIN - profile.gained_today).max(0);
            let applied = delta.min(headroom);
            profile.gained_today += applied;
            applied
        } else {
            delta
        };

        profile.karma += applied;
        let new_karma = profile.karma;
        debug!(%wallet, requested = delta, applied, new_karma, ?reason, "karma updated");
        events.emit(Event::KarmaUpdated {
            wallet,
            applied,
            requested: delta,
            reason,
            new_karma,
        });

        if applied < 0 && new_karma <= BAN_THRESHOLD && !profile.is_banned {
            profile.is_banned = true;
            info!(%wallet, karma = new_karma, "auto-banned: karma fell below threshold");
            events.emit(Event::UserBanned {
                wallet,
                karma: new_karma,
            });
        }

        Ok(applied)
    }

    /// Administrative ban override. Privileged.
    ///
    /// Unbanning does not itself re-check the ban threshold; see
    /// [`Self::update_karma`].
    pub fn admin_set_ban(
        &mut self,
        _cap: &SystemCap,
        wallet: Wallet,
        banned: bool,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        let profile = self
            .profiles
            .get_mut(&wallet)
            .ok_or(LedgerError::UserNotFound(wallet))?;
        if profile.is_banned == banned {
            return Ok(());
        }
        profile.is_banned = banned;
        if banned {
            info!(%wallet, "administratively banned");
            events.emit(Event::UserBanned {
                wallet,
                karma: profile.karma,
            });
        } else {
            info!(%wallet, "administratively unbanned");
            events.emit(Event::UserUnbanned { wallet });
        }
        Ok(())
    }

    // -------------------------------------------------------------- cooldowns

    /// Check that `wallet` may post now, given a community's base cooldown.
    pub fn check_post_cooldown(
        &self,
        wallet: Wallet,
        base: Timestamp,
        now: Timestamp,
    ) -> LedgerResult<()> {
        let profile = self.profile(wallet)?;
        let cooldown = profile.post_cooldown(base, now);
        let ready_at = profile.last_post_at.saturating_add(cooldown);
        if profile.last_post_at > 0 && now < ready_at {
            return Err(LedgerError::CooldownActive {
                remaining: ready_at - now,
            });
        }
        Ok(())
    }

    /// Check that `wallet` may comment now, given a community's base cooldown.
    pub fn check_comment_cooldown(
        &self,
        wallet: Wallet,
        base: Timestamp,
        now: Timestamp,
    ) -> LedgerResult<()> {
        let profile = self.profile(wallet)?;
        let cooldown = profile.comment_cooldown(base, now);
        let ready_at = profile.last_comment_at.saturating_add(cooldown);
        if profile.last_comment_at > 0 && now < ready_at {
            return Err(LedgerError::CooldownActive {
                remaining: ready_at - now,
            });
        }
        Ok(())
    }

    // --------------------------------------------------------------- activity

    /// Record a successful post. Privileged; called by the content store.
    pub fn record_post_activity(
        &mut self,
        _cap: &SystemCap,
        wallet: Wallet,
        now: Timestamp,
    ) -> LedgerResult<()> {
        let profile = self
            .profiles
            .get_mut(&wallet)
            .ok_or(LedgerError::UserNotFound(wallet))?;
        profile.last_post_at = now;
        profile.total_posts += 1;
        Ok(())
    }

    /// Record a successful comment. Privileged; called by the content store.
    pub fn record_comment_activity(
        &mut self,
        _cap: &SystemCap,
        wallet: Wallet,
        now: Timestamp,
    ) -> LedgerResult<()> {
        let profile = self
            .profiles
            .get_mut(&wallet)
            .ok_or(LedgerError::UserNotFound(wallet))?;
        profile.last_comment_at = now;
        profile.total_comments += 1;
        Ok(())
    }
}

fn validate_username(username: &str) -> LedgerResult<()> {
    if username.is_empty() || username.len() > MAX_USERNAME_LENGTH {
        return Err(LedgerError::InvalidUsername(username.to_string()));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(LedgerError::InvalidUsername(username.to_string()));
    }
    Ok(())
}
