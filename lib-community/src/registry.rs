//! Community registry operations

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lib_identity::IdentityLedger;
use lib_types::constants::{
    COMMUNITY_CREATION_COST, MAX_COMMUNITY_DESCRIPTION_LENGTH, MAX_COMMUNITY_NAME_LENGTH,
    MAX_MODERATORS,
};
use lib_types::{
    Amount, CommunityId, Event, EventLog, Karma, LedgerError, LedgerResult, SystemCap, Timestamp,
    Wallet,
};

use crate::community::{Community, CommunityRules, ModeratorInfo};

/// Name-unique registry of communities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityRegistry {
    communities: HashMap<CommunityId, Community>,
    /// name → id; maintains the bijection
    names: HashMap<String, CommunityId>,
    next_id: CommunityId,
}

impl CommunityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------ reads

    /// Look up a community
    pub fn community(&self, id: CommunityId) -> LedgerResult<&Community> {
        self.communities
            .get(&id)
            .ok_or(LedgerError::CommunityNotFound(id))
    }

    /// Community ID owning a name, if any
    pub fn id_by_name(&self, name: &str) -> Option<CommunityId> {
        self.names.get(name).copied()
    }

    /// Number of communities (active or not)
    pub fn community_count(&self) -> usize {
        self.communities.len()
    }

    /// Member count, for governance quorum math
    pub fn member_count(&self, id: CommunityId) -> LedgerResult<u64> {
        Ok(self.community(id)?.member_count())
    }

    /// Fail unless `wallet` is an active moderator of the community
    pub fn require_moderator(&self, id: CommunityId, wallet: Wallet) -> LedgerResult<()> {
        if !self.community(id)?.is_moderator(wallet) {
            return Err(LedgerError::NotModerator {
                wallet,
                community: id,
            });
        }
        Ok(())
    }

    // --------------------------------------------------------------- creation

    /// Create a community. Requires a registered, unbanned caller and a
    /// payment of at least [`COMMUNITY_CREATION_COST`].
    ///
    /// The payment is split 50/50: the protocol treasury receives
    /// `payment / 2` (integer division), the community treasury the
    /// remainder. Returns the new ID and the protocol's share, which the
    /// caller (the node) credits to the protocol treasury.
    pub fn create(
        &mut self,
        identity: &IdentityLedger,
        creator: Wallet,
        name: &str,
        description: &str,
        rules: CommunityRules,
        payment: Amount,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<(CommunityId, Amount)> {
        identity.require_active(creator)?;
        if payment < COMMUNITY_CREATION_COST {
            return Err(LedgerError::InsufficientPayment {
                required: COMMUNITY_CREATION_COST,
                provided: payment,
            });
        }
        if name.is_empty() {
            return Err(LedgerError::EmptyField { field: "name" });
        }
        if name.len() > MAX_COMMUNITY_NAME_LENGTH {
            return Err(LedgerError::FieldTooLong {
                field: "name",
                max: MAX_COMMUNITY_NAME_LENGTH,
                actual: name.len(),
            });
        }
        if description.len() > MAX_COMMUNITY_DESCRIPTION_LENGTH {
            return Err(LedgerError::FieldTooLong {
                field: "description",
                max: MAX_COMMUNITY_DESCRIPTION_LENGTH,
                actual: description.len(),
            });
        }
        if self.names.contains_key(name) {
            return Err(LedgerError::CommunityNameTaken(name.to_string()));
        }

        let protocol_share = payment / 2;
        let community_share = payment - protocol_share;

        self.next_id += 1;
        let id = self.next_id;

        let mut moderators = HashMap::new();
        moderators.insert(
            creator,
            ModeratorInfo {
                appointed_at: now,
                votes_received: 0,
                is_active: true,
            },
        );
        let mut members = BTreeSet::new();
        members.insert(creator);

        self.names.insert(name.to_string(), id);
        self.communities.insert(
            id,
            Community {
                id,
                name: name.to_string(),
                description: description.to_string(),
                creator,
                created_at: now,
                rules,
                is_active: true,
                moderators,
                members,
                treasury_balance: community_share,
            },
        );

        info!(community = id, name, %creator, "community created");
        events.emit(Event::CommunityCreated {
            community: id,
            name: name.to_string(),
            creator,
            treasury_deposit: community_share,
            protocol_fee: protocol_share,
        });
        Ok((id, protocol_share))
    }

    // ------------------------------------------------------------- membership

    /// Join a community. A no-op (not an error) for existing members.
    pub fn join(
        &mut self,
        identity: &IdentityLedger,
        wallet: Wallet,
        id: CommunityId,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        identity.require_active(wallet)?;
        let community = self
            .communities
            .get_mut(&id)
            .ok_or(LedgerError::CommunityNotFound(id))?;
        if !community.is_active {
            return Err(LedgerError::CommunityInactive(id));
        }
        if community.members.insert(wallet) {
            debug!(community = id, %wallet, "member joined");
            events.emit(Event::MemberJoined {
                community: id,
                wallet,
            });
        }
        Ok(())
    }

    /// Leave a community. A no-op (not an error) for non-members; banned
    /// users may still leave.
    pub fn leave(
        &mut self,
        identity: &IdentityLedger,
        wallet: Wallet,
        id: CommunityId,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        identity.profile(wallet)?;
        let community = self
            .communities
            .get_mut(&id)
            .ok_or(LedgerError::CommunityNotFound(id))?;
        if community.members.remove(&wallet) {
            debug!(community = id, %wallet, "member left");
            events.emit(Event::MemberLeft {
                community: id,
                wallet,
            });
        }
        Ok(())
    }

    // ---------------------------------------------------------- posting gates

    /// Composite gate for posting: community active, caller registered and
    /// unbanned, karma at or above the community threshold. Returns the
    /// community so callers can read its cooldown base.
    pub fn can_user_post(
        &self,
        identity: &IdentityLedger,
        wallet: Wallet,
        id: CommunityId,
    ) -> LedgerResult<&Community> {
        let community = self.community(id)?;
        if !community.is_active {
            return Err(LedgerError::CommunityInactive(id));
        }
        let profile = identity.require_active(wallet)?;
        require_karma(profile.karma, community.rules.min_karma_to_post)?;
        Ok(community)
    }

    /// Composite gate for commenting; see [`Self::can_user_post`].
    pub fn can_user_comment(
        &self,
        identity: &IdentityLedger,
        wallet: Wallet,
        id: CommunityId,
    ) -> LedgerResult<&Community> {
        let community = self.community(id)?;
        if !community.is_active {
            return Err(LedgerError::CommunityInactive(id));
        }
        let profile = identity.require_active(wallet)?;
        require_karma(profile.karma, community.rules.min_karma_to_comment)?;
        Ok(community)
    }

    /// Karma gate for voting on content in this community.
    pub fn can_user_vote(
        &self,
        identity: &IdentityLedger,
        wallet: Wallet,
        id: CommunityId,
    ) -> LedgerResult<&Community> {
        let community = self.community(id)?;
        if !community.is_active {
            return Err(LedgerError::CommunityInactive(id));
        }
        let profile = identity.require_active(wallet)?;
        require_karma(profile.karma, community.rules.min_karma_to_vote)?;
        Ok(community)
    }

    // --------------------------------------------------------------- treasury

    /// Deposit into a community treasury. Client-callable.
    pub fn deposit_treasury(
        &mut self,
        id: CommunityId,
        amount: Amount,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        let community = self
            .communities
            .get_mut(&id)
            .ok_or(LedgerError::CommunityNotFound(id))?;
        community.treasury_balance = community.treasury_balance.saturating_add(amount);
        events.emit(Event::TreasuryDeposit {
            community: id,
            amount,
        });
        Ok(())
    }

    /// Withdraw from a community treasury. Privileged (governance dispatch).
    pub fn withdraw_treasury(
        &mut self,
        _cap: &SystemCap,
        id: CommunityId,
        recipient: Wallet,
        amount: Amount,
        events: &mut EventLog,
    ) -> LedgerResult<Amount> {
        let community = self
            .communities
            .get_mut(&id)
            .ok_or(LedgerError::CommunityNotFound(id))?;
        if amount > community.treasury_balance {
            return Err(LedgerError::TreasuryUnderfunded {
                community: id,
                requested: amount,
                available: community.treasury_balance,
            });
        }
        community.treasury_balance -= amount;
        info!(community = id, %recipient, amount, "treasury withdrawal");
        events.emit(Event::TreasuryWithdrawal {
            community: id,
            recipient,
            amount,
        });
        Ok(amount)
    }

    // ---------------------------------------------- governance-only mutators

    /// Replace the rule thresholds. Privileged (RuleChange dispatch).
    pub fn update_config(
        &mut self,
        _cap: &SystemCap,
        id: CommunityId,
        rules: CommunityRules,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        let community = self
            .communities
            .get_mut(&id)
            .ok_or(LedgerError::CommunityNotFound(id))?;
        community.rules = rules;
        info!(community = id, "community config updated");
        events.emit(Event::CommunityConfigUpdated { community: id });
        Ok(())
    }

    /// Replace the description text. Privileged (ConfigChange dispatch).
    ///
    /// The crossed config/rules naming follows the source dispatch table.
    pub fn update_rules(
        &mut self,
        _cap: &SystemCap,
        id: CommunityId,
        description: &str,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        if description.len() > MAX_COMMUNITY_DESCRIPTION_LENGTH {
            return Err(LedgerError::FieldTooLong {
                field: "description",
                max: MAX_COMMUNITY_DESCRIPTION_LENGTH,
                actual: description.len(),
            });
        }
        let community = self
            .communities
            .get_mut(&id)
            .ok_or(LedgerError::CommunityNotFound(id))?;
        community.description = description.to_string();
        events.emit(Event::CommunityRulesUpdated { community: id });
        Ok(())
    }

    /// Appoint a moderator. Privileged (ModeratorElection dispatch).
    ///
    /// Fails if the wallet is already an active moderator or the active
    /// moderator cap is reached. A previously removed moderator is
    /// reactivated in place.
    pub fn add_moderator(
        &mut self,
        _cap: &SystemCap,
        id: CommunityId,
        wallet: Wallet,
        votes_received: u64,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        let community = self
            .communities
            .get_mut(&id)
            .ok_or(LedgerError::CommunityNotFound(id))?;
        if community.is_moderator(wallet) {
            return Err(LedgerError::ModeratorExists {
                wallet,
                community: id,
            });
        }
        if community.active_moderator_count() >= MAX_MODERATORS {
            return Err(LedgerError::ModeratorCapReached(id));
        }
        community.moderators.insert(
            wallet,
            ModeratorInfo {
                appointed_at: now,
                votes_received,
                is_active: true,
            },
        );
        info!(community = id, %wallet, "moderator added");
        events.emit(Event::ModeratorAdded {
            community: id,
            wallet,
        });
        Ok(())
    }

    /// Deactivate a moderator. Privileged (ModeratorRemoval dispatch).
    pub fn remove_moderator(
        &mut self,
        _cap: &SystemCap,
        id: CommunityId,
        wallet: Wallet,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        let community = self
            .communities
            .get_mut(&id)
            .ok_or(LedgerError::CommunityNotFound(id))?;
        match community.moderators.get_mut(&wallet) {
            Some(info) if info.is_active => {
                info.is_active = false;
            }
            _ => {
                return Err(LedgerError::NotModerator {
                    wallet,
                    community: id,
                })
            }
        }
        info!(community = id, %wallet, "moderator removed");
        events.emit(Event::ModeratorRemoved {
            community: id,
            wallet,
        });
        Ok(())
    }

    /// Activate or deactivate the community. Privileged.
    pub fn set_active(
        &mut self,
        _cap: &SystemCap,
        id: CommunityId,
        active: bool,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        let community = self
            .communities
            .get_mut(&id)
            .ok_or(LedgerError::CommunityNotFound(id))?;
        if community.is_active != active {
            community.is_active = active;
            info!(community = id, active, "community active flag set");
            events.emit(Event::CommunityActiveSet {
                community: id,
                active,
            });
        }
        Ok(())
    }
}

fn require_karma(actual: Karma, required: Karma) -> LedgerResult<()> {
    if actual < required {
        return Err(LedgerError::InsufficientKarma { required, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::events::KarmaReason;

    fn wallet(b: u8) -> Wallet {
        Wallet::new([b; 32])
    }

    struct Fixture {
        identity: IdentityLedger,
        registry: CommunityRegistry,
        cap: SystemCap,
        events: EventLog,
    }

    fn setup() -> Fixture {
        let mut fx = Fixture {
            identity: IdentityLedger::new(),
            registry: CommunityRegistry::new(),
            cap: SystemCap::mint(),
            events: EventLog::new(),
        };
        fx.identity
            .register(wallet(1), "alice", 0, &mut fx.events)
            .unwrap();
        fx.identity
            .register(wallet(2), "bob", 0, &mut fx.events)
            .unwrap();
        fx
    }

    fn create_default(fx: &mut Fixture) -> CommunityId {
        let (id, _) = fx
            .registry
            .create(
                &fx.identity,
                wallet(1),
                "rustaceans",
                "a place for crabs",
                CommunityRules::default(),
                COMMUNITY_CREATION_COST,
                100,
                &mut fx.events,
            )
            .unwrap();
        id
    }

    #[test]
    fn test_create_splits_payment_and_seats_creator() {
        let mut fx = setup();
        let payment = COMMUNITY_CREATION_COST + 1; // odd amount
        let (id, protocol_share) = fx
            .registry
            .create(
                &fx.identity,
                wallet(1),
                "rustaceans",
                "",
                CommunityRules::default(),
                payment,
                100,
                &mut fx.events,
            )
            .unwrap();
        let community = fx.registry.community(id).unwrap();

        // Integer split: community keeps the rounding unit
        assert_eq!(protocol_share, payment / 2);
        assert_eq!(community.treasury_balance, payment - payment / 2);
        assert!(community.treasury_balance >= protocol_share);

        assert!(community.is_moderator(wallet(1)));
        assert!(community.is_member(wallet(1)));
        assert_eq!(community.member_count(), 1);
    }

    #[test]
    fn test_create_rejects_underpayment_and_taken_name() {
        let mut fx = setup();
        create_default(&mut fx);
        let err = fx
            .registry
            .create(
                &fx.identity,
                wallet(2),
                "other",
                "",
                CommunityRules::default(),
                COMMUNITY_CREATION_COST - 1,
                100,
                &mut fx.events,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientPayment { .. }));

        let err = fx
            .registry
            .create(
                &fx.identity,
                wallet(2),
                "rustaceans",
                "",
                CommunityRules::default(),
                COMMUNITY_CREATION_COST,
                100,
                &mut fx.events,
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::CommunityNameTaken("rustaceans".into()));
    }

    #[test]
    fn test_join_and_leave_are_idempotent() {
        let mut fx = setup();
        let id = create_default(&mut fx);
        fx.registry
            .join(&fx.identity, wallet(2), id, &mut fx.events)
            .unwrap();
        fx.registry
            .join(&fx.identity, wallet(2), id, &mut fx.events)
            .unwrap();
        assert_eq!(fx.registry.member_count(id).unwrap(), 2);

        fx.registry
            .leave(&fx.identity, wallet(2), id, &mut fx.events)
            .unwrap();
        fx.registry
            .leave(&fx.identity, wallet(2), id, &mut fx.events)
            .unwrap();
        assert_eq!(fx.registry.member_count(id).unwrap(), 1);
    }

    #[test]
    fn test_posting_gate_checks_threshold_and_active() {
        let mut fx = setup();
        let id = create_default(&mut fx);
        fx.registry
            .update_config(
                &fx.cap,
                id,
                CommunityRules {
                    min_karma_to_post: 50,
                    ..CommunityRules::default()
                },
                &mut fx.events,
            )
            .unwrap();

        let err = fx
            .registry
            .can_user_post(&fx.identity, wallet(2), id)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientKarma {
                required: 50,
                actual: 1
            }
        );

        fx.identity
            .update_karma(&fx.cap, wallet(2), 100, KarmaReason::Admin, 50, &mut fx.events)
            .unwrap();
        fx.registry.can_user_post(&fx.identity, wallet(2), id).unwrap();

        fx.registry
            .set_active(&fx.cap, id, false, &mut fx.events)
            .unwrap();
        assert_eq!(
            fx.registry.can_user_post(&fx.identity, wallet(2), id),
            Err(LedgerError::CommunityInactive(id))
        );
    }

    #[test]
    fn test_deactivated_community_refuses_all_gates() {
        let mut fx = setup();
        let id = create_default(&mut fx);
        fx.registry
            .set_active(&fx.cap, id, false, &mut fx.events)
            .unwrap();

        assert_eq!(
            fx.registry.can_user_post(&fx.identity, wallet(2), id),
            Err(LedgerError::CommunityInactive(id))
        );
        assert_eq!(
            fx.registry.can_user_comment(&fx.identity, wallet(2), id),
            Err(LedgerError::CommunityInactive(id))
        );
        assert_eq!(
            fx.registry.can_user_vote(&fx.identity, wallet(2), id),
            Err(LedgerError::CommunityInactive(id))
        );
    }

    #[test]
    fn test_moderator_add_remove_and_cap() {
        let mut fx = setup();
        let id = create_default(&mut fx);

        fx.registry
            .add_moderator(&fx.cap, id, wallet(2), 7, 200, &mut fx.events)
            .unwrap();
        assert!(matches!(
            fx.registry
                .add_moderator(&fx.cap, id, wallet(2), 0, 200, &mut fx.events),
            Err(LedgerError::ModeratorExists { .. })
        ));

        // Fill to the cap (creator + bob already seated)
        for b in 3..=(MAX_MODERATORS as u8) {
            fx.identity
                .register(wallet(b + 100), &format!("mod{b}"), 0, &mut fx.events)
                .unwrap();
            fx.registry
                .add_moderator(&fx.cap, id, wallet(b + 100), 0, 200, &mut fx.events)
                .unwrap();
        }
        assert_eq!(
            fx.registry
                .add_moderator(&fx.cap, id, wallet(250), 0, 200, &mut fx.events),
            Err(LedgerError::ModeratorCapReached(id))
        );

        fx.registry
            .remove_moderator(&fx.cap, id, wallet(2), &mut fx.events)
            .unwrap();
        assert!(!fx.registry.community(id).unwrap().is_moderator(wallet(2)));
        assert!(matches!(
            fx.registry
                .remove_moderator(&fx.cap, id, wallet(2), &mut fx.events),
            Err(LedgerError::NotModerator { .. })
        ));

        // Removed moderator freed a seat and can be reappointed
        fx.registry
            .add_moderator(&fx.cap, id, wallet(2), 3, 300, &mut fx.events)
            .unwrap();
    }

    #[test]
    fn test_treasury_withdraw_bounds() {
        let mut fx = setup();
        let id = create_default(&mut fx);
        let balance = fx.registry.community(id).unwrap().treasury_balance;

        let err = fx
            .registry
            .withdraw_treasury(&fx.cap, id, wallet(2), balance + 1, &mut fx.events)
            .unwrap_err();
        assert!(matches!(err, LedgerError::TreasuryUnderfunded { .. }));

        fx.registry
            .withdraw_treasury(&fx.cap, id, wallet(2), balance, &mut fx.events)
            .unwrap();
        assert_eq!(fx.registry.community(id).unwrap().treasury_balance, 0);

        fx.registry.deposit_treasury(id, 500, &mut fx.events).unwrap();
        assert_eq!(fx.registry.community(id).unwrap().treasury_balance, 500);
    }
}
