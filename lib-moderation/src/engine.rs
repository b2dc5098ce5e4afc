//! Moderation engine operations

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lib_community::CommunityRegistry;
use lib_content::{ContentStatus, ContentStore};
use lib_identity::IdentityLedger;
use lib_types::constants::{
    KARMA_BONUS_VALID_REPORT, KARMA_PENALTY_CONTENT_HIDDEN, KARMA_PENALTY_FRIVOLOUS_REPORT,
    MAX_REPORT_REASON_LENGTH, REPORTS_FOR_AUTO_REVIEW, REPORT_COOLDOWN,
};
use lib_types::events::KarmaReason;
use lib_types::{
    ContentRef, Event, EventLog, Karma, LedgerError, LedgerResult, ReportId, SystemCap, Timestamp,
    Wallet,
};
use lib_voting::StakeVotingEngine;

use crate::report::{ActionKind, ModerationAction, Report, ReportResolution};

/// Reports, resolutions and the per-content action log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModerationEngine {
    reports: HashMap<ReportId, Report>,
    next_report_id: ReportId,
    /// content → reporter → report, enforcing one report per pair
    reports_by_content: HashMap<ContentRef, HashMap<Wallet, ReportId>>,
    /// Unresolved-or-not report totals per content, drives auto-flagging
    report_counts: HashMap<ContentRef, u32>,
    /// Last report timestamp per reporter, drives the report cooldown
    last_report_at: HashMap<Wallet, Timestamp>,
    /// Append-only; entries are never edited or removed
    action_log: HashMap<ContentRef, Vec<ModerationAction>>,
}

impl ModerationEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------ reads

    /// Look up a report
    pub fn report(&self, id: ReportId) -> LedgerResult<&Report> {
        self.reports.get(&id).ok_or(LedgerError::ReportNotFound(id))
    }

    /// Total reports filed against a content item
    pub fn report_count(&self, content: ContentRef) -> u32 {
        self.report_counts.get(&content).copied().unwrap_or(0)
    }

    /// The immutable action log for a content item, oldest first
    pub fn action_log(&self, content: ContentRef) -> &[ModerationAction] {
        self.action_log
            .get(&content)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // -------------------------------------------------------------- reporting

    /// File a report against a content item.
    ///
    /// Rate-limited to one report per reporter per [`REPORT_COOLDOWN`]
    /// across all content; one report per (reporter, content) pair ever;
    /// authors cannot report themselves. The
    /// [`REPORTS_FOR_AUTO_REVIEW`]-th report flags still-visible content
    /// for review.
    #[allow(clippy::too_many_arguments)]
    pub fn report_content(
        &mut self,
        cap: &SystemCap,
        identity: &IdentityLedger,
        content_store: &mut ContentStore,
        reporter: Wallet,
        content: ContentRef,
        reason: &str,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<ReportId> {
        identity.require_active(reporter)?;
        let meta = content_store.content_meta(content)?;
        if meta.author == reporter {
            return Err(LedgerError::SelfAction(content));
        }
        if let Some(&last) = self.last_report_at.get(&reporter) {
            let next_allowed = last.saturating_add(REPORT_COOLDOWN);
            if now < next_allowed {
                return Err(LedgerError::ReportCooldown { next_allowed });
            }
        }
        if self
            .reports_by_content
            .get(&content)
            .is_some_and(|by| by.contains_key(&reporter))
        {
            return Err(LedgerError::DuplicateReport { content, reporter });
        }
        if reason.is_empty() {
            return Err(LedgerError::EmptyField { field: "reason" });
        }
        if reason.len() > MAX_REPORT_REASON_LENGTH {
            return Err(LedgerError::FieldTooLong {
                field: "reason",
                max: MAX_REPORT_REASON_LENGTH,
                actual: reason.len(),
            });
        }

        self.next_report_id += 1;
        let id = self.next_report_id;
        self.reports.insert(
            id,
            Report {
                id,
                content,
                reporter,
                reason: reason.to_string(),
                timestamp: now,
                resolved: false,
                upheld: false,
            },
        );
        self.reports_by_content
            .entry(content)
            .or_default()
            .insert(reporter, id);
        self.last_report_at.insert(reporter, now);
        let count = self.report_counts.entry(content).or_insert(0);
        *count += 1;
        let count = *count;

        debug!(report = id, %content, %reporter, count, "content reported");
        events.emit(Event::ContentReported {
            report: id,
            content,
            reporter,
        });

        if count == REPORTS_FOR_AUTO_REVIEW && meta.status == ContentStatus::Visible {
            content_store.set_status(cap, content, ContentStatus::Flagged, events)?;
            info!(%content, count, "auto-flagged for review");
            events.emit(Event::ContentAutoFlagged {
                content,
                report_count: count,
            });
        }
        Ok(id)
    }

    // ------------------------------------------------------------ resolution

    /// Resolve a report. The caller must be an active moderator of the
    /// content's community; resolution is terminal.
    ///
    /// Upheld: content is hidden, the author loses
    /// [`KARMA_PENALTY_CONTENT_HIDDEN`], the reporter gains
    /// [`KARMA_BONUS_VALID_REPORT`]. Dismissed as frivolous: the reporter
    /// loses [`KARMA_PENALTY_FRIVOLOUS_REPORT`]. Dismissed otherwise: no
    /// karma moves.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve_report(
        &mut self,
        cap: &SystemCap,
        identity: &mut IdentityLedger,
        communities: &CommunityRegistry,
        content_store: &mut ContentStore,
        moderator: Wallet,
        report_id: ReportId,
        resolution: ReportResolution,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        let (content, reporter) = {
            let report = self.report(report_id)?;
            if report.resolved {
                return Err(LedgerError::ReportAlreadyResolved(report_id));
            }
            (report.content, report.reporter)
        };
        let meta = content_store.content_meta(content)?;
        communities.require_moderator(meta.community_id, moderator)?;

        let report = self
            .reports
            .get_mut(&report_id)
            .ok_or(LedgerError::ReportNotFound(report_id))?;
        report.resolved = true;
        report.upheld = resolution.uphold;

        let kind = if resolution.uphold {
            content_store.set_status(cap, content, ContentStatus::Hidden, events)?;
            identity.update_karma(
                cap,
                meta.author,
                -KARMA_PENALTY_CONTENT_HIDDEN,
                KarmaReason::ContentHidden,
                now,
                events,
            )?;
            identity.update_karma(
                cap,
                reporter,
                KARMA_BONUS_VALID_REPORT,
                KarmaReason::ValidReport,
                now,
                events,
            )?;
            ActionKind::ReportUpheld { report: report_id }
        } else {
            if resolution.frivolous {
                identity.update_karma(
                    cap,
                    reporter,
                    -KARMA_PENALTY_FRIVOLOUS_REPORT,
                    KarmaReason::FrivolousReport,
                    now,
                    events,
                )?;
            }
            ActionKind::ReportDismissed {
                report: report_id,
                frivolous: resolution.frivolous,
            }
        };
        self.log_action(content, moderator, now, kind);

        info!(report = report_id, upheld = resolution.uphold, %moderator, "report resolved");
        events.emit(Event::ReportResolved {
            report: report_id,
            upheld: resolution.uphold,
            frivolous: resolution.frivolous,
            moderator,
        });
        Ok(())
    }

    // -------------------------------------------------------- direct action

    /// Direct moderator action without a report, for urgent cases:
    /// optionally hides the content and/or applies a karma penalty to the
    /// author in one call. `karma_penalty` is the positive amount to remove.
    #[allow(clippy::too_many_arguments)]
    pub fn moderator_action(
        &mut self,
        cap: &SystemCap,
        identity: &mut IdentityLedger,
        communities: &CommunityRegistry,
        content_store: &mut ContentStore,
        moderator: Wallet,
        content: ContentRef,
        hide: bool,
        karma_penalty: Karma,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        let meta = content_store.content_meta(content)?;
        communities.require_moderator(meta.community_id, moderator)?;

        if hide {
            content_store.set_status(cap, content, ContentStatus::Hidden, events)?;
        }
        if karma_penalty > 0 {
            identity.update_karma(
                cap,
                meta.author,
                -karma_penalty,
                KarmaReason::ModeratorAction,
                now,
                events,
            )?;
        }
        self.log_action(
            content,
            moderator,
            now,
            ActionKind::Direct {
                hidden: hide,
                karma_penalty,
            },
        );
        info!(%content, %moderator, hide, karma_penalty, "direct moderator action");
        events.emit(Event::ModeratorActionTaken {
            content,
            moderator,
            hidden: hide,
            karma_penalty,
        });
        Ok(())
    }

    /// Restore hidden or flagged content to visible. Logged as its own
    /// action kind; a no-op on already-visible content.
    #[allow(clippy::too_many_arguments)]
    pub fn unhide_content(
        &mut self,
        cap: &SystemCap,
        communities: &CommunityRegistry,
        content_store: &mut ContentStore,
        moderator: Wallet,
        content: ContentRef,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        let meta = content_store.content_meta(content)?;
        communities.require_moderator(meta.community_id, moderator)?;
        if meta.status == ContentStatus::Visible {
            return Ok(());
        }
        content_store.set_status(cap, content, ContentStatus::Visible, events)?;
        self.log_action(content, moderator, now, ActionKind::Unhide);
        info!(%content, %moderator, "content unhidden");
        events.emit(Event::ContentUnhidden { content, moderator });
        Ok(())
    }

    /// Slash a voter's stake on a content item. Moderator-authorized entry
    /// to [`StakeVotingEngine::slash_stake`].
    #[allow(clippy::too_many_arguments)]
    pub fn slash_vote_stake(
        &mut self,
        cap: &SystemCap,
        communities: &CommunityRegistry,
        content_store: &ContentStore,
        voting: &mut StakeVotingEngine,
        moderator: Wallet,
        content: ContentRef,
        voter: Wallet,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        let meta = content_store.content_meta(content)?;
        communities.require_moderator(meta.community_id, moderator)?;
        voting.slash_stake(cap, content, voter, events)?;
        self.log_action(content, moderator, now, ActionKind::StakeSlash { voter });
        Ok(())
    }

    fn log_action(
        &mut self,
        content: ContentRef,
        moderator: Wallet,
        at: Timestamp,
        kind: ActionKind,
    ) {
        self.action_log
            .entry(content)
            .or_default()
            .push(ModerationAction {
                moderator,
                at,
                kind,
            });
    }
}
