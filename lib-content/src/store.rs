//! Content store operations

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lib_community::CommunityRegistry;
use lib_identity::IdentityLedger;
use lib_types::constants::{
    MAX_BODY_LENGTH, MAX_COMMENT_LENGTH, MAX_MEDIA_REF_LENGTH, MAX_MIME_TYPE_LENGTH,
    MAX_TITLE_LENGTH,
};
use lib_types::{
    CommentId, CommunityId, ContentRef, Event, EventLog, LedgerError, LedgerResult, PostId,
    SystemCap, Timestamp, Wallet,
};

use crate::content::{Comment, ContentMeta, ContentStatus, Post, PostKind};

/// Posts and comments with author/community indexes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentStore {
    posts: HashMap<PostId, Post>,
    comments: HashMap<CommentId, Comment>,
    next_post_id: PostId,
    next_comment_id: CommentId,
    posts_by_author: HashMap<Wallet, Vec<PostId>>,
    posts_by_community: HashMap<CommunityId, Vec<PostId>>,
    comments_by_post: HashMap<PostId, Vec<CommentId>>,
}

impl ContentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------ reads

    /// Look up a post
    pub fn post(&self, id: PostId) -> LedgerResult<&Post> {
        self.posts.get(&id).ok_or(LedgerError::PostNotFound(id))
    }

    /// Look up a comment
    pub fn comment(&self, id: CommentId) -> LedgerResult<&Comment> {
        self.comments
            .get(&id)
            .ok_or(LedgerError::CommentNotFound(id))
    }

    /// Cross-component metadata for any content reference
    pub fn content_meta(&self, content: ContentRef) -> LedgerResult<ContentMeta> {
        match content {
            ContentRef::Post(id) => {
                let post = self.post(id)?;
                Ok(ContentMeta {
                    author: post.author,
                    community_id: post.community_id,
                    created_at: post.created_at,
                    status: post.status,
                    is_post: true,
                })
            }
            ContentRef::Comment(id) => {
                let comment = self.comment(id)?;
                // A comment's community is its post's community
                let post = self.post(comment.post_id)?;
                Ok(ContentMeta {
                    author: comment.author,
                    community_id: post.community_id,
                    created_at: comment.created_at,
                    status: comment.status,
                    is_post: false,
                })
            }
        }
    }

    /// Post IDs authored by a wallet, oldest first
    pub fn posts_by_author(&self, author: Wallet) -> &[PostId] {
        self.posts_by_author
            .get(&author)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Post IDs in a community, oldest first
    pub fn posts_by_community(&self, community: CommunityId) -> &[PostId] {
        self.posts_by_community
            .get(&community)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Comment IDs under a post, oldest first
    pub fn comments_by_post(&self, post: PostId) -> &[CommentId] {
        self.comments_by_post
            .get(&post)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // --------------------------------------------------------------- creation

    /// Create a text post.
    #[allow(clippy::too_many_arguments)]
    pub fn create_text_post(
        &mut self,
        cap: &SystemCap,
        identity: &mut IdentityLedger,
        communities: &CommunityRegistry,
        author: Wallet,
        community_id: CommunityId,
        title: &str,
        body: &str,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<PostId> {
        let community = communities.can_user_post(identity, author, community_id)?;
        identity.check_post_cooldown(author, community.rules.post_cooldown, now)?;
        validate_text("title", title, MAX_TITLE_LENGTH)?;
        validate_text("body", body, MAX_BODY_LENGTH)?;

        let id = self.insert_post(Post {
            id: 0, // assigned by insert_post
            community_id,
            author,
            kind: PostKind::Text,
            title: title.to_string(),
            body: Some(body.to_string()),
            media_ref: None,
            mime_type: None,
            score: 0,
            comment_count: 0,
            created_at: now,
            status: ContentStatus::Visible,
        });

        identity.record_post_activity(cap, author, now)?;
        info!(post = id, community = community_id, %author, "text post created");
        events.emit(Event::PostCreated {
            post: id,
            community: community_id,
            author,
        });
        Ok(id)
    }

    /// Create a media or meme post. The media reference is an opaque,
    /// pre-validated content address; the ledger only stores it.
    #[allow(clippy::too_many_arguments)]
    pub fn create_media_post(
        &mut self,
        cap: &SystemCap,
        identity: &mut IdentityLedger,
        communities: &CommunityRegistry,
        author: Wallet,
        community_id: CommunityId,
        kind: PostKind,
        title: &str,
        media_ref: &str,
        mime_type: &str,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<PostId> {
        if kind == PostKind::Text {
            return Err(LedgerError::InvalidPostKind {
                kind: format!("{kind:?}"),
            });
        }
        let community = communities.can_user_post(identity, author, community_id)?;
        identity.check_post_cooldown(author, community.rules.post_cooldown, now)?;
        validate_text("title", title, MAX_TITLE_LENGTH)?;
        validate_text("media_ref", media_ref, MAX_MEDIA_REF_LENGTH)?;
        validate_text("mime_type", mime_type, MAX_MIME_TYPE_LENGTH)?;

        let id = self.insert_post(Post {
            id: 0,
            community_id,
            author,
            kind,
            title: title.to_string(),
            body: None,
            media_ref: Some(media_ref.to_string()),
            mime_type: Some(mime_type.to_string()),
            score: 0,
            comment_count: 0,
            created_at: now,
            status: ContentStatus::Visible,
        });

        identity.record_post_activity(cap, author, now)?;
        info!(post = id, community = community_id, %author, ?kind, "media post created");
        events.emit(Event::PostCreated {
            post: id,
            community: community_id,
            author,
        });
        Ok(id)
    }

    /// Create a comment under a post.
    ///
    /// The post must exist and not be `Hidden` (`Flagged` posts stay
    /// commentable). A nonzero `parent_id` must be an existing comment on
    /// the same post. Every comment, at any depth, bumps the post's
    /// `comment_count`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_comment(
        &mut self,
        cap: &SystemCap,
        identity: &mut IdentityLedger,
        communities: &CommunityRegistry,
        author: Wallet,
        post_id: PostId,
        parent_id: CommentId,
        content: &str,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<CommentId> {
        let (community_id, status) = {
            let post = self.post(post_id)?;
            (post.community_id, post.status)
        };
        if status == ContentStatus::Hidden {
            return Err(LedgerError::ContentNotVisible(ContentRef::Post(post_id)));
        }
        if parent_id != 0 {
            let parent = self.comment(parent_id)?;
            if parent.post_id != post_id {
                return Err(LedgerError::ParentNotInPost {
                    parent: parent_id,
                    post: post_id,
                });
            }
        }

        let community = communities.can_user_comment(identity, author, community_id)?;
        identity.check_comment_cooldown(author, community.rules.comment_cooldown, now)?;
        validate_text("content", content, MAX_COMMENT_LENGTH)?;

        self.next_comment_id += 1;
        let id = self.next_comment_id;
        self.comments.insert(
            id,
            Comment {
                id,
                post_id,
                parent_id,
                author,
                content: content.to_string(),
                score: 0,
                created_at: now,
                status: ContentStatus::Visible,
            },
        );
        self.comments_by_post.entry(post_id).or_default().push(id);
        // Checked above; the post cannot have vanished within this transition
        if let Some(post) = self.posts.get_mut(&post_id) {
            post.comment_count += 1;
        }

        identity.record_comment_activity(cap, author, now)?;
        debug!(comment = id, post = post_id, parent = parent_id, %author, "comment created");
        events.emit(Event::CommentCreated {
            comment: id,
            post: post_id,
            parent: parent_id,
            author,
        });
        Ok(id)
    }

    // ----------------------------------------------------- privileged writes

    /// Adjust a post's score. Privileged (voting engine only).
    pub fn adjust_post_score(
        &mut self,
        _cap: &SystemCap,
        id: PostId,
        delta: i64,
        events: &mut EventLog,
    ) -> LedgerResult<i64> {
        let post = self.posts.get_mut(&id).ok_or(LedgerError::PostNotFound(id))?;
        post.score += delta;
        events.emit(Event::ScoreAdjusted {
            content: ContentRef::Post(id),
            delta,
            new_score: post.score,
        });
        Ok(post.score)
    }

    /// Adjust a comment's score. Privileged (voting engine only).
    pub fn adjust_comment_score(
        &mut self,
        _cap: &SystemCap,
        id: CommentId,
        delta: i64,
        events: &mut EventLog,
    ) -> LedgerResult<i64> {
        let comment = self
            .comments
            .get_mut(&id)
            .ok_or(LedgerError::CommentNotFound(id))?;
        comment.score += delta;
        events.emit(Event::ScoreAdjusted {
            content: ContentRef::Comment(id),
            delta,
            new_score: comment.score,
        });
        Ok(comment.score)
    }

    /// Transition a content item's status. Privileged (moderation only).
    pub fn set_status(
        &mut self,
        _cap: &SystemCap,
        content: ContentRef,
        status: ContentStatus,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        match content {
            ContentRef::Post(id) => {
                let post = self.posts.get_mut(&id).ok_or(LedgerError::PostNotFound(id))?;
                post.status = status;
            }
            ContentRef::Comment(id) => {
                let comment = self
                    .comments
                    .get_mut(&id)
                    .ok_or(LedgerError::CommentNotFound(id))?;
                comment.status = status;
            }
        }
        info!(%content, %status, "content status changed");
        events.emit(Event::ContentStatusChanged {
            content,
            status: status.to_string(),
        });
        Ok(())
    }

    fn insert_post(&mut self, mut post: Post) -> PostId {
        self.next_post_id += 1;
        let id = self.next_post_id;
        post.id = id;
        self.posts_by_author.entry(post.author).or_default().push(id);
        self.posts_by_community
            .entry(post.community_id)
            .or_default()
            .push(id);
        self.posts.insert(id, post);
        id
    }
}

fn validate_text(field: &'static str, value: &str, max: usize) -> LedgerResult<()> {
    if value.is_empty() {
        return Err(LedgerError::EmptyField { field });
    }
    if value.len() > max {
        return Err(LedgerError::FieldTooLong {
            field,
            max,
            actual: value.len(),
        });
    }
    Ok(())
}
