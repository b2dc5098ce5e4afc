//! Post and comment records

use serde::{Deserialize, Serialize};
use std::fmt;

use lib_types::{CommentId, CommunityId, PostId, Timestamp, Wallet};

/// What a post carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostKind {
    /// Title + text body
    Text,
    /// Title + content-addressed media reference
    Media,
    /// Media with meme semantics (ranked separately by clients)
    Meme,
}

/// Soft-visibility status; the only thing moderation ever changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentStatus {
    /// Normal
    Visible,
    /// Hidden by moderation; blocks new comments and votes
    Hidden,
    /// Auto-flagged for review; still commentable and votable
    Flagged,
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentStatus::Visible => "visible",
            ContentStatus::Hidden => "hidden",
            ContentStatus::Flagged => "flagged",
        };
        f.write_str(s)
    }
}

/// A post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Identifier (1-indexed)
    pub id: PostId,
    /// Owning community
    pub community_id: CommunityId,
    /// Author wallet
    pub author: Wallet,
    /// Content kind
    pub kind: PostKind,
    /// Title
    pub title: String,
    /// Text body (`Text` posts only)
    pub body: Option<String>,
    /// Content-address reference into the blob store (`Media`/`Meme` only);
    /// opaque to the ledger, never fetched or validated
    pub media_ref: Option<String>,
    /// MIME tag accompanying `media_ref`
    pub mime_type: Option<String>,
    /// Net vote score; mutated only by the voting engine
    pub score: i64,
    /// Comments anywhere in this post's tree
    pub comment_count: u64,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// Soft-visibility status; mutated only by moderation
    pub status: ContentStatus,
}

/// A comment in a post's tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Identifier (1-indexed)
    pub id: CommentId,
    /// Post rooting this comment's tree
    pub post_id: PostId,
    /// Parent comment, 0 for top-level
    pub parent_id: CommentId,
    /// Author wallet
    pub author: Wallet,
    /// Comment text
    pub content: String,
    /// Net vote score; mutated only by the voting engine
    pub score: i64,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// Soft-visibility status; mutated only by moderation
    pub status: ContentStatus,
}

/// The cross-component view of a content item, enough for voting and
/// moderation to run their gates without knowing post/comment internals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentMeta {
    /// Author wallet
    pub author: Wallet,
    /// Owning community
    pub community_id: CommunityId,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// Current status
    pub status: ContentStatus,
    /// True for posts, false for comments
    pub is_post: bool,
}
