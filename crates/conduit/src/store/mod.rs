//! Persistence contracts.
//!
//! The usecases only see these traits. [`MemoryStore`] implements all of
//! them over in-process tables; a database-backed store would implement the
//! same traits.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conduit_core::StandardError;
use std::sync::Arc;
use thiserror::Error;

/// Result type for repository calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Repository failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No row matches.
    #[error("{entity} not found")]
    NotFound {
        /// Entity name, e.g. `user`.
        entity: &'static str,
    },

    /// A unique column already holds the value.
    #[error("{field} has already been taken")]
    Duplicate {
        /// Column name, e.g. `email`.
        field: &'static str,
    },

    /// The backing store failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` for [`StoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for StandardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity } => StandardError::not_found(entity, "not found"),
            StoreError::Duplicate { field } => StandardError::conflict(field, "has already been taken"),
            StoreError::Unavailable(_) => StandardError::internal_with_cause("store unavailable", err),
        }
    }
}

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Primary key.
    pub id: u64,
    /// Unique email.
    pub email: String,
    /// Unique handle.
    pub username: String,
    /// bcrypt hash.
    pub password_hash: String,
    /// Bio.
    pub bio: String,
    /// Avatar URL.
    pub image: String,
}

/// Values for a new account.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    /// Unique email.
    pub email: String,
    /// Unique handle.
    pub username: String,
    /// bcrypt hash.
    pub password_hash: String,
}

/// Columns to overwrite on an account; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New email.
    pub email: Option<String>,
    /// New handle.
    pub username: Option<String>,
    /// New hash.
    pub password_hash: Option<String>,
    /// New bio.
    pub bio: Option<String>,
    /// New avatar URL.
    pub image: Option<String>,
}

/// A stored article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    /// Primary key.
    pub id: u64,
    /// Unique slug.
    pub slug: String,
    /// Headline.
    pub title: String,
    /// Summary.
    pub description: String,
    /// Body.
    pub body: String,
    /// Tags in the order given.
    pub tags: Vec<String>,
    /// Author's user id.
    pub author_id: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Values for a new article.
#[derive(Debug, Clone)]
pub struct NewArticleRecord {
    /// Unique slug.
    pub slug: String,
    /// Headline.
    pub title: String,
    /// Summary.
    pub description: String,
    /// Body.
    pub body: String,
    /// Tags.
    pub tags: Vec<String>,
    /// Author's user id.
    pub author_id: u64,
}

/// Columns to overwrite on an article.
#[derive(Debug, Clone, Default)]
pub struct ArticleUpdate {
    /// New slug.
    pub slug: Option<String>,
    /// New headline.
    pub title: Option<String>,
    /// New summary.
    pub description: Option<String>,
    /// New body.
    pub body: Option<String>,
}

/// Which articles to list, newest first.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    /// Must carry this tag.
    pub tag: Option<String>,
    /// Must be written by one of these users.
    pub authors: Option<Vec<u64>>,
    /// Must be favorited by this user.
    pub favorited_by: Option<u64>,
    /// Page size.
    pub limit: usize,
    /// Rows to skip.
    pub offset: usize,
}

/// One page of a listing plus the unpaginated count.
#[derive(Debug, Clone, Default)]
pub struct ArticlePage {
    /// The page.
    pub articles: Vec<ArticleRecord>,
    /// Matches before pagination.
    pub total: u64,
}

/// A stored comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    /// Primary key.
    pub id: u64,
    /// Article the comment belongs to.
    pub article_id: u64,
    /// Author's user id.
    pub author_id: u64,
    /// Text.
    pub body: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Accounts.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Inserts an account; fails with `Duplicate` on a taken email or username.
    async fn create_user(&self, user: NewUserRecord) -> StoreResult<UserRecord>;

    /// Looks an account up by id.
    async fn user_by_id(&self, id: u64) -> StoreResult<UserRecord>;

    /// Looks an account up by email.
    async fn user_by_email(&self, email: &str) -> StoreResult<UserRecord>;

    /// Looks an account up by handle.
    async fn user_by_username(&self, username: &str) -> StoreResult<UserRecord>;

    /// Applies `update` and returns the new row.
    async fn update_user(&self, id: u64, update: UserUpdate) -> StoreResult<UserRecord>;
}

/// Follow relations.
#[async_trait]
pub trait ProfileRepo: Send + Sync {
    /// Records that `follower` follows `followee`. Repeating it is a no-op.
    async fn follow(&self, follower: u64, followee: u64) -> StoreResult<()>;

    /// Removes the relation if present.
    async fn unfollow(&self, follower: u64, followee: u64) -> StoreResult<()>;

    /// Returns whether `follower` follows `followee`.
    async fn is_following(&self, follower: u64, followee: u64) -> StoreResult<bool>;

    /// Returns everyone `follower` follows.
    async fn followees(&self, follower: u64) -> StoreResult<Vec<u64>>;
}

/// Articles, favorites and tags.
#[async_trait]
pub trait ArticleRepo: Send + Sync {
    /// Inserts an article; fails with `Duplicate { field: "slug" }` on a taken slug.
    async fn create_article(&self, article: NewArticleRecord) -> StoreResult<ArticleRecord>;

    /// Looks an article up by slug.
    async fn article_by_slug(&self, slug: &str) -> StoreResult<ArticleRecord>;

    /// Applies `update`, bumps `updated_at` and returns the new row.
    async fn update_article(&self, id: u64, update: ArticleUpdate) -> StoreResult<ArticleRecord>;

    /// Deletes an article with its comments and favorites.
    async fn delete_article(&self, id: u64) -> StoreResult<()>;

    /// Lists matching articles, newest first.
    async fn list_articles(&self, filter: &ArticleFilter) -> StoreResult<ArticlePage>;

    /// Marks an article as favorited by a user. Repeating it is a no-op.
    async fn favorite(&self, user_id: u64, article_id: u64) -> StoreResult<()>;

    /// Removes a favorite if present.
    async fn unfavorite(&self, user_id: u64, article_id: u64) -> StoreResult<()>;

    /// Returns whether the user favorited the article.
    async fn is_favorited(&self, user_id: u64, article_id: u64) -> StoreResult<bool>;

    /// Number of users who favorited the article.
    async fn favorites_count(&self, article_id: u64) -> StoreResult<u64>;

    /// Distinct tags across all articles, sorted.
    async fn tags(&self) -> StoreResult<Vec<String>>;
}

/// Comments.
#[async_trait]
pub trait CommentRepo: Send + Sync {
    /// Adds a comment to an article.
    async fn add_comment(&self, article_id: u64, author_id: u64, body: String) -> StoreResult<CommentRecord>;

    /// Looks a comment up by id.
    async fn comment_by_id(&self, id: u64) -> StoreResult<CommentRecord>;

    /// Comments on an article, oldest first.
    async fn comments_for(&self, article_id: u64) -> StoreResult<Vec<CommentRecord>>;

    /// Deletes a comment.
    async fn delete_comment(&self, id: u64) -> StoreResult<()>;
}

/// The set of repositories the usecases run against.
#[derive(Clone)]
pub struct Repositories {
    /// Accounts.
    pub users: Arc<dyn UserRepo>,
    /// Follow relations.
    pub profiles: Arc<dyn ProfileRepo>,
    /// Articles.
    pub articles: Arc<dyn ArticleRepo>,
    /// Comments.
    pub comments: Arc<dyn CommentRepo>,
}

impl Repositories {
    /// All four repositories backed by one [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(MemoryStore::new())
    }

    /// All four repositories backed by `store`.
    pub fn from_store<S>(store: S) -> Self
    where
        S: UserRepo + ProfileRepo + ArticleRepo + CommentRepo + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            profiles: store.clone(),
            articles: store.clone(),
            comments: store,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::ErrorKind;

    #[test]
    fn test_store_error_mapping() {
        let err = StandardError::from(StoreError::NotFound { entity: "article" });
        assert_eq!(err.code, 404);
        assert_eq!(err.domain, "article");

        let err = StandardError::from(StoreError::Duplicate { field: "email" });
        assert_eq!(err.code, 422);
        assert_eq!(err.domain, "email");
        assert_eq!(err.reason, "has already been taken");

        let err = StandardError::from(StoreError::Unavailable("disk on fire".into()));
        assert!(err.is(ErrorKind::Internal));
        assert!(err.cause().is_some());
    }
}
