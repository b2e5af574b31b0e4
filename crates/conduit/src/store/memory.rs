//! In-memory repositories.
//!
//! All tables live behind one [`parking_lot::RwLock`], so each repository
//! call sees a consistent snapshot. No lock is held across an `.await`.

use super::{
    ArticleFilter, ArticlePage, ArticleRecord, ArticleRepo, ArticleUpdate, CommentRecord, CommentRepo,
    NewArticleRecord, NewUserRecord, ProfileRepo, StoreError, StoreResult, UserRecord, UserRepo,
    UserUpdate,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<u64, UserRecord>,
    articles: BTreeMap<u64, ArticleRecord>,
    comments: BTreeMap<u64, CommentRecord>,
    follows: HashSet<(u64, u64)>,
    favorites: HashSet<(u64, u64)>,
    next_user_id: u64,
    next_article_id: u64,
    next_comment_id: u64,
}

impl Tables {
    fn next_id(counter: &mut u64) -> u64 {
        *counter += 1;
        *counter
    }

    fn user_taken(&self, skip: Option<u64>, email: Option<&str>, username: Option<&str>) -> Option<&'static str> {
        self.users
            .values()
            .filter(|u| Some(u.id) != skip)
            .find_map(|u| {
                if email.is_some_and(|e| u.email == e) {
                    Some("email")
                } else if username.is_some_and(|n| u.username == n) {
                    Some("username")
                } else {
                    None
                }
            })
    }

    fn slug_taken(&self, skip: Option<u64>, slug: &str) -> bool {
        self.articles
            .values()
            .any(|a| Some(a.id) != skip && a.slug == slug)
    }
}

/// Every repository over shared in-process tables.
///
/// Clones share the same data. Contents are lost when the process exits.
///
/// # Example
///
/// ```
/// use conduit::store::{MemoryStore, NewUserRecord, UserRepo};
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// let user = store
///     .create_user(NewUserRecord {
///         email: "jake@jake.jake".into(),
///         username: "jake".into(),
///         password_hash: "hash".into(),
///     })
///     .await
///     .unwrap();
/// assert_eq!(store.user_by_username("jake").await.unwrap().id, user.id);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create_user(&self, user: NewUserRecord) -> StoreResult<UserRecord> {
        let mut tables = self.tables.write();
        if let Some(field) = tables.user_taken(None, Some(user.email.as_str()), Some(user.username.as_str())) {
            return Err(StoreError::Duplicate { field });
        }

        let id = Tables::next_id(&mut tables.next_user_id);
        let record = UserRecord {
            id,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            bio: String::new(),
            image: String::new(),
        };
        tables.users.insert(id, record.clone());
        Ok(record)
    }

    async fn user_by_id(&self, id: u64) -> StoreResult<UserRecord> {
        self.tables
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "user" })
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<UserRecord> {
        self.tables
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "user" })
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<UserRecord> {
        self.tables
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "profile" })
    }

    async fn update_user(&self, id: u64, update: UserUpdate) -> StoreResult<UserRecord> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&id) {
            return Err(StoreError::NotFound { entity: "user" });
        }
        if let Some(field) = tables.user_taken(Some(id), update.email.as_deref(), update.username.as_deref()) {
            return Err(StoreError::Duplicate { field });
        }

        let user = tables
            .users
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "user" })?;
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = hash;
        }
        if let Some(bio) = update.bio {
            user.bio = bio;
        }
        if let Some(image) = update.image {
            user.image = image;
        }
        Ok(user.clone())
    }
}

#[async_trait]
impl ProfileRepo for MemoryStore {
    async fn follow(&self, follower: u64, followee: u64) -> StoreResult<()> {
        self.tables.write().follows.insert((follower, followee));
        Ok(())
    }

    async fn unfollow(&self, follower: u64, followee: u64) -> StoreResult<()> {
        self.tables.write().follows.remove(&(follower, followee));
        Ok(())
    }

    async fn is_following(&self, follower: u64, followee: u64) -> StoreResult<bool> {
        Ok(self.tables.read().follows.contains(&(follower, followee)))
    }

    async fn followees(&self, follower: u64) -> StoreResult<Vec<u64>> {
        let tables = self.tables.read();
        let mut ids: Vec<u64> = tables
            .follows
            .iter()
            .filter(|(f, _)| *f == follower)
            .map(|(_, followee)| *followee)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[async_trait]
impl ArticleRepo for MemoryStore {
    async fn create_article(&self, article: NewArticleRecord) -> StoreResult<ArticleRecord> {
        let mut tables = self.tables.write();
        if tables.slug_taken(None, &article.slug) {
            return Err(StoreError::Duplicate { field: "slug" });
        }

        let id = Tables::next_id(&mut tables.next_article_id);
        let now = Utc::now();
        let record = ArticleRecord {
            id,
            slug: article.slug,
            title: article.title,
            description: article.description,
            body: article.body,
            tags: article.tags,
            author_id: article.author_id,
            created_at: now,
            updated_at: now,
        };
        tables.articles.insert(id, record.clone());
        Ok(record)
    }

    async fn article_by_slug(&self, slug: &str) -> StoreResult<ArticleRecord> {
        self.tables
            .read()
            .articles
            .values()
            .find(|a| a.slug == slug)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "article" })
    }

    async fn update_article(&self, id: u64, update: ArticleUpdate) -> StoreResult<ArticleRecord> {
        let mut tables = self.tables.write();
        if let Some(slug) = update.slug.as_deref() {
            if tables.slug_taken(Some(id), slug) {
                return Err(StoreError::Duplicate { field: "slug" });
            }
        }

        let article = tables
            .articles
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "article" })?;
        if let Some(slug) = update.slug {
            article.slug = slug;
        }
        if let Some(title) = update.title {
            article.title = title;
        }
        if let Some(description) = update.description {
            article.description = description;
        }
        if let Some(body) = update.body {
            article.body = body;
        }
        article.updated_at = Utc::now();
        Ok(article.clone())
    }

    async fn delete_article(&self, id: u64) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.articles.remove(&id).is_none() {
            return Err(StoreError::NotFound { entity: "article" });
        }
        tables.comments.retain(|_, c| c.article_id != id);
        tables.favorites.retain(|(_, article_id)| *article_id != id);
        Ok(())
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> StoreResult<ArticlePage> {
        let tables = self.tables.read();
        let mut matches: Vec<&ArticleRecord> = tables
            .articles
            .values()
            .filter(|a| filter.tag.as_ref().map_or(true, |tag| a.tags.contains(tag)))
            .filter(|a| {
                filter
                    .authors
                    .as_ref()
                    .map_or(true, |authors| authors.contains(&a.author_id))
            })
            .filter(|a| {
                filter
                    .favorited_by
                    .map_or(true, |user| tables.favorites.contains(&(user, a.id)))
            })
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matches.len() as u64;
        let articles = matches
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .cloned()
            .collect();
        Ok(ArticlePage { articles, total })
    }

    async fn favorite(&self, user_id: u64, article_id: u64) -> StoreResult<()> {
        self.tables.write().favorites.insert((user_id, article_id));
        Ok(())
    }

    async fn unfavorite(&self, user_id: u64, article_id: u64) -> StoreResult<()> {
        self.tables.write().favorites.remove(&(user_id, article_id));
        Ok(())
    }

    async fn is_favorited(&self, user_id: u64, article_id: u64) -> StoreResult<bool> {
        Ok(self.tables.read().favorites.contains(&(user_id, article_id)))
    }

    async fn favorites_count(&self, article_id: u64) -> StoreResult<u64> {
        let tables = self.tables.read();
        Ok(tables
            .favorites
            .iter()
            .filter(|(_, a)| *a == article_id)
            .count() as u64)
    }

    async fn tags(&self) -> StoreResult<Vec<String>> {
        let tables = self.tables.read();
        let tags: BTreeSet<&String> = tables.articles.values().flat_map(|a| a.tags.iter()).collect();
        Ok(tags.into_iter().cloned().collect())
    }
}

#[async_trait]
impl CommentRepo for MemoryStore {
    async fn add_comment(&self, article_id: u64, author_id: u64, body: String) -> StoreResult<CommentRecord> {
        let mut tables = self.tables.write();
        if !tables.articles.contains_key(&article_id) {
            return Err(StoreError::NotFound { entity: "article" });
        }

        let id = Tables::next_id(&mut tables.next_comment_id);
        let now = Utc::now();
        let record = CommentRecord {
            id,
            article_id,
            author_id,
            body,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(id, record.clone());
        Ok(record)
    }

    async fn comment_by_id(&self, id: u64) -> StoreResult<CommentRecord> {
        self.tables
            .read()
            .comments
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "comment" })
    }

    async fn comments_for(&self, article_id: u64) -> StoreResult<Vec<CommentRecord>> {
        Ok(self
            .tables
            .read()
            .comments
            .values()
            .filter(|c| c.article_id == article_id)
            .cloned()
            .collect())
    }

    async fn delete_comment(&self, id: u64) -> StoreResult<()> {
        self.tables
            .write()
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { entity: "comment" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &MemoryStore, name: &str) -> UserRecord {
        store
            .create_user(NewUserRecord {
                email: format!("{name}@example.com"),
                username: name.to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    async fn article(store: &MemoryStore, author: u64, slug: &str, tags: &[&str]) -> ArticleRecord {
        store
            .create_article(NewArticleRecord {
                slug: slug.to_string(),
                title: slug.to_string(),
                description: String::new(),
                body: String::new(),
                tags: tags.iter().map(ToString::to_string).collect(),
                author_id: author,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unique_user_columns() {
        let store = MemoryStore::new();
        let jake = user(&store, "jake").await;
        assert_eq!(jake.id, 1);

        let dup_email = store
            .create_user(NewUserRecord {
                email: "jake@example.com".into(),
                username: "other".into(),
                password_hash: String::new(),
            })
            .await;
        assert_eq!(dup_email.unwrap_err(), StoreError::Duplicate { field: "email" });

        let dup_name = store
            .create_user(NewUserRecord {
                email: "other@example.com".into(),
                username: "jake".into(),
                password_hash: String::new(),
            })
            .await;
        assert_eq!(dup_name.unwrap_err(), StoreError::Duplicate { field: "username" });
    }

    #[tokio::test]
    async fn test_update_user_is_partial() {
        let store = MemoryStore::new();
        let jake = user(&store, "jake").await;
        let updated = store
            .update_user(
                jake.id,
                UserUpdate {
                    bio: Some("I work at statefarm".into()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.bio, "I work at statefarm");
        assert_eq!(updated.email, jake.email);

        // Keeping your own email is not a conflict.
        let same = store
            .update_user(
                jake.id,
                UserUpdate {
                    email: Some(jake.email.clone()),
                    ..UserUpdate::default()
                },
            )
            .await;
        assert!(same.is_ok());
    }

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let store = MemoryStore::new();
        store.follow(1, 2).await.unwrap();
        store.follow(1, 2).await.unwrap();
        assert_eq!(store.followees(1).await.unwrap(), vec![2]);
        store.unfollow(1, 2).await.unwrap();
        store.unfollow(1, 2).await.unwrap();
        assert!(!store.is_following(1, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_and_order() {
        let store = MemoryStore::new();
        let jake = user(&store, "jake").await;
        let anne = user(&store, "anne").await;
        let a = article(&store, jake.id, "a", &["rust"]).await;
        let _b = article(&store, anne.id, "b", &["go"]).await;
        let c = article(&store, jake.id, "c", &["rust", "web"]).await;
        store.favorite(anne.id, a.id).await.unwrap();

        let all = store
            .list_articles(&ArticleFilter {
                limit: 20,
                ..ArticleFilter::default()
            })
            .await
            .unwrap();
        let slugs: Vec<&str> = all.articles.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "b", "a"]);

        let rust = store
            .list_articles(&ArticleFilter {
                tag: Some("rust".into()),
                limit: 1,
                ..ArticleFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(rust.total, 2);
        assert_eq!(rust.articles.len(), 1);
        assert_eq!(rust.articles[0].id, c.id);

        let favorited = store
            .list_articles(&ArticleFilter {
                favorited_by: Some(anne.id),
                limit: 20,
                ..ArticleFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(favorited.total, 1);
        assert_eq!(favorited.articles[0].id, a.id);
    }

    #[tokio::test]
    async fn test_delete_article_cascades() {
        let store = MemoryStore::new();
        let jake = user(&store, "jake").await;
        let a = article(&store, jake.id, "a", &[]).await;
        let comment = store.add_comment(a.id, jake.id, "first".into()).await.unwrap();
        store.favorite(jake.id, a.id).await.unwrap();

        store.delete_article(a.id).await.unwrap();
        assert!(store.comment_by_id(comment.id).await.unwrap_err().is_not_found());
        assert_eq!(store.favorites_count(a.id).await.unwrap(), 0);
        assert_eq!(
            store.delete_article(a.id).await.unwrap_err(),
            StoreError::NotFound { entity: "article" }
        );
    }

    #[tokio::test]
    async fn test_duplicate_slug() {
        let store = MemoryStore::new();
        article(&store, 1, "taken", &[]).await;
        let b = article(&store, 1, "free", &[]).await;
        let err = store
            .update_article(
                b.id,
                ArticleUpdate {
                    slug: Some("taken".into()),
                    ..ArticleUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Duplicate { field: "slug" });
    }

    #[tokio::test]
    async fn test_tags_are_distinct_and_sorted() {
        let store = MemoryStore::new();
        article(&store, 1, "a", &["web", "rust"]).await;
        article(&store, 1, "b", &["rust", "async"]).await;
        assert_eq!(store.tags().await.unwrap(), vec!["async", "rust", "web"]);
    }
}
