//! Profiles, articles, comments, favorites and tags.

use super::{require_non_empty, require_present, DEFAULT_PAGE_SIZE};
use crate::dto::{
    Article, ArticleChanges, ArticlesReply, Comment, FeedRequest, ListArticlesRequest, NewArticle,
    NewComment, Profile,
};
use crate::slug::{candidate, slugify};
use crate::store::{
    ArticleFilter, ArticlePage, ArticleRecord, ArticleUpdate, CommentRecord, NewArticleRecord, Repositories,
    StoreError, StoreResult, UserRecord,
};
use conduit_core::{CallResult, StandardError};

const MAX_SLUG_ATTEMPTS: u32 = 100;

/// Everything users do with each other's content.
///
/// Methods that accept `viewer: Option<u64>` also serve anonymous callers;
/// relation flags (`following`, `favorited`) are then `false`.
#[derive(Debug, Clone)]
pub struct SocialUsecase {
    repos: Repositories,
}

impl SocialUsecase {
    /// Creates the usecase.
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    // -- profiles ----------------------------------------------------------

    /// A profile by handle.
    pub async fn profile(&self, viewer: Option<u64>, username: &str) -> CallResult<Profile> {
        let user = self.repos.users.user_by_username(username).await?;
        self.profile_of(viewer, &user).await
    }

    /// Follows `username`. Following someone twice is not an error.
    pub async fn follow(&self, viewer: u64, username: &str) -> CallResult<Profile> {
        let target = self.repos.users.user_by_username(username).await?;
        if target.id == viewer {
            return Err(StandardError::malformed_request("profile", "cannot follow yourself"));
        }
        self.repos.profiles.follow(viewer, target.id).await?;
        Ok(profile_view(&target, true))
    }

    /// Stops following `username`.
    pub async fn unfollow(&self, viewer: u64, username: &str) -> CallResult<Profile> {
        let target = self.repos.users.user_by_username(username).await?;
        self.repos.profiles.unfollow(viewer, target.id).await?;
        Ok(profile_view(&target, false))
    }

    // -- articles ----------------------------------------------------------

    /// Lists articles, newest first.
    ///
    /// An `author` or `favorited` handle that does not exist matches nothing.
    pub async fn list_articles(&self, viewer: Option<u64>, req: ListArticlesRequest) -> CallResult<ArticlesReply> {
        let mut filter = page_filter(req.limit, req.offset);
        filter.tag = req.tag;

        if let Some(author) = req.author.as_deref() {
            match self.lookup(author).await? {
                Some(user) => filter.authors = Some(vec![user.id]),
                None => return Ok(empty_listing()),
            }
        }
        if let Some(fan) = req.favorited.as_deref() {
            match self.lookup(fan).await? {
                Some(user) => filter.favorited_by = Some(user.id),
                None => return Ok(empty_listing()),
            }
        }

        let page = self.repos.articles.list_articles(&filter).await?;
        self.listing(viewer, page).await
    }

    /// Articles by authors the viewer follows, newest first.
    pub async fn feed(&self, viewer: u64, req: FeedRequest) -> CallResult<ArticlesReply> {
        let followees = self.repos.profiles.followees(viewer).await?;
        if followees.is_empty() {
            return Ok(empty_listing());
        }

        let mut filter = page_filter(req.limit, req.offset);
        filter.authors = Some(followees);
        let page = self.repos.articles.list_articles(&filter).await?;
        self.listing(Some(viewer), page).await
    }

    /// One article by slug.
    pub async fn article(&self, viewer: Option<u64>, slug: &str) -> CallResult<Article> {
        let record = self.repos.articles.article_by_slug(slug).await?;
        self.article_view(viewer, record).await
    }

    /// Publishes an article under a slug derived from its title.
    pub async fn create_article(&self, author: u64, input: NewArticle) -> CallResult<Article> {
        require_non_empty("title", &input.title)?;
        require_non_empty("description", &input.description)?;
        require_non_empty("body", &input.body)?;

        let base = slugify(&input.title);
        let tags = normalize_tags(input.tag_list);
        let record = self
            .with_unique_slug(&base, |slug| {
                self.repos.articles.create_article(NewArticleRecord {
                    slug,
                    title: input.title.clone(),
                    description: input.description.clone(),
                    body: input.body.clone(),
                    tags: tags.clone(),
                    author_id: author,
                })
            })
            .await?;

        tracing::info!(article.id = record.id, article.slug = %record.slug, user.id = author, "article created");
        self.article_view(Some(author), record).await
    }

    /// Edits an article. Only its author may do so; a new title re-derives the slug.
    pub async fn update_article(&self, viewer: u64, slug: &str, changes: ArticleChanges) -> CallResult<Article> {
        require_present("title", changes.title.as_deref())?;
        require_present("description", changes.description.as_deref())?;
        require_present("body", changes.body.as_deref())?;

        let existing = self.owned_article(viewer, slug).await?;
        let id = existing.id;

        let record = match changes.title.as_deref().map(slugify) {
            Some(base) if base != existing.slug => {
                self.with_unique_slug(&base, |slug| {
                    self.repos.articles.update_article(
                        id,
                        ArticleUpdate {
                            slug: Some(slug),
                            title: changes.title.clone(),
                            description: changes.description.clone(),
                            body: changes.body.clone(),
                        },
                    )
                })
                .await?
            }
            _ => {
                self.repos
                    .articles
                    .update_article(
                        id,
                        ArticleUpdate {
                            slug: None,
                            title: changes.title,
                            description: changes.description,
                            body: changes.body,
                        },
                    )
                    .await?
            }
        };
        self.article_view(Some(viewer), record).await
    }

    /// Deletes an article with its comments. Only its author may do so.
    pub async fn delete_article(&self, viewer: u64, slug: &str) -> CallResult<()> {
        let article = self.owned_article(viewer, slug).await?;
        self.repos.articles.delete_article(article.id).await?;
        tracing::info!(article.id = article.id, user.id = viewer, "article deleted");
        Ok(())
    }

    // -- comments ----------------------------------------------------------

    /// Comments on an article, oldest first.
    pub async fn comments(&self, viewer: Option<u64>, slug: &str) -> CallResult<Vec<Comment>> {
        let article = self.repos.articles.article_by_slug(slug).await?;
        let records = self.repos.comments.comments_for(article.id).await?;

        let mut comments = Vec::with_capacity(records.len());
        for record in records {
            comments.push(self.comment_view(viewer, record).await?);
        }
        Ok(comments)
    }

    /// Adds a comment by the viewer.
    pub async fn add_comment(&self, viewer: u64, slug: &str, input: NewComment) -> CallResult<Comment> {
        require_non_empty("body", &input.body)?;
        let article = self.repos.articles.article_by_slug(slug).await?;
        let record = self
            .repos
            .comments
            .add_comment(article.id, viewer, input.body)
            .await?;
        self.comment_view(Some(viewer), record).await
    }

    /// Deletes one of the viewer's comments on the article.
    pub async fn delete_comment(&self, viewer: u64, slug: &str, id: u64) -> CallResult<()> {
        let article = self.repos.articles.article_by_slug(slug).await?;
        let comment = self.repos.comments.comment_by_id(id).await?;
        if comment.article_id != article.id {
            return Err(StoreError::NotFound { entity: "comment" }.into());
        }
        if comment.author_id != viewer {
            return Err(StandardError::forbidden("comment", "only the author may delete this comment"));
        }
        self.repos.comments.delete_comment(id).await?;
        Ok(())
    }

    // -- favorites & tags --------------------------------------------------

    /// Favorites an article. Repeating it is not an error.
    pub async fn favorite(&self, viewer: u64, slug: &str) -> CallResult<Article> {
        let article = self.repos.articles.article_by_slug(slug).await?;
        self.repos.articles.favorite(viewer, article.id).await?;
        self.article_view(Some(viewer), article).await
    }

    /// Removes a favorite.
    pub async fn unfavorite(&self, viewer: u64, slug: &str) -> CallResult<Article> {
        let article = self.repos.articles.article_by_slug(slug).await?;
        self.repos.articles.unfavorite(viewer, article.id).await?;
        self.article_view(Some(viewer), article).await
    }

    /// Distinct tags, sorted.
    pub async fn tags(&self) -> CallResult<Vec<String>> {
        Ok(self.repos.articles.tags().await?)
    }

    // -- helpers -----------------------------------------------------------

    async fn lookup(&self, username: &str) -> CallResult<Option<UserRecord>> {
        match self.repos.users.user_by_username(username).await {
            Ok(user) => Ok(Some(user)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn owned_article(&self, viewer: u64, slug: &str) -> CallResult<ArticleRecord> {
        let article = self.repos.articles.article_by_slug(slug).await?;
        if article.author_id != viewer {
            return Err(StandardError::forbidden("article", "only the author may change this article"));
        }
        Ok(article)
    }

    /// Runs `attempt` with `base`, `base-2`, ... until the slug is free.
    async fn with_unique_slug<F, Fut>(&self, base: &str, mut attempt: F) -> CallResult<ArticleRecord>
    where
        F: FnMut(String) -> Fut,
        Fut: std::future::Future<Output = StoreResult<ArticleRecord>>,
    {
        for n in 1..=MAX_SLUG_ATTEMPTS {
            match attempt(candidate(base, n)).await {
                Err(StoreError::Duplicate { field: "slug" }) => continue,
                other => return Ok(other?),
            }
        }
        Err(StandardError::conflict("slug", "has already been taken"))
    }

    async fn profile_of(&self, viewer: Option<u64>, user: &UserRecord) -> CallResult<Profile> {
        let following = match viewer {
            Some(viewer) if viewer != user.id => self.repos.profiles.is_following(viewer, user.id).await?,
            _ => false,
        };
        Ok(profile_view(user, following))
    }

    async fn article_view(&self, viewer: Option<u64>, record: ArticleRecord) -> CallResult<Article> {
        let author = self.repos.users.user_by_id(record.author_id).await?;
        let author = self.profile_of(viewer, &author).await?;
        let favorited = match viewer {
            Some(viewer) => self.repos.articles.is_favorited(viewer, record.id).await?,
            None => false,
        };
        let favorites_count = self.repos.articles.favorites_count(record.id).await?;

        Ok(Article {
            slug: record.slug,
            title: record.title,
            description: record.description,
            body: record.body,
            tag_list: record.tags,
            created_at: record.created_at,
            updated_at: record.updated_at,
            favorited,
            favorites_count,
            author,
        })
    }

    async fn comment_view(&self, viewer: Option<u64>, record: CommentRecord) -> CallResult<Comment> {
        let author = self.repos.users.user_by_id(record.author_id).await?;
        Ok(Comment {
            id: record.id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            body: record.body,
            author: self.profile_of(viewer, &author).await?,
        })
    }

    async fn listing(&self, viewer: Option<u64>, page: ArticlePage) -> CallResult<ArticlesReply> {
        let mut articles = Vec::with_capacity(page.articles.len());
        for record in page.articles {
            articles.push(self.article_view(viewer, record).await?);
        }
        Ok(ArticlesReply {
            articles,
            articles_count: page.total,
        })
    }
}

fn profile_view(user: &UserRecord, following: bool) -> Profile {
    Profile {
        username: user.username.clone(),
        bio: user.bio.clone(),
        image: user.image.clone(),
        following,
    }
}

fn page_filter(limit: Option<u32>, offset: Option<u32>) -> ArticleFilter {
    let to_usize = |n: u32| usize::try_from(n).unwrap_or(usize::MAX);
    ArticleFilter {
        limit: to_usize(limit.unwrap_or(DEFAULT_PAGE_SIZE)),
        offset: to_usize(offset.unwrap_or(0)),
        ..ArticleFilter::default()
    }
}

fn empty_listing() -> ArticlesReply {
    ArticlesReply {
        articles: Vec::new(),
        articles_count: 0,
    }
}

/// Trims tags, drops empty ones and keeps the first occurrence of each.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
