//! Wire shapes of the RealWorld API.
//!
//! Request types are filled by the binder from body, query and path; every
//! field the client may omit carries a default so validation happens in the
//! usecases with field-level errors rather than as a binder failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Credentials inside a login request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginUser {
    /// Account email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// `POST /api/users/login`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Credentials.
    pub user: LoginUser,
}

/// New account details.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterUser {
    /// Public handle.
    pub username: String,
    /// Account email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// `POST /api/users`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    /// Account details.
    pub user: RegisterUser,
}

/// Fields of the current user to change; absent fields stay as they are.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserChanges {
    /// New email.
    pub email: Option<String>,
    /// New handle.
    pub username: Option<String>,
    /// New password.
    pub password: Option<String>,
    /// New bio.
    pub bio: Option<String>,
    /// New avatar URL.
    pub image: Option<String>,
}

/// `PUT /api/user`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    /// Changes.
    pub user: UserChanges,
}

/// Any operation addressed by `{username}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRequest {
    /// Profile handle from the path.
    pub username: String,
}

/// `GET /api/articles`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListArticlesRequest {
    /// Only articles carrying this tag.
    pub tag: Option<String>,
    /// Only articles by this username.
    pub author: Option<String>,
    /// Only articles favorited by this username.
    pub favorited: Option<String>,
    /// Page size.
    pub limit: Option<u32>,
    /// Number of articles to skip.
    pub offset: Option<u32>,
}

/// `GET /api/articles/feed`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedRequest {
    /// Page size.
    pub limit: Option<u32>,
    /// Number of articles to skip.
    pub offset: Option<u32>,
}

/// Any operation addressed by `{slug}` alone.
#[derive(Debug, Clone, Deserialize)]
pub struct SlugRequest {
    /// Article slug from the path.
    pub slug: String,
}

/// Contents of a new article.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewArticle {
    /// Headline; the slug is derived from it.
    pub title: String,
    /// Short summary.
    pub description: String,
    /// Markdown body.
    pub body: String,
    /// Tags.
    #[serde(rename = "tagList")]
    pub tag_list: Vec<String>,
}

/// `POST /api/article`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateArticleRequest {
    /// Article contents.
    pub article: NewArticle,
}

/// Article fields to change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArticleChanges {
    /// New headline.
    pub title: Option<String>,
    /// New summary.
    pub description: Option<String>,
    /// New body.
    pub body: Option<String>,
}

/// `PUT /api/article/{slug}`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateArticleRequest {
    /// Article slug from the path.
    pub slug: String,
    /// Changes.
    #[serde(default)]
    pub article: ArticleChanges,
}

/// Contents of a new comment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewComment {
    /// Comment text.
    pub body: String,
}

/// `POST /api/articles/{slug}/comments`
#[derive(Debug, Clone, Deserialize)]
pub struct AddCommentRequest {
    /// Article slug from the path.
    pub slug: String,
    /// Comment contents.
    #[serde(default)]
    pub comment: NewComment,
}

/// `DELETE /api/articles/{slug}/comments/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteCommentRequest {
    /// Article slug from the path.
    pub slug: String,
    /// Comment id from the path.
    pub id: u64,
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// An authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Account email.
    pub email: String,
    /// Fresh credential.
    pub token: String,
    /// Public handle.
    pub username: String,
    /// Bio.
    pub bio: String,
    /// Avatar URL.
    pub image: String,
}

/// `{"user": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserReply {
    /// The account.
    pub user: User,
}

/// A public profile as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    /// Public handle.
    pub username: String,
    /// Bio.
    pub bio: String,
    /// Avatar URL.
    pub image: String,
    /// Whether the caller follows this profile.
    pub following: bool,
}

/// `{"profile": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileReply {
    /// The profile.
    pub profile: Profile,
}

/// An article as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// URL-safe identifier.
    pub slug: String,
    /// Headline.
    pub title: String,
    /// Short summary.
    pub description: String,
    /// Markdown body.
    pub body: String,
    /// Tags.
    pub tag_list: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
    /// Whether the caller favorited it.
    pub favorited: bool,
    /// Number of users who favorited it.
    pub favorites_count: u64,
    /// The author's profile.
    pub author: Profile,
}

/// `{"article": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleReply {
    /// The article.
    pub article: Article,
}

/// `{"articles": [...], "articlesCount": n}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesReply {
    /// One page of articles.
    pub articles: Vec<Article>,
    /// Matches before pagination.
    pub articles_count: u64,
}

/// A comment as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment id.
    pub id: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
    /// Text.
    pub body: String,
    /// The author's profile.
    pub author: Profile,
}

/// `{"comment": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentReply {
    /// The comment.
    pub comment: Comment,
}

/// `{"comments": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentsReply {
    /// Comments, oldest first.
    pub comments: Vec<Comment>,
}

/// `{"tags": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagsReply {
    /// Distinct tags, sorted.
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_tolerates_missing_fields() {
        let req: LoginRequest = serde_json::from_value(json!({ "user": { "email": "a@b.c" } })).unwrap();
        assert_eq!(req.user.email, "a@b.c");
        assert_eq!(req.user.password, "");

        let req: LoginRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.user.email.is_empty());
    }

    #[test]
    fn test_tag_list_name() {
        let req: CreateArticleRequest = serde_json::from_value(json!({
            "article": { "title": "T", "description": "D", "body": "B", "tagList": ["rust"] }
        }))
        .unwrap();
        assert_eq!(req.article.tag_list, vec!["rust"]);
    }

    #[test]
    fn test_articles_reply_shape() {
        let reply = ArticlesReply {
            articles: Vec::new(),
            articles_count: 0,
        };
        assert_eq!(
            serde_json::to_value(reply).unwrap(),
            json!({ "articles": [], "articlesCount": 0 })
        );
    }

    #[test]
    fn test_article_field_names() {
        let now = Utc::now();
        let article = Article {
            slug: "s".into(),
            title: "t".into(),
            description: "d".into(),
            body: "b".into(),
            tag_list: vec!["x".into()],
            created_at: now,
            updated_at: now,
            favorited: false,
            favorites_count: 2,
            author: Profile {
                username: "jake".into(),
                bio: String::new(),
                image: String::new(),
                following: true,
            },
        };
        let value = serde_json::to_value(article).unwrap();
        assert_eq!(value["tagList"], json!(["x"]));
        assert_eq!(value["favoritesCount"], 2);
        assert_eq!(value["author"]["following"], true);
        assert!(value.get("createdAt").is_some());
    }
}
