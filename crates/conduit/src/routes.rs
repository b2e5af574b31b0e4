//! The RealWorld operation table.
//!
//! Every operation is declared once here. Ids follow the
//! `/realworld.v1.RealWorld/<Name>` convention so log lines and metrics line
//! up with the API definition.

use conduit_core::{BinderRule, Operation};
use conduit_middleware::BypassSet;
use http::Method;

macro_rules! operation {
    ($name:literal, $method:ident, $path:literal, $rule:ident) => {
        Operation::new(
            concat!("/realworld.v1.RealWorld/", $name),
            Method::$method,
            $path,
            BinderRule::$rule,
        )
    };
}

/// `POST /api/users/login`
pub const LOGIN: Operation = operation!("Login", POST, "/api/users/login", BodyAndQuery);
/// `POST /api/users`
pub const REGISTER: Operation = operation!("Register", POST, "/api/users", BodyAndQuery);
/// `GET /api/user`
pub const GET_CURRENT_USER: Operation = operation!("GetCurrentUser", GET, "/api/user", QueryOnly);
/// `PUT /api/user`
pub const UPDATE_USER: Operation = operation!("UpdateUser", PUT, "/api/user", BodyAndQuery);
/// `GET /api/profile/{username}`
pub const GET_PROFILE: Operation =
    operation!("GetProfile", GET, "/api/profile/{username}", QueryAndPath);
/// `POST /api/profile/{username}/follow`
pub const FOLLOW_USER: Operation =
    operation!("FollowUser", POST, "/api/profile/{username}/follow", BodyQueryAndPath);
/// `DELETE /api/profile/{username}/follow`
pub const UNFOLLOW_USER: Operation =
    operation!("UnFollowUser", DELETE, "/api/profile/{username}/follow", QueryAndPath);
/// `GET /api/articles`
pub const LIST_ARTICLES: Operation = operation!("ListArticles", GET, "/api/articles", QueryOnly);
/// `GET /api/articles/feed`
pub const FEED_ARTICLES: Operation =
    operation!("FeedListArticles", GET, "/api/articles/feed", QueryOnly);
/// `GET /api/article/{slug}`
pub const GET_ARTICLE: Operation = operation!("GetArticle", GET, "/api/article/{slug}", QueryAndPath);
/// `POST /api/article`
pub const CREATE_ARTICLE: Operation = operation!("CreateArticle", POST, "/api/article", BodyAndQuery);
/// `PUT /api/article/{slug}`
pub const UPDATE_ARTICLE: Operation =
    operation!("UpdateArticle", PUT, "/api/article/{slug}", BodyQueryAndPath);
/// `DELETE /api/article/{slug}`
pub const DELETE_ARTICLE: Operation =
    operation!("DeleteArticle", DELETE, "/api/article/{slug}", QueryAndPath);
/// `POST /api/articles/{slug}/comments`
pub const ADD_COMMENT: Operation =
    operation!("AddComment", POST, "/api/articles/{slug}/comments", BodyQueryAndPath);
/// `GET /api/articles/{slug}/comments`
pub const GET_COMMENTS: Operation =
    operation!("GetComments", GET, "/api/articles/{slug}/comments", QueryAndPath);
/// `DELETE /api/articles/{slug}/comments/{id}`
pub const DELETE_COMMENT: Operation =
    operation!("DeleteComment", DELETE, "/api/articles/{slug}/comments/{id}", QueryAndPath);
/// `POST /api/articles/{slug}/favorite`
pub const FAVORITE_ARTICLE: Operation =
    operation!("FavoriteArticle", POST, "/api/articles/{slug}/favorite", BodyQueryAndPath);
/// `DELETE /api/articles/{slug}/favorite`
pub const UNFAVORITE_ARTICLE: Operation =
    operation!("UnFavoriteArticle", DELETE, "/api/articles/{slug}/favorite", QueryAndPath);
/// `GET /api/tags`
pub const GET_TAGS: Operation = operation!("GetTags", GET, "/api/tags", QueryOnly);

/// Every operation the service exposes.
pub const ALL: [Operation; 19] = [
    LOGIN,
    REGISTER,
    GET_CURRENT_USER,
    UPDATE_USER,
    GET_PROFILE,
    FOLLOW_USER,
    UNFOLLOW_USER,
    LIST_ARTICLES,
    FEED_ARTICLES,
    GET_ARTICLE,
    CREATE_ARTICLE,
    UPDATE_ARTICLE,
    DELETE_ARTICLE,
    ADD_COMMENT,
    GET_COMMENTS,
    DELETE_COMMENT,
    FAVORITE_ARTICLE,
    UNFAVORITE_ARTICLE,
    GET_TAGS,
];

/// Operations that run without a credential.
pub fn bypass_set() -> BypassSet {
    [
        LOGIN,
        REGISTER,
        GET_PROFILE,
        LIST_ARTICLES,
        GET_ARTICLE,
        GET_COMMENTS,
        GET_TAGS,
    ]
    .iter()
    .map(|op| op.id)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<&str> = ALL.iter().map(|op| op.id).collect();
        assert_eq!(ids.len(), ALL.len());
    }

    #[test]
    fn test_id_convention() {
        assert_eq!(LOGIN.id, "/realworld.v1.RealWorld/Login");
        assert_eq!(DELETE_COMMENT.name(), "DeleteComment");
        assert!(ALL.iter().all(|op| op.id.starts_with("/realworld.v1.RealWorld/")));
    }

    #[test]
    fn test_bypass_set() {
        let bypass = bypass_set();
        assert_eq!(bypass.len(), 7);
        assert!(bypass.contains(LOGIN.id));
        assert!(bypass.contains(GET_TAGS.id));
        assert!(!bypass.contains(GET_CURRENT_USER.id));
        assert!(!bypass.contains(FEED_ARTICLES.id));
        assert!(!bypass.contains(DELETE_COMMENT.id));
    }
}
