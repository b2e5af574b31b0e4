//! Operation handlers.
//!
//! Each handler reads the caller from the [`RequestContext`], hands the bound
//! request to a usecase and wraps the result in its reply envelope.

use crate::biz::{SocialUsecase, UserUsecase};
use crate::dto::{
    AddCommentRequest, ArticleReply, ArticlesReply, CommentReply, CommentsReply, CreateArticleRequest,
    DeleteCommentRequest, FeedRequest, ListArticlesRequest, LoginRequest, ProfileReply, ProfileRequest,
    RegisterRequest, SlugRequest, TagsReply, UpdateArticleRequest, UpdateUserRequest, UserReply,
};
use crate::routes;
use conduit_core::{CallResult, Empty, RequestContext};
use conduit_server::{OperationRegistry, RegistryError};
use std::sync::Arc;

/// The RealWorld API.
#[derive(Debug, Clone)]
pub struct RealWorldService {
    users: UserUsecase,
    social: SocialUsecase,
}

/// The caller, if the gate authenticated one. Always `None` on bypassed operations.
fn viewer(ctx: &RequestContext) -> Option<u64> {
    ctx.identity().map(|identity| identity.user_id)
}

fn caller(ctx: &RequestContext) -> CallResult<u64> {
    ctx.require_identity().map(|identity| identity.user_id)
}

impl RealWorldService {
    /// Creates the service.
    pub fn new(users: UserUsecase, social: SocialUsecase) -> Self {
        Self { users, social }
    }

    /// `Login`
    pub async fn login(&self, _ctx: RequestContext, req: LoginRequest) -> CallResult<UserReply> {
        let user = self.users.login(req.user).await?;
        Ok(UserReply { user })
    }

    /// `Register`
    pub async fn register(&self, _ctx: RequestContext, req: RegisterRequest) -> CallResult<UserReply> {
        let user = self.users.register(req.user).await?;
        Ok(UserReply { user })
    }

    /// `GetCurrentUser`
    pub async fn get_current_user(&self, ctx: RequestContext, _req: Empty) -> CallResult<UserReply> {
        let identity = *ctx.require_identity()?;
        let user = self.users.current_user(&identity).await?;
        Ok(UserReply { user })
    }

    /// `UpdateUser`
    pub async fn update_user(&self, ctx: RequestContext, req: UpdateUserRequest) -> CallResult<UserReply> {
        let identity = *ctx.require_identity()?;
        let user = self.users.update_user(&identity, req.user).await?;
        Ok(UserReply { user })
    }

    /// `GetProfile`
    ///
    /// Bypassed by the auth gate, so no identity is attached even when the
    /// caller sends a token, and `following` is always `false` here.
    pub async fn get_profile(&self, ctx: RequestContext, req: ProfileRequest) -> CallResult<ProfileReply> {
        let profile = self.social.profile(viewer(&ctx), &req.username).await?;
        Ok(ProfileReply { profile })
    }

    /// `FollowUser`
    pub async fn follow_user(&self, ctx: RequestContext, req: ProfileRequest) -> CallResult<ProfileReply> {
        let profile = self.social.follow(caller(&ctx)?, &req.username).await?;
        Ok(ProfileReply { profile })
    }

    /// `UnFollowUser`
    pub async fn unfollow_user(&self, ctx: RequestContext, req: ProfileRequest) -> CallResult<ProfileReply> {
        let profile = self.social.unfollow(caller(&ctx)?, &req.username).await?;
        Ok(ProfileReply { profile })
    }

    /// `ListArticles`
    ///
    /// Bypassed by the auth gate, so no identity is attached even when the
    /// caller sends a token, and `favorited` is always `false` here.
    pub async fn list_articles(&self, ctx: RequestContext, req: ListArticlesRequest) -> CallResult<ArticlesReply> {
        self.social.list_articles(viewer(&ctx), req).await
    }

    /// `FeedListArticles`
    pub async fn feed_articles(&self, ctx: RequestContext, req: FeedRequest) -> CallResult<ArticlesReply> {
        self.social.feed(caller(&ctx)?, req).await
    }

    /// `GetArticle`
    ///
    /// Bypassed by the auth gate, so no identity is attached even when the
    /// caller sends a token, and `favorited` is always `false` here.
    pub async fn get_article(&self, ctx: RequestContext, req: SlugRequest) -> CallResult<ArticleReply> {
        let article = self.social.article(viewer(&ctx), &req.slug).await?;
        Ok(ArticleReply { article })
    }

    /// `CreateArticle`
    pub async fn create_article(&self, ctx: RequestContext, req: CreateArticleRequest) -> CallResult<ArticleReply> {
        let article = self.social.create_article(caller(&ctx)?, req.article).await?;
        Ok(ArticleReply { article })
    }

    /// `UpdateArticle`
    pub async fn update_article(&self, ctx: RequestContext, req: UpdateArticleRequest) -> CallResult<ArticleReply> {
        let article = self
            .social
            .update_article(caller(&ctx)?, &req.slug, req.article)
            .await?;
        Ok(ArticleReply { article })
    }

    /// `DeleteArticle`
    pub async fn delete_article(&self, ctx: RequestContext, req: SlugRequest) -> CallResult<Empty> {
        self.social.delete_article(caller(&ctx)?, &req.slug).await?;
        Ok(Empty {})
    }

    /// `AddComment`
    pub async fn add_comment(&self, ctx: RequestContext, req: AddCommentRequest) -> CallResult<CommentReply> {
        let comment = self
            .social
            .add_comment(caller(&ctx)?, &req.slug, req.comment)
            .await?;
        Ok(CommentReply { comment })
    }

    /// `GetComments`
    ///
    /// Bypassed by the auth gate, so no identity is attached even when the
    /// caller sends a token, and `author.following` is always `false` here.
    pub async fn get_comments(&self, ctx: RequestContext, req: SlugRequest) -> CallResult<CommentsReply> {
        let comments = self.social.comments(viewer(&ctx), &req.slug).await?;
        Ok(CommentsReply { comments })
    }

    /// `DeleteComment`
    pub async fn delete_comment(&self, ctx: RequestContext, req: DeleteCommentRequest) -> CallResult<Empty> {
        self.social
            .delete_comment(caller(&ctx)?, &req.slug, req.id)
            .await?;
        Ok(Empty {})
    }

    /// `FavoriteArticle`
    pub async fn favorite_article(&self, ctx: RequestContext, req: SlugRequest) -> CallResult<ArticleReply> {
        let article = self.social.favorite(caller(&ctx)?, &req.slug).await?;
        Ok(ArticleReply { article })
    }

    /// `UnFavoriteArticle`
    pub async fn unfavorite_article(&self, ctx: RequestContext, req: SlugRequest) -> CallResult<ArticleReply> {
        let article = self.social.unfavorite(caller(&ctx)?, &req.slug).await?;
        Ok(ArticleReply { article })
    }

    /// `GetTags`
    pub async fn get_tags(&self, _ctx: RequestContext, _req: Empty) -> CallResult<TagsReply> {
        let tags = self.social.tags().await?;
        Ok(TagsReply { tags })
    }

    /// Registers every RealWorld operation on `registry`.
    pub fn register_all(self: &Arc<Self>, registry: &mut OperationRegistry) -> Result<(), RegistryError> {
        macro_rules! route {
            ($svc:expr, $registry:expr, $op:expr, $method:ident, $req:ty) => {{
                let svc = Arc::clone($svc);
                $registry.register($op, move |ctx: RequestContext, req: $req| {
                    let svc = Arc::clone(&svc);
                    async move { svc.$method(ctx, req).await }
                })?;
            }};
        }

        route!(self, registry, routes::LOGIN, login, LoginRequest);
        route!(self, registry, routes::REGISTER, register, RegisterRequest);
        route!(self, registry, routes::GET_CURRENT_USER, get_current_user, Empty);
        route!(self, registry, routes::UPDATE_USER, update_user, UpdateUserRequest);
        route!(self, registry, routes::GET_PROFILE, get_profile, ProfileRequest);
        route!(self, registry, routes::FOLLOW_USER, follow_user, ProfileRequest);
        route!(self, registry, routes::UNFOLLOW_USER, unfollow_user, ProfileRequest);
        route!(self, registry, routes::LIST_ARTICLES, list_articles, ListArticlesRequest);
        route!(self, registry, routes::FEED_ARTICLES, feed_articles, FeedRequest);
        route!(self, registry, routes::GET_ARTICLE, get_article, SlugRequest);
        route!(self, registry, routes::CREATE_ARTICLE, create_article, CreateArticleRequest);
        route!(self, registry, routes::UPDATE_ARTICLE, update_article, UpdateArticleRequest);
        route!(self, registry, routes::DELETE_ARTICLE, delete_article, SlugRequest);
        route!(self, registry, routes::ADD_COMMENT, add_comment, AddCommentRequest);
        route!(self, registry, routes::GET_COMMENTS, get_comments, SlugRequest);
        route!(self, registry, routes::DELETE_COMMENT, delete_comment, DeleteCommentRequest);
        route!(self, registry, routes::FAVORITE_ARTICLE, favorite_article, SlugRequest);
        route!(self, registry, routes::UNFAVORITE_ARTICLE, unfavorite_article, SlugRequest);
        route!(self, registry, routes::GET_TAGS, get_tags, Empty);

        tracing::debug!(operations = registry.len(), "realworld operations registered");
        Ok(())
    }
}
