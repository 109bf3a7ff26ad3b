//! Adapters that let the access gate read from the blog stores.

use std::sync::Arc;

use async_trait::async_trait;

use inkpost_auth::{LookupError, OwnershipLookup, Principal, UserLookup};
use inkpost_core::{CommentId, PostId, SoftDelete, UserId};

use crate::store::{CommentStore, PostStore, StoreError, UserStore};

impl From<StoreError> for LookupError {
    fn from(err: StoreError) -> Self {
        LookupError::new(err.to_string())
    }
}

/// Backs identity resolution and ownership checks with the stores.
#[derive(Clone)]
pub struct StoreLookup {
    users: Arc<dyn UserStore>,
    posts: Arc<dyn PostStore>,
    comments: Arc<dyn CommentStore>,
}

impl StoreLookup {
    pub fn new(
        users: Arc<dyn UserStore>,
        posts: Arc<dyn PostStore>,
        comments: Arc<dyn CommentStore>,
    ) -> Self {
        Self {
            users,
            posts,
            comments,
        }
    }
}

#[async_trait]
impl UserLookup for StoreLookup {
    async fn find_principal(&self, id: UserId) -> Result<Option<Principal>, LookupError> {
        let user = self.users.find_by_id(id).await?;
        Ok(user
            .filter(|u| u.is_visible())
            .map(|u| Principal::new(u.id, u.is_admin)))
    }
}

/// Ownership ignores soft deletion: the author of a deleted post still owns it.
#[async_trait]
impl OwnershipLookup for StoreLookup {
    async fn post_author(&self, id: PostId) -> Result<Option<UserId>, LookupError> {
        Ok(self.posts.find_by_id(id).await?.map(|p| p.author_id))
    }

    async fn comment_commenter(&self, id: CommentId) -> Result<Option<UserId>, LookupError> {
        Ok(self.comments.find_by_id(id).await?.map(|c| c.commenter_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryCommentStore, InMemoryPostStore, InMemoryUserStore};
    use inkpost_auth::{AuthError, PermissionEvaluator, Policy, RouteParams};
    use inkpost_blog::{CreatePost, NewUser};

    fn new_user(email: &str, is_admin: bool) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: "someone".to_string(),
            password_hash: "hash".to_string(),
            is_admin,
        }
    }

    struct Fixture {
        users: Arc<InMemoryUserStore>,
        posts: Arc<InMemoryPostStore>,
        lookup: StoreLookup,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserStore::new());
        let posts = Arc::new(InMemoryPostStore::new());
        let comments = Arc::new(InMemoryCommentStore::new());
        let lookup = StoreLookup::new(users.clone(), posts.clone(), comments);
        Fixture {
            users,
            posts,
            lookup,
        }
    }

    #[tokio::test]
    async fn deleted_users_do_not_resolve() {
        let f = fixture();
        let admin = f.users.insert(new_user("root@example.com", true)).await.unwrap();

        let principal = f.lookup.find_principal(admin.id).await.unwrap().unwrap();
        assert!(principal.is_admin);

        f.users.soft_delete(admin.id).await.unwrap();
        assert_eq!(f.lookup.find_principal(admin.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn author_keeps_ownership_of_deleted_post() {
        let f = fixture();
        let author = f.users.insert(new_user("a@example.com", false)).await.unwrap();
        let post = f
            .posts
            .insert(
                author.id,
                CreatePost {
                    title: "t".into(),
                    content: "c".into(),
                    excerpt: "e".into(),
                    thumbnail: None,
                },
            )
            .await
            .unwrap();
        f.posts.soft_delete(post.id).await.unwrap();

        let evaluator = PermissionEvaluator::new(Arc::new(f.lookup.clone()));
        let principal = Principal::new(author.id, false);
        evaluator
            .authorize(&principal, Policy::OwnsPost, RouteParams::target(post.id.get()))
            .await
            .unwrap();

        let err = evaluator
            .authorize(&principal, Policy::OwnsComment, RouteParams::target(42))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound { .. }));
    }
}
