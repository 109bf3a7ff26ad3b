use std::sync::Arc;

use async_trait::async_trait;

use inkpost_core::{CommentId, PostId, UserId};

use crate::{AuthError, LookupError, Policy, Principal, RouteParams};

/// Ownership facts needed by the resource-owner policies.
///
/// Lookups ignore soft deletion: a deleted post still has an author.
#[async_trait]
pub trait OwnershipLookup: Send + Sync {
    async fn post_author(&self, id: PostId) -> Result<Option<UserId>, LookupError>;

    async fn comment_commenter(&self, id: CommentId) -> Result<Option<UserId>, LookupError>;
}

/// Decides whether a principal may pass a route's [`Policy`].
///
/// - At most one storage read (ownership policies only)
/// - No writes
/// - Admins get no ownership bypass
#[derive(Clone)]
pub struct PermissionEvaluator {
    ownership: Arc<dyn OwnershipLookup>,
}

impl PermissionEvaluator {
    pub fn new(ownership: Arc<dyn OwnershipLookup>) -> Self {
        Self { ownership }
    }

    pub async fn authorize(
        &self,
        principal: &Principal,
        policy: Policy,
        params: RouteParams,
    ) -> Result<(), AuthError> {
        let allowed = match policy {
            Policy::None => true,
            Policy::AdminOnly => principal.is_admin,
            Policy::SelfOnly => params.target_id == Some(principal.id.get()),
            Policy::OwnsPost => match params.target_id {
                Some(id) => {
                    let author = self
                        .ownership
                        .post_author(PostId::new(id))
                        .await?
                        .ok_or(AuthError::NotFound { resource: "post" })?;
                    author == principal.id
                }
                None => false,
            },
            Policy::OwnsComment => match params.target_id {
                Some(id) => {
                    let commenter = self
                        .ownership
                        .comment_commenter(CommentId::new(id))
                        .await?
                        .ok_or(AuthError::NotFound { resource: "comment" })?;
                    commenter == principal.id
                }
                None => false,
            },
        };

        if allowed {
            Ok(())
        } else {
            tracing::debug!(
                principal = %principal.id,
                policy = %policy,
                target = ?params.target_id,
                "policy denied"
            );
            Err(AuthError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use proptest::prelude::*;

    #[derive(Default)]
    struct Owners {
        posts: HashMap<PostId, UserId>,
        comments: HashMap<CommentId, UserId>,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl OwnershipLookup for Owners {
        async fn post_author(&self, id: PostId) -> Result<Option<UserId>, LookupError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.posts.get(&id).copied())
        }

        async fn comment_commenter(&self, id: CommentId) -> Result<Option<UserId>, LookupError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.comments.get(&id).copied())
        }
    }

    fn evaluator(owners: Owners) -> (PermissionEvaluator, Arc<Owners>) {
        let owners = Arc::new(owners);
        (PermissionEvaluator::new(owners.clone()), owners)
    }

    fn user(id: i64) -> Principal {
        Principal::new(UserId::new(id), false)
    }

    fn admin(id: i64) -> Principal {
        Principal::new(UserId::new(id), true)
    }

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(f)
    }

    #[tokio::test]
    async fn none_allows_any_authenticated_principal() {
        let (eval, owners) = evaluator(Owners::default());
        assert_eq!(eval.authorize(&user(5), Policy::None, RouteParams::none()).await, Ok(()));
        assert_eq!(owners.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn admin_only_checks_the_role_flag() {
        let (eval, _) = evaluator(Owners::default());
        assert_eq!(eval.authorize(&admin(1), Policy::AdminOnly, RouteParams::none()).await, Ok(()));
        assert_eq!(
            eval.authorize(&user(1), Policy::AdminOnly, RouteParams::none()).await,
            Err(AuthError::Forbidden)
        );
    }

    #[tokio::test]
    async fn self_only_compares_ids_including_zero() {
        let (eval, _) = evaluator(Owners::default());
        assert_eq!(eval.authorize(&user(0), Policy::SelfOnly, RouteParams::target(0)).await, Ok(()));
        assert_eq!(
            eval.authorize(&user(0), Policy::SelfOnly, RouteParams::target(1)).await,
            Err(AuthError::Forbidden)
        );
        assert_eq!(
            eval.authorize(&user(1), Policy::SelfOnly, RouteParams::none()).await,
            Err(AuthError::Forbidden)
        );
    }

    #[tokio::test]
    async fn owns_post_allows_only_the_author_even_over_admins() {
        let mut owners = Owners::default();
        owners.posts.insert(PostId::new(10), UserId::new(1));
        let (eval, owners) = evaluator(owners);

        assert_eq!(eval.authorize(&user(1), Policy::OwnsPost, RouteParams::target(10)).await, Ok(()));
        assert_eq!(
            eval.authorize(&user(2), Policy::OwnsPost, RouteParams::target(10)).await,
            Err(AuthError::Forbidden)
        );
        assert_eq!(
            eval.authorize(&admin(3), Policy::OwnsPost, RouteParams::target(10)).await,
            Err(AuthError::Forbidden)
        );
        assert_eq!(owners.reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_resources_are_not_found_not_forbidden() {
        let (eval, _) = evaluator(Owners::default());
        assert_eq!(
            eval.authorize(&user(1), Policy::OwnsPost, RouteParams::target(99)).await,
            Err(AuthError::NotFound { resource: "post" })
        );
        assert_eq!(
            eval.authorize(&user(1), Policy::OwnsComment, RouteParams::target(99)).await,
            Err(AuthError::NotFound { resource: "comment" })
        );
    }

    #[tokio::test]
    async fn owns_comment_compares_the_commenter() {
        let mut owners = Owners::default();
        owners.comments.insert(CommentId::new(4), UserId::new(8));
        let (eval, _) = evaluator(owners);

        assert_eq!(eval.authorize(&user(8), Policy::OwnsComment, RouteParams::target(4)).await, Ok(()));
        assert_eq!(
            eval.authorize(&user(9), Policy::OwnsComment, RouteParams::target(4)).await,
            Err(AuthError::Forbidden)
        );
        assert_eq!(
            eval.authorize(&user(8), Policy::OwnsComment, RouteParams::none()).await,
            Err(AuthError::Forbidden)
        );
    }

    proptest! {
        #[test]
        fn admin_only_always_denies_non_admins(id in any::<i64>(), target in proptest::option::of(any::<i64>())) {
            let (eval, _) = evaluator(Owners::default());
            let params = RouteParams { target_id: target };
            let outcome = block_on(eval.authorize(&user(id), Policy::AdminOnly, params));
            prop_assert_eq!(outcome, Err(AuthError::Forbidden));
        }

        #[test]
        fn self_only_allows_iff_ids_match(id in -3i64..3, target in -3i64..3) {
            let (eval, _) = evaluator(Owners::default());
            let outcome = block_on(eval.authorize(&user(id), Policy::SelfOnly, RouteParams::target(target)));
            prop_assert_eq!(outcome.is_ok(), id == target);
        }
    }
}
