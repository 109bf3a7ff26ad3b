use serde::Serialize;

/// Authorization rule declared for a protected route.
///
/// Closed set: adding a variant forces every evaluator `match` to handle it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Authentication only.
    None,
    /// The principal must carry the admin flag.
    AdminOnly,
    /// The principal must be the user named by the route.
    SelfOnly,
    /// The principal must be the author of the post named by the route.
    OwnsPost,
    /// The principal must be the commenter of the comment named by the route.
    OwnsComment,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::None => "none",
            Policy::AdminOnly => "admin_only",
            Policy::SelfOnly => "self_only",
            Policy::OwnsPost => "owns_post",
            Policy::OwnsComment => "owns_comment",
        }
    }
}

impl core::fmt::Display for Policy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route parameters relevant to policy evaluation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    /// The `:id` segment of the route, if any.
    pub target_id: Option<i64>,
}

impl RouteParams {
    pub fn none() -> Self {
        Self { target_id: None }
    }

    pub fn target(id: i64) -> Self {
        Self {
            target_id: Some(id),
        }
    }
}
