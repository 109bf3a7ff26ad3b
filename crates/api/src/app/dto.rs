use serde::{Deserialize, Serialize};

use inkpost_auth::Principal;
use inkpost_blog::{Comment, Post, RegisterUser, User};
use inkpost_infra::PageRequest;

// -------------------------
// Request DTOs
// -------------------------

/// `?limit=&cursor=` on list endpoints. Both are non-negative; `0` means
/// "no limit" and "from the head" respectively.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub limit: Option<u64>,
    pub cursor: Option<u64>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.limit, self.cursor)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Admin-created account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(flatten)]
    pub account: RegisterUser,
    #[serde(default)]
    pub is_admin: bool,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmI {
    pub id: i64,
    pub is_admin: bool,
}

impl From<Principal> for WhoAmI {
    fn from(p: Principal) -> Self {
        Self {
            id: p.id.get(),
            is_admin: p.is_admin,
        }
    }
}

/// A post with its visible comments, oldest first.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
}
