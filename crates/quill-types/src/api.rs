use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Session token --

/// Payload of a session token: the user id and the expiry as a unix timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForgotPasswordRequest {
    pub email: String,
    pub answer: String,
    #[serde(alias = "newPassword")]
    pub new_password: String,
}

/// Fields a user may change on their own profile. Anything else in the
/// body is rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub interests: Option<Vec<String>>,
    pub about: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
}

// -- Blogs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBlogRequest {
    pub title: String,
    pub description: String,
    pub photo: Option<String>,
    pub category: Option<Uuid>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBlogRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub photo: Option<String>,
    pub category: Option<Uuid>,
    pub featured: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub slug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

/// `?tags=rust,web` — comma separated.
#[derive(Debug, Deserialize)]
pub struct RelatedQuery {
    #[serde(default)]
    pub tags: String,
}

impl RelatedQuery {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// -- Categories --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryRequest {
    pub name: String,
}
