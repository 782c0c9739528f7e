//! Database row types. These map directly to SQLite rows and are converted
//! into the `quill-types` models at the edge of the store.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;
use uuid::Uuid;

use quill_types::models::{Blog, Category, Role, User};

use crate::now_timestamp;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub answer: String,
    pub role: String,
    pub avatar: Option<String>,
    /// JSON array of strings.
    pub interests: String,
    pub about: String,
    pub phone: String,
    pub address: String,
    pub gender: String,
    /// `YYYY-MM-DD`
    pub birthday: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRow {
    /// Fresh account row with empty profile fields.
    pub fn new(name: &str, email: &str, password_hash: &str, answer: &str, role: Role) -> Self {
        let now = now_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            answer: answer.to_string(),
            role: role.as_str().to_string(),
            avatar: None,
            interests: "[]".to_string(),
            about: String::new(),
            phone: String::new(),
            address: String::new(),
            gender: String::new(),
            birthday: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_else(|e| {
            warn!("User '{}': {}, treating as user", self.id, e);
            Role::User
        })
    }

    pub fn interest_list(&self) -> Vec<String> {
        serde_json::from_str(&self.interests).unwrap_or_else(|e| {
            warn!("Corrupt interests on user '{}': {}", self.id, e);
            Vec::new()
        })
    }

    pub fn set_interests(&mut self, interests: &[String]) {
        // Serializing a slice of strings cannot fail.
        self.interests = serde_json::to_string(interests).unwrap_or_else(|_| "[]".to_string());
    }

    /// Sanitized public view: the hash and the recovery answer are dropped.
    pub fn into_user(self) -> User {
        let role = self.role();
        let interests = self.interest_list();
        let birthday = self.birthday.as_deref().and_then(|b| {
            NaiveDate::parse_from_str(b, "%Y-%m-%d")
                .map_err(|e| warn!("Corrupt birthday '{}' on user '{}': {}", b, self.id, e))
                .ok()
        });

        User {
            id: parse_id(&self.id, "user"),
            created_at: parse_timestamp(&self.created_at, &self.id),
            updated_at: parse_timestamp(&self.updated_at, &self.id),
            name: self.name,
            email: self.email,
            role,
            avatar: self.avatar,
            interests,
            about: self.about,
            phone: self.phone,
            address: self.address,
            gender: self.gender,
            birthday,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlogRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub photo: String,
    pub author_id: String,
    pub category_id: Option<String>,
    pub views: i64,
    pub featured: bool,
    pub slug: String,
    pub created_at: String,
    pub updated_at: String,
    /// Ordered by position.
    pub tags: Vec<String>,
    /// User ids, in the order the likes were given.
    pub likes: Vec<String>,
}

impl BlogRow {
    pub fn into_blog(self, author: Option<User>) -> Blog {
        let likes = self
            .likes
            .iter()
            .filter_map(|l| {
                l.parse()
                    .map_err(|e| warn!("Corrupt like '{}' on blog '{}': {}", l, self.id, e))
                    .ok()
            })
            .collect();
        let category = self.category_id.as_deref().and_then(|c| {
            c.parse()
                .map_err(|e| warn!("Corrupt category_id '{}' on blog '{}': {}", c, self.id, e))
                .ok()
        });

        Blog {
            id: parse_id(&self.id, "blog"),
            author_id: parse_id(&self.author_id, "author"),
            created_at: parse_timestamp(&self.created_at, &self.id),
            updated_at: parse_timestamp(&self.updated_at, &self.id),
            title: self.title,
            description: self.description,
            photo: self.photo,
            author,
            category,
            likes,
            views: self.views,
            featured: self.featured,
            tags: self.tags,
            slug: self.slug,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub created_at: String,
    pub updated_at: String,
}

impl CategoryRow {
    pub fn new(name: &str, slug: &str) -> Self {
        let now = now_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn into_category(self) -> Category {
        Category {
            id: parse_id(&self.id, "category"),
            created_at: parse_timestamp(&self.created_at, &self.id),
            updated_at: parse_timestamp(&self.updated_at, &self.id),
            name: self.name,
            slug: self.slug,
        }
    }
}

fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str, owner: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through the sqlite shell use datetime('now').
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on '{}': {}", raw, owner, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_user_drops_secrets_and_parses_profile() {
        let mut row = UserRow::new("Ada", "ada@example.com", "$argon2id$hash", "blue", Role::Admin);
        row.set_interests(&["rust".to_string(), "math".to_string()]);
        row.birthday = Some("1815-12-10".to_string());

        let user = row.clone().into_user();
        assert_eq!(user.id.to_string(), row.id);
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.interests, vec!["rust", "math"]);
        assert_eq!(user.birthday, NaiveDate::from_ymd_opt(1815, 12, 10));

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("answer").is_none());
    }

    #[test]
    fn sqlite_style_timestamps_are_accepted() {
        let ts = parse_timestamp("2024-05-01 10:20:30", "x");
        assert_eq!(ts.to_rfc3339(), "2024-05-01T10:20:30+00:00");
    }
}
