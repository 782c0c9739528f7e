use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};

use quill_types::models::Role;

use crate::models::UserRow;
use crate::{Database, now_timestamp};

const USER_COLUMNS: &str = "id, name, email, password, answer, role, avatar, interests, about, \
                            phone, address, gender, birthday, created_at, updated_at";

impl Database {
    // -- Users --

    /// Fails with a constraint violation (see [`crate::is_unique_violation`])
    /// when the email is already registered.
    pub fn create_user(&self, user: &UserRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password, answer, role, avatar, interests, about,
                                    phone, address, gender, birthday, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                rusqlite::params![
                    user.id,
                    user.name,
                    user.email,
                    user.password,
                    user.answer,
                    user.role,
                    user.avatar,
                    user.interests,
                    user.about,
                    user.phone,
                    user.address,
                    user.gender,
                    user.birthday,
                    user.created_at,
                    user.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Batch-fetch users, e.g. the authors of a page of posts.
    pub fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<UserRow>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users WHERE id IN ({})",
                USER_COLUMNS,
                placeholders(ids.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(ids), map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users ORDER BY created_at DESC, rowid DESC",
                USER_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Write back the profile columns of `user`. Credentials, role and email
    /// are never touched here. Returns false if the user no longer exists.
    pub fn update_user_profile(&self, user: &UserRow) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET name = ?2, avatar = ?3, interests = ?4, about = ?5, phone = ?6,
                     address = ?7, gender = ?8, birthday = ?9, updated_at = ?10
                 WHERE id = ?1",
                rusqlite::params![
                    user.id,
                    user.name,
                    user.avatar,
                    user.interests,
                    user.about,
                    user.phone,
                    user.address,
                    user.gender,
                    user.birthday,
                    now_timestamp(),
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?2, updated_at = ?3 WHERE id = ?1",
                (id, password_hash, now_timestamp()),
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_user_role(&self, id: &str, role: Role) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET role = ?2, updated_at = ?3 WHERE id = ?1",
                (id, role.as_str(), now_timestamp()),
            )?;
            Ok(changed > 0)
        })
    }

    /// Hard delete. Posts written by the user are left in place.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let row = conn.query_row(&sql, [value], map_user).optional()?;
    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        answer: row.get(4)?,
        role: row.get(5)?,
        avatar: row.get(6)?,
        interests: row.get(7)?,
        about: row.get(8)?,
        phone: row.get(9)?,
        address: row.get(10)?,
        gender: row.get(11)?,
        birthday: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

/// `?1, ?2, ... ?n`
pub(crate) fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_unique_violation;

    fn user(email: &str) -> UserRow {
        UserRow::new("Test", email, "hash", "answer", Role::User)
    }

    #[test]
    fn duplicate_email_is_a_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        let first = user("dup@example.com");
        db.create_user(&first).unwrap();

        let err = db.create_user(&user("dup@example.com")).unwrap_err();
        assert!(is_unique_violation(&err));

        let stored = db.get_user_by_email("dup@example.com").unwrap().unwrap();
        assert_eq!(stored.id, first.id);
    }

    #[test]
    fn profile_update_leaves_credentials_alone() {
        let db = Database::open_in_memory().unwrap();
        let mut row = user("p@example.com");
        db.create_user(&row).unwrap();

        row.about = "hello".into();
        row.password = "should-not-be-written".into();
        row.set_interests(&["rust".into()]);
        assert!(db.update_user_profile(&row).unwrap());

        let stored = db.get_user_by_id(&row.id).unwrap().unwrap();
        assert_eq!(stored.about, "hello");
        assert_eq!(stored.password, "hash");
        assert_eq!(stored.interest_list(), vec!["rust"]);
    }

    #[test]
    fn batch_fetch_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let a = user("a@example.com");
        let b = user("b@example.com");
        db.create_user(&a).unwrap();
        db.create_user(&b).unwrap();

        let found = db.get_users_by_ids(&[a.id.clone(), b.id.clone()]).unwrap();
        assert_eq!(found.len(), 2);
        assert!(db.get_users_by_ids(&[]).unwrap().is_empty());

        assert!(db.delete_user(&a.id).unwrap());
        assert!(!db.delete_user(&a.id).unwrap());
        assert_eq!(db.list_users().unwrap().len(), 1);
    }

    #[test]
    fn role_and_password_updates() {
        let db = Database::open_in_memory().unwrap();
        let row = user("r@example.com");
        db.create_user(&row).unwrap();

        assert!(db.set_user_role(&row.id, Role::Admin).unwrap());
        assert!(db.update_password(&row.id, "new-hash").unwrap());

        let stored = db.get_user_by_id(&row.id).unwrap().unwrap();
        assert_eq!(stored.role(), Role::Admin);
        assert_eq!(stored.password, "new-hash");
    }
}
