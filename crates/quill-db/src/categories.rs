use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::CategoryRow;
use crate::{Database, now_timestamp};

impl Database {
    // -- Categories --

    pub fn insert_category(&self, category: &CategoryRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO categories (id, name, slug, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    &category.id,
                    &category.name,
                    &category.slug,
                    &category.created_at,
                    &category.updated_at,
                ),
            )?;
            Ok(())
        })
    }

    pub fn get_category_by_slug(&self, slug: &str) -> Result<Option<CategoryRow>> {
        self.with_conn(|conn| query_category(conn, "slug", slug))
    }

    pub fn get_category_by_name(&self, name: &str) -> Result<Option<CategoryRow>> {
        self.with_conn(|conn| query_category(conn, "name", name))
    }

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, slug, created_at, updated_at FROM categories
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([], map_category)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Rename a category. Posts referencing it are not touched.
    pub fn update_category(&self, id: &str, name: &str, slug: &str) -> Result<Option<CategoryRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE categories SET name = ?2, slug = ?3, updated_at = ?4 WHERE id = ?1",
                (id, name, slug, now_timestamp()),
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_category(conn, "id", id)
        })
    }

    /// Delete and return the removed category. Posts keep their (now
    /// dangling) reference.
    pub fn delete_category(&self, id: &str) -> Result<Option<CategoryRow>> {
        self.with_conn_mut(|conn| {
            let Some(existing) = query_category(conn, "id", id)? else {
                return Ok(None);
            };
            conn.execute("DELETE FROM categories WHERE id = ?1", [id])?;
            Ok(Some(existing))
        })
    }
}

fn query_category(conn: &Connection, column: &str, value: &str) -> Result<Option<CategoryRow>> {
    let sql = format!(
        "SELECT id, name, slug, created_at, updated_at FROM categories WHERE {} = ?1
         ORDER BY created_at, rowid LIMIT 1",
        column
    );
    let row = conn.query_row(&sql, [value], map_category).optional()?;
    Ok(row)
}

fn map_category(row: &Row<'_>) -> rusqlite::Result<CategoryRow> {
    Ok(CategoryRow {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_slug_and_name() {
        let db = Database::open_in_memory().unwrap();
        let cat = CategoryRow::new("Rust Tips", "rust-tips");
        db.insert_category(&cat).unwrap();

        assert_eq!(db.get_category_by_slug("rust-tips").unwrap().unwrap().id, cat.id);
        assert_eq!(db.get_category_by_name("Rust Tips").unwrap().unwrap().id, cat.id);
        assert!(db.get_category_by_slug("nope").unwrap().is_none());
    }

    #[test]
    fn rename_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let cat = CategoryRow::new("Old", "old");
        db.insert_category(&cat).unwrap();

        let renamed = db.update_category(&cat.id, "New", "new").unwrap().unwrap();
        assert_eq!(renamed.slug, "new");
        assert!(db.update_category("missing", "x", "x").unwrap().is_none());

        let deleted = db.delete_category(&cat.id).unwrap().unwrap();
        assert_eq!(deleted.name, "New");
        assert!(db.delete_category(&cat.id).unwrap().is_none());
        assert!(db.list_categories().unwrap().is_empty());
    }
}
