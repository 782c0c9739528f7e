use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};

use crate::models::BlogRow;
use crate::queries::placeholders;
use crate::{Database, UNICODE_LOWER, now_timestamp};

const BLOG_COLUMNS: &str = "b.id, b.title, b.description, b.photo, b.author_id, b.category_id, \
                            b.views, b.featured, b.slug, b.created_at, b.updated_at";

/// Which posts a listing returns. Every listing is newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlogFilter {
    All,
    /// Featured posts, at most `limit` of them.
    Featured { limit: u32 },
    /// Posts carrying at least one of the tags.
    Tags(Vec<String>),
    /// Title contains the needle, case-insensitive (Unicode lowercase).
    TitleContains(String),
    Author(String),
}

impl Database {
    // -- Blogs --

    pub fn insert_blog(&self, blog: &BlogRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO blogs (id, title, description, photo, author_id, category_id,
                                    views, featured, slug, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    blog.id,
                    blog.title,
                    blog.description,
                    blog.photo,
                    blog.author_id,
                    blog.category_id,
                    blog.views,
                    blog.featured,
                    blog.slug,
                    blog.created_at,
                    blog.updated_at,
                ],
            )?;
            write_tags(&tx, &blog.id, &blog.tags)?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_blog(&self, id: &str) -> Result<Option<BlogRow>> {
        self.with_conn(|conn| query_blog(conn, id))
    }

    pub fn list_blogs(&self, filter: &BlogFilter) -> Result<Vec<BlogRow>> {
        let (clause, params): (String, Vec<String>) = match filter {
            BlogFilter::All => (String::new(), vec![]),
            BlogFilter::Featured { limit } => (
                format!("WHERE b.featured = 1 ORDER BY b.created_at DESC, b.rowid DESC LIMIT {}", limit),
                vec![],
            ),
            BlogFilter::Tags(tags) => {
                if tags.is_empty() {
                    return Ok(vec![]);
                }
                (
                    format!(
                        "WHERE b.id IN (SELECT blog_id FROM blog_tags WHERE tag IN ({}))",
                        placeholders(tags.len())
                    ),
                    tags.clone(),
                )
            }
            BlogFilter::TitleContains(needle) => (
                format!("WHERE {}(b.title) LIKE ?1 ESCAPE '\\'", UNICODE_LOWER),
                vec![format!("%{}%", escape_like(&needle.to_lowercase()))],
            ),
            BlogFilter::Author(author_id) => {
                ("WHERE b.author_id = ?1".to_string(), vec![author_id.clone()])
            }
        };

        // Featured carries its own ORDER BY because LIMIT must follow it.
        let order = if matches!(filter, BlogFilter::Featured { .. }) {
            ""
        } else {
            "ORDER BY b.created_at DESC, b.rowid DESC"
        };

        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM blogs b {} {}", BLOG_COLUMNS, clause, order);
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt
                .query_map(params_from_iter(params.iter()), map_blog)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            load_tags_and_likes(conn, &mut rows)?;
            Ok(rows)
        })
    }

    /// Replace the editable columns and the tag list of an existing post.
    /// Views, likes, author and creation time are kept. Returns false if the
    /// post no longer exists.
    pub fn update_blog(&self, blog: &BlogRow) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE blogs
                 SET title = ?2, description = ?3, photo = ?4, category_id = ?5,
                     featured = ?6, slug = ?7, updated_at = ?8
                 WHERE id = ?1",
                rusqlite::params![
                    blog.id,
                    blog.title,
                    blog.description,
                    blog.photo,
                    blog.category_id,
                    blog.featured,
                    blog.slug,
                    now_timestamp(),
                ],
            )?;
            if changed == 0 {
                return Ok(false);
            }
            tx.execute("DELETE FROM blog_tags WHERE blog_id = ?1", [&blog.id])?;
            write_tags(&tx, &blog.id, &blog.tags)?;
            tx.commit()?;
            Ok(true)
        })
    }

    /// Hard delete; tags and likes go with the post.
    pub fn delete_blog(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM blogs WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Bump the view counter in place and return the post as it is after the
    /// increment. `None` if the post does not exist.
    pub fn record_view(&self, id: &str) -> Result<Option<BlogRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("UPDATE blogs SET views = views + 1 WHERE id = ?1", [id])?;
            if changed == 0 {
                return Ok(None);
            }
            query_blog(conn, id)
        })
    }

    /// Toggle a like: removes it if present, adds it if not.
    /// Returns `(liked, post)` where `liked` is true when the like was added,
    /// or `None` if the post does not exist.
    pub fn toggle_like(&self, blog_id: &str, user_id: &str) -> Result<Option<(bool, BlogRow)>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM blogs WHERE id = ?1)",
                [blog_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Ok(None);
            }

            let removed = tx.execute(
                "DELETE FROM blog_likes WHERE blog_id = ?1 AND user_id = ?2",
                (blog_id, user_id),
            )?;
            let liked = if removed == 0 {
                tx.execute(
                    "INSERT INTO blog_likes (blog_id, user_id, liked_at) VALUES (?1, ?2, ?3)",
                    (blog_id, user_id, now_timestamp()),
                )?;
                true
            } else {
                false
            };

            let blog = query_blog(&tx, blog_id)?;
            tx.commit()?;
            Ok(blog.map(|b| (liked, b)))
        })
    }
}

fn query_blog(conn: &Connection, id: &str) -> Result<Option<BlogRow>> {
    let sql = format!("SELECT {} FROM blogs b WHERE b.id = ?1", BLOG_COLUMNS);
    let row = conn.query_row(&sql, [id], map_blog).optional()?;

    match row {
        Some(row) => {
            let mut rows = vec![row];
            load_tags_and_likes(conn, &mut rows)?;
            Ok(rows.pop())
        }
        None => Ok(None),
    }
}

fn map_blog(row: &Row<'_>) -> rusqlite::Result<BlogRow> {
    Ok(BlogRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        photo: row.get(3)?,
        author_id: row.get(4)?,
        category_id: row.get(5)?,
        views: row.get(6)?,
        featured: row.get(7)?,
        slug: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        tags: vec![],
        likes: vec![],
    })
}

fn write_tags(conn: &Connection, blog_id: &str, tags: &[String]) -> Result<()> {
    let mut stmt =
        conn.prepare("INSERT INTO blog_tags (blog_id, position, tag) VALUES (?1, ?2, ?3)")?;
    for (position, tag) in tags.iter().enumerate() {
        stmt.execute(rusqlite::params![blog_id, position as i64, tag])?;
    }
    Ok(())
}

/// Batch-fetch tags and likes for a page of posts (two queries, not 2N).
fn load_tags_and_likes(conn: &Connection, rows: &mut [BlogRow]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let tags = group_by_blog(
        conn,
        &format!(
            "SELECT blog_id, tag FROM blog_tags WHERE blog_id IN ({}) ORDER BY blog_id, position",
            placeholders(ids.len())
        ),
        &ids,
    )?;
    let likes = group_by_blog(
        conn,
        &format!(
            "SELECT blog_id, user_id FROM blog_likes WHERE blog_id IN ({}) ORDER BY rowid",
            placeholders(ids.len())
        ),
        &ids,
    )?;

    for row in rows.iter_mut() {
        row.tags = tags.get(&row.id).cloned().unwrap_or_default();
        row.likes = likes.get(&row.id).cloned().unwrap_or_default();
    }
    Ok(())
}

fn group_by_blog(conn: &Connection, sql: &str, ids: &[String]) -> Result<HashMap<String, Vec<String>>> {
    let mut stmt = conn.prepare(sql)?;
    let pairs = stmt
        .query_map(params_from_iter(ids), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for (blog_id, value) in pairs {
        grouped.entry(blog_id).or_default().push(value);
    }
    Ok(grouped)
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
