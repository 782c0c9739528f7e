use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                answer      TEXT NOT NULL,
                role        TEXT NOT NULL DEFAULT 'user',
                avatar      TEXT,
                interests   TEXT NOT NULL DEFAULT '[]',
                about       TEXT NOT NULL DEFAULT '',
                phone       TEXT NOT NULL DEFAULT '',
                address     TEXT NOT NULL DEFAULT '',
                gender      TEXT NOT NULL DEFAULT '',
                birthday    TEXT,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            -- Name uniqueness is checked by the application only.
            CREATE TABLE categories (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                slug        TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_categories_slug ON categories(slug);

            -- author_id and category_id are plain references: deleting a user
            -- or a category leaves their posts in place.
            CREATE TABLE blogs (
                id           TEXT PRIMARY KEY,
                title        TEXT NOT NULL,
                description  TEXT NOT NULL,
                photo        TEXT NOT NULL,
                author_id    TEXT NOT NULL,
                category_id  TEXT,
                views        INTEGER NOT NULL DEFAULT 0,
                featured     INTEGER NOT NULL DEFAULT 0,
                slug         TEXT NOT NULL,
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL
            );

            CREATE INDEX idx_blogs_author ON blogs(author_id);
            CREATE INDEX idx_blogs_created ON blogs(created_at);

            CREATE TABLE blog_tags (
                blog_id   TEXT NOT NULL REFERENCES blogs(id) ON DELETE CASCADE,
                position  INTEGER NOT NULL,
                tag       TEXT NOT NULL,
                PRIMARY KEY (blog_id, position)
            );

            CREATE INDEX idx_blog_tags_tag ON blog_tags(tag);

            CREATE TABLE blog_likes (
                blog_id   TEXT NOT NULL REFERENCES blogs(id) ON DELETE CASCADE,
                user_id   TEXT NOT NULL,
                liked_at  TEXT NOT NULL,
                PRIMARY KEY (blog_id, user_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }
}
