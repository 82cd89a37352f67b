//! Database schema and migrations for Corkboard.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users table
    r#"
-- Users table for authentication and member management
CREATE TABLE users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password      TEXT NOT NULL,           -- Argon2 hash
    display_name  TEXT NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at    TEXT
);

CREATE INDEX idx_users_username ON users(username);
CREATE INDEX idx_users_email ON users(email);
"#,
    // v2: Roles and role assignments; the role set is fixed and seeded here
    r#"
CREATE TABLE roles (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL UNIQUE,
    description  TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE user_roles (
    user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    role_id      INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    assigned_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (user_id, role_id)
);

CREATE INDEX idx_user_roles_role_id ON user_roles(role_id);

INSERT INTO roles (name, description) VALUES
    ('Admin', 'Full administrative access'),
    ('SubAdmin', 'Limited administrative access'),
    ('User', 'Regular member');
"#,
    // v3: Categories and per-category access grants
    r#"
CREATE TABLE categories (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    slug           TEXT NOT NULL UNIQUE,
    description    TEXT,
    display_order  INTEGER NOT NULL DEFAULT 0,
    is_active      INTEGER NOT NULL DEFAULT 1,
    is_public      INTEGER NOT NULL DEFAULT 1,
    require_auth   INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_categories_display_order ON categories(display_order);
CREATE INDEX idx_categories_is_active ON categories(is_active);

-- A grant names exactly one of user_id / role_id
CREATE TABLE category_access (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id  INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    user_id      INTEGER REFERENCES users(id) ON DELETE CASCADE,
    role_id      INTEGER REFERENCES roles(id) ON DELETE CASCADE,
    tier         INTEGER NOT NULL DEFAULT 1,  -- 1=read, 2=write, 3=manage
    created_at   TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((user_id IS NULL) != (role_id IS NULL))
);

CREATE INDEX idx_category_access_category_id ON category_access(category_id);
CREATE INDEX idx_category_access_user_id ON category_access(user_id);
CREATE INDEX idx_category_access_role_id ON category_access(role_id);
CREATE UNIQUE INDEX idx_category_access_user
    ON category_access(category_id, user_id) WHERE user_id IS NOT NULL;
CREATE UNIQUE INDEX idx_category_access_role
    ON category_access(category_id, role_id) WHERE role_id IS NOT NULL;
"#,
    // v4: Posts and comments; content is owned by a user or anonymous
    // with a hashed author password, never both
    r#"
CREATE TABLE posts (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id      INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    user_id          INTEGER REFERENCES users(id),
    title            TEXT NOT NULL,
    content          TEXT NOT NULL,
    author_nickname  TEXT NOT NULL,
    author_password  TEXT,                   -- Argon2 hash for anonymous posts
    view_count       INTEGER NOT NULL DEFAULT 0,
    vote_count       INTEGER NOT NULL DEFAULT 0,
    is_deleted       INTEGER NOT NULL DEFAULT 0,
    is_pinned        INTEGER NOT NULL DEFAULT 0,
    pinned_at        TEXT,
    created_at       TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at       TEXT,
    CHECK ((user_id IS NULL) != (author_password IS NULL))
);

CREATE INDEX idx_posts_category_id ON posts(category_id);
CREATE INDEX idx_posts_user_id ON posts(user_id);
CREATE INDEX idx_posts_created_at ON posts(created_at);

CREATE TABLE comments (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id            INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    parent_comment_id  INTEGER REFERENCES comments(id),
    user_id            INTEGER REFERENCES users(id),
    content            TEXT NOT NULL,
    author_nickname    TEXT NOT NULL,
    author_password    TEXT,                 -- Argon2 hash for anonymous comments
    is_deleted         INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at         TEXT,
    CHECK ((user_id IS NULL) != (author_password IS NULL))
);

CREATE INDEX idx_comments_post_id ON comments(post_id);
CREATE INDEX idx_comments_user_id ON comments(user_id);
CREATE INDEX idx_comments_parent_comment_id ON comments(parent_comment_id);
"#,
    // v5: Post votes, one per user or per anonymous IP. The user channel is
    // unique at the storage layer; the IP channel only carries an index and
    // is kept unique by the vote logic.
    r#"
CREATE TABLE post_votes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
    user_id     INTEGER REFERENCES users(id) ON DELETE SET NULL,
    ip_address  TEXT,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX idx_post_votes_user
    ON post_votes(post_id, user_id) WHERE user_id IS NOT NULL;
CREATE INDEX idx_post_votes_ip ON post_votes(post_id, ip_address);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_first_migration_contains_users_table() {
        let first = MIGRATIONS[0];
        assert!(first.contains("CREATE TABLE users"));
        assert!(first.contains("username"));
        assert!(first.contains("password"));
        assert!(first.contains("display_name"));
    }

    #[test]
    fn test_roles_migration_seeds_fixed_set() {
        let roles = MIGRATIONS[1];
        assert!(roles.contains("CREATE TABLE roles"));
        assert!(roles.contains("CREATE TABLE user_roles"));
        assert!(roles.contains("'Admin'"));
        assert!(roles.contains("'SubAdmin'"));
        assert!(roles.contains("'User'"));
        assert!(roles.contains("PRIMARY KEY (user_id, role_id)"));
    }

    #[test]
    fn test_category_access_names_exactly_one_subject() {
        let categories = MIGRATIONS[2];
        assert!(categories.contains("CREATE TABLE category_access"));
        assert!(categories.contains("(user_id IS NULL) != (role_id IS NULL)"));
    }

    #[test]
    fn test_content_author_invariant() {
        let content = MIGRATIONS[3];
        assert!(content.contains("CREATE TABLE posts"));
        assert!(content.contains("CREATE TABLE comments"));
        assert!(content.contains("(user_id IS NULL) != (author_password IS NULL)"));
    }

    #[test]
    fn test_vote_channel_indexes() {
        let votes = MIGRATIONS[4];
        assert!(votes.contains("CREATE UNIQUE INDEX idx_post_votes_user"));
        assert!(votes.contains("WHERE user_id IS NOT NULL"));
        // The IP channel carries a plain index only
        assert!(votes.contains("CREATE INDEX idx_post_votes_ip"));
    }

    #[test]
    fn test_migrations_are_valid_sql() {
        for migration in MIGRATIONS {
            assert!(!migration.trim().is_empty());
            assert!(
                migration.contains("CREATE TABLE")
                    || migration.contains("ALTER TABLE")
                    || migration.contains("CREATE INDEX")
            );
        }
    }
}
