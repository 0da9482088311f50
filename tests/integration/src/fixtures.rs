//! Migration fixtures shared by the end-to-end scenarios.

/// Version of the migration creating the `users` table.
pub const DOMAIN_MODEL: i64 = 20170329154959;

/// Directory name of the migration creating the `users` table.
pub const DOMAIN_MODEL_DIR: &str = "20170329154959_introduce_domain_model";

/// Forward content creating the `users` table.
pub const DOMAIN_MODEL_UP: &str = "CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL
);";

/// Reverse content dropping the `users` table.
pub const DOMAIN_MODEL_DOWN: &str = "DROP TABLE users;";

/// Version of the seed migration that cannot be reverted.
pub const SEED_ADMIN: i64 = 20170511172647;

/// Directory name of the seed migration.
pub const SEED_ADMIN_DIR: &str = "20170511172647_irreversible_migration_brah";

/// Forward content of the seed migration.
pub const SEED_ADMIN_UP: &str =
    "INSERT INTO users (id, name, email) VALUES (1, 'admin', 'admin@example.com');";
