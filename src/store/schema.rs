pub const SCHEMA: &str = r#"
-- Applications are independent product surfaces
CREATE TABLE IF NOT EXISTS applications (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);

-- Permission catalog, seeded at startup
CREATE TABLE IF NOT EXISTS permissions (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    comment TEXT
);

-- Optional qualifiers attachable to a grant
CREATE TABLE IF NOT EXISTS restrictions (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    comment TEXT
);

CREATE TABLE IF NOT EXISTS roles (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    system_name TEXT,              -- bootstrap marker, not unique
    comment TEXT,
    application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Grants: (role, permission, optional restriction)
CREATE TABLE IF NOT EXISTS role_permissions (
    id TEXT PRIMARY KEY,
    role_id TEXT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    permission_id TEXT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
    restriction_id TEXT REFERENCES restrictions(id) ON DELETE SET NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Role inclusion graph: parent includes child. Must stay acyclic.
CREATE TABLE IF NOT EXISTS role_includes (
    id TEXT PRIMARY KEY,
    parent_role_id TEXT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    child_role_id TEXT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    created_by TEXT,
    modified_by TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    CHECK (parent_role_id <> child_role_id),
    UNIQUE(parent_role_id, child_role_id)
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2id PHC string
    full_name TEXT NOT NULL,
    position TEXT,
    is_superadmin INTEGER NOT NULL DEFAULT 0,
    is_verified INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Companies are tenant boundaries
CREATE TABLE IF NOT EXISTS companies (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Seed role assignments
CREATE TABLE IF NOT EXISTS user_company_relations (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    role_id TEXT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),

    UNIQUE(user_id, company_id, role_id)
);

CREATE INDEX IF NOT EXISTS idx_roles_application ON roles(application_id);
CREATE INDEX IF NOT EXISTS idx_role_permissions_role ON role_permissions(role_id);
CREATE INDEX IF NOT EXISTS idx_role_includes_parent ON role_includes(parent_role_id);
CREATE INDEX IF NOT EXISTS idx_role_includes_child ON role_includes(child_role_id);
CREATE INDEX IF NOT EXISTS idx_ucr_user ON user_company_relations(user_id);
CREATE INDEX IF NOT EXISTS idx_ucr_company ON user_company_relations(company_id);
"#;
