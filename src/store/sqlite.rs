use std::os::raw::c_int;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, ffi, params, params_from_iter};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const ROLE_COLUMNS: &str = "id, name, system_name, comment, application_id, created_at";
const GRANT_COLUMNS: &str = "id, role_id, permission_id, restriction_id, created_at";
const INCLUDE_COLUMNS: &str =
    "id, parent_role_id, child_role_id, created_by, modified_by, created_at, updated_at";
const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, position, is_superadmin, is_verified, created_at";
const RELATION_COLUMNS: &str = "id, user_id, company_id, role_id, application_id, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database. Used by tests and tooling.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// `?1, ?2, ..., ?n` for an `IN (...)` list.
fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn constraint_code(e: &rusqlite::Error) -> Option<c_int> {
    match e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            Some(err.extended_code)
        }
        _ => None,
    }
}

fn map_write_error(e: rusqlite::Error, entity: &str) -> Error {
    match constraint_code(&e) {
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
            Error::Conflict(format!("{entity} already exists"))
        }
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
            Error::not_found(format!("record referenced by {entity}"))
        }
        _ => Error::from(e),
    }
}

fn map_include_error(e: rusqlite::Error) -> Error {
    match constraint_code(&e) {
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => Error::DuplicateEdge,
        Some(ffi::SQLITE_CONSTRAINT_CHECK) => Error::SelfInclusion,
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => Error::not_found("role"),
        _ => Error::from(e),
    }
}

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<Application> {
    Ok(Application {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_active: row.get(3)?,
    })
}

fn permission_from_row(row: &Row<'_>) -> rusqlite::Result<Permission> {
    Ok(Permission {
        id: row.get(0)?,
        name: row.get(1)?,
        comment: row.get(2)?,
    })
}

fn restriction_from_row(row: &Row<'_>) -> rusqlite::Result<Restriction> {
    Ok(Restriction {
        id: row.get(0)?,
        name: row.get(1)?,
        comment: row.get(2)?,
    })
}

fn role_from_row(row: &Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: row.get(0)?,
        name: row.get(1)?,
        system_name: row.get(2)?,
        comment: row.get(3)?,
        application_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn grant_from_row(row: &Row<'_>) -> rusqlite::Result<RolePermission> {
    Ok(RolePermission {
        id: row.get(0)?,
        role_id: row.get(1)?,
        permission_id: row.get(2)?,
        restriction_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn include_from_row(row: &Row<'_>) -> rusqlite::Result<RoleInclude> {
    Ok(RoleInclude {
        id: row.get(0)?,
        parent_role_id: row.get(1)?,
        child_role_id: row.get(2)?,
        created_by: row.get(3)?,
        modified_by: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        full_name: row.get(3)?,
        position: row.get(4)?,
        is_superadmin: row.get(5)?,
        is_verified: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn company_from_row(row: &Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn relation_from_row(row: &Row<'_>) -> rusqlite::Result<UserCompanyRelation> {
    Ok(UserCompanyRelation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        company_id: row.get(2)?,
        role_id: row.get(3)?,
        application_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Application operations

    fn upsert_application(&self, app: &Application) -> Result<()> {
        self.conn().execute(
            "INSERT INTO applications (id, name, description, is_active)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                is_active = excluded.is_active",
            params![app.id, app.name, app.description, app.is_active],
        )?;
        Ok(())
    }

    fn get_application(&self, id: &str) -> Result<Option<Application>> {
        self.conn()
            .query_row(
                "SELECT id, name, description, is_active FROM applications WHERE id = ?1",
                params![id],
                application_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_applications(&self) -> Result<Vec<Application>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, description, is_active FROM applications ORDER BY id")?;
        let rows = stmt.query_map([], application_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Permission catalog operations

    fn upsert_permission(&self, permission: &Permission) -> Result<()> {
        self.conn().execute(
            "INSERT INTO permissions (id, name, comment)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                comment = excluded.comment",
            params![permission.id, permission.name, permission.comment],
        )?;
        Ok(())
    }

    fn get_permission(&self, id: &str) -> Result<Option<Permission>> {
        self.conn()
            .query_row(
                "SELECT id, name, comment FROM permissions WHERE id = ?1",
                params![id],
                permission_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_permissions(&self) -> Result<Vec<Permission>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, comment FROM permissions ORDER BY id")?;
        let rows = stmt.query_map([], permission_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Restriction operations

    fn create_restriction(&self, restriction: &Restriction) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO restrictions (id, name, comment) VALUES (?1, ?2, ?3)",
                params![restriction.id, restriction.name, restriction.comment],
            )
            .map_err(|e| map_write_error(e, "restriction"))?;
        Ok(())
    }

    fn get_restriction(&self, id: &str) -> Result<Option<Restriction>> {
        self.conn()
            .query_row(
                "SELECT id, name, comment FROM restrictions WHERE id = ?1",
                params![id],
                restriction_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_restrictions(&self) -> Result<Vec<Restriction>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, comment FROM restrictions ORDER BY id")?;
        let rows = stmt.query_map([], restriction_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Role operations

    fn create_role(&self, role: &Role) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO roles (id, name, system_name, comment, application_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    role.id,
                    role.name,
                    role.system_name,
                    role.comment,
                    role.application_id,
                    format_datetime(&role.created_at),
                ],
            )
            .map_err(|e| map_write_error(e, "role"))?;
        Ok(())
    }

    fn get_role(&self, id: &str) -> Result<Option<Role>> {
        self.conn()
            .query_row(
                &format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = ?1"),
                params![id],
                role_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_role_by_system_name(
        &self,
        application_id: &str,
        system_name: &str,
    ) -> Result<Option<Role>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {ROLE_COLUMNS} FROM roles
                     WHERE application_id = ?1 AND system_name = ?2
                     ORDER BY created_at LIMIT 1"
                ),
                params![application_id, system_name],
                role_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_roles(
        &self,
        application_id: Option<&str>,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Role>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles
             WHERE (?1 IS NULL OR application_id = ?1) AND name > ?2
             ORDER BY name LIMIT ?3"
        ))?;

        let rows = stmt.query_map(params![application_id, cursor, limit], role_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_role(&self, role: &Role) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE roles SET name = ?1, comment = ?2, application_id = ?3 WHERE id = ?4",
                params![role.name, role.comment, role.application_id, role.id],
            )
            .map_err(|e| map_write_error(e, "role"))?;

        if rows == 0 {
            return Err(Error::not_found("role"));
        }
        Ok(())
    }

    fn delete_role(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM roles WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn get_roles_by_ids(&self, ids: &[String]) -> Result<Vec<Role>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id IN ({})",
            placeholders(ids.len())
        ))?;

        let rows = stmt.query_map(params_from_iter(ids.iter()), role_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Role-permission grant operations

    fn create_role_permission(&self, grant: &RolePermission) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO role_permissions (id, role_id, permission_id, restriction_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    grant.id,
                    grant.role_id,
                    grant.permission_id,
                    grant.restriction_id,
                    format_datetime(&grant.created_at),
                ],
            )
            .map_err(|e| map_write_error(e, "role permission"))?;
        Ok(())
    }

    fn get_role_permission(&self, id: &str) -> Result<Option<RolePermission>> {
        self.conn()
            .query_row(
                &format!("SELECT {GRANT_COLUMNS} FROM role_permissions WHERE id = ?1"),
                params![id],
                grant_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_role_permissions(&self, role_id: Option<&str>) -> Result<Vec<RolePermission>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GRANT_COLUMNS} FROM role_permissions
             WHERE (?1 IS NULL OR role_id = ?1)
             ORDER BY role_id, permission_id"
        ))?;

        let rows = stmt.query_map(params![role_id], grant_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_role_permission(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM role_permissions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn list_grants_for_roles(&self, role_ids: &[String]) -> Result<Vec<RolePermission>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GRANT_COLUMNS} FROM role_permissions WHERE role_id IN ({})",
            placeholders(role_ids.len())
        ))?;

        let rows = stmt.query_map(params_from_iter(role_ids.iter()), grant_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Role inclusion edge operations

    fn create_role_include(&self, rel: &RoleInclude) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO role_includes (id, parent_role_id, child_role_id, created_by, modified_by, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    rel.id,
                    rel.parent_role_id,
                    rel.child_role_id,
                    rel.created_by,
                    rel.modified_by,
                    format_datetime(&rel.created_at),
                    format_datetime(&rel.updated_at),
                ],
            )
            .map_err(map_include_error)?;
        Ok(())
    }

    fn get_role_include(&self, id: &str) -> Result<Option<RoleInclude>> {
        self.conn()
            .query_row(
                &format!("SELECT {INCLUDE_COLUMNS} FROM role_includes WHERE id = ?1"),
                params![id],
                include_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn find_role_include(
        &self,
        parent_role_id: &str,
        child_role_id: &str,
        exclude_id: Option<&str>,
    ) -> Result<Option<RoleInclude>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {INCLUDE_COLUMNS} FROM role_includes
                     WHERE parent_role_id = ?1 AND child_role_id = ?2
                       AND (?3 IS NULL OR id <> ?3)"
                ),
                params![parent_role_id, child_role_id, exclude_id],
                include_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_role_includes(
        &self,
        parent_role_id: Option<&str>,
        child_role_id: Option<&str>,
    ) -> Result<Vec<RoleInclude>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {INCLUDE_COLUMNS} FROM role_includes
             WHERE (?1 IS NULL OR parent_role_id = ?1)
               AND (?2 IS NULL OR child_role_id = ?2)
             ORDER BY created_at, id"
        ))?;

        let rows = stmt.query_map(params![parent_role_id, child_role_id], include_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_role_include(&self, rel: &RoleInclude) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE role_includes
                 SET parent_role_id = ?1, child_role_id = ?2, modified_by = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    rel.parent_role_id,
                    rel.child_role_id,
                    rel.modified_by,
                    format_datetime(&rel.updated_at),
                    rel.id,
                ],
            )
            .map_err(map_include_error)?;

        if rows == 0 {
            return Err(Error::not_found("role inclusion"));
        }
        Ok(())
    }

    fn delete_role_include(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM role_includes WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn list_child_edges(&self, parent_ids: &[String]) -> Result<Vec<(String, String)>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT parent_role_id, child_role_id FROM role_includes
             WHERE parent_role_id IN ({})",
            placeholders(parent_ids.len())
        ))?;

        let rows = stmt.query_map(params_from_iter(parent_ids.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO users (id, email, password_hash, full_name, position, is_superadmin, is_verified, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user.id,
                    user.email,
                    user.password_hash,
                    user.full_name,
                    user.position,
                    user.is_superadmin,
                    user.is_verified,
                    format_datetime(&user.created_at),
                ],
            )
            .map_err(|e| map_write_error(e, "user"))?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Company operations

    fn create_company(&self, company: &Company) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO companies (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    company.id,
                    company.name,
                    company.description,
                    format_datetime(&company.created_at),
                ],
            )
            .map_err(|e| map_write_error(e, "company"))?;
        Ok(())
    }

    fn get_company(&self, id: &str) -> Result<Option<Company>> {
        self.conn()
            .query_row(
                "SELECT id, name, description, created_at FROM companies WHERE id = ?1",
                params![id],
                company_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_companies(&self, cursor: &str, limit: i32) -> Result<Vec<Company>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at
             FROM companies WHERE id > ?1 ORDER BY id LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cursor, limit], company_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // User-company relation operations

    fn create_user_company_relation(&self, rel: &UserCompanyRelation) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO user_company_relations (id, user_id, company_id, role_id, application_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    rel.id,
                    rel.user_id,
                    rel.company_id,
                    rel.role_id,
                    rel.application_id,
                    format_datetime(&rel.created_at),
                ],
            )
            .map_err(|e| map_write_error(e, "user company relation"))?;
        Ok(())
    }

    fn get_user_company_relation(&self, id: &str) -> Result<Option<UserCompanyRelation>> {
        self.conn()
            .query_row(
                &format!("SELECT {RELATION_COLUMNS} FROM user_company_relations WHERE id = ?1"),
                params![id],
                relation_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_user_company_relations(&self, user_id: &str) -> Result<Vec<UserCompanyRelation>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RELATION_COLUMNS} FROM user_company_relations
             WHERE user_id = ?1 ORDER BY created_at, id"
        ))?;

        let rows = stmt.query_map(params![user_id], relation_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_company_users(&self, company_id: &str) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT u.id, u.email, u.password_hash, u.full_name, u.position,
                    u.is_superadmin, u.is_verified, u.created_at
             FROM users u
             JOIN user_company_relations r ON r.user_id = u.id
             WHERE r.company_id = ?1
             ORDER BY u.email",
        )?;

        let rows = stmt.query_map(params![company_id], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_user_company_relation(&self, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM user_company_relations WHERE id = ?1",
            params![id],
        )?;
        Ok(rows > 0)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
