//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use vigil_core::error::VigilResult;
use vigil_core::models::user::{CreateUser, Role, User};
use vigil_core::repository::UserRepository;

use crate::error::StoreError;

fn parse_role(s: &str) -> Result<Role, StoreError> {
    match s {
        "Pending" => Ok(Role::Pending),
        "Officer" => Ok(Role::Officer),
        "Admin" => Ok(Role::Admin),
        "OrgOwner" => Ok(Role::OrgOwner),
        other => Err(StoreError::Migration(format!("unknown role: {other}"))),
    }
}

fn role_to_string(role: Role) -> &'static str {
    match role {
        Role::Pending => "Pending",
        Role::Officer => "Officer",
        Role::Admin => "Admin",
        Role::OrgOwner => "OrgOwner",
    }
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    username: String,
    password_hash: String,
    role: String,
    app_owner: bool,
    last_activity: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    username: String,
    password_hash: String,
    role: String,
    app_owner: bool,
    last_activity: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, StoreError> {
        Ok(User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            app_owner: self.app_owner,
            created_at: self.created_at,
            last_activity: self.last_activity,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, StoreError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| StoreError::Migration(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            app_owner: self.app_owner,
            created_at: self.created_at,
            last_activity: self.last_activity,
        })
    }
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
fn hash_password(password: &str) -> Result<String, StoreError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| StoreError::PasswordHash(e.to_string()))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a raw password against a stored Argon2id hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, StoreError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| StoreError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// SurrealDB implementation of the user repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> VigilResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let password_hash = hash_password(&input.password)?;

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 username = $username, \
                 password_hash = $password_hash, \
                 role = $role, \
                 app_owner = $app_owner, \
                 last_activity = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("password_hash", password_hash))
            .bind(("role", role_to_string(input.role).to_string()))
            .bind(("app_owner", input.app_owner))
            .await
            .map_err(StoreError::from)?;

        let mut result = result
            .check()
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(StoreError::from)?;
        let row = rows.into_iter().next().ok_or(StoreError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> VigilResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(StoreError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(StoreError::from)?;
        let row = rows.into_iter().next().ok_or(StoreError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_username(&self, username: &str) -> VigilResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(StoreError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(StoreError::from)?;
        let row = rows.into_iter().next().ok_or(StoreError::NotFound {
            entity: "user".into(),
            id: format!("username={username}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn list_active(&self) -> VigilResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE role != 'Pending' ORDER BY username",
            )
            .await
            .map_err(StoreError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(StoreError::from)?;
        let users = rows
            .into_iter()
            .map(UserRowWithId::try_into_user)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn list_pending(&self) -> VigilResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE role = 'Pending' ORDER BY created_at",
            )
            .await
            .map_err(StoreError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(StoreError::from)?;
        let users = rows
            .into_iter()
            .map(UserRowWithId::try_into_user)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> VigilResult<User> {
        let id_str = id.to_string();

        let result = self
            .db
            .query("UPDATE type::record('user', $id) SET role = $role")
            .bind(("id", id_str.clone()))
            .bind(("role", role_to_string(role).to_string()))
            .await
            .map_err(StoreError::from)?;

        let mut result = result
            .check()
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(StoreError::from)?;
        let row = rows.into_iter().next().ok_or(StoreError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn delete(&self, id: Uuid) -> VigilResult<()> {
        // Hard delete: rejected or removed accounts leave no row behind.
        self.db
            .query("DELETE type::record('user', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(StoreError::from)?
            .check()
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn touch_activity(&self, id: Uuid) -> VigilResult<()> {
        self.db
            .query("UPDATE type::record('user', $id) SET last_activity = time::now()")
            .bind(("id", id.to_string()))
            .await
            .map_err(StoreError::from)?
            .check()
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(())
    }
}
