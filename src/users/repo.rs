use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::auth::password;
use crate::config::AppConfig;

pub const STARTING_COINS: i64 = 100;
pub const ADMIN_SEED_COINS: i64 = 999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// Account moderation state. Anything other than `Active` blocks login;
/// transitions are admin-controlled only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Suspended,
    Banned,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
            UserStatus::Banned => "banned",
        })
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub coins: i64,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: OffsetDateTime,
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, coins, role, status, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, coins, role, status, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Duplicate check for registration; matches on either unique field.
pub async fn find_by_username_or_email(
    db: &PgPool,
    username: &str,
    email: &str,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, coins, role, status, created_at
        FROM users
        WHERE username = $1 OR email = $2
        "#,
    )
    .bind(username)
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Create a new user with the registration defaults (100 coins, role user,
/// status active). The id is generated here, never by the caller.
///
/// Returns the raw sqlx error so the caller can tell a unique-constraint
/// violation (concurrent duplicate registration) apart from real failures.
pub async fn create(
    db: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, password_hash, coins)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, username, email, password_hash, coins, role, status, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(STARTING_COINS)
    .fetch_one(db)
    .await?;
    Ok(user)
}

pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, coins, role, status, created_at
        FROM users
        ORDER BY created_at
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(users)
}

/// Atomic check-then-subtract. The balance guard lives in the WHERE clause
/// so concurrent deductions against the same row cannot overdraft; zero
/// affected rows means either an unknown user or an insufficient balance.
pub async fn deduct_coins(db: &PgPool, id: Uuid, amount: i64) -> anyhow::Result<Option<i64>> {
    let new_balance = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE users
        SET coins = coins - $2
        WHERE id = $1 AND coins >= $2
        RETURNING coins
        "#,
    )
    .bind(id)
    .bind(amount)
    .fetch_optional(db)
    .await?;
    Ok(new_balance)
}

/// Admin partial update, restricted to the allow-listed fields. Absent
/// fields keep their stored value.
pub async fn update_admin_fields(
    db: &PgPool,
    id: Uuid,
    coins: Option<i64>,
    status: Option<UserStatus>,
    role: Option<UserRole>,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET coins = COALESCE($2, coins),
            status = COALESCE($3, status),
            role = COALESCE($4, role)
        WHERE id = $1
        RETURNING id, username, email, password_hash, coins, role, status, created_at
        "#,
    )
    .bind(id)
    .bind(coins)
    .bind(status)
    .bind(role)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Create the admin account on first startup if it does not exist yet.
pub async fn seed_admin(db: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    if find_by_username(db, &config.admin.username).await?.is_some() {
        return Ok(());
    }
    let hash = password::hash_password(&config.admin.password)?;
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, coins, role)
        VALUES ($1, $2, $3, $4, $5, 'admin')
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&config.admin.username)
    .bind(&config.admin.email)
    .bind(&hash)
    .bind(ADMIN_SEED_COINS)
    .execute(db)
    .await?;
    info!(username = %config.admin.username, "admin user created");
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_user(role: UserRole) -> User {
    User {
        id: Uuid::new_v4(),
        username: "testuser".into(),
        email: "testuser@example.com".into(),
        password_hash: "unused".into(),
        coins: STARTING_COINS,
        role,
        status: UserStatus::Active,
        created_at: OffsetDateTime::now_utc(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_matches_wire_values() {
        assert_eq!(UserStatus::Active.to_string(), "active");
        assert_eq!(UserStatus::Suspended.to_string(), "suspended");
        assert_eq!(UserStatus::Banned.to_string(), "banned");
    }

    #[test]
    fn role_and_status_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), r#""admin""#);
        assert_eq!(
            serde_json::to_string(&UserStatus::Suspended).unwrap(),
            r#""suspended""#
        );
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = test_user(UserRole::User);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("unused"));
    }

    #[sqlx::test]
    async fn new_users_start_with_the_default_balance(pool: PgPool) {
        let user = create(&pool, "alice", "a@x.com", "hash").await.unwrap();
        assert_eq!(user.coins, STARTING_COINS);
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.status, UserStatus::Active);
    }

    #[sqlx::test]
    async fn deduction_subtracts_exactly_the_amount(pool: PgPool) {
        let user = create(&pool, "alice", "a@x.com", "hash").await.unwrap();
        let balance = deduct_coins(&pool, user.id, 30).await.unwrap();
        assert_eq!(balance, Some(user.coins - 30));
    }

    #[sqlx::test]
    async fn insufficient_deduction_leaves_the_balance_unchanged(pool: PgPool) {
        let user = create(&pool, "alice", "a@x.com", "hash").await.unwrap();
        assert_eq!(deduct_coins(&pool, user.id, 30).await.unwrap(), Some(70));

        let refused = deduct_coins(&pool, user.id, 80).await.unwrap();
        assert_eq!(refused, None);

        let user = find_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(user.coins, 70);
    }

    #[sqlx::test]
    async fn deduction_for_unknown_user_updates_nothing(pool: PgPool) {
        let result = deduct_coins(&pool, Uuid::new_v4(), 10).await.unwrap();
        assert_eq!(result, None);
    }

    #[sqlx::test]
    async fn concurrent_full_balance_deductions_admit_one_winner(pool: PgPool) {
        let user = create(&pool, "alice", "a@x.com", "hash").await.unwrap();

        let (a, b, c, d) = tokio::join!(
            deduct_coins(&pool, user.id, STARTING_COINS),
            deduct_coins(&pool, user.id, STARTING_COINS),
            deduct_coins(&pool, user.id, STARTING_COINS),
            deduct_coins(&pool, user.id, STARTING_COINS),
        );

        let results = [a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_some()).count(), 1);
        assert_eq!(results.iter().flatten().copied().next(), Some(0));

        let user = find_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(user.coins, 0);
    }

    #[sqlx::test]
    async fn duplicate_username_insert_is_a_unique_violation(pool: PgPool) {
        create(&pool, "alice", "a@x.com", "hash").await.unwrap();
        let err = create(&pool, "alice", "other@x.com", "hash")
            .await
            .unwrap_err();
        assert!(err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation()));
    }

    #[sqlx::test]
    async fn partial_admin_update_keeps_absent_fields(pool: PgPool) {
        let user = create(&pool, "alice", "a@x.com", "hash").await.unwrap();
        let updated = update_admin_fields(&pool, user.id, None, Some(UserStatus::Banned), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, UserStatus::Banned);
        assert_eq!(updated.coins, user.coins);
        assert_eq!(updated.role, user.role);
    }

    #[sqlx::test]
    async fn seed_admin_is_idempotent(pool: PgPool) {
        let config = crate::state::AppState::fake_with_pool(pool.clone())
            .config
            .as_ref()
            .clone();
        seed_admin(&pool, &config).await.unwrap();
        seed_admin(&pool, &config).await.unwrap();

        let admin = find_by_username(&pool, &config.admin.username)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.coins, ADMIN_SEED_COINS);
        assert_eq!(list_all(&pool).await.unwrap().len(), 1);
    }
}
