use sqlx::{FromRow, PgPool};

/// The global settings row. At most one instance exists; writes upsert it.
#[derive(Debug, Clone, FromRow)]
pub struct AdminSettings {
    pub maintenance_mode: bool,
    pub maintenance_message: String,
    pub last_broadcast: String,
}

pub async fn get(db: &PgPool) -> anyhow::Result<Option<AdminSettings>> {
    let settings = sqlx::query_as::<_, AdminSettings>(
        r#"
        SELECT maintenance_mode, maintenance_message, last_broadcast
        FROM admin_settings
        "#,
    )
    .fetch_optional(db)
    .await?;
    Ok(settings)
}

pub async fn set_broadcast(db: &PgPool, message: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO admin_settings (id, last_broadcast)
        VALUES (TRUE, $1)
        ON CONFLICT (id) DO UPDATE SET last_broadcast = EXCLUDED.last_broadcast
        "#,
    )
    .bind(message)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn set_maintenance(db: &PgPool, enabled: bool, message: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO admin_settings (id, maintenance_mode, maintenance_message)
        VALUES (TRUE, $1, $2)
        ON CONFLICT (id) DO UPDATE
        SET maintenance_mode = EXCLUDED.maintenance_mode,
            maintenance_message = EXCLUDED.maintenance_message
        "#,
    )
    .bind(enabled)
    .bind(message)
    .execute(db)
    .await?;
    Ok(())
}
