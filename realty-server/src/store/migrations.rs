//! Schema for the Postgres backend
//!
//! The hosted table already exists; this creates an equivalent one when the
//! service talks to its own Postgres database.

use sqlx::PgPool;

use super::{check_identifier, StoreError};

/// Create the listings table and its indexes if they are missing.
pub async fn run(pool: &PgPool, table: &str) -> Result<(), StoreError> {
    let table = check_identifier(table)?;
    tracing::info!(table, "Running listing migrations...");

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{table}" (
            id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            type TEXT NOT NULL,
            purpose TEXT NOT NULL,
            area DOUBLE PRECISION NOT NULL,
            price DOUBLE PRECISION NOT NULL,
            location TEXT NOT NULL,
            locality TEXT NOT NULL,
            bedrooms INTEGER,
            bathrooms INTEGER,
            furnishing TEXT,
            description TEXT NOT NULL,
            amenities TEXT[] NOT NULL DEFAULT '{{}}',
            images TEXT[] NOT NULL DEFAULT '{{}}',
            verified BOOLEAN NOT NULL DEFAULT FALSE,
            featured BOOLEAN NOT NULL DEFAULT FALSE,
            agent_name TEXT NOT NULL,
            agent_phone TEXT NOT NULL,
            nearby_schools TEXT[],
            nearby_hospitals TEXT[],
            nearby_metro TEXT[],
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"CREATE INDEX IF NOT EXISTS "idx_{table}_created" ON "{table}"(created_at DESC)"#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"CREATE INDEX IF NOT EXISTS "idx_{table}_featured" ON "{table}"(featured) WHERE featured"#
    ))
    .execute(pool)
    .await?;

    tracing::info!(table, "Listing migrations complete");
    Ok(())
}
