//! One-time install routine: schema plus static link-type registration.
//!
//! Runs outside the request path (`relink-server --setup`). Registration is
//! idempotent: type rows are force-inserted (insert-or-update), attribute
//! rows are inserted once.

use sqlx::PgPool;

use crate::models::LinkType;

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            sku        TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            status     SMALLINT NOT NULL DEFAULT 1,
            visibility SMALLINT NOT NULL DEFAULT 4,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_link_types (
            link_type_id INTEGER PRIMARY KEY,
            code         TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_link_attributes (
            link_type_id   INTEGER NOT NULL REFERENCES product_link_types (link_type_id),
            attribute_code TEXT NOT NULL,
            data_type      TEXT NOT NULL,
            PRIMARY KEY (link_type_id, attribute_code)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_links (
            sku          TEXT NOT NULL,
            linked_sku   TEXT NOT NULL,
            link_type_id INTEGER NOT NULL REFERENCES product_link_types (link_type_id),
            position     INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (sku, linked_sku, link_type_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn register_link_types(pool: &PgPool) -> Result<(), sqlx::Error> {
    for link_type in LinkType::ALL {
        sqlx::query(
            r#"
            INSERT INTO product_link_types (link_type_id, code)
            VALUES ($1, $2)
            ON CONFLICT (link_type_id) DO UPDATE SET code = EXCLUDED.code
            "#,
        )
        .bind(link_type.type_id())
        .bind(link_type.code())
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO product_link_attributes (link_type_id, attribute_code, data_type)
            VALUES ($1, 'position', 'int')
            ON CONFLICT (link_type_id, attribute_code) DO NOTHING
            "#,
        )
        .bind(link_type.type_id())
        .execute(pool)
        .await?;

        tracing::info!(
            code = link_type.code(),
            type_id = link_type.type_id(),
            "registered link type"
        );
    }

    Ok(())
}
