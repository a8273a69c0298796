//! Generic entity persistence.
//!
//! Every entity kind maps onto one table whose columns follow the kind's
//! field table, plus association tables for link fields. The store works on
//! any connection, including an open transaction, so the orchestrator decides
//! the unit of work.

use chrono::{DateTime, Utc};

use bursary_core::entities::{Entity, FieldValue, Fields};
use bursary_core::enums::EntityKind;
use bursary_core::schema::LinkTable;

use crate::error::DatabaseError;
use crate::helpers::{field_to_sql, parse_datetime, sql_to_field};

/// Entity reads and writes over a borrowed connection.
#[derive(Clone, Copy)]
pub struct EntityStore<'a> {
    conn: &'a libsql::Connection,
}

fn select_sql(kind: EntityKind) -> String {
    let columns: Vec<&str> = kind.column_fields().map(|spec| spec.name).collect();
    format!(
        "SELECT id, {}, created_at, updated_at FROM {}",
        columns.join(", "),
        kind.table()
    )
}

impl<'a> EntityStore<'a> {
    #[must_use]
    pub const fn new(conn: &'a libsql::Connection) -> Self {
        Self { conn }
    }

    /// Fetch one entity with its link fields.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or a stored value is malformed.
    pub async fn get(&self, kind: EntityKind, id: i64) -> Result<Option<Entity>, DatabaseError> {
        let sql = format!("{} WHERE id = ?1", select_sql(kind));
        let mut rows = self.conn.query(&sql, [id]).await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let mut entity = row_to_entity(kind, &row)?;
        self.load_links(&mut entity).await?;
        Ok(Some(entity))
    }

    /// Number of stored entities of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count(&self, kind: EntityKind) -> Result<i64, DatabaseError> {
        let sql = format!("SELECT count(*) FROM {}", kind.table());
        let mut rows = self.conn.query(&sql, ()).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }

    /// Insert a new entity and return it as stored.
    ///
    /// Column fields absent from `fields` take their column defaults.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` on constraint violations (duplicate names,
    /// links to missing rows) or any other store failure.
    pub async fn create(
        &self,
        kind: EntityKind,
        fields: &Fields,
        now: DateTime<Utc>,
    ) -> Result<Entity, DatabaseError> {
        let mut columns = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        for spec in kind.column_fields() {
            if let Some(value) = fields.get(spec.name) {
                columns.push(spec.name);
                params.push(field_to_sql(value)?);
            }
        }
        columns.extend(["created_at", "updated_at"]);
        params.push(now.to_rfc3339().into());
        params.push(now.to_rfc3339().into());

        let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            kind.table(),
            columns.join(", "),
            placeholders.join(", ")
        );
        self.conn
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        let id = self.conn.last_insert_rowid();

        for (spec, link) in kind.link_fields() {
            if let Some(targets) = fields.get(spec.name).and_then(FieldValue::as_links) {
                self.insert_links(link, id, targets).await?;
            }
        }

        self.get(kind, id).await?.ok_or(DatabaseError::NoResult)
    }

    /// Apply `fields` to an existing entity and return the new state.
    ///
    /// Only fields present in `fields` change; link fields present are
    /// replaced wholesale.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the row vanished, or any store failure.
    pub async fn update(
        &self,
        entity: &Entity,
        fields: &Fields,
        now: DateTime<Utc>,
    ) -> Result<Entity, DatabaseError> {
        let kind = entity.kind;
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        for spec in kind.column_fields() {
            if let Some(value) = fields.get(spec.name) {
                params.push(field_to_sql(value)?);
                sets.push(format!("{} = ?{}", spec.name, params.len()));
            }
        }
        params.push(now.to_rfc3339().into());
        sets.push(format!("updated_at = ?{}", params.len()));
        params.push(entity.id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            kind.table(),
            sets.join(", "),
            params.len()
        );
        let changed = self
            .conn
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NoResult);
        }

        for (spec, link) in kind.link_fields() {
            if let Some(targets) = fields.get(spec.name).and_then(FieldValue::as_links) {
                self.clear_links(link, entity.id).await?;
                self.insert_links(link, entity.id, targets).await?;
            }
        }

        self.get(kind, entity.id).await?.ok_or(DatabaseError::NoResult)
    }

    /// Remove an entity and its association rows.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the row was already gone.
    pub async fn delete(&self, entity: &Entity) -> Result<(), DatabaseError> {
        for (_, link) in entity.kind.link_fields() {
            self.clear_links(link, entity.id).await?;
        }
        let sql = format!("DELETE FROM {} WHERE id = ?1", entity.kind.table());
        let changed = self.conn.execute(&sql, [entity.id]).await?;
        if changed == 0 {
            return Err(DatabaseError::NoResult);
        }
        Ok(())
    }

    async fn load_links(&self, entity: &mut Entity) -> Result<(), DatabaseError> {
        for (spec, link) in entity.kind.link_fields() {
            let sql = format!(
                "SELECT {target} FROM {table} WHERE {owner} = ?1 ORDER BY {target}",
                target = link.target_column,
                table = link.table,
                owner = link.owner_column,
            );
            let mut rows = self.conn.query(&sql, [entity.id]).await?;
            let mut targets = Vec::new();
            while let Some(row) = rows.next().await? {
                targets.push(row.get::<i64>(0)?);
            }
            entity
                .fields
                .insert(spec.name.to_string(), FieldValue::Links(targets));
        }
        Ok(())
    }

    async fn insert_links(
        &self,
        link: LinkTable,
        owner: i64,
        targets: &[i64],
    ) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            link.table, link.owner_column, link.target_column
        );
        for target in targets {
            self.conn.execute(&sql, [owner, *target]).await?;
        }
        Ok(())
    }

    async fn clear_links(&self, link: LinkTable, owner: i64) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE {} = ?1", link.table, link.owner_column);
        self.conn.execute(&sql, [owner]).await?;
        Ok(())
    }
}

fn row_to_entity(kind: EntityKind, row: &libsql::Row) -> Result<Entity, DatabaseError> {
    let mut fields = Fields::new();
    let mut idx: i32 = 1;
    for spec in kind.column_fields() {
        fields.insert(spec.name.to_string(), sql_to_field(spec.kind, row.get_value(idx)?)?);
        idx += 1;
    }
    Ok(Entity {
        id: row.get::<i64>(0)?,
        kind,
        fields,
        created_at: parse_datetime(&row.get::<String>(idx)?)?,
        updated_at: parse_datetime(&row.get::<String>(idx + 1)?)?,
    })
}
