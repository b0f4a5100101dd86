use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::Row;

use prosperity_core::domain::tenant::{
    LifecycleAction, NewTenant, Tenant, TenantId, TenantRecordId,
};

use super::{RepositoryError, TenantRepository};
use crate::DbPool;

pub struct SqlTenantRepository {
    pool: DbPool,
}

impl SqlTenantRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const TENANT_COLUMNS: &str = "t.record_id, t.tenant_id, t.owner_id, t.token, t.public_key, t.action,
     t.display_name, t.discriminator, t.avatar_ref, t.supersedes_record_id,
     t.created_at, t.updated_at";

const CURRENT: &str =
    "NOT EXISTS (SELECT 1 FROM tenants newer WHERE newer.supersedes_record_id = t.record_id)";

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(RepositoryError::decode)
}

fn row_to_tenant(row: &sqlx::sqlite::SqliteRow) -> Result<Tenant, RepositoryError> {
    let action: String = row.try_get("action").map_err(RepositoryError::decode)?;
    let created_at: String = row.try_get("created_at").map_err(RepositoryError::decode)?;
    let updated_at: String = row.try_get("updated_at").map_err(RepositoryError::decode)?;
    let token: String = row.try_get("token").map_err(RepositoryError::decode)?;
    let supersedes: Option<i64> =
        row.try_get("supersedes_record_id").map_err(RepositoryError::decode)?;

    Ok(Tenant {
        record_id: TenantRecordId(row.try_get("record_id").map_err(RepositoryError::decode)?),
        id: TenantId(row.try_get("tenant_id").map_err(RepositoryError::decode)?),
        owner_id: row.try_get("owner_id").map_err(RepositoryError::decode)?,
        token: token.into(),
        public_key: row.try_get("public_key").map_err(RepositoryError::decode)?,
        action: action.parse::<LifecycleAction>().map_err(RepositoryError::decode)?,
        display_name: row.try_get("display_name").map_err(RepositoryError::decode)?,
        discriminator: row.try_get("discriminator").map_err(RepositoryError::decode)?,
        avatar_ref: row.try_get("avatar_ref").map_err(RepositoryError::decode)?,
        supersedes: supersedes.map(TenantRecordId),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

impl SqlTenantRepository {
    async fn fetch_one_where(
        &self,
        predicate: &str,
        bind: &str,
    ) -> Result<Option<Tenant>, RepositoryError> {
        let sql = format!(
            "SELECT {TENANT_COLUMNS} FROM tenants t
             WHERE {predicate} AND {CURRENT}
             ORDER BY t.record_id DESC LIMIT 1"
        );
        let row = sqlx::query(&sql).bind(bind).fetch_optional(&self.pool).await?;

        row.as_ref().map(row_to_tenant).transpose()
    }
}

#[async_trait::async_trait]
impl TenantRepository for SqlTenantRepository {
    async fn find_active(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        self.fetch_one_where("t.tenant_id = ? AND t.action != 'delete'", id.as_str()).await
    }

    async fn find_current(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        self.fetch_one_where("t.tenant_id = ?", id.as_str()).await
    }

    async fn find_current_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Option<Tenant>, RepositoryError> {
        self.fetch_one_where("t.owner_id = ?", owner_id).await
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Tenant>, RepositoryError> {
        let sql = format!(
            "SELECT {TENANT_COLUMNS} FROM tenants t
             WHERE t.owner_id = ? AND {CURRENT}
             ORDER BY t.record_id ASC"
        );
        let rows = sqlx::query(&sql).bind(owner_id).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_tenant).collect()
    }

    async fn list_active(&self) -> Result<Vec<Tenant>, RepositoryError> {
        let sql = format!(
            "SELECT {TENANT_COLUMNS} FROM tenants t
             WHERE t.action != 'delete' AND {CURRENT}
             ORDER BY t.record_id ASC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_tenant).collect()
    }

    async fn insert(&self, tenant: NewTenant) -> Result<Tenant, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO tenants (tenant_id, owner_id, token, public_key, action, display_name,
                                  discriminator, avatar_ref, supersedes_record_id,
                                  created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(tenant.id.as_str())
        .bind(&tenant.owner_id)
        .bind(tenant.token.expose_secret())
        .bind(&tenant.public_key)
        .bind(tenant.action.as_str())
        .bind(&tenant.display_name)
        .bind(&tenant.discriminator)
        .bind(&tenant.avatar_ref)
        .bind(tenant.supersedes.map(|record| record.0))
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        Ok(Tenant {
            record_id: TenantRecordId(result.last_insert_rowid()),
            id: tenant.id,
            owner_id: tenant.owner_id,
            token: tenant.token,
            public_key: tenant.public_key,
            action: tenant.action,
            display_name: tenant.display_name,
            discriminator: tenant.discriminator,
            avatar_ref: tenant.avatar_ref,
            supersedes: tenant.supersedes,
            created_at: now,
            updated_at: now,
        })
    }

    async fn set_action(
        &self,
        id: &TenantId,
        action: LifecycleAction,
    ) -> Result<bool, RepositoryError> {
        let sql = format!(
            "UPDATE tenants AS t SET action = ?, updated_at = ?
             WHERE t.tenant_id = ? AND {CURRENT}"
        );
        let result = sqlx::query(&sql)
            .bind(action.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
