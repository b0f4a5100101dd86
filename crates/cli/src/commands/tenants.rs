use serde::Serialize;

use crate::commands::{prepare, CommandResult};
use prosperity_db::connect_with_config;
use prosperity_db::repositories::{SqlTenantRepository, TenantRepository};

/// Tenant fields safe to print; the bot token is never included.
#[derive(Debug, Serialize)]
struct TenantRow {
    tenant_id: String,
    owner_id: String,
    name: String,
    action: &'static str,
    updated_at: String,
}

pub fn run(json: bool) -> CommandResult {
    let (config, runtime) = match prepare("tenants") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        let tenants = SqlTenantRepository::new(pool.clone())
            .list_active()
            .await
            .map_err(|error| ("db_query", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(tenants)
    });

    let tenants = match result {
        Ok(tenants) => tenants,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("tenants", error_class, message, exit_code);
        }
    };

    let rows: Vec<TenantRow> = tenants
        .into_iter()
        .map(|tenant| TenantRow {
            tenant_id: tenant.id.to_string(),
            owner_id: tenant.owner_id,
            name: format!("{}#{}", tenant.display_name, tenant.discriminator),
            action: tenant.action.as_str(),
            updated_at: tenant.updated_at.to_rfc3339(),
        })
        .collect();

    if json {
        return match serde_json::to_string(&rows) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("tenants", "serialization", error.to_string(), 6),
        };
    }

    if rows.is_empty() {
        return CommandResult::success("tenants", "no active tenants");
    }
    let lines = rows
        .iter()
        .map(|row| {
            format!(
                "- {} {} (owner {}, action {})",
                row.tenant_id, row.name, row.owner_id, row.action
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    CommandResult::success("tenants", format!("{} active tenants\n{lines}", rows.len()))
}
