use crate::commands::{prepare, CommandResult};
use prosperity_db::{connect_with_config, migrations};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("migrate") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        let versions = migrations::applied_versions(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<Vec<i64>, (&'static str, String, u8)>(versions)
    });

    match result {
        Ok(versions) => {
            let versions =
                versions.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
            CommandResult::success("migrate", format!("applied pending migrations (versions: {versions})"))
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
