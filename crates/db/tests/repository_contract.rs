//! The SQL repositories and their in-memory doubles must agree; handler tests rely on it.

use prosperity_core::{
    LevelRoleBinding, LifecycleAction, NewTenant, SuppressionEntry, SuppressionKind, TenantId,
};
use prosperity_db::repositories::{
    InMemoryLevelRoleRepository, InMemorySuppressionRepository, InMemoryTenantRepository,
    LevelRoleRepository, RepositoryError, SqlLevelRoleRepository, SqlSuppressionRepository,
    SqlTenantRepository, SuppressionRepository, TenantRepository,
};
use prosperity_db::{connect_with_settings, migrations, DbPool};

type ContractResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

async fn pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    pool
}

fn new_tenant(id: &str, owner: &str) -> NewTenant {
    NewTenant {
        id: TenantId(id.to_string()),
        owner_id: owner.to_string(),
        token: format!("token-{id}").into(),
        public_key: "ab".repeat(32),
        action: LifecycleAction::Start,
        display_name: format!("Bot {id}"),
        discriminator: "0001".to_string(),
        avatar_ref: None,
        supersedes: None,
    }
}

async fn tenant_contract(repo: &dyn TenantRepository) -> ContractResult {
    let prior = repo.insert(new_tenant("500", "owner-1")).await.map_err(|e| e.to_string())?;
    let id = TenantId("500".to_string());
    require!(
        repo.find_active(&id).await.map_err(|e| e.to_string())?.is_some(),
        "fresh tenant should resolve"
    );

    repo.set_action(&id, LifecycleAction::Delete).await.map_err(|e| e.to_string())?;
    require!(
        repo.find_active(&id).await.map_err(|e| e.to_string())?.is_none(),
        "deleted tenant should not resolve"
    );
    require!(
        repo.find_current(&id).await.map_err(|e| e.to_string())?.is_some(),
        "deleted tenant stays current"
    );
    repo.set_action(&id, LifecycleAction::Restart).await.map_err(|e| e.to_string())?;

    let mut next = new_tenant("501", "owner-1");
    next.supersedes = Some(prior.record_id);
    next.action = LifecycleAction::Recreate;
    let next = repo.insert(next).await.map_err(|e| e.to_string())?;

    require!(
        repo.find_active(&id).await.map_err(|e| e.to_string())?.is_none(),
        "superseded tenant should not resolve"
    );
    let owned = repo.list_for_owner("owner-1").await.map_err(|e| e.to_string())?;
    require_eq!(owned.len(), 1);
    require_eq!(owned[0].record_id, next.record_id);

    let mut again = new_tenant("502", "owner-1");
    again.supersedes = Some(prior.record_id);
    let duplicate = repo.insert(again).await;
    require!(
        matches!(duplicate, Err(RepositoryError::Conflict(_))),
        "a record can only be superseded once, got {duplicate:?}"
    );

    let missing = repo
        .set_action(&TenantId("404".to_string()), LifecycleAction::Stop)
        .await
        .map_err(|e| e.to_string())?;
    require!(!missing, "unknown tenant should report no update");
    Ok(())
}

async fn level_role_contract(repo: &dyn LevelRoleRepository) -> ContractResult {
    let binding = |role: &str, level: i64| LevelRoleBinding {
        community_id: "g1".to_string(),
        role_id: role.to_string(),
        level,
    };

    repo.insert(&binding("r10", 10)).await.map_err(|e| e.to_string())?;
    repo.insert(&binding("r5", 5)).await.map_err(|e| e.to_string())?;
    require!(
        matches!(repo.insert(&binding("r5", 6)).await, Err(RepositoryError::Conflict(_))),
        "bound role should conflict"
    );
    require!(
        matches!(repo.insert(&binding("r6", 10)).await, Err(RepositoryError::Conflict(_))),
        "occupied level should conflict"
    );

    let levels: Vec<i64> =
        repo.list("g1").await.map_err(|e| e.to_string())?.iter().map(|b| b.level).collect();
    require_eq!(levels, vec![5, 10]);

    require!(repo.remove("g1", "r5").await.map_err(|e| e.to_string())?, "existing binding removed");
    require!(!repo.remove("g1", "r5").await.map_err(|e| e.to_string())?, "second removal is a no-op");
    Ok(())
}

async fn suppression_contract(repo: &dyn SuppressionRepository) -> ContractResult {
    let entry = |subject: &str, kind| SuppressionEntry {
        community_id: "g1".to_string(),
        subject_id: subject.to_string(),
        kind,
    };

    repo.insert(&entry("55", SuppressionKind::Channel)).await.map_err(|e| e.to_string())?;
    repo.insert(&entry("55", SuppressionKind::Role)).await.map_err(|e| e.to_string())?;
    require!(
        matches!(
            repo.insert(&entry("55", SuppressionKind::Channel)).await,
            Err(RepositoryError::Conflict(_))
        ),
        "duplicate suppression should conflict"
    );

    let channels = repo.list("g1", SuppressionKind::Channel).await.map_err(|e| e.to_string())?;
    require_eq!(channels.len(), 1);
    require!(
        repo.remove(&entry("55", SuppressionKind::Role)).await.map_err(|e| e.to_string())?,
        "role entry removed"
    );
    require!(
        repo.list("g1", SuppressionKind::Role).await.map_err(|e| e.to_string())?.is_empty(),
        "no role entries left"
    );
    Ok(())
}

#[tokio::test]
async fn tenant_repositories_agree() -> ContractResult {
    tenant_contract(&InMemoryTenantRepository::default()).await?;
    tenant_contract(&SqlTenantRepository::new(pool().await)).await
}

#[tokio::test]
async fn level_role_repositories_agree() -> ContractResult {
    level_role_contract(&InMemoryLevelRoleRepository::default()).await?;
    level_role_contract(&SqlLevelRoleRepository::new(pool().await)).await
}

#[tokio::test]
async fn suppression_repositories_agree() -> ContractResult {
    suppression_contract(&InMemorySuppressionRepository::default()).await?;
    suppression_contract(&SqlSuppressionRepository::new(pool().await)).await
}
