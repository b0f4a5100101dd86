//! Slash command handlers.

mod about;
mod ignored;
mod leaderboard;
mod level;
mod levelroles;
mod levels;
mod settings;
mod whitelabel;
mod xp;

use tracing::info;

use prosperity_core::errors::{ApplicationError, DomainError};
use prosperity_core::CommunityMember;
use prosperity_discord::rest::RoleSink;
use prosperity_discord::RequestContext;

use crate::roles::sync_member_roles;
use crate::services::Repositories;

pub use about::AboutCommand;
pub use ignored::IgnoredCommand;
pub use leaderboard::LeaderboardCommand;
pub use level::LevelCommand;
pub use levelroles::LevelRolesCommand;
pub use levels::LevelsCommand;
pub use settings::SettingsCommand;
pub use whitelabel::WhitelabelCommand;
pub use xp::XpCommand;

/// Message shown for a member without any recorded activity.
pub(crate) fn never_talked(user_id: &str) -> ApplicationError {
    ApplicationError::NotFound(format!("<@{user_id}> has never talked before"))
}

pub(crate) fn positive(value: i64) -> Result<i64, ApplicationError> {
    if value < 1 {
        return Err(DomainError::NonPositiveAmount(value).into());
    }
    Ok(value)
}

/// Read-modify-write of one member's progress, followed by a best-effort role sync.
///
/// The new xp and level are written in a single statement. Concurrent adjustments of the
/// same member are not serialized.
pub(crate) async fn adjust_member<F>(
    repos: &Repositories,
    roles: &dyn RoleSink,
    ctx: &RequestContext,
    user_id: &str,
    adjust: F,
) -> Result<CommunityMember, ApplicationError>
where
    F: FnOnce(&CommunityMember) -> CommunityMember,
{
    let community_id = ctx.require_community()?;
    let member =
        repos.members.find(community_id, user_id).await?.ok_or_else(|| never_talked(user_id))?;

    let updated = adjust(&member);
    repos.members.save_progress(&updated).await?;
    info!(
        event_name = "leveling.progress_adjusted",
        correlation_id = %ctx.correlation_id,
        community_id,
        user_id,
        xp_before = member.xp,
        xp_after = updated.xp,
        level_before = member.level,
        level_after = updated.level,
        "member progress adjusted"
    );

    if updated.level != member.level {
        sync_member_roles(repos, roles, ctx, &updated).await;
    }
    Ok(updated)
}
