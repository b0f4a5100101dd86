//! Experience curve and level transitions.
//!
//! `required_xp` is the only place the curve is defined. Give/take of xp, give/take of
//! levels and the `level` display all go through it, so a member's xp and level stay
//! consistent: `required_xp(level) <= xp < required_xp(level + 1)`.

use crate::domain::community::RoleAssignMode;
use crate::domain::level_role::LevelRoleBinding;
use crate::domain::member::CommunityMember;

/// Highest reachable level. Keeps the cubic curve far away from `i64` overflow.
pub const MAX_LEVEL: i64 = 100_000;

/// Cumulative xp at which `level` is reached: the sum of `5k² + 50k + 100` for `k < level`.
///
/// `required_xp(0) == 0`, `required_xp(1) == 100`, `required_xp(2) == 255`. Negative input
/// is treated as level 0 and input above [`MAX_LEVEL`] + 1 is clamped.
pub fn required_xp(level: i64) -> i64 {
    let n = level.clamp(0, MAX_LEVEL + 1);
    let squares = (n - 1) * n * (2 * n - 1) / 6;
    5 * squares + 25 * n * (n - 1) + 100 * n
}

/// Xp still missing before the member reaches the next level.
pub fn xp_to_next_level(member: &CommunityMember) -> i64 {
    (required_xp(member.level + 1) - member.xp).max(0)
}

/// Largest xp a member can hold; one below the threshold of the level past the cap.
fn xp_ceiling() -> i64 {
    required_xp(MAX_LEVEL + 1) - 1
}

/// Adds `delta` xp (negative for a take) and walks the level until it brackets the new xp.
///
/// Xp floors at 0 and the level at 0, so a take larger than the balance lands on 0/0.
pub fn apply_xp_delta(member: &CommunityMember, delta: i64) -> CommunityMember {
    let xp = member.xp.saturating_add(delta).clamp(0, xp_ceiling());
    let mut level = member.level.clamp(0, MAX_LEVEL);

    while level < MAX_LEVEL && xp >= required_xp(level + 1) {
        level += 1;
    }
    while level > 0 && xp < required_xp(level) {
        level -= 1;
    }

    CommunityMember { xp, level, ..member.clone() }
}

/// Moves the level by `delta` and resets xp to the first xp of the resulting level.
///
/// Residual xp inside the old level is discarded on purpose.
pub fn apply_level_delta(member: &CommunityMember, delta: i64) -> CommunityMember {
    let level = member.level.saturating_add(delta).clamp(0, MAX_LEVEL);
    CommunityMember { xp: required_xp(level), level, ..member.clone() }
}

/// Half-open level range `[start, end)` whose members are eligible for a binding's role.
/// `end` is `None` when no higher binding exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelWindow {
    pub start: i64,
    pub end: Option<i64>,
}

impl LevelWindow {
    pub fn contains(&self, level: i64) -> bool {
        level >= self.start && self.end.map_or(true, |end| level < end)
    }
}

/// Window of members a newly created binding at `level` should be granted to: from `level`
/// up to (excluding) the smallest other bound strictly above it.
pub fn role_grant_window(bindings: &[LevelRoleBinding], level: i64) -> LevelWindow {
    let end = bindings.iter().map(|binding| binding.level).filter(|bound| *bound > level).min();
    LevelWindow { start: level, end }
}

/// Bindings whose role a member at `level` should hold.
///
/// `Stack` keeps every tier at or below the level; `Single` keeps only the highest one.
pub fn roles_for_level<'a>(
    bindings: &'a [LevelRoleBinding],
    level: i64,
    mode: RoleAssignMode,
) -> Vec<&'a LevelRoleBinding> {
    let mut earned: Vec<&LevelRoleBinding> =
        bindings.iter().filter(|binding| binding.level <= level).collect();
    earned.sort_by_key(|binding| binding.level);

    match mode {
        RoleAssignMode::Stack => earned,
        RoleAssignMode::Single => earned.pop().into_iter().collect(),
    }
}

/// Role changes that bring a member in line with their level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleSyncPlan {
    pub grant: Vec<String>,
    pub revoke: Vec<String>,
}

impl RoleSyncPlan {
    pub fn is_empty(&self) -> bool {
        self.grant.is_empty() && self.revoke.is_empty()
    }
}

pub fn plan_role_sync(
    bindings: &[LevelRoleBinding],
    level: i64,
    mode: RoleAssignMode,
) -> RoleSyncPlan {
    let keep = roles_for_level(bindings, level, mode);
    let grant: Vec<String> = keep.iter().map(|binding| binding.role_id.clone()).collect();
    let revoke = bindings
        .iter()
        .filter(|binding| !grant.contains(&binding.role_id))
        .map(|binding| binding.role_id.clone())
        .collect();

    RoleSyncPlan { grant, revoke }
}
