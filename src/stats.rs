use std::collections::HashMap;

use serde::Serialize;

use crate::auth::User;
use crate::models::{DrillResult, DrillType, Level, Location, ResultType};

pub const LEADERBOARD_SIZE: usize = 10;
pub const RECENT_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct DrillStats {
    pub confirmed: usize,
    pub stands: usize,
    pub overturned: usize,
    pub total: usize,
    pub confirmed_percentage: f64,
    pub stands_percentage: f64,
    pub overturned_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrillStatsWithRecent {
    #[serde(flatten)]
    pub overall: DrillStats,
    pub last20: DrillStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_id: String,
    pub username: String,
    pub level: Level,
    pub location: Location,
    pub city: Option<String>,
    pub state: Option<String>,
    pub profile_photo: Option<String>,
    pub total_confirmed: usize,
    pub total_attempts: usize,
    pub confirmed_percentage: f64,
}

/// Which results a ranking is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingScope {
    Overall,
    Drill(DrillType),
    /// The trailing [`RECENT_WINDOW`] results of one drill type.
    DrillRecent(DrillType),
}

impl RankingScope {
    fn includes(&self, result: &DrillResult) -> bool {
        match self {
            RankingScope::Overall => true,
            RankingScope::Drill(drill) | RankingScope::DrillRecent(drill) => {
                result.drill_type == *drill
            }
        }
    }

    fn window<'a>(&self, results: &'a [ResultType]) -> &'a [ResultType] {
        match self {
            RankingScope::DrillRecent(_) => trailing(results, RECENT_WINDOW),
            _ => results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub stats: UserStats,
    /// 1-based position in the full ranking; `None` without attempts.
    pub rank: Option<usize>,
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn trailing<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

pub fn calculate_drill_stats<I>(results: I) -> DrillStats
where
    I: IntoIterator<Item = ResultType>,
{
    let mut stats = DrillStats::default();

    for result in results {
        match result {
            ResultType::Confirmed => stats.confirmed += 1,
            ResultType::Stands => stats.stands += 1,
            ResultType::Overturned => stats.overturned += 1,
        }
        stats.total += 1;
    }

    stats.confirmed_percentage = percentage(stats.confirmed, stats.total);
    stats.stands_percentage = percentage(stats.stands, stats.total);
    stats.overturned_percentage = percentage(stats.overturned, stats.total);
    stats
}

/// `results` must be in chronological order; the recent window is positional.
pub fn calculate_drill_stats_with_recent(results: &[ResultType]) -> DrillStatsWithRecent {
    DrillStatsWithRecent {
        overall: calculate_drill_stats(results.iter().copied()),
        last20: calculate_drill_stats(trailing(results, RECENT_WINDOW).iter().copied()),
    }
}

fn stats_row(user: &User, results: &[ResultType]) -> UserStats {
    let confirmed = results
        .iter()
        .filter(|r| **r == ResultType::Confirmed)
        .count();

    UserStats {
        user_id: user.id.clone(),
        username: user.username.clone(),
        level: user.level,
        location: user.location,
        city: user.city.clone(),
        state: user.state.clone(),
        profile_photo: user.profile_photo.clone(),
        total_confirmed: confirmed,
        total_attempts: results.len(),
        confirmed_percentage: percentage(confirmed, results.len()),
    }
}

pub fn user_stats(user: &User, results: &[DrillResult]) -> UserStats {
    let outcomes: Vec<ResultType> = results
        .iter()
        .filter(|r| r.user_id == user.id)
        .map(|r| r.result)
        .collect();

    stats_row(user, &outcomes)
}

fn group_by_user<'a>(
    results: &'a [DrillResult],
    scope: RankingScope,
) -> HashMap<&'a str, Vec<ResultType>> {
    let mut grouped: HashMap<&str, Vec<ResultType>> = HashMap::new();

    for result in results.iter().filter(|r| scope.includes(r)) {
        grouped
            .entry(result.user_id.as_str())
            .or_default()
            .push(result.result);
    }

    grouped
}

/// Every user with at least one attempt in scope, best confirmed percentage
/// first. Ties keep the order of `users`.
pub fn rank_users(users: &[User], results: &[DrillResult], scope: RankingScope) -> Vec<UserStats> {
    let grouped = group_by_user(results, scope);

    let mut ranking: Vec<UserStats> = users
        .iter()
        .filter_map(|user| {
            let outcomes = grouped.get(user.id.as_str())?;
            Some(stats_row(user, scope.window(outcomes)))
        })
        .filter(|stats| stats.total_attempts > 0)
        .collect();

    ranking.sort_by(|a, b| b.confirmed_percentage.total_cmp(&a.confirmed_percentage));
    ranking
}

pub fn leaderboard(users: &[User], results: &[DrillResult]) -> Vec<UserStats> {
    top(rank_users(users, results, RankingScope::Overall))
}

pub fn drill_leaderboard(
    users: &[User],
    results: &[DrillResult],
    drill_type: DrillType,
) -> Vec<UserStats> {
    top(rank_users(users, results, RankingScope::Drill(drill_type)))
}

pub fn drill_last20_leaderboard(
    users: &[User],
    results: &[DrillResult],
    drill_type: DrillType,
) -> Vec<UserStats> {
    top(rank_users(users, results, RankingScope::DrillRecent(drill_type)))
}

fn top(mut ranking: Vec<UserStats>) -> Vec<UserStats> {
    ranking.truncate(LEADERBOARD_SIZE);
    ranking
}

pub fn user_rank(ranking: &[UserStats], user_id: &str) -> Option<usize> {
    ranking
        .iter()
        .position(|stats| stats.user_id == user_id)
        .map(|index| index + 1)
}

/// The user's own row and rank, whether or not they make the top of the board.
///
/// The rank is the position in the full ranking, so a user outside the top
/// ten gets their real place rather than "one past the board". Users with no
/// attempts in scope are unranked.
pub fn standing(
    user: &User,
    users: &[User],
    results: &[DrillResult],
    scope: RankingScope,
) -> Standing {
    let ranking = rank_users(users, results, scope);

    let rank = user_rank(&ranking, &user.id);
    let stats = match rank {
        Some(position) => ranking[position - 1].clone(),
        None => stats_row(user, &[]),
    };

    Standing { stats, rank }
}
