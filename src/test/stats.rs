#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::auth::User;
    use crate::models::{DrillResult, DrillType, Level, Location, ResultType, new_id};
    use crate::stats::{
        LEADERBOARD_SIZE, RankingScope, calculate_drill_stats, calculate_drill_stats_with_recent,
        drill_last20_leaderboard, drill_leaderboard, leaderboard, rank_users, standing,
        user_stats,
    };

    use ResultType::{Confirmed, Overturned, Stands};

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            username: format!("ump_{}", id),
            first_name: "Test".to_string(),
            last_name: id.to_string(),
            email: format!("{}@example.com", id),
            level: Level::Rookie,
            location: Location::Philadelphia,
            city: None,
            state: None,
            education_level: None,
            conferences_worked: None,
            is_admin: false,
            is_evaluator: false,
            profile_photo: None,
            created_at: Utc::now(),
        }
    }

    fn results_for(
        user_id: &str,
        drill_type: DrillType,
        outcomes: &[ResultType],
    ) -> Vec<DrillResult> {
        let start = Utc::now() - Duration::hours(1);

        outcomes
            .iter()
            .enumerate()
            .map(|(i, &result)| DrillResult {
                id: new_id(),
                user_id: user_id.to_string(),
                drill_type,
                result,
                session_id: None,
                session_start_time: None,
                session_end_time: None,
                session_notes: None,
                evaluator_id: None,
                evaluator_username: None,
                is_evaluator_recorded: false,
                timestamp: start + Duration::seconds(i as i64),
            })
            .collect()
    }

    #[test]
    fn test_empty_stats_are_zero() {
        let stats = calculate_drill_stats(Vec::<ResultType>::new());

        assert_eq!(stats.total, 0);
        assert_eq!(stats.confirmed_percentage, 0.0);
        assert_eq!(stats.stands_percentage, 0.0);
        assert_eq!(stats.overturned_percentage, 0.0);
    }

    #[test]
    fn test_percentages() {
        let stats = calculate_drill_stats([Confirmed, Confirmed, Stands, Overturned]);

        assert_eq!(stats.confirmed, 2);
        assert_eq!(stats.stands, 1);
        assert_eq!(stats.overturned, 1);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.confirmed_percentage, 50.0);
        assert_eq!(stats.stands_percentage, 25.0);
        assert_eq!(stats.overturned_percentage, 25.0);
    }

    #[test]
    fn test_recent_window_uses_latest_twenty() {
        let mut outcomes = vec![Overturned; 10];
        outcomes.extend(vec![Confirmed; 20]);

        let stats = calculate_drill_stats_with_recent(&outcomes);

        assert_eq!(stats.overall.total, 30);
        assert_eq!(stats.last20.total, 20);
        assert_eq!(stats.last20.confirmed_percentage, 100.0);
        assert!((stats.overall.confirmed_percentage - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_recent_window_with_few_results() {
        let stats = calculate_drill_stats_with_recent(&[Confirmed, Stands]);
        assert_eq!(stats.overall, stats.last20);
    }

    #[test]
    fn test_user_stats_only_counts_own_results() {
        let alice = user("alice");
        let mut results = results_for("alice", DrillType::CheckSwing, &[Confirmed, Stands]);
        results.extend(results_for("bob", DrillType::CheckSwing, &[Confirmed]));

        let stats = user_stats(&alice, &results);

        assert_eq!(stats.total_attempts, 2);
        assert_eq!(stats.total_confirmed, 1);
        assert_eq!(stats.confirmed_percentage, 50.0);
        assert_eq!(stats.username, "ump_alice");
    }

    #[test]
    fn test_leaderboard_excludes_users_without_attempts() {
        let users = vec![user("alice"), user("bob"), user("carol")];
        let mut results = results_for("alice", DrillType::FairFoul, &[Confirmed, Overturned]);
        results.extend(results_for("bob", DrillType::FairFoul, &[Confirmed]));

        let board = leaderboard(&users, &results);

        let ids: Vec<&str> = board.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(ids, vec!["bob", "alice"]);
    }

    #[test]
    fn test_ties_keep_user_order() {
        let users = vec![user("alice"), user("bob")];
        let mut results = results_for("bob", DrillType::FairFoul, &[Confirmed]);
        results.extend(results_for("alice", DrillType::FairFoul, &[Confirmed, Confirmed]));

        let ranking = rank_users(&users, &results, RankingScope::Overall);

        let ids: Vec<&str> = ranking.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
    }

    #[test]
    fn test_leaderboard_is_capped() {
        let users: Vec<User> = (0..15).map(|i| user(&format!("u{}", i))).collect();
        let results: Vec<DrillResult> = users
            .iter()
            .flat_map(|u| results_for(&u.id, DrillType::Steal3b, &[Confirmed]))
            .collect();

        assert_eq!(leaderboard(&users, &results).len(), LEADERBOARD_SIZE);
        assert_eq!(
            rank_users(&users, &results, RankingScope::Overall).len(),
            15
        );
    }

    #[test]
    fn test_drill_leaderboards_filter_by_type() {
        let users = vec![user("alice"), user("bob")];
        let mut results = results_for("alice", DrillType::PlayAtPlate, &[Confirmed]);
        results.extend(results_for("bob", DrillType::CheckSwing, &[Confirmed]));

        let board = drill_leaderboard(&users, &results, DrillType::PlayAtPlate);

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].user_id, "alice");
    }

    #[test]
    fn test_last20_leaderboard_ranks_recent_form() {
        let users = vec![user("alice"), user("bob")];

        // Alice started badly but has been perfect lately.
        let mut alice = vec![Overturned; 30];
        alice.extend(vec![Confirmed; 20]);
        let mut results = results_for("alice", DrillType::Steal2b, &alice);

        let mut bob = vec![Confirmed; 30];
        bob.extend(vec![Stands; 20]);
        results.extend(results_for("bob", DrillType::Steal2b, &bob));

        let overall = drill_leaderboard(&users, &results, DrillType::Steal2b);
        assert_eq!(overall[0].user_id, "bob");

        let recent = drill_last20_leaderboard(&users, &results, DrillType::Steal2b);
        assert_eq!(recent[0].user_id, "alice");
        assert_eq!(recent[0].total_attempts, 20);
        assert_eq!(recent[0].confirmed_percentage, 100.0);
    }

    #[test]
    fn test_standing_outside_top_ten() {
        let users: Vec<User> = (0..12).map(|i| user(&format!("u{:02}", i))).collect();
        let results: Vec<DrillResult> = users
            .iter()
            .enumerate()
            .flat_map(|(i, u)| {
                let mut outcomes = vec![Confirmed; 12 - i];
                outcomes.extend(vec![Overturned; i]);
                results_for(&u.id, DrillType::AudioForcePlay, &outcomes)
            })
            .collect();

        let last = &users[11];
        let mine = standing(last, &users, &results, RankingScope::Overall);

        assert_eq!(mine.rank, Some(12));
        assert_eq!(mine.stats.user_id, last.id);
    }

    #[test]
    fn test_standing_without_attempts_is_unranked() {
        let users = vec![user("alice"), user("bob")];
        let results = results_for("alice", DrillType::CheckSwingMiddle, &[Confirmed]);

        let mine = standing(&users[1], &users, &results, RankingScope::Overall);

        assert_eq!(mine.rank, None);
        assert_eq!(mine.stats.total_attempts, 0);
        assert_eq!(mine.stats.confirmed_percentage, 0.0);
    }
}
