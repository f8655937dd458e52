//! XP leaderboard.

use crate::levels::Level;
use crate::progress::UserProgress;
use crate::skill::SkillTrack;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub user_id: String,
    /// Total XP, or the track's XP for a per-track board
    pub xp: u64,
    pub level: Level,
    pub completed_missions: usize,
}

/// Order users by XP (descending), breaking ties by user id
pub fn rank(snapshots: &[UserProgress], track: Option<SkillTrack>, limit: usize) -> Vec<LeaderboardEntry> {
    let xp_of = |p: &UserProgress| match track {
        Some(t) => p.xp().track(t),
        None => p.xp().total(),
    };

    let mut ordered: Vec<&UserProgress> = snapshots.iter().collect();
    ordered.sort_by(|a, b| {
        xp_of(b)
            .cmp(&xp_of(a))
            .then_with(|| a.user_id().cmp(b.user_id()))
    });

    ordered
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, p)| LeaderboardEntry {
            rank: i + 1,
            user_id: p.user_id().to_string(),
            xp: xp_of(p),
            level: p.level(),
            completed_missions: p.completed_missions().len(),
        })
        .collect()
}
