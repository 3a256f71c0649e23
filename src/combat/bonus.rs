//! Bonus round (stunned phase) detection.
//!
//! The phase is derived from HP and answer count every turn and never
//! stored, since both change on every call.

/// Enemy is down but challenges remain unanswered.
pub fn is_bonus_round(enemy_hp: u32, answered_count: u32, total_challenges: u32) -> bool {
    enemy_hp == 0 && answered_count < total_challenges
}

/// Every challenge has been answered and the enemy is down.
pub fn is_encounter_cleared(enemy_hp: u32, answered_count: u32, total_challenges: u32) -> bool {
    enemy_hp == 0 && answered_count >= total_challenges
}
