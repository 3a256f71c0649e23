//! Boss curse arming and consumption.
//!
//! Each boss owns one curse. Every `curse_streak`-th consecutive wrong
//! answer arms it; the next counterattack against a live enemy spends it.

use super::progress::CombatProgress;
use super::rules::CombatRules;
use super::types::BossCurse;

/// The persisted flag backing a curse. `Shuffle` and `Permuted` share one.
fn flag_mut(progress: &mut CombatProgress, curse: BossCurse) -> &mut bool {
    match curse {
        BossCurse::Shield => &mut progress.boss_shield,
        BossCurse::Reverse => &mut progress.reversed_curse,
        BossCurse::Shuffle | BossCurse::Permuted => &mut progress.shuffle_options,
        BossCurse::ForceBasicAttack => &mut progress.force_basic_attack,
        BossCurse::MutualDamage => &mut progress.both_hp_decrease,
    }
}

pub fn arm(progress: &mut CombatProgress, curse: BossCurse) {
    *flag_mut(progress, curse) = true;
}

/// Clears the curse flag, returning whether it was armed.
pub fn consume(progress: &mut CombatProgress, curse: BossCurse) -> bool {
    std::mem::take(flag_mut(progress, curse))
}

/// Arms the boss curse when the wrong streak lands on a multiple of the
/// curse streak. Call after the streak counters were updated.
pub fn activate_on_wrong(progress: &mut CombatProgress, rules: &CombatRules) -> Option<BossCurse> {
    let curse = rules.curse.filter(|_| rules.special_skill_enabled)?;
    if rules.curse_streak == 0 || progress.consecutive_wrong == 0 {
        return None;
    }
    if progress.consecutive_wrong % rules.curse_streak != 0 {
        return None;
    }
    arm(progress, curse);
    tracing::info!(
        player = %progress.player_id,
        level = progress.level_id,
        curse = curse.tag(),
        streak = progress.consecutive_wrong,
        "boss curse armed"
    );
    Some(curse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EnemyTemplate;
    use crate::core::EngineConfig;
    use chrono::Utc;
    use uuid::Uuid;

    fn boss_rules(name: &str) -> CombatRules {
        let enemy = EnemyTemplate {
            id: 9,
            name: name.to_string(),
            damage: 20,
            special_damage: Some(30),
        };
        CombatRules::boss(&enemy, &EngineConfig::default())
    }

    fn progress() -> CombatProgress {
        CombatProgress::new(Uuid::new_v4(), 1, 90, 100, Utc::now())
    }

    #[test]
    fn test_arms_on_every_third_wrong() {
        let rules = boss_rules("Boss Joshy");
        let mut p = progress();
        for expected in [None, None, Some(BossCurse::Shield)] {
            p.record_streak(false);
            assert_eq!(activate_on_wrong(&mut p, &rules), expected);
        }
        assert!(p.boss_shield);

        consume(&mut p, BossCurse::Shield);
        for _ in 0..2 {
            p.record_streak(false);
            assert_eq!(activate_on_wrong(&mut p, &rules), None);
        }
        p.record_streak(false);
        assert_eq!(p.consecutive_wrong, 6);
        assert_eq!(activate_on_wrong(&mut p, &rules), Some(BossCurse::Shield));
    }

    #[test]
    fn test_only_own_flag_is_armed() {
        let rules = boss_rules("Boss Icycreamero");
        let mut p = progress();
        p.consecutive_wrong = 3;
        activate_on_wrong(&mut p, &rules);
        assert!(p.both_hp_decrease);
        assert!(!p.boss_shield && !p.reversed_curse && !p.shuffle_options && !p.force_basic_attack);
    }

    #[test]
    fn test_normal_rules_never_arm() {
        let rules = CombatRules::normal(&EngineConfig::default());
        let mut p = progress();
        p.consecutive_wrong = 3;
        assert_eq!(activate_on_wrong(&mut p, &rules), None);
    }

    #[test]
    fn test_shuffle_and_permuted_share_flag() {
        let mut p = progress();
        arm(&mut p, BossCurse::Permuted);
        assert!(p.shuffle_options);
        assert!(consume(&mut p, BossCurse::Shuffle));
        assert!(!consume(&mut p, BossCurse::Permuted));
    }
}
