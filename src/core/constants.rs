// Enemy health
pub const BASE_ENEMY_HP: u32 = 30;
pub const BASE_BOSS_HP: u32 = 30;

// Character attack damage by tier: basic, second, third, special
pub const DEFAULT_DAMAGE_TABLE: [u32; 4] = [10, 15, 25, 25];

// Attack tier escalation by correct-answer length
pub const SECOND_TIER_MIN_ANSWER_LEN: usize = 5;
pub const THIRD_TIER_MIN_ANSWER_LEN: usize = 8;

// Boss curses arm on every Nth consecutive wrong answer
pub const CURSE_STREAK: u32 = 3;

// Strong potion multiplier on the next hit
pub const STRONG_EFFECT_MULTIPLIER: u32 = 2;

// Energy
pub const ENERGY_RESTORE_SECONDS: i64 = 5 * 60;

// Default boss identities and their curses (enemy name, curse tag)
pub const DEFAULT_BOSS_CURSES: [(&str, &str); 6] = [
    ("Boss Joshy", "shield"),
    ("Boss Darco", "reverse"),
    ("Boss Scorchlord", "shuffle"),
    ("Boss Maggmaw", "permuted"),
    ("Boss Pyroformic", "force_basic_attack"),
    ("Boss Icycreamero", "mutual_damage"),
];
