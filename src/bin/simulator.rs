//! quizbattle Headless Encounter Simulator
//!
//! Plays seeded encounters through the real `CombatEngine` with in-memory
//! collaborators and reports win/loss balance.
//!
//! Usage:
//!   cargo run --bin simulator -- [OPTIONS]
//!
//! Options:
//!   --runs N          Encounters to play (default: 100)
//!   --seed N          RNG seed (default: 42)
//!   --accuracy F      Chance of a correct answer, 0.0-1.0 (default: 0.7)
//!   --challenges N    Challenges per level (default: 5)
//!   --boss NAME       Fight a boss with this name instead of a normal enemy
//!   --config FILE     Engine config JSON
//!   --verbose         Per-turn logging

use quizbattle::catalog::{
    CardTable, ChallengeTemplate, CharacterTemplate, EnemyTemplate, InMemoryCatalog, LevelRef,
    LevelTemplate, PlayerProfile, Reward,
};
use quizbattle::combat::BattleStatus;
use quizbattle::core::EngineConfig;
use quizbattle::progression::InMemoryLedger;
use quizbattle::store::InMemoryProgressStore;
use quizbattle::{CombatEngine, CombatResult, TurnRequest};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use uuid::Uuid;

// Safety valve: an encounter where every answer repeats can stall forever
const MAX_TURNS_PER_ENCOUNTER: u32 = 500;

// ── CLI Configuration ────────────────────────────────────────────────

struct SimConfig {
    runs: u32,
    seed: u64,
    accuracy: f64,
    challenges: u32,
    boss: Option<String>,
    config_path: Option<PathBuf>,
    verbose: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            runs: 100,
            seed: 42,
            accuracy: 0.7,
            challenges: 5,
            boss: None,
            config_path: None,
            verbose: false,
        }
    }
}

fn parse_args() -> Result<SimConfig, String> {
    let args: Vec<String> = std::env::args().collect();
    let mut config = SimConfig::default();
    let mut i = 1;
    while i < args.len() {
        let value = |i: usize| {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| format!("{} requires a value", args[i]))
        };
        match args[i].as_str() {
            "--runs" => {
                config.runs = value(i)?.parse().map_err(|_| "--runs requires a number")?;
                i += 1;
            }
            "--seed" => {
                config.seed = value(i)?.parse().map_err(|_| "--seed requires a number")?;
                i += 1;
            }
            "--accuracy" => {
                config.accuracy = value(i)?
                    .parse::<f64>()
                    .map_err(|_| "--accuracy requires a number")?
                    .clamp(0.0, 1.0);
                i += 1;
            }
            "--challenges" => {
                config.challenges = value(i)?
                    .parse()
                    .map_err(|_| "--challenges requires a number")?;
                i += 1;
            }
            "--boss" => {
                config.boss = Some(value(i)?);
                i += 1;
            }
            "--config" => {
                config.config_path = Some(PathBuf::from(value(i)?));
                i += 1;
            }
            "--verbose" => config.verbose = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("Unknown argument: {other}")),
        }
        i += 1;
    }
    Ok(config)
}

fn print_usage() {
    eprintln!(
        "quizbattle Encounter Simulator\n\
         \n\
         Usage: simulator [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 --runs N          Encounters to play (default: 100)\n\
         \x20 --seed N          RNG seed (default: 42)\n\
         \x20 --accuracy F      Chance of a correct answer (default: 0.7)\n\
         \x20 --challenges N    Challenges per level (default: 5)\n\
         \x20 --boss NAME       Fight the named boss\n\
         \x20 --config FILE     Engine config JSON\n\
         \x20 --verbose         Per-turn logging\n\
         \x20 --help, -h        Show this help"
    );
}

// ── Simulation Statistics ────────────────────────────────────────────

#[derive(Debug, Default)]
struct SimStats {
    wins: u32,
    losses: u32,
    stalled: u32,
    total_turns: u64,
    bonus_rounds: u32,
    curses_used: u32,
    perfect_runs: u32,
}

impl SimStats {
    fn print_summary(&self, sim: &SimConfig) {
        let played = (self.wins + self.losses + self.stalled).max(1);
        println!(
            "runs={} accuracy={:.2} challenges={} enemy={}",
            played,
            sim.accuracy,
            sim.challenges,
            sim.boss.as_deref().unwrap_or("normal")
        );
        println!(
            "wins={} ({:.1}%) losses={} stalled={}",
            self.wins,
            self.wins as f64 * 100.0 / played as f64,
            self.losses,
            self.stalled
        );
        println!(
            "avg_turns={:.1} bonus_rounds={} curses_used={} perfect_runs={}",
            self.total_turns as f64 / played as f64,
            self.bonus_rounds,
            self.curses_used,
            self.perfect_runs
        );
    }
}

// ── World Setup ──────────────────────────────────────────────────────

const CHARACTER_ID: u32 = 1;
const ENEMY_ID: u32 = 1;
const LEVEL_ID: u32 = 1;

fn build_catalog(sim: &SimConfig, player: Uuid) -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new()
        .with_player(PlayerProfile {
            id: player,
            character_id: CHARACTER_ID,
            energy: 5,
            max_energy: 5,
            next_energy_restore_at: None,
        })
        .with_character(CharacterTemplate {
            id: CHARACTER_ID,
            name: "Ryron".to_string(),
            max_hp: 100,
            damage: vec![10, 15, 25, 25],
        })
        .with_enemy(EnemyTemplate {
            id: ENEMY_ID,
            name: sim.boss.clone().unwrap_or_else(|| "Slime".to_string()),
            damage: 15,
            special_damage: Some(25),
        })
        .with_level(LevelTemplate {
            id: LEVEL_ID,
            map_id: 1,
            enemy_id: ENEMY_ID,
            challenge_ids: (1..=sim.challenges).collect(),
            difficulty: if sim.boss.is_some() { "boss" } else { "easy" }.to_string(),
            next_level: Some(LevelRef {
                map_id: 1,
                level_id: LEVEL_ID + 1,
            }),
        });
    let answers = ["x = 1", "print(total)", "for item in items:"];
    for id in 1..=sim.challenges {
        catalog = catalog.with_challenge(ChallengeTemplate {
            id,
            correct_answer: answers[id as usize % answers.len()].to_string(),
            reward: Reward {
                coins: 2,
                points: 10,
                exp: 5,
            },
        });
    }
    catalog
}

async fn play_encounter(
    sim: &SimConfig,
    engine_config: &EngineConfig,
    rng: &mut ChaCha8Rng,
    stats: &mut SimStats,
) -> CombatResult<()> {
    let player = Uuid::from_u128(rng.gen());
    let engine = CombatEngine::new(
        InMemoryProgressStore::new(),
        build_catalog(sim, player),
        InMemoryLedger::new(),
        engine_config.clone(),
        CardTable::new(),
    );
    engine.fetch_combat_state(player, LEVEL_ID).await?;

    let mut bonus_seen = false;
    for turn in 0..MAX_TURNS_PER_ENCOUNTER {
        // Work through challenges in order, then revisit wrong ones
        let state = engine.fetch_combat_state(player, LEVEL_ID).await?;
        let progress = &state.progress;
        let challenge_id = (1..=sim.challenges)
            .find(|id| !progress.answered_challenges.contains_key(id))
            .or_else(|| progress.wrong_challenge_ids.iter().next().copied())
            .unwrap_or(1 + turn % sim.challenges.max(1));

        let correct = rng.gen_bool(sim.accuracy);
        let request = TurnRequest::new(player, LEVEL_ID, ENEMY_ID, correct)
            .with_challenge(challenge_id, "answer")
            .with_elapsed(turn as f64 * 20.0);
        let result = engine.resolve_turn(&request).await?;

        stats.total_turns += 1;
        bonus_seen |= result.is_bonus_round;
        if result.boss_special_skill.is_some() {
            stats.curses_used += 1;
        }

        match result.status {
            BattleStatus::Won => {
                stats.wins += 1;
                if result.character.health == result.character.max_health
                    && state.progress.wrong_challenge_ids.is_empty()
                {
                    stats.perfect_runs += 1;
                }
                if bonus_seen {
                    stats.bonus_rounds += 1;
                }
                return Ok(());
            }
            BattleStatus::Lost => {
                stats.losses += 1;
                return Ok(());
            }
            BattleStatus::InProgress => {}
        }
    }
    stats.stalled += 1;
    Ok(())
}

#[tokio::main]
async fn main() {
    let sim = match parse_args() {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            std::process::exit(1);
        }
    };

    if sim.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    let engine_config = match &sim.config_path {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let mut rng = ChaCha8Rng::seed_from_u64(sim.seed);
    let mut stats = SimStats::default();
    for _ in 0..sim.runs {
        if let Err(e) = play_encounter(&sim, &engine_config, &mut rng, &mut stats).await {
            eprintln!("encounter failed: {e}");
            std::process::exit(1);
        }
    }
    stats.print_summary(&sim);
}
