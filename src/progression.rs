//! Floor-driven generation parameters and player levelling.

use crate::constants::{EXP_GROWTH, LEVEL_UP_ATTACK, LEVEL_UP_DEFENSE, LEVEL_UP_HP, MAX_FLOOR};
use crate::entities::{EnemyStats, Player};
use crate::rng::Rng;
use crate::types::EnemyType;

pub fn enemy_level(floor: u32, rng: &mut Rng) -> i32 {
    floor.max(1) as i32 + rng.int(0, 2)
}

pub fn scale_enemy(enemy_type: EnemyType, level: i32) -> EnemyStats {
    let profile = enemy_type.profile();
    let steps = (level - 1).max(0);
    EnemyStats {
        level: level.max(1),
        hp: (profile.base_hp + profile.hp_growth * steps).max(1),
        attack: profile.base_attack + (profile.attack_growth * steps as f32).floor() as i32,
        defense: profile.base_defense + (profile.defense_growth * steps as f32).floor() as i32,
        exp_reward: profile.base_exp + profile.base_exp * steps / 2,
        gold_reward: profile.base_gold + profile.base_gold * steps / 3,
    }
}

/// Spawn weight per `EnemyType::ALL` entry. The overseer is never drawn;
/// it is placed as the engine core's guard.
pub fn spawn_weights(floor: u32) -> [u32; 13] {
    let f = floor.clamp(1, MAX_FLOOR);
    let ramp = |from: u32, per_floor: u32, cap: u32| -> u32 {
        if f < from {
            0
        } else {
            ((f - from + 1) * per_floor).min(cap)
        }
    };
    [
        40u32.saturating_sub(f * 2),
        ramp(1, 3, 20),
        ramp(2, 3, 18),
        ramp(3, 2, 16),
        ramp(4, 2, 16),
        ramp(6, 2, 14),
        ramp(7, 2, 12),
        ramp(8, 2, 14),
        ramp(9, 2, 12),
        ramp(11, 2, 12),
        ramp(12, 3, 18),
        ramp(15, 2, 10),
        0,
    ]
}

pub fn pick_enemy_type(floor: u32, rng: &mut Rng) -> EnemyType {
    rng.weighted_index(&spawn_weights(floor))
        .and_then(|idx| EnemyType::ALL.get(idx).copied())
        .unwrap_or(EnemyType::Basic)
}

pub fn exp_to_next(level: i32) -> i32 {
    let mut threshold = crate::constants::PLAYER_START_EXP_TO_NEXT;
    for _ in 1..level.max(1) {
        threshold = (threshold as f32 * EXP_GROWTH).floor() as i32;
    }
    threshold
}

/// Converts banked exp into levels; returns every level reached.
pub fn apply_level_ups(player: &mut Player) -> Vec<i32> {
    let mut reached = Vec::new();
    while player.exp >= player.exp_to_next {
        player.exp -= player.exp_to_next;
        player.level += 1;
        player.exp_to_next = exp_to_next(player.level);
        player.max_hp += LEVEL_UP_HP;
        player.hp = (player.hp + LEVEL_UP_HP).min(player.max_hp);
        player.attack += LEVEL_UP_ATTACK;
        player.defense += LEVEL_UP_DEFENSE;
        reached.push(player.level);
    }
    reached
}
