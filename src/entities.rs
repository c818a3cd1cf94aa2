use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    PLAYER_START_ATTACK, PLAYER_START_CRIT_CHANCE, PLAYER_START_CRIT_MULTIPLIER,
    PLAYER_START_DEFENSE, PLAYER_START_EXP_TO_NEXT, PLAYER_START_HP, PLAYER_START_OXYGEN,
    PLAYER_START_PISTOL_AMMO, PLAYER_START_POWER,
};
use crate::types::{AbilityId, AbilityView, Direction, EnemyType, SupplyKind, Vec2};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityState {
    pub unlocked: bool,
    pub passive: bool,
    pub uses: u32,
    pub max_uses: u32,
}

impl AbilityId {
    pub fn power_cost(self) -> i32 {
        match self {
            Self::EnergyShield => 15,
            Self::EmpBurst => 20,
            Self::PlasmaNova => 30,
            Self::BreachCharge => 10,
            _ => 0,
        }
    }

    pub fn max_uses_per_floor(self) -> u32 {
        match self {
            Self::EnergyShield => 2,
            Self::EmpBurst => 2,
            Self::PlasmaNova => 1,
            Self::BreachCharge => 3,
            _ => 0,
        }
    }
}

fn starting_abilities() -> BTreeMap<AbilityId, AbilityState> {
    AbilityId::ALL
        .iter()
        .map(|id| {
            let passive = id.is_passive();
            let max_uses = id.max_uses_per_floor();
            (
                *id,
                AbilityState {
                    unlocked: *id == AbilityId::EnergyShield,
                    passive,
                    uses: max_uses,
                    max_uses,
                },
            )
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub pos: Vec2,
    pub facing: Direction,
    pub hp: i32,
    pub max_hp: i32,
    pub oxygen: f32,
    pub max_oxygen: f32,
    pub power: i32,
    pub max_power: i32,
    pub attack: i32,
    pub defense: i32,
    pub level: i32,
    pub exp: i32,
    pub exp_to_next: i32,
    pub gold: i32,
    pub critical_chance: f32,
    pub critical_multiplier: f32,
    pub shield_active: bool,
    pub shield_duration: u32,
    /// Charges from the auto-repair upgrade; checked before the active shield.
    pub shields: u32,
    pub abilities: BTreeMap<AbilityId, AbilityState>,
    /// Ammo per ranged slot, indexed like `WeaponKind::SLOTS`.
    pub ammo: [u32; 3],
    pub kills: u32,
    #[serde(default)]
    pub shop_purchases: BTreeMap<String, u32>,
    #[serde(skip)]
    pub chain_bonus_damage: i32,
    #[serde(skip)]
    pub has_extra_action: bool,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        let player = Self {
            pos,
            facing: Direction::Down,
            hp: PLAYER_START_HP,
            max_hp: PLAYER_START_HP,
            oxygen: PLAYER_START_OXYGEN,
            max_oxygen: PLAYER_START_OXYGEN,
            power: PLAYER_START_POWER,
            max_power: PLAYER_START_POWER,
            attack: PLAYER_START_ATTACK,
            defense: PLAYER_START_DEFENSE,
            level: 1,
            exp: 0,
            exp_to_next: PLAYER_START_EXP_TO_NEXT,
            gold: 0,
            critical_chance: PLAYER_START_CRIT_CHANCE,
            critical_multiplier: PLAYER_START_CRIT_MULTIPLIER,
            shield_active: false,
            shield_duration: 0,
            shields: 0,
            abilities: starting_abilities(),
            ammo: [PLAYER_START_PISTOL_AMMO, 0, 0],
            kills: 0,
            shop_purchases: BTreeMap::new(),
            chain_bonus_damage: 0,
            has_extra_action: false,
        };
        player.assert_invariants();
        player
    }

    /// Max HP and max oxygen are divisors in every ratio check.
    pub fn assert_invariants(&self) {
        assert!(self.max_hp > 0, "player max_hp must be positive");
        assert!(self.max_oxygen > 0.0, "player max_oxygen must be positive");
    }

    pub fn has_passive(&self, id: AbilityId) -> bool {
        self.abilities
            .get(&id)
            .map(|state| state.passive && state.unlocked)
            .unwrap_or(false)
    }

    pub fn is_unlocked(&self, id: AbilityId) -> bool {
        self.abilities
            .get(&id)
            .map(|state| state.unlocked)
            .unwrap_or(false)
    }

    pub fn unlock(&mut self, id: AbilityId) {
        if let Some(state) = self.abilities.get_mut(&id) {
            state.unlocked = true;
            state.uses = state.max_uses;
        }
    }

    pub fn hp_ratio(&self) -> f32 {
        self.hp as f32 / self.max_hp as f32
    }

    pub fn oxygen_ratio(&self) -> f32 {
        self.oxygen / self.max_oxygen
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).clamp(0, self.max_hp);
        self.hp - before
    }

    pub fn lose_hp(&mut self, amount: i32) {
        self.hp = (self.hp - amount.max(0)).clamp(0, self.max_hp);
    }

    pub fn add_oxygen(&mut self, amount: f32) {
        self.oxygen = (self.oxygen + amount).clamp(0.0, self.max_oxygen);
    }

    pub fn refill_ability_uses(&mut self) {
        for state in self.abilities.values_mut() {
            state.uses = state.max_uses;
        }
    }

    pub fn ability_views(&self) -> Vec<AbilityView> {
        self.abilities
            .iter()
            .map(|(id, state)| AbilityView {
                id: *id,
                unlocked: state.unlocked,
                passive: state.passive,
                uses: state.uses,
                max_uses: state.max_uses,
            })
            .collect()
    }
}

/// Fixed capability set of an enemy type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyProfile {
    pub base_hp: i32,
    pub hp_growth: i32,
    pub base_attack: i32,
    pub attack_growth: f32,
    pub base_defense: i32,
    pub defense_growth: f32,
    pub base_exp: i32,
    pub base_gold: i32,
    pub dodge_base: f32,
    pub detection_range: i32,
    pub phase_through: bool,
    pub oxygen_drain: f32,
    pub wanders: bool,
}

impl EnemyType {
    pub fn profile(self) -> EnemyProfile {
        let (base_hp, hp_growth, base_attack, attack_growth, base_defense, defense_growth) =
            match self {
                Self::Basic => (12, 3, 4, 1.0, 0, 0.3),
                Self::Crawler => (8, 2, 3, 0.8, 0, 0.2),
                Self::Drone => (10, 2, 5, 1.0, 1, 0.3),
                Self::Brute => (24, 5, 7, 1.5, 2, 0.5),
                Self::Stalker => (14, 3, 6, 1.2, 1, 0.3),
                Self::Phantom => (12, 3, 6, 1.2, 0, 0.3),
                Self::Psychic => (14, 3, 5, 1.0, 1, 0.3),
                Self::Spitter => (12, 2, 6, 1.3, 1, 0.3),
                Self::Leech => (16, 3, 5, 1.0, 1, 0.4),
                Self::Sentinel => (30, 5, 8, 1.5, 4, 0.6),
                Self::Swarmer => (6, 1, 3, 0.7, 0, 0.1),
                Self::Juggernaut => (45, 7, 10, 2.0, 5, 0.7),
                Self::Overseer => (120, 10, 14, 2.0, 6, 0.5),
            };
        let (base_exp, base_gold, dodge_base, detection_range) = match self {
            Self::Basic => (5, 3, 5.0, 5),
            Self::Crawler => (4, 2, 12.0, 6),
            Self::Drone => (6, 4, 15.0, 8),
            Self::Brute => (10, 6, 0.0, 4),
            Self::Stalker => (9, 5, 10.0, 10),
            Self::Phantom => (12, 7, 20.0, 7),
            Self::Psychic => (12, 8, 8.0, 7),
            Self::Spitter => (10, 6, 8.0, 9),
            Self::Leech => (11, 7, 6.0, 6),
            Self::Sentinel => (15, 10, 0.0, 5),
            Self::Swarmer => (3, 2, 18.0, 8),
            Self::Juggernaut => (25, 15, 0.0, 6),
            Self::Overseer => (80, 60, 10.0, 12),
        };
        let oxygen_drain = match self {
            Self::Psychic => 6.0,
            Self::Leech => 3.0,
            Self::Overseer => 8.0,
            _ => 0.0,
        };
        EnemyProfile {
            base_hp,
            hp_growth,
            base_attack,
            attack_growth,
            base_defense,
            defense_growth,
            base_exp,
            base_gold,
            dodge_base,
            detection_range,
            phase_through: matches!(self, Self::Phantom | Self::Overseer),
            oxygen_drain,
            wanders: self == Self::Basic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemyStats {
    pub level: i32,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub exp_reward: i32,
    pub gold_reward: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub id: u32,
    pub enemy_type: EnemyType,
    pub pos: Vec2,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub level: i32,
    pub alive: bool,
    pub exp_reward: i32,
    pub gold_reward: i32,
    pub stunned: bool,
    pub stun_duration: u32,
}

impl Enemy {
    pub fn new(id: u32, enemy_type: EnemyType, pos: Vec2, stats: EnemyStats) -> Self {
        assert!(stats.hp > 0, "enemy max_hp must be positive");
        Self {
            id,
            enemy_type,
            pos,
            hp: stats.hp,
            max_hp: stats.hp,
            attack: stats.attack,
            defense: stats.defense,
            level: stats.level,
            alive: true,
            exp_reward: stats.exp_reward,
            gold_reward: stats.gold_reward,
            stunned: false,
            stun_duration: 0,
        }
    }

    pub fn profile(&self) -> EnemyProfile {
        self.enemy_type.profile()
    }

    pub fn hp_ratio(&self) -> f32 {
        self.hp as f32 / self.max_hp as f32
    }

    pub fn stun(&mut self, turns: u32) {
        self.stunned = true;
        self.stun_duration = self.stun_duration.max(turns);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Supply {
    pub id: u32,
    pub kind: SupplyKind,
    pub pos: Vec2,
    pub amount: i32,
    pub taken: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_starts_with_only_energy_shield() {
        let player = Player::new(Vec2::new(3, 3));
        assert!(player.is_unlocked(AbilityId::EnergyShield));
        for id in AbilityId::ALL {
            if id != AbilityId::EnergyShield {
                assert!(!player.is_unlocked(id), "{id:?} should start locked");
            }
        }
        assert!(!player.has_passive(AbilityId::EnergyShield));
    }

    #[test]
    fn heal_and_damage_clamp_to_bounds() {
        let mut player = Player::new(Vec2::new(0, 0));
        player.hp = 95;
        assert_eq!(player.heal(50), 5);
        assert_eq!(player.hp, player.max_hp);
        player.lose_hp(500);
        assert_eq!(player.hp, 0);
        player.add_oxygen(-500.0);
        assert_eq!(player.oxygen, 0.0);
        player.add_oxygen(500.0);
        assert_eq!(player.oxygen, player.max_oxygen);
    }

    #[test]
    fn only_phasing_types_pass_bulkheads() {
        for enemy_type in EnemyType::ALL {
            let profile = enemy_type.profile();
            let expected = matches!(enemy_type, EnemyType::Phantom | EnemyType::Overseer);
            assert_eq!(profile.phase_through, expected);
            assert!(profile.base_hp > 0);
        }
        assert!(EnemyType::Basic.profile().wanders);
        assert!(!EnemyType::Stalker.profile().wanders);
    }

    #[test]
    #[should_panic(expected = "enemy max_hp must be positive")]
    fn enemy_with_zero_hp_is_rejected() {
        let _ = Enemy::new(
            1,
            EnemyType::Basic,
            Vec2::new(1, 1),
            EnemyStats {
                level: 1,
                hp: 0,
                attack: 1,
                defense: 0,
                exp_reward: 1,
                gold_reward: 1,
            },
        );
    }
}
