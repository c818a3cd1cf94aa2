//! Qualitative upgrade tracks bought at the elevator terminal, plus the
//! permanent stat shop.
//!
//! Each track has three levels. A level is bought only when it is not maxed,
//! the player can pay for it and the current deck has reached its unlock
//! floor; gold and level change together or not at all.

use serde::{Deserialize, Serialize};

use crate::error::PurchaseError;
use crate::types::{AbilityId, ShopItem, UpgradeId};

pub const MAX_UPGRADE_LEVEL: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelPrice {
    pub cost: i32,
    pub unlock_floor: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainStrikeLevel {
    pub hp_threshold: f32,
    pub max_chains: u32,
    pub bonus_damage: i32,
    pub one_shot_trigger: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CounterAttackLevel {
    pub trigger_chance: f32,
    pub multiplier: f32,
    pub can_crit: bool,
    pub crit_bonus: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutoRepairLevel {
    pub interval_turns: u32,
    pub charges_per_cycle: u32,
    pub max_shields: u32,
    pub floor_change_charges: u32,
}

const CHAIN_STRIKE_LEVELS: [ChainStrikeLevel; 3] = [
    ChainStrikeLevel {
        hp_threshold: 0.3,
        max_chains: 1,
        bonus_damage: 2,
        one_shot_trigger: false,
    },
    ChainStrikeLevel {
        hp_threshold: 0.5,
        max_chains: 2,
        bonus_damage: 4,
        one_shot_trigger: false,
    },
    ChainStrikeLevel {
        hp_threshold: 0.5,
        max_chains: 3,
        bonus_damage: 6,
        one_shot_trigger: true,
    },
];

const COUNTER_ATTACK_LEVELS: [CounterAttackLevel; 3] = [
    CounterAttackLevel {
        trigger_chance: 15.0,
        multiplier: 0.5,
        can_crit: false,
        crit_bonus: 0.0,
    },
    CounterAttackLevel {
        trigger_chance: 25.0,
        multiplier: 0.75,
        can_crit: true,
        crit_bonus: 0.0,
    },
    CounterAttackLevel {
        trigger_chance: 35.0,
        multiplier: 1.0,
        can_crit: true,
        crit_bonus: 15.0,
    },
];

const AUTO_REPAIR_LEVELS: [AutoRepairLevel; 3] = [
    AutoRepairLevel {
        interval_turns: 25,
        charges_per_cycle: 1,
        max_shields: 1,
        floor_change_charges: 0,
    },
    AutoRepairLevel {
        interval_turns: 20,
        charges_per_cycle: 1,
        max_shields: 2,
        floor_change_charges: 1,
    },
    AutoRepairLevel {
        interval_turns: 15,
        charges_per_cycle: 1,
        max_shields: 3,
        floor_change_charges: 2,
    },
];

pub fn level_price(id: UpgradeId, level: u8) -> Option<LevelPrice> {
    let table: [LevelPrice; 3] = match id {
        UpgradeId::ChainStrike => [
            LevelPrice {
                cost: 100,
                unlock_floor: 2,
            },
            LevelPrice {
                cost: 200,
                unlock_floor: 5,
            },
            LevelPrice {
                cost: 350,
                unlock_floor: 9,
            },
        ],
        UpgradeId::CounterAttack => [
            LevelPrice {
                cost: 80,
                unlock_floor: 2,
            },
            LevelPrice {
                cost: 160,
                unlock_floor: 5,
            },
            LevelPrice {
                cost: 300,
                unlock_floor: 9,
            },
        ],
        UpgradeId::AutoRepair => [
            LevelPrice {
                cost: 120,
                unlock_floor: 3,
            },
            LevelPrice {
                cost: 220,
                unlock_floor: 6,
            },
            LevelPrice {
                cost: 380,
                unlock_floor: 10,
            },
        ],
    };
    if level == 0 {
        return None;
    }
    table.get(level as usize - 1).copied()
}

/// Persisted level of every track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeLevels {
    pub chain_strike: u8,
    pub counter_attack: u8,
    pub auto_repair: u8,
}

impl UpgradeLevels {
    pub fn get(&self, id: UpgradeId) -> u8 {
        match id {
            UpgradeId::ChainStrike => self.chain_strike,
            UpgradeId::CounterAttack => self.counter_attack,
            UpgradeId::AutoRepair => self.auto_repair,
        }
    }

    fn slot_mut(&mut self, id: UpgradeId) -> &mut u8 {
        match id {
            UpgradeId::ChainStrike => &mut self.chain_strike,
            UpgradeId::CounterAttack => &mut self.counter_attack,
            UpgradeId::AutoRepair => &mut self.auto_repair,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.chain_strike <= MAX_UPGRADE_LEVEL
            && self.counter_attack <= MAX_UPGRADE_LEVEL
            && self.auto_repair <= MAX_UPGRADE_LEVEL
    }
}

/// Non-stacking: the higher tier replaces the lower one.
pub fn synergy_multiplier(levels: &UpgradeLevels) -> f32 {
    let lowest = levels
        .chain_strike
        .min(levels.counter_attack)
        .min(levels.auto_repair);
    match lowest {
        0 => 1.0,
        1 => 1.1,
        _ => 1.25,
    }
}

#[derive(Clone, Debug, Default)]
pub struct UpgradeManager {
    pub levels: UpgradeLevels,
    chains_this_turn: u32,
    turns_since_repair: u32,
}

impl UpgradeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_levels(levels: UpgradeLevels) -> Self {
        Self {
            levels,
            ..Self::default()
        }
    }

    /// Checks maxed, then funds, then unlock floor.
    pub fn purchase(
        &mut self,
        id: UpgradeId,
        gold: &mut i32,
        floor: u32,
    ) -> Result<u8, PurchaseError> {
        let current = self.levels.get(id);
        if current >= MAX_UPGRADE_LEVEL {
            return Err(PurchaseError::Maxed);
        }
        let next = current + 1;
        let price = level_price(id, next).ok_or(PurchaseError::Maxed)?;
        if *gold < price.cost {
            return Err(PurchaseError::InsufficientFunds {
                cost: price.cost,
                gold: *gold,
            });
        }
        if floor < price.unlock_floor {
            return Err(PurchaseError::Locked {
                unlock_floor: price.unlock_floor,
            });
        }
        *gold -= price.cost;
        *self.levels.slot_mut(id) = next;
        Ok(next)
    }

    pub fn synergy(&self) -> f32 {
        synergy_multiplier(&self.levels)
    }

    pub fn chain_strike(&self) -> Option<ChainStrikeLevel> {
        level_params(&CHAIN_STRIKE_LEVELS, self.levels.chain_strike)
    }

    pub fn counter_attack(&self) -> Option<CounterAttackLevel> {
        level_params(&COUNTER_ATTACK_LEVELS, self.levels.counter_attack)
    }

    pub fn auto_repair(&self) -> Option<AutoRepairLevel> {
        level_params(&AUTO_REPAIR_LEVELS, self.levels.auto_repair)
    }

    pub fn chains_this_turn(&self) -> u32 {
        self.chains_this_turn
    }

    /// Spends one chain from this turn's window if the active level allows it.
    pub fn try_consume_chain(&mut self) -> Option<ChainStrikeLevel> {
        let level = self.chain_strike()?;
        if self.chains_this_turn >= level.max_chains {
            return None;
        }
        self.chains_this_turn += 1;
        Some(level)
    }

    pub fn reset_chain_window(&mut self) {
        self.chains_this_turn = 0;
    }

    /// Advances the repair clock by one turn; returns charges to add.
    pub fn tick_auto_repair(&mut self, current_shields: u32) -> u32 {
        let Some(level) = self.auto_repair() else {
            return 0;
        };
        self.turns_since_repair += 1;
        if self.turns_since_repair < level.interval_turns {
            return 0;
        }
        self.turns_since_repair = 0;
        level
            .charges_per_cycle
            .min(level.max_shields.saturating_sub(current_shields))
    }

    pub fn floor_change_charges(&self, current_shields: u32) -> u32 {
        let Some(level) = self.auto_repair() else {
            return 0;
        };
        level
            .floor_change_charges
            .min(level.max_shields.saturating_sub(current_shields))
    }
}

fn level_params<T: Copy>(table: &[T; 3], level: u8) -> Option<T> {
    if level == 0 {
        return None;
    }
    table.get(level as usize - 1).copied()
}

/// Price of a shop item given how many times it was already bought.
pub fn shop_price(item: ShopItem, times_bought: u32) -> i32 {
    let base = match item {
        ShopItem::HullPlating => 60,
        ShopItem::WeaponCalibration => 75,
        ShopItem::ArmorWeave => 70,
        ShopItem::OxygenTank => 50,
        ShopItem::Unlock(ability) => unlock_price(ability),
    };
    base + base * times_bought as i32 / 2
}

fn unlock_price(ability: AbilityId) -> i32 {
    match ability {
        AbilityId::EnergyShield => 60,
        AbilityId::EmpBurst => 90,
        AbilityId::PlasmaNova => 140,
        AbilityId::BreachCharge => 70,
        AbilityId::OxygenRecycler => 120,
        AbilityId::AutoMedic => 110,
        AbilityId::CombatAwareness => 80,
        AbilityId::Reflexes => 90,
        AbilityId::EvasionMatrix => 130,
    }
}

pub fn shop_key(item: ShopItem) -> String {
    match item {
        ShopItem::HullPlating => "hull_plating".to_string(),
        ShopItem::WeaponCalibration => "weapon_calibration".to_string(),
        ShopItem::ArmorWeave => "armor_weave".to_string(),
        ShopItem::OxygenTank => "oxygen_tank".to_string(),
        ShopItem::Unlock(ability) => format!("unlock:{}", ability.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_with_insufficient_gold_changes_nothing() {
        let mut manager = UpgradeManager::new();
        let mut gold = 50;
        let result = manager.purchase(UpgradeId::ChainStrike, &mut gold, 10);
        assert_eq!(
            result,
            Err(PurchaseError::InsufficientFunds { cost: 100, gold: 50 })
        );
        assert_eq!(gold, 50);
        assert_eq!(manager.levels.chain_strike, 0);
    }

    #[test]
    fn purchase_before_unlock_floor_is_locked() {
        let mut manager = UpgradeManager::new();
        let mut gold = 1_000;
        let result = manager.purchase(UpgradeId::AutoRepair, &mut gold, 2);
        assert_eq!(result, Err(PurchaseError::Locked { unlock_floor: 3 }));
        assert_eq!(gold, 1_000);
        assert_eq!(manager.levels.auto_repair, 0);
    }

    #[test]
    fn purchase_deducts_gold_and_levels_up_until_maxed() {
        let mut manager = UpgradeManager::new();
        let mut gold = 10_000;
        assert_eq!(manager.purchase(UpgradeId::CounterAttack, &mut gold, 20), Ok(1));
        assert_eq!(manager.purchase(UpgradeId::CounterAttack, &mut gold, 20), Ok(2));
        assert_eq!(manager.purchase(UpgradeId::CounterAttack, &mut gold, 20), Ok(3));
        assert_eq!(gold, 10_000 - 80 - 160 - 300);
        assert_eq!(
            manager.purchase(UpgradeId::CounterAttack, &mut gold, 20),
            Err(PurchaseError::Maxed)
        );
        assert_eq!(gold, 10_000 - 80 - 160 - 300);
    }

    #[test]
    fn synergy_tiers_do_not_stack() {
        let mut levels = UpgradeLevels::default();
        assert_eq!(synergy_multiplier(&levels), 1.0);
        levels.chain_strike = 3;
        levels.counter_attack = 3;
        assert_eq!(synergy_multiplier(&levels), 1.0);
        levels.auto_repair = 1;
        assert_eq!(synergy_multiplier(&levels), 1.1);
        levels.auto_repair = 2;
        assert_eq!(synergy_multiplier(&levels), 1.25);
        levels.auto_repair = 3;
        assert_eq!(synergy_multiplier(&levels), 1.25);
    }

    #[test]
    fn chain_window_is_bounded_by_max_chains() {
        let mut manager = UpgradeManager::with_levels(UpgradeLevels {
            chain_strike: 2,
            ..UpgradeLevels::default()
        });
        assert!(manager.try_consume_chain().is_some());
        assert!(manager.try_consume_chain().is_some());
        assert!(manager.try_consume_chain().is_none());
        assert_eq!(manager.chains_this_turn(), 2);
        manager.reset_chain_window();
        assert!(manager.try_consume_chain().is_some());
    }

    #[test]
    fn chain_window_is_closed_without_the_upgrade() {
        let mut manager = UpgradeManager::new();
        assert!(manager.try_consume_chain().is_none());
    }

    #[test]
    fn auto_repair_charges_on_interval_and_respects_cap() {
        let mut manager = UpgradeManager::with_levels(UpgradeLevels {
            auto_repair: 1,
            ..UpgradeLevels::default()
        });
        for _ in 0..24 {
            assert_eq!(manager.tick_auto_repair(0), 0);
        }
        assert_eq!(manager.tick_auto_repair(0), 1);
        for _ in 0..24 {
            manager.tick_auto_repair(1);
        }
        assert_eq!(manager.tick_auto_repair(1), 0);
    }

    #[test]
    fn shop_price_grows_with_purchases() {
        assert_eq!(shop_price(ShopItem::HullPlating, 0), 60);
        assert_eq!(shop_price(ShopItem::HullPlating, 1), 90);
        assert_eq!(shop_price(ShopItem::HullPlating, 2), 120);
    }
}
