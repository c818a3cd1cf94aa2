//! Runtime balance configuration.
//!
//! [`GameConfig`] mirrors the tuning values in [`crate::constants`], which stay
//! the authoritative defaults. A TOML file may override any subset of keys;
//! missing keys fall back to the compiled defaults.
//!
//! ```toml
//! [dodge]
//! max_chance = 35.0
//!
//! [resources]
//! suffocation_damage = 8
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::constants::*;
use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DodgeConfig {
    pub player_base: f32,
    pub player_per_level: f32,
    pub surrounded_penalty: f32,
    pub low_hp_factor: f32,
    pub evasion_bonus: f32,
    pub max_chance: f32,
    pub consecutive_cap: u32,
    pub consecutive_penalty: f32,
}

impl Default for DodgeConfig {
    fn default() -> Self {
        Self {
            player_base: PLAYER_DODGE_BASE,
            player_per_level: PLAYER_DODGE_PER_LEVEL,
            surrounded_penalty: SURROUNDED_PENALTY,
            low_hp_factor: LOW_HP_DODGE_FACTOR,
            evasion_bonus: EVASION_MATRIX_BONUS,
            max_chance: MAX_DODGE_CHANCE,
            consecutive_cap: CONSECUTIVE_DODGE_CAP,
            consecutive_penalty: CONSECUTIVE_DODGE_PENALTY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub recycler_reduction: f32,
    pub suffocation_damage: i32,
    pub auto_medic_fraction: f32,
    pub power_regen: i32,
    pub medical_heal_fraction: f32,
    pub oxygen_supply_amount: f32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            recycler_reduction: OXYGEN_RECYCLER_REDUCTION,
            suffocation_damage: SUFFOCATION_DAMAGE,
            auto_medic_fraction: AUTO_MEDIC_FRACTION,
            power_regen: POWER_REGEN_PER_TURN,
            medical_heal_fraction: MEDICAL_HEAL_FRACTION,
            oxygen_supply_amount: OXYGEN_SUPPLY_AMOUNT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: i32,
    pub height: i32,
    pub room_attempts: u32,
    pub max_rooms: usize,
    pub room_min_size: i32,
    pub room_max_size: i32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
            room_attempts: ROOM_ATTEMPTS,
            max_rooms: MAX_ROOMS,
            room_min_size: ROOM_MIN_SIZE,
            room_max_size: ROOM_MAX_SIZE,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub dodge: DodgeConfig,
    pub resources: ResourceConfig,
    pub map: MapConfig,
}

impl GameConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.map.width < 16 || self.map.height < 12 {
            return Err(ConfigError::Invalid(format!(
                "map must be at least 16x12, got {}x{}",
                self.map.width, self.map.height
            )));
        }
        if self.map.room_min_size < 3 || self.map.room_min_size > self.map.room_max_size {
            return Err(ConfigError::Invalid(format!(
                "room size range {}..={} is invalid",
                self.map.room_min_size, self.map.room_max_size
            )));
        }
        if !(0.0..=100.0).contains(&self.dodge.max_chance) {
            return Err(ConfigError::Invalid(format!(
                "dodge.max_chance {} outside 0..=100",
                self.dodge.max_chance
            )));
        }
        if self.resources.suffocation_damage < 0 {
            return Err(ConfigError::Invalid(
                "resources.suffocation_damage must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
