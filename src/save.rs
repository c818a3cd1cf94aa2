use serde::{Deserialize, Serialize};

use crate::constants::MAX_FLOOR;
use crate::entities::Player;
use crate::error::SaveError;
use crate::upgrades::UpgradeLevels;

/// Everything carried across a save: the deck itself is regenerated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    pub floor: u32,
    pub turn_count: u64,
    pub player: Player,
    pub upgrade_levels: UpgradeLevels,
}

impl SaveData {
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SaveError> {
        let data: SaveData = serde_json::from_str(text)?;
        data.validate()?;
        Ok(data)
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        if self.floor == 0 || self.floor > MAX_FLOOR {
            return Err(SaveError::Invalid(format!(
                "floor {} outside 1..={MAX_FLOOR}",
                self.floor
            )));
        }
        let player = &self.player;
        if player.max_hp <= 0 || player.max_oxygen <= 0.0 {
            return Err(SaveError::Invalid(
                "player maxima must be positive".to_string(),
            ));
        }
        if player.hp < 0 || player.hp > player.max_hp {
            return Err(SaveError::Invalid(format!(
                "hp {} outside 0..={}",
                player.hp, player.max_hp
            )));
        }
        if !(0.0..=player.max_oxygen).contains(&player.oxygen) {
            return Err(SaveError::Invalid(format!(
                "oxygen {} outside 0..={}",
                player.oxygen, player.max_oxygen
            )));
        }
        if !self.upgrade_levels.is_valid() {
            return Err(SaveError::Invalid(
                "upgrade level above maximum".to_string(),
            ));
        }
        Ok(())
    }
}
