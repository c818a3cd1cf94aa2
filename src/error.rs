use thiserror::Error;

use crate::types::{AbilityId, WeaponKind};

/// Why a purchase at the elevator terminal was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("insufficient funds: need {cost} gold, have {gold}")]
    InsufficientFunds { cost: i32, gold: i32 },

    #[error("locked until deck {unlock_floor}")]
    Locked { unlock_floor: u32 },

    #[error("already at maximum level")]
    Maxed,

    #[error("{0:?} is already unlocked")]
    AlreadyUnlocked(AbilityId),
}

/// A player command that was refused; no turn is consumed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("the run is over")]
    GameOver,

    #[error("move delta ({dx},{dy}) is not a single step")]
    InvalidDirection { dx: i32, dy: i32 },

    #[error("({x},{y}) is outside the deck")]
    OutOfBounds { x: i32, y: i32 },

    #[error("({x},{y}) is blocked")]
    Blocked { x: i32, y: i32 },

    #[error("{0:?} is locked")]
    AbilityLocked(AbilityId),

    #[error("{0:?} has no uses left on this deck")]
    AbilityExhausted(AbilityId),

    #[error("{0:?} is passive")]
    AbilityPassive(AbilityId),

    #[error("not enough power: need {needed}, have {available}")]
    InsufficientPower { needed: i32, available: i32 },

    #[error("{0:?} is already active")]
    AbilityAlreadyActive(AbilityId),

    #[error("no valid target for {0:?}")]
    NoAbilityTarget(AbilityId),

    #[error("weapon slot {0} does not exist")]
    InvalidWeaponSlot(usize),

    #[error("{0:?} is out of ammo")]
    OutOfAmmo(WeaponKind),

    #[error("no ranged weapon is selected")]
    NotTargeting,

    #[error("target ({x},{y}) is out of range")]
    OutOfRange { x: i32, y: i32 },

    #[error("target ({x},{y}) is not visible")]
    NotVisible { x: i32, y: i32 },

    #[error("no enemy at ({x},{y})")]
    EmptyTarget { x: i32, y: i32 },

    #[error("target ({x},{y}) is not on a straight line")]
    NotAligned { x: i32, y: i32 },

    #[error("the upgrade terminal is not open")]
    MenuClosed,

    #[error("purchase refused: {0}")]
    Purchase(#[from] PurchaseError),
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("save data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save data is inconsistent: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
