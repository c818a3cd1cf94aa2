pub const MAX_FLOOR: u32 = 20;

pub const MAP_WIDTH: i32 = 48;
pub const MAP_HEIGHT: i32 = 28;
pub const ROOM_ATTEMPTS: u32 = 80;
pub const MAX_ROOMS: usize = 9;
pub const ROOM_MIN_SIZE: i32 = 4;
pub const ROOM_MAX_SIZE: i32 = 9;

pub const PLAYER_START_HP: i32 = 100;
pub const PLAYER_START_OXYGEN: f32 = 100.0;
pub const PLAYER_START_POWER: i32 = 50;
pub const PLAYER_START_ATTACK: i32 = 10;
pub const PLAYER_START_DEFENSE: i32 = 2;
pub const PLAYER_START_CRIT_CHANCE: f32 = 10.0;
pub const PLAYER_START_CRIT_MULTIPLIER: f32 = 1.5;
pub const PLAYER_START_EXP_TO_NEXT: i32 = 20;
pub const PLAYER_START_PISTOL_AMMO: u32 = 6;

pub const LEVEL_UP_HP: i32 = 10;
pub const LEVEL_UP_ATTACK: i32 = 2;
pub const LEVEL_UP_DEFENSE: i32 = 1;
pub const EXP_GROWTH: f32 = 1.5;

pub const PLAYER_DODGE_BASE: f32 = 10.0;
pub const PLAYER_DODGE_PER_LEVEL: f32 = 1.0;
pub const SURROUNDED_PENALTY: f32 = 0.5;
pub const LOW_HP_DODGE_FACTOR: f32 = 0.7;
pub const EVASION_MATRIX_BONUS: f32 = 8.0;
pub const MAX_DODGE_CHANCE: f32 = 40.0;
pub const CONSECUTIVE_DODGE_CAP: u32 = 2;
pub const CONSECUTIVE_DODGE_PENALTY: f32 = 0.5;

pub const OXYGEN_RECYCLER_REDUCTION: f32 = 0.65;
pub const SUFFOCATION_DAMAGE: i32 = 5;
pub const AUTO_MEDIC_FRACTION: f32 = 0.05;
pub const POWER_REGEN_PER_TURN: i32 = 1;

pub const ENERGY_SHIELD_DURATION: u32 = 3;
pub const EMP_STUN_DURATION: u32 = 2;
pub const PLASMA_NOVA_RADIUS: i32 = 2;

pub const MEDICAL_HEAL_FRACTION: f32 = 0.3;
pub const OXYGEN_SUPPLY_AMOUNT: f32 = 35.0;

pub const VISION_RADIUS: i32 = 4;
pub const CONE_RADIUS: i32 = 7;

pub const RANKING_CAPACITY: usize = 10;

/// Oxygen drained per turn before passives and transmissions are applied.
/// Flat up to deck 4, then a 0.3 step every six decks.
pub fn oxygen_cost_for_floor(floor: u32) -> f32 {
    if floor <= 4 {
        return 1.0;
    }
    let tier = (floor.saturating_sub(1) / 6) as f32;
    1.0 + tier * 0.3
}

pub fn enemy_count_for_floor(floor: u32) -> usize {
    (4 + floor as usize / 2).min(14)
}

pub fn supply_count_for_floor(floor: u32) -> usize {
    if floor <= 5 {
        return 6;
    }
    if floor <= 12 {
        return 5;
    }
    4
}
