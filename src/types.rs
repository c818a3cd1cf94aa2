use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Eight-way facing; drives the visibility cone only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    pub fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Some(Self::Up),
            (0, 1) => Some(Self::Down),
            (-1, 0) => Some(Self::Left),
            (1, 0) => Some(Self::Right),
            (-1, -1) => Some(Self::UpLeft),
            (1, -1) => Some(Self::UpRight),
            (-1, 1) => Some(Self::DownLeft),
            (1, 1) => Some(Self::DownRight),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::UpLeft => (-1, -1),
            Self::UpRight => (1, -1),
            Self::DownLeft => (-1, 1),
            Self::DownRight => (1, 1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Empty,
    Floor,
    Bulkhead,
    Player,
    Alien,
    Supply,
    OxygenSupply,
    MedicalSupply,
    WeaponSupply,
    Elevator,
    EngineRoom,
    EngineCore,
}

impl CellKind {
    pub fn glyph(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Floor => '.',
            Self::Bulkhead => '#',
            Self::Player => '@',
            Self::Alien => 'a',
            Self::Supply => '$',
            Self::OxygenSupply => 'o',
            Self::MedicalSupply => '+',
            Self::WeaponSupply => 'w',
            Self::Elevator => '>',
            Self::EngineRoom => '=',
            Self::EngineCore => '*',
        }
    }

    pub fn is_supply(self) -> bool {
        matches!(
            self,
            Self::Supply | Self::OxygenSupply | Self::MedicalSupply | Self::WeaponSupply
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyType {
    Basic,
    Crawler,
    Drone,
    Brute,
    Stalker,
    Phantom,
    Psychic,
    Spitter,
    Leech,
    Sentinel,
    Swarmer,
    Juggernaut,
    Overseer,
}

impl EnemyType {
    pub const ALL: [EnemyType; 13] = [
        EnemyType::Basic,
        EnemyType::Crawler,
        EnemyType::Drone,
        EnemyType::Brute,
        EnemyType::Stalker,
        EnemyType::Phantom,
        EnemyType::Psychic,
        EnemyType::Spitter,
        EnemyType::Leech,
        EnemyType::Sentinel,
        EnemyType::Swarmer,
        EnemyType::Juggernaut,
        EnemyType::Overseer,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyKind {
    Supply,
    Oxygen,
    Medical,
    Weapon,
}

impl SupplyKind {
    pub fn cell(self) -> CellKind {
        match self {
            Self::Supply => CellKind::Supply,
            Self::Oxygen => CellKind::OxygenSupply,
            Self::Medical => CellKind::MedicalSupply,
            Self::Weapon => CellKind::WeaponSupply,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityId {
    EnergyShield,
    EmpBurst,
    PlasmaNova,
    BreachCharge,
    OxygenRecycler,
    AutoMedic,
    CombatAwareness,
    Reflexes,
    EvasionMatrix,
}

impl AbilityId {
    pub const ALL: [AbilityId; 9] = [
        AbilityId::EnergyShield,
        AbilityId::EmpBurst,
        AbilityId::PlasmaNova,
        AbilityId::BreachCharge,
        AbilityId::OxygenRecycler,
        AbilityId::AutoMedic,
        AbilityId::CombatAwareness,
        AbilityId::Reflexes,
        AbilityId::EvasionMatrix,
    ];

    pub fn is_passive(self) -> bool {
        matches!(
            self,
            Self::OxygenRecycler
                | Self::AutoMedic
                | Self::CombatAwareness
                | Self::Reflexes
                | Self::EvasionMatrix
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnergyShield => "energy_shield",
            Self::EmpBurst => "emp_burst",
            Self::PlasmaNova => "plasma_nova",
            Self::BreachCharge => "breach_charge",
            Self::OxygenRecycler => "oxygen_recycler",
            Self::AutoMedic => "auto_medic",
            Self::CombatAwareness => "combat_awareness",
            Self::Reflexes => "reflexes",
            Self::EvasionMatrix => "evasion_matrix",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "energy_shield" => Some(Self::EnergyShield),
            "emp_burst" => Some(Self::EmpBurst),
            "plasma_nova" => Some(Self::PlasmaNova),
            "breach_charge" => Some(Self::BreachCharge),
            "oxygen_recycler" => Some(Self::OxygenRecycler),
            "auto_medic" => Some(Self::AutoMedic),
            "combat_awareness" => Some(Self::CombatAwareness),
            "reflexes" => Some(Self::Reflexes),
            "evasion_matrix" => Some(Self::EvasionMatrix),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeId {
    ChainStrike,
    CounterAttack,
    AutoRepair,
}

impl UpgradeId {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "chain_strike" => Some(Self::ChainStrike),
            "counter_attack" => Some(Self::CounterAttack),
            "auto_repair" => Some(Self::AutoRepair),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopItem {
    HullPlating,
    WeaponCalibration,
    ArmorWeave,
    OxygenTank,
    Unlock(AbilityId),
}

impl ShopItem {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hull_plating" => Some(Self::HullPlating),
            "weapon_calibration" => Some(Self::WeaponCalibration),
            "armor_weave" => Some(Self::ArmorWeave),
            "oxygen_tank" => Some(Self::OxygenTank),
            other => other
                .strip_prefix("unlock:")
                .and_then(AbilityId::parse)
                .map(Self::Unlock),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    Pistol,
    Railgun,
    Grenade,
}

impl WeaponKind {
    pub const SLOTS: [WeaponKind; 3] = [WeaponKind::Pistol, WeaponKind::Railgun, WeaponKind::Grenade];

    pub fn from_slot(slot: usize) -> Option<Self> {
        Self::SLOTS.get(slot).copied()
    }

    pub fn range(self) -> i32 {
        match self {
            Self::Pistol => 6,
            Self::Railgun => 8,
            Self::Grenade => 5,
        }
    }

    pub fn power_bonus(self) -> i32 {
        match self {
            Self::Pistol => 0,
            Self::Railgun => 4,
            Self::Grenade => -2,
        }
    }
}

/// Discrete player input accepted by the turn orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Move { dx: i32, dy: i32 },
    Wait,
    UseAbility { ability: AbilityId },
    SelectRangedWeapon { slot: usize },
    RangedAttack { x: i32, y: i32 },
    ConfirmFloorTransition,
    CancelTargeting,
    PurchaseUpgrade { upgrade: UpgradeId },
    PurchaseShopItem { item: ShopItem },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    /// A full turn ran: enemy phase and status tick included.
    TurnConsumed,
    /// A chain-strike granted another action before the enemy phase.
    ExtraActionGranted,
    /// Accepted without advancing the turn (menus, targeting, purchases).
    NoTurn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    PlayerActing,
    ExtraAction,
    EnemyPhase,
    StatusTick,
    FloorCheck,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Victory,
    Killed,
    Suffocated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    Player,
    Enemy { id: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldSource {
    Charge,
    Active,
}

/// Semantic events for the audio/presentation collaborators.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    Attack {
        source: Actor,
        target: Actor,
        damage: i32,
    },
    Critical {
        source: Actor,
        target: Actor,
        damage: i32,
    },
    Dodge {
        defender: Actor,
        chance: f32,
        roll: f32,
    },
    Kill {
        #[serde(rename = "enemyId")]
        enemy_id: u32,
        #[serde(rename = "enemyType")]
        enemy_type: EnemyType,
        exp: i32,
        gold: i32,
    },
    LevelUp {
        level: i32,
    },
    ShieldBlock {
        source: ShieldSource,
    },
    ShieldCharged {
        shields: u32,
    },
    FloorChange {
        floor: u32,
    },
    GameOver {
        reason: GameOverReason,
    },
    Suffocation {
        damage: i32,
    },
    OxygenDrained {
        amount: f32,
    },
    Pickup {
        kind: SupplyKind,
        amount: i32,
    },
    ChainStrike {
        #[serde(rename = "bonusDamage")]
        bonus_damage: i32,
        chains: u32,
    },
    CounterAttack {
        #[serde(rename = "enemyId")]
        enemy_id: u32,
        damage: i32,
        critical: bool,
    },
    AbilityUsed {
        ability: AbilityId,
    },
    EnemyStunned {
        #[serde(rename = "enemyId")]
        enemy_id: u32,
        turns: u32,
    },
    BulkheadBreached {
        x: i32,
        y: i32,
    },
    UpgradePurchased {
        upgrade: UpgradeId,
        level: u8,
    },
    ItemPurchased {
        item: ShopItem,
    },
    UpgradeMenuOpened,
    Transmission {
        trigger: String,
        message: String,
    },
    Rejected {
        reason: String,
    },
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityView {
    pub id: AbilityId,
    pub unlocked: bool,
    pub passive: bool,
    pub uses: u32,
    pub max_uses: u32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
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
    pub shields: u32,
    pub has_extra_action: bool,
    pub chain_bonus_damage: i32,
    pub ammo: [u32; 3],
    pub kills: u32,
    pub abilities: Vec<AbilityView>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyView {
    pub id: u32,
    #[serde(rename = "type")]
    pub enemy_type: EnemyType,
    pub x: i32,
    pub y: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub level: i32,
    pub stunned: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyView {
    pub id: u32,
    pub kind: SupplyKind,
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub floor: u32,
    pub turn: u64,
    pub phase: TurnPhase,
    pub game_over: bool,
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
    pub visible: Vec<Vec<bool>>,
    pub explored: Vec<Vec<bool>>,
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub supplies: Vec<SupplyView>,
    pub upgrade_menu_open: bool,
    pub targeting: Option<WeaponKind>,
    pub events: Vec<GameEvent>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub reason: Option<GameOverReason>,
    pub floor: u32,
    pub turns: u64,
    pub level: i32,
    pub gold: i32,
    pub kills: u32,
    pub score: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trips_through_delta() {
        for dx in -1..=1 {
            for dy in -1..=1 {
                match Direction::from_delta(dx, dy) {
                    Some(dir) => assert_eq!(dir.delta(), (dx, dy)),
                    None => assert_eq!((dx, dy), (0, 0)),
                }
            }
        }
    }

    #[test]
    fn shop_item_parses_unlock_prefix() {
        assert_eq!(
            ShopItem::parse("unlock:reflexes"),
            Some(ShopItem::Unlock(AbilityId::Reflexes))
        );
        assert_eq!(ShopItem::parse("unlock:nothing"), None);
        assert_eq!(ShopItem::parse("armor_weave"), Some(ShopItem::ArmorWeave));
    }

    #[test]
    fn command_deserializes_from_tagged_json() {
        let command: Command =
            serde_json::from_str(r#"{"type":"move","dx":1,"dy":-1}"#).expect("parse move");
        assert_eq!(command, Command::Move { dx: 1, dy: -1 });
    }
}
