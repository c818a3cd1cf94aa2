use tracing::{debug, info};

use crate::config::GameConfig;
use crate::constants::{
    enemy_count_for_floor, oxygen_cost_for_floor, supply_count_for_floor, EMP_STUN_DURATION,
    ENERGY_SHIELD_DURATION, MAX_FLOOR, PLASMA_NOVA_RADIUS,
};
use crate::dodge::{DodgeContext, DodgeResolver, DodgeTarget};
use crate::entities::{Enemy, Player, Supply};
use crate::error::{CommandError, PurchaseError, SaveError};
use crate::progression::{apply_level_ups, enemy_level, pick_enemy_type, scale_enemy};
use crate::rng::Rng;
use crate::save::SaveData;
use crate::triggers::{TriggerContext, TriggerEngine};
use crate::types::{
    AbilityId, Actor, CellKind, Command, CommandOutcome, Direction, EnemyType, EnemyView,
    GameEvent, GameOverReason, GameSummary, PlayerView, ShieldSource, ShopItem, Snapshot,
    SupplyKind, SupplyView, TurnPhase, UpgradeId, Vec2, WeaponKind,
};
use crate::upgrades::{shop_key, shop_price, UpgradeManager};
use crate::world::{compute_visibility, generate_floor, is_walkable_terrain, Grid};

mod actions;
mod combat;
mod enemy_phase;
mod spawn_system;
mod status_tick;
#[cfg(test)]
mod test_support;
mod utils;

pub use self::combat::{AttackReport, DamageOutcome};
use self::utils::{chebyshev, line_step, manhattan, pick_supply_kind};

const VICTORY_BONUS: i64 = 1_000;

#[derive(Clone, Debug, Default)]
pub struct GameEngineOptions {
    pub seed: u32,
    pub config: GameConfig,
}

/// How an accepted player action resolved, before the rest of the turn runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PlayerAction {
    Acted,
    OpenedMenu,
    ReachedCore,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: GameConfig,

    rng: Rng,
    terrain: Grid,
    grid: Grid,
    exit: Vec2,
    floor: u32,
    turn_count: u64,
    phase: TurnPhase,
    player: Player,
    enemies: Vec<Enemy>,
    supplies: Vec<Supply>,
    upgrades: UpgradeManager,
    dodge: DodgeResolver,
    triggers: TriggerEngine,
    events: Vec<GameEvent>,
    visible: Vec<Vec<bool>>,
    explored: Vec<Vec<bool>>,
    menu_open: bool,
    targeting: Option<WeaponKind>,
    end_reason: Option<GameOverReason>,
    next_id_counter: u32,
}

impl GameEngine {
    pub fn new(options: GameEngineOptions) -> Self {
        let mut engine = Self::blank(options);
        engine.load_floor(1);
        engine
    }

    /// Rebuilds a run from a save; the deck layout is regenerated.
    pub fn from_save(data: SaveData, options: GameEngineOptions) -> Result<Self, SaveError> {
        data.validate()?;
        let mut engine = Self::blank(options);
        engine.turn_count = data.turn_count;
        engine.upgrades = UpgradeManager::with_levels(data.upgrade_levels);
        engine.player = data.player;
        engine.player.has_extra_action = false;
        engine.player.chain_bonus_damage = 0;
        engine.load_floor(data.floor);
        if !engine.player.is_alive() {
            engine.finish_run(GameOverReason::Killed);
        }
        Ok(engine)
    }

    fn blank(options: GameEngineOptions) -> Self {
        let map = &options.config.map;
        Self {
            rng: Rng::new(options.seed),
            terrain: Grid::new(map.width, map.height, CellKind::Bulkhead),
            grid: Grid::new(map.width, map.height, CellKind::Bulkhead),
            exit: Vec2::new(0, 0),
            floor: 1,
            turn_count: 0,
            phase: TurnPhase::Idle,
            player: Player::new(Vec2::new(0, 0)),
            enemies: Vec::new(),
            supplies: Vec::new(),
            upgrades: UpgradeManager::new(),
            dodge: DodgeResolver::new(),
            triggers: TriggerEngine::new(),
            events: Vec::new(),
            visible: Vec::new(),
            explored: Vec::new(),
            menu_open: false,
            targeting: None,
            end_reason: None,
            next_id_counter: 0,
            config: options.config,
        }
    }

    pub fn to_save(&self) -> SaveData {
        SaveData {
            floor: self.floor,
            turn_count: self.turn_count,
            player: self.player.clone(),
            upgrade_levels: self.upgrades.levels,
        }
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn supplies(&self) -> &[Supply] {
        &self.supplies
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn exit(&self) -> Vec2 {
        self.exit
    }

    pub fn upgrades(&self) -> &UpgradeManager {
        &self.upgrades
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn is_ended(&self) -> bool {
        self.end_reason.is_some()
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    pub fn is_visible(&self, pos: Vec2) -> bool {
        self.visible
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Applies one player command. A rejection leaves the state untouched
    /// apart from a `Rejected` event.
    pub fn handle_command(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        let result = self.dispatch(command);
        match &result {
            Ok(outcome) => debug!(?command, ?outcome, turn = self.turn_count, "command applied"),
            Err(error) => {
                debug!(?command, %error, "command rejected");
                self.events.push(GameEvent::Rejected {
                    reason: error.to_string(),
                });
            }
        }
        result
    }

    fn dispatch(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        if self.end_reason.is_some() {
            return Err(CommandError::GameOver);
        }

        match command {
            Command::CancelTargeting => {
                if self.targeting.take().is_none() {
                    return Err(CommandError::NotTargeting);
                }
                return Ok(CommandOutcome::NoTurn);
            }
            Command::SelectRangedWeapon { slot } => {
                self.select_ranged_weapon(slot)?;
                return Ok(CommandOutcome::NoTurn);
            }
            Command::PurchaseUpgrade { upgrade } => {
                self.purchase_upgrade(upgrade)?;
                return Ok(CommandOutcome::NoTurn);
            }
            Command::PurchaseShopItem { item } => {
                self.purchase_shop_item(item)?;
                return Ok(CommandOutcome::NoTurn);
            }
            Command::ConfirmFloorTransition => {
                if !self.menu_open || self.floor >= MAX_FLOOR {
                    return Err(CommandError::MenuClosed);
                }
                if std::mem::take(&mut self.player.has_extra_action) {
                    self.finish_turn();
                    if self.end_reason.is_some() {
                        return Ok(CommandOutcome::TurnConsumed);
                    }
                    self.advance_floor();
                    return Ok(CommandOutcome::TurnConsumed);
                }
                self.advance_floor();
                return Ok(CommandOutcome::NoTurn);
            }
            Command::Move { .. }
            | Command::Wait
            | Command::UseAbility { .. }
            | Command::RangedAttack { .. } => {}
        }

        let was_extra = std::mem::take(&mut self.player.has_extra_action);
        self.phase = if was_extra {
            TurnPhase::ExtraAction
        } else {
            TurnPhase::PlayerActing
        };

        let action = match command {
            Command::Move { dx, dy } => self.player_move(dx, dy),
            Command::Wait => Ok(PlayerAction::Acted),
            Command::UseAbility { ability } => self.use_ability(ability),
            Command::RangedAttack { x, y } => self.ranged_attack(Vec2::new(x, y)),
            _ => Ok(PlayerAction::Acted),
        };
        let action = match action {
            Ok(action) => action,
            Err(error) => {
                self.player.has_extra_action = was_extra;
                self.phase = if was_extra {
                    TurnPhase::ExtraAction
                } else {
                    TurnPhase::Idle
                };
                return Err(error);
            }
        };

        match action {
            PlayerAction::OpenedMenu if was_extra => {
                // The pending extra action is forfeited; the kill turn still
                // owes its enemy phase and status tick.
                self.finish_turn();
                Ok(CommandOutcome::TurnConsumed)
            }
            PlayerAction::OpenedMenu => {
                self.phase = TurnPhase::Idle;
                self.update_visibility();
                Ok(CommandOutcome::NoTurn)
            }
            PlayerAction::ReachedCore => {
                self.menu_open = false;
                self.turn_count += 1;
                self.finish_run(GameOverReason::Victory);
                self.update_visibility();
                Ok(CommandOutcome::TurnConsumed)
            }
            PlayerAction::Acted => {
                self.menu_open = false;
                if self.player.has_extra_action {
                    self.phase = TurnPhase::ExtraAction;
                    self.update_visibility();
                    return Ok(CommandOutcome::ExtraActionGranted);
                }
                self.finish_turn();
                Ok(CommandOutcome::TurnConsumed)
            }
        }
    }

    fn finish_turn(&mut self) {
        self.phase = TurnPhase::EnemyPhase;
        self.run_enemy_phase();
        let alive_after_enemies = self.player.is_alive();

        self.phase = TurnPhase::StatusTick;
        self.run_status_tick();
        self.turn_count += 1;

        let context = TriggerContext {
            floor: self.floor,
            turn_count: self.turn_count,
            oxygen_ratio: self.player.oxygen_ratio(),
            hp_ratio: self.player.hp_ratio(),
            kills: self.player.kills,
        };
        let transmissions = self.triggers.evaluate(&context);
        self.events.extend(transmissions);

        self.phase = TurnPhase::FloorCheck;
        if !self.player.is_alive() {
            let reason = if alive_after_enemies {
                GameOverReason::Suffocated
            } else {
                GameOverReason::Killed
            };
            self.finish_run(reason);
        } else {
            self.phase = TurnPhase::Idle;
        }
        self.update_visibility();
    }

    fn finish_run(&mut self, reason: GameOverReason) {
        if self.end_reason.is_some() {
            return;
        }
        self.end_reason = Some(reason);
        self.phase = TurnPhase::GameOver;
        self.targeting = None;
        self.menu_open = false;
        self.events.push(GameEvent::GameOver { reason });
        info!(
            ?reason,
            floor = self.floor,
            turn = self.turn_count,
            level = self.player.level,
            "run ended"
        );
    }

    fn advance_floor(&mut self) {
        let next = self.floor + 1;
        self.menu_open = false;
        self.targeting = None;
        self.player.refill_ability_uses();
        self.load_floor(next);
        let charges = self.upgrades.floor_change_charges(self.player.shields);
        if charges > 0 {
            self.player.shields += charges;
            self.events.push(GameEvent::ShieldCharged {
                shields: self.player.shields,
            });
        }
        self.events.push(GameEvent::FloorChange { floor: next });
        info!(floor = next, turn = self.turn_count, "descended to next deck");
    }

    fn load_floor(&mut self, floor: u32) {
        let generated = generate_floor(floor, &self.config.map, &mut self.rng);
        self.floor = floor;
        self.terrain = generated.grid.clone();
        self.grid = generated.grid;
        self.exit = generated.exit;
        self.player.pos = generated.player_spawn;
        self.player.has_extra_action = false;
        self.player.chain_bonus_damage = 0;
        self.enemies.clear();
        self.supplies.clear();
        self.dodge.clear();
        self.phase = TurnPhase::Idle;
        self.explored = vec![vec![false; self.grid.width as usize]; self.grid.height as usize];

        self.populate_floor(&generated.open_cells);
        self.refresh_cell(self.player.pos);
        self.update_visibility();
    }

    fn update_visibility(&mut self) {
        self.visible = compute_visibility(&self.terrain, self.player.pos, self.player.facing);
        for (y, row) in self.visible.iter().enumerate() {
            for (x, seen) in row.iter().enumerate() {
                if *seen {
                    self.explored[y][x] = true;
                }
            }
        }
    }

    /// Restamps one cell from the entity layers, falling back to terrain.
    fn refresh_cell(&mut self, pos: Vec2) {
        let kind = if self.player.pos == pos {
            CellKind::Player
        } else if self.enemy_at(pos).is_some() {
            CellKind::Alien
        } else if let Some(supply) = self
            .supplies
            .iter()
            .find(|supply| !supply.taken && supply.pos == pos)
        {
            supply.kind.cell()
        } else {
            self.terrain.at(pos).unwrap_or(CellKind::Empty)
        };
        self.grid.set(pos, kind);
    }

    fn enemy_at(&self, pos: Vec2) -> Option<usize> {
        self.enemies
            .iter()
            .position(|enemy| enemy.alive && enemy.pos == pos)
    }

    fn adjacent_enemy_count(&self, pos: Vec2) -> usize {
        self.enemies
            .iter()
            .filter(|enemy| enemy.alive && chebyshev(enemy.pos, pos) == 1)
            .count()
    }

    fn make_id(&mut self) -> u32 {
        self.next_id_counter += 1;
        self.next_id_counter
    }

    fn purchase_upgrade(&mut self, upgrade: UpgradeId) -> Result<(), CommandError> {
        if !self.menu_open {
            return Err(CommandError::MenuClosed);
        }
        let level = self
            .upgrades
            .purchase(upgrade, &mut self.player.gold, self.floor)?;
        self.events
            .push(GameEvent::UpgradePurchased { upgrade, level });
        info!(?upgrade, level, gold = self.player.gold, "upgrade purchased");
        Ok(())
    }

    fn purchase_shop_item(&mut self, item: ShopItem) -> Result<(), CommandError> {
        if !self.menu_open {
            return Err(CommandError::MenuClosed);
        }
        if let ShopItem::Unlock(ability) = item {
            if self.player.is_unlocked(ability) {
                return Err(PurchaseError::AlreadyUnlocked(ability).into());
            }
        }
        let key = shop_key(item);
        let times_bought = self.player.shop_purchases.get(&key).copied().unwrap_or(0);
        let cost = shop_price(item, times_bought);
        if self.player.gold < cost {
            return Err(PurchaseError::InsufficientFunds {
                cost,
                gold: self.player.gold,
            }
            .into());
        }

        self.player.gold -= cost;
        let player = &mut self.player;
        match item {
            ShopItem::HullPlating => {
                player.max_hp += 15;
                player.hp += 15;
            }
            ShopItem::WeaponCalibration => {
                player.attack += 2;
                player.critical_chance += 2.0;
            }
            ShopItem::ArmorWeave => player.defense += 1,
            ShopItem::OxygenTank => {
                player.max_oxygen += 20.0;
                player.oxygen += 20.0;
            }
            ShopItem::Unlock(ability) => player.unlock(ability),
        }
        *player.shop_purchases.entry(key).or_insert(0) += 1;
        self.events.push(GameEvent::ItemPurchased { item });
        Ok(())
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let player = &self.player;
        let snapshot = Snapshot {
            floor: self.floor,
            turn: self.turn_count,
            phase: self.phase,
            game_over: self.end_reason.is_some(),
            width: self.grid.width,
            height: self.grid.height,
            tiles: self.grid.to_tiles(),
            visible: self.visible.clone(),
            explored: self.explored.clone(),
            player: PlayerView {
                x: player.pos.x,
                y: player.pos.y,
                facing: player.facing,
                hp: player.hp,
                max_hp: player.max_hp,
                oxygen: player.oxygen,
                max_oxygen: player.max_oxygen,
                power: player.power,
                max_power: player.max_power,
                attack: player.attack,
                defense: player.defense,
                level: player.level,
                exp: player.exp,
                exp_to_next: player.exp_to_next,
                gold: player.gold,
                critical_chance: player.critical_chance,
                critical_multiplier: player.critical_multiplier,
                shield_active: player.shield_active,
                shield_duration: player.shield_duration,
                shields: player.shields,
                has_extra_action: player.has_extra_action,
                chain_bonus_damage: player.chain_bonus_damage,
                ammo: player.ammo,
                kills: player.kills,
                abilities: player.ability_views(),
            },
            enemies: self
                .enemies
                .iter()
                .filter(|enemy| enemy.alive && self.is_visible(enemy.pos))
                .map(|enemy| EnemyView {
                    id: enemy.id,
                    enemy_type: enemy.enemy_type,
                    x: enemy.pos.x,
                    y: enemy.pos.y,
                    hp: enemy.hp,
                    max_hp: enemy.max_hp,
                    level: enemy.level,
                    stunned: enemy.stunned,
                })
                .collect(),
            supplies: self
                .supplies
                .iter()
                .filter(|supply| {
                    !supply.taken
                        && self
                            .explored
                            .get(supply.pos.y as usize)
                            .and_then(|row| row.get(supply.pos.x as usize))
                            .copied()
                            .unwrap_or(false)
                })
                .map(|supply| SupplyView {
                    id: supply.id,
                    kind: supply.kind,
                    x: supply.pos.x,
                    y: supply.pos.y,
                })
                .collect(),
            upgrade_menu_open: self.menu_open,
            targeting: self.targeting,
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> GameSummary {
        let mut score = self.player.gold.max(0) as i64
            + self.floor as i64 * 100
            + self.player.level as i64 * 50
            + self.player.kills as i64 * 10;
        if self.end_reason == Some(GameOverReason::Victory) {
            score += VICTORY_BONUS;
        }
        GameSummary {
            reason: self.end_reason,
            floor: self.floor,
            turns: self.turn_count,
            level: self.player.level,
            gold: self.player.gold,
            kills: self.player.kills,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{arena_engine, place_enemy, place_supply, ARENA_CENTER};
    use super::*;

    #[test]
    fn same_seed_produces_same_run() {
        let mut a = GameEngine::new(GameEngineOptions {
            seed: 424_242,
            ..GameEngineOptions::default()
        });
        let mut b = GameEngine::new(GameEngineOptions {
            seed: 424_242,
            ..GameEngineOptions::default()
        });
        assert_eq!(a.grid.to_tiles(), b.grid.to_tiles());

        let moves = [(1, 0), (0, 1), (-1, 0), (0, -1), (1, 1), (-1, -1)];
        for step in 0..120 {
            let (dx, dy) = moves[step % moves.len()];
            let ra = a.handle_command(Command::Move { dx, dy });
            let rb = b.handle_command(Command::Move { dx, dy });
            assert_eq!(ra, rb);
            let sa = a.build_snapshot(true);
            let sb = b.build_snapshot(true);
            assert_eq!(sa.tiles, sb.tiles);
            assert_eq!(sa.player.hp, sb.player.hp);
            assert_eq!(sa.player.oxygen.to_bits(), sb.player.oxygen.to_bits());
            assert_eq!(sa.turn, sb.turn);
            if a.is_ended() {
                break;
            }
        }
    }

    #[test]
    fn new_run_has_exactly_one_player_cell() {
        for seed in 0..20u32 {
            let engine = GameEngine::new(GameEngineOptions {
                seed,
                ..GameEngineOptions::default()
            });
            assert_eq!(engine.grid.count(CellKind::Player), 1);
            let alive = engine.enemies.iter().filter(|enemy| enemy.alive).count();
            assert_eq!(engine.grid.count(CellKind::Alien), alive);
        }
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = arena_engine();
        engine.events.push(GameEvent::UpgradeMenuOpened);

        let kept = engine.build_snapshot(false);
        assert!(kept.events.is_empty());
        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert_eq!(first.events.len(), 1);
        assert_eq!(second.events.len(), 0);
    }

    #[test]
    fn rejected_move_into_bulkhead_does_not_advance_the_turn() {
        let mut engine = arena_engine();
        let enemy = place_enemy(&mut engine, EnemyType::Stalker, Vec2::new(8, 4), 30, 5, 0);
        engine.player.pos = Vec2::new(1, 1);
        engine.refresh_cell(Vec2::new(5, 4));
        engine.refresh_cell(Vec2::new(1, 1));
        let enemy_pos = engine.enemies[enemy].pos;
        let oxygen = engine.player.oxygen;

        let result = engine.handle_command(Command::Move { dx: -1, dy: 0 });
        assert_eq!(result, Err(CommandError::Blocked { x: 0, y: 1 }));
        assert_eq!(engine.turn_count, 0);
        assert_eq!(engine.enemies[enemy].pos, enemy_pos);
        assert_eq!(engine.player.oxygen, oxygen);
        let events = engine.build_snapshot(true).events;
        assert!(matches!(events.as_slice(), [GameEvent::Rejected { .. }]));
    }

    #[test]
    fn invalid_move_delta_is_rejected() {
        let mut engine = arena_engine();
        assert_eq!(
            engine.handle_command(Command::Move { dx: 2, dy: 0 }),
            Err(CommandError::InvalidDirection { dx: 2, dy: 0 })
        );
        assert_eq!(
            engine.handle_command(Command::Move { dx: 0, dy: 0 }),
            Err(CommandError::InvalidDirection { dx: 0, dy: 0 })
        );
        assert_eq!(engine.turn_count, 0);
    }

    #[test]
    fn accepted_move_runs_one_full_turn() {
        let mut engine = arena_engine();
        let start = engine.player.pos;
        let result = engine.handle_command(Command::Move { dx: 1, dy: 0 });
        assert_eq!(result, Ok(CommandOutcome::TurnConsumed));
        assert_eq!(engine.turn_count, 1);
        assert_eq!(engine.player.pos, start.offset(1, 0));
        assert_eq!(engine.player.facing, Direction::Right);
        assert_eq!(engine.grid.at(start), Some(CellKind::Floor));
        assert_eq!(engine.grid.at(engine.player.pos), Some(CellKind::Player));
        assert_eq!(engine.grid.count(CellKind::Player), 1);
        assert_eq!(engine.phase, TurnPhase::Idle);
        assert!(engine.player.oxygen < engine.player.max_oxygen);
    }

    #[test]
    fn elevator_during_extra_action_settles_the_turn_first() {
        let mut engine = arena_engine();
        engine.player.critical_chance = 0.0;
        engine.config.dodge.max_chance = 0.0;
        engine.upgrades.levels.chain_strike = 1;
        let weak = place_enemy(&mut engine, EnemyType::Brute, ARENA_CENTER.offset(1, 0), 40, 1, 0);
        engine.enemies[weak].hp = 5;
        let elevator = ARENA_CENTER.offset(0, 1);
        engine.terrain.set(elevator, CellKind::Elevator);
        engine.refresh_cell(elevator);
        let oxygen_before = engine.player.oxygen;

        assert_eq!(
            engine.handle_command(Command::Move { dx: 1, dy: 0 }),
            Ok(CommandOutcome::ExtraActionGranted)
        );
        assert_eq!(
            engine.handle_command(Command::Move { dx: 0, dy: 1 }),
            Ok(CommandOutcome::TurnConsumed)
        );
        assert!(engine.menu_open);
        assert!(!engine.player.has_extra_action);
        assert_eq!(engine.turn_count, 1);
        assert!(engine.player.oxygen < oxygen_before);

        assert_eq!(
            engine.handle_command(Command::ConfirmFloorTransition),
            Ok(CommandOutcome::NoTurn)
        );
        assert_eq!(engine.floor, 2);
        assert_eq!(engine.turn_count, 1);
    }

    #[test]
    fn confirming_with_a_pending_extra_action_runs_the_turn() {
        let mut engine = arena_engine();
        engine.menu_open = true;
        engine.player.has_extra_action = true;
        engine.phase = TurnPhase::ExtraAction;

        assert_eq!(
            engine.handle_command(Command::ConfirmFloorTransition),
            Ok(CommandOutcome::TurnConsumed)
        );
        assert_eq!(engine.turn_count, 1);
        assert_eq!(engine.floor, 2);
        assert!(!engine.player.has_extra_action);
    }

    #[test]
    fn confirming_does_not_advance_a_player_killed_by_the_settled_turn() {
        let mut engine = arena_engine();
        engine.menu_open = true;
        engine.player.has_extra_action = true;
        engine.player.oxygen = 0.0;
        engine.player.hp = 1;

        assert_eq!(
            engine.handle_command(Command::ConfirmFloorTransition),
            Ok(CommandOutcome::TurnConsumed)
        );
        assert_eq!(engine.floor, 1);
        assert!(engine.is_ended());
        assert!(!engine.menu_open);
    }

    #[test]
    fn elevator_opens_menu_without_consuming_a_turn() {
        let mut engine = arena_engine();
        let elevator = engine.player.pos.offset(1, 0);
        engine.terrain.set(elevator, CellKind::Elevator);
        engine.refresh_cell(elevator);
        let start = engine.player.pos;

        let result = engine.handle_command(Command::Move { dx: 1, dy: 0 });
        assert_eq!(result, Ok(CommandOutcome::NoTurn));
        assert!(engine.menu_open);
        assert_eq!(engine.player.pos, start);
        assert_eq!(engine.turn_count, 0);

        engine.player.gold = 500;
        engine.floor = 3;
        assert_eq!(
            engine.handle_command(Command::PurchaseUpgrade {
                upgrade: UpgradeId::ChainStrike
            }),
            Ok(CommandOutcome::NoTurn)
        );
        assert_eq!(engine.player.gold, 400);
        assert_eq!(engine.upgrades.levels.chain_strike, 1);

        assert_eq!(
            engine.handle_command(Command::ConfirmFloorTransition),
            Ok(CommandOutcome::NoTurn)
        );
        assert_eq!(engine.floor, 4);
        assert!(!engine.menu_open);
        assert_eq!(engine.grid.count(CellKind::Player), 1);
        assert_eq!(engine.upgrades.levels.chain_strike, 1);
    }

    #[test]
    fn purchases_need_the_menu_and_waiting_closes_it() {
        let mut engine = arena_engine();
        engine.player.gold = 1_000;
        assert_eq!(
            engine.handle_command(Command::PurchaseUpgrade {
                upgrade: UpgradeId::CounterAttack
            }),
            Err(CommandError::MenuClosed)
        );
        assert_eq!(
            engine.handle_command(Command::ConfirmFloorTransition),
            Err(CommandError::MenuClosed)
        );
        engine.menu_open = true;
        engine
            .handle_command(Command::Wait)
            .expect("wait is accepted");
        assert!(!engine.menu_open);
        assert_eq!(engine.player.gold, 1_000);
    }

    #[test]
    fn purchase_with_insufficient_gold_is_rejected_atomically() {
        let mut engine = arena_engine();
        engine.menu_open = true;
        engine.floor = 5;
        engine.player.gold = 50;
        let result = engine.handle_command(Command::PurchaseUpgrade {
            upgrade: UpgradeId::ChainStrike,
        });
        assert_eq!(
            result,
            Err(CommandError::Purchase(PurchaseError::InsufficientFunds {
                cost: 100,
                gold: 50
            }))
        );
        assert_eq!(engine.player.gold, 50);
        assert_eq!(engine.upgrades.levels.chain_strike, 0);
    }

    #[test]
    fn shop_items_apply_and_grow_in_price() {
        let mut engine = arena_engine();
        engine.menu_open = true;
        engine.player.gold = 200;
        let max_hp = engine.player.max_hp;
        engine
            .handle_command(Command::PurchaseShopItem {
                item: ShopItem::HullPlating,
            })
            .expect("first plating");
        assert_eq!(engine.player.gold, 140);
        assert_eq!(engine.player.max_hp, max_hp + 15);
        engine
            .handle_command(Command::PurchaseShopItem {
                item: ShopItem::HullPlating,
            })
            .expect("second plating");
        assert_eq!(engine.player.gold, 50);

        assert_eq!(
            engine.handle_command(Command::PurchaseShopItem {
                item: ShopItem::Unlock(AbilityId::EnergyShield)
            }),
            Err(CommandError::Purchase(PurchaseError::AlreadyUnlocked(
                AbilityId::EnergyShield
            )))
        );
    }

    #[test]
    fn engine_core_ends_the_run_in_victory() {
        let mut engine = arena_engine();
        engine.floor = MAX_FLOOR;
        let core = engine.player.pos.offset(0, 1);
        engine.terrain.set(core, CellKind::EngineCore);
        engine.refresh_cell(core);

        let result = engine.handle_command(Command::Move { dx: 0, dy: 1 });
        assert_eq!(result, Ok(CommandOutcome::TurnConsumed));
        assert_eq!(engine.end_reason, Some(GameOverReason::Victory));
        assert_eq!(engine.phase, TurnPhase::GameOver);
        assert_eq!(
            engine.handle_command(Command::Wait),
            Err(CommandError::GameOver)
        );
        let summary = engine.build_summary();
        assert_eq!(summary.reason, Some(GameOverReason::Victory));
        assert!(summary.score >= VICTORY_BONUS);
    }

    #[test]
    fn death_in_enemy_phase_is_terminal() {
        let mut engine = arena_engine();
        let pos = engine.player.pos.offset(1, 0);
        place_enemy(&mut engine, EnemyType::Brute, pos, 50, 500, 0);
        engine.config.dodge.max_chance = 0.0;
        engine.player.hp = 5;

        let result = engine.handle_command(Command::Wait);
        assert_eq!(result, Ok(CommandOutcome::TurnConsumed));
        assert_eq!(engine.player.hp, 0);
        assert_eq!(engine.end_reason, Some(GameOverReason::Killed));
        assert_eq!(engine.turn_count, 1);
        assert_eq!(
            engine.handle_command(Command::Move { dx: -1, dy: 0 }),
            Err(CommandError::GameOver)
        );
        assert_eq!(engine.turn_count, 1);
    }

    #[test]
    fn running_out_of_air_suffocates() {
        let mut engine = arena_engine();
        engine.player.oxygen = 0.0;
        engine.player.hp = 5;
        engine.handle_command(Command::Wait).expect("wait");
        assert_eq!(engine.player.hp, 0);
        assert_eq!(engine.end_reason, Some(GameOverReason::Suffocated));
    }

    #[test]
    fn stepping_on_supplies_collects_them() {
        let mut engine = arena_engine();
        engine.player.oxygen = 10.0;
        let pos = engine.player.pos.offset(-1, 0);
        place_supply(&mut engine, SupplyKind::Oxygen, pos, 35);

        engine
            .handle_command(Command::Move { dx: -1, dy: 0 })
            .expect("move onto supply");
        assert!(engine.supplies[0].taken);
        assert_eq!(engine.player.oxygen, 10.0 + 35.0 - 1.0);

        engine
            .handle_command(Command::Move { dx: 1, dy: 0 })
            .expect("move off supply");
        assert_eq!(engine.grid.at(pos), Some(CellKind::Floor));
    }

    #[test]
    fn save_and_restore_keep_progress() {
        let mut engine = arena_engine();
        engine.player.gold = 77;
        engine.floor = 6;
        engine.turn_count = 42;
        engine.upgrades.levels.counter_attack = 2;
        let json = engine.to_save().to_json().expect("serialize");

        let data = SaveData::from_json(&json).expect("parse");
        let restored = GameEngine::from_save(data, GameEngineOptions::default()).expect("restore");
        assert_eq!(restored.floor, 6);
        assert_eq!(restored.turn_count, 42);
        assert_eq!(restored.player.gold, 77);
        assert_eq!(restored.upgrades.levels.counter_attack, 2);
        assert_eq!(restored.grid.count(CellKind::Player), 1);
        assert!(!restored.is_ended());
    }
}
