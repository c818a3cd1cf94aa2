use super::*;
use crate::entities::EnemyStats;

pub(super) const ARENA_CENTER: Vec2 = Vec2 { x: 5, y: 4 };

/// An engine on a walled 10x7 room with no enemies or supplies and the
/// player in the middle.
pub(super) fn arena_engine() -> GameEngine {
    let mut engine = GameEngine::new(GameEngineOptions {
        seed: 7,
        ..GameEngineOptions::default()
    });
    let mut terrain = Grid::new(engine.terrain.width, engine.terrain.height, CellKind::Bulkhead);
    for y in 1..=7 {
        for x in 1..=10 {
            terrain.set(Vec2::new(x, y), CellKind::Floor);
        }
    }
    engine.terrain = terrain.clone();
    engine.grid = terrain;
    engine.enemies.clear();
    engine.supplies.clear();
    engine.floor = 1;
    engine.player = Player::new(ARENA_CENTER);
    engine.refresh_cell(ARENA_CENTER);
    engine.update_visibility();
    engine
}

pub(super) fn place_enemy(
    engine: &mut GameEngine,
    enemy_type: EnemyType,
    pos: Vec2,
    hp: i32,
    attack: i32,
    defense: i32,
) -> usize {
    let id = engine.make_id();
    engine.enemies.push(Enemy::new(
        id,
        enemy_type,
        pos,
        EnemyStats {
            level: 1,
            hp,
            attack,
            defense,
            exp_reward: 7,
            gold_reward: 4,
        },
    ));
    engine.refresh_cell(pos);
    engine.enemies.len() - 1
}

pub(super) fn place_supply(engine: &mut GameEngine, kind: SupplyKind, pos: Vec2, amount: i32) {
    let id = engine.make_id();
    engine.supplies.push(Supply {
        id,
        kind,
        pos,
        amount,
        taken: false,
    });
    engine.refresh_cell(pos);
}
