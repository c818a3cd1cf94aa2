use super::*;

const WEAPON_SUPPLY_AMMO: i32 = 6;

impl GameEngine {
    /// Places the deck's aliens and supplies on free floor cells away from
    /// the spawn room. Deck 20 also gets the overseer next to the core.
    pub(super) fn populate_floor(&mut self, open_cells: &[Vec2]) {
        let mut free: Vec<Vec2> = open_cells
            .iter()
            .copied()
            .filter(|cell| *cell != self.exit && manhattan(*cell, self.player.pos) >= 4)
            .collect();

        for _ in 0..enemy_count_for_floor(self.floor) {
            let Some(pos) = take_random(&mut free, &mut self.rng) else {
                break;
            };
            let enemy_type = pick_enemy_type(self.floor, &mut self.rng);
            self.spawn_enemy(enemy_type, pos);
        }

        if self.floor >= MAX_FLOOR {
            if let Some(pos) = self.overseer_post() {
                self.spawn_enemy(EnemyType::Overseer, pos);
            }
        }

        for _ in 0..supply_count_for_floor(self.floor) {
            let Some(pos) = take_random(&mut free, &mut self.rng) else {
                break;
            };
            let kind = pick_supply_kind(&mut self.rng);
            let amount = match kind {
                SupplyKind::Supply => self.rng.int(10, 30) + self.floor as i32 * 2,
                SupplyKind::Oxygen => self.config.resources.oxygen_supply_amount.round() as i32,
                SupplyKind::Medical => {
                    (self.player.max_hp as f32 * self.config.resources.medical_heal_fraction)
                        .floor() as i32
                }
                SupplyKind::Weapon => WEAPON_SUPPLY_AMMO,
            };
            let id = self.make_id();
            self.supplies.push(Supply {
                id,
                kind,
                pos,
                amount,
                taken: false,
            });
            self.refresh_cell(pos);
        }

        debug!(
            floor = self.floor,
            enemies = self.enemies.len(),
            supplies = self.supplies.len(),
            "deck populated"
        );
    }

    fn spawn_enemy(&mut self, enemy_type: EnemyType, pos: Vec2) {
        let level = enemy_level(self.floor, &mut self.rng);
        let stats = scale_enemy(enemy_type, level);
        let id = self.make_id();
        self.enemies.push(Enemy::new(id, enemy_type, pos, stats));
        self.refresh_cell(pos);
    }

    /// First engine-room cell beside the core.
    fn overseer_post(&self) -> Option<Vec2> {
        [(-1, 0), (1, 0), (0, -1), (0, 1)]
            .into_iter()
            .map(|(dx, dy)| self.exit.offset(dx, dy))
            .find(|cell| {
                self.grid.at(*cell) == Some(CellKind::EngineRoom) && *cell != self.player.pos
            })
    }
}

fn take_random(cells: &mut Vec<Vec2>, rng: &mut Rng) -> Option<Vec2> {
    if cells.is_empty() {
        return None;
    }
    let idx = rng.pick_index(cells.len());
    Some(cells.swap_remove(idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populated_cells_are_distinct_and_tagged() {
        for seed in 0..30u32 {
            let engine = GameEngine::new(GameEngineOptions {
                seed,
                ..GameEngineOptions::default()
            });
            let mut seen = std::collections::HashSet::new();
            for enemy in &engine.enemies {
                assert!(seen.insert(enemy.pos), "two entities on {:?}", enemy.pos);
                assert_eq!(engine.grid.at(enemy.pos), Some(CellKind::Alien));
                assert!(manhattan(enemy.pos, engine.player.pos) >= 4);
            }
            for supply in &engine.supplies {
                assert!(seen.insert(supply.pos), "two entities on {:?}", supply.pos);
                assert_eq!(engine.grid.at(supply.pos), Some(supply.kind.cell()));
            }
            assert_eq!(engine.enemies.len(), enemy_count_for_floor(1));
        }
    }

    #[test]
    fn enemy_ids_are_unique_across_decks() {
        let mut engine = GameEngine::new(GameEngineOptions {
            seed: 12,
            ..GameEngineOptions::default()
        });
        let mut ids: Vec<u32> = engine.enemies.iter().map(|enemy| enemy.id).collect();
        engine.menu_open = true;
        engine.advance_floor();
        ids.extend(engine.enemies.iter().map(|enemy| enemy.id));
        let unique: std::collections::HashSet<u32> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn final_deck_is_guarded_by_the_overseer() {
        let mut engine = GameEngine::new(GameEngineOptions {
            seed: 3,
            ..GameEngineOptions::default()
        });
        engine.load_floor(MAX_FLOOR);
        let overseers: Vec<&Enemy> = engine
            .enemies
            .iter()
            .filter(|enemy| enemy.enemy_type == EnemyType::Overseer)
            .collect();
        assert_eq!(overseers.len(), 1);
        assert_eq!(chebyshev(overseers[0].pos, engine.exit), 1);
    }
}
