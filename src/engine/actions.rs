use super::*;

const PLASMA_NOVA_BONUS: i32 = 5;

impl GameEngine {
    pub(super) fn player_move(&mut self, dx: i32, dy: i32) -> Result<PlayerAction, CommandError> {
        let facing = match Direction::from_delta(dx, dy) {
            Some(dir) if dx.abs() <= 1 && dy.abs() <= 1 => dir,
            _ => return Err(CommandError::InvalidDirection { dx, dy }),
        };
        let from = self.player.pos;
        let target = from.offset(dx, dy);
        if !self.grid.in_bounds(target.x, target.y) {
            return Err(CommandError::OutOfBounds {
                x: target.x,
                y: target.y,
            });
        }

        if let Some(enemy_idx) = self.enemy_at(target) {
            self.player.facing = facing;
            self.resolve_melee_attack(enemy_idx);
            return Ok(PlayerAction::Acted);
        }

        let terrain = self.terrain.at(target).unwrap_or(CellKind::Empty);
        if !is_walkable_terrain(terrain) {
            return Err(CommandError::Blocked {
                x: target.x,
                y: target.y,
            });
        }
        self.player.facing = facing;
        match terrain {
            CellKind::Elevator => {
                self.menu_open = true;
                self.events.push(GameEvent::UpgradeMenuOpened);
                return Ok(PlayerAction::OpenedMenu);
            }
            CellKind::EngineCore => {
                self.relocate_player(target);
                return Ok(PlayerAction::ReachedCore);
            }
            _ => {}
        }

        self.relocate_player(target);
        self.collect_supply_at(target);
        Ok(PlayerAction::Acted)
    }

    fn relocate_player(&mut self, target: Vec2) {
        let from = self.player.pos;
        self.player.pos = target;
        self.refresh_cell(from);
        self.refresh_cell(target);
    }

    fn collect_supply_at(&mut self, pos: Vec2) {
        let Some(idx) = self
            .supplies
            .iter()
            .position(|supply| !supply.taken && supply.pos == pos)
        else {
            return;
        };
        self.supplies[idx].taken = true;
        let (kind, amount) = (self.supplies[idx].kind, self.supplies[idx].amount);
        let gained = match kind {
            SupplyKind::Supply => {
                self.player.gold += amount;
                amount
            }
            SupplyKind::Oxygen => {
                let before = self.player.oxygen;
                self.player.add_oxygen(amount as f32);
                (self.player.oxygen - before).round() as i32
            }
            SupplyKind::Medical => self.player.heal(amount),
            SupplyKind::Weapon => {
                let amount = amount.max(0) as u32;
                self.player.ammo[0] += amount;
                self.player.ammo[1] += amount / 2;
                self.player.ammo[2] += amount / 3;
                amount as i32
            }
        };
        self.events.push(GameEvent::Pickup {
            kind,
            amount: gained,
        });
        self.refresh_cell(pos);
    }

    /// Validates everything before spending power or a use, so a rejected
    /// ability leaves the run untouched.
    pub(super) fn use_ability(&mut self, ability: AbilityId) -> Result<PlayerAction, CommandError> {
        let state = self
            .player
            .abilities
            .get(&ability)
            .cloned()
            .ok_or(CommandError::AbilityLocked(ability))?;
        if state.passive {
            return Err(CommandError::AbilityPassive(ability));
        }
        if !state.unlocked {
            return Err(CommandError::AbilityLocked(ability));
        }
        if state.uses == 0 {
            return Err(CommandError::AbilityExhausted(ability));
        }
        let cost = ability.power_cost();
        if self.player.power < cost {
            return Err(CommandError::InsufficientPower {
                needed: cost,
                available: self.player.power,
            });
        }

        match ability {
            AbilityId::EnergyShield => {
                if self.player.shield_active {
                    return Err(CommandError::AbilityAlreadyActive(ability));
                }
                self.spend_ability(ability, cost);
                self.player.shield_active = true;
                self.player.shield_duration = ENERGY_SHIELD_DURATION;
            }
            AbilityId::EmpBurst => {
                let targets = self.enemies_within(self.player.pos, 1);
                if targets.is_empty() {
                    return Err(CommandError::NoAbilityTarget(ability));
                }
                self.spend_ability(ability, cost);
                for idx in targets {
                    let enemy = &mut self.enemies[idx];
                    enemy.stun(EMP_STUN_DURATION);
                    self.events.push(GameEvent::EnemyStunned {
                        enemy_id: enemy.id,
                        turns: enemy.stun_duration,
                    });
                }
            }
            AbilityId::PlasmaNova => {
                let targets = self.enemies_within(self.player.pos, PLASMA_NOVA_RADIUS);
                if targets.is_empty() {
                    return Err(CommandError::NoAbilityTarget(ability));
                }
                self.spend_ability(ability, cost);
                let base = self.player.attack + PLASMA_NOVA_BONUS;
                let bonus = std::mem::take(&mut self.player.chain_bonus_damage);
                for idx in targets {
                    if self.enemies[idx].alive {
                        self.strike_without_dodge(idx, base, bonus);
                    }
                }
            }
            AbilityId::BreachCharge => {
                let (dx, dy) = self.player.facing.delta();
                let target = self.player.pos.offset(dx, dy);
                let inner = target.x > 0
                    && target.y > 0
                    && target.x < self.terrain.width - 1
                    && target.y < self.terrain.height - 1;
                if !inner || self.terrain.at(target) != Some(CellKind::Bulkhead) {
                    return Err(CommandError::NoAbilityTarget(ability));
                }
                self.spend_ability(ability, cost);
                self.terrain.set(target, CellKind::Floor);
                self.refresh_cell(target);
                self.events.push(GameEvent::BulkheadBreached {
                    x: target.x,
                    y: target.y,
                });
            }
            _ => return Err(CommandError::AbilityPassive(ability)),
        }
        Ok(PlayerAction::Acted)
    }

    fn spend_ability(&mut self, ability: AbilityId, cost: i32) {
        self.player.power -= cost;
        if let Some(state) = self.player.abilities.get_mut(&ability) {
            state.uses = state.uses.saturating_sub(1);
        }
        self.events.push(GameEvent::AbilityUsed { ability });
    }

    fn enemies_within(&self, center: Vec2, radius: i32) -> Vec<usize> {
        self.enemies
            .iter()
            .enumerate()
            .filter(|(_, enemy)| enemy.alive && chebyshev(enemy.pos, center) <= radius)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub(super) fn select_ranged_weapon(&mut self, slot: usize) -> Result<(), CommandError> {
        let weapon = WeaponKind::from_slot(slot).ok_or(CommandError::InvalidWeaponSlot(slot))?;
        if self.player.ammo[slot] == 0 {
            return Err(CommandError::OutOfAmmo(weapon));
        }
        self.targeting = Some(weapon);
        Ok(())
    }

    /// Fires the selected weapon. A validated shot consumes the turn even
    /// when it hits nothing.
    pub(super) fn ranged_attack(&mut self, target: Vec2) -> Result<PlayerAction, CommandError> {
        let weapon = self.targeting.ok_or(CommandError::NotTargeting)?;
        let (x, y) = (target.x, target.y);
        if !self.grid.in_bounds(x, y) {
            return Err(CommandError::OutOfBounds { x, y });
        }
        let origin = self.player.pos;
        let distance = chebyshev(origin, target);
        if distance == 0 || distance > weapon.range() {
            return Err(CommandError::OutOfRange { x, y });
        }
        if !self.is_visible(target) {
            return Err(CommandError::NotVisible { x, y });
        }

        let victims = match weapon {
            WeaponKind::Pistol => {
                vec![self.enemy_at(target).ok_or(CommandError::EmptyTarget { x, y })?]
            }
            WeaponKind::Railgun => {
                let (sx, sy) = line_step(origin, target).ok_or(CommandError::NotAligned { x, y })?;
                let mut hit = Vec::new();
                let mut cursor = origin;
                for _ in 0..weapon.range() {
                    cursor = cursor.offset(sx, sy);
                    if !is_walkable_terrain(self.terrain.at(cursor).unwrap_or(CellKind::Empty)) {
                        break;
                    }
                    if let Some(idx) = self.enemy_at(cursor) {
                        hit.push(idx);
                    }
                }
                hit
            }
            WeaponKind::Grenade => self.enemies_within(target, 1),
        };

        let slot = WeaponKind::SLOTS
            .iter()
            .position(|kind| *kind == weapon)
            .unwrap_or(0);
        self.player.ammo[slot] = self.player.ammo[slot].saturating_sub(1);
        if let Some(facing) = Direction::from_delta(x - origin.x, y - origin.y) {
            self.player.facing = facing;
        }
        self.targeting = None;

        let base = self.player.attack + weapon.power_bonus();
        let bonus = std::mem::take(&mut self.player.chain_bonus_damage);
        for idx in victims {
            if self.enemies[idx].alive {
                self.strike_without_dodge(idx, base, bonus);
            }
        }
        Ok(PlayerAction::Acted)
    }
}
