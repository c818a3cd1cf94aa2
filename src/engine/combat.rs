use super::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttackReport {
    pub hit: bool,
    pub damage: i32,
    pub critical: bool,
    pub dodged: bool,
    pub killed: bool,
}

/// Exactly one of these happens to every hit aimed at the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    ShieldCharge,
    ActiveShield,
    Dodged,
    Hit { damage: i32 },
}

impl GameEngine {
    /// Player melee against one alien: crit, dodge, base damage, pending
    /// chain bonus, crit multiplier, HP, kill.
    pub(super) fn resolve_melee_attack(&mut self, enemy_idx: usize) -> AttackReport {
        let critical = self.rng.percent() < self.player.critical_chance;

        let enemy = &self.enemies[enemy_idx];
        let (enemy_id, defense) = (enemy.id, enemy.defense);
        let context = DodgeContext::Enemy {
            base_chance: enemy.profile().dodge_base,
            floor: self.floor,
        };
        let outcome = self.dodge.resolve(
            DodgeTarget::Enemy(enemy_id),
            critical,
            context,
            &self.config.dodge,
            &mut self.rng,
        );
        if outcome.dodged {
            self.events.push(GameEvent::Dodge {
                defender: Actor::Enemy { id: enemy_id },
                chance: outcome.chance,
                roll: outcome.roll,
            });
            return AttackReport {
                dodged: true,
                ..AttackReport::default()
            };
        }

        let mut damage = (self.player.attack - defense).max(1);
        damage += std::mem::take(&mut self.player.chain_bonus_damage);
        if critical {
            damage = (damage as f32 * self.player.critical_multiplier).floor() as i32;
        }
        let killed = self.damage_enemy(enemy_idx, damage, critical);
        AttackReport {
            hit: true,
            damage,
            critical,
            dodged: false,
            killed,
        }
    }

    /// Ranged and area hits: same crit, damage and kill steps, never dodged.
    /// `chain_bonus` is taken by the caller once per attack, so a chain
    /// earned mid-blast stays pending for the next one.
    pub(super) fn strike_without_dodge(
        &mut self,
        enemy_idx: usize,
        base: i32,
        chain_bonus: i32,
    ) -> AttackReport {
        let critical = self.rng.percent() < self.player.critical_chance;
        let mut damage = (base - self.enemies[enemy_idx].defense).max(1) + chain_bonus;
        if critical {
            damage = (damage as f32 * self.player.critical_multiplier).floor() as i32;
        }
        let killed = self.damage_enemy(enemy_idx, damage, critical);
        AttackReport {
            hit: true,
            damage,
            critical,
            dodged: false,
            killed,
        }
    }

    fn damage_enemy(&mut self, enemy_idx: usize, damage: i32, critical: bool) -> bool {
        let enemy = &mut self.enemies[enemy_idx];
        let ratio_before = enemy.hp_ratio();
        enemy.hp = (enemy.hp - damage).max(0);
        let target = Actor::Enemy { id: enemy.id };
        let dead = enemy.hp == 0;
        self.events.push(if critical {
            GameEvent::Critical {
                source: Actor::Player,
                target,
                damage,
            }
        } else {
            GameEvent::Attack {
                source: Actor::Player,
                target,
                damage,
            }
        });
        if dead {
            self.kill_enemy(enemy_idx, ratio_before, damage);
        }
        dead
    }

    pub(super) fn kill_enemy(&mut self, enemy_idx: usize, ratio_before: f32, killing_damage: i32) {
        let enemy = &mut self.enemies[enemy_idx];
        if !enemy.alive {
            return;
        }
        enemy.alive = false;
        enemy.stunned = false;
        let (id, pos, max_hp) = (enemy.id, enemy.pos, enemy.max_hp);
        let (enemy_type, exp, gold) = (enemy.enemy_type, enemy.exp_reward, enemy.gold_reward);
        self.refresh_cell(pos);
        self.dodge.forget(DodgeTarget::Enemy(id));

        self.player.exp += exp;
        self.player.gold += gold;
        self.player.kills += 1;
        self.events.push(GameEvent::Kill {
            enemy_id: id,
            enemy_type,
            exp,
            gold,
        });

        self.check_chain_strike(ratio_before, killing_damage >= max_hp);

        for level in apply_level_ups(&mut self.player) {
            self.events.push(GameEvent::LevelUp { level });
            info!(level, "player levelled up");
        }
    }

    /// Chains only fire on kills made during the player's own action.
    fn check_chain_strike(&mut self, ratio_before: f32, one_shot: bool) {
        if !matches!(self.phase, TurnPhase::PlayerActing | TurnPhase::ExtraAction) {
            return;
        }
        let Some(level) = self.upgrades.chain_strike() else {
            return;
        };
        let qualifies = ratio_before <= level.hp_threshold || (level.one_shot_trigger && one_shot);
        if !qualifies || self.upgrades.try_consume_chain().is_none() {
            return;
        }
        let bonus = (level.bonus_damage as f32 * self.upgrades.synergy()).floor() as i32;
        self.player.has_extra_action = true;
        self.player.chain_bonus_damage = bonus;
        self.events.push(GameEvent::ChainStrike {
            bonus_damage: bonus,
            chains: self.upgrades.chains_this_turn(),
        });
    }

    /// Single mitigation chain for every hit on the player: shield charge,
    /// then active shield, then dodge, then `max(1, raw - defense)`.
    pub(super) fn player_take_damage(&mut self, raw: i32, attacker: Option<usize>) -> DamageOutcome {
        if self.player.shields > 0 {
            self.player.shields -= 1;
            self.events.push(GameEvent::ShieldBlock {
                source: ShieldSource::Charge,
            });
            return DamageOutcome::ShieldCharge;
        }
        if self.player.shield_active {
            self.events.push(GameEvent::ShieldBlock {
                source: ShieldSource::Active,
            });
            return DamageOutcome::ActiveShield;
        }

        let player = &self.player;
        let context = DodgeContext::Player {
            level: player.level,
            hp: player.hp,
            max_hp: player.max_hp,
            adjacent_enemies: self.adjacent_enemy_count(player.pos),
            combat_awareness: player.has_passive(AbilityId::CombatAwareness),
            reflexes: player.has_passive(AbilityId::Reflexes),
            evasion_matrix: player.has_passive(AbilityId::EvasionMatrix),
        };
        let outcome = self.dodge.resolve(
            DodgeTarget::Player,
            false,
            context,
            &self.config.dodge,
            &mut self.rng,
        );
        if outcome.dodged {
            self.events.push(GameEvent::Dodge {
                defender: Actor::Player,
                chance: outcome.chance,
                roll: outcome.roll,
            });
            return DamageOutcome::Dodged;
        }

        let damage = (raw - self.player.defense).max(1);
        self.player.lose_hp(damage);
        if let Some(idx) = attacker {
            self.events.push(GameEvent::Attack {
                source: Actor::Enemy {
                    id: self.enemies[idx].id,
                },
                target: Actor::Player,
                damage,
            });
            if self.player.is_alive() && self.enemies[idx].alive {
                self.try_counter_attack(idx);
            }
        }
        DamageOutcome::Hit { damage }
    }

    fn try_counter_attack(&mut self, enemy_idx: usize) {
        let Some(level) = self.upgrades.counter_attack() else {
            return;
        };
        if self.rng.percent() >= level.trigger_chance {
            return;
        }
        let synergy = self.upgrades.synergy();
        let mut damage = (self.player.attack as f32 * level.multiplier * synergy).floor() as i32;
        let mut critical = false;
        if level.can_crit {
            critical = self.rng.percent() < self.player.critical_chance + level.crit_bonus;
            if critical {
                damage = (damage as f32 * self.player.critical_multiplier).floor() as i32;
            }
        }
        let damage = damage.max(1);
        self.events.push(GameEvent::CounterAttack {
            enemy_id: self.enemies[enemy_idx].id,
            damage,
            critical,
        });
        self.damage_enemy(enemy_idx, damage, critical);
    }
}
