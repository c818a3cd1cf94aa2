use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EnemyIntent {
    Skip,
    Stunned,
    Attack,
    Move(Vec2),
    Stay,
}

const WANDER_OPTIONS: [(i32, i32); 9] = [
    (0, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl GameEngine {
    /// Every alien acts once, in collection order.
    pub(super) fn run_enemy_phase(&mut self) {
        for idx in 0..self.enemies.len() {
            if !self.player.is_alive() {
                break;
            }
            let intent = self.decide_enemy_intent(idx);
            self.apply_enemy_intent(idx, intent);
        }
    }

    fn decide_enemy_intent(&mut self, idx: usize) -> EnemyIntent {
        let enemy = &self.enemies[idx];
        if !enemy.alive {
            return EnemyIntent::Skip;
        }
        if enemy.stunned {
            return EnemyIntent::Stunned;
        }

        let profile = enemy.profile();
        let from = enemy.pos;
        let distance = manhattan(from, self.player.pos);
        if distance == 1 {
            return EnemyIntent::Attack;
        }
        if distance <= profile.detection_range {
            return self
                .pursuit_step(from, profile.phase_through)
                .map(EnemyIntent::Move)
                .unwrap_or(EnemyIntent::Stay);
        }
        if profile.wanders {
            let (dx, dy) = WANDER_OPTIONS[self.rng.pick_index(WANDER_OPTIONS.len())];
            if (dx, dy) == (0, 0) {
                return EnemyIntent::Stay;
            }
            let dest = from.offset(dx, dy);
            if self.can_enemy_enter(dest, profile.phase_through) {
                return EnemyIntent::Move(dest);
            }
        }
        EnemyIntent::Stay
    }

    /// Greedy single-axis step: the axis with the larger gap first, ties go
    /// horizontal, and the other axis is tried when the first is blocked.
    fn pursuit_step(&self, from: Vec2, phase_through: bool) -> Option<Vec2> {
        let dx = self.player.pos.x - from.x;
        let dy = self.player.pos.y - from.y;
        let horizontal = from.offset(dx.signum(), 0);
        let vertical = from.offset(0, dy.signum());
        let order = if dx.abs() >= dy.abs() {
            [(dx != 0, horizontal), (dy != 0, vertical)]
        } else {
            [(dy != 0, vertical), (dx != 0, horizontal)]
        };
        order
            .into_iter()
            .filter(|(useful, _)| *useful)
            .map(|(_, dest)| dest)
            .find(|dest| self.can_enemy_enter(*dest, phase_through))
    }

    fn can_enemy_enter(&self, dest: Vec2, phase_through: bool) -> bool {
        match self.grid.at(dest) {
            Some(CellKind::Floor) | Some(CellKind::EngineRoom) => true,
            Some(CellKind::Bulkhead) => phase_through,
            _ => false,
        }
    }

    fn apply_enemy_intent(&mut self, idx: usize, intent: EnemyIntent) {
        match intent {
            EnemyIntent::Skip | EnemyIntent::Stay => {}
            EnemyIntent::Stunned => {
                let enemy = &mut self.enemies[idx];
                enemy.stun_duration = enemy.stun_duration.saturating_sub(1);
                if enemy.stun_duration == 0 {
                    enemy.stunned = false;
                }
                debug!(
                    enemy = enemy.id,
                    remaining = enemy.stun_duration,
                    "stunned alien skips its turn"
                );
            }
            EnemyIntent::Attack => self.enemy_attack(idx),
            EnemyIntent::Move(dest) => {
                let from = self.enemies[idx].pos;
                self.enemies[idx].pos = dest;
                self.refresh_cell(from);
                self.refresh_cell(dest);
            }
        }
    }

    /// Oxygen-draining types drain alongside the normal hit, only when it lands.
    fn enemy_attack(&mut self, idx: usize) {
        let attack = self.enemies[idx].attack;
        let drain = self.enemies[idx].profile().oxygen_drain;
        let outcome = self.player_take_damage(attack, Some(idx));
        if drain > 0.0 && matches!(outcome, DamageOutcome::Hit { .. }) {
            self.player.add_oxygen(-drain);
            self.events
                .push(GameEvent::OxygenDrained { amount: drain });
        }
    }
}
