use super::*;

impl GameEngine {
    /// End-of-turn bookkeeping. Suffocation only bites when the tank was
    /// already empty as the tick started.
    pub(super) fn run_status_tick(&mut self) {
        let resources = &self.config.resources;
        let was_empty = self.player.oxygen <= 0.0;

        let mut cost = oxygen_cost_for_floor(self.floor);
        if self.player.has_passive(AbilityId::OxygenRecycler) {
            cost *= 1.0 - resources.recycler_reduction;
        }
        cost *= self.triggers.oxygen_efficiency(self.turn_count);
        self.player.add_oxygen(-cost);

        if was_empty {
            let damage = resources.suffocation_damage;
            self.player.lose_hp(damage);
            self.events.push(GameEvent::Suffocation { damage });
        }

        if self.player.shield_active {
            self.player.shield_duration = self.player.shield_duration.saturating_sub(1);
            if self.player.shield_duration == 0 {
                self.player.shield_active = false;
            }
        }

        if self.player.has_passive(AbilityId::AutoMedic)
            && self.player.is_alive()
            && self.player.hp * 2 < self.player.max_hp
        {
            let amount = ((self.player.max_hp as f32 * resources.auto_medic_fraction).floor()
                as i32)
                .max(1);
            self.player.heal(amount);
        }

        self.player.power = (self.player.power + resources.power_regen).min(self.player.max_power);

        let charges = self.upgrades.tick_auto_repair(self.player.shields);
        if charges > 0 {
            self.player.shields += charges;
            self.events.push(GameEvent::ShieldCharged {
                shields: self.player.shields,
            });
        }

        self.upgrades.reset_chain_window();
        self.player.has_extra_action = false;
        self.player.chain_bonus_damage = 0;
    }
}
