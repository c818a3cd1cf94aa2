//! Hit/miss resolution for melee attacks against the player or an enemy.
//!
//! Ranged and area attacks never come through here; they always land.

use std::collections::HashMap;

use crate::config::DodgeConfig;
use crate::rng::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DodgeTarget {
    Player,
    Enemy(u32),
}

/// Everything the chance formula reads about the defender.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DodgeContext {
    Player {
        level: i32,
        hp: i32,
        max_hp: i32,
        adjacent_enemies: usize,
        combat_awareness: bool,
        reflexes: bool,
        evasion_matrix: bool,
    },
    Enemy {
        base_chance: f32,
        floor: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DodgeOutcome {
    pub dodged: bool,
    pub chance: f32,
    pub roll: f32,
}

#[derive(Clone, Debug, Default)]
pub struct DodgeResolver {
    consecutive: HashMap<DodgeTarget, u32>,
}

impl DodgeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consecutive(&self, target: DodgeTarget) -> u32 {
        self.consecutive.get(&target).copied().unwrap_or(0)
    }

    /// Counters are per deck; enemy ids are never reused but the map would grow.
    pub fn clear(&mut self) {
        self.consecutive.clear();
    }

    pub fn forget(&mut self, target: DodgeTarget) {
        self.consecutive.remove(&target);
    }

    pub fn resolve(
        &mut self,
        target: DodgeTarget,
        is_critical: bool,
        context: DodgeContext,
        config: &DodgeConfig,
        rng: &mut Rng,
    ) -> DodgeOutcome {
        if is_critical {
            return DodgeOutcome {
                dodged: false,
                chance: 0.0,
                roll: 0.0,
            };
        }

        let chance = self.chance(target, context, config);
        let roll = rng.percent();
        let dodged = roll < chance;
        if dodged {
            *self.consecutive.entry(target).or_insert(0) += 1;
        } else {
            self.consecutive.insert(target, 0);
        }
        DodgeOutcome {
            dodged,
            chance,
            roll,
        }
    }

    pub fn chance(&self, target: DodgeTarget, context: DodgeContext, config: &DodgeConfig) -> f32 {
        let (mut chance, cap) = match context {
            DodgeContext::Player {
                level,
                hp,
                max_hp,
                adjacent_enemies,
                combat_awareness,
                reflexes,
                evasion_matrix,
            } => {
                let mut chance =
                    config.player_base + (level - 1).max(0) as f32 * config.player_per_level;
                if adjacent_enemies >= 2 {
                    let penalty = if combat_awareness {
                        config.surrounded_penalty / 2.0
                    } else {
                        config.surrounded_penalty
                    };
                    chance *= 1.0 - penalty;
                }
                if hp * 2 <= max_hp {
                    chance *= config.low_hp_factor;
                }
                if evasion_matrix {
                    chance += config.evasion_bonus;
                }
                let cap = config.consecutive_cap + u32::from(reflexes);
                (chance, cap)
            }
            DodgeContext::Enemy { base_chance, floor } => {
                (base_chance + (floor / 5) as f32, config.consecutive_cap)
            }
        };

        if self.consecutive(target) >= cap {
            chance *= config.consecutive_penalty;
        }
        chance.clamp(0.0, config.max_chance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_context(adjacent_enemies: usize) -> DodgeContext {
        DodgeContext::Player {
            level: 1,
            hp: 100,
            max_hp: 100,
            adjacent_enemies,
            combat_awareness: false,
            reflexes: false,
            evasion_matrix: false,
        }
    }

    #[test]
    fn critical_attacks_never_miss() {
        let mut resolver = DodgeResolver::new();
        let config = DodgeConfig {
            player_base: 100.0,
            max_chance: 100.0,
            ..DodgeConfig::default()
        };
        for seed in 0..500u32 {
            let mut rng = Rng::new(seed);
            let outcome = resolver.resolve(
                DodgeTarget::Player,
                true,
                player_context(0),
                &config,
                &mut rng,
            );
            assert!(!outcome.dodged);
        }
    }

    #[test]
    fn failed_roll_resets_consecutive_counter() {
        let mut resolver = DodgeResolver::new();
        let always = DodgeConfig {
            player_base: 100.0,
            max_chance: 100.0,
            consecutive_cap: 10,
            ..DodgeConfig::default()
        };
        let never = DodgeConfig {
            player_base: 0.0,
            ..DodgeConfig::default()
        };
        let mut rng = Rng::new(5);
        for expected in 1..=3 {
            let outcome =
                resolver.resolve(DodgeTarget::Player, false, player_context(0), &always, &mut rng);
            assert!(outcome.dodged);
            assert_eq!(resolver.consecutive(DodgeTarget::Player), expected);
        }
        let outcome =
            resolver.resolve(DodgeTarget::Player, false, player_context(0), &never, &mut rng);
        assert!(!outcome.dodged);
        assert_eq!(resolver.consecutive(DodgeTarget::Player), 0);
    }

    #[test]
    fn counters_are_independent_per_defender() {
        let mut resolver = DodgeResolver::new();
        let config = DodgeConfig {
            max_chance: 100.0,
            ..DodgeConfig::default()
        };
        let mut rng = Rng::new(1);
        let enemy = DodgeContext::Enemy {
            base_chance: 100.0,
            floor: 1,
        };
        resolver.resolve(DodgeTarget::Enemy(1), false, enemy, &config, &mut rng);
        assert_eq!(resolver.consecutive(DodgeTarget::Enemy(1)), 1);
        assert_eq!(resolver.consecutive(DodgeTarget::Enemy(2)), 0);
        assert_eq!(resolver.consecutive(DodgeTarget::Player), 0);
    }

    #[test]
    fn surrounded_penalty_is_halved_by_combat_awareness() {
        let resolver = DodgeResolver::new();
        let config = DodgeConfig::default();
        let open = resolver.chance(DodgeTarget::Player, player_context(0), &config);
        let surrounded = resolver.chance(DodgeTarget::Player, player_context(2), &config);
        let aware = resolver.chance(
            DodgeTarget::Player,
            DodgeContext::Player {
                level: 1,
                hp: 100,
                max_hp: 100,
                adjacent_enemies: 2,
                combat_awareness: true,
                reflexes: false,
                evasion_matrix: false,
            },
            &config,
        );
        assert!((surrounded - open * (1.0 - config.surrounded_penalty)).abs() < 1e-4);
        assert!((aware - open * (1.0 - config.surrounded_penalty / 2.0)).abs() < 1e-4);
        assert!(aware > surrounded);
    }

    #[test]
    fn low_hp_and_level_modify_player_chance() {
        let resolver = DodgeResolver::new();
        let config = DodgeConfig::default();
        let chance = resolver.chance(
            DodgeTarget::Player,
            DodgeContext::Player {
                level: 5,
                hp: 50,
                max_hp: 100,
                adjacent_enemies: 0,
                combat_awareness: false,
                reflexes: false,
                evasion_matrix: true,
            },
            &config,
        );
        let expected = (config.player_base + 4.0 * config.player_per_level) * config.low_hp_factor
            + config.evasion_bonus;
        assert!((chance - expected).abs() < 1e-4);
    }

    #[test]
    fn chance_is_clamped_to_max() {
        let resolver = DodgeResolver::new();
        let config = DodgeConfig::default();
        let chance = resolver.chance(
            DodgeTarget::Enemy(3),
            DodgeContext::Enemy {
                base_chance: 90.0,
                floor: 20,
            },
            &config,
        );
        assert_eq!(chance, config.max_chance);
    }

    #[test]
    fn enemy_floor_bonus_uses_integer_division() {
        let resolver = DodgeResolver::new();
        let config = DodgeConfig::default();
        let at = |floor| {
            resolver.chance(
                DodgeTarget::Enemy(1),
                DodgeContext::Enemy {
                    base_chance: 10.0,
                    floor,
                },
                &config,
            )
        };
        assert_eq!(at(4), 10.0);
        assert_eq!(at(5), 11.0);
        assert_eq!(at(14), 12.0);
    }

    #[test]
    fn streak_beyond_cap_penalises_next_roll_and_reflexes_raise_cap() {
        let mut resolver = DodgeResolver::new();
        let config = DodgeConfig {
            max_chance: 100.0,
            ..DodgeConfig::default()
        };
        let always = DodgeConfig {
            player_base: 100.0,
            max_chance: 100.0,
            consecutive_cap: 100,
            ..DodgeConfig::default()
        };
        let mut rng = Rng::new(3);
        for _ in 0..config.consecutive_cap {
            resolver.resolve(DodgeTarget::Player, false, player_context(0), &always, &mut rng);
        }
        let base = config.player_base;
        let penalised = resolver.chance(DodgeTarget::Player, player_context(0), &config);
        assert!((penalised - base * config.consecutive_penalty).abs() < 1e-4);

        let with_reflexes = resolver.chance(
            DodgeTarget::Player,
            DodgeContext::Player {
                level: 1,
                hp: 100,
                max_hp: 100,
                adjacent_enemies: 0,
                combat_awareness: false,
                reflexes: true,
                evasion_matrix: false,
            },
            &config,
        );
        assert!((with_reflexes - base).abs() < 1e-4);
    }
}
