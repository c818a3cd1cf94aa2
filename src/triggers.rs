//! One-shot station transmissions gated on run state.
//!
//! Some transmissions reroute life support for a while; the lowest active
//! multiplier scales the oxygen drain of the status tick.

use std::collections::BTreeSet;

use tracing::debug;

use crate::types::GameEvent;

/// Read-only view of the run handed to trigger predicates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerContext {
    pub floor: u32,
    pub turn_count: u64,
    pub oxygen_ratio: f32,
    pub hp_ratio: f32,
    pub kills: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OxygenEfficiency {
    pub multiplier: f32,
    pub turns: u64,
}

pub struct TriggerDef {
    pub id: &'static str,
    pub message: &'static str,
    pub condition: fn(&TriggerContext) -> bool,
    pub oxygen_efficiency: Option<OxygenEfficiency>,
}

pub const TRIGGERS: &[TriggerDef] = &[
    TriggerDef {
        id: "first_contact",
        message: "Hostile lifeform neutralised. Station AI is logging your kills.",
        condition: |ctx| ctx.kills >= 1,
        oxygen_efficiency: None,
    },
    TriggerDef {
        id: "oxygen_warning",
        message: "Oxygen reserve below a quarter. Rerouting life support to your suit.",
        condition: |ctx| ctx.oxygen_ratio <= 0.25,
        oxygen_efficiency: Some(OxygenEfficiency {
            multiplier: 0.5,
            turns: 30,
        }),
    },
    TriggerDef {
        id: "vitals_critical",
        message: "Vital signs critical. Medical bay is several decks away.",
        condition: |ctx| ctx.hp_ratio <= 0.25,
        oxygen_efficiency: None,
    },
    TriggerDef {
        id: "relay_deck_5",
        message: "Comms relay restored. Scrubber efficiency improved on this section.",
        condition: |ctx| ctx.floor >= 5,
        oxygen_efficiency: Some(OxygenEfficiency {
            multiplier: 0.8,
            turns: 50,
        }),
    },
    TriggerDef {
        id: "relay_deck_10",
        message: "Halfway down. The relay here still has power.",
        condition: |ctx| ctx.floor >= 10,
        oxygen_efficiency: Some(OxygenEfficiency {
            multiplier: 0.8,
            turns: 50,
        }),
    },
    TriggerDef {
        id: "hunter_deck_15",
        message: "Motion trackers are saturated. Something large is moving below.",
        condition: |ctx| ctx.floor >= 15,
        oxygen_efficiency: None,
    },
    TriggerDef {
        id: "engine_deck",
        message: "Engine deck reached. Shut down the core.",
        condition: |ctx| ctx.floor >= 20,
        oxygen_efficiency: None,
    },
    TriggerDef {
        id: "long_haul",
        message: "Suit log: 500 turns on station. Scrubbers recalibrated.",
        condition: |ctx| ctx.turn_count >= 500,
        oxygen_efficiency: Some(OxygenEfficiency {
            multiplier: 0.9,
            turns: 100,
        }),
    },
];

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActiveEfficiency {
    multiplier: f32,
    expires_at: u64,
}

#[derive(Clone, Debug, Default)]
pub struct TriggerEngine {
    fired: BTreeSet<&'static str>,
    active: Vec<ActiveEfficiency>,
}

impl TriggerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self, id: &str) -> bool {
        self.fired.contains(id)
    }

    /// Fires every not-yet-fired trigger whose predicate holds.
    pub fn evaluate(&mut self, ctx: &TriggerContext) -> Vec<GameEvent> {
        self.active.retain(|effect| effect.expires_at > ctx.turn_count);
        let mut events = Vec::new();
        for def in TRIGGERS {
            if self.fired.contains(def.id) || !(def.condition)(ctx) {
                continue;
            }
            self.fired.insert(def.id);
            if let Some(efficiency) = def.oxygen_efficiency {
                self.active.push(ActiveEfficiency {
                    multiplier: efficiency.multiplier,
                    expires_at: ctx.turn_count + efficiency.turns,
                });
            }
            debug!(trigger = def.id, turn = ctx.turn_count, "transmission fired");
            events.push(GameEvent::Transmission {
                trigger: def.id.to_string(),
                message: def.message.to_string(),
            });
        }
        events
    }

    pub fn oxygen_efficiency(&self, turn_count: u64) -> f32 {
        self.active
            .iter()
            .filter(|effect| effect.expires_at > turn_count)
            .map(|effect| effect.multiplier)
            .fold(1.0, f32::min)
    }
}
