use crate::rng::Rng;
use crate::types::{SupplyKind, Vec2};

pub(super) fn manhattan(a: Vec2, b: Vec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

pub(super) fn chebyshev(a: Vec2, b: Vec2) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// Straight or diagonal line from `from` towards `to`, as a unit step.
pub(super) fn line_step(from: Vec2, to: Vec2) -> Option<(i32, i32)> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0 && dy == 0 {
        return None;
    }
    if dx == 0 || dy == 0 || dx.abs() == dy.abs() {
        return Some((dx.signum(), dy.signum()));
    }
    None
}

pub(super) fn pick_supply_kind(rng: &mut Rng) -> SupplyKind {
    match rng.weighted_index(&[40, 30, 20, 10]) {
        Some(1) => SupplyKind::Oxygen,
        Some(2) => SupplyKind::Medical,
        Some(3) => SupplyKind::Weapon,
        _ => SupplyKind::Supply,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances() {
        let a = Vec2::new(1, 1);
        let b = Vec2::new(4, 3);
        assert_eq!(manhattan(a, b), 5);
        assert_eq!(chebyshev(a, b), 3);
    }

    #[test]
    fn line_step_accepts_only_straight_or_diagonal() {
        let origin = Vec2::new(5, 5);
        assert_eq!(line_step(origin, Vec2::new(9, 5)), Some((1, 0)));
        assert_eq!(line_step(origin, Vec2::new(2, 2)), Some((-1, -1)));
        assert_eq!(line_step(origin, Vec2::new(7, 6)), None);
        assert_eq!(line_step(origin, origin), None);
    }
}
