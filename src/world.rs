use std::collections::{HashSet, VecDeque};

use crate::config::MapConfig;
use crate::constants::{CONE_RADIUS, MAX_FLOOR, VISION_RADIUS};
use crate::rng::Rng;
use crate::types::{CellKind, Direction, Vec2};

#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    cells: Vec<CellKind>,
}

impl Grid {
    pub fn new(width: i32, height: i32, fill: CellKind) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; (width.max(0) * height.max(0)) as usize],
        }
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<CellKind> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    pub fn at(&self, pos: Vec2) -> Option<CellKind> {
        self.get(pos.x, pos.y)
    }

    pub fn set(&mut self, pos: Vec2, kind: CellKind) {
        if let Some(idx) = self.index(pos.x, pos.y) {
            self.cells[idx] = kind;
        }
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|cell| **cell == kind).count()
    }

    pub fn blocks_sight(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), None | Some(CellKind::Bulkhead) | Some(CellKind::Empty))
    }

    pub fn to_tiles(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| self.get(x, y).unwrap_or(CellKind::Empty).glyph())
                    .collect()
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Room {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Room {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    fn intersects_padded(&self, other: &Room) -> bool {
        self.x - 1 <= other.x + other.w
            && self.x + self.w + 1 >= other.x
            && self.y - 1 <= other.y + other.h
            && self.y + self.h + 1 >= other.y
    }

    fn cells(&self) -> impl Iterator<Item = Vec2> + '_ {
        (self.y..self.y + self.h)
            .flat_map(move |y| (self.x..self.x + self.w).map(move |x| Vec2::new(x, y)))
    }
}

/// Terrain of one deck. The grid holds terrain only; the engine stamps
/// player, alien and supply tags on top of it.
#[derive(Clone, Debug)]
pub struct GeneratedFloor {
    pub grid: Grid,
    pub player_spawn: Vec2,
    pub exit: Vec2,
    /// Walkable floor cells reachable from the spawn, excluding the spawn room.
    pub open_cells: Vec<Vec2>,
}

pub fn generate_floor(floor: u32, map: &MapConfig, rng: &mut Rng) -> GeneratedFloor {
    let width = map.width;
    let height = map.height;
    let mut grid = Grid::new(width, height, CellKind::Bulkhead);
    let mut rooms: Vec<Room> = Vec::new();

    for _ in 0..map.room_attempts {
        if rooms.len() >= map.max_rooms {
            break;
        }
        let w = rng.int(map.room_min_size, map.room_max_size);
        let max_h = map.room_max_size.min(height / 3).max(map.room_min_size);
        let h = rng.int(map.room_min_size, max_h);
        let x = rng.int(1, (width - w - 2).max(1));
        let y = rng.int(1, (height - h - 2).max(1));
        let candidate = Room { x, y, w, h };
        if rooms.iter().any(|room| room.intersects_padded(&candidate)) {
            continue;
        }
        rooms.push(candidate);
    }
    if rooms.len() < 2 {
        rooms = fallback_rooms(width, height);
    }

    for room in &rooms {
        for cell in room.cells() {
            grid.set(cell, CellKind::Floor);
        }
    }
    for pair in rooms.windows(2) {
        carve_corridor(&mut grid, pair[0].center(), pair[1].center(), rng.bool(0.5));
    }

    let player_spawn = rooms[0].center();
    let last_room = rooms[rooms.len() - 1];
    let exit = if floor >= MAX_FLOOR {
        for cell in last_room.cells() {
            grid.set(cell, CellKind::EngineRoom);
        }
        let core = last_room.center();
        grid.set(core, CellKind::EngineCore);
        core
    } else {
        let elevator = last_room.center();
        grid.set(elevator, CellKind::Elevator);
        elevator
    };

    let reachable = reachable_cells(&grid, player_spawn);
    let first_room = rooms[0];
    let mut open_cells: Vec<Vec2> = reachable
        .iter()
        .copied()
        .filter(|cell| grid.at(*cell) == Some(CellKind::Floor))
        .filter(|cell| {
            !(cell.x >= first_room.x
                && cell.x < first_room.x + first_room.w
                && cell.y >= first_room.y
                && cell.y < first_room.y + first_room.h)
        })
        .collect();
    open_cells.sort();

    GeneratedFloor {
        grid,
        player_spawn,
        exit,
        open_cells,
    }
}

fn fallback_rooms(width: i32, height: i32) -> Vec<Room> {
    let h = (height - 4).clamp(3, 6);
    vec![
        Room { x: 2, y: 2, w: 5, h },
        Room {
            x: width - 8,
            y: 2,
            w: 5,
            h,
        },
    ]
}

fn carve_corridor(grid: &mut Grid, from: Vec2, to: Vec2, horizontal_first: bool) {
    let corner = if horizontal_first {
        Vec2::new(to.x, from.y)
    } else {
        Vec2::new(from.x, to.y)
    };
    carve_line(grid, from, corner);
    carve_line(grid, corner, to);
}

fn carve_line(grid: &mut Grid, from: Vec2, to: Vec2) {
    let dx = (to.x - from.x).signum();
    let dy = (to.y - from.y).signum();
    let mut cursor = from;
    loop {
        if grid.at(cursor) == Some(CellKind::Bulkhead) {
            grid.set(cursor, CellKind::Floor);
        }
        if cursor == to {
            break;
        }
        cursor = cursor.offset(dx, dy);
    }
}

pub fn is_walkable_terrain(kind: CellKind) -> bool {
    !matches!(kind, CellKind::Bulkhead | CellKind::Empty)
}

fn reachable_cells(grid: &Grid, start: Vec2) -> HashSet<Vec2> {
    let mut out = HashSet::new();
    if !grid.at(start).map(is_walkable_terrain).unwrap_or(false) {
        return out;
    }
    let mut queue = VecDeque::new();
    out.insert(start);
    queue.push_back(start);
    while let Some(cell) = queue.pop_front() {
        for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            let next = cell.offset(dx, dy);
            if !grid.at(next).map(is_walkable_terrain).unwrap_or(false) {
                continue;
            }
            if out.insert(next) {
                queue.push_back(next);
            }
        }
    }
    out
}

/// Cells seen from `origin`: a short radius all around plus a longer cone
/// along `facing`, with bulkheads blocking line of sight.
pub fn compute_visibility(grid: &Grid, origin: Vec2, facing: Direction) -> Vec<Vec<bool>> {
    let mut visible = vec![vec![false; grid.width.max(0) as usize]; grid.height.max(0) as usize];
    let (fx, fy) = facing.delta();
    let facing_len = ((fx * fx + fy * fy) as f32).sqrt();

    for y in (origin.y - CONE_RADIUS)..=(origin.y + CONE_RADIUS) {
        for x in (origin.x - CONE_RADIUS)..=(origin.x + CONE_RADIUS) {
            if !grid.in_bounds(x, y) {
                continue;
            }
            let dx = x - origin.x;
            let dy = y - origin.y;
            let dist_sq = dx * dx + dy * dy;
            let in_radius = dist_sq <= VISION_RADIUS * VISION_RADIUS;
            let in_cone = dist_sq <= CONE_RADIUS * CONE_RADIUS && dist_sq > 0 && {
                let dot = (dx * fx + dy * fy) as f32;
                let cos = dot / ((dist_sq as f32).sqrt() * facing_len);
                cos >= std::f32::consts::FRAC_1_SQRT_2
            };
            if !(in_radius || in_cone) {
                continue;
            }
            if has_line_of_sight(grid, origin, Vec2::new(x, y)) {
                visible[y as usize][x as usize] = true;
            }
        }
    }
    visible
}

pub fn has_line_of_sight(grid: &Grid, from: Vec2, to: Vec2) -> bool {
    let mut x = from.x;
    let mut y = from.y;
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        if x == to.x && y == to.y {
            return true;
        }
        if (x != from.x || y != from.y) && grid.blocks_sight(x, y) {
            return false;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_exit_is_reachable_from_spawn() {
        let map = MapConfig::default();
        for seed in 0..100u32 {
            let mut rng = Rng::new(seed);
            let floor = generate_floor(1 + seed % 19, &map, &mut rng);
            let reachable = reachable_cells(&floor.grid, floor.player_spawn);
            assert!(
                reachable.contains(&floor.exit),
                "exit unreachable: seed={seed}"
            );
            assert_eq!(floor.grid.count(CellKind::Elevator), 1);
        }
    }

    #[test]
    fn final_deck_has_engine_core_instead_of_elevator() {
        let map = MapConfig::default();
        for seed in 0..50u32 {
            let mut rng = Rng::new(seed);
            let floor = generate_floor(MAX_FLOOR, &map, &mut rng);
            assert_eq!(floor.grid.count(CellKind::Elevator), 0);
            assert_eq!(floor.grid.count(CellKind::EngineCore), 1);
            let reachable = reachable_cells(&floor.grid, floor.player_spawn);
            assert!(reachable.contains(&floor.exit));
        }
    }

    #[test]
    fn open_cells_are_floor_outside_spawn_room() {
        let map = MapConfig::default();
        let mut rng = Rng::new(77);
        let floor = generate_floor(3, &map, &mut rng);
        assert!(!floor.open_cells.is_empty());
        for cell in &floor.open_cells {
            assert_eq!(floor.grid.at(*cell), Some(CellKind::Floor));
            assert_ne!(*cell, floor.player_spawn);
        }
    }

    #[test]
    fn bulkhead_blocks_line_of_sight() {
        let mut grid = Grid::new(10, 3, CellKind::Floor);
        assert!(has_line_of_sight(&grid, Vec2::new(0, 1), Vec2::new(9, 1)));
        grid.set(Vec2::new(5, 1), CellKind::Bulkhead);
        assert!(!has_line_of_sight(&grid, Vec2::new(0, 1), Vec2::new(9, 1)));
        assert!(has_line_of_sight(&grid, Vec2::new(0, 1), Vec2::new(5, 1)));
    }

    #[test]
    fn facing_cone_sees_further_ahead_than_behind() {
        let grid = Grid::new(30, 3, CellKind::Floor);
        let origin = Vec2::new(15, 1);
        let visible = compute_visibility(&grid, origin, Direction::Right);
        assert!(visible[1][15 + CONE_RADIUS as usize]);
        assert!(!visible[1][15 - CONE_RADIUS as usize]);
        assert!(visible[1][15 - VISION_RADIUS as usize]);
    }
}
