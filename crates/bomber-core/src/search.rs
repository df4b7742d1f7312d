//! Breadth-first searches over the board.
//!
//! All searches walk the 4-connected grid in [`Direction::ALL`] order and
//! share one notion of traversability: in bounds, and either free or
//! carrying a bonus. Walls, soft walls, bombs and other players block.

use crate::board::{Board, Direction, Position};
use crate::game::Bomb;
use std::collections::{HashMap, HashSet, VecDeque};

/// Cells from which a bomb would hit a soft wall, in discovery order.
///
/// Starting at `from`, rays are cast in every direction from every reached
/// cell. A ray continues through traversable cells (which join the frontier),
/// records the last cell before the first soft wall it meets, and stops
/// silently on a wall, a bomb or anything else that blocks.
pub fn soft_wall_approaches(board: &Board, from: Position) -> Vec<Position> {
    let mut candidates = Vec::new();
    let mut visited = HashSet::from([from]);
    let mut frontier = VecDeque::from([from]);

    while let Some(origin) = frontier.pop_front() {
        for direction in Direction::ALL {
            let mut previous = origin;
            let mut current = origin.step(direction);

            while board.in_bounds(current) {
                if board.is_soft_wall(current) {
                    candidates.push(previous);
                    break;
                }
                if !board.is_traversable(current) {
                    break;
                }
                if visited.insert(current) {
                    frontier.push_back(current);
                }
                previous = current;
                current = current.step(direction);
            }
        }
    }

    candidates
}

/// The soft wall approach cell closest to `from` by Manhattan distance.
///
/// Ties go to the candidate discovered first.
pub fn nearest_soft_wall_approach(board: &Board, from: Position) -> Option<Position> {
    soft_wall_approaches(board, from)
        .into_iter()
        .min_by_key(|candidate| candidate.distance_to(&from))
}

/// Shortest sequence of moves from `start` to `target`.
///
/// Returns an empty path when the target cannot be reached (or is `start`).
pub fn find_path(board: &Board, start: Position, target: Position) -> Vec<Direction> {
    if start == target {
        return Vec::new();
    }

    let mut came_from: HashMap<Position, (Position, Direction)> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    let mut visited = HashSet::from([start]);

    while let Some(current) = queue.pop_front() {
        if current == target {
            return rebuild_path(&came_from, start, target);
        }

        for direction in Direction::ALL {
            let next = current.step(direction);
            if board.is_traversable(next) && visited.insert(next) {
                came_from.insert(next, (current, direction));
                queue.push_back(next);
            }
        }
    }

    Vec::new()
}

fn rebuild_path(
    came_from: &HashMap<Position, (Position, Direction)>,
    start: Position,
    target: Position,
) -> Vec<Direction> {
    let mut path = Vec::new();
    let mut current = target;
    while current != start {
        match came_from.get(&current) {
            Some(&(previous, direction)) => {
                path.push(direction);
                current = previous;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

/// Whether any registered bomb reaches the cell.
///
/// A cell is in danger when it shares a row or column with a bomb and lies
/// within that bomb's radius along the shared axis. Walls in between do not
/// shield it.
pub fn is_in_danger(bombs: &[Bomb], pos: Position) -> bool {
    bombs.iter().any(|bomb| bomb.reaches(pos))
}

/// Nearest (by hop count) traversable cell that no bomb reaches.
pub fn nearest_safe_cell(board: &Board, bombs: &[Bomb], from: Position) -> Option<Position> {
    let mut queue = VecDeque::from([from]);
    let mut visited = HashSet::from([from]);

    while let Some(current) = queue.pop_front() {
        if board.is_traversable(current) && !is_in_danger(bombs, current) {
            return Some(current);
        }

        for direction in Direction::ALL {
            let next = current.step(direction);
            if board.is_traversable(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    None
}
