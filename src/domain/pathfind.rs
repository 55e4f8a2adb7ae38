/// Grid pathfinding: A* over 4-connected walkable cells.
///
/// Uniform step cost 1, Manhattan heuristic (admissible and consistent on a
/// 4-connected grid, so the first time the goal is popped its cost is optimal).
///
/// The open list is a plain vector scanned for the lowest `f`; the first
/// minimum found wins, so ties resolve in insertion order. Popped cells are
/// closed for good. An open cell reached more cheaply has its `g`, `f` and
/// parent rewritten in place.

use super::geom::Coord;
use super::maze::Grid;

/// One search node. Lives only for the duration of a `find_path` call.
#[derive(Clone, Copy, Debug)]
struct PathNode {
    at: Coord,
    g: u32,
    h: u32,
    f: u32,
    parent: Option<usize>,
}

/// Shortest walkable path from `start` to `goal`, both inclusive.
///
/// Returns `[start]` when `start == goal`, and an empty path when either
/// endpoint is off the grid or a wall, or when the goal is unreachable.
pub fn find_path(grid: &Grid, start: Coord, goal: Coord) -> Vec<Coord> {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return vec![];
    }
    if !grid.is_walkable(start) || !grid.is_walkable(goal) {
        return vec![];
    }

    let size = grid.size();
    let index = |c: Coord| c.z as usize * size + c.x as usize;

    // Arena of every node created during this call; `open` holds arena indices.
    let mut nodes: Vec<PathNode> = Vec::with_capacity(64);
    let mut open: Vec<usize> = Vec::with_capacity(32);
    let mut open_slot: Vec<Option<usize>> = vec![None; size * size];
    let mut closed = vec![false; size * size];

    let h = start.manhattan(goal) as u32;
    nodes.push(PathNode { at: start, g: 0, h, f: h, parent: None });
    open.push(0);
    open_slot[index(start)] = Some(0);

    while !open.is_empty() {
        let mut lowest = 0;
        for i in 1..open.len() {
            if nodes[open[i]].f < nodes[open[lowest]].f {
                lowest = i;
            }
        }
        let current = open.remove(lowest);
        let here = nodes[current].at;

        if here == goal {
            return reconstruct(&nodes, current);
        }

        closed[index(here)] = true;
        open_slot[index(here)] = None;

        let g = nodes[current].g + 1;
        for next in here.neighbors() {
            if !grid.is_walkable(next) || closed[index(next)] {
                continue;
            }
            match open_slot[index(next)] {
                None => {
                    let h = next.manhattan(goal) as u32;
                    nodes.push(PathNode { at: next, g, h, f: g + h, parent: Some(current) });
                    let id = nodes.len() - 1;
                    open.push(id);
                    open_slot[index(next)] = Some(id);
                }
                Some(id) if g < nodes[id].g => {
                    let node = &mut nodes[id];
                    node.g = g;
                    node.f = g + node.h;
                    node.parent = Some(current);
                }
                Some(_) => {}
            }
        }
    }

    vec![]
}

/// Follow back-pointers from `last` and return the path in start→goal order.
fn reconstruct(nodes: &[PathNode], last: usize) -> Vec<Coord> {
    let mut path = Vec::new();
    let mut cursor = Some(last);
    while let Some(i) = cursor {
        path.push(nodes[i].at);
        cursor = nodes[i].parent;
    }
    path.reverse();
    path
}
