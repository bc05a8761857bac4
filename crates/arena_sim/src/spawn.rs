//! Spawn manager (C4): finds safe spawn positions respecting margins,
//! obstacle rects, and minimum distance from live players.
//!
//! Pure functions over `&World` — no I/O, no mutation. `rand::Rng` is
//! injected so production can use `rand::thread_rng()` and tests can use a
//! seeded `rand_chacha::ChaCha8Rng` for determinism.

use crate::world::World;
use arena_core::config::SpawnConfig;
use arena_core::{Rect, Vec2};
use rand::Rng;

/// The inner rectangle spawn candidates must fall within: the world
/// bounds inset by the configured margins.
#[must_use]
pub fn inner_rect(world: &World, cfg: &SpawnConfig) -> Rect {
    let x = world.bounds.x + cfg.margin_left;
    let y = world.bounds.y + cfg.margin_top;
    let w = (world.bounds.w - cfg.margin_left - cfg.margin_right).max(0.0);
    let h = (world.bounds.h - cfg.margin_top - cfg.margin_bottom).max(0.0);
    Rect::new(x, y, w, h)
}

/// True if `p` lies within the inset spawn rectangle.
#[must_use]
pub fn is_within_spawn_bounds(world: &World, cfg: &SpawnConfig, p: Vec2) -> bool {
    inner_rect(world, cfg).contains(p)
}

/// True if `p` falls inside any obstacle rect (inclusive of edges).
#[must_use]
pub fn is_position_blocked(world: &World, p: Vec2) -> bool {
    world.obstacles.iter().any(|o| o.rect.contains(p))
}

/// A uniformly random point inside the inset spawn rectangle.
pub fn random_safe_position(world: &World, cfg: &SpawnConfig, rng: &mut impl Rng) -> Vec2 {
    let rect = inner_rect(world, cfg);
    Vec2::new(rng.gen_range(rect.x..=rect.x + rect.w), rng.gen_range(rect.y..=rect.y + rect.h))
}

fn distance_to_nearest_live_player(world: &World, p: Vec2) -> f64 {
    world
        .live_players()
        .map(|player| player.pos.distance(p))
        .fold(f64::INFINITY, f64::min)
}

/// Rejection-samples up to `cfg.max_attempts` candidates; each must satisfy
/// the spawn bounds, not be blocked by an obstacle, and be at least
/// `min_distance_from_players` from every live player. Falls back to the
/// farthest-from-any-player point among 16 additional unblocked samples,
/// then to the center, then to four corner-inset points, and finally to
/// the center even if blocked (logging a warning).
pub fn find_safe_spawn_position(world: &World, cfg: &SpawnConfig, rng: &mut impl Rng) -> Vec2 {
    for _ in 0..cfg.max_attempts {
        let candidate = random_safe_position(world, cfg, rng);
        if is_within_spawn_bounds(world, cfg, candidate)
            && !is_position_blocked(world, candidate)
            && distance_to_nearest_live_player(world, candidate) >= cfg.min_distance_from_players
        {
            return candidate;
        }
    }

    let mut best: Option<(Vec2, f64)> = None;
    for _ in 0..16 {
        let candidate = random_safe_position(world, cfg, rng);
        if is_position_blocked(world, candidate) {
            continue;
        }
        let dist = distance_to_nearest_live_player(world, candidate);
        if best.map_or(true, |(_, best_dist)| dist > best_dist) {
            best = Some((candidate, dist));
        }
    }
    if let Some((candidate, _)) = best {
        return candidate;
    }

    let rect = inner_rect(world, cfg);
    let center = Vec2::new(rect.x + rect.w / 2.0, rect.y + rect.h / 2.0);
    if !is_position_blocked(world, center) {
        return center;
    }

    let inset = (rect.w.min(rect.h) * 0.1).max(1.0);
    let corners = [
        Vec2::new(rect.x + inset, rect.y + inset),
        Vec2::new(rect.x + rect.w - inset, rect.y + inset),
        Vec2::new(rect.x + inset, rect.y + rect.h - inset),
        Vec2::new(rect.x + rect.w - inset, rect.y + rect.h - inset),
    ];
    for corner in corners {
        if !is_position_blocked(world, corner) {
            return corner;
        }
    }

    tracing::warn!("spawn manager exhausted every fallback; spawning at a possibly blocked center");
    center
}

/// Clamps each point in `points` into the inset spawn rectangle, in place.
pub fn adjust_spawn_points_to_margins(world: &World, cfg: &SpawnConfig, points: &mut [Vec2]) {
    let rect = inner_rect(world, cfg);
    for p in points.iter_mut() {
        *p = p.clamp_rect(Vec2::new(rect.x, rect.y), Vec2::new(rect.x + rect.w, rect.y + rect.h));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::SimConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn random_position_lands_within_spawn_bounds() {
        let cfg = SimConfig::default();
        let world = World::new(&cfg);
        let mut rng = rng();
        for _ in 0..50 {
            let p = random_safe_position(&world, &cfg.spawn, &mut rng);
            assert!(is_within_spawn_bounds(&world, &cfg.spawn, p));
        }
    }

    #[test]
    fn find_safe_spawn_avoids_obstacles() {
        let cfg = SimConfig::default();
        let world = World::new(&cfg);
        let mut rng = rng();
        for _ in 0..20 {
            let p = find_safe_spawn_position(&world, &cfg.spawn, &mut rng);
            assert!(!is_position_blocked(&world, p));
        }
    }

    #[test]
    fn adjust_spawn_points_clamps_into_inner_rect() {
        let cfg = SimConfig::default();
        let world = World::new(&cfg);
        let rect = inner_rect(&world, &cfg.spawn);
        let mut points = vec![Vec2::new(-100.0, -100.0), Vec2::new(100_000.0, 100_000.0)];
        adjust_spawn_points_to_margins(&world, &cfg.spawn, &mut points);
        for p in points {
            assert!(rect.contains(p));
        }
    }
}
