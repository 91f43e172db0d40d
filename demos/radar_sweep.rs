//! Radar sweep demo
//!
//! Populates an asteroid field, flies a ship across it, and runs a radar
//! query each tick: broad-phase candidates from the index, then an exact
//! distance filter against the authoritative positions.
//!
//! Run with: cargo run --example radar_sweep

use glam::Vec3;
use rand::{Rng, SeedableRng};

use voidgrid::{EntityId, SpatialIndex};

const ASTEROID_COUNT: u64 = 5_000;
const FIELD_EXTENT: f32 = 20_000.0;
const RADAR_RANGE: f32 = 600.0;
const TICKS: u32 = 120;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting radar sweep demo");

    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let mut index = SpatialIndex::new(200.0).expect("valid cell size");

    // Authoritative positions stay with the caller; the index only keeps
    // cell membership.
    let mut asteroids = Vec::with_capacity(ASTEROID_COUNT as usize);
    for i in 0..ASTEROID_COUNT {
        let position = Vec3::new(
            rng.gen_range(-FIELD_EXTENT..FIELD_EXTENT),
            rng.gen_range(-2_000.0..2_000.0),
            rng.gen_range(-FIELD_EXTENT..FIELD_EXTENT),
        );
        let radius = rng.gen_range(5.0..120.0);
        let id = EntityId::new(i);
        index.insert(id, position, radius).expect("fresh id");
        asteroids.push((id, position, radius));
    }
    tracing::info!(
        "Indexed {} asteroids across {} cells",
        index.len(),
        index.cell_count()
    );

    let mut ship = Vec3::new(-FIELD_EXTENT, 0.0, 0.0);
    let velocity = Vec3::new(2.0 * FIELD_EXTENT / TICKS as f32, 0.0, 0.0);

    for tick in 0..TICKS {
        ship += velocity;

        let candidates = index.query_sphere(ship, RADAR_RANGE);
        // Narrow phase: exact range check on the candidates only
        let contacts = asteroids
            .iter()
            .filter(|(id, position, radius)| {
                candidates.contains(id) && ship.distance(*position) <= RADAR_RANGE + radius
            })
            .count();

        if contacts > 0 {
            tracing::info!(
                "tick {tick}: {} broad-phase candidates, {contacts} radar contacts",
                candidates.len()
            );
        }
    }
}
