use flickcol::*;
use glam::Vec2;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn unit(seed: &mut u32) -> f32 {
    lcg(seed) as f32 / u32::MAX as f32
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("flickcol=warn".parse()?))
        .init();

    // 128x128 map, solid border plus a sparse checker of blocks
    let (w, h) = (128u32, 128u32);
    let mut data = vec![0u32; (w * h) as usize];
    for y in 0..h {
        for x in 0..w {
            let border = x == 0 || y == 0 || x == w - 1 || y == h - 1;
            if border || (x ^ y) & 0x7 == 0 {
                data[(y * w + x) as usize] = 1;
            }
        }
    }
    let tile = Vec2::splat(8.0);
    let grid = TileGrid::new(w, h, tile, data)?;
    let size = grid.size();

    for divisions in [2u32, 4, 6] {
        let cfg = WorldConfig::with_bounds(Rect::from_min_size(Vec2::ZERO, size), divisions);
        let mut world = World::new(cfg)?;
        let map = world.add_tilemap(Vec2::ZERO, grid.clone());

        let mut seed = 7u32;
        let bodies: Vec<BodyId> = (0..2000)
            .map(|_| {
                let pos = Vec2::new(unit(&mut seed), unit(&mut seed)) * (size - 16.0) + 8.0;
                let vel = Vec2::new(unit(&mut seed) - 0.5, unit(&mut seed) - 0.5) * 240.0;
                world.add(Body::new(pos, Vec2::splat(5.0)).with_velocity(vel))
            })
            .collect();

        let mut contacts = 0usize;
        let t0 = Instant::now();
        let mut last = TreeStats::default();
        for _ in 0..60 {
            world.step(1.0 / 60.0);
            let (_, tree) = world.collide_with_tree(&bodies, &bodies);
            last = tree.stats();
            world.collide(&bodies, &[map]);
            contacts += world.drain_contacts().len();
        }
        let secs = t0.elapsed().as_secs_f64();
        println!(
            "divisions={} nodes={} entries={} depth={} pairs={} contacts={} secs={:.3}",
            divisions, last.nodes, last.entries, last.max_depth, last.candidate_pairs, contacts, secs
        );
    }
    Ok(())
}
