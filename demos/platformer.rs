use flickcol::*;
use glam::Vec2;
use tracing_subscriber::EnvFilter;

const LEVEL: &str = "\
0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0
0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0
0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0
0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0
0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0
0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0
0,0,0,0,0,0,0,0,0,0,0,1,1,0,0,0
0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0
0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0
1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("flickcol=info".parse()?))
        .init();

    let mut world = World::new(WorldConfig::with_bounds(Rect::new(0.0, 0.0, 256.0, 160.0), 4))?;
    let grid = TileGrid::from_csv(LEVEL, Vec2::splat(16.0))?;
    let level = world.add_tilemap(Vec2::ZERO, grid);

    let gravity = Vec2::new(0.0, 600.0);
    let mut player = Body::new(Vec2::new(24.0, 60.0), Vec2::new(10.0, 14.0)).with_acceleration(gravity);
    player.max_velocity = Vec2::new(80.0, 300.0);
    player.drag = Vec2::new(400.0, 0.0);
    let player = world.add(player);

    // Fixed platform sliding back and forth; whoever stands on it rides along
    let platform = world.add(
        Body::fixed(Vec2::new(64.0, 112.0), Vec2::new(32.0, 8.0)).with_velocity(Vec2::new(30.0, 0.0)),
    );

    let crates: Vec<BodyId> = (0..3)
        .map(|i| {
            let pos = Vec2::new(120.0 + i as f32 * 14.0, 40.0 - i as f32 * 12.0);
            world.add(Body::new(pos, Vec2::splat(12.0)).with_acceleration(gravity))
        })
        .collect();
    let crate_group = world.add_group(&crates);

    let solids = [player, platform, crate_group];
    let dt = 1.0 / 60.0;
    for tick in 0..180 {
        // Run right for two seconds, then let drag stop the player
        world.body_mut(player).acceleration.x = if tick < 120 { 300.0 } else { 0.0 };
        if tick % 60 == 0 {
            let p = world.body_mut(platform);
            p.velocity.x = -p.velocity.x;
        }

        world.step(dt);
        world.collide(&solids, &solids);
        world.collide(&solids, &[level]);

        let contacts = world.drain_contacts();
        if tick % 20 == 0 {
            let p = world.body(player);
            println!(
                "tick {:3}: player=({:6.1},{:6.1}) vel=({:6.1},{:6.1}) on_floor={} contacts={}",
                tick,
                p.position.x,
                p.position.y,
                p.velocity.x,
                p.velocity.y,
                p.on_floor,
                contacts.len()
            );
        }
    }

    for (i, id) in crates.iter().enumerate() {
        let c = world.body(*id);
        println!("crate {}: ({:.1},{:.1}) on_floor={}", i, c.position.x, c.position.y, c.on_floor);
    }
    Ok(())
}
