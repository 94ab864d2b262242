// Headless host for the particle simulation: runs the fixed-rate scheduler
// alongside a render-rate loop that drains finished ticks into an instance
// buffer, the way a windowed renderer would.
use particle_life::constants::{DEFAULT_RUN_SECS, RENDER_RATE_HZ, STATS_INTERVAL_SECS};
use particle_life::{InstanceBuffer, Scheduler, Simulation, SimulationConfig, Species, TickClock};
use std::time::{Duration, Instant};

// --- Main Function ---
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Usage: particle-life [config.json] [seconds]
    let mut args = std::env::args().skip(1);
    let simulation_config = match args.next() {
        Some(path) => SimulationConfig::load(&path)?,
        None => SimulationConfig::default(),
    };
    let run_secs: f64 = match args.next() {
        Some(secs) => secs.parse()?,
        None => DEFAULT_RUN_SECS,
    };

    let simulation = Simulation::new(&simulation_config)?;
    for species in Species::ALL {
        log::info!(
            "{:>6}: {} particles",
            species.name(),
            simulation.store().count(species)
        );
    }

    let render_sync = simulation.render_sync();
    let controls = simulation.controls();
    let mut instance_buffer = InstanceBuffer::new(simulation.len());
    let mut scheduler = Scheduler::new(simulation);
    scheduler.start()?;

    let start_time = Instant::now();
    let run_duration = Duration::from_secs_f64(run_secs.max(0.0));
    let mut frame_clock = TickClock::new(Duration::from_secs_f64(1.0 / RENDER_RATE_HZ), start_time);
    let mut last_fps_update_time = start_time;
    let mut frames_since_last_fps_update = 0u64;
    let mut syncs_since_last_fps_update = 0u64;
    let mut ticks_at_last_fps_update = 0u64;

    while start_time.elapsed() < run_duration {
        let now = Instant::now();
        if !frame_clock.poll(now) {
            std::thread::sleep(frame_clock.until_next(now));
            continue;
        }

        // --- Render Frame ---
        frames_since_last_fps_update += 1;
        if render_sync.sync(&mut instance_buffer) {
            syncs_since_last_fps_update += 1;
            // A real renderer would upload instance_buffer.as_bytes() here.
            instance_buffer.mark_uploaded();
        }

        let elapsed_secs = now.duration_since(last_fps_update_time).as_secs_f64();
        if elapsed_secs >= STATS_INTERVAL_SECS {
            let ticks = scheduler.tick_count();
            log::info!(
                "Render: {:.1} fps, {:.1} syncs/s - Sim: {:.1} ticks/s",
                frames_since_last_fps_update as f64 / elapsed_secs,
                syncs_since_last_fps_update as f64 / elapsed_secs,
                (ticks - ticks_at_last_fps_update) as f64 / elapsed_secs
            );
            last_fps_update_time = now;
            frames_since_last_fps_update = 0;
            syncs_since_last_fps_update = 0;
            ticks_at_last_fps_update = ticks;
        }
    }

    scheduler.stop()?;
    let path = controls.export_to_dir(std::env::current_dir()?)?;
    println!(
        "Ran {} ticks in {:.1}s; parameters saved to {}",
        scheduler.tick_count(),
        start_time.elapsed().as_secs_f64(),
        path.display()
    );
    Ok(())
}
