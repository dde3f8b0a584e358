use anyhow::{Context, Result};
use clap::Parser;
use potato_audio::{AudioEngineDesc, AudioEvent, AudioSession, SoundConfig, Vec3};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(
    name = "potato-audio-demo",
    about = "Orbits a looping sound around the listener"
)]
pub struct Args {
    /// Sound file to play
    pub path: PathBuf,

    /// How long to play, in seconds
    #[arg(long, default_value_t = 10)]
    pub seconds: u64,

    /// Orbit radius around the listener
    #[arg(long, default_value_t = 3.0)]
    pub radius: f32,

    /// Enable the echo effect on the master mix
    #[arg(long)]
    pub echo: bool,
}

/// Plays a looping sound orbiting the listener, driven by the movement loop.
pub fn run(args: &Args) -> Result<()> {
    let desc = AudioEngineDesc::new().movement_interval(Duration::from_millis(16));
    let mut session = AudioSession::new(desc).context("failed to create audio session")?;
    session.start().context("failed to open audio output")?;
    if args.echo {
        session.enable_echo();
    }

    let config = SoundConfig::spatial(Vec3::new(args.radius, 0.0, 0.0)).looping(true);
    let id = session
        .add_sound(&args.path, config)
        .with_context(|| format!("failed to load {}", args.path.display()))?;

    let sound = session.sound_mut(id).context("sound vanished from session")?;
    sound.play()?;
    sound.enable_3d_movement(true)?;
    log::info!("Orbiting {} at radius {}", args.path.display(), args.radius);

    let started = Instant::now();
    let total = Duration::from_secs(args.seconds);
    let mut last_report = Instant::now();
    while started.elapsed() < total {
        let angle = started.elapsed().as_secs_f32() * std::f32::consts::TAU / 4.0;
        let x = angle.cos() * args.radius;
        let z = angle.sin() * args.radius;

        if let Some(sound) = session.sound(id) {
            sound.set_position(x, 0.0, z)?;
        }

        for event in session.poll_events() {
            if event.is_error() {
                log::error!("{:?}", event);
            } else {
                log::debug!("{:?}", event);
            }
            if let AudioEvent::SoundCompleted { sound_id } = event {
                log::info!("Sound {} completed", sound_id);
            }
        }

        if last_report.elapsed() >= Duration::from_secs(1) {
            log::info!(
                "t={:.1}s position=({:.2}, 0.00, {:.2}) frames={}",
                started.elapsed().as_secs_f32(),
                x,
                z,
                session.frames_processed()
            );
            last_report = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(10));
    }

    if let Some(sound) = session.sound_mut(id) {
        sound.enable_3d_movement(false)?;
        sound.pause()?;
    }
    session.shutdown();
    log::info!("Demo finished");
    Ok(())
}
