/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::ffi::OsStr;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::execute;
use tracing_subscriber::EnvFilter;

use config::{GameConfig, LogConfig};
use sim::event::GameEvent;
use sim::step;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

/// Sleep between input polls while waiting for the next frame.
const POLL_SLEEP: Duration = Duration::from_millis(2);

fn main() -> anyhow::Result<()> {
    let config = GameConfig::load();
    init_logging(&config.log);
    tracing::info!(
        width = config.world.width,
        height = config.world.height,
        workers = config.world.workers,
        "starting"
    );

    let mut world = WorldState::new(&config, Instant::now());
    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;
    let release_events = enable_key_release();

    let mut sound = SoundEngine::new();
    if let Some(s) = sound.as_mut() {
        s.start_ambient();
    }

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config, release_events);

    if release_events {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    let inv = world.inventory();
    tracing::info!(trades = inv.trades, workers = inv.workers, "exited");
    println!();
    println!("Thanks for tending the village!");
    println!("Shrine offerings: {}   Workers: {}", inv.trades, inv.workers);
    Ok(())
}

/// Log to a file; the terminal belongs to the game. `RUST_LOG` overrides
/// the configured filter. An unwritable log path falls back to the temp
/// dir, and failing that the game runs without logs.
fn init_logging(cfg: &LogConfig) {
    let Some((file, path)) = open_log_file(&cfg.file) else {
        eprintln!("Logging disabled: cannot create {}", cfg.file.display());
        return;
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    if let Err(e) = installed {
        eprintln!("Logging disabled: {e}");
        return;
    }
    if path != cfg.file {
        tracing::warn!(configured = %cfg.file.display(), using = %path.display(), "log path unwritable");
    }
}

/// Create the log file, or a same-named one in the temp dir.
fn open_log_file(path: &Path) -> Option<(File, PathBuf)> {
    let fallback = std::env::temp_dir().join(path.file_name().unwrap_or(OsStr::new("shrinevale.log")));
    [path.to_path_buf(), fallback]
        .into_iter()
        .find_map(|p| File::create(&p).ok().map(|f| (f, p)))
}

/// Ask the terminal for key release events. Returns whether it agreed.
fn enable_key_release() -> bool {
    let supported = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
    if !supported {
        tracing::info!("no key release events; using hold timeout");
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    release_events: bool,
) -> anyhow::Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = release_events;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let frame = config.timing.frame();
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            tracing::info!("interrupted");
            break;
        }

        if last_frame.elapsed() >= frame {
            let now = Instant::now();
            let input = kb.frame_input(&gp);
            let events = step::step(world, input, now);
            process_events(sound, &events);
            if world.exit_requested {
                break;
            }
            renderer.render(world).context("render failed")?;
            last_frame = now;
        }

        std::thread::sleep(POLL_SLEEP);
    }
    Ok(())
}

fn process_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for ev in events {
        match ev {
            GameEvent::VillageRebuilt => tracing::info!("the village has been rebuilt"),
            GameEvent::SceneChanged { scene } => tracing::debug!(scene, "scene changed"),
            _ => {}
        }
        if let (Some(sfx), Some(clip)) = (sound, ev.clip()) {
            sfx.play(clip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_log_path_falls_back_to_temp_dir() {
        let wanted = PathBuf::from("/proc/no_such_dir/shrinevale-fallback.log");
        let (_file, path) = open_log_file(&wanted).unwrap();
        assert_eq!(path, std::env::temp_dir().join("shrinevale-fallback.log"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn logging_failure_does_not_stop_startup() {
        let cfg = LogConfig {
            file: PathBuf::from("/proc/no_such_dir/shrinevale-start.log"),
            filter: "info".into(),
        };
        init_logging(&cfg);
        tracing::info!("still running");
        let _ = std::fs::remove_file(std::env::temp_dir().join("shrinevale-start.log"));
    }
}
