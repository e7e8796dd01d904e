/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub world: WorldConfig,
    pub motion: MotionConfig,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
    pub log: LogConfig,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame_ms: u64,
    pub anim_interval_ms: u64,
    pub crop_stage_ticks: u32,   // frames per crop growth stage
    pub shrine_glow_frames: u32, // shrine glow after a visit
}

#[derive(Clone, Debug)]
pub struct WorldConfig {
    pub width: u32,
    pub height: u32,
    pub workers: usize,
}

#[derive(Clone, Debug)]
pub struct MotionConfig {
    pub player_speed: f64,
    pub diagonal_factor: f64,
    pub worker_step: f64,
    pub chicken_step: f64,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub base_capacity: u32,
    pub capacity_cap: u32,
    pub deposit_threshold: u32,
    pub greedy_limit: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub action: Vec<String>,
    pub pause: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub file: PathBuf,
    pub filter: String,
}

impl TimingConfig {
    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    pub fn anim_interval(&self) -> Duration {
        Duration::from_millis(self.anim_interval_ms)
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    world: TomlWorld,
    #[serde(default)]
    player: TomlMotion,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_anim_interval")]
    anim_interval_ms: u64,
    #[serde(default = "default_crop_stage")]
    crop_stage_ticks: u32,
    #[serde(default = "default_shrine_glow")]
    shrine_glow_frames: u32,
}

#[derive(Deserialize, Debug)]
struct TomlWorld {
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_height")]
    height: u32,
    #[serde(default = "default_workers")]
    workers: usize,
}

#[derive(Deserialize, Debug)]
struct TomlMotion {
    #[serde(default = "default_player_speed")]
    speed: f64,
    #[serde(default = "default_diagonal")]
    diagonal_factor: f64,
    #[serde(default = "default_worker_step")]
    worker_step: f64,
    #[serde(default = "default_chicken_step")]
    chicken_step: f64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_base_capacity")]
    base_capacity: u32,
    #[serde(default = "default_capacity_cap")]
    capacity_cap: u32,
    #[serde(default = "default_deposit_threshold")]
    deposit_threshold: u32,
    #[serde(default = "default_greedy_limit")]
    greedy_limit: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_action")]
    action: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_filter")]
    filter: String,
}

// ── Defaults ──

fn default_frame_ms() -> u64 { 16 }          // ~60 frames per second
fn default_anim_interval() -> u64 { 250 }
fn default_crop_stage() -> u32 { 120 }       // 2s per stage at 60 fps
fn default_shrine_glow() -> u32 { 60 }
fn default_width() -> u32 { 640 }
fn default_height() -> u32 { 360 }
fn default_workers() -> usize { 10 }
fn default_player_speed() -> f64 { 3.0 }
fn default_diagonal() -> f64 { 0.8 }
fn default_worker_step() -> f64 { 1.0 }
fn default_chicken_step() -> f64 { 0.5 }
fn default_base_capacity() -> u32 { 2 }
fn default_capacity_cap() -> u32 { 5 }
fn default_deposit_threshold() -> u32 { 10 }
fn default_greedy_limit() -> u32 { 5 }

fn default_action() -> Vec<String> { vec!["A".into()] }
fn default_pause() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_log_file() -> String { "shrinevale.log".into() }
fn default_log_filter() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            anim_interval_ms: default_anim_interval(),
            crop_stage_ticks: default_crop_stage(),
            shrine_glow_frames: default_shrine_glow(),
        }
    }
}

impl Default for TomlWorld {
    fn default() -> Self {
        TomlWorld {
            width: default_width(),
            height: default_height(),
            workers: default_workers(),
        }
    }
}

impl Default for TomlMotion {
    fn default() -> Self {
        TomlMotion {
            speed: default_player_speed(),
            diagonal_factor: default_diagonal(),
            worker_step: default_worker_step(),
            chicken_step: default_chicken_step(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            base_capacity: default_base_capacity(),
            capacity_cap: default_capacity_cap(),
            deposit_threshold: default_deposit_threshold(),
            greedy_limit: default_greedy_limit(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            action: default_action(),
            pause: default_pause(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse a config document. Missing keys take their defaults.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(toml_cfg, &[]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Relative log paths land next to the first candidate dir (the exe).
        let log_path = PathBuf::from(&cfg.log.file);
        let log_file = if log_path.is_absolute() {
            log_path
        } else {
            search_dirs.first()
                .map(|d| d.join(&log_path))
                .unwrap_or(log_path)
        };

        GameConfig {
            timing: TimingConfig {
                frame_ms: cfg.timing.frame_ms.max(1),
                anim_interval_ms: cfg.timing.anim_interval_ms.max(1),
                crop_stage_ticks: cfg.timing.crop_stage_ticks.max(1),
                shrine_glow_frames: cfg.timing.shrine_glow_frames,
            },
            world: WorldConfig {
                width: cfg.world.width.max(1),
                height: cfg.world.height.max(1),
                workers: cfg.world.workers,
            },
            motion: MotionConfig {
                player_speed: cfg.player.speed,
                diagonal_factor: cfg.player.diagonal_factor,
                worker_step: cfg.player.worker_step,
                chicken_step: cfg.player.chicken_step,
            },
            rules: RulesConfig {
                base_capacity: cfg.rules.base_capacity,
                capacity_cap: cfg.rules.capacity_cap.max(cfg.rules.base_capacity),
                deposit_threshold: cfg.rules.deposit_threshold.max(1),
                greedy_limit: cfg.rules.greedy_limit,
            },
            gamepad: GamepadConfig {
                action: cfg.gamepad.action,
                pause: cfg.gamepad.pause,
                quit: cfg.gamepad.quit,
            },
            log: LogConfig {
                file: log_file,
                filter: cfg.log.filter,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
///
/// Runs before logging is set up, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.timing.anim_interval_ms, 250);
        assert_eq!(cfg.timing.crop_stage_ticks, 120);
        assert_eq!(cfg.world.width, 640);
        assert_eq!(cfg.world.workers, 10);
        assert_eq!(cfg.motion.player_speed, 3.0);
        assert_eq!(cfg.rules.deposit_threshold, 10);
        assert_eq!(cfg.gamepad.pause, vec!["Start".to_string()]);
        assert_eq!(cfg.log.file, PathBuf::from("shrinevale.log"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let text = "[player]\nspeed = 4.5\n\n[rules]\ngreedy_limit = 7\n";
        let cfg = GameConfig::parse(text).unwrap();
        assert_eq!(cfg.motion.player_speed, 4.5);
        assert_eq!(cfg.motion.diagonal_factor, 0.8);
        assert_eq!(cfg.rules.greedy_limit, 7);
        assert_eq!(cfg.rules.base_capacity, 2);
    }

    #[test]
    fn cap_never_below_base_capacity() {
        let cfg = GameConfig::parse("[rules]\nbase_capacity = 4\ncapacity_cap = 1\n").unwrap();
        assert_eq!(cfg.rules.capacity_cap, 4);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(GameConfig::parse("[timing]\nframe_ms = \"fast\"").is_err());
    }
}
