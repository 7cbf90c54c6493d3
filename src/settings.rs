use crate::capability::Rgb;
use crate::flags::Flag;
use crate::workers::pixels::WatchDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillMode {
    Normal,
    Boomjump,
    Stealblock,
}

impl Default for SkillMode {
    fn default() -> Self {
        SkillMode::Normal
    }
}

impl std::fmt::Display for SkillMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkillMode::Normal => write!(f, "normal"),
            SkillMode::Boomjump => write!(f, "boomjump"),
            SkillMode::Stealblock => write!(f, "stealblock"),
        }
    }
}

/// Another flag that must hold a given value before a watcher samples its
/// pixel at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchCondition {
    pub flag: String,
    pub value: bool,
}

/// One pixel-watch entry of the gameplay predicate table. Flags are referred
/// to by name so a stale settings file degrades to a skipped entry instead
/// of refusing to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    pub flag: String,
    pub point: (i32, i32),
    pub target: (u8, u8, u8),
    #[serde(default)]
    pub tolerance: u8,
    #[serde(default)]
    pub conditions: Vec<WatchCondition>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Which skill macro variant the mouse handlers run.
    #[serde(default)]
    pub skill_mode: SkillMode,
    /// Foreground window title that counts as the target game.
    #[serde(default = "default_window_title")]
    pub window_title: String,
    /// Poll interval of the window/session watcher.
    #[serde(default = "default_session_poll_ms")]
    pub session_poll_ms: u64,
    /// Poll interval of every pixel watcher.
    #[serde(default = "default_gameplay_poll_ms")]
    pub gameplay_poll_ms: u64,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// The gameplay predicate table. Which pixel means which flag varies per
    /// game revision, so it lives in configuration rather than code.
    #[serde(default = "default_watchers")]
    pub watchers: Vec<WatchConfig>,
}

fn default_window_title() -> String {
    "Roblox".into()
}

fn default_session_poll_ms() -> u64 {
    500
}

fn default_gameplay_poll_ms() -> u64 {
    12
}

fn default_watchers() -> Vec<WatchConfig> {
    vec![
        WatchConfig {
            flag: Flag::OnGround.name().into(),
            point: (942, 1003),
            target: (255, 225, 148),
            tolerance: 0,
            conditions: Vec::new(),
        },
        WatchConfig {
            flag: Flag::ShiftLock.name().into(),
            point: (1807, 969),
            target: (47, 85, 104),
            tolerance: 0,
            conditions: Vec::new(),
        },
        WatchConfig {
            flag: Flag::SkillReady.name().into(),
            point: (1029, 903),
            target: (255, 255, 255),
            tolerance: 0,
            conditions: Vec::new(),
        },
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            skill_mode: SkillMode::default(),
            window_title: default_window_title(),
            session_poll_ms: default_session_poll_ms(),
            gameplay_poll_ms: default_gameplay_poll_ms(),
            debug_logging: false,
            watchers: default_watchers(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the configured watch table into descriptors the pixel worker
    /// can run. Entries naming unknown flags, conditions on unknown flags,
    /// or non-gameplay flags are logged and skipped.
    pub fn resolve_watchers(&self) -> Vec<WatchDescriptor> {
        let mut resolved = Vec::with_capacity(self.watchers.len());
        'entries: for entry in &self.watchers {
            let Ok(flag) = entry.flag.parse::<Flag>() else {
                tracing::warn!("skipping watcher for unknown flag '{}'", entry.flag);
                continue;
            };
            if !flag.is_gameplay() {
                tracing::warn!("skipping watcher for non-gameplay flag '{flag}'");
                continue;
            }
            let mut conditions = Vec::with_capacity(entry.conditions.len());
            for cond in &entry.conditions {
                let Ok(cond_flag) = cond.flag.parse::<Flag>() else {
                    tracing::warn!(
                        "skipping watcher '{}': unknown condition flag '{}'",
                        entry.flag,
                        cond.flag
                    );
                    continue 'entries;
                };
                conditions.push((cond_flag, cond.value));
            }
            resolved.push(WatchDescriptor {
                flag,
                point: entry.point,
                target: Rgb::new(entry.target.0, entry.target.1, entry.target.2),
                tolerance: entry.tolerance,
                conditions,
            });
        }
        resolved
    }
}
