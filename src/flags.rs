use std::fmt;
use std::str::FromStr;

/// One named boolean in the packed shared bitset.
///
/// Bit positions are fixed here and nowhere else. Adding a flag means
/// appending a new variant with the next free bit; existing positions must
/// never be renumbered because watcher configs refer to flags by name and
/// the packed byte crosses thread boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flag {
    /// Target game window is foreground and fullscreen. Session domain,
    /// written only by the window watcher worker.
    Active,
    OnGround,
    OnAir,
    ShiftLock,
    SkillReady,
    Toss,
    BarArrow,
    /// User toggle flipped from a key handler on the main thread, not by a
    /// perception worker. The only flag that defaults to `true`.
    SkillToggle,
}

impl Flag {
    pub const ALL: [Flag; 8] = [
        Flag::Active,
        Flag::OnGround,
        Flag::OnAir,
        Flag::ShiftLock,
        Flag::SkillReady,
        Flag::Toss,
        Flag::BarArrow,
        Flag::SkillToggle,
    ];

    /// Gameplay flags: everything a pixel watcher or user toggle owns.
    pub const GAMEPLAY: [Flag; 7] = [
        Flag::OnGround,
        Flag::OnAir,
        Flag::ShiftLock,
        Flag::SkillReady,
        Flag::Toss,
        Flag::BarArrow,
        Flag::SkillToggle,
    ];

    pub const fn bit(self) -> u8 {
        match self {
            Flag::Active => 0,
            Flag::OnGround => 1,
            Flag::OnAir => 2,
            Flag::ShiftLock => 3,
            Flag::SkillReady => 4,
            Flag::Toss => 5,
            Flag::BarArrow => 6,
            Flag::SkillToggle => 7,
        }
    }

    pub const fn mask(self) -> u8 {
        1 << self.bit()
    }

    /// Value the flag returns to whenever perception stops.
    pub const fn default_value(self) -> bool {
        matches!(self, Flag::SkillToggle)
    }

    pub const fn is_gameplay(self) -> bool {
        !matches!(self, Flag::Active)
    }

    pub fn name(self) -> &'static str {
        match self {
            Flag::Active => "active",
            Flag::OnGround => "on_ground",
            Flag::OnAir => "on_air",
            Flag::ShiftLock => "shift_lock",
            Flag::SkillReady => "skill_ready",
            Flag::Toss => "toss",
            Flag::BarArrow => "bar_arrow",
            Flag::SkillToggle => "skill_toggle",
        }
    }

    /// The packed byte with every flag at its default.
    pub fn default_byte() -> u8 {
        Flag::ALL
            .iter()
            .filter(|f| f.default_value())
            .fold(0u8, |byte, f| byte | f.mask())
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Flag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flag::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or(())
    }
}
