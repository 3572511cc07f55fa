use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The fixed brightness buttons that bypass the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Off,
    Dim,
    Bright,
    Full,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Off, Preset::Dim, Preset::Bright, Preset::Full];

    pub fn label(self) -> &'static str {
        match self {
            Preset::Off => "Off",
            Preset::Dim => "5%",
            Preset::Bright => "60%",
            Preset::Full => "Full",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown preset {0:?}")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    /// Accepts the caption as well as the variant name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Preset::ALL
            .into_iter()
            .find(|preset| {
                preset.label().eq_ignore_ascii_case(wanted)
                    || format!("{preset:?}").eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetLevels {
    pub off: f64,
    pub dim: f64,
    pub bright: f64,
    pub full: f64,
}

impl PresetLevels {
    pub fn level(&self, preset: Preset) -> f64 {
        match preset {
            Preset::Off => self.off,
            Preset::Dim => self.dim,
            Preset::Bright => self.bright,
            Preset::Full => self.full,
        }
    }
}

impl Default for PresetLevels {
    fn default() -> Self {
        Self {
            off: 0.0,
            dim: 0.05,
            bright: 0.6,
            full: 1.0,
        }
    }
}
