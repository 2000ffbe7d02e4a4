//! Timing presets: fixed `(level interval, max levels)` pairs.

use std::fmt;
use std::str::FromStr;

use super::Options;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingPreset {
    Gentle,
    Standard,
    Aggressive,
}

impl TimingPreset {
    pub const ALL: [TimingPreset; 3] = [
        TimingPreset::Gentle,
        TimingPreset::Standard,
        TimingPreset::Aggressive,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TimingPreset::Gentle => "gentle",
            TimingPreset::Standard => "standard",
            TimingPreset::Aggressive => "aggressive",
        }
    }

    pub fn level_interval_minutes(&self) -> f64 {
        match self {
            TimingPreset::Gentle => 10.0,
            TimingPreset::Standard => 5.0,
            TimingPreset::Aggressive => 3.0,
        }
    }

    pub fn max_levels(&self) -> u32 {
        match self {
            TimingPreset::Gentle => 4,
            TimingPreset::Standard => 5,
            TimingPreset::Aggressive => 7,
        }
    }

    /// Overwrite the timing fields; everything else is untouched.
    pub fn apply(&self, options: &mut Options) {
        options.level_interval_minutes = self.level_interval_minutes();
        options.max_levels = self.max_levels();
    }

    /// The preset matching the options' timing, if any.
    pub fn detect(options: &Options) -> Option<TimingPreset> {
        TimingPreset::ALL.into_iter().find(|p| {
            p.level_interval_minutes() == options.level_interval_minutes
                && p.max_levels() == options.max_levels
        })
    }
}

impl fmt::Display for TimingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimingPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TimingPreset::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                anyhow::anyhow!("Unknown preset '{s}' (use gentle, standard, or aggressive)")
            })
    }
}
