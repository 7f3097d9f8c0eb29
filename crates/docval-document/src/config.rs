//! Validation rule configuration.

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use docval_core::{Error, Result};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

// Default values
const DEFAULT_MIN_SCRIPT_PERCENT: u8 = 90;
const DEFAULT_MAX_DATE_SPREAD_DAYS: u32 = 3 * 365;

/// Script the document text is expected to be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TargetScript {
    #[default]
    Cyrillic,
    Latin,
}

impl TargetScript {
    /// Returns true if `c` belongs to this script.
    pub fn contains(self, c: char) -> bool {
        let c = c as u32;
        match self {
            Self::Cyrillic => matches!(
                c,
                0x0400..=0x052F
                    | 0x1C80..=0x1C8F
                    | 0x1D2B
                    | 0x1D78
                    | 0x2DE0..=0x2DFF
                    | 0xA640..=0xA69F
                    | 0xFE2E..=0xFE2F
                    | 0x1E030..=0x1E08F
            ),
            Self::Latin => matches!(
                c,
                0x0041..=0x005A
                    | 0x0061..=0x007A
                    | 0x00AA
                    | 0x00BA
                    | 0x00C0..=0x00D6
                    | 0x00D8..=0x00F6
                    | 0x00F8..=0x02AF
                    | 0x1D00..=0x1D25
                    | 0x1E00..=0x1EFF
                    | 0x2C60..=0x2C7F
                    | 0xA722..=0xA7FF
                    | 0xAB30..=0xAB64
                    | 0xFB00..=0xFB06
                    | 0xFF21..=0xFF3A
                    | 0xFF41..=0xFF5A
            ),
        }
    }
}

/// Thresholds for the content rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ValidationConfig {
    /// Script the document text must be written in
    #[cfg_attr(
        feature = "config",
        arg(
            long = "validation-target-script",
            env = "VALIDATION_TARGET_SCRIPT",
            value_enum,
            default_value_t = TargetScript::Cyrillic
        )
    )]
    pub target_script: TargetScript,

    /// Minimum share of letters in the target script, in percent (inclusive)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "validation-min-script-percent",
            env = "VALIDATION_MIN_SCRIPT_PERCENT",
            default_value_t = DEFAULT_MIN_SCRIPT_PERCENT
        )
    )]
    pub min_script_percent: u8,

    /// Maximum distance between the earliest and latest date, in days (inclusive)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "validation-max-date-spread-days",
            env = "VALIDATION_MAX_DATE_SPREAD_DAYS",
            default_value_t = DEFAULT_MAX_DATE_SPREAD_DAYS
        )
    )]
    pub max_date_spread_days: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            target_script: TargetScript::default(),
            min_script_percent: DEFAULT_MIN_SCRIPT_PERCENT,
            max_date_spread_days: DEFAULT_MAX_DATE_SPREAD_DAYS,
        }
    }
}

impl ValidationConfig {
    /// Set the target script.
    #[must_use]
    pub fn with_target_script(mut self, script: TargetScript) -> Self {
        self.target_script = script;
        self
    }

    /// Set the minimum script share in percent.
    #[must_use]
    pub fn with_min_script_percent(mut self, percent: u8) -> Self {
        self.min_script_percent = percent;
        self
    }

    /// Set the maximum date spread in days.
    #[must_use]
    pub fn with_max_date_spread_days(mut self, days: u32) -> Self {
        self.max_date_spread_days = days;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.min_script_percent == 0 || self.min_script_percent > 100 {
            return Err(Error::configuration()
                .with_message("minimum script percent must be between 1 and 100"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ValidationConfig::default();
        assert_eq!(config.target_script, TargetScript::Cyrillic);
        assert_eq!(config.min_script_percent, 90);
        assert_eq!(config.max_date_spread_days, 1095);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_percent() {
        assert!(ValidationConfig::default().with_min_script_percent(0).validate().is_err());
        assert!(ValidationConfig::default().with_min_script_percent(101).validate().is_err());
    }

    #[test]
    fn test_script_membership() {
        assert!(TargetScript::Cyrillic.contains('ж'));
        assert!(TargetScript::Cyrillic.contains('Ё'));
        assert!(!TargetScript::Cyrillic.contains('z'));
        assert!(TargetScript::Latin.contains('z'));
        assert!(TargetScript::Latin.contains('é'));
        assert!(!TargetScript::Latin.contains('ж'));
    }
}
