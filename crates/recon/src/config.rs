use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration. Every key is optional; missing keys take the defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub matching: MatchConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum score (0-100, plus brand boost) for a listing to match.
    pub match_threshold: f64,
    /// Added to the score when the catalog brand occurs in the listing name.
    pub brand_boost: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            match_threshold: 75.0,
            brand_boost: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Pricing rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PricingConfig {
    pub min_margin_percent: f64,
    pub undercut_delta: f64,
    pub raise_delta: f64,
    pub tolerance_percent: f64,
    /// Rounding step for recommended prices. Zero or negative disables rounding.
    pub round_to: f64,
    /// Also recommend for catalog SKUs that have no competitor data.
    pub include_unmatched: bool,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            min_margin_percent: 10.0,
            undercut_delta: 1.0,
            raise_delta: 0.5,
            tolerance_percent: 1.5,
            round_to: 1.0,
            include_unmatched: false,
        }
    }
}

impl PricingConfig {
    /// Lowest price the margin floor permits for the given cost.
    pub fn min_allowed(&self, cost: f64) -> f64 {
        cost * (1.0 + self.min_margin_percent / 100.0)
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects NaN and infinities. Ranges are not checked.
    pub fn validate(&self) -> Result<(), ReconError> {
        let fields = [
            ("matching.match_threshold", self.matching.match_threshold),
            ("matching.brand_boost", self.matching.brand_boost),
            ("pricing.min_margin_percent", self.pricing.min_margin_percent),
            ("pricing.undercut_delta", self.pricing.undercut_delta),
            ("pricing.raise_delta", self.pricing.raise_delta),
            ("pricing.tolerance_percent", self.pricing.tolerance_percent),
            ("pricing.round_to", self.pricing.round_to),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(ReconError::ConfigParse(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
