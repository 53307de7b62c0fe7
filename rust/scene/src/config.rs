// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh configuration loaded from environment variables.

use crate::error::{Error, Result};
use crate::node::ApiLevel;

/// Default lattice density for the canonical content hash.
pub const DEFAULT_HASH_DENSITY: f64 = 1000.0;

/// Largest accepted hash density. The lattice combination reaches
/// `density^3`, which must stay within `i64`.
pub const MAX_HASH_DENSITY: f64 = 1.0e6;

/// Default number of significant digits kept for the canonical spans.
pub const DEFAULT_SPAN_DIGITS: u32 = 3;

/// Mesh configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshConfig {
    /// Lattice density used to quantize canonical coordinates.
    pub hash_density: f64,
    /// Significant digits kept when hashing the canonical bounding-box spans.
    pub span_digits: u32,
    /// API level stamped on newly built or imported meshes.
    pub api_level: ApiLevel,
}

impl MeshConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            hash_density: std::env::var("MESHDOC_HASH_DENSITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_HASH_DENSITY),
            span_digits: std::env::var("MESHDOC_HASH_SPAN_DIGITS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SPAN_DIGITS),
            api_level: std::env::var("MESHDOC_API_LEVEL")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .and_then(ApiLevel::from_i64)
                .unwrap_or_default(),
        }
    }

    /// Set the hash density.
    pub fn with_hash_density(mut self, density: f64) -> Self {
        self.hash_density = density;
        self
    }

    /// Check that the values can be used for hashing.
    pub fn validate(&self) -> Result<()> {
        if !self.hash_density.is_finite() || self.hash_density <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "hash density must be finite and positive, got {}",
                self.hash_density
            )));
        }
        if self.hash_density > MAX_HASH_DENSITY {
            return Err(Error::InvalidConfig(format!(
                "hash density must not exceed {MAX_HASH_DENSITY}, got {}",
                self.hash_density
            )));
        }
        if self.span_digits == 0 {
            return Err(Error::InvalidConfig(
                "span digits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            hash_density: DEFAULT_HASH_DENSITY,
            span_digits: DEFAULT_SPAN_DIGITS,
            api_level: ApiLevel::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MeshConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_level, ApiLevel::Level1);
    }

    #[test]
    fn rejects_bad_density() {
        assert!(MeshConfig::default().with_hash_density(0.0).validate().is_err());
        assert!(MeshConfig::default()
            .with_hash_density(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn density_limit() {
        assert!(MeshConfig::default()
            .with_hash_density(MAX_HASH_DENSITY)
            .validate()
            .is_ok());
        assert!(matches!(
            MeshConfig::default().with_hash_density(1.0e7).validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_digits() {
        let config = MeshConfig {
            span_digits: 0,
            ..MeshConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
