use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Distance-decay function the kernel is sampled from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum Decay {
    /// Inverse power law with exponent `k` and minimum distance `dmin`.
    Pareto { k: f32, dmin: f32 },
    /// Exponential with rate `k`.
    Exponential { k: f32 },
    /// Linear fall-off reaching zero at distance `k`.
    Linear { k: f32 },
}

/// Kernel family. Each family carries its own truncation rule and boundary policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum Feedback {
    /// Pure positive feedback against the global cover. The kernel keeps
    /// `neighb_fraction` of the decay mass.
    Isotropic { neighb_fraction: f32 },
    /// Local facilitation within `cutoff_radius` (physical units) plus
    /// distal negative feedback from the local density over the same window.
    Distal {
        cutoff_radius: f32,
        cell_size: f32,
        upstream: f32,
    },
}

/// All tunable parameters. The seed travels separately.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub nx: usize,
    pub iterations: usize,

    // Kernel
    pub decay: Decay,
    pub anisotropy: f32,
    pub feedback: Feedback,

    // Transition
    pub ft: f32,
    pub tamount: f32,
    pub initial_cover: f32,

    // Post-run perturbation
    pub a_degradation: f32,
    pub s_degradation: f32,

    /// Iterations between frame notifications.
    pub frame_interval: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            nx: 200,
            iterations: 1000,
            decay: Decay::Pareto { k: 2.0, dmin: 1.0 },
            anisotropy: 1.0,
            feedback: Feedback::Isotropic { neighb_fraction: 0.8 },
            ft: 0.5,
            tamount: 0.1,
            initial_cover: 0.5,
            a_degradation: 0.0,
            s_degradation: 0.0,
            frame_interval: 20,
        }
    }
}

fn unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

impl Params {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let params: Params = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    /// Reject parameters that would produce a meaningless run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nx == 0 {
            return Err(ConfigError::ZeroSize);
        }
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        unit("ft", self.ft)?;
        unit("tamount", self.tamount)?;
        unit("initial_cover", self.initial_cover)?;
        unit("a_degradation", self.a_degradation)?;
        unit("s_degradation", self.s_degradation)?;
        positive("anisotropy", self.anisotropy)?;

        match self.decay {
            Decay::Pareto { k, dmin } => {
                positive("k", k)?;
                positive("dmin", dmin)?;
            }
            Decay::Exponential { k } | Decay::Linear { k } => positive("k", k)?,
        }

        match self.feedback {
            Feedback::Isotropic { neighb_fraction } => {
                if !(neighb_fraction > 0.0 && neighb_fraction < 1.0) {
                    return Err(ConfigError::InvalidFraction(neighb_fraction));
                }
            }
            Feedback::Distal {
                cutoff_radius,
                cell_size,
                upstream,
            } => {
                positive("cutoff_radius", cutoff_radius)?;
                positive("cell_size", cell_size)?;
                if !(upstream.is_finite() && upstream >= 0.0) {
                    return Err(ConfigError::NonPositive {
                        name: "upstream",
                        value: upstream,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Params::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_out_of_range() {
        let p = Params {
            ft: 1.5,
            ..Params::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ConfigError::OutOfUnitRange { name: "ft", .. })
        ));

        let p = Params {
            nx: 0,
            ..Params::default()
        };
        assert!(matches!(p.validate(), Err(ConfigError::ZeroSize)));

        let p = Params {
            iterations: 0,
            ..Params::default()
        };
        assert!(matches!(p.validate(), Err(ConfigError::ZeroIterations)));

        let p = Params {
            feedback: Feedback::Isotropic { neighb_fraction: 1.0 },
            ..Params::default()
        };
        assert!(matches!(p.validate(), Err(ConfigError::InvalidFraction(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let p: Params = serde_json::from_str(
            r#"{"nx": 64, "decay": {"model": "exponential", "k": 0.5},
                "feedback": {"family": "distal", "cutoff_radius": 6.0, "cell_size": 1.0, "upstream": 2.0}}"#,
        )
        .unwrap();
        assert_eq!(p.nx, 64);
        assert_eq!(p.iterations, 1000);
        assert_eq!(p.decay, Decay::Exponential { k: 0.5 });
        assert!(matches!(p.feedback, Feedback::Distal { upstream, .. } if upstream == 2.0));
        p.validate().unwrap();
    }
}
