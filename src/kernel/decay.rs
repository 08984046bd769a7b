use crate::config::Decay;

impl Decay {
    /// Raw influence at distance `d`. The pareto form diverges at `d = 0`;
    /// callers sanitize with [`finite_or_zero`].
    #[inline]
    pub fn weight(&self, d: f32) -> f32 {
        match *self {
            Decay::Pareto { k, dmin } => {
                if d > 0.0 && d < dmin {
                    return 0.0;
                }
                k * dmin.powf(k) / d.powf(k + 1.0)
            }
            Decay::Exponential { k } => k * (-k * d).exp(),
            Decay::Linear { k } => (1.0 - d / k).max(0.0),
        }
    }

    /// Whether the weight integrates to a finite mass over the plane. The
    /// pareto tail `d^-(k+1)` over rings of length `2πd` needs `k > 1`.
    pub fn has_finite_mass(&self) -> bool {
        match *self {
            Decay::Pareto { k, .. } => k > 1.0,
            Decay::Exponential { k } | Decay::Linear { k } => k > 0.0,
        }
    }
}

#[inline]
pub fn finite_or_zero(w: f32) -> f32 {
    if w.is_finite() { w } else { 0.0 }
}

/// Distance with the row axis compressed by `anisotropy`, so values above 1
/// stretch influence along the vertical axis.
#[inline]
pub fn scaled_distance(dx: f32, dy: f32, anisotropy: f32) -> f32 {
    dx.hypot(dy / anisotropy)
}
