use thiserror::Error;

/// Errors raised while validating parameters or building the kernel.
/// All of them abort the run before any iteration happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid size nx must be positive")]
    ZeroSize,
    #[error("starting grid is {w}x{h}, expected {expected}x{expected}")]
    GridShape { expected: usize, w: usize, h: usize },
    #[error("iteration count must be positive")]
    ZeroIterations,
    #[error("{name} = {value} must lie within [0, 1]")]
    OutOfUnitRange { name: &'static str, value: f32 },
    #[error("neighb_fraction = {0} must lie strictly between 0 and 1")]
    InvalidFraction(f32),
    #[error("{name} = {value} must be finite and positive")]
    NonPositive { name: &'static str, value: f32 },
    #[error("degenerate kernel: {0}")]
    DegenerateKernel(String),
    #[error("failed to read parameters: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse parameters: {0}")]
    Json(#[from] serde_json::Error),
}

/// Lower/upper margin a density estimate is clamped into.
pub const DENSITY_EPS: f32 = 1e-6;

/// A density estimate of exactly 0 or 1, which would divide by zero in the
/// transition model. Always recovered through [`NumericDegeneracy::clamped`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("density {density} outside the open interval (0, 1)")]
pub struct NumericDegeneracy {
    pub density: f32,
}

impl NumericDegeneracy {
    pub fn clamped(&self) -> f32 {
        if self.density.is_nan() {
            return DENSITY_EPS;
        }
        self.density.clamp(DENSITY_EPS, 1.0 - DENSITY_EPS)
    }
}
