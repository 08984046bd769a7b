pub mod build;
pub mod decay;
pub mod window;

pub use build::{Kernel, distal_kernel, isotropic_kernel};
pub use window::DistalWindow;

use crate::config::{Feedback, Params};
use crate::error::ConfigError;

/// Build the kernel for the configured family, plus the distal window when
/// the family needs one.
pub fn build(params: &Params) -> Result<(Kernel, Option<DistalWindow>), ConfigError> {
    match params.feedback {
        Feedback::Isotropic { neighb_fraction } => {
            let kernel =
                isotropic_kernel(params.nx, &params.decay, params.anisotropy, neighb_fraction)?;
            Ok((kernel, None))
        }
        Feedback::Distal {
            cutoff_radius,
            cell_size,
            upstream,
        } => {
            let kernel = distal_kernel(
                params.nx,
                &params.decay,
                params.anisotropy,
                cutoff_radius,
                cell_size,
                upstream,
            )?;
            let window = DistalWindow::new(kernel.radius(), kernel.cutoff());
            if window.total() <= 0.0 {
                return Err(ConfigError::DegenerateKernel(format!(
                    "distal window of radius {} marks no neighbors",
                    kernel.cutoff()
                )));
            }
            Ok((kernel, Some(window)))
        }
    }
}
