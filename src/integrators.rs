use crate::errors::IntegrationError;
use crate::function::IntegrableFunction;

pub mod adaptive;
pub mod simpson;

///
/// A numerical integration algorithm.
///
/// An estimate that did not reach the configured accuracy is never
/// returned; it is reported as [`IntegrationError::NonConvergence`].
///
pub trait Integrator
{
    fn integrate(&self, function: &dyn IntegrableFunction) -> Result<f64, IntegrationError>;
}
