use serde::{Deserialize, Serialize};

use crate::errors::IntegrationError;
use crate::grids::uniform_grid::{GridSpacing, MAX_LEVEL};

///
/// Parameters of an adaptive grid integration run.
///
/// Field names follow the kebab-case keys used in configuration files:
///
/// ```yaml
/// max-iterations: 20
/// initial-nstep: 3
/// max-error: 0.01
/// in-loge: false
/// fast-density-increase: true
/// ```
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IntegratorConfig
{
    /// Maximum number of refinement iterations.
    pub max_iterations: usize,
    /// The initial grid has `2^initial_nstep + 1` points per axis.
    pub initial_nstep: u32,
    /// Convergence threshold, in percent.
    pub max_error: f64,
    /// Space the grid points evenly in ln(x).
    pub in_loge: bool,
    /// Refine every axis in each iteration instead of one axis at a time.
    #[serde(default)]
    pub fast_density_increase: bool,
}

impl Default for IntegratorConfig
{
    fn default() -> Self {
        Self { max_iterations: 20, initial_nstep: 3, max_error: 0.01, in_loge: false, fast_density_increase: false }
    }
}

impl IntegratorConfig
{
    pub fn spacing(&self) -> GridSpacing
    {
        if self.in_loge { GridSpacing::Loge } else { GridSpacing::Linear }
    }

    pub fn validate(&self) -> Result<(), IntegrationError>
    {
        if self.max_iterations == 0
        {
            return Err(IntegrationError::InvalidConfiguration("max-iterations must be positive".to_string()));
        }
        if !(self.max_error.is_finite() && self.max_error > 0.0)
        {
            return Err(IntegrationError::InvalidConfiguration(format!("max-error must be a positive percentage, got {}", self.max_error)));
        }
        if self.initial_nstep > MAX_LEVEL
        {
            return Err(IntegrationError::InvalidConfiguration(format!("initial-nstep must not exceed {MAX_LEVEL}, got {}", self.initial_nstep)));
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, IntegrationError>
    {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| IntegrationError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &str) -> Result<Self, IntegrationError>
    {
        let file = std::fs::File::open(path).map_err(|_| IntegrationError::FileIOError)?;
        let config: Self = serde_yaml::from_reader(file).map_err(|e| IntegrationError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[test]
fn check_yaml_config()
{
    let config = IntegratorConfig::from_yaml_str("max-iterations: 12\ninitial-nstep: 2\nmax-error: 0.5\nin-loge: true\n").unwrap();
    assert_eq!(config.max_iterations, 12);
    assert_eq!(config.initial_nstep, 2);
    assert_eq!(config.max_error, 0.5);
    assert_eq!(config.spacing(), GridSpacing::Loge);
    assert!(!config.fast_density_increase);
}

#[test]
fn check_invalid_config()
{
    let missing = IntegratorConfig::from_yaml_str("max-iterations: 12\n");
    assert!(matches!(missing, Err(IntegrationError::InvalidConfiguration(_))));
    let zero_error = IntegratorConfig { max_error: 0.0, ..Default::default() };
    assert!(zero_error.validate().is_err());
    let no_iterations = IntegratorConfig { max_iterations: 0, ..Default::default() };
    assert!(no_iterations.validate().is_err());
    assert!(IntegratorConfig::default().validate().is_ok());
}
