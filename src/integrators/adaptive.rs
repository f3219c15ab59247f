use rayon::prelude::*;
use tracing::{debug, error, info, info_span};

use crate::algorithms::quadrature::{integrate_map, QuadratureRule};
use crate::config::IntegratorConfig;
use crate::errors::IntegrationError;
use crate::function::IntegrableFunction;
use crate::grids::uniform_grid::{GridSpacing, UniformGrid, MAX_LEVEL};
use crate::storage::function_map::FunctionMap;

use super::Integrator;

///
/// Outcome of a converged integration.
///
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegrationSummary
{
    pub value: f64,
    /// Relative difference to the previous estimate, in percent.
    pub error_percent: f64,
    /// Number of iterations performed (including the converged one).
    pub iterations: usize,
    /// Number of function evaluations.
    pub evaluations: usize,
    /// Number of points of the final grid.
    pub npoints: usize,
}

///
/// Iteratively refined grid quadrature. Each iteration densifies the grid,
/// evaluates the function on the new points only, applies the quadrature
/// rule and compares the estimate with the previous one.
///
#[derive(Clone, Debug)]
pub struct AdaptiveGridIntegrator
{
    config: IntegratorConfig,
    rule: QuadratureRule,
    ndim: Option<usize>,
    name: &'static str,
}

impl AdaptiveGridIntegrator
{
    pub fn new(config: IntegratorConfig, rule: QuadratureRule) -> Result<Self, IntegrationError>
    {
        config.validate()?;
        Ok(Self { config, rule, ndim: None, name: "AdaptiveGridIntegrator" })
    }

    ///
    /// Only accept functions of exactly `ndim` parameters.
    ///
    pub fn with_dimensions(mut self, ndim: usize) -> Self
    {
        self.ndim = Some(ndim);
        self
    }

    /// Name reported in the tracing span.
    pub fn with_name(mut self, name: &'static str) -> Self
    {
        self.name = name;
        self
    }

    pub fn config(&self) -> &IntegratorConfig
    {
        &self.config
    }

    pub fn rule(&self) -> QuadratureRule
    {
        self.rule
    }

    fn check_dimensions(&self, function: &dyn IntegrableFunction) -> Result<usize, IntegrationError>
    {
        let found = function.n_params();
        let expected = self.ndim.unwrap_or(1);
        if found == 0 || self.ndim.is_some_and(|n| n != found)
        {
            return Err(IntegrationError::DimensionMismatch { expected, found });
        }
        Ok(found)
    }

    ///
    /// Grid density change applied at the start of `iteration`, as
    /// `(npoints, axis)`; an axis of `None` means every axis.
    ///
    /// Iteration 0 uses the initial grid as is. With fast density increase
    /// every later iteration refines all axes; otherwise one axis is refined
    /// per iteration and a full cycle over the `ndim` axes raises the grid
    /// by one level.
    ///
    pub fn refinement(&self, iteration: usize, ndim: usize) -> Result<Option<(usize, Option<usize>)>, IntegrationError>
    {
        if iteration == 0
        {
            return Ok(None);
        }
        let n0 = self.config.initial_nstep as usize;
        let (level, dim) = if self.config.fast_density_increase
        {
            (n0 + iteration, None)
        }
        else
        {
            let k = iteration - 1;
            (n0 + 1 + k / ndim, Some(k % ndim))
        };
        if level > MAX_LEVEL as usize
        {
            return Err(IntegrationError::InvalidConfiguration(format!("grid level {level} exceeds the maximum of {MAX_LEVEL}")));
        }
        Ok(Some(((1 << level) + 1, dim)))
    }

    #[inline]
    fn point_value(&self, function: &dyn IntegrableFunction, x: &[f64]) -> f64
    {
        let y = function.eval(x);
        match self.config.spacing()
        {
            GridSpacing::Linear => y,
            // integral { f(x) dx } = integral { x f(x) dln(x) }
            GridSpacing::Loge => y * x.iter().product::<f64>(),
        }
    }

    ///
    /// Evaluates `function` on every point of the map's grid that has no
    /// stored value yet. Returns the number of evaluations.
    ///
    pub fn evaluate_grid(&self, function: &dyn IntegrableFunction, map: &mut FunctionMap) -> usize
    {
        let missing = map.missing_positions();
        debug!(reused = map.grid().len() - missing.len(), "grid points computed at previous steps");
        for position in &missing
        {
            let x = map.grid().coordinates(position);
            let y = self.point_value(function, &x);
            debug!(?position, ?x, y, "grid point");
            map.set_value(y, position);
        }
        missing.len()
    }

    ///
    /// Same as [`Self::evaluate_grid`], evaluating the missing points in
    /// parallel. The map is only written from the calling thread.
    ///
    pub fn evaluate_grid_parallel<F: IntegrableFunction + Sync>(&self, function: &F, map: &mut FunctionMap) -> usize
    {
        let missing = map.missing_positions();
        let grid = map.grid();
        let values: Vec<f64> = missing.par_iter()
            .map(|position| self.point_value(function, &grid.coordinates(position)))
            .collect();
        for (position, y) in missing.iter().zip(values)
        {
            map.set_value(y, position);
        }
        missing.len()
    }

    pub fn integrate_with_summary(&self, function: &dyn IntegrableFunction) -> Result<IntegrationSummary, IntegrationError>
    {
        self.run(function, |map| self.evaluate_grid(function, map))
    }

    pub fn integrate_parallel<F: IntegrableFunction + Sync>(&self, function: &F) -> Result<IntegrationSummary, IntegrationError>
    {
        self.run(function, |map| self.evaluate_grid_parallel(function, map))
    }

    fn run<Fill>(&self, function: &dyn IntegrableFunction, mut fill: Fill) -> Result<IntegrationSummary, IntegrationError>
        where Fill: FnMut(&mut FunctionMap) -> usize
    {
        let ndim = self.check_dimensions(function)?;
        let span = info_span!("integrate", integrator = self.name, ndim, rule = ?self.rule);
        let _guard = span.enter();

        let grid = UniformGrid::from_function(function, self.config.spacing(), self.config.initial_nstep)?;
        let mut map = FunctionMap::new(grid);

        let max_error = self.config.max_error;
        let mut previous: Option<f64> = None;
        let mut error_percent = f64::INFINITY;
        let mut evaluations = 0;
        for iteration in 0..self.config.max_iterations
        {
            if let Some((npoints, dim)) = self.refinement(iteration, ndim)?
            {
                map.increase_grid_density(npoints, dim)?;
            }
            info!(iteration, grid = %map.grid(), "integration step");

            evaluations += fill(&mut map);
            let sum = integrate_map(self.rule, &map)?;
            let summary = |error_percent: f64| IntegrationSummary
            {
                value: sum,
                error_percent,
                iterations: iteration + 1,
                evaluations,
                npoints: map.grid().len(),
            };

            let Some(prev) = previous else
            {
                info!(integral = sum, "first estimate");
                previous = Some(sum);
                continue;
            };
            if sum + prev == 0.0
            {
                info!("integral is zero");
                return Ok(IntegrationSummary { value: 0.0, ..summary(0.0) });
            }
            error_percent = 200.0 * ((sum - prev) / (sum + prev)).abs();
            info!(integral = sum, previous = prev, error_percent, "estimated error in %");
            if error_percent < max_error
            {
                info!(integral = sum, error_percent, evaluations, "integral converged");
                return Ok(summary(error_percent));
            }
            previous = Some(sum);
        }

        let npoints = map.grid().len();
        error!(max_error, "maximum numerical error allowed in %");
        error!(error_percent, npoints, "integral didn't converge to required numerical accuracy");
        Err(IntegrationError::NonConvergence { iterations: self.config.max_iterations, error_percent, max_error, npoints })
    }
}

impl Integrator for AdaptiveGridIntegrator
{
    fn integrate(&self, function: &dyn IntegrableFunction) -> Result<f64, IntegrationError> {
        self.integrate_with_summary(function).map(|summary| summary.value)
    }
}

#[cfg(test)]
use crate::function::FunctionAdapter;

#[test]
fn check_fast_schedule()
{
    let config = IntegratorConfig { initial_nstep: 2, fast_density_increase: true, ..Default::default() };
    let integrator = AdaptiveGridIntegrator::new(config, QuadratureRule::Simpson).unwrap();
    assert_eq!(integrator.refinement(0, 2).unwrap(), None);
    assert_eq!(integrator.refinement(1, 2).unwrap(), Some((9, None)));
    assert_eq!(integrator.refinement(2, 2).unwrap(), Some((17, None)));
}

#[test]
fn check_slow_schedule()
{
    let config = IntegratorConfig { initial_nstep: 1, ..Default::default() };
    let integrator = AdaptiveGridIntegrator::new(config, QuadratureRule::Simpson).unwrap();
    let schedule: Vec<_> = (1..6).map(|i| integrator.refinement(i, 2).unwrap().unwrap()).collect();
    assert_eq!(schedule, vec![(5, Some(0)), (5, Some(1)), (9, Some(0)), (9, Some(1)), (17, Some(0))]);
    // three dimensions: one full cycle per level
    let schedule: Vec<_> = (1..5).map(|i| integrator.refinement(i, 3).unwrap().unwrap()).collect();
    assert_eq!(schedule, vec![(5, Some(0)), (5, Some(1)), (5, Some(2)), (9, Some(0))]);
}

#[test]
fn check_level_limit()
{
    let config = IntegratorConfig { initial_nstep: MAX_LEVEL, fast_density_increase: true, ..Default::default() };
    let integrator = AdaptiveGridIntegrator::new(config, QuadratureRule::Simpson).unwrap();
    assert!(matches!(integrator.refinement(1, 1), Err(IntegrationError::InvalidConfiguration(_))));
}

#[test]
fn check_one_dimensional_sine()
{
    let config = IntegratorConfig { max_error: 1e-4, fast_density_increase: true, ..Default::default() };
    let integrator = AdaptiveGridIntegrator::new(config, QuadratureRule::Simpson).unwrap();
    let f = FunctionAdapter::new(vec![(0.0, std::f64::consts::PI)], |x| x[0].sin());
    let summary = integrator.integrate_with_summary(&f).unwrap();
    assert!((summary.value - 2.0).abs() < 1e-5);
    assert!(summary.error_percent < 1e-4);
    assert_eq!(summary.npoints, (1 << (3 + summary.iterations - 1)) + 1);
}

#[test]
fn check_three_dimensional_product()
{
    let config = IntegratorConfig { initial_nstep: 1, max_error: 1e-6, fast_density_increase: true, ..Default::default() };
    let integrator = AdaptiveGridIntegrator::new(config, QuadratureRule::Simpson).unwrap();
    let f = FunctionAdapter::new(vec![(0.0, 1.0); 3], |x| x[0]*x[1]*x[2]);
    let value = integrator.integrate(&f).unwrap();
    assert!((value - 0.125).abs() < 1e-12);
}

#[test]
fn check_trapezoid_rule_converges()
{
    let config = IntegratorConfig { max_error: 1e-3, max_iterations: 30, fast_density_increase: true, ..Default::default() };
    let integrator = AdaptiveGridIntegrator::new(config, QuadratureRule::Trapezoid).unwrap();
    let f = FunctionAdapter::new(vec![(0.0, 1.0)], |x| x[0].exp());
    let value = integrator.integrate(&f).unwrap();
    assert!((value - (std::f64::consts::E - 1.0)).abs() < 1e-4);
}

#[test]
fn check_parallel_matches_serial()
{
    let config = IntegratorConfig { initial_nstep: 2, max_error: 1e-3, ..Default::default() };
    let integrator = AdaptiveGridIntegrator::new(config, QuadratureRule::Simpson).unwrap();
    let f = FunctionAdapter::new(vec![(0.0, 2.0), (0.0, 1.0)], |x| (x[0]*x[1]).cos());
    let serial = integrator.integrate_with_summary(&f).unwrap();
    let parallel = integrator.integrate_parallel(&f).unwrap();
    assert_eq!(serial, parallel);
}

#[test]
fn check_zero_dimensional_function()
{
    let integrator = AdaptiveGridIntegrator::new(IntegratorConfig::default(), QuadratureRule::Simpson).unwrap();
    let f = FunctionAdapter::new(vec![], |_| 1.0);
    assert_eq!(integrator.integrate(&f), Err(IntegrationError::DimensionMismatch { expected: 1, found: 0 }));
}
