use crate::algorithms::quadrature::QuadratureRule;
use crate::config::IntegratorConfig;
use crate::errors::IntegrationError;
use crate::function::IntegrableFunction;

use super::adaptive::AdaptiveGridIntegrator;
use super::Integrator;

///
/// Extended Simpson rule in 1-D.
///
#[derive(Clone, Debug)]
pub struct Simpson1D(AdaptiveGridIntegrator);

impl Simpson1D
{
    pub fn new(config: IntegratorConfig) -> Result<Self, IntegrationError>
    {
        let integrator = AdaptiveGridIntegrator::new(config, QuadratureRule::Simpson)?;
        Ok(Self(integrator.with_dimensions(1).with_name("Simpson1D")))
    }

    pub fn integrator(&self) -> &AdaptiveGridIntegrator
    {
        &self.0
    }
}

impl Integrator for Simpson1D
{
    fn integrate(&self, function: &dyn IntegrableFunction) -> Result<f64, IntegrationError> {
        self.0.integrate(function)
    }
}

///
/// The 2-D extended Simpson rule. The estimate is refined by doubling the
/// grid density until two successive estimates agree within the configured
/// percentage. Function values are cached, so points of a coarser grid are
/// never evaluated again.
///
#[derive(Clone, Debug)]
pub struct Simpson2D(AdaptiveGridIntegrator);

impl Simpson2D
{
    pub fn new(config: IntegratorConfig) -> Result<Self, IntegrationError>
    {
        let integrator = AdaptiveGridIntegrator::new(config, QuadratureRule::Simpson)?;
        Ok(Self(integrator.with_dimensions(2).with_name("Simpson2D")))
    }

    pub fn integrator(&self) -> &AdaptiveGridIntegrator
    {
        &self.0
    }
}

impl Integrator for Simpson2D
{
    fn integrate(&self, function: &dyn IntegrableFunction) -> Result<f64, IntegrationError> {
        self.0.integrate(function)
    }
}

///
/// Extended Simpson rule for functions of any number of parameters.
///
#[derive(Clone, Debug)]
pub struct SimpsonND(AdaptiveGridIntegrator);

impl SimpsonND
{
    pub fn new(config: IntegratorConfig) -> Result<Self, IntegrationError>
    {
        let integrator = AdaptiveGridIntegrator::new(config, QuadratureRule::Simpson)?;
        Ok(Self(integrator.with_name("SimpsonND")))
    }

    pub fn integrator(&self) -> &AdaptiveGridIntegrator
    {
        &self.0
    }
}

impl Integrator for SimpsonND
{
    fn integrate(&self, function: &dyn IntegrableFunction) -> Result<f64, IntegrationError> {
        self.0.integrate(function)
    }
}

/// Extended trapezoid rule in 1-D.
#[derive(Clone, Debug)]
pub struct Trapezoid1D(AdaptiveGridIntegrator);

impl Trapezoid1D
{
    pub fn new(config: IntegratorConfig) -> Result<Self, IntegrationError>
    {
        let integrator = AdaptiveGridIntegrator::new(config, QuadratureRule::Trapezoid)?;
        Ok(Self(integrator.with_dimensions(1).with_name("Trapezoid1D")))
    }

    pub fn integrator(&self) -> &AdaptiveGridIntegrator
    {
        &self.0
    }
}

impl Integrator for Trapezoid1D
{
    fn integrate(&self, function: &dyn IntegrableFunction) -> Result<f64, IntegrationError> {
        self.0.integrate(function)
    }
}

#[cfg(test)]
mod tests
{
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::function::FunctionAdapter;
    use crate::grids::uniform_grid::{GridSpacing, UniformGrid};
    use crate::storage::function_map::FunctionMap;

    /// Counts every evaluation of the wrapped function.
    struct Counting<F: Fn(&[f64]) -> f64>
    {
        inner: FunctionAdapter<F>,
        calls: AtomicUsize,
    }

    impl<F: Fn(&[f64]) -> f64> Counting<F>
    {
        fn new(limits: Vec<(f64, f64)>, fun: F) -> Self
        {
            Self { inner: FunctionAdapter::new(limits, fun), calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize
        {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl<F: Fn(&[f64]) -> f64> IntegrableFunction for Counting<F>
    {
        fn n_params(&self) -> usize {
            self.inner.n_params()
        }

        fn limits(&self, dim: usize) -> (f64, f64) {
            self.inner.limits(dim)
        }

        fn eval(&self, x: &[f64]) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.eval(x)
        }
    }

    #[test]
    fn product_over_unit_square()
    {
        let config = IntegratorConfig::default();
        let max_error = config.max_error;
        let simpson = Simpson2D::new(config).unwrap();
        let f = FunctionAdapter::new(vec![(0.0, 1.0); 2], |x| x[0]*x[1]);
        let value = simpson.integrate(&f).unwrap();
        assert!(100.0 * (value - 0.25).abs() / 0.25 < max_error);
    }

    #[test]
    fn constant_over_rectangle()
    {
        let simpson = Simpson2D::new(IntegratorConfig::default()).unwrap();
        let f = FunctionAdapter::new(vec![(0.0, 2.0), (1.0, 4.0)], |_| 3.5);
        let summary = simpson.integrator().integrate_with_summary(&f).unwrap();
        assert!((summary.value - 21.0).abs() < 1e-12);
        // exact on the initial grid, confirmed by the first refinement
        assert_eq!(summary.iterations, 2);
    }

    #[test]
    fn zero_function()
    {
        let simpson = Simpson2D::new(IntegratorConfig::default()).unwrap();
        let f = FunctionAdapter::new(vec![(0.0, 1.0); 2], |_| 0.0);
        let summary = simpson.integrator().integrate_with_summary(&f).unwrap();
        assert_eq!(summary.value, 0.0);
        assert_eq!(summary.iterations, 2);
    }

    #[test]
    fn gaussian_over_unit_square()
    {
        let config = IntegratorConfig { max_error: 1e-3, initial_nstep: 2, ..Default::default() };
        let simpson = Simpson2D::new(config).unwrap();
        let f = FunctionAdapter::new(vec![(0.0, 1.0); 2], |x| (-(x[0]*x[0] + x[1]*x[1])).exp());
        let one_d = 0.5 * std::f64::consts::PI.sqrt() * libm::erf(1.0);
        let value = simpson.integrate(&f).unwrap();
        assert!((value / (one_d * one_d) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn cached_points_are_not_evaluated_again()
    {
        let config = IntegratorConfig { initial_nstep: 1, ..Default::default() };
        let simpson = Simpson2D::new(config).unwrap();
        let f = Counting::new(vec![(0.0, 1.0); 2], |x| x[0] + x[1]);
        let grid = UniformGrid::from_function(&f, GridSpacing::Linear, 1).unwrap();
        let mut map = FunctionMap::new(grid);

        assert_eq!(simpson.integrator().evaluate_grid(&f, &mut map), 9);
        assert_eq!(f.calls(), 9);
        assert_eq!(simpson.integrator().evaluate_grid(&f, &mut map), 0);
        assert_eq!(f.calls(), 9);

        map.increase_grid_density(5, None).unwrap();
        assert_eq!(simpson.integrator().evaluate_grid(&f, &mut map), 16);
        assert_eq!(f.calls(), 25);
    }

    #[test]
    fn every_point_is_evaluated_once()
    {
        let config = IntegratorConfig { initial_nstep: 2, max_error: 1e-5, ..Default::default() };
        let simpson = Simpson2D::new(config).unwrap();
        let f = Counting::new(vec![(0.0, 1.0), (0.0, 2.0)], |x| (x[0] + x[1]).sin());
        let summary = simpson.integrator().integrate_with_summary(&f).unwrap();
        assert_eq!(f.calls(), summary.npoints);
        assert_eq!(summary.evaluations, summary.npoints);
    }

    #[test]
    fn log_spacing_applies_jacobian()
    {
        let config = IntegratorConfig { in_loge: true, initial_nstep: 2, ..Default::default() };
        let simpson = Simpson2D::new(config).unwrap();
        let fun = |x: &[f64]| x[0] + 3.0*x[1];
        let f = FunctionAdapter::new(vec![(1.0, 2.0), (0.5, 3.0)], fun);
        let grid = UniformGrid::from_function(&f, GridSpacing::Loge, 2).unwrap();
        let mut map = FunctionMap::new(grid);
        simpson.integrator().evaluate_grid(&f, &mut map);
        for position in map.grid().positions()
        {
            let x = map.grid().coordinates(&position);
            let expected = fun(&x) * x[0] * x[1];
            let cached = map.value(&position).unwrap();
            assert!((cached - expected).abs() <= 1e-14 * expected.abs());
        }
    }

    #[test]
    fn log_spacing_integral()
    {
        let e = std::f64::consts::E;
        let config = IntegratorConfig { in_loge: true, ..Default::default() };
        let simpson = Simpson2D::new(config).unwrap();
        let inverse = FunctionAdapter::new(vec![(1.0, e); 2], |x| 1.0 / (x[0]*x[1]));
        assert!((simpson.integrate(&inverse).unwrap() - 1.0).abs() < 1e-12);

        let product = FunctionAdapter::new(vec![(1.0, 10.0); 2], |x| x[0]*x[1]);
        let value = simpson.integrate(&product).unwrap();
        assert!((value / 2450.25 - 1.0).abs() < 2e-4);
    }

    #[test]
    fn noisy_function_does_not_converge()
    {
        let config = IntegratorConfig { initial_nstep: 1, max_iterations: 5, max_error: 0.1, in_loge: false, fast_density_increase: true };
        let simpson = Simpson2D::new(config).unwrap();
        // every new point sees a larger value, so the estimate keeps growing
        let calls = AtomicUsize::new(0);
        let f = FunctionAdapter::new(vec![(0.0, 1.0); 2], |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst) as f64;
            n * n
        });
        let result = simpson.integrate(&f);
        match result
        {
            Err(IntegrationError::NonConvergence { iterations, error_percent, max_error, npoints }) =>
            {
                assert_eq!(iterations, 5);
                assert!(error_percent >= max_error);
                assert_eq!(npoints, 33 * 33);
            }
            other => panic!("expected non-convergence, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 33 * 33);
    }

    #[test]
    fn three_parameter_function_is_rejected()
    {
        let simpson = Simpson2D::new(IntegratorConfig::default()).unwrap();
        let f = Counting::new(vec![(0.0, 1.0); 3], |x| x[0]*x[1]*x[2]);
        assert_eq!(simpson.integrate(&f), Err(IntegrationError::DimensionMismatch { expected: 2, found: 3 }));
        assert_eq!(f.calls(), 0);
    }

    #[test]
    fn invalid_domain_is_reported()
    {
        let config = IntegratorConfig { in_loge: true, ..Default::default() };
        let simpson = Simpson2D::new(config).unwrap();
        let f = FunctionAdapter::new(vec![(0.0, 1.0); 2], |x| x[0]*x[1]);
        assert!(matches!(simpson.integrate(&f), Err(IntegrationError::InvalidDomain { dim: 0, .. })));
    }

    #[test]
    fn one_dimensional_rules()
    {
        let config = IntegratorConfig { max_error: 1e-3, max_iterations: 30, fast_density_increase: true, ..Default::default() };
        let f = FunctionAdapter::new(vec![(0.0, std::f64::consts::PI)], |x| x[0].sin());
        let simpson = Simpson1D::new(config.clone()).unwrap();
        assert!((simpson.integrate(&f).unwrap() - 2.0).abs() < 1e-4);
        let trapezoid = Trapezoid1D::new(config).unwrap();
        assert!((trapezoid.integrate(&f).unwrap() - 2.0).abs() < 1e-4);

        let g = FunctionAdapter::new(vec![(0.0, 1.0); 2], |x| x[0]*x[1]);
        assert_eq!(simpson.integrate(&g), Err(IntegrationError::DimensionMismatch { expected: 1, found: 2 }));
    }

    #[test]
    fn n_dimensional_rule()
    {
        let config = IntegratorConfig { initial_nstep: 1, max_error: 1e-3, fast_density_increase: true, ..Default::default() };
        let simpson = SimpsonND::new(config).unwrap();
        let f = FunctionAdapter::new(vec![(0.0, 1.0), (0.0, 2.0), (-1.0, 1.0), (0.0, 1.0)], |x| x[0] + x[1]*x[1] + x[2]*x[3]);
        // 0.5 * 4 + 8/3 * 2 + 0
        let expected = 2.0 + 16.0 / 3.0;
        assert!((simpson.integrate(&f).unwrap() - expected).abs() < 1e-10);
    }

    #[test]
    fn invalid_config_is_rejected()
    {
        let config = IntegratorConfig { max_iterations: 0, ..Default::default() };
        assert!(matches!(Simpson2D::new(config), Err(IntegrationError::InvalidConfiguration(_))));
    }
}
