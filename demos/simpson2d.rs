use gridquad::{config::IntegratorConfig, errors::IntegrationError, function::FunctionAdapter, integrators::{simpson::Simpson2D, Integrator}};
use tracing_subscriber::EnvFilter;

///
/// Integrates x*y over the unit square with the configuration from the
/// command line (a YAML file), or the default configuration.
///
fn product() -> Result<(), IntegrationError>
{
    println!("\nRunning \"product\" example\n");
    let config = match std::env::args().nth(1)
    {
        Some(path) => IntegratorConfig::load(&path)?,
        None => IntegratorConfig::default(),
    };
    let simpson = Simpson2D::new(config)?;
    let f = FunctionAdapter::new(vec![(0.0, 1.0); 2], |x: &[f64]| x[0]*x[1]);
    let summary = simpson.integrator().integrate_with_summary(&f)?;
    println!("integral={}, expected 0.25, error estimate={} % after {} iterations ({} evaluations)",
        summary.value, summary.error_percent, summary.iterations, summary.evaluations);
    Ok(())
}

///
/// A cross-section like integrand spanning decades, integrated on a log-e grid.
///
fn log_grid() -> Result<(), IntegrationError>
{
    println!("\nRunning \"log_grid\" example\n");
    let config = IntegratorConfig { in_loge: true, max_error: 1e-3, fast_density_increase: true, ..Default::default() };
    let simpson = Simpson2D::new(config)?;
    let f = FunctionAdapter::new(vec![(0.1, 100.0), (0.01, 10.0)], |x: &[f64]| 1.0 / (1.0 + x[0]*x[1]));
    println!("integral={}", simpson.integrate(&f)?);
    Ok(())
}

///
/// A function that never settles: reported as a non-convergence error.
///
fn non_convergence()
{
    println!("\nRunning \"non_convergence\" example\n");
    let config = IntegratorConfig { max_iterations: 4, fast_density_increase: true, ..Default::default() };
    let simpson = match Simpson2D::new(config)
    {
        Ok(simpson) => simpson,
        Err(e) => { println!("{e}"); return; }
    };
    let f = FunctionAdapter::new(vec![(-1.0, 1.0); 2], |x: &[f64]| (1000.0 * x[0] * x[1]).sin().signum() + 1.0);
    match simpson.integrate(&f)
    {
        Ok(value) => println!("integral={value}"),
        Err(e) => println!("{e}"),
    }
}

fn main() -> Result<(), IntegrationError>
{
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridquad=info")))
        .init();
    product()?;
    log_grid()?;
    non_convergence();
    Ok(())
}
