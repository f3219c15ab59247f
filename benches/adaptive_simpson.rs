use criterion::{criterion_group, criterion_main, Criterion};
use gridquad::{config::IntegratorConfig, errors::IntegrationError, function::FunctionAdapter, integrators::{simpson::Simpson2D, Integrator}};

fn gaussian(simpson: &Simpson2D) -> Result<f64, IntegrationError>
{
    let f = FunctionAdapter::new(vec![(-3.0, 3.0); 2], |x: &[f64]| (-(x[0]*x[0] + x[1]*x[1])).exp());
    simpson.integrate(&f)
}

fn gaussian_parallel(simpson: &Simpson2D) -> Result<f64, IntegrationError>
{
    let f = FunctionAdapter::new(vec![(-3.0, 3.0); 2], |x: &[f64]| (-(x[0]*x[0] + x[1]*x[1])).exp());
    Ok(simpson.integrator().integrate_parallel(&f)?.value)
}

fn run_two_d(c: &mut Criterion)
{
    let config = IntegratorConfig { max_error: 1e-4, fast_density_increase: true, ..Default::default() };
    let simpson = Simpson2D::new(config).unwrap();
    c.bench_function("2d gaussian", |b|b.iter(||gaussian(&simpson).unwrap()));
    c.bench_function("2d gaussian parallel", |b|b.iter(||gaussian_parallel(&simpson).unwrap()));
}

criterion_group!(benches, run_two_d);
criterion_main!(benches);
