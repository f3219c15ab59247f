///
/// A scalar function of `n_params()` real parameters together with the
/// limits it is integrated over.
///
/// Implementations are expected to be stateless views over the underlying
/// function; integrators only take shared references.
///
pub trait IntegrableFunction
{
    /// Number of parameters (dimensionality of the integration domain).
    fn n_params(&self) -> usize;

    /// Integration limits `(min, max)` along parameter `dim`.
    fn limits(&self, dim: usize) -> (f64, f64);

    /// Evaluates the function at `x`, where `x.len() == self.n_params()`.
    fn eval(&self, x: &[f64]) -> f64;
}

impl<T: IntegrableFunction + ?Sized> IntegrableFunction for &T
{
    fn n_params(&self) -> usize {
        (**self).n_params()
    }

    fn limits(&self, dim: usize) -> (f64, f64) {
        (**self).limits(dim)
    }

    fn eval(&self, x: &[f64]) -> f64 {
        (**self).eval(x)
    }
}

///
/// Adapts a closure and a list of per-axis limits to [`IntegrableFunction`].
///
pub struct FunctionAdapter<F: Fn(&[f64]) -> f64>
{
    limits: Vec<(f64, f64)>,
    fun: F,
}

impl<F: Fn(&[f64]) -> f64> FunctionAdapter<F>
{
    pub fn new(limits: Vec<(f64, f64)>, fun: F) -> Self
    {
        Self { limits, fun }
    }
}

impl<F: Fn(&[f64]) -> f64> IntegrableFunction for FunctionAdapter<F>
{
    fn n_params(&self) -> usize {
        self.limits.len()
    }

    fn limits(&self, dim: usize) -> (f64, f64) {
        self.limits[dim]
    }

    #[inline]
    fn eval(&self, x: &[f64]) -> f64 {
        (self.fun)(x)
    }
}

#[test]
fn check_adapter()
{
    let f = FunctionAdapter::new(vec![(0.0, 1.0), (-1.0, 2.0)], |x| x[0] + 2.0*x[1]);
    assert_eq!(f.n_params(), 2);
    assert_eq!(f.limits(1), (-1.0, 2.0));
    assert_eq!(f.eval(&[1.0, 3.0]), 7.0);
    let by_ref: &dyn IntegrableFunction = &f;
    assert_eq!((&by_ref).eval(&[0.5, 0.0]), 0.5);
}
