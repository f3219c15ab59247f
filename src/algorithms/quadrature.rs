use serde::{Deserialize, Serialize};

use crate::errors::IntegrationError;
use crate::storage::function_map::FunctionMap;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadratureRule
{
    /// Extended Simpson rule; needs an odd number of points to be exact for cubics.
    #[default]
    Simpson,
    /// Extended trapezoid rule.
    Trapezoid,
}

impl QuadratureRule
{
    ///
    /// Weight of point `j` out of `npoints` for a unit step.
    ///
    #[inline]
    pub fn weight(&self, j: usize, npoints: usize) -> f64
    {
        let edge = j == 0 || j + 1 == npoints;
        match self
        {
            // 2/3 * (1/2, 2, 1, 2, ..., 1, 2, 1/2)
            QuadratureRule::Simpson => if edge { 1.0/3.0 } else { 2.0*(j % 2 + 1) as f64 / 3.0 },
            QuadratureRule::Trapezoid => if edge { 0.5 } else { 1.0 },
        }
    }

    ///
    /// Composite rule over equidistant `values` separated by `step`.
    ///
    pub fn reduce(&self, values: &[f64], step: f64) -> f64
    {
        if values.len() < 2
        {
            return 0.0;
        }
        let n = values.len();
        let sum: f64 = values.iter().enumerate().map(|(j, value)| value * self.weight(j, n)).sum();
        sum * step
    }
}

///
/// Integrates the values stored in `map` over its grid. The last axis is
/// reduced first for every fixed value of the preceding axes, and the
/// reduction is repeated until one value remains.
///
pub fn integrate_map(rule: QuadratureRule, map: &FunctionMap) -> Result<f64, IntegrationError>
{
    let grid = map.grid();
    let mut values = map.values()?;
    for dimension in grid.dimensions().iter().rev()
    {
        let npoints = dimension.npoints();
        let step = dimension.step();
        values = values.chunks_exact(npoints).map(|row| rule.reduce(row, step)).collect();
    }
    Ok(values.first().copied().unwrap_or(0.0))
}

#[test]
fn check_simpson_weights()
{
    let rule = QuadratureRule::Simpson;
    for (j, expected) in [1.0, 4.0, 2.0, 4.0, 1.0].iter().enumerate()
    {
        assert!((rule.weight(j, 5) * 3.0 - expected).abs() < 1e-15);
    }
}

#[test]
fn check_simpson_exact_for_cubic()
{
    let n = 9;
    let h = 2.0 / (n - 1) as f64;
    let values: Vec<f64> = (0..n).map(|j| { let x = j as f64 * h; x*x*x - x }).collect();
    // integral of x^3 - x over [0, 2]
    assert!((QuadratureRule::Simpson.reduce(&values, h) - 2.0).abs() < 1e-12);
}

#[test]
fn check_trapezoid()
{
    let values = [0.0, 1.0, 2.0];
    assert!((QuadratureRule::Trapezoid.reduce(&values, 0.5) - 1.0).abs() < 1e-15);
}

#[test]
fn check_nested_reduction()
{
    use crate::grids::uniform_grid::{GridDimension, GridSpacing, UniformGrid};
    let grid = UniformGrid::new(vec![
        GridDimension::new(0.0, 1.0, 2, GridSpacing::Linear),
        GridDimension::new(0.0, 2.0, 1, GridSpacing::Linear)]).unwrap();
    let mut map = FunctionMap::new(grid);
    for position in map.grid().positions()
    {
        let x = map.grid().coordinates(&position);
        map.set_value(x[0]*x[0]*x[1], &position);
    }
    // 1/3 * 2
    let sum = integrate_map(QuadratureRule::Simpson, &map).unwrap();
    assert!((sum - 2.0/3.0).abs() < 1e-12);
}

#[test]
fn check_missing_value()
{
    use crate::grids::uniform_grid::{GridDimension, GridSpacing, UniformGrid};
    let grid = UniformGrid::new(vec![GridDimension::new(0.0, 1.0, 1, GridSpacing::Linear)]).unwrap();
    let map = FunctionMap::new(grid);
    assert_eq!(integrate_map(QuadratureRule::Simpson, &map), Err(IntegrationError::ValueNotSet(vec![0])));
}
