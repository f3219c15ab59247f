use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::errors::IntegrationError;
use crate::function::IntegrableFunction;
use crate::iterators::grid_position_iterator::GridPositionIterator;

/// Highest supported level; keeps grid indices within `u32`.
pub const MAX_LEVEL: u32 = 30;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridSpacing
{
    /// Points evenly spaced in x.
    #[default]
    Linear,
    /// Points evenly spaced in ln(x).
    Loge,
}

#[inline]
fn pow2(level: u32) -> usize
{
    1 << level
}

///
/// Returns `n` such that `npoints == 2^n + 1`, if there is one.
///
pub fn level_from_npoints(npoints: usize) -> Option<u32>
{
    if npoints < 2 || !(npoints - 1).is_power_of_two()
    {
        return None;
    }
    let level = (npoints - 1).trailing_zeros();
    (level <= MAX_LEVEL).then_some(level)
}

///
/// A single axis of a [`UniformGrid`]: `2^level + 1` points between `min`
/// and `max`, both ends included.
///
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridDimension
{
    level: u32,
    min: f64,
    max: f64,
    spacing: GridSpacing,
}

impl GridDimension
{
    pub fn new(min: f64, max: f64, level: u32, spacing: GridSpacing) -> Self
    {
        Self { level, min, max, spacing }
    }

    #[inline]
    pub fn level(&self) -> u32
    {
        self.level
    }
    #[inline]
    pub fn npoints(&self) -> usize
    {
        pow2(self.level) + 1
    }
    #[inline]
    pub fn min(&self) -> f64
    {
        self.min
    }
    #[inline]
    pub fn max(&self) -> f64
    {
        self.max
    }
    #[inline]
    pub fn spacing(&self) -> GridSpacing
    {
        self.spacing
    }

    ///
    /// Distance between neighbouring points, measured in ln(x) for
    /// logarithmic spacing.
    ///
    pub fn step(&self) -> f64
    {
        let (lower, upper) = self.transformed_bounds();
        (upper - lower) / (self.npoints() - 1) as f64
    }

    ///
    /// Coordinate of the `k`-th point.
    ///
    pub fn point(&self, k: usize) -> f64
    {
        let (lower, _) = self.transformed_bounds();
        let x = lower + k as f64 * self.step();
        match self.spacing
        {
            GridSpacing::Linear => x,
            GridSpacing::Loge => x.exp(),
        }
    }

    fn transformed_bounds(&self) -> (f64, f64)
    {
        match self.spacing
        {
            GridSpacing::Linear => (self.min, self.max),
            GridSpacing::Loge => (self.min.ln(), self.max.ln()),
        }
    }

    fn validate(&self, dim: usize) -> Result<(), IntegrationError>
    {
        let valid = self.min.is_finite() && self.max.is_finite() && self.min < self.max
            && (self.spacing == GridSpacing::Linear || self.min > 0.0);
        if !valid
        {
            return Err(IntegrationError::InvalidDomain { dim, min: self.min, max: self.max });
        }
        if self.level > MAX_LEVEL
        {
            return Err(IntegrationError::InvalidConfiguration(format!("grid level {} exceeds the maximum of {MAX_LEVEL}", self.level)));
        }
        Ok(())
    }
}

///
/// Canonical integer key of a grid point. Each axis stores the dyadic pair
/// `(level, index)` with `index` odd (or the pair `(0, 0)` for the lower
/// bound), so the key of a point does not depend on the grid density.
///
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridKey
{
    pub level: Vec<u8>,
    pub index: Vec<u32>,
}

impl GridKey
{
    fn axis(k: usize, level: u32) -> (u8, u32)
    {
        if k == 0
        {
            return (0, 0);
        }
        let shift = k.trailing_zeros().min(level);
        ((level - shift) as u8, (k >> shift) as u32)
    }
}

///
/// Cartesian product of one dimensional uniform samplings.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniformGrid
{
    dimensions: Vec<GridDimension>,
}

impl UniformGrid
{
    pub fn new(dimensions: Vec<GridDimension>) -> Result<Self, IntegrationError>
    {
        for (dim, dimension) in dimensions.iter().enumerate()
        {
            dimension.validate(dim)?;
        }
        Ok(Self { dimensions })
    }

    ///
    /// Builds a grid over the limits of `function`, with `2^level + 1`
    /// points along every axis.
    ///
    pub fn from_function(function: &dyn IntegrableFunction, spacing: GridSpacing, level: u32) -> Result<Self, IntegrationError>
    {
        let dimensions = (0..function.n_params()).map(|dim|
        {
            let (min, max) = function.limits(dim);
            GridDimension::new(min, max, level, spacing)
        }).collect();
        Self::new(dimensions)
    }

    #[inline]
    pub fn ndim(&self) -> usize
    {
        self.dimensions.len()
    }

    #[inline]
    pub fn dimension(&self, dim: usize) -> &GridDimension
    {
        &self.dimensions[dim]
    }

    pub fn dimensions(&self) -> &[GridDimension]
    {
        &self.dimensions
    }

    #[inline]
    pub fn point(&self, dim: usize, k: usize) -> f64
    {
        self.dimensions[dim].point(k)
    }

    ///
    /// Total number of grid points.
    ///
    pub fn len(&self) -> usize
    {
        if self.dimensions.is_empty()
        {
            return 0;
        }
        self.dimensions.iter().map(GridDimension::npoints).product()
    }

    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    pub fn npoints(&self) -> Vec<usize>
    {
        self.dimensions.iter().map(GridDimension::npoints).collect()
    }

    ///
    /// Sets the number of points of axis `dim`, or of every axis if `dim` is
    /// `None`. Points already on the grid stay on it.
    ///
    pub fn increase_density(&mut self, npoints: usize, dim: Option<usize>) -> Result<(), IntegrationError>
    {
        let level = level_from_npoints(npoints).ok_or(IntegrationError::InvalidPointCount(npoints))?;
        let range = match dim
        {
            Some(d) => d..d + 1,
            None => 0..self.ndim(),
        };
        for d in range.clone()
        {
            let current = self.dimensions[d].npoints();
            if npoints < current
            {
                return Err(IntegrationError::DensityDecrease { dim: d, current, requested: npoints });
            }
        }
        for d in range
        {
            self.dimensions[d].level = level;
        }
        Ok(())
    }

    ///
    /// Every position of the grid, row-major.
    ///
    pub fn positions(&self) -> GridPositionIterator
    {
        GridPositionIterator::new(self.npoints())
    }

    pub fn coordinates(&self, position: &[usize]) -> Vec<f64>
    {
        position.iter().zip(&self.dimensions).map(|(&k, dimension)| dimension.point(k)).collect()
    }

    pub fn key(&self, position: &[usize]) -> GridKey
    {
        let mut key = GridKey { level: Vec::with_capacity(self.ndim()), index: Vec::with_capacity(self.ndim()) };
        for (&k, dimension) in position.iter().zip(&self.dimensions)
        {
            let (level, index) = GridKey::axis(k, dimension.level);
            key.level.push(level);
            key.index.push(index);
        }
        key
    }
}

impl Display for UniformGrid
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (dim, dimension) in self.dimensions.iter().enumerate()
        {
            if dim > 0
            {
                write!(f, " x ")?;
            }
            write!(f, "[{} points in ({}, {}) {:?}, step {}]", dimension.npoints(), dimension.min, dimension.max, dimension.spacing, dimension.step())?;
        }
        Ok(())
    }
}

#[test]
fn check_linear_points()
{
    let dimension = GridDimension::new(0.0, 2.0, 2, GridSpacing::Linear);
    assert_eq!(dimension.npoints(), 5);
    assert_eq!(dimension.step(), 0.5);
    assert_eq!(dimension.point(0), 0.0);
    assert_eq!(dimension.point(3), 1.5);
    assert_eq!(dimension.point(4), 2.0);
}

#[test]
fn check_log_points()
{
    let e = std::f64::consts::E;
    let dimension = GridDimension::new(1.0, e*e, 1, GridSpacing::Loge);
    assert_eq!(dimension.npoints(), 3);
    assert!((dimension.step() - 1.0).abs() < 1e-14);
    assert!((dimension.point(1) - e).abs() < 1e-12);
    assert!((dimension.point(2) - e*e).abs() < 1e-12);
}

#[test]
fn check_level_from_npoints()
{
    assert_eq!(level_from_npoints(2), Some(0));
    assert_eq!(level_from_npoints(3), Some(1));
    assert_eq!(level_from_npoints(17), Some(4));
    assert_eq!(level_from_npoints(1), None);
    assert_eq!(level_from_npoints(16), None);
}

#[test]
fn check_invalid_domains()
{
    let linear = UniformGrid::new(vec![GridDimension::new(1.0, 0.0, 1, GridSpacing::Linear)]);
    assert!(matches!(linear, Err(IntegrationError::InvalidDomain { dim: 0, .. })));
    let log = UniformGrid::new(vec![
        GridDimension::new(1.0, 2.0, 1, GridSpacing::Loge),
        GridDimension::new(0.0, 2.0, 1, GridSpacing::Loge)]);
    assert!(matches!(log, Err(IntegrationError::InvalidDomain { dim: 1, .. })));
}

#[test]
fn check_increase_density()
{
    let mut grid = UniformGrid::new(vec![GridDimension::new(0.0, 1.0, 1, GridSpacing::Linear); 2]).unwrap();
    grid.increase_density(5, Some(1)).unwrap();
    assert_eq!(grid.npoints(), vec![3, 5]);
    grid.increase_density(9, None).unwrap();
    assert_eq!(grid.npoints(), vec![9, 9]);
    assert_eq!(grid.len(), 81);
    assert_eq!(grid.increase_density(6, None), Err(IntegrationError::InvalidPointCount(6)));
    assert_eq!(grid.increase_density(5, Some(0)), Err(IntegrationError::DensityDecrease { dim: 0, current: 9, requested: 5 }));
}

#[test]
fn check_keys_survive_refinement()
{
    let mut grid = UniformGrid::new(vec![GridDimension::new(0.0, 1.0, 1, GridSpacing::Linear); 2]).unwrap();
    let coarse: Vec<_> = grid.positions().map(|p| (grid.key(&p), grid.coordinates(&p))).collect();
    grid.increase_density(9, None).unwrap();
    for (key, x) in coarse
    {
        let refined: Vec<usize> = x.iter().map(|xi| (xi * 8.0).round() as usize).collect();
        assert_eq!(grid.key(&refined), key);
    }
    // midpoint of the refined grid is not a coarse point
    assert_eq!(grid.key(&[1, 0]), GridKey { level: vec![3, 0], index: vec![1, 0] });
}
