use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::IntegrationError;
use crate::grids::uniform_grid::{GridKey, UniformGrid};
use crate::serialization::{deserialize, serialize, SerializationFormat};

///
/// Cache of function values on a [`UniformGrid`]. Values are keyed by the
/// density independent [`GridKey`] of a point, so values computed on a
/// coarser grid are found again after the grid is refined.
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionMap
{
    grid: UniformGrid,
    values: FxHashMap<GridKey, f64>,
}

impl FunctionMap
{
    pub fn new(grid: UniformGrid) -> Self
    {
        Self { grid, values: FxHashMap::default() }
    }

    #[inline]
    pub fn grid(&self) -> &UniformGrid
    {
        &self.grid
    }

    /// Number of stored values.
    #[inline]
    pub fn len(&self) -> usize
    {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool
    {
        self.values.is_empty()
    }

    ///
    /// Sets the number of points of axis `dim` (all axes if `None`).
    /// Stored values remain addressable.
    ///
    pub fn increase_grid_density(&mut self, npoints: usize, dim: Option<usize>) -> Result<(), IntegrationError>
    {
        self.grid.increase_density(npoints, dim)
    }

    #[inline]
    pub fn value_is_set(&self, position: &[usize]) -> bool
    {
        self.values.contains_key(&self.grid.key(position))
    }

    ///
    /// Stores `value` at `position`. Callers check [`Self::value_is_set`]
    /// first; a second call for the same point replaces the value.
    ///
    pub fn set_value(&mut self, value: f64, position: &[usize])
    {
        let key = self.grid.key(position);
        self.values.insert(key, value);
    }

    pub fn value(&self, position: &[usize]) -> Result<f64, IntegrationError>
    {
        self.values.get(&self.grid.key(position)).copied()
            .ok_or_else(|| IntegrationError::ValueNotSet(position.to_vec()))
    }

    ///
    /// Positions of the current grid with no stored value, row-major.
    ///
    pub fn missing_positions(&self) -> Vec<Vec<usize>>
    {
        self.grid.positions().filter(|position| !self.value_is_set(position)).collect()
    }

    ///
    /// Values of the whole grid in row-major order.
    ///
    pub fn values(&self) -> Result<Vec<f64>, IntegrationError>
    {
        self.grid.positions().map(|position| self.value(&position)).collect()
    }

    pub fn save(&self, path: &str) -> Result<(), IntegrationError>
    {
        let file = std::fs::File::create(path).map_err(|_| IntegrationError::FileIOError)?;
        self.write(std::io::BufWriter::new(file))
    }

    pub fn write<Writer: std::io::Write>(&self, mut writer: Writer) -> Result<(), IntegrationError>
    {
        let buffer = serialize(self, SerializationFormat::BincodeLz4)?;
        writer.write_all(&buffer).map_err(|_| IntegrationError::WriteBufferFailed)?;
        writer.flush().map_err(|_| IntegrationError::WriteBufferFailed)
    }

    pub fn read_buffer(buffer: &[u8]) -> Result<Self, IntegrationError>
    {
        deserialize(buffer, SerializationFormat::BincodeLz4)
    }

    pub fn read<Reader: std::io::Read>(mut reader: Reader) -> Result<Self, IntegrationError>
    {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|_| IntegrationError::ReadBufferFailed)?;
        Self::read_buffer(&bytes)
    }
}

#[cfg(test)]
fn unit_square(level: u32) -> UniformGrid
{
    use crate::grids::uniform_grid::{GridDimension, GridSpacing};
    UniformGrid::new(vec![GridDimension::new(0.0, 1.0, level, GridSpacing::Linear); 2]).unwrap()
}

#[test]
fn check_set_and_lookup()
{
    let mut map = FunctionMap::new(unit_square(1));
    assert!(!map.value_is_set(&[1, 2]));
    assert_eq!(map.value(&[1, 2]), Err(IntegrationError::ValueNotSet(vec![1, 2])));
    map.set_value(3.5, &[1, 2]);
    assert!(map.value_is_set(&[1, 2]));
    assert_eq!(map.value(&[1, 2]), Ok(3.5));
    assert_eq!(map.len(), 1);
    assert_eq!(map.missing_positions().len(), 8);
}

#[test]
fn check_densification_preserves_values()
{
    let mut map = FunctionMap::new(unit_square(1));
    for position in map.grid().positions()
    {
        let x = map.grid().coordinates(&position);
        map.set_value(x[0] + 10.0*x[1], &position);
    }
    map.increase_grid_density(5, None).unwrap();
    assert_eq!(map.len(), 9);
    for i in 0..3
    {
        for j in 0..3
        {
            let expected = 0.5*i as f64 + 5.0*j as f64;
            assert_eq!(map.value(&[2*i, 2*j]).unwrap(), expected);
        }
    }
    // new midpoints are not set
    assert!(!map.value_is_set(&[1, 0]));
    assert_eq!(map.missing_positions().len(), 25 - 9);
}

#[test]
fn check_one_axis_densification()
{
    let mut map = FunctionMap::new(unit_square(1));
    map.set_value(1.0, &[2, 1]);
    map.increase_grid_density(9, Some(1)).unwrap();
    assert_eq!(map.grid().npoints(), vec![3, 9]);
    assert_eq!(map.value(&[2, 4]), Ok(1.0));
    assert!(!map.value_is_set(&[2, 1]));
}

#[test]
fn check_snapshot_roundtrip()
{
    let mut map = FunctionMap::new(unit_square(2));
    map.set_value(0.25, &[1, 3]);
    map.set_value(-2.0, &[4, 4]);
    let mut buffer = Vec::new();
    map.write(&mut buffer).unwrap();
    let restored = FunctionMap::read(buffer.as_slice()).unwrap();
    assert_eq!(restored.grid(), map.grid());
    assert_eq!(restored.len(), 2);
    assert_eq!(restored.value(&[1, 3]), Ok(0.25));
    assert_eq!(restored.value(&[4, 4]), Ok(-2.0));
}
