///
/// Iterates over every multi-index of a Cartesian grid in row-major order
/// (the last dimension varies fastest).
///
#[derive(Clone)]
pub struct GridPositionIterator
{
    npoints: Vec<usize>,
    head: Vec<usize>,
    first: bool,
}

impl GridPositionIterator
{
    pub fn new(npoints: Vec<usize>) -> Self
    {
        let head = vec![0; npoints.len()];
        Self { npoints, head, first: true }
    }

    ///
    /// Total number of positions covered by the iterator.
    ///
    pub fn len(&self) -> usize
    {
        if self.npoints.is_empty()
        {
            return 0;
        }
        self.npoints.iter().product()
    }

    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }
}

impl Iterator for GridPositionIterator
{
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.npoints.is_empty() || self.npoints.contains(&0)
        {
            return None;
        }
        if self.first
        {
            self.first = false;
            return Some(self.head.clone());
        }
        // odometer increment, carrying towards dimension 0
        let mut dim = self.npoints.len();
        while dim > 0
        {
            dim -= 1;
            self.head[dim] += 1;
            if self.head[dim] < self.npoints[dim]
            {
                return Some(self.head.clone());
            }
            self.head[dim] = 0;
        }
        // wrapped around in every dimension: exhausted
        self.npoints.clear();
        None
    }
}

#[test]
fn check_row_major_order()
{
    let positions: Vec<Vec<usize>> = GridPositionIterator::new(vec![2, 3]).collect();
    assert_eq!(positions, vec![
        vec![0, 0], vec![0, 1], vec![0, 2],
        vec![1, 0], vec![1, 1], vec![1, 2],
    ]);
}

#[test]
fn check_len()
{
    let iter = GridPositionIterator::new(vec![5, 3, 9]);
    assert_eq!(iter.len(), 135);
    assert_eq!(iter.count(), 135);
    assert_eq!(GridPositionIterator::new(vec![]).count(), 0);
}
