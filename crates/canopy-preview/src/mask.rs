//! Arrays paired with an exclusion mask.

use crate::raster::RasterArray;

/// A 2-D array where masked elements are skipped by statistics and rendering.
#[derive(Debug, Clone)]
pub struct MaskedArray {
    values: Vec<f64>,
    mask: Vec<bool>,
    width: usize,
    height: usize,
}

impl MaskedArray {
    /// Mask every element equal to `sentinel`, plus any non-finite element.
    ///
    /// With no sentinel only non-finite values are masked.
    pub fn masked_equal(array: RasterArray, sentinel: Option<f64>) -> Self {
        match sentinel {
            Some(s) => Self::from_predicate(array, |v| v == s || !v.is_finite()),
            None => Self::from_predicate(array, |v| !v.is_finite()),
        }
    }

    /// Mask every element for which `is_masked` returns true.
    pub fn from_predicate<F>(array: RasterArray, is_masked: F) -> Self
    where
        F: Fn(f64) -> bool,
    {
        let (height, width) = array.shape();
        let values = array.into_values();
        let mask = values.iter().map(|&v| is_masked(v)).collect();
        Self {
            values,
            mask,
            width,
            height,
        }
    }

    /// Shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Unmasked value at (`row`, `col`). `None` if masked or out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let idx = row * self.width + col;
        (!self.mask[idx]).then_some(self.values[idx])
    }

    /// Whether (`row`, `col`) is masked. Out-of-range positions count as masked.
    pub fn is_masked(&self, row: usize, col: usize) -> bool {
        row >= self.height || col >= self.width || self.mask[row * self.width + col]
    }

    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|&&m| !m).count()
    }

    pub fn masked_count(&self) -> usize {
        self.mask.len() - self.valid_count()
    }

    /// Minimum and maximum over unmasked elements. `None` when all are masked.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .zip(&self.mask)
            .filter(|&(_, &masked)| !masked)
            .fold(None, |acc, (&v, _)| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(values: &[f64], width: usize) -> RasterArray {
        RasterArray::new(values.to_vec(), width, values.len() / width)
    }

    #[test]
    fn test_sentinel_excluded_from_range() {
        let masked = MaskedArray::masked_equal(array(&[-9999.0, 3.0, 12.5, -9999.0], 2), Some(-9999.0));
        assert_eq!(masked.valid_count(), 2);
        assert_eq!(masked.masked_count(), 2);
        assert_eq!(masked.min_max(), Some((3.0, 12.5)));
        assert_eq!(masked.get(0, 0), None);
        assert_eq!(masked.get(0, 1), Some(3.0));
        assert!(masked.is_masked(1, 1));
    }

    #[test]
    fn test_no_sentinel_masks_nothing() {
        let masked = MaskedArray::masked_equal(array(&[0.0, 1.0, 2.0, 3.0], 2), None);
        assert_eq!(masked.masked_count(), 0);
        assert_eq!(masked.min_max(), Some((0.0, 3.0)));
    }

    #[test]
    fn test_zero_sentinel_is_not_confused_with_absent() {
        let masked = MaskedArray::masked_equal(array(&[0.0, 5.0, 0.0, 7.0], 2), Some(0.0));
        assert_eq!(masked.valid_count(), 2);
        assert_eq!(masked.min_max(), Some((5.0, 7.0)));
    }

    #[test]
    fn test_non_finite_values_masked() {
        let masked = MaskedArray::masked_equal(
            array(&[f64::NAN, 2.0, f64::INFINITY, 4.0], 2),
            Some(f64::NAN),
        );
        assert_eq!(masked.valid_count(), 2);
        assert_eq!(masked.min_max(), Some((2.0, 4.0)));
    }

    #[test]
    fn test_all_masked() {
        let masked = MaskedArray::masked_equal(array(&[-1.0; 6], 3), Some(-1.0));
        assert_eq!(masked.shape(), (2, 3));
        assert_eq!(masked.valid_count(), 0);
        assert_eq!(masked.min_max(), None);
    }

    #[test]
    fn test_custom_predicate() {
        let masked = MaskedArray::from_predicate(array(&[1.0, 50.0, 2.0, 80.0], 4), |v| v > 10.0);
        assert_eq!(masked.min_max(), Some((1.0, 2.0)));
        assert!(masked.is_masked(0, 1));
        assert!(masked.is_masked(0, 4));
    }
}
