//! Parameter-major views over a fit's derivative buffer.
//!
//! The evaluators write partial derivatives into a flat buffer laid out as a
//! `(n_params × n_points)` matrix stored row by row:
//!
//! ```text
//! offset(k, point_index) = k * n_points + point_index
//! ```
//!
//! so all points of one parameter are contiguous. A least-squares engine reads
//! that row as one Jacobian column. `nalgebra` matrices are column-major, which
//! makes the flat buffer exactly the storage of an `n_points × n_params`
//! Jacobian.

use nalgebra::DMatrix;

use crate::error::AppError;

fn check_len(len: usize, n_params: usize, n_points: usize) -> Result<(), AppError> {
    let expected = n_params
        .checked_mul(n_points)
        .ok_or_else(|| AppError::invalid("Derivative buffer size overflows usize."))?;
    if len != expected {
        return Err(AppError::invalid(format!(
            "Derivative buffer has {len} elements, expected {n_params} params × {n_points} points = {expected}."
        )));
    }
    Ok(())
}

/// Read-only parameter-major view.
#[derive(Debug, Clone, Copy)]
pub struct DerivativeView<'a> {
    data: &'a [f32],
    n_params: usize,
    n_points: usize,
}

impl<'a> DerivativeView<'a> {
    pub fn new(data: &'a [f32], n_params: usize, n_points: usize) -> Result<Self, AppError> {
        check_len(data.len(), n_params, n_points)?;
        Ok(Self {
            data,
            n_params,
            n_points,
        })
    }

    pub fn n_params(&self) -> usize {
        self.n_params
    }

    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Distance between the same point in consecutive parameter rows.
    pub fn stride(&self) -> usize {
        self.n_points
    }

    pub fn get(&self, param: usize, point_index: usize) -> f32 {
        self.data[param * self.n_points + point_index]
    }

    /// All points' partials for one parameter (a Jacobian column).
    pub fn column(&self, param: usize) -> &'a [f32] {
        let start = param * self.n_points;
        &self.data[start..start + self.n_points]
    }

    /// The gradient at one point (one Jacobian row), gathered across the stride.
    pub fn row(&self, point_index: usize) -> Vec<f32> {
        (0..self.n_params)
            .map(|k| self.get(k, point_index))
            .collect()
    }

    /// Jacobian as an `n_points × n_params` matrix (promoted to `f64`).
    pub fn to_jacobian(&self) -> DMatrix<f64> {
        let promoted: Vec<f64> = self.data.iter().map(|&v| f64::from(v)).collect();
        DMatrix::from_column_slice(self.n_points, self.n_params, &promoted)
    }
}

/// Mutable parameter-major view used by the evaluators to place partials.
#[derive(Debug)]
pub struct DerivativesMut<'a> {
    data: &'a mut [f32],
    n_params: usize,
    n_points: usize,
}

impl<'a> DerivativesMut<'a> {
    pub fn new(data: &'a mut [f32], n_params: usize, n_points: usize) -> Result<Self, AppError> {
        check_len(data.len(), n_params, n_points)?;
        Ok(Self {
            data,
            n_params,
            n_points,
        })
    }

    /// Wrap a buffer without checking its length.
    ///
    /// Used on the per-point hot path, where the caller owns the layout contract.
    /// Out-of-range writes panic on the slice bounds check.
    pub fn unchecked(data: &'a mut [f32], n_params: usize, n_points: usize) -> Self {
        Self {
            data,
            n_params,
            n_points,
        }
    }

    pub fn set(&mut self, param: usize, point_index: usize, value: f32) {
        self.data[param * self.n_points + point_index] = value;
    }

    /// Write one point's full gradient, one slot per parameter row.
    pub fn set_point(&mut self, point_index: usize, gradient: &[f32]) {
        debug_assert_eq!(gradient.len(), self.n_params);
        for (k, &d) in gradient.iter().enumerate() {
            self.set(k, point_index, d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_rejects_wrong_length() {
        let data = vec![0.0_f32; 10];
        let err = DerivativeView::new(&data, 7, 2).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(DerivativeView::new(&data, 5, 2).is_ok());
    }

    #[test]
    fn offsets_are_parameter_major() {
        let mut data = vec![0.0_f32; 3 * 4];
        {
            let mut d = DerivativesMut::new(&mut data, 3, 4).unwrap();
            d.set(2, 1, 7.0);
            d.set_point(3, &[1.0, 2.0, 3.0]);
        }
        assert_eq!(data[2 * 4 + 1], 7.0);
        assert_eq!(data[3], 1.0);
        assert_eq!(data[4 + 3], 2.0);
        assert_eq!(data[2 * 4 + 3], 3.0);

        let view = DerivativeView::new(&data, 3, 4).unwrap();
        assert_eq!((view.n_params(), view.n_points()), (3, 4));
        assert_eq!(view.stride(), 4);
        assert_eq!(view.column(2), &[0.0, 7.0, 0.0, 3.0]);
        assert_eq!(view.row(3), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn jacobian_columns_are_parameters() {
        let data: Vec<f32> = (0..6).map(|v| v as f32).collect();
        let view = DerivativeView::new(&data, 2, 3).unwrap();
        let j = view.to_jacobian();
        assert_eq!(j.nrows(), 3);
        assert_eq!(j.ncols(), 2);
        assert_eq!(j[(0, 1)], 3.0);
        assert_eq!(j[(2, 0)], 2.0);
        assert_eq!(j[(2, 1)], 5.0);
    }
}
