//! Vertical geometry derived from full-level heights

use super::{Field2D, GridError};

/// Layer thickness from geometric heights of full levels
///
/// Level 0 is the top of the column. Half-level heights are rebuilt from the
/// bottom up: the lowest half level is extrapolated linearly from the two
/// lowest full levels, and each full level sits midway between its bounding
/// half levels.
///
/// # Errors
///
/// Returns [`GridError::TooFewLevels`] for fewer than two levels
pub fn layer_thickness(zg: &Field2D) -> Result<Field2D, GridError> {
    let shape = zg.shape();
    if shape.levels < 2 {
        return Err(GridError::TooFewLevels {
            levels: shape.levels,
        });
    }

    let z = zg.as_slice();
    let mut dz = Field2D::new(shape);
    let out = dz.as_mut_slice();
    let ke = shape.levels;

    for column in 0..shape.columns {
        let lowest = z[shape.index(ke - 1, column)];
        let above = z[shape.index(ke - 2, column)];
        let mut z_half_below = (3.0 * lowest - above) * 0.5;

        for level in (0..ke).rev() {
            let idx = shape.index(level, column);
            let z_half_above = 2.0 * z[idx] - z_half_below;
            out[idx] = z_half_above - z_half_below;
            z_half_below = z_half_above;
        }
    }

    Ok(dz)
}
