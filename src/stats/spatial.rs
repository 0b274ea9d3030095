//! Area-weighted spatial reduction of gridded temperature fields
//!
//! Grid cells on a regular latitude/longitude grid shrink toward the poles,
//! so a plain mean over-weights high latitudes. The global mean therefore
//! weights each cell by the cosine of its latitude, which is proportional to
//! cell area on such grids.

use crate::errors::Result;
use crate::series::{GlobalMeanSeries, GriddedField};
use rayon::prelude::*;

/// Cosine-latitude weights for a latitude coordinate array, in degrees north
pub fn latitude_weights(lats: &[f64]) -> Vec<f64> {
    lats.iter().map(|&lat| lat.to_radians().cos()).collect()
}

/// Reduces a gridded field to one area-weighted global mean per time step.
///
/// Time steps are independent, so they are distributed across the rayon
/// thread pool. Within a step the computation is sum(w * x) / sum(w) over
/// all finite cells; a step with no finite cells yields NaN rather than an
/// error so a few all-masked months do not sink an otherwise usable run.
///
/// # Errors
///
/// Returns an error if the resulting series fails its length invariant,
/// which cannot happen for a well-formed [`GriddedField`].
pub fn global_mean(field: &GriddedField) -> Result<GlobalMeanSeries> {
    let weights = latitude_weights(&field.lats);
    let n_lon = field.n_lon();

    let values: Vec<f64> = (0..field.n_time())
        .into_par_iter()
        .map(|t| {
            let mut weighted_sum = 0.0_f64;
            let mut weight_total = 0.0_f64;

            for (j, &w) in weights.iter().enumerate() {
                for k in 0..n_lon {
                    let x = field.data[[t, j, k]];
                    if x.is_finite() {
                        weighted_sum += f64::from(x) * w;
                        weight_total += w;
                    }
                }
            }

            if weight_total > 0.0 {
                weighted_sum / weight_total
            } else {
                f64::NAN
            }
        })
        .collect();

    GlobalMeanSeries::new(field.months.clone(), values, field.units.clone())
}
