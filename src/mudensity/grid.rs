use nalgebra::DVector;

use crate::math::round::{round_half_even, round_to_multiple};

use super::leafpair::LeafPairTrajectory;
use super::mudensityerror::MuDensityError;

/// 沿葉片行進方向的一維計算格點（cell 中心座標）。
///
/// 範圍由所有葉緣的最小/最大值對齊到 `grid_resolution` 的整數倍決定，
/// 邊界 cell 因此最多只有一半被葉緣切到。
#[derive(Debug, Clone, PartialEq)]
pub struct MlcGrid {
    resolution: f64,
    centres: DVector<f64>
}

/// 單一 leaf pair 格點數上限。
pub const MAX_GRID_CELLS: usize = 1 << 24;

pub fn validate_grid_resolution(grid_resolution: f64) -> Result<f64, MuDensityError> {
    if grid_resolution.is_finite() && grid_resolution > 0.0 {
        Ok(grid_resolution)
    } else {
        Err(MuDensityError::InvalidGridResolution(grid_resolution))
    }
}

impl MlcGrid {
    pub fn new(trajectory: &LeafPairTrajectory, grid_resolution: f64) -> Result<MlcGrid, MuDensityError> {
        let resolution = validate_grid_resolution(grid_resolution)?;
        let (min_edge, max_edge) = trajectory.span();
        let min_x = round_to_multiple(min_edge, resolution);
        let max_x = round_to_multiple(max_edge, resolution);
        // 格點數以 f64 檢查上限後才轉成 usize
        let cells = round_half_even((max_x - min_x) / resolution) + 1.0;
        if !cells.is_finite() || cells > MAX_GRID_CELLS as f64 {
            return Err(MuDensityError::GridTooLarge { cells });
        }
        let cells = cells as usize;
        let centres = DVector::from_fn(cells, |i, _| min_x + i as f64 * resolution);
        Ok(MlcGrid { resolution, centres })
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn centres(&self) -> &DVector<f64> {
        &self.centres
    }

    pub fn len(&self) -> usize {
        self.centres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centres.is_empty()
    }
}
