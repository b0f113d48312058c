use nalgebra::DVector;

use super::blocked::open_fraction;
use super::grid::{MlcGrid, validate_grid_resolution};
use super::leafpair::LeafPairTrajectory;
use super::mudensityerror::MuDensityError;

/// 單一 leaf pair 的 MU density 計算結果。
///
/// `grid()` 與 `mu_density()` 長度相同，第 i 個 density 對應第 i 個 cell 中心。
#[derive(Debug, Clone, PartialEq)]
pub struct MuDensity {
    grid: MlcGrid,
    mu_density: DVector<f64>
}

impl MuDensity {
    pub fn grid(&self) -> &DVector<f64> {
        self.grid.centres()
    }

    pub fn grid_resolution(&self) -> f64 {
        self.grid.resolution()
    }

    pub fn mu_density(&self) -> &DVector<f64> {
        &self.mu_density
    }

    pub fn len(&self) -> usize {
        self.mu_density.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu_density.is_empty()
    }

    /// (cell 中心, density) 依座標遞增排列。
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.grid().iter().copied().zip(self.mu_density.iter().copied())
    }

    pub fn max_density(&self) -> f64 {
        self.mu_density.iter().copied().fold(0.0, f64::max)
    }
}

/// Leaf pair 曝光累加器。
///
/// 在兩個 control point 間取 `time_steps` 個等距時間點（含兩端），
/// 每個時間點計算各 cell 的開放比例，最後取時間平均再乘上 delivered MU。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafPairExposure {
    grid_resolution: f64,
    time_steps: usize,
    delivered_mu: f64
}

impl LeafPairExposure {
    pub fn new(grid_resolution: f64, time_steps: usize) -> Result<LeafPairExposure, MuDensityError> {
        let grid_resolution = validate_grid_resolution(grid_resolution)?;
        if time_steps < 1 {
            return Err(MuDensityError::InvalidTimeSteps(time_steps));
        }
        Ok(LeafPairExposure { grid_resolution, time_steps, delivered_mu: 1.0 })
    }

    pub fn with_delivered_mu(self, delivered_mu: f64) -> Result<LeafPairExposure, MuDensityError> {
        if delivered_mu.is_finite() && delivered_mu >= 0.0 {
            Ok(LeafPairExposure { delivered_mu, ..self })
        } else {
            Err(MuDensityError::InvalidDeliveredMu(delivered_mu))
        }
    }

    pub fn grid_resolution(&self) -> f64 {
        self.grid_resolution
    }

    pub fn time_steps(&self) -> usize {
        self.time_steps
    }

    pub fn delivered_mu(&self) -> f64 {
        self.delivered_mu
    }

    /// 第 `step` 個時間點在 segment 上的位置（0 = start, 1 = end）。
    /// 只有一個時間點時取中點。
    fn sample_fraction(&self, step: usize) -> f64 {
        if self.time_steps == 1 {
            0.5
        } else {
            step as f64 / (self.time_steps - 1) as f64
        }
    }

    pub fn calculate(&self, trajectory: &LeafPairTrajectory) -> Result<MuDensity, MuDensityError> {
        let grid = MlcGrid::new(trajectory, self.grid_resolution)?;
        log::debug!(
            "leaf pair exposure: {} cells x {} time steps at resolution {}",
            grid.len(),
            self.time_steps,
            self.grid_resolution
        );

        let mut open_sum = DVector::<f64>::zeros(grid.len());
        for step in 0..self.time_steps {
            let fraction = self.sample_fraction(step);
            let left_edge = trajectory.left_edge(fraction);
            let right_edge = trajectory.right_edge(fraction);
            for (sum, &x) in open_sum.iter_mut().zip(grid.centres().iter()) {
                *sum += open_fraction(x, left_edge, right_edge, self.grid_resolution);
            }
        }

        let steps = self.time_steps as f64;
        let mu_density = open_sum.map(|sum| sum / steps * self.delivered_mu);
        Ok(MuDensity { grid, mu_density })
    }
}

/// 單一 leaf pair 的 MU density。
///
/// `left_positions`、`right_positions` 各為 `(start, end)` 兩個葉緣座標，
/// 回傳的 `MuDensity` 含格點中心與對應 density（delivered MU = 1）。
pub fn calc_single_leaf_pair(left_positions: &[f64],
                             right_positions: &[f64],
                             grid_resolution: f64,
                             time_steps: usize) -> Result<MuDensity, MuDensityError> {
    let exposure = LeafPairExposure::new(grid_resolution, time_steps)?;
    let trajectory = LeafPairTrajectory::new(left_positions, right_positions)?;
    exposure.calculate(&trajectory)
}
