use std::fmt;

use super::mudensityerror::MuDensityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    Left,
    Right
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::Left => write!(f, "left"),
            Leaf::Right => write!(f, "right")
        }
    }
}

/// 單一 MLC leaf pair 在兩個 control point 之間的直線運動。
///
/// 左葉以 MLC 慣例儲存：正值代表由負側侵入的距離，
/// 因此 `left_edge()` 會把儲存值取負號還原成座標。
/// 右葉直接存座標。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafPairTrajectory {
    left_mlc: [f64; 2],
    right_mlc: [f64; 2]
}

fn two_positions(leaf: Leaf, positions: &[f64]) -> Result<[f64; 2], MuDensityError> {
    let pair: [f64; 2] = positions
        .try_into()
        .map_err(|_| MuDensityError::InvalidPositionCount { leaf, found: positions.len() })?;
    if pair.iter().all(|p| p.is_finite()) {
        Ok(pair)
    } else {
        Err(MuDensityError::NonFinitePosition { leaf })
    }
}

impl LeafPairTrajectory {
    /// `left_positions` 與 `right_positions` 皆為 `(start, end)` 的邊緣座標。
    pub fn new(left_positions: &[f64], right_positions: &[f64]) -> Result<LeafPairTrajectory, MuDensityError> {
        let left = two_positions(Leaf::Left, left_positions)?;
        let right = two_positions(Leaf::Right, right_positions)?;
        Ok(LeafPairTrajectory {
            left_mlc: [-left[0], -left[1]],
            right_mlc: right
        })
    }

    pub fn stationary(left_edge: f64, right_edge: f64) -> Result<LeafPairTrajectory, MuDensityError> {
        LeafPairTrajectory::new(&[left_edge, left_edge], &[right_edge, right_edge])
    }

    /// 左葉邊緣座標，`fraction` 為 0（start）到 1（end）。
    pub fn left_edge(&self, fraction: f64) -> f64 {
        -lerp(self.left_mlc, fraction)
    }

    pub fn right_edge(&self, fraction: f64) -> f64 {
        lerp(self.right_mlc, fraction)
    }

    /// 兩個 control point 上所有葉緣座標的 (最小, 最大)。
    pub fn span(&self) -> (f64, f64) {
        let edges = [
            self.left_edge(0.0),
            self.left_edge(1.0),
            self.right_edge(0.0),
            self.right_edge(1.0)
        ];
        edges.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &e| (lo.min(e), hi.max(e)))
    }
}

fn lerp(positions: [f64; 2], fraction: f64) -> f64 {
    if positions[0] == positions[1] {
        return positions[0];
    }
    positions[0] * (1.0 - fraction) + positions[1] * fraction
}
