// ─────────────────────────────────────────────
// 單一葉片對 cell 的遮擋比例
// ─────────────────────────────────────────────
//
// cell 中心 x、寬度 r，覆蓋 [x - r/2, x + r/2]。
// 以「葉緣越過 cell 中心的距離」travel_diff 表示：
//   travel_diff >=  r/2 → 整格被遮（1）
//   travel_diff <= -r/2 → 整格開放（0）
//   其餘                → (travel_diff + r/2) / r

fn blocked_fraction(travel_diff: f64, grid_resolution: f64) -> f64 {
    let half = 0.5 * grid_resolution;
    if travel_diff >= half {
        1.0
    } else if travel_diff <= -half {
        0.0
    } else {
        (travel_diff + half) / grid_resolution
    }
}

/// 左葉由負側侵入，遮住座標小於 `left_edge` 的部分。
pub fn blocked_by_left(x: f64, left_edge: f64, grid_resolution: f64) -> f64 {
    blocked_fraction(left_edge - x, grid_resolution)
}

/// 右葉由正側侵入，遮住座標大於 `right_edge` 的部分。
pub fn blocked_by_right(x: f64, right_edge: f64, grid_resolution: f64) -> f64 {
    blocked_fraction(x - right_edge, grid_resolution)
}

/// cell 位於兩葉緣之間的比例；兩葉接觸或重疊時整排關閉。
pub fn open_fraction(x: f64, left_edge: f64, right_edge: f64, grid_resolution: f64) -> f64 {
    if right_edge <= left_edge {
        return 0.0;
    }
    let blocked = blocked_by_left(x, left_edge, grid_resolution)
        + blocked_by_right(x, right_edge, grid_resolution);
    (1.0 - blocked).max(0.0)
}
