/// 四捨六入五成雙（banker's rounding）。
///
/// `f64::round` 在 .5 時一律遠離 0，這裡改為取最接近的偶數，
/// 與 numpy `np.round` 的行為一致，格點邊界才不會因為 .5 而偏向一側。
pub fn round_half_even(x: f64) -> f64 {
    let z = x.round();
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        z
    }
}

/// 將 `x` 對齊到 `step` 的整數倍（五成雙）。
pub fn round_to_multiple(x: f64, step: f64) -> f64 {
    round_half_even(x / step) * step
}
