//! Local-extrema detection.

/// Positions of local minima in `values` for a window radius `r`.
///
/// A position `i` (with `r <= i < len - r`) qualifies iff its value is
/// `<=` every value within `r` positions on both sides. Ties at equal
/// value all count. Boundary positions never qualify: a minimum needs a
/// full window of confirmation on each side.
///
/// Returned indices are ascending. `r == 0` or a sequence shorter than
/// `2r + 1` yields no minima.
pub fn local_minima(values: &[f64], radius: usize) -> Vec<usize> {
    if radius == 0 || values.len() < 2 * radius + 1 {
        return Vec::new();
    }

    let mut minima = Vec::new();
    for i in radius..values.len() - radius {
        let v = values[i];
        let window_min = values[i - radius..=i + radius]
            .iter()
            .cloned()
            .fold(f64::INFINITY, f64::min);
        if v <= window_min {
            minima.push(i);
        }
    }
    minima
}
