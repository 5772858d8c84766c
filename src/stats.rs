//! Single-pass descriptive statistics over numeric column values

/// Arithmetic mean; None for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; averages the two middle values for even counts
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1 denominator); None for fewer than two
/// values
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Adjusted Fisher-Pearson skewness coefficient, the definition pandas uses.
/// Needs at least three values and non-zero spread.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let m = mean(values)?;
    let s = std_dev(values)?;
    if s == 0.0 {
        return None;
    }

    let n_f = n as f64;
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n_f;
    let g1 = m3 / (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n_f).powf(1.5);
    Some(g1 * (n_f * (n_f - 1.0)).sqrt() / (n_f - 2.0))
}

/// Pearson correlation over paired values; None when either side has no
/// spread or fewer than two pairs are given
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        var_x += (x - mx).powi(2);
        var_y += (y - my).powi(2);
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Most frequent value; first-seen wins ties so results are deterministic
pub fn mode<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: indexmap::IndexMap<&str, usize> = indexmap::IndexMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in &counts {
        // Strict comparison keeps the first-seen value on ties
        if best.map_or(true, |(_, c)| *count > c) {
            best = Some((value, *count));
        }
    }
    best.map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_median() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[1.0, 3.0]), Some(2.0));
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn test_std_dev_sample() {
        let s = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((s - 2.138089935).abs() < 1e-6);
        assert!(std_dev(&[1.0]).is_none());
    }

    #[test]
    fn test_skewness_symmetric_is_zero() {
        let s = skewness(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!(s.abs() < 1e-9);
    }

    #[test]
    fn test_skewness_right_tail_positive() {
        let s = skewness(&[1.0, 1.0, 1.0, 1.0, 100.0]).unwrap();
        assert!(s > 1.0);
    }

    #[test]
    fn test_skewness_needs_spread() {
        assert!(skewness(&[5.0, 5.0, 5.0, 5.0]).is_none());
        assert!(skewness(&[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_pearson() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < 1e-9);

        let inverse = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&xs, &inverse).unwrap() + 1.0).abs() < 1e-9);

        assert!(pearson(&xs, &[1.0, 1.0, 1.0, 1.0]).is_none());
    }

    #[test]
    fn test_mode_ties_go_to_first_seen() {
        assert_eq!(mode(["b", "a", "a", "b"]), Some("b"));
        assert_eq!(mode(["x", "y", "y"]), Some("y"));
        assert_eq!(mode(Vec::<&str>::new()), None);
    }
}
