/// Price per share after buying `added` shares at `added_price` on top of `held`
/// shares bought at `held_price`: `(q0*p0 + q1*p1) / (q0 + q1)`.
///
/// Returns `added_price` when the combined quantity is zero.
pub fn weighted_average_price(held: i64, held_price: f64, added: i64, added_price: f64) -> f64 {
    let total = held as f64 + added as f64;
    if total == 0.0 {
        return added_price;
    }
    (held as f64 * held_price + added as f64 * added_price) / total
}

/// Percentage change from `paid` to `latest`. `None` when nothing was paid.
pub fn gain_or_loss(latest: f64, paid: f64) -> Option<f64> {
    if paid == 0.0 || !paid.is_finite() || !latest.is_finite() {
        return None;
    }
    Some((latest - paid) / paid * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_average() {
        assert_eq!(weighted_average_price(100, 1.0, 100, 2.0), 1.5);
        assert_eq!(weighted_average_price(300, 10.0, 100, 20.0), 12.5);
        assert_eq!(weighted_average_price(0, 5.0, 10, 3.0), 3.0);
    }

    #[test]
    fn test_weighted_average_of_nothing() {
        assert_eq!(weighted_average_price(0, 5.0, 0, 3.0), 3.0);
    }

    #[test]
    fn test_gain_or_loss() {
        assert_eq!(gain_or_loss(110.0, 100.0), Some(10.0));
        assert_eq!(gain_or_loss(50.0, 100.0), Some(-50.0));
        assert_eq!(format!("{:.2}", gain_or_loss(1.0, 3.0).unwrap()), "-66.67");
        assert_eq!(gain_or_loss(10.0, 0.0), None);
    }
}
