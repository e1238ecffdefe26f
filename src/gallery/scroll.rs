/// Fraction of the scrollable range that is above the bottom edge of the
/// viewport. An empty or unallocated view counts as fully scrolled.
pub fn bottom_fraction(value: f64, page_size: f64, upper: f64) -> f64 {
    if !upper.is_finite() || upper <= 0.0 || page_size >= upper {
        return 1.0;
    }
    ((value + page_size) / upper).clamp(0.0, 1.0)
}

/// True when the next batch should be requested.
pub fn wants_more(value: f64, page_size: f64, upper: f64, threshold: f64) -> bool {
    bottom_fraction(value, page_size, upper) > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_view_is_at_bottom() {
        assert_eq!(bottom_fraction(0.0, 0.0, 0.0), 1.0);
        assert_eq!(bottom_fraction(0.0, 500.0, 400.0), 1.0);
        assert!(wants_more(0.0, 0.0, 0.0, 0.9));
    }

    #[test]
    fn fraction_tracks_scroll_position() {
        assert!((bottom_fraction(0.0, 250.0, 1000.0) - 0.25).abs() < 1e-9);
        assert!((bottom_fraction(750.0, 250.0, 1000.0) - 1.0).abs() < 1e-9);
        assert!(!wants_more(600.0, 250.0, 1000.0, 0.9));
        assert!(wants_more(660.0, 250.0, 1000.0, 0.9));
    }

    #[test]
    fn nonsense_allocation_is_treated_as_bottom() {
        assert_eq!(bottom_fraction(0.0, 10.0, f64::NAN), 1.0);
    }
}
