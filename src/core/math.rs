// Math utilities and helper functions

/// Clamp a value between min and max
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Snap a value to exactly zero when its magnitude is below `threshold`
pub fn snap_to_zero(value: f32, threshold: f32) -> f32 {
    if value.abs() < threshold {
        0.0
    } else {
        value
    }
}

/// Check if two f64 values are approximately equal
pub fn approx_equal(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_snap_to_zero() {
        assert_eq!(snap_to_zero(4.9, 5.0), 0.0);
        assert_eq!(snap_to_zero(-4.9, 5.0), 0.0);
        assert_eq!(snap_to_zero(5.0, 5.0), 5.0);
        assert_eq!(snap_to_zero(-120.0, 5.0), -120.0);
    }

    #[test]
    fn test_approx_equal() {
        assert!(approx_equal(1.0, 1.0000001, 1e-6));
        assert!(!approx_equal(1.0, 1.1, 0.01));
    }
}
