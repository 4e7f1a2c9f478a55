//! Rate unit conversion

/// Bytes per second in one Mbps
pub const BYTES_PER_MEGABIT: f64 = 125_000.0;

pub const BITS_PER_BYTE: f64 = 8.0;

/// Convert a byte rate to Mbps
pub fn to_reporting_unit(bytes_per_second: f64) -> f64 {
    bytes_per_second / BYTES_PER_MEGABIT
}

/// Convert a bit rate to a byte rate
pub fn bits_to_bytes(bits_per_second: f64) -> f64 {
    bits_per_second / BITS_PER_BYTE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_reporting_unit() {
        assert_eq!(to_reporting_unit(125_000.0), 1.0);
        assert_eq!(to_reporting_unit(0.0), 0.0);
        assert_eq!(to_reporting_unit(bits_to_bytes(100_000_000.0)), 100.0);
    }

    #[test]
    fn test_to_reporting_unit_is_linear() {
        for x in [0.0, 1.0, 3.5, 125_000.0, 9_876_543.21, 1e12] {
            assert_eq!(to_reporting_unit(2.0 * x), 2.0 * to_reporting_unit(x));
        }
    }
}
