use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;

/// Weekly compounding.
pub const COMPOUNDING_PERIODS: f64 = 52.0;

/// `(1 + apr / periods) ^ periods - 1`
pub fn convert_float_apr_to_apy(apr: f64, periods: f64) -> f64 {
    (1.0 + (apr / periods)).powf(periods) - 1.0
}

/// Compounds a decimal APR over [`COMPOUNDING_PERIODS`].
///
/// This is the only place where the computation narrows to `f64`. The result
/// keeps the shortest decimal representation of the float.
pub fn compound_apr(apr: &BigDecimal) -> BigDecimal {
    let apr = apr.to_f64().unwrap_or_default();
    let apy = convert_float_apr_to_apy(apr, COMPOUNDING_PERIODS);
    if !apy.is_finite() {
        return BigDecimal::default();
    }
    apy.to_string().parse().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_convert_float_apr_to_apy() {
        assert!(convert_float_apr_to_apy(0.0, COMPOUNDING_PERIODS).abs() < f64::EPSILON);
        let apy = convert_float_apr_to_apy(0.05, COMPOUNDING_PERIODS);
        assert!((apy - 0.051_245_841_927_2).abs() < 1e-12);
        // a single period does not compound
        assert!((convert_float_apr_to_apy(0.05, 1.0) - 0.05).abs() < 1e-15);
    }

    #[test]
    fn test_apr_to_apy_is_increasing() {
        let aprs = [-51.9, -10.0, -1.0, -0.5, -0.01, 0.0, 0.01, 0.05, 0.5, 1.0, 5.0, 10.0];
        for pair in aprs.windows(2) {
            let low = convert_float_apr_to_apy(pair[0], COMPOUNDING_PERIODS);
            let high = convert_float_apr_to_apy(pair[1], COMPOUNDING_PERIODS);
            assert!(low < high, "{} -> {low} vs {} -> {high}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_compound_apr() {
        let apy = compound_apr(&BigDecimal::from_str("0.07164").unwrap());
        let diff = (apy - BigDecimal::from_str("0.0742155737").unwrap()).abs();
        assert!(diff < BigDecimal::from_str("0.0000000001").unwrap());

        assert_eq!(compound_apr(&BigDecimal::from(0)), BigDecimal::from(0));
        assert_eq!(compound_apr(&BigDecimal::from(1_000_000_000)), BigDecimal::from(0));
    }
}
