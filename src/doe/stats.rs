//! Distribution helpers for ANOVA and confidence intervals.
//!
//! Thin wrappers over `statrs` that return `None` instead of an error or a
//! non-finite value, so undefined statistics stay explicit.

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

/// Upper-tail probability P(F > f) for F(df1, df2).
///
/// `None` for non-positive degrees of freedom or a non-finite `f`.
#[must_use]
pub fn f_distribution_p_value(f: f64, df1: usize, df2: usize) -> Option<f64> {
    if df1 == 0 || df2 == 0 || !f.is_finite() {
        return None;
    }
    if f <= 0.0 {
        return Some(1.0);
    }
    let dist = FisherSnedecor::new(df1 as f64, df2 as f64).ok()?;
    let p = dist.sf(f);
    p.is_finite().then(|| p.clamp(0.0, 1.0))
}

/// Two-sided critical value of Student's t: the `(1 + confidence) / 2`
/// quantile with `df` degrees of freedom.
#[must_use]
pub fn t_value(confidence: f64, df: usize) -> Option<f64> {
    if df == 0 || !(0.0..1.0).contains(&confidence) {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, df as f64).ok()?;
    let t = dist.inverse_cdf((1.0 + confidence) / 2.0);
    t.is_finite().then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f_p_value_known_points() {
        // F(1, 1) at 1 has upper tail 0.5.
        let p = f_distribution_p_value(1.0, 1, 1).unwrap();
        assert!((p - 0.5).abs() < 1e-9);

        // Critical F(2, 10) at 0.05 is 4.1028.
        let p = f_distribution_p_value(4.102_821, 2, 10).unwrap();
        assert!((p - 0.05).abs() < 1e-4);

        assert_eq!(f_distribution_p_value(0.0, 2, 3), Some(1.0));
        assert!(f_distribution_p_value(2.0, 0, 3).is_none());
        assert!(f_distribution_p_value(f64::INFINITY, 1, 3).is_none());
    }

    #[test]
    fn test_t_value_table() {
        let cases = [
            (0.95, 1, 12.706),
            (0.95, 5, 2.571),
            (0.95, 30, 2.042),
            (0.90, 10, 1.812),
            (0.99, 4, 4.604),
        ];
        for (cl, df, expected) in cases {
            let t = t_value(cl, df).unwrap();
            assert!((t - expected).abs() < 1e-3, "t({cl}, {df}) = {t}");
        }
        assert!(t_value(0.95, 0).is_none());
    }
}
