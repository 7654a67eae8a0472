//! ANOVA (Analysis of Variance) for DOE.
//!
//! The decomposition runs over every observation, so replicated designs get
//! their error term from within-run spread as well as from unexplained
//! between-run variation:
//!
//! - `SS_T = Σ (y - ȳ)²` over all `N·r` values, `DF_T = N·r - 1`
//! - `SS_A = Σ_l n_l·r·(ȳ_l - ȳ)²`, `DF_A = s_A - 1`
//! - `SS_e = SS_T - Σ SS_A`, `DF_e = N·r - 1 - Σ DF_A`
//!
//! A saturated design (`DF_e ≤ 0`) needs pooling to produce an error term at
//! all; the factor with the smallest mean square is pooled first until the
//! error has degrees of freedom. Threshold pooling then folds factors with
//! `F < threshold` into error, smallest F first, never leaving fewer than
//! `min_unpooled_factors` in the table.

use ndarray::ArrayView2;
use tracing::debug;

use super::main_effects::level_means;
use super::stats::f_distribution_p_value;
use super::types::{ANOVAEntry, ANOVAResult, FactorLabel};
use crate::accounting::DesignAccounting;
use crate::config::AnalysisSettings;
use crate::error::{Error, Result};

/// Residuals below this fraction of `SS_T` are rounding noise.
const RESIDUAL_TOLERANCE: f64 = 1e-12;

/// Calculate the ANOVA table with optional pooling.
///
/// `responses` is runs × replicates; `run_means` and `grand_mean` must be
/// derived from it.
///
/// # Errors
///
/// Returns `DegenerateStatistics` when the design is saturated and pooling
/// is disabled, or when pooling cannot recover error degrees of freedom
/// without crossing `min_unpooled_factors`. Returns `InvalidParams` if a
/// declared level never occurs.
pub fn calculate_anova(
    array_data: ArrayView2<'_, u32>,
    levels: &[u32],
    responses: ArrayView2<'_, f64>,
    run_means: &[f64],
    grand_mean: f64,
    settings: &AnalysisSettings,
    labels: &[FactorLabel],
) -> Result<ANOVAResult> {
    let (runs, replicates) = responses.dim();
    let observations = runs * replicates;

    let total_ss: f64 = responses.iter().map(|y| (y - grand_mean).powi(2)).sum();
    let total_df = observations.saturating_sub(1);

    let mut entries = Vec::with_capacity(levels.len());
    for (factor_index, (&s, label)) in levels.iter().zip(labels).enumerate() {
        let column = array_data.column(factor_index);
        let (means, counts) = level_means(column.iter().copied(), s, run_means, factor_index)?;
        let ss: f64 = means
            .iter()
            .zip(&counts)
            .map(|(m, &n)| (n * replicates) as f64 * (m - grand_mean).powi(2))
            .sum();
        let df = s as usize - 1;

        entries.push(ANOVAEntry {
            factor_index,
            factor_id: label.id.clone(),
            factor_name: label.name.clone(),
            sum_of_squares: ss,
            degrees_of_freedom: df,
            mean_square: if df > 0 { ss / df as f64 } else { 0.0 },
            f_ratio: None,
            p_value: None,
            contribution_percent: (total_ss > 0.0).then(|| ss / total_ss * 100.0),
            pooled: false,
        });
    }

    let factor_ss: f64 = entries.iter().map(|e| e.sum_of_squares).sum();
    let residual = total_ss - factor_ss;
    let mut error_ss = if residual <= total_ss * RESIDUAL_TOLERANCE {
        0.0
    } else {
        residual
    };
    let accounting = DesignAccounting::new(runs, levels);
    let mut error_df = accounting.error_df_with_replicates(replicates);

    if error_df <= 0 {
        if !settings.enable_pooling {
            return Err(Error::degenerate(format!(
                "design has {error_df} error degrees of freedom with {replicates} replicate(s) \
                 and pooling is disabled; use at least {} replicates or enable pooling",
                accounting.min_replicates
            )));
        }
        seed_error_term(
            &mut entries,
            &mut error_ss,
            &mut error_df,
            settings.min_unpooled_factors,
            accounting.min_replicates,
        )?;
    }

    // Positive from here on.
    let mut error_df = error_df as usize;

    if settings.enable_pooling {
        pool_factors(
            &mut entries,
            &mut error_ss,
            &mut error_df,
            settings.pooling_threshold,
            settings.min_unpooled_factors,
        );
    }

    let error_ms = error_ss / error_df as f64;

    for entry in entries.iter_mut().filter(|e| !e.pooled) {
        if error_ms > 0.0 && entry.degrees_of_freedom > 0 {
            let f = entry.mean_square / error_ms;
            entry.f_ratio = Some(f);
            entry.p_value = f_distribution_p_value(f, entry.degrees_of_freedom, error_df);
        }
    }

    debug!(
        total_ss,
        error_ss,
        error_df,
        pooled = entries.iter().filter(|e| e.pooled).count(),
        "ANOVA complete"
    );

    Ok(ANOVAResult {
        entries,
        error_ss,
        error_df,
        error_ms,
        total_ss,
        total_df,
    })
}

/// Pool smallest-MS factors until the error term has degrees of freedom.
fn seed_error_term(
    entries: &mut [ANOVAEntry],
    error_ss: &mut f64,
    error_df: &mut i64,
    min_unpooled: usize,
    min_replicates: usize,
) -> Result<()> {
    while *error_df <= 0 {
        let unpooled = entries.iter().filter(|e| !e.pooled).count();
        if unpooled <= min_unpooled {
            return Err(Error::degenerate(format!(
                "saturated design: pooling down to {min_unpooled} unpooled factor(s) leaves no \
                 error degrees of freedom; use at least {min_replicates} replicates"
            )));
        }

        // Ties go to the later factor.
        let Some(idx) = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.pooled)
            .fold(None, |best: Option<(usize, f64)>, (i, e)| match best {
                Some((_, ms)) if e.mean_square > ms => best,
                _ => Some((i, e.mean_square)),
            })
            .map(|(i, _)| i)
        else {
            break;
        };

        let entry = &mut entries[idx];
        entry.pooled = true;
        *error_ss += entry.sum_of_squares;
        *error_df += entry.degrees_of_freedom as i64;
        debug!(factor = idx, error_df = *error_df, "pooled to seed error term");
    }
    Ok(())
}

/// Pool factors with low F-ratios into error.
///
/// One factor per pass: F-ratios are recomputed against the enlarged error
/// term before the next candidate is chosen.
fn pool_factors(
    entries: &mut [ANOVAEntry],
    error_ss: &mut f64,
    error_df: &mut usize,
    pooling_threshold: f64,
    min_unpooled: usize,
) {
    loop {
        let error_ms = *error_ss / *error_df as f64;
        if error_ms <= 0.0 {
            break;
        }
        if entries.iter().filter(|e| !e.pooled).count() <= min_unpooled {
            break;
        }

        let mut candidate: Option<(usize, f64)> = None;
        for (idx, entry) in entries.iter().enumerate() {
            if entry.pooled {
                continue;
            }
            let f = entry.mean_square / error_ms;
            if f < pooling_threshold && candidate.map_or(true, |(_, best)| f <= best) {
                candidate = Some((idx, f));
            }
        }

        let Some((idx, f)) = candidate else { break };
        let entry = &mut entries[idx];
        entry.pooled = true;
        *error_ss += entry.sum_of_squares;
        *error_df += entry.degrees_of_freedom;
        debug!(factor = idx, f_ratio = f, error_df = *error_df, "pooled factor");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn l4() -> Array2<u32> {
        array![[0, 0, 0], [1, 1, 0], [0, 1, 1], [1, 0, 1]]
    }

    fn labels(k: usize) -> Vec<FactorLabel> {
        (0..k).map(FactorLabel::default_for).collect()
    }

    fn run(
        data: &Array2<u32>,
        levels: &[u32],
        responses: &Array2<f64>,
        settings: &AnalysisSettings,
    ) -> Result<ANOVAResult> {
        let run_means: Vec<f64> = responses.rows().into_iter().map(|r| r.mean().unwrap()).collect();
        let grand = responses.mean().unwrap();
        calculate_anova(
            data.view(),
            levels,
            responses.view(),
            &run_means,
            grand,
            settings,
            &labels(levels.len()),
        )
    }

    fn no_pooling() -> AnalysisSettings {
        AnalysisSettings {
            enable_pooling: false,
            ..AnalysisSettings::default()
        }
    }

    #[test]
    fn test_l4_seeded_by_pooling() {
        let responses = array![[10.0], [20.0], [30.0], [40.0]];
        let anova = run(&l4(), &[2, 2, 2], &responses, &AnalysisSettings::default()).unwrap();

        assert!((anova.total_ss - 500.0).abs() < 1e-9);
        assert_eq!(anova.total_df, 3);
        let ss: Vec<f64> = anova.entries.iter().map(|e| e.sum_of_squares).collect();
        assert!((ss[0] - 100.0).abs() < 1e-9);
        assert!(ss[1].abs() < 1e-9);
        assert!((ss[2] - 400.0).abs() < 1e-9);

        // The zero-MS factor seeds the error term; nothing is left to estimate F.
        assert!(anova.entries[1].pooled);
        assert_eq!(anova.error_df, 1);
        assert_eq!(anova.error_ms, 0.0);
        assert!(anova.entries.iter().all(|e| e.f_ratio.is_none()));

        let pct: f64 = anova.entries.iter().filter_map(|e| e.contribution_percent).sum();
        assert!((pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_saturated_without_pooling_fails() {
        let responses = array![[10.0], [20.0], [30.0], [40.0]];
        let err = run(&l4(), &[2, 2, 2], &responses, &no_pooling()).unwrap_err();
        assert!(matches!(err, Error::DegenerateStatistics { .. }));
        assert!(err.to_string().contains("2 replicates"));
    }

    #[test]
    fn test_replicated_l4() {
        let responses = array![[10.0, 11.0], [20.0, 21.0], [30.0, 31.0], [40.0, 42.0]];
        let anova = run(&l4(), &[2, 2, 2], &responses, &no_pooling()).unwrap();
        assert_eq!(anova.total_df, 7);
        assert_eq!(anova.error_df, 4);
        assert!(anova.error_ms > 0.0);
        for entry in &anova.entries {
            assert!(entry.f_ratio.is_some());
            let p = entry.p_value.unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
        let explained: f64 = anova.entries.iter().map(|e| e.sum_of_squares).sum();
        assert!((explained + anova.error_ss - anova.total_ss).abs() < 1e-9);
    }

    #[test]
    fn test_pooling_floor() {
        let responses = array![[10.0, 11.0], [10.2, 11.1], [10.1, 10.9], [10.3, 11.2]];
        for min_unpooled in [1, 2] {
            let settings = AnalysisSettings {
                pooling_threshold: 1e6,
                min_unpooled_factors: min_unpooled,
                ..AnalysisSettings::default()
            };
            let anova = run(&l4(), &[2, 2, 2], &responses, &settings).unwrap();
            assert_eq!(anova.unpooled().count(), min_unpooled);
            assert_eq!(anova.error_df, 4 + (3 - min_unpooled));
        }
    }

    #[test]
    fn test_seeding_respects_floor() {
        let responses = array![[10.0], [20.0], [30.0], [40.0]];
        let settings = AnalysisSettings {
            min_unpooled_factors: 3,
            ..AnalysisSettings::default()
        };
        let err = run(&l4(), &[2, 2, 2], &responses, &settings).unwrap_err();
        assert!(matches!(err, Error::DegenerateStatistics { .. }));
    }

    #[test]
    fn test_significant_factor_survives_pooling() {
        let data: Array2<u32> = array![[0, 0, 0], [0, 1, 1], [1, 0, 1], [1, 1, 0]];
        let responses = array![[10.0, 10.5], [50.0, 50.4], [10.1, 10.3], [50.1, 50.6]];
        let anova = run(&data, &[2, 2, 2], &responses, &AnalysisSettings::default()).unwrap();
        assert!(!anova.entries[1].pooled);
        assert!(anova.entries[1].p_value.unwrap() < 0.01);
    }

    #[test]
    fn test_constant_response_has_no_contribution() {
        let responses = array![[5.0, 5.0], [5.0, 5.0], [5.0, 5.0], [5.0, 5.0]];
        let anova = run(&l4(), &[2, 2, 2], &responses, &no_pooling()).unwrap();
        assert_eq!(anova.total_ss, 0.0);
        assert!(anova.entries.iter().all(|e| e.contribution_percent.is_none()));
        assert!(anova.entries.iter().all(|e| e.f_ratio.is_none()));
    }
}
