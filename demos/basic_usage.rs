//! Basic usage example for the taguchi-doe engine.
//!
//! Builds and verifies a few arrays, then runs a Taguchi analysis on an L9
//! experiment. Set `RUST_LOG=taguchi_doe=debug` to watch the stages.

use ndarray::array;
use taguchi_doe::catalogue;
use taguchi_doe::config::Limits;
use taguchi_doe::doe::{analyze, AnalysisConfig, OptimizationType};
use taguchi_doe::{OABuilder, Result};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("taguchi-doe - Basic Usage Example\n");
    let limits = Limits::default();

    // L9: 9 runs, 4 factors, 3 levels, strength 2
    println!("Building a 3-level array for 4 factors...");
    let (l9, algorithm) = OABuilder::new()
        .levels(3)
        .factors(4)
        .strength(2)
        .build_with_algorithm()?;
    println!("Chosen construction: {}", algorithm.name());
    println!("{l9}");

    let report = l9.verify(&limits)?;
    if report.is_valid {
        println!("✓ Valid strength-{} orthogonal array", report.actual_strength);
    } else {
        for issue in &report.issues {
            println!("  Issue: {issue:?}");
        }
    }
    println!();

    // Prime power levels come from GF(2²)
    let gf4 = OABuilder::new().levels(4).factors(5).build()?;
    println!("GF(4) array: {} runs, {} factors", gf4.runs(), gf4.factors());
    println!("  Balanced: {}", gf4.balance_report().is_balanced());

    // Mixed levels: one 2-level factor alongside 3-level factors
    let mixed = OABuilder::new().mixed_levels(vec![2, 3, 3, 3]).build()?;
    println!("Mixed array: {} runs, levels {:?}", mixed.runs(), mixed.levels());
    println!();

    // Taguchi analysis on the catalogue L9 with two replicates
    let oa = catalogue::get("L9")?;
    let responses = array![
        [85.0, 86.0],
        [92.0, 91.0],
        [78.0, 79.0],
        [91.0, 90.0],
        [88.0, 89.0],
        [82.0, 83.0],
        [89.0, 88.0],
        [86.0, 87.0],
        [94.0, 93.0],
    ];
    let config = AnalysisConfig {
        optimization_type: OptimizationType::LargerIsBetter,
        ..AnalysisConfig::default()
    };
    let result = analyze(&oa, &responses, &config)?;

    println!("Grand mean: {:.2}", result.grand_mean);
    for effect in &result.main_effects {
        println!(
            "  {} (rank {}): range {:.2}, level means {:.2?}",
            effect.factor_name, effect.rank, effect.range, effect.level_means
        );
    }
    for entry in &result.anova.entries {
        let f = entry.f_ratio.map_or_else(|| "-".to_string(), |f| format!("{f:.2}"));
        println!(
            "  ANOVA {}: SS {:.3}, DF {}, F {f}{}",
            entry.factor_name,
            entry.sum_of_squares,
            entry.degrees_of_freedom,
            if entry.pooled { " (pooled)" } else { "" }
        );
    }

    let optimal = &result.optimal_settings;
    println!("Optimal levels: {:?}", optimal.level_indices);
    println!("Predicted mean: {:.2}", optimal.predicted_mean);
    if let Some(ci) = optimal.confidence_interval {
        println!("  {:.0}% interval: [{:.2}, {:.2}]", ci.level * 100.0, ci.lower, ci.upper);
    }

    Ok(())
}
