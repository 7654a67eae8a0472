//! Catalogue of standard Taguchi orthogonal arrays.
//!
//! This module provides access to standard arrays like L4, L8, L9, L18, etc.
//! by their common names. Each entry is a recipe over [`Construction`]; the
//! matrix is built when the entry is looked up.
//!
//! | Name | Array           | Recipe                    |
//! |------|-----------------|---------------------------|
//! | L4   | 2³              | Bose, q = 2               |
//! | L8   | 2⁷              | Hadamard, n = 8           |
//! | L9   | 3⁴              | Bose, q = 3               |
//! | L12  | 2¹¹             | Hadamard (Paley), n = 12  |
//! | L16  | 2¹⁵             | Hadamard, n = 16          |
//! | L18  | 2¹ 3⁷           | Addelman-Kempthorne, s = 3 |
//! | L25  | 5⁶              | Bose, q = 5               |
//! | L27  | 3¹³             | Rao-Hamming, 3³           |
//! | L32  | 2³¹             | Hadamard, n = 32          |
//! | L49  | 7⁸              | Bose, q = 7               |
//! | L50  | 2¹ 5¹¹          | Addelman-Kempthorne, s = 5 |
//! | L64  | 2⁶³             | Hadamard, n = 64          |
//! | L81  | 3⁴⁰             | Rao-Hamming, 3⁴           |
//!
//! L36 is not listed: no finite-field construction exists for 6 levels.
//!
//! # Example
//!
//! ```
//! use taguchi_doe::catalogue;
//!
//! let oa = catalogue::get("l9").unwrap();
//! assert_eq!(oa.runs(), 9);
//! assert_eq!(oa.symmetric_levels(), Some(3));
//! ```

use serde::{Deserialize, Serialize};

use crate::config::Limits;
use crate::construct::{
    AddelmanParams, BoseParams, Construction, HadamardParams, RaoHammingParams,
};
use crate::error::{Error, Result};
use crate::oa::OA;

/// One standard array.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueEntry {
    /// Standard name, e.g. `L18`.
    pub name: &'static str,
    /// Number of runs.
    pub runs: usize,
    /// Number of factors.
    pub factors: usize,
    /// `(level count, number of factors)` groups in column order.
    pub level_groups: &'static [(u32, usize)],
    /// Strength.
    pub strength: u32,
    /// Short description.
    pub description: &'static str,
    /// How the matrix is built.
    pub recipe: Construction,
}

impl CatalogueEntry {
    /// Per-factor level counts.
    #[must_use]
    pub fn levels(&self) -> Vec<u32> {
        self.level_groups
            .iter()
            .flat_map(|&(s, n)| std::iter::repeat(s).take(n))
            .collect()
    }

    /// Whether any factor has `levels` levels.
    #[must_use]
    pub fn has_level(&self, levels: u32) -> bool {
        self.level_groups.iter().any(|&(s, _)| s == levels)
    }

    /// Exponent notation such as `2^1 3^7`.
    #[must_use]
    pub fn notation(&self) -> String {
        self.level_groups
            .iter()
            .map(|(s, n)| format!("{s}^{n}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build the matrix.
    ///
    /// # Errors
    ///
    /// Propagates construction errors, including `limits` violations.
    pub fn build(&self, limits: &Limits) -> Result<OA> {
        self.recipe.build(limits)
    }

    /// Summary without the matrix.
    #[must_use]
    pub fn info(&self) -> StandardArrayInfo {
        let mut levels: Vec<u32> = self.level_groups.iter().map(|&(s, _)| s).collect();
        levels.sort_unstable();
        levels.dedup();
        StandardArrayInfo {
            name: self.name.to_string(),
            runs: self.runs,
            factors: self.factors,
            levels,
            notation: self.notation(),
            strength: self.strength,
            description: self.description.to_string(),
            algorithm: self.recipe.name().to_string(),
        }
    }
}

/// Catalogue listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardArrayInfo {
    /// Standard name.
    pub name: String,
    /// Number of runs.
    pub runs: usize,
    /// Number of factors.
    pub factors: usize,
    /// Distinct level counts, ascending.
    pub levels: Vec<u32>,
    /// Exponent notation, e.g. `2^1 3^7`.
    pub notation: String,
    /// Strength.
    pub strength: u32,
    /// Short description.
    pub description: String,
    /// Construction used for the matrix.
    pub algorithm: String,
}

/// Search predicates; all given ones must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueFilter {
    /// At least this many runs.
    #[serde(default)]
    pub min_runs: Option<usize>,
    /// At most this many runs.
    #[serde(default)]
    pub max_runs: Option<usize>,
    /// Some factor has this many levels.
    #[serde(default)]
    pub levels: Option<u32>,
    /// At least this many factors.
    #[serde(default)]
    pub min_factors: Option<usize>,
}

impl CatalogueFilter {
    /// Whether `entry` satisfies every given predicate.
    #[must_use]
    pub fn matches(&self, entry: &CatalogueEntry) -> bool {
        self.min_runs.map_or(true, |min| entry.runs >= min)
            && self.max_runs.map_or(true, |max| entry.runs <= max)
            && self.levels.map_or(true, |s| entry.has_level(s))
            && self.min_factors.map_or(true, |min| entry.factors >= min)
    }
}

const fn bose(q: u32) -> Construction {
    Construction::Bose(BoseParams {
        levels: q,
        factors: None,
    })
}

const fn hadamard(order: usize) -> Construction {
    Construction::Hadamard(HadamardParams {
        order,
        factors: None,
    })
}

const fn addelman(s: u32) -> Construction {
    Construction::AddelmanKempthorne(AddelmanParams {
        two_level_factors: 1,
        s_level_factors: 2 * s as usize + 1,
        s_levels: s,
    })
}

const fn rao_hamming(q: u32, m: u32) -> Construction {
    Construction::RaoHamming(RaoHammingParams {
        levels: q,
        exponent: m,
        factors: None,
    })
}

static CATALOGUE: [CatalogueEntry; 13] = [
    CatalogueEntry {
        name: "L4",
        runs: 4,
        factors: 3,
        level_groups: &[(2, 3)],
        strength: 2,
        description: "Smallest 2-level array",
        recipe: bose(2),
    },
    CatalogueEntry {
        name: "L8",
        runs: 8,
        factors: 7,
        level_groups: &[(2, 7)],
        strength: 2,
        description: "Common 2-level array",
        recipe: hadamard(8),
    },
    CatalogueEntry {
        name: "L9",
        runs: 9,
        factors: 4,
        level_groups: &[(3, 4)],
        strength: 2,
        description: "Smallest 3-level array",
        recipe: bose(3),
    },
    CatalogueEntry {
        name: "L12",
        runs: 12,
        factors: 11,
        level_groups: &[(2, 11)],
        strength: 2,
        description: "Plackett-Burman 12-run array",
        recipe: hadamard(12),
    },
    CatalogueEntry {
        name: "L16",
        runs: 16,
        factors: 15,
        level_groups: &[(2, 15)],
        strength: 2,
        description: "16-run 2-level array",
        recipe: hadamard(16),
    },
    CatalogueEntry {
        name: "L18",
        runs: 18,
        factors: 8,
        level_groups: &[(2, 1), (3, 7)],
        strength: 2,
        description: "Mixed 2/3-level array",
        recipe: addelman(3),
    },
    CatalogueEntry {
        name: "L25",
        runs: 25,
        factors: 6,
        level_groups: &[(5, 6)],
        strength: 2,
        description: "5-level Bose array",
        recipe: bose(5),
    },
    CatalogueEntry {
        name: "L27",
        runs: 27,
        factors: 13,
        level_groups: &[(3, 13)],
        strength: 2,
        description: "Full 3-level array",
        recipe: rao_hamming(3, 3),
    },
    CatalogueEntry {
        name: "L32",
        runs: 32,
        factors: 31,
        level_groups: &[(2, 31)],
        strength: 2,
        description: "32-run Hadamard array",
        recipe: hadamard(32),
    },
    CatalogueEntry {
        name: "L49",
        runs: 49,
        factors: 8,
        level_groups: &[(7, 8)],
        strength: 2,
        description: "7-level Bose array",
        recipe: bose(7),
    },
    CatalogueEntry {
        name: "L50",
        runs: 50,
        factors: 12,
        level_groups: &[(2, 1), (5, 11)],
        strength: 2,
        description: "Mixed 2/5-level array",
        recipe: addelman(5),
    },
    CatalogueEntry {
        name: "L64",
        runs: 64,
        factors: 63,
        level_groups: &[(2, 63)],
        strength: 2,
        description: "64-run Hadamard array",
        recipe: hadamard(64),
    },
    CatalogueEntry {
        name: "L81",
        runs: 81,
        factors: 40,
        level_groups: &[(3, 40)],
        strength: 2,
        description: "Large 3-level array",
        recipe: rao_hamming(3, 4),
    },
];

/// Every catalogue entry, in run order.
#[must_use]
pub fn entries() -> &'static [CatalogueEntry] {
    &CATALOGUE
}

/// Entry by name, ignoring case.
///
/// # Errors
///
/// Returns `NotFound` for an unknown name.
pub fn lookup(name: &str) -> Result<&'static CatalogueEntry> {
    CATALOGUE
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| Error::NotFound(name.to_string()))
}

/// Build a standard array by name under default limits.
///
/// # Errors
///
/// Returns `NotFound` for an unknown name.
pub fn get(name: &str) -> Result<OA> {
    lookup(name)?.build(&Limits::default())
}

/// Summaries of every entry.
#[must_use]
pub fn list() -> Vec<StandardArrayInfo> {
    CATALOGUE.iter().map(CatalogueEntry::info).collect()
}

/// Summaries of the entries matching `filter`, in catalogue order.
#[must_use]
pub fn search(filter: &CatalogueFilter) -> Vec<StandardArrayInfo> {
    CATALOGUE
        .iter()
        .filter(|e| filter.matches(e))
        .map(CatalogueEntry::info)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_match_their_matrices() {
        let limits = Limits::default();
        for entry in entries() {
            let oa = entry.build(&limits).unwrap();
            assert_eq!(oa.runs(), entry.runs, "{}", entry.name);
            assert_eq!(oa.factors(), entry.factors, "{}", entry.name);
            assert_eq!(oa.levels(), entry.levels().as_slice(), "{}", entry.name);
            assert_eq!(oa.strength(), entry.strength, "{}", entry.name);
        }
    }

    #[test]
    fn test_small_entries_verify() {
        let limits = Limits::default();
        for name in ["L4", "L8", "L9", "L12", "L16", "L18", "L25", "L27"] {
            let oa = get(name).unwrap();
            let report = oa.verify(&limits).unwrap();
            assert!(report.is_valid, "{name}: {:?}", report.issues);
            assert!(oa.balance_report().is_balanced(), "{name}");
        }
    }

    #[test]
    fn test_l4_rows() {
        let oa = get("L4").unwrap();
        assert_eq!(
            oa.to_rows(),
            vec![vec![0, 0, 0], vec![1, 1, 0], vec![0, 1, 1], vec![1, 0, 1]]
        );
    }

    #[test]
    fn test_lookup_case_insensitive() {
        assert_eq!(lookup("l18").unwrap().name, "L18");
        assert_eq!(lookup("L9").unwrap().notation(), "3^4");
        assert_eq!(lookup("L18").unwrap().notation(), "2^1 3^7");
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(lookup("L36").unwrap_err(), Error::NotFound("L36".into()));
        assert!(matches!(get("L999"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_search_and_semantics() {
        let three_level = search(&CatalogueFilter {
            levels: Some(3),
            ..CatalogueFilter::default()
        });
        let names: Vec<&str> = three_level.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["L9", "L18", "L27", "L81"]);

        // Mixed arrays match on any of their level counts.
        let two_level_small = search(&CatalogueFilter {
            levels: Some(2),
            max_runs: Some(20),
            min_factors: Some(8),
            ..CatalogueFilter::default()
        });
        let names: Vec<&str> = two_level_small.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["L12", "L16", "L18"]);

        assert_eq!(search(&CatalogueFilter::default()).len(), entries().len());
        assert_eq!(search(&CatalogueFilter::default()), list());
    }
}
