//! Sampled variation distribution.

use super::load_config;
use anyhow::Result;
use cohort_core::{bucketing_salt, choose_weighted, hash_fraction, VariationDefinition};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::path::Path;

/// Observed vs expected share of one variation.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub name: String,
    pub count: usize,
    pub observed: f64,
    pub expected: f64,
}

/// Bucket `samples` random client ids of `study_name` into `variations`.
pub fn sample<R: Rng>(
    rng: &mut R,
    study_name: &str,
    variations: &[VariationDefinition],
    samples: usize,
) -> Result<Vec<Share>> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for _ in 0..samples {
        let client_id = format!("{:032x}", rng.gen::<u128>());
        let fraction = hash_fraction(&bucketing_salt(study_name, &client_id));
        let chosen = choose_weighted(variations, fraction)?;
        *counts.entry(chosen.name.as_str()).or_default() += 1;
    }

    let total_weight: f64 = variations.iter().map(|v| v.weight).sum();
    Ok(variations
        .iter()
        .map(|v| {
            let count = counts.get(v.name.as_str()).copied().unwrap_or(0);
            Share {
                name: v.name.clone(),
                count,
                observed: if samples == 0 {
                    0.0
                } else {
                    count as f64 / samples as f64
                },
                expected: v.weight / total_weight,
            }
        })
        .collect())
}

pub fn handle_distribution(config_path: &Path, samples: usize, seed: Option<u64>) -> Result<()> {
    let config = load_config(config_path)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    tracing::debug!(samples, ?seed, "Sampling client ids");

    let shares = sample(
        &mut rng,
        &config.study_name,
        &config.weighted_variations,
        samples,
    )?;
    println!("{:<32} {:>8} {:>9} {:>9}", "variation", "count", "observed", "expected");
    for share in shares {
        println!(
            "{:<32} {:>8} {:>9.4} {:>9.4}",
            share.name, share.count, share.observed, share.expected
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_shares_track_weights() {
        let variations = vec![
            VariationDefinition::new("notification-interval-short", 1.5),
            VariationDefinition::new("notification-interval-longer", 1.5),
            VariationDefinition::new("control", 1.0),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let shares = sample(&mut rng, "cloud-storage-prompts", &variations, 20_000).unwrap();

        assert_eq!(shares.iter().map(|s| s.count).sum::<usize>(), 20_000);
        for share in &shares {
            assert!(
                (share.observed - share.expected).abs() < 0.02,
                "{} observed {} expected {}",
                share.name,
                share.observed,
                share.expected
            );
        }
    }

    #[test]
    fn zero_samples_reports_expected_only() {
        let variations = vec![VariationDefinition::new("control", 1.0)];
        let mut rng = StdRng::seed_from_u64(1);
        let shares = sample(&mut rng, "s", &variations, 0).unwrap();
        assert_eq!(shares[0].count, 0);
        assert_eq!(shares[0].observed, 0.0);
        assert_eq!(shares[0].expected, 1.0);
    }
}
