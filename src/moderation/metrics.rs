use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::domain::{Category, ClassificationResult, HumanAnnotation};

/// Pair counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStat {
    pub correct: u64,
    pub total: u64,
    pub ai_yes: u64,
    pub human_yes: u64,
    pub true_positives: u64,
}

impl CategoryStat {
    pub fn record(&mut self, ai: bool, human: bool) {
        self.total += 1;
        if ai == human {
            self.correct += 1;
        }
        if ai {
            self.ai_yes += 1;
        }
        if human {
            self.human_yes += 1;
        }
        if ai && human {
            self.true_positives += 1;
        }
    }

    pub fn false_positives(&self) -> u64 {
        self.ai_yes - self.true_positives
    }

    pub fn false_negatives(&self) -> u64 {
        self.human_yes - self.true_positives
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.ai_yes)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.human_yes)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn metrics(&self) -> CategoryMetrics {
        CategoryMetrics {
            accuracy: self.accuracy(),
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1(),
        }
    }
}

/// Derived scores, all fractions in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub overall_accuracy: f64,
    pub total_samples: u64,
    pub correct_predictions: u64,
    pub category_stats: BTreeMap<Category, CategoryStat>,
    pub category_metrics: BTreeMap<Category, CategoryMetrics>,
}

/// Scores results against ground truth joined by uid; results without an
/// annotation are skipped entirely.
pub fn score(
    results: &[ClassificationResult],
    annotations: &HashMap<String, HumanAnnotation>,
) -> ValidationReport {
    let mut category_stats: BTreeMap<Category, CategoryStat> = Category::ALL
        .iter()
        .map(|category| (*category, CategoryStat::default()))
        .collect();

    let mut skipped = 0usize;
    for result in results {
        let Some(human) = annotations.get(&result.uid) else {
            skipped += 1;
            continue;
        };
        for (category, stat) in category_stats.iter_mut() {
            stat.record(result.flag(*category), human.flag(*category));
        }
    }
    if skipped > 0 {
        tracing::debug!(target: "metrics", skipped, "results without a matching annotation");
    }

    let overall = category_stats
        .get(&Category::LabelsSpam)
        .copied()
        .unwrap_or_default();
    let category_metrics = category_stats
        .iter()
        .map(|(category, stat)| (*category, stat.metrics()))
        .collect();

    ValidationReport {
        overall_accuracy: overall.accuracy(),
        total_samples: overall.total,
        correct_predictions: overall.correct,
        category_stats,
        category_metrics,
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
