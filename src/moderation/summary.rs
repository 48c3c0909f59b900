use serde::Serialize;

use crate::domain::{Category, ClassificationResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub spam: usize,
    pub keyword_spam: usize,
    pub malicious_links: usize,
    pub ads: usize,
    pub wrong_language: usize,
    pub unreadable: usize,
    pub average_confidence: Option<f64>,
    pub low_confidence: usize,
}

impl RunSummary {
    pub fn spam_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.spam as f64 / self.total as f64
        }
    }
}

pub fn summarize(results: &[ClassificationResult]) -> RunSummary {
    let count = |category: Category| results.iter().filter(|r| r.flag(category)).count();
    let scores: Vec<u8> = results.iter().filter_map(|r| r.confidence_score).collect();
    let average_confidence = (!scores.is_empty())
        .then(|| scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64);

    RunSummary {
        total: results.len(),
        spam: count(Category::LabelsSpam),
        keyword_spam: count(Category::KeywordSpam),
        malicious_links: count(Category::MaliciousLinks),
        ads: count(Category::Ads),
        wrong_language: count(Category::WrongLanguage),
        unreadable: count(Category::Unreadable),
        average_confidence,
        low_confidence: scores.iter().filter(|s| **s <= 2).count(),
    }
}
