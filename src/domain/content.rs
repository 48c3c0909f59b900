use serde::{Deserialize, Serialize};

use super::types::Category;

/// One unit of text to classify, keyed by a stable external identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub uid: String,
    pub content: String,
}

impl ContentItem {
    pub fn new(uid: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            content: content.into(),
        }
    }

    /// Short form of the uid for log lines.
    pub fn short_uid(&self) -> &str {
        match self.uid.char_indices().nth(8) {
            Some((idx, _)) => &self.uid[..idx],
            None => &self.uid,
        }
    }
}

/// Ground-truth labels produced by a human annotator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanAnnotation {
    pub keyword_spam: bool,
    pub malicious_links: bool,
    pub ads: bool,
    pub wrong_language: bool,
    pub unreadable: bool,
    pub labels_spam: bool,
}

impl HumanAnnotation {
    pub fn flag(&self, category: Category) -> bool {
        match category {
            Category::KeywordSpam => self.keyword_spam,
            Category::MaliciousLinks => self.malicious_links,
            Category::Ads => self.ads,
            Category::WrongLanguage => self.wrong_language,
            Category::Unreadable => self.unreadable,
            Category::LabelsSpam => self.labels_spam,
        }
    }
}
