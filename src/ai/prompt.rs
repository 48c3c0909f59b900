use std::path::Path;

use thiserror::Error;

const CONTENT_PLACEHOLDER: &str = "{content}";

const DEFAULT_TEMPLATE: &str = r#"You are an expert content moderator reviewing the text of a web page.
Answer each question with YES or NO.

1. Keyword Spam: are terms repeated out of context, in lists or runs, to attract search traffic rather than to inform the reader?
2. Malicious Links: does the text push the reader toward a link meant to deceive them, such as prize bait or phishing for credentials or payment details?
3. Advertisements: does the text encourage the reader to buy or use a product or service, visit a business, download an app, or apply for a job? Product specifications on their own are not advertising.
4. Wrong Language: is the content written entirely in a language other than English? A small amount of foreign text inside English content is NO.
5. Unreadable: is the content empty, mis-encoded, or otherwise incomprehensible?
6. Confidence Score: how confident are you in these answers, from 1 (lowest) to 5 (highest)?

Rules:
- If Wrong Language is YES, every other answer is NO.
- If Unreadable is YES, every other answer is NO.
- labels_spam is 1 if any of questions 1-3 is YES.

Content: {content}

Return ONLY a JSON object shaped like this:
{
  "labels_spam": 0,
  "labels_spam_vector": {
    "keyword_spam": 0,
    "malicious_links": 0,
    "ads": 0
  },
  "confidence_score": 5
}

Add "wrong_language": 1 to labels_spam_vector only when Wrong Language is YES.
Add "unreadable": 1 to labels_spam_vector only when Unreadable is YES.
Do not echo the content or any identifier."#;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read prompt template {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("prompt template does not contain the {{content}} placeholder")]
    MissingPlaceholder,
}

/// Prompt text with a `{content}` slot filled in per item.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Result<Self, TemplateError> {
        let text = text.into();
        if !text.contains(CONTENT_PLACEHOLDER) {
            return Err(TemplateError::MissingPlaceholder);
        }
        Ok(Self { text })
    }

    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::new(text)
    }

    pub fn render(&self, content: &str) -> String {
        self.text.replace(CONTENT_PLACEHOLDER, content)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_every_placeholder() {
        let template = PromptTemplate::new("A: {content} / B: {content}").unwrap();
        assert_eq!(template.render("x"), "A: x / B: x");
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        assert!(matches!(
            PromptTemplate::new("no slot here"),
            Err(TemplateError::MissingPlaceholder)
        ));
    }

    #[test]
    fn default_template_keeps_json_braces_literal() {
        let rendered = PromptTemplate::default().render("hello");
        assert!(rendered.contains("Content: hello"));
        assert!(rendered.contains("\"labels_spam_vector\": {"));
    }

    #[test]
    fn missing_template_file_is_a_read_error() {
        let err = PromptTemplate::from_file(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, TemplateError::Read { .. }));
    }
}
