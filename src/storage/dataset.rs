use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::{ContentItem, HumanAnnotation};

#[derive(Debug, Deserialize)]
struct ContentRow {
    uid: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnnotationRow {
    uid: String,
    #[serde(rename = "1: Keyword Spam")]
    keyword_spam: String,
    #[serde(rename = "2: Malicious Links")]
    malicious_links: String,
    #[serde(rename = "3: Advertisements")]
    ads: String,
    #[serde(rename = "4: Document not in target language")]
    wrong_language: String,
    #[serde(rename = "5: Document not readable or incomprehensible")]
    unreadable: String,
    #[serde(rename = "Answer")]
    answer: String,
}

impl AnnotationRow {
    fn into_entry(self) -> (String, HumanAnnotation) {
        let annotation = HumanAnnotation {
            keyword_spam: is_yes(&self.keyword_spam),
            malicious_links: is_yes(&self.malicious_links),
            ads: is_yes(&self.ads),
            wrong_language: is_yes(&self.wrong_language),
            unreadable: is_yes(&self.unreadable),
            labels_spam: is_yes(&self.answer),
        };
        (self.uid, annotation)
    }
}

/// Reads `uid`/`content` rows in file order, stopping after `limit` rows.
pub fn load_content_items(path: &Path, limit: Option<usize>) -> Result<Vec<ContentItem>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open content file {}", path.display()))?;

    let mut items = Vec::new();
    for (index, row) in reader.deserialize::<ContentRow>().enumerate() {
        if limit.is_some_and(|limit| index >= limit) {
            break;
        }
        let row = row.with_context(|| format!("invalid content row {}", index + 1))?;
        items.push(ContentItem::new(row.uid, row.content));
    }

    tracing::info!(
        target: "storage",
        path = %path.display(),
        loaded = items.len(),
        limit = ?limit,
        "content loaded"
    );
    Ok(items)
}

/// Reads ground-truth rows keyed by uid; a later duplicate replaces an earlier one.
pub fn load_human_annotations(
    path: &Path,
    limit: Option<usize>,
) -> Result<HashMap<String, HumanAnnotation>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open annotation file {}", path.display()))?;

    let mut annotations = HashMap::new();
    for (index, row) in reader.deserialize::<AnnotationRow>().enumerate() {
        if limit.is_some_and(|limit| index >= limit) {
            break;
        }
        let row = row.with_context(|| format!("invalid annotation row {}", index + 1))?;
        let (uid, annotation) = row.into_entry();
        annotations.insert(uid, annotation);
    }

    tracing::info!(
        target: "storage",
        path = %path.display(),
        loaded = annotations.len(),
        "human annotations loaded"
    );
    Ok(annotations)
}

fn is_yes(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const HEADER: &str = "uid,content,1: Keyword Spam,2: Malicious Links,3: Advertisements,4: Document not in target language,5: Document not readable or incomprehensible,Answer\n";

    fn csv_file(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn content_rows_keep_order_and_multiline_text() {
        let file = csv_file(
            "a1,\"first line\nsecond, line\",No,No,No,No,No,No\n\
             b2,,No,No,No,No,Yes,No\n\
             c3,buy buy buy,Yes,No,No,No,No,Yes\n",
        );
        let items = load_content_items(file.path(), None).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], ContentItem::new("a1", "first line\nsecond, line"));
        assert_eq!(items[1].content, "");
        assert_eq!(items[2].uid, "c3");
    }

    #[test]
    fn limit_truncates_input() {
        let file = csv_file(
            "a,x,No,No,No,No,No,No\nb,y,No,No,No,No,No,No\nc,z,No,No,No,No,No,No\n",
        );
        let items = load_content_items(file.path(), Some(2)).unwrap();
        assert_eq!(
            items.iter().map(|i| i.uid.as_str()).collect::<Vec<_>>(),
            ["a", "b"]
        );
    }

    #[test]
    fn annotations_map_yes_case_insensitively() {
        let file = csv_file(
            "a,x,YES,no,No,No,No, yes \n\
             b,y,No,No,No,Yes,No,No\n\
             a,x,No,No,Yes,No,No,Yes\n",
        );
        let annotations = load_human_annotations(file.path(), None).unwrap();
        assert_eq!(annotations.len(), 2);
        assert!(annotations["b"].wrong_language);
        assert!(!annotations["b"].labels_spam);

        let a = annotations["a"];
        assert!(a.ads);
        assert!(!a.keyword_spam);
        assert!(a.labels_spam);
    }

    #[test]
    fn missing_annotation_column_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "uid,content\na,x").unwrap();
        assert!(load_human_annotations(file.path(), None).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_content_items(Path::new("/no/such/file.csv"), None).is_err());
    }
}
