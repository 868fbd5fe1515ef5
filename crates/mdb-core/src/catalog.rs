//! Read-only directory of shops and jobs, loaded from flat JSON arrays.

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::error;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct AssortmentItem {
    #[serde(default)]
    pub item: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Shop {
    pub order: i64,
    pub name: String,
    #[serde(default)]
    pub is_top: bool,
    #[serde(default)]
    pub assortment: Vec<AssortmentItem>,
    #[serde(default)]
    pub extra_text: Option<String>,
    #[serde(default)]
    pub contacts: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Job {
    pub name: String,
    #[serde(default)]
    pub vacancy: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub contacts: Vec<String>,
}

/// First non-empty contact, used for the "contact" URL button.
fn primary_contact(contacts: &[String]) -> Option<&str> {
    contacts
        .first()
        .map(|c| c.trim().trim_start_matches('@'))
        .filter(|c| !c.is_empty())
}

impl Shop {
    pub fn contact(&self) -> Option<&str> {
        primary_contact(&self.contacts)
    }
}

impl Job {
    pub fn contact(&self) -> Option<&str> {
        primary_contact(&self.contacts)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogKind {
    Shops,
    Jobs,
}

/// One page of a catalog listing (1-based).
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogPage<'a, T> {
    pub items: &'a [T],
    /// Index of the first item of this page in the full list.
    pub start: usize,
    pub page: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> CatalogPage<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> CatalogPage<'_, T> {
    let page = page.max(1);
    let size = page_size.max(1);
    let start = (page - 1).saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    CatalogPage {
        items: &items[start..end],
        start,
        page,
        has_prev: page > 1,
        has_next: end < items.len(),
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    pub shops: Vec<Shop>,
    pub jobs: Vec<Job>,
}

impl Catalog {
    pub fn new(shops: Vec<Shop>, jobs: Vec<Job>) -> Self {
        Self { shops, jobs }
    }

    pub fn shops_page(&self, page: usize, page_size: usize) -> CatalogPage<'_, Shop> {
        paginate(&self.shops, page, page_size)
    }

    pub fn jobs_page(&self, page: usize, page_size: usize) -> CatalogPage<'_, Job> {
        paginate(&self.jobs, page, page_size)
    }

    pub fn find_shop(&self, order: i64) -> Option<&Shop> {
        self.shops.iter().find(|s| s.order == order)
    }

    /// Job at 1-based `position` in file order.
    pub fn job_at(&self, position: usize) -> Option<&Job> {
        position.checked_sub(1).and_then(|i| self.jobs.get(i))
    }

    /// Top-flagged shops ordered by `order`, at most `limit`.
    pub fn recommendations(&self, limit: usize) -> Vec<&Shop> {
        let mut top: Vec<&Shop> = self.shops.iter().filter(|s| s.is_top).collect();
        top.sort_by_key(|s| s.order);
        top.truncate(limit);
        top
    }
}

/// Source of catalog snapshots.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn snapshot(&self) -> Catalog;
}

#[async_trait]
impl DirectoryStore for Catalog {
    async fn snapshot(&self) -> Catalog {
        self.clone()
    }
}

/// Catalog backed by JSON files, re-read on every snapshot so edits apply without a restart.
#[derive(Clone, Debug)]
pub struct FileCatalog {
    shops_path: PathBuf,
    jobs_path: PathBuf,
}

impl FileCatalog {
    pub fn new(shops_path: impl Into<PathBuf>, jobs_path: impl Into<PathBuf>) -> Self {
        Self {
            shops_path: shops_path.into(),
            jobs_path: jobs_path.into(),
        }
    }
}

#[async_trait]
impl DirectoryStore for FileCatalog {
    async fn snapshot(&self) -> Catalog {
        Catalog {
            shops: load_json_array(&self.shops_path).await,
            jobs: load_json_array(&self.jobs_path).await,
        }
    }
}

/// Missing or malformed files are logged and read as empty.
async fn load_json_array<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
    let txt = match tokio::fs::read_to_string(path).await {
        Ok(t) => t,
        Err(e) => {
            error!("{} could not be read: {e}", path.display());
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<T>>(&txt) {
        Ok(v) => v,
        Err(e) => {
            error!("Invalid JSON in {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Split an assortment line into its name and an optional price tail.
///
/// The tail starts at the first whitespace-separated token made of a digit followed by
/// at least one more word character (`25k`, `1.5kg`, `10`). A lone digit such as the
/// `2` in `Sofa 2 seats 25k` stays in the name. An empty name falls back to `fallback`.
pub fn split_assortment_item<'a>(line: &'a str, fallback: &'a str) -> (&'a str, Option<&'a str>) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(.*?)(?:\s(\d+\.?\d*\w+.*))?$").expect("valid assortment regex")
    });

    let line = line.trim();
    let Some(caps) = re.captures(line) else {
        return (line, None);
    };
    let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
    let price = caps.get(2).map(|m| m.as_str());
    let name = if name.is_empty() { fallback } else { name };
    (name, price)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop(order: i64, name: &str, is_top: bool) -> Shop {
        Shop {
            order,
            name: name.to_string(),
            is_top,
            assortment: Vec::new(),
            extra_text: None,
            contacts: Vec::new(),
            image: None,
        }
    }

    #[test]
    fn empty_catalog_page_has_no_navigation() {
        let cat = Catalog::default();
        for page in [0, 1, 7] {
            let p = cat.shops_page(page, 10);
            assert!(p.is_empty());
            assert!(!p.has_next);
        }
        assert!(cat.jobs_page(3, 10).items.is_empty());
    }

    #[test]
    fn pages_are_one_based_and_bounded() {
        let shops: Vec<Shop> = (1..=25).map(|i| shop(i, &format!("s{i}"), false)).collect();
        let cat = Catalog::new(shops, Vec::new());

        let p1 = cat.shops_page(1, 10);
        assert_eq!(p1.items.len(), 10);
        assert!(!p1.has_prev);
        assert!(p1.has_next);

        let p3 = cat.shops_page(3, 10);
        assert_eq!(p3.items.len(), 5);
        assert_eq!(p3.items[0].order, 21);
        assert_eq!(p3.start, 20);
        assert!(p3.has_prev);
        assert!(!p3.has_next);

        let p9 = cat.shops_page(9, 10);
        assert!(p9.is_empty());
        assert!(!p9.has_next);

        // Exactly one full page: no next.
        let exact = paginate(&cat.shops[..10], 1, 10);
        assert!(!exact.has_next);
    }

    #[test]
    fn recommendations_are_top_sorted_and_limited() {
        let cat = Catalog::new(
            vec![
                shop(5, "e", true),
                shop(1, "a", true),
                shop(2, "b", false),
                shop(3, "c", true),
            ],
            Vec::new(),
        );
        let names: Vec<&str> = cat
            .recommendations(2)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn finds_items_by_key() {
        let cat = Catalog::new(
            vec![shop(4, "Harbor", false)],
            vec![Job {
                name: "Courier desk".into(),
                vacancy: None,
                salary: None,
                conditions: None,
                contacts: vec!["@desk".into()],
            }],
        );
        assert_eq!(cat.find_shop(4).map(|s| s.name.as_str()), Some("Harbor"));
        assert!(cat.find_shop(5).is_none());
        assert_eq!(cat.job_at(1).and_then(Job::contact), Some("desk"));
        assert!(cat.job_at(0).is_none());
        assert!(cat.job_at(2).is_none());
    }

    #[test]
    fn parses_shop_json_with_missing_optional_fields() {
        let shops: Vec<Shop> = serde_json::from_str(
            r#"[{"order": 1, "name": "Harbor", "extra": 1},
                {"order": 2, "name": "Anchor", "is_top": true,
                 "assortment": [{"item": "Sofa 2 seats 25k"}], "contacts": ["", "x"]}]"#,
        )
        .unwrap();
        assert_eq!(shops.len(), 2);
        assert!(!shops[0].is_top);
        assert!(shops[1].is_top);
        assert_eq!(shops[1].contact(), None);
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let cat = FileCatalog::new("/nonexistent/shops.json", "/nonexistent/jobs.json");
        assert_eq!(cat.snapshot().await, Catalog::default());
    }

    #[tokio::test]
    async fn file_catalog_picks_up_edits_between_snapshots() {
        let dir = std::env::temp_dir().join(format!("mdb-catalog-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let shops = dir.join("shops.json");
        let jobs = dir.join("jobs.json");
        std::fs::write(&shops, r#"[{"order": 1, "name": "Harbor"}]"#).unwrap();
        std::fs::write(&jobs, "not json").unwrap();

        let cat = FileCatalog::new(&shops, &jobs);
        let first = cat.snapshot().await;
        assert_eq!(first.shops.len(), 1);
        assert!(first.jobs.is_empty());

        std::fs::write(
            &shops,
            r#"[{"order": 1, "name": "Harbor"}, {"order": 2, "name": "Dock", "is_top": true}]"#,
        )
        .unwrap();
        let second = cat.snapshot().await;
        assert_eq!(second.shops.len(), 2);
        assert_eq!(second.recommendations(5)[0].name, "Dock");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn splits_assortment_name_and_price() {
        assert_eq!(
            split_assortment_item("Oak table 1pc 25k", "Item"),
            ("Oak table", Some("1pc 25k"))
        );
        assert_eq!(split_assortment_item("Gift card", "Item"), ("Gift card", None));
        assert_eq!(
            split_assortment_item("  5kg 10k", "Item"),
            ("5kg", Some("10k"))
        );
        assert_eq!(split_assortment_item("", "Item"), ("Item", None));
        assert_eq!(
            split_assortment_item("Sofa 2 seats 25k", "Item"),
            ("Sofa 2 seats", Some("25k"))
        );
        assert_eq!(split_assortment_item("Chair 5", "Item"), ("Chair 5", None));
    }
}
