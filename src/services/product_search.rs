//! Product search
//!
//! Suggests purchase links for an item title. The default implementation
//! does not call any store; it builds search-page links for the major
//! marketplaces so the user can pick a product there.

use async_trait::async_trait;
use serde::Serialize;

/// A suggested purchase link
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSuggestion {
    pub url: String,
    pub title: String,
    /// Store the link points at
    pub source: String,
}

/// Source of link suggestions for an item title
#[async_trait]
pub trait ProductSearch: Send + Sync {
    async fn search(&self, title: &str) -> Vec<ProductSuggestion>;
}

/// Store name, preposition used in the title, search URL prefix
const STORES: &[(&str, &str, &str)] = &[
    ("Ozon", "on", "https://www.ozon.ru/search/?text="),
    (
        "Wildberries",
        "on",
        "https://www.wildberries.ru/catalog/0/search.aspx?search=",
    ),
    ("Yandex.Market", "on", "https://market.yandex.ru/search?text="),
    ("Citilink", "at", "https://www.citilink.ru/search/?text="),
    ("DNS", "at", "https://www.dns-shop.ru/search/?q="),
];

/// Search-page links for Ozon, Wildberries, Yandex.Market, Citilink and DNS
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartLinkSearch;

impl SmartLinkSearch {
    pub fn new() -> Self {
        Self
    }

    pub fn links_for(title: &str) -> Vec<ProductSuggestion> {
        let title = title.trim();
        let encoded = urlencoding::encode(title);

        STORES
            .iter()
            .map(|(store, preposition, prefix)| ProductSuggestion {
                url: format!("{}{}", prefix, encoded),
                title: format!("Find '{}' {} {}", title, preposition, store),
                source: store.to_string(),
            })
            .collect()
    }
}

#[async_trait]
impl ProductSearch for SmartLinkSearch {
    async fn search(&self, title: &str) -> Vec<ProductSuggestion> {
        Self::links_for(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::validation::is_valid_url;

    #[tokio::test]
    async fn test_one_link_per_store() {
        let links = SmartLinkSearch::new().search("Headphones").await;
        let sources: Vec<_> = links.iter().map(|l| l.source.as_str()).collect();
        assert_eq!(
            sources,
            vec!["Ozon", "Wildberries", "Yandex.Market", "Citilink", "DNS"]
        );
        assert_eq!(links[0].url, "https://www.ozon.ru/search/?text=Headphones");
        assert_eq!(links[0].title, "Find 'Headphones' on Ozon");
        assert_eq!(links[4].title, "Find 'Headphones' at DNS");
    }

    #[test]
    fn test_title_is_url_encoded() {
        let links = SmartLinkSearch::links_for("Sony WH-1000XM5 & case");
        assert_eq!(
            links[0].url,
            "https://www.ozon.ru/search/?text=Sony%20WH-1000XM5%20%26%20case"
        );
    }

    #[test]
    fn test_non_latin_title() {
        let links = SmartLinkSearch::links_for("наушники");
        assert!(links.iter().all(|l| l.url.is_ascii()));
        assert!(links[0].title.contains("наушники"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(20))]

            /// Every suggestion is a valid link no matter what the title holds.
            #[test]
            fn suggestions_are_valid_urls(title in "\\PC{1,40}") {
                for link in SmartLinkSearch::links_for(&title) {
                    prop_assert!(is_valid_url(&link.url), "bad url {}", link.url);
                }
            }
        }
    }
}
