//! Reference catalog and lexical source selection.
//!
//! The catalog maps category names to ordered URL lists. Selection is a cheap
//! substring match between query tokens and URLs; a small static catalog does
//! not warrant a search index.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Name of the mandatory fallback category.
pub const GENERAL_INFO: &str = "general_info";

/// Name of the built-in housing category.
pub const HOUSING_POLICIES: &str = "housing_policies";

const BUILTIN_HOUSING_POLICIES: &[&str] = &[
    "https://www.cpf.gov.sg/member/infohub/cpf-clarifies/policy-faqs/why-do-i-need-to-pay-interest-on-cpf-used-for-housing-after-property-sale",
    "https://www.cpf.gov.sg/member/infohub/news/news-releases/cpf-members-to-enjoy-lower-premiums-for-home-protection-insurance",
    "https://www.cpf.gov.sg/member/infohub/news/news-releases/cpf-members-to-enjoy-lower-premiums-for-home-protection-insurance-26-june-2018",
    "https://www.cpf.gov.sg/member/infohub/news/news-releases/over-760000-cpf-members-to-receive-premium-rebates-under-home-protection-scheme",
    "https://www.cpf.gov.sg/member/infohub/news/news-releases/cpf-board-awards-tender-on-sale-of-building-at-79-robinson-road-to-southernwood-property-pte-ltd",
    "https://www.cpf.gov.sg/member/infohub/news/news-releases/premium-rebates-for-cpf-members-under-home-protection-scheme",
    "https://www.cpf.gov.sg/member/infohub/news/forum-replies/eligibility-for-home-insurance-is-reassessed-in-certain-cases",
    "https://www.cpf.gov.sg/member/infohub/news/cpf-related-announcements/more-flexibility-to-buy-a-home-for-life-while-safeguarding-retir",
    "https://www.cpf.gov.sg/member/infohub/reports-and-statistics/cpf-statistics/home-ownership-statistics",
    "https://www.cpf.gov.sg/member/infohub/reports-and-statistics/cpf-statistics/home-ownership-statistics/cumulative-cpf-savings-withdrawn-for-housing",
    "https://www.cpf.gov.sg/member/infohub/reports-and-statistics/cpf-statistics/home-ownership-statistics/home-protection-scheme-participation",
    "https://www.cpf.gov.sg/member/infohub/reports-and-statistics/cpf-statistics/home-ownership-statistics/home-protection-scheme-claims",
    "https://www.cpf.gov.sg/member/infohub/reports-and-statistics/cpf-trends/home-financing",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/property-purchase-in-a-pandemic",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/financially-savvy-budgeting-tips-for-your-home",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/hdb-flat-eligibility-letter-what-to-know",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/3-benefits-of-the-home-protection-scheme",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/3-differences-between-hdb-loan-and-bank-loan",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/sales-proceeds-after-selling-your-home",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/protect-your-home-insurance-for-your-hdb-flat",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/make-work-from-home-work-for-you",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/keep-your-family-close-when-choosing-your-next-home",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/roll-smoothly-into-your-hdb-resale-flat-in-4-steps",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/how-to-avoid-regret-when-buying-your-dream-home",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/easy-tips-to-freshen-up-your-home",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/using-cpf-to-budget-for-house-and-renovations",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/a-heart-decision-buying-your-first-home",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/hdb-option-fee-and-housing-expenses-you-should-know",
    "https://www.cpf.gov.sg/member/infohub/educational-resources/home-improvement-programme-what-to-know",
    "https://www.cpf.gov.sg/member/infohub/be-ready/budget-for-my-home",
    "https://www.cpf.gov.sg/member/ds/dashboards/home-ownership",
    "https://www.cpf.gov.sg/member/home-ownership",
    "https://www.cpf.gov.sg/member/home-ownership/using-your-cpf-to-buy-a-home",
    "https://www.cpf.gov.sg/member/home-ownership/using-your-cpf-to-buy-a-home/considerations-when-using-cpf-to-buy-property",
    "https://www.cpf.gov.sg/member/home-ownership/using-your-cpf-to-buy-a-home/apply-to-use-cpf-for-your-property",
    "https://www.cpf.gov.sg/member/home-ownership/using-your-cpf-to-buy-a-home/cpf-refund-when-selling-or-transferring-property",
    "https://www.cpf.gov.sg/member/home-ownership/using-your-cpf-to-buy-a-home/retain-20000-in-your-oa-if-you-are-taking-a-housing-loan",
    "https://www.cpf.gov.sg/member/home-ownership/protecting-against-losing-your-home",
    "https://www.cpf.gov.sg/member/home-ownership/protecting-against-losing-your-home/claiming-under-the-home-protection-scheme",
    "https://www.cpf.gov.sg/member/home-ownership/protecting-against-losing-your-home/single-premium-home-protection-scheme-cover",
    "https://www.cpf.gov.sg/member/home-ownership/plan-your-housing-journey",
    "https://www.cpf.gov.sg/member/home-ownership/plan-your-housing-journey/upgrading-your-home",
    "https://www.cpf.gov.sg/member/home-ownership/plan-your-housing-journey/upgrading-your-home/housing-case-study",
    "https://www.cpf.gov.sg/member/tnc/information-for-exemption-from-home-protection-scheme",
    "https://www.cpf.gov.sg/member/tnc/important-notes-on-home-protection-scheme",
    "https://www.cpf.gov.sg/member/plan-with-cpf/home-ownership-planning",
    "https://www.cpf.gov.sg/employer/infohub/reports-and-statistics/cpf-statistics/home-ownership-statistics",
    "https://www.cpf.gov.sg/employer/infohub/reports-and-statistics/cpf-statistics/home-ownership-statistics/cumulative-cpf-savings-withdrawn-for-housing",
    "https://www.cpf.gov.sg/employer/infohub/reports-and-statistics/cpf-statistics/home-ownership-statistics/home-protection-scheme-participation",
    "https://www.cpf.gov.sg/employer/infohub/reports-and-statistics/cpf-statistics/home-ownership-statistics/home-protection-scheme-claims",
    "https://www.cpf.gov.sg/employer/infohub/reports-and-statistics/cpf-trends/home-financing",
];

const BUILTIN_GENERAL_INFO: &[&str] = &["https://www.cpf.gov.sg/"];

/// One named, ordered group of reference URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCategory {
    pub name: String,
    pub urls: Vec<String>,
}

impl CatalogCategory {
    pub fn new(name: &str, urls: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }
}

/// Validated catalog of authoritative reference pages.
///
/// Categories keep their declaration order, and so do the URLs inside each
/// category. A `general_info` category with at least one URL is always
/// present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceCatalog {
    categories: Vec<CatalogCategory>,
}

impl ReferenceCatalog {
    /// Build a catalog, enforcing its invariants.
    pub fn new(categories: Vec<CatalogCategory>) -> Result<Self, CatalogError> {
        for (idx, category) in categories.iter().enumerate() {
            if categories[..idx].iter().any(|c| c.name == category.name) {
                return Err(CatalogError::DuplicateCategory(category.name.clone()));
            }
            if category.urls.iter().any(|u| u.trim().is_empty()) {
                return Err(CatalogError::BlankUrl(category.name.clone()));
            }
        }

        let general = categories
            .iter()
            .find(|c| c.name == GENERAL_INFO)
            .ok_or_else(|| CatalogError::MissingGeneralInfo(GENERAL_INFO.to_string()))?;
        if general.urls.is_empty() {
            return Err(CatalogError::EmptyGeneralInfo(GENERAL_INFO.to_string()));
        }

        Ok(Self { categories })
    }

    /// The official CPF housing catalog shipped with the advisor.
    pub fn builtin() -> Self {
        Self {
            categories: vec![
                CatalogCategory::new(HOUSING_POLICIES, BUILTIN_HOUSING_POLICIES),
                CatalogCategory::new(GENERAL_INFO, BUILTIN_GENERAL_INFO),
            ],
        }
    }

    pub fn categories(&self) -> &[CatalogCategory] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&CatalogCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// URLs of the fallback category. Never empty.
    pub fn general_info(&self) -> &[String] {
        self.category(GENERAL_INFO)
            .map(|c| c.urls.as_slice())
            .unwrap_or_default()
    }

    /// Every URL in declaration order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .flat_map(|c| c.urls.iter().map(String::as_str))
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls().any(|u| u == url)
    }

    /// See [`select_urls`].
    pub fn select_urls(&self, query: &str) -> SourceSet {
        select_urls(query, self)
    }
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Ordered, non-empty list of URLs chosen for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    urls: Vec<String>,
    fallback: bool,
}

impl SourceSet {
    /// True when no URL matched and the `general_info` list was used instead.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

impl Deref for SourceSet {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.urls
    }
}

/// Select the catalog URLs relevant to `query`.
///
/// The query is lower-cased and split on whitespace. A URL is selected when
/// any token is a substring of the lower-cased URL. Categories are visited in
/// declaration order, URLs within a category likewise, and nothing is
/// deduplicated. An empty selection falls back to the `general_info` list.
pub fn select_urls(query: &str, catalog: &ReferenceCatalog) -> SourceSet {
    let lowered = query.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();

    let urls: Vec<String> = catalog
        .urls()
        .filter(|url| {
            let url = url.to_lowercase();
            tokens.iter().any(|token| url.contains(token))
        })
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        SourceSet {
            urls: catalog.general_info().to_vec(),
            fallback: true,
        }
    } else {
        SourceSet {
            urls,
            fallback: false,
        }
    }
}
