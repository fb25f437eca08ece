//! Local matcher / 本地匹配器
//!
//! Reproduces the managed index's observable behaviour in-process. Used
//! directly when no managed index is available, and as the fallback path of
//! `ManagedIndex`.
//!
//! Ordering: autocomplete, partial and filter sort by `name` ascending (ties by
//! `id`). General search keeps store order, which is not a contract.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

use super::backend::SearchBackend;
use super::error::Result;
use super::mode::SearchMode;
use super::query::{escape_pattern, NormalizedQuery, UserId, Window};
use crate::models::Figure;
use crate::store::{FigurePredicate, FigureStore};

/// Per-field filter, each field matched on its own / 按字段独立过滤
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FigureFilter {
    pub manufacturer: Option<String>,
    pub name: Option<String>,
    pub scale: Option<String>,
    pub location: Option<String>,
    pub box_number: Option<String>,
}

/// Case-insensitive regex over an already escaped pattern / 构建不区分大小写的正则
fn literal_regex(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            // only reachable through size limits, treat as "matches nothing"
            tracing::warn!("Local matcher rejected pattern ({} bytes): {}", pattern.len(), e);
            None
        }
    }
}

fn sort_by_name(figures: &mut [Figure]) {
    figures.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}

pub struct LocalMatcher {
    store: Arc<dyn FigureStore>,
}

impl LocalMatcher {
    pub fn new(store: Arc<dyn FigureStore>) -> Self {
        Self { store }
    }

    /// The caller's records only / 只取当前用户的记录
    async fn owned(&self, user: &UserId) -> Result<Vec<Figure>> {
        let predicate = FigurePredicate::owned_by(*user);
        let mut figures = self.store.find(&predicate).await?;
        figures.retain(|f| predicate.matches(f));
        Ok(figures)
    }

    async fn name_or_manufacturer(&self, pattern: &str, user: &UserId) -> Result<Vec<Figure>> {
        let re = match literal_regex(pattern) {
            Some(re) => re,
            None => return Ok(Vec::new()),
        };
        let mut hits: Vec<Figure> = self
            .owned(user)
            .await?
            .into_iter()
            .filter(|f| re.is_match(&f.name) || re.is_match(&f.manufacturer))
            .collect();
        sort_by_name(&mut hits);
        Ok(hits)
    }

    /// Independent per-field matching, AND across the given fields / 各字段独立匹配
    pub async fn filter(&self, filter: &FigureFilter, user: &UserId, window: Window) -> Result<Vec<Figure>> {
        let fields: [(&Option<String>, fn(&Figure) -> &str); 5] = [
            (&filter.manufacturer, |f| f.manufacturer.as_str()),
            (&filter.name, |f| f.name.as_str()),
            (&filter.scale, |f| f.scale.as_str()),
            (&filter.location, |f| f.location.as_str()),
            (&filter.box_number, |f| f.box_number.as_str()),
        ];

        let mut checks: Vec<(Regex, fn(&Figure) -> &str)> = Vec::new();
        for (value, get) in fields {
            let value = match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => v,
                _ => continue,
            };
            match literal_regex(&escape_pattern(value)) {
                Some(re) => checks.push((re, get)),
                None => return Ok(Vec::new()),
            }
        }

        let mut hits: Vec<Figure> = self
            .owned(user)
            .await?
            .into_iter()
            .filter(|f| checks.iter().all(|(re, get)| re.is_match(get(f))))
            .collect();
        sort_by_name(&mut hits);
        tracing::debug!("Local filter: {} active fields, {} hits", checks.len(), hits.len());
        Ok(window.apply(hits))
    }
}

#[async_trait]
impl SearchBackend for LocalMatcher {
    async fn autocomplete(&self, query: &NormalizedQuery, user: &UserId, window: Window) -> Result<Vec<Figure>> {
        // start of field or right after whitespace
        let pattern = format!(r"(?:^|\s){}", query.escaped());
        let hits = self.name_or_manufacturer(&pattern, user).await?;
        Ok(Window::limit(Some(window.limit)).apply(hits))
    }

    async fn partial(&self, query: &NormalizedQuery, user: &UserId, window: Window) -> Result<Vec<Figure>> {
        let hits = self.name_or_manufacturer(query.escaped(), user).await?;
        Ok(window.apply(hits))
    }

    async fn search(&self, query: &NormalizedQuery, user: &UserId) -> Result<Vec<Figure>> {
        let mut terms = Vec::new();
        for term in query.terms() {
            match literal_regex(term) {
                Some(re) => terms.push(re),
                None => return Ok(Vec::new()),
            }
        }

        let hits = self
            .owned(user)
            .await?
            .into_iter()
            .filter(|f| {
                let fields = [&f.manufacturer, &f.name, &f.location, &f.box_number];
                terms.iter().all(|re| fields.iter().any(|field| re.is_match(field)))
            })
            .collect();
        Ok(hits)
    }

    fn mode(&self) -> SearchMode {
        SearchMode::Local
    }
}
