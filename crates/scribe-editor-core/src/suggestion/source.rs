//! Host-supplied suggestion sources.

use futures_util::FutureExt;
use futures_util::future::{self, LocalBoxFuture};

use super::state::Item;
use crate::error::SourceError;

/// Future returned by a suggestion fetch.
pub type SuggestionFuture = LocalBoxFuture<'static, Result<Vec<Item>, SourceError>>;

/// Something that can answer a suggestion query.
///
/// Fetches may resolve in any order and at any time; the controller decides
/// whether a result is still wanted.
pub trait SuggestionSource {
    fn fetch(&self, query: &str) -> SuggestionFuture;
}

impl<F> SuggestionSource for F
where
    F: Fn(&str) -> SuggestionFuture,
{
    fn fetch(&self, query: &str) -> SuggestionFuture {
        self(query)
    }
}

/// A fixed list filtered by case-insensitive prefix.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    items: Vec<Item>,
}

impl StaticSource {
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    pub fn matches(&self, query: &str) -> Vec<Item> {
        let query = query.to_lowercase();
        self.items
            .iter()
            .filter(|item| item.handle_or_tag.to_lowercase().starts_with(&query))
            .cloned()
            .collect()
    }
}

impl SuggestionSource for StaticSource {
    fn fetch(&self, query: &str) -> SuggestionFuture {
        future::ready(Ok(self.matches(query))).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn test_static_prefix_filter() {
        let source = StaticSource::new(["alice", "alan", "bob"].map(Item::new));
        let found = block_on(source.fetch("AL")).unwrap();
        let handles: Vec<_> = found.iter().map(|i| i.handle_or_tag.as_str()).collect();
        assert_eq!(handles, ["alice", "alan"]);
        assert_eq!(block_on(source.fetch("")).unwrap().len(), 3);
    }

    #[test]
    fn test_closure_source() {
        let source = |query: &str| -> SuggestionFuture {
            let err = SourceError::Fetch(format!("no backend for {query}"));
            future::ready(Err(err)).boxed_local()
        };
        let err = block_on(source.fetch("x")).unwrap_err();
        assert_eq!(err, SourceError::Fetch("no backend for x".into()));
    }
}
