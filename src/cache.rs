use crate::extract::SchemaError;
use crate::layout::LayoutConfig;
use crate::{Analysis, analyze_with};
use tracing::trace;

/// Remembers the last successful analysis, keyed on the exact input text.
///
/// Meant for editors that re-submit the same text on every keystroke pause.
/// Errors are never cached, so a failing input is re-parsed each time.
#[derive(Default)]
pub struct AnalysisCache {
    config: LayoutConfig,
    last: Option<(String, Analysis)>,
}

impl AnalysisCache {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config, last: None }
    }

    pub fn analyze(&mut self, source: &str) -> Result<&Analysis, SchemaError> {
        match self.last.take() {
            Some(entry) if entry.0 == source => {
                trace!("analysis cache hit");
                Ok(&self.last.insert(entry).1)
            }
            previous => match analyze_with(source, &self.config) {
                Ok(analysis) => Ok(&self.last.insert((source.to_string(), analysis)).1),
                Err(e) => {
                    self.last = previous;
                    Err(e)
                }
            },
        }
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_returns_same_result() {
        let mut cache = AnalysisCache::default();
        let first = cache.analyze("type A @model { id: ID! }").unwrap().clone();
        let second = cache.analyze("type A @model { id: ID! }").unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_new_text_replaces_entry() {
        let mut cache = AnalysisCache::default();
        cache.analyze("type A @model { id: ID! }").unwrap();
        let analysis = cache.analyze("type B @model { id: ID! }").unwrap();
        assert_eq!(analysis.entities[0].name, "B");
    }

    #[test]
    fn test_error_keeps_previous_entry() {
        let mut cache = AnalysisCache::default();
        cache.analyze("type A @model { id: ID! }").unwrap();
        assert!(cache.analyze("type Foo { ").is_err());
        // a failed parse leaves the previous entry in place
        assert!(matches!(&cache.last, Some((text, _)) if text == "type A @model { id: ID! }"));
    }

    #[test]
    fn test_uses_configured_layout() {
        let mut config = LayoutConfig::default();
        config.erd.start_x = 0.0;
        let mut cache = AnalysisCache::new(config);
        let analysis = cache.analyze("type A @model { id: ID! }").unwrap();
        assert_eq!(analysis.erd.tables[0].x, 0.0);
    }

    #[test]
    fn test_clear() {
        let mut cache = AnalysisCache::default();
        cache.analyze("type A @model { id: ID! }").unwrap();
        cache.clear();
        assert!(cache.last.is_none());
    }
}
