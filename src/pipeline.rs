//! Cache-first loading of the cleaned dataset

use crate::cache::TabularCache;
use crate::config::PipelineConfig;
use crate::data::{clean, CleanedTable, RawTable};
use crate::error::Result;
use crate::fetch::SourceFetcher;
use tracing::info;

/// Field separator of the source file
pub const SOURCE_DELIMITER: u8 = b';';

/// Lines above the header row in the source file
pub const SOURCE_TITLE_LINES: usize = 1;

/// Parse and clean the raw source text
pub fn clean_source(text: &str, config: &PipelineConfig) -> Result<CleanedTable> {
    let raw = RawTable::parse(text, SOURCE_DELIMITER, SOURCE_TITLE_LINES)?;
    clean(&raw, &config.schema)
}

/// Load the cleaned table from the cache, or fetch, clean and cache it.
///
/// A cache miss is not an error. Fetch, parse and format failures are
/// returned as is; nothing is retried.
pub fn load_data(config: &PipelineConfig, fetcher: &dyn SourceFetcher) -> Result<CleanedTable> {
    let cache = TabularCache::new(&config.cache_dir);
    if let Some(table) = cache.load(&config.cache_name)? {
        return Ok(table);
    }

    info!(url = %config.source_url, "no cached table, fetching source");
    let text = fetcher.fetch(&config.source_url)?;
    let table = clean_source(&text, config)?;
    cache.store(&table, &config.cache_name)?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::normalize::NumericColumn;
    use std::cell::Cell;
    use tempfile::tempdir;

    struct StubFetcher {
        body: String,
        calls: Cell<usize>,
    }

    impl StubFetcher {
        fn new(body: &str) -> Self {
            Self {
                body: body.to_string(),
                calls: Cell::new(0),
            }
        }
    }

    impl SourceFetcher for StubFetcher {
        fn fetch(&self, _url: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.body.clone())
        }
    }

    struct FailingFetcher;

    impl SourceFetcher for FailingFetcher {
        fn fetch(&self, url: &str) -> Result<String> {
            Err(Error::FetchStatus {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    const BODY: &str = "title line\n\
        period;schools;classrooms;teachers;students\n\
        2000/2001;10;20;30;40\n\
        2001/2002;11;21;31,5;41\n";

    fn config(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            cache_dir: dir.to_path_buf(),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_miss_fetches_and_stores() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let fetcher = StubFetcher::new(BODY);

        let table = load_data(&config, &fetcher).unwrap();
        assert_eq!(fetcher.calls.get(), 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.number_of_teachers, NumericColumn::Float(vec![30.0, 31.5]));
        assert!(dir.path().join("school.csv").exists());
    }

    #[test]
    fn test_hit_skips_fetch() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let fetcher = StubFetcher::new(BODY);

        let first = load_data(&config, &fetcher).unwrap();
        let second = load_data(&config, &fetcher).unwrap();
        assert_eq!(fetcher.calls.get(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fetch_failure_propagates() {
        let dir = tempdir().unwrap();
        let err = load_data(&config(dir.path()), &FailingFetcher).unwrap_err();
        assert!(matches!(err, Error::FetchStatus { status: 404, .. }));
        assert!(!dir.path().join("school.csv").exists());
    }

    #[test]
    fn test_bad_source_is_not_cached() {
        let dir = tempdir().unwrap();
        let fetcher = StubFetcher::new("title\na;b;c;d;e\n2000-2001;1;2;3;4\n");
        let err = load_data(&config(dir.path()), &fetcher).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert!(!dir.path().join("school.csv").exists());
    }
}
