use std::path::PathBuf;

use crate::storage::pager::DEFAULT_PAGE_SIZE;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one `<name>.dat` page file per database (None for in-memory).
    pub data_dir: Option<PathBuf>,
    /// Page size used for newly created page files.
    pub page_size: usize,
    /// Database created and activated when the data directory holds none.
    pub default_database: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: Some(PathBuf::from("data")),
            page_size: DEFAULT_PAGE_SIZE,
            default_database: "default".to_string(),
        }
    }
}

impl Config {
    /// Creates a configuration that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            ..Default::default()
        }
    }

    /// Creates a configuration for a data directory.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Path of the page file backing `database`, if persistence is enabled.
    pub fn database_path(&self, database: &str) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.dat", database)))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::Config;

    #[test]
    fn test_database_path() {
        let config = Config::with_path("/tmp/pagedb");
        assert_eq!(
            config.database_path("shop"),
            Some(PathBuf::from("/tmp/pagedb/shop.dat"))
        );
        assert_eq!(Config::in_memory().database_path("shop"), None);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default().with_page_size(512);
        assert_eq!(config.page_size, 512);
        assert_eq!(config.default_database, "default");
        assert_eq!(config.data_dir, Some(PathBuf::from("data")));
    }
}
