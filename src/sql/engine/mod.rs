use std::{collections::BTreeMap, fs};

use tracing::{debug, error, info};

use crate::{
    config::Config,
    error::{Error, Result},
    sql::{executor::Executor, parser::Parser, schema::TableSummary},
    storage::{
        engine::Engine,
        log::{CommandKind, CommitLog, LogEntry, LogPayload},
        memory::MemoryEngine,
        pager::Pager,
    },
};

use self::store::TableStore;

pub mod store;

/// Database name -> table name -> summary
pub type SchemaSnapshot = BTreeMap<String, BTreeMap<String, TableSummary>>;

/// All databases of one engine, the active database and the pending commit log
pub struct Catalog {
    config: Config,
    databases: BTreeMap<String, TableStore>,
    active: String,
    log: CommitLog,
}

impl Catalog {
    /// Loads every database found in the data directory, creating the default
    /// one when there are none.
    pub fn open(config: Config) -> Result<Self> {
        let mut catalog = Self {
            active: config.default_database.clone(),
            config,
            databases: BTreeMap::new(),
            log: CommitLog::new(),
        };
        catalog.load_databases()?;
        if catalog.databases.is_empty() {
            let name = catalog.config.default_database.clone();
            catalog.ensure_database(&name)?;
        }
        if !catalog.databases.contains_key(&catalog.active) {
            if let Some(first) = catalog.databases.keys().next() {
                catalog.active = first.clone();
            }
        }
        info!(active = %catalog.active, databases = catalog.databases.len(), "opened catalog");
        Ok(catalog)
    }

    fn load_databases(&mut self) -> Result<()> {
        let Some(dir) = self.config.data_dir.clone() else {
            return Ok(());
        };
        fs::create_dir_all(&dir)?;
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("dat") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let store = TableStore::open(Box::new(Pager::open(&path, self.config.page_size)?));
            debug!(database = name, "loaded database");
            self.databases.insert(name.to_lowercase(), store);
        }
        Ok(())
    }

    /// Creates the database if it does not exist. Returns true if it was created.
    pub fn ensure_database(&mut self, name: &str) -> Result<bool> {
        if self.databases.contains_key(name) {
            return Ok(false);
        }
        let engine: Box<dyn Engine> = match self.config.database_path(name) {
            Some(path) => Box::new(Pager::open(path, self.config.page_size)?),
            None => Box::new(MemoryEngine::new()),
        };
        let mut store = TableStore::open(engine);
        // Write the image now so the database exists on disk before its first table.
        store.persist()?;
        self.databases.insert(name.to_string(), store);
        info!(database = name, "created database");
        Ok(true)
    }

    /// Makes `name` the active database. Returns false if it does not exist.
    pub fn set_active(&mut self, name: &str) -> bool {
        if !self.databases.contains_key(name) {
            return false;
        }
        self.active = name.to_string();
        true
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    pub fn active_store(&self) -> Result<&TableStore> {
        self.databases
            .get(&self.active)
            .ok_or_else(|| Error::Internal(format!("database {} is not open", self.active)))
    }

    pub fn active_store_mut(&mut self) -> Result<&mut TableStore> {
        self.databases
            .get_mut(&self.active)
            .ok_or_else(|| Error::Internal(format!("database {} is not open", self.active)))
    }

    /// Records a mutation against the active database
    pub fn log(&mut self, table: String, kind: CommandKind, payload: LogPayload) {
        self.log.log(LogEntry {
            database: self.active.clone(),
            table,
            kind,
            payload,
        });
    }

    pub fn commit(&mut self) -> Vec<LogEntry> {
        self.log.commit()
    }

    pub fn pending(&self) -> usize {
        self.log.pending()
    }

    pub fn pending_entries(&self) -> Vec<LogEntry> {
        self.log.snapshot()
    }

    /// Database names in sorted order
    pub fn databases(&self) -> Vec<String> {
        self.databases.keys().cloned().collect()
    }

    pub fn describe(&self) -> SchemaSnapshot {
        self.databases
            .iter()
            .map(|(name, store)| (name.clone(), store.describe()))
            .collect()
    }
}

/// Statement-level entry point composing the parser and the executors
///
/// Every method runs to completion on the calling thread. The engine holds no
/// locks, so a host serving several clients must serialize access itself.
pub struct DatabaseEngine {
    catalog: Catalog,
}

impl DatabaseEngine {
    pub fn open(config: Config) -> Result<Self> {
        Ok(Self {
            catalog: Catalog::open(config)?,
        })
    }

    /// Opens an engine that keeps every database in memory
    pub fn in_memory() -> Result<Self> {
        Self::open(Config::in_memory())
    }

    /// Parses and executes one statement, returning its result lines
    pub fn execute(&mut self, statement: &str) -> Vec<String> {
        let command = Parser::new(statement).parse();
        debug!(?command, "parsed statement");
        match <dyn Executor>::build(command).execute(&mut self.catalog) {
            Ok(result) => result.lines(),
            Err(err) => {
                error!(%err, statement, "statement failed");
                vec![format!("Error: {}", err)]
            }
        }
    }

    /// Snapshot of every database, table, column and index
    pub fn describe(&self) -> SchemaSnapshot {
        self.catalog.describe()
    }

    pub fn active_database(&self) -> &str {
        self.catalog.active_name()
    }

    pub fn databases(&self) -> Vec<String> {
        self.catalog.databases()
    }

    pub fn pending(&self) -> usize {
        self.catalog.pending()
    }

    pub fn pending_log_entries(&self) -> Vec<LogEntry> {
        self.catalog.pending_entries()
    }
}
