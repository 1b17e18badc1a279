//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::form::LmdbFormStore;
use crate::identity::LmdbIdentityStore;
use crate::LmdbError;

/// Number of named databases the environment is opened with.
const MAX_DBS: u32 = 8;

const FORMS_DB: &str = "forms";
const IDENTITIES_DB: &str = "identities";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    forms_db: Database<Bytes, Bytes>,
    identities_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment in `path`, creating the directory
    /// and every database on first use.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per process and the data
        // directory is not shared with another process that truncates it.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let forms_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some(FORMS_DB))?;
        let identities_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some(IDENTITIES_DB))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            forms_db,
            identities_db,
        })
    }

    pub fn form_store(&self) -> LmdbFormStore {
        LmdbFormStore {
            env: self.env.clone(),
            forms_db: self.forms_db,
        }
    }

    pub fn identity_store(&self) -> LmdbIdentityStore {
        LmdbIdentityStore {
            env: self.env.clone(),
            identities_db: self.identities_db,
        }
    }

    /// Flush dirty pages to disk.
    pub fn sync(&self) -> Result<(), LmdbError> {
        self.env.force_sync()?;
        Ok(())
    }
}
