use std::path::Path;

use crawlwatch_core::ListFilter;
use crawlwatch_engine::AtomicFileWriter;
use engine_logging::{engine_error, engine_info, engine_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = ".crawlwatch_state.ron";

/// What survives a restart: the credentials and the last list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub api_key: String,
    #[serde(default)]
    pub filter: ListFilter,
}

/// Writes the session file only when its content would change.
pub struct SessionStore {
    writer: AtomicFileWriter,
    api_key: Option<String>,
    filter: ListFilter,
    saved: Option<PersistedSession>,
}

impl SessionStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            writer: AtomicFileWriter::new(state_dir.to_path_buf()),
            api_key: None,
            filter: ListFilter::default(),
            saved: None,
        }
    }

    /// Missing or unreadable state yields `None`; the user simply logs in again.
    pub fn load(&mut self) -> Option<PersistedSession> {
        let content = match self.writer.read(STATE_FILENAME) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err) => {
                engine_warn!("Failed to read persisted session: {}", err);
                return None;
            }
        };

        let session: PersistedSession = match ron::from_str(&content) {
            Ok(session) => session,
            Err(err) => {
                engine_warn!(
                    "Failed to parse persisted session from {:?}: {}",
                    self.writer.path_of(STATE_FILENAME),
                    err
                );
                return None;
            }
        };

        engine_info!("Restored persisted session");
        self.api_key = Some(session.api_key.clone());
        self.filter = session.filter.clone();
        self.saved = Some(session.clone());
        Some(session)
    }

    /// `None` logs out and removes the file.
    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.api_key = api_key;
        self.sync();
    }

    pub fn set_filter(&mut self, filter: &ListFilter) {
        if &self.filter != filter {
            self.filter = filter.clone();
            self.sync();
        }
    }

    fn sync(&mut self) {
        let wanted = self.api_key.clone().map(|api_key| PersistedSession {
            api_key,
            filter: self.filter.clone(),
        });
        if wanted == self.saved {
            return;
        }

        match &wanted {
            Some(session) => {
                let pretty = ron::ser::PrettyConfig::new();
                let content = match ron::ser::to_string_pretty(session, pretty) {
                    Ok(text) => text,
                    Err(err) => {
                        engine_error!("Failed to serialize session: {}", err);
                        return;
                    }
                };
                if let Err(err) = self.writer.write(STATE_FILENAME, &content) {
                    engine_error!("Failed to write persisted session: {}", err);
                    return;
                }
            }
            None => {
                if let Err(err) = self.writer.remove(STATE_FILENAME) {
                    engine_error!("Failed to remove persisted session: {}", err);
                    return;
                }
            }
        }
        self.saved = wanted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawlwatch_core::{ResourceStatus, SortField};
    use tempfile::TempDir;

    #[test]
    fn session_round_trips_through_the_state_file() {
        let temp = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp.path());
        store.set_api_key(Some("secret".to_string()));
        let filter = ListFilter {
            status: Some(ResourceStatus::Completed),
            sort_by: SortField::Title,
            ..ListFilter::default()
        };
        store.set_filter(&filter);

        let restored = SessionStore::new(temp.path()).load().unwrap();
        assert_eq!(restored.api_key, "secret");
        assert_eq!(restored.filter, filter);
    }

    #[test]
    fn logout_removes_the_state_file() {
        let temp = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp.path());
        store.set_api_key(Some("secret".to_string()));
        assert!(temp.path().join(STATE_FILENAME).exists());

        store.set_api_key(None);
        assert!(!temp.path().join(STATE_FILENAME).exists());
        assert_eq!(SessionStore::new(temp.path()).load(), None);
    }

    #[test]
    fn filter_alone_is_not_persisted() {
        let temp = TempDir::new().unwrap();
        let mut store = SessionStore::new(temp.path());
        store.set_filter(&ListFilter {
            page: 4,
            ..ListFilter::default()
        });

        assert!(!temp.path().join(STATE_FILENAME).exists());
    }

    #[test]
    fn corrupt_state_is_ignored() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(STATE_FILENAME), "not ron at all (").unwrap();

        assert_eq!(SessionStore::new(temp.path()).load(), None);
    }
}
