//! Persisted relay list.

use std::{fs, path::PathBuf};

use crate::error::Error;

/// File-backed store for the ordered, deduplicated list of saved relay URLs.
///
/// The list is a JSON array of strings rewritten wholesale on every
/// mutation. Single-writer: concurrent handler instances sharing one path
/// are not supported.
pub struct RelayStore {
    path: PathBuf,
    default_relay: String,
}

impl RelayStore {
    /// Create a store persisting at `path`, seeding `default_relay` on
    /// first use.
    pub fn new(path: PathBuf, default_relay: String) -> Self {
        Self {
            path,
            default_relay,
        }
    }

    /// Read the saved list. A missing file seeds the default relay and
    /// persists it immediately.
    pub fn load(&self) -> Result<Vec<String>, Error> {
        if !self.path.exists() {
            let seeded = vec![self.default_relay.clone()];
            self.save(&seeded)?;
            return Ok(seeded);
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Overwrite the persisted list atomically.
    pub fn save(&self, relays: &[String]) -> Result<(), Error> {
        let parent_dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent_dir)?;
        let tmp = tempfile::NamedTempFile::new_in(&parent_dir)?;
        serde_json::to_writer(&tmp, relays)?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Append a URL unless it is already saved. Re-adding is a no-op, not
    /// an error.
    pub fn add(&self, url: &str) -> Result<Vec<String>, Error> {
        let mut relays = self.load()?;
        if !relays.iter().any(|r| r == url) {
            relays.push(url.to_string());
            self.save(&relays)?;
        }
        Ok(relays)
    }

    /// Remove the first match if present; the list is persisted either way.
    pub fn remove(&self, url: &str) -> Result<Vec<String>, Error> {
        let mut relays = self.load()?;
        if let Some(pos) = relays.iter().position(|r| r == url) {
            relays.remove(pos);
        }
        self.save(&relays)?;
        Ok(relays)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> RelayStore {
        RelayStore::new(
            dir.path().join("relays.json"),
            "wss://seed.example".into(),
        )
    }

    #[test]
    fn first_load_seeds_default_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let relays = store.load().unwrap();
        assert_eq!(relays, vec!["wss://seed.example".to_string()]);
        let data = fs::read_to_string(dir.path().join("relays.json")).unwrap();
        assert_eq!(data, r#"["wss://seed.example"]"#);
    }

    #[test]
    fn add_appends_in_order() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add("wss://one.example").unwrap();
        let relays = store.add("wss://two.example").unwrap();
        assert_eq!(
            relays,
            vec![
                "wss://seed.example".to_string(),
                "wss://one.example".to_string(),
                "wss://two.example".to_string(),
            ]
        );
    }

    #[test]
    fn add_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add("wss://one.example").unwrap();
        let relays = store.add("wss://one.example").unwrap();
        assert_eq!(
            relays
                .iter()
                .filter(|r| r.as_str() == "wss://one.example")
                .count(),
            1
        );
    }

    #[test]
    fn remove_drops_first_match() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add("wss://one.example").unwrap();
        let relays = store.remove("wss://seed.example").unwrap();
        assert_eq!(relays, vec!["wss://one.example".to_string()]);
        // removal survives a reload
        assert_eq!(store.load().unwrap(), relays);
    }

    #[test]
    fn remove_of_unknown_url_keeps_list() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.load().unwrap();
        let relays = store.remove("wss://missing.example").unwrap();
        assert_eq!(relays, vec!["wss://seed.example".to_string()]);
    }

    #[test]
    fn url_comparison_is_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add("wss://One.example").unwrap();
        let relays = store.add("wss://one.example").unwrap();
        assert_eq!(relays.len(), 3);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let list = vec!["wss://a".to_string(), "wss://b".to_string()];
        store.save(&list).unwrap();
        assert_eq!(store.load().unwrap(), list);
    }
}
