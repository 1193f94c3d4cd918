//! Process-wide collections and their persistence.
//!
//! [`Store`] owns the document link collection and the registration
//! collection. Every mutation goes through a method here, which rewrites the
//! whole record in the backing [`KeyValueStore`]. Writes are best effort: a
//! failure is logged and the in-memory state stays authoritative.

pub mod share;

use indexmap::IndexSet;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::registration::CompletedRegistration;
use crate::storage::KeyValueStore;

/// Record key for the document link collection.
pub const LINKS_KEY: &str = "driveLinks";

/// Record key for the registration collection.
pub const REGISTRATIONS_KEY: &str = "registrations";

/// Where the link collection came from at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSource {
    /// Decoded from a share token.
    ShareToken,
    /// Read from the durable store.
    Persisted,
    /// Nothing available; started empty.
    Empty,
}

/// Owner of the link and registration collections.
#[derive(Debug)]
pub struct Store<B> {
    backend: B,
    links: IndexSet<String>,
    registrations: Vec<CompletedRegistration>,
    link_source: LinkSource,
}

impl<B: KeyValueStore> Store<B> {
    /// Load both collections.
    ///
    /// Links come from `share_token` when it decodes, otherwise from the
    /// persisted record, otherwise empty. Links taken from a token are not
    /// written back until an admin mutation persists them.
    pub fn load(backend: B, share_token: Option<&str>) -> Self {
        let registrations: Vec<CompletedRegistration> =
            read_record(&backend, REGISTRATIONS_KEY).unwrap_or_default();

        let decoded = share_token.and_then(|token| match share::decode_links(token) {
            Ok(links) => Some(links),
            Err(e) => {
                warn!("Ignoring share token: {}", e);
                None
            }
        });

        let (links, link_source) = match decoded {
            Some(links) => (links, LinkSource::ShareToken),
            None => match read_record::<Vec<String>>(&backend, LINKS_KEY) {
                Some(links) => (links, LinkSource::Persisted),
                None => (Vec::new(), LinkSource::Empty),
            },
        };

        let store = Self {
            backend,
            links: links.into_iter().collect(),
            registrations,
            link_source,
        };
        debug!(
            links = store.links.len(),
            registrations = store.registrations.len(),
            source = ?store.link_source,
            "store loaded"
        );
        store
    }

    /// The document links, in insertion order.
    #[must_use]
    pub fn links(&self) -> &IndexSet<String> {
        &self.links
    }

    /// Snapshot of the document links as an owned list.
    #[must_use]
    pub fn link_list(&self) -> Vec<String> {
        self.links.iter().cloned().collect()
    }

    /// Where the link collection was loaded from.
    #[must_use]
    pub fn link_source(&self) -> LinkSource {
        self.link_source
    }

    /// The completed registrations, oldest first.
    #[must_use]
    pub fn registrations(&self) -> &[CompletedRegistration] {
        &self.registrations
    }

    /// The backing store.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backing store.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Merge `links` into the collection, skipping ones already present.
    ///
    /// Returns how many were new.
    pub fn add_links<I>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let before = self.links.len();
        self.links.extend(links);
        let added = self.links.len() - before;
        if added > 0 {
            info!("Added {} document link(s)", added);
            self.persist_links();
        }
        added
    }

    /// Remove the link at `position`, keeping the order of the rest.
    pub fn remove_link(&mut self, position: usize) -> Option<String> {
        let removed = self.links.shift_remove_index(position)?;
        info!("Removed document link {}", removed);
        self.persist_links();
        Some(removed)
    }

    /// Remove every link.
    pub fn clear_links(&mut self) {
        self.links.clear();
        info!("Cleared document links");
        self.persist_links();
    }

    /// Append a finished registration.
    pub fn append_registration(&mut self, registration: CompletedRegistration) {
        info!("Recorded registration for {}", registration.full_name);
        self.registrations.push(registration);
        self.persist_registrations();
    }

    /// Remove every registration, returning how many there were.
    pub fn clear_registrations(&mut self) -> usize {
        let count = self.registrations.len();
        self.registrations.clear();
        info!("Cleared {} registration(s)", count);
        self.persist_registrations();
        count
    }

    fn persist_links(&mut self) {
        let links: Vec<&String> = self.links.iter().collect();
        write_record(&mut self.backend, LINKS_KEY, &links);
    }

    fn persist_registrations(&mut self) {
        write_record(&mut self.backend, REGISTRATIONS_KEY, &self.registrations);
    }
}

fn read_record<T: DeserializeOwned>(backend: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = match backend.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding malformed {} record: {}", key, e);
            None
        }
    }
}

fn write_record<T: Serialize + ?Sized>(backend: &mut impl KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(crate::error::Error::from)
        .and_then(|json| backend.set(key, &json));
    if let Err(e) = result {
        warn!("Failed to persist {}: {}", key, e);
    }
}
