//! Admin console: document link management and registration reporting.

pub mod report;

use std::path::Path;

use indexmap::IndexSet;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::registration::CompletedRegistration;
use crate::storage::KeyValueStore;
use crate::store::{share, Store};

/// Question asked before clearing every registration.
pub const CLEAR_REGISTRATIONS_PROMPT: &str =
    "¿Está seguro de que desea eliminar todos los registros? Esta acción no se puede deshacer.";

/// Split pasted text into document links.
///
/// One candidate per line, trimmed; blank lines and anything not starting
/// with `http://` or `https://` are dropped. Duplicates are kept here and
/// collapsed when merged into the collection.
#[must_use]
pub fn parse_link_input(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| line.starts_with("http://") || line.starts_with("https://"))
        .map(ToString::to_string)
        .collect()
}

/// Admin operations over a [`Store`].
#[derive(Debug)]
pub struct AdminConsole<'a, B> {
    store: &'a mut Store<B>,
    config: &'a Config,
}

impl<'a, B: KeyValueStore> AdminConsole<'a, B> {
    /// Operate on `store` with the share and report settings from `config`.
    pub fn new(store: &'a mut Store<B>, config: &'a Config) -> Self {
        Self { store, config }
    }

    /// Current document links.
    #[must_use]
    pub fn links(&self) -> &IndexSet<String> {
        self.store.links()
    }

    /// Add the links found in pasted `text`, returning how many were new.
    pub fn add_links(&mut self, text: &str) -> usize {
        let candidates = parse_link_input(text);
        if candidates.is_empty() {
            return 0;
        }
        self.store.add_links(candidates)
    }

    /// Remove the link at `position`.
    pub fn remove_link(&mut self, position: usize) -> Option<String> {
        self.store.remove_link(position)
    }

    /// Remove every link.
    pub fn clear_links(&mut self) {
        self.store.clear_links();
    }

    /// The address to send attendees, or `None` while there are no links.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base address is invalid.
    pub fn share_link(&self) -> Result<Option<String>> {
        let base = self.config.base_url()?;
        share::share_url(&base, &self.config.share.query_param, self.store.links())
    }

    /// Completed registrations.
    #[must_use]
    pub fn registrations(&self) -> &[CompletedRegistration] {
        self.store.registrations()
    }

    /// Number of completed registrations.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.store.registrations().len()
    }

    /// One-line summary for the registrations section.
    #[must_use]
    pub fn registration_summary(&self) -> String {
        match self.registration_count() {
            0 => "Aún no hay participantes registrados.".to_string(),
            n => format!("Hay {n} participante(s) registrado(s)."),
        }
    }

    /// Clear every registration once `confirm` agrees.
    ///
    /// `confirm` receives [`CLEAR_REGISTRATIONS_PROMPT`]. Returns whether
    /// anything was cleared.
    pub fn clear_registrations<F>(&mut self, confirm: F) -> bool
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(CLEAR_REGISTRATIONS_PROMPT) {
            info!("Clearing registrations cancelled");
            return false;
        }
        self.store.clear_registrations();
        true
    }

    /// Render the registration report as PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be produced.
    pub fn render_report(&self) -> Result<Vec<u8>> {
        report::render(&self.config.report.title, self.store.registrations())
    }

    /// Write the registration report to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn export_report(&self, path: &Path) -> Result<()> {
        let bytes = self.render_report()?;
        std::fs::write(path, &bytes)?;
        info!(
            "Exported {} registration(s) to {}",
            self.registration_count(),
            path.display()
        );
        Ok(())
    }

    /// Default file name for exported reports.
    #[must_use]
    pub fn report_file_name(&self) -> &str {
        &self.config.report.file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::SignatureImage;
    use crate::storage::MemoryStore;

    fn record(name: &str) -> CompletedRegistration {
        CompletedRegistration {
            full_name: name.to_string(),
            company: "Acme".to_string(),
            document_number: "1234567".to_string(),
            phone: String::new(),
            email: String::new(),
            signature: SignatureImage::from_data_url("data:image/png;base64,AAAA".to_string()),
            registration_date: "1/2/2026, 10:00:00".to_string(),
        }
    }

    fn links(store: &Store<MemoryStore>) -> Vec<&str> {
        store.links().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_parse_link_input() {
        let parsed =
            parse_link_input("  https://a.com  \n\nftp://b.com\nhttp://c.com\r\nwww.d.com\n");
        assert_eq!(parsed, vec!["https://a.com", "http://c.com"]);
    }

    #[test]
    fn test_add_links_filters_and_dedupes() {
        let config = Config::default();
        let mut store = Store::load(MemoryStore::new(), None);
        let mut admin = AdminConsole::new(&mut store, &config);

        let added = admin.add_links("http://x.com\nhttp://x.com\nnot-a-link\nhttps://y.com");
        assert_eq!(added, 2);
        assert_eq!(links(&store), vec!["http://x.com", "https://y.com"]);
    }

    #[test]
    fn test_add_links_nothing_valid() {
        let config = Config::default();
        let mut store = Store::load(MemoryStore::new(), None);
        let mut admin = AdminConsole::new(&mut store, &config);

        assert_eq!(admin.add_links("\n  \nnope"), 0);
        assert!(admin.links().is_empty());
    }

    #[test]
    fn test_remove_link_position() {
        let config = Config::default();
        let mut store = Store::load(MemoryStore::new(), None);
        let mut admin = AdminConsole::new(&mut store, &config);
        admin.add_links("https://a\nhttps://b\nhttps://c");

        assert_eq!(admin.remove_link(1).as_deref(), Some("https://b"));
        assert_eq!(links(&store), vec!["https://a", "https://c"]);
    }

    #[test]
    fn test_share_link_tracks_collection() {
        let config = Config::default();
        let mut store = Store::load(MemoryStore::new(), None);
        let mut admin = AdminConsole::new(&mut store, &config);

        assert_eq!(admin.share_link().unwrap(), None);

        admin.add_links("https://a.com");
        let first = admin.share_link().unwrap().unwrap();
        assert!(first.starts_with("http://localhost:8080/?links="));

        admin.add_links("https://b.com");
        let second = admin.share_link().unwrap().unwrap();
        assert_ne!(first, second);

        let token = second.split_once("?links=").unwrap().1;
        assert_eq!(
            share::decode_links(token).unwrap(),
            vec!["https://a.com", "https://b.com"]
        );

        admin.clear_links();
        assert_eq!(admin.share_link().unwrap(), None);
    }

    #[test]
    fn test_registration_summary() {
        let config = Config::default();
        let mut store = Store::load(MemoryStore::new(), None);
        {
            let admin = AdminConsole::new(&mut store, &config);
            assert_eq!(
                admin.registration_summary(),
                "Aún no hay participantes registrados."
            );
        }
        store.append_registration(record("Ana"));
        store.append_registration(record("Luis"));
        let admin = AdminConsole::new(&mut store, &config);
        assert_eq!(admin.registration_count(), 2);
        assert_eq!(
            admin.registration_summary(),
            "Hay 2 participante(s) registrado(s)."
        );
    }

    #[test]
    fn test_clear_registrations_requires_confirmation() {
        let config = Config::default();
        let mut store = Store::load(MemoryStore::new(), None);
        store.append_registration(record("Ana"));
        let mut admin = AdminConsole::new(&mut store, &config);

        let mut asked = String::new();
        assert!(!admin.clear_registrations(|prompt| {
            asked = prompt.to_string();
            false
        }));
        assert_eq!(asked, CLEAR_REGISTRATIONS_PROMPT);
        assert_eq!(admin.registration_count(), 1);

        assert!(admin.clear_registrations(|_| true));
        assert_eq!(admin.registration_count(), 0);
    }

    #[test]
    fn test_export_report_writes_pdf() {
        let config = Config::default();
        let mut store = Store::load(MemoryStore::new(), None);
        store.append_registration(record("Ana"));
        let admin = AdminConsole::new(&mut store, &config);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(admin.report_file_name());
        admin.export_report(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(path.file_name().unwrap(), "registros_capacitacion.pdf");
    }
}
