//! The archive-build-and-dispatch pipeline.
//!
//! One call to [`Dispatcher::dispatch`] runs
//! `Selecting → Archiving → Rendering → Attaching → Sending` and stops at the
//! first failing stage. Nothing is transmitted unless every earlier stage
//! succeeded. Failures are logged here and returned as a
//! [`DispatchOutcome::Failed`]; no error escapes.

use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};

use tracing::{error, info, info_span, warn};

use crate::archive::builder::ArchiveBuilder;
use crate::archive::selector::FileSelector;
use crate::config::Config;
use crate::error::{FileMailerError, Result};
use crate::i18n;
use crate::model::archive::{ArchiveNaming, ArchiveSpec, BuiltArchive};
use crate::model::dispatch::{DispatchOutcome, DispatchRequest, Stage};
use crate::model::message::{MessageAttachment, OutboundMessage, RenderModel};
use crate::render::{BodyRenderer, TemplateRenderer};

use super::compose::{preflight, ZIP_CONTENT_TYPE};
use super::transport::{self, MailTransport};

/// Per-dispatch settings that do not belong to a single component.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Canonical archive location.
    pub archive: ArchiveSpec,
    pub naming: ArchiveNaming,
    /// Template rendered into the message body.
    pub template: String,
    /// Sender address.
    pub from: String,
    pub subject: String,
    /// `strftime` format of the `generated_at` template variable.
    pub date_format: String,
}

impl DispatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            archive: config.archive_spec(),
            naming: config.archive.naming,
            template: config.template.name.clone(),
            from: config.sender().to_string(),
            subject: config
                .mail
                .subject
                .clone()
                .unwrap_or_else(|| i18n::mail_subject().to_string()),
            date_format: config.general.date_format.clone(),
        }
    }
}

/// Runs dispatches. Safe to share between threads.
///
/// With [`ArchiveNaming::Fixed`] all dispatches write the same archive path,
/// so they are serialized by an internal lock. With
/// [`ArchiveNaming::Unique`] each dispatch writes its own archive, deleted
/// once the dispatch ends, and dispatches run in parallel.
pub struct Dispatcher {
    settings: DispatchSettings,
    selector: FileSelector,
    builder: ArchiveBuilder,
    renderer: Box<dyn BodyRenderer>,
    transport: Box<dyn MailTransport>,
    archive_lock: Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        settings: DispatchSettings,
        selector: FileSelector,
        builder: ArchiveBuilder,
        renderer: Box<dyn BodyRenderer>,
        transport: Box<dyn MailTransport>,
    ) -> Self {
        Self {
            settings,
            selector,
            builder,
            renderer,
            transport,
            archive_lock: Mutex::new(()),
        }
    }

    /// Wire every component from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let selector = FileSelector::new(config.selection());
        let builder = ArchiveBuilder::new(config.archive.buffer_size);
        let renderer = TemplateRenderer::from_dir(&config.template.root);
        let transport = transport::from_config(config)?;
        Ok(Self::new(
            DispatchSettings::from_config(config),
            selector,
            builder,
            Box::new(renderer),
            transport,
        ))
    }

    /// Run the full pipeline for one recipient.
    ///
    /// In unique naming mode the returned archive path no longer exists
    /// when this returns.
    pub fn dispatch(&self, request: &DispatchRequest) -> DispatchOutcome {
        let span = info_span!("dispatch", recipient = %request.recipient);
        let _enter = span.enter();

        let spec = self.settings.archive.for_dispatch(self.settings.naming);
        let _guard = match self.settings.naming {
            ArchiveNaming::Fixed => Some(
                self.archive_lock
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            ),
            ArchiveNaming::Unique => None,
        };

        let outcome = match self.run(request, &spec) {
            Ok(archive) => {
                info!(
                    archive = %archive.path.display(),
                    entries = archive.entries.len(),
                    size = archive.size,
                    "Dispatch delivered"
                );
                DispatchOutcome::Delivered { archive }
            }
            Err((stage, err)) => {
                error!(
                    stage = %stage,
                    kind = %err.kind(),
                    recipient = %request.recipient,
                    archive = %spec.path().display(),
                    error = %err,
                    "Dispatch failed"
                );
                DispatchOutcome::Failed { stage, error: err }
            }
        };

        if self.settings.naming == ArchiveNaming::Unique {
            remove_archive(&spec);
        }

        outcome
    }

    fn run(
        &self,
        request: &DispatchRequest,
        spec: &ArchiveSpec,
    ) -> std::result::Result<BuiltArchive, (Stage, FileMailerError)> {
        let mut model = RenderModel::new().with("to", request.recipient.as_str());

        let files = self
            .selector
            .select()
            .map_err(|e| (Stage::Selecting, e))?;

        let archive = self
            .builder
            .build(spec, &files, None)
            .map_err(|e| (Stage::Archiving, e))?;

        self.fill_model(&mut model, &archive.file_name, archive.entries.len(), &archive.built_at);

        let body = self
            .renderer
            .render(&self.settings.template, &model)
            .map_err(|e| (Stage::Rendering, e))?;

        let message = OutboundMessage {
            from: self.settings.from.clone(),
            to: request.recipient.clone(),
            subject: self.settings.subject.clone(),
            html_body: body,
            attachment: MessageAttachment {
                file_name: archive.file_name.clone(),
                path: archive.path.clone(),
                content_type: ZIP_CONTENT_TYPE.to_string(),
            },
        };
        preflight(&message).map_err(|e| (Stage::Attaching, e))?;

        self.transport
            .send(&message)
            .map_err(|e| (Stage::Sending, e))?;

        Ok(archive)
    }

    /// Render the body a dispatch to `request.recipient` would send, without
    /// building the archive or sending anything.
    pub fn preview(&self, request: &DispatchRequest) -> Result<String> {
        let files = self.selector.select()?;
        let mut model = RenderModel::new().with("to", request.recipient.as_str());
        self.fill_model(
            &mut model,
            &self.settings.archive.file_name,
            files.len(),
            &chrono::Utc::now(),
        );
        self.renderer.render(&self.settings.template, &model)
    }

    fn fill_model(
        &self,
        model: &mut RenderModel,
        archive_name: &str,
        file_count: usize,
        at: &chrono::DateTime<chrono::Utc>,
    ) {
        model.insert("archive_name", archive_name);
        model.insert("file_count", file_count);
        model.insert("generated_at", self.format_time(at));
    }

    fn format_time(&self, at: &chrono::DateTime<chrono::Utc>) -> String {
        let local = at.with_timezone(&chrono::Local);
        let mut out = String::new();
        if write!(out, "{}", local.format(&self.settings.date_format)).is_err() {
            return local.to_rfc3339();
        }
        out
    }
}

fn remove_archive(spec: &ArchiveSpec) {
    let path = spec.path();
    match std::fs::remove_file(&path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Could not remove archive"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::selection::SelectionCriteria;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StaticRenderer(Arc<AtomicUsize>);

    impl BodyRenderer for StaticRenderer {
        fn render(&self, _template: &str, model: &RenderModel) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(format!(
                "archive={}",
                model.get("archive_name").and_then(|v| v.as_str()).unwrap_or("")
            ))
        }
    }

    #[derive(Default)]
    struct CountingTransport(Arc<AtomicUsize>);

    impl MailTransport for CountingTransport {
        fn send(&self, _message: &OutboundMessage) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn settings(dir: &std::path::Path, naming: ArchiveNaming) -> DispatchSettings {
        DispatchSettings {
            archive: ArchiveSpec::new(dir.join("out"), "backup.zip"),
            naming,
            template: "body.html".to_string(),
            from: "backups@example.com".to_string(),
            subject: "Backup".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }

    #[test]
    fn test_stage_reported_for_invalid_recipient() {
        let tmp = tempfile::tempdir().unwrap();
        let renders = Arc::new(AtomicUsize::new(0));
        let sends = Arc::new(AtomicUsize::new(0));
        let d = Dispatcher::new(
            settings(tmp.path(), ArchiveNaming::Fixed),
            FileSelector::new(SelectionCriteria::new(tmp.path(), ".log")),
            ArchiveBuilder::default(),
            Box::new(StaticRenderer(renders.clone())),
            Box::new(CountingTransport(sends.clone())),
        );

        let outcome = d.dispatch(&DispatchRequest::new("not-an-address"));
        assert_eq!(outcome.failed_stage(), Some(Stage::Attaching));
        assert_eq!(renders.load(Ordering::SeqCst), 1);
        assert_eq!(sends.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unique_naming_removes_archive() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.log"), "a").unwrap();
        let sends = Arc::new(AtomicUsize::new(0));
        let d = Dispatcher::new(
            settings(tmp.path(), ArchiveNaming::Unique),
            FileSelector::new(SelectionCriteria::new(tmp.path(), ".log")),
            ArchiveBuilder::default(),
            Box::new(StaticRenderer(Arc::default())),
            Box::new(CountingTransport(sends.clone())),
        );

        let outcome = d.dispatch(&DispatchRequest::new("user@example.com"));
        let DispatchOutcome::Delivered { archive } = outcome else {
            panic!("expected delivery");
        };
        assert!(archive.file_name.starts_with("backup-"));
        assert!(!archive.path.exists());
        assert!(!tmp.path().join("out").join("backup.zip").exists());
        assert_eq!(sends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fixed_naming_keeps_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let d = Dispatcher::new(
            settings(tmp.path(), ArchiveNaming::Fixed),
            FileSelector::new(SelectionCriteria::new(tmp.path(), ".log")),
            ArchiveBuilder::default(),
            Box::new(StaticRenderer(Arc::default())),
            Box::new(CountingTransport::default()),
        );
        let outcome = d.dispatch(&DispatchRequest::new("user@example.com"));
        assert!(outcome.is_success());
        assert!(tmp.path().join("out").join("backup.zip").exists());
    }

    #[test]
    fn test_dispatcher_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dispatcher>();
    }
}
