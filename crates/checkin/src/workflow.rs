//! The attendee registration workflow.
//!
//! One session walks through
//! `PreRegistration → (DocumentReview)? → Registration → Signature → Completed`
//! and only returns to the start through an explicit [`Workflow::start_over`].
//! Each [`Step`] variant carries exactly the data that exists in that step, so
//! there is no way to reach the signature step without a validated contact
//! form. Every operation is checked against [`TRANSITIONS`] (or
//! [`IN_STEP_ACTIONS`]) first; a call made in the wrong step fails with
//! [`Error::InvalidTransition`] and leaves the session untouched.

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::registration::{CompletedRegistration, PartialRegistration};
use crate::review::ReviewTracker;
use crate::signature::{EventResponse, InputEvent, SignaturePad, StrokeStyle, SurfaceRect};
use crate::storage::KeyValueStore;
use crate::store::Store;
use crate::validate::{self, ContactForm, Field, ValidationErrors};

/// Heading of the completion screen.
pub const COMPLETED_TITLE: &str = "¡Registro Completado!";

/// Message on the completion screen.
pub const COMPLETED_MESSAGE: &str = "Gracias por registrarse. Su asistencia ha sido confirmada.";

/// Label of the start-over button.
pub const START_OVER_LABEL: &str = "Realizar otro registro";

/// Outcome of a form submission: the step entered, or the fields to correct.
pub type Submission = std::result::Result<StepKind, ValidationErrors>;

/// Which step a session is in, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Asking for the attendee's name.
    PreRegistration,
    /// Attendee must open every reference document.
    DocumentReview,
    /// Contact form.
    Registration,
    /// Signature surface.
    Signature,
    /// Registration recorded.
    Completed,
}

impl StepKind {
    /// Human-readable step name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::PreRegistration => "pre-registration",
            Self::DocumentReview => "document review",
            Self::Registration => "registration",
            Self::Signature => "signature",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operations a session accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Submit the attendee's name.
    PreRegister,
    /// Open a reference document.
    OpenDocument,
    /// Leave the document review.
    FinishReview,
    /// Submit the contact form.
    SubmitContact,
    /// Feed an input event to the signature surface.
    Draw,
    /// Erase the signature surface.
    ClearSignature,
    /// Save the signature and record the registration.
    SaveSignature,
    /// Begin a new session.
    StartOver,
}

impl Action {
    fn describe(self) -> &'static str {
        match self {
            Self::PreRegister => "pre-register",
            Self::OpenDocument => "open a document",
            Self::FinishReview => "finish the document review",
            Self::SubmitContact => "submit the contact form",
            Self::Draw => "draw a signature",
            Self::ClearSignature => "clear the signature",
            Self::SaveSignature => "save the signature",
            Self::StartOver => "start over",
        }
    }
}

/// Every allowed step change as `(from, action, to)`.
pub const TRANSITIONS: &[(StepKind, Action, StepKind)] = &[
    (StepKind::PreRegistration, Action::PreRegister, StepKind::DocumentReview),
    (StepKind::PreRegistration, Action::PreRegister, StepKind::Registration),
    (StepKind::DocumentReview, Action::FinishReview, StepKind::Registration),
    (StepKind::Registration, Action::SubmitContact, StepKind::Signature),
    (StepKind::Signature, Action::SaveSignature, StepKind::Completed),
    (StepKind::Completed, Action::StartOver, StepKind::PreRegistration),
];

/// Actions that stay within a step.
pub const IN_STEP_ACTIONS: &[(StepKind, Action)] = &[
    (StepKind::DocumentReview, Action::OpenDocument),
    (StepKind::Signature, Action::Draw),
    (StepKind::Signature, Action::ClearSignature),
];

/// Whether `action` may be attempted in `step`.
#[must_use]
pub fn permits(step: StepKind, action: Action) -> bool {
    TRANSITIONS
        .iter()
        .any(|&(from, a, _)| from == step && a == action)
        || IN_STEP_ACTIONS.contains(&(step, action))
}

/// Whether `action` may move a session from `from` to `to`.
#[must_use]
pub fn allows(from: StepKind, action: Action, to: StepKind) -> bool {
    TRANSITIONS.contains(&(from, action, to))
}

/// A workflow step with the data that exists in it.
#[derive(Debug, Clone)]
pub enum Step {
    /// Waiting for the attendee's name.
    PreRegistration,
    /// Reviewing reference documents.
    DocumentReview {
        /// Name from the previous step.
        full_name: String,
        /// Which documents have been opened.
        review: ReviewTracker,
    },
    /// Filling the contact form.
    Registration {
        /// Name from the first step.
        full_name: String,
    },
    /// Signing.
    Signature {
        /// Everything collected so far.
        registration: PartialRegistration,
        /// The drawing surface.
        pad: SignaturePad,
    },
    /// Done; shows the record that was just created.
    Completed {
        /// The recorded registration.
        registration: CompletedRegistration,
    },
}

impl Step {
    /// The step without its data.
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            Self::PreRegistration => StepKind::PreRegistration,
            Self::DocumentReview { .. } => StepKind::DocumentReview,
            Self::Registration { .. } => StepKind::Registration,
            Self::Signature { .. } => StepKind::Signature,
            Self::Completed { .. } => StepKind::Completed,
        }
    }
}

/// A single attendee session.
#[derive(Debug, Clone)]
pub struct Workflow {
    step: Step,
    surface: SurfaceRect,
    style: StrokeStyle,
}

impl Workflow {
    /// Start a session. The signature surface is mounted with `surface` and
    /// `style` when the signature step is entered.
    #[must_use]
    pub fn new(surface: SurfaceRect, style: StrokeStyle) -> Self {
        Self {
            step: Step::PreRegistration,
            surface,
            style,
        }
    }

    /// Start a session with the surface size and colours from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let signature = &config.signature;
        Self::new(
            SurfaceRect::at_origin(signature.width, signature.height),
            StrokeStyle {
                color: config.stroke_color(),
                line_width: signature.line_width,
                stamp_color: config.stamp_color(),
            },
        )
    }

    /// The current step.
    #[must_use]
    pub fn step(&self) -> &Step {
        &self.step
    }

    /// The current step kind.
    #[must_use]
    pub fn kind(&self) -> StepKind {
        self.step.kind()
    }

    /// The attendee's name, once given.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        match &self.step {
            Step::PreRegistration => None,
            Step::DocumentReview { full_name, .. } | Step::Registration { full_name } => {
                Some(full_name.as_str())
            }
            Step::Signature { registration, .. } => registration.full_name.as_deref(),
            Step::Completed { registration } => Some(registration.full_name.as_str()),
        }
    }

    /// The document review, while in that step.
    #[must_use]
    pub fn review(&self) -> Option<&ReviewTracker> {
        match &self.step {
            Step::DocumentReview { review, .. } => Some(review),
            _ => None,
        }
    }

    /// The signature surface, while in that step.
    #[must_use]
    pub fn signature_pad(&self) -> Option<&SignaturePad> {
        match &self.step {
            Step::Signature { pad, .. } => Some(pad),
            _ => None,
        }
    }

    /// The record created by this session, once completed.
    #[must_use]
    pub fn completed(&self) -> Option<&CompletedRegistration> {
        match &self.step {
            Step::Completed { registration } => Some(registration),
            _ => None,
        }
    }

    /// Submit the attendee's name.
    ///
    /// Moves to the document review when `store` has links, otherwise straight
    /// to the contact form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside the pre-registration step.
    pub fn pre_register<B: KeyValueStore>(
        &mut self,
        full_name: &str,
        store: &Store<B>,
    ) -> Result<Submission> {
        self.check(Action::PreRegister)?;

        if let Err(error) = validate::validate_full_name(full_name) {
            let mut errors = ValidationErrors::new();
            errors.insert(Field::FullName, error);
            return Ok(Err(errors));
        }

        let full_name = full_name.trim().to_string();
        let links = store.link_list();
        let next = if links.is_empty() {
            Step::Registration { full_name }
        } else {
            Step::DocumentReview {
                full_name,
                review: ReviewTracker::new(links),
            }
        };
        Ok(Ok(self.transition(Action::PreRegister, next)))
    }

    /// Open the document at `position`, returning its URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside the document review.
    pub fn open_document(&mut self, position: usize) -> Result<Option<String>> {
        match &mut self.step {
            Step::DocumentReview { review, .. } => Ok(review.open(position).map(str::to_string)),
            other => Err(invalid(other.kind(), Action::OpenDocument)),
        }
    }

    /// Record that `url` was opened. See [`ReviewTracker::mark_visited`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside the document review.
    pub fn mark_document_visited(&mut self, url: &str) -> Result<Option<bool>> {
        match &mut self.step {
            Step::DocumentReview { review, .. } => Ok(review.mark_visited(url)),
            other => Err(invalid(other.kind(), Action::OpenDocument)),
        }
    }

    /// Leave the document review.
    ///
    /// Returns `false`, staying put, while some document is still unopened.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside the document review.
    pub fn finish_review(&mut self) -> Result<bool> {
        let full_name = match &self.step {
            Step::DocumentReview { full_name, review } => {
                if !review.is_complete() {
                    debug!(
                        visited = review.visited_count(),
                        total = review.total(),
                        "document review not finished"
                    );
                    return Ok(false);
                }
                full_name.clone()
            }
            other => return Err(invalid(other.kind(), Action::FinishReview)),
        };
        self.transition(Action::FinishReview, Step::Registration { full_name });
        Ok(true)
    }

    /// Submit the contact form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside the registration step and
    /// [`Error::SurfaceSize`] if the signature surface cannot be allocated.
    pub fn submit_contact(&mut self, form: ContactForm) -> Result<Submission> {
        let full_name = match &self.step {
            Step::Registration { full_name } => full_name.clone(),
            other => return Err(invalid(other.kind(), Action::SubmitContact)),
        };

        let errors = validate::validate_contact(&form);
        if !errors.is_empty() {
            debug!(fields = errors.len(), "contact form rejected");
            return Ok(Err(errors));
        }

        let mut registration = PartialRegistration::with_full_name(full_name);
        registration.merge_contact(form);
        let pad = SignaturePad::mount(self.surface, self.style)?;
        Ok(Ok(self.transition(
            Action::SubmitContact,
            Step::Signature { registration, pad },
        )))
    }

    /// Feed one input event to the signature surface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside the signature step.
    pub fn handle_signature_event(&mut self, event: &InputEvent) -> Result<EventResponse> {
        match &mut self.step {
            Step::Signature { pad, .. } => Ok(pad.handle(event)),
            other => Err(invalid(other.kind(), Action::Draw)),
        }
    }

    /// Erase the signature surface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside the signature step.
    pub fn clear_signature(&mut self) -> Result<()> {
        match &mut self.step {
            Step::Signature { pad, .. } => {
                pad.clear();
                Ok(())
            }
            other => Err(invalid(other.kind(), Action::ClearSignature)),
        }
    }

    /// Save the signature now and record the registration.
    ///
    /// # Errors
    ///
    /// See [`Workflow::save_signature_at`].
    pub fn save_signature<B: KeyValueStore>(&mut self, store: &mut Store<B>) -> Result<bool> {
        self.save_signature_at(store, &Local::now())
    }

    /// Save the signature stamped with `now` and append the completed record
    /// to `store`.
    ///
    /// Returns `false` without changing anything when nothing has been drawn
    /// or a required field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside the signature step, or an
    /// error if the signature cannot be encoded.
    pub fn save_signature_at<B, Tz>(
        &mut self,
        store: &mut Store<B>,
        now: &DateTime<Tz>,
    ) -> Result<bool>
    where
        B: KeyValueStore,
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let record = match &mut self.step {
            Step::Signature { registration, pad } => {
                if !pad.can_save() {
                    return Ok(false);
                }
                if !registration.is_complete() {
                    warn!("Signature saved without a complete registration; ignoring");
                    return Ok(false);
                }
                let Some(image) = pad.save(now)? else {
                    return Ok(false);
                };
                match registration.complete(image, now) {
                    Some(record) => record,
                    None => return Ok(false),
                }
            }
            other => return Err(invalid(other.kind(), Action::SaveSignature)),
        };

        store.append_registration(record.clone());
        self.transition(
            Action::SaveSignature,
            Step::Completed {
                registration: record,
            },
        );
        Ok(true)
    }

    /// Begin a new session with nothing carried over.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the session is completed.
    pub fn start_over(&mut self) -> Result<()> {
        self.check(Action::StartOver)?;
        self.transition(Action::StartOver, Step::PreRegistration);
        Ok(())
    }

    fn check(&self, action: Action) -> Result<()> {
        let kind = self.kind();
        if permits(kind, action) {
            Ok(())
        } else {
            Err(invalid(kind, action))
        }
    }

    fn transition(&mut self, action: Action, next: Step) -> StepKind {
        let from = self.kind();
        let to = next.kind();
        debug_assert!(allows(from, action, to), "{from} -> {to} via {action:?}");
        debug!(%from, %to, "workflow step");
        self.step = next;
        to
    }
}

fn invalid(from: StepKind, action: Action) -> Error {
    Error::InvalidTransition {
        from: from.name(),
        action: action.describe(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Phase;
    use crate::storage::MemoryStore;
    use crate::validate::FieldError;
    use chrono::FixedOffset;

    fn store_with(links: &[&str]) -> Store<MemoryStore> {
        let mut store = Store::load(MemoryStore::new(), None);
        store.add_links(links.iter().map(ToString::to_string));
        store
    }

    fn workflow() -> Workflow {
        Workflow::new(SurfaceRect::at_origin(200, 100), StrokeStyle::default())
    }

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 16, 9, 5, 7)
            .unwrap()
    }

    fn contact(company: &str, dni: &str) -> ContactForm {
        ContactForm {
            company: company.to_string(),
            document_number: dni.to_string(),
            phone: String::new(),
            email: String::new(),
        }
    }

    fn draw(workflow: &mut Workflow) {
        workflow
            .handle_signature_event(&InputEvent::pointer(Phase::Start, 20.0, 20.0))
            .unwrap();
        workflow
            .handle_signature_event(&InputEvent::pointer(Phase::Move, 120.0, 60.0))
            .unwrap();
        workflow
            .handle_signature_event(&InputEvent::pointer(Phase::End, 120.0, 60.0))
            .unwrap();
    }

    #[test]
    fn test_transition_table_is_linear() {
        for &(from, action, to) in TRANSITIONS {
            assert!(permits(from, action));
            assert!(allows(from, action, to));
        }
        assert!(!allows(
            StepKind::PreRegistration,
            Action::SubmitContact,
            StepKind::Signature
        ));
        assert!(!permits(StepKind::Registration, Action::SaveSignature));
    }

    #[test]
    fn test_blank_name_does_not_advance() {
        let store = store_with(&[]);
        let mut wf = workflow();

        let errors = wf.pre_register("   ", &store).unwrap().unwrap_err();
        assert!(matches!(
            errors.get(Field::FullName),
            Some(FieldError::Required { .. })
        ));
        assert_eq!(wf.kind(), StepKind::PreRegistration);
    }

    #[test]
    fn test_empty_links_skip_document_review() {
        let store = store_with(&[]);
        let mut wf = workflow();

        let next = wf.pre_register("Ana Gómez", &store).unwrap().unwrap();
        assert_eq!(next, StepKind::Registration);
        assert!(wf.review().is_none());
    }

    #[test]
    fn test_links_enter_document_review() {
        let store = store_with(&["https://a.com", "https://b.com"]);
        let mut wf = workflow();

        let next = wf.pre_register("Ana", &store).unwrap().unwrap();
        assert_eq!(next, StepKind::DocumentReview);
        assert_eq!(wf.review().unwrap().total(), 2);
    }

    #[test]
    fn test_review_gate() {
        let store = store_with(&["https://a.com", "https://b.com"]);
        let mut wf = workflow();
        wf.pre_register("Ana", &store).unwrap().unwrap();

        assert!(!wf.finish_review().unwrap());
        assert_eq!(wf.open_document(0).unwrap().as_deref(), Some("https://a.com"));
        assert!(!wf.finish_review().unwrap());
        assert_eq!(wf.kind(), StepKind::DocumentReview);

        assert_eq!(wf.mark_document_visited("https://b.com").unwrap(), Some(true));
        assert!(wf.finish_review().unwrap());
        assert_eq!(wf.kind(), StepKind::Registration);
        assert_eq!(wf.full_name(), Some("Ana"));
    }

    #[test]
    fn test_review_rejects_unknown_link() {
        let store = store_with(&["https://a.com"]);
        let mut wf = workflow();
        wf.pre_register("Ana", &store).unwrap().unwrap();

        assert_eq!(wf.mark_document_visited("https://evil.com").unwrap(), None);
        assert_eq!(wf.open_document(3).unwrap(), None);
        assert!(!wf.finish_review().unwrap());
    }

    #[test]
    fn test_invalid_contact_stays_in_registration() {
        let store = store_with(&[]);
        let mut wf = workflow();
        wf.pre_register("Ana", &store).unwrap().unwrap();

        let errors = wf.submit_contact(contact("", "123")).unwrap().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(wf.kind(), StepKind::Registration);
    }

    #[test]
    fn test_wrong_step_is_rejected_without_change() {
        let mut store = store_with(&[]);
        let mut wf = workflow();

        let err = wf.submit_contact(contact("Acme", "12345678")).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: "pre-registration",
                ..
            }
        ));
        assert!(wf.save_signature_at(&mut store, &now()).is_err());
        assert!(wf.start_over().is_err());
        assert!(wf.finish_review().is_err());
        assert!(wf
            .handle_signature_event(&InputEvent::pointer(Phase::Start, 1.0, 1.0))
            .is_err());
        assert_eq!(wf.kind(), StepKind::PreRegistration);
        assert!(store.registrations().is_empty());
    }

    #[test]
    fn test_save_without_drawing_is_noop() {
        let mut store = store_with(&[]);
        let mut wf = workflow();
        wf.pre_register("Ana", &store).unwrap().unwrap();
        wf.submit_contact(contact("Acme", "12345678")).unwrap().unwrap();

        assert!(!wf.save_signature_at(&mut store, &now()).unwrap());
        assert_eq!(wf.kind(), StepKind::Signature);
        assert!(store.registrations().is_empty());
    }

    #[test]
    fn test_clear_signature_disables_save() {
        let mut store = store_with(&[]);
        let mut wf = workflow();
        wf.pre_register("Ana", &store).unwrap().unwrap();
        wf.submit_contact(contact("Acme", "12345678")).unwrap().unwrap();
        draw(&mut wf);
        assert!(wf.signature_pad().unwrap().can_save());

        wf.clear_signature().unwrap();
        assert!(!wf.signature_pad().unwrap().can_save());
        assert!(!wf.save_signature_at(&mut store, &now()).unwrap());
    }

    #[test]
    fn test_incomplete_registration_save_is_noop() {
        let mut store = store_with(&[]);
        let mut wf = workflow();
        let mut pad =
            SignaturePad::mount(SurfaceRect::at_origin(200, 100), StrokeStyle::default()).unwrap();
        pad.handle(&InputEvent::pointer(Phase::Start, 10.0, 10.0));
        pad.handle(&InputEvent::pointer(Phase::Move, 50.0, 50.0));
        wf.step = Step::Signature {
            registration: PartialRegistration::with_full_name("Ana"),
            pad,
        };

        assert!(!wf.save_signature_at(&mut store, &now()).unwrap());
        assert_eq!(wf.kind(), StepKind::Signature);
        assert!(store.registrations().is_empty());
    }

    #[test]
    fn test_end_to_end_registration() {
        let mut store = store_with(&[]);
        let mut wf = workflow();

        assert_eq!(
            wf.pre_register("Ana Gómez", &store).unwrap().unwrap(),
            StepKind::Registration
        );
        assert_eq!(
            wf.submit_contact(contact("Acme", "12345678")).unwrap().unwrap(),
            StepKind::Signature
        );
        draw(&mut wf);
        assert!(wf.save_signature_at(&mut store, &now()).unwrap());

        assert_eq!(store.registrations().len(), 1);
        let record = &store.registrations()[0];
        assert_eq!(record.full_name, "Ana Gómez");
        assert_eq!(record.company, "Acme");
        assert_eq!(record.document_number, "12345678");
        assert_eq!(record.phone, "");
        assert_eq!(record.email, "");
        assert!(!record.signature.is_empty());
        assert!(record
            .signature
            .as_data_url()
            .starts_with("data:image/png;base64,"));
        assert_eq!(record.registration_date, "16/10/2026, 9:05:07");

        // Stays completed until explicitly restarted
        assert_eq!(wf.kind(), StepKind::Completed);
        assert_eq!(wf.completed(), Some(record));
        assert!(wf.pre_register("Otro", &store).is_err());

        wf.start_over().unwrap();
        assert_eq!(wf.kind(), StepKind::PreRegistration);
        assert_eq!(wf.full_name(), None);
        assert_eq!(store.registrations().len(), 1);
    }

    #[test]
    fn test_oversized_surface_keeps_registration_step() {
        let store = store_with(&[]);
        let mut wf = Workflow::new(
            SurfaceRect::at_origin(u32::MAX, u32::MAX),
            StrokeStyle::default(),
        );
        wf.pre_register("Ana", &store).unwrap().unwrap();

        let err = wf.submit_contact(contact("Acme", "12345678")).unwrap_err();
        assert!(matches!(err, Error::SurfaceSize { .. }));
        assert_eq!(wf.kind(), StepKind::Registration);
    }

    #[test]
    fn test_from_config_uses_surface_size() {
        let mut config = Config::default();
        config.signature.width = 320;
        config.signature.height = 160;
        let store = store_with(&[]);

        let mut wf = Workflow::from_config(&config);
        wf.pre_register("Ana", &store).unwrap().unwrap();
        wf.submit_contact(contact("Acme", "1234567")).unwrap().unwrap();

        let raster = wf.signature_pad().unwrap().raster();
        assert_eq!((raster.width(), raster.height()), (320, 160));
    }
}
