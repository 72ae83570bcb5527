//! Dialog State Machine
//!
//! `Closed → Loading → Editing → Submitting → Closed | Editing`
//!
//! Every open starts a new generation. Work that finishes after an await
//! presents the [`Ticket`] it was started with; a ticket from an older
//! generation, or one arriving in the wrong phase, is dropped so a late
//! fetch can never write into a dialog that was closed or reopened.

use log::debug;

use crate::editor::{FormDraft, SubmitOutcome, Target};
use crate::error::{DialogError, SubmitError};
use crate::fetcher::ReferenceData;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Closed,
    Loading,
    Editing,
    Submitting,
}

/// Proof of which opening an async result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug, Clone)]
struct Session {
    target: Target,
    draft: FormDraft,
    references: ReferenceData,
    last_error: Option<SubmitError>,
}

#[derive(Debug, Default)]
pub struct Dialog {
    generation: u64,
    session: Option<Session>,
    phase: Phase,
}

impl Dialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a fresh instance; whatever was open is discarded
    pub fn open(&mut self, target: Target, draft: FormDraft) -> Ticket {
        self.generation += 1;
        self.session = Some(Session {
            target,
            draft,
            references: ReferenceData::default(),
            last_error: None,
        });
        self.phase = Phase::Loading;
        Ticket {
            generation: self.generation,
        }
    }

    pub fn close(&mut self) {
        self.generation += 1;
        self.session = None;
        self.phase = Phase::Closed;
    }

    fn accepts(&self, ticket: Ticket, phase: Phase) -> bool {
        let current = ticket.generation == self.generation && self.phase() == phase;
        if !current {
            debug!(
                "Dropping result for generation {} (now {} in {:?})",
                ticket.generation,
                self.generation,
                self.phase()
            );
        }
        current
    }

    /// Attach fetched reference data. Returns false if the result is stale.
    pub fn finish_loading(&mut self, ticket: Ticket, references: ReferenceData) -> bool {
        if !self.accepts(ticket, Phase::Loading) {
            return false;
        }
        if let Some(session) = self.session.as_mut() {
            session.references = references;
        }
        self.phase = Phase::Editing;
        true
    }

    fn require_editing(&self) -> Result<(), DialogError> {
        match self.phase() {
            Phase::Editing => Ok(()),
            Phase::Closed => Err(DialogError::NotOpen),
            Phase::Loading => Err(DialogError::StillLoading),
            Phase::Submitting => Err(DialogError::Busy),
        }
    }

    /// Read access in any open phase
    pub fn draft(&self) -> Result<&FormDraft, DialogError> {
        self.session.as_ref().map(|s| &s.draft).ok_or(DialogError::NotOpen)
    }

    /// Write access only while editing
    pub fn draft_mut(&mut self) -> Result<&mut FormDraft, DialogError> {
        self.require_editing()?;
        self.session.as_mut().map(|s| &mut s.draft).ok_or(DialogError::NotOpen)
    }

    pub fn target(&self) -> Option<&Target> {
        self.session.as_ref().map(|s| &s.target)
    }

    pub fn references(&self) -> Option<&ReferenceData> {
        self.session.as_ref().map(|s| &s.references)
    }

    pub fn last_error(&self) -> Option<&SubmitError> {
        self.session.as_ref().and_then(|s| s.last_error.as_ref())
    }

    /// Enter `Submitting` and hand out what the write needs
    pub fn begin_submit(&mut self) -> Result<(Ticket, FormDraft, Target), DialogError> {
        self.require_editing()?;
        let session = self.session.as_mut().ok_or(DialogError::NotOpen)?;
        session.last_error = None;
        let draft = session.draft.clone();
        let target = session.target.clone();
        self.phase = Phase::Submitting;
        let ticket = Ticket {
            generation: self.generation,
        };
        Ok((ticket, draft, target))
    }

    /// Apply a write's result. Returns false if the result is stale.
    ///
    /// Success closes the dialog; "nothing to update" and failures return
    /// to editing with the draft as it was.
    pub fn complete_submit(&mut self, ticket: Ticket, result: &Result<SubmitOutcome, SubmitError>) -> bool {
        if !self.accepts(ticket, Phase::Submitting) {
            return false;
        }
        match result {
            Ok(SubmitOutcome::Created(_)) | Ok(SubmitOutcome::Updated) => self.close(),
            Ok(SubmitOutcome::NothingToUpdate) => self.phase = Phase::Editing,
            Err(e) => {
                if let Some(session) = self.session.as_mut() {
                    session.last_error = Some(e.clone());
                }
                self.phase = Phase::Editing;
            }
        }
        true
    }
}
