//! Session state machine driving one invocation of the pipeline.
//!
//! ```text
//! Idle -> Probing -> Blocked
//!                 -> Ready -> Converting -> Succeeded | Failed
//! ```
//!
//! The probe runs once per session, before any file is touched. A blocked
//! session never creates a job. A session runs one job at a time, since
//! LibreOffice cannot share its profile between concurrent instances; a
//! second request while one is running is refused with [`Error::Busy`].

use crate::catalog::FormatSpecifier;
use crate::error::Error;
use crate::orchestrator::{ConversionFailure, ConversionJob, ConversionResult, Orchestrator};
use crate::probe::AvailabilityProbe;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has happened yet
    Idle,
    /// Looking for the converter
    Probing,
    /// The converter is missing; nothing will run
    Blocked,
    /// The converter was found; waiting for a job
    Ready,
    /// A job is running
    Converting,
    /// The last job finished successfully
    Succeeded,
    /// The last job failed
    Failed,
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    in_flight: Option<PathBuf>,
}

/// One invocation context: a probe result plus the jobs it starts.
pub struct Session {
    probe: Arc<dyn AvailabilityProbe>,
    orchestrator: Orchestrator,
    inner: Mutex<Inner>,
}

impl Session {
    /// Create an idle session.
    pub fn new(probe: Arc<dyn AvailabilityProbe>, orchestrator: Orchestrator) -> Self {
        Self {
            probe,
            orchestrator,
            inner: Mutex::new(Inner {
                phase: Phase::Idle,
                in_flight: None,
            }),
        }
    }

    /// The orchestrator jobs run through.
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Probe for the converter if that has not happened yet.
    ///
    /// Returns `Blocked` or the phase after a successful probe.
    pub fn probe(&self) -> Phase {
        {
            let mut inner = self.lock();
            if inner.phase != Phase::Idle {
                return inner.phase;
            }
            inner.phase = Phase::Probing;
        }

        let available = self.probe.is_available();
        let phase = if available {
            Phase::Ready
        } else {
            Phase::Blocked
        };
        debug!("converter available: {}", available);
        self.lock().phase = phase;
        phase
    }

    /// Reserve the session for a job on `input`.
    ///
    /// Fails with [`Error::Blocked`] when the converter is missing and
    /// with [`Error::Busy`] while any other job of this session is still
    /// running. The reservation is released when the returned
    /// [`Reservation`] is run or dropped.
    pub fn begin(
        &self,
        input: impl Into<PathBuf>,
        specifier: FormatSpecifier,
    ) -> Result<Reservation<'_>, Error> {
        if self.probe() == Phase::Blocked {
            return Err(Error::Blocked);
        }

        let input = input.into();
        let mut inner = self.lock();
        if let Some(running) = &inner.in_flight {
            debug!(
                "refusing {}: {} is still converting",
                input.display(),
                running.display()
            );
            return Err(Error::Busy(running.clone()));
        }
        inner.in_flight = Some(input.clone());
        inner.phase = Phase::Converting;
        Ok(Reservation {
            session: self,
            job: Some(ConversionJob::new(input, specifier)),
            started: false,
            succeeded: false,
        })
    }

    /// Probe, reserve and run the job.
    pub fn convert(
        &self,
        input: impl Into<PathBuf>,
        specifier: FormatSpecifier,
    ) -> Result<ConversionResult, ConversionFailure> {
        self.begin(input, specifier)?.run()
    }

    /// Run the whole pipeline on tokio's blocking pool.
    ///
    /// Resolves once, with the same outcome [`Session::convert`] gives.
    #[cfg(feature = "async")]
    pub async fn convert_async(
        self: Arc<Self>,
        input: PathBuf,
        specifier: FormatSpecifier,
    ) -> Result<ConversionResult, ConversionFailure> {
        tokio::task::spawn_blocking(move || self.convert(input, specifier))
            .await
            .map_err(|e| {
                ConversionFailure::from(Error::ConverterError(format!(
                    "conversion task failed: {}",
                    e
                )))
            })?
    }

    fn release(&self, phase: Phase) {
        let mut inner = self.lock();
        inner.in_flight = None;
        inner.phase = phase;
    }
}

/// A job holding the session's single conversion slot.
///
/// Dropping it without [`Reservation::run`] returns the session to
/// `Ready`; a panic while running leaves it `Failed`.
#[must_use = "the session stays busy until the reservation is run or dropped"]
pub struct Reservation<'a> {
    session: &'a Session,
    job: Option<ConversionJob>,
    started: bool,
    succeeded: bool,
}

impl Reservation<'_> {
    /// The reserved job.
    pub fn job(&self) -> Option<&ConversionJob> {
        self.job.as_ref()
    }

    /// Run the job through the session's orchestrator.
    pub fn run(mut self) -> Result<ConversionResult, ConversionFailure> {
        let Some(job) = self.job.take() else {
            return Err(Error::ConverterError("job already taken".into()).into());
        };
        let input = job.input_path().to_path_buf();

        self.started = true;
        let outcome = self.session.orchestrator.convert(job);
        self.succeeded = outcome.is_ok();

        if let Ok(result) = &outcome {
            info!(
                "converted {} into {} file(s)",
                input.display(),
                result.len()
            );
        }
        outcome
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        let phase = match (self.started, self.succeeded) {
            (false, _) => Phase::Ready,
            (true, true) => Phase::Succeeded,
            (true, false) => Phase::Failed,
        };
        self.session.release(phase);
    }
}

impl std::fmt::Debug for Reservation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("job", &self.job)
            .field("started", &self.started)
            .finish()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("orchestrator", &self.orchestrator)
            .field("inner", &*self.lock())
            .finish()
    }
}
