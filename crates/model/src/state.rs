//! Application state machine.
//!
//! The front end owns exactly one [`Studio`]. Every screen change goes
//! through it, and the in-flight [`PolaroidRecord`] lives only inside the
//! `Previewing` state.
//!
//! ```text
//!            open_camera            accept_capture
//!   Idle ─────────────────▶ Capturing ───────────────▶ Previewing
//!    ▲  ◀───────────────────   │ ▲                        │  ▲
//!    │      close_camera       │ │ camera_failed /        │  │ accept_upload
//!    │                         └─┘ retry_camera           │  │
//!    └──────────────────────── reset ◀────────────────────┘──┘
//!    └───────────── accept_upload ───────────────────────▶
//! ```

use std::time::{Duration, Instant};

use polaroid_common::error::{PolaroidError, PolaroidResult};

use crate::still::{CapturedImage, Facing};
use crate::record::PolaroidRecord;

/// Coarse screen identifier, handy for logs and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Idle,
    Capturing,
    Previewing,
}

/// Full application state.
#[derive(Debug, Clone)]
pub enum AppState {
    /// Nothing selected yet.
    Idle,
    /// The camera is requested or live. `error` holds the user-facing
    /// message when opening it failed.
    Capturing {
        facing: Facing,
        error: Option<String>,
    },
    /// A polaroid is on screen.
    Previewing(Preview),
}

/// Payload of the `Previewing` state.
#[derive(Debug, Clone)]
pub struct Preview {
    pub record: PolaroidRecord,
    /// Distinguishes this preview from earlier ones so late caption
    /// results can be recognized and dropped.
    pub session: u64,
    /// The film-developing animation runs until this instant.
    pub developing_until: Instant,
    /// A caption request is in flight.
    pub caption_pending: bool,
}

/// Proof that a caption request was started for a particular preview.
#[derive(Debug, Clone)]
pub struct CaptionTicket {
    session: u64,
    image: CapturedImage,
}

impl CaptionTicket {
    pub fn image(&self) -> &CapturedImage {
        &self.image
    }

    pub fn session(&self) -> u64 {
        self.session
    }
}

/// Single owner of the application state.
#[derive(Debug)]
pub struct Studio {
    state: AppState,
    next_session: u64,
    developing: Duration,
}

impl Studio {
    /// Create a studio whose previews "develop" for `developing`.
    pub fn new(developing: Duration) -> Self {
        Self {
            state: AppState::Idle,
            next_session: 1,
            developing,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn screen(&self) -> Screen {
        match self.state {
            AppState::Idle => Screen::Idle,
            AppState::Capturing { .. } => Screen::Capturing,
            AppState::Previewing(_) => Screen::Previewing,
        }
    }

    /// Idle → Capturing.
    pub fn open_camera(&mut self, facing: Facing) -> PolaroidResult<()> {
        match self.state {
            AppState::Idle => {
                self.transition(AppState::Capturing {
                    facing,
                    error: None,
                });
                Ok(())
            }
            _ => Err(self.rejected("open the camera")),
        }
    }

    /// Capturing → Idle.
    pub fn close_camera(&mut self) -> PolaroidResult<()> {
        match self.state {
            AppState::Capturing { .. } => {
                self.transition(AppState::Idle);
                Ok(())
            }
            _ => Err(self.rejected("close the camera")),
        }
    }

    /// Record that the camera could not be opened. The studio stays in
    /// `Capturing` and shows the error until the user retries or closes.
    pub fn camera_failed(&mut self, err: &PolaroidError) -> PolaroidResult<()> {
        match &mut self.state {
            AppState::Capturing { error, .. } => {
                tracing::warn!(error = %err, "Camera could not be opened");
                *error = Some(err.user_message());
                Ok(())
            }
            _ => Err(self.rejected("report a camera failure")),
        }
    }

    /// Clear a camera error so the front end can try opening again.
    pub fn retry_camera(&mut self) -> PolaroidResult<Facing> {
        match &mut self.state {
            AppState::Capturing { facing, error } => {
                *error = None;
                Ok(*facing)
            }
            _ => Err(self.rejected("retry the camera")),
        }
    }

    /// The camera error currently displayed, if any.
    pub fn camera_error(&self) -> Option<&str> {
        match &self.state {
            AppState::Capturing { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    /// Capturing → Previewing with a freshly captured frame.
    pub fn accept_capture(
        &mut self,
        image: CapturedImage,
        date: impl Into<String>,
        now: Instant,
    ) -> PolaroidResult<&PolaroidRecord> {
        match self.state {
            AppState::Capturing { error: None, .. } => {}
            AppState::Capturing { error: Some(_), .. } => {
                return Err(PolaroidError::invalid_state(
                    "cannot accept a capture while the camera is unavailable",
                ))
            }
            _ => return Err(self.rejected("accept a capture")),
        }
        self.start_preview(image, date, now);
        self.current_record()
    }

    /// Idle or Previewing → Previewing with an uploaded file.
    pub fn accept_upload(
        &mut self,
        image: CapturedImage,
        date: impl Into<String>,
        now: Instant,
    ) -> PolaroidResult<&PolaroidRecord> {
        if let AppState::Capturing { .. } = self.state {
            return Err(self.rejected("accept an upload"));
        }
        self.start_preview(image, date, now);
        self.current_record()
    }

    /// Replace the caption of the current record.
    pub fn edit_caption(&mut self, caption: impl Into<String>) -> PolaroidResult<()> {
        match &mut self.state {
            AppState::Previewing(preview) => {
                preview.record.set_caption(caption);
                Ok(())
            }
            _ => Err(self.rejected("edit the caption")),
        }
    }

    /// Mark a caption request as in flight. At most one may be pending.
    pub fn begin_caption_request(&mut self) -> PolaroidResult<CaptionTicket> {
        match &mut self.state {
            AppState::Previewing(preview) if preview.caption_pending => Err(
                PolaroidError::invalid_state("a caption request is already in flight"),
            ),
            AppState::Previewing(preview) => {
                preview.caption_pending = true;
                Ok(CaptionTicket {
                    session: preview.session,
                    image: preview.record.image().clone(),
                })
            }
            _ => Err(self.rejected("request a caption")),
        }
    }

    /// Apply a caption result. Returns `false` when the preview it was
    /// requested for is gone, in which case the text is dropped.
    pub fn finish_caption_request(
        &mut self,
        ticket: CaptionTicket,
        caption: impl Into<String>,
    ) -> bool {
        match &mut self.state {
            AppState::Previewing(preview) if preview.session == ticket.session => {
                preview.record.set_caption(caption);
                preview.caption_pending = false;
                true
            }
            _ => {
                tracing::debug!(session = ticket.session, "Dropping stale caption result");
                false
            }
        }
    }

    /// Forget an in-flight caption request without applying anything.
    pub fn abandon_caption_request(&mut self, ticket: &CaptionTicket) {
        if let AppState::Previewing(preview) = &mut self.state {
            if preview.session == ticket.session {
                preview.caption_pending = false;
            }
        }
    }

    pub fn caption_pending(&self) -> bool {
        matches!(&self.state, AppState::Previewing(p) if p.caption_pending)
    }

    /// Whether the developing animation is still running.
    pub fn is_developing(&self, now: Instant) -> bool {
        matches!(&self.state, AppState::Previewing(p) if now < p.developing_until)
    }

    pub fn record(&self) -> Option<&PolaroidRecord> {
        match &self.state {
            AppState::Previewing(preview) => Some(&preview.record),
            _ => None,
        }
    }

    /// Discard whatever is on screen and go back to Idle.
    pub fn reset(&mut self) {
        self.transition(AppState::Idle);
    }

    fn start_preview(&mut self, image: CapturedImage, date: impl Into<String>, now: Instant) {
        let session = self.next_session;
        self.next_session += 1;
        self.transition(AppState::Previewing(Preview {
            record: PolaroidRecord::new(image, date),
            session,
            developing_until: now + self.developing,
            caption_pending: false,
        }));
    }

    fn current_record(&self) -> PolaroidResult<&PolaroidRecord> {
        self.record()
            .ok_or_else(|| PolaroidError::invalid_state("no polaroid is being previewed"))
    }

    fn transition(&mut self, next: AppState) {
        let from = self.screen();
        self.state = next;
        tracing::debug!(?from, to = ?self.screen(), "Studio transition");
    }

    fn rejected(&self, action: &str) -> PolaroidError {
        PolaroidError::invalid_state(format!("cannot {action} while {:?}", self.screen()))
    }
}

impl Default for Studio {
    fn default() -> Self {
        Self::new(Duration::from_millis(2_500))
    }
}
