//! Play Pleasantly session state machine
//!
//! `Idle -> Loading -> Ready | Failed`, with a completion flag inside `Ready`
//! and an orthogonal minimized display flag. Every slide build is tagged with
//! a [`BuildToken`]; only the result of the latest build is applied.

use std::sync::Arc;

use crate::error::{SessionError, SlideError};
use super::request::{PlaybackRequest, Slide};

/// Monotonically increasing tag identifying one slide build
pub type BuildToken = u64;

#[derive(Clone, Debug)]
pub enum SessionState {
    Idle,
    Loading {
        request: Arc<PlaybackRequest>,
        token: BuildToken,
        /// Slide id to resume at once the rebuild lands
        resume_slide: Option<String>,
    },
    Ready {
        request: Arc<PlaybackRequest>,
        token: BuildToken,
        slides: Arc<Vec<Slide>>,
        current: usize,
        complete: bool,
    },
    Failed {
        request: Arc<PlaybackRequest>,
        error: SessionError,
    },
}

/// Coarse status for rendering
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Everything needed to run one slide build off the session lock
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildJob {
    pub token: BuildToken,
    pub request: Arc<PlaybackRequest>,
    pub reciter_id: u32,
    pub translation_id: Option<u32>,
}

/// Identity of "what should be playing": a build and an index into it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CueKey {
    pub token: BuildToken,
    pub index: usize,
}

/// The slide that should currently be bound to the verse audio
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cue {
    pub key: CueKey,
    pub slide_id: String,
    pub audio_url: Option<String>,
}

/// Outcome of [`PlaybackSession::advance`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    Moved(usize),
    Completed,
    Ignored,
}

#[derive(Clone, Debug)]
pub struct PlaybackSession {
    state: SessionState,
    reciter_id: Option<u32>,
    translation_id: Option<u32>,
    minimized: bool,
    latest_token: BuildToken,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl PlaybackSession {
    pub fn new(reciter_id: Option<u32>, translation_id: Option<u32>) -> Self {
        Self {
            state: SessionState::Idle,
            reciter_id,
            translation_id,
            minimized: false,
            latest_token: 0,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Idle => SessionStatus::Idle,
            SessionState::Loading { .. } => SessionStatus::Loading,
            SessionState::Ready { .. } => SessionStatus::Ready,
            SessionState::Failed { .. } => SessionStatus::Error,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, SessionState::Idle)
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn reciter_id(&self) -> Option<u32> {
        self.reciter_id
    }

    pub fn translation_id(&self) -> Option<u32> {
        self.translation_id
    }

    pub fn request(&self) -> Option<&Arc<PlaybackRequest>> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Loading { request, .. }
            | SessionState::Ready { request, .. }
            | SessionState::Failed { request, .. } => Some(request),
        }
    }

    pub fn error(&self) -> Option<&SessionError> {
        match &self.state {
            SessionState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn slides(&self) -> &[Slide] {
        match &self.state {
            SessionState::Ready { slides, .. } => slides.as_slice(),
            _ => &[],
        }
    }

    pub fn current_index(&self) -> usize {
        match self.state {
            SessionState::Ready { current, .. } => current,
            _ => 0,
        }
    }

    pub fn current_slide(&self) -> Option<&Slide> {
        match &self.state {
            SessionState::Ready { slides, current, .. } => slides.get(*current),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, SessionState::Ready { complete: true, .. })
    }

    /// The slide the verse audio should be bound to, if any.
    pub fn cue(&self) -> Option<Cue> {
        match &self.state {
            SessionState::Ready {
                token,
                slides,
                current,
                ..
            } => slides.get(*current).map(|slide| Cue {
                key: CueKey {
                    token: *token,
                    index: *current,
                },
                slide_id: slide.id.clone(),
                audio_url: slide.audio_url.clone(),
            }),
            _ => None,
        }
    }

    fn next_token(&mut self) -> BuildToken {
        self.latest_token += 1;
        self.latest_token
    }

    /// The build to run for the current `Loading` state, if a reciter is known.
    pub fn pending_job(&self) -> Option<BuildJob> {
        match &self.state {
            SessionState::Loading { request, token, .. } => Some(BuildJob {
                token: *token,
                request: request.clone(),
                reciter_id: self.reciter_id?,
                translation_id: self.translation_id,
            }),
            _ => None,
        }
    }

    /// Begin a new session for `request`.
    ///
    /// Requests without segments are rejected and leave the session untouched.
    pub fn start(&mut self, request: PlaybackRequest) -> Result<Option<BuildJob>, SessionError> {
        if request.segments.is_empty() {
            return Err(SessionError::Configuration);
        }

        let token = self.next_token();
        self.state = SessionState::Loading {
            request: Arc::new(request),
            token,
            resume_slide: None,
        };
        self.minimized = false;
        Ok(self.pending_job())
    }

    /// Apply the result of a slide build. Returns false when the result was
    /// stale (superseded, or the session was closed) and got discarded.
    pub fn finish_build(&mut self, token: BuildToken, result: Result<Vec<Slide>, SlideError>) -> bool {
        let (request, resume_slide) = match &self.state {
            SessionState::Loading {
                request,
                token: expected,
                resume_slide,
            } if *expected == token => (request.clone(), resume_slide.clone()),
            _ => return false,
        };

        self.state = match result {
            Ok(slides) if slides.is_empty() => SessionState::Failed {
                request,
                error: SessionError::EmptyResult,
            },
            Ok(slides) => {
                let current = resume_slide
                    .and_then(|id| slides.iter().position(|s| s.id == id))
                    .unwrap_or(0);
                SessionState::Ready {
                    request,
                    token,
                    slides: Arc::new(slides),
                    current,
                    complete: false,
                }
            }
            Err(err) => SessionState::Failed {
                request,
                error: err.into(),
            },
        };
        true
    }

    /// Fail a session stuck in `Loading` because no reciter is selected, so
    /// no build can ever be issued for it. Returns whether it was failed.
    pub fn fail_unbuildable(&mut self, error: SessionError) -> bool {
        if self.reciter_id.is_some() {
            return false;
        }
        let request = match &self.state {
            SessionState::Loading { request, .. } => request.clone(),
            _ => return false,
        };
        self.next_token();
        self.state = SessionState::Failed { request, error };
        true
    }

    /// Select a reciter. Rebuilds (keeping position) when a session is loading
    /// or ready.
    pub fn change_reciter(&mut self, reciter_id: u32) -> Option<BuildJob> {
        if self.reciter_id == Some(reciter_id) {
            return None;
        }
        self.reciter_id = Some(reciter_id);
        self.rebuild_preserving_position()
    }

    /// Select a translation. Rebuilds (keeping position) when a session is
    /// loading or ready.
    pub fn change_translation(&mut self, translation_id: u32) -> Option<BuildJob> {
        if self.translation_id == Some(translation_id) {
            return None;
        }
        self.translation_id = Some(translation_id);
        self.rebuild_preserving_position()
    }

    fn rebuild_preserving_position(&mut self) -> Option<BuildJob> {
        let (request, resume_slide) = match &self.state {
            SessionState::Loading {
                request,
                resume_slide,
                ..
            } => (request.clone(), resume_slide.clone()),
            SessionState::Ready {
                request,
                slides,
                current,
                ..
            } => (request.clone(), slides.get(*current).map(|s| s.id.clone())),
            SessionState::Idle | SessionState::Failed { .. } => return None,
        };

        let token = self.next_token();
        self.state = SessionState::Loading {
            request,
            token,
            resume_slide,
        };
        self.pending_job()
    }

    pub fn advance(&mut self) -> Advance {
        match &mut self.state {
            SessionState::Ready {
                slides,
                current,
                complete,
                ..
            } => {
                if *current + 1 >= slides.len() {
                    *complete = true;
                    Advance::Completed
                } else {
                    *current += 1;
                    *complete = false;
                    Advance::Moved(*current)
                }
            }
            _ => Advance::Ignored,
        }
    }

    /// Step back one slide. `None` at the first slide or outside `Ready`.
    pub fn retreat(&mut self) -> Option<usize> {
        match &mut self.state {
            SessionState::Ready {
                current, complete, ..
            } if *current > 0 => {
                *current -= 1;
                *complete = false;
                Some(*current)
            }
            _ => None,
        }
    }

    /// Jump to `index`, clamped to the slide range.
    pub fn jump_to(&mut self, index: usize) -> Option<usize> {
        match &mut self.state {
            SessionState::Ready {
                slides,
                current,
                complete,
                ..
            } => {
                let target = index.min(slides.len().saturating_sub(1));
                if target != *current {
                    *current = target;
                    *complete = false;
                }
                Some(target)
            }
            _ => None,
        }
    }

    /// Back to idle, keeping only the reciter and translation selections.
    pub fn close(&mut self) {
        self.next_token();
        self.state = SessionState::Idle;
        self.minimized = false;
    }

    pub fn minimize(&mut self) {
        if self.is_active() {
            self.minimized = true;
        }
    }

    pub fn expand(&mut self) {
        self.minimized = false;
    }
}
