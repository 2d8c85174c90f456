use crate::config::ShowroomConfig;
use crate::error::ApiResult;
use crate::layout::OverlayLayoutEngine;
use crate::model::{Preferences, RecommendationRequest, RecommendationResponse};
use crate::session::{RequestTicket, RequestTracker, ResultsSession, RoomImage};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewState {
    Options,
    Upload,
    Preferences,
    Results,
}

impl ViewState {
    pub fn title(self) -> &'static str {
        match self {
            ViewState::Options => "Find Your Perfect Artwork",
            ViewState::Upload => "Upload Your Room",
            ViewState::Preferences => "Tell Us Your Style",
            ViewState::Results => "Your Virtual Showroom",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            ViewState::Options => "Upload a photo of your room or tell us your preferences",
            ViewState::Upload => "We'll match artwork to the colors of your space",
            ViewState::Preferences => "Pick a style, mood, subject and color palette",
            ViewState::Results => {
                "See how different artworks look in your space. Drag to reposition and resize the artwork overlay."
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
    expires_at: f64,
}

/// What became of a recommendation response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseOutcome {
    Shown,
    NoMatches,
    Failed,
    /// A newer request was issued after this one; nothing changed.
    Stale,
}

/// Screen-level state: which panel is shown, the in-flight request, the
/// uploaded photo and the current results. All transitions go through
/// methods here so the egui layer only renders and forwards events.
#[derive(Debug)]
pub struct ShowroomState {
    config: ShowroomConfig,
    view: ViewState,
    tracker: RequestTracker,
    loading: Option<RequestTicket>,
    pending_room: Option<RoomImage>,
    uploaded: Option<(Vec<u8>, String)>,
    last_preferences: Option<Preferences>,
    session: Option<ResultsSession>,
    status: Option<StatusMessage>,
}

impl ShowroomState {
    pub fn new(config: ShowroomConfig) -> Self {
        Self {
            config,
            view: ViewState::Options,
            tracker: RequestTracker::default(),
            loading: None,
            pending_room: None,
            uploaded: None,
            last_preferences: None,
            session: None,
            status: None,
        }
    }

    pub fn config(&self) -> &ShowroomConfig {
        &self.config
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn session(&self) -> Option<&ResultsSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut ResultsSession> {
        self.session.as_mut()
    }

    pub fn uploaded(&self) -> Option<(&[u8], &str)> {
        self.uploaded
            .as_ref()
            .map(|(bytes, name)| (bytes.as_slice(), name.as_str()))
    }

    pub fn last_preferences(&self) -> Option<&Preferences> {
        self.last_preferences.as_ref()
    }

    pub fn can_refine(&self) -> bool {
        self.view == ViewState::Results
            && self.last_preferences.is_some()
            && self.session.as_ref().map_or(false, |s| s.from_preferences)
    }

    pub fn status(&self, now: f64) -> Option<&StatusMessage> {
        self.status.as_ref().filter(|s| now < s.expires_at)
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>, now: f64) {
        let text = text.into();
        match kind {
            StatusKind::Error => log::warn!("{text}"),
            _ => log::info!("{text}"),
        }
        self.status = Some(StatusMessage {
            kind,
            text,
            expires_at: now + self.config.status_ttl,
        });
    }

    pub fn show_upload(&mut self) {
        self.view = ViewState::Upload;
        self.uploaded = None;
    }

    pub fn show_preferences(&mut self) {
        self.view = ViewState::Preferences;
    }

    /// Leaves whatever is shown and forgets the results, the overlay
    /// customization and any request still in flight.
    pub fn back_to_options(&mut self) {
        self.view = ViewState::Options;
        self.session = None;
        self.uploaded = None;
        self.pending_room = None;
        self.loading = None;
        self.tracker.invalidate();
    }

    /// From results back to the preference form, pre-filled by the caller
    /// from [`Self::last_preferences`].
    pub fn refine(&mut self) -> bool {
        if !self.can_refine() {
            return false;
        }
        self.view = ViewState::Preferences;
        true
    }

    pub fn set_uploaded(&mut self, bytes: Vec<u8>, name: String, now: f64) {
        self.uploaded = Some((bytes, name));
        self.set_status(StatusKind::Success, "Photo uploaded successfully!", now);
    }

    pub fn clear_uploaded(&mut self) {
        self.uploaded = None;
    }

    /// Starts an upload-based search. Returns `None` (with an error status)
    /// when no photo has been chosen.
    pub fn submit_upload(
        &mut self,
        style: Option<String>,
        now: f64,
    ) -> Option<(RequestTicket, RecommendationRequest)> {
        let Some((bytes, name)) = self.uploaded.clone() else {
            self.set_status(StatusKind::Error, "Please upload a room photo first.", now);
            return None;
        };
        let request = RecommendationRequest::Upload {
            room_image: crate::api::encode_data_url(&bytes),
            style,
        };
        Some((self.begin(RoomImage::Uploaded { bytes, name }), request))
    }

    pub fn submit_preferences(
        &mut self,
        preferences: Preferences,
    ) -> (RequestTicket, RecommendationRequest) {
        self.last_preferences = Some(preferences.clone());
        let ticket = self.begin(RoomImage::Mock);
        (ticket, RecommendationRequest::Preferences { preferences })
    }

    fn begin(&mut self, room: RoomImage) -> RequestTicket {
        let ticket = self.tracker.begin();
        self.loading = Some(ticket);
        self.pending_room = Some(room);
        ticket
    }

    /// Applies a response. Every outcome for the current ticket ends the
    /// loading state; stale tickets change nothing.
    pub fn on_recommendations(
        &mut self,
        ticket: RequestTicket,
        result: ApiResult<RecommendationResponse>,
        viewport_width: f32,
        now: f64,
    ) -> ResponseOutcome {
        if !self.tracker.is_current(ticket) {
            log::debug!(
                "Dropping stale response for request {}",
                ticket.generation()
            );
            return ResponseOutcome::Stale;
        }
        self.loading = None;
        let room = self.pending_room.take().unwrap_or(RoomImage::Mock);

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                log::error!("Recommendation error: {err}");
                self.set_status(StatusKind::Error, format!("Error: {err}"), now);
                return ResponseOutcome::Failed;
            }
        };

        log::info!("Received {} recommendations", response.recommendations.len());
        let from_preferences = matches!(room, RoomImage::Mock);
        let mut overlay = OverlayLayoutEngine::new(
            self.config.overlay_fraction_for(viewport_width),
            self.config.min_overlay_size,
        );
        overlay.set_preserve_aspect(!self.config.is_mobile(viewport_width));

        match ResultsSession::new(response.recommendations, room, overlay, from_preferences) {
            Some(mut session) => {
                session.select(0);
                self.session = Some(session);
                self.uploaded = None;
                self.view = ViewState::Results;
                ResponseOutcome::Shown
            }
            None => {
                self.set_status(
                    StatusKind::Info,
                    "No recommendations found. Try different criteria.",
                    now,
                );
                ResponseOutcome::NoMatches
            }
        }
    }
}
