use crate::layout::OverlayLayoutEngine;
use crate::model::Artwork;

/// Identifies one recommendation request. Only the newest ticket issued by a
/// [`RequestTracker`] is current.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Hands out request generations so a slow response to a superseded request
/// can be recognised and dropped. Requests are never aborted, only ignored.
#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn begin(&mut self) -> RequestTicket {
        self.latest += 1;
        RequestTicket(self.latest)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Invalidates every outstanding ticket without starting a new request.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}

/// Where the room picture behind the overlay comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum RoomImage {
    Uploaded { bytes: Vec<u8>, name: String },
    /// Preference searches have no photo; a stock room is shown instead.
    Mock,
}

/// Everything that belongs to one set of results. Dropped as a whole when
/// the user goes back to the options view.
#[derive(Clone, Debug)]
pub struct ResultsSession {
    artworks: Vec<Artwork>,
    current_index: usize,
    pub room: RoomImage,
    pub overlay: OverlayLayoutEngine,
    /// Results came from a preference search and can be refined.
    pub from_preferences: bool,
}

impl ResultsSession {
    /// Returns `None` for an empty result set; that is a "no matches" state,
    /// not a session.
    pub fn new(
        artworks: Vec<Artwork>,
        room: RoomImage,
        overlay: OverlayLayoutEngine,
        from_preferences: bool,
    ) -> Option<Self> {
        if artworks.is_empty() {
            return None;
        }
        Some(Self {
            artworks,
            current_index: 0,
            room,
            overlay,
            from_preferences,
        })
    }

    pub fn artworks(&self) -> &[Artwork] {
        &self.artworks
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> &Artwork {
        &self.artworks[self.current_index]
    }

    /// Makes `index` the shown artwork and prepares the overlay for it.
    /// Re-selecting the current artwork reloads it. Out of range is ignored.
    pub fn select(&mut self, index: usize) -> Option<&Artwork> {
        if index >= self.artworks.len() {
            log::warn!(
                "Ignoring selection {index}, only {} artworks",
                self.artworks.len()
            );
            return None;
        }
        self.current_index = index;
        let hint = self.artworks[index].catalog_aspect_ratio();
        self.overlay.begin_artwork(hint);
        Some(&self.artworks[index])
    }

    pub fn filenames(&self) -> Vec<String> {
        self.artworks.iter().map(|a| a.filename.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Vec2;

    fn artworks(n: usize) -> Vec<Artwork> {
        (0..n)
            .map(|i| Artwork {
                filename: format!("art_{i}.jpg"),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_only_latest_ticket_is_current() {
        let mut tracker = RequestTracker::default();
        let first = tracker.begin();
        let second = tracker.begin();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        tracker.invalidate();
        assert!(!tracker.is_current(second));
    }

    #[test]
    fn test_empty_results_make_no_session() {
        let overlay = OverlayLayoutEngine::new(0.4, 50.0);
        assert!(ResultsSession::new(vec![], RoomImage::Mock, overlay, false).is_none());
    }

    #[test]
    fn test_select_bounds_and_overlay_state() {
        let mut overlay = OverlayLayoutEngine::new(0.4, 50.0);
        overlay.set_container(Vec2::new(800.0, 600.0));
        let mut session = ResultsSession::new(artworks(3), RoomImage::Mock, overlay, true).unwrap();
        session.overlay.on_image_loaded(Vec2::new(400.0, 300.0));
        session.overlay.on_user_drag(Vec2::new(5.0, 5.0));

        assert!(session.select(7).is_none());
        assert_eq!(session.current_index(), 0);

        assert_eq!(session.select(2).unwrap().filename, "art_2.jpg");
        assert_eq!(session.current().filename, "art_2.jpg");
        assert!(!session.overlay.is_visible());
        assert!(session.overlay.is_customized());
        assert_eq!(session.filenames().len(), 3);
    }
}
