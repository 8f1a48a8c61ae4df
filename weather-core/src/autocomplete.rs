//! Location search box: query text, suggestion list and highlighted row.
//!
//! The machine is synchronous and does no I/O. Transitions that need a
//! network call hand back a request, and transitions that confirm a place hand
//! back the [`ChosenLocation`] for downstream consumers.

use tracing::debug;

use crate::{ChosenLocation, Suggestion};

/// Queries shorter than this never hit the geocoder.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Query empty or too short; no suggestions.
    #[default]
    Idle,
    /// Query long enough; zero or more suggestions held.
    Suggesting,
    /// A location was confirmed; suggestions cleared.
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A geocoding call the caller must run, keyed by the query it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestRequest {
    pub query: String,
}

#[derive(Debug, Clone, Default)]
pub struct Autocomplete {
    phase: Phase,
    query: String,
    suggestions: Vec<Suggestion>,
    /// `None` means nothing is highlighted.
    selected: Option<usize>,
    chosen: Option<ChosenLocation>,
    /// Set by the first edit; the IP seed is refused after that.
    touched: bool,
}

impl Autocomplete {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The highlighted row as a signed index, `-1` when nothing is highlighted.
    pub fn selection_index(&self) -> isize {
        self.selected.map_or(-1, |i| i as isize)
    }

    pub fn chosen(&self) -> Option<&ChosenLocation> {
        self.chosen.as_ref()
    }

    /// The user edited the search box.
    ///
    /// A previously chosen location stays live until a new one is confirmed.
    pub fn type_query(&mut self, text: impl Into<String>) -> Option<SuggestRequest> {
        self.query = text.into();
        self.touched = true;

        if self.query.chars().count() < MIN_QUERY_CHARS {
            self.clear_list();
            self.phase = Phase::Idle;
            return None;
        }

        self.phase = Phase::Suggesting;
        Some(SuggestRequest {
            query: self.query.clone(),
        })
    }

    /// A geocoding response came back for `for_query`.
    ///
    /// Returns `false` and leaves the list alone when the response is stale,
    /// i.e. the query has moved on or the machine is no longer suggesting.
    pub fn suggestions_arrived(&mut self, for_query: &str, list: Vec<Suggestion>) -> bool {
        if self.phase != Phase::Suggesting || for_query != self.query {
            debug!(
                stale = for_query,
                current = %self.query,
                "dropping stale suggestions"
            );
            return false;
        }

        self.suggestions = list;
        self.selected = None;
        true
    }

    /// Arrow-key navigation. No wraparound; a no-op without suggestions.
    pub fn move_selection(&mut self, direction: Direction) {
        if !self.has_list() {
            return;
        }

        let last = self.suggestions.len() - 1;
        self.selected = Some(match (direction, self.selected) {
            (Direction::Down, None) => 0,
            (Direction::Down, Some(i)) => (i + 1).min(last),
            (Direction::Up, None) => 0,
            (Direction::Up, Some(i)) => i.saturating_sub(1),
        });
    }

    /// Mouse over a row. Out-of-range indices are ignored.
    pub fn hover(&mut self, index: usize) {
        if self.has_list() && index < self.suggestions.len() {
            self.selected = Some(index);
        }
    }

    /// Mouse left the list.
    pub fn hover_clear(&mut self) {
        self.selected = None;
    }

    /// Enter key: confirms the highlighted row, or does nothing if there is none.
    pub fn confirm_selected(&mut self) -> Option<ChosenLocation> {
        let index = self.selected?;
        let suggestion = self.suggestions.get(index)?.clone();
        Some(self.confirm(suggestion))
    }

    /// Click on a row, or any other explicit pick.
    pub fn confirm(&mut self, suggestion: Suggestion) -> ChosenLocation {
        self.query = suggestion.label();
        self.settle(suggestion.into())
    }

    /// Startup location from IP geolocation.
    ///
    /// Only taken before the first edit of the search box and while nothing
    /// has been chosen; a late lookup never overrides user input, even input
    /// that was since cleared.
    pub fn seed_from_ip(&mut self, location: ChosenLocation) -> Option<ChosenLocation> {
        if self.touched || self.chosen.is_some() {
            debug!(location = %location.label(), "ignoring IP location, user already searching");
            return None;
        }

        self.query = location.label();
        Some(self.settle(location))
    }

    fn settle(&mut self, location: ChosenLocation) -> ChosenLocation {
        self.clear_list();
        self.phase = Phase::Confirmed;
        self.chosen = Some(location.clone());
        location
    }

    fn clear_list(&mut self) {
        self.suggestions.clear();
        self.selected = None;
    }

    fn has_list(&self) -> bool {
        self.phase == Phase::Suggesting && !self.suggestions.is_empty()
    }
}
