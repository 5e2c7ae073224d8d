use serde::{Deserialize, Serialize};

/// Lifecycle of the current search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEvent {
    SubmitSearch,
    SourceSucceeded,
    SourceFailed,
    ChangeFilters,
}

impl SearchPhase {
    /// Phase reached by applying `event`, or an error if the event is not
    /// accepted in this phase.
    ///
    /// A search submitted while another is still running supersedes it.
    pub fn next(self, event: SearchEvent) -> Result<SearchPhase, SearchError> {
        use SearchEvent::*;
        use SearchPhase::*;

        match (self, event) {
            (Idle | Searching | Ready, SubmitSearch) => Ok(Searching),
            (Searching, SourceSucceeded | SourceFailed) => Ok(Ready),
            (Ready, ChangeFilters) => Ok(Ready),
            (from, event) => Err(SearchError::InvalidTransition { from, event }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid state transition: {event:?} is not accepted while {from:?}")]
    InvalidTransition {
        from: SearchPhase,
        event: SearchEvent,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_lifecycle() {
        let phase = SearchPhase::Idle;

        let phase = phase.next(SearchEvent::SubmitSearch).unwrap();
        assert_eq!(phase, SearchPhase::Searching);

        let phase = phase.next(SearchEvent::SourceSucceeded).unwrap();
        assert_eq!(phase, SearchPhase::Ready);

        let phase = phase.next(SearchEvent::ChangeFilters).unwrap();
        assert_eq!(phase, SearchPhase::Ready);

        assert_eq!(phase.next(SearchEvent::SubmitSearch).unwrap(), SearchPhase::Searching);
        assert_eq!(
            SearchPhase::Searching.next(SearchEvent::SourceFailed).unwrap(),
            SearchPhase::Ready
        );
    }

    #[test]
    fn test_invalid_transition() {
        // Filters only apply to a finished search
        assert!(SearchPhase::Idle.next(SearchEvent::ChangeFilters).is_err());
        assert!(SearchPhase::Searching.next(SearchEvent::ChangeFilters).is_err());

        // Source results without a running search
        let err = SearchPhase::Ready.next(SearchEvent::SourceSucceeded).unwrap_err();
        assert_eq!(
            err,
            SearchError::InvalidTransition { from: SearchPhase::Ready, event: SearchEvent::SourceSucceeded }
        );
        assert!(SearchPhase::Idle.next(SearchEvent::SourceFailed).is_err());
    }
}
