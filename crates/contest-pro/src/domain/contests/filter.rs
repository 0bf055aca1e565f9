use contest_pro_core::{KNOWN_CONTEST_TYPES, OTHERS_CONTEST_TYPE};
use serde::{Deserialize, Serialize};

/// Raw query parameters of the contest listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestsQuery {
    pub is_pending: Option<String>,
    pub email: Option<String>,
    pub contest_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingFilter {
    Only(bool),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeFilter {
    Any,
    Exactly(String),
    NotIn(Vec<String>),
}

/// Which contests a listing may show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestFilter {
    pub pending: PendingFilter,
    pub creator_email: Option<String>,
    pub contest_type: TypeFilter,
}

impl Default for ContestFilter {
    /// Approved contests of every type
    fn default() -> Self {
        Self {
            pending: PendingFilter::Only(false),
            creator_email: None,
            contest_type: TypeFilter::Any,
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<ContestsQuery> for ContestFilter {
    fn from(query: ContestsQuery) -> Self {
        let mut filter = ContestFilter::default();

        if let Some(is_pending) = present(query.is_pending) {
            filter.pending = PendingFilter::Only(is_pending == "true");
        }

        // A creator sees their own contests whatever their approval state
        if let Some(email) = present(query.email) {
            filter.pending = PendingFilter::Any;
            filter.creator_email = Some(email);
        }

        filter.contest_type = match present(query.contest_type) {
            None => TypeFilter::Any,
            Some(kind) if kind == OTHERS_CONTEST_TYPE => TypeFilter::NotIn(
                KNOWN_CONTEST_TYPES
                    .iter()
                    .map(|known| known.to_string())
                    .collect(),
            ),
            Some(kind) => TypeFilter::Exactly(kind),
        };

        filter
    }
}
