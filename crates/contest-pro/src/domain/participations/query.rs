use serde::{Deserialize, Serialize};

use crate::domain::Error;

/// Raw query parameters of the participation listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantsQuery {
    pub creator: Option<String>,
    pub contest_title: Option<String>,
    pub participant: Option<String>,
    pub winner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipationQuery {
    /// One summary row per contest title among the creator's contests
    ByCreator(String),
    ByParticipant { email: String, winners_only: bool },
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl TryFrom<ParticipantsQuery> for ParticipationQuery {
    type Error = Error;

    /// The first parameter present wins, in the order creator, contest_title, participant
    fn try_from(query: ParticipantsQuery) -> Result<Self, Self::Error> {
        if let Some(creator) = present(query.creator) {
            return Ok(ParticipationQuery::ByCreator(creator));
        }

        // Existing clients send a participant email under contest_title
        if let Some(email) = present(query.contest_title) {
            return Ok(ParticipationQuery::ByParticipant {
                email,
                winners_only: false,
            });
        }

        if let Some(email) = present(query.participant) {
            return Ok(ParticipationQuery::ByParticipant {
                email,
                winners_only: present(query.winner).is_some(),
            });
        }

        Err(Error::NoValidQuery)
    }
}
