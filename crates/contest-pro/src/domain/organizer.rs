use std::sync::Arc;

use contest_pro_core::{
    to_minor_units, validate_title, DeleteResult, InsertResult, PaymentIntentResponse,
    UpdateResult,
};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    Caller, Contest, ContestFilter, ContestStore, ContestSummary, Creator, Error, NewContest,
    NewParticipation, Participation, ParticipationQuery, ParticipationStore,
};
use crate::infra::payments::{PaymentGateway, PaymentIntentRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParticipationListing {
    Summaries(Vec<ContestSummary>),
    Entries(Vec<Participation>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationStats {
    pub total_participants: usize,
    pub total_winners: usize,
    pub participants: Vec<Participation>,
    pub winners: Vec<Participation>,
}

/// Runs contests from submission to winner: listings, approvals, entries and entry fee payments
pub struct Organizer {
    contest_store: ContestStore,
    participation_store: ParticipationStore,
    payments: Arc<dyn PaymentGateway>,
    currency: String,
}

impl Organizer {
    pub fn new(
        contest_store: ContestStore,
        participation_store: ParticipationStore,
        payments: Arc<dyn PaymentGateway>,
        currency: String,
    ) -> Self {
        Self {
            contest_store,
            participation_store,
            payments,
            currency,
        }
    }

    pub async fn ping(&self) -> Result<(), Error> {
        self.contest_store.ping().await?;
        self.participation_store.ping().await?;
        Ok(())
    }

    pub async fn list_contests(&self, filter: ContestFilter) -> Result<Vec<Contest>, Error> {
        debug!("listing contests with {:?}", filter);
        self.contest_store.list(&filter).await
    }

    pub async fn get_contest(&self, id: Uuid) -> Result<Contest, Error> {
        self.contest_store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("contest {}", id)))
    }

    /// The creator is always the caller, only their display name and image come from the payload
    pub async fn create_contest(
        &self,
        caller_email: &str,
        new_contest: NewContest,
    ) -> Result<InsertResult, Error> {
        validate_title(&new_contest.title)?;
        let creator = match &new_contest.creator {
            Some(creator) => Creator {
                email: caller_email.to_string(),
                name: creator.name.clone(),
                image: creator.image.clone(),
            },
            None => Creator {
                email: caller_email.to_string(),
                name: None,
                image: None,
            },
        };

        let contest = Contest::pending(new_contest, creator);
        let id = self.contest_store.insert(contest).await?;
        info!("contest {} submitted by {}", id, caller_email);
        Ok(InsertResult::inserted(id))
    }

    /// Returns true when the contest went from pending to approved
    pub async fn approve_contest(&self, id: Uuid) -> Result<bool, Error> {
        let approved = self.contest_store.approve(id).await?;
        if approved {
            info!("contest {} approved", id);
        } else {
            warn!("contest {} was not pending or does not exist", id);
        }
        Ok(approved)
    }

    pub async fn delete_contest(&self, caller: &Caller, id: Uuid) -> Result<DeleteResult, Error> {
        let Some(contest) = self.contest_store.get(id).await? else {
            return Ok(DeleteResult::new(0));
        };

        if !caller.is_admin() && contest.creator.email != caller.email {
            warn!("{} tried to delete contest {}", caller.email, id);
            return Err(Error::Forbidden);
        }

        let deleted = self.contest_store.delete(id).await?;
        info!("contest {} deleted by {}", id, caller.email);
        Ok(DeleteResult::new(deleted))
    }

    pub async fn list_participations(
        &self,
        query: ParticipationQuery,
    ) -> Result<ParticipationListing, Error> {
        match query {
            ParticipationQuery::ByCreator(email) => self
                .participation_store
                .summaries_by_creator(&email)
                .await
                .map(ParticipationListing::Summaries),
            ParticipationQuery::ByParticipant {
                email,
                winners_only,
            } => self
                .participation_store
                .list_by_participant(&email, winners_only)
                .await
                .map(ParticipationListing::Entries),
        }
    }

    pub async fn my_participations(&self, email: &str) -> Result<Vec<Participation>, Error> {
        self.participation_store
            .list_by_participant(email, false)
            .await
    }

    pub async fn participation_stats(&self) -> Result<ParticipationStats, Error> {
        let participants = self.participation_store.list_all().await?;
        let winners: Vec<Participation> = participants
            .iter()
            .filter(|p| p.is_winner)
            .cloned()
            .collect();

        Ok(ParticipationStats {
            total_participants: participants.len(),
            total_winners: winners.len(),
            participants,
            winners,
        })
    }

    pub async fn add_participation(
        &self,
        caller_email: &str,
        new_participation: NewParticipation,
    ) -> Result<InsertResult, Error> {
        let contest_id = Uuid::parse_str(&new_participation.contest_id).map_err(|_| {
            Error::BadRequest(format!(
                "invalid contest id: {}",
                new_participation.contest_id
            ))
        })?;
        let contest = self.get_contest(contest_id).await?;

        let participation =
            Participation::entry(new_participation, &contest, caller_email.to_string());
        let id = self.participation_store.insert(participation).await?;
        info!("participation {} recorded for {}", id, caller_email);
        Ok(InsertResult::inserted(id))
    }

    /// Declares the entry the winner of its contest. Only the contest creator or an admin may do so,
    /// and a contest title never gets a second winner.
    pub async fn declare_winner(&self, caller: &Caller, id: Uuid) -> Result<UpdateResult, Error> {
        let participation = self
            .participation_store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("participation {}", id)))?;

        if !caller.is_admin() && participation.creator_email != caller.email {
            warn!(
                "{} tried to pick the winner of {}",
                caller.email, participation.contest_title
            );
            return Err(Error::Forbidden);
        }

        if !self.participation_store.mark_winner(id).await? {
            debug!(
                "contest {} already has a winner, {} not marked",
                participation.contest_title, id
            );
            return Err(Error::WinnerAlreadyDeclared);
        }

        info!(
            "participation {} declared winner of {}",
            id, participation.contest_title
        );
        Ok(UpdateResult::new(1, 1))
    }

    pub async fn create_payment_intent(&self, price: f64) -> Result<PaymentIntentResponse, Error> {
        let amount = to_minor_units(price);
        let intent = self
            .payments
            .create_payment_intent(PaymentIntentRequest::card(amount, self.currency.clone()))
            .await
            .map_err(|e| {
                error!("failed to create payment intent for {}: {}", amount, e);
                Error::Payment(e)
            })?;

        debug!("payment intent {} created", intent.id);
        Ok(PaymentIntentResponse {
            client_secret: intent.client_secret,
        })
    }
}
