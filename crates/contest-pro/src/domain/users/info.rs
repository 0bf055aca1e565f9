use std::sync::Arc;

use contest_pro_core::{validate_email, DeleteResult, InsertResult, Role, UpdateResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{NewUser, User, UserRole, UserStore};
use crate::domain::Error;

/// The authenticated identity behind a request, with the role currently stored for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub email: String,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingUser {
    pub message: String,
    pub inserted_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegisterResponse {
    Inserted(InsertResult),
    Exists(ExistingUser),
}

pub struct UserInfo {
    user_store: Arc<UserStore>,
}

impl UserInfo {
    pub fn new(user_store: UserStore) -> Self {
        Self {
            user_store: Arc::new(user_store),
        }
    }

    pub async fn ping(&self) -> Result<(), Error> {
        Ok(self.user_store.ping().await?)
    }

    pub async fn register(&self, user: NewUser) -> Result<RegisterResponse, Error> {
        validate_email(&user.email)?;
        let email = user.email.clone();

        match self.user_store.insert_if_absent(user).await? {
            Some(id) => {
                info!("registered user {}", email);
                Ok(RegisterResponse::Inserted(InsertResult::inserted(id)))
            }
            None => {
                debug!("user {} already registered", email);
                Ok(RegisterResponse::Exists(ExistingUser {
                    message: String::from("User already exists"),
                    inserted_id: None,
                }))
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<User>, Error> {
        self.user_store.list().await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.user_store.get_by_email(email).await
    }

    pub async fn role_of(&self, email: &str) -> Result<Option<UserRole>, Error> {
        Ok(self
            .user_store
            .get_by_email(email)
            .await?
            .map(|user| UserRole {
                id: user.id,
                role: user.role,
            }))
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<DeleteResult, Error> {
        let deleted = self.user_store.delete(id).await?;
        info!("deleted user {} (rows: {})", id, deleted);
        Ok(DeleteResult::new(deleted))
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<UpdateResult, Error> {
        let (matched, modified) = self.user_store.set_role(id, role).await?;
        info!("set role of user {} to {} (matched: {})", id, role, matched);
        Ok(UpdateResult::new(matched, modified))
    }

    /// Unknown emails resolve to a plain user so they pass no privileged checks
    pub async fn caller(&self, email: &str) -> Result<Caller, Error> {
        let role = self
            .user_store
            .get_by_email(email)
            .await?
            .map(|user| user.role)
            .unwrap_or_default();
        Ok(Caller {
            email: email.to_string(),
            role,
        })
    }

    pub async fn require_admin(&self, email: &str) -> Result<Caller, Error> {
        let caller = self.caller(email).await?;
        if caller.is_admin() {
            Ok(caller)
        } else {
            debug!("{} is not an admin", email);
            Err(Error::Forbidden)
        }
    }
}
