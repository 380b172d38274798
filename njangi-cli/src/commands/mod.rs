pub mod contribution;
pub mod loan;
pub mod member;
pub mod report;

use anyhow::{bail, Result};
use njangi_core::config::NjangiConfig;
use njangi_core::model::{Actor, Member};
use njangi_core::{Association, LedgerError};
use serde::Serialize;

/// Everything a command needs: the association and who is acting
pub struct Context {
    pub association: Association,
    pub actor: Actor,
}

impl Context {
    pub async fn open(config: &NjangiConfig, acting_as: Option<&str>) -> Result<Self> {
        let association = Association::from_config(config)?;
        Self::with_association(association, acting_as).await
    }

    pub async fn with_association(association: Association, acting_as: Option<&str>) -> Result<Self> {
        let actor = match acting_as {
            Some(who) => Actor::from(&resolve_member(&association, who).await?),
            None => Actor::system(),
        };
        Ok(Self { association, actor })
    }

    pub async fn member(&self, who: &str) -> Result<Member> {
        resolve_member(&self.association, who).await
    }
}

/// Look a member up by id, falling back to email
pub async fn resolve_member(association: &Association, who: &str) -> Result<Member> {
    match association.member(who).await {
        Ok(member) => return Ok(member),
        Err(LedgerError::NotFound { .. }) => {}
        Err(e) => return Err(e.into()),
    }
    match association.member_by_email(who).await? {
        Some(member) => Ok(member),
        None => bail!("no member with id or email {}", who),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
