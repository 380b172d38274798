use super::{print_json, Context};
use anyhow::{anyhow, Result};
use clap::Subcommand;
use njangi_core::model::{ActivityStream, Policy};

#[derive(Subcommand)]
pub enum ReportCommand {
    /// Show the current policy
    Policy,
    /// Change policy values; omitted values are kept
    SetPolicy {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        registration_fee: Option<u64>,
        #[arg(long)]
        multiplier: Option<u32>,
        #[arg(long)]
        minimum: Option<u64>,
        #[arg(long)]
        threshold: Option<u64>,
    },
    /// Association-wide totals
    Totals,
    /// Activity entries of one stream (admin, contributions, loans)
    Activity {
        stream: String,
        /// Only entries about this member (across all streams)
        #[arg(long)]
        member: Option<String>,
    },
    /// Clear one activity stream
    ClearActivity { stream: String },
}

pub async fn run(ctx: &Context, cmd: ReportCommand) -> Result<()> {
    let association = &ctx.association;
    match cmd {
        ReportCommand::Policy => print_json(&association.policy().await),
        ReportCommand::SetPolicy { name, registration_fee, multiplier, minimum, threshold } => {
            let current = association.policy().await;
            let policy = Policy {
                association_name: name.unwrap_or(current.association_name),
                registration_fee: registration_fee.unwrap_or(current.registration_fee),
                max_loan_multiplier: multiplier.unwrap_or(current.max_loan_multiplier),
                minimum_contribution_amount: minimum.unwrap_or(current.minimum_contribution_amount),
                loan_eligibility_threshold: threshold.unwrap_or(current.loan_eligibility_threshold),
            };
            let (policy, changed) = association.update_policy(policy, &ctx.actor).await?;
            print_json(&policy)?;
            println!("{} members changed eligibility", changed);
            Ok(())
        }
        ReportCommand::Totals => print_json(&association.totals().await?),
        ReportCommand::Activity { stream, member } => {
            let entries = match member {
                Some(member) => {
                    let member = ctx.member(&member).await?;
                    association.activity().for_member(&member.id).await?
                }
                None => association.activity().entries(parse_stream(&stream)?).await?,
            };
            for entry in entries {
                println!(
                    "{}  {:<22} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.kind,
                    entry.text
                );
            }
            Ok(())
        }
        ReportCommand::ClearActivity { stream } => {
            let removed = association.activity().clear(parse_stream(&stream)?, &ctx.actor).await?;
            println!("Cleared {} entries", removed);
            Ok(())
        }
    }
}

fn parse_stream(value: &str) -> Result<ActivityStream> {
    value.parse::<ActivityStream>().map_err(|e| anyhow!(e))
}
