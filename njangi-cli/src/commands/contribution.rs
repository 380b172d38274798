use super::{print_json, Context};
use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ContributionCommand {
    /// Record a contribution for a member
    Add {
        member: String,
        amount: u64,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Change the amount and description of a contribution
    Edit {
        id: String,
        amount: u64,
        /// Keeps the current description when omitted
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a contribution
    Delete { id: String },
    /// A member's contributions, oldest first
    List { member: String },
    /// Recompute a member's balance from their contribution records
    Reconcile { member: String },
}

pub async fn run(ctx: &Context, cmd: ContributionCommand) -> Result<()> {
    let ledger = ctx.association.contributions();
    match cmd {
        ContributionCommand::Add { member, amount, description } => {
            let member = ctx.member(&member).await?;
            print_json(&ledger.add(&member.id, amount, &description, &ctx.actor).await?)
        }
        ContributionCommand::Edit { id, amount, description } => {
            let description = match description {
                Some(description) => description,
                None => ledger.get(&id).await?.description,
            };
            print_json(&ledger.edit(&id, amount, &description, &ctx.actor).await?)
        }
        ContributionCommand::Delete { id } => {
            let removed = ledger.delete(&id, &ctx.actor).await?;
            println!("Deleted contribution {} ({} XAF)", removed.id, removed.amount);
            Ok(())
        }
        ContributionCommand::List { member } => {
            let member = ctx.member(&member).await?;
            for c in ledger.for_member(&member.id).await? {
                println!(
                    "{}  {}  {:>12} XAF  {}",
                    c.id,
                    c.created_at.format("%Y-%m-%d"),
                    c.amount,
                    c.description
                );
            }
            println!("Balance: {} XAF", member.total_contributions);
            Ok(())
        }
        ContributionCommand::Reconcile { member } => {
            let member = ctx.member(&member).await?;
            print_json(&ledger.reconcile(&member.id, &ctx.actor).await?)
        }
    }
}
