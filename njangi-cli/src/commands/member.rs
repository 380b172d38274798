use super::{print_json, Context};
use anyhow::Result;
use clap::Subcommand;
use njangi_core::model::{NewMember, Role};

#[derive(Subcommand)]
pub enum MemberCommand {
    /// Register a new member
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        /// Register as an administrator
        #[arg(long)]
        admin: bool,
    },
    /// List all members
    List,
    /// Balance, eligibility and loan position of one member
    Show { member: String },
    /// Grant or withdraw loan eligibility
    Eligibility {
        member: String,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Reactivate an account
    Activate { member: String },
    /// Deactivate an account
    Deactivate { member: String },
    /// Remove a member with their contributions and loan requests
    Remove { member: String },
}

pub async fn run(ctx: &Context, cmd: MemberCommand) -> Result<()> {
    let association = &ctx.association;
    match cmd {
        MemberCommand::Register { name, email, phone, admin } => {
            let role = if admin { Role::Admin } else { Role::Member };
            let member = association
                .register_member(NewMember::new(name, email, phone).with_role(role), &ctx.actor)
                .await?;
            print_json(&member)
        }
        MemberCommand::List => {
            for member in association.members().await? {
                println!(
                    "{}  {:<24} {:<28} {:>12} XAF  {}{}",
                    member.id,
                    member.name,
                    member.email,
                    member.total_contributions,
                    member.role,
                    if member.is_active { "" } else { " (inactive)" }
                );
            }
            Ok(())
        }
        MemberCommand::Show { member } => {
            let member = ctx.member(&member).await?;
            print_json(&association.member_summary(&member.id).await?)
        }
        MemberCommand::Eligibility { member, enabled } => {
            let member = ctx.member(&member).await?;
            print_json(&association.set_loan_eligibility(&member.id, enabled, &ctx.actor).await?)
        }
        MemberCommand::Activate { member } => {
            let member = ctx.member(&member).await?;
            print_json(&association.set_active(&member.id, true, &ctx.actor).await?)
        }
        MemberCommand::Deactivate { member } => {
            let member = ctx.member(&member).await?;
            print_json(&association.set_active(&member.id, false, &ctx.actor).await?)
        }
        MemberCommand::Remove { member } => {
            let member = ctx.member(&member).await?;
            let removed = association.remove_member(&member.id, &ctx.actor).await?;
            println!(
                "Removed {} ({} contributions, {} loan requests)",
                removed.member.name, removed.contributions_removed, removed.loans_removed
            );
            Ok(())
        }
    }
}
