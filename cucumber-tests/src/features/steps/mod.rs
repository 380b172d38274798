pub mod contribution_steps;
pub mod loan_steps;
pub mod policy_steps;
