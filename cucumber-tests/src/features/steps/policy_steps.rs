use crate::features::world::NjangiWorld;
use cucumber::{then, when};
use njangi_core::model::Policy;

#[when(expr = "the treasurer lowers the loan eligibility threshold to {int} XAF")]
async fn lower_threshold(world: &mut NjangiWorld, threshold: u64) {
    let policy = Policy { loan_eligibility_threshold: threshold, ..world.association.policy().await };
    let result = world.association.update_policy(policy, &world.admin).await;
    world.record(result);
}

#[when(expr = "the treasurer sets the maximum loan multiplier to {int}")]
async fn set_multiplier(world: &mut NjangiWorld, multiplier: u32) {
    let policy = Policy { max_loan_multiplier: multiplier, ..world.association.policy().await };
    let result = world.association.update_policy(policy, &world.admin).await;
    world.record(result);
}

#[then(expr = "the association is named {string}")]
async fn association_name(world: &mut NjangiWorld, name: String) {
    assert_eq!(world.association.policy().await.association_name, name);
}

#[then(expr = "the loan eligibility threshold is {int} XAF")]
async fn threshold_is(world: &mut NjangiWorld, expected: u64) {
    assert_eq!(world.association.policy().await.loan_eligibility_threshold, expected);
}

#[then(expr = "the association holds {int} XAF in contributions")]
async fn association_total(world: &mut NjangiWorld, expected: u64) {
    let totals = world.association.totals().await.expect("totals");
    assert_eq!(totals.total_contributions, expected);
}
