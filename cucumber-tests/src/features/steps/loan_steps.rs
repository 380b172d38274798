use crate::features::world::NjangiWorld;
use cucumber::{given, then, when};
use njangi_core::model::Actor;

#[given(expr = "{string} has contributed {int} XAF")]
async fn has_contributed(world: &mut NjangiWorld, name: String, amount: u64) {
    let member_id = world.member_id(&name);
    world
        .association
        .contributions()
        .add(&member_id, amount, "Savings", &world.admin)
        .await
        .expect("contribution failed");
}

#[when(expr = "{string} requests a loan of {int} XAF for {string}")]
async fn request_loan(world: &mut NjangiWorld, name: String, amount: u64, purpose: String) {
    let member_id = world.member_id(&name);
    let result = world.association.loans().request(&member_id, amount, &purpose).await;
    if let Some(loan) = world.record(result) {
        world.last_loan = Some(loan);
    }
}

#[when("the treasurer approves the loan request")]
async fn approve(world: &mut NjangiWorld) {
    let id = world.loan_id();
    let result = world.association.loans().approve(&id, &world.admin).await;
    world.record(result);
}

#[when("the treasurer rejects the loan request")]
async fn reject(world: &mut NjangiWorld) {
    let id = world.loan_id();
    let result = world.association.loans().reject(&id, &world.admin).await;
    world.record(result);
}

#[when(expr = "{string} tries to approve the loan request")]
async fn member_approves(world: &mut NjangiWorld, name: String) {
    let actor = Actor::from(&world.member(&name).await);
    let id = world.loan_id();
    let result = world.association.loans().approve(&id, &actor).await;
    world.record(result);
}

#[given(expr = "the treasurer withdrew loan eligibility for {string}")]
async fn withdraw_eligibility(world: &mut NjangiWorld, name: String) {
    let member_id = world.member_id(&name);
    world
        .association
        .set_loan_eligibility(&member_id, false, &world.admin)
        .await
        .expect("toggle failed");
}

#[then(expr = "{string} can apply for a loan")]
async fn can_apply(world: &mut NjangiWorld, name: String) {
    assert!(world.member(&name).await.can_apply_for_loan);
}

#[then(expr = "{string} cannot apply for a loan")]
async fn cannot_apply(world: &mut NjangiWorld, name: String) {
    assert!(!world.member(&name).await.can_apply_for_loan);
}

#[then(expr = "the maximum loan for {string} is {int} XAF")]
async fn max_loan(world: &mut NjangiWorld, name: String, expected: u64) {
    let member_id = world.member_id(&name);
    let summary = world.association.member_summary(&member_id).await.expect("summary");
    assert_eq!(summary.eligibility.max_loan_amount, expected);
}

#[then(expr = "the loan request is {word}")]
async fn loan_status(world: &mut NjangiWorld, status: String) {
    let loan = world.association.loans().get(&world.loan_id()).await.expect("loan");
    assert_eq!(loan.status.to_string(), status);
}

#[then(expr = "the loan request was processed by {string}")]
async fn processed_by(world: &mut NjangiWorld, email: String) {
    let loan = world.association.loans().get(&world.loan_id()).await.expect("loan");
    assert_eq!(loan.processed_by.as_deref(), Some(email.as_str()));
    assert!(loan.processed_date.is_some());
}

#[then(expr = "the violated limit is {int} XAF")]
async fn violated_limit(world: &mut NjangiWorld, expected: u64) {
    let err = world.last_error.as_ref().expect("the operation succeeded");
    let violation = err.violation().expect("not a policy violation");
    assert_eq!(violation.threshold(), Some(expected));
}
