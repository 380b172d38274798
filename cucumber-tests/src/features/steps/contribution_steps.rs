use crate::features::world::NjangiWorld;
use cucumber::{given, then, when};
use njangi_core::model::ActivityStream;

#[given(expr = "a member {string}")]
async fn given_member(world: &mut NjangiWorld, name: String) {
    world.register(&name).await;
}

#[given(expr = "the treasurer recorded contribution {string} of {int} XAF for {string}")]
async fn recorded_contribution(world: &mut NjangiWorld, label: String, amount: u64, name: String) {
    add_contribution(world, label, amount, &name).await;
    if let Some(err) = &world.last_error {
        panic!("setup contribution failed: {}", err);
    }
}

#[when(expr = "the treasurer records contribution {string} of {int} XAF for {string}")]
async fn record_contribution(world: &mut NjangiWorld, label: String, amount: u64, name: String) {
    add_contribution(world, label, amount, &name).await;
}

async fn add_contribution(world: &mut NjangiWorld, label: String, amount: u64, name: &str) {
    let member_id = world.member_id(name);
    let result = world
        .association
        .contributions()
        .add(&member_id, amount, &label, &world.admin)
        .await;
    if let Some(contribution) = world.record(result) {
        world.contributions.insert(label, contribution.id);
    }
}

#[given(expr = "the recorded balance of {string} was manually set to {int} XAF")]
async fn force_balance(world: &mut NjangiWorld, name: String, balance: u64) {
    world.force_balance(&name, balance).await;
}

#[when(expr = "the treasurer changes contribution {string} to {int} XAF")]
async fn edit_amount(world: &mut NjangiWorld, label: String, amount: u64) {
    let id = world.contributions[&label].clone();
    let result = world.association.contributions().edit(&id, amount, &label, &world.admin).await;
    world.record(result);
}

#[when(expr = "the treasurer renames contribution {string} to {string}")]
async fn edit_description(world: &mut NjangiWorld, label: String, description: String) {
    let id = world.contributions[&label].clone();
    let amount = world.association.contributions().get(&id).await.expect("contribution").amount;
    let result = world.association.contributions().edit(&id, amount, &description, &world.admin).await;
    world.record(result);
}

#[when(expr = "the treasurer deletes contribution {string}")]
async fn delete_contribution(world: &mut NjangiWorld, label: String) {
    let id = world.contributions[&label].clone();
    let result = world.association.contributions().delete(&id, &world.admin).await;
    world.record(result);
}

#[when(expr = "{string} tries to record a contribution of {int} XAF for {string}")]
async fn member_records(world: &mut NjangiWorld, actor: String, amount: u64, name: String) {
    let actor = njangi_core::model::Actor::from(&world.member(&actor).await);
    let member_id = world.member_id(&name);
    let result = world.association.contributions().add(&member_id, amount, "self-service", &actor).await;
    world.record(result);
}

#[then(expr = "the balance of {string} is {int} XAF")]
async fn balance_is(world: &mut NjangiWorld, name: String, expected: u64) {
    assert_eq!(world.member(&name).await.total_contributions, expected);
}

#[then(expr = "the balance of {string} matches their contribution records")]
async fn balance_matches_records(world: &mut NjangiWorld, name: String) {
    let member = world.member(&name).await;
    let sum = world.association.contributions().sum_records(&member.id).await.expect("sum");
    assert_eq!(member.total_contributions, sum);
}

#[then(regex = r"^the (admin|contributions|loans) activity stream has (\d+) entr(?:y|ies)$")]
async fn stream_has(world: &mut NjangiWorld, stream: String, expected: usize) {
    let stream: ActivityStream = stream.parse().expect("stream");
    let entries = world.association.activity().entries(stream).await.expect("entries");
    assert_eq!(entries.len(), expected, "entries: {:#?}", entries);
}

#[then(expr = "the operation fails with {string}")]
async fn fails_with(world: &mut NjangiWorld, kind: String) {
    let err = world.last_error.as_ref().expect("the operation succeeded");
    assert_eq!(err.kind(), kind, "unexpected error: {}", err);
}

#[then("the operation succeeds")]
async fn succeeds(world: &mut NjangiWorld) {
    if let Some(err) = &world.last_error {
        panic!("unexpected error: {}", err);
    }
}
