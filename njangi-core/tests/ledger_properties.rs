//! End-to-end properties of the contribution ledger and loan lifecycle

use njangi_core::model::{ActivityStream, Actor, LoanStatus, Member, MemberPatch, NewMember};
use njangi_core::prelude::*;
use njangi_core::store::{ActivityLog, MemberRegistry, PolicyStore};
use std::sync::Arc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn treasurer() -> Actor {
    Actor::admin("Treasurer", "treasurer@assoc.cm")
}

async fn setup(members: usize) -> (Association, Arc<MemoryStore>, Vec<Member>) {
    init_logger();
    let store = Arc::new(MemoryStore::new());
    let association = Association::new(Stores::from_backend(store.clone()), LedgerConfig::default());
    let mut registered = Vec::new();
    for i in 0..members {
        let member = association
            .register_member(
                NewMember::new(format!("Member {}", i), format!("member{}@assoc.cm", i), format!("6770000{:02}", i)),
                &treasurer(),
            )
            .await
            .unwrap();
        registered.push(member);
    }
    (association, store, registered)
}

async fn assert_balances_match_records(association: &Association, members: &[Member]) {
    for member in members {
        let stored = association.member(&member.id).await.unwrap();
        let sum = association.contributions().sum_records(&member.id).await.unwrap();
        assert_eq!(stored.total_contributions, sum, "member {}", member.name);
    }
}

/// Small deterministic generator so the operation mix is reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

#[tokio::test]
async fn balances_track_records_through_mixed_operations() {
    let (association, _store, members) = setup(4).await;
    let ledger = association.contributions();
    let mut rng = Lcg(42);
    let mut live: Vec<String> = Vec::new();

    for step in 0..300 {
        match rng.next() % 3 {
            0 | 1 if live.len() < 40 || step % 5 == 0 => {
                let member = &members[(rng.next() % members.len() as u64) as usize];
                let amount = 1_000 + rng.next() % 100_000;
                let c = ledger.add(&member.id, amount, &format!("step {}", step), &treasurer()).await.unwrap();
                live.push(c.id);
            }
            2 if !live.is_empty() => {
                let id = live.swap_remove((rng.next() % live.len() as u64) as usize);
                ledger.delete(&id, &treasurer()).await.unwrap();
            }
            _ if !live.is_empty() => {
                let id = &live[(rng.next() % live.len() as u64) as usize];
                let amount = 1_000 + rng.next() % 100_000;
                ledger.edit(id, amount, "edited", &treasurer()).await.unwrap();
            }
            _ => {}
        }
    }

    assert_balances_match_records(&association, &members).await;

    let totals = association.totals().await.unwrap();
    let by_member: u64 = futures::future::join_all(
        members.iter().map(|m| association.member(&m.id)),
    )
    .await
    .into_iter()
    .map(|m| m.unwrap().total_contributions)
    .sum();
    assert_eq!(totals.total_contributions, by_member);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_to_one_member_do_not_lose_deltas() {
    let (association, _store, members) = setup(1).await;
    let member_id = members[0].id.clone();

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let association = association.clone();
            let member_id = member_id.clone();
            tokio::spawn(async move {
                association
                    .contributions()
                    .add(&member_id, 1_000 + i, &format!("deposit {}", i), &treasurer())
                    .await
                    .unwrap()
            })
        })
        .collect();
    let added: Vec<Contribution> = futures::future::try_join_all(handles).await.unwrap();

    // Edit and delete concurrently as well
    let edits = added.iter().take(20).map(|c| {
        let association = association.clone();
        let id = c.id.clone();
        tokio::spawn(async move { association.contributions().edit(&id, 10_000, "bumped", &treasurer()).await })
    });
    let deletes = added.iter().skip(40).map(|c| {
        let association = association.clone();
        let id = c.id.clone();
        tokio::spawn(async move { association.contributions().delete(&id, &treasurer()).await.map(|_| ()) })
    });
    for result in futures::future::try_join_all(edits).await.unwrap() {
        result.unwrap();
    }
    for result in futures::future::try_join_all(deletes).await.unwrap() {
        result.unwrap();
    }

    let expected: u64 = 20 * 10_000 + (20..40).map(|i| 1_000 + i).sum::<u64>();
    let member = association.member(&member_id).await.unwrap();
    assert_eq!(member.total_contributions, expected);
    assert_balances_match_records(&association, &members).await;
}

#[tokio::test]
async fn scenario_add_on_existing_balance() {
    let (association, store, members) = setup(1).await;
    let member = &members[0];
    association.contributions().add(&member.id, 50_000, "Opening", &treasurer()).await.unwrap();
    for stream in ActivityStream::ALL {
        store.clear(stream).await.unwrap();
    }

    association.contributions().add(&member.id, 20_000, "Top-up", &treasurer()).await.unwrap();

    assert_eq!(association.member(&member.id).await.unwrap().total_contributions, 70_000);
    assert_eq!(association.activity().entries(ActivityStream::Admin).await.unwrap().len(), 1);
    assert_eq!(association.activity().entries(ActivityStream::MemberContribution).await.unwrap().len(), 1);
}

#[tokio::test]
async fn scenario_edit_applies_delta_not_replacement() {
    let (association, store, members) = setup(1).await;
    let member = &members[0];
    let c = association.contributions().add(&member.id, 10_000, "Dues", &treasurer()).await.unwrap();
    force_balance(&store, &member.id, 40_000).await;

    let edit = association.contributions().edit(&c.id, 15_000, "Dues", &treasurer()).await.unwrap();

    assert_eq!(edit.changes.amount_delta(), 5_000);
    assert_eq!(association.member(&member.id).await.unwrap().total_contributions, 45_000);
}

#[tokio::test]
async fn scenario_delete_clamps_floor_at_zero() {
    let (association, store, members) = setup(1).await;
    let member = &members[0];
    let c = association.contributions().add(&member.id, 20_000, "Dues", &treasurer()).await.unwrap();
    force_balance(&store, &member.id, 15_000).await;

    association.contributions().delete(&c.id, &treasurer()).await.unwrap();

    assert_eq!(association.member(&member.id).await.unwrap().total_contributions, 0);
}

#[tokio::test]
async fn eligibility_follows_threshold_boundary() {
    let (association, store, members) = setup(1).await;
    let member = &members[0];
    let policy = store.get_policy().await;

    for (balance, eligible) in [(0, false), (299_999, false), (300_000, true), (300_001, true), (5_000_000, true)] {
        force_balance(&store, &member.id, balance).await;
        let stored = association.member(&member.id).await.unwrap();
        let evaluated = njangi_core::ledger::eligibility::evaluate(&stored, &policy);
        assert_eq!(evaluated.can_apply_for_loan, eligible, "balance {}", balance);
        assert_eq!(stored.can_apply_for_loan, eligible, "balance {}", balance);
        assert_eq!(evaluated.max_loan_amount, balance * 3);
    }
}

#[tokio::test]
async fn scenario_max_loan_is_inclusive() {
    let (association, _store, members) = setup(1).await;
    let member = &members[0];
    association.contributions().add(&member.id, 300_000, "Savings", &treasurer()).await.unwrap();

    let summary = association.member_summary(&member.id).await.unwrap();
    assert!(summary.member.can_apply_for_loan);
    assert_eq!(summary.eligibility.max_loan_amount, 900_000);

    let err = association.loans().request(&member.id, 900_001, "Truck").await.unwrap_err();
    assert_eq!(err.kind(), "policy_violation");
    assert_eq!(err.violation().and_then(|v| v.threshold()), Some(900_000));

    let loan = association.loans().request(&member.id, 900_000, "Truck").await.unwrap();
    assert_eq!(loan.status, LoanStatus::Pending);
}

#[tokio::test]
async fn second_decision_fails_and_leaves_record_unchanged() {
    let (association, _store, members) = setup(1).await;
    let member = &members[0];
    association.contributions().add(&member.id, 300_000, "Savings", &treasurer()).await.unwrap();

    for first_approves in [true, false] {
        let loan = association.loans().request(&member.id, 1_000, "Fees").await.unwrap();
        let decided = if first_approves {
            association.loans().approve(&loan.id, &treasurer()).await.unwrap()
        } else {
            association.loans().reject(&loan.id, &treasurer()).await.unwrap()
        };

        let err = association.loans().approve(&loan.id, &treasurer()).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
        let err = association.loans().reject(&loan.id, &treasurer()).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));

        assert_eq!(association.loans().get(&loan.id).await.unwrap(), decided);
    }
}

async fn force_balance(store: &MemoryStore, member_id: &str, balance: u64) {
    let policy = store.get_policy().await;
    let eligibility = njangi_core::ledger::eligibility::evaluate_balance(balance, &policy);
    store.patch_member(member_id, MemberPatch::balance(balance, eligibility)).await.unwrap();
}
