//! Journaled associations survive a restart

use njangi_core::config::NjangiConfig;
use njangi_core::model::{ActivityStream, Actor, LoanStatus, NewMember, Policy};
use njangi_core::Association;
use std::io::Write;

fn config_for(dir: &tempfile::TempDir) -> NjangiConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut config = NjangiConfig::default();
    config.storage.journal_path = Some(dir.path().join("ledger.jsonl").to_string_lossy().to_string());
    config
}

fn treasurer() -> Actor {
    Actor::admin("Treasurer", "treasurer@assoc.cm")
}

#[tokio::test]
async fn state_is_rebuilt_from_the_journal() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_for(&dir);

    let (member_id, loan_id, kept_id) = {
        let association = Association::from_config(&config).unwrap();
        let member = association
            .register_member(NewMember::new("Awa Nfor", "awa@assoc.cm", "677000000"), &treasurer())
            .await
            .unwrap();
        let kept = association.contributions().add(&member.id, 250_000, "Q1", &treasurer()).await.unwrap();
        let dropped = association.contributions().add(&member.id, 40_000, "Q2", &treasurer()).await.unwrap();
        association.contributions().edit(&kept.id, 300_000, "Q1 corrected", &treasurer()).await.unwrap();
        association.contributions().delete(&dropped.id, &treasurer()).await.unwrap();
        let loan = association.loans().request(&member.id, 500_000, "Harvest").await.unwrap();
        association.loans().approve(&loan.id, &treasurer()).await.unwrap();
        (member.id, loan.id, kept.id)
    };

    let reopened = Association::from_config(&config).unwrap();
    let member = reopened.member(&member_id).await.unwrap();
    assert_eq!(member.total_contributions, 300_000);
    assert!(member.can_apply_for_loan);

    let contributions = reopened.contributions().for_member(&member_id).await.unwrap();
    assert_eq!(contributions.len(), 1);
    assert_eq!(contributions[0].id, kept_id);
    assert_eq!(contributions[0].description, "Q1 corrected");

    let loan = reopened.loans().get(&loan_id).await.unwrap();
    assert_eq!(loan.status, LoanStatus::Approved);
    assert_eq!(loan.processed_by.as_deref(), Some("treasurer@assoc.cm"));

    // Terminal state survives the restart too
    assert!(reopened.loans().reject(&loan_id, &treasurer()).await.is_err());

    let admin_log = reopened.activity().entries(ActivityStream::Admin).await.unwrap();
    assert!(admin_log.len() >= 5);
}

#[tokio::test]
async fn saved_policy_wins_over_configured_default() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = config_for(&dir);
    config.policy.association_name = "Tontine Bafang".to_string();

    {
        let association = Association::from_config(&config).unwrap();
        assert_eq!(association.policy().await.association_name, "Tontine Bafang");
        let policy = Policy { max_loan_multiplier: 2, ..association.policy().await };
        association.update_policy(policy, &treasurer()).await.unwrap();
    }

    config.policy.max_loan_multiplier = 5;
    let reopened = Association::from_config(&config).unwrap();
    let policy = reopened.policy().await;
    assert_eq!(policy.max_loan_multiplier, 2);
    assert_eq!(policy.association_name, "Tontine Bafang");
}

#[tokio::test]
async fn torn_journal_line_is_skipped() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_for(&dir);

    let member_id = {
        let association = Association::from_config(&config).unwrap();
        let member = association
            .register_member(NewMember::new("Bih", "bih@assoc.cm", "677000001"), &treasurer())
            .await
            .unwrap();
        association.contributions().add(&member.id, 12_000, "Dues", &treasurer()).await.unwrap();
        member.id
    };

    let path = dir.path().join("ledger.jsonl");
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    write!(file, "{{\"type\":\"contribution_inserted\",\"contribu").unwrap();
    drop(file);

    {
        let reopened = Association::from_config(&config).unwrap();
        assert_eq!(reopened.member(&member_id).await.unwrap().total_contributions, 12_000);
        reopened.contributions().add(&member_id, 3_000, "Late dues", &treasurer()).await.unwrap();
    }

    // The write after the torn line landed on its own line
    let reopened = Association::from_config(&config).unwrap();
    assert_eq!(reopened.member(&member_id).await.unwrap().total_contributions, 15_000);
    assert_eq!(reopened.contributions().sum_records(&member_id).await.unwrap(), 15_000);
}
