//! Campaign store integration tests
//!
//! Validation rules, active-only public listing and the delete guard.

use donation_server::db::DbService;
use donation_server::db::models::{CampaignCreate, CampaignUpdate, ManualDonationCreate};
use donation_server::db::repository::{CampaignRepository, DonationRepository, RepoError};

async fn setup() -> (DbService, CampaignRepository) {
    let db = DbService::new_in_memory()
        .await
        .expect("Failed to open in-memory database");
    let repo = CampaignRepository::new(db.db.clone());
    (db, repo)
}

fn campaign(title: &str, target: f64) -> CampaignCreate {
    CampaignCreate {
        title: title.to_string(),
        description: "Test campaign".to_string(),
        target_amount: target,
        is_active: Some(true),
    }
}

#[tokio::test]
async fn test_create_rejects_blank_title_and_bad_target() {
    let (_db, repo) = setup().await;

    let blank = repo.create(campaign("   ", 1000.0)).await;
    assert!(matches!(blank, Err(RepoError::Validation(_))));

    let zero = repo.create(campaign("Valid title", 0.0)).await;
    assert!(matches!(zero, Err(RepoError::Validation(_))));

    let negative = repo.create(campaign("Valid title", -5.0)).await;
    assert!(matches!(negative, Err(RepoError::Validation(_))));
}

#[tokio::test]
async fn test_new_campaign_starts_with_zero_raised() {
    let (_db, repo) = setup().await;

    let created = repo
        .create(campaign("School Fund", 50_000.0))
        .await
        .expect("Failed to create campaign");
    assert_eq!(created.raised_amount, 0.0);
    assert!(created.is_active);
}

#[tokio::test]
async fn test_public_listing_excludes_inactive() {
    let (_db, repo) = setup().await;

    let visible = repo
        .create(campaign("Visible", 1000.0))
        .await
        .expect("Failed to create campaign");
    let hidden = repo
        .create(campaign("Hidden", 1000.0))
        .await
        .expect("Failed to create campaign");

    let hidden_id = hidden.id.expect("Campaign has no id").id.to_string();
    repo.update(
        &hidden_id,
        CampaignUpdate {
            title: None,
            description: None,
            target_amount: None,
            is_active: Some(false),
        },
    )
    .await
    .expect("Failed to deactivate campaign");

    let active = repo.find_active().await.expect("Failed to list campaigns");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, visible.id);

    let all = repo.find_all().await.expect("Failed to list all campaigns");
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_update_cannot_blank_required_fields() {
    let (_db, repo) = setup().await;

    let created = repo
        .create(campaign("Original", 1000.0))
        .await
        .expect("Failed to create campaign");
    let id = created.id.expect("Campaign has no id").id.to_string();

    let blank_title = repo
        .update(
            &id,
            CampaignUpdate {
                title: Some("  ".to_string()),
                description: None,
                target_amount: None,
                is_active: None,
            },
        )
        .await;
    assert!(matches!(blank_title, Err(RepoError::Validation(_))));

    let renamed = repo
        .update(
            &id,
            CampaignUpdate {
                title: Some("Renamed".to_string()),
                description: None,
                target_amount: Some(2000.0),
                is_active: None,
            },
        )
        .await
        .expect("Failed to update campaign");
    assert_eq!(renamed.title, "Renamed");
    assert_eq!(renamed.target_amount, 2000.0);
}

#[tokio::test]
async fn test_delete_refused_while_donations_reference_campaign() {
    let (db, repo) = setup().await;

    let created = repo
        .create(campaign("With donations", 1000.0))
        .await
        .expect("Failed to create campaign");
    let id = created.id.expect("Campaign has no id").id.to_string();

    let donations = DonationRepository::new(db.db.clone());
    donations
        .create_manual(
            ManualDonationCreate {
                campaign_id: id.clone(),
                amount: 100.0,
                donor_name: None,
                donor_phone: None,
                donor_email: None,
                payment_method: None,
                notes: None,
            },
            "MANUAL_TEST".to_string(),
        )
        .await
        .expect("Failed to create manual donation");

    let refused = repo.delete(&id).await;
    assert!(matches!(refused, Err(RepoError::Conflict(_))));

    // Still present after the refused delete
    assert!(repo
        .find_by_id(&id)
        .await
        .expect("Failed to load campaign")
        .is_some());
}

#[tokio::test]
async fn test_delete_succeeds_without_donations() {
    let (_db, repo) = setup().await;

    let created = repo
        .create(campaign("Empty", 1000.0))
        .await
        .expect("Failed to create campaign");
    let id = created.id.expect("Campaign has no id").id.to_string();

    assert!(repo.delete(&id).await.expect("Delete failed"));
    assert!(repo
        .find_by_id(&id)
        .await
        .expect("Failed to load campaign")
        .is_none());
}

#[tokio::test]
async fn test_delete_missing_campaign_is_not_found() {
    let (_db, repo) = setup().await;
    let missing = repo.delete("does-not-exist").await;
    assert!(matches!(missing, Err(RepoError::NotFound(_))));
}
