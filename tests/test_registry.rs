//! Integration tests for the vehicle registry.
//!
//! Tests cover:
//! - Adding vehicles and rejecting duplicates
//! - Case-insensitive lookup
//! - Removing vehicles
//! - Active/inactive status

mod common;

use common::*;

#[tokio::test]
async fn test_add_and_lookup() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_db().await;

    let vehicle = NewVehicle {
        plate_number: "AB123X".to_string(),
        owner: "Jordan Lee".to_string(),
        vehicle_type: "Car".to_string(),
    };
    assert_eq!(db.add(&vehicle).await?, AddOutcome::Added);

    let lookup = db.lookup("AB123X").await?;
    assert!(lookup.found);
    assert!(lookup.active);
    assert!(lookup.is_registered());

    let entries = db.list_all().await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].plate_number, "AB123X");
    assert_eq!(entries[0].owner, "Jordan Lee");
    assert_eq!(entries[0].vehicle_type, "Car");
    assert_eq!(entries[0].status, VehicleStatus::Active);

    Ok(())
}

#[tokio::test]
async fn test_lookup_missing_plate() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_db().await;

    let lookup = db.lookup("ZZ999Z").await?;
    assert_eq!(lookup, Lookup::default());
    assert!(!lookup.is_registered());

    Ok(())
}

#[tokio::test]
async fn test_plates_are_case_insensitive() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_db().await;

    assert_eq!(db.add(&NewVehicle::new(" ab123x ")).await?, AddOutcome::Added);
    assert!(db.lookup("AB123X").await?.is_registered());
    assert!(db.lookup("ab123x").await?.is_registered());

    let entries = db.list_all().await?;
    assert_eq!(entries[0].plate_number, "AB123X");

    Ok(())
}

#[tokio::test]
async fn test_plate_separators_are_ignored() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_db().await;

    assert_eq!(db.add(&NewVehicle::new("ab-12 3x")).await?, AddOutcome::Added);
    assert!(db.lookup("AB123X").await?.is_registered());
    assert_eq!(db.add(&NewVehicle::new("AB123X")).await?, AddOutcome::Duplicate);

    assert_eq!(db.add(&NewVehicle::new("KA 01 AB 1234")).await?, AddOutcome::Added);
    assert!(db.lookup("KA01AB1234").await?.is_registered());
    assert!(db.set_status("ka-01-ab-1234", VehicleStatus::Inactive).await?);
    assert!(!db.lookup("KA01AB1234").await?.is_registered());
    assert_eq!(db.remove("KA 01 AB 1234").await?, RemoveOutcome::Removed);

    // No OCR corrections on stored keys
    assert_eq!(db.add(&NewVehicle::new("BO 12 I")).await?, AddOutcome::Added);
    assert!(db.lookup("BO12I").await?.is_registered());
    assert!(!db.lookup("B012I").await?.found);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_add() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_db().await;

    assert_eq!(db.add(&NewVehicle::new("AB123X")).await?, AddOutcome::Added);
    assert_eq!(db.add(&NewVehicle::new("ab123x")).await?, AddOutcome::Duplicate);
    assert_eq!(db.list_all().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_add_empty_plate_fails() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_db().await;

    assert!(db.add(&NewVehicle::new("   ")).await.is_err());
    assert!(db.list_all().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_remove() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_registry_with(&["AB123X", "CD4567"]).await;

    assert_eq!(db.remove("ab123x").await?, RemoveOutcome::Removed);
    assert!(!db.lookup("AB123X").await?.found);
    assert_eq!(db.remove("AB123X").await?, RemoveOutcome::NotFound);

    let entries = db.list_all().await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].plate_number, "CD4567");

    Ok(())
}

#[tokio::test]
async fn test_list_all_newest_first() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_registry_with(&["AAA111", "BBB222", "CCC333"]).await;

    let plates: Vec<String> = db
        .list_all()
        .await?
        .into_iter()
        .map(|e| e.plate_number)
        .collect();
    assert_eq!(plates, vec!["CCC333", "BBB222", "AAA111"]);

    Ok(())
}

#[tokio::test]
async fn test_inactive_vehicle_is_not_registered() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_registry_with(&["AB123X"]).await;

    assert!(db.set_status("ab123x", VehicleStatus::Inactive).await?);

    let lookup = db.lookup("AB123X").await?;
    assert!(lookup.found);
    assert!(!lookup.active);
    assert!(!lookup.is_registered());
    assert_eq!(db.list_all().await?[0].status, VehicleStatus::Inactive);

    assert!(db.set_status("AB123X", VehicleStatus::Active).await?);
    assert!(db.lookup("AB123X").await?.is_registered());

    Ok(())
}

#[tokio::test]
async fn test_set_status_missing_plate() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_test_db().await;

    assert!(!db.set_status("ZZ999Z", VehicleStatus::Inactive).await?);

    Ok(())
}

#[tokio::test]
async fn test_registry_survives_reopen() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("vehicles.db");

    let db = VehicleDb::new(&path).await?;
    db.add(&NewVehicle::new("AB123X")).await?;
    db.close().await?;

    let reopened = VehicleDb::new(&path).await?;
    assert!(reopened.lookup("AB123X").await?.is_registered());

    Ok(())
}

#[test]
fn test_vehicle_status_strings() {
    assert_eq!(VehicleStatus::Active.as_str(), "active");
    assert_eq!(VehicleStatus::Inactive.to_string(), "inactive");
    assert_eq!(VehicleStatus::try_from("inactive").ok(), Some(VehicleStatus::Inactive));
    assert!(VehicleStatus::try_from("retired").is_err());
}
