//! Integration tests for classifying candidates against the registry.

mod common;

use common::*;
use plate_watch::classify_and_record;

#[tokio::test]
async fn test_registered_plate() -> anyhow::Result<()> {
    let (db, temp_dir) = create_registry_with(&["AB123X"]).await;
    let log = CsvEventLog::open(temp_dir.path().join("log.csv"))?;

    let result = classify_and_record(&make_candidate("AB123X", 0.9), 2, &db, &log).await;

    assert!(result.is_registered);
    assert_eq!(result.status(), DetectionStatus::Registered);
    assert_eq!(result.status().to_string(), "Registered");
    assert_eq!(result.plate_text, "AB123X");
    assert_eq!(result.confidence, 0.9);
    assert_eq!(result.camera_index, 2);

    let recorded = log.recent(10).await?;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].plate_text, "AB123X");
    assert!(recorded[0].is_registered);

    Ok(())
}

#[tokio::test]
async fn test_unknown_plate_is_unregistered() -> anyhow::Result<()> {
    let (db, temp_dir) = create_test_db().await;
    let log = CsvEventLog::open(temp_dir.path().join("log.csv"))?;

    let result = classify_and_record(&make_candidate("AB123X", 0.9), 0, &db, &log).await;

    assert!(!result.is_registered);
    assert_eq!(result.status().to_string(), "Unregistered");
    assert_eq!(log.recent(10).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_inactive_plate_is_unregistered() -> anyhow::Result<()> {
    let (db, temp_dir) = create_registry_with(&["AB123X"]).await;
    db.set_status("AB123X", VehicleStatus::Inactive).await?;
    let log = CsvEventLog::open(temp_dir.path().join("log.csv"))?;

    let result = classify_and_record(&make_candidate("AB123X", 0.9), 0, &db, &log).await;

    assert_eq!(result.status(), DetectionStatus::Unregistered);

    Ok(())
}

#[tokio::test]
async fn test_plate_registered_with_spaces_matches_detection() -> anyhow::Result<()> {
    let (db, temp_dir) = create_registry_with(&["KA 01 AB 1234"]).await;
    let log = CsvEventLog::open(temp_dir.path().join("log.csv"))?;

    let result = classify_and_record(&make_candidate("KA01AB1234", 0.9), 0, &db, &log).await;

    assert_eq!(result.status(), DetectionStatus::Registered);

    Ok(())
}

#[tokio::test]
async fn test_sink_failure_still_returns_result() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_registry_with(&["AB123X"]).await;

    let result = classify_and_record(&make_candidate("AB123X", 0.8), 0, &db, &FailingSink).await;

    assert!(result.is_registered);
    assert_eq!(result.plate_text, "AB123X");

    Ok(())
}

#[tokio::test]
async fn test_registry_failure_reads_as_unregistered() -> anyhow::Result<()> {
    let temp_dir = tempfile::TempDir::new()?;
    let log = CsvEventLog::open(temp_dir.path().join("log.csv"))?;

    let result =
        classify_and_record(&make_candidate("AB123X", 0.8), 0, &FailingRegistry, &log).await;

    assert!(!result.is_registered);
    assert_eq!(log.recent(1).await?[0].status(), DetectionStatus::Unregistered);

    Ok(())
}

#[tokio::test]
async fn test_database_history_records_detections() -> anyhow::Result<()> {
    let (db, _temp_dir) = create_registry_with(&["AB123X"]).await;

    classify_and_record(&make_candidate("AB123X", 0.9), 0, &db, &db).await;
    classify_and_record(&make_candidate("CD4567", 0.7), 1, &db, &db).await;

    let history = db.recent(10).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].plate_text, "CD4567");
    assert!(!history[0].is_registered);
    assert_eq!(history[0].camera_index, 1);
    assert_eq!(history[1].plate_text, "AB123X");
    assert!(history[1].is_registered);

    let stats = db.statistics().await?;
    assert_eq!(stats.total, 2);
    assert_eq!(stats.registered_count, 1);
    assert_eq!(stats.unregistered_count, 1);

    db.clear().await?;
    assert!(db.recent(10).await?.is_empty());
    assert_eq!(db.list_all().await?.len(), 1);

    Ok(())
}

#[test]
fn test_detection_status_strings() {
    assert_eq!(DetectionStatus::from_registered(true), DetectionStatus::Registered);
    assert_eq!(DetectionStatus::Unregistered.as_str(), "Unregistered");
    assert_eq!(
        DetectionStatus::try_from("Registered").ok(),
        Some(DetectionStatus::Registered)
    );
    assert!(DetectionStatus::try_from("registered?").is_err());
}
