//! Batch mode: every CSV in a folder is processed independently, and one
//! bad file never aborts its siblings.

use zone_audit::{run_audit, Config};

const GOOD_ZONE: &str = "\
Name,Type,Value,View
www.alpha.test,A,203.0.113.1,ext
www.alpha.test,AAAA,2001:db8::1,ext
";

const BROKEN_ZONE: &str = "\
Owner,Kind
www.beta.test,A
";

#[tokio::test]
async fn test_batch_continues_past_broken_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("alpha.csv"), GOOD_ZONE).unwrap();
    std::fs::write(dir.path().join("broken.csv"), BROKEN_ZONE).unwrap();
    // Non-CSV files are not picked up
    std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

    let config = Config {
        folder: Some(dir.path().to_path_buf()),
        no_timestamp: true,
        no_ssl_check: true,
        no_http_check: true,
        ..Default::default()
    };
    let report = run_audit(config).await.unwrap();

    assert_eq!(report.files_processed, 2);
    assert_eq!(report.files_failed, 1);

    // Files are processed in sorted order
    assert!(report.outcomes[0].input.ends_with("alpha.csv"));
    assert!(report.outcomes[0].error.is_none());
    assert_eq!(report.outcomes[0].domains, 1);
    assert!(report.outcomes[1].input.ends_with("broken.csv"));
    let error = report.outcomes[1].error.as_ref().unwrap();
    assert!(error.contains("missing required columns"));

    // The good file got its own output directory next to the input
    let out_dir = report.outcomes[0].output_dir.as_ref().unwrap();
    assert!(out_dir.ends_with("alpha"));
    assert!(out_dir.join("validation_report.txt").exists());
}

#[tokio::test]
async fn test_empty_folder_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        folder: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    assert!(run_audit(config).await.is_err());
}

#[tokio::test]
async fn test_fixed_output_dir_override() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("alpha.csv"), GOOD_ZONE).unwrap();
    let custom = dir.path().join("custom-out");

    let config = Config {
        file: Some(dir.path().join("alpha.csv")),
        output_dir: Some(custom.clone()),
        no_ssl_check: true,
        no_http_check: true,
        ..Default::default()
    };
    let report = run_audit(config).await.unwrap();
    assert_eq!(report.files_failed, 0);
    assert_eq!(report.outcomes[0].output_dir.as_ref().unwrap(), &custom);
    assert!(custom.join("validation_report.txt").exists());
    assert!(custom.join("analysis_report.csv").exists());
}
