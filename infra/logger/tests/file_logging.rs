use cryptix_logger::{LevelFilter, Logger, line_writer};
use std::fs;
use std::io::Write;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn file_logging_receives_forwarded_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("integration-file-logging")
        .console(false)
        .path(&log_dir)
        .json()
        .level(LevelFilter::INFO)
        .init()?;
    assert!(logger.has_file_output());

    tracing::info!("hello from integration test");

    let mut child_output = line_writer("child")?;
    writeln!(child_output, "child says hi")?;
    child_output.write_all(b"partial tail")?;
    child_output.close()?;

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    assert!(contents.contains("hello from integration test"), "{contents}");
    assert!(contents.contains("child says hi"), "{contents}");
    assert!(contents.contains("partial tail"), "{contents}");
    assert!(contents.contains(r#""unit":"child""#), "{contents}");

    Ok(())
}
