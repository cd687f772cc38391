use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::path::Path;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn round_trip_test(in_path: &Path) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let huf_path = temp_dir.path().join("archive.huf");
    let out_path = temp_dir.path().join("expanded.txt");
    Command::cargo_bin("huffarc")?
        .arg("compress")
        .arg("-i").arg(in_path)
        .arg("-o").arg(&huf_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("compression ratio"));
    Command::cargo_bin("huffarc")?
        .arg("expand")
        .arg("-i").arg(&huf_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();
    let original = std::fs::read(in_path)?;
    let archive = std::fs::read(&huf_path)?;
    assert_eq!(archive,huffarc::huffman::compress_slice(&original,&huffarc::STD_OPTIONS)?);
    assert_eq!(original,std::fs::read(&out_path)?);
    Ok(())
}

#[test]
fn sample_round_trip() -> STDRESULT {
    round_trip_test(&Path::new("tests").join("sample.txt"))
}

#[test]
fn small_round_trips() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    for (i,txt) in ["","q","qqqqqqqq","aabbbcccc","aaaaaaaaab"].iter().enumerate() {
        let in_path = temp_dir.path().join(format!("small{}.txt",i));
        std::fs::write(&in_path,txt)?;
        round_trip_test(&in_path)?;
    }
    Ok(())
}

#[test]
fn sample_compresses() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let huf_path = temp_dir.path().join("sample.huf");
    let in_path = Path::new("tests").join("sample.txt");
    Command::cargo_bin("huffarc")?
        .arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&huf_path)
        .assert()
        .success();
    assert!(std::fs::metadata(&huf_path)?.len() < std::fs::metadata(&in_path)?.len());
    Ok(())
}

#[test]
fn missing_input() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let out_path = temp_dir.path().join("never.huf");
    Command::cargo_bin("huffarc")?
        .arg("compress")
        .arg("-i").arg(temp_dir.path().join("never.txt"))
        .arg("-o").arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("SourceNotFound"));
    assert!(!out_path.exists());
    Ok(())
}

#[test]
fn analyze_tables() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("abc.txt");
    std::fs::write(&in_path,"aabbbcccc")?;
    Command::cargo_bin("huffarc")?
        .arg("analyze")
        .arg("-i").arg(&in_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("symbol count: 9"))
        .stdout(predicate::str::contains("distinct symbols: 3"))
        .stdout(predicate::str::contains("a \t 0.2222222222"))
        .stdout(predicate::str::contains("c \t 0\n"))
        .stdout(predicate::str::contains("a \t 10\n"));
    Ok(())
}
