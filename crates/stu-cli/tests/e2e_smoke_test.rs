use std::{fs, path::PathBuf};

use stu_cli::{Args, error_adapter::to_reportables, run_with_output};

/// Collects all .stu files from a directory
fn collect_stu_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("stu")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

/// Demos are at workspace root, relative to workspace not the crate
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args_for(path: &PathBuf) -> Args {
    Args {
        input: Some(path.to_string_lossy().to_string()),
        rules: Vec::new(),
        dependencies: None,
        quiet: false,
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let valid_demos = collect_stu_files(demos_path());

    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        let mut out = Vec::new();
        match run_with_output(&args_for(demo_path), &mut out) {
            Ok(()) => assert!(!out.is_empty(), "{} printed no rules", demo_path.display()),
            Err(e) => failed_demos.push((demo_path.clone(), e)),
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo(s) failed unexpectedly", failed_demos.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let error_demos = collect_stu_files(demos_path().join("errors"));

    assert!(
        !error_demos.is_empty(),
        "No error demos found in demos/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        match run_with_output(&args_for(demo_path), &mut Vec::new()) {
            Ok(()) => unexpectedly_succeeded.push(demo_path.clone()),
            Err(err) => {
                // Every error demo is wrong in itself, not in its environment
                assert_eq!(err.exit_code(), 2, "{}", demo_path.display());
                let reportables = to_reportables(&err);
                assert!(!reportables.is_empty());
                let header = reportables[0].to_string();
                assert!(
                    header.starts_with(demo_path.to_string_lossy().as_ref()),
                    "{header}"
                );
            }
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_printed_rules_parse_again() {
    for demo_path in collect_stu_files(demos_path()) {
        let mut out = Vec::new();
        run_with_output(&args_for(&demo_path), &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let reprinted_path = dir.path().join("printed.stu");
        fs::write(&reprinted_path, &printed).unwrap();

        let mut again = Vec::new();
        run_with_output(&args_for(&reprinted_path), &mut again).unwrap();
        assert_eq!(
            String::from_utf8(again).unwrap(),
            printed,
            "{}",
            demo_path.display()
        );
    }
}
