//! Scripted sessions through the interactive menu.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use ppp_manager::config::ManagerConfig;
use ppp_manager::ops::Manager;
use ppp_manager::shell::run_shell;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn scratch_config(name: &str, fixture: &str) -> ManagerConfig {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    let seq = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir: PathBuf = std::env::temp_dir().join(format!("ppp-shell-{name}-{stamp}-{seq}"));
    fs::create_dir_all(&dir).expect("scratch dir should be created");
    let data_path = dir.join("purchasing_power.csv");
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(fixture);
    fs::copy(fixture, &data_path).expect("fixture should be copied");
    ManagerConfig::new(data_path, dir.join("deleted_info.csv"))
}

fn run_script(manager: &mut Manager, script: &str) -> String {
    let mut out = Vec::new();
    run_shell(manager, Cursor::new(script.as_bytes()), &mut out).expect("shell should run");
    String::from_utf8(out).expect("output should be utf-8")
}

#[test]
fn show_prints_extended_fields_only_for_extended_schema() {
    let mut manager = Manager::open(scratch_config("show-ext", "extended.csv")).unwrap();
    let out = run_script(&mut manager, "1\nindia\n7\n");
    assert!(out.contains("Loaded 4 countries into cache."));
    assert!(out.contains("Name   : India"));
    assert!(out.contains("Slug   : india"));
    assert!(out.contains("PPP    : 16,020,000,000,000"));
    assert!(out.contains("Region : South Asia"));
    assert!(out.trim_end().ends_with("Goodbye!"));

    let mut manager = Manager::open(scratch_config("show-simple", "simple.csv")).unwrap();
    let out = run_script(&mut manager, "1\nChina\n7\n");
    assert!(out.contains("PPP    : 33,598,000,000,000"));
    assert!(!out.contains("Slug   :"));
}

#[test]
fn unknown_country_and_bad_choice_keep_the_menu_running() {
    let mut manager = Manager::open(scratch_config("survive", "simple.csv")).unwrap();
    let out = run_script(&mut manager, "9\n1\nNarnia\n3\nChina\nNarnia\n5\nNarnia\n7\n");
    assert!(out.contains("Invalid choice. Try again."));
    assert!(out.contains("Country not found."));
    assert!(out.contains("One or both countries not found."));
    assert!(out.contains("Goodbye!"));
    assert_eq!(manager.len(), 4);
}

#[test]
fn add_compare_and_combined_flow() {
    let mut manager = Manager::open(scratch_config("flow", "simple.csv")).unwrap();
    let script = "2\nFrance\n3,636,000,000,000\n10\n\
                  3\nFrance\nIndia\n\
                  4\nChina, india,Atlantis ,  , Mordor\n\
                  7\n";
    let out = run_script(&mut manager, script);

    assert!(out.contains("Updated in memory and saved to file."));
    assert!(out.contains("France: PPP=3,636,000,000,000, Rank=10"));
    assert!(out.contains("=> India has higher PPP."));
    assert!(out.contains("Countries: China, India, Atlantis"));
    assert!(out.contains("Combined PPP: 49,618,000,000,000"));
    assert!(out.contains("Missing: Mordor"));
}

#[test]
fn extended_add_prompts_for_slug_date_region() {
    let config = scratch_config("ext-add", "extended.csv");
    let mut manager = Manager::open(config.clone()).unwrap();
    let out = run_script(&mut manager, "2\nFrance\n3.636e12\n10\nfrance-x\n2024\nEurope\n7\n");
    assert!(out.contains("Slug (e.g., france): "));
    assert!(out.contains("Region (e.g., Europe): "));

    let by_slug = manager.find("france-x").unwrap();
    assert_eq!(by_slug.region, "Europe");
    assert_eq!(manager.store().find_id("France"), manager.store().find_id("FRANCE-X"));
}

#[test]
fn delete_and_merge_back_through_menu() {
    let config = scratch_config("delete-merge", "simple.csv");
    let mut manager = Manager::open(config.clone()).unwrap();
    let out = run_script(&mut manager, "6\n5\nindia\n6\n6\n7\n");

    assert!(out.contains("No deleted items to merge."));
    assert!(out.contains("Deleted 'India' from memory and file."));
    assert!(out.contains("Restored: India"));
    // the archive is left with only a header after the restore
    assert_eq!(out.matches("No deleted items to merge.").count(), 2);
    assert!(manager.find("India").is_some());
}

#[test]
fn end_of_input_quits_cleanly() {
    let mut manager = Manager::open(scratch_config("eof", "simple.csv")).unwrap();
    let out = run_script(&mut manager, "1\n");
    assert!(out.contains("Enter country name or slug: "));
    assert!(!out.contains("Goodbye!"));
}
