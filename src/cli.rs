use std::io::{self, BufWriter};

use crate::config::ManagerConfig;
use crate::data::amount::{parse_amount, parse_rank};
use crate::data::record::Record;
use crate::ops::{split_queries, Manager, OpError};
use crate::shell::{print_combined, print_comparison, print_entry, run_shell};

const USAGE: &str = "usage: ppp_manager [shell|show|add|compare|total|delete|restore]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Shell,
    Show,
    Add,
    Compare,
    Total,
    Delete,
    Restore,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        None | Some("shell") => Some(Command::Shell),
        Some("show") => Some(Command::Show),
        Some("add") => Some(Command::Add),
        Some("compare") => Some(Command::Compare),
        Some("total") => Some(Command::Total),
        Some("delete") => Some(Command::Delete),
        Some("restore") => Some(Command::Restore),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };

    let config = ManagerConfig::from_env();
    let mut manager = match Manager::open(config) {
        Ok(manager) => manager,
        Err(err) => {
            eprintln!("failed to load data: {err}");
            return 1;
        }
    };

    match command {
        Command::Shell => handle_shell(&mut manager),
        Command::Show => handle_show(&manager, args),
        Command::Add => handle_add(&mut manager, args),
        Command::Compare => handle_compare(&manager, args),
        Command::Total => handle_total(&manager, args),
        Command::Delete => handle_delete(&mut manager, args),
        Command::Restore => handle_restore(&mut manager),
    }
}

fn report_failure(err: &OpError) -> i32 {
    eprintln!("{err}");
    1
}

fn written(result: io::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("terminal error: {err}");
            1
        }
    }
}

fn handle_shell(manager: &mut Manager) -> i32 {
    let stdin = io::stdin();
    let stdout = io::stdout();
    written(run_shell(manager, stdin.lock(), BufWriter::new(stdout.lock())))
}

fn handle_show(manager: &Manager, args: &[String]) -> i32 {
    let Some(query) = args.get(2) else {
        eprintln!("usage: ppp_manager show <name-or-slug>");
        return 2;
    };
    let Some(record) = manager.find(query) else {
        return report_failure(&OpError::NotFound(query.clone()));
    };
    let mut stdout = io::stdout().lock();
    written(print_entry(&mut stdout, record, manager.schema().is_extended()))
}

fn handle_add(manager: &mut Manager, args: &[String]) -> i32 {
    let (Some(name), Some(ppp), Some(rank)) = (args.get(2), args.get(3), args.get(4)) else {
        eprintln!("usage: ppp_manager add <name> <ppp> <rank> [slug] [date] [region]");
        return 2;
    };
    // slug, date and region are cleared by the manager under the simple layout
    let optional = |i: usize| args.get(i).map(|s| s.trim().to_string()).unwrap_or_default();
    let record = Record::new(name.trim(), parse_amount(ppp), parse_rank(rank))
        .with_slug(optional(5))
        .with_date(optional(6))
        .with_region(optional(7));

    match manager.add_or_update(record) {
        Ok(()) => {
            println!("saved '{}' to {}", name.trim(), manager.data_path().display());
            0
        }
        Err(err) => report_failure(&err),
    }
}

fn handle_compare(manager: &Manager, args: &[String]) -> i32 {
    let (Some(first), Some(second)) = (args.get(2), args.get(3)) else {
        eprintln!("usage: ppp_manager compare <a> <b>");
        return 2;
    };
    match manager.compare(first, second) {
        Ok(comparison) => written(print_comparison(&mut io::stdout().lock(), &comparison)),
        Err(err) => report_failure(&err),
    }
}

fn handle_total(manager: &Manager, args: &[String]) -> i32 {
    let queries = split_queries(&args.get(2..).unwrap_or(&[]).join(","));
    if queries.is_empty() {
        eprintln!("usage: ppp_manager total <a,b,...>");
        return 2;
    }
    let combined = manager.combined_total(&queries);
    written(print_combined(&mut io::stdout().lock(), &combined))
}

fn handle_delete(manager: &mut Manager, args: &[String]) -> i32 {
    let Some(query) = args.get(2) else {
        eprintln!("usage: ppp_manager delete <name-or-slug>");
        return 2;
    };
    match manager.delete(query) {
        Ok(record) => {
            println!(
                "deleted '{}', archived to {}",
                record.name,
                manager.deleted_path().display()
            );
            0
        }
        Err(err) => report_failure(&err),
    }
}

fn handle_restore(manager: &mut Manager) -> i32 {
    match manager.restore_all() {
        Ok(report) if report.archive_was_empty() => {
            println!("No deleted items to merge.");
            0
        }
        Ok(report) => {
            println!(
                "restore complete: restored={}, kept={}",
                report.restored.len(),
                report.kept
            );
            for name in &report.restored {
                println!("- {name}");
            }
            0
        }
        Err(err) => report_failure(&err),
    }
}
