//! Interactive menu over a [`Manager`]. Reads answers line by line from any `BufRead` and writes
//! to any `Write`, so the binary drives it with stdin/stdout and tests with in-memory buffers.
//! Operation failures are reported and the menu continues; end of input quits.

use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::data::amount::{format_grouped, parse_amount, parse_rank, whole_units};
use crate::data::record::Record;
use crate::ops::{split_queries, CombinedTotal, Comparison, Manager, OpError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

const MENU: &str = "\
========== PPP Manager ==========
1) Show data for a country (name or slug)
2) Update/Add country data (memory + file)
3) Compare two countries (values & rank)
4) Combined PPP of multiple countries
5) Delete a country (save to deleted archive)
6) Merge back from deleted archive (no duplicates)
7) Quit
=================================";

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> io::Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(out)?;
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn report_error<W: Write>(out: &mut W, err: &OpError) -> io::Result<()> {
    match err {
        OpError::NotFound(_) => writeln!(out, "Country not found.\n"),
        other => {
            warn!(error = %other, "operation failed");
            writeln!(out, "Error: {other}\n")
        }
    }
}

pub fn print_entry<W: Write>(out: &mut W, record: &Record, extended: bool) -> io::Result<()> {
    writeln!(out, "\n--- Entry ---")?;
    writeln!(out, "Name   : {}", record.name)?;
    if extended {
        writeln!(out, "Slug   : {}", record.slug)?;
    }
    writeln!(out, "PPP    : {}", record.ppp_display())?;
    writeln!(out, "Rank   : {}", record.rank)?;
    if extended {
        writeln!(out, "Date   : {}", record.date)?;
        writeln!(out, "Region : {}", record.region)?;
    }
    writeln!(out)
}

/// Both sides of a comparison followed by the verdict line.
pub fn print_comparison<W: Write>(out: &mut W, comparison: &Comparison) -> io::Result<()> {
    for record in [&comparison.first, &comparison.second] {
        writeln!(out, "{}: PPP={}, Rank={}", record.name, record.ppp_display(), record.rank)?;
    }
    writeln!(out, "=> {}", comparison.verdict())
}

pub fn print_combined<W: Write>(out: &mut W, combined: &CombinedTotal) -> io::Result<()> {
    if combined.found.is_empty() {
        writeln!(out, "No valid countries found.")?;
    } else {
        let names: Vec<&str> = combined.found.iter().map(|r| r.name.as_str()).collect();
        writeln!(out, "Countries: {}", names.join(", "))?;
        writeln!(out, "Combined PPP: {}", format_grouped(whole_units(combined.total)))?;
    }
    if !combined.missing.is_empty() {
        writeln!(out, "Missing: {}", combined.missing.join(", "))?;
    }
    Ok(())
}

fn show_country<R: BufRead, W: Write>(manager: &Manager, input: &mut R, out: &mut W) -> io::Result<Flow> {
    let Some(query) = prompt(input, out, "Enter country name or slug: ")? else {
        return Ok(Flow::Quit);
    };
    match manager.find(&query) {
        Some(record) => print_entry(out, record, manager.schema().is_extended())?,
        None => writeln!(out, "Country not found.\n")?,
    }
    Ok(Flow::Continue)
}

fn update_country<R: BufRead, W: Write>(
    manager: &mut Manager,
    input: &mut R,
    out: &mut W,
) -> io::Result<Flow> {
    writeln!(out, "Add/Update an entry (leave optional fields blank).")?;
    let Some(name) = prompt(input, out, "Name (e.g., France): ")? else {
        return Ok(Flow::Quit);
    };
    let Some(ppp) = prompt(input, out, "PPP value (e.g., 3,636,000,000,000): ")? else {
        return Ok(Flow::Quit);
    };
    let Some(rank) = prompt(input, out, "Rank (e.g., 10): ")? else {
        return Ok(Flow::Quit);
    };
    let mut record = Record::new(name, parse_amount(&ppp), parse_rank(&rank));

    if manager.schema().is_extended() {
        let Some(slug) = prompt(input, out, "Slug (e.g., france): ")? else {
            return Ok(Flow::Quit);
        };
        let Some(date) = prompt(input, out, "Date of information (e.g., 2024): ")? else {
            return Ok(Flow::Quit);
        };
        let Some(region) = prompt(input, out, "Region (e.g., Europe): ")? else {
            return Ok(Flow::Quit);
        };
        record = record.with_slug(slug).with_date(date).with_region(region);
    }

    match manager.add_or_update(record) {
        Ok(()) => writeln!(out, "Updated in memory and saved to file.\n")?,
        Err(err) => report_error(out, &err)?,
    }
    Ok(Flow::Continue)
}

fn compare_two<R: BufRead, W: Write>(manager: &Manager, input: &mut R, out: &mut W) -> io::Result<Flow> {
    let Some(first) = prompt(input, out, "First country (name or slug): ")? else {
        return Ok(Flow::Quit);
    };
    let Some(second) = prompt(input, out, "Second country (name or slug): ")? else {
        return Ok(Flow::Quit);
    };
    let comparison = match manager.compare(&first, &second) {
        Ok(comparison) => comparison,
        Err(OpError::NotFound(_)) => {
            writeln!(out, "One or both countries not found.\n")?;
            return Ok(Flow::Continue);
        }
        Err(err) => {
            report_error(out, &err)?;
            return Ok(Flow::Continue);
        }
    };
    writeln!(out, "\n--- Comparison ---")?;
    print_comparison(out, &comparison)?;
    writeln!(out)?;
    Ok(Flow::Continue)
}

fn combined_ppp<R: BufRead, W: Write>(manager: &Manager, input: &mut R, out: &mut W) -> io::Result<Flow> {
    let Some(line) = prompt(input, out, "Enter countries (names or slugs) separated by commas: ")? else {
        return Ok(Flow::Quit);
    };
    let combined = manager.combined_total(&split_queries(&line));
    writeln!(out, "\n--- Combined PPP ---")?;
    print_combined(out, &combined)?;
    writeln!(out)?;
    Ok(Flow::Continue)
}

fn delete_entry<R: BufRead, W: Write>(
    manager: &mut Manager,
    input: &mut R,
    out: &mut W,
) -> io::Result<Flow> {
    let Some(query) = prompt(input, out, "Country to delete (name or slug): ")? else {
        return Ok(Flow::Quit);
    };
    match manager.delete(&query) {
        Ok(record) => writeln!(
            out,
            "Deleted '{}' from memory and file. Stored in '{}'.\n",
            record.name,
            manager.deleted_path().display()
        )?,
        Err(err) => report_error(out, &err)?,
    }
    Ok(Flow::Continue)
}

fn merge_deleted_back<W: Write>(manager: &mut Manager, out: &mut W) -> io::Result<Flow> {
    match manager.restore_all() {
        Ok(report) if report.archive_was_empty() => writeln!(out, "No deleted items to merge.\n")?,
        Ok(report) if report.restored.is_empty() => {
            writeln!(out, "Nothing to restore (all were duplicates).\n")?
        }
        Ok(report) => writeln!(out, "Restored: {}\n", report.restored.join(", "))?,
        Err(err) => report_error(out, &err)?,
    }
    Ok(Flow::Continue)
}

/// Run the menu until the user picks quit or input ends.
pub fn run_shell<R: BufRead, W: Write>(manager: &mut Manager, mut input: R, mut out: W) -> io::Result<()> {
    writeln!(out, "Loaded {} countries into cache.\n", manager.len())?;
    loop {
        writeln!(out, "{MENU}")?;
        let Some(choice) = prompt(&mut input, &mut out, "Choose an option (1-7): ")? else {
            break;
        };
        let flow = match choice.as_str() {
            "1" => show_country(manager, &mut input, &mut out)?,
            "2" => update_country(manager, &mut input, &mut out)?,
            "3" => compare_two(manager, &mut input, &mut out)?,
            "4" => combined_ppp(manager, &mut input, &mut out)?,
            "5" => delete_entry(manager, &mut input, &mut out)?,
            "6" => merge_deleted_back(manager, &mut out)?,
            "7" => {
                writeln!(out, "Goodbye!")?;
                Flow::Quit
            }
            _ => {
                writeln!(out, "Invalid choice. Try again.\n")?;
                Flow::Continue
            }
        };
        if flow == Flow::Quit {
            break;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;

    fn rendered(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn comparison_lists_both_sides_then_verdict() {
        let comparison = Comparison {
            first: Record::new("Chile", 612_000_000_000.0, 41),
            second: Record::new("Peru", 540_000_000_000.0, 47),
            ordering: Ordering::Greater,
        };
        assert_eq!(
            rendered(|out| print_comparison(out, &comparison)),
            "Chile: PPP=612,000,000,000, Rank=41\n\
             Peru: PPP=540,000,000,000, Rank=47\n\
             => Chile has higher PPP.\n"
        );
    }

    #[test]
    fn combined_output_covers_hits_misses_and_nothing_found() {
        let combined = CombinedTotal {
            total: 1_500.0,
            found: vec![Record::new("A", 1_000.0, 1), Record::new("B", 500.0, 2)],
            missing: vec!["Mordor".to_string()],
        };
        assert_eq!(
            rendered(|out| print_combined(out, &combined)),
            "Countries: A, B\nCombined PPP: 1,500\nMissing: Mordor\n"
        );

        let nothing = CombinedTotal {
            missing: vec!["x".to_string(), "y".to_string()],
            ..CombinedTotal::default()
        };
        assert_eq!(
            rendered(|out| print_combined(out, &nothing)),
            "No valid countries found.\nMissing: x, y\n"
        );
    }
}
