//! The two CSV layouts the PPP files come in, and how rows map to [`Record`]s in each.
//!
//! Simple:   `country,ppp,rank`
//! Extended: `name,slug,value,date_of_information,ranking,region`
//!
//! Header matching is case-insensitive. The simple layout also accepts a few alternate
//! column names per field; when several are present the first non-empty cell wins.

use std::fmt;
use std::io;

use csv::StringRecord;
use serde::Serialize;

use crate::data::amount::{format_grouped, parse_amount, parse_rank, whole_units};
use crate::data::record::Record;

pub const SIMPLE_COLUMNS: [&str; 3] = ["country", "ppp", "rank"];
pub const EXTENDED_COLUMNS: [&str; 6] = [
    "name",
    "slug",
    "value",
    "date_of_information",
    "ranking",
    "region",
];

const SIMPLE_NAME_ALIASES: &[&str] = &["country", "name"];
const SIMPLE_PPP_ALIASES: &[&str] = &["ppp", "value", "ppp (int$)"];
const SIMPLE_RANK_ALIASES: &[&str] = &["rank", "ranking"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Schema {
    #[default]
    Simple,
    Extended,
}

impl Schema {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Extended => "extended",
        }
    }

    /// Column names in write order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Simple => &SIMPLE_COLUMNS,
            Self::Extended => &EXTENDED_COLUMNS,
        }
    }

    /// Whether slug, date and region are meaningful under this layout.
    pub fn is_extended(&self) -> bool {
        matches!(self, Self::Extended)
    }

    pub fn write_header<W: io::Write>(&self, writer: &mut csv::Writer<W>) -> csv::Result<()> {
        writer.write_record(self.columns())
    }

    /// Write one record in this layout. Extended writes `value` with thousands grouping,
    /// simple writes `ppp` as a bare integer.
    pub fn write_row<W: io::Write>(
        &self,
        writer: &mut csv::Writer<W>,
        record: &Record,
    ) -> csv::Result<()> {
        match self {
            Self::Simple => writer.serialize(SimpleRow {
                country: &record.name,
                ppp: whole_units(record.ppp),
                rank: record.rank,
            }),
            Self::Extended => writer.serialize(ExtendedRow {
                name: &record.name,
                slug: &record.slug,
                value: format_grouped(whole_units(record.ppp)),
                date_of_information: &record.date,
                ranking: record.rank,
                region: &record.region,
            }),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Serialize)]
struct SimpleRow<'a> {
    country: &'a str,
    ppp: i64,
    rank: i64,
}

#[derive(Serialize)]
struct ExtendedRow<'a> {
    name: &'a str,
    slug: &'a str,
    value: String,
    date_of_information: &'a str,
    ranking: i64,
    region: &'a str,
}

/// CSV writer for PPP files. Headers are written explicitly via [`Schema::write_header`] so an
/// empty store still produces a header row and appends never repeat it.
pub fn csv_writer<W: io::Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(inner)
}

fn clean_header(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}

/// Extended when all six extended columns are present (any order, any case); simple otherwise.
pub fn detect_schema<'a, I>(headers: I) -> Schema
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<String> = headers
        .into_iter()
        .map(|h| clean_header(h).to_lowercase())
        .collect();
    let all_extended = EXTENDED_COLUMNS
        .iter()
        .all(|column| present.iter().any(|h| h == column));
    if all_extended {
        Schema::Extended
    } else {
        Schema::Simple
    }
}

/// Header positions for each record field, in alias priority order.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    name: Vec<usize>,
    ppp: Vec<usize>,
    rank: Vec<usize>,
    slug: Vec<usize>,
    date: Vec<usize>,
    region: Vec<usize>,
}

fn positions(headers: &StringRecord, aliases: &[&str]) -> Vec<usize> {
    let mut found = Vec::new();
    for alias in aliases {
        for (i, header) in headers.iter().enumerate() {
            if clean_header(header).eq_ignore_ascii_case(alias) && !found.contains(&i) {
                found.push(i);
            }
        }
    }
    found
}

fn first_non_empty<'r>(row: &'r StringRecord, columns: &[usize]) -> &'r str {
    columns
        .iter()
        .filter_map(|&i| row.get(i))
        .map(str::trim)
        .find(|cell| !cell.is_empty())
        .unwrap_or("")
}

impl ColumnMap {
    pub fn resolve(schema: Schema, headers: &StringRecord) -> Self {
        match schema {
            Schema::Simple => ColumnMap {
                name: positions(headers, SIMPLE_NAME_ALIASES),
                ppp: positions(headers, SIMPLE_PPP_ALIASES),
                rank: positions(headers, SIMPLE_RANK_ALIASES),
                ..ColumnMap::default()
            },
            Schema::Extended => ColumnMap {
                name: positions(headers, &["name"]),
                ppp: positions(headers, &["value"]),
                rank: positions(headers, &["ranking"]),
                slug: positions(headers, &["slug"]),
                date: positions(headers, &["date_of_information"]),
                region: positions(headers, &["region"]),
            },
        }
    }

    /// Build a record from one data row. Strings are trimmed, numbers normalized.
    pub fn read_record(&self, row: &StringRecord) -> Record {
        Record {
            name: first_non_empty(row, &self.name).to_string(),
            ppp: parse_amount(first_non_empty(row, &self.ppp)),
            rank: parse_rank(first_non_empty(row, &self.rank)),
            slug: first_non_empty(row, &self.slug).to_string(),
            date: first_non_empty(row, &self.date).to_string(),
            region: first_non_empty(row, &self.region).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_schema_needs_all_six_extended_columns() {
        let extended = ["Region", "NAME", "slug", "Value", "date_of_information", "ranking"];
        assert_eq!(detect_schema(extended), Schema::Extended);

        let missing_region = ["name", "slug", "value", "date_of_information", "ranking"];
        assert_eq!(detect_schema(missing_region), Schema::Simple);

        assert_eq!(detect_schema(["country", "ppp", "rank"]), Schema::Simple);
        assert_eq!(detect_schema(Vec::<&str>::new()), Schema::Simple);
    }

    #[test]
    fn detect_schema_ignores_bom_and_padding() {
        let headers = ["\u{feff}name", " slug ", "value", "date_of_information", "ranking", "region"];
        assert_eq!(detect_schema(headers), Schema::Extended);
    }

    #[test]
    fn simple_columns_accept_alternate_names() {
        let headers = StringRecord::from(vec!["Country", "PPP (Int$)", "Ranking"]);
        let map = ColumnMap::resolve(Schema::Simple, &headers);
        let row = StringRecord::from(vec![" Chile ", "$612,000,000,000", "41"]);
        let record = map.read_record(&row);
        assert_eq!(record.name, "Chile");
        assert_eq!(record.ppp, 612_000_000_000.0);
        assert_eq!(record.rank, 41);
        assert!(record.slug.is_empty());
    }

    #[test]
    fn simple_name_falls_through_to_next_alias_when_empty() {
        let headers = StringRecord::from(vec!["country", "name", "ppp", "rank"]);
        let map = ColumnMap::resolve(Schema::Simple, &headers);
        let row = StringRecord::from(vec!["", "Peru", "10", "x"]);
        let record = map.read_record(&row);
        assert_eq!(record.name, "Peru");
        assert_eq!(record.rank, 0);
    }

    #[test]
    fn extended_row_reads_all_fields() {
        let headers = StringRecord::from(EXTENDED_COLUMNS.to_vec());
        let map = ColumnMap::resolve(Schema::Extended, &headers);
        let row = StringRecord::from(vec![
            "China",
            "china",
            "$33,598,000,000,000",
            "2023",
            "1",
            "East and Southeast Asia",
        ]);
        let record = map.read_record(&row);
        assert_eq!(record.slug, "china");
        assert_eq!(record.ppp, 33_598_000_000_000.0);
        assert_eq!(record.date, "2023");
        assert_eq!(record.region, "East and Southeast Asia");
    }

    #[test]
    fn short_rows_yield_defaults() {
        let headers = StringRecord::from(vec!["country", "ppp", "rank"]);
        let map = ColumnMap::resolve(Schema::Simple, &headers);
        let record = map.read_record(&StringRecord::from(vec!["Fiji"]));
        assert_eq!(record, Record::new("Fiji", 0.0, 0));
    }

    #[test]
    fn rows_are_written_in_schema_layout() {
        let record = Record::new("India", 16_020_000_000_000.4, 3)
            .with_slug("india")
            .with_date("2023")
            .with_region("South Asia");

        let mut simple = csv_writer(Vec::new());
        Schema::Simple.write_header(&mut simple).unwrap();
        Schema::Simple.write_row(&mut simple, &record).unwrap();
        simple.flush().unwrap();
        let simple = String::from_utf8(simple.get_ref().clone()).unwrap();
        assert_eq!(simple, "country,ppp,rank\nIndia,16020000000000,3\n");

        let mut extended = csv_writer(Vec::new());
        Schema::Extended.write_header(&mut extended).unwrap();
        Schema::Extended.write_row(&mut extended, &record).unwrap();
        extended.flush().unwrap();
        let extended = String::from_utf8(extended.get_ref().clone()).unwrap();
        assert_eq!(
            extended,
            "name,slug,value,date_of_information,ranking,region\n\
             India,india,\"16,020,000,000,000\",2023,3,South Asia\n"
        );
    }
}
