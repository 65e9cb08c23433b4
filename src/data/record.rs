use crate::data::amount::{format_grouped, whole_units};

/// Normalize a name, slug or user query for lookup: trimmed and lowercased.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// One country's PPP entry. `slug`, `date` and `region` are only populated under the
/// extended schema; under the simple schema they stay empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub name: String,
    pub ppp: f64,
    /// 0 means unranked.
    pub rank: i64,
    pub slug: String,
    pub date: String,
    pub region: String,
}

impl Record {
    pub fn new(name: impl Into<String>, ppp: f64, rank: i64) -> Self {
        Record {
            name: name.into(),
            ppp,
            rank,
            ..Record::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Lookup keys this record is indexed under: normalized name, then normalized slug
    /// when present and different. Empty values contribute no key.
    pub fn index_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(2);
        for value in [&self.name, &self.slug] {
            let key = normalize_key(value);
            if !key.is_empty() && !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// True when `normalized_query` equals this record's normalized name or slug.
    /// An empty query matches nothing, so an absent slug is never a hit.
    pub fn matches_key(&self, normalized_query: &str) -> bool {
        if normalized_query.is_empty() {
            return false;
        }
        normalize_key(&self.name) == normalized_query || normalize_key(&self.slug) == normalized_query
    }

    /// PPP rendered the way it is displayed: integer part with thousands grouping.
    pub fn ppp_display(&self) -> String {
        format_grouped(whole_units(self.ppp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_keys_cover_name_and_slug_once() {
        let record = Record::new(" France ", 1.0, 1).with_slug("france-x");
        assert_eq!(record.index_keys(), vec!["france".to_string(), "france-x".to_string()]);

        let same = Record::new("Chad", 1.0, 1).with_slug("CHAD");
        assert_eq!(same.index_keys(), vec!["chad".to_string()]);

        assert!(Record::new("  ", 1.0, 1).index_keys().is_empty());
    }

    #[test]
    fn matches_key_checks_name_and_slug() {
        let record = Record::new("United States", 1.0, 1).with_slug("united-states");
        assert!(record.matches_key("united states"));
        assert!(record.matches_key("united-states"));
        assert!(!record.matches_key("usa"));
    }
}
