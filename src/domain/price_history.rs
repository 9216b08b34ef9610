//! Daily closing price series.

use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    closes: BTreeMap<NaiveDate, f64>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a close; a second close for the same date overwrites the first.
    pub fn insert(&mut self, date: NaiveDate, close: f64) {
        self.closes.insert(date, close);
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.closes.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.closes.keys().next_back().copied()
    }

    pub fn get(&self, date: &NaiveDate) -> Option<f64> {
        self.closes.get(date).copied()
    }

    /// Closes in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.closes.iter().map(|(d, c)| (*d, *c))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.closes.keys().copied()
    }

    /// Keep only closes within `days` calendar days of the newest close.
    /// A window reaching past the calendar keeps the whole history.
    pub fn trailing_days(&self, days: i64) -> Self {
        let Some(last) = self.last_date() else {
            return Self::new();
        };
        let Some(cutoff) =
            chrono::TimeDelta::try_days(days).and_then(|span| last.checked_sub_signed(span))
        else {
            return self.clone();
        };
        Self {
            closes: self.closes.range(cutoff..).map(|(d, c)| (*d, *c)).collect(),
        }
    }

    /// Simple returns keyed by the later date of each consecutive pair.
    pub fn returns(&self) -> BTreeMap<NaiveDate, f64> {
        let mut out = BTreeMap::new();
        let mut prev: Option<f64> = None;
        for (date, close) in self.iter() {
            if let Some(p) = prev {
                out.insert(date, close / p - 1.0);
            }
            prev = Some(close);
        }
        out
    }
}

impl FromIterator<(NaiveDate, f64)> for PriceHistory {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        Self {
            closes: iter.into_iter().collect(),
        }
    }
}
