use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::filter::SortKey;
use super::model::{Listing, Table};

/// Histogram covers MSRP in `[0, PRICE_CAP]`; pricier rows are left out.
pub const PRICE_CAP: f64 = 100_000.0;
pub const PRICE_BINS: usize = 15;

/// Placeholder shown when a mean has no values to average.
pub const NO_DATA: &str = "no data";

// ---------------------------------------------------------------------------
// Small numeric helpers
// ---------------------------------------------------------------------------

/// Mean of the present values, `None` when there are none.
fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, n) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn within(values: &[f64], lo: f64, hi: f64) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(move |v| (lo..=hi).contains(v))
}

// ---------------------------------------------------------------------------
// Brand popularity
// ---------------------------------------------------------------------------

/// Mean Popularity per Make, most popular first.
pub fn brand_popularity(table: &Table) -> Vec<(String, f64)> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for listing in table.iter() {
        let (Some(make), Some(pop)) = (listing.make.as_deref(), listing.popularity) else {
            continue;
        };
        let entry = groups.entry(make).or_default();
        entry.0 += pop;
        entry.1 += 1;
    }

    let mut means: Vec<(String, f64)> = groups
        .into_iter()
        .map(|(make, (sum, n))| (make.to_string(), sum / n as f64))
        .collect();
    means.sort_by(|a, b| b.1.total_cmp(&a.1));
    means
}

// ---------------------------------------------------------------------------
// Price distribution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistogram {
    /// `PRICE_BINS + 1` ascending edges from 0 to `PRICE_CAP`.
    pub edges: Vec<f64>,
    /// One count per bin.
    pub counts: Vec<usize>,
}

impl PriceHistogram {
    pub fn bin_width(&self) -> f64 {
        PRICE_CAP / PRICE_BINS as f64
    }

    /// Edge labels in thousands: `$0k`, `$6k`, … `$100k`.
    pub fn edge_labels(&self) -> Vec<String> {
        self.edges.iter().map(|e| thousands_label(*e)).collect()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

pub fn thousands_label(value: f64) -> String {
    format!("${}k", (value / 1000.0) as i64)
}

/// Bin MSRP in `[0, PRICE_CAP]` into `PRICE_BINS` equal-width bins.
/// The last bin is closed on the right.
pub fn price_distribution(table: &Table) -> PriceHistogram {
    let width = PRICE_CAP / PRICE_BINS as f64;
    let edges = (0..=PRICE_BINS).map(|i| i as f64 * width).collect();
    let mut counts = vec![0; PRICE_BINS];

    for msrp in table.iter().filter_map(|l| l.msrp) {
        if !(0.0..=PRICE_CAP).contains(&msrp) {
            continue;
        }
        let bin = ((msrp / width) as usize).min(PRICE_BINS - 1);
        counts[bin] += 1;
    }

    PriceHistogram { edges, counts }
}

// ---------------------------------------------------------------------------
// Price by market category
// ---------------------------------------------------------------------------

/// One `(tag, listing)` pair per market category tag of every row.
///
/// Rows without tags contribute nothing. Calling again restarts the walk.
pub fn explode_categories(table: &Table) -> impl Iterator<Item = (&str, &Listing)> + '_ {
    table.iter().flat_map(|listing| {
        listing
            .market_category
            .iter()
            .map(move |tag| (tag.as_str(), listing))
    })
}

/// Box-plot statistics for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBox {
    pub category: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Most extreme values within 1.5 × IQR of the quartiles.
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    /// Values beyond the whiskers (not drawn).
    pub outliers: usize,
}

impl CategoryBox {
    /// `None` for an empty sample.
    pub fn from_values(category: &str, mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let q1 = quantile(&values, 0.25);
        let median = quantile(&values, 0.5);
        let q3 = quantile(&values, 0.75);
        let reach = 1.5 * (q3 - q1);
        let (low_fence, high_fence) = (q1 - reach, q3 + reach);

        // Quartiles always lie inside the fences, so at least one value does too.
        let lower_whisker = within(&values, low_fence, high_fence).next().unwrap_or(q1);
        let upper_whisker = within(&values, low_fence, high_fence).last().unwrap_or(q3);
        let inside = within(&values, low_fence, high_fence).count();

        Some(CategoryBox {
            category: category.to_string(),
            count: values.len(),
            min: values[0],
            q1,
            median,
            q3,
            max: values[values.len() - 1],
            lower_whisker,
            upper_whisker,
            outliers: values.len() - inside,
        })
    }
}

/// Per-tag MSRP boxes over unclipped prices, highest median first.
pub fn price_by_category(table: &Table) -> Vec<CategoryBox> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (tag, listing) in explode_categories(table) {
        if let Some(msrp) = listing.msrp {
            groups.entry(tag).or_default().push(msrp);
        }
    }

    let mut boxes: Vec<CategoryBox> = groups
        .into_iter()
        .filter_map(|(tag, values)| CategoryBox::from_values(tag, values))
        .collect();
    boxes.sort_by(|a, b| b.median.total_cmp(&a.median));
    boxes
}

// ---------------------------------------------------------------------------
// Top-N ranking
// ---------------------------------------------------------------------------

/// Projection of a listing shown in the ranking table.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedListing {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub msrp: Option<f64>,
    pub engine_hp: Option<f64>,
    pub popularity: Option<f64>,
}

impl From<&Listing> for RankedListing {
    fn from(l: &Listing) -> Self {
        RankedListing {
            make: l.make.clone(),
            model: l.model.clone(),
            year: l.year,
            msrp: l.msrp,
            engine_hp: l.engine_hp,
            popularity: l.popularity,
        }
    }
}

fn sort_value(listing: &Listing, key: SortKey) -> Option<f64> {
    match key {
        SortKey::Popularity => listing.popularity,
        SortKey::Msrp => listing.msrp,
    }
}

/// First `n` rows by `key`, descending. Stable, missing keys last.
pub fn top_n(table: &Table, key: SortKey, n: usize) -> Vec<RankedListing> {
    let mut rows: Vec<&Listing> = table.iter().collect();
    rows.sort_by(|a, b| match (sort_value(a, key), sort_value(b, key)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows.into_iter().take(n).map(RankedListing::from).collect()
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryMetrics {
    pub count: usize,
    pub mean_msrp: Option<f64>,
    pub mean_engine_hp: Option<f64>,
    pub mean_city_mpg: Option<f64>,
    pub mean_highway_mpg: Option<f64>,
}

impl SummaryMetrics {
    pub fn compute(table: &Table) -> Self {
        SummaryMetrics {
            count: table.len(),
            mean_msrp: mean(table.iter().map(|l| l.msrp)),
            mean_engine_hp: mean(table.iter().map(|l| l.engine_hp)),
            mean_city_mpg: mean(table.iter().map(|l| l.city_mpg)),
            mean_highway_mpg: mean(table.iter().map(|l| l.highway_mpg)),
        }
    }

    /// `(label, formatted value)` for each metric card, in display order.
    pub fn cards(&self) -> [(&'static str, String); 5] {
        [
            ("Number of Cars", self.count.to_string()),
            ("Average MSRP", format_currency(self.mean_msrp)),
            ("Average Engine HP", format_decimal(self.mean_engine_hp)),
            ("Average City MPG", format_decimal(self.mean_city_mpg)),
            ("Average Highway MPG", format_decimal(self.mean_highway_mpg)),
        ]
    }
}

/// `$12,345`, or [`NO_DATA`].
pub fn format_currency(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return NO_DATA.to_string();
    };
    let rounded = v.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

/// One decimal place, or [`NO_DATA`].
pub fn format_decimal(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map_or_else(|| NO_DATA.to_string(), |v| format!("{v:.1}"))
}

// ---------------------------------------------------------------------------
// Everything the dashboard draws, computed in one pass over the filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DashboardViews {
    pub brand_popularity: Vec<(String, f64)>,
    pub price_histogram: PriceHistogram,
    pub category_boxes: Vec<CategoryBox>,
    pub top: Vec<RankedListing>,
    pub summary: SummaryMetrics,
}

impl DashboardViews {
    pub fn compute(table: &Table, key: SortKey, n: usize) -> Self {
        DashboardViews {
            brand_popularity: brand_popularity(table),
            price_histogram: price_distribution(table),
            category_boxes: price_by_category(table),
            top: top_n(table, key, n),
            summary: SummaryMetrics::compute(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::*;
    use crate::data::model::Dataset;

    fn priced(msrps: &[f64]) -> Dataset {
        Dataset::from_listings(
            msrps
                .iter()
                .enumerate()
                .map(|(i, &m)| listing("Make", &format!("M{i}"), 2015, "MANUAL", "diesel", m, 100.0))
                .collect(),
        )
    }

    fn tagged(msrp: f64, tags: &[&str]) -> Listing {
        let mut l = listing("Make", "Model", 2015, "MANUAL", "diesel", msrp, 1.0);
        l.market_category = tags.iter().map(|t| t.to_string()).collect();
        l
    }

    #[test]
    fn brand_popularity_sorted_descending() {
        let table = Table::full(&sample_dataset());
        let pop = brand_popularity(&table);
        let makes: Vec<&str> = pop.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(makes, vec!["BMW", "Audi", "Honda", "Tesla"]);
        assert_eq!(pop[0].1, 3916.0);
    }

    #[test]
    fn brand_popularity_averages_within_group() {
        let ds = Dataset::from_listings(vec![
            listing("Kia", "Rio", 2015, "MANUAL", "diesel", 1.0, 100.0),
            listing("Kia", "Soul", 2015, "MANUAL", "diesel", 1.0, 300.0),
            listing("Fiat", "500", 2015, "MANUAL", "diesel", 1.0, 150.0),
        ]);
        let pop = brand_popularity(&Table::full(&ds));
        assert_eq!(pop, vec![("Kia".to_string(), 200.0), ("Fiat".to_string(), 150.0)]);
    }

    #[test]
    fn brand_without_popularity_is_left_out() {
        let mut unscored = listing("Lada", "Niva", 2015, "MANUAL", "diesel", 9000.0, 0.0);
        unscored.popularity = None;
        let mut partly = listing("Kia", "Soul", 2015, "MANUAL", "diesel", 1.0, 0.0);
        partly.popularity = None;
        let ds = Dataset::from_listings(vec![
            unscored.clone(),
            unscored,
            listing("Kia", "Rio", 2015, "MANUAL", "diesel", 1.0, 120.0),
            partly,
        ]);

        let pop = brand_popularity(&Table::full(&ds));
        assert_eq!(pop, vec![("Kia".to_string(), 120.0)]);
    }

    #[test]
    fn histogram_excludes_prices_above_cap() {
        let hist = price_distribution(&Table::full(&priced(&[5000.0, 50000.0, 150000.0])));
        assert_eq!(hist.counts.len(), PRICE_BINS);
        assert_eq!(hist.edges.len(), PRICE_BINS + 1);
        assert_eq!(hist.total(), 2);
        assert_eq!(hist.counts[0], 1);
        assert_eq!(hist.counts[7], 1);
    }

    #[test]
    fn histogram_closes_last_bin() {
        let hist = price_distribution(&Table::full(&priced(&[100_000.0, 0.0])));
        assert_eq!(hist.counts[PRICE_BINS - 1], 1);
        assert_eq!(hist.counts[0], 1);
    }

    #[test]
    fn histogram_labels_in_thousands() {
        let hist = price_distribution(&Table::full(&priced(&[])));
        let labels = hist.edge_labels();
        assert_eq!(labels.first().map(String::as_str), Some("$0k"));
        assert_eq!(labels[1], "$6k");
        assert_eq!(labels.last().map(String::as_str), Some("$100k"));
    }

    #[test]
    fn explode_emits_one_pair_per_tag() {
        let ds = Dataset::from_listings(vec![
            tagged(50000.0, &["Luxury", "Performance"]),
            tagged(20000.0, &[]),
        ]);
        let table = Table::full(&ds);
        let tags: Vec<&str> = explode_categories(&table).map(|(t, _)| t).collect();
        assert_eq!(tags, vec!["Luxury", "Performance"]);
        // restartable
        assert_eq!(explode_categories(&table).count(), 2);

        let boxes = price_by_category(&table);
        assert_eq!(boxes.len(), 2);
        assert!(boxes.iter().all(|b| b.count == 1 && b.median == 50000.0));
    }

    #[test]
    fn category_boxes_use_unclipped_prices_and_sort_by_median() {
        let ds = Dataset::from_listings(vec![
            tagged(20000.0, &["Hatchback"]),
            tagged(30000.0, &["Hatchback"]),
            tagged(250000.0, &["Exotic"]),
            tagged(150000.0, &["Exotic"]),
        ]);
        let boxes = price_by_category(&Table::full(&ds));
        assert_eq!(boxes[0].category, "Exotic");
        assert_eq!(boxes[0].median, 200000.0);
        assert_eq!(boxes[1].category, "Hatchback");
        assert_eq!(boxes[1].median, 25000.0);
    }

    #[test]
    fn tagged_listings_without_msrp_are_skipped() {
        let mut unpriced = tagged(0.0, &["Hybrid", "Luxury"]);
        unpriced.msrp = None;
        let mut unpriced_only = tagged(0.0, &["Diesel"]);
        unpriced_only.msrp = None;
        let ds = Dataset::from_listings(vec![
            tagged(40000.0, &["Luxury"]),
            unpriced,
            tagged(60000.0, &["Luxury"]),
            unpriced_only,
        ]);

        let boxes = price_by_category(&Table::full(&ds));
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].category, "Luxury");
        assert_eq!(boxes[0].count, 2);
        assert_eq!(boxes[0].median, 50000.0);
    }

    #[test]
    fn box_quartiles_interpolate_and_whiskers_skip_outliers() {
        let b = CategoryBox::from_values("X", vec![5.0, 1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(b.min, 1.0);
        assert_eq!(b.max, 100.0);
        assert_eq!(b.q1, 2.25);
        assert_eq!(b.median, 3.5);
        assert_eq!(b.q3, 4.75);
        assert_eq!(b.lower_whisker, 1.0);
        assert_eq!(b.upper_whisker, 5.0);
        assert_eq!(b.outliers, 1);
        assert!(CategoryBox::from_values("empty", Vec::new()).is_none());
    }

    #[test]
    fn top_n_truncates_and_sorts_by_msrp() {
        let table = Table::full(&priced(&[20000.0, 90000.0, 45000.0]));
        let top = top_n(&table, SortKey::Msrp, 5);
        let prices: Vec<Option<f64>> = top.iter().map(|r| r.msrp).collect();
        assert_eq!(prices, vec![Some(90000.0), Some(45000.0), Some(20000.0)]);
    }

    #[test]
    fn top_n_is_stable_for_ties() {
        let table = Table::full(&sample_dataset());
        let top = top_n(&table, SortKey::Popularity, 5);
        let models: Vec<&str> = top.iter().filter_map(|r| r.model.as_deref()).collect();
        assert_eq!(models, vec!["1 Series", "M3", "A4", "R8", "Civic"]);
    }

    #[test]
    fn top_n_puts_missing_keys_last() {
        let mut rows = vec![listing("A", "a", 2015, "MANUAL", "diesel", 1.0, 1.0)];
        rows[0].popularity = None;
        rows.push(listing("B", "b", 2015, "MANUAL", "diesel", 1.0, 5.0));
        let top = top_n(&Table::full(&Dataset::from_listings(rows)), SortKey::Popularity, 10);
        assert_eq!(top[0].make.as_deref(), Some("B"));
        assert_eq!(top[1].popularity, None);
    }

    #[test]
    fn empty_table_degrades_to_no_data() {
        let ds = sample_dataset();
        let empty = Table::full(&ds).narrow(|_| false);
        let views = DashboardViews::compute(&empty, SortKey::Msrp, 10);

        assert!(views.brand_popularity.is_empty());
        assert!(views.price_histogram.is_empty());
        assert!(views.category_boxes.is_empty());
        assert!(views.top.is_empty());
        assert_eq!(views.summary.count, 0);

        let cards = views.summary.cards();
        assert_eq!(cards[0].1, "0");
        assert!(cards[1..].iter().all(|(_, v)| v == NO_DATA));
    }

    #[test]
    fn summary_formats_means() {
        let table = Table::full(&priced(&[20000.0, 25000.0]));
        let cards = SummaryMetrics::compute(&table).cards();
        assert_eq!(cards[0].1, "2");
        assert_eq!(cards[1].1, "$22,500");
        assert_eq!(cards[2].1, "200.0");
        assert_eq!(cards[4].1, "30.0");
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(Some(999.4)), "$999");
        assert_eq!(format_currency(Some(1_234_567.0)), "$1,234,567");
        assert_eq!(format_currency(None), NO_DATA);
    }

    #[test]
    fn non_finite_values_format_as_no_data() {
        assert_eq!(format_currency(Some(f64::NAN)), NO_DATA);
        assert_eq!(format_currency(Some(f64::INFINITY)), NO_DATA);
        assert_eq!(format_decimal(Some(f64::NAN)), NO_DATA);
        assert_eq!(format_decimal(Some(f64::NEG_INFINITY)), NO_DATA);
        assert_eq!(format_decimal(Some(24.0)), "24.0");
    }
}
