use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Column names as they appear in the cleaned source dataset
// ---------------------------------------------------------------------------

pub const COL_MAKE: &str = "Make";
pub const COL_MODEL: &str = "Model";
pub const COL_YEAR: &str = "Year";
pub const COL_TRANSMISSION: &str = "Transmission Type";
pub const COL_FUEL_TYPE: &str = "Engine Fuel Type";
pub const COL_ENGINE_HP: &str = "Engine HP";
pub const COL_CITY_MPG: &str = "city mpg";
pub const COL_HIGHWAY_MPG: &str = "highway MPG";
pub const COL_MSRP: &str = "MSRP";
pub const COL_POPULARITY: &str = "Popularity";
pub const COL_MARKET_CATEGORY: &str = "Market Category";

/// Columns a dataset must carry to be usable at all.
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_MAKE, COL_MODEL, COL_YEAR, COL_MSRP];

/// Display order of the full listings table.
pub const ALL_COLUMNS: [&str; 11] = [
    COL_MAKE,
    COL_MODEL,
    COL_YEAR,
    COL_TRANSMISSION,
    COL_FUEL_TYPE,
    COL_ENGINE_HP,
    COL_CITY_MPG,
    COL_HIGHWAY_MPG,
    COL_MSRP,
    COL_POPULARITY,
    COL_MARKET_CATEGORY,
];

// ---------------------------------------------------------------------------
// Listing – one row of the dataset
// ---------------------------------------------------------------------------

/// A single car listing. Every scalar may be missing in the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    pub engine_hp: Option<f64>,
    pub city_mpg: Option<f64>,
    pub highway_mpg: Option<f64>,
    pub msrp: Option<f64>,
    pub popularity: Option<f64>,
    /// Zero or more market category tags.
    pub market_category: Vec<String>,
}

impl Listing {
    /// Render one cell of the listings table, `""` for nulls.
    pub fn cell(&self, column: &str) -> String {
        fn num(v: Option<f64>) -> String {
            v.map(|v| format!("{v}")).unwrap_or_default()
        }
        match column {
            COL_MAKE => self.make.clone().unwrap_or_default(),
            COL_MODEL => self.model.clone().unwrap_or_default(),
            COL_YEAR => self.year.map(|y| y.to_string()).unwrap_or_default(),
            COL_TRANSMISSION => self.transmission.clone().unwrap_or_default(),
            COL_FUEL_TYPE => self.fuel_type.clone().unwrap_or_default(),
            COL_ENGINE_HP => num(self.engine_hp),
            COL_CITY_MPG => num(self.city_mpg),
            COL_HIGHWAY_MPG => num(self.highway_mpg),
            COL_MSRP => num(self.msrp),
            COL_POPULARITY => num(self.popularity),
            COL_MARKET_CATEGORY => self.market_category.join(", "),
            _ => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// CategoricalField – the string columns driving the cascading filters
// ---------------------------------------------------------------------------

/// Multi-select filter fields, listed in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    Make,
    Model,
    Transmission,
    FuelType,
}

impl CategoricalField {
    pub const CASCADE: [CategoricalField; 4] = [
        CategoricalField::Make,
        CategoricalField::Model,
        CategoricalField::Transmission,
        CategoricalField::FuelType,
    ];

    pub fn value<'a>(&self, listing: &'a Listing) -> Option<&'a str> {
        match self {
            CategoricalField::Make => listing.make.as_deref(),
            CategoricalField::Model => listing.model.as_deref(),
            CategoricalField::Transmission => listing.transmission.as_deref(),
            CategoricalField::FuelType => listing.fuel_type.as_deref(),
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            CategoricalField::Make => COL_MAKE,
            CategoricalField::Model => COL_MODEL,
            CategoricalField::Transmission => COL_TRANSMISSION,
            CategoricalField::FuelType => COL_FUEL_TYPE,
        }
    }

    /// Sidebar label.
    pub fn label(&self) -> &'static str {
        match self {
            CategoricalField::Make => "Car Make",
            CategoricalField::Model => "Car Model",
            CategoricalField::Transmission => "Transmission Type",
            CategoricalField::FuelType => "Engine Fuel Type",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// Dataset – the loaded, immutable collection of listings
// ---------------------------------------------------------------------------

/// The full parsed dataset. Cloning shares the underlying rows.
#[derive(Debug, Clone)]
pub struct Dataset {
    listings: Arc<[Listing]>,
}

impl Dataset {
    pub fn from_listings(listings: Vec<Listing>) -> Self {
        Dataset {
            listings: listings.into(),
        }
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Whether two handles share the same rows.
    pub fn same_source(&self, other: &Dataset) -> bool {
        Arc::ptr_eq(&self.listings, &other.listings)
    }
}

impl Deref for Dataset {
    type Target = [Listing];

    fn deref(&self) -> &[Listing] {
        &self.listings
    }
}

// ---------------------------------------------------------------------------
// Table – an immutable, narrowed view over a dataset
// ---------------------------------------------------------------------------

/// Ordered row indices into a shared [`Dataset`].
///
/// Filtering never touches the dataset; it only produces a new `Table`
/// holding fewer indices, always in ascending source order.
#[derive(Debug, Clone)]
pub struct Table {
    source: Dataset,
    rows: Vec<usize>,
}

impl Table {
    /// A view over every row of `source`.
    pub fn full(source: &Dataset) -> Self {
        Table {
            source: source.clone(),
            rows: (0..source.len()).collect(),
        }
    }

    /// Keep the rows whose listing satisfies `keep`.
    pub fn narrow(&self, mut keep: impl FnMut(&Listing) -> bool) -> Table {
        let rows = self
            .rows
            .iter()
            .copied()
            .filter(|&i| keep(&self.source[i]))
            .collect();
        Table {
            source: self.source.clone(),
            rows,
        }
    }

    /// Source indices of the surviving rows.
    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    /// The `n`-th surviving listing.
    pub fn get(&self, n: usize) -> Option<&Listing> {
        self.rows.get(n).map(|&i| &self.source[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Listing> + '_ {
        self.rows.iter().map(move |&i| &self.source[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.source.same_source(&other.source) && self.rows == other.rows
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Compact listing constructor for tests.
    pub fn listing(
        make: &str,
        model: &str,
        year: i32,
        transmission: &str,
        fuel: &str,
        msrp: f64,
        popularity: f64,
    ) -> Listing {
        Listing {
            make: Some(make.to_string()),
            model: Some(model.to_string()),
            year: Some(year),
            transmission: Some(transmission.to_string()),
            fuel_type: Some(fuel.to_string()),
            engine_hp: Some(200.0),
            city_mpg: Some(20.0),
            highway_mpg: Some(30.0),
            msrp: Some(msrp),
            popularity: Some(popularity),
            market_category: Vec::new(),
        }
    }

    pub fn sample_dataset() -> Dataset {
        Dataset::from_listings(vec![
            listing("BMW", "1 Series", 2011, "MANUAL", "premium unleaded (required)", 46135.0, 3916.0),
            listing("BMW", "M3", 2015, "AUTOMATIC", "premium unleaded (required)", 64200.0, 3916.0),
            listing("Audi", "A4", 2014, "AUTOMATIC", "premium unleaded (recommended)", 35000.0, 3105.0),
            listing("Audi", "R8", 2016, "AUTOMATED_MANUAL", "premium unleaded (required)", 162900.0, 3105.0),
            listing("Honda", "Civic", 2017, "MANUAL", "regular unleaded", 19000.0, 2202.0),
            listing("Honda", "Accord", 2009, "AUTOMATIC", "regular unleaded", 23000.0, 2202.0),
            listing("Tesla", "Model S", 2016, "DIRECT_DRIVE", "electric", 79500.0, 1391.0),
        ])
    }
}
