use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use super::model::{
    Dataset, Listing, COL_CITY_MPG, COL_ENGINE_HP, COL_FUEL_TYPE, COL_HIGHWAY_MPG, COL_MAKE,
    COL_MARKET_CATEGORY, COL_MODEL, COL_MSRP, COL_POPULARITY, COL_TRANSMISSION, COL_YEAR,
    REQUIRED_COLUMNS,
};

/// Problems with the shape of an input file, as opposed to I/O failures.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("{format} file is missing required column '{column}'")]
    MissingColumn {
        format: &'static str,
        column: &'static str,
    },
    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedType {
        column: &'static str,
        data_type: String,
    },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a listings dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per listing, `Market Category` as a list column
/// * `.json`    – `[{ "Make": ..., "Market Category": [...] }, ...]`
/// * `.csv`     – header row, `Market Category` as a delimited string
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let listings = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => Err(SchemaError::UnsupportedExtension(other.to_string()).into()),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!("Loaded {} listings from {}", listings.len(), path.display());
    Ok(Dataset::from_listings(listings))
}

/// Split a delimited category string (`"Luxury,Performance"`) into tags.
pub fn split_categories(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn year_from_f64(v: f64) -> Option<i32> {
    v.is_finite().then(|| v.round() as i32)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Market Category as written by `df.to_json(orient='records')`, either
/// already split or still a delimited string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCategories {
    List(Vec<Option<String>>),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawListing {
    #[serde(rename = "Make", default)]
    make: Option<String>,
    #[serde(rename = "Model", default)]
    model: Option<String>,
    #[serde(rename = "Year", default)]
    year: Option<f64>,
    #[serde(rename = "Transmission Type", default)]
    transmission: Option<String>,
    #[serde(rename = "Engine Fuel Type", default)]
    fuel_type: Option<String>,
    #[serde(rename = "Engine HP", default)]
    engine_hp: Option<f64>,
    #[serde(rename = "city mpg", default)]
    city_mpg: Option<f64>,
    #[serde(rename = "highway MPG", default)]
    highway_mpg: Option<f64>,
    #[serde(rename = "MSRP", default)]
    msrp: Option<f64>,
    #[serde(rename = "Popularity", default)]
    popularity: Option<f64>,
    #[serde(rename = "Market Category", default)]
    market_category: Option<RawCategories>,
}

impl From<RawListing> for Listing {
    fn from(raw: RawListing) -> Self {
        let market_category = match raw.market_category {
            Some(RawCategories::List(tags)) => tags
                .into_iter()
                .flatten()
                .filter(|t| !t.trim().is_empty())
                .collect(),
            Some(RawCategories::Text(s)) => split_categories(&s),
            None => Vec::new(),
        };
        Listing {
            make: raw.make,
            model: raw.model,
            year: raw.year.and_then(year_from_f64),
            transmission: raw.transmission,
            fuel_type: raw.fuel_type,
            engine_hp: raw.engine_hp,
            city_mpg: raw.city_mpg,
            highway_mpg: raw.highway_mpg,
            msrp: raw.msrp,
            popularity: raw.popularity,
            market_category,
        }
    }
}

fn load_json(path: &Path) -> Result<Vec<Listing>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let records: Vec<Map<String, JsonValue>> =
        serde_json::from_str(&text).context("expected a top-level JSON array of objects")?;

    records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| {
            // Every record must carry the required keys, even as null.
            if let Some(column) = REQUIRED_COLUMNS.into_iter().find(|c| !rec.contains_key(*c)) {
                let err = SchemaError::MissingColumn { format: "JSON", column };
                return Err(anyhow::Error::from(err).context(format!("Row {i}")));
            }
            serde_json::from_value::<RawListing>(JsonValue::Object(rec))
                .map(Listing::from)
                .with_context(|| format!("Row {i}: invalid listing"))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Positions of the known columns in a CSV header.
struct CsvLayout {
    indices: Vec<(&'static str, usize)>,
}

impl CsvLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let indices: Vec<(&'static str, usize)> = super::model::ALL_COLUMNS
            .iter()
            .filter_map(|&col| headers.iter().position(|h| h.trim() == col).map(|i| (col, i)))
            .collect();

        for column in REQUIRED_COLUMNS {
            if !indices.iter().any(|(c, _)| *c == column) {
                return Err(SchemaError::MissingColumn { format: "CSV", column }.into());
            }
        }
        Ok(CsvLayout { indices })
    }

    fn text<'r>(&self, record: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        let (_, idx) = self.indices.iter().find(|(c, _)| *c == column)?;
        record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
    }

    fn string(&self, record: &csv::StringRecord, column: &str) -> Option<String> {
        self.text(record, column).map(str::to_string)
    }

    fn number(&self, record: &csv::StringRecord, column: &str) -> Option<f64> {
        self.text(record, column)?
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    fn listing(&self, record: &csv::StringRecord) -> Listing {
        Listing {
            make: self.string(record, COL_MAKE),
            model: self.string(record, COL_MODEL),
            year: self.number(record, COL_YEAR).and_then(year_from_f64),
            transmission: self.string(record, COL_TRANSMISSION),
            fuel_type: self.string(record, COL_FUEL_TYPE),
            engine_hp: self.number(record, COL_ENGINE_HP),
            city_mpg: self.number(record, COL_CITY_MPG),
            highway_mpg: self.number(record, COL_HIGHWAY_MPG),
            msrp: self.number(record, COL_MSRP),
            popularity: self.number(record, COL_POPULARITY),
            market_category: self
                .text(record, COL_MARKET_CATEGORY)
                .map(split_categories)
                .unwrap_or_default(),
        }
    }
}

fn load_csv(path: &Path) -> Result<Vec<Listing>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let layout = CsvLayout::from_headers(reader.headers().context("reading CSV headers")?)?;

    reader
        .records()
        .enumerate()
        .map(|(row_no, result)| {
            let record = result.with_context(|| format!("CSV row {row_no}"))?;
            Ok(layout.listing(&record))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of listings.
///
/// String columns may be plain, large or dictionary encoded; numeric columns
/// any integer or float width. `Market Category` is `List<Utf8>`,
/// `LargeList<Utf8>` or a delimited string. Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<Listing>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    check_parquet_schema(builder.schema())?;
    let reader = builder.build().context("building parquet reader")?;

    let mut listings = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        read_batch(&batch, &mut listings)?;
    }
    Ok(listings)
}

fn check_parquet_schema(schema: &Schema) -> Result<()> {
    for column in REQUIRED_COLUMNS {
        if schema.index_of(column).is_err() {
            return Err(SchemaError::MissingColumn { format: "Parquet", column }.into());
        }
    }
    Ok(())
}

// -- Parquet / Arrow helpers --

fn string_column(batch: &RecordBatch, name: &'static str) -> Result<Option<StringArray>> {
    let Some(col) = batch.column_by_name(name) else {
        return Ok(None);
    };
    let utf8 = cast(col, &DataType::Utf8).with_context(|| format!("casting '{name}' to text"))?;
    Ok(Some(utf8.as_string::<i32>().clone()))
}

fn float_column(batch: &RecordBatch, name: &'static str) -> Result<Option<Float64Array>> {
    let Some(col) = batch.column_by_name(name) else {
        return Ok(None);
    };
    let floats =
        cast(col, &DataType::Float64).with_context(|| format!("casting '{name}' to float"))?;
    Ok(Some(floats.as_primitive::<Float64Type>().clone()))
}

fn text_at(col: &Option<StringArray>, row: usize) -> Option<String> {
    col.as_ref()
        .filter(|a| !a.is_null(row))
        .map(|a| a.value(row).to_string())
}

fn float_at(col: &Option<Float64Array>, row: usize) -> Option<f64> {
    col.as_ref()
        .filter(|a| !a.is_null(row))
        .map(|a| a.value(row))
        .filter(|v| v.is_finite())
}

/// Tags of one row of the Market Category column.
fn categories_at(col: &ArrayRef, row: usize) -> Result<Vec<String>> {
    if col.is_null(row) {
        return Ok(Vec::new());
    }
    let values = match col.data_type() {
        DataType::List(_) => col.as_list::<i32>().value(row),
        DataType::LargeList(_) => col.as_list::<i64>().value(row),
        DataType::Utf8 => return Ok(split_categories(col.as_string::<i32>().value(row))),
        DataType::LargeUtf8 => return Ok(split_categories(col.as_string::<i64>().value(row))),
        other => {
            return Err(SchemaError::UnsupportedType {
                column: COL_MARKET_CATEGORY,
                data_type: other.to_string(),
            }
            .into())
        }
    };
    let tags = cast(&values, &DataType::Utf8).context("casting category tags to text")?;
    Ok(tags
        .as_string::<i32>()
        .iter()
        .flatten()
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .collect())
}

fn read_batch(batch: &RecordBatch, listings: &mut Vec<Listing>) -> Result<()> {
    let make = string_column(batch, COL_MAKE)?;
    let model = string_column(batch, COL_MODEL)?;
    let transmission = string_column(batch, COL_TRANSMISSION)?;
    let fuel_type = string_column(batch, COL_FUEL_TYPE)?;
    let year = float_column(batch, COL_YEAR)?;
    let engine_hp = float_column(batch, COL_ENGINE_HP)?;
    let city_mpg = float_column(batch, COL_CITY_MPG)?;
    let highway_mpg = float_column(batch, COL_HIGHWAY_MPG)?;
    let msrp = float_column(batch, COL_MSRP)?;
    let popularity = float_column(batch, COL_POPULARITY)?;
    let categories = batch.column_by_name(COL_MARKET_CATEGORY);

    listings.reserve(batch.num_rows());
    for row in 0..batch.num_rows() {
        let market_category = match categories {
            Some(col) => categories_at(col, row).with_context(|| format!("Row {row}"))?,
            None => Vec::new(),
        };
        listings.push(Listing {
            make: text_at(&make, row),
            model: text_at(&model, row),
            year: float_at(&year, row).and_then(year_from_f64),
            transmission: text_at(&transmission, row),
            fuel_type: text_at(&fuel_type, row),
            engine_hp: float_at(&engine_hp, row),
            city_mpg: float_at(&city_mpg, row),
            highway_mpg: float_at(&highway_mpg, row),
            msrp: float_at(&msrp, row),
            popularity: float_at(&popularity, row),
            market_category,
        });
    }
    Ok(())
}
