//! Writes a synthetic car listings Parquet file for trying the dashboard
//! without the real dataset.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, ListBuilder, StringArray, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

#[derive(Debug, Parser)]
#[command(about = "Generate a sample car listings file")]
struct Args {
    /// Output Parquet file.
    #[arg(default_value = "sample_cars.parquet")]
    output: PathBuf,

    /// Listings generated per model.
    #[arg(long, default_value_t = 12)]
    per_model: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in `[lo, hi)`.
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

struct ModelSpec {
    make: &'static str,
    model: &'static str,
    base_msrp: f64,
    base_hp: f64,
    popularity: i64,
    fuels: &'static [&'static str],
    categories: &'static [&'static str],
}

const REGULAR: &[&str] = &["regular unleaded"];
const PREMIUM: &[&str] = &["premium unleaded (required)", "premium unleaded (recommended)"];
const FLEX: &[&str] = &["regular unleaded", "flex-fuel (unleaded/E85)"];
const ELECTRIC: &[&str] = &["electric"];
const DIESEL: &[&str] = &["diesel", "regular unleaded"];

const CATALOG: &[ModelSpec] = &[
    ModelSpec { make: "BMW", model: "1 Series", base_msrp: 40000.0, base_hp: 300.0, popularity: 3916, fuels: PREMIUM, categories: &["Luxury", "Performance", "High-Performance"] },
    ModelSpec { make: "BMW", model: "X5", base_msrp: 58000.0, base_hp: 300.0, popularity: 3916, fuels: PREMIUM, categories: &["Crossover", "Luxury"] },
    ModelSpec { make: "Audi", model: "A4", base_msrp: 36000.0, base_hp: 220.0, popularity: 3105, fuels: PREMIUM, categories: &["Luxury"] },
    ModelSpec { make: "Audi", model: "R8", base_msrp: 160000.0, base_hp: 540.0, popularity: 3105, fuels: PREMIUM, categories: &["Exotic", "Luxury", "High-Performance"] },
    ModelSpec { make: "Ford", model: "F-150", base_msrp: 32000.0, base_hp: 300.0, popularity: 5657, fuels: FLEX, categories: &["Flex Fuel"] },
    ModelSpec { make: "Ford", model: "Mustang", base_msrp: 30000.0, base_hp: 400.0, popularity: 5657, fuels: REGULAR, categories: &["Performance"] },
    ModelSpec { make: "Honda", model: "Civic", base_msrp: 21000.0, base_hp: 160.0, popularity: 2202, fuels: REGULAR, categories: &[] },
    ModelSpec { make: "Honda", model: "Accord", base_msrp: 26000.0, base_hp: 190.0, popularity: 2202, fuels: REGULAR, categories: &["Hybrid"] },
    ModelSpec { make: "Tesla", model: "Model S", base_msrp: 80000.0, base_hp: 380.0, popularity: 1391, fuels: ELECTRIC, categories: &["Exotic", "Performance"] },
    ModelSpec { make: "Volkswagen", model: "Golf", base_msrp: 23000.0, base_hp: 170.0, popularity: 873, fuels: DIESEL, categories: &["Hatchback", "Diesel"] },
    ModelSpec { make: "Ferrari", model: "458 Italia", base_msrp: 240000.0, base_hp: 562.0, popularity: 2774, fuels: PREMIUM, categories: &["Exotic", "High-Performance"] },
];

const TRANSMISSIONS: &[&str] = &["AUTOMATIC", "MANUAL", "AUTOMATED_MANUAL"];

#[derive(Default)]
struct Columns {
    make: Vec<&'static str>,
    model: Vec<&'static str>,
    year: Vec<i64>,
    transmission: Vec<&'static str>,
    fuel: Vec<&'static str>,
    hp: Vec<Option<f64>>,
    city: Vec<i64>,
    highway: Vec<i64>,
    msrp: Vec<i64>,
    popularity: Vec<i64>,
    categories: Vec<Vec<&'static str>>,
}

fn generate(args: &Args) -> Columns {
    let mut rng = SimpleRng::new(args.seed);
    let mut cols = Columns::default();

    for spec in CATALOG {
        for _ in 0..args.per_model {
            let year = 2001 + (rng.next_u64() % 17) as i64;
            let age = (2017 - year) as f64;
            let hp = spec.base_hp * rng.range(0.85, 1.15);
            let msrp = spec.base_msrp * rng.range(0.8, 1.25) * (1.0 - 0.03 * age).max(0.4);
            let fuel = *rng.pick(spec.fuels);
            let city = if fuel == "electric" {
                rng.range(85.0, 100.0)
            } else {
                4500.0 / hp + rng.range(0.0, 6.0)
            };

            cols.make.push(spec.make);
            cols.model.push(spec.model);
            cols.year.push(year);
            cols.transmission.push(if fuel == "electric" {
                "DIRECT_DRIVE"
            } else {
                *rng.pick(TRANSMISSIONS)
            });
            cols.fuel.push(fuel);
            // A few missing horsepower values, like the real data.
            cols.hp.push((!rng.chance(0.02)).then(|| hp.round()));
            cols.city.push(city.round() as i64);
            cols.highway.push((city * rng.range(1.2, 1.45)).round() as i64);
            cols.msrp.push(msrp.round() as i64);
            cols.popularity.push(spec.popularity);
            cols.categories.push(
                spec.categories
                    .iter()
                    .copied()
                    .filter(|_| rng.chance(0.85))
                    .collect(),
            );
        }
    }
    cols
}

fn to_batch(cols: Columns) -> Result<RecordBatch> {
    let mut categories = ListBuilder::new(StringBuilder::new());
    for tags in &cols.categories {
        for tag in tags {
            categories.values().append_value(tag);
        }
        categories.append(!tags.is_empty());
    }

    let text = |name: &str| Field::new(name, DataType::Utf8, true);
    let int = |name: &str| Field::new(name, DataType::Int64, true);
    let schema = Arc::new(Schema::new(vec![
        text("Make"),
        text("Model"),
        int("Year"),
        text("Transmission Type"),
        text("Engine Fuel Type"),
        Field::new("Engine HP", DataType::Float64, true),
        int("city mpg"),
        int("highway MPG"),
        int("MSRP"),
        int("Popularity"),
        Field::new(
            "Market Category",
            DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
            true,
        ),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(cols.make)),
            Arc::new(StringArray::from(cols.model)),
            Arc::new(Int64Array::from(cols.year)),
            Arc::new(StringArray::from(cols.transmission)),
            Arc::new(StringArray::from(cols.fuel)),
            Arc::new(Float64Array::from(cols.hp)),
            Arc::new(Int64Array::from(cols.city)),
            Arc::new(Int64Array::from(cols.highway)),
            Arc::new(Int64Array::from(cols.msrp)),
            Arc::new(Int64Array::from(cols.popularity)),
            Arc::new(categories.finish()),
        ],
    )
    .context("assembling record batch")
}

fn main() -> Result<()> {
    let args = Args::parse();
    let batch = to_batch(generate(&args))?;

    let file = std::fs::File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    println!(
        "Wrote {} listings ({} models) to {}",
        batch.num_rows(),
        CATALOG.len(),
        args.output.display()
    );
    Ok(())
}
