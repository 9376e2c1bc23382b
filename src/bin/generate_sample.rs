//! Sample data generator for the e-commerce tables
//!
//! Writes the six CSV tables the metrics pipeline reads, with seasonal order
//! volume, delivery times and review scores that depend on delivery speed.
//!
//! Usage:
//!   cargo run --release --bin generate_sample -- [OPTIONS]
//!
//! Options:
//!   --orders <N>       Orders per year (default: 5000)
//!   --years <LIST>     Comma-separated years (default: 2022,2023)
//!   --seed <N>         Random seed for reproducibility (optional)
//!   --dirty            Mix in orphan items, bad timestamps and inverted deliveries
//!   --output <DIR>     Output directory (default: ecommerce_data)

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use csv::WriterBuilder;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Sample data generator for the e-commerce dataset
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
#[command(about = "Generate a synthetic six-table e-commerce dataset")]
struct Args {
    /// Orders per year
    #[arg(long, default_value = "5000")]
    orders: usize,

    /// Years to generate
    #[arg(long, value_delimiter = ',', default_value = "2022,2023")]
    years: Vec<i32>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Inject data-quality problems
    #[arg(long)]
    dirty: bool,

    /// Output directory
    #[arg(long, default_value = "ecommerce_data")]
    output: PathBuf,
}

const STATES: [(&str, u32); 12] = [
    ("CA", 30),
    ("TX", 22),
    ("NY", 18),
    ("FL", 17),
    ("IL", 10),
    ("PA", 9),
    ("OH", 8),
    ("GA", 8),
    ("WA", 7),
    ("MA", 6),
    ("CO", 5),
    ("OR", 4),
];

const CATEGORIES: [(&str, f64, f64); 10] = [
    ("electronics", 80.0, 600.0),
    ("computers_accessories", 40.0, 900.0),
    ("furniture_decor", 60.0, 400.0),
    ("health_beauty", 10.0, 120.0),
    ("sports_leisure", 20.0, 250.0),
    ("housewares", 15.0, 180.0),
    ("toys", 10.0, 150.0),
    ("watches_gifts", 50.0, 500.0),
    ("garden_tools", 25.0, 300.0),
    ("books", 8.0, 60.0),
];

const PAYMENT_TYPES: [(&str, u32); 4] = [
    ("credit_card", 70),
    ("boleto", 15),
    ("voucher", 8),
    ("debit_card", 7),
];

/// Relative order volume per month, Jan to Dec
const SEASONALITY: [u32; 12] = [7, 6, 7, 8, 8, 7, 8, 8, 8, 9, 12, 12];

#[derive(Serialize)]
struct OrderOut {
    order_id: String,
    customer_id: String,
    order_status: &'static str,
    order_purchase_timestamp: String,
    order_delivered_customer_date: Option<String>,
}

#[derive(Serialize)]
struct OrderItemOut {
    order_id: String,
    order_item_id: u32,
    product_id: String,
    price: f64,
    freight_value: f64,
}

#[derive(Serialize)]
struct ProductOut {
    product_id: String,
    product_category_name: Option<String>,
}

#[derive(Serialize)]
struct CustomerOut {
    customer_id: String,
    customer_state: String,
}

#[derive(Serialize)]
struct ReviewOut {
    review_id: String,
    order_id: String,
    review_score: u8,
}

#[derive(Serialize)]
struct PaymentOut {
    order_id: String,
    payment_sequential: u32,
    payment_type: &'static str,
    payment_installments: u32,
    payment_value: f64,
}

struct Product {
    id: String,
    base_price: f64,
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn weighted<'a, T>(items: &'a [(T, u32)], rng: &mut impl Rng) -> &'a T {
    let total: u32 = items.iter().map(|(_, w)| w).sum();
    let mut pick = rng.gen_range(0..total);
    for (item, w) in items {
        if pick < *w {
            return item;
        }
        pick -= w;
    }
    &items[items.len() - 1].0
}

fn random_purchase(year: i32, rng: &mut impl Rng) -> NaiveDateTime {
    let months: Vec<(u32, u32)> = SEASONALITY
        .iter()
        .enumerate()
        .map(|(i, w)| (i as u32 + 1, *w))
        .collect();
    let month = *weighted(&months, rng);
    let day = rng.gen_range(1..=28);
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| {
            d.and_hms_opt(
                rng.gen_range(0..24),
                rng.gen_range(0..60),
                rng.gen_range(0..60),
            )
        })
        .unwrap_or_default()
}

/// Review score drifts down as delivery gets slower
fn review_score(days: Option<i64>, rng: &mut impl Rng) -> u8 {
    let mean = match days {
        Some(d) if d <= 3 => 4.5,
        Some(d) if d <= 7 => 4.1,
        Some(d) if d <= 14 => 3.4,
        Some(_) => 2.3,
        None => 2.8,
    };
    let noisy: f64 = mean + rng.gen_range(-1.5..1.5);
    noisy.round().clamp(1.0, 5.0) as u8
}

fn write_table<T: Serialize>(dir: &Path, file: &str, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(dir.join(file))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("   {:32} {:>8} rows", file, rows.len());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Sample Data Generator");
    println!("{}", "━".repeat(60));
    println!("Output:           {}", args.output.display());
    println!("Orders per year:  {}", args.orders);
    println!("Years:            {:?}", args.years);
    println!("Dirty data:       {}", args.dirty);
    if let Some(seed) = args.seed {
        println!("Random seed:      {}", seed);
    }
    println!();

    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    std::fs::create_dir_all(&args.output)?;

    // Dimension tables
    let mut products = Vec::new();
    let mut product_rows = Vec::new();
    for (i, (category, lo, hi)) in CATEGORIES.iter().enumerate() {
        for j in 0..20 {
            let id = format!("P{:02}{:03}", i, j);
            // a few products never got a category
            let category = (rng.gen::<f64>() > 0.02).then(|| category.to_string());
            product_rows.push(ProductOut {
                product_id: id.clone(),
                product_category_name: category,
            });
            products.push(Product { id, base_price: rng.gen_range(*lo..*hi) });
        }
    }

    let customer_count = (args.orders * args.years.len() / 2).max(1);
    let customers: Vec<CustomerOut> = (0..customer_count)
        .map(|i| CustomerOut {
            customer_id: format!("C{:06}", i),
            customer_state: weighted(&STATES, &mut rng).to_string(),
        })
        .collect();

    // Fact tables
    let mut orders = Vec::new();
    let mut items = Vec::new();
    let mut reviews = Vec::new();
    let mut payments = Vec::new();

    let statuses = [
        ("delivered", 90u32),
        ("shipped", 4),
        ("canceled", 3),
        ("processing", 2),
        ("invoiced", 1),
    ];

    for &year in &args.years {
        for n in 0..args.orders {
            let order_id = format!("O{}{:06}", year, n);
            let customer = &customers[rng.gen_range(0..customers.len())];
            let status = *weighted(&statuses, &mut rng);
            let purchased = random_purchase(year, &mut rng);

            let delivery_days = (status == "delivered").then(|| {
                // mostly 2-10 days with a slow tail
                let base = rng.gen_range(1..=10);
                if rng.gen::<f64>() < 0.1 {
                    base + rng.gen_range(5..20)
                } else {
                    base
                }
            });
            let mut delivered = delivery_days
                .map(|d| purchased + Duration::days(d) + Duration::hours(rng.gen_range(0..12)));
            let mut purchase_ts = format_datetime(&purchased);

            if args.dirty {
                let roll = rng.gen::<f64>();
                if roll < 0.005 {
                    purchase_ts = "not recorded".to_string();
                } else if roll < 0.01 {
                    delivered = Some(purchased - Duration::days(rng.gen_range(1..4)));
                }
            }

            let mut order_total = 0.0;
            for item_id in 1..=rng.gen_range(1..=3u32) {
                let product = &products[rng.gen_range(0..products.len())];
                let price = (product.base_price * rng.gen_range(0.9..1.1) * 100.0).round() / 100.0;
                let freight = (rng.gen_range(5.0..40.0) * 100.0_f64).round() / 100.0;
                order_total += price + freight;
                items.push(OrderItemOut {
                    order_id: order_id.clone(),
                    order_item_id: item_id,
                    product_id: product.id.clone(),
                    price,
                    freight_value: freight,
                });
            }

            if rng.gen::<f64>() < 0.85 {
                reviews.push(ReviewOut {
                    review_id: format!("R{}", order_id),
                    order_id: order_id.clone(),
                    review_score: review_score(delivery_days, &mut rng),
                });
            }

            let payment_type = *weighted(&PAYMENT_TYPES, &mut rng);
            payments.push(PaymentOut {
                order_id: order_id.clone(),
                payment_sequential: 1,
                payment_type,
                payment_installments: if payment_type == "credit_card" {
                    rng.gen_range(1..=10)
                } else {
                    1
                },
                payment_value: (order_total * 100.0_f64).round() / 100.0,
            });

            orders.push(OrderOut {
                order_id,
                customer_id: customer.customer_id.clone(),
                order_status: status,
                order_purchase_timestamp: purchase_ts,
                order_delivered_customer_date: delivered.map(|d| format_datetime(&d)),
            });
        }
    }

    if args.dirty {
        for n in 0..(args.orders / 200).max(1) {
            items.push(OrderItemOut {
                order_id: format!("ORPHAN{:04}", n),
                order_item_id: 1,
                product_id: products[0].id.clone(),
                price: 10.0,
                freight_value: 1.0,
            });
        }
    }

    println!("Writing tables...");
    write_table(&args.output, "orders_dataset.csv", &orders)?;
    write_table(&args.output, "order_items_dataset.csv", &items)?;
    write_table(&args.output, "products_dataset.csv", &product_rows)?;
    write_table(&args.output, "customers_dataset.csv", &customers)?;
    write_table(&args.output, "order_reviews_dataset.csv", &reviews)?;
    write_table(&args.output, "order_payments_dataset.csv", &payments)?;

    println!("\nGeneration complete: {}", args.output.display());
    Ok(())
}
