//! Sales performance report
//!
//! Run: ./target/release/ecommerce_metrics --data-dir ecommerce_data --year 2023 [--month 3]

use anyhow::Result;
use clap::Parser;
use ecommerce_metrics::format::{fmt_compact, fmt_opt, fmt_trend, month_abbr, parse_month, stars};
use ecommerce_metrics::{AnalysisConfig, DashboardSnapshot, SalesData, StatusFilter};
use std::path::PathBuf;
use tracing::info;

/// E-commerce sales performance report
#[derive(Parser, Debug)]
#[command(name = "ecommerce_metrics")]
#[command(about = "Compute e-commerce sales KPIs for an analysis period")]
struct Args {
    /// Directory holding the six CSV tables
    #[arg(long, default_value = "ecommerce_data")]
    data_dir: PathBuf,

    /// Analysis year (default: newest year with data)
    #[arg(long)]
    year: Option<i32>,

    /// Comparison year (default: year - 1)
    #[arg(long)]
    comparison_year: Option<i32>,

    /// Analysis month, 1-12 or Jan-Dec (default: whole year)
    #[arg(long, value_parser = parse_month_arg)]
    month: Option<u32>,

    /// Order status to analyse, or "all"
    #[arg(long, default_value = "delivered")]
    status: StatusFilter,

    /// Print the snapshot as JSON instead of the report
    #[arg(long)]
    json: bool,
}

fn parse_month_arg(s: &str) -> Result<u32, String> {
    parse_month(s).ok_or_else(|| format!("invalid month '{}': use 1-12 or Jan-Dec", s))
}

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(80));
    println!("  {}", title);
    println!("{}\n", "═".repeat(80));
}

fn print_subsection(title: &str) {
    println!("\n{}", title);
    println!("{}", "─".repeat(70));
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let data = SalesData::load(&args.data_dir)?;
    let year = match args.year {
        Some(y) => y,
        None => *data
            .available_years(&args.status)
            .first()
            .ok_or_else(|| anyhow::anyhow!("no {} orders in {:?}", args.status, args.data_dir))?,
    };

    let config = AnalysisConfig::new(year)
        .with_month(args.month)
        .with_comparison_year(args.comparison_year)
        .with_status(args.status);
    info!("Analysing {:?}", config);

    let snapshot = DashboardSnapshot::compute(&data, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_report(&snapshot);
    }

    Ok(())
}

fn print_report(s: &DashboardSnapshot) {
    let period = match s.config.month {
        Some(m) => format!("{} {}", month_abbr(m), s.config.year),
        None => s.config.year.to_string(),
    };
    let comparison_year = s.config.comparison_year();

    print_section_header(&format!(
        "E-COMMERCE SALES PERFORMANCE - {} ({} orders) vs {}",
        period, s.config.status, comparison_year
    ));

    if s.current.is_empty() {
        println!("  No data for this period.");
        return;
    }

    let c = &s.current;
    println!("  {:24} {:>12} {:>12}", "KPI", "Value", "Trend");
    println!("  {}", "─".repeat(50));
    println!(
        "  {:24} {:>12} {:>12}",
        "Total Revenue",
        fmt_compact(c.revenue),
        fmt_trend(s.trends.revenue.as_ref())
    );
    println!(
        "  {:24} {:>12} {:>12}",
        "Avg Monthly Growth",
        fmt_opt(s.avg_mom_growth, |g| format!("{:+.2}%", g)),
        ""
    );
    println!(
        "  {:24} {:>12} {:>12}",
        "Avg Order Value",
        fmt_opt(c.avg_order_value, fmt_compact),
        fmt_trend(s.trends.avg_order_value.as_ref())
    );
    println!(
        "  {:24} {:>12} {:>12}",
        "Total Orders",
        c.orders,
        fmt_trend(s.trends.orders.as_ref())
    );
    println!(
        "  {:24} {:>12} {:>12}",
        "Avg Delivery Time",
        fmt_opt(c.avg_delivery_days, |d| format!("{:.2} days", d)),
        fmt_trend(s.trends.avg_delivery_days.as_ref())
    );
    println!(
        "  {:24} {:>12} {:>12}",
        "Avg Review Score",
        fmt_opt(c.avg_review_score, |r| format!("{:.2}", r)),
        stars(c.avg_review_score)
    );

    print_subsection("Revenue Trend");
    println!("  {:6} {:>12} {:>12}", "Month", s.config.year, comparison_year);
    for m in 1..=12 {
        let cur = s.revenue_trend.current.iter().find(|r| r.month == m);
        let prev = s.revenue_trend.comparison.iter().find(|r| r.month == m);
        if cur.is_none() && prev.is_none() {
            continue;
        }
        println!(
            "  {:6} {:>12} {:>12}",
            month_abbr(m),
            fmt_opt(cur.map(|r| r.revenue), fmt_compact),
            fmt_opt(prev.map(|r| r.revenue), fmt_compact)
        );
    }

    print_subsection("Month-over-Month Growth");
    for p in &s.mom_growth {
        println!(
            "  {}  {:>10}  {:>10}",
            p.period,
            fmt_compact(p.revenue),
            fmt_opt(p.growth_pct, |g| format!("{:+.2}%", g))
        );
    }

    print_subsection("Top 10 Categories");
    println!("  {:32} {:>12} {:>8}", "Category", "Revenue", "Share");
    for cat in &s.top_categories {
        println!(
            "  {:32} {:>12} {:>8}",
            cat.category,
            fmt_compact(cat.revenue),
            fmt_opt(cat.share_pct, |p| format!("{:.1}%", p))
        );
    }

    print_subsection("Revenue by State");
    println!("  {:8} {:>12} {:>8}", "State", "Revenue", "Orders");
    for st in &s.states {
        println!("  {:8} {:>12} {:>8}", st.state, fmt_compact(st.revenue), st.order_count);
    }

    print_subsection("Review Score vs Delivery Time");
    println!("  {:10} {:>10} {:>10}", "Delivery", "Reviews", "Avg Score");
    for b in &s.satisfaction.buckets {
        println!(
            "  {:10} {:>10} {:>10}",
            b.label,
            b.reviewed_orders,
            fmt_opt(b.avg_score, |v| format!("{:.2}", v))
        );
    }
    println!(
        "  Unreviewed orders: {}   Orders without measured delivery: {}",
        s.satisfaction.unreviewed_orders, s.satisfaction.unmeasured_orders
    );

    if !s.payment_mix.is_empty() {
        print_subsection("Payment Mix");
        for p in &s.payment_mix {
            println!(
                "  {:16} {:>12} {:>8}",
                p.payment_type,
                fmt_compact(p.value),
                fmt_opt(p.share_pct, |v| format!("{:.1}%", v))
            );
        }
    }

    let d = &s.diagnostics;
    print_subsection("Data Quality");
    println!("  Malformed rows skipped:     {:>8}", d.load.total_skipped());
    println!("  Items without an order:     {:>8}", d.join.unmatched_items);
    println!("  Bad purchase timestamps:    {:>8}", d.temporal.dropped);
    println!("  Delivered before purchase:  {:>8}", c.delivery.negative_duration);
    println!();
}
