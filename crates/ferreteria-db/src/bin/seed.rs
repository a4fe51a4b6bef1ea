//! # Seed Data Generator
//!
//! Populates the database with demo invoices and purchase orders.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database (ferreteria.toml / FERRETERIA_DB_PATH)
//! cargo run -p ferreteria-db --bin seed
//!
//! # Generate a custom number of invoices
//! cargo run -p ferreteria-db --bin seed -- --count 50
//!
//! # Specify database path
//! cargo run -p ferreteria-db --bin seed -- --db ./data/ferreteria.db
//!
//! # Print the stored documents as JSON
//! cargo run -p ferreteria-db --bin seed -- --json
//! ```
//!
//! ## Generated Documents
//! - `count` invoices, each with 1-4 catalog products, some discounted,
//!   paid with a rotating payment method
//! - one purchase order per supplier, moved along the order lifecycle
//! - the last invoice voided

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ferreteria_core::{
    CatalogProduct, DocumentForm, DocumentKind, DocumentSession, InvoiceForm, LineInput, Money,
    OrderForm, OrderStatus, PaymentMethod, ProductRef,
};
use ferreteria_db::{AppConfig, Database, DocumentRepository, SavedDocument};

/// Hardware catalog: (id, name, price in cents)
const CATALOG: &[(i64, &str, i64)] = &[
    (1, "Martillo carpintero 16oz", 1250),
    (2, "Destornillador Phillips #2", 480),
    (3, "Taladro percutor 750W", 8990),
    (4, "Juego de brocas HSS (13u)", 2150),
    (5, "Cinta métrica 5m", 690),
    (6, "Tornillos autorroscantes (caja 100)", 375),
    (7, "Pintura látex blanca 4L", 3420),
    (8, "Rodillo antigota 23cm", 910),
    (9, "Cemento Portland 50kg", 1080),
    (10, "Cable unipolar 2.5mm (m)", 95),
];

const SUPPLIERS: &[&str] = &["ACINDAR", "STANLEY-AR", "LOMA-NEGRA"];

const PAYMENT_METHODS: &[PaymentMethod] = &[
    PaymentMethod::Cash,
    PaymentMethod::Card,
    PaymentMethod::Transfer,
    PaymentMethod::Credit,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 12;
    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut print_json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(12);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--json" => print_json = true,
            "--help" | "-h" => {
                println!("Ferreteria Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>      Number of invoices to generate (default: 12)");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("      --config <PATH>  Config file (default: platform config dir)");
                println!("      --json           Print stored documents as JSON");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = AppConfig::load_or_default(config_path);
    if let Some(path) = db_path {
        config.database.path = path;
    }

    init_tracing(&config.logging.filter);

    println!("Ferreteria Seed Data Generator");
    println!("==============================");
    println!("Database: {}", config.database.path.display());
    println!("Invoices: {}", count);
    println!();

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(config.db_config()).await?;
    info!("Connected, migrations applied");

    let existing = db.invoices().list().await?.len();
    if existing > 0 {
        warn!(existing, "Database already has invoices, skipping seed");
        println!("Database already has {} invoices.", existing);
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let catalog = catalog();
    let start = std::time::Instant::now();
    let base_date = NaiveDate::from_ymd_opt(2024, 3, 1).ok_or("invalid base date")?;

    // Invoices
    let mut last_invoice: Option<SavedDocument> = None;
    for seed in 0..count {
        let mut session = DocumentSession::new(DocumentKind::Invoice);
        for offset in 0..(1 + seed % 4) {
            let product = &catalog[(seed * 3 + offset * 7) % catalog.len()];
            let quantity = Decimal::from((1 + (seed + offset) % 5) as i64);
            let mut line = LineInput::from_product(product, quantity);
            if (seed + offset) % 3 == 0 {
                line = line.with_discount(Decimal::new(5 * (1 + (seed % 3) as i64), 0));
            }
            session.add_line(line)?;
        }

        let number = DocumentRepository::next_number(&db, DocumentKind::Invoice).await?;
        let date = base_date + Duration::days(seed as i64);
        let form = DocumentForm::Invoice(InvoiceForm {
            number,
            date: date.to_string(),
            client_id: format!("C{:03}", 1 + seed % 7),
            payment_method: PAYMENT_METHODS[seed % PAYMENT_METHODS.len()]
                .as_str()
                .to_string(),
            ..InvoiceForm::default()
        });

        let saved = db.save(session.submit(form)?).await?;
        println!("  {} {:>12}", saved.number(), saved.totals().grand_total);
        last_invoice = Some(saved);
    }

    if let Some(invoice) = &last_invoice {
        db.void_invoice(invoice.id()).await?;
        println!("  {} voided", invoice.number());
    }

    // Purchase orders
    let lifecycle = [
        None,
        Some(vec![OrderStatus::Approved, OrderStatus::Shipped]),
        Some(vec![OrderStatus::Shipped, OrderStatus::Received]),
    ];
    for (idx, (supplier, steps)) in SUPPLIERS.iter().zip(lifecycle).enumerate() {
        let mut session = DocumentSession::new(DocumentKind::PurchaseOrder);
        for product in catalog.iter().skip(idx * 3).take(3) {
            session.add_line(LineInput::from_product(product, Decimal::from(20)))?;
        }

        let number = DocumentRepository::next_number(&db, DocumentKind::PurchaseOrder).await?;
        let order_date = base_date + Duration::days(idx as i64 * 10);
        let form = DocumentForm::PurchaseOrder(OrderForm {
            number,
            order_date: order_date.to_string(),
            expected_delivery: (order_date + Duration::days(7)).to_string(),
            supplier_id: supplier.to_string(),
            delivery_address: "Depósito central, Av. San Martín 1450".to_string(),
            ..OrderForm::default()
        });

        let saved = db.save(session.submit(form)?).await?;
        for status in steps.unwrap_or_default() {
            db.set_order_status(saved.id(), status).await?;
        }

        let order = db.order(saved.id()).await?;
        println!(
            "  {} {:>12}  {}",
            order.number, order.totals.grand_total, order.status
        );
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "Generated {} invoices and {} orders in {:?}",
        count,
        SUPPLIERS.len(),
        elapsed
    );

    if print_json {
        let invoices = DocumentRepository::invoices(&db).await?;
        let orders = DocumentRepository::orders(&db).await?;
        let summary = serde_json::json!({
            "invoices": invoices,
            "orders": orders,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    db.close().await;
    println!("Seed complete!");

    Ok(())
}

fn catalog() -> Vec<CatalogProduct> {
    CATALOG
        .iter()
        .map(|(id, name, cents)| CatalogProduct {
            id: ProductRef::from(*id),
            name: name.to_string(),
            price: Money::from_cents(*cents),
        })
        .collect()
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
