//! # Seed Data Loader
//!
//! Populates the database with the reference master data used in
//! development and demos.
//!
//! ## Usage
//! ```bash
//! # Default database (TALLY_DB_PATH or data/inventario.db)
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/dev.db
//! ```
//!
//! ## Loaded Data
//! - 10 categories, 10 suppliers, 10 clients
//! - 10 products, each linked to one category and one supplier
//!
//! Rows that already exist (same folded name, tax id or national id) are
//! reused, and products are skipped entirely when the table is not empty.

use std::env;

use tally_core::text::name_key;
use tally_core::{Category, Client, NewCategory, NewClient, NewProduct, NewSupplier, Supplier};
use tally_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CATEGORIES: &[&str] = &[
    "Periféricos",
    "Computadoras",
    "Sonido",
    "Accesorios",
    "Pantallas",
    "Redes",
    "Almacenamiento",
    "Cámaras",
    "Micrófonos",
    "Conectividad",
];

/// (name, phone, email, tax id)
const SUPPLIERS: &[(&str, &str, &str, &str)] = &[
    ("TechDistrib SA", "1150001000", "ventas@techdistrib.com", "30548976123"),
    ("PixelTrade SRL", "1144003000", "info@pixeltrade.com", "30765432987"),
    ("ZendaTech", "1166004000", "contacto@zendatech.com", "30548911223"),
    ("NovaElectro SA", "1177005000", "ventas@novaelectro.com", "30784291425"),
    ("ElectroNet SRL", "1133006000", "soporte@electronet.com", "30698754123"),
    ("Neotec Supplies", "1188007000", "pedidos@neotec.com", "30712549876"),
    ("MasterTech", "1122008000", "ventas@mastertech.com", "30678912345"),
    ("BitImport SRL", "1140009000", "compras@bitimport.com", "30789654123"),
    ("CoreByte SRL", "1155001001", "contacto@corebyte.com", "30565498741"),
    ("SysDistrib SA", "1170001100", "info@sysdistrib.com", "30874123698"),
];

/// (name, phone, email, national id)
const CLIENTS: &[(&str, &str, &str, &str)] = &[
    ("Laura Martínez", "1123456789", "laura.martinez@mail.com", "40875231"),
    ("Ricardo Gómez", "1134567890", "ricardo.gomez@mail.com", "39548620"),
    ("Daniela Torres", "1145678901", "daniela.torres@mail.com", "42319876"),
    ("Javier Ruiz", "1156789012", "javier.ruiz@mail.com", "38765412"),
    ("Sofía Fernández", "1167890123", "sofia.fernandez@mail.com", "41098567"),
    ("Mateo Navarro", "1178901234", "mateo.navarro@mail.com", "40234687"),
    ("Valentina Díaz", "1189012345", "valentina.diaz@mail.com", "41687452"),
    ("Nicolás Romero", "1190123456", "nicolas.romero@mail.com", "42985741"),
    ("Martina López", "1132145678", "martina.lopez@mail.com", "41987654"),
    ("Tomás Herrera", "1143256789", "tomas.herrera@mail.com", "43127841"),
];

/// (name, category index, supplier index, stock, unit price in whole units)
const PRODUCTS: &[(&str, usize, usize, i64, i64)] = &[
    ("Teclado mecánico RGB", 0, 0, 25, 90_500),
    ("Mouse inalámbrico", 0, 1, 40, 27_800),
    ("Auriculares gamer", 2, 2, 30, 89_000),
    ("Monitor LED 24\"", 4, 3, 15, 344_500),
    ("Laptop Intel i5 8GB SSD", 1, 4, 10, 1_200_500),
    ("Parlantes Bluetooth", 2, 0, 35, 76_000),
    ("Alfombrilla XL antideslizante", 3, 5, 50, 22_700),
    ("Micrófono USB condensador", 8, 1, 20, 68_000),
    ("Webcam Full HD 1080p", 7, 2, 20, 85_000),
    ("Hub USB 4 puertos", 9, 6, 18, 37_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config = DbConfig::from_env();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Ledger Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $TALLY_DB_PATH or data/inventario.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    println!("Tally Ledger Seed Data Loader");
    println!("=============================");
    println!("Database: {}", config.database_path.display());
    println!();

    let db = Database::new(config).await?;
    println!("✓ Connected, migrations applied");

    let categories = seed_categories(&db).await?;
    println!("✓ Categories: {}", categories.len());

    let suppliers = seed_suppliers(&db).await?;
    println!("✓ Suppliers:  {}", suppliers.len());

    let clients = seed_clients(&db).await?;
    println!("✓ Clients:    {}", clients.len());

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products, skipping products", existing);
    } else {
        let mut inserted = 0;
        for (name, cat, sup, stock, units) in PRODUCTS {
            let input = NewProduct {
                name: name.to_string(),
                category_id: categories[*cat].id,
                supplier_id: suppliers[*sup].id,
                stock: *stock,
                unit_price_cents: units * 100,
            };
            match db.products().insert(&input).await {
                Ok(_) => inserted += 1,
                Err(e) => eprintln!("Failed to insert {}: {}", name, e),
            }
        }
        println!("✓ Products:   {}", inserted);
    }

    info!("Seed complete");
    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally=trace` - Show trace for tally crates only
/// - Default: `info,tally=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn seed_categories(db: &Database) -> Result<Vec<Category>, Box<dyn std::error::Error>> {
    let existing = db.categories().list().await?;
    let mut rows = Vec::with_capacity(CATEGORIES.len());

    for name in CATEGORIES {
        let found = existing.iter().find(|c| name_key(&c.name) == name_key(name));
        let row = match found {
            Some(c) => c.clone(),
            None => {
                db.categories()
                    .insert(&NewCategory {
                        name: name.to_string(),
                    })
                    .await?
            }
        };
        rows.push(row);
    }

    Ok(rows)
}

async fn seed_suppliers(db: &Database) -> Result<Vec<Supplier>, Box<dyn std::error::Error>> {
    let existing = db.suppliers().list().await?;
    let mut rows = Vec::with_capacity(SUPPLIERS.len());

    for (name, phone, email, tax_id) in SUPPLIERS {
        let row = match existing.iter().find(|s| s.tax_id == *tax_id) {
            Some(s) => s.clone(),
            None => {
                db.suppliers()
                    .insert(&NewSupplier {
                        name: name.to_string(),
                        phone: phone.to_string(),
                        email: email.to_string(),
                        tax_id: tax_id.to_string(),
                    })
                    .await?
            }
        };
        rows.push(row);
    }

    Ok(rows)
}

async fn seed_clients(db: &Database) -> Result<Vec<Client>, Box<dyn std::error::Error>> {
    let existing = db.clients().list().await?;
    let mut rows = Vec::with_capacity(CLIENTS.len());

    for (name, phone, email, national_id) in CLIENTS {
        let row = match existing.iter().find(|c| c.national_id == *national_id) {
            Some(c) => c.clone(),
            None => {
                db.clients()
                    .insert(&NewClient {
                        name: name.to_string(),
                        phone: phone.to_string(),
                        email: email.to_string(),
                        national_id: national_id.to_string(),
                    })
                    .await?
            }
        };
        rows.push(row);
    }

    Ok(rows)
}
