use std::path::PathBuf;

use heapdb::Database;

/// A small demo/smoke-test binary, not a SQL REPL: it opens a database at
/// a path given on the command line (or a temp file if none is given), runs
/// a hardcoded create/insert/scan sequence, and prints what it did.
fn main() -> heapdb::Result<()> {
    env_logger::init();

    let path: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("heapdb_demo.db"));

    log::info!("opening database at {}", path.display());
    let mut db = Database::open(&path)?;

    if db.get_schema("users").is_none() {
        db.create_table("users", vec!["id".into(), "name".into()])?;
    }

    let rid = db.insert_into("users", vec!["1".into(), "Alice".into()])?;
    println!(
        "inserted {rid:?}: {}",
        String::from_utf8_lossy(&db.select(rid)?)
    );

    println!("users table:");
    for row in db.scan("users") {
        println!("  {}", String::from_utf8_lossy(&row));
    }

    Ok(())
}
