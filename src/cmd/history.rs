//! `ralph history` — print the append-only session record log.

use crate::store::Store;
use anyhow::Result;
use serde_json::Value;
use std::path::Path;

pub fn cmd_history(project_root: &Path) -> Result<()> {
    let store = Store::new(project_root);
    let records: Vec<Value> = store.load_session_records()?;

    if records.is_empty() {
        println!("No session history recorded yet.");
        return Ok(());
    }

    for (i, record) in records.iter().enumerate() {
        println!("#{i}: {record}");
    }
    Ok(())
}
