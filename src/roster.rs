//! CSV roster import and cost report export.

use crate::logic::PlayerCost;
use serde::Deserialize;
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to write CSV: {0}")]
    Io(#[from] std::io::Error),
}

/// One roster row: `name,skill_level`.
#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    skill_level: u8,
}

/// Parse a roster with a `name,skill_level` header. Values are trimmed.
pub fn read_roster<R: Read>(reader: R) -> Result<Vec<(String, u8)>, RosterError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        let row: RosterRow = record?;
        rows.push((row.name, row.skill_level));
    }
    Ok(rows)
}

/// Write the cost report, one row per player, amounts rounded to cents.
pub fn write_costs_csv<W: Write>(writer: W, costs: &[PlayerCost]) -> Result<(), RosterError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "name",
        "matches_played",
        "daily_fee",
        "shuttlecocks_used",
        "shuttlecock_cost",
        "total_cost",
    ])?;
    for c in costs {
        wtr.write_record([
            c.name.clone(),
            c.matches_played.to_string(),
            format!("{:.2}", c.daily_fee),
            format!("{:.2}", c.shuttlecocks_used),
            format!("{:.2}", c.shuttlecock_cost),
            format!("{:.2}", c.total_cost),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
