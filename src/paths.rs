//! Rebuilds folder ancestry for the rows of a flattened tree.
//!
//! The grouping is adjacency-based and order-sensitive: a folder row directly after another
//! folder row nests under it, any other folder row starts a new top-level group, and a file row
//! belongs to the nearest folder row above it. Reordering rows changes the result.

use log::warn;

use crate::node::FlatRow;

/// Kept at its own name wherever it sits in the tree.
pub const SIGNAL_DOC: &str = "SignalDoc.csv";

/// Computes the full path of every row, in row order.
pub fn reconstruct(rows: &[FlatRow]) -> Vec<String> {
    let mut paths: Vec<String> = Vec::with_capacity(rows.len());
    // full path of the nearest folder row seen so far
    let mut header: Option<String> = None;
    let mut folder_run = 0usize;

    for (index, row) in rows.iter().enumerate() {
        let path = match &row.id {
            None => {
                folder_run += 1;
                if folder_run == 3 {
                    warn!(
                        "three or more nested folders in a row ending at {:?}; \
                         grouping past one level of nesting is unspecified",
                        row.name
                    );
                }

                let path = match paths.last() {
                    Some(previous) if index > 0 && rows[index - 1].id.is_none() => {
                        format!("{previous}/{}", row.name)
                    }
                    _ => row.name.clone(),
                };
                header = Some(path.clone());
                path
            }
            Some(_) => {
                folder_run = 0;
                match &header {
                    Some(prefix) if row.name != SIGNAL_DOC => format!("{prefix}/{}", row.name),
                    _ => row.name.clone(),
                }
            }
        };

        paths.push(path);
    }

    paths
}

/// Whether a row ends up in the catalog: a file whose path is an archive or CSV.
pub fn is_catalog_eligible(row: &FlatRow, full_path: &str) -> bool {
    row.id.is_some() && (full_path.ends_with("zip") || full_path.ends_with("csv"))
}
