//! Plain-text rendering of a solved assignment.

use std::fmt::Write;

use crate::types::Assignment;

/// One block per network, then the relaxation lines. Variable values are
/// printed with two decimals, ranks as integers.
pub fn render(assignment: &Assignment) -> String {
    let mut out = String::new();

    for (network, hubs) in &assignment.hubs {
        let _ = writeln!(out, "Network {network} has the following stores as hubs:");
        for hub in hubs {
            let _ = writeln!(
                out,
                "Store {} is ranked with {} in this Network ({:.2})",
                hub.store, hub.rank, hub.value
            );
        }
    }

    for (store, value) in &assignment.relaxations {
        let _ = writeln!(out, "Needed extra of {value:.2} in store {store}:");
    }

    out
}
