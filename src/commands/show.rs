// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Show command - prints the stored tables for a seed

use super::App;
use crate::session::Origin;
use anyhow::Result;

/// Run the show command
pub fn run(app: &App, name: &[String], links: bool) -> Result<()> {
    let session = app.open_session(name)?;
    let graph = session.graph();

    if session.origin() != Origin::Resumed {
        eprintln!(
            "No stored graph for {}. Run 'actgraph extract {}' first.",
            session.key(),
            name.join(" ")
        );
    }

    let printer = app.printer;
    println!("{}", printer.heading(1, &format!("Influences: {}", graph.seed().display_name())));
    println!();
    print!("{}", printer.entity_table(graph));

    if links {
        println!();
        println!("{}", printer.heading(2, "Links"));
        print!("{}", printer.link_table(graph));
    }

    println!();
    println!("{}", printer.summary(graph));
    Ok(())
}
