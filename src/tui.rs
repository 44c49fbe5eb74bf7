// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Terminal user interface - scrollable entity table

use crate::graph::ActGraph;
use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Style, Stylize};
use ratatui::widgets::{Block, Paragraph, Row, Table, TableState};
use ratatui::{DefaultTerminal, Frame};

/// Cells of the entity table, one array per entity
#[must_use]
pub fn rows(graph: &ActGraph) -> Vec<[String; 4]> {
    graph
        .entities()
        .iter()
        .map(|e| {
            [
                e.index.to_string(),
                e.distance.to_string(),
                if e.is_resolved() {
                    e.name.clone()
                } else {
                    "(pending)".to_string()
                },
                e.reference.clone(),
            ]
        })
        .collect()
}

/// Footer text for the entity at table row `row`
#[must_use]
pub fn detail(graph: &ActGraph, row: usize) -> String {
    let Some(entity) = graph.entities().get(row) else {
        return String::new();
    };
    let names = |indices: Vec<u64>| {
        indices
            .into_iter()
            .filter_map(|i| graph.entity(i))
            .map(|e| e.display_name().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let outgoing = names(
        graph
            .links_from(entity.index)
            .iter()
            .map(|l| l.target_index)
            .collect(),
    );
    let incoming = names(
        graph
            .links_to(entity.index)
            .iter()
            .map(|l| l.source_index)
            .collect(),
    );
    format!(
        "{} -> [{}]  <- [{}]",
        entity.display_name(),
        outgoing,
        incoming
    )
}

/// Show the entity table until the user quits with `q` or Esc
pub fn run(graph: &ActGraph, title: &str) -> Result<()> {
    let mut terminal = ratatui::try_init().context("Failed to initialise terminal")?;
    let result = event_loop(&mut terminal, graph, title);
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut DefaultTerminal, graph: &ActGraph, title: &str) -> Result<()> {
    let rows = rows(graph);
    let mut state = TableState::default().with_selected(Some(0));

    loop {
        terminal.draw(|frame| render(frame, graph, &rows, title, &mut state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => state.select_next(),
                KeyCode::Up | KeyCode::Char('k') => state.select_previous(),
                KeyCode::Home | KeyCode::Char('g') => state.select_first(),
                KeyCode::End | KeyCode::Char('G') => state.select_last(),
                _ => {}
            }
        }
    }
}

fn render(
    frame: &mut Frame,
    graph: &ActGraph,
    rows: &[[String; 4]],
    title: &str,
    state: &mut TableState,
) {
    let [table_area, footer_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).areas(frame.area());

    let table = Table::new(
        rows.iter().map(|cells| Row::new(cells.iter().map(String::as_str))),
        [
            Constraint::Length(6),
            Constraint::Length(9),
            Constraint::Percentage(35),
            Constraint::Fill(1),
        ],
    )
    .header(Row::new(["Index", "Distance", "Name", "URL"]).style(Style::new().bold()))
    .block(Block::bordered().title(format!(
        " {title}: {} entities, {} links, {} pending ",
        graph.entity_count(),
        graph.link_count(),
        graph.unresolved_count()
    )))
    .row_highlight_style(Style::new().reversed());
    frame.render_stateful_widget(table, table_area, state);

    let selected = state.selected().unwrap_or(0);
    let footer = Paragraph::new(detail(graph, selected))
        .block(Block::bordered().title(" q quit  j/k move "));
    frame.render_widget(footer, footer_area);
}
