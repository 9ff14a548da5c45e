use prettytable::{Cell, Row, Table, format};
use sidebar_common::{
    controller::{DetailPanel, SidebarPanel},
    grouping::{SidebarBody, TeamRow},
};

const EXPANDED_MARKER: &str = "▾";
const COLLAPSED_MARKER: &str = "▸";

fn team_cells(team: &TeamRow, indent: &str) -> Row {
    let season = match (&team.season_name, team.season_active) {
        (Some(name), Some(false)) => format!("{name} (ended)"),
        (Some(name), _) => name.clone(),
        (None, _) => String::new(),
    };
    Row::new(vec![
        Cell::new(&format!("{indent}{}", team.name)),
        Cell::new(&team.game_title),
        Cell::new(&team.roster_label()),
        Cell::new(&season),
        Cell::new(&team.id.to_string()),
    ])
}

pub fn sidebar_table(panel: &SidebarPanel) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(vec![
        Cell::new("Team"),
        Cell::new("Game"),
        Cell::new("Roster"),
        Cell::new("Season"),
        Cell::new("ID"),
    ]));

    match &panel.body {
        SidebarBody::Empty(message) => {
            table.add_row(Row::new(vec![Cell::new(message)]));
        }
        SidebarBody::Flat(rows) => {
            for team in rows {
                table.add_row(team_cells(team, ""));
            }
        }
        SidebarBody::Grouped(groups) => {
            for group in groups {
                let marker = if group.expanded {
                    EXPANDED_MARKER
                } else {
                    COLLAPSED_MARKER
                };
                let division = group.division.as_deref().unwrap_or("Unassigned");
                table.add_row(Row::new(vec![
                    Cell::new(&format!("{marker} {}", group.title)),
                    Cell::new(division),
                    Cell::new(&group.team_count.to_string()),
                    Cell::new(""),
                    Cell::new(&group.game_id.to_string()),
                ]));
                for team in &group.teams {
                    table.add_row(team_cells(team, "    "));
                }
            }
        }
    }
    table
}

pub fn print_sidebar(panel: &SidebarPanel) {
    println!();
    println!("Teams ({})", panel.subtitle);
    if panel.loading {
        println!("Loading...");
    }
    if let Some(picker) = panel.division_picker.as_ref().filter(|p| p.visible) {
        match picker.selected {
            Some(division) => println!("Division: {division}"),
            None => println!("Division: all"),
        }
    }
    if let Some(picker) = panel.season_picker.as_ref().filter(|p| p.visible) {
        let selected = picker
            .selected
            .and_then(|id| picker.options.iter().find(|s| s.season_id == id));
        match selected {
            Some(season) => println!("Season: {}", season.season_name),
            None => println!("Season: none selected"),
        }
    }
    sidebar_table(panel).printstd();
    match panel.detail {
        DetailPanel::Placeholder => println!("Select a team to see its details."),
        DetailPanel::Team(id) => println!("Showing details for team {id}."),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use sidebar_common::grouping::GameGroup;

    fn row(id: u64) -> TeamRow {
        TeamRow {
            id,
            name: format!("Team {id}"),
            game_title: "Valorant".to_string(),
            member_count: 4,
            max_size: Some(6),
            season_name: Some("Fall 2025".to_string()),
            season_active: Some(false),
        }
    }

    #[test]
    fn test_empty_table() {
        let panel = SidebarPanel {
            body: SidebarBody::Empty("No teams to display.".to_string()),
            ..Default::default()
        };
        let table = sidebar_table(&panel);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_grouped_table_rows() {
        let panel = SidebarPanel {
            body: SidebarBody::Grouped(vec![
                GameGroup {
                    game_id: 10,
                    title: "Valorant".to_string(),
                    division: Some("Shooter".to_string()),
                    has_image: true,
                    team_count: 2,
                    expanded: true,
                    teams: vec![row(1), row(2)],
                },
                GameGroup {
                    game_id: 20,
                    title: "Chess Club".to_string(),
                    division: None,
                    has_image: false,
                    team_count: 3,
                    expanded: false,
                    teams: vec![],
                },
            ]),
            ..Default::default()
        };
        let table = sidebar_table(&panel);
        assert_eq!(table.len(), 4);
        let rendered = table.to_string();
        assert!(rendered.contains("▾ Valorant"));
        assert!(rendered.contains("▸ Chess Club"));
        assert!(rendered.contains("Fall 2025 (ended)"));
        assert!(rendered.contains("4/6"));
    }
}
