use crate::model::{GameId, TeamId, TeamSummary, View};
use std::collections::BTreeSet;
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeamRow {
    pub id: TeamId,
    pub name: String,
    pub game_title: String,
    pub member_count: u32,
    pub max_size: Option<u32>,
    pub season_name: Option<String>,
    pub season_active: Option<bool>,
}

impl From<&TeamSummary> for TeamRow {
    fn from(team: &TeamSummary) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            game_title: team.game_title.clone(),
            member_count: team.member_count,
            max_size: team.max_size,
            season_name: team.season_name.clone(),
            season_active: team.season_active,
        }
    }
}

impl TeamRow {
    /// "4/6" when the team has a size cap, otherwise just the member count
    pub fn roster_label(&self) -> String {
        match self.max_size {
            Some(max) => format!("{}/{max}", self.member_count),
            None => self.member_count.to_string(),
        }
    }
}

/// One game folder in a grouped view. `teams` is only populated while the folder is expanded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameGroup {
    pub game_id: GameId,
    pub title: String,
    pub division: Option<String>,
    pub has_image: bool,
    pub team_count: usize,
    pub expanded: bool,
    pub teams: Vec<TeamRow>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SidebarBody {
    Empty(String),
    Flat(Vec<TeamRow>),
    Grouped(Vec<GameGroup>),
}

/// Stable sort by division rank, then game title ignoring case, then creation time.
///
/// Teams without a creation time sort after those that have one within the same game.
pub fn sort_teams(teams: &mut [TeamSummary]) {
    teams.sort_by_cached_key(|team| {
        (
            team.division_rank(),
            team.game_title.to_lowercase(),
            created_order(team.created_at),
        )
    });
}

fn created_order(created_at: Option<OffsetDateTime>) -> (bool, Option<OffsetDateTime>) {
    (created_at.is_none(), created_at)
}

pub fn group_by_game(teams: &[TeamSummary], expanded: &BTreeSet<String>) -> Vec<GameGroup> {
    let mut sorted = teams.to_vec();
    sort_teams(&mut sorted);

    let mut groups: Vec<GameGroup> = Vec::new();
    let mut members: Vec<Vec<TeamRow>> = Vec::new();
    for team in sorted.iter() {
        // Games sharing a title and division are distinct folders, so look up by id
        let idx = match groups.iter().position(|g| g.game_id == team.game_id) {
            Some(idx) => idx,
            None => {
                groups.push(GameGroup {
                    game_id: team.game_id,
                    title: team.game_title.clone(),
                    division: team.game_division.clone(),
                    has_image: team.game_has_image,
                    team_count: 0,
                    expanded: expanded.contains(&team.game_id.to_string()),
                    teams: vec![],
                });
                members.push(vec![]);
                groups.len() - 1
            }
        };
        members[idx].push(TeamRow::from(team));
    }

    for (group, rows) in groups.iter_mut().zip(members) {
        group.team_count = rows.len();
        if group.expanded {
            group.teams = rows;
        }
    }
    groups
}

/// Builds the sidebar body for `view`, choosing folders or a flat list from the view itself
pub fn render_body(view: &View, teams: &[TeamSummary], expanded: &BTreeSet<String>) -> SidebarBody {
    if teams.is_empty() {
        SidebarBody::Empty(view.empty_message().to_string())
    } else if view.groups_by_game() {
        SidebarBody::Grouped(group_by_game(teams, expanded))
    } else {
        SidebarBody::Flat(teams.iter().map(TeamRow::from).collect())
    }
}

pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 team".to_string()
    } else {
        format!("{count} teams")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use time::macros::datetime;

    fn team(id: TeamId, game_id: GameId, game: &str, division: Option<&str>) -> TeamSummary {
        TeamSummary {
            id,
            name: format!("Team {id}"),
            game_id,
            game_title: game.to_string(),
            game_division: division.map(|d| d.to_string()),
            game_has_image: false,
            manager_id: None,
            member_count: 3,
            max_size: Some(5),
            season_name: None,
            season_active: None,
            created_at: None,
        }
    }

    fn order(teams: &[TeamSummary]) -> Vec<(Option<&str>, &str)> {
        teams
            .iter()
            .map(|t| (t.game_division.as_deref(), t.game_title.as_str()))
            .collect()
    }

    #[test]
    fn test_sort_division_then_title() {
        let mut teams = vec![
            team(1, 1, "B", Some("Sports")),
            team(2, 2, "A", Some("Strategy")),
            team(3, 3, "Z", Some("Strategy")),
        ];
        sort_teams(&mut teams);
        assert_eq!(
            order(&teams),
            vec![
                (Some("Strategy"), "A"),
                (Some("Strategy"), "Z"),
                (Some("Sports"), "B"),
            ]
        );
    }

    #[test]
    fn test_sort_unknown_division_last_and_case_insensitive_title() {
        let mut teams = vec![
            team(1, 1, "zeta", None),
            team(2, 2, "beta", Some("Other")),
            team(3, 3, "Alpha", Some("Other")),
            team(4, 4, "apex", Some("Karting")),
        ];
        sort_teams(&mut teams);
        assert_eq!(
            teams.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![3, 2, 4, 1]
        );
    }

    #[test]
    fn test_sort_keeps_input_order_without_timestamps() {
        let mut teams = vec![
            team(5, 1, "Chess", Some("Strategy")),
            team(2, 1, "Chess", Some("Strategy")),
            team(9, 1, "Chess", Some("Strategy")),
        ];
        sort_teams(&mut teams);
        assert_eq!(
            teams.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![5, 2, 9]
        );
    }

    #[test]
    fn test_sort_by_creation_time_within_game() {
        let mut late = team(1, 1, "Valorant", Some("Shooter"));
        late.created_at = Some(datetime!(2025-03-01 0:00 UTC));
        let mut early = team(2, 1, "Valorant", Some("Shooter"));
        early.created_at = Some(datetime!(2024-11-15 0:00 UTC));
        let undated = team(3, 1, "Valorant", Some("Shooter"));

        let mut teams = vec![undated, late, early];
        sort_teams(&mut teams);
        assert_eq!(
            teams.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![2, 1, 3]
        );
    }

    #[test]
    fn test_group_collapsed_by_default() {
        let teams = vec![
            team(1, 10, "Valorant", Some("Shooter")),
            team(2, 20, "Chess Club", Some("Strategy")),
            team(3, 10, "Valorant", Some("Shooter")),
        ];
        let groups = group_by_game(&teams, &BTreeSet::new());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Chess Club");
        assert_eq!(groups[0].team_count, 1);
        assert_eq!(groups[1].title, "Valorant");
        assert_eq!(groups[1].team_count, 2);
        assert!(groups.iter().all(|g| !g.expanded && g.teams.is_empty()));
    }

    #[test]
    fn test_group_expanded_lists_rows() {
        let teams = vec![
            team(1, 10, "Valorant", Some("Shooter")),
            team(2, 20, "Chess Club", Some("Strategy")),
            team(3, 10, "Valorant", Some("Shooter")),
        ];
        let expanded = BTreeSet::from(["10".to_string()]);
        let groups = group_by_game(&teams, &expanded);
        assert!(!groups[0].expanded);
        assert!(groups[1].expanded);
        assert_eq!(
            groups[1].teams.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    fn test_render_body_per_view() {
        let teams = vec![
            team(1, 10, "Valorant", Some("Shooter")),
            team(2, 20, "Chess Club", Some("Strategy")),
        ];
        let expanded = BTreeSet::new();

        match render_body(&View::Manage, &teams, &expanded) {
            // Flat views keep the server's order
            SidebarBody::Flat(rows) => {
                assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2])
            }
            other => panic!("Expected flat body, got {other:?}"),
        }
        assert!(matches!(
            render_body(&View::All, &teams, &expanded),
            SidebarBody::Grouped(_)
        ));
        assert_eq!(
            render_body(&View::Play, &[], &expanded),
            SidebarBody::Empty("You are not a member of any teams.".to_string())
        );
        assert_eq!(
            render_body(&View::Other("gm_games".to_string()), &[], &expanded),
            SidebarBody::Empty("No teams to display.".to_string())
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(count_label(0), "0 teams");
        assert_eq!(count_label(1), "1 team");
        assert_eq!(count_label(12), "12 teams");

        let row = TeamRow::from(&team(1, 1, "Chess", None));
        assert_eq!(row.roster_label(), "3/5");
    }
}
