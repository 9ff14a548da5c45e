use crate::render::print_sidebar;
use inquire::{Select, Text};
use log::{error, info};
use sidebar_common::{
    controller::{SidebarController, TeamMutation},
    grouping::SidebarBody,
    model::{Division, PastSeason, TeamId, View, ViewDescriptor},
    portal::SidebarApi,
    storage::SessionStorage,
};
use std::{fmt::Display, time::Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    SwitchView,
    FilterDivision,
    PickSeason,
    ToggleGame,
    SelectTeam,
    ClearSelection,
    TeamChanged,
    Refresh,
    Exit,
}

impl Display for MenuChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuChoice::SwitchView => write!(f, "Switch View"),
            MenuChoice::FilterDivision => write!(f, "Filter by Division"),
            MenuChoice::PickSeason => write!(f, "Pick Past Season"),
            MenuChoice::ToggleGame => write!(f, "Expand/Collapse a Game"),
            MenuChoice::SelectTeam => write!(f, "Select a Team"),
            MenuChoice::ClearSelection => write!(f, "Clear Selection"),
            MenuChoice::TeamChanged => write!(f, "Report a Team Change"),
            MenuChoice::Refresh => write!(f, "Refresh"),
            MenuChoice::Exit => write!(f, "Exit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeKind {
    Created,
    Deleted,
    Edited,
    MemberAdded,
    MemberRemoved,
}

impl ChangeKind {
    const ALL: [Self; 5] = [
        Self::Created,
        Self::Deleted,
        Self::Edited,
        Self::MemberAdded,
        Self::MemberRemoved,
    ];

    fn mutation(self, team_id: TeamId) -> TeamMutation {
        match self {
            Self::Created => TeamMutation::Created(team_id),
            Self::Deleted => TeamMutation::Deleted(team_id),
            Self::Edited => TeamMutation::Edited(team_id),
            Self::MemberAdded => TeamMutation::MemberAdded(team_id),
            Self::MemberRemoved => TeamMutation::MemberRemoved(team_id),
        }
    }
}

impl Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Created => write!(f, "Team Created"),
            ChangeKind::Deleted => write!(f, "Team Deleted"),
            ChangeKind::Edited => write!(f, "Team Edited"),
            ChangeKind::MemberAdded => write!(f, "Member Added"),
            ChangeKind::MemberRemoved => write!(f, "Member Removed"),
        }
    }
}

struct ViewChoice(ViewDescriptor);

impl Display for ViewChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.label)
    }
}

struct SeasonChoice(Option<PastSeason>);

impl Display for SeasonChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(season) => write!(f, "{}", season.season_name),
            None => write!(f, "No season"),
        }
    }
}

struct DivisionChoice(Option<Division>);

impl Display for DivisionChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(division) => write!(f, "{division}"),
            None => write!(f, "All Divisions"),
        }
    }
}

fn choices<A: SidebarApi, S: SessionStorage>(
    controller: &SidebarController<A, S>,
) -> Vec<MenuChoice> {
    let panel = controller.panel();
    let mut choices = vec![];
    if panel.switcher.visible {
        choices.push(MenuChoice::SwitchView);
    }
    if panel.division_picker.as_ref().is_some_and(|p| p.visible) {
        choices.push(MenuChoice::FilterDivision);
    }
    if panel.season_picker.as_ref().is_some_and(|p| p.visible) {
        choices.push(MenuChoice::PickSeason);
    }
    if matches!(panel.body, SidebarBody::Grouped(_)) {
        choices.push(MenuChoice::ToggleGame);
    }
    if !controller.teams().is_empty() {
        choices.push(MenuChoice::SelectTeam);
        choices.push(MenuChoice::TeamChanged);
    }
    if controller.selected_team().is_some() {
        choices.push(MenuChoice::ClearSelection);
    }
    choices.push(MenuChoice::Refresh);
    choices.push(MenuChoice::Exit);
    choices
}

fn prompt_id(message: &str) -> Option<u64> {
    match Text::new(message).prompt() {
        Ok(text) => match text.trim().parse() {
            Ok(id) => Some(id),
            Err(_) => {
                error!("'{}' is not a valid ID", text.trim());
                None
            }
        },
        Err(_) => None,
    }
}

pub async fn run<A: SidebarApi, S: SessionStorage>(controller: &mut SidebarController<A, S>) {
    loop {
        let choice = match Select::new("What would you like to do next?", choices(controller))
            .prompt()
        {
            Ok(choice) => choice,
            Err(_) => {
                info!("No choice made, exiting");
                return;
            }
        };

        match choice {
            MenuChoice::SwitchView => {
                let options = controller
                    .views()
                    .iter()
                    .cloned()
                    .map(ViewChoice)
                    .collect::<Vec<_>>();
                if let Ok(ViewChoice(view)) = Select::new("Select a view:", options).prompt() {
                    controller
                        .select_view(View::from_value(&view.value), Instant::now())
                        .await;
                }
            }
            MenuChoice::FilterDivision => {
                let mut options = vec![DivisionChoice(None)];
                if let Some(picker) = &controller.panel().division_picker {
                    options.extend(picker.options.iter().map(|&d| DivisionChoice(Some(d))));
                }
                if let Ok(DivisionChoice(division)) =
                    Select::new("Select a division:", options).prompt()
                {
                    controller.select_division(division, Instant::now()).await;
                }
            }
            MenuChoice::PickSeason => {
                let mut options = vec![SeasonChoice(None)];
                if let Some(picker) = &controller.panel().season_picker {
                    options.extend(picker.options.iter().cloned().map(Some).map(SeasonChoice));
                }
                if let Ok(SeasonChoice(season)) =
                    Select::new("Select a past season:", options).prompt()
                {
                    controller
                        .select_past_season(season.map(|s| s.season_id), Instant::now())
                        .await;
                }
            }
            MenuChoice::ToggleGame => {
                if let Some(game_id) = prompt_id("Game ID to expand or collapse:") {
                    controller.toggle_game(game_id);
                }
            }
            MenuChoice::SelectTeam => {
                if let Some(team_id) = prompt_id("Team ID to select:") {
                    controller.select_team(team_id);
                }
            }
            MenuChoice::ClearSelection => controller.clear_selection(),
            MenuChoice::TeamChanged => {
                let Ok(kind) = Select::new("What changed?", ChangeKind::ALL.to_vec()).prompt()
                else {
                    continue;
                };
                if let Some(team_id) = prompt_id("ID of the team that changed:") {
                    controller
                        .notify_team_mutation(kind.mutation(team_id), Instant::now())
                        .await;
                }
            }
            MenuChoice::Refresh => controller.load(Instant::now()).await,
            MenuChoice::Exit => return,
        }

        print_sidebar(controller.panel());
    }
}
