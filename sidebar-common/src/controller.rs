use crate::{
    cache::{CacheKey, TeamCache},
    grouping::{SidebarBody, count_label, render_body},
    model::{
        Division, GameId, PastSeason, Permissions, SeasonId, TeamId, TeamSummary, View,
        ViewDescriptor,
    },
    portal::{Result, SidebarApi},
    storage::{
        DIVISION_FILTER_KEY, PAST_SEASON_FILTER_KEY, SessionStorage, VIEW_KEY,
        expanded_games_key,
    },
};
use enum_iterator::all;
use log::{debug, error, info, warn};
use std::{
    collections::BTreeSet,
    fmt,
    time::{Duration, Instant},
};

pub const SELECT_SEASON_MESSAGE: &str = "Select a past season to view its teams.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewSwitcher {
    pub visible: bool,
    pub options: Vec<ViewDescriptor>,
    pub selected: View,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DivisionPicker {
    pub visible: bool,
    pub options: Vec<Division>,
    pub selected: Option<Division>,
}

impl DivisionPicker {
    fn new() -> Self {
        Self {
            visible: false,
            options: all::<Division>().collect(),
            selected: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeasonPicker {
    pub visible: bool,
    pub options: Vec<PastSeason>,
    pub selected: Option<SeasonId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetailPanel {
    /// The "pick a team" welcome panel
    Placeholder,
    Team(TeamId),
}

/// Everything the host needs to draw the sidebar.
///
/// The secondary pickers are `None` until first needed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SidebarPanel {
    pub switcher: ViewSwitcher,
    pub division_picker: Option<DivisionPicker>,
    pub season_picker: Option<SeasonPicker>,
    pub loading: bool,
    pub subtitle: String,
    pub body: SidebarBody,
    pub detail: DetailPanel,
}

impl Default for SidebarPanel {
    fn default() -> Self {
        Self {
            switcher: ViewSwitcher::default(),
            division_picker: None,
            season_picker: None,
            loading: false,
            subtitle: String::new(),
            body: SidebarBody::Empty(String::new()),
            detail: DetailPanel::Placeholder,
        }
    }
}

/// A team write made elsewhere in the dashboard that makes cached lists wrong
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeamMutation {
    Created(TeamId),
    Deleted(TeamId),
    Edited(TeamId),
    MemberAdded(TeamId),
    MemberRemoved(TeamId),
}

impl TeamMutation {
    pub fn team_id(&self) -> TeamId {
        match *self {
            Self::Created(id)
            | Self::Deleted(id)
            | Self::Edited(id)
            | Self::MemberAdded(id)
            | Self::MemberRemoved(id) => id,
        }
    }
}

impl fmt::Display for TeamMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(id) => write!(f, "team {id} created"),
            Self::Deleted(id) => write!(f, "team {id} deleted"),
            Self::Edited(id) => write!(f, "team {id} edited"),
            Self::MemberAdded(id) => write!(f, "member added to team {id}"),
            Self::MemberRemoved(id) => write!(f, "member removed from team {id}"),
        }
    }
}

/// A team fetch that has been dispatched but not yet applied.
#[derive(Debug)]
pub struct PendingLoad {
    generation: u64,
    key: CacheKey,
    view: View,
    division: Option<Division>,
    season_id: Option<SeasonId>,
}

impl PendingLoad {
    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn season_id(&self) -> Option<SeasonId> {
        self.season_id
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

#[derive(Debug)]
pub enum LoadStep {
    /// Past seasons are shown but none is picked, nothing to fetch
    AwaitingSeason,
    /// Rendered straight from the cache
    Cached,
    /// The caller must fetch the list and hand it to `finish_load`
    Fetch(PendingLoad),
}

pub struct SidebarController<A, S> {
    api: A,
    storage: S,
    permissions: Permissions,
    views: Vec<ViewDescriptor>,
    current_view: View,
    division_filter: Option<Division>,
    past_season_filter: Option<SeasonId>,
    expanded_games: BTreeSet<String>,
    cache: TeamCache,
    teams: Vec<TeamSummary>,
    generation: u64,
    selected_team: Option<TeamId>,
    panel: SidebarPanel,
}

impl<A: SidebarApi, S: SessionStorage> SidebarController<A, S> {
    pub fn new(api: A, storage: S, permissions: Permissions) -> Self {
        let mut controller = Self {
            api,
            storage,
            permissions,
            views: vec![],
            current_view: View::default(),
            division_filter: None,
            past_season_filter: None,
            expanded_games: BTreeSet::new(),
            cache: TeamCache::default(),
            teams: vec![],
            generation: 0,
            selected_team: None,
            panel: SidebarPanel::default(),
        };
        controller.expanded_games = controller.stored_expanded_games();
        controller
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TeamCache::new(ttl);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn panel(&self) -> &SidebarPanel {
        &self.panel
    }

    pub fn views(&self) -> &[ViewDescriptor] {
        &self.views
    }

    pub fn current_view(&self) -> &View {
        &self.current_view
    }

    pub fn division_filter(&self) -> Option<Division> {
        self.division_filter
    }

    pub fn past_season_filter(&self) -> Option<SeasonId> {
        self.past_season_filter
    }

    pub fn expanded_games(&self) -> &BTreeSet<String> {
        &self.expanded_games
    }

    pub fn teams(&self) -> &[TeamSummary] {
        &self.teams
    }

    pub fn selected_team(&self) -> Option<TeamId> {
        self.selected_team
    }

    pub fn cache(&self) -> &TeamCache {
        &self.cache
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::derive(
            &self.current_view,
            self.division_filter.map(Division::name),
            self.past_season_filter,
        )
    }

    /// Fetches the views this user may pick from and restores the last choice.
    ///
    /// Does not load teams, call `load` afterwards.
    pub async fn initialize(&mut self) {
        self.views = match self.api.available_views().await {
            Ok(views) => views,
            Err(e) => {
                error!("Failed to load the available team views: {e}");
                vec![]
            }
        };

        self.panel.switcher.options = self.views.clone();
        match self.views.len() {
            0 => {
                info!("No team views available, hiding the view switcher");
                self.panel.switcher.visible = false;
                return;
            }
            1 => {
                self.current_view = View::from_value(&self.views[0].value);
                self.panel.switcher.visible = false;
            }
            _ => {
                let stored = self
                    .storage
                    .get(VIEW_KEY)
                    .filter(|stored| self.views.iter().any(|v| &v.value == stored));
                let value = stored.unwrap_or_else(|| self.views[0].value.clone());
                self.current_view = View::from_value(&value);
                self.panel.switcher.visible = true;
            }
        }
        self.panel.switcher.selected = self.current_view.clone();
        self.expanded_games = self.stored_expanded_games();
        info!("Team sidebar starting on the {} view", self.current_view);

        self.init_division_filter();
        self.init_past_season_filter().await;
    }

    fn init_division_filter(&mut self) {
        if !self.permissions.is_admin {
            return;
        }

        self.division_filter = self
            .storage
            .get(DIVISION_FILTER_KEY)
            .and_then(|name| Division::from_name(&name));
        if self.current_view == View::Division {
            let selected = self.division_filter;
            let picker = self.division_picker_mut();
            picker.selected = selected;
            picker.visible = true;
        }
    }

    async fn init_past_season_filter(&mut self) {
        if !self.permissions.is_admin {
            return;
        }

        self.past_season_filter = self
            .storage
            .get(PAST_SEASON_FILTER_KEY)
            .and_then(|id| id.parse().ok());
        if self.current_view == View::PastSeasons {
            self.season_picker_mut().visible = true;
            if self.load_past_seasons().await {
                let stored = self.past_season_filter;
                let known = self
                    .panel
                    .season_picker
                    .as_ref()
                    .is_some_and(|p| p.options.iter().any(|s| Some(s.season_id) == stored));
                if !known && stored.is_some() {
                    warn!("Stored past season is no longer offered, clearing it");
                    self.past_season_filter = None;
                    self.storage.remove(PAST_SEASON_FILTER_KEY);
                }
            }
            let selected = self.past_season_filter;
            self.season_picker_mut().selected = selected;
        }
    }

    /// Populates the past season picker, returning whether the fetch succeeded
    pub async fn load_past_seasons(&mut self) -> bool {
        let result = self.api.past_seasons().await;
        let picker = self.season_picker_mut();
        match result {
            Ok(seasons) => {
                debug!("Loaded {} past seasons", seasons.len());
                picker.options = seasons;
                true
            }
            Err(e) => {
                error!("Failed to load past seasons: {e}");
                picker.options = vec![];
                false
            }
        }
    }

    pub async fn select_view(&mut self, view: View, now: Instant) {
        if view != self.current_view {
            info!("Switching team view from {} to {view}", self.current_view);
            self.storage.set(VIEW_KEY, view.as_str());
            self.current_view = view;
            self.panel.switcher.selected = self.current_view.clone();

            if let Some(picker) = self.panel.division_picker.as_mut() {
                picker.visible = false;
                picker.selected = None;
            }
            if let Some(picker) = self.panel.season_picker.as_mut() {
                picker.visible = false;
                picker.selected = None;
            }
            self.division_filter = None;
            self.past_season_filter = None;
            self.storage.remove(DIVISION_FILTER_KEY);
            self.storage.remove(PAST_SEASON_FILTER_KEY);

            self.scope_changed();
            self.teams.clear();
            self.expanded_games = self.stored_expanded_games();

            if self.permissions.is_admin {
                match self.current_view {
                    View::Division => self.division_picker_mut().visible = true,
                    View::PastSeasons => {
                        self.season_picker_mut().visible = true;
                        self.load_past_seasons().await;
                        self.show_season_prompt();
                        return;
                    }
                    _ => {}
                }
            }
        }

        self.load(now).await;
    }

    pub async fn select_division(&mut self, division: Option<Division>, now: Instant) {
        if !self.permissions.is_admin {
            warn!("Ignoring division filter change from a non-admin user");
            return;
        }
        if self.current_view != View::Division {
            warn!("Ignoring division filter change in the {} view", self.current_view);
            return;
        }

        match division {
            Some(division) => self.storage.set(DIVISION_FILTER_KEY, division.name()),
            None => self.storage.remove(DIVISION_FILTER_KEY),
        }
        info!("Division filter set to {division:?}");
        self.division_filter = division;
        self.division_picker_mut().selected = division;

        self.scope_changed();
        self.load(now).await;
    }

    pub async fn select_past_season(&mut self, season_id: Option<SeasonId>, now: Instant) {
        if !self.permissions.is_admin {
            warn!("Ignoring past season change from a non-admin user");
            return;
        }
        if self.current_view != View::PastSeasons {
            warn!("Ignoring past season change in the {} view", self.current_view);
            return;
        }

        match season_id {
            Some(id) => self.storage.set(PAST_SEASON_FILTER_KEY, &id.to_string()),
            None => self.storage.remove(PAST_SEASON_FILTER_KEY),
        }
        info!("Past season filter set to {season_id:?}");
        self.past_season_filter = season_id;
        self.season_picker_mut().selected = season_id;

        self.scope_changed();
        self.load(now).await;
    }

    pub async fn load(&mut self, now: Instant) {
        if let LoadStep::Fetch(pending) = self.begin_load(now) {
            let result = self
                .api
                .sidebar_teams(&pending.view, pending.season_id)
                .await;
            self.finish_load(pending, result, now);
        }
    }

    /// First half of `load`, for hosts that run the fetch themselves
    pub fn begin_load(&mut self, now: Instant) -> LoadStep {
        if self.current_view == View::PastSeasons && self.past_season_filter.is_none() {
            self.show_season_prompt();
            return LoadStep::AwaitingSeason;
        }

        let key = self.cache_key();
        if let Some(teams) = self.cache.get(&key, now) {
            let teams = teams.to_vec();
            self.panel.loading = false;
            self.show_teams(teams);
            return LoadStep::Cached;
        }

        debug!("Fetching teams for {key}");
        self.panel.loading = true;
        LoadStep::Fetch(PendingLoad {
            generation: self.generation,
            key,
            view: self.current_view.clone(),
            division: self.division_filter,
            season_id: self.past_season_filter,
        })
    }

    /// Applies a fetch result, returning `false` if the view or filters changed since dispatch
    pub fn finish_load(
        &mut self,
        pending: PendingLoad,
        result: Result<Vec<TeamSummary>>,
        now: Instant,
    ) -> bool {
        if pending.generation != self.generation {
            debug!(
                "Discarding team list for {} from generation {} (now {})",
                pending.key, pending.generation, self.generation
            );
            return false;
        }

        self.panel.loading = false;
        match result {
            Ok(mut teams) => {
                if let (View::Division, Some(division)) = (&pending.view, pending.division) {
                    teams.retain(|team| team.in_division(division.name()));
                }
                debug!("Loaded {} teams for {}", teams.len(), pending.key);
                self.cache.insert(pending.key, teams.clone(), now);
                self.show_teams(teams);
            }
            Err(e) => {
                error!("Failed to load teams for the {} view: {e}", pending.view);
                self.teams.clear();
                self.panel.subtitle = count_label(0);
                self.panel.body = SidebarBody::Empty(pending.view.empty_message().to_string());
            }
        }
        true
    }

    /// Empties the cache and orphans any fetch still in flight, so its result is never stored
    pub fn invalidate_all(&mut self) {
        self.cache.invalidate_all();
        self.generation += 1;
    }

    /// Drops every cached list after a team write and reloads the current scope
    pub async fn notify_team_mutation(&mut self, mutation: TeamMutation, now: Instant) {
        info!("Reloading team sidebar: {mutation}");
        if matches!(mutation, TeamMutation::Deleted(_))
            && self.selected_team == Some(mutation.team_id())
        {
            self.clear_selection();
        }
        self.invalidate_all();
        self.load(now).await;
    }

    /// Expands or collapses one game folder, redrawing from the teams already held
    pub fn toggle_game(&mut self, game_id: GameId) {
        let id = game_id.to_string();
        if !self.expanded_games.remove(&id) {
            self.expanded_games.insert(id);
        }

        let key = expanded_games_key(self.current_view.as_str());
        match serde_json::to_string(&self.expanded_games) {
            Ok(json) => self.storage.set(&key, &json),
            Err(e) => warn!("Failed to store expanded games: {e}"),
        }

        if !self.teams.is_empty() {
            self.render();
        }
    }

    pub fn select_team(&mut self, team_id: TeamId) {
        self.selected_team = Some(team_id);
        self.panel.detail = DetailPanel::Team(team_id);
    }

    pub fn clear_selection(&mut self) {
        self.selected_team = None;
        self.panel.detail = DetailPanel::Placeholder;
    }

    fn scope_changed(&mut self) {
        self.invalidate_all();
        self.clear_selection();
    }

    fn show_season_prompt(&mut self) {
        self.teams.clear();
        self.panel.loading = false;
        self.panel.subtitle = count_label(0);
        self.panel.body = SidebarBody::Empty(SELECT_SEASON_MESSAGE.to_string());
    }

    fn show_teams(&mut self, teams: Vec<TeamSummary>) {
        self.teams = teams;
        self.render();
    }

    fn render(&mut self) {
        self.panel.subtitle = count_label(self.teams.len());
        self.panel.body = render_body(&self.current_view, &self.teams, &self.expanded_games);
    }

    fn stored_expanded_games(&self) -> BTreeSet<String> {
        let key = expanded_games_key(self.current_view.as_str());
        match self.storage.get(&key) {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Ignoring unreadable {key}: {e}");
                BTreeSet::new()
            }),
            None => BTreeSet::new(),
        }
    }

    fn division_picker_mut(&mut self) -> &mut DivisionPicker {
        self.panel
            .division_picker
            .get_or_insert_with(DivisionPicker::new)
    }

    fn season_picker_mut(&mut self) -> &mut SeasonPicker {
        self.panel.season_picker.get_or_insert_with(Default::default)
    }
}
