use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;
use std::time::Instant;

use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap,
};
use ratatui::Frame;

use crate::config::AppConfig;
use crate::error::{AdminError, ValidationErrors};
use crate::form::FormMode;
use crate::models::EntityKind;
use crate::router::{self, Route};
use crate::session::{SessionGate, StaticCredentials};
use crate::source::RecordSource;

use super::forms::{self, ConfirmRecordDelete, LoginField, LoginView, RecordField};
use super::helpers::{centered_rect, filter_summary};
use super::loader::{LoadOutcome, Loader};
use super::screens::{LoadState, RecordScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Width of the navigation sidebar.
const SIDEBAR_WIDTH: u16 = 16;
/// Number of past notifications kept for the history popup.
const HISTORY_LIMIT: usize = 50;

/// Fine-grained modes scoped to the current route.
enum Mode {
    Normal,
    Searching,
    Form(RecordField),
    ConfirmDelete(ConfirmRecordDelete),
    History,
}

/// Holds the footer message text plus its severity.
#[derive(Clone)]
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    session: SessionGate,
    route: Route,
    login: LoginView,
    students: RecordScreen,
    teachers: RecordScreen,
    loader: Loader,
    next_ticket: u64,
    mode: Mode,
    status: Option<StatusMessage>,
    history: VecDeque<StatusMessage>,
}

impl App {
    /// Build the shell with the credential pair and login delay from `config`.
    pub fn new(config: AppConfig, source: Arc<dyn RecordSource>) -> Self {
        let session = SessionGate::new(
            StaticCredentials::new(config.username.clone(), config.password.clone()),
            config.login_delay(),
        );
        Self::with_session(config, source, session)
    }

    /// Build the shell around an existing session gate, e.g. one backed by a
    /// different credential verifier.
    pub fn with_session(
        config: AppConfig,
        source: Arc<dyn RecordSource>,
        session: SessionGate,
    ) -> Self {
        Self {
            session,
            route: Route::Login,
            login: LoginView::default(),
            students: RecordScreen::new(config.students),
            teachers: RecordScreen::new(config.teachers),
            loader: Loader::new(source),
            next_ticket: 1,
            mode: Mode::Normal,
            status: None,
            history: VecDeque::new(),
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Switch to `requested`, redirecting to login when the session does not
    /// allow it. Entering a record screen for the first time starts its load.
    pub fn navigate(&mut self, requested: Route) {
        let route = router::resolve(requested, &self.session);
        self.route = route;
        self.mode = Mode::Normal;
        if let Route::Records(kind) = route {
            if self.screen(kind).load == LoadState::Idle {
                self.start_load(kind);
            }
        }
    }

    /// Resolve pending login checks and apply finished loads.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        if let Some(outcome) = self.session.poll(now) {
            match outcome {
                Ok(()) => {
                    self.login = LoginView::default();
                    self.set_status("Login successful", StatusKind::Info);
                    self.navigate(Route::Records(EntityKind::Student));
                }
                Err(err) => self.set_status(err.to_string(), StatusKind::Error),
            }
        }

        for outcome in self.loader.drain() {
            self.apply_load(outcome);
        }
    }

    /// Handle a key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        let next = match (mode, self.route) {
            (Mode::Normal, Route::Login) => self.handle_login_key(code, &mut exit),
            (Mode::Normal, Route::Records(kind)) => self.handle_records_key(kind, code, &mut exit),
            (Mode::Searching, Route::Records(kind)) => self.handle_search(kind, code),
            (Mode::Form(field), Route::Records(kind)) => self.handle_form(kind, code, field),
            (Mode::ConfirmDelete(confirm), Route::Records(kind)) => {
                self.handle_confirm_delete(kind, code, confirm)
            }
            (Mode::History, _) => Mode::Normal,
            (_, Route::Login) => Mode::Normal,
        };

        self.mode = next;
        exit
    }

    fn handle_login_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Esc => *exit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.login.toggle_field()
            }
            KeyCode::Backspace => self.login.backspace(),
            KeyCode::Enter => self.submit_login(),
            // Every printable character belongs to the credentials here.
            KeyCode::F(1) => return Mode::History,
            KeyCode::Char(ch) => {
                if self.login.push_char(ch) {
                    self.login.errors = ValidationErrors::new();
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    fn submit_login(&mut self) {
        if let Err(err) = self.login.form.validate() {
            if let AdminError::Validation(errors) = &err {
                self.login.errors = errors.clone();
            }
            self.set_status(err.to_string(), StatusKind::Error);
            return;
        }

        let started = self.session.begin_login(
            &self.login.form.username,
            &self.login.form.password,
            Instant::now(),
        );
        match started {
            Ok(()) => self.set_status("Logging in...", StatusKind::Info),
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn handle_records_key(&mut self, kind: EntityKind, code: KeyCode, exit: &mut bool) -> Mode {
        let mut status_to_set = None;
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Tab | KeyCode::BackTab => {
                let other = match kind {
                    EntityKind::Student => EntityKind::Teacher,
                    EntityKind::Teacher => EntityKind::Student,
                };
                self.navigate(Route::Records(other));
            }
            KeyCode::Char('1') => self.navigate(Route::Records(EntityKind::Student)),
            KeyCode::Char('2') => self.navigate(Route::Records(EntityKind::Teacher)),
            KeyCode::Up => self.screen_mut(kind).move_selection(-1),
            KeyCode::Down => self.screen_mut(kind).move_selection(1),
            KeyCode::PageUp => self.screen_mut(kind).move_selection(-10),
            KeyCode::PageDown => self.screen_mut(kind).move_selection(10),
            KeyCode::Home => self.screen_mut(kind).select_first(),
            KeyCode::End => self.screen_mut(kind).select_last(),
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.screen_mut(kind).form.open_add();
                return Mode::Form(RecordField::FirstName);
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                let screen = self.screen_mut(kind);
                if let Some(record) = screen.current_record().cloned() {
                    screen.form.open_edit(&record);
                    return Mode::Form(RecordField::FirstName);
                }
                status_to_set = Some((
                    format!("No {} selected to edit.", screen.config.singular.to_lowercase()),
                    StatusKind::Error,
                ));
            }
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Delete => {
                let screen = self.screen(kind);
                if let Some(record) = screen.current_record() {
                    return Mode::ConfirmDelete(ConfirmRecordDelete::from(record));
                }
                status_to_set = Some((
                    format!(
                        "No {} selected to delete.",
                        screen.config.singular.to_lowercase()
                    ),
                    StatusKind::Error,
                ));
            }
            KeyCode::Char('f') | KeyCode::Char('/') => return Mode::Searching,
            KeyCode::Esc => {
                let screen = self.screen_mut(kind);
                if screen.filter.is_active() {
                    screen.set_search(String::new());
                    screen.clear_category();
                    status_to_set = Some(("Filters cleared.".to_string(), StatusKind::Info));
                }
            }
            KeyCode::Char('c') => {
                let screen = self.screen_mut(kind);
                let message = match screen.cycle_category() {
                    Some(category) => format!(
                        "Showing {} {category}.",
                        screen.config.category_field
                    ),
                    None => format!("Showing all {}.", screen.config.plural_noun()),
                };
                status_to_set = Some((message, StatusKind::Info));
            }
            KeyCode::Char('x') => {
                let screen = self.screen_mut(kind);
                screen.clear_category();
                status_to_set = Some((
                    format!("Showing all {}.", screen.config.plural_noun()),
                    StatusKind::Info,
                ));
            }
            KeyCode::Char('r') => self.start_load(kind),
            KeyCode::Char('o') => self.logout(),
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => return Mode::History,
            _ => {}
        }

        if let Some((text, kind)) = status_to_set {
            self.set_status(text, kind);
        }
        Mode::Normal
    }

    fn handle_search(&mut self, kind: EntityKind, code: KeyCode) -> Mode {
        let screen = self.screen_mut(kind);
        match code {
            KeyCode::Esc => {
                screen.set_search(String::new());
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => screen.move_selection(-1),
            KeyCode::Down => screen.move_selection(1),
            KeyCode::Backspace => {
                let mut query = screen.filter.search().to_string();
                query.pop();
                screen.set_search(query);
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                let mut query = screen.filter.search().to_string();
                query.push(ch);
                screen.set_search(query);
            }
            _ => {}
        }
        Mode::Searching
    }

    fn handle_form(&mut self, kind: EntityKind, code: KeyCode, field: RecordField) -> Mode {
        let screen = self.screen_mut(kind);
        match code {
            KeyCode::Esc => {
                let message = if screen.form.editing().is_some() {
                    "Edit cancelled.".to_string()
                } else {
                    format!("Add {} cancelled.", screen.config.singular.to_lowercase())
                };
                screen.form.cancel();
                self.set_status(message, StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => return Mode::Form(field.next()),
            KeyCode::BackTab | KeyCode::Up => return Mode::Form(field.previous()),
            KeyCode::Enter => {
                return match screen.submit_form() {
                    Ok(submission) => {
                        let message = submission.notice(&screen.config);
                        self.set_status(message, StatusKind::Info);
                        Mode::Normal
                    }
                    Err(err) => {
                        let focus = match &err {
                            AdminError::Validation(errors) => [
                                RecordField::FirstName,
                                RecordField::LastName,
                                RecordField::Category,
                            ]
                            .into_iter()
                            .find(|candidate| errors.get(candidate.error_key()).is_some())
                            .unwrap_or(field),
                            _ => field,
                        };
                        self.set_status(err.to_string(), StatusKind::Error);
                        Mode::Form(focus)
                    }
                };
            }
            _ => {}
        }

        if let Some(surface) = screen.form.surface_mut() {
            let changed = match (code, field) {
                (KeyCode::Left, RecordField::Category) => {
                    forms::cycle_category(&mut surface.draft, &screen.config, false);
                    true
                }
                (KeyCode::Right, RecordField::Category)
                | (KeyCode::Char(' '), RecordField::Category) => {
                    forms::cycle_category(&mut surface.draft, &screen.config, true);
                    true
                }
                (KeyCode::Backspace, _) => {
                    forms::backspace(&mut surface.draft, field);
                    true
                }
                (KeyCode::Char(ch), _) => forms::push_char(&mut surface.draft, field, ch),
                _ => false,
            };
            if changed {
                surface.errors = ValidationErrors::new();
            }
        }
        Mode::Form(field)
    }

    fn handle_confirm_delete(
        &mut self,
        kind: EntityKind,
        code: KeyCode,
        confirm: ConfirmRecordDelete,
    ) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let screen = self.screen_mut(kind);
                match screen.delete(confirm.id) {
                    Ok(_) => {
                        let message = format!("{} deleted successfully", screen.config.singular);
                        self.set_status(message, StatusKind::Info);
                    }
                    Err(err) => self.set_status(err.to_string(), StatusKind::Error),
                }
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    /// Leave the record screens and forget their in-memory state.
    pub fn logout(&mut self) {
        self.session.logout();
        self.students.reset();
        self.teachers.reset();
        self.login = LoginView::default();
        self.route = Route::Login;
        self.mode = Mode::Normal;
        self.set_status("Logged out.", StatusKind::Info);
    }

    fn start_load(&mut self, kind: EntityKind) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let screen = self.screen_mut(kind);
        match screen.begin_load(ticket) {
            Ok(()) => {
                let config = screen.config.clone();
                self.loader.request(config, ticket);
            }
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn apply_load(&mut self, outcome: LoadOutcome) {
        let screen = self.screen_mut(outcome.kind);
        let noun = screen.config.plural_noun();
        match screen.finish_load(outcome.ticket, outcome.result) {
            Some(Ok(count)) => self.set_status(format!("Loaded {count} {noun}."), StatusKind::Info),
            Some(Err(err)) => self.set_status(err.to_string(), StatusKind::Error),
            None => {}
        }
    }

    fn screen(&self, kind: EntityKind) -> &RecordScreen {
        match kind {
            EntityKind::Student => &self.students,
            EntityKind::Teacher => &self.teachers,
        }
    }

    fn screen_mut(&mut self, kind: EntityKind) -> &mut RecordScreen {
        match kind {
            EntityKind::Student => &mut self.students,
            EntityKind::Teacher => &mut self.teachers,
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        let message = StatusMessage {
            text: text.into(),
            kind,
        };
        self.history.push_back(message.clone());
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.status = Some(message);
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(content_area);

        self.draw_sidebar(frame, columns[0]);
        match self.route {
            Route::Login => self.draw_login(frame, columns[1]),
            Route::Records(kind) => self.draw_records(frame, columns[1], self.screen(kind)),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match (&self.mode, self.route) {
            (Mode::Form(field), Route::Records(kind)) => {
                self.draw_record_form(frame, area, self.screen(kind), *field)
            }
            (Mode::ConfirmDelete(confirm), Route::Records(kind)) => {
                self.draw_confirm_delete(frame, area, self.screen(kind), confirm)
            }
            (Mode::Searching, Route::Records(kind)) => {
                self.draw_search_bar(frame, columns[1], self.screen(kind))
            }
            (Mode::History, _) => self.draw_history(frame, area),
            _ => {}
        }
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let item_style = if self.session.is_authenticated() {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let items: Vec<ListItem> = [
            format!("1 {}", self.students.config.plural),
            format!("2 {}", self.teachers.config.plural),
        ]
        .into_iter()
        .map(|label| ListItem::new(label).style(item_style))
        .collect();

        let mut state = ListState::default();
        state.select(match self.route {
            Route::Records(EntityKind::Student) => Some(0),
            Route::Records(EntityKind::Teacher) => Some(1),
            Route::Login => None,
        });

        let list = List::new(items)
            .block(Block::default().title("Menu").borders(Borders::ALL))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_login(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 40, area);
        let block = Block::default().title("Login").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let busy = self.session.is_busy();
        let paragraph = Paragraph::new(self.login.lines(busy)).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        if busy || matches!(self.mode, Mode::History) {
            return;
        }
        let (prefix, row) = match self.login.active {
            LoginField::Username => ("Username: ".len() as u16, 0),
            LoginField::Password => ("Password: ".len() as u16, 1),
        };
        frame.set_cursor_position((
            inner.x + prefix + self.login.value_len() as u16,
            inner.y + row,
        ));
    }

    fn draw_records(&self, frame: &mut Frame, area: Rect, screen: &RecordScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(1)])
            .split(area);

        let loading = if screen.is_loading() {
            Span::styled("  loading...", Style::default().fg(Color::Yellow))
        } else {
            Span::raw("")
        };
        let header = Paragraph::new(vec![
            Line::from(vec![
                Span::styled(
                    screen.config.plural.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                loading,
            ]),
            Line::from(filter_summary(
                &screen.config.category_label,
                screen.filter.category(),
                screen.filter.search(),
            )),
        ])
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let list_area = chunks[1];
        if list_area.height == 0 {
            return;
        }

        let noun = screen.config.plural_noun();
        let empty_message = if screen.store.is_empty() {
            match &screen.load {
                LoadState::Loading { .. } => Some(format!("Loading {noun}...")),
                LoadState::Failed(reason) => Some(format!("{reason}\nPress [r] to retry.")),
                LoadState::Idle | LoadState::Loaded => Some(format!(
                    "No {noun} yet. Press '+' to add one."
                )),
            }
        } else if screen.visible.is_empty() {
            Some(format!("No {noun} match the current filter."))
        } else {
            None
        };

        if let Some(text) = empty_message {
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, list_area);
            return;
        }

        let header_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let header = Row::new(vec![
            "First Name".to_string(),
            "Last Name".to_string(),
            screen.config.category_label.clone(),
        ])
        .style(header_style);

        let rows: Vec<Row> = screen
            .visible_records()
            .into_iter()
            .map(|record| {
                Row::new(vec![
                    record.first_name.clone(),
                    record.last_name.clone(),
                    record.category.clone(),
                ])
            })
            .collect();

        let title = format!("{} of {}", screen.visible.len(), screen.store.len());
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(38),
                Constraint::Percentage(38),
                Constraint::Percentage(24),
            ],
        )
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol(">> ");

        let mut state = TableState::default().with_selected(Some(screen.selected));
        frame.render_stateful_widget(table, list_area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, screen: &RecordScreen) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let query = screen.filter.search();
        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {query}")))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.mode, self.route) {
            (Mode::History, _) => &[("[any key]", " Close")],
            (Mode::Form(_), _) => &[
                ("[Enter]", " Save   "),
                ("[Tab]", " Next Field   "),
                ("[←→]", " Choose   "),
                ("[Esc]", " Cancel"),
            ],
            (Mode::ConfirmDelete(_), _) => &[("[y]", " Delete   "), ("[n]", " Keep")],
            (Mode::Searching, _) => &[
                ("[type]", " Filter   "),
                ("[↑↓]", " Select   "),
                ("[Enter]", " Keep   "),
                ("[Esc]", " Clear"),
            ],
            (_, Route::Login) => &[
                ("[Tab]", " Switch Field   "),
                ("[Enter]", " Login   "),
                ("[F1]", " History   "),
                ("[Esc]", " Quit"),
            ],
            (_, Route::Records(_)) => &[
                ("[↑↓]", " Select   "),
                ("[+]", " Add   "),
                ("[e]", " Edit   "),
                ("[-]", " Delete   "),
                ("[f]", " Search   "),
                ("[c]", " Category   "),
                ("[x]", " All   "),
                ("[r]", " Reload   "),
                ("[Tab]", " Switch   "),
                ("[?]", " History   "),
                ("[o]", " Logout   "),
                ("[q]", " Quit"),
            ],
        };

        let spans: Vec<Span<'static>> = keys
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(label.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_record_form(
        &self,
        frame: &mut Frame,
        area: Rect,
        screen: &RecordScreen,
        field: RecordField,
    ) {
        let Some(surface) = screen.form.surface() else {
            return;
        };
        let title = match surface.mode {
            FormMode::Adding => format!("Add {}", screen.config.singular),
            FormMode::Editing(_) => format!("Edit {}", screen.config.singular),
        };

        let popup_area = centered_rect(70, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines =
            forms::record_form_lines(&surface.draft, &surface.errors, field, &screen.config);
        lines.push(Line::from(""));
        let action = match surface.mode {
            FormMode::Adding => "Add",
            FormMode::Editing(_) => "Update",
        };
        lines.push(Line::from(Span::styled(
            format!("Enter to {} | Tab to switch | Esc to cancel", action.to_lowercase()),
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let value_len = match field {
            RecordField::FirstName => surface.draft.first_name.chars().count(),
            RecordField::LastName => surface.draft.last_name.chars().count(),
            RecordField::Category => return,
        };
        let prefix = match field {
            RecordField::FirstName => "First Name: ".len(),
            _ => "Last Name: ".len(),
        };
        frame.set_cursor_position((
            inner.x + (prefix + value_len) as u16,
            inner.y + field.row(),
        ));
    }

    fn draw_confirm_delete(
        &self,
        frame: &mut Frame,
        area: Rect,
        screen: &RecordScreen,
        confirm: &ConfirmRecordDelete,
    ) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Deletion")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete {} {}?",
                screen.config.singular.to_lowercase(),
                confirm.name
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_history(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let items: Vec<ListItem> = if self.history.is_empty() {
            vec![ListItem::new("Nothing yet.")]
        } else {
            self.history
                .iter()
                .rev()
                .map(|message| {
                    ListItem::new(Line::from(Span::styled(
                        message.text.clone(),
                        message.kind.style(),
                    )))
                })
                .collect()
        };

        let list = List::new(items).block(
            Block::default()
                .title("Notifications")
                .borders(Borders::ALL),
        );
        frame.render_widget(list, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::models::{KindConfig, Record, RecordId};

    struct FixtureSource;

    impl RecordSource for FixtureSource {
        fn fetch(&self, config: &KindConfig) -> Result<Vec<Record>, AdminError> {
            Ok(vec![
                Record {
                    id: RecordId::new(1),
                    first_name: "Ann".into(),
                    last_name: "Lee".into(),
                    category: config.categories[0].clone(),
                },
                Record {
                    id: RecordId::new(2),
                    first_name: "Bo".into(),
                    last_name: "Ray".into(),
                    category: config.categories[1].clone(),
                },
            ])
        }
    }

    struct DownSource;

    impl RecordSource for DownSource {
        fn fetch(&self, config: &KindConfig) -> Result<Vec<Record>, AdminError> {
            Err(AdminError::load_failure(config.plural_noun(), "connection refused"))
        }
    }

    fn app_with(source: Arc<dyn RecordSource>) -> App {
        let config = AppConfig {
            login_delay_ms: 0,
            ..AppConfig::default()
        };
        App::new(config, source)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch));
        }
    }

    /// Wait for the next background load and apply it.
    fn settle(app: &mut App) {
        let outcome = app.loader.recv().expect("load result");
        app.apply_load(outcome);
    }

    /// Apply results until `kind` is no longer loading. The tick that
    /// started the load may already have drained its result.
    fn settle_screen(app: &mut App, kind: EntityKind) {
        while app.screen(kind).is_loading() {
            settle(app);
        }
    }

    fn logged_in(source: Arc<dyn RecordSource>) -> App {
        let mut app = app_with(source);
        type_text(&mut app, "admin");
        app.handle_key(KeyCode::Tab);
        type_text(&mut app, "password");
        app.handle_key(KeyCode::Enter);
        app.tick_at(Instant::now() + Duration::from_millis(1));
        settle_screen(&mut app, EntityKind::Student);
        app
    }

    fn last_status(app: &App) -> (String, StatusKind) {
        let status = app.status.as_ref().expect("status");
        (status.text.clone(), status.kind)
    }

    #[test]
    fn protected_routes_redirect_to_login() {
        let mut app = app_with(Arc::new(FixtureSource));
        app.navigate(Route::Records(EntityKind::Teacher));
        assert_eq!(app.route(), Route::Login);
        assert_eq!(app.teachers.load, LoadState::Idle);
    }

    #[test]
    fn empty_login_fields_never_reach_the_gate() {
        let mut app = app_with(Arc::new(FixtureSource));
        app.handle_key(KeyCode::Enter);
        assert!(!app.session.is_busy());
        assert_eq!(
            last_status(&app),
            (
                "Please enter your username; Please enter your password".to_string(),
                StatusKind::Error
            )
        );
    }

    #[test]
    fn credentials_may_contain_every_printable_character() {
        let config = AppConfig {
            login_delay_ms: 0,
            username: "h?q".to_string(),
            password: "p?ss".to_string(),
            ..AppConfig::default()
        };
        let mut app = App::new(config, Arc::new(FixtureSource));

        type_text(&mut app, "h?q");
        app.handle_key(KeyCode::Tab);
        type_text(&mut app, "p?ss");
        assert_eq!(app.login.form.username, "h?q");
        assert_eq!(app.login.form.password, "p?ss");
        assert!(matches!(app.mode, Mode::Normal));

        app.handle_key(KeyCode::Enter);
        app.tick_at(Instant::now() + Duration::from_millis(1));
        assert!(app.is_authenticated());
        settle_screen(&mut app, EntityKind::Student);
    }

    #[test]
    fn history_opens_from_login_with_f1() {
        let mut app = app_with(Arc::new(FixtureSource));
        app.handle_key(KeyCode::F(1));
        assert!(matches!(app.mode, Mode::History));
        app.handle_key(KeyCode::Char('x'));
        assert!(matches!(app.mode, Mode::Normal));
        assert!(app.login.form.username.is_empty());
    }

    #[test]
    fn busy_login_rejects_resubmission() {
        let mut app = App::new(AppConfig::default(), Arc::new(FixtureSource));
        type_text(&mut app, "admin");
        app.handle_key(KeyCode::Tab);
        type_text(&mut app, "wrong");
        app.handle_key(KeyCode::Enter);
        assert!(app.session.is_busy());

        app.handle_key(KeyCode::Enter);
        assert_eq!(last_status(&app).1, StatusKind::Error);
        assert_eq!(last_status(&app).0, AdminError::Busy.to_string());

        app.tick_at(Instant::now() + Duration::from_secs(2));
        assert_eq!(
            last_status(&app),
            ("Invalid username or password".to_string(), StatusKind::Error)
        );
        assert_eq!(app.route(), Route::Login);
    }

    #[test]
    fn login_opens_students_and_loads_them() {
        let app = logged_in(Arc::new(FixtureSource));
        assert!(app.is_authenticated());
        assert_eq!(app.route(), Route::Records(EntityKind::Student));
        assert_eq!(app.students.visible.len(), 2);
        assert_eq!(last_status(&app).0, "Loaded 2 students.");
        assert!(app
            .history
            .iter()
            .any(|message| message.text == "Login successful"));
    }

    #[test]
    fn failed_load_is_a_notification_not_a_crash() {
        let mut app = logged_in(Arc::new(DownSource));
        assert_eq!(
            last_status(&app),
            (
                "Failed to fetch students: connection refused".to_string(),
                StatusKind::Error
            )
        );
        assert!(app.students.store.is_empty());

        app.handle_key(KeyCode::Char('r'));
        assert!(app.students.is_loading());
        app.handle_key(KeyCode::Char('r'));
        assert_eq!(last_status(&app).0, AdminError::Busy.to_string());
        settle_screen(&mut app, EntityKind::Student);
    }

    #[test]
    fn add_edit_and_delete_through_keys() {
        let mut app = logged_in(Arc::new(FixtureSource));

        app.handle_key(KeyCode::Char('+'));
        app.handle_key(KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Form(RecordField::FirstName)));
        assert_eq!(app.students.store.len(), 2);

        type_text(&mut app, "Cy");
        app.handle_key(KeyCode::Tab);
        type_text(&mut app, "Oh");
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(last_status(&app).0, "Student added successfully");
        let created = app.students.current_record().cloned().unwrap();
        assert_eq!(created.full_name(), "Cy Oh");
        assert_eq!(created.category, "B");

        app.handle_key(KeyCode::Char('e'));
        app.handle_key(KeyCode::Tab);
        type_text(&mut app, "ma");
        app.handle_key(KeyCode::Enter);
        assert_eq!(last_status(&app).0, "Student updated successfully");
        assert_eq!(
            app.students.store.get(&created.id).unwrap().last_name,
            "Ohma"
        );

        app.handle_key(KeyCode::Char('-'));
        app.handle_key(KeyCode::Char('y'));
        assert_eq!(last_status(&app).0, "Student deleted successfully");
        assert!(app.students.store.get(&created.id).is_none());
    }

    #[test]
    fn search_and_category_keys_filter_the_table() {
        let mut app = logged_in(Arc::new(FixtureSource));

        app.handle_key(KeyCode::Char('f'));
        type_text(&mut app, "RAY");
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.students.visible, vec![RecordId::new(2)]);

        app.handle_key(KeyCode::Char('c'));
        assert!(app.students.visible.is_empty());
        assert_eq!(last_status(&app).0, "Showing group A.");

        app.handle_key(KeyCode::Char('x'));
        assert_eq!(app.students.visible, vec![RecordId::new(2)]);
    }

    #[test]
    fn logout_discards_state_and_pending_results() {
        let mut app = logged_in(Arc::new(FixtureSource));
        app.handle_key(KeyCode::Char('2'));
        app.handle_key(KeyCode::Char('o'));

        assert_eq!(app.route(), Route::Login);
        assert!(!app.is_authenticated());
        assert!(app.students.store.is_empty());

        // The teachers load started before logout must not repopulate anything.
        settle(&mut app);
        assert!(app.teachers.store.is_empty());
        assert_eq!(app.teachers.load, LoadState::Idle);
    }

    #[test]
    fn draws_login_and_record_screens() {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();

        let mut app = app_with(Arc::new(FixtureSource));
        terminal.draw(|frame| app.draw(frame)).unwrap();

        app = logged_in(Arc::new(FixtureSource));
        app.handle_key(KeyCode::Char('a'));
        terminal.draw(|frame| app.draw(frame)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Add Student"));
        assert!(text.contains("Ann"));
    }
}
