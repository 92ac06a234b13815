//! Main TUI application state and logic

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tracing::{info, warn};

use super::components::StatusDisplay;
use super::screens::{open_resource, DashboardScreen, HelpScreen, LoginScreen, MainMenuScreen};
use super::traits::{ResourceView, ScreenAction};
use super::ui::{centered_rect, Styles};
use crate::api::{ApiClient, ApiResponse};
use crate::config::Config;
use crate::models::{Resource, Session};
use crate::notify::NotificationQueue;
use crate::prefs::Preferences;

const TICK_RATE: Duration = Duration::from_millis(100);
const STATUS_TIMEOUT: Duration = Duration::from_secs(8);

/// Application screens
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    MainMenu,
    Dashboard,
    Resource(Resource),
    Help,
    Login,
}

impl Screen {
    pub fn title(&self) -> &str {
        match self {
            Screen::MainMenu => "Main Menu",
            Screen::Dashboard => "Dashboard",
            Screen::Resource(resource) => resource.as_str(),
            Screen::Help => "Help",
            Screen::Login => "Login",
        }
    }
}

/// Services shared by every screen
pub struct AppContext {
    pub config: Config,
    pub api: ApiClient,
    pub notifications: NotificationQueue,
    pub prefs: Preferences,
}

impl AppContext {
    pub fn save_prefs(&self) {
        if let Err(e) = self.prefs.save(&self.config.prefs_path) {
            warn!("Failed to save preferences: {}", e);
            self.notifications.error(format!("Could not save preferences: {}", e));
        }
    }
}

/// Main TUI application state
pub struct App {
    pub ctx: AppContext,
    pub current_screen: Screen,

    // Screen states
    pub main_menu: MainMenuScreen,
    pub dashboard: DashboardScreen,
    pub help: HelpScreen,
    pub login: LoginScreen,
    /// Screen of the open resource, rebuilt on every visit
    pub resource: Option<Box<dyn ResourceView>>,

    // Global application state
    pub status: StatusDisplay,
    pub should_quit: bool,
    pub show_help_popup: bool,
}

impl App {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            current_screen: Screen::MainMenu,
            main_menu: MainMenuScreen::new(),
            dashboard: DashboardScreen::new(),
            help: HelpScreen::new(),
            login: LoginScreen::new(),
            resource: None,
            status: StatusDisplay::new().with_auto_clear(STATUS_TIMEOUT),
            should_quit: false,
            show_help_popup: false,
        }
    }

    /// Run the main application loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.check_session().await;

        loop {
            terminal.draw(|f| self.draw(f))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key).await;
                    }
                }
            }
            self.on_tick(Instant::now());

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Validate the stored token; without a usable one the login form opens
    async fn check_session(&mut self) {
        if self.ctx.prefs.session_token.is_none() {
            self.current_screen = Screen::Login;
            self.status.set_info("Please sign in");
            return;
        }

        match self.ctx.api.silent().current_user().await {
            ApiResponse::Failed(failed) if failed.status == Some(401) => {
                info!("Stored session was rejected");
                self.current_screen = Screen::Login;
                self.status.set_error("Session expired, please sign in again");
            }
            ApiResponse::Failed(failed) => self.status.set_error(failed.message),
            response => {
                if let Some(user) = response.into_rows().and_then(|rows| rows.into_iter().next()) {
                    self.status.set_success(format!("Signed in as {}", user.email));
                }
            }
        }
    }

    fn captures_input(&self) -> bool {
        match self.current_screen {
            Screen::Login => self.login.captures_input(),
            Screen::Resource(_) => self.resource.as_ref().map_or(false, |r| r.captures_input()),
            _ => false,
        }
    }

    /// Handle keyboard input events
    pub async fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        // Global shortcuts
        match key.code {
            KeyCode::F(1) => {
                self.show_help_popup = !self.show_help_popup;
                return;
            }
            KeyCode::F(2) => {
                self.toggle_theme();
                return;
            }
            KeyCode::Esc if self.show_help_popup => {
                self.show_help_popup = false;
                return;
            }
            _ => {}
        }
        if self.show_help_popup {
            return;
        }
        if !self.captures_input() {
            match key.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('?') => {
                    self.show_help_popup = true;
                    return;
                }
                _ => {}
            }
        }

        // Screen-specific event handling; screens report their own failures
        let api = self.ctx.api.silent();
        let action = match self.current_screen {
            Screen::MainMenu => self.main_menu.handle_key(key),
            Screen::Dashboard => self.dashboard.handle_key(key, &api).await,
            Screen::Help => self.help.handle_key(key),
            Screen::Login => {
                let action = self.login.handle_key(key, &api).await;
                if let Some(session) = self.login.take_session() {
                    self.on_login(session);
                }
                action
            }
            Screen::Resource(_) => match self.resource.as_mut() {
                Some(view) => view.handle_key(key, &api).await,
                None => ScreenAction::NavigateBack,
            },
        };
        self.apply(action).await;
    }

    async fn apply(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::NavigateTo(screen) => self.navigate_to_screen(screen).await,
            ScreenAction::NavigateBack => self.navigate_to_screen(Screen::MainMenu).await,
            ScreenAction::Quit => self.should_quit = true,
            other => self.show(other),
        }
    }

    fn show(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::SetStatus(message) => self.status.set_success(message),
            ScreenAction::SetError(message) => self.status.set_error(message),
            _ => {}
        }
    }

    /// Navigate to a specific screen, loading its data
    pub async fn navigate_to_screen(&mut self, screen: Screen) {
        info!("Opening {}", screen.title());
        if !matches!(screen, Screen::Resource(_)) {
            self.resource = None;
        }

        let api = self.ctx.api.silent();
        let action = match &screen {
            Screen::Resource(resource) => {
                let mut view = open_resource(*resource, &self.ctx.config);
                let action = view.refresh(&api).await;
                self.resource = Some(view);
                action
            }
            Screen::Dashboard => self.dashboard.refresh(&api).await,
            Screen::Login => {
                self.logout();
                ScreenAction::None
            }
            _ => ScreenAction::None,
        };

        self.current_screen = screen;
        self.show(action);
    }

    fn on_login(&mut self, session: Session) {
        let who = session
            .user
            .as_ref()
            .map(|user| user.email.clone())
            .unwrap_or_else(|| "admin".to_string());
        self.ctx.api.set_token(Some(session.token.clone()));
        self.ctx.prefs.session_token = Some(session.token);
        self.ctx.save_prefs();
        self.status.set_success(format!("Signed in as {}", who));
    }

    fn logout(&mut self) {
        if self.ctx.prefs.session_token.take().is_some() {
            info!("Signed out");
            self.ctx.api.set_token(None);
            self.ctx.save_prefs();
        }
    }

    fn toggle_theme(&mut self) {
        let dark = self.ctx.prefs.toggle_dark();
        self.ctx.save_prefs();
        self.status
            .set_info(if dark { "Dark theme" } else { "Light theme" });
    }

    /// Advance debouncers and surface queued notifications
    pub fn on_tick(&mut self, now: Instant) {
        if let Some(view) = self.resource.as_mut() {
            view.tick(now);
        }
        for notification in self.ctx.notifications.drain() {
            self.status.set_message(notification);
        }
        self.status.expire();
    }

    /// Draw the UI
    pub fn draw(&mut self, f: &mut Frame) {
        let styles = Styles::new(self.ctx.prefs.dark);
        let size = f.size();
        f.render_widget(Block::default().style(styles.base()), size);

        let banner_height = if self.ctx.config.environment.is_beta() { 1 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(banner_height),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        if banner_height > 0 {
            let banner = format!(
                " BETA - {} environment ({}) ",
                self.ctx.config.environment.as_str().to_uppercase(),
                self.ctx.api.base_url()
            );
            f.render_widget(Paragraph::new(banner).style(styles.banner()), chunks[0]);
        }

        match &self.current_screen {
            Screen::MainMenu => self.main_menu.draw(f, chunks[1], &styles),
            Screen::Dashboard => self.dashboard.draw(f, chunks[1], &styles),
            Screen::Help => self.help.draw(f, chunks[1], &styles),
            Screen::Login => self.login.draw(f, chunks[1], &styles),
            Screen::Resource(_) => {
                if let Some(view) = self.resource.as_mut() {
                    view.draw(f, chunks[1], &styles);
                }
            }
        }

        let fallback = format!(
            "Sonata Admin - {} | Esc: Back | q: Quit | F1/?: Help | F2: Theme",
            self.current_screen.title()
        );
        self.status.render(f, chunks[2], &styles, &fallback);

        if self.show_help_popup {
            self.draw_help_popup(f, size, &styles);
        }
    }

    /// Draw help popup with context-sensitive shortcuts
    fn draw_help_popup(&self, f: &mut Frame, area: Rect, styles: &Styles) {
        let popup_area = centered_rect(70, 70, area);
        f.render_widget(Clear, popup_area);

        let help_popup = Paragraph::new(self.get_context_help())
            .block(
                Block::default()
                    .title("Help - Context Shortcuts")
                    .borders(Borders::ALL)
                    .border_style(styles.warning()),
            )
            .style(styles.base());
        f.render_widget(help_popup, popup_area);
    }

    /// Get context-sensitive help content
    fn get_context_help(&self) -> String {
        let global_help = "Global Shortcuts:\n\
            Esc - Go back\n\
            q - Quit application (outside text inputs)\n\
            Ctrl+C - Quit immediately\n\
            F1 / ? - Toggle this help\n\
            F2 - Toggle dark theme\n\n";

        let screen_help = match &self.current_screen {
            Screen::MainMenu => {
                "Main Menu:\n\
                ↑/↓ - Navigate menu\n\
                Enter - Open\n\
                Letter - Shortcut shown in brackets"
            }
            Screen::Dashboard => {
                "Dashboard:\n\
                r - Reload counts\n\
                Enter - Open first resource"
            }
            Screen::Help => {
                "Help Screen:\n\
                ↑/↓ - Switch sections\n\
                Page Up/Down - Scroll"
            }
            Screen::Login => {
                "Login:\n\
                Tab - Next field\n\
                Enter - Sign in"
            }
            Screen::Resource(_) => self.resource.as_ref().map_or("", |r| r.help()),
        };

        format!("{}{}", global_help, screen_help)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Notification;
    use tempfile::TempDir;

    fn app(dir: &TempDir) -> App {
        let mut config = Config::from_env().unwrap();
        config.prefs_path = dir.path().join("prefs.json");
        let notifications = NotificationQueue::new();
        let api = ApiClient::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            notifications.clone(),
        )
        .unwrap();
        App::new(AppContext {
            config,
            api,
            notifications,
            prefs: Preferences::default(),
        })
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_theme_toggle_is_persisted() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.handle_key_event(press(KeyCode::F(2))).await;

        assert!(app.ctx.prefs.dark);
        let saved = Preferences::load(&app.ctx.config.prefs_path).unwrap();
        assert!(saved.dark);
    }

    #[tokio::test]
    async fn test_q_quits_only_outside_inputs() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.current_screen = Screen::Login;
        app.handle_key_event(press(KeyCode::Char('q'))).await;
        assert!(!app.should_quit);

        app.current_screen = Screen::MainMenu;
        app.handle_key_event(press(KeyCode::Char('q'))).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_help_and_login_navigation() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.ctx.prefs.session_token = Some("abc".to_string());

        app.handle_key_event(press(KeyCode::Char('h'))).await;
        assert_eq!(app.current_screen, Screen::Help);
        app.handle_key_event(press(KeyCode::Esc)).await;
        assert_eq!(app.current_screen, Screen::MainMenu);

        app.handle_key_event(press(KeyCode::Char('l'))).await;
        assert_eq!(app.current_screen, Screen::Login);
        assert!(app.ctx.prefs.session_token.is_none());
    }

    #[tokio::test]
    async fn test_screen_failure_is_reported_once() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.navigate_to_screen(Screen::Resource(Resource::Instrument)).await;

        assert_eq!(app.current_screen, Screen::Resource(Resource::Instrument));
        let shown = app.status.get_current().map(|n| n.message.clone());
        assert!(shown.is_some());
        assert!(app.ctx.notifications.is_empty());

        // nothing queued to replay over the screen's own message
        app.on_tick(Instant::now());
        assert_eq!(app.status.get_current().map(|n| n.message.clone()), shown);
    }

    #[test]
    fn test_tick_surfaces_notifications() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.ctx.notifications.push(Notification::error("Server unreachable"));
        app.on_tick(Instant::now());
        assert_eq!(
            app.status.get_current().map(|n| n.message.as_str()),
            Some("Server unreachable")
        );
        assert!(app.ctx.notifications.is_empty());
    }
}
