//! Login screen: exchanges credentials for a session token

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{layout::Rect, Frame};
use tracing::info;

use crate::admin_tui::components::FormView;
use crate::admin_tui::{app::Screen, traits::ScreenAction, ui::{centered_rect, Styles}};
use crate::api::ApiClient;
use crate::form::{FieldDescriptor, Form, SubmitBlocked, SubmitOutcome};
use crate::models::Session;

pub struct LoginScreen {
    view: FormView,
    /// Session obtained by the last successful submit, taken by the app
    session: Option<Session>,
}

impl Default for LoginScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginScreen {
    pub fn new() -> Self {
        let form = Form::new(vec![
            FieldDescriptor::email("email", "Email").required(),
            FieldDescriptor::password("password", "Password").required(),
        ]);
        Self {
            view: FormView::new(form, "Login"),
            session: None,
        }
    }

    pub fn take_session(&mut self) -> Option<Session> {
        self.session.take()
    }

    pub fn captures_input(&self) -> bool {
        self.view.captures_input()
    }

    pub async fn handle_key(&mut self, key: KeyEvent, api: &ApiClient) -> ScreenAction {
        match key.code {
            KeyCode::Enter => self.submit(api).await,
            KeyCode::Esc => ScreenAction::NavigateBack,
            _ => {
                self.view.handle_key(key);
                ScreenAction::None
            }
        }
    }

    async fn submit(&mut self, api: &ApiClient) -> ScreenAction {
        let outcome = self
            .view
            .form
            .submit(|snapshot| async move {
                let email = snapshot.value("email").as_text();
                let password = snapshot.value("password").as_text();
                Ok::<_, SubmitBlocked>(api.login(&email, &password).await)
            })
            .await;

        match outcome {
            SubmitOutcome::Accepted(response) => {
                match response.into_rows().and_then(|rows| rows.into_iter().next()) {
                    Some(session) => {
                        info!("Login succeeded");
                        self.session = Some(session);
                        self.view.form.reset();
                        ScreenAction::NavigateTo(Screen::MainMenu)
                    }
                    None => ScreenAction::SetError("Login response carried no session".to_string()),
                }
            }
            SubmitOutcome::Rejected(failed) => ScreenAction::SetError(failed.message),
            SubmitOutcome::Blocked => ScreenAction::SetError("Enter email and password".to_string()),
        }
    }

    pub fn draw(&self, f: &mut Frame, area: Rect, styles: &Styles) {
        self.view.render(f, centered_rect(50, 50, area), styles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationQueue;
    use crossterm::event::KeyModifiers;

    #[tokio::test]
    async fn test_empty_credentials_do_not_call_api() {
        let queue = NotificationQueue::new();
        // nothing listens on the discard port; a request would surface as a Rejected outcome
        let api = ApiClient::with_client(reqwest::Client::new(), "http://127.0.0.1:9", queue.clone()).unwrap();
        let mut screen = LoginScreen::new();

        let action = screen
            .handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), &api)
            .await;
        assert_eq!(action, ScreenAction::SetError("Enter email and password".to_string()));
        assert!(queue.is_empty());
        assert!(screen.take_session().is_none());
    }
}
