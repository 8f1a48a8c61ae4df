use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};
use tokio::sync::mpsc::UnboundedReceiver;
use weather_core::{Direction, Dispatcher, Input, Session, Units, Update};

use super::ui;

/// View state around the session.
pub struct App {
    pub session: Session,
    pub should_quit: bool,
    /// Unit system the weather clients were built with.
    pub units: Units,
    dispatcher: Dispatcher,
    updates: UnboundedReceiver<Update>,
    /// Last drawn terminal size, for mouse hit-testing.
    screen: Rect,
    pointer_in_list: bool,
}

impl App {
    pub fn new(dispatcher: Dispatcher, updates: UnboundedReceiver<Update>, units: Units) -> Self {
        Self {
            session: Session::new(),
            should_quit: false,
            units,
            dispatcher,
            updates,
            screen: Rect::default(),
            pointer_in_list: false,
        }
    }

    pub fn start(&mut self) {
        self.dispatcher.dispatch_all(self.session.start());
    }

    pub fn set_screen(&mut self, area: Rect) {
        self.screen = area;
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let input = match key.code {
            KeyCode::Char('c') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('u') if ctrl => Input::Type(String::new()),
            KeyCode::Char(c) => {
                let mut text = self.session.search().query().to_string();
                text.push(c);
                Input::Type(text)
            }
            KeyCode::Backspace => {
                let mut text = self.session.search().query().to_string();
                if text.pop().is_none() {
                    return;
                }
                Input::Type(text)
            }
            KeyCode::Up => Input::Move(Direction::Up),
            KeyCode::Down => Input::Move(Direction::Down),
            KeyCode::Enter => Input::Enter,
            _ => return,
        };

        self.forward(input);
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let row = self.suggestion_row_at(mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Moved => match row {
                Some(index) => {
                    self.pointer_in_list = true;
                    self.forward(Input::Hover(index));
                }
                None if self.pointer_in_list => {
                    self.pointer_in_list = false;
                    self.forward(Input::HoverClear);
                }
                None => {}
            },
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(index) = row {
                    self.pointer_in_list = false;
                    self.forward(Input::Click(index));
                }
            }
            _ => {}
        }
    }

    /// Apply every update that has arrived since the last tick.
    pub fn drain_updates(&mut self) {
        while let Ok(update) = self.updates.try_recv() {
            let commands = self.session.apply(update);
            self.dispatcher.dispatch_all(commands);
        }
    }

    fn forward(&mut self, input: Input) {
        let commands = self.session.handle(input);
        self.dispatcher.dispatch_all(commands);
    }

    fn suggestion_row_at(&self, column: u16, row: u16) -> Option<usize> {
        let count = self.session.search().suggestions().len();
        let rows = ui::layout(self.screen, count).suggestion_rows?;
        if !rows.contains(Position::new(column, row)) {
            return None;
        }
        let index = usize::from(row - rows.y);
        (index < count).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use weather_core::{
        ChosenLocation, ClientResult, Conditions, ForecastEntry, GeoSuggest, IpLocate,
        Recommendation, Recommender, Services, Suggestion, WeatherSnapshot, WeatherSource,
    };

    #[derive(Debug)]
    struct Offline;

    #[async_trait::async_trait]
    impl GeoSuggest for Offline {
        async fn suggest(&self, q: &str) -> ClientResult<Vec<Suggestion>> {
            Err(weather_core::ClientError::network(format!("offline: {q}")))
        }
    }

    #[async_trait::async_trait]
    impl WeatherSource for Offline {
        async fn current(&self, _: &ChosenLocation) -> ClientResult<WeatherSnapshot> {
            Err(weather_core::ClientError::network("offline"))
        }
        async fn forecast(&self, _: &ChosenLocation) -> ClientResult<Vec<ForecastEntry>> {
            Err(weather_core::ClientError::network("offline"))
        }
    }

    #[async_trait::async_trait]
    impl IpLocate for Offline {
        async fn locate(&self) -> ClientResult<ChosenLocation> {
            Err(weather_core::ClientError::network("offline"))
        }
    }

    #[async_trait::async_trait]
    impl Recommender for Offline {
        async fn recommend(&self, _: Conditions) -> ClientResult<Recommendation> {
            Err(weather_core::ClientError::network("offline"))
        }
    }

    fn app() -> App {
        let offline = Arc::new(Offline);
        let services = Services {
            geo: offline.clone(),
            weather: offline.clone(),
            ip: offline.clone(),
            recommender: offline,
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = App::new(Dispatcher::new(services, tx), rx, Units::Metric);
        app.set_screen(Rect::new(0, 0, 80, 40));
        app
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn with_suggestions(app: &mut App, query: &str) {
        for c in query.chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        app.session.apply(Update::Suggestions {
            query: query.into(),
            result: Ok(vec![
                Suggestion {
                    name: "London".into(),
                    country: "GB".into(),
                    lat: 51.5,
                    lon: -0.1,
                },
                Suggestion {
                    name: "London".into(),
                    country: "CA".into(),
                    lat: 42.9,
                    lon: -81.2,
                },
            ]),
        });
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[tokio::test]
    async fn typing_and_backspace_edit_the_query() {
        let mut app = app();
        for c in "Lon".chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        assert_eq!(app.session.search().query(), "Lon");

        app.handle_key(press(KeyCode::Backspace));
        assert_eq!(app.session.search().query(), "Lo");
    }

    #[tokio::test]
    async fn hover_and_click_map_to_rows() {
        let mut app = app();
        with_suggestions(&mut app, "Lon");

        let rows = ui::layout(app.screen, 2).suggestion_rows.unwrap();

        app.handle_mouse(mouse(MouseEventKind::Moved, rows.x + 1, rows.y + 1));
        assert_eq!(app.session.search().selected(), Some(1));

        app.handle_mouse(mouse(MouseEventKind::Moved, 0, app.screen.height - 1));
        assert_eq!(app.session.search().selected(), None);

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), rows.x + 1, rows.y));
        assert_eq!(app.session.search().query(), "London, GB");
        assert!(app.session.search().suggestions().is_empty());
    }

    #[tokio::test]
    async fn escape_quits() {
        let mut app = app();
        app.handle_key(press(KeyCode::Esc));
        assert!(app.should_quit);
    }
}
