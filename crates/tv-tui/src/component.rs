//! The contract between the app loop and its panes.
//!
//! A pane owns only its presentation state (selection, scroll, animation
//! phase). Everything else arrives read-only through `AppState`, and all
//! mutation requests leave as `Action`s for the app loop to apply. Input is
//! routed to the focused pane; dispatched actions fan out to every pane so
//! an unfocused one can still react (the log panel toggling, the channel
//! list following a jump).

use ratatui::crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{layout::Rect, Frame};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;

pub trait Component {
    fn id(&self) -> ComponentId;

    /// Key input while this pane holds focus.
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action>;

    /// Mouse input that hit-tested into this pane's `area`.
    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action>;

    /// Roughly 100ms cadence; drives animations and expiries.
    fn tick(&mut self, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    /// An action dispatched by the app loop, focused or not.
    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action>;

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState);

    /// Smallest height at which drawing still makes sense.
    fn min_height(&self) -> u16 {
        3
    }
}
