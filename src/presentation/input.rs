use crate::application::{App, AppMode};
use crate::infrastructure::ClipboardService;
use crossterm::event::{KeyCode, KeyModifiers};

use super::ui::help_line_count;

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
            app.should_quit = true;
            return;
        }
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key),
            AppMode::Editing => Self::handle_editing_mode(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
        }
    }

    fn handle_normal_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('q') => {
                app.should_quit = true;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.select_previous();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.select_next();
            }
            KeyCode::Char('c') => {
                app.connect_wallet();
            }
            KeyCode::Char('d') => {
                app.disconnect_wallet();
            }
            KeyCode::Char('i') | KeyCode::Tab => {
                app.start_editing();
            }
            KeyCode::Char('v') | KeyCode::Enter => {
                app.vote_selected();
            }
            KeyCode::Char('y') => {
                let result = if app.session.is_connected() {
                    ClipboardService::copy(app.session.account())
                } else {
                    Err("No wallet connected".to_string())
                };
                app.set_copy_result(result);
            }
            KeyCode::F(1) | KeyCode::Char('?') => {
                app.mode = AppMode::Help;
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_editing_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                app.submit_proposal();
            }
            KeyCode::Esc | KeyCode::Tab => {
                app.cancel_editing();
            }
            KeyCode::Backspace => {
                app.delete_before_cursor();
            }
            KeyCode::Delete => {
                app.delete_at_cursor();
            }
            KeyCode::Left => {
                app.move_cursor_left();
            }
            KeyCode::Right => {
                app.move_cursor_right();
            }
            KeyCode::Home => {
                app.move_cursor_home();
            }
            KeyCode::End => {
                app.move_cursor_end();
            }
            KeyCode::Char(c) => {
                if !app.submitting {
                    app.insert_char(c);
                }
            }
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        let max_scroll = help_line_count().saturating_sub(1);
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.mode = AppMode::Normal;
                app.help_scroll = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll = (app.help_scroll + 1).min(max_scroll);
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll = (app.help_scroll + 5).min(max_scroll);
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }
}
