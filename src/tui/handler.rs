use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,
    Sync,
    ProcessUnprocessed,
    ReprocessAll,
    ReprocessSelected,
    DeleteItem,
    OpenInBrowser,
    CycleFilter,
    ShowHelp,
    HideHelp,
    // Custom instructions input
    EditInstructions,
    InstructionsChar(char),
    InstructionsBackspace,
    InstructionsConfirm,
    InstructionsCancel,
}

pub fn handle_key_event(
    key: KeyEvent,
    instructions_input_active: bool,
    show_help: bool,
) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    if instructions_input_active {
        return match key.code {
            KeyCode::Enter => Some(AppAction::InstructionsConfirm),
            KeyCode::Esc => Some(AppAction::InstructionsCancel),
            KeyCode::Backspace => Some(AppAction::InstructionsBackspace),
            KeyCode::Char(c) => Some(AppAction::InstructionsChar(c)),
            _ => None,
        };
    }

    // Normal mode
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppAction::Quit),

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(AppAction::MoveDown),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(AppAction::MoveUp),
        (KeyCode::Char('<'), _) | (KeyCode::Home, _) => Some(AppAction::MoveToTop),
        (KeyCode::Char('>'), _) | (KeyCode::End, _) => Some(AppAction::MoveToBottom),

        (KeyCode::Char('s'), _) => Some(AppAction::Sync),
        (KeyCode::Char('p'), KeyModifiers::NONE) => Some(AppAction::ProcessUnprocessed),
        (KeyCode::Char('P'), _) => Some(AppAction::ReprocessAll),
        (KeyCode::Char('g'), _) | (KeyCode::Enter, _) => Some(AppAction::ReprocessSelected),
        (KeyCode::Char('d'), KeyModifiers::NONE) => Some(AppAction::DeleteItem),
        (KeyCode::Char('o'), _) => Some(AppAction::OpenInBrowser),
        (KeyCode::Char('f'), _) => Some(AppAction::CycleFilter),
        (KeyCode::Char('i'), _) => Some(AppAction::EditInstructions),

        (KeyCode::Char('?'), _) => Some(AppAction::ShowHelp),

        _ => None,
    }
}
