//! Dining exchange terminal: login, poll, chart, trade.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Position};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use dinex_client::{ExchangeClient, SessionStore};
use dinex_tui::shared::actions::{self, ActionForm, Followup, FormField, TradeAction};
use dinex_tui::shared::poll;
use dinex_tui::shared::render::{self, ClickTargets};
use dinex_tui::shared::state::{AppState, Phase};

/// Log to a file so tracing output never corrupts the terminal surface
fn init_tracing() {
    let filter = EnvFilter::try_from_env("DINEX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("dinex.log")
    else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let client = Arc::new(ExchangeClient::new()?);
    let session = SessionStore::from_env();
    let state = Arc::new(Mutex::new(AppState::new()));

    restore_session(&client, &session, &state).await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, client, session, state).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

/// Attempt a silent login with the persisted token; a failed restore
/// clears the token and leaves the login prompt up.
async fn restore_session(
    client: &Arc<ExchangeClient>,
    session: &SessionStore,
    state: &Arc<Mutex<AppState>>,
) {
    let Some(saved) = session.load() else {
        return;
    };
    match client.login(&saved).await {
        Ok(response) if response.success => {
            info!(user = %saved, "session restored");
            begin_session(client, state, &saved).await;
        }
        Ok(_) => {
            info!(user = %saved, "stale session token rejected");
            let _ = session.clear();
        }
        Err(e) => {
            // Transport failure: keep the token and retry next launch
            warn!(error = %e, "session restore failed");
        }
    }
}

/// Enter the trading screen and start the polling driver. Installing the
/// driver aborts any previous one, so repeated logins never stack timers.
async fn begin_session(
    client: &Arc<ExchangeClient>,
    state: &Arc<Mutex<AppState>>,
    username: &str,
) {
    {
        let mut s = state.lock().await;
        s.enter_trading(username);
        let handle = poll::spawn_driver(Arc::clone(client), Arc::clone(state));
        s.start_polling(handle);
    }

    // The portfolio is not part of the periodic cycle; load it once here
    let client = Arc::clone(client);
    let state = Arc::clone(state);
    tokio::spawn(async move {
        poll::refresh_portfolio(&client, &state).await;
    });
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    client: Arc<ExchangeClient>,
    session: SessionStore,
    state: Arc<Mutex<AppState>>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);

    loop {
        let mut targets = ClickTargets::default();
        {
            let s = state.lock().await;
            terminal.draw(|f| targets = render::draw(f, &s))?;
        }

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key(key, &client, &session, &state).await? {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse(mouse, &state, &targets).await,
                _ => {}
            }
        }
    }
}

/// Route a key press. Returns `true` when the app should exit.
async fn handle_key(
    key: KeyEvent,
    client: &Arc<ExchangeClient>,
    session: &SessionStore,
    state: &Arc<Mutex<AppState>>,
) -> io::Result<bool> {
    // A blocking notification swallows input until dismissed
    {
        let mut s = state.lock().await;
        if s.notice.is_some() {
            if matches!(
                key.code,
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')
            ) {
                s.dismiss_notice();
            }
            return Ok(false);
        }
    }

    let (is_login, has_form) = {
        let s = state.lock().await;
        (matches!(s.phase, Phase::Login { .. }), s.form.is_some())
    };

    if is_login {
        return handle_login_key(key, client, session, state).await;
    }
    if has_form {
        return handle_form_key(key, client, state).await;
    }
    handle_trading_key(key, client, session, state).await
}

async fn handle_login_key(
    key: KeyEvent,
    client: &Arc<ExchangeClient>,
    session: &SessionStore,
    state: &Arc<Mutex<AppState>>,
) -> io::Result<bool> {
    match key.code {
        KeyCode::Esc => return Ok(true),
        KeyCode::Char(c) => {
            if let Phase::Login { input, error } = &mut state.lock().await.phase {
                input.push(c);
                *error = None;
            }
        }
        KeyCode::Backspace => {
            if let Phase::Login { input, .. } = &mut state.lock().await.phase {
                input.pop();
            }
        }
        KeyCode::Enter => {
            let username = match &state.lock().await.phase {
                Phase::Login { input, .. } => input.trim().to_string(),
                _ => String::new(),
            };
            if username.is_empty() {
                return Ok(false);
            }

            match client.login(&username).await {
                Ok(response) if response.success => {
                    if let Err(e) = session.save(&username) {
                        warn!(error = %e, "failed to persist session token");
                    }
                    begin_session(client, state, &username).await;
                }
                Ok(response) => {
                    let message = response
                        .message
                        .unwrap_or_else(|| "Invalid username".to_string());
                    if let Phase::Login { error, .. } = &mut state.lock().await.phase {
                        *error = Some(message);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "login request failed");
                    if let Phase::Login { error, .. } = &mut state.lock().await.phase {
                        *error = Some("Exchange unreachable".to_string());
                    }
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_form_key(
    key: KeyEvent,
    client: &Arc<ExchangeClient>,
    state: &Arc<Mutex<AppState>>,
) -> io::Result<bool> {
    let submitted = {
        let mut s = state.lock().await;
        if key.code == KeyCode::Esc {
            s.form = None;
            return Ok(false);
        }

        let categories: Vec<String> = s
            .registry
            .categories()
            .into_iter()
            .map(str::to_string)
            .collect();
        let selected_category = s.form.as_ref().and_then(|form| form.category.clone());
        let meal_options: Vec<String> = selected_category
            .as_deref()
            .map(|category| {
                s.registry
                    .meals()
                    .iter()
                    .filter(|meal| meal.category == category)
                    .map(|meal| meal.name.clone())
                    .collect()
            })
            .unwrap_or_default();

        let Some(form) = s.form.as_mut() else {
            return Ok(false);
        };

        let mut submit = false;
        match key.code {
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left | KeyCode::Right => {
                let forward = key.code == KeyCode::Right;
                match form.field {
                    FormField::Category => {
                        let options: Vec<&str> = categories.iter().map(String::as_str).collect();
                        form.category =
                            actions::cycle_option(form.category.as_deref(), &options, forward);
                        // Meal dropdown follows the category selection
                        form.meal = None;
                    }
                    FormField::Meal => {
                        let options: Vec<&str> = meal_options.iter().map(String::as_str).collect();
                        form.meal = actions::cycle_option(form.meal.as_deref(), &options, forward);
                    }
                    FormField::Flag => form.flag = !form.flag,
                    _ => {}
                }
            }
            KeyCode::Char(' ') if form.field == FormField::Flag => form.flag = !form.flag,
            KeyCode::Char(c) => match form.field {
                FormField::Qty if c.is_ascii_digit() => form.qty.push(c),
                FormField::Price if c.is_ascii_digit() || c == '.' => form.price.push(c),
                _ => {}
            },
            KeyCode::Backspace => match form.field {
                FormField::Qty => {
                    form.qty.pop();
                }
                FormField::Price => {
                    form.price.pop();
                }
                _ => {}
            },
            KeyCode::Enter => submit = true,
            _ => {}
        }

        if !submit {
            return Ok(false);
        }

        // Missing-selection is caught here, before any network call
        let invalid = form.validate().err();
        let snapshot = form.clone();
        if let Some(message) = invalid {
            s.notify(message);
            return Ok(false);
        }
        snapshot
    };

    dispatch_action(client, state, submitted).await;
    Ok(false)
}

async fn handle_trading_key(
    key: KeyEvent,
    client: &Arc<ExchangeClient>,
    session: &SessionStore,
    state: &Arc<Mutex<AppState>>,
) -> io::Result<bool> {
    match key.code {
        KeyCode::Char('q') => return Ok(true),
        KeyCode::Char('L') => logout(client, session, state).await,
        KeyCode::Tab => state.lock().await.registry.cycle_filter(true),
        KeyCode::BackTab => state.lock().await.registry.cycle_filter(false),
        KeyCode::Up | KeyCode::Down => move_focus(state, key.code == KeyCode::Down).await,
        KeyCode::Char('i') => {
            dispatch_action(client, state, ActionForm::new(TradeAction::StartIpo)).await;
        }
        KeyCode::Char('b') => {
            state.lock().await.form = Some(ActionForm::new(TradeAction::BuyIpo));
        }
        KeyCode::Char('o') => {
            state.lock().await.form = Some(ActionForm::new(TradeAction::SecondaryBuy));
        }
        KeyCode::Char('s') => {
            state.lock().await.form = Some(ActionForm::new(TradeAction::Sell));
        }
        _ => {}
    }
    Ok(false)
}

/// Cycle the full-chart focus through the filtered view
async fn move_focus(state: &Arc<Mutex<AppState>>, forward: bool) {
    let mut s = state.lock().await;
    let names: Vec<String> = s
        .registry
        .filtered()
        .iter()
        .map(|meal| meal.name.clone())
        .collect();
    let options: Vec<&str> = names.iter().map(String::as_str).collect();
    s.focus = actions::cycle_option(s.focus.as_deref(), &options, forward);
}

/// Submit an action and apply the success/failure contract: success closes
/// the form, resets its selections, and runs a full refresh; a rejection
/// only shows the message. Transport failures are logged, never alerted.
async fn dispatch_action(
    client: &Arc<ExchangeClient>,
    state: &Arc<Mutex<AppState>>,
    form: ActionForm,
) {
    match actions::submit(client, &form).await {
        Ok(response) => {
            let next = actions::followup(&response);
            let message = if !response.message.is_empty() {
                response.message.clone()
            } else if response.success && form.action == TradeAction::StartIpo {
                "IPO started! Price will decay over time.".to_string()
            } else if response.success {
                "Order accepted".to_string()
            } else {
                "Request rejected".to_string()
            };

            {
                let mut s = state.lock().await;
                s.notify(message);
                if next == Followup::CloseAndRefresh {
                    if let Some(open) = s.form.as_mut() {
                        open.reset_selection();
                    }
                    s.form = None;
                }
            }

            if next == Followup::CloseAndRefresh {
                poll::full_refresh(client, state).await;
            }
        }
        Err(e) => {
            warn!(error = %e, action = form.action.label(), "action dispatch failed");
        }
    }
}

async fn logout(
    client: &Arc<ExchangeClient>,
    session: &SessionStore,
    state: &Arc<Mutex<AppState>>,
) {
    state.lock().await.logout();
    let _ = session.clear();

    // Fire-and-forget; nothing waits on the backend acknowledging
    let client = Arc::clone(client);
    tokio::spawn(async move {
        let _ = client.logout().await;
    });
    info!("logged out");
}

async fn handle_mouse(mouse: MouseEvent, state: &Arc<Mutex<AppState>>, targets: &ClickTargets) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    {
        let s = state.lock().await;
        if s.notice.is_some() || s.form.is_some() {
            return;
        }
    }

    let position = Position::new(mouse.column, mouse.row);

    for (rect, filter) in &targets.tabs {
        if rect.contains(position) {
            state.lock().await.set_filter(filter.clone());
            return;
        }
    }

    for (rect, surface) in &targets.sparklines {
        if rect.contains(position) {
            debug!(surface = %surface.key, "sparkline click");
            state.lock().await.set_focus(surface.meal.clone());
            return;
        }
    }
}
