//! fitsview - A terminal-based FITS table and image viewer.

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fitsview::app::{App, InputMode};
use fitsview::config::ViewerConfig;
use fitsview::navigation::ActiveView;
use fitsview::session::Session;
use fitsview::ui;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Display pixels moved per pan key press.
const PAN_STEP: i64 = 8;

#[derive(Parser, Debug)]
#[command(name = "fitsview")]
#[command(version, about = "A terminal-based FITS table and image viewer", long_about = None)]
struct Args {
    /// Path to the FITS file (or a directory to browse)
    file: Option<PathBuf>,

    /// Enable logging to specified file
    #[arg(long)]
    log: Option<PathBuf>,

    /// Rows per table page
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=1000))]
    page_size: Option<u64>,

    /// Table column width in characters
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=200))]
    column_width: Option<u16>,

    /// Start in the image view
    #[arg(long)]
    image: bool,

    /// Print the HDU list and exit
    #[arg(long, requires = "file")]
    list: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Set up logging if --log option is provided
    if let Some(log_path) = &args.log {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_path)?;
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        tracing::info!("Starting fitsview");
    }

    let mut config = ViewerConfig::default();
    if let Some(size) = args.page_size {
        config.table.page_size = size as usize;
    }
    if let Some(width) = args.column_width {
        config.table.column_width = width;
    }
    config.start_with_image = args.image;

    // Open the file before touching the terminal
    let mut app = App::new(config);
    match &args.file {
        Some(path) if !path.exists() => {
            eprintln!("Error: File not found: {}", path.display());
            return Ok(ExitCode::FAILURE);
        },
        Some(path) if args.list && path.is_dir() => {
            eprintln!("Error: --list needs a FITS file, not a directory");
            return Ok(ExitCode::FAILURE);
        },
        Some(path) if path.is_dir() => app.open_file_browser(Some(path.clone())),
        Some(path) => match Session::open(path) {
            Ok(session) if args.list => {
                println!("{}", session.path().display());
                for hdu in session.catalog().list_hdus() {
                    println!("{}", hdu.summary());
                }
                return Ok(ExitCode::SUCCESS);
            },
            Ok(session) => {
                app.attach(session);
                if let Some(error) = app.error_message.take() {
                    eprintln!("Error: {}", error);
                    return Ok(ExitCode::FAILURE);
                }
            },
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(ExitCode::FAILURE);
            },
        },
        None => app.open_file_browser(None),
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let res = run_app(&mut terminal, &mut app);
    app.close();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if args.log.is_some() {
        tracing::info!("fitsview exited");
    }

    match res {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("Error: {}", err);
            Ok(ExitCode::FAILURE)
        },
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(std::time::Duration::from_millis(100))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if let (KeyModifiers::CONTROL, KeyCode::Char('c')) = (key.modifiers, key.code) {
                    return Ok(());
                }

                // Prompts
                if app.input_mode.prompt().is_some() {
                    match key.code {
                        KeyCode::Enter => app.submit_input(),
                        KeyCode::Esc => app.cancel_input(),
                        KeyCode::Backspace => {
                            app.input.pop();
                        },
                        KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => app.input.push(c),
                        _ => {},
                    }
                    continue;
                }

                // Column picker
                if app.input_mode == InputMode::ColumnPicker {
                    match key.code {
                        KeyCode::Up | KeyCode::Char('k') => app.column_picker.cursor_up(),
                        KeyCode::Down | KeyCode::Char('j') => app.column_picker.cursor_down(),
                        KeyCode::Char(' ') => app.column_picker.toggle(),
                        KeyCode::Char('a') => app.column_picker.toggle_all(),
                        KeyCode::Enter => app.apply_column_picker(),
                        KeyCode::Esc | KeyCode::Char('q') => app.cancel_input(),
                        _ => {},
                    }
                    continue;
                }

                // File browser mode
                if app.file_browser_mode {
                    match (key.modifiers, key.code) {
                        (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(()),
                        (KeyModifiers::NONE, KeyCode::Up)
                        | (KeyModifiers::NONE, KeyCode::Char('k')) => app.file_browser.cursor_up(),
                        (KeyModifiers::NONE, KeyCode::Down)
                        | (KeyModifiers::NONE, KeyCode::Char('j')) => {
                            app.file_browser.cursor_down()
                        },
                        (KeyModifiers::NONE, KeyCode::Enter)
                        | (KeyModifiers::NONE, KeyCode::Char('l'))
                        | (KeyModifiers::NONE, KeyCode::Right) => app.browser_select(),
                        (KeyModifiers::NONE, KeyCode::Char('h'))
                        | (KeyModifiers::NONE, KeyCode::Left)
                        | (KeyModifiers::NONE, KeyCode::Backspace) => app.browser_parent(),
                        (KeyModifiers::NONE, KeyCode::Char('.')) => app.toggle_hidden(),
                        _ => {},
                    }
                    continue;
                }

                // Global keys
                match (key.modifiers, key.code) {
                    (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(()),
                    (_, KeyCode::Char('T')) => {
                        app.cycle_theme();
                        continue;
                    },
                    (KeyModifiers::NONE, KeyCode::Char('i')) => {
                        app.toggle_view();
                        continue;
                    },
                    _ => {},
                }

                match app.navigator.as_ref().and_then(|n| n.active()) {
                    Some(ActiveView::Table) => handle_table_key(app, key.code),
                    Some(ActiveView::Image) => handle_image_key(app, key.code),
                    None => {},
                }
            },
            Event::Mouse(mouse) if !app.file_browser_mode => match mouse.kind {
                MouseEventKind::Moved
                | MouseEventKind::Down(MouseButton::Left)
                | MouseEventKind::Drag(MouseButton::Left) => {
                    app.mouse_moved(mouse.column, mouse.row)
                },
                MouseEventKind::ScrollDown => app.scroll(true),
                MouseEventKind::ScrollUp => app.scroll(false),
                _ => {},
            },
            _ => {},
        }
    }
}

fn handle_table_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown | KeyCode::Char(' ') => {
            app.next_page()
        },
        KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => app.prev_page(),
        KeyCode::Char('g') => app.start_prompt(InputMode::JumpToPage),
        KeyCode::Char('r') => app.start_prompt(InputMode::PageSize),
        KeyCode::Char('w') => app.start_prompt(InputMode::ColumnWidth),
        KeyCode::Char('c') => app.open_column_picker(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_column_width(1),
        KeyCode::Char('-') | KeyCode::Char('_') => app.adjust_column_width(-1),
        KeyCode::Char('l') => app.scroll_columns(1),
        KeyCode::Char('h') => app.scroll_columns(-1),
        KeyCode::Tab | KeyCode::Char(']') => app.next_table(),
        KeyCode::BackTab | KeyCode::Char('[') => app.prev_table(),
        _ => {},
    }
}

fn handle_image_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),
        KeyCode::Char('<') | KeyCode::Char(',') => app.rotate_left(),
        KeyCode::Char('>') | KeyCode::Char('.') => app.rotate_right(),
        KeyCode::Char('n') | KeyCode::PageDown => app.next_image(),
        KeyCode::Char('p') | KeyCode::PageUp => app.prev_image(),
        KeyCode::Char('h') | KeyCode::Left => app.move_cursor(-1, 0),
        KeyCode::Char('l') | KeyCode::Right => app.move_cursor(1, 0),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(0, -1),
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(0, 1),
        KeyCode::Char('H') => app.pan(-PAN_STEP, 0),
        KeyCode::Char('L') => app.pan(PAN_STEP, 0),
        KeyCode::Char('K') => app.pan(0, -PAN_STEP / 2),
        KeyCode::Char('J') => app.pan(0, PAN_STEP / 2),
        KeyCode::Char('C') => app.cycle_palette(),
        _ => {},
    }
}
