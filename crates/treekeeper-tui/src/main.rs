use std::io;
use std::process::{Child, Command};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use treekeeper_service::BlockingHttpService;
use treekeeper_tui::app::App;
use treekeeper_tui::auth::{ApiKeyAuth, AuthContext, StaticAuth};

const DEFAULT_PORT: u16 = 4710;
const DEFAULT_URL: &str = "http://127.0.0.1:4710";
const DEFAULT_TREE_ID: &str = "1";

/// How often the event loop wakes while save feedback is on screen.
const FEEDBACK_POLL: Duration = Duration::from_millis(200);

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Parse CLI: treekeeper [TREE_ID] [--server URL] [--api-key KEY]
    // No --server → spawn a seeded local server then run the TUI
    // --server URL → connect to an existing server
    // --api-key KEY → authenticate (also reads TREEKEEPER_API_KEY env var)
    let (server_url, mut child) = if let Some(pos) = args.iter().position(|a| a == "--server") {
        let url = args
            .get(pos + 1)
            .context("--server requires a URL argument")?;
        (url.clone(), None)
    } else {
        let child = spawn_server()?;
        (DEFAULT_URL.to_string(), Some(child))
    };

    let api_key = if let Some(pos) = args.iter().position(|a| a == "--api-key") {
        args.get(pos + 1)
            .context("--api-key requires a key argument")?
            .clone()
            .into()
    } else {
        std::env::var("TREEKEEPER_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
    };

    let mut tree_id = DEFAULT_TREE_ID.to_string();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--server" | "--api-key" => i += 2,
            arg if !arg.starts_with("--") => {
                tree_id = arg.to_string();
                i += 1;
            }
            _ => i += 1,
        }
    }

    let user = std::env::var("TREEKEEPER_USER").ok().filter(|u| !u.is_empty());

    // Against a spawned local server there is nothing to authenticate
    // against; treat the session as signed in so edits work out of the box.
    let auth: Box<dyn AuthContext> = if child.is_some() {
        Box::new(StaticAuth {
            authenticated: true,
            user: user.clone(),
        })
    } else {
        Box::new(ApiKeyAuth::new(api_key.as_deref(), user))
    };

    let service = match api_key {
        Some(key) => BlockingHttpService::with_api_key(&server_url, key),
        None => BlockingHttpService::new(&server_url),
    };
    wait_for_server(&service)?;

    let result = run_tui(service, auth, &tree_id);

    // Cleanup: kill server if we spawned it
    if let Some(ref mut child) = child {
        let _ = child.kill();
        let _ = child.wait();
    }

    result
}

fn spawn_server() -> Result<Child> {
    // Look for treekeeper-server next to our own binary first,
    // then fall back to PATH
    let self_exe = std::env::current_exe().unwrap_or_default();
    let sibling = self_exe.parent().map(|d| d.join("treekeeper-server"));

    let server_bin = if sibling.as_ref().is_some_and(|p| p.exists()) {
        sibling.unwrap()
    } else {
        "treekeeper-server".into()
    };

    let child = Command::new(&server_bin)
        .args(["--bind", "127.0.0.1"])
        .args(["--port", &DEFAULT_PORT.to_string()])
        .arg("--seed")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start {}", server_bin.display()))?;

    Ok(child)
}

fn wait_for_server(service: &BlockingHttpService) -> Result<()> {
    let start = Instant::now();
    let timeout = Duration::from_secs(10);

    loop {
        if service.health_check().is_ok() {
            return Ok(());
        }
        if start.elapsed() > timeout {
            bail!(
                "treekeeper-server did not become ready within {}s",
                timeout.as_secs()
            );
        }
        thread::sleep(Duration::from_millis(50));
    }
}

fn run_tui(service: BlockingHttpService, auth: Box<dyn AuthContext>, tree_id: &str) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, service, auth, tree_id);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    service: BlockingHttpService,
    auth: Box<dyn AuthContext>,
    tree_id: &str,
) -> Result<()> {
    let mut app = App::new(service, auth, tree_id)?;

    loop {
        terminal.draw(|frame| app.render(frame))?;

        // Poll with a timeout while save feedback is pending so the
        // auto-revert tick runs; block on input otherwise.
        if app.needs_polling() {
            if event::poll(FEEDBACK_POLL)? {
                if let Event::Key(key) = event::read()? {
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        break;
                    }
                    if key.code == KeyCode::Char('q') && !app.is_input_mode() {
                        break;
                    }
                    app.handle_key(key);
                }
            } else {
                app.tick();
            }
        } else if let Event::Key(key) = event::read()? {
            // Ctrl+C always quits
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }
            // q quits unless we're in an input mode
            if key.code == KeyCode::Char('q') && !app.is_input_mode() {
                break;
            }
            app.handle_key(key);
        }
    }

    Ok(())
}
