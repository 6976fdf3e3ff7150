//! Interactive shell over the console: sign in, open pages through their guards,
//! list the menu and fetch backend resources.

pub mod outputformatter;

use std::sync::Arc;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::config::ConsoleConfig;
use crate::console::{
    nav, AuthClient, BackendClient, HistoryNavigator, LoginFlow, LoginStep, ResolvedRoute, RouteTable,
};
use crate::error::AppResult;
use crate::identity::{GuardDecision, LoadingState, RouteGuard, SessionStore};

// Stops a misconfigured redirect chain from spinning the shell forever.
const MAX_REDIRECT_HOPS: usize = 8;

const HELP: &str = "\
Commands:
  login <email> <password>   submit credentials; an OTP is mailed on success
  otp <code>                 verify the OTP and start the session
  resend                     mail a new OTP
  open <path>                navigate to a console page, e.g. open /cases
  menu                       pages available to the signed-in operator
  routes                     every console page and who may open it
  get <api-path>             fetch a backend resource, e.g. get /cases?page=1
  whoami | status            current identity, session and location
  logout                     end the session
  help                       show this help
  quit | exit                leave the shell";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

struct Page {
    location: String,
    route: Option<ResolvedRoute>,
    guard: Option<RouteGuard>,
}

pub struct Shell {
    cfg: ConsoleConfig,
    store: SessionStore,
    routes: RouteTable,
    navigator: Arc<HistoryNavigator>,
    flow: LoginFlow,
    api: BackendClient,
    page: Option<Page>,
}

impl Shell {
    pub fn new(cfg: ConsoleConfig, store: SessionStore) -> AppResult<Self> {
        let routes = RouteTable::new(cfg.login_path.clone(), cfg.fallback_path.clone());
        let flow = LoginFlow::new(
            AuthClient::new(&cfg.api_base_url)?,
            store.clone(),
            cfg.login_path.clone(),
            cfg.fallback_path.clone(),
        );
        let api = BackendClient::new(&cfg.api_base_url, store.clone())?;
        let navigator = Arc::new(HistoryNavigator::new(cfg.fallback_path.clone()));
        Ok(Self { cfg, store, routes, navigator, flow, api, page: None })
    }

    pub fn location(&self) -> String { self.navigator.current() }

    /// Whether the page currently mounted is rendering its content.
    pub fn page_renders(&self) -> bool {
        match &self.page {
            Some(Page { route: Some(_), guard: Some(g), .. }) => g.renders(),
            // public page
            Some(Page { route: Some(_), guard: None, .. }) => true,
            _ => false,
        }
    }

    /// Mount whatever page the navigator points at, following redirects.
    pub fn start(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        self.settle(&mut out);
        out
    }

    pub async fn execute(&mut self, line: &str) -> (Flow, Vec<String>) {
        let mut out = Vec::new();
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else { return (Flow::Continue, out) };
        let args: Vec<&str> = parts.collect();
        debug!(target: "reg_console::cli", "command {cmd} args={}", args.len());

        // Expiry is only noticed on activity; a stale session is ended before anything else runs.
        if self.store.expire_if_stale() {
            out.push("session expired".to_string());
        }

        match (cmd.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("quit" | "exit", _) => return (Flow::Quit, out),
            ("help", _) => out.extend(HELP.lines().map(str::to_string)),
            ("login", [email, password]) => match self.flow.submit_credentials(email, password).await {
                Ok(step) => self.follow(step, &mut out),
                Err(e) => out.push(e.message().to_string()),
            },
            ("otp", [code]) => match self.flow.verify_otp(code).await {
                Ok(step) => self.follow(step, &mut out),
                Err(e) => out.push(e.message().to_string()),
            },
            ("resend", []) => match self.flow.resend_otp().await {
                Ok(step) => {
                    out.push("OTP resent to your email.".to_string());
                    self.follow(step, &mut out);
                }
                Err(e) => out.push(e.message().to_string()),
            },
            ("open" | "go", [path]) => {
                self.navigator.push(path);
            }
            ("menu", []) => self.menu(&mut out),
            ("routes", []) => self.list_routes(&mut out),
            ("get", [path]) => match self.api.get_json(path).await {
                Ok(v) => match outputformatter::render_records(&v) {
                    Some(lines) => out.extend(lines),
                    None => out.push(serde_json::to_string_pretty(&v).unwrap_or_else(|_| v.to_string())),
                },
                Err(e) => out.push(format!("error: {e}")),
            },
            ("whoami" | "status", []) => self.status(&mut out),
            ("logout", []) => nav::sign_out(&self.store, self.navigator.as_ref(), &self.cfg.login_path),
            _ => out.push(format!("unrecognized command '{line}', type 'help'")),
        }
        self.settle(&mut out);
        (Flow::Continue, out)
    }

    fn follow(&mut self, step: LoginStep, out: &mut Vec<String>) {
        if let LoginStep::SignedIn { identity, .. } = &step {
            out.push(format!("signed in as {} ({})", identity.email, identity.role));
        }
        self.navigator.push(step.next());
    }

    // Remount until the navigator stops moving.
    fn settle(&mut self, out: &mut Vec<String>) {
        for _ in 0..MAX_REDIRECT_HOPS {
            let here = self.navigator.current();
            if self.page.as_ref().map(|p| p.location == here).unwrap_or(false) {
                return;
            }
            self.mount(here, out);
        }
        out.push(format!("redirect limit reached at {}", self.navigator.current()));
    }

    fn mount(&mut self, location: String, out: &mut Vec<String>) {
        // the previous page's guard must stop listening before the next one mounts
        self.page = None;
        let Some(route) = self.routes.resolve(&location) else {
            out.push(format!("{location}: page not found"));
            self.page = Some(Page { location, route: None, guard: None });
            return;
        };
        let guard = route
            .requirement
            .clone()
            .map(|req| RouteGuard::mount(&self.store, req, self.navigator.clone()));
        match guard.as_ref().map(|g| g.decision()) {
            None | Some(GuardDecision::Render) => out.push(format!("[{}] {}", route.label, route.path)),
            Some(GuardDecision::Pending) => out.push("Loading...".to_string()),
            Some(GuardDecision::Redirect(to)) => out.push(format!("{} -> {to}", route.path)),
        }
        self.page = Some(Page { location, route: Some(route), guard });
    }

    fn menu(&self, out: &mut Vec<String>) {
        let items = nav::visible_items(&self.store);
        if items.is_empty() {
            out.push("no pages available; sign in first".to_string());
            return;
        }
        let here = self.location();
        for item in items {
            let marker = if item.href == here { "*" } else { " " };
            out.push(format!("{marker} {:<22} {}", item.label, item.href));
        }
        if let Some(profile) = nav::profile_link(&self.store) {
            out.push(format!("  {:<22} {}", "Profile", profile));
        }
    }

    fn list_routes(&self, out: &mut Vec<String>) {
        for spec in self.routes.routes() {
            let access = match self.routes.resolve(spec.pattern).and_then(|r| r.requirement) {
                None => "public".to_string(),
                Some(req) => {
                    let mut s = req.allowed_roles.iter().cloned().collect::<Vec<_>>().join(", ");
                    if matches!(spec.access, crate::console::Access::RolesOrOwner { .. }) {
                        s.push_str(" or owner");
                    }
                    s
                }
            };
            out.push(format!("{:<24} {:<22} {}", spec.pattern, spec.label, access));
        }
    }

    fn status(&self, out: &mut Vec<String>) {
        let snap = self.store.snapshot();
        let state = match snap.loading_state {
            LoadingState::Initializing => "initializing",
            LoadingState::Ready => "ready",
        };
        match &snap.identity {
            Some(id) => {
                out.push(format!("user:    {} <{}>", id.subject_id, id.email));
                out.push(format!("role:    {} ({})", id.role, id.role_id));
                let expires = chrono::DateTime::from_timestamp(id.expires_at_epoch_seconds, 0)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| id.expires_at_epoch_seconds.to_string());
                out.push(format!("expires: {expires}"));
            }
            None => out.push("user:    <none>".to_string()),
        }
        out.push(format!("session: {state}"));
        out.push(format!("page:    {}", self.location()));
        out.push(format!("api:     {}", self.cfg.api_base_url));
    }
}

/// Run the interactive loop until `quit` or end of input.
pub async fn run_repl(mut shell: Shell) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    for line in shell.start() {
        println!("{line}");
    }
    loop {
        let prompt = format!("reg {}> ", shell.location());
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);
                let (flow, lines) = shell.execute(trimmed).await;
                for l in lines {
                    println!("{l}");
                }
                if flow == Flow::Quit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
