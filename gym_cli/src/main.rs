use clap::{Parser, Subcommand};
use gym_core::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gymapp")]
#[command(about = "Browse exercises and create your gym account", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory (session records)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the muscle groups
    Groups,

    /// List the exercises of one muscle group
    Exercises {
        /// Muscle group (defaults to home.default_group)
        #[arg(long)]
        group: Option<String>,
    },

    /// Interactive home screen
    Browse,

    /// Create an account and sign in
    Signup {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        password_confirm: String,
    },

    /// Finish signing in after an account was created but sign-in failed
    Resume {
        #[arg(long)]
        password: String,
    },

    /// Show the signed-in user
    Whoami,

    /// Forget the stored session
    Signout,
}

/// Failures go to stderr, confirmations to stdout
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => eprintln!("✗ {}", notification.title),
            Severity::Success => println!("✓ {}", notification.title),
        }
    }
}

/// Prints navigation requests; there is no screen stack in a terminal
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn go_back(&self) {
        println!("← back");
    }

    fn navigate_to(&self, route: Route) {
        println!("→ {}", route);
    }
}

struct App {
    config: Config,
    transport: Arc<HttpTransport>,
    store: SessionStore,
    establisher: Arc<RemoteSessionEstablisher>,
}

impl App {
    fn build(cli: &Cli) -> Result<Self> {
        let mut config = match cli.config {
            Some(ref path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(ref url) = cli.api_url {
            config.api.base_url = url.clone();
        }
        config.validate()?;

        let data_dir = cli
            .data_dir
            .clone()
            .unwrap_or_else(|| config.data.data_dir.clone());
        tracing::debug!("Using API at {} and data dir {:?}", config.api.base_url, data_dir);
        let store = SessionStore::new(data_dir);
        let transport = Arc::new(HttpTransport::new(&config.api)?);
        let establisher = Arc::new(RemoteSessionEstablisher::new(
            transport.clone(),
            store.clone(),
        ));
        establisher.restore()?;

        Ok(Self {
            config,
            transport,
            store,
            establisher,
        })
    }

    fn synchronizer(&self) -> ListSynchronizer {
        ListSynchronizer::new(
            self.transport.clone(),
            Arc::new(ConsoleNotifier),
            self.config.messages.clone(),
            self.config.home.default_selection(),
        )
    }

    fn home_screen(&self, group: Option<String>) -> HomeScreen {
        let default_group = group
            .map(FilterDimension::new)
            .unwrap_or_else(|| self.config.home.default_selection());
        HomeScreen::new(
            self.transport.clone(),
            Arc::new(ConsoleNotifier),
            Arc::new(ConsoleNavigator),
            self.config.messages.clone(),
            default_group,
        )
    }

    fn signup_pipeline(&self) -> SignUpPipeline {
        SignUpPipeline::new(
            self.transport.clone(),
            self.establisher.clone(),
            Arc::new(ConsoleNotifier),
            self.config.messages.clone(),
        )
        .with_pending_store(self.store.clone())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    gym_core::logging::init_for_verbosity(cli.verbose);

    let app = App::build(&cli)?;

    match cli.command {
        Commands::Groups => cmd_groups(&app).await,
        Commands::Exercises { group } => cmd_exercises(&app, group).await,
        Commands::Browse => cmd_browse(&app).await,
        Commands::Signup {
            name,
            email,
            password,
            password_confirm,
        } => {
            let input = FormInput {
                name,
                email,
                password,
                password_confirm,
            };
            cmd_signup(&app, input).await
        }
        Commands::Resume { password } => cmd_resume(&app, &password).await,
        Commands::Whoami => cmd_whoami(&app),
        Commands::Signout => cmd_signout(&app),
    }
}

async fn cmd_groups(app: &App) -> Result<()> {
    let sync = app.synchronizer();
    sync.load_filter_dimensions().await;
    let snapshot = sync.snapshot();
    sync.teardown();

    println!("Muscle groups ({})", snapshot.dimensions.len());
    for group in &snapshot.dimensions {
        let marker = if *group == snapshot.selection { "*" } else { " " };
        println!("  {} {}", marker, group);
    }
    Ok(())
}

async fn cmd_exercises(app: &App, group: Option<String>) -> Result<()> {
    let screen = app.home_screen(group);
    screen.mount().await;
    let snapshot = screen.snapshot();
    screen.unmount();

    display_exercises(&snapshot);
    Ok(())
}

async fn cmd_browse(app: &App) -> Result<()> {
    let screen = app.home_screen(None);
    screen.mount().await;
    display_home(&screen.snapshot());

    let stdin = io::stdin();
    loop {
        println!("─────────────────────────────────────────");
        println!("Type a group name to select it");
        println!("  'r' + Enter to leave and re-enter the screen");
        println!("  'o <id>' + Enter to open an exercise");
        println!("  'q' + Enter to quit");
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match BrowseAction::parse(&line) {
            BrowseAction::Quit => break,
            BrowseAction::Nothing => continue,
            BrowseAction::Reenter => {
                screen.focus_lost();
                screen.focus_gained().await;
            }
            BrowseAction::Open(id) => {
                screen.open_exercise(&id);
                continue;
            }
            BrowseAction::Select(group) => {
                screen.select_group(FilterDimension::new(group)).await;
            }
        }
        display_home(&screen.snapshot());
    }

    screen.unmount();
    Ok(())
}

enum BrowseAction {
    Quit,
    Nothing,
    Reenter,
    Open(String),
    Select(String),
}

impl BrowseAction {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => BrowseAction::Nothing,
            "q" => BrowseAction::Quit,
            "r" => BrowseAction::Reenter,
            _ => match line.strip_prefix("o ") {
                Some(id) => BrowseAction::Open(id.trim().to_string()),
                None => BrowseAction::Select(line.to_string()),
            },
        }
    }
}

async fn cmd_signup(app: &App, input: FormInput) -> Result<()> {
    let screen = SignUpScreen::new(app.signup_pipeline(), Arc::new(ConsoleNavigator));
    for field in Field::ALL {
        screen.set_field(field, input.get(field));
    }

    match screen.submit().await {
        Ok(()) => {
            ConsoleNotifier.show(Notification::success(format!(
                "Account created, signed in as {}",
                input.email
            )));
            Ok(())
        }
        Err(SignUpError::Invalid(errors)) => {
            eprintln!("Please fix the following:");
            for (field, message) in errors.iter() {
                eprintln!("  {}: {}", field, message);
            }
            Err(Error::Other("invalid sign-up form".into()))
        }
        Err(SignUpError::Submission(e)) => {
            if e.account_created() {
                eprintln!("The account was created but signing in failed.");
                eprintln!("Run `gymapp resume --password <password>` to finish.");
            }
            Err(Error::Other("sign-up failed".into()))
        }
    }
}

async fn cmd_resume(app: &App, password: &str) -> Result<()> {
    let pipeline = app.signup_pipeline();
    match pipeline.resume_sign_in(password).await {
        Ok(()) => {
            ConsoleNotifier.show(Notification::success("Signed in"));
            Ok(())
        }
        Err(SubmissionError::NothingPending) => {
            println!("No pending sign-up - nothing to resume.");
            Ok(())
        }
        Err(_) => Err(Error::Other("sign-in failed".into())),
    }
}

fn cmd_whoami(app: &App) -> Result<()> {
    match app.store.load_session()? {
        Some(session) => {
            println!("{} <{}>", session.user_name, session.user_email);
            println!("  Signed in: {}", session.signed_in_at.to_rfc3339());
        }
        None => println!("Not signed in."),
    }
    if let Some(pending) = app.store.load_pending()? {
        println!(
            "Pending sign-up for {} since {}",
            pending.email,
            pending.created_at.to_rfc3339()
        );
    }
    Ok(())
}

fn cmd_signout(app: &App) -> Result<()> {
    if app.establisher.sign_out()? {
        ConsoleNotifier.show(Notification::success("Signed out"));
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

fn display_home(snapshot: &SyncSnapshot) {
    let groups: Vec<String> = snapshot
        .dimensions
        .iter()
        .map(|g| {
            if *g == snapshot.selection {
                format!("[{}]", g)
            } else {
                g.to_string()
            }
        })
        .collect();
    println!();
    println!("  {}", groups.join("  "));
    display_exercises(snapshot);
}

fn display_exercises(snapshot: &SyncSnapshot) {
    println!();
    if snapshot.loading {
        println!("  Loading…");
        return;
    }

    println!("  Exercises: {} ({})", snapshot.selection, snapshot.items.len());
    for exercise in &snapshot.items {
        let detail = match (exercise.series, exercise.repetitions.as_deref()) {
            (Some(series), Some(reps)) => format!("{} x {}", series, reps),
            _ => String::new(),
        };
        println!("  → [{}] {}  {}", exercise.id, exercise.name, detail);
    }
    println!();
}
