mod walk;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rdrive::{
    account::RegisterData,
    api::DriveApi,
    dashboard::{Dashboard, TreeNode},
    format_bytes,
    notify::{LogNotifier, Notifier},
    session::AuthSession,
    store::JsonFileStore,
    Client, Config,
};
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};
use url::Url;

type DriveClient = Client<JsonFileStore>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the drive API
    #[arg(long, env = "RDRIVE_API_URL")]
    api_url: Option<Url>,

    /// File the session is kept in
    #[arg(long, env = "RDRIVE_SESSION_FILE", default_value = ".rdrive-session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RDRIVE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RDRIVE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Activate an account with the token from the activation email
    Activate { token: String },
    /// Request a password reset email
    ForgotPassword { email: String },
    /// Set a new password with the token from the reset email
    ResetPassword {
        token: String,
        /// Only show who the token belongs to
        #[arg(long, conflicts_with = "password")]
        check: bool,
        #[arg(
            long,
            env = "RDRIVE_PASSWORD",
            hide_env_values = true,
            required_unless_present = "check"
        )]
        password: Option<String>,
    },
    /// Show the signed-in user
    Whoami,
    /// List a folder
    Ls {
        /// Folder id, the root folder if omitted
        folder: Option<String>,
        /// Only show entries whose name contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// List the files of a folder
    Files {
        #[arg(long)]
        folder: Option<String>,
    },
    /// Show the folder tree
    Tree {
        #[arg(long, default_value_t = 2)]
        depth: usize,
    },
    /// Create a folder
    Mkdir {
        name: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Delete a file
    RmFile {
        id: String,
        /// Folder the file is in
        #[arg(long)]
        folder: Option<String>,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Delete a folder and everything in it
    RmFolder {
        id: String,
        /// Parent of the folder
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, short)]
        yes: bool,
    },
    /// Download a file
    Download {
        id: String,
        #[arg(long)]
        folder: Option<String>,
        /// Target path, the file name if omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Upload files and directories
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Target folder, the root folder if omitted
        #[arg(long)]
        folder: Option<String>,
    },
    /// Show the storage usage
    Usage,
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let mut config = Config::from_env().context("invalid RDRIVE_API_URL")?;
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }
    debug!("using API at {}", config.api_url);

    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let session = AuthSession::restore(JsonFileStore::new(&args.session_file), notifier.clone())
        .await
        .context("cannot restore session")?;
    let client = Client::new(config.clone(), Arc::new(session));

    run(args.command, client, notifier, &config).await
}

async fn run(
    command: Command,
    client: DriveClient,
    notifier: Arc<dyn Notifier>,
    config: &Config,
) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let user = client.login(&email, &password).await?;
            info!("Signed in as {}", user.display_name());
        }
        Command::Logout => {
            client.logout().await?;
        }
        Command::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            let data = RegisterData::new(email, password)
                .with_first_name(first_name)
                .with_last_name(last_name);
            client.register(&data).await?;
            info!("Registration complete. Check your email to activate the account.");
        }
        Command::Activate { token } => {
            client.activate(&token).await?;
            info!("Account activated. You can sign in now.");
        }
        Command::ForgotPassword { email } => {
            client.forgot_password(&email).await?;
            info!("If the address is registered, a reset link is on its way.");
        }
        Command::ResetPassword {
            token,
            check,
            password,
        } => {
            if check {
                let reset = client.reset_password_info(&token).await?;
                match reset.email {
                    Some(email) => println!("{}", email),
                    None => println!("token is valid"),
                }
            } else if let Some(password) = password {
                client.reset_password(&token, &password).await?;
                info!("Password updated. You can sign in now.");
            }
        }
        Command::Whoami => {
            let authenticated = client.session().is_authenticated().await;
            let user = match client.session().user().await {
                Some(v) if authenticated => v,
                _ => bail!("not signed in"),
            };
            println!("{} <{}>", user.display_name(), user.email);
        }
        Command::Ls { folder, search } => {
            let mut dashboard = Dashboard::new(client, notifier, config);
            succeeded(dashboard.load_content(folder.as_deref()).await)?;
            if let Some(search) = search {
                dashboard.set_search(search);
            }
            let trail = dashboard
                .breadcrumbs()
                .iter()
                .map(|v| v.name.as_str())
                .collect::<Vec<_>>()
                .join(" / ");
            println!("{}", trail);
            for folder in dashboard.visible_folders() {
                println!("{:>10}  {}/  ({})", "-", folder.name, folder.id);
            }
            for file in dashboard.visible_files() {
                println!("{:>10}  {}  ({})", format_bytes(file.size), file.name, file.id);
            }
        }
        Command::Files { folder } => {
            for file in client.list_files(folder.as_deref()).await? {
                println!("{}\t{}\t{}\t{}", file.id, file.size, file.mime_type, file.name);
            }
        }
        Command::Tree { depth } => {
            let mut dashboard = Dashboard::new(client, notifier, config);
            succeeded(dashboard.load_root_folders().await)?;
            let mut pending = dashboard
                .tree()
                .iter()
                .map(|v| (v.id.clone(), 1))
                .collect::<Vec<_>>();
            while let Some((id, level)) = pending.pop() {
                if level >= depth || !dashboard.expand_folder(&id).await {
                    continue;
                }
                if let Some(node) = find_node(dashboard.tree(), &id) {
                    pending.extend(node.children.iter().map(|v| (v.id.clone(), level + 1)));
                }
            }
            println!("{}", rdrive::dashboard::ROOT_NAME);
            print_tree(dashboard.tree(), 1);
        }
        Command::Mkdir { name, parent } => {
            let mut dashboard = Dashboard::new(client, notifier, config);
            succeeded(dashboard.load_content(parent.as_deref()).await)?;
            let folder = dashboard.create_folder(&name).await;
            match folder {
                Some(folder) => println!("{}", folder.id),
                None => bail!("folder was not created"),
            }
        }
        Command::RmFile { id, folder, yes } => {
            let mut dashboard = Dashboard::new(client, notifier, config);
            succeeded(dashboard.load_content(folder.as_deref()).await)?;
            if !dashboard.contents().files.iter().any(|v| v.id == id) {
                bail!("no file with id {} in this folder", id);
            }
            let deleted = dashboard
                .delete_file(&id, |name| yes || confirm(&format!("Delete file \"{}\"?", name)))
                .await;
            succeeded(deleted)?;
        }
        Command::RmFolder { id, parent, yes } => {
            let mut dashboard = Dashboard::new(client, notifier, config);
            succeeded(dashboard.load_content(parent.as_deref()).await)?;
            if !dashboard.contents().folders.iter().any(|v| v.id == id) {
                bail!("no folder with id {} in this folder", id);
            }
            let prompt = |name: &str| {
                yes || confirm(&format!(
                    "Delete folder \"{}\" and everything in it?",
                    name
                ))
            };
            succeeded(dashboard.delete_folder(&id, prompt).await)?;
        }
        Command::Download { id, folder, output } => {
            let mut dashboard = Dashboard::new(client.clone(), notifier, config);
            succeeded(dashboard.load_content(folder.as_deref()).await)?;
            let link = match dashboard.download(&id).await {
                Some(v) => v,
                None => bail!("no download link"),
            };
            let output = output.unwrap_or_else(|| PathBuf::from(&link.file_name));
            let written = client.download_to(&link.url, &output).await?;
            info!("Saved {} ({})", output.display(), format_bytes(written));
        }
        Command::Upload { paths, folder } => {
            let mut files = Vec::new();
            for path in &paths {
                files.extend(walk::collect(path)?);
            }
            let entries = walk::entries(files).await?;
            let mut dashboard = Dashboard::new(client, notifier, config);
            succeeded(dashboard.load_content(folder.as_deref()).await)?;
            let summary = dashboard.upload(entries).await;
            for file in &summary.uploaded {
                println!("{}\t{}", file.id, file.name);
            }
            if !summary.is_complete_success() {
                bail!(
                    "{} failed, {} skipped",
                    summary.failures.len(),
                    summary.skipped.len()
                );
            }
        }
        Command::Usage => {
            let mut dashboard = Dashboard::new(client, notifier, config);
            succeeded(dashboard.load_storage().await)?;
            let used = dashboard.usage().total_usage;
            let limit = dashboard.storage_limit();
            let percent = if limit == 0 {
                0.0
            } else {
                used as f64 / limit as f64 * 100.0
            };
            println!(
                "{} of {} used ({:.1}%), {} left",
                format_bytes(used),
                format_bytes(limit),
                percent,
                format_bytes(dashboard.remaining_space())
            );
        }
    }
    Ok(())
}

fn succeeded(ok: bool) -> Result<()> {
    if ok {
        Ok(())
    } else {
        bail!("operation failed")
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn find_node<'a>(nodes: &'a [TreeNode], id: &str) -> Option<&'a TreeNode> {
    nodes.iter().find_map(|node| {
        if node.id == id {
            Some(node)
        } else {
            find_node(&node.children, id)
        }
    })
}

fn print_tree(nodes: &[TreeNode], level: usize) {
    for node in nodes {
        println!("{}{}  ({})", "  ".repeat(level), node.name, node.id);
        print_tree(&node.children, level + 1);
    }
}
