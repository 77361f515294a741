use clap::{ArgAction, Parser, Subcommand};
use miette::{IntoDiagnostic, miette};
use skynotify::{Applier, Session, StaticAuth, XrpcApi};
use skynotify_common::edit::{Channel, Edit};
use skynotify_common::schema::UnknownFields;
use skynotify_common::{
    ConfigOptions, ConfigStore, FileStore, Include, NotificationKind, NotificationPreferences,
    Notifier, PreferenceKey, PreferenceState,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about = "Configure Bluesky notification preferences")]
struct Args {
    /// Local preference store (JSON file)
    #[arg(long, env = "SKYNOTIFY_STORE", default_value = "skynotify.json", global = true)]
    store: PathBuf,

    /// Key the preferences are stored under
    #[arg(long = "key", id = "store_key", value_name = "KEY", default_value = "config", global = true)]
    key: String,

    /// Treat unknown fields in the stored preferences as corruption
    #[arg(long, global = true)]
    reject_unknown: bool,

    #[command(flatten)]
    session: SessionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct SessionArgs {
    /// PDS URL of the signed-in account (e.g., https://bsky.social)
    #[arg(long, env = "SKYNOTIFY_PDS", global = true)]
    pds: Option<Url>,

    /// DID of the signed-in account
    #[arg(long, env = "SKYNOTIFY_DID", global = true)]
    did: Option<String>,

    /// Handle of the signed-in account
    #[arg(long, env = "SKYNOTIFY_HANDLE", global = true)]
    handle: Option<String>,

    /// Access token for the signed-in account
    #[arg(long, env = "SKYNOTIFY_ACCESS_JWT", hide_env_values = true, global = true)]
    access_jwt: Option<String>,

    /// Service to proxy calls to through the PDS
    #[arg(long, env = "SKYNOTIFY_PROXY", global = true)]
    proxy: Option<String>,
}

impl SessionArgs {
    fn auth(&self) -> StaticAuth {
        match (&self.pds, &self.did, &self.access_jwt) {
            (Some(pds), Some(did), Some(token)) => StaticAuth::signed_in(Session {
                did: did.into(),
                handle: self.handle.as_deref().map(Into::into),
                access_jwt: token.into(),
                pds: pds.clone(),
            }),
            _ => StaticAuth::signed_out(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the stored preferences
    Show {
        /// Print the raw JSON document
        #[arg(long)]
        json: bool,
    },
    /// Change one preference and save
    Set {
        /// Preference to change (like, follow, reply, mention, quote, repost,
        /// subscribedPost, likeViaRepost, repostViaRepost, starterpackJoined,
        /// unverified, verified)
        key: PreferenceKey,
        /// Push notifications on or off
        #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
        push: Option<bool>,
        /// In-app list on or off
        #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
        list: Option<bool>,
        /// Whose activity to include: all or follows
        #[arg(long)]
        include: Option<String>,
    },
    /// Push on or off for starter pack joins and verification changes together
    Others {
        #[arg(action = ArgAction::Set, value_name = "BOOL")]
        push: bool,
    },
    /// Restore the default preferences and save
    Reset,
    /// Check the stored preferences without repairing them
    Check,
    /// Send the stored preferences to Bluesky
    Apply,
    /// Show the signed-in account, or look up --did/--handle on the public AppView
    Whoami,
}

/// Prints notifications to stderr.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        eprintln!("[{kind}] {message}");
    }
}

fn print_table(doc: &NotificationPreferences) {
    let flag = |on: bool| if on { "on" } else { "off" };
    println!("{:<18} {:<5} {:<5} include", "preference", "push", "list");
    for key in PreferenceKey::ALL {
        let pref = doc.get(key);
        println!(
            "{:<18} {:<5} {:<5} {}",
            key.as_str(),
            flag(pref.push()),
            flag(pref.list()),
            pref.include().map(Include::as_str).unwrap_or("-")
        );
    }
}

fn set_edits(
    key: PreferenceKey,
    push: Option<bool>,
    list: Option<bool>,
    include: Option<String>,
) -> Vec<Edit> {
    let channels = [(Channel::Push, push), (Channel::List, list)];
    let mut edits: Vec<Edit> = channels
        .into_iter()
        .filter_map(|(channel, value)| {
            value.map(|enabled| Edit::SetChannel {
                key,
                channel,
                enabled,
            })
        })
        .collect();
    if let Some(include) = include {
        edits.push(Edit::SetInclude {
            key,
            include: Include::from(include),
        });
    }
    edits
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_env_filter(EnvFilter::from_env("SKYNOTIFY_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = ConfigOptions::builder()
        .key(args.key.as_str())
        .unknown_fields(if args.reject_unknown {
            UnknownFields::Reject
        } else {
            UnknownFields::Strip
        })
        .build();
    let config = ConfigStore::with_options(FileStore::new(&args.store), TerminalNotifier, options);

    match args.command {
        Command::Show { json } => {
            let doc = config.load();
            if json {
                println!("{}", serde_json::to_string_pretty(&doc).into_diagnostic()?);
            } else {
                print_table(&doc);
            }
        }
        Command::Set {
            key,
            push,
            list,
            include,
        } => {
            let edits = set_edits(key, push, list, include);
            if edits.is_empty() {
                return Err(miette!(
                    help = "pass at least one of --push, --list or --include",
                    "nothing to change for `{}`",
                    key
                ));
            }
            let mut state = PreferenceState::load(&config);
            for edit in &edits {
                state.edit(edit)?;
            }
            state.save(&config)?;
        }
        Command::Others { push } => {
            let mut state = PreferenceState::load(&config);
            state.edit(&Edit::SetOthersPush(push))?;
            state.save(&config)?;
        }
        Command::Reset => {
            let mut state = PreferenceState::load(&config);
            state.edit(&Edit::Reset)?;
            state.save(&config)?;
        }
        Command::Check => match config.load_strict()? {
            Some(_) => println!("stored preferences are valid"),
            None => println!("no preferences stored; defaults will be used"),
        },
        Command::Apply => {
            let doc = config.load();
            let applier = applier(&args.session);
            applier.apply(&doc).await?;
        }
        Command::Whoami => {
            let applier = applier(&args.session);
            let actor = args.session.did.as_deref().or(args.session.handle.as_deref());
            let profile = applier.profile(actor).await?;
            println!("{} (@{})", profile.label(), profile.handle);
            println!("did: {}", profile.did);
            if let Some(avatar) = &profile.avatar {
                println!("avatar: {avatar}");
            }
        }
    }

    Ok(())
}

fn applier(session: &SessionArgs) -> Applier<StaticAuth, XrpcApi<reqwest::Client>, TerminalNotifier> {
    let mut api = XrpcApi::new(reqwest::Client::new());
    if let Some(proxy) = &session.proxy {
        api = api.with_proxy(proxy.as_str());
    }
    Applier::new(session.auth(), api, TerminalNotifier)
}
