use clap::{Parser, Subcommand};
use client::{
    auth,
    publish::GatewayPublisher,
    store::FileStore,
    tags, ClientError, FormController, Notice,
};
use std::{error::Error, path::PathBuf, process::ExitCode};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing_subscriber::EnvFilter;

mod client;
mod compat;
mod config;
mod gateway;
mod model;
mod page;
mod provider;
#[cfg(test)]
mod testing;

#[derive(Parser, Debug)]
#[command(version, about = "Write tagged markdown notes and publish them to a repository")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the publish gateway
    Serve,

    /// Edit the saved draft
    #[command(subcommand)]
    Draft(DraftCommand),

    /// Render the draft's content as HTML
    Preview,

    /// List known tags, optionally filtered
    Tags { filter: Option<String> },

    /// Validate the draft and publish it through the gateway
    Publish,

    /// Reset the draft
    Clear,

    /// Remember the gateway secret
    Login { secret: String },

    /// Forget the gateway secret
    Logout,
}

#[derive(Subcommand, Debug)]
enum DraftCommand {
    /// Print the draft and any problems with it
    Show,

    Slug { slug: String },

    /// Set the body from an argument or a file
    Content {
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        text: Option<String>,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Set the authoring time (RFC 3339, or "now")
    Time { at: String },

    #[command(subcommand)]
    Tag(TagCommand),
}

#[derive(Subcommand, Debug)]
enum TagCommand {
    Add { tags: Vec<String> },
    Remove { tags: Vec<String> },
    Set { tags: Vec<String> },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notepost=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(provider::USER_AGENT)
        .build()
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = config::Config::load(cli.config.as_deref())?;
    let client_config = &config.client;
    let mut store = FileStore::new(client_config.state_dir());

    match cli.command {
        Command::Serve => {
            gateway::serve(&config.gateway).await?;
        }

        Command::Login { secret } => {
            let ttl = time::Duration::hours(client_config.auth_ttl_hours.into());
            let record = auth::login(&mut store, &secret, ttl, OffsetDateTime::now_utc())?;
            tracing::debug!(expires_at = record.expires_at, "logged in");
            println!("logged in for {} hours", client_config.auth_ttl_hours);
        }

        Command::Logout => {
            auth::logout(&mut store)?;
            println!("logged out");
        }

        Command::Tags { filter } => {
            let known = tags::fetch_tags(&http_client()?, client_config.tags_url.clone()).await;
            for tag in tags::filter_suggestions(&known, filter.as_deref().unwrap_or("")) {
                println!("{}", tag);
            }
        }

        Command::Preview => {
            let form = FormController::load(store, client_config.restore_timestamp)?;
            print!("{}", form.preview().0);
        }

        Command::Clear => {
            let mut form = FormController::load(store, client_config.restore_timestamp)?;
            form.clear()?;
            println!("draft cleared");
        }

        Command::Publish => {
            let auth = auth::current(&mut store, OffsetDateTime::now_utc())?
                .ok_or(ClientError::NotLoggedIn)?;
            let mut form = FormController::load(store, client_config.restore_timestamp)?;
            let publisher =
                GatewayPublisher::new(http_client()?, client_config.gateway_url.clone(), auth.secret);

            let result = form.submit(&publisher).await;
            match form.notice() {
                Some(Notice::Success(message)) => println!("{}", message),
                Some(Notice::Error(message)) => eprintln!("{}", message),
                None => {}
            }

            match result {
                Ok(published) => {
                    if let Some(url) = published.url {
                        println!("{} -> {}", published.filename, url);
                    }
                }
                Err(ClientError::Validation(errors)) => {
                    for (field, message) in errors.iter() {
                        eprintln!("{}: {}", field, message);
                    }
                    return Err("draft is not ready to publish".into());
                }
                Err(ClientError::Rejected { status: 401, .. }) => {
                    return Err("gateway refused the saved secret, run `notepost login` again".into());
                }
                Err(err) => return Err(err.into()),
            }
        }

        Command::Draft(command) => {
            let mut form = FormController::load(store, client_config.restore_timestamp)?;
            match command {
                DraftCommand::Show => show(&form),
                DraftCommand::Slug { slug } => form.set_slug(&slug)?,
                DraftCommand::Content { text, file } => {
                    let content = match (text, file) {
                        (Some(text), _) => text,
                        (None, Some(path)) => std::fs::read_to_string(path)?,
                        (None, None) => String::new(),
                    };
                    form.set_content(&content)?;
                }
                DraftCommand::Time { at } => {
                    let at = if at == "now" {
                        OffsetDateTime::now_utc()
                    } else {
                        OffsetDateTime::parse(&at, &Rfc3339)?
                    };
                    form.set_timestamp(at)?;
                }
                DraftCommand::Tag(TagCommand::Add { tags }) => {
                    for tag in tags {
                        form.add_tag(&tag)?;
                    }
                }
                DraftCommand::Tag(TagCommand::Remove { tags }) => {
                    for tag in tags {
                        if !form.remove_tag(&tag)? {
                            eprintln!("no tag {:?} in draft", tag);
                        }
                    }
                }
                DraftCommand::Tag(TagCommand::Set { tags }) => form.set_tags(tags)?,
            }
        }
    }

    Ok(())
}

fn show(form: &FormController<FileStore>) {
    let draft = form.draft();
    if draft.is_blank() {
        println!("(empty draft)");
    }

    let time = draft
        .timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| draft.timestamp.to_string());
    println!("time:    {}", time);
    println!("slug:    {}", draft.slug);
    println!("tags:    [{}]", draft.tags.join(", "));
    println!("content:\n{}", draft.content);

    match form.errors() {
        Some(errors) => {
            println!();
            for (field, message) in errors.iter() {
                println!("! {}: {}", field, message);
            }
        }
        None => {
            if let Ok(note) = draft.validate() {
                println!("\nready to publish as {}", note.filename());
            }
        }
    }
}
