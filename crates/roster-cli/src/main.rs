//! `roster`: command-line access to a Roster contacts store.
//!
//! Reads `roster.toml` (or the path given with `--config`) and `ROSTER_*`
//! environment variables, opens the SQLite store and prints results as JSON.
//!
//! # Usage
//!
//! ```
//! roster insert --name "Ada Lovelace" --email ada@example.com
//! roster query --search lovelace
//! roster block +15550100
//! ```

mod settings;

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand, ValueEnum};
use roster_core::{
  column,
  entity::{Email, EmailType, Group, Name, Phone, PhoneType, RawContact},
  predicate::{OrderBy, equal_to, like},
  store::StaticAccounts,
};
use roster_provider::Contacts;
use roster_store_sqlite::SqliteStore;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::CliConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "roster", author, version, about = "Roster contacts store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "roster.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// List contacts, optionally matching a search term.
  Query {
    /// Matched against display names and every data value.
    #[arg(short, long)]
    search:  Option<String>,
    /// Only raw contacts of this configured account.
    #[arg(short, long)]
    account: Option<String>,
    #[arg(long)]
    limit:   Option<usize>,
    #[arg(long, default_value_t = 0)]
    offset:  usize,
  },
  /// Insert a new raw contact.
  Insert {
    #[arg(short, long)]
    name:    Option<String>,
    #[arg(short, long)]
    email:   Vec<String>,
    #[arg(short, long)]
    phone:   Vec<String>,
    /// A configured account; local when omitted.
    #[arg(short, long)]
    account: Option<String>,
  },
  /// Add an email address to a contact's first raw contact.
  AddEmail {
    contact: i64,
    address: String,
    #[arg(long, value_enum, default_value_t = EmailKind::Home)]
    kind:    EmailKind,
  },
  /// Delete contacts and all their raw contacts.
  Delete {
    #[arg(required = true)]
    contacts: Vec<i64>,
  },
  /// List or create groups.
  Groups {
    #[command(subcommand)]
    action: Option<GroupsAction>,
  },
  /// Block phone numbers.
  Block {
    #[arg(required = true)]
    numbers: Vec<String>,
  },
  /// Unblock a phone number.
  Unblock { number: String },
  /// List blocked numbers.
  Blocked,
}

#[derive(Subcommand)]
enum GroupsAction {
  List {
    #[arg(short, long)]
    account: Option<String>,
  },
  Create {
    title:   String,
    #[arg(short, long)]
    account: String,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum EmailKind {
  Home,
  Work,
  Mobile,
  Other,
}

impl From<EmailKind> for EmailType {
  fn from(kind: EmailKind) -> Self {
    match kind {
      EmailKind::Home => EmailType::Home,
      EmailKind::Work => EmailType::Work,
      EmailKind::Mobile => EmailType::Mobile,
      EmailKind::Other => EmailType::Other,
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;

  if let Some(parent) = cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&cfg.store_path)
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  for account in &cfg.accounts {
    store
      .add_account(account)
      .with_context(|| format!("failed to add account {}", account.name))?;
  }
  tracing::debug!(store = %cfg.store_path.display(), "store opened");

  let contacts = Contacts::new(store)
    .with_permissions(cfg.permissions)
    .with_account_oracle(StaticAccounts(cfg.accounts.clone()));

  run(&contacts, &cfg, cli.command)
}

fn run(contacts: &Contacts, cfg: &CliConfig, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Query { search, account, limit, offset } => {
      let mut query = contacts
        .query()
        .order_by(OrderBy::asc(column::DISPLAY_NAME_PRIMARY).ignoring_case())
        .offset(offset);
      if let Some(term) = search {
        let pattern = format!("%{term}%");
        query = query.filter(
          like(column::DISPLAY_NAME_PRIMARY, pattern.as_str())
            .or(like(column::DATA1, pattern.as_str())),
        );
      }
      if let Some(name) = account {
        query = query.accounts([Some(cfg.account(&name)?)]);
      }
      if let Some(limit) = limit {
        query = query.limit(limit)?;
      }
      print(&query.find())
    }

    Command::Insert { name, email, phone, account } => {
      let account = account.map(|n| cfg.account(&n)).transpose()?;
      let mut raw = RawContact::new();
      raw.name = name.map(|n| Name { display_name: Some(n), ..Name::default() });
      raw.emails = email.into_iter().map(|e| Email::new(EmailType::Home, e)).collect();
      raw.phones = phone.into_iter().map(|p| Phone::new(PhoneType::Mobile, p)).collect();

      let result = contacts.insert().for_account(account).raw_contact(raw).commit()?;
      if let Some(failure) = result.failure(0) {
        bail!("insert failed: {failure:?}");
      }
      print(&result)
    }

    Command::AddEmail { contact, address, kind } => {
      let Some(found) = contacts
        .query()
        .filter(equal_to(column::CONTACT_ID, contact))
        .find_one()
      else {
        bail!("no contact with id {contact}");
      };
      let Some(mut raw) = found.raw_contacts.into_iter().next() else {
        bail!("contact {contact} has no raw contacts");
      };
      raw.emails.push(Email::new(kind.into(), address));

      let result = contacts.update().raw_contacts([raw]).commit()?;
      if !result.is_successful() {
        bail!("update of contact {contact} failed");
      }
      print(&result)
    }

    Command::Delete { contacts: ids } => {
      let result = contacts.delete().contact_ids(ids).commit();
      print(&result)
    }

    Command::Groups { action } => {
      groups(contacts, cfg, action.unwrap_or(GroupsAction::List { account: None }))
    }

    Command::Block { numbers } => {
      let insert = numbers
        .into_iter()
        .fold(contacts.blocked_numbers().insert(), |insert, n| insert.number(n));
      print(&insert.commit())
    }

    Command::Unblock { number } => {
      if !contacts.blocked_numbers().unblock(&number) {
        bail!("{number} is not blocked");
      }
      Ok(())
    }

    Command::Blocked => print(&contacts.blocked_numbers().find()),
  }
}

fn groups(contacts: &Contacts, cfg: &CliConfig, action: GroupsAction) -> anyhow::Result<()> {
  match action {
    GroupsAction::List { account } => {
      let mut query = contacts.groups().order_by(OrderBy::asc(column::TITLE));
      if let Some(name) = account {
        query = query.accounts([Some(cfg.account(&name)?)]);
      }
      print(&query.find())
    }
    GroupsAction::Create { title, account } => {
      let group = Group::new(title, Some(cfg.account(&account)?));
      let result = contacts.groups_insert().group(group).commit();
      if let Some(failure) = result.failure(0) {
        bail!("group not created: {failure:?}");
      }
      print(&result)
    }
  }
}

fn print(value: &impl Serialize) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("failed to serialise output")?;
  println!("{json}");
  Ok(())
}
