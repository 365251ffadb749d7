use std::sync::Arc;

use clap::{Args, Subcommand};
use sesman_core::Notifier;
use sesman_forms::{ContactListField, ContactListForm, TagEntry, TopicEntry};
use sesman_repository::{ContactListRepository, RepositoryContext};

use crate::OutputFormat;
use crate::console::{ConsoleNotifier, emit, parse_key_value, print_field_errors};

#[derive(Args, Debug)]
pub struct ContactListsArgs {
    #[command(subcommand)]
    pub command: ContactListsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ContactListsCommand {
    /// List contact lists.
    List {
        /// Case-insensitive name filter.
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one contact list.
    Get {
        /// Contact list name.
        name: String,
    },
    /// Create a contact list.
    Create {
        /// Contact list name.
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        members: MemberArgs,
    },
    /// Update a contact list.
    Update {
        /// Current contact list name.
        name: String,
        /// New name.
        #[arg(long)]
        rename: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        members: MemberArgs,
        /// Tag key to remove.
        #[arg(long = "remove-tag")]
        remove_tags: Vec<String>,
        /// Topic name to remove.
        #[arg(long = "remove-topic")]
        remove_topics: Vec<String>,
    },
    /// Delete a contact list.
    Delete {
        /// Contact list name.
        name: String,
    },
}

#[derive(Args, Debug)]
pub struct MemberArgs {
    /// Tag to add as KEY=VALUE.
    #[arg(long = "tag", value_parser = parse_key_value)]
    pub tags: Vec<(String, String)>,
    /// Topic to add as NAME:DISPLAY_NAME[:OPT_IN|OPT_OUT].
    #[arg(long = "topic", value_parser = parse_topic)]
    pub topics: Vec<TopicEntry>,
}

/// Parse `name:Display Name[:STATUS]` into a topic entry.
fn parse_topic(input: &str) -> Result<TopicEntry, String> {
    let mut parts = input.splitn(3, ':');
    let (Some(name), Some(display_name)) = (parts.next(), parts.next()) else {
        return Err(format!("expected NAME:DISPLAY_NAME[:STATUS], got '{input}'"));
    };
    let entry = TopicEntry::new(name, display_name);
    Ok(match parts.next() {
        Some(status) => entry.with_status(status),
        None => entry,
    })
}

pub async fn run(
    ctx: RepositoryContext,
    args: &ContactListsArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let session = ctx.session().clone();
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
    let repo = ContactListRepository::new(ctx);

    match &args.command {
        ContactListsCommand::List { search } => {
            let lists = repo.list(search.as_deref()).await?;
            emit(format, &lists, || {
                println!("{} contact lists:", lists.len());
                for list in &lists {
                    println!(
                        "  {name} | topics: {topics} | tags: {tags} {desc}",
                        name = list.name,
                        topics = list.topics.len(),
                        tags = list.tags.len(),
                        desc = list.description.as_deref().unwrap_or(""),
                    );
                }
            })?;
        }
        ContactListsCommand::Get { name } => match repo.get(name).await? {
            Some(list) => emit(format, &list, || {
                println!("Name:        {}", list.name);
                println!("Description: {}", list.description.as_deref().unwrap_or("-"));
                println!("Topics:");
                for topic in &list.topics {
                    println!(
                        "  {} ({}) {}",
                        topic.topic_name, topic.display_name, topic.default_subscription_status
                    );
                }
                println!("Tags:");
                for tag in &list.tags {
                    println!("  {}={}", tag.key, tag.value);
                }
            })?,
            None => anyhow::bail!("contact list \"{name}\" not found"),
        },
        ContactListsCommand::Create {
            name,
            description,
            members,
        } => {
            let mut form = ContactListForm::new(repo, session, notifier);
            if form.mount().await.is_some() {
                anyhow::bail!("login required");
            }
            form.handle_change(ContactListField::Name, name);
            if let Some(description) = description {
                form.handle_change(ContactListField::Description, description);
            }
            add_members(&mut form, members)?;
            submit(&mut form, format).await?;
        }
        ContactListsCommand::Update {
            name,
            rename,
            description,
            members,
            remove_tags,
            remove_topics,
        } => {
            let mut form = ContactListForm::edit(repo, session, notifier, name);
            if form.mount().await.is_some() {
                anyhow::bail!("could not load contact list \"{name}\"");
            }
            if let Some(rename) = rename {
                form.handle_change(ContactListField::Name, rename);
            }
            if let Some(description) = description {
                form.handle_change(ContactListField::Description, description);
            }
            for key in remove_tags {
                let index = form.data().tags.iter().position(|t| &t.key == key);
                if index.and_then(|i| form.remove_tag(i)).is_none() {
                    anyhow::bail!("tag \"{key}\" not found");
                }
            }
            for topic_name in remove_topics {
                let index = form
                    .data()
                    .topics
                    .iter()
                    .position(|t| &t.topic_name == topic_name);
                if index.and_then(|i| form.remove_topic(i)).is_none() {
                    anyhow::bail!("topic \"{topic_name}\" not found");
                }
            }
            add_members(&mut form, members)?;
            submit(&mut form, format).await?;
        }
        ContactListsCommand::Delete { name } => {
            let mut form = ContactListForm::edit(repo, session, notifier, name);
            if form.handle_delete().await.is_none() {
                anyhow::bail!("contact list \"{name}\" was not deleted");
            }
        }
    }
    Ok(())
}

fn add_members(form: &mut ContactListForm, members: &MemberArgs) -> anyhow::Result<()> {
    for (key, value) in &members.tags {
        let mut entry = TagEntry::new(key, value);
        if !form.add_tag(&mut entry) {
            print_field_errors(entry.errors());
            let reason = entry.duplicate_error().unwrap_or("invalid tag");
            anyhow::bail!("{reason}");
        }
    }
    for topic in &members.topics {
        let mut entry = topic.clone();
        if !form.add_topic(&mut entry) {
            print_field_errors(entry.errors());
            let reason = entry.duplicate_error().unwrap_or("invalid topic");
            anyhow::bail!("{reason}");
        }
    }
    Ok(())
}

async fn submit(form: &mut ContactListForm, format: &OutputFormat) -> anyhow::Result<()> {
    if form.handle_submit().await.is_none() {
        print_field_errors(form.errors());
        anyhow::bail!("contact list was not saved");
    }
    let data = form.data();
    emit(format, data, || {
        println!(
            "{}: {} topics, {} tags",
            data.name,
            data.topics.len(),
            data.tags.len()
        );
    })
}
