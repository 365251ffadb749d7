use std::collections::HashMap;
use std::sync::Arc;

use clap::{Args, Subcommand};
use sesman_core::{Notifier, TemplateInput};
use sesman_forms::{TemplateField, TemplateForm, TestEmailForm};
use sesman_repository::{RepositoryContext, TemplateBackend, TemplateRepository, template_repository};

use crate::OutputFormat;
use crate::console::{ConsoleNotifier, emit, parse_json_data, parse_key_value, print_field_errors};

#[derive(Args, Debug)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    pub command: TemplatesCommand,
}

#[derive(Subcommand, Debug)]
pub enum TemplatesCommand {
    /// List templates.
    List {
        /// Case-insensitive name filter.
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one template.
    Get {
        /// Template name.
        name: String,
    },
    /// Create a template.
    Create(ContentArgs),
    /// Update a template. A new `--name` renames it.
    Update {
        /// Current template name.
        id: String,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// Delete a template.
    Delete {
        /// Template name.
        name: String,
    },
    /// Send a test email rendered from a template.
    Send {
        /// Template name.
        name: String,
        /// Sender address.
        #[arg(long)]
        from: String,
        /// Comma-separated recipient addresses.
        #[arg(long)]
        to: String,
        /// Placeholder value as KEY=VALUE.
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },
    /// Render a template with placeholder values.
    Preview {
        /// Template name.
        name: String,
        /// Placeholder value as KEY=VALUE.
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,
    },
}

#[derive(Args, Debug)]
pub struct ContentArgs {
    /// JSON template (string or @file path); flags override its fields.
    #[arg(long)]
    pub data: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long)]
    pub html: Option<String>,
    #[arg(long)]
    pub text: Option<String>,
}

impl ContentArgs {
    fn changes(&self) -> anyhow::Result<Vec<(TemplateField, String)>> {
        let base: Option<TemplateInput> = self.data.as_deref().map(parse_json_data).transpose()?;
        let pick = |flag: Option<&String>, from_data: Option<&String>| flag.or(from_data).cloned();
        let changes = [
            (TemplateField::Name, pick(self.name.as_ref(), base.as_ref().map(|b| &b.name))),
            (
                TemplateField::Subject,
                pick(self.subject.as_ref(), base.as_ref().map(|b| &b.subject)),
            ),
            (TemplateField::Html, pick(self.html.as_ref(), base.as_ref().map(|b| &b.html))),
            (TemplateField::Text, pick(self.text.as_ref(), base.as_ref().map(|b| &b.text))),
        ];
        Ok(changes
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (field, v)))
            .collect())
    }
}

pub async fn run(
    ctx: RepositoryContext,
    backend: TemplateBackend,
    args: &TemplatesArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let session = ctx.session().clone();
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
    let repo = template_repository(backend, ctx);

    match &args.command {
        TemplatesCommand::List { search } => {
            let templates = repo.list(search.as_deref()).await?;
            emit(format, &templates, || {
                println!("{} templates ({backend}):", templates.len());
                for t in &templates {
                    println!(
                        "  {name} | {subject} | fields: {fields}",
                        name = t.name,
                        subject = t.subject,
                        fields = t.dynamic_fields.join(", "),
                    );
                }
            })?;
        }
        TemplatesCommand::Get { name } => match repo.get(name).await? {
            Some(t) => emit(format, &t, || {
                println!("Name:      {}", t.name);
                println!("Subject:   {}", t.subject);
                println!("Fields:    {}", t.dynamic_fields.join(", "));
                println!("Updated:   {}", t.updated_at);
                println!("--- text ---\n{}", t.text);
                println!("--- html ---\n{}", t.html);
            })?,
            None => anyhow::bail!("template \"{name}\" not found"),
        },
        TemplatesCommand::Create(content) => {
            let mut form = TemplateForm::new(repo, session, notifier);
            if form.mount().await.is_some() {
                anyhow::bail!("login required");
            }
            submit(&mut form, content.changes()?, format).await?;
        }
        TemplatesCommand::Update { id, content } => {
            let mut form = TemplateForm::edit(repo, session, notifier, id);
            if form.mount().await.is_some() {
                anyhow::bail!("could not load template \"{id}\"");
            }
            submit(&mut form, content.changes()?, format).await?;
        }
        TemplatesCommand::Delete { name } => {
            let mut form = TemplateForm::edit(repo, session, notifier, name);
            if form.handle_delete().await.is_none() {
                anyhow::bail!("template \"{name}\" was not deleted");
            }
        }
        TemplatesCommand::Send { name, from, to, fields } => {
            let mut dialog = TestEmailForm::new(name);
            dialog.from.clone_from(from);
            dialog.to.clone_from(to);
            for (key, value) in fields {
                dialog.set_field(key, value);
            }
            let Some(message_id) = dialog.send(repo.as_ref(), &ConsoleNotifier).await else {
                anyhow::bail!("test email was not sent");
            };
            emit(format, &serde_json::json!({ "messageId": message_id }), || {
                println!("{message_id}");
            })?;
        }
        TemplatesCommand::Preview { name, fields } => {
            preview(repo, session, notifier, name, fields, format).await?;
        }
    }
    Ok(())
}

async fn submit(
    form: &mut TemplateForm,
    changes: Vec<(TemplateField, String)>,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    for (field, value) in changes {
        form.handle_change(field, value);
    }
    if form.handle_submit().await.is_none() {
        print_field_errors(form.errors());
        anyhow::bail!("template was not saved");
    }
    let data = form.data();
    emit(
        format,
        &serde_json::json!({ "name": data.name, "dynamicFields": form.dynamic_fields() }),
        || println!("Dynamic fields: {}", form.dynamic_fields().join(", ")),
    )
}

async fn preview(
    repo: Arc<dyn TemplateRepository>,
    session: sesman_session::Session,
    notifier: Arc<dyn Notifier>,
    name: &str,
    fields: &[(String, String)],
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let mut form = TemplateForm::edit(repo, session, notifier, name);
    if form.mount().await.is_some() {
        anyhow::bail!("could not load template \"{name}\"");
    }
    let values: HashMap<String, String> = fields.iter().cloned().collect();
    let rendered = form.preview(&values);
    emit(format, &rendered, || {
        println!("Subject: {}", rendered.subject);
        println!("--- text ---\n{}", rendered.text);
        println!("--- html ---\n{}", rendered.html);
    })
}
