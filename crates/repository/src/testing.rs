use std::collections::HashMap;

use sesman_core::{TemplateInput, TemplatePatch};

use crate::error::RepositoryError;
use crate::template::TemplateRepository;

fn input(name: &str, subject: &str) -> TemplateInput {
    TemplateInput {
        name: name.to_owned(),
        subject: subject.to_owned(),
        html: "<p>Hello {{ name }}, see {{account.url}}</p>".to_owned(),
        text: "Hello {{name}} from {{ company }}".to_owned(),
    }
}

/// Run the template repository conformance suite.
///
/// Call this from a backend's test module with a repository whose session
/// is logged in and whose backing store starts empty.
///
/// # Errors
///
/// Returns an error if a repository call fails unexpectedly.
pub async fn run_template_conformance_tests(
    repo: &dyn TemplateRepository,
) -> Result<(), RepositoryError> {
    test_get_missing(repo).await?;
    test_create_and_get(repo).await?;
    test_dynamic_fields_order(repo).await?;
    test_list_search(repo).await?;
    test_update_in_place(repo).await?;
    test_empty_patch_fields_keep_content(repo).await?;
    test_rename(repo).await?;
    test_update_missing(repo).await?;
    test_create_duplicate(repo).await?;
    test_create_then_delete(repo).await?;
    test_send_test_email(repo).await?;
    Ok(())
}

async fn test_get_missing(repo: &dyn TemplateRepository) -> Result<(), RepositoryError> {
    let found = repo.get("conformance-missing").await?;
    assert!(found.is_none(), "get of a missing template should be None");
    Ok(())
}

async fn test_create_and_get(repo: &dyn TemplateRepository) -> Result<(), RepositoryError> {
    let created = repo.create(&input("conf-create", "Hi {{name}}")).await?;
    assert_eq!(created.id, "conf-create");
    assert_eq!(created.name, "conf-create");

    let fetched = repo.get("conf-create").await?;
    let fetched = fetched.expect("created template should be readable");
    assert_eq!(fetched.id, "conf-create");
    assert_eq!(fetched.subject, "Hi {{name}}");
    assert_eq!(fetched.html, "<p>Hello {{ name }}, see {{account.url}}</p>");
    assert_eq!(fetched.text, "Hello {{name}} from {{ company }}");
    Ok(())
}

async fn test_dynamic_fields_order(repo: &dyn TemplateRepository) -> Result<(), RepositoryError> {
    let created = repo
        .create(&input("conf-fields", "{{ subject.line }} for {{name}}"))
        .await?;
    let expected = ["subject.line", "name", "company", "account.url"];
    assert_eq!(created.dynamic_fields, expected, "create result fields");

    let fetched = repo.get("conf-fields").await?.expect("template exists");
    assert_eq!(fetched.dynamic_fields, expected, "subject, text, html scan order");
    Ok(())
}

async fn test_list_search(repo: &dyn TemplateRepository) -> Result<(), RepositoryError> {
    repo.create(&input("welcome-template", "Welcome")).await?;
    repo.create(&input("newsletter-template", "News")).await?;

    let found = repo.list(Some("wel")).await?;
    let names: Vec<&str> = found.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["welcome-template"]);

    let found = repo.list(Some("TEMPLATE")).await?;
    assert_eq!(found.len(), 2, "search should be case-insensitive");

    let all = repo.list(None).await?;
    assert!(all.iter().any(|t| t.name == "newsletter-template"));
    assert!(all.iter().any(|t| t.name == "conf-create"));
    Ok(())
}

async fn test_update_in_place(repo: &dyn TemplateRepository) -> Result<(), RepositoryError> {
    repo.create(&input("conf-update", "Old")).await?;
    let patch = TemplatePatch {
        name: Some("conf-update".to_owned()),
        subject: Some("New {{ promo }}".to_owned()),
        ..TemplatePatch::default()
    };
    let updated = repo.update("conf-update", &patch).await?;
    assert_eq!(updated.name, "conf-update");
    assert_eq!(updated.subject, "New {{ promo }}");
    assert_eq!(updated.dynamic_fields.first().map(String::as_str), Some("promo"));

    let fetched = repo.get("conf-update").await?.expect("template exists");
    assert_eq!(fetched.subject, "New {{ promo }}");
    assert_eq!(fetched.text, "Hello {{name}} from {{ company }}");
    Ok(())
}

async fn test_empty_patch_fields_keep_content(
    repo: &dyn TemplateRepository,
) -> Result<(), RepositoryError> {
    repo.create(&input("conf-empty-patch", "Keep me")).await?;
    let patch = TemplatePatch {
        name: Some(String::new()),
        subject: Some(String::new()),
        html: None,
        text: Some("Replaced".to_owned()),
    };
    let updated = repo.update("conf-empty-patch", &patch).await?;
    assert_eq!(updated.name, "conf-empty-patch");
    assert_eq!(updated.subject, "Keep me");
    assert_eq!(updated.text, "Replaced");
    Ok(())
}

async fn test_rename(repo: &dyn TemplateRepository) -> Result<(), RepositoryError> {
    repo.create(&input("conf-old-name", "Rename me")).await?;
    let patch = TemplatePatch {
        name: Some("conf-new-name".to_owned()),
        ..TemplatePatch::default()
    };
    let renamed = repo.update("conf-old-name", &patch).await?;
    assert_eq!(renamed.id, "conf-new-name");
    assert_eq!(renamed.subject, "Rename me");

    assert!(repo.get("conf-new-name").await?.is_some(), "new name resolves");
    assert!(repo.get("conf-old-name").await?.is_none(), "old name is gone");
    Ok(())
}

async fn test_update_missing(repo: &dyn TemplateRepository) -> Result<(), RepositoryError> {
    let result = repo
        .update("conf-ghost", &TemplatePatch::default())
        .await;
    assert!(
        matches!(result, Err(RepositoryError::NotFound { .. })),
        "update of a missing template should be NotFound"
    );
    Ok(())
}

async fn test_create_duplicate(repo: &dyn TemplateRepository) -> Result<(), RepositoryError> {
    repo.create(&input("conf-dup", "First")).await?;
    let result = repo.create(&input("conf-dup", "Second")).await;
    assert!(result.is_err(), "creating an existing name should fail");

    let kept = repo.get("conf-dup").await?.expect("template exists");
    assert_eq!(kept.subject, "First");
    Ok(())
}

async fn test_create_then_delete(repo: &dyn TemplateRepository) -> Result<(), RepositoryError> {
    repo.create(&input("conf-delete", "Bye")).await?;
    repo.delete("conf-delete").await?;
    assert!(repo.get("conf-delete").await?.is_none());
    Ok(())
}

async fn test_send_test_email(repo: &dyn TemplateRepository) -> Result<(), RepositoryError> {
    let fields = HashMap::from([("name".to_owned(), "Ada".to_owned())]);
    let message_id = repo
        .send_test_email(
            "conf-create",
            "sender@example.com",
            &["to@example.com".to_owned()],
            &fields,
        )
        .await?;
    assert!(!message_id.is_empty(), "provider message id is returned");
    Ok(())
}
