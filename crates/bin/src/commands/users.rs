//! User management commands that work directly on storage.

use userbase::clock::format_rfc3339;
use userbase::user::{Role, UserForm, UserRepository, UserView};

use crate::backend::{close, create_backend, persist};
use crate::cli::{UsersCreateArgs, UsersListArgs};
use crate::output::{OutputFormat, print_table};

/// Run the `users list` command
pub async fn list(
    args: &UsersListArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let repo = UserRepository::new(backend.clone(), args.backend_config.op_timeout()).await?;

    let mut users: Vec<UserView> = repo.list_all().await?.iter().map(UserView::from).collect();
    users.sort_by(|a, b| a.username.cmp(&b.username));
    close(backend.as_ref()).await;

    match format {
        OutputFormat::Human => {
            if users.is_empty() {
                println!("No users found.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = users
                .iter()
                .map(|u| {
                    vec![
                        u.username.clone(),
                        u.id.clone(),
                        u.role.to_string(),
                        format_rfc3339(u.created_at),
                    ]
                })
                .collect();
            print_table(&["USERNAME", "ID", "ROLE", "CREATED"], &rows);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&users)?),
    }

    Ok(())
}

/// Run the `users create` command
pub async fn create(
    args: &UsersCreateArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let repo = UserRepository::new(backend.clone(), args.backend_config.op_timeout()).await?;

    let role = if args.admin { Role::Admin } else { Role::Member };
    let form = UserForm::new(args.username.clone(), args.password.clone());
    let user = repo.create_with_role(&form, role).await?;

    persist(backend.as_ref(), &args.backend_config).await?;
    close(backend.as_ref()).await;

    match format {
        OutputFormat::Human => println!("Created {} user '{}' ({})", user.role, user.username, user.id),
        OutputFormat::Json => println!("{}", serde_json::to_string(&user.view())?),
    }
    Ok(())
}
