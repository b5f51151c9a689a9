//! Info command - shows backend, collections and user count.

use userbase::user::UserRepository;

use crate::backend::{backend_label, close, create_backend};
use crate::cli::InfoArgs;
use crate::output::OutputFormat;

/// Run the info command
pub async fn run(args: &InfoArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let collections = backend.collections().await?;
    let users = UserRepository::new(backend.clone(), args.backend_config.op_timeout())
        .await?
        .count()
        .await?;
    close(backend.as_ref()).await;

    let backend_str = backend_label(&args.backend_config);

    match format {
        OutputFormat::Human => {
            println!("Backend:      {backend_str}");
            println!("Collections:  {}", collections.join(", "));
            println!("Users:        {users}");
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "backend": backend_str,
                "collections": collections,
                "users": users,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}
