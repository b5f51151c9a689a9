//! Token commands.

use userbase::clock::format_rfc3339;
use userbase::user::TokenIssuer;

use crate::cli::TokenInspectArgs;
use crate::output::OutputFormat;

/// Run the `token inspect` command
pub fn inspect(
    args: &TokenInspectArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let claims = TokenIssuer::new(args.jwt_secret.as_bytes()).verify(args.token.trim())?;

    match format {
        OutputFormat::Human => {
            println!("Subject:   {}", claims.sub);
            println!("Username:  {}", claims.username);
            println!("Role:      {}", claims.role);
            println!("Issued:    {}", format_rfc3339(claims.iat));
            println!("Expires:   {}", format_rfc3339(claims.exp));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&claims)?),
    }
    Ok(())
}
