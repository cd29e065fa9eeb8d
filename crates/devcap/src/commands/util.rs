//! Shared helpers for command handlers.

use devcap_core::Request;

use crate::cli::RequestArgs;
use crate::error::CliError;

/// Build a request from the positional identification string and any
/// `-H 'Name: value'` headers. An explicit `User-Agent` header loses to
/// the positional string.
pub fn build_request(args: &RequestArgs) -> Result<Request, CliError> {
    if args.headers.is_empty() {
        return Ok(Request::from_user_agent(args.user_agent.clone()));
    }

    let mut headers = args
        .headers
        .iter()
        .map(|raw| parse_header(raw))
        .collect::<Result<Vec<_>, _>>()?;
    headers.retain(|(name, _)| !name.eq_ignore_ascii_case("user-agent"));
    headers.push(("User-Agent".to_owned(), args.user_agent.clone()));
    Ok(Request::from_headers(headers))
}

fn parse_header(raw: &str) -> Result<(String, String), CliError> {
    let (name, value) = raw.split_once(':').ok_or_else(|| CliError::Validation {
        field: "header".into(),
        reason: format!("expected 'Name: value', got '{raw}'"),
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::Validation {
            field: "header".into(),
            reason: format!("missing header name in '{raw}'"),
        });
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}
