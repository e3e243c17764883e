use article_core::{ArticleServiceError, ConfigError, ErrorKind};
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::process::ExitCode;

/// Failure body printed to stderr.
#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: &'a str,
    status: u16,
    message: String,
}

pub fn print_success(value: &Value) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => print_failure(&err.into()),
    }
}

pub fn print_failure(err: &anyhow::Error) -> ExitCode {
    let kind = classify(err);
    let envelope = ErrorEnvelope {
        error: kind.as_str(),
        status: kind.http_status(),
        message: format!("{err:#}"),
    };
    debug!(
        "event=cli_failure module=cli status=error error_code={}",
        kind.as_str()
    );

    match serde_json::to_string(&envelope) {
        Ok(text) => eprintln!("{text}"),
        Err(_) => eprintln!("{}", envelope.message),
    }

    if kind.is_client_error() {
        ExitCode::from(1)
    } else {
        ExitCode::from(2)
    }
}

fn classify(err: &anyhow::Error) -> ErrorKind {
    if let Some(service_err) = err.downcast_ref::<ArticleServiceError>() {
        return service_err.kind();
    }
    for cause in err.chain() {
        if cause.downcast_ref::<serde_json::Error>().is_some() {
            return ErrorKind::Validation;
        }
        // A missing variable is a deployment problem; a malformed url came from the caller.
        match cause.downcast_ref::<ConfigError>() {
            Some(ConfigError::MissingEnv(_)) => return ErrorKind::Internal,
            Some(_) => return ErrorKind::Validation,
            None => {}
        }
    }
    ErrorKind::Internal
}
