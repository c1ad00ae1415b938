use super::*;

#[test]
fn parse_validate_positional_url() -> AppResult<()> {
    let args = CliArgs::try_parse_from([
        "loadrun",
        "validate",
        "http://internal.example/",
        "--allow-host",
        "internal.example",
        "--json",
    ])?;
    let Command::Validate(validate) = args.command else {
        return Err(AppError::validation("Expected validate subcommand"));
    };
    if validate.url != "http://internal.example/" || !validate.json {
        return Err(AppError::validation("Unexpected validate args"));
    }
    if validate.targets.allow_hosts != ["internal.example"] || !validate.targets.allow_ports.is_empty() {
        return Err(AppError::validation("Unexpected validate allow-list"));
    }
    Ok(())
}

#[test]
fn validate_requires_url() -> AppResult<()> {
    if CliArgs::try_parse_from(["loadrun", "validate"]).is_ok() {
        return Err(AppError::validation("validate without url must fail"));
    }
    if CliArgs::try_parse_from(["loadrun"]).is_ok() {
        return Err(AppError::validation("a subcommand is required"));
    }
    Ok(())
}
