#![no_main]

use clap::Parser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let mut args = Vec::new();
        args.push("loadrun".to_owned());
        for token in input.split_whitespace().take(64) {
            args.push(token.to_owned());
        }
        let arg_refs: Vec<&str> = args.iter().map(|value| value.as_str()).collect();
        if let Ok(parsed) = loadrun::args::CliArgs::try_parse_from(arg_refs) {
            if let loadrun::args::Command::Run(run) = parsed.command {
                debug_assert!(run.virtual_users.get() >= 1);
                debug_assert!(run.duration.as_secs() >= 1);
                debug_assert!(!(run.url.is_some() && run.definition.is_some()));
            }
        }
    }
});
