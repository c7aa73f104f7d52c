//! The bot is configured entirely through `TB_*` environment variables. Passing any argument prints the help text
//! and the current (non-secret) configuration instead of starting the server.
use std::{env, env::VarError};

/// Configuration variables that are safe to print. `TB_DISCORD_BOT_TOKEN` is never listed.
const DISPLAYED_ENVS: [&str; 12] = [
    "RUST_LOG",
    "TB_HOST",
    "TB_PORT",
    "TB_DATABASE_URL",
    "TB_DB_MAX_CONNECTIONS",
    "TB_DISCORD_PUBLIC_KEY",
    "TB_DISCORD_API_URL",
    "TB_DISCORD_TIMEOUT_SECS",
    "TB_SIGNATURE_CHECKS",
    "TB_OFFLINE",
    "TB_LINK_HOST",
    "TB_GUILD_CACHE_TTL_SECS",
];

/// Returns true if the help was printed and the process should exit.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        const HELP: &str = include_str!("./cli-help.txt");
        println!("\n{HELP}\n");
        println!("{}", environment_report());
    }
    has_cli_args
}

fn env_value(name: &str) -> String {
    match env::var(name) {
        Ok(s) => s,
        Err(VarError::NotPresent) => "Not set".into(),
        Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
    }
}

fn environment_report() -> String {
    let mut report = String::from("Current trade desk configuration (secrets are never shown):\n");
    for name in DISPLAYED_ENVS {
        report.push_str(&format!("  {name:<35} {}\n", env_value(name)));
    }
    report
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn report_lists_every_setting_but_the_token() {
        let report = environment_report();
        for name in DISPLAYED_ENVS {
            assert!(report.contains(name), "{name} missing");
        }
        assert!(!report.contains("TB_DISCORD_BOT_TOKEN"));
    }

    #[test]
    fn unset_variables_are_reported() {
        assert_eq!(env_value("TB_SURELY_NOT_A_REAL_SETTING"), "Not set");
    }
}
