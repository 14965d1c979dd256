//! Property-based tests for ping-cli
//!
//! These tests verify correctness properties using proptest.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::{json, Value};

    use crate::config::{CliOverrides, Config};
    use crate::output::{truncate, OutputFormat, OutputFormatter};
    use crate::ExitCode;

    fn any_format() -> impl Strategy<Value = OutputFormat> {
        prop_oneof![
            Just(OutputFormat::Table),
            Just(OutputFormat::Json),
            Just(OutputFormat::Quiet),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        // Output format names parse back to the same format in any case
        #[test]
        fn test_output_format_round_trip(format in any_format(), upper in any::<bool>()) {
            let name = format.to_string();
            let name = if upper { name.to_uppercase() } else { name };
            prop_assert_eq!(name.parse::<OutputFormat>().unwrap(), format);
        }

        // Valid configs survive a TOML round trip unchanged
        #[test]
        fn test_config_toml_round_trip(
            host in "[a-z]{1,12}\\.[a-z]{2,4}",
            https in any::<bool>(),
            timeout in 1u64..3600,
            agent_id in proptest::option::of("[a-zA-Z0-9_-]{1,24}"),
            format in any_format(),
            verbose in any::<bool>(),
            level in prop_oneof![Just("error"), Just("warn"), Just("info"), Just("debug"), Just("trace")],
        ) {
            let mut config = Config::default();
            config.server.url = format!("{}://{host}", if https { "https" } else { "http" });
            config.server.timeout_seconds = timeout;
            config.agent.id = agent_id;
            config.output.format = format.to_string();
            config.output.verbose = verbose;
            config.logging.level = level.to_string();
            prop_assert!(config.validate().is_ok());

            let text = toml::to_string_pretty(&config).unwrap();
            let parsed: Config = toml::from_str(&text).unwrap();
            prop_assert_eq!(parsed, config);
        }

        // Overrides win when present and leave the file value otherwise
        #[test]
        fn test_overrides_precedence(
            file_id in proptest::option::of("[a-z0-9-]{1,16}"),
            cli_id in proptest::option::of("[a-z0-9-]{1,16}"),
            debug in any::<bool>(),
        ) {
            let mut config = Config::default();
            config.agent.id = file_id.clone();

            let overrides = CliOverrides {
                agent_id: cli_id.clone(),
                debug: Some(debug),
                ..Default::default()
            };
            let config = config.with_overrides(&overrides);

            prop_assert_eq!(config.agent.id, cli_id.or(file_id));
            prop_assert_eq!(config.logging.level == "debug", debug);
        }

        // Truncation never exceeds the width and keeps short text intact
        #[test]
        fn test_truncate_width(text in "\\PC{0,120}", width in 1usize..80) {
            let out = truncate(&text, width);
            prop_assert!(out.chars().count() <= width);
            if text.chars().count() <= width {
                prop_assert_eq!(out, text);
            } else {
                prop_assert!(out.ends_with('…'));
            }
        }

        // JSON error output always carries the numeric exit code
        #[test]
        fn test_json_error_schema(message in "\\PC{0,64}", code_index in 0usize..6) {
            let code = [
                ExitCode::Success,
                ExitCode::GeneralError,
                ExitCode::ApiError,
                ExitCode::ConnectionFailed,
                ExitCode::InvalidInput,
                ExitCode::NotRegistered,
            ][code_index];
            let formatter = OutputFormatter::new(OutputFormat::Json, false);
            let rendered = formatter.format_error_with_code(&message, code);
            let value: Value = serde_json::from_str(&rendered).unwrap();

            prop_assert_eq!(&value["success"], &json!(false));
            prop_assert_eq!(&value["error"], &json!(message));
            prop_assert_eq!(&value["exit_code"], &json!(code as i32));
            prop_assert!(value["timestamp"].is_string());
        }
    }
}
