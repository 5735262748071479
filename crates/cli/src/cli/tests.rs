use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn parse_capabilities_with_context() {
	let args = vec!["hostbridge", "capabilities", "--context", "sidePanel", "--host-version", "1.8.0"];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::Capabilities(args) => {
			assert_eq!(args.context, Some(FrameContext::SidePanel));
			assert_eq!(args.host_version.unwrap().as_str(), "1.8.0");
		}
		_ => panic!("Expected Capabilities command"),
	}
}

#[test]
fn host_version_requires_context() {
	let args = vec!["hostbridge", "capabilities", "--host-version", "1.8.0"];
	assert!(Cli::try_parse_from(args).is_err());
}

#[test]
fn rejects_unknown_context() {
	let args = vec!["hostbridge", "capabilities", "--context", "sidebar"];
	assert!(Cli::try_parse_from(args).is_err());
}

#[test]
fn parse_translate_task() {
	let args = vec!["hostbridge", "translate-task", "--update", r#"{"height":"large"}"#];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::TranslateTask(args) => {
			assert!(args.update);
			assert_eq!(args.task, r#"{"height":"large"}"#);
		}
		_ => panic!("Expected TranslateTask command"),
	}
}

#[test]
fn parse_simulate_defaults() {
	let args = vec!["hostbridge", "simulate", "getContext", "--context", "content"];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::Simulate(args) => {
			assert_eq!(args.func, "getContext");
			assert_eq!(args.context, FrameContext::Content);
			assert_eq!(args.client_type, HostClientType::Desktop);
			assert_eq!(args.host_version, None);
			assert_eq!(args.args, "[]");
			assert_eq!(args.respond, "[null]");
			assert_eq!(args.timeout_ms, 2000);
		}
		_ => panic!("Expected Simulate command"),
	}
}

#[test]
fn simulate_requires_context() {
	let args = vec!["hostbridge", "simulate", "getContext"];
	assert!(Cli::try_parse_from(args).is_err());
}

#[test]
fn global_flags_after_subcommand() {
	let args = vec![
		"hostbridge",
		"simulate",
		"location.getLocation",
		"--context",
		"task",
		"-vv",
		"--config",
		"/tmp/bridge.json",
	];
	let cli = Cli::try_parse_from(args).unwrap();
	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.config, Some(PathBuf::from("/tmp/bridge.json")));
}
