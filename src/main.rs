// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

//! Scriven CLI entrypoint.
//!
//! By default this serves MCP over streamable HTTP at
//! `http://127.0.0.1:<port>/mcp`, backed by a workspace folder of Markdown
//! documents.
//!
//! Use `--mcp` to run the MCP server over stdio instead (intended for tool
//! integrations), or `apply` for a one-shot batch edit of a single file.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};

use scriven::ops::CommandBatch;
use scriven::store::{apply_batch_to_file, WorkspaceFolder, WriteDurability};

const DEFAULT_MCP_HTTP_PORT: u16 = 27461;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<workspace-dir>] [--durable-writes] [--mcp-http-port <port>]\n  {program} [--workspace <dir>] [--durable-writes] [--mcp-http-port <port>]\n  {program} [<workspace-dir>] [--durable-writes] --mcp\n  {program} [--workspace <dir>] [--durable-writes] --mcp\n  {program} apply <input.md> <batch.json> [-o <output.md>] [--durable-writes]\n\nServer mode (default) serves MCP over streamable HTTP at `http://127.0.0.1:<port>/mcp`.\n--mcp-http-port selects the port (0 = ephemeral; default {DEFAULT_MCP_HTTP_PORT}).\n\nIf workspace-dir/--workspace is omitted, the current working directory is used.\n\n`apply` reads a Markdown file, applies a `{{\"commands\": [...]}}` batch against its\ntree (node ids assigned in pre-order from node-0), and writes the result back\n(or to `-o <output.md>`). Skipped commands are reported on stderr.\n\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ApplyArgs {
    input: String,
    batch: String,
    output: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    mcp: bool,
    workspace_dir: Option<String>,
    mcp_http_port: Option<u16>,
    durable_writes: bool,
    apply: Option<ApplyArgs>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();
    let mut apply_positionals: Vec<String> = Vec::new();
    let mut apply_output: Option<String> = None;
    let mut apply_mode = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mcp" => {
                if options.mcp {
                    return Err(());
                }
                options.mcp = true;
            }
            "--workspace" => {
                if options.workspace_dir.is_some() {
                    return Err(());
                }
                let dir = args.next().ok_or(())?;
                options.workspace_dir = Some(dir);
            }
            "--mcp-http-port" => {
                if options.mcp_http_port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.mcp_http_port = Some(port);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            "-o" | "--output" => {
                if !apply_mode || apply_output.is_some() {
                    return Err(());
                }
                let path = args.next().ok_or(())?;
                apply_output = Some(path);
            }
            "apply" if !apply_mode && options.workspace_dir.is_none() => {
                apply_mode = true;
            }
            _ if arg.starts_with('-') => return Err(()),
            _ if apply_mode => {
                if apply_positionals.len() == 2 {
                    return Err(());
                }
                apply_positionals.push(arg);
            }
            _ => {
                if options.workspace_dir.is_some() {
                    return Err(());
                }
                options.workspace_dir = Some(arg);
            }
        }
    }

    if apply_mode {
        if options.mcp || options.workspace_dir.is_some() || options.mcp_http_port.is_some() {
            return Err(());
        }
        let mut positionals = apply_positionals.into_iter();
        let input = positionals.next().ok_or(())?;
        let batch = positionals.next().ok_or(())?;
        options.apply = Some(ApplyArgs {
            input,
            batch,
            output: apply_output,
        });
    } else if apply_output.is_some() {
        return Err(());
    }

    if options.mcp && options.mcp_http_port.is_some() {
        return Err(());
    }

    Ok(options)
}

fn durability_for(options: &CliOptions) -> WriteDurability {
    if options.durable_writes {
        WriteDurability::Durable
    } else {
        WriteDurability::BestEffort
    }
}

fn run_apply(apply: &ApplyArgs, durability: WriteDurability) -> Result<(), Box<dyn Error>> {
    let batch_str = std::fs::read_to_string(&apply.batch)?;
    let batch: CommandBatch = serde_json::from_str(&batch_str)
        .map_err(|err| format!("cannot parse command batch {}: {err}", apply.batch))?;

    let input = Path::new(&apply.input);
    let output = apply
        .output
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| input.to_path_buf());

    let report = apply_batch_to_file(input, &output, &batch, durability)?;
    for outcome in &report.outcomes {
        if let Err(err) = &outcome.result {
            eprintln!("scriven: command {} skipped: {err}", outcome.index);
        }
    }
    eprintln!(
        "scriven: applied {} of {} command(s) to {}",
        report.applied(),
        report.outcomes.len(),
        output.display()
    );
    Ok(())
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "scriven".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        if let Some(apply) = &options.apply {
            return run_apply(apply, durability_for(&options));
        }

        let dir = options.workspace_dir.clone().unwrap_or_else(|| ".".to_owned());
        let workspace = WorkspaceFolder::new(dir).with_durability(durability_for(&options));
        let session = workspace.load_or_init_session()?;
        let mcp = scriven::mcp::ScrivenMcp::new_persistent(session, workspace);

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        if options.mcp {
            runtime.block_on(mcp.serve_stdio())?;
            return Ok(());
        }

        let mcp_http_port = options.mcp_http_port.unwrap_or(DEFAULT_MCP_HTTP_PORT);
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", mcp_http_port)).await?;
            let local_addr = listener.local_addr()?;
            eprintln!("scriven: serving MCP at http://{local_addr}/mcp");

            let config = StreamableHttpServerConfig {
                stateful_mode: true,
                ..StreamableHttpServerConfig::default()
            };
            let session_manager = Arc::new(LocalSessionManager::default());
            let mcp_service = {
                let mcp = mcp.clone();
                StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config)
            };

            let router = Router::new().nest_service("/mcp", mcp_service);
            axum::serve(listener, router).await?;
            Ok::<(), Box<dyn Error>>(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("scriven: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_options, ApplyArgs, CliOptions};

    fn parse(args: &[&str]) -> Result<CliOptions, ()> {
        parse_options(args.iter().map(|arg| (*arg).to_owned()))
    }

    #[test]
    fn parses_empty_args() {
        let options = parse(&[]).expect("parse options");
        assert_eq!(options, CliOptions::default());
    }

    #[test]
    fn parses_mcp_flag() {
        let options = parse(&["--mcp"]).expect("parse options");
        assert!(options.mcp);
        assert!(options.workspace_dir.is_none());
        assert_eq!(options.mcp_http_port, None);
    }

    #[test]
    fn parses_workspace_dir() {
        let options = parse(&["--workspace", "some/dir"]).expect("parse options");
        assert_eq!(options.workspace_dir.as_deref(), Some("some/dir"));
        assert!(!options.mcp);
    }

    #[test]
    fn parses_positional_workspace_dir() {
        let options = parse(&["some/dir"]).expect("parse options");
        assert_eq!(options.workspace_dir.as_deref(), Some("some/dir"));
    }

    #[test]
    fn parses_positional_workspace_dir_with_mcp() {
        let options = parse(&["some/dir", "--mcp"]).expect("parse options");
        assert_eq!(options.workspace_dir.as_deref(), Some("some/dir"));
        assert!(options.mcp);
    }

    #[test]
    fn parses_mcp_http_port() {
        let options = parse(&["--mcp-http-port", "1234"]).expect("parse options");
        assert_eq!(options.mcp_http_port, Some(1234));
    }

    #[test]
    fn rejects_mcp_http_port_with_stdio_mcp_mode() {
        parse(&["--mcp", "--mcp-http-port", "0"]).unwrap_err();
    }

    #[test]
    fn parses_durable_writes() {
        let options = parse(&["--durable-writes"]).expect("parse options");
        assert!(options.durable_writes);
    }

    #[test]
    fn parses_apply_mode() {
        let options = parse(&["apply", "in.md", "batch.json"]).expect("parse options");
        assert_eq!(
            options.apply,
            Some(ApplyArgs {
                input: "in.md".to_owned(),
                batch: "batch.json".to_owned(),
                output: None,
            })
        );
    }

    #[test]
    fn parses_apply_mode_with_output() {
        let options =
            parse(&["apply", "in.md", "batch.json", "-o", "out.md"]).expect("parse options");
        assert_eq!(
            options.apply.expect("apply args").output.as_deref(),
            Some("out.md")
        );

        let options =
            parse(&["apply", "in.md", "batch.json", "--output", "out.md"]).expect("parse options");
        assert_eq!(
            options.apply.expect("apply args").output.as_deref(),
            Some("out.md")
        );
    }

    #[test]
    fn parses_apply_mode_with_durable_writes() {
        let options =
            parse(&["apply", "in.md", "batch.json", "--durable-writes"]).expect("parse options");
        assert!(options.durable_writes);
        assert!(options.apply.is_some());
    }

    #[test]
    fn rejects_apply_with_missing_positionals() {
        parse(&["apply"]).unwrap_err();
        parse(&["apply", "in.md"]).unwrap_err();
    }

    #[test]
    fn rejects_apply_with_extra_positionals() {
        parse(&["apply", "in.md", "batch.json", "extra.md"]).unwrap_err();
    }

    #[test]
    fn rejects_apply_with_server_flags() {
        parse(&["apply", "in.md", "batch.json", "--mcp"]).unwrap_err();
        parse(&["apply", "in.md", "batch.json", "--workspace", "."]).unwrap_err();
        parse(&["apply", "in.md", "batch.json", "--mcp-http-port", "0"]).unwrap_err();
    }

    #[test]
    fn rejects_output_flag_outside_apply_mode() {
        parse(&["-o", "out.md"]).unwrap_err();
    }

    #[test]
    fn rejects_unknown_args() {
        parse(&["--nope"]).unwrap_err();
    }

    #[test]
    fn rejects_duplicate_flags() {
        parse(&["--mcp", "--mcp"]).unwrap_err();
        parse(&["--workspace", ".", "--workspace", "other"]).unwrap_err();
        parse(&["--durable-writes", "--durable-writes"]).unwrap_err();
    }

    #[test]
    fn rejects_multiple_positional_workspace_dirs() {
        parse(&["one", "two"]).unwrap_err();
    }

    #[test]
    fn rejects_missing_workspace_value() {
        parse(&["--workspace"]).unwrap_err();
    }
}
