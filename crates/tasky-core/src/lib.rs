pub mod api;
pub mod board;
pub mod config;
pub mod drag;
pub mod memory;
pub mod query;
pub mod render;
pub mod search;
pub mod store;
pub mod sync;

#[cfg(feature = "native")]
pub mod cli;
#[cfg(feature = "native")]
pub mod commands;
#[cfg(feature = "native")]
pub mod http;

#[cfg(feature = "native")]
use std::ffi::OsString;

#[cfg(feature = "native")]
use anyhow::Context;
#[cfg(feature = "native")]
use clap::Parser;
#[cfg(feature = "native")]
use tracing::{
  debug,
  info
};

#[cfg(feature = "native")]
#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting tasky CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.taskyrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let api = http::HttpTaskApi::new(
    cfg.api_config()?
  )
  .context(
    "failed to build task service \
     client"
  )?;
  let renderer = render::Renderer::new(
    cfg.display_timezone()?
  )
  .with_color(cfg.color());
  let mut board =
    board::Board::new(api, renderer)
      .with_query(cfg.lane_query());

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;

  let command = cli
    .command
    .unwrap_or(cli::Command::Board);
  runtime.block_on(commands::dispatch(
    &mut board,
    command,
    chrono::Utc::now()
  ))?;

  info!("done");
  Ok(())
}
