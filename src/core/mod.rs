// This file is the module declaration file for the `core` module.
// It declares the submodules contained within `src/core/` and exposes
// them to the rest of the crate.

// `config` module:
// The tool configuration (`app-devkit.toml`): the `DevkitConfig` data
// structures, the `ConfigProvider` trait and the `ConfigManager` that loads,
// saves, validates and exports it.
pub mod config;

// `env` module:
// Parses `KEY=value` env files and picks the service URL and credential.
pub mod env;

// `migrate` module:
// Sends a SQL migration file through the `exec_sql` remote procedure,
// whole or statement by statement.
pub mod migrate;

// `probe` module:
// The schema probe: one `exec_sql` call listing a table's columns.
pub mod probe;

// `rpc` module:
// The `RpcClient` trait, its `RpcError` type and the HTTP implementation.
pub mod rpc;
