// This file is the module declaration file for the `builders` module.
// It declares and makes public all the sub-modules within the `src/builders`
// directory. Together they implement the toast call rewriter.

// `reporter` module:
// Defines the `StatusReporter` trait and its `ConsoleReporter`
// implementation, which prints one status line per file and a summary.
pub mod reporter;

// `rewriter` module:
// Reads each configured file, runs it through a `TextRewriter` and writes it
// back only when the text changed. Missing files are reported and skipped.
pub mod rewriter;

// `rules` module:
// The four ordered call-shape substitutions and the `RulePipeline` that
// applies them.
pub mod rules;

// `validator` module:
// The `ConfigValidator` trait and the `StandardValidator` used by the
// `validate` command.
pub mod validator;
