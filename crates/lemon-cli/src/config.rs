use crate::cli::{CountArgs, Selection};
use crate::error::{CliError, Result};
use lemon::engine::config::{self as core_config, OutputOrder, RunConfig};
use lemon::engine::error::EngineError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const DEFAULT_FLUSH_THRESHOLD: usize = 1;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialRunSection {
    #[serde(rename = "work-dir")]
    work_dir: Option<PathBuf>,
    #[serde(rename = "entries-file")]
    entries_file: Option<PathBuf>,
    ncpu: Option<usize>,
    #[serde(rename = "flush-threshold")]
    flush_threshold: Option<usize>,
    #[serde(rename = "output-order")]
    output_order: Option<OutputOrder>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialCountSection {
    select: Option<Selection>,
}

/// Options for the `count` command as read from a TOML file; every value is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    run: Option<PartialRunSection>,
    count: Option<PartialCountSection>,
}

#[derive(Debug, Clone)]
pub struct CountConfig {
    pub run: RunConfig,
    pub selection: Selection,
}

impl PartialAppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Merges the file values with the command line. Dedicated flags win over `--set`
    /// values, which win over the file, which wins over defaults.
    pub fn merge_with_cli(mut self, args: &CountArgs) -> Result<CountConfig> {
        let mut run_file = self.run.take().unwrap_or_default();
        let mut count_file = self.count.take().unwrap_or_default();
        Self::apply_set_values(&mut run_file, &mut count_file, &args.set_values)?;

        let work_dir = args
            .work_dir
            .clone()
            .or(run_file.work_dir)
            .ok_or_else(|| {
                EngineError::InvalidConfiguration(
                    "A value for 'work-dir' is required either in the config file or via --work-dir."
                        .to_string(),
                )
            })?;

        let output_order = if args.ordered {
            OutputOrder::Submission
        } else {
            run_file.output_order.unwrap_or_default()
        };

        let run = core_config::RunConfigBuilder::new()
            .work_dir(work_dir)
            .entries_path(args.entries_file.clone().or(run_file.entries_file))
            .worker_count(args.ncpu.or(run_file.ncpu).unwrap_or_else(num_cpus::get))
            .flush_threshold(
                args.flush_threshold
                    .or(run_file.flush_threshold)
                    .unwrap_or(DEFAULT_FLUSH_THRESHOLD),
            )
            .output_order(output_order)
            .build()
            .map_err(EngineError::from)?;

        let selection = args.select.or(count_file.select).unwrap_or_default();
        Ok(CountConfig { run, selection })
    }

    fn apply_set_values(
        run: &mut PartialRunSection,
        count: &mut PartialCountSection,
        set_values: &[String],
    ) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            match key {
                "run.work-dir" => run.work_dir = Some(PathBuf::from(value_str)),
                "run.entries-file" => run.entries_file = Some(PathBuf::from(value_str)),
                "run.ncpu" => run.ncpu = Some(parse_value(key, value_str)?),
                "run.flush-threshold" => run.flush_threshold = Some(parse_value(key, value_str)?),
                "run.output-order" => {
                    run.output_order = Some(match value_str {
                        "completion" => OutputOrder::Completion,
                        "submission" => OutputOrder::Submission,
                        _ => {
                            return Err(CliError::Config(format!(
                                "Invalid value for {}: {} (expected 'completion' or 'submission')",
                                key, value_str
                            )));
                        }
                    })
                }
                "count.select" => {
                    count.select = Some(
                        <Selection as clap::ValueEnum>::from_str(value_str, true)
                            .map_err(|e| CliError::Config(format!("Invalid value for {}: {}", key, e)))?,
                    )
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str.parse().map_err(|_| {
        CliError::Config(format!("Invalid integer value for {}: {}", key, value_str))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn count_args(extra: &[&str]) -> CountArgs {
        let mut argv = vec!["lemon", "count"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Count(args) => args,
            _ => panic!("Expected 'count' subcommand"),
        }
    }

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("lemon.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn file_values_fill_in_missing_flags() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [run]
            work-dir = "/data/archives"
            ncpu = 3
            flush-threshold = 50
            output-order = "submission"

            [count]
            select = "ligands"
            "#,
        );

        let config = PartialAppConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&count_args(&[]))
            .unwrap();
        assert_eq!(config.run.work_dir, PathBuf::from("/data/archives"));
        assert_eq!(config.run.worker_count, 3);
        assert_eq!(config.run.flush_threshold, 50);
        assert_eq!(config.run.output_order, OutputOrder::Submission);
        assert_eq!(config.selection, Selection::Ligands);
    }

    #[test]
    fn cli_flags_override_file_values() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            [run]
            work-dir = "/data/archives"
            ncpu = 3

            [count]
            select = "ligands"
            "#,
        );

        let args = count_args(&["-w", "/data/pdb", "-j", "6", "--select", "waters"]);
        let config = PartialAppConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();
        assert_eq!(config.run.work_dir, PathBuf::from("/data/pdb"));
        assert_eq!(config.run.worker_count, 6);
        assert_eq!(config.selection, Selection::Waters);
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let config = PartialAppConfig::default()
            .merge_with_cli(&count_args(&["-w", "/data/pdb"]))
            .unwrap();
        assert_eq!(config.run.worker_count, num_cpus::get());
        assert_eq!(config.run.flush_threshold, DEFAULT_FLUSH_THRESHOLD);
        assert_eq!(config.run.output_order, OutputOrder::Completion);
        assert_eq!(config.run.entries_path, None);
        assert_eq!(config.selection, Selection::MetalIons);
    }

    #[test]
    fn set_values_override_the_file_but_not_flags() {
        let args = count_args(&[
            "-w",
            "/data/pdb",
            "-j",
            "2",
            "-S",
            "run.ncpu=5",
            "-S",
            "count.select=waters",
            "-S",
            "run.output-order=submission",
        ]);
        let config = PartialAppConfig::default().merge_with_cli(&args).unwrap();
        assert_eq!(config.run.worker_count, 2);
        assert_eq!(config.selection, Selection::Waters);
        assert_eq!(config.run.output_order, OutputOrder::Submission);
    }

    #[test]
    fn set_values_are_validated() {
        for bad in ["run.ncpu", "run.ncpu=many", "run.colour=blue", "count.select=ions"] {
            let args = count_args(&["-w", "/data", "-S", bad]);
            let result = PartialAppConfig::default().merge_with_cli(&args);
            assert!(matches!(result, Err(CliError::Config(_))), "{bad}");
        }
    }

    #[test]
    fn missing_work_dir_exits_with_invalid_configuration() {
        let err = PartialAppConfig::default()
            .merge_with_cli(&count_args(&[]))
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Lemon(EngineError::InvalidConfiguration(_))
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn zero_workers_or_flush_threshold_exit_with_invalid_configuration() {
        for flags in [
            ["-w", "/data", "-j", "0"],
            ["-w", "/data", "--flush-threshold", "0"],
            ["-w", "/data", "-S", "run.ncpu=0"],
        ] {
            let err = PartialAppConfig::default()
                .merge_with_cli(&count_args(&flags))
                .unwrap_err();
            assert!(
                matches!(err, CliError::Lemon(EngineError::InvalidConfiguration(_))),
                "{flags:?}"
            );
            assert_eq!(err.exit_code(), 2, "{flags:?}");
        }
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[run]\nthreads = 4\n");
        let result = PartialAppConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
