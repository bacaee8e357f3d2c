//! Command-line argument definitions for the Stu CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the build script, extra rule fragments,
//! the configuration file and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Stu build-script inspector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Build script to read; a directory reads its default file
    #[arg(help = "Path to the build script (default: the configured default file)")]
    pub input: Option<String>,

    /// Rules given as text, parsed after the build script
    #[arg(short = 'F', long = "rules", value_name = "RULES")]
    pub rules: Vec<String>,

    /// Dependencies given as text, parsed as a dependency list
    #[arg(short = 'C', long = "dependencies", value_name = "DEPENDENCIES")]
    pub dependencies: Option<String>,

    /// Only check the input, print nothing on success
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["stu-parse"]);
        assert_eq!(args.input, None);
        assert!(args.rules.is_empty());
        assert!(!args.quiet);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_repeated_rules() {
        let args = Args::parse_from(["stu-parse", "-F", "a: b;", "-F", "b;", "-C", "x y", "dir"]);
        assert_eq!(args.input.as_deref(), Some("dir"));
        assert_eq!(args.rules, vec!["a: b;", "b;"]);
        assert_eq!(args.dependencies.as_deref(), Some("x y"));
    }
}
