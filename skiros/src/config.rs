use std::env;

use clap::Parser;

/// Process configuration: world-model namespace, which skill libraries/names
/// to load, the robot identity, and the PDDL workspace directory.
///
/// Built in increasing precedence: compiled-in defaults, `SKIROS_*`
/// environment variables ([`Config::apply_env`]), then CLI flags
/// ([`Config::apply_cli`]) — mirroring the reference planning workspace's own
/// `env_param` convention of layering environment overrides underneath
/// whatever the caller passes explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prefix: String,
    pub libraries_list: Vec<String>,
    pub skill_list: Vec<String>,
    pub primitive_list: Vec<String>,
    pub robot_name: String,
    pub verbose: bool,
    pub workspace_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prefix: "skiros".to_string(),
            libraries_list: Vec::new(),
            skill_list: Vec::new(),
            primitive_list: Vec::new(),
            robot_name: "robot".to_string(),
            verbose: false,
            workspace_dir: "/tmp/skiros_pddl".to_string(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

impl Config {
    /// Overlays `SKIROS_*` environment variables onto `self` where set.
    pub fn apply_env(&mut self) {
        if let Ok(v) = env::var("SKIROS_PREFIX") {
            self.prefix = v;
        }
        if let Ok(v) = env::var("SKIROS_LIBRARIES") {
            self.libraries_list = split_list(&v);
        }
        if let Ok(v) = env::var("SKIROS_SKILLS") {
            self.skill_list = split_list(&v);
        }
        if let Ok(v) = env::var("SKIROS_PRIMITIVES") {
            self.primitive_list = split_list(&v);
        }
        if let Ok(v) = env::var("SKIROS_ROBOT_NAME") {
            self.robot_name = v;
        }
        if let Ok(v) = env::var("SKIROS_VERBOSE") {
            self.verbose = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = env::var("SKIROS_WORKSPACE_DIR") {
            self.workspace_dir = v;
        }
    }

    /// Overlays every CLI flag the caller actually passed (clap leaves
    /// unset optional flags as `None`).
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = &cli.prefix {
            self.prefix = v.clone();
        }
        if let Some(v) = &cli.libraries {
            self.libraries_list = split_list(v);
        }
        if let Some(v) = &cli.skills {
            self.skill_list = split_list(v);
        }
        if let Some(v) = &cli.primitives {
            self.primitive_list = split_list(v);
        }
        if let Some(v) = &cli.robot_name {
            self.robot_name = v.clone();
        }
        if cli.verbose {
            self.verbose = true;
        }
        if let Some(v) = &cli.workspace_dir {
            self.workspace_dir = v.clone();
        }
    }

    /// Builds a `Config` from defaults, then environment, then `cli`.
    pub fn layered(cli: &Cli) -> Self {
        let mut config = Config::default();
        config.apply_env();
        config.apply_cli(cli);
        config
    }
}

/// Process flags for the `skirosd` binary: the transport-free front end that
/// loads skills, submits a task, and prints progress to stdout.
#[derive(Debug, Parser)]
#[command(name = "skirosd", about = "Transport-free skiros skill runtime")]
pub struct Cli {
    #[arg(long)]
    pub prefix: Option<String>,
    #[arg(long)]
    pub libraries: Option<String>,
    #[arg(long)]
    pub skills: Option<String>,
    #[arg(long)]
    pub primitives: Option<String>,
    #[arg(long = "robot-name")]
    pub robot_name: Option<String>,
    #[arg(long)]
    pub verbose: bool,
    #[arg(long = "workspace-dir")]
    pub workspace_dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_cli() -> Cli {
        Cli { prefix: None, libraries: None, skills: None, primitives: None, robot_name: None, verbose: false, workspace_dir: None }
    }

    #[test]
    fn cli_flags_win_over_env_which_wins_over_defaults() {
        assert_eq!(Config::layered(&bare_cli()).robot_name, "robot");

        env::set_var("SKIROS_ROBOT_NAME", "from-env");
        assert_eq!(Config::layered(&bare_cli()).robot_name, "from-env");

        let cli = Cli { robot_name: Some("from-cli".to_string()), ..bare_cli() };
        assert_eq!(Config::layered(&cli).robot_name, "from-cli");

        env::remove_var("SKIROS_ROBOT_NAME");
    }

    #[test]
    fn comma_separated_lists_are_split_and_trimmed() {
        env::set_var("SKIROS_SKILLS", "MoveTo, Pick , Place");
        let config = Config::layered(&bare_cli());
        assert_eq!(config.skill_list, vec!["MoveTo", "Pick", "Place"]);
        env::remove_var("SKIROS_SKILLS");
    }
}
